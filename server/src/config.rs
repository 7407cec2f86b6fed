//! Server settings resolved from the command line

use shared::{
    AFTER_GAME_LINGER_SECS, LOCATION_UPDATE_FREQUENCY, MAX_PLAYERS, ROUND_END_GRACE_SECS,
    ROUND_START_GRACE_SECS,
};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    /// Players required before the first round starts
    pub num_players: usize,
    /// Wait between NextRound and Play
    pub round_start_grace: Duration,
    /// Wait between a team point and the next round
    pub round_end_grace: Duration,
    /// Wait between the end of the last round and shutdown
    pub after_game_linger: Duration,
    /// Location snapshots per second
    pub location_update_frequency: u32,
}

impl ServerConfig {
    pub fn new(port: u16, num_players: usize) -> Self {
        Self {
            port,
            num_players: num_players.clamp(1, MAX_PLAYERS),
            round_start_grace: Duration::from_secs(ROUND_START_GRACE_SECS),
            round_end_grace: Duration::from_secs(ROUND_END_GRACE_SECS),
            after_game_linger: Duration::from_secs(AFTER_GAME_LINGER_SECS),
            location_update_frequency: LOCATION_UPDATE_FREQUENCY,
        }
    }

    pub fn bind_address(&self) -> String {
        format!("127.0.0.1:{}", self.port)
    }

    pub fn snapshot_interval(&self) -> Duration {
        Duration::from_secs(1) / self.location_update_frequency.max(1)
    }
}
