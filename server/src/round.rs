//! Round state machine
//!
//! `Lobby -> Countdown -> Active -> Resolving -> Countdown ... -> GameOver`
//!
//! The controller only tracks the round counter, phase and team points. It
//! never touches players or sockets; `GameState` applies the side effects of
//! each transition and turns timed transitions into [`Deferred`] tasks.

use crate::config::ServerConfig;
use shared::{Team, LAST_ROUND};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Waiting for the configured number of players
    Lobby,
    /// Round announced, players are spawning
    Countdown,
    /// Players may act
    Active,
    /// A team was eliminated, waiting to start the next round
    Resolving,
    /// Last round finished, the server is lingering before shutdown
    GameOver,
}

/// A transition that must run after a fixed delay
///
/// Timed transitions carry the round they were scheduled in. When the delay
/// elapses they are re-validated under the state lock and dropped if the game
/// has moved on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deferred {
    Play { round: u32 },
    NextRound { round: u32 },
    Shutdown,
}

impl Deferred {
    pub fn delay(&self, config: &ServerConfig) -> Duration {
        match self {
            Deferred::Play { .. } => config.round_start_grace,
            Deferred::NextRound { .. } => config.round_end_grace,
            Deferred::Shutdown => config.after_game_linger,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RoundController {
    round: u32,
    phase: Phase,
    team_a_points: u32,
    team_b_points: u32,
}

impl Default for RoundController {
    fn default() -> Self {
        Self::new()
    }
}

impl RoundController {
    pub fn new() -> Self {
        Self {
            round: 0,
            phase: Phase::Lobby,
            team_a_points: 0,
            team_b_points: 0,
        }
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn points(&self, team: Team) -> u32 {
        match team {
            Team::A => self.team_a_points,
            Team::B => self.team_b_points,
        }
    }

    /// True once the lobby has filled
    pub fn has_started(&self) -> bool {
        self.round > 0
    }

    /// Hits only count while a round exists
    pub fn accepts_hits(&self) -> bool {
        matches!(
            self.phase,
            Phase::Countdown | Phase::Active | Phase::Resolving
        )
    }

    /// Moves to the next round, or to `GameOver` once the last round is done.
    ///
    /// Returns the new round number, or None when the match is over.
    pub fn advance(&mut self) -> Option<u32> {
        if self.round >= LAST_ROUND {
            self.phase = Phase::GameOver;
            return None;
        }
        self.round += 1;
        self.phase = Phase::Countdown;
        Some(self.round)
    }

    /// Countdown -> Active, only for the round the timer was set in
    pub fn activate(&mut self, round: u32) -> bool {
        if self.phase == Phase::Countdown && self.round == round {
            self.phase = Phase::Active;
            return true;
        }
        false
    }

    /// Ends the current round, crediting `winner` if there is one.
    ///
    /// Returns false if the round was already resolved or never started, in
    /// which case nothing changes.
    pub fn resolve(&mut self, winner: Option<Team>) -> bool {
        if !matches!(self.phase, Phase::Countdown | Phase::Active) {
            return false;
        }
        self.phase = Phase::Resolving;
        match winner {
            Some(Team::A) => self.team_a_points += 1,
            Some(Team::B) => self.team_b_points += 1,
            None => {}
        }
        true
    }

    pub fn is_resolving(&self, round: u32) -> bool {
        self.phase == Phase::Resolving && self.round == round
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_in_lobby() {
        let rounds = RoundController::new();
        assert_eq!(rounds.round(), 0);
        assert_eq!(rounds.phase(), Phase::Lobby);
        assert!(!rounds.has_started());
        assert!(!rounds.accepts_hits());
    }

    #[test]
    fn test_round_lifecycle() {
        let mut rounds = RoundController::new();
        assert_eq!(rounds.advance(), Some(1));
        assert_eq!(rounds.phase(), Phase::Countdown);
        assert!(rounds.accepts_hits());

        assert!(rounds.activate(1));
        assert_eq!(rounds.phase(), Phase::Active);

        assert!(rounds.resolve(Some(Team::B)));
        assert!(rounds.is_resolving(1));
        assert_eq!(rounds.points(Team::B), 1);
        assert_eq!(rounds.points(Team::A), 0);

        assert_eq!(rounds.advance(), Some(2));
        assert_eq!(rounds.phase(), Phase::Countdown);
    }

    #[test]
    fn test_stale_activation_ignored() {
        let mut rounds = RoundController::new();
        rounds.advance();
        rounds.resolve(None);
        rounds.advance();

        assert!(!rounds.activate(1));
        assert_eq!(rounds.phase(), Phase::Countdown);
        assert!(rounds.activate(2));
    }

    #[test]
    fn test_activation_after_resolution_ignored() {
        let mut rounds = RoundController::new();
        rounds.advance();
        assert!(rounds.resolve(Some(Team::A)));
        assert!(!rounds.activate(1));
        assert_eq!(rounds.phase(), Phase::Resolving);
    }

    #[test]
    fn test_single_resolution_per_round() {
        let mut rounds = RoundController::new();
        rounds.advance();
        rounds.activate(1);

        assert!(rounds.resolve(Some(Team::A)));
        assert!(!rounds.resolve(Some(Team::B)));
        assert_eq!(rounds.points(Team::A), 1);
        assert_eq!(rounds.points(Team::B), 0);
    }

    #[test]
    fn test_resolve_in_lobby_ignored() {
        let mut rounds = RoundController::new();
        assert!(!rounds.resolve(Some(Team::A)));
        assert_eq!(rounds.points(Team::A), 0);
        assert_eq!(rounds.phase(), Phase::Lobby);
    }

    #[test]
    fn test_draw_awards_nothing() {
        let mut rounds = RoundController::new();
        rounds.advance();
        assert!(rounds.resolve(None));
        assert_eq!(rounds.points(Team::A), 0);
        assert_eq!(rounds.points(Team::B), 0);
    }

    #[test]
    fn test_round_counter_caps_at_last_round() {
        let mut rounds = RoundController::new();
        for expected in 1..=LAST_ROUND {
            assert_eq!(rounds.advance(), Some(expected));
            rounds.resolve(Some(Team::A));
        }

        assert_eq!(rounds.advance(), None);
        assert_eq!(rounds.round(), LAST_ROUND);
        assert_eq!(rounds.phase(), Phase::GameOver);
        assert!(!rounds.accepts_hits());
        assert_eq!(rounds.points(Team::A), LAST_ROUND);
    }

    #[test]
    fn test_deferred_delays() {
        let config = ServerConfig::new(0, 2);
        assert_eq!(
            Deferred::Play { round: 1 }.delay(&config),
            config.round_start_grace
        );
        assert_eq!(
            Deferred::NextRound { round: 1 }.delay(&config),
            config.round_end_grace
        );
        assert_eq!(Deferred::Shutdown.delay(&config), config.after_game_linger);
    }
}
