//! Per-slot player state and the outbound half of a player's connection

use log::{debug, warn};
use shared::{PlayerId, Position, Team, MAX_HEALTH};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

/// Frames a connection may have waiting before new ones are dropped
pub const OUTBOUND_CAPACITY: usize = 256;

/// Queue of encoded frames waiting to be written to a player's socket
pub type Outbound = mpsc::Sender<Vec<u8>>;
pub type OutboundReceiver = mpsc::Receiver<Vec<u8>>;

/// Creates the bounded queue between the game state and a writer task
pub fn outbound() -> (Outbound, OutboundReceiver) {
    mpsc::channel(OUTBOUND_CAPACITY)
}

/// Outbound handle of one live connection
///
/// The serial number distinguishes successive connections that occupy the same
/// slot, so a receive loop can only ever release the slot it was admitted to.
#[derive(Debug)]
pub struct Connection {
    serial: u64,
    sender: Outbound,
}

impl Connection {
    pub fn new(serial: u64, sender: Outbound) -> Self {
        Self { serial, sender }
    }

    pub fn serial(&self) -> u64 {
        self.serial
    }

    /// Queues a frame for the writer task
    ///
    /// Returns false if the socket is gone or the peer has stopped reading and
    /// its queue is full; the frame is dropped in both cases.
    pub fn send(&self, frame: Vec<u8>) -> bool {
        match self.sender.try_send(frame) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!("Connection {} is not keeping up, dropping frame", self.serial);
                false
            }
            Err(TrySendError::Closed(_)) => {
                debug!("Connection {} already closed, dropping frame", self.serial);
                false
            }
        }
    }
}

/// An occupied slot
#[derive(Debug)]
pub struct Player {
    pub id: PlayerId,
    pub team: Team,
    pub health: u8,
    pub alive: bool,
    pub position: Position,
    connection: Connection,
}

impl Player {
    /// New players join at full health, standing at the origin
    pub fn new(id: PlayerId, connection: Connection) -> Self {
        Self {
            id,
            team: Team::of(id),
            health: MAX_HEALTH,
            alive: true,
            position: Position::default(),
            connection,
        }
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Applies damage, flooring health at zero.
    ///
    /// Returns true only for the hit that takes a living player to zero, so a
    /// dead player can never be killed twice.
    pub fn take_damage(&mut self, damage: u8) -> bool {
        self.health = self.health.saturating_sub(damage);
        if self.alive && self.health < 1 {
            self.alive = false;
            return true;
        }
        false
    }

    pub fn respawn(&mut self) {
        self.health = MAX_HEALTH;
        self.alive = true;
    }
}

/// One of the fixed player positions
#[derive(Debug, Default)]
pub enum Slot {
    #[default]
    Empty,
    Occupied(Player),
}

impl Slot {
    pub fn is_empty(&self) -> bool {
        matches!(self, Slot::Empty)
    }

    pub fn player(&self) -> Option<&Player> {
        match self {
            Slot::Occupied(player) => Some(player),
            Slot::Empty => None,
        }
    }

    pub fn player_mut(&mut self) -> Option<&mut Player> {
        match self {
            Slot::Occupied(player) => Some(player),
            Slot::Empty => None,
        }
    }
}
