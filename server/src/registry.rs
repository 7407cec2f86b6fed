//! Player slot management for the lobby and the running match
//!
//! This module owns the six fixed player slots, including:
//! - Slot assignment for new connections and capacity enforcement
//! - Slot release when a connection's receive loop ends
//! - Team-level queries used by the round controller
//!
//! A slot's index is the player's id. Ids are chosen by the connecting
//! client, never assigned by the server.

use crate::player::{Connection, Player, Slot};
use log::info;
use shared::{is_valid_player_id, PlayerId, Team, MAX_PLAYERS};
use thiserror::Error;

/// Reasons a connection is turned away during the handshake
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeError {
    #[error("lobby is full")]
    LobbyFull,
    #[error("game is in progress")]
    GameInProgress,
    #[error("badly formed id message of {0} bytes")]
    MalformedId(usize),
    #[error("player id {0} is out of range")]
    InvalidId(u8),
    #[error("player slot {0} is taken")]
    SlotTaken(PlayerId),
}

/// Fixed array of player slots with a configured lobby size
///
/// The registry enforces that no more than `capacity` slots are occupied and
/// that each id is held by at most one connection. All access goes through
/// the shared game state lock, so no interior synchronization is needed here.
#[derive(Debug)]
pub struct ConnectionRegistry {
    slots: [Slot; MAX_PLAYERS],
    capacity: usize,
    occupied: usize,
}

impl ConnectionRegistry {
    /// Creates an empty registry that fills up after `capacity` players
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: std::array::from_fn(|_| Slot::Empty),
            capacity: capacity.min(MAX_PLAYERS),
            occupied: 0,
        }
    }

    /// Claims the slot named by `id` for a new connection
    ///
    /// Fails if the lobby is at capacity, the id is out of range, or another
    /// connection already holds the slot. On success the live count grows by one.
    pub fn occupy(&mut self, id: u8, connection: Connection) -> Result<(), HandshakeError> {
        if self.is_full() {
            return Err(HandshakeError::LobbyFull);
        }
        if !is_valid_player_id(id) {
            return Err(HandshakeError::InvalidId(id));
        }

        let slot = &mut self.slots[id as usize];
        if !slot.is_empty() {
            return Err(HandshakeError::SlotTaken(id));
        }

        *slot = Slot::Occupied(Player::new(id, connection));
        self.occupied += 1;
        info!(
            "Player {} took a slot on team {} ({}/{})",
            id,
            Team::of(id).label(),
            self.occupied,
            self.capacity
        );
        Ok(())
    }

    /// Empties the slot if it is still held by the connection with `serial`
    ///
    /// Returns the departing player, or None if the slot was already empty or
    /// has since been taken by a different connection.
    pub fn release(&mut self, id: PlayerId, serial: u64) -> Option<Player> {
        let slot = self.slots.get_mut(id as usize)?;
        match slot.player() {
            Some(player) if player.connection().serial() == serial => {}
            _ => return None,
        }

        self.occupied -= 1;
        match std::mem::take(slot) {
            Slot::Occupied(player) => Some(player),
            Slot::Empty => None,
        }
    }

    /// Empties every slot, dropping all outbound queues
    pub fn clear(&mut self) -> usize {
        let released = self.occupied;
        for slot in &mut self.slots {
            *slot = Slot::Empty;
        }
        self.occupied = 0;
        released
    }

    pub fn get(&self, id: PlayerId) -> Option<&Player> {
        self.slots.get(id as usize).and_then(Slot::player)
    }

    pub fn get_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.slots.get_mut(id as usize).and_then(Slot::player_mut)
    }

    /// Occupied slots in id order
    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.slots.iter().filter_map(Slot::player)
    }

    pub fn players_mut(&mut self) -> impl Iterator<Item = &mut Player> {
        self.slots.iter_mut().filter_map(Slot::player_mut)
    }

    /// True when no occupied member of `team` is alive
    ///
    /// A team with no occupied slots at all counts as eliminated.
    pub fn team_eliminated(&self, team: Team) -> bool {
        !self.players().any(|p| p.team == team && p.alive)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of occupied slots
    pub fn len(&self) -> usize {
        self.occupied
    }

    pub fn is_empty(&self) -> bool {
        self.occupied == 0
    }

    pub fn is_full(&self) -> bool {
        self.occupied >= self.capacity
    }
}
