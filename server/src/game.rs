//! Authoritative match state shared by every connection task

use crate::broadcast::{broadcast, location_snapshot};
use crate::player::{Connection, Outbound, Player};
use crate::registry::{ConnectionRegistry, HandshakeError};
use crate::round::{Deferred, Phase, RoundController};
use log::{debug, info};
use shared::{PlayerId, ServerMessage, Team, HANDSHAKE_SUCCESS};

/// Result of a successful handshake
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Admission {
    pub id: PlayerId,
    /// Identifies this connection when it later releases the slot
    pub serial: u64,
    /// Set when this admission filled the lobby and started round one
    pub deferred: Option<Deferred>,
}

#[derive(Debug)]
pub struct GameState {
    pub(crate) registry: ConnectionRegistry,
    pub(crate) rounds: RoundController,
    next_serial: u64,
}

impl GameState {
    pub fn new(num_players: usize) -> Self {
        Self {
            registry: ConnectionRegistry::new(num_players),
            rounds: RoundController::new(),
            next_serial: 0,
        }
    }

    /// Handles the one-byte id handshake of a new connection.
    ///
    /// On success the success byte is queued on `sender` before anything the
    /// admission itself broadcasts.
    pub fn admit(
        &mut self,
        requested: &[u8],
        sender: Outbound,
    ) -> Result<Admission, HandshakeError> {
        if self.rounds.has_started() {
            return Err(HandshakeError::GameInProgress);
        }
        if self.registry.is_full() {
            return Err(HandshakeError::LobbyFull);
        }
        let &[id] = requested else {
            return Err(HandshakeError::MalformedId(requested.len()));
        };

        self.next_serial += 1;
        let serial = self.next_serial;
        self.registry.occupy(id, Connection::new(serial, sender))?;

        if let Some(player) = self.registry.get(id) {
            player.connection().send(vec![HANDSHAKE_SUCCESS]);
        }

        let deferred = if self.registry.is_full() {
            info!("Lobby is full, starting the match");
            Some(self.next_round())
        } else {
            None
        };

        Ok(Admission {
            id,
            serial,
            deferred,
        })
    }

    /// Frees the slot held by a finished connection and tells everyone else.
    ///
    /// Returns false if the slot was already released or reassigned.
    pub fn disconnect(&mut self, id: PlayerId, serial: u64) -> bool {
        if self.registry.release(id, serial).is_none() {
            debug!("Connection {} no longer owns slot {}", serial, id);
            return false;
        }

        info!(
            "Player {} left ({}/{})",
            id,
            self.registry.len(),
            self.registry.capacity()
        );
        broadcast(&self.registry, &ServerMessage::PlayerDisconnect(id));
        true
    }

    /// Starts the next round, or ends the match after the last one
    pub fn next_round(&mut self) -> Deferred {
        match self.rounds.advance() {
            Some(round) => {
                for player in self.registry.players_mut() {
                    player.respawn();
                }
                info!("Round {} starting", round);
                broadcast(&self.registry, &ServerMessage::NextRound);
                Deferred::Play { round }
            }
            None => {
                let message = ServerMessage::GameOver {
                    team_a_points: self.points_byte(Team::A),
                    team_b_points: self.points_byte(Team::B),
                };
                info!(
                    "Game over, team A {} : {} team B",
                    self.points(Team::A),
                    self.points(Team::B)
                );
                broadcast(&self.registry, &message);
                Deferred::Shutdown
            }
        }
    }

    /// Applies a timed transition once its delay has elapsed.
    ///
    /// Transitions scheduled for a round that has since moved on are dropped.
    /// May return a follow-up transition to schedule.
    pub fn fire(&mut self, deferred: Deferred) -> Option<Deferred> {
        match deferred {
            Deferred::Play { round } => {
                if self.rounds.activate(round) {
                    info!("Round {} is live", round);
                    broadcast(&self.registry, &ServerMessage::Play);
                } else {
                    debug!("Dropping stale play for round {}", round);
                }
                None
            }
            Deferred::NextRound { round } => {
                if self.rounds.is_resolving(round) {
                    Some(self.next_round())
                } else {
                    debug!("Dropping stale next round after round {}", round);
                    None
                }
            }
            Deferred::Shutdown => {
                self.close_all();
                None
            }
        }
    }

    /// Ends the round if `team` has no living member left.
    ///
    /// The other team scores only if it still has a living member; otherwise
    /// the round is a draw. Either way the next round gets scheduled.
    pub fn evaluate_elimination(&mut self, team: Team) -> Option<Deferred> {
        if !self.registry.team_eliminated(team) {
            return None;
        }

        let survivor = team.opponent();
        let winner = (!self.registry.team_eliminated(survivor)).then_some(survivor);
        if !self.rounds.resolve(winner) {
            return None;
        }

        let round = self.rounds.round();
        match winner {
            Some(winner) => {
                info!("Team {} wins round {}", winner.label(), round);
                broadcast(&self.registry, &ServerMessage::TeamPoint(winner));
            }
            None => info!("Round {} ended in a draw", round),
        }
        Some(Deferred::NextRound { round })
    }

    /// Location snapshot for the current round, if one is running
    pub fn snapshot(&self) -> Option<ServerMessage> {
        if !self.rounds.has_started() || self.rounds.phase() == Phase::GameOver {
            return None;
        }
        Some(location_snapshot(&self.registry))
    }

    pub fn broadcast_snapshot(&self) {
        if let Some(snapshot) = self.snapshot() {
            broadcast(&self.registry, &snapshot);
        }
    }

    /// Drops every connection's outbound queue, closing all sockets
    pub fn close_all(&mut self) {
        let closed = self.registry.clear();
        info!("Closed {} connections", closed);
    }

    pub fn round(&self) -> u32 {
        self.rounds.round()
    }

    pub fn phase(&self) -> Phase {
        self.rounds.phase()
    }

    pub fn points(&self, team: Team) -> u32 {
        self.rounds.points(team)
    }

    fn points_byte(&self, team: Team) -> u8 {
        u8::try_from(self.points(team)).unwrap_or(u8::MAX)
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.registry.get(id)
    }

    pub fn player_count(&self) -> usize {
        self.registry.len()
    }
}
