//! Inbound message handling
//!
//! Every binary frame a connected player sends after the handshake lands here.
//! Each handler runs under the game state lock and may hand back a timed
//! transition for the caller to schedule.
//!
//! Hit detection happens on the clients. The server checks that the target
//! slot is occupied and that a round exists, but trusts the reported damage
//! and does not check teams or distance.

use crate::broadcast::{broadcast, unicast};
use crate::game::GameState;
use crate::round::Deferred;
use log::{debug, warn};
use shared::{ClientMessage, PlayerId, Position, ServerMessage};

impl GameState {
    pub fn apply_hit(&mut self, sender: PlayerId, target: PlayerId, damage: u8) -> Option<Deferred> {
        if !self.rounds.accepts_hits() {
            warn!(
                "Dropping hit from player {} on {}: no round in progress",
                sender, target
            );
            return None;
        }

        let Some(victim) = self.registry.get_mut(target) else {
            warn!("Dropping hit from player {} on empty slot {}", sender, target);
            return None;
        };

        let killed = victim.take_damage(damage);
        let team = victim.team;
        debug!(
            "Player {} hit {} for {} (health {})",
            sender, target, damage, victim.health
        );
        unicast(victim, &ServerMessage::LoseHealth(damage));

        if killed {
            broadcast(
                &self.registry,
                &ServerMessage::Killed {
                    killer: sender,
                    victim: target,
                },
            );
        }
        self.evaluate_elimination(team)
    }

    pub fn apply_shot(&mut self, sender: PlayerId) {
        broadcast(&self.registry, &ServerMessage::Shot { shooter: sender });
    }

    pub fn apply_location(&mut self, sender: PlayerId, position: Position) {
        if let Some(player) = self.registry.get_mut(sender) {
            player.position = position;
        }
    }
}

/// Decodes one frame from `sender` and applies it.
///
/// Malformed frames are logged and dropped; the connection stays open.
pub fn route(state: &mut GameState, sender: PlayerId, bytes: &[u8]) -> Option<Deferred> {
    let message = match ClientMessage::decode(bytes) {
        Ok(message) => message,
        Err(e) => {
            warn!("Dropping message from player {}: {}", sender, e);
            return None;
        }
    };

    match message {
        ClientMessage::Hit { target, damage } => state.apply_hit(sender, target, damage),
        ClientMessage::Shot => {
            state.apply_shot(sender);
            None
        }
        ClientMessage::Location(position) => {
            state.apply_location(sender, position);
            None
        }
    }
}
