//! Stand-in for a human player: wanders around and fires at random

use crate::game::ClientGameState;
use rand::seq::SliceRandom;
use rand::Rng;
use shared::{ClientMessage, Position};

/// Half the width of the arena in world units
pub const ARENA_EXTENT: f32 = 15.0;
const STEP: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gun {
    Handgun,
    Sniper,
}

impl Gun {
    pub fn damage(self) -> u8 {
        match self {
            Gun::Handgun => 1,
            Gun::Sniper => 3,
        }
    }
}

pub struct Bot<R: Rng> {
    rng: R,
    x: f32,
    z: f32,
    gun: Gun,
    fire_chance: f64,
    hit_chance: f64,
}

impl<R: Rng> Bot<R> {
    pub fn new(rng: R) -> Self {
        Self {
            rng,
            x: 0.0,
            z: 0.0,
            gun: Gun::Handgun,
            fire_chance: 0.1,
            hit_chance: 0.3,
        }
    }

    /// Overrides how often the bot pulls the trigger and how often a shot lands
    pub fn with_chances(mut self, fire_chance: f64, hit_chance: f64) -> Self {
        self.fire_chance = fire_chance.clamp(0.0, 1.0);
        self.hit_chance = hit_chance.clamp(0.0, 1.0);
        self
    }

    pub fn gun(&self) -> Gun {
        self.gun
    }

    pub fn position(&self) -> Position {
        Position::from_world(self.x, 0.0, self.z)
    }

    /// Moves one step in a random direction and reports the new position
    pub fn wander(&mut self) -> Position {
        self.x = (self.x + self.rng.gen_range(-STEP..=STEP)).clamp(-ARENA_EXTENT, ARENA_EXTENT);
        self.z = (self.z + self.rng.gen_range(-STEP..=STEP)).clamp(-ARENA_EXTENT, ARENA_EXTENT);
        self.position()
    }

    /// Messages to send this tick, if any
    ///
    /// A shot is always announced before the hit it produces.
    pub fn act(&mut self, game: &ClientGameState) -> Vec<ClientMessage> {
        if !game.can_act() || !self.rng.gen_bool(self.fire_chance) {
            return Vec::new();
        }

        if self.rng.gen_bool(0.05) {
            self.gun = match self.gun {
                Gun::Handgun => Gun::Sniper,
                Gun::Sniper => Gun::Handgun,
            };
        }

        let mut actions = vec![ClientMessage::Shot];
        if self.rng.gen_bool(self.hit_chance) {
            if let Some(&target) = game.living_opponents().choose(&mut self.rng) {
                actions.push(ClientMessage::Hit {
                    target,
                    damage: self.gun.damage(),
                });
            }
        }
        actions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use shared::{LocationParcel, ServerMessage};

    fn bot(fire: f64, hit: f64) -> Bot<StdRng> {
        Bot::new(StdRng::seed_from_u64(7)).with_chances(fire, hit)
    }

    fn live_game(id: u8, opponents: &[u8]) -> ClientGameState {
        let mut game = ClientGameState::new(id);
        game.apply(ServerMessage::NextRound);
        game.apply(ServerMessage::Play);
        game.apply(ServerMessage::Locations(
            opponents
                .iter()
                .map(|&id| LocationParcel {
                    id,
                    position: Position::default(),
                })
                .collect(),
        ));
        game
    }

    #[test]
    fn test_wander_stays_in_arena() {
        let mut bot = bot(0.0, 0.0);
        let limit = shared::scale_to_i8(ARENA_EXTENT);
        for _ in 0..1000 {
            let position = bot.wander();
            assert!(position.x.abs() <= limit);
            assert!(position.z.abs() <= limit);
            assert_eq!(position.y, 0);
        }

        let (x, y, z) = bot.position().to_world();
        assert_approx_eq!(y, 0.0, 0.001);
        assert!(x.abs() <= ARENA_EXTENT && z.abs() <= ARENA_EXTENT);
    }

    #[test]
    fn test_idle_when_not_allowed_to_act() {
        let mut bot = bot(1.0, 1.0);
        let mut game = ClientGameState::new(0);
        assert!(bot.act(&game).is_empty());

        game.apply(ServerMessage::NextRound);
        assert!(bot.act(&game).is_empty());
    }

    #[test]
    fn test_hits_only_living_opponents() {
        let mut bot = bot(1.0, 1.0);
        let game = live_game(0, &[1, 4]);

        for _ in 0..50 {
            let actions = bot.act(&game);
            assert_eq!(actions[0], ClientMessage::Shot);
            assert_eq!(actions.len(), 2);
            match actions[1] {
                ClientMessage::Hit { target, damage } => {
                    assert_eq!(target, 4);
                    assert_eq!(damage, bot.gun().damage());
                }
                other => panic!("unexpected action {:?}", other),
            }
        }
    }

    #[test]
    fn test_shot_without_target() {
        let mut bot = bot(1.0, 1.0);
        let game = live_game(3, &[]);
        assert_eq!(bot.act(&game), vec![ClientMessage::Shot]);
    }

    #[test]
    fn test_never_fires_at_zero_chance() {
        let mut bot = bot(0.0, 1.0);
        let game = live_game(0, &[3]);
        for _ in 0..100 {
            assert!(bot.act(&game).is_empty());
        }
    }
}
