use log::{debug, warn};
use shared::{
    is_valid_player_id, PlayerId, Position, ServerMessage, Team, MAX_HEALTH, MAX_PLAYERS,
    TEAM_SIZE,
};
use std::fmt::Write;

/// What the local player may currently do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    /// Connected, lobby still filling
    Waiting,
    /// Round is live and we are alive
    Normal,
    /// Spawning or dead; no moving or shooting
    Limbo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtherPlayerState {
    NonExistent,
    Alive,
    Dead,
}

#[derive(Debug, Clone, Copy)]
pub struct OtherPlayer {
    pub state: OtherPlayerState,
    pub position: Position,
    pub kills: u32,
    pub deaths: u32,
}

impl Default for OtherPlayer {
    fn default() -> Self {
        Self {
            state: OtherPlayerState::NonExistent,
            position: Position::default(),
            kills: 0,
            deaths: 0,
        }
    }
}

/// Final result from the local player's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Draw,
    Victory(Team),
    Defeat(Team),
}

/// The client's view of the match, built purely from server messages
#[derive(Debug, Clone)]
pub struct ClientGameState {
    pub id: PlayerId,
    pub team: Team,
    pub round: u32,
    pub state: PlayerState,
    pub health: u8,
    pub kills: u32,
    pub deaths: u32,
    pub team_a_points: u32,
    pub team_b_points: u32,
    pub shots_heard: u32,
    pub game_over: bool,
    others: [OtherPlayer; MAX_PLAYERS],
}

impl ClientGameState {
    pub fn new(id: PlayerId) -> Self {
        Self {
            id,
            team: Team::of(id),
            round: 0,
            state: PlayerState::Waiting,
            health: MAX_HEALTH,
            kills: 0,
            deaths: 0,
            team_a_points: 0,
            team_b_points: 0,
            shots_heard: 0,
            game_over: false,
            others: [OtherPlayer::default(); MAX_PLAYERS],
        }
    }

    pub fn other(&self, id: PlayerId) -> Option<&OtherPlayer> {
        if id == self.id {
            return None;
        }
        self.others.get(id as usize)
    }

    /// True once the first round has been announced
    pub fn has_started(&self) -> bool {
        self.round > 0
    }

    pub fn can_act(&self) -> bool {
        self.state == PlayerState::Normal && self.health > 0
    }

    /// Opponents last seen alive
    pub fn living_opponents(&self) -> Vec<PlayerId> {
        (0..MAX_PLAYERS as PlayerId)
            .filter(|&id| id != self.id && Team::of(id) != self.team)
            .filter(|&id| self.others[id as usize].state == OtherPlayerState::Alive)
            .collect()
    }

    pub fn apply(&mut self, message: ServerMessage) {
        match message {
            ServerMessage::NextRound => self.next_round(),
            ServerMessage::Play => {
                debug!("Round {} is live", self.round);
                self.state = PlayerState::Normal;
            }
            ServerMessage::Locations(parcels) => {
                for parcel in parcels {
                    if parcel.id == self.id {
                        continue;
                    }
                    let Some(other) = self.others.get_mut(parcel.id as usize) else {
                        warn!("Location for unknown player {}", parcel.id);
                        continue;
                    };
                    other.position = parcel.position;
                    if other.state == OtherPlayerState::NonExistent {
                        other.state = OtherPlayerState::Alive;
                    }
                }
            }
            ServerMessage::Shot { shooter } => {
                if shooter != self.id {
                    self.shots_heard += 1;
                }
            }
            ServerMessage::Killed { killer, victim } => self.record_kill(killer, victim),
            ServerMessage::TeamPoint(team) => match team {
                Team::A => self.team_a_points += 1,
                Team::B => self.team_b_points += 1,
            },
            ServerMessage::LoseHealth(damage) => {
                self.health = self.health.saturating_sub(damage);
                debug!("Took {} damage, {} health left", damage, self.health);
            }
            ServerMessage::PlayerDisconnect(id) => {
                if id == self.id || !is_valid_player_id(id) {
                    warn!("Ignoring disconnect of player {}", id);
                    return;
                }
                self.others[id as usize].state = OtherPlayerState::NonExistent;
            }
            ServerMessage::GameOver {
                team_a_points,
                team_b_points,
            } => {
                self.team_a_points = team_a_points as u32;
                self.team_b_points = team_b_points as u32;
                self.state = PlayerState::Limbo;
                self.game_over = true;
            }
        }
    }

    fn next_round(&mut self) {
        self.round += 1;
        self.state = PlayerState::Limbo;
        self.health = MAX_HEALTH;
        for other in &mut self.others {
            if other.state != OtherPlayerState::NonExistent {
                other.state = OtherPlayerState::Alive;
            }
        }
    }

    fn record_kill(&mut self, killer: PlayerId, victim: PlayerId) {
        if !is_valid_player_id(killer) || !is_valid_player_id(victim) {
            warn!("Ignoring kill {} -> {}", killer, victim);
            return;
        }

        if victim == self.id {
            self.deaths += 1;
            self.state = PlayerState::Limbo;
        } else {
            let other = &mut self.others[victim as usize];
            other.deaths += 1;
            other.state = OtherPlayerState::Dead;
        }

        if killer == self.id {
            self.kills += 1;
        } else {
            self.others[killer as usize].kills += 1;
        }
    }

    pub fn outcome(&self) -> Outcome {
        let (ours, theirs) = match self.team {
            Team::A => (self.team_a_points, self.team_b_points),
            Team::B => (self.team_b_points, self.team_a_points),
        };
        if ours == theirs {
            Outcome::Draw
        } else if ours > theirs {
            Outcome::Victory(self.team)
        } else {
            Outcome::Defeat(self.team.opponent())
        }
    }

    /// End-of-match summary, with `>` marking the local player
    pub fn scoreboard(&self) -> String {
        let mut out = String::new();
        let _ = match self.outcome() {
            Outcome::Draw => writeln!(out, "  DRAW"),
            Outcome::Victory(team) => writeln!(out, "  CONGRATULATIONS::TEAM {} WON", team.label()),
            Outcome::Defeat(team) => writeln!(out, "  DEFEAT::TEAM {} WON", team.label()),
        };

        for (team, points) in [(Team::A, self.team_a_points), (Team::B, self.team_b_points)] {
            let _ = writeln!(out, "  TEAM {} POINTS::{}", team.label(), points);
            let first = match team {
                Team::A => 0,
                Team::B => TEAM_SIZE,
            };
            for id in first..first + TEAM_SIZE {
                let (marker, kills, deaths) = if id == self.id as usize {
                    (">", self.kills, self.deaths)
                } else {
                    (" ", self.others[id].kills, self.others[id].deaths)
                };
                let _ = writeln!(out, "{} {} KILLS: {}, DEATHS: {}", marker, id, kills, deaths);
            }
        }
        out
    }
}
