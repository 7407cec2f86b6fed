//! Wire protocol and game constants shared by the server and the client.
//!
//! Every frame on the wire is a single WebSocket binary message whose first byte
//! identifies the kind of message. Payloads are fixed-size except for the
//! location snapshot, which is a run of 4-byte parcels.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MAX_PLAYERS: usize = 6;
pub const TEAM_SIZE: usize = MAX_PLAYERS / 2;
pub const MAX_HEALTH: u8 = 3;
pub const LAST_ROUND: u32 = 10;

/// How much world coordinates are scaled before being truncated to `i8`.
pub const SCALING_FACTOR: f32 = 8.0;
/// Location messages and snapshots per second.
pub const LOCATION_UPDATE_FREQUENCY: u32 = 12;

pub const ROUND_START_GRACE_SECS: u64 = 8;
pub const ROUND_END_GRACE_SECS: u64 = 8;
pub const AFTER_GAME_LINGER_SECS: u64 = 2;

pub const HANDSHAKE_SUCCESS: u8 = 0;
pub const HANDSHAKE_FAILURE: u8 = 1;

/// Size in bytes of one `(id, x, y, z)` entry in a locations snapshot.
pub const LOCATION_PARCEL_SIZE: usize = 4;

pub type PlayerId = u8;

pub fn is_valid_player_id(id: u8) -> bool {
    (id as usize) < MAX_PLAYERS
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Team {
    A,
    B,
}

impl Team {
    /// Ids 0-2 play for team A, ids 3-5 for team B.
    pub fn of(id: PlayerId) -> Self {
        if (id as usize) < TEAM_SIZE {
            Team::A
        } else {
            Team::B
        }
    }

    pub fn opponent(self) -> Self {
        match self {
            Team::A => Team::B,
            Team::B => Team::A,
        }
    }

    pub fn to_byte(self) -> u8 {
        match self {
            Team::A => 0,
            Team::B => 1,
        }
    }

    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Team::A),
            1 => Some(Team::B),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Team::A => "A",
            Team::B => "B",
        }
    }
}

/// Compact position: world coordinates multiplied by [`SCALING_FACTOR`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub x: i8,
    pub y: i8,
    pub z: i8,
}

impl Position {
    pub fn new(x: i8, y: i8, z: i8) -> Self {
        Self { x, y, z }
    }

    pub fn from_world(x: f32, y: f32, z: f32) -> Self {
        Self {
            x: scale_to_i8(x),
            y: scale_to_i8(y),
            z: scale_to_i8(z),
        }
    }

    pub fn to_world(self) -> (f32, f32, f32) {
        (
            scale_from_i8(self.x),
            scale_from_i8(self.y),
            scale_from_i8(self.z),
        )
    }
}

/// Saturates at the `i8` bounds instead of wrapping.
pub fn scale_to_i8(value: f32) -> i8 {
    (value * SCALING_FACTOR) as i8
}

pub fn scale_from_i8(value: i8) -> f32 {
    value as f32 / SCALING_FACTOR
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationParcel {
    pub id: PlayerId,
    pub position: Position,
}

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("empty message")]
    Empty,
    #[error("unknown message kind {0}")]
    UnknownKind(u8),
    #[error("{kind} message has length {actual}, expected {expected}")]
    WrongLength {
        kind: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("locations payload of {0} bytes is not a whole number of parcels")]
    MisalignedLocations(usize),
    #[error("invalid team byte {0}")]
    InvalidTeam(u8),
    #[error("codec error: {0}")]
    Codec(#[from] bincode::Error),
}

fn expect_len(kind: &'static str, bytes: &[u8], expected: usize) -> Result<(), ProtocolError> {
    if bytes.len() == expected {
        Ok(())
    } else {
        Err(ProtocolError::WrongLength {
            kind,
            expected,
            actual: bytes.len(),
        })
    }
}

/// Header bytes of client -> server messages.
pub mod client_header {
    pub const HIT: u8 = 0;
    pub const SHOT: u8 = 1;
    pub const LOCATION: u8 = 2;
}

/// Header bytes of server -> client messages.
pub mod server_header {
    pub const NEXT_ROUND: u8 = 0;
    pub const PLAY: u8 = 1;
    pub const LOCATIONS: u8 = 2;
    pub const SHOT: u8 = 3;
    pub const KILLED: u8 = 4;
    pub const TEAM_POINT: u8 = 5;
    pub const LOSE_HEALTH: u8 = 6;
    pub const PLAYER_DISCONNECT: u8 = 7;
    pub const GAME_OVER: u8 = 8;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientMessage {
    /// The sender claims to have hit `target` for `damage` points.
    Hit { target: PlayerId, damage: u8 },
    Shot,
    Location(Position),
}

impl ClientMessage {
    pub fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        let bytes = match self {
            ClientMessage::Hit { target, damage } => vec![client_header::HIT, *target, *damage],
            ClientMessage::Shot => vec![client_header::SHOT],
            ClientMessage::Location(position) => {
                let mut buf = vec![client_header::LOCATION];
                bincode::serialize_into(&mut buf, position)?;
                buf
            }
        };
        Ok(bytes)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, ProtocolError> {
        let (&kind, payload) = bytes.split_first().ok_or(ProtocolError::Empty)?;
        match kind {
            client_header::HIT => {
                expect_len("hit", bytes, 3)?;
                Ok(ClientMessage::Hit {
                    target: payload[0],
                    damage: payload[1],
                })
            }
            client_header::SHOT => {
                expect_len("shot", bytes, 1)?;
                Ok(ClientMessage::Shot)
            }
            client_header::LOCATION => {
                expect_len("location", bytes, 4)?;
                Ok(ClientMessage::Location(bincode::deserialize(payload)?))
            }
            other => Err(ProtocolError::UnknownKind(other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    NextRound,
    Play,
    Locations(Vec<LocationParcel>),
    Shot { shooter: PlayerId },
    Killed { killer: PlayerId, victim: PlayerId },
    TeamPoint(Team),
    LoseHealth(u8),
    PlayerDisconnect(PlayerId),
    GameOver { team_a_points: u8, team_b_points: u8 },
}

impl ServerMessage {
    pub fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        let bytes = match self {
            ServerMessage::NextRound => vec![server_header::NEXT_ROUND],
            ServerMessage::Play => vec![server_header::PLAY],
            ServerMessage::Locations(parcels) => {
                let mut buf = Vec::with_capacity(1 + parcels.len() * LOCATION_PARCEL_SIZE);
                buf.push(server_header::LOCATIONS);
                for parcel in parcels {
                    bincode::serialize_into(&mut buf, parcel)?;
                }
                buf
            }
            ServerMessage::Shot { shooter } => vec![server_header::SHOT, *shooter],
            ServerMessage::Killed { killer, victim } => {
                vec![server_header::KILLED, *killer, *victim]
            }
            ServerMessage::TeamPoint(team) => vec![server_header::TEAM_POINT, team.to_byte()],
            ServerMessage::LoseHealth(damage) => vec![server_header::LOSE_HEALTH, *damage],
            ServerMessage::PlayerDisconnect(id) => vec![server_header::PLAYER_DISCONNECT, *id],
            ServerMessage::GameOver {
                team_a_points,
                team_b_points,
            } => vec![server_header::GAME_OVER, *team_a_points, *team_b_points],
        };
        Ok(bytes)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, ProtocolError> {
        let (&kind, payload) = bytes.split_first().ok_or(ProtocolError::Empty)?;
        match kind {
            server_header::NEXT_ROUND => {
                expect_len("next round", bytes, 1)?;
                Ok(ServerMessage::NextRound)
            }
            server_header::PLAY => {
                expect_len("play", bytes, 1)?;
                Ok(ServerMessage::Play)
            }
            server_header::LOCATIONS => {
                if payload.len() % LOCATION_PARCEL_SIZE != 0 {
                    return Err(ProtocolError::MisalignedLocations(payload.len()));
                }
                let parcels = payload
                    .chunks_exact(LOCATION_PARCEL_SIZE)
                    .map(|chunk| bincode::deserialize::<LocationParcel>(chunk))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(ServerMessage::Locations(parcels))
            }
            server_header::SHOT => {
                expect_len("shot", bytes, 2)?;
                Ok(ServerMessage::Shot {
                    shooter: payload[0],
                })
            }
            server_header::KILLED => {
                expect_len("killed", bytes, 3)?;
                Ok(ServerMessage::Killed {
                    killer: payload[0],
                    victim: payload[1],
                })
            }
            server_header::TEAM_POINT => {
                expect_len("team point", bytes, 2)?;
                let team = Team::from_byte(payload[0])
                    .ok_or(ProtocolError::InvalidTeam(payload[0]))?;
                Ok(ServerMessage::TeamPoint(team))
            }
            server_header::LOSE_HEALTH => {
                expect_len("lose health", bytes, 2)?;
                Ok(ServerMessage::LoseHealth(payload[0]))
            }
            server_header::PLAYER_DISCONNECT => {
                expect_len("player disconnect", bytes, 2)?;
                Ok(ServerMessage::PlayerDisconnect(payload[0]))
            }
            server_header::GAME_OVER => {
                expect_len("game over", bytes, 3)?;
                Ok(ServerMessage::GameOver {
                    team_a_points: payload[0],
                    team_b_points: payload[1],
                })
            }
            other => Err(ProtocolError::UnknownKind(other)),
        }
    }
}

/// Reply to the one-byte id handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeResponse {
    Success,
    Failure,
}

impl HandshakeResponse {
    pub fn to_byte(self) -> u8 {
        match self {
            HandshakeResponse::Success => HANDSHAKE_SUCCESS,
            HandshakeResponse::Failure => HANDSHAKE_FAILURE,
        }
    }

    /// Anything other than a single success byte counts as a failure.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        match bytes {
            [HANDSHAKE_SUCCESS] => HandshakeResponse::Success,
            _ => HandshakeResponse::Failure,
        }
    }
}
