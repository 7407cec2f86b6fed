//! # Team Shooter Server Library
//!
//! This library provides the authoritative server for a two-team, round-based
//! shooter. It admits up to six players into a lobby, runs a fixed sequence of
//! rounds, tracks every player's health and position, and relays combat and
//! movement events to all connected players.
//!
//! ## Core Responsibilities
//!
//! ### Lobby and Handshake
//! Each player connects over WebSocket and sends a single byte naming the slot
//! it wants. The server answers with one success or failure byte. Once the
//! configured number of players has joined, the first round starts and the
//! lobby closes for good.
//!
//! ### Round Control
//! A round moves through a countdown, an active phase and a resolution phase.
//! A round ends when one team has no living member left; the other team scores
//! a point if it still has someone standing. After the tenth round the server
//! announces the final score, closes every connection and exits.
//!
//! ### Event Relay
//! Hits, shots and location updates from players are validated against the
//! current round and applied to the shared state. Resulting events are fanned
//! out to every player, and a consolidated location snapshot goes out twelve
//! times per second.
//!
//! ## Architecture Design
//!
//! ### Single Lock
//! All match state lives in one [`GameState`] behind a `tokio::sync::Mutex`.
//! Each inbound message is applied inside one critical section, so the round
//! controller never observes a half-applied hit.
//!
//! ### Queued Writes
//! Broadcasting only pushes encoded frames onto per-connection queues. A writer
//! task per connection drains its queue to the socket, which keeps network I/O
//! out of the critical section and preserves per-connection ordering.
//!
//! ### Timed Transitions
//! Grace periods between rounds are returned from the state machine as
//! [`Deferred`] values. [`GameServer::schedule`] sleeps and then re-enters
//! the same lock; transitions for a round that has moved on are dropped.
//!
//! ## Module Organization
//!
//! - `config`: ports, lobby size and timing
//! - `player` and `registry`: slots, players and the handshake checks
//! - `round`: the round state machine
//! - `game`: the shared match state tying the above together
//! - `router`: inbound message handling
//! - `broadcast`: outbound fan-out and the snapshot task
//! - `network`: the WebSocket endpoint and task wiring
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::{GameServer, ServerConfig};
//! use tokio::net::TcpListener;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig::new(8080, 2);
//!     let listener = TcpListener::bind(config.bind_address()).await?;
//!
//!     // Runs until the last round is over
//!     GameServer::new(config).serve(listener).await?;
//!     Ok(())
//! }
//! ```

pub mod broadcast;
pub mod config;
pub mod game;
pub mod network;
pub mod player;
pub mod registry;
pub mod round;
pub mod router;

pub use config::ServerConfig;
pub use game::{Admission, GameState};
pub use network::GameServer;
pub use registry::HandshakeError;
pub use round::{Deferred, Phase};
