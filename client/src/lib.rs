//! # Headless Game Client Library
//!
//! A client for the team shooter server that plays without a window. It
//! speaks the full wire protocol and keeps the same view of the match a
//! rendering client would, which makes it useful for load testing and for
//! filling empty slots during development.
//!
//! ## Module Organization
//!
//! ### Game Module (`game`)
//! The client's picture of the match, built only from server messages:
//! - Round counter and whether the local player may act
//! - Health, kills and deaths of the local player
//! - Last known state and position of every other player
//! - Team points and the final scoreboard
//!
//! ### Bot Module (`bot`)
//! Replaces keyboard and mouse input. The bot wanders around the arena and
//! now and then fires, reporting a hit on a random opponent it has seen alive.
//!
//! ### Network Module (`network`)
//! Owns the WebSocket connection:
//! - The one-byte id handshake
//! - Location updates at a fixed rate once the first round is announced
//! - Forwarding the bot's shots and hits
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::network::Client;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::connect("ws://127.0.0.1:8080/ws", 0).await?;
//!     let game = client.run().await?;
//!     print!("{}", game.scoreboard());
//!     Ok(())
//! }
//! ```

pub mod bot;
pub mod game;
pub mod network;

pub use game::ClientGameState;
pub use network::{Client, ClientError};
