//! Conquest-Bot: a rule-based bot for a 12x12 territory-conquest game.
//!
//! Each turn the server sends a full snapshot (tiles, buildings, units and
//! both players' gold and income). The bot answers with a line of training,
//! movement and building commands chosen by a small set of prioritised
//! policies.
//!
//! ## Modules
//!
//! - [`constants`] - Grid size, costs and engine defaults
//! - [`board`] - Coordinates, tile states and the tile grid
//! - [`game`] - Snapshot ingestion, players, units and buildings
//! - [`pathfinding`] - A* over walkable tiles
//! - [`analyzers`] - Read-only tactical queries (frontier, towers, choke
//!   points, kill paths)
//! - [`strategy`] - Phases, policies and the per-turn commit ledger
//! - [`action`] - Output commands
//! - [`protocol`] - Text protocol reader/writer and the turn loop
//! - [`error`] - Error type for malformed input
//!
//! ## Example
//!
//! ```
//! use std::io::Cursor;
//! use conquest_bot::protocol::Bot;
//!
//! let mut input = String::from("0\n20 1 20 1\n");
//! input.push_str("O...........\n");
//! for _ in 0..10 {
//!     input.push_str("............\n");
//! }
//! input.push_str("...........X\n");
//! input.push_str("2\n0 0 0 0\n1 0 11 11\n0\n");
//!
//! let mut output = Vec::new();
//! Bot::default().run(Cursor::new(input), &mut output).unwrap();
//! let line = String::from_utf8(output).unwrap();
//! assert!(line.starts_with("TRAIN 1 "));
//! assert!(line.trim_end().ends_with("WAIT;"));
//! ```

pub mod action;
pub mod analyzers;
pub mod board;
pub mod constants;
pub mod error;
pub mod game;
pub mod pathfinding;
pub mod protocol;
pub mod strategy;
