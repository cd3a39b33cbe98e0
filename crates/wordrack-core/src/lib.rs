//! WordRack - game domain for a two-player word-tile game
//!
//! This crate provides the state the coordination server deals and
//! broadcasts, including:
//! - Tile distribution tables and the shared shuffled bag
//! - Board layout catalog and the 15x15 board grid
//! - The `GameSession` authoritative match state
//!
//! # Architecture
//!
//! The crate is pure logic with no I/O: every operation that needs
//! entropy takes a caller-supplied `rand::Rng`, so servers use a thread
//! rng and tests use a seeded one. Word validity and scoring rules are
//! deliberately absent; racks and scores are carried as data for clients.
//!
//! # Modules
//!
//! - [`tile`]: tiles and the letter frequency table
//! - [`bag`]: bag construction, shuffling and dealing
//! - [`layout`]: the named special-tile layout catalog
//! - [`board`]: the fixed 15x15 cell grid
//! - [`session`]: the per-room authoritative match state

pub mod bag;
pub mod board;
pub mod layout;
pub mod session;
pub mod tile;

// Re-export commonly used types
pub use bag::Bag;
pub use board::{Board, BOARD_SIZE};
pub use layout::{LayoutCatalog, FALLBACK_LAYOUT};
pub use session::{GameSession, PlayerState, Seat, RACK_SIZE, REQUIRED_PLAYERS};
pub use tile::{Tile, TileDistribution, TileFrequency, WILDCARD_LETTER};
