//! The authoritative per-room match state.

use crate::bag::Bag;
use crate::board::Board;
use crate::layout::LayoutCatalog;
use crate::tile::{Tile, TileDistribution};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Tiles dealt to each player at match start.
pub const RACK_SIZE: usize = 7;

/// Players required before a match can start.
pub const REQUIRED_PLAYERS: usize = 2;

/// A player's identity and role going into the deal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seat {
    pub username: String,
    pub user_id: Option<String>,
    pub is_guest: bool,
    pub player_number: u8,
    pub is_host: bool,
}

/// One player's state within a session.
///
/// Field names follow the client wire contract (camelCase).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerState {
    pub username: String,
    pub user_id: Option<String>,
    pub is_guest: bool,
    pub player_number: u8,
    pub is_host: bool,
    pub rack: Vec<Tile>,
    pub score: u32,
}

/// The authoritative state of one in-progress match.
///
/// Created whole on game start, replaced whole by later move broadcasts;
/// there is no incremental-patch contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSession {
    pub players: Vec<PlayerState>,
    pub bag: Bag,
    pub current_player_index: usize,
    pub board_tiles: Board,
    pub active_layout: String,
}

impl GameSession {
    /// Deal a fresh session: build and shuffle a bag from the
    /// distribution, give the first [`REQUIRED_PLAYERS`] seats
    /// [`RACK_SIZE`] tiles each in seat order, keep the remainder as the
    /// session bag, pick a layout, and start on an empty board with
    /// player 0 to move.
    ///
    /// Callers pass seats sorted ascending by player number; that order is
    /// preserved in `players`.
    pub fn deal<R: Rng>(
        seats: Vec<Seat>,
        distribution: &TileDistribution,
        layouts: &LayoutCatalog,
        rng: &mut R,
    ) -> Self {
        let mut bag = Bag::build(distribution, rng);
        let mut racks = bag.deal(seats.len().min(REQUIRED_PLAYERS), RACK_SIZE).into_iter();

        let players = seats
            .into_iter()
            .map(|seat| PlayerState {
                username: seat.username,
                user_id: seat.user_id,
                is_guest: seat.is_guest,
                player_number: seat.player_number,
                is_host: seat.is_host,
                rack: racks.next().unwrap_or_default(),
                score: 0,
            })
            .collect();

        Self {
            players,
            bag,
            current_player_index: 0,
            board_tiles: Board::empty(),
            active_layout: layouts.choose(rng),
        }
    }
}
