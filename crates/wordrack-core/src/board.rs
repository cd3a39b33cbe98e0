//! The 15x15 board grid.

use crate::tile::Tile;
use serde::{Deserialize, Serialize};

/// Board edge length, fixed at creation.
pub const BOARD_SIZE: usize = 15;

/// A 15x15 grid of cells, each empty or holding a placed tile.
///
/// Serialized transparently as nested arrays, so an empty board reads as
/// fifteen rows of fifteen `null`s on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Board {
    cells: Vec<Vec<Option<Tile>>>,
}

impl Board {
    /// Create an empty board.
    pub fn empty() -> Self {
        Self {
            cells: vec![vec![None; BOARD_SIZE]; BOARD_SIZE],
        }
    }

    pub fn get(&self, row: usize, col: usize) -> Option<Tile> {
        self.cells.get(row)?.get(col).copied().flatten()
    }

    /// Place a tile. Out-of-bounds coordinates are ignored.
    pub fn set(&mut self, row: usize, col: usize, tile: Tile) {
        if let Some(cell) = self.cells.get_mut(row).and_then(|r| r.get_mut(col)) {
            *cell = Some(tile);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cells.iter().flatten().all(|c| c.is_none())
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::empty()
    }
}
