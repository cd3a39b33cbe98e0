//! The shared tile bag: build, shuffle, draw, deal.

use crate::tile::{Tile, TileDistribution};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// The undrawn pool of tiles for one match.
///
/// Serialized as a bare tile array so clients see `bag` as a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Bag {
    tiles: Vec<Tile>,
}

impl Bag {
    /// Build a fully shuffled bag from a distribution table.
    ///
    /// Every entry contributes `count` copies, plus the configured
    /// wildcards; the whole pool is then shuffled in place (Fisher-Yates
    /// via `SliceRandom::shuffle`, unbiased given a uniform source).
    pub fn build<R: Rng>(distribution: &TileDistribution, rng: &mut R) -> Self {
        let mut tiles = Vec::with_capacity(distribution.total_tiles() as usize);

        for entry in &distribution.entries {
            tiles.extend(
                std::iter::repeat(Tile::new(entry.letter, entry.points))
                    .take(entry.count as usize),
            );
        }
        tiles.extend(std::iter::repeat(Tile::wildcard()).take(distribution.wildcards as usize));

        tiles.shuffle(rng);

        Self { tiles }
    }

    /// Draw the next `n` tiles from the front of the bag.
    ///
    /// Returns fewer than `n` tiles when the bag runs out.
    pub fn draw(&mut self, n: usize) -> Vec<Tile> {
        let n = n.min(self.tiles.len());
        self.tiles.drain(..n).collect()
    }

    /// Deal `players` consecutive racks of `rack_size` tiles each.
    pub fn deal(&mut self, players: usize, rack_size: usize) -> Vec<Vec<Tile>> {
        (0..players).map(|_| self.draw(rack_size)).collect()
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }
}
