//! Tiles and the letter distribution table.
//!
//! This module contains:
//! - Tile: a single drawable letter with its point value
//! - TileFrequency: one row of a distribution table
//! - TileDistribution: the injected letter set for a match

use serde::{Deserialize, Serialize};

/// The letter printed on wildcard tiles.
pub const WILDCARD_LETTER: char = '*';

/// A single drawable tile: a letter and its point value.
///
/// Wildcard ("joker") tiles carry [`WILDCARD_LETTER`] and are worth 0.
/// Tiles are immutable once generated; ownership moves from the bag to a
/// rack when dealt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tile {
    pub letter: char,
    pub points: u32,
}

impl Tile {
    pub fn new(letter: char, points: u32) -> Self {
        Self { letter, points }
    }

    /// Create a wildcard tile (no fixed letter, 0 points).
    pub fn wildcard() -> Self {
        Self {
            letter: WILDCARD_LETTER,
            points: 0,
        }
    }

    pub fn is_wildcard(&self) -> bool {
        self.letter == WILDCARD_LETTER
    }
}

/// One row of a tile distribution table: how many copies of a letter the
/// bag contains and what each copy scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileFrequency {
    pub letter: char,
    pub points: u32,
    pub count: u32,
}

impl TileFrequency {
    pub const fn new(letter: char, points: u32, count: u32) -> Self {
        Self {
            letter,
            points,
            count,
        }
    }
}

/// The letter set for one match: a frequency table plus a wildcard count.
///
/// The distribution is configuration handed to the coordinator at startup,
/// not a hardcoded constant of the bag logic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileDistribution {
    pub entries: Vec<TileFrequency>,
    pub wildcards: u32,
}

impl TileDistribution {
    pub fn new(entries: Vec<TileFrequency>, wildcards: u32) -> Self {
        Self { entries, wildcards }
    }

    /// The standard Georgian letter set: 33 letters plus 3 wildcards,
    /// 141 tiles total.
    pub fn georgian() -> Self {
        Self::new(
            vec![
                TileFrequency::new('ა', 1, 10),
                TileFrequency::new('ბ', 3, 5),
                TileFrequency::new('გ', 2, 4),
                TileFrequency::new('დ', 2, 6),
                TileFrequency::new('ე', 1, 8),
                TileFrequency::new('ვ', 4, 3),
                TileFrequency::new('ზ', 4, 3),
                TileFrequency::new('თ', 3, 5),
                TileFrequency::new('ი', 1, 10),
                TileFrequency::new('კ', 5, 2),
                TileFrequency::new('ლ', 2, 6),
                TileFrequency::new('მ', 3, 5),
                TileFrequency::new('ნ', 1, 8),
                TileFrequency::new('ო', 1, 8),
                TileFrequency::new('პ', 4, 3),
                TileFrequency::new('ჟ', 8, 1),
                TileFrequency::new('რ', 2, 6),
                TileFrequency::new('ს', 1, 8),
                TileFrequency::new('ტ', 3, 5),
                TileFrequency::new('უ', 1, 7),
                TileFrequency::new('ფ', 5, 2),
                TileFrequency::new('ქ', 4, 3),
                TileFrequency::new('ღ', 6, 2),
                TileFrequency::new('ყ', 7, 1),
                TileFrequency::new('შ', 4, 2),
                TileFrequency::new('ჩ', 4, 2),
                TileFrequency::new('ც', 3, 2),
                TileFrequency::new('ძ', 7, 1),
                TileFrequency::new('წ', 6, 2),
                TileFrequency::new('ჭ', 6, 2),
                TileFrequency::new('ხ', 3, 2),
                TileFrequency::new('ჯ', 5, 2),
                TileFrequency::new('ჰ', 10, 2),
            ],
            3,
        )
    }

    /// Total number of tiles the distribution produces, wildcards included.
    pub fn total_tiles(&self) -> u32 {
        self.entries.iter().map(|e| e.count).sum::<u32>() + self.wildcards
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wildcard_tile() {
        let tile = Tile::wildcard();
        assert!(tile.is_wildcard());
        assert_eq!(tile.points, 0);

        let tile = Tile::new('ა', 1);
        assert!(!tile.is_wildcard());
    }

    #[test]
    fn test_georgian_distribution_totals() {
        let dist = TileDistribution::georgian();
        assert_eq!(dist.entries.len(), 33);
        assert_eq!(dist.wildcards, 3);
        assert_eq!(dist.total_tiles(), 141);
    }

    #[test]
    fn test_tile_serializes_letter_as_string() {
        let json = serde_json::to_value(Tile::new('ა', 1)).unwrap();
        assert_eq!(json["letter"], "ა");
        assert_eq!(json["points"], 1);
    }
}
