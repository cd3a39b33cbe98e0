//! Board layout selection.
//!
//! The catalog holds layout identifiers only; which cells a layout marks
//! as bonus cells is a client concern.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Identifier used when no catalog is available.
pub const FALLBACK_LAYOUT: &str = "default";

/// A fixed catalog of named special-tile layouts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayoutCatalog {
    names: Vec<String>,
}

impl LayoutCatalog {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    /// The layouts shipped with the game.
    pub fn standard() -> Self {
        Self::new(
            ["default", "corners", "diamond", "crossfire"]
                .into_iter()
                .map(String::from)
                .collect(),
        )
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Pick one layout uniformly at random, or [`FALLBACK_LAYOUT`] when
    /// the catalog is empty.
    pub fn choose<R: Rng>(&self, rng: &mut R) -> String {
        self.names
            .choose(rng)
            .cloned()
            .unwrap_or_else(|| FALLBACK_LAYOUT.to_string())
    }
}

impl Default for LayoutCatalog {
    fn default() -> Self {
        Self::standard()
    }
}
