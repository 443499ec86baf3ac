//! Star scores per level
//!
//! Persisted in the key-value store. The latest result for a level replaces
//! the previous one.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::ScoreSink;
use crate::error::Result;
use crate::persistence::{self, SharedStore};

/// Storage key for star scores
pub const STORAGE_KEY: &str = "StarScores";

/// Star scores keyed by level index. Sparse: any index is storable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StarScores {
    pub levels: BTreeMap<usize, u32>,
}

impl StarScores {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stars recorded for `level` (0 if never finished)
    pub fn stars(&self, level: usize) -> u32 {
        self.levels.get(&level).copied().unwrap_or(0)
    }

    /// Record a result, replacing any earlier one
    pub fn set(&mut self, level: usize, stars: u32) {
        self.levels.insert(level, stars);
    }

    pub fn total_stars(&self) -> u32 {
        self.levels.values().fold(0, |acc, &s| acc.saturating_add(s))
    }

    /// Number of levels with at least one star
    pub fn levels_cleared(&self) -> usize {
        self.levels.values().filter(|&&s| s > 0).count()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

/// Score table bound to a store
pub struct ScoreBook {
    store: SharedStore,
    scores: StarScores,
}

impl std::fmt::Debug for ScoreBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScoreBook").field("scores", &self.scores).finish()
    }
}

impl ScoreBook {
    /// Load scores from the store (unreadable data starts fresh)
    pub fn load(store: SharedStore) -> Self {
        let scores = match persistence::load_json(&*store.borrow(), STORAGE_KEY) {
            Ok(Some(scores)) => {
                log::info!("Loaded star scores");
                scores
            }
            Ok(None) => StarScores::new(),
            Err(e) => {
                log::warn!("Discarding unreadable star scores: {e}");
                StarScores::new()
            }
        };
        Self { store, scores }
    }

    pub fn scores(&self) -> &StarScores {
        &self.scores
    }

    pub fn stars(&self, level: usize) -> u32 {
        self.scores.stars(level)
    }

    pub fn total_stars(&self) -> u32 {
        self.scores.total_stars()
    }

    fn save(&self) -> Result<()> {
        persistence::save_json(&mut *self.store.borrow_mut(), STORAGE_KEY, &self.scores)?;
        log::info!("Star scores saved ({} levels)", self.scores.levels.len());
        Ok(())
    }
}

impl ScoreSink for ScoreBook {
    fn update_score(&mut self, level: usize, stars: u32) -> Result<()> {
        self.scores.set(level, stars);
        self.save()
    }
}
