//! Objectives (daily and lifetime goals)
//!
//! Each objective counts one kind of milestone up to a target. Daily
//! objectives start over when the UTC day changes. Progress is stored as
//! JSON in the key-value store.

use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use super::ProgressionSink;
use crate::error::Result;
use crate::events::{CallbackId, Callbacks};
use crate::persistence::{self, SharedStore};

/// Storage key for objective progress
pub const STORAGE_KEY: &str = "ObjectivesState_v1";

/// What advances an objective
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectiveTrigger {
    SessionStart,
    LevelCompleted,
    ToggleUsed,
    /// Completion within the clean-run toggle budget
    LevelCompletedClean,
}

/// Static description of an objective
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveDefinition {
    pub id: String,
    pub title: String,
    pub description: String,
    pub trigger: ObjectiveTrigger,
    pub target: u32,
    pub resets_daily: bool,
}

impl ObjectiveDefinition {
    fn new(
        id: &str,
        title: &str,
        description: &str,
        trigger: ObjectiveTrigger,
        target: u32,
        resets_daily: bool,
    ) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            trigger,
            target,
            resets_daily,
        }
    }
}

/// Stored progress for one objective
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectiveProgress {
    pub id: String,
    pub progress: u32,
    pub completed: bool,
    /// UTC day (days since the Unix epoch) of the last refresh
    pub last_refresh_day: i64,
}

impl ObjectiveProgress {
    fn fresh(id: &str, today: i64) -> Self {
        Self {
            id: id.to_string(),
            progress: 0,
            completed: false,
            last_refresh_day: today,
        }
    }

    fn reset_if_stale(&mut self, today: i64) {
        if self.last_refresh_day != today {
            self.progress = 0;
            self.completed = false;
            self.last_refresh_day = today;
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ProgressList {
    items: Vec<ObjectiveProgress>,
}

/// Emitted whenever an objective's progress changes
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectiveUpdate {
    pub definition: ObjectiveDefinition,
    pub progress: ObjectiveProgress,
}

/// Built-in objective list
pub fn default_objectives() -> Vec<ObjectiveDefinition> {
    use ObjectiveTrigger::*;
    vec![
        ObjectiveDefinition::new(
            "session_welcome",
            "Come back today",
            "Start a game every day to keep the streak going.",
            SessionStart,
            1,
            true,
        ),
        ObjectiveDefinition::new(
            "first_clear",
            "First success",
            "Finish any level to unlock your first badge.",
            LevelCompleted,
            1,
            false,
        ),
        ObjectiveDefinition::new(
            "triple_clear",
            "Winning streak",
            "Finish 3 levels today.",
            LevelCompleted,
            3,
            true,
        ),
        ObjectiveDefinition::new(
            "toggle_spree",
            "Toggle mania",
            "Use 25 toggles today.",
            ToggleUsed,
            25,
            true,
        ),
        ObjectiveDefinition::new(
            "clean_run",
            "Mastery",
            "Finish a level using 3 toggles or fewer.",
            LevelCompletedClean,
            1,
            true,
        ),
    ]
}

/// Current UTC day as days since the Unix epoch
pub fn utc_today() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| (d.as_secs() / 86_400) as i64)
        .unwrap_or(0)
}

/// Tracks objective progress and persists it
pub struct ObjectiveTracker {
    store: SharedStore,
    definitions: Vec<ObjectiveDefinition>,
    progress: BTreeMap<String, ObjectiveProgress>,
    today: i64,
    on_updated: Callbacks<ObjectiveUpdate>,
}

impl std::fmt::Debug for ObjectiveTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectiveTracker")
            .field("today", &self.today)
            .field("progress", &self.progress)
            .finish()
    }
}

impl ObjectiveTracker {
    /// Load stored progress (corrupt data starts over) and apply daily resets
    pub fn load(store: SharedStore, definitions: Vec<ObjectiveDefinition>, today: i64) -> Self {
        let stored: ProgressList = match persistence::load_json(&*store.borrow(), STORAGE_KEY) {
            Ok(Some(list)) => list,
            Ok(None) => ProgressList::default(),
            Err(e) => {
                log::warn!("Discarding unreadable objective progress: {e}");
                ProgressList::default()
            }
        };

        let mut tracker = Self {
            store,
            definitions,
            progress: stored.items.into_iter().map(|p| (p.id.clone(), p)).collect(),
            today,
            on_updated: Callbacks::new(),
        };
        tracker.ensure_defaults();
        if let Err(e) = tracker.save() {
            log::warn!("Could not save objective progress: {e}");
        }
        tracker
    }

    /// Tracker with the built-in objectives, dated today
    pub fn with_defaults(store: SharedStore) -> Self {
        Self::load(store, default_objectives(), utc_today())
    }

    fn ensure_defaults(&mut self) {
        let today = self.today;
        for def in &self.definitions {
            let entry = self
                .progress
                .entry(def.id.clone())
                .or_insert_with(|| ObjectiveProgress::fresh(&def.id, today));
            if def.resets_daily {
                entry.reset_if_stale(today);
            }
        }
    }

    /// Move the tracker's notion of "today" (day rollover while running)
    pub fn set_today(&mut self, today: i64) {
        self.today = today;
        self.ensure_defaults();
    }

    pub fn objectives(&self) -> &[ObjectiveDefinition] {
        &self.definitions
    }

    pub fn progress(&self, id: &str) -> Option<&ObjectiveProgress> {
        self.progress.get(id)
    }

    pub fn on_updated(&mut self, handler: impl FnMut(&ObjectiveUpdate) + 'static) -> CallbackId {
        self.on_updated.subscribe(handler)
    }

    pub fn register_session_start(&mut self) -> Result<()> {
        self.advance(ObjectiveTrigger::SessionStart, 1)
    }

    fn advance(&mut self, trigger: ObjectiveTrigger, amount: u32) -> Result<()> {
        let today = self.today;
        for def in &self.definitions {
            if def.trigger != trigger {
                continue;
            }
            let entry = self
                .progress
                .entry(def.id.clone())
                .or_insert_with(|| ObjectiveProgress::fresh(&def.id, today));
            if def.resets_daily {
                entry.reset_if_stale(today);
            }
            if entry.completed {
                continue;
            }

            entry.progress = (entry.progress + amount).min(def.target);
            entry.last_refresh_day = today;
            if entry.progress >= def.target {
                entry.completed = true;
                log::info!("Objective '{}' completed", def.id);
            }

            self.on_updated.dispatch(&ObjectiveUpdate {
                definition: def.clone(),
                progress: entry.clone(),
            });
        }
        self.save()
    }

    fn save(&self) -> Result<()> {
        let list = ProgressList {
            items: self.progress.values().cloned().collect(),
        };
        persistence::save_json(&mut *self.store.borrow_mut(), STORAGE_KEY, &list)
    }
}

impl ProgressionSink for ObjectiveTracker {
    fn register_toggle_used(&mut self) -> Result<()> {
        self.advance(ObjectiveTrigger::ToggleUsed, 1)
    }

    fn register_level_completed(&mut self, _level: usize) -> Result<()> {
        self.advance(ObjectiveTrigger::LevelCompleted, 1)
    }

    fn register_level_completed_clean(&mut self, _level: usize) -> Result<()> {
        self.advance(ObjectiveTrigger::LevelCompletedClean, 1)
    }
}
