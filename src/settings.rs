//! Tuning settings
//!
//! Loaded from JSON (a file, or the key-value store). Every field has a
//! default, so partial files are fine.

use serde::{Deserialize, Serialize};

use crate::consts::{CLEAN_RUN_MAX_TOGGLES, MAX_SUBSTEPS, SIM_DT, TRANSITION_DURATION};
use crate::error::Result;
use crate::persistence::{self, KeyValueStore};
use crate::sim::easing::TransitionCurve;

/// Vacuum goal tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GoalSettings {
    /// Pull strength (acceleration = force / distance)
    pub attraction_force: f32,
    /// Radius of the pull zone
    pub suction_radius: f32,
    /// Inside this distance the pull stops
    pub suction_stop_distance: f32,
    /// Inside this distance the player is caught and recentred
    pub capture_radius: f32,
    /// Inside this distance the level completes
    pub complete_distance: f32,
    /// Recentering speed while caught
    pub recenter_rate: f32,
}

impl Default for GoalSettings {
    fn default() -> Self {
        Self {
            attraction_force: 20.0,
            suction_radius: 5.0,
            suction_stop_distance: 0.1,
            capture_radius: 2.5,
            complete_distance: 0.5,
            recenter_rate: 5.0,
        }
    }
}

/// Game tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Fixed simulation step in seconds
    pub fixed_dt: f32,
    /// Maximum fixed steps per rendered frame
    pub max_substeps: u32,

    // === Transitions ===
    /// Seconds to move between poses (<= 0 snaps instantly)
    pub transition_duration: f32,
    pub transition_curve: TransitionCurve,

    // === Goal ===
    pub goal: GoalSettings,

    // === Progression ===
    /// Toggles allowed for a completion to count as clean
    pub clean_run_max_toggles: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            fixed_dt: SIM_DT,
            max_substeps: MAX_SUBSTEPS,
            transition_duration: TRANSITION_DURATION,
            transition_curve: TransitionCurve::Linear,
            goal: GoalSettings::default(),
            clean_run_max_toggles: CLEAN_RUN_MAX_TOGGLES,
        }
    }
}

impl Settings {
    /// Store key
    pub const STORAGE_KEY: &'static str = "flipstate_settings";

    /// Settings with instant transitions (editor preview, tests)
    pub fn instant() -> Self {
        Self {
            transition_duration: 0.0,
            ..Self::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let settings: Settings = serde_json::from_str(json)?;
        Ok(settings.sanitized())
    }

    /// Load from a JSON file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    /// Load from the store, falling back to defaults
    pub fn load(store: &dyn KeyValueStore) -> Self {
        match persistence::load_json::<Settings>(store, Self::STORAGE_KEY) {
            Ok(Some(settings)) => {
                log::info!("Loaded settings from store");
                settings.sanitized()
            }
            Ok(None) => {
                log::info!("Using default settings");
                Self::default()
            }
            Err(e) => {
                log::warn!("Unreadable settings ({e}); using defaults");
                Self::default()
            }
        }
    }

    pub fn save(&self, store: &mut dyn KeyValueStore) -> Result<()> {
        persistence::save_json(store, Self::STORAGE_KEY, self)?;
        log::info!("Settings saved");
        Ok(())
    }

    /// Replace values the simulation cannot run with
    fn sanitized(mut self) -> Self {
        if self.fixed_dt.is_nan() || self.fixed_dt <= 0.0 {
            log::warn!("fixed_dt {} is not positive; using {}", self.fixed_dt, SIM_DT);
            self.fixed_dt = SIM_DT;
        }
        if self.max_substeps == 0 {
            self.max_substeps = 1;
        }
        if self.transition_duration.is_nan() {
            self.transition_duration = 0.0;
        }
        self
    }
}
