//! Hold-to-toggle input bridge
//!
//! Turns the raw "is pressed" signal into exactly one `set_state` call per
//! press and one per release.

use super::level::LevelStateController;
use crate::progress::Collaborators;
use crate::scene::World;

/// Raw input sample for one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputSample {
    /// Toggle key held
    pub key_held: bool,
    /// Number of active touches/pointers
    pub touch_count: u32,
}

impl InputSample {
    pub fn pressed(pressed: bool) -> Self {
        Self {
            key_held: pressed,
            touch_count: 0,
        }
    }

    /// Key held OR at least one active pointer
    #[inline]
    pub fn is_pressed(&self) -> bool {
        self.key_held || self.touch_count > 0
    }
}

/// Edge detector between input and the level controller
#[derive(Debug, Clone, Default)]
pub struct ToggleInputBridge {
    previous_pressed: bool,
}

impl ToggleInputBridge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn previous_pressed(&self) -> bool {
        self.previous_pressed
    }

    /// Process one input sample.
    ///
    /// Returns the state requested on this tick, if an edge fired. The last
    /// seen value is recorded even while paused, so unpausing with the input
    /// still held does not fire a stale edge.
    pub fn update(
        &mut self,
        pressed: bool,
        level: &mut LevelStateController,
        world: &mut dyn World,
        collaborators: &mut Collaborators,
    ) -> Option<bool> {
        if level.is_paused() {
            self.previous_pressed = pressed;
            return None;
        }

        let edge = pressed != self.previous_pressed;
        self.previous_pressed = pressed;
        if !edge {
            return None;
        }

        level.set_state(world, pressed);
        if pressed {
            let used = level.register_toggle();
            log::debug!("Toggle on ({used} used this run)");
            collaborators.toggle_used();
        }
        Some(pressed)
    }

    /// Forget the previous sample (level restart)
    pub fn reset(&mut self, pressed: bool) {
        self.previous_pressed = pressed;
    }
}
