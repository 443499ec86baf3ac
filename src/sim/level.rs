//! Level state controller
//!
//! Owns the roster of controlled objects and their pose pairs, the
//! destroy-on-activate roster, the current toggle target and the toggle
//! counter. `set_state` restarts the transition from wherever the objects
//! currently are, so interrupted transitions never jump.

use super::animator::{PoseTrack, SessionHandle, StepOutcome, TransitionAnimator};
use super::easing::TransitionCurve;
use super::pose::{ObjectId, Pose, PoseSet};
use crate::events::{CallbackId, Callbacks};
use crate::scene::{SceneGraph, World};

/// Payload of the restore notification
#[derive(Debug, Clone, PartialEq)]
pub struct RestoreEvent {
    /// Destroy-roster objects that were reactivated
    pub restored: Vec<ObjectId>,
}

/// Per-level toggle state machine
#[derive(Debug)]
pub struct LevelStateController {
    objects: Vec<PoseSet>,
    destroy_roster: Vec<ObjectId>,
    animator: TransitionAnimator,
    current: Option<SessionHandle>,
    transition_duration: f32,
    transition_curve: TransitionCurve,
    current_target_state: bool,
    toggles_used: u32,
    paused: bool,
    on_restore: Callbacks<RestoreEvent>,
}

impl LevelStateController {
    pub fn new(transition_duration: f32, transition_curve: TransitionCurve) -> Self {
        Self {
            objects: Vec::new(),
            destroy_roster: Vec::new(),
            animator: TransitionAnimator::new(),
            current: None,
            transition_duration,
            transition_curve,
            current_target_state: false,
            toggles_used: 0,
            paused: false,
            on_restore: Callbacks::new(),
        }
    }

    /// Build from parallel arrays the way levels are authored.
    ///
    /// Mismatched lengths are tolerated: only the common prefix is used.
    pub fn from_arrays(
        items: &[ObjectId],
        on_poses: &[Option<Pose>],
        off_poses: &[Option<Pose>],
        destroy_roster: &[ObjectId],
        transition_duration: f32,
        transition_curve: TransitionCurve,
    ) -> Self {
        let len = items.len().min(on_poses.len()).min(off_poses.len());
        if len != items.len() || len != on_poses.len() || len != off_poses.len() {
            log::warn!(
                "Level arrays differ in length (items={}, on={}, off={}); using first {}",
                items.len(),
                on_poses.len(),
                off_poses.len(),
                len
            );
        }

        let mut level = Self::new(transition_duration, transition_curve);
        for i in 0..len {
            level.register_object(items[i], off_poses[i], on_poses[i], false);
        }
        for &id in destroy_roster {
            level.add_to_destroy_roster(id);
        }
        level
    }

    /// Add a controlled object. Objects missing either pose are excluded.
    /// Returns whether the object was registered.
    pub fn register_object(
        &mut self,
        object: ObjectId,
        off: Option<Pose>,
        on: Option<Pose>,
        destroy_on_activate: bool,
    ) -> bool {
        if destroy_on_activate {
            self.add_to_destroy_roster(object);
        }
        let Some(set) = PoseSet::new(object, off, on) else {
            // No poses at all on a destroy-roster entry is the normal authoring
            if !(destroy_on_activate && off.is_none() && on.is_none()) {
                log::warn!("Object {object} is missing a pose; excluded from transitions");
            }
            return false;
        };
        if let Some(existing) = self.objects.iter_mut().find(|s| s.object == object) {
            log::warn!("Object {object} registered twice; keeping latest poses");
            *existing = set;
        } else {
            self.objects.push(set);
        }
        true
    }

    /// Add an object that is only hidden on activate, never animated
    pub fn add_to_destroy_roster(&mut self, object: ObjectId) {
        if !self.destroy_roster.contains(&object) {
            self.destroy_roster.push(object);
        }
    }

    pub fn objects(&self) -> &[PoseSet] {
        &self.objects
    }

    pub fn destroy_roster(&self) -> &[ObjectId] {
        &self.destroy_roster
    }

    pub fn animator(&self) -> &TransitionAnimator {
        &self.animator
    }

    /// Last state requested (rendering may still lag behind)
    pub fn current_target_state(&self) -> bool {
        self.current_target_state
    }

    pub fn toggles_used(&self) -> u32 {
        self.toggles_used
    }

    pub fn register_toggle(&mut self) -> u32 {
        self.toggles_used += 1;
        self.toggles_used
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn transition_duration(&self) -> f32 {
        self.transition_duration
    }

    /// Applies from the next `set_state`; a transition in flight keeps its
    /// own duration and curve
    pub fn set_transition(&mut self, duration: f32, curve: TransitionCurve) {
        self.transition_duration = duration;
        self.transition_curve = curve;
    }

    /// Subscribe to restore notifications
    pub fn on_restore(&mut self, handler: impl FnMut(&RestoreEvent) + 'static) -> CallbackId {
        self.on_restore.subscribe(handler)
    }

    pub fn remove_restore_handler(&mut self, id: CallbackId) -> bool {
        self.on_restore.unsubscribe(id)
    }

    /// Request a toggle state.
    ///
    /// Cancels any transition in flight, captures current poses as the new
    /// start, and begins a fresh transition. Requesting On deactivates the
    /// destroy roster immediately, before any animation step runs.
    pub fn set_state(&mut self, world: &mut dyn World, target_state: bool) {
        if let Some(handle) = self.current.take() {
            self.animator.cancel(handle);
        }

        let tracks: Vec<PoseTrack> = self
            .objects
            .iter()
            .filter_map(|set| {
                let Some(start) = world.local_pose(set.object) else {
                    log::warn!("Object {} no longer exists; skipping", set.object);
                    return None;
                };
                Some(PoseTrack {
                    object: set.object,
                    start,
                    target: set.pose_for(target_state),
                })
            })
            .collect();

        let handle = self
            .animator
            .begin(
            world,
            target_state,
            tracks,
            self.transition_duration,
            self.transition_curve.clone(),
        );
        self.current = self.animator.is_running().then_some(handle);

        if target_state && !self.destroy_roster.is_empty() {
            self.destroy_on_activate(world);
        }

        self.current_target_state = target_state;
    }

    fn destroy_on_activate(&mut self, world: &mut dyn World) {
        for &id in &self.destroy_roster {
            if world.is_active(id) {
                world.set_active(id, false);
            }
        }
    }

    /// Reactivate the destroy roster and notify restore handlers.
    ///
    /// Handlers run on every call, not only when something was inactive.
    pub fn restore_destroyed_items(&mut self, world: &mut dyn World) {
        let mut restored = Vec::with_capacity(self.destroy_roster.len());
        for &id in &self.destroy_roster {
            if world.local_pose(id).is_none() {
                continue;
            }
            world.set_active(id, true);
            restored.push(id);
        }
        self.on_restore.dispatch(&RestoreEvent { restored });
    }

    /// Snap every object to the pose for `state` with no animation
    pub fn apply_immediate(&mut self, world: &mut dyn World, state: bool) {
        if let Some(handle) = self.current.take() {
            self.animator.cancel(handle);
        }
        let tracks: Vec<PoseTrack> = self
            .objects
            .iter()
            .map(|set| PoseTrack {
                object: set.object,
                start: set.pose_for(state),
                target: set.pose_for(state),
            })
            .collect();
        self.animator
            .begin(world, state, tracks, 0.0, TransitionCurve::Linear);
        self.current_target_state = state;
    }

    /// Back to a fresh run: Off poses, roster restored, counter cleared
    pub fn reset_run(&mut self, world: &mut dyn World) {
        self.apply_immediate(world, false);
        self.toggles_used = 0;
        self.paused = false;
        for &id in &self.destroy_roster {
            world.set_active(id, true);
        }
    }

    /// Advance the transition in flight by one fixed step
    pub fn fixed_tick(&mut self, world: &mut dyn World, dt: f32) -> StepOutcome {
        let outcome = self.animator.step(world, dt);
        if let StepOutcome::Completed { .. } = outcome {
            self.current = None;
        }
        outcome
    }
}
