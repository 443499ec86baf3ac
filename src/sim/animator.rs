//! Timed pose transitions over a set of objects
//!
//! A `TransitionSession` is advanced by calling `step` once per fixed tick.
//! The curve is fixed when the session begins. Each step accumulates time,
//! evaluates the curve on the unclamped
//! normalized time and writes interpolated poses. The step after elapsed
//! time exceeds the duration snaps every object onto its exact target and
//! ends the session.

use serde::{Deserialize, Serialize};

use super::easing::TransitionCurve;
use super::pose::{ObjectId, Pose};
use crate::scene::{SceneGraph, World, write_pose};

/// Start/target pair for one object within a session
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoseTrack {
    pub object: ObjectId,
    pub start: Pose,
    pub target: Pose,
}

/// Identifies one `begin` call; stale handles are ignored by `cancel`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionHandle(u64);

/// One in-flight interpolation pass
#[derive(Debug, Clone)]
pub struct TransitionSession {
    pub handle: SessionHandle,
    /// State being transitioned toward
    pub target_state: bool,
    pub tracks: Vec<PoseTrack>,
    pub duration: f32,
    pub curve: TransitionCurve,
    pub elapsed: f32,
    /// Steps that wrote interpolated poses
    pub steps: u32,
}

impl TransitionSession {
    /// Normalized time, deliberately not clamped
    #[inline]
    pub fn normalized_time(&self) -> f32 {
        self.elapsed / self.duration
    }
}

/// Result of advancing the animator by one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// No session in flight
    Idle,
    /// Interpolated poses were written
    Running,
    /// Target poses were applied and the session ended
    Completed { target_state: bool },
}

/// Drives at most one transition session at a time
#[derive(Debug, Clone)]
pub struct TransitionAnimator {
    session: Option<TransitionSession>,
    next_handle: u64,
}

impl Default for TransitionAnimator {
    fn default() -> Self {
        Self::new()
    }
}

impl TransitionAnimator {
    pub fn new() -> Self {
        Self {
            session: None,
            next_handle: 1,
        }
    }

    pub fn session(&self) -> Option<&TransitionSession> {
        self.session.as_ref()
    }

    pub fn is_running(&self) -> bool {
        self.session.is_some()
    }

    /// Start a session, discarding any session already in flight.
    ///
    /// With `duration <= 0` the targets are applied immediately and no
    /// session is kept; the returned handle is already finished.
    pub fn begin(
        &mut self,
        world: &mut dyn World,
        target_state: bool,
        tracks: Vec<PoseTrack>,
        duration: f32,
        curve: TransitionCurve,
    ) -> SessionHandle {
        let handle = SessionHandle(self.next_handle);
        self.next_handle += 1;

        if let Some(old) = self.session.take() {
            log::debug!(
                "Transition {:?} superseded at t={:.3}",
                old.handle,
                old.normalized_time()
            );
        }

        if duration <= 0.0 {
            apply_targets(world, &tracks);
            return handle;
        }

        self.session = Some(TransitionSession {
            handle,
            target_state,
            tracks,
            duration,
            curve,
            elapsed: 0.0,
            steps: 0,
        });
        handle
    }

    /// Stop the session if `handle` is the one in flight. Poses stay wherever
    /// the last step left them.
    pub fn cancel(&mut self, handle: SessionHandle) -> bool {
        match &self.session {
            Some(s) if s.handle == handle => {
                self.session = None;
                true
            }
            _ => false,
        }
    }

    /// Stop whatever session is in flight
    pub fn cancel_current(&mut self) -> bool {
        self.session.take().is_some()
    }

    /// Advance the in-flight session by `dt`
    pub fn step(&mut self, world: &mut dyn World, dt: f32) -> StepOutcome {
        let Some(session) = self.session.as_mut() else {
            return StepOutcome::Idle;
        };

        if session.elapsed > session.duration {
            apply_targets(world, &session.tracks);
            let target_state = session.target_state;
            self.session = None;
            return StepOutcome::Completed { target_state };
        }

        session.elapsed += dt;
        let factor = session.curve.evaluate(session.normalized_time());
        for track in &session.tracks {
            if world.local_pose(track.object).is_none() {
                continue;
            }
            write_pose(world, track.object, track.start.interpolate(&track.target, factor));
        }
        session.steps += 1;
        StepOutcome::Running
    }
}

fn apply_targets(world: &mut dyn World, tracks: &[PoseTrack]) {
    for track in tracks {
        if world.local_pose(track.object).is_none() {
            continue;
        }
        write_pose(world, track.object, track.target);
    }
}
