//! Poses and per-object pose pairs
//!
//! A pose is a position + rotation in the parent-local frame. Each controlled
//! object carries an Off pose and an On pose authored at level load.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::{lerp_unclamped, slerp_unclamped};

/// Opaque handle to a scene object owned by the host engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(pub u32);

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Position + rotation pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec3,
    #[serde(default = "identity")]
    pub rotation: Quat,
}

fn identity() -> Quat {
    Quat::IDENTITY
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Pose {
    pub const IDENTITY: Pose = Pose {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
        }
    }

    /// Unclamped interpolation toward `target` (lerp position, slerp rotation)
    pub fn interpolate(&self, target: &Pose, t: f32) -> Pose {
        Pose {
            position: lerp_unclamped(self.position, target.position, t),
            rotation: slerp_unclamped(self.rotation, target.rotation, t),
        }
    }

    /// Approximate equality, for tests and "already there" checks
    pub fn abs_diff_eq(&self, other: &Pose, max_abs_diff: f32) -> bool {
        self.position.abs_diff_eq(other.position, max_abs_diff)
            && (self.rotation.abs_diff_eq(other.rotation, max_abs_diff)
                || self.rotation.abs_diff_eq(-other.rotation, max_abs_diff))
    }
}

/// The two authored poses of one controlled object
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoseSet {
    pub object: ObjectId,
    pub off: Pose,
    pub on: Pose,
}

impl PoseSet {
    /// Build a pose set, or `None` if either pose is missing
    pub fn new(object: ObjectId, off: Option<Pose>, on: Option<Pose>) -> Option<Self> {
        match (off, on) {
            (Some(off), Some(on)) => Some(Self { object, off, on }),
            _ => None,
        }
    }

    /// Pose for the given toggle state
    #[inline]
    pub fn pose_for(&self, state: bool) -> Pose {
        if state { self.on } else { self.off }
    }
}
