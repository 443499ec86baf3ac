//! Flipstate - hold-to-toggle arcade puzzle core
//!
//! Core modules:
//! - `sim`: Deterministic level simulation (poses, transitions, resets, goal)
//! - `scene`: Interfaces to the host engine plus a headless implementation
//! - `events`: Ordered callback registry
//! - `progress`: Objectives, star scores and level selection
//! - `persistence`: Key-value storage
//! - `settings`: Data-driven tuning
//! - `level_data`: Level definitions loaded from JSON

pub mod error;
pub mod events;
pub mod level_data;
pub mod persistence;
pub mod progress;
pub mod scene;
pub mod settings;
pub mod sim;

pub use error::{Error, Result};
pub use settings::{GoalSettings, Settings};

use glam::{Quat, Vec3};

/// Game configuration constants
pub mod consts {
    /// Default fixed simulation timestep (50 Hz, the engine's physics rate)
    pub const SIM_DT: f32 = 1.0 / 50.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Longest frame the accumulator will swallow, in seconds
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Default pose transition duration in seconds
    pub const TRANSITION_DURATION: f32 = 0.3;

    /// Toggles allowed for a level to count as a clean run
    pub const CLEAN_RUN_MAX_TOGGLES: u32 = 3;
    /// Player-to-star distance that counts as a pickup
    pub const STAR_PICKUP_RADIUS: f32 = 0.75;

    /// Quaternion dot product above which slerp degrades to nlerp
    pub const SLERP_LINEAR_THRESHOLD: f32 = 0.9995;
}

/// Unclamped spherical interpolation between two rotations.
///
/// `t` outside [0, 1] extrapolates along the same great arc, which is what
/// overshooting curves rely on. Always takes the shortest arc.
pub fn slerp_unclamped(a: Quat, b: Quat, t: f32) -> Quat {
    let mut end = b;
    let mut dot = a.dot(b);
    if dot < 0.0 {
        end = -end;
        dot = -dot;
    }

    if dot > consts::SLERP_LINEAR_THRESHOLD {
        return (a + (end - a) * t).normalize();
    }

    let theta = dot.clamp(-1.0, 1.0).acos();
    let sin_theta = theta.sin();
    let wa = ((1.0 - t) * theta).sin() / sin_theta;
    let wb = (t * theta).sin() / sin_theta;
    (a * wa + end * wb).normalize()
}

/// Unclamped linear interpolation between two points
#[inline]
pub fn lerp_unclamped(a: Vec3, b: Vec3, t: f32) -> Vec3 {
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slerp_endpoints() {
        let a = Quat::IDENTITY;
        let b = Quat::from_rotation_y(1.0);
        assert!(slerp_unclamped(a, b, 0.0).abs_diff_eq(a, 1e-5));
        assert!(slerp_unclamped(a, b, 1.0).abs_diff_eq(b, 1e-5));
    }

    #[test]
    fn test_slerp_extrapolates_past_target() {
        let a = Quat::IDENTITY;
        let b = Quat::from_rotation_y(0.5);
        let over = slerp_unclamped(a, b, 2.0);
        assert!(over.abs_diff_eq(Quat::from_rotation_y(1.0), 1e-4));
    }

    #[test]
    fn test_slerp_takes_short_arc() {
        let a = Quat::IDENTITY;
        let b = -Quat::from_rotation_z(0.4);
        let mid = slerp_unclamped(a, b, 0.5);
        let expected = Quat::from_rotation_z(0.2);
        assert!(mid.abs_diff_eq(expected, 1e-4) || mid.abs_diff_eq(-expected, 1e-4));
    }

    #[test]
    fn test_lerp_unclamped_overshoot() {
        let p = lerp_unclamped(Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0), 1.2);
        assert!((p.x - 12.0).abs() < 1e-5);
    }
}
