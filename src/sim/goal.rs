//! Vacuum goal
//!
//! Pulls the player toward its centre, catches it inside the capture radius
//! and reports completion exactly once when the player is close enough.

use glam::Vec3;

use super::pose::ObjectId;
use crate::scene::{Physics, SceneGraph, World, write_pose};
use crate::settings::GoalSettings;

/// Damping applied while the player is caught
const CAUGHT_DAMPING: (f32, f32) = (10.0, 5.0);
/// Damping restored once the player is outside the capture radius
const FREE_DAMPING: (f32, f32) = (0.0, 0.05);
/// Lower bound on distance used by the pull falloff
const MIN_PULL_DISTANCE: f32 = 0.1;

/// What the attractor did this tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GoalUpdate {
    /// Player is within the suction radius
    pub in_range: bool,
    /// Player is within the capture radius
    pub caught: bool,
    /// Completion fired on this tick (never more than once)
    pub completed: bool,
}

/// Goal attractor state
#[derive(Debug, Clone)]
pub struct GoalAttractor {
    pub center: Vec3,
    settings: GoalSettings,
    cage_closed: bool,
    end_triggered: bool,
}

impl GoalAttractor {
    pub fn new(center: Vec3, settings: GoalSettings) -> Self {
        Self {
            center,
            settings,
            cage_closed: false,
            end_triggered: false,
        }
    }

    /// Cage closes the first time the player is caught
    pub fn cage_closed(&self) -> bool {
        self.cage_closed
    }

    pub fn end_triggered(&self) -> bool {
        self.end_triggered
    }

    /// Re-arm for a restarted run
    pub fn reset(&mut self) {
        self.cage_closed = false;
        self.end_triggered = false;
    }

    /// Apply the pull to `player` and detect completion
    pub fn fixed_tick(&mut self, world: &mut dyn World, player: ObjectId, dt: f32) -> GoalUpdate {
        let mut update = GoalUpdate::default();
        if !world.is_active(player) {
            return update;
        }
        let Some(mut pose) = world.local_pose(player) else {
            return update;
        };

        let offset = self.center - pose.position;
        let distance = offset.length();
        if distance > self.settings.suction_radius {
            return update;
        }
        update.in_range = true;

        if distance > self.settings.suction_stop_distance {
            let pull = self.settings.attraction_force / distance.max(MIN_PULL_DISTANCE);
            world.add_acceleration(player, offset.normalize_or_zero() * pull);
        }

        if distance < self.settings.capture_radius {
            update.caught = true;
            if !self.cage_closed {
                log::debug!("Goal cage closed");
                self.cage_closed = true;
            }
            world.set_velocity(player, Vec3::ZERO, Vec3::ZERO);
            pose.position = pose
                .position
                .lerp(self.center, (dt * self.settings.recenter_rate).min(1.0));
            write_pose(world, player, pose);
            world.set_damping(player, CAUGHT_DAMPING.0, CAUGHT_DAMPING.1);

            if distance < self.settings.complete_distance && !self.end_triggered {
                self.end_triggered = true;
                update.completed = true;
                log::info!("Goal reached");
            }
        } else {
            world.set_damping(player, FREE_DAMPING.0, FREE_DAMPING.1);
        }

        update
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::HeadlessWorld;
    use crate::sim::pose::Pose;

    const PLAYER: ObjectId = ObjectId(1);
    const DT: f32 = 0.02;

    fn setup(player_at: Vec3) -> (GoalAttractor, HeadlessWorld) {
        let mut world = HeadlessWorld::new();
        world.spawn_dynamic(PLAYER, Pose::from_position(player_at));
        (GoalAttractor::new(Vec3::ZERO, GoalSettings::default()), world)
    }

    #[test]
    fn test_out_of_range_is_untouched() {
        let (mut goal, mut world) = setup(Vec3::new(10.0, 0.0, 0.0));
        assert_eq!(goal.fixed_tick(&mut world, PLAYER, DT), GoalUpdate::default());
        world.integrate(DT);
        assert_eq!(world.velocity(PLAYER).0, Vec3::ZERO);
    }

    #[test]
    fn test_pull_toward_center() {
        let (mut goal, mut world) = setup(Vec3::new(4.0, 0.0, 0.0));
        let update = goal.fixed_tick(&mut world, PLAYER, DT);
        assert!(update.in_range && !update.caught);
        world.integrate(DT);
        let (vel, _) = world.velocity(PLAYER);
        // 20 / 4 = 5 units/s² toward the centre
        assert!(vel.abs_diff_eq(Vec3::new(-5.0 * DT, 0.0, 0.0), 1e-5));
        assert_eq!(world.object(PLAYER).unwrap().linear_damping, FREE_DAMPING.0);
    }

    #[test]
    fn test_capture_recenters_and_damps() {
        let (mut goal, mut world) = setup(Vec3::new(2.0, 0.0, 0.0));
        world.set_velocity(PLAYER, Vec3::new(3.0, 0.0, 0.0), Vec3::ZERO);
        let update = goal.fixed_tick(&mut world, PLAYER, DT);

        assert!(update.caught && !update.completed);
        assert!(goal.cage_closed());
        let obj = world.object(PLAYER).unwrap();
        assert!(obj.pose.position.x < 2.0);
        assert_eq!(obj.linear_velocity, Vec3::ZERO);
        assert_eq!(obj.linear_damping, CAUGHT_DAMPING.0);
    }

    #[test]
    fn test_completion_latches() {
        let (mut goal, mut world) = setup(Vec3::new(0.3, 0.0, 0.0));
        let first = goal.fixed_tick(&mut world, PLAYER, DT);
        let second = goal.fixed_tick(&mut world, PLAYER, DT);
        assert!(first.completed);
        assert!(!second.completed);
        assert!(second.caught);
        assert!(goal.end_triggered());

        goal.reset();
        assert!(goal.fixed_tick(&mut world, PLAYER, DT).completed);
    }

    #[test]
    fn test_converges_under_integration() {
        let (mut goal, mut world) = setup(Vec3::new(0.0, 4.5, 0.0));
        let mut completions = 0;
        for _ in 0..2_000 {
            if goal.fixed_tick(&mut world, PLAYER, DT).completed {
                completions += 1;
            }
            world.integrate(DT);
        }
        assert_eq!(completions, 1);
    }

    #[test]
    fn test_inactive_player_ignored() {
        let (mut goal, mut world) = setup(Vec3::new(0.2, 0.0, 0.0));
        world.set_active(PLAYER, false);
        assert!(!goal.fixed_tick(&mut world, PLAYER, DT).in_range);
    }
}
