//! Out-of-bounds detection and player reset

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::level::LevelStateController;
use super::pose::{ObjectId, Pose};
use crate::scene::{Physics, SceneGraph, World};

/// Volume the player must stay inside
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Boundary {
    /// Axis-aligned box (the visible play area)
    Box { min: Vec3, max: Vec3 },
    /// Anything at or above this height is in bounds
    Floor { y: f32 },
}

impl Boundary {
    pub fn contains(&self, point: Vec3) -> bool {
        match *self {
            Boundary::Box { min, max } => point.cmpge(min).all() && point.cmple(max).all(),
            Boundary::Floor { y } => point.y >= y,
        }
    }
}

/// Player start snapshot, taken once at level load
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayerResetRecord {
    pub player: ObjectId,
    pub start: Pose,
}

/// Result of one boundary check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetOutcome {
    /// No player, or player in bounds
    InBounds,
    /// Player was put back at the start
    Reset,
    /// Out of bounds but already sitting on the start pose
    AlreadyReset,
}

/// Puts the player back when it leaves the play volume
#[derive(Debug, Clone)]
pub struct ResetCoordinator {
    record: Option<PlayerResetRecord>,
    boundary: Boundary,
    resets: u32,
    warned_bad_start: bool,
}

impl ResetCoordinator {
    pub fn new(record: Option<PlayerResetRecord>, boundary: Boundary) -> Self {
        if let Some(r) = &record {
            if !boundary.contains(r.start.position) {
                log::warn!("Player start {} is outside the level boundary", r.start.position);
            }
        } else {
            log::warn!("No player in level; reset checks disabled");
        }
        Self {
            record,
            boundary,
            resets: 0,
            warned_bad_start: false,
        }
    }

    /// Snapshot the player's current pose as the start record
    pub fn capture(world: &dyn World, player: ObjectId, boundary: Boundary) -> Self {
        let record = world
            .local_pose(player)
            .map(|start| PlayerResetRecord { player, start });
        Self::new(record, boundary)
    }

    pub fn record(&self) -> Option<&PlayerResetRecord> {
        self.record.as_ref()
    }

    pub fn boundary(&self) -> &Boundary {
        &self.boundary
    }

    /// Number of resets performed this session
    pub fn resets(&self) -> u32 {
        self.resets
    }

    /// Check the player against the boundary; reset it when outside
    pub fn fixed_tick(
        &mut self,
        world: &mut dyn World,
        level: &mut LevelStateController,
    ) -> ResetOutcome {
        let Some(record) = self.record else {
            return ResetOutcome::InBounds;
        };
        let Some(pose) = world.local_pose(record.player) else {
            return ResetOutcome::InBounds;
        };
        if self.boundary.contains(pose.position) {
            return ResetOutcome::InBounds;
        }

        // Repeated failures from a start pose that is itself out of bounds
        if pose == record.start {
            if !self.warned_bad_start {
                log::warn!("Player start is out of bounds; not resetting again");
                self.warned_bad_start = true;
            }
            return ResetOutcome::AlreadyReset;
        }

        self.reset_player(world, level);
        ResetOutcome::Reset
    }

    /// Put the player back at its start pose, at rest, and restore the
    /// destroy roster
    pub fn reset_player(&mut self, world: &mut dyn World, level: &mut LevelStateController) {
        let Some(record) = self.record else {
            return;
        };
        world.set_local_pose(record.player, record.start);
        world.set_velocity(record.player, Vec3::ZERO, Vec3::ZERO);
        world.sleep(record.player);
        world.wake(record.player);
        level.restore_destroyed_items(world);
        self.resets += 1;
        log::warn!("Player reset triggered ({} this run)", self.resets);
    }

    /// Clear counters for a restarted run
    pub fn reset_run(&mut self) {
        self.resets = 0;
        self.warned_bad_start = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::HeadlessWorld;
    use crate::sim::easing::TransitionCurve;

    const PLAYER: ObjectId = ObjectId(100);
    const PLATFORM: ObjectId = ObjectId(5);

    fn setup(start: Vec3) -> (ResetCoordinator, LevelStateController, HeadlessWorld) {
        let mut world = HeadlessWorld::new();
        world.spawn_dynamic(PLAYER, Pose::from_position(start));
        world.spawn(PLATFORM, Pose::IDENTITY);
        let mut level = LevelStateController::new(0.3, TransitionCurve::Linear);
        level.register_object(PLATFORM, None, None, true);
        let coordinator = ResetCoordinator::capture(&world, PLAYER, Boundary::Floor { y: -10.0 });
        (coordinator, level, world)
    }

    #[test]
    fn test_boundary_contains() {
        let b = Boundary::Box {
            min: Vec3::splat(-1.0),
            max: Vec3::splat(1.0),
        };
        assert!(b.contains(Vec3::ZERO));
        assert!(b.contains(Vec3::ONE));
        assert!(!b.contains(Vec3::new(0.0, 1.5, 0.0)));
        assert!(Boundary::Floor { y: 0.0 }.contains(Vec3::new(100.0, 0.0, 0.0)));
        assert!(!Boundary::Floor { y: 0.0 }.contains(Vec3::new(0.0, -0.1, 0.0)));
    }

    #[test]
    fn test_in_bounds_does_nothing() {
        let (mut coordinator, mut level, mut world) = setup(Vec3::ZERO);
        assert_eq!(coordinator.fixed_tick(&mut world, &mut level), ResetOutcome::InBounds);
        assert_eq!(coordinator.resets(), 0);
    }

    #[test]
    fn test_out_of_bounds_resets_player_and_restores_roster() {
        let (mut coordinator, mut level, mut world) = setup(Vec3::new(1.0, 2.0, 0.0));
        world.set_active(PLATFORM, false);
        world.place(PLAYER, Pose::from_position(Vec3::new(0.0, -20.0, 0.0)));
        world.set_velocity(PLAYER, Vec3::new(0.0, -9.0, 0.0), Vec3::ONE);

        assert_eq!(coordinator.fixed_tick(&mut world, &mut level), ResetOutcome::Reset);
        assert_eq!(
            world.local_pose(PLAYER),
            Some(Pose::from_position(Vec3::new(1.0, 2.0, 0.0)))
        );
        assert_eq!(world.velocity(PLAYER), (Vec3::ZERO, Vec3::ZERO));
        assert!(world.is_active(PLATFORM));

        // Back in bounds: the next check is quiet
        assert_eq!(coordinator.fixed_tick(&mut world, &mut level), ResetOutcome::InBounds);
        assert_eq!(coordinator.resets(), 1);
    }

    #[test]
    fn test_out_of_bounds_start_resets_once() {
        let (mut coordinator, mut level, mut world) = setup(Vec3::new(0.0, -50.0, 0.0));
        world.place(PLAYER, Pose::from_position(Vec3::new(0.0, -60.0, 0.0)));

        assert_eq!(coordinator.fixed_tick(&mut world, &mut level), ResetOutcome::Reset);
        let after_first = world.clone();
        for _ in 0..3 {
            assert_eq!(
                coordinator.fixed_tick(&mut world, &mut level),
                ResetOutcome::AlreadyReset
            );
        }
        assert_eq!(world.local_pose(PLAYER), after_first.local_pose(PLAYER));
        assert_eq!(world.pose_writes, after_first.pose_writes);
        assert_eq!(coordinator.resets(), 1);
    }

    #[test]
    fn test_missing_player_is_ignored() {
        let (mut coordinator, mut level, mut world) = setup(Vec3::ZERO);
        world.despawn(PLAYER);
        assert_eq!(coordinator.fixed_tick(&mut world, &mut level), ResetOutcome::InBounds);

        let mut none = ResetCoordinator::new(None, Boundary::Floor { y: 0.0 });
        assert_eq!(none.fixed_tick(&mut world, &mut level), ResetOutcome::InBounds);
    }

    #[test]
    fn test_boundary_json() {
        let b: Boundary =
            serde_json::from_str(r#"{"kind":"box","min":[-5,-5,-5],"max":[5,5,5]}"#).unwrap();
        assert!(b.contains(Vec3::new(4.0, 0.0, -4.0)));
        let f: Boundary = serde_json::from_str(r#"{"kind":"floor","y":-3.0}"#).unwrap();
        assert_eq!(f, Boundary::Floor { y: -3.0 });
    }
}
