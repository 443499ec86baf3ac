//! Self-animating level items
//!
//! An animated item swings back and forth between its Off and On poses on
//! its own clock, independent of the player's toggle. Each cycle flips the
//! state, moves there over `1 / speed` seconds, then holds for `speed`
//! seconds before flipping again.

use serde::{Deserialize, Serialize};

use super::animator::{PoseTrack, StepOutcome, TransitionAnimator};
use super::easing::TransitionCurve;
use super::pose::{ObjectId, PoseSet};
use crate::scene::{SceneGraph, World};

/// Where an animated item is in its cycle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AnimatedPhase {
    /// Moving toward the current state's pose
    Moving,
    /// Holding at the pose; the next flip happens when this reaches zero
    Holding { remaining: f32 },
}

#[derive(Debug, Clone)]
pub struct AnimatedItem {
    poses: PoseSet,
    speed: f32,
    state: bool,
    playing: bool,
    phase: AnimatedPhase,
    animator: TransitionAnimator,
}

impl AnimatedItem {
    /// `speed` is both the transition rate (one pass takes `1 / speed`
    /// seconds) and the hold time in seconds between passes
    pub fn new(poses: PoseSet, speed: f32) -> Self {
        let speed = if speed.is_finite() && speed > 0.0 {
            speed
        } else {
            log::warn!("Animated item {} has speed {speed}; using 1", poses.object);
            1.0
        };
        Self {
            poses,
            speed,
            state: false,
            playing: true,
            // First flip happens on the first tick
            phase: AnimatedPhase::Holding { remaining: 0.0 },
            animator: TransitionAnimator::new(),
        }
    }

    pub fn object(&self) -> ObjectId {
        self.poses.object
    }

    /// State of the last flip (the pose it is moving to or holding at)
    pub fn state(&self) -> bool {
        self.state
    }

    pub fn phase(&self) -> AnimatedPhase {
        self.phase
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Stop or resume the cycle.
    ///
    /// Stopping leaves the item wherever it is. Resuming flips to the
    /// opposite state straight away and starts a new pass from there.
    pub fn play(&mut self, play: bool) {
        if play == self.playing {
            return;
        }
        self.playing = play;
        if play {
            self.phase = AnimatedPhase::Holding { remaining: 0.0 };
        } else {
            self.animator.cancel_current();
        }
    }

    /// Back to the Off pose, playing, cycle restarted
    pub fn reset(&mut self, world: &mut dyn World) {
        self.animator.cancel_current();
        let off = self.poses.pose_for(false);
        self.animator.begin(
            world,
            false,
            vec![PoseTrack {
                object: self.poses.object,
                start: off,
                target: off,
            }],
            0.0,
            TransitionCurve::Linear,
        );
        self.state = false;
        self.playing = true;
        self.phase = AnimatedPhase::Holding { remaining: 0.0 };
    }

    pub fn fixed_tick(&mut self, world: &mut dyn World, dt: f32) {
        if !self.playing {
            return;
        }
        match self.phase {
            AnimatedPhase::Moving => {
                if matches!(
                    self.animator.step(world, dt),
                    StepOutcome::Completed { .. } | StepOutcome::Idle
                ) {
                    self.phase = AnimatedPhase::Holding {
                        remaining: self.speed,
                    };
                }
            }
            AnimatedPhase::Holding { remaining } => {
                let remaining = remaining - dt;
                if remaining > 0.0 {
                    self.phase = AnimatedPhase::Holding { remaining };
                } else {
                    self.flip(world);
                }
            }
        }
    }

    fn flip(&mut self, world: &mut dyn World) {
        let Some(start) = world.local_pose(self.poses.object) else {
            return;
        };
        self.state = !self.state;
        self.animator.begin(
            world,
            self.state,
            vec![PoseTrack {
                object: self.poses.object,
                start,
                target: self.poses.pose_for(self.state),
            }],
            1.0 / self.speed,
            TransitionCurve::Linear,
        );
        self.phase = AnimatedPhase::Moving;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::HeadlessWorld;
    use crate::sim::pose::Pose;
    use glam::Vec3;

    const ITEM: ObjectId = ObjectId(7);
    const DT: f32 = 0.1;

    fn setup(speed: f32) -> (AnimatedItem, HeadlessWorld) {
        let mut world = HeadlessWorld::new();
        world.spawn(ITEM, Pose::IDENTITY);
        let poses = PoseSet::new(
            ITEM,
            Some(Pose::IDENTITY),
            Some(Pose::from_position(Vec3::new(0.0, 4.0, 0.0))),
        )
        .unwrap();
        (AnimatedItem::new(poses, speed), world)
    }

    fn y(world: &HeadlessWorld) -> f32 {
        world.local_pose(ITEM).unwrap().position.y
    }

    #[test]
    fn test_cycles_between_poses() {
        // Speed 2 is a half second pass and a two second hold
        let (mut item, mut world) = setup(2.0);
        item.fixed_tick(&mut world, DT);
        assert!(item.state());
        assert_eq!(item.phase(), AnimatedPhase::Moving);

        for _ in 0..7 {
            item.fixed_tick(&mut world, DT);
        }
        assert_eq!(y(&world), 4.0);
        assert!(matches!(item.phase(), AnimatedPhase::Holding { .. }));

        // Two second hold, half a second back to Off, then holding again
        for _ in 0..35 {
            item.fixed_tick(&mut world, DT);
        }
        assert!(!item.state());
        assert_eq!(y(&world), 0.0);
        assert!(matches!(item.phase(), AnimatedPhase::Holding { .. }));
    }

    #[test]
    fn test_stop_leaves_item_in_place_and_resume_flips() {
        let (mut item, mut world) = setup(1.0);
        for _ in 0..4 {
            item.fixed_tick(&mut world, DT);
        }
        let stopped_at = y(&world);
        assert!(stopped_at > 0.0 && stopped_at < 4.0);

        item.play(false);
        for _ in 0..10 {
            item.fixed_tick(&mut world, DT);
        }
        assert_eq!(y(&world), stopped_at);

        item.play(true);
        item.fixed_tick(&mut world, DT);
        assert!(!item.state());
        assert_eq!(item.phase(), AnimatedPhase::Moving);
        item.fixed_tick(&mut world, DT);
        assert!(y(&world) < stopped_at);
    }

    #[test]
    fn test_reset_returns_to_off() {
        let (mut item, mut world) = setup(1.0);
        for _ in 0..5 {
            item.fixed_tick(&mut world, DT);
        }
        item.play(false);
        item.reset(&mut world);
        assert_eq!(y(&world), 0.0);
        assert!(item.is_playing());
        assert!(!item.state());
    }

    #[test]
    fn test_bad_speed_is_replaced() {
        let (mut item, mut world) = setup(0.0);
        item.fixed_tick(&mut world, DT);
        assert_eq!(item.phase(), AnimatedPhase::Moving);
    }

    #[test]
    fn test_missing_object_does_not_crash() {
        let (mut item, mut world) = setup(1.0);
        world.despawn(ITEM);
        for _ in 0..30 {
            item.fixed_tick(&mut world, DT);
        }
        assert!(!item.state());
    }
}
