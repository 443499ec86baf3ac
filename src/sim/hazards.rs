//! Contact hazards: jump pads and mines
//!
//! Both act on the player through `Physics` velocity calls when the player
//! comes within their trigger radius. A pad fires once per contact and
//! re-arms when the player leaves. A mine fires once per run.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::pose::ObjectId;
use crate::scene::{Physics, SceneGraph, World};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JumpPadTuning {
    pub launch_speed: f32,
    /// Drop the player's velocity along the launch direction before adding
    /// the launch, so every bounce reaches the same height
    pub override_velocity: bool,
    /// Launch along the pad's local up axis instead of `direction`
    pub align_with_pad_up: bool,
    pub direction: Vec3,
    pub trigger_radius: f32,
}

impl Default for JumpPadTuning {
    fn default() -> Self {
        Self {
            launch_speed: 15.0,
            override_velocity: true,
            align_with_pad_up: true,
            direction: Vec3::Y,
            trigger_radius: 1.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct JumpPad {
    pub id: ObjectId,
    pub tuning: JumpPadTuning,
    touching: bool,
}

impl JumpPad {
    pub fn new(id: ObjectId, tuning: JumpPadTuning) -> Self {
        Self {
            id,
            tuning,
            touching: false,
        }
    }

    /// World-space launch direction, `None` when it has no length
    pub fn launch_direction(&self, world: &dyn World) -> Option<Vec3> {
        let dir = if self.tuning.align_with_pad_up {
            world.local_pose(self.id)?.rotation * Vec3::Y
        } else {
            self.tuning.direction
        };
        let dir = dir.normalize_or_zero();
        (dir != Vec3::ZERO).then_some(dir)
    }

    /// Launch the player on first contact. Returns true when it fired.
    pub fn fixed_tick(&mut self, world: &mut dyn World, player: ObjectId) -> bool {
        let touching = world.is_active(self.id)
            && within(world, self.id, player, self.tuning.trigger_radius);
        let entered = touching && !self.touching;
        self.touching = touching;
        if !entered {
            return false;
        }
        self.launch(world, player)
    }

    /// Apply the launch to `player` regardless of contact
    pub fn launch(&self, world: &mut dyn World, player: ObjectId) -> bool {
        let Some(dir) = self.launch_direction(world) else {
            log::warn!("Jump pad {} has no launch direction", self.id);
            return false;
        };
        let (mut linear, angular) = world.velocity(player);
        if self.tuning.override_velocity {
            linear -= dir * linear.dot(dir);
        }
        linear += dir * self.tuning.launch_speed;
        world.wake(player);
        world.set_velocity(player, linear, angular);
        log::debug!("Jump pad {} launched {player} at {linear}", self.id);
        true
    }

    pub fn reset(&mut self) {
        self.touching = false;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MineTuning {
    pub trigger_radius: f32,
    /// Velocity change at the mine's centre, falling off linearly to zero
    /// at `explosion_radius`
    pub explosion_force: f32,
    /// Falls back to `trigger_radius` when not positive
    pub explosion_radius: f32,
    /// How far below the mine the push originates, for extra lift
    pub upwards_modifier: f32,
}

impl Default for MineTuning {
    fn default() -> Self {
        Self {
            trigger_radius: 2.0,
            explosion_force: 15.0,
            explosion_radius: 3.0,
            upwards_modifier: 0.5,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Mine {
    pub id: ObjectId,
    pub tuning: MineTuning,
    exploded: bool,
}

impl Mine {
    pub fn new(id: ObjectId, tuning: MineTuning) -> Self {
        Self {
            id,
            tuning,
            exploded: false,
        }
    }

    pub fn has_exploded(&self) -> bool {
        self.exploded
    }

    fn effective_radius(&self) -> f32 {
        if self.tuning.explosion_radius > 0.0 {
            self.tuning.explosion_radius
        } else {
            self.tuning.trigger_radius
        }
    }

    /// Explode when the player is in range. Returns true on the tick it fires.
    pub fn fixed_tick(&mut self, world: &mut dyn World, player: ObjectId) -> bool {
        if self.exploded || !within(world, self.id, player, self.tuning.trigger_radius) {
            return false;
        }
        self.explode(world, player);
        true
    }

    fn explode(&mut self, world: &mut dyn World, player: ObjectId) {
        self.exploded = true;
        let (Some(mine), Some(target)) = (world.local_pose(self.id), world.local_pose(player))
        else {
            return;
        };
        let center = mine.position;
        let origin = center - Vec3::Y * self.tuning.upwards_modifier;
        let radius = self.effective_radius();
        let falloff = (1.0 - target.position.distance(center) / radius).clamp(0.0, 1.0);
        let dir = (target.position - origin).normalize_or_zero();

        // Unit mass: the impulse is the velocity change
        let (linear, angular) = world.velocity(player);
        world.wake(player);
        world.set_velocity(
            player,
            linear + dir * self.tuning.explosion_force * falloff,
            angular,
        );
        world.set_active(self.id, false);
        log::info!("Mine {} exploded", self.id);
    }

    /// Re-arm and show the mine again
    pub fn reset(&mut self, world: &mut dyn World) {
        self.exploded = false;
        world.set_active(self.id, true);
    }
}

fn within(world: &dyn World, a: ObjectId, b: ObjectId, radius: f32) -> bool {
    match (world.local_pose(a), world.local_pose(b)) {
        (Some(a), Some(b)) => a.position.distance(b.position) <= radius,
        _ => false,
    }
}
