//! Interfaces to the host engine
//!
//! The simulation never owns scene objects. It reads and writes them through
//! these traits, which an engine adapter implements. `HeadlessWorld` is a
//! map-backed implementation for tests and the demo binary.

use std::collections::{BTreeMap, BTreeSet};

use glam::Vec3;

use crate::sim::pose::{ObjectId, Pose};

/// Scene graph / renderer side
pub trait SceneGraph {
    /// Current local pose, or `None` if the object no longer exists
    fn local_pose(&self, id: ObjectId) -> Option<Pose>;
    fn set_local_pose(&mut self, id: ObjectId, pose: Pose);
    fn is_active(&self, id: ObjectId) -> bool;
    fn set_active(&mut self, id: ObjectId, active: bool);
}

/// Physics engine side
pub trait Physics {
    /// Whether the object is a kinematic body that must be moved through physics
    fn is_kinematic(&self, id: ObjectId) -> bool;
    fn move_kinematic(&mut self, id: ObjectId, pose: Pose);
    fn set_velocity(&mut self, id: ObjectId, linear: Vec3, angular: Vec3);
    fn velocity(&self, id: ObjectId) -> (Vec3, Vec3);
    fn sleep(&mut self, id: ObjectId);
    fn wake(&mut self, id: ObjectId);
    fn add_acceleration(&mut self, id: ObjectId, accel: Vec3);
    fn set_damping(&mut self, id: ObjectId, linear: f32, angular: f32);
    /// Advance the host physics by one fixed step. Engines that step physics
    /// on their own schedule keep the default.
    fn step_simulation(&mut self, _dt: f32) {}
}

/// Everything the simulation needs from the host
pub trait World: SceneGraph + Physics {}

impl<T: SceneGraph + Physics> World for T {}

/// Write a pose the way the host expects: kinematic bodies go through the
/// physics engine, everything else is a plain transform write.
pub fn write_pose(world: &mut dyn World, id: ObjectId, pose: Pose) {
    if world.is_kinematic(id) {
        world.move_kinematic(id, pose);
    } else {
        world.set_local_pose(id, pose);
    }
}

/// Per-object state in the headless world
#[derive(Debug, Clone)]
pub struct HeadlessObject {
    pub pose: Pose,
    pub active: bool,
    pub kinematic: bool,
    pub linear_velocity: Vec3,
    pub angular_velocity: Vec3,
    pub linear_damping: f32,
    pub angular_damping: f32,
    pub asleep: bool,
}

impl HeadlessObject {
    fn new(pose: Pose) -> Self {
        Self {
            pose,
            active: true,
            kinematic: false,
            linear_velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            linear_damping: 0.0,
            angular_damping: 0.05,
            asleep: false,
        }
    }
}

/// In-memory world with a trivial explicit-Euler integrator for dynamic bodies
#[derive(Debug, Clone, Default)]
pub struct HeadlessWorld {
    objects: BTreeMap<ObjectId, HeadlessObject>,
    dynamic: BTreeSet<ObjectId>,
    /// Accelerations queued since the last `integrate`
    accelerations: BTreeMap<ObjectId, Vec3>,
    /// Count of transform writes (plain + kinematic), for tests
    pub pose_writes: usize,
    /// Count of kinematic moves, for tests
    pub kinematic_moves: usize,
    pub gravity: Vec3,
}

impl HeadlessWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a static or animated object
    pub fn spawn(&mut self, id: ObjectId, pose: Pose) {
        self.objects.insert(id, HeadlessObject::new(pose));
    }

    /// Add an object backed by a kinematic rigidbody
    pub fn spawn_kinematic(&mut self, id: ObjectId, pose: Pose) {
        let mut obj = HeadlessObject::new(pose);
        obj.kinematic = true;
        self.objects.insert(id, obj);
    }

    /// Add a dynamic body that `integrate` moves (the player ball)
    pub fn spawn_dynamic(&mut self, id: ObjectId, pose: Pose) {
        self.objects.insert(id, HeadlessObject::new(pose));
        self.dynamic.insert(id);
    }

    /// Remove an object, leaving dangling references behind
    pub fn despawn(&mut self, id: ObjectId) {
        self.objects.remove(&id);
        self.dynamic.remove(&id);
    }

    pub fn object(&self, id: ObjectId) -> Option<&HeadlessObject> {
        self.objects.get(&id)
    }

    pub fn object_mut(&mut self, id: ObjectId) -> Option<&mut HeadlessObject> {
        self.objects.get_mut(&id)
    }

    /// Teleport an object without counting it as an animation write
    pub fn place(&mut self, id: ObjectId, pose: Pose) {
        if let Some(obj) = self.objects.get_mut(&id) {
            obj.pose = pose;
        }
    }

    /// Advance dynamic bodies by `dt`
    pub fn integrate(&mut self, dt: f32) {
        let accelerations = std::mem::take(&mut self.accelerations);
        for id in &self.dynamic {
            let Some(obj) = self.objects.get_mut(id) else {
                continue;
            };
            if !obj.active {
                continue;
            }
            let accel = accelerations.get(id).copied().unwrap_or(Vec3::ZERO);
            if obj.asleep && accel == Vec3::ZERO {
                continue;
            }
            obj.asleep = false;
            obj.linear_velocity += (self.gravity + accel) * dt;
            obj.linear_velocity *= 1.0 / (1.0 + obj.linear_damping * dt);
            obj.pose.position += obj.linear_velocity * dt;
        }
    }
}

impl SceneGraph for HeadlessWorld {
    fn local_pose(&self, id: ObjectId) -> Option<Pose> {
        self.objects.get(&id).map(|o| o.pose)
    }

    fn set_local_pose(&mut self, id: ObjectId, pose: Pose) {
        if let Some(obj) = self.objects.get_mut(&id) {
            obj.pose = pose;
            self.pose_writes += 1;
        }
    }

    fn is_active(&self, id: ObjectId) -> bool {
        self.objects.get(&id).is_some_and(|o| o.active)
    }

    fn set_active(&mut self, id: ObjectId, active: bool) {
        if let Some(obj) = self.objects.get_mut(&id) {
            obj.active = active;
        }
    }
}

impl Physics for HeadlessWorld {
    fn is_kinematic(&self, id: ObjectId) -> bool {
        self.objects.get(&id).is_some_and(|o| o.kinematic)
    }

    fn move_kinematic(&mut self, id: ObjectId, pose: Pose) {
        if let Some(obj) = self.objects.get_mut(&id) {
            obj.pose = pose;
            self.pose_writes += 1;
            self.kinematic_moves += 1;
        }
    }

    fn set_velocity(&mut self, id: ObjectId, linear: Vec3, angular: Vec3) {
        if let Some(obj) = self.objects.get_mut(&id) {
            obj.linear_velocity = linear;
            obj.angular_velocity = angular;
        }
    }

    fn velocity(&self, id: ObjectId) -> (Vec3, Vec3) {
        self.objects
            .get(&id)
            .map(|o| (o.linear_velocity, o.angular_velocity))
            .unwrap_or((Vec3::ZERO, Vec3::ZERO))
    }

    fn sleep(&mut self, id: ObjectId) {
        if let Some(obj) = self.objects.get_mut(&id) {
            obj.asleep = true;
        }
    }

    fn wake(&mut self, id: ObjectId) {
        if let Some(obj) = self.objects.get_mut(&id) {
            obj.asleep = false;
        }
    }

    fn add_acceleration(&mut self, id: ObjectId, accel: Vec3) {
        *self.accelerations.entry(id).or_insert(Vec3::ZERO) += accel;
    }

    fn set_damping(&mut self, id: ObjectId, linear: f32, angular: f32) {
        if let Some(obj) = self.objects.get_mut(&id) {
            obj.linear_damping = linear;
            obj.angular_damping = angular;
        }
    }

    fn step_simulation(&mut self, dt: f32) {
        self.integrate(dt);
    }
}
