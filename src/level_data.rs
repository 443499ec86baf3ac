//! Level definitions
//!
//! A level is authored as JSON: the animated objects with their Off/On poses,
//! the objects hidden when the state turns On, the player start, the play
//! boundary, the goal and the stars. Optional extras are self-animating
//! items, jump pads and mines.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::sim::hazards::{JumpPadTuning, MineTuning};
use crate::sim::pose::{ObjectId, Pose};
use crate::sim::reset::Boundary;

/// One authored object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectDefinition {
    pub id: ObjectId,
    #[serde(default)]
    pub off: Option<Pose>,
    #[serde(default)]
    pub on: Option<Pose>,
    #[serde(default)]
    pub destroy_on_activate: bool,
    /// Backed by a kinematic body rather than a bare transform
    #[serde(default)]
    pub kinematic: bool,
}

/// Player start
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayerDefinition {
    pub id: ObjectId,
    pub start: Pose,
}

/// A star pickup
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StarDefinition {
    pub id: ObjectId,
    pub position: Vec3,
}

/// An item that cycles between two poses on its own clock
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnimatedDefinition {
    pub id: ObjectId,
    pub off: Pose,
    pub on: Pose,
    #[serde(default = "default_animation_speed")]
    pub speed: f32,
    #[serde(default)]
    pub kinematic: bool,
}

fn default_animation_speed() -> f32 {
    1.0
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JumpPadDefinition {
    pub id: ObjectId,
    pub pose: Pose,
    #[serde(default)]
    pub tuning: JumpPadTuning,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MineDefinition {
    pub id: ObjectId,
    pub position: Vec3,
    #[serde(default)]
    pub tuning: MineTuning,
}

/// A complete level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelDefinition {
    pub index: usize,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub objects: Vec<ObjectDefinition>,
    /// Extra destroy-on-activate objects that are not animated
    #[serde(default)]
    pub destroy: Vec<ObjectId>,
    #[serde(default)]
    pub player: Option<PlayerDefinition>,
    #[serde(default = "default_boundary")]
    pub boundary: Boundary,
    #[serde(default)]
    pub goal: Option<Vec3>,
    #[serde(default)]
    pub stars: Vec<StarDefinition>,
    #[serde(default)]
    pub animated: Vec<AnimatedDefinition>,
    #[serde(default)]
    pub jump_pads: Vec<JumpPadDefinition>,
    #[serde(default)]
    pub mines: Vec<MineDefinition>,
}

fn default_boundary() -> Boundary {
    Boundary::Floor { y: -20.0 }
}

impl LevelDefinition {
    pub fn from_json(json: &str) -> Result<Self> {
        let def: LevelDefinition = serde_json::from_str(json)?;
        def.validate()?;
        Ok(def)
    }

    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let def = Self::from_json(&raw)?;
        log::info!("Loaded level {} from {}", def.index, path.display());
        Ok(def)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject definitions that reuse ids across roles. Missing poses are not
    /// an error here; the level controller skips those objects.
    pub fn validate(&self) -> Result<()> {
        let mut seen = std::collections::BTreeSet::new();
        let ids = self
            .objects
            .iter()
            .map(|o| o.id)
            .chain(self.player.iter().map(|p| p.id))
            .chain(self.stars.iter().map(|s| s.id))
            .chain(self.animated.iter().map(|a| a.id))
            .chain(self.jump_pads.iter().map(|p| p.id))
            .chain(self.mines.iter().map(|m| m.id));
        for id in ids {
            if !seen.insert(id) {
                return Err(Error::InvalidLevel(format!("object id {id} used twice")));
            }
        }
        if let Boundary::Box { min, max } = self.boundary {
            if !min.cmple(max).all() {
                return Err(Error::InvalidLevel(format!(
                    "boundary min {min} exceeds max {max}"
                )));
            }
        }
        Ok(())
    }

    /// Built-in level used by the demo binary: a bridge that swings into
    /// place, a gate that vanishes when toggled on, a bobbing platform, two
    /// stars and a goal
    pub fn demo() -> Self {
        let bridge_off = Pose::new(Vec3::new(4.0, -2.0, 0.0), glam::Quat::from_rotation_z(-0.9));
        let bridge_on = Pose::from_position(Vec3::new(4.0, 0.0, 0.0));
        Self {
            index: 0,
            name: "Demo".to_string(),
            objects: vec![
                ObjectDefinition {
                    id: ObjectId(1),
                    off: Some(bridge_off),
                    on: Some(bridge_on),
                    destroy_on_activate: false,
                    kinematic: true,
                },
                ObjectDefinition {
                    id: ObjectId(2),
                    off: Some(Pose::from_position(Vec3::new(8.0, 0.0, 0.0))),
                    on: Some(Pose::from_position(Vec3::new(8.0, 3.0, 0.0))),
                    destroy_on_activate: false,
                    kinematic: false,
                },
            ],
            destroy: vec![ObjectId(3)],
            player: Some(PlayerDefinition {
                id: ObjectId(100),
                start: Pose::from_position(Vec3::new(0.0, 1.0, 0.0)),
            }),
            boundary: Boundary::Box {
                min: Vec3::new(-5.0, -10.0, -5.0),
                max: Vec3::new(20.0, 20.0, 5.0),
            },
            goal: Some(Vec3::new(12.0, 1.0, 0.0)),
            stars: vec![
                StarDefinition {
                    id: ObjectId(200),
                    position: Vec3::new(4.0, 1.0, 0.0),
                },
                StarDefinition {
                    id: ObjectId(201),
                    position: Vec3::new(8.0, 1.0, 0.0),
                },
            ],
            animated: vec![AnimatedDefinition {
                id: ObjectId(300),
                off: Pose::from_position(Vec3::new(10.0, -1.0, 0.0)),
                on: Pose::from_position(Vec3::new(10.0, 1.0, 0.0)),
                speed: 1.0,
                kinematic: true,
            }],
            jump_pads: Vec::new(),
            mines: Vec::new(),
        }
    }
}
