//! Deterministic level simulation
//!
//! All gameplay logic lives here. This module must be deterministic:
//! - Fixed timestep only
//! - Stable iteration order (registration order, then object id)
//! - Host engine reached only through `scene::World`

pub mod animated;
pub mod animator;
pub mod easing;
pub mod goal;
pub mod hazards;
pub mod input;
pub mod level;
pub mod pose;
pub mod reset;
pub mod session;
pub mod tick;

pub use animated::{AnimatedItem, AnimatedPhase};
pub use animator::{PoseTrack, SessionHandle, StepOutcome, TransitionAnimator, TransitionSession};
pub use easing::{CurveKey, TransitionCurve};
pub use goal::{GoalAttractor, GoalUpdate};
pub use hazards::{JumpPad, JumpPadTuning, Mine, MineTuning};
pub use input::{InputSample, ToggleInputBridge};
pub use level::{LevelStateController, RestoreEvent};
pub use pose::{ObjectId, Pose, PoseSet};
pub use reset::{Boundary, PlayerResetRecord, ResetCoordinator, ResetOutcome};
pub use session::{LevelEvent, LevelSession, SessionPhase, spawn_headless};
pub use tick::{FrameClock, TickInput, run_frame, tick};
