//! Fixed timestep simulation tick
//!
//! Core loop that advances a level session deterministically.

use super::input::InputSample;
use super::session::LevelSession;
use crate::consts::{MAX_FRAME_DT, STAR_PICKUP_RADIUS};
use crate::scene::{Physics, World};
use crate::settings::Settings;

/// Input commands for a single tick
#[derive(Debug, Clone, Copy, Default)]
pub struct TickInput {
    /// Toggle key / touch state
    pub sample: InputSample,
    /// Pause toggle
    pub pause: bool,
    /// Restart the level
    pub restart: bool,
}

impl TickInput {
    pub fn held(pressed: bool) -> Self {
        Self {
            sample: InputSample::pressed(pressed),
            ..Self::default()
        }
    }
}

/// Advance the session by one fixed timestep
///
/// Order within a tick: pause/restart commands, input edges, transition
/// step, boundary check, goal, star pickups.
pub fn tick(session: &mut LevelSession, world: &mut dyn World, input: &TickInput, dt: f32) {
    if input.restart {
        session.restart(world);
        session.bridge.reset(input.sample.is_pressed());
        return;
    }

    if input.pause && !session.is_completed() {
        let paused = !session.level.is_paused();
        session.set_paused(paused);
        log::info!("{}", if paused { "Paused" } else { "Resumed" });
    }

    session.handle_input(world, input.sample.is_pressed());
    session.fixed_tick(world, dt);
    if !session.is_completed() {
        session.collect_stars_near_player(world, STAR_PICKUP_RADIUS);
    }
}

/// Fixed-step accumulator for variable frame times
#[derive(Debug, Clone)]
pub struct FrameClock {
    fixed_dt: f32,
    max_substeps: u32,
    accumulator: f32,
}

impl FrameClock {
    pub fn new(fixed_dt: f32, max_substeps: u32) -> Self {
        Self {
            fixed_dt,
            max_substeps: max_substeps.max(1),
            accumulator: 0.0,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.fixed_dt, settings.max_substeps)
    }

    pub fn fixed_dt(&self) -> f32 {
        self.fixed_dt
    }

    /// Fraction of a step left over, for render interpolation
    pub fn alpha(&self) -> f32 {
        self.accumulator / self.fixed_dt
    }

    /// Add a frame's worth of time and return how many fixed steps to run
    pub fn advance(&mut self, frame_dt: f32) -> u32 {
        self.accumulator += frame_dt.clamp(0.0, MAX_FRAME_DT);

        let mut substeps = 0;
        while self.accumulator >= self.fixed_dt && substeps < self.max_substeps {
            self.accumulator -= self.fixed_dt;
            substeps += 1;
        }
        if self.accumulator >= self.fixed_dt {
            log::debug!("Dropping {:.3}s of simulation time", self.accumulator);
            self.accumulator %= self.fixed_dt;
        }
        substeps
    }

    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }
}

/// Run every fixed step a frame owes, stepping host physics after each one.
/// One-shot commands (pause, restart) only apply on the first step. Returns
/// the number of steps run.
pub fn run_frame(
    session: &mut LevelSession,
    world: &mut dyn World,
    clock: &mut FrameClock,
    input: &TickInput,
    frame_dt: f32,
) -> u32 {
    let steps = clock.advance(frame_dt);
    let mut input = *input;
    for _ in 0..steps {
        tick(session, world, &input, clock.fixed_dt());
        world.step_simulation(clock.fixed_dt());
        // Clear one-shot inputs after processing
        input.pause = false;
        input.restart = false;
    }
    steps
}
