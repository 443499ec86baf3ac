//! Flipstate headless runner
//!
//! Loads a level (or the built-in demo), plays a scripted hold/release
//! sequence against a headless world and logs what happened.

use flipstate::Settings;
use flipstate::level_data::LevelDefinition;
use flipstate::persistence::{self, MemoryStore};
use flipstate::progress::{Collaborators, LevelProgression, NextScene, ObjectiveTracker, ScoreBook};
use flipstate::scene::SceneGraph;
use flipstate::sim::{FrameClock, LevelEvent, LevelSession, TickInput, run_frame, spawn_headless};

/// Frame time of the scripted run (60 Hz display)
const FRAME_DT: f32 = 1.0 / 60.0;

/// (frames, toggle held) pairs played in order
const SCRIPT: &[(u32, bool)] = &[(30, false), (90, true), (60, false), (120, true), (240, false)];

fn main() {
    env_logger::init();
    log::info!("Flipstate (headless) starting...");

    if let Err(e) = run() {
        log::error!("{e}");
        std::process::exit(1);
    }
}

fn run() -> flipstate::Result<()> {
    let def = match std::env::args().nth(1) {
        Some(path) => LevelDefinition::from_file(path)?,
        None => {
            log::info!("No level given; using the built-in demo");
            LevelDefinition::demo()
        }
    };

    let store = persistence::shared(MemoryStore::new());
    let settings = Settings::load(&*store.borrow());

    let mut objectives = ObjectiveTracker::with_defaults(store.clone());
    objectives.on_updated(|update| log::info!("Objective update: {update:?}"));
    objectives.register_session_start()?;
    let collaborators = Collaborators::default()
        .with_progression(objectives)
        .with_scores(ScoreBook::load(store.clone()));

    let mut world = spawn_headless(&def);
    let mut session = LevelSession::from_definition(&def, &settings, &mut world, collaborators);
    session.level.on_restore(|event| log::info!("Restored {} items", event.restored.len()));

    let mut clock = FrameClock::from_settings(&settings);
    let mut frames = 0u32;
    'script: for &(count, held) in SCRIPT {
        let input = TickInput::held(held);
        for _ in 0..count {
            run_frame(&mut session, &mut world, &mut clock, &input, FRAME_DT);
            frames += 1;
            for event in session.drain_events() {
                log_event(&event);
            }
            if session.is_completed() {
                break 'script;
            }
        }
    }

    log::info!(
        "Ran {frames} frames ({} ticks): phase {:?}, {} toggles, {} resets, {}/{} stars",
        session.time_ticks(),
        session.phase(),
        session.level.toggles_used(),
        session.resets.resets(),
        session.stars_won(),
        session.star_count()
    );
    for set in session.level.objects() {
        if let Some(pose) = world.local_pose(set.object) {
            log::info!("Object {} at {} {}", set.object, pose.position, pose.rotation);
        }
    }

    let scores = ScoreBook::load(store.clone());
    log::info!("Total stars banked: {}", scores.total_stars());

    let mut progression = LevelProgression::load(store);
    let level_count = progression.level_count();
    progression.select(def.index);
    match progression.next_level(|level| level < level_count) {
        NextScene::Level(level) => log::info!("Next: level {level}"),
        NextScene::Home => log::info!("Next: home"),
    }
    Ok(())
}

fn log_event(event: &LevelEvent) {
    match event {
        LevelEvent::LevelCompleted {
            level,
            stars,
            toggles_used,
        } => log::info!("Level {level} completed with {stars} stars in {toggles_used} toggles"),
        LevelEvent::PlayerReset => log::warn!("Player fell out of the level"),
        other => log::debug!("{other:?}"),
    }
}
