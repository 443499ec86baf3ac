//! One playthrough of a level
//!
//! Bundles the level controller, input bridge, reset coordinator, goal,
//! stars and hazards, plus the latches that keep level completion one-shot.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::animated::AnimatedItem;
use super::animator::StepOutcome;
use super::goal::{GoalAttractor, GoalUpdate};
use super::hazards::{JumpPad, Mine};
use super::input::ToggleInputBridge;
use super::level::LevelStateController;
use super::pose::{ObjectId, Pose, PoseSet};
use super::reset::{PlayerResetRecord, ResetCoordinator, ResetOutcome};
use crate::events::{CallbackId, Callbacks};
use crate::level_data::LevelDefinition;
use crate::progress::Collaborators;
use crate::scene::{HeadlessWorld, Physics, SceneGraph, World, write_pose};
use crate::settings::Settings;

/// Something adapters may want to react to (UI, audio, analytics)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum LevelEvent {
    /// Input edge requested a state
    Toggled { state: bool },
    /// A transition finished and objects sit on their target poses
    TransitionFinished { state: bool },
    /// The player left the boundary and was put back
    PlayerReset,
    StarCollected { star: ObjectId, total: u32 },
    JumpPadLaunched { pad: ObjectId },
    MineExploded { mine: ObjectId },
    LevelCompleted {
        level: usize,
        stars: u32,
        toggles_used: u32,
    },
}

/// Session lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    Playing,
    Paused,
    Completed,
}

/// Runtime state for one level
#[derive(Debug)]
pub struct LevelSession {
    pub level_index: usize,
    pub level: LevelStateController,
    pub bridge: ToggleInputBridge,
    pub resets: ResetCoordinator,
    pub goal: Option<GoalAttractor>,
    pub collaborators: Collaborators,
    pub animated: Vec<AnimatedItem>,
    pub jump_pads: Vec<JumpPad>,
    pub mines: Vec<Mine>,
    stars: Vec<ObjectId>,
    collected: Vec<ObjectId>,
    end_triggered: bool,
    user_paused: bool,
    clean_run_max_toggles: u32,
    events: Vec<LevelEvent>,
    on_completed: Callbacks<LevelEvent>,
    time_ticks: u64,
}

impl LevelSession {
    /// Assemble a session from already-built parts
    pub fn new(
        level_index: usize,
        level: LevelStateController,
        resets: ResetCoordinator,
        settings: &Settings,
        collaborators: Collaborators,
    ) -> Self {
        Self {
            level_index,
            level,
            bridge: ToggleInputBridge::new(),
            resets,
            goal: None,
            collaborators,
            animated: Vec::new(),
            jump_pads: Vec::new(),
            mines: Vec::new(),
            stars: Vec::new(),
            collected: Vec::new(),
            end_triggered: false,
            user_paused: false,
            clean_run_max_toggles: settings.clean_run_max_toggles,
            events: Vec::new(),
            on_completed: Callbacks::new(),
            time_ticks: 0,
        }
    }

    /// Build a session from a level definition. Objects are snapped onto
    /// their Off poses and the player start is recorded.
    pub fn from_definition(
        def: &LevelDefinition,
        settings: &Settings,
        world: &mut dyn World,
        collaborators: Collaborators,
    ) -> Self {
        let mut level = LevelStateController::new(
            settings.transition_duration,
            settings.transition_curve.clone(),
        );
        for obj in &def.objects {
            level.register_object(obj.id, obj.off, obj.on, obj.destroy_on_activate);
        }
        for &id in &def.destroy {
            level.add_to_destroy_roster(id);
        }
        level.apply_immediate(world, false);

        let record = def.player.map(|p| PlayerResetRecord {
            player: p.id,
            start: p.start,
        });
        if let Some(r) = record {
            world.set_local_pose(r.player, r.start);
        }
        let resets = ResetCoordinator::new(record, def.boundary);

        let mut session = Self::new(def.index, level, resets, settings, collaborators);
        session.goal = def
            .goal
            .map(|center| GoalAttractor::new(center, settings.goal.clone()));
        session.stars = def.stars.iter().map(|s| s.id).collect();
        for star in &def.stars {
            write_pose(world, star.id, Pose::from_position(star.position));
        }
        for a in &def.animated {
            let poses = PoseSet {
                object: a.id,
                off: a.off,
                on: a.on,
            };
            let mut item = AnimatedItem::new(poses, a.speed);
            item.reset(world);
            session.animated.push(item);
        }
        for pad in &def.jump_pads {
            write_pose(world, pad.id, pad.pose);
            session.jump_pads.push(JumpPad::new(pad.id, pad.tuning));
        }
        for mine in &def.mines {
            write_pose(world, mine.id, Pose::from_position(mine.position));
            session.mines.push(Mine::new(mine.id, mine.tuning));
        }
        log::info!(
            "Level {} ready: {} objects, {} destroyable, {} stars, {} animated, {} hazards",
            def.index,
            session.level.objects().len(),
            session.level.destroy_roster().len(),
            session.stars.len(),
            session.animated.len(),
            session.jump_pads.len() + session.mines.len()
        );
        session
    }

    pub fn phase(&self) -> SessionPhase {
        if self.end_triggered {
            SessionPhase::Completed
        } else if self.level.is_paused() {
            SessionPhase::Paused
        } else {
            SessionPhase::Playing
        }
    }

    pub fn is_completed(&self) -> bool {
        self.end_triggered
    }

    pub fn stars_won(&self) -> u32 {
        self.collected.len() as u32
    }

    pub fn star_count(&self) -> usize {
        self.stars.len()
    }

    pub fn time_ticks(&self) -> u64 {
        self.time_ticks
    }

    pub fn player(&self) -> Option<ObjectId> {
        self.resets.record().map(|r| r.player)
    }

    /// Pause from the menu. Input edges are ignored while paused.
    pub fn set_paused(&mut self, paused: bool) {
        self.user_paused = paused;
        self.level.set_paused(paused || self.end_triggered);
    }

    /// Called once per completed run with the `LevelCompleted` event
    pub fn on_completed(&mut self, handler: impl FnMut(&LevelEvent) + 'static) -> CallbackId {
        self.on_completed.subscribe(handler)
    }

    pub fn remove_completed_handler(&mut self, id: CallbackId) -> bool {
        self.on_completed.unsubscribe(id)
    }

    /// Take the queued events
    pub fn drain_events(&mut self) -> Vec<LevelEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[LevelEvent] {
        &self.events
    }

    /// Sample input. Call once per frame (or once per fixed tick).
    pub fn handle_input(&mut self, world: &mut dyn World, pressed: bool) -> Option<bool> {
        let fired = self
            .bridge
            .update(pressed, &mut self.level, world, &mut self.collaborators);
        if let Some(state) = fired {
            self.events.push(LevelEvent::Toggled { state });
        }
        fired
    }

    /// Advance transitions and animated items, then check bounds, then
    /// hazards, then the goal
    pub fn fixed_tick(&mut self, world: &mut dyn World, dt: f32) {
        self.time_ticks += 1;

        if let StepOutcome::Completed { target_state } = self.level.fixed_tick(world, dt) {
            self.events.push(LevelEvent::TransitionFinished {
                state: target_state,
            });
        }
        for item in &mut self.animated {
            item.fixed_tick(world, dt);
        }

        if self.end_triggered {
            return;
        }

        if self.resets.fixed_tick(world, &mut self.level) == ResetOutcome::Reset {
            self.events.push(LevelEvent::PlayerReset);
        }

        let Some(player) = self.player() else {
            return;
        };
        for pad in &mut self.jump_pads {
            if pad.fixed_tick(world, player) {
                self.events.push(LevelEvent::JumpPadLaunched { pad: pad.id });
            }
        }
        for mine in &mut self.mines {
            if mine.fixed_tick(world, player) {
                self.events.push(LevelEvent::MineExploded { mine: mine.id });
            }
        }
        let update = match self.goal.as_mut() {
            Some(goal) => goal.fixed_tick(world, player, dt),
            None => GoalUpdate::default(),
        };
        if update.completed {
            self.on_goal_reached();
        }
    }

    /// Player touched a star
    pub fn collect_star(&mut self, world: &mut dyn World, star: ObjectId) -> bool {
        if self.end_triggered || !self.stars.contains(&star) || self.collected.contains(&star) {
            return false;
        }
        world.set_active(star, false);
        self.collected.push(star);
        let total = self.stars_won();
        log::info!("Star won: {total}");
        self.events.push(LevelEvent::StarCollected { star, total });

        if self.collected.len() >= self.stars.len() {
            log::info!("All stars collected");
            self.end_level();
        }
        true
    }

    /// Collect any active star within `radius` of the player
    pub fn collect_stars_near_player(&mut self, world: &mut dyn World, radius: f32) -> u32 {
        let Some(player_pos) = self.player().and_then(|p| world.local_pose(p)).map(|p| p.position)
        else {
            return 0;
        };
        let touching: Vec<ObjectId> = self
            .stars
            .iter()
            .copied()
            .filter(|&s| !self.collected.contains(&s) && world.is_active(s))
            .filter(|&s| {
                world
                    .local_pose(s)
                    .is_some_and(|p| p.position.distance(player_pos) <= radius)
            })
            .collect();
        let mut collected = 0;
        for star in touching {
            if self.collect_star(world, star) {
                collected += 1;
            }
        }
        collected
    }

    /// Goal handler: ends the level once
    pub fn on_goal_reached(&mut self) {
        self.end_level();
    }

    fn end_level(&mut self) {
        if self.end_triggered {
            return;
        }
        self.end_triggered = true;
        self.level.set_paused(true);

        let stars = self.stars_won();
        let toggles_used = self.level.toggles_used();
        let clean = toggles_used <= self.clean_run_max_toggles;
        log::info!(
            "Level {} complete: {stars} stars, {toggles_used} toggles{}",
            self.level_index,
            if clean { " (clean)" } else { "" }
        );

        self.collaborators.level_completed(self.level_index, clean);
        self.collaborators.update_score(self.level_index, stars);
        let event = LevelEvent::LevelCompleted {
            level: self.level_index,
            stars,
            toggles_used,
        };
        self.on_completed.dispatch(&event);
        self.events.push(event);
    }

    /// Start the level over
    pub fn restart(&mut self, world: &mut dyn World) {
        self.level.reset_run(world);
        self.bridge.reset(false);
        if let Some(goal) = self.goal.as_mut() {
            goal.reset();
        }
        self.resets.reset_run();
        if let Some(r) = self.resets.record().copied() {
            world.set_local_pose(r.player, r.start);
            world.set_velocity(r.player, Vec3::ZERO, Vec3::ZERO);
        }
        for &star in &self.stars {
            world.set_active(star, true);
        }
        for item in &mut self.animated {
            item.reset(world);
        }
        for pad in &mut self.jump_pads {
            pad.reset();
        }
        for mine in &mut self.mines {
            mine.reset(world);
        }
        self.collected.clear();
        self.end_triggered = false;
        self.level.set_paused(self.user_paused);
        self.events.clear();
        self.time_ticks = 0;
        log::info!("Level {} restarted", self.level_index);
    }
}

/// Populate a headless world with every object a definition mentions
pub fn spawn_headless(def: &LevelDefinition) -> HeadlessWorld {
    let mut world = HeadlessWorld::new();
    world.gravity = Vec3::new(0.0, -9.81, 0.0);
    for obj in &def.objects {
        let pose = obj.off.or(obj.on).unwrap_or_default();
        if obj.kinematic {
            world.spawn_kinematic(obj.id, pose);
        } else {
            world.spawn(obj.id, pose);
        }
    }
    for &id in &def.destroy {
        world.spawn(id, Pose::IDENTITY);
    }
    if let Some(p) = def.player {
        world.spawn_dynamic(p.id, p.start);
    }
    for star in &def.stars {
        world.spawn(star.id, Pose::from_position(star.position));
    }
    for a in &def.animated {
        if a.kinematic {
            world.spawn_kinematic(a.id, a.off);
        } else {
            world.spawn(a.id, a.off);
        }
    }
    for pad in &def.jump_pads {
        world.spawn(pad.id, pad.pose);
    }
    for mine in &def.mines {
        world.spawn(mine.id, Pose::from_position(mine.position));
    }
    world
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level_data::{
        AnimatedDefinition, JumpPadDefinition, MineDefinition, ObjectDefinition, PlayerDefinition,
        StarDefinition,
    };
    use crate::sim::hazards::{JumpPadTuning, MineTuning};
    use crate::progress::testing::RecordingProgress;
    use crate::sim::reset::Boundary;

    const PLAYER: ObjectId = ObjectId(100);

    fn definition() -> LevelDefinition {
        LevelDefinition {
            index: 7,
            name: "test".into(),
            objects: vec![ObjectDefinition {
                id: ObjectId(1),
                off: Some(Pose::from_position(Vec3::ZERO)),
                on: Some(Pose::from_position(Vec3::new(0.0, 4.0, 0.0))),
                destroy_on_activate: false,
                kinematic: true,
            }],
            destroy: vec![ObjectId(3)],
            player: Some(PlayerDefinition {
                id: PLAYER,
                start: Pose::from_position(Vec3::new(0.0, 1.0, 0.0)),
            }),
            boundary: Boundary::Floor { y: -10.0 },
            goal: Some(Vec3::new(30.0, 0.0, 0.0)),
            stars: vec![
                StarDefinition {
                    id: ObjectId(200),
                    position: Vec3::new(1.0, 1.0, 0.0),
                },
                StarDefinition {
                    id: ObjectId(201),
                    position: Vec3::new(20.0, 1.0, 0.0),
                },
            ],
            animated: vec![AnimatedDefinition {
                id: ObjectId(300),
                off: Pose::from_position(Vec3::new(-5.0, 0.0, 0.0)),
                on: Pose::from_position(Vec3::new(-5.0, 2.0, 0.0)),
                speed: 1.0,
                kinematic: true,
            }],
            jump_pads: vec![JumpPadDefinition {
                id: ObjectId(400),
                pose: Pose::from_position(Vec3::new(10.0, 0.0, 0.0)),
                tuning: JumpPadTuning::default(),
            }],
            mines: vec![MineDefinition {
                id: ObjectId(500),
                position: Vec3::new(15.0, 0.0, 0.0),
                tuning: MineTuning::default(),
            }],
        }
    }

    fn setup(settings: &Settings) -> (
        LevelSession,
        HeadlessWorld,
        std::rc::Rc<std::cell::RefCell<RecordingProgress>>,
    ) {
        let def = definition();
        let mut world = spawn_headless(&def);
        world.gravity = Vec3::ZERO;
        let (rec, collaborators) = RecordingProgress::collaborators();
        let session = LevelSession::from_definition(&def, settings, &mut world, collaborators);
        (session, world, rec)
    }

    #[test]
    fn test_from_definition() {
        let (session, world, _) = setup(&Settings::default());
        assert_eq!(session.level_index, 7);
        assert_eq!(session.level.objects().len(), 1);
        assert_eq!(session.level.destroy_roster(), &[ObjectId(3)]);
        assert_eq!(session.star_count(), 2);
        assert_eq!(session.player(), Some(PLAYER));
        assert_eq!(session.phase(), SessionPhase::Playing);
        assert_eq!(world.local_pose(ObjectId(1)), Some(Pose::from_position(Vec3::ZERO)));
    }

    #[test]
    fn test_toggle_and_transition_events() {
        let (mut session, mut world, rec) = setup(&Settings::default());
        assert_eq!(session.handle_input(&mut world, true), Some(true));
        assert!(!world.is_active(ObjectId(3)));
        for _ in 0..30 {
            session.fixed_tick(&mut world, 0.02);
        }
        let events = session.drain_events();
        assert_eq!(
            events,
            vec![
                LevelEvent::Toggled { state: true },
                LevelEvent::TransitionFinished { state: true }
            ]
        );
        assert_eq!(
            world.local_pose(ObjectId(1)),
            Some(Pose::from_position(Vec3::new(0.0, 4.0, 0.0)))
        );
        assert_eq!(rec.borrow().toggles, 1);
        assert!(session.events().is_empty());
    }

    #[test]
    fn test_goal_latch_fires_once() {
        let (mut session, mut world, rec) = setup(&Settings::default());
        // Park the player right on the goal for two consecutive ticks
        world.place(PLAYER, Pose::from_position(Vec3::new(30.1, 0.0, 0.0)));
        session.fixed_tick(&mut world, 0.02);
        world.place(PLAYER, Pose::from_position(Vec3::new(30.05, 0.0, 0.0)));
        session.fixed_tick(&mut world, 0.02);
        session.on_goal_reached();

        assert_eq!(rec.borrow().completed, vec![7]);
        assert_eq!(rec.borrow().clean, vec![7]);
        assert_eq!(rec.borrow().scores, vec![(7, 0)]);
        assert_eq!(session.phase(), SessionPhase::Completed);
        let completions = session
            .events()
            .iter()
            .filter(|e| matches!(e, LevelEvent::LevelCompleted { .. }))
            .count();
        assert_eq!(completions, 1);
    }

    #[test]
    fn test_completed_handlers_run_once_per_run() {
        let (mut session, mut world, _) = setup(&Settings::default());
        let seen = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let sink = seen.clone();
        session.on_completed(move |e| sink.borrow_mut().push(*e));

        session.on_goal_reached();
        session.on_goal_reached();
        session.restart(&mut world);
        session.handle_input(&mut world, true);
        session.on_goal_reached();

        assert_eq!(
            *seen.borrow(),
            vec![
                LevelEvent::LevelCompleted {
                    level: 7,
                    stars: 0,
                    toggles_used: 0
                },
                LevelEvent::LevelCompleted {
                    level: 7,
                    stars: 0,
                    toggles_used: 1
                },
            ]
        );
    }

    #[test]
    fn test_huge_level_index_completes_and_scores() {
        use crate::persistence::{MemoryStore, shared};
        use crate::progress::ScoreBook;

        let mut def = definition();
        def.index = usize::MAX;
        let mut world = spawn_headless(&def);
        let store = shared(MemoryStore::new());
        let collaborators = Collaborators::default().with_scores(ScoreBook::load(store.clone()));
        let mut session =
            LevelSession::from_definition(&def, &Settings::default(), &mut world, collaborators);

        session.collect_star(&mut world, ObjectId(200));
        session.on_goal_reached();
        assert!(session.is_completed());
        assert_eq!(ScoreBook::load(store).stars(usize::MAX), 1);
    }

    #[test]
    fn test_hazards_fire_and_rearm_on_restart() {
        let (mut session, mut world, _) = setup(&Settings::default());
        world.place(PLAYER, Pose::from_position(Vec3::new(10.0, 0.5, 0.0)));
        session.fixed_tick(&mut world, 0.02);
        session.fixed_tick(&mut world, 0.02);
        assert_eq!(world.velocity(PLAYER).0.y, 15.0);

        world.place(PLAYER, Pose::from_position(Vec3::new(15.0, 1.0, 0.0)));
        session.fixed_tick(&mut world, 0.02);
        session.fixed_tick(&mut world, 0.02);
        assert!(!world.is_active(ObjectId(500)));

        let hazard_events: Vec<_> = session
            .events()
            .iter()
            .filter(|e| {
                matches!(
                    e,
                    LevelEvent::JumpPadLaunched { .. } | LevelEvent::MineExploded { .. }
                )
            })
            .copied()
            .collect();
        assert_eq!(
            hazard_events,
            vec![
                LevelEvent::JumpPadLaunched { pad: ObjectId(400) },
                LevelEvent::MineExploded { mine: ObjectId(500) },
            ]
        );

        session.restart(&mut world);
        assert!(world.is_active(ObjectId(500)));
        assert!(!session.mines[0].has_exploded());
    }

    #[test]
    fn test_animated_items_run_and_reset() {
        let (mut session, mut world, _) = setup(&Settings::default());
        assert_eq!(session.animated.len(), 1);
        // One flip tick, then a one second pass
        for _ in 0..53 {
            session.fixed_tick(&mut world, 0.02);
        }
        assert_eq!(
            world.local_pose(ObjectId(300)),
            Some(Pose::from_position(Vec3::new(-5.0, 2.0, 0.0)))
        );
        // Runs regardless of the player's toggle state
        assert!(!session.level.current_target_state());

        session.restart(&mut world);
        assert_eq!(
            world.local_pose(ObjectId(300)),
            Some(Pose::from_position(Vec3::new(-5.0, 0.0, 0.0)))
        );
    }

    #[test]
    fn test_completion_pauses_input() {
        let (mut session, mut world, _) = setup(&Settings::default());
        session.on_goal_reached();
        assert_eq!(session.handle_input(&mut world, true), None);
        assert!(!session.level.current_target_state());
        // Unpausing from the menu does not reopen a finished level
        session.set_paused(false);
        assert!(session.level.is_paused());
    }

    #[test]
    fn test_dirty_run_not_reported_clean() {
        let (mut session, mut world, rec) = setup(&Settings::instant());
        for _ in 0..4 {
            session.handle_input(&mut world, true);
            session.handle_input(&mut world, false);
        }
        assert_eq!(session.level.toggles_used(), 4);
        session.on_goal_reached();
        assert_eq!(rec.borrow().completed, vec![7]);
        assert!(rec.borrow().clean.is_empty());
    }

    #[test]
    fn test_stars_end_level_when_all_collected() {
        let (mut session, mut world, rec) = setup(&Settings::default());
        assert!(session.collect_star(&mut world, ObjectId(200)));
        assert!(!session.collect_star(&mut world, ObjectId(200)));
        assert!(!session.collect_star(&mut world, ObjectId(999)));
        assert!(!world.is_active(ObjectId(200)));
        assert!(!session.is_completed());

        assert!(session.collect_star(&mut world, ObjectId(201)));
        assert!(session.is_completed());
        assert_eq!(rec.borrow().scores, vec![(7, 2)]);
    }

    #[test]
    fn test_collect_stars_near_player() {
        let (mut session, mut world, _) = setup(&Settings::default());
        assert_eq!(session.collect_stars_near_player(&mut world, 0.5), 0);
        world.place(PLAYER, Pose::from_position(Vec3::new(1.2, 1.0, 0.0)));
        assert_eq!(session.collect_stars_near_player(&mut world, 0.5), 1);
        assert_eq!(session.stars_won(), 1);
    }

    #[test]
    fn test_fall_resets_player_and_restores_roster() {
        let (mut session, mut world, _) = setup(&Settings::default());
        session.handle_input(&mut world, true);
        assert!(!world.is_active(ObjectId(3)));

        world.place(PLAYER, Pose::from_position(Vec3::new(0.0, -11.0, 0.0)));
        session.fixed_tick(&mut world, 0.02);

        assert!(world.is_active(ObjectId(3)));
        assert_eq!(
            world.local_pose(PLAYER),
            Some(Pose::from_position(Vec3::new(0.0, 1.0, 0.0)))
        );
        assert!(session.events().contains(&LevelEvent::PlayerReset));
    }

    #[test]
    fn test_restart() {
        let (mut session, mut world, _) = setup(&Settings::default());
        session.handle_input(&mut world, true);
        session.collect_star(&mut world, ObjectId(200));
        session.collect_star(&mut world, ObjectId(201));
        world.set_velocity(PLAYER, Vec3::X, Vec3::ZERO);
        assert!(session.is_completed());

        session.restart(&mut world);
        assert_eq!(session.phase(), SessionPhase::Playing);
        assert_eq!(session.stars_won(), 0);
        assert_eq!(session.level.toggles_used(), 0);
        assert!(world.is_active(ObjectId(200)));
        assert!(world.is_active(ObjectId(3)));
        assert_eq!(world.velocity(PLAYER).0, Vec3::ZERO);
        assert_eq!(world.local_pose(ObjectId(1)), Some(Pose::from_position(Vec3::ZERO)));

        // Input works again after restart
        assert_eq!(session.handle_input(&mut world, true), Some(true));
    }

    #[test]
    fn test_user_pause() {
        let (mut session, mut world, _) = setup(&Settings::default());
        session.set_paused(true);
        assert_eq!(session.phase(), SessionPhase::Paused);
        assert_eq!(session.handle_input(&mut world, true), None);
        session.set_paused(false);
        assert_eq!(session.handle_input(&mut world, true), None);
        assert_eq!(session.handle_input(&mut world, false), Some(false));
    }
}
