//! Game loop orchestration
//!
//! A [`Session`] owns the world and every pending host callback. Entry
//! points (input, wakeups, menu actions) mutate the world and then call
//! [`Session::sync_schedules`], which makes the set of pending requests
//! match the state:
//!
//! | Request          | Pending while                                             |
//! |------------------|-----------------------------------------------------------|
//! | frame chain      | playing, not paused, not in the store                     |
//! | spawn interval   | as above, not transitioning, kill quota not met           |
//! | ability deadline | playing and some ability timer is counting down           |
//! | level transition | playing and transitioning (pause does not cancel it)      |
//!
//! There is never more than one request per kind. Resets bump the
//! generation so anything that still fires from before is dropped.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::error::{PersistenceError, ShopError};
use crate::highscores::ScoreSink;
use crate::persistence::{SaveSnapshot, SaveStore};
use crate::platform::{ManualScheduler, Scheduler, Task, TaskId, Wakeup};
use crate::settings::Settings;
use crate::shop;
use crate::sim::level::{LevelOutcome, complete_transition, current_config, spawn_tick, spawning_allowed};
use crate::sim::movement::{InputState, Key};
use crate::sim::powerups::{Activation, activate};
use crate::sim::projectile::release_charge;
use crate::sim::state::{GameEvent, GameStatus, PowerUpKind, StatKind, World};
use crate::sim::tick::tick;
use crate::tuning::{GunId, Tuning};

/// Mouse buttons as reported by `MouseEvent.button`
pub const PRIMARY_BUTTON: i16 = 0;
pub const SECONDARY_BUTTON: i16 = 2;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Pending {
    id: TaskId,
    ticket: u64,
    /// Spawn period or ability deadline, used to detect changes
    at: f64,
}

enum Request {
    Frame,
    Timeout { delay_ms: f64 },
    Interval { period_ms: f64 },
}

/// One player's game, driven by a host scheduler
pub struct Session<S: Scheduler> {
    scheduler: S,
    tuning: Tuning,
    settings: Settings,
    world: World,
    input: InputState,
    /// Seeds for each new run
    seeds: Pcg32,
    generation: u64,
    next_ticket: u64,
    frame: Option<Pending>,
    spawn: Option<Pending>,
    abilities: Option<Pending>,
    transition: Option<Pending>,
    last_frame_at: Option<f64>,
    /// Game board's top-left corner in screen coordinates
    board_origin: Vec2,
    score_sink: Option<Box<dyn ScoreSink>>,
    score_submitted: bool,
    save_store: Option<(Box<dyn SaveStore>, String)>,
}

impl<S: Scheduler> Session<S> {
    /// Session sitting in the menu
    pub fn new(scheduler: S, tuning: Tuning, settings: Settings, seed: u64) -> Self {
        Self {
            scheduler,
            tuning,
            settings,
            world: World::new(seed),
            input: InputState::default(),
            seeds: Pcg32::seed_from_u64(seed),
            generation: 0,
            next_ticket: 1,
            frame: None,
            spawn: None,
            abilities: None,
            transition: None,
            last_frame_at: None,
            board_origin: Vec2::ZERO,
            score_sink: None,
            score_submitted: false,
            save_store: None,
        }
    }

    pub fn with_score_sink(mut self, sink: impl ScoreSink + 'static) -> Self {
        self.score_sink = Some(Box::new(sink));
        self
    }

    pub fn with_save_store(mut self, store: impl SaveStore + 'static, user_id: impl Into<String>) -> Self {
        self.save_store = Some((Box::new(store), user_id.into()));
        self
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    /// Direct world access for tools and tests. Call
    /// [`Session::sync_schedules`] after changing anything that gates a timer.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    pub fn input(&self) -> &InputState {
        &self.input
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn set_board_origin(&mut self, origin: Vec2) {
        self.board_origin = origin;
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.world.drain_events()
    }

    // === Game state machine ===

    pub fn start_new_game(&mut self) {
        let seed = self.seeds.random::<u64>();
        log::info!("Starting new game (seed {})", seed);
        self.begin(World::new(seed));
    }

    /// Resume a saved run without any level-1 setup
    pub fn resume(&mut self, snapshot: &SaveSnapshot) {
        let seed = self.seeds.random::<u64>();
        let world = snapshot.restore(&self.tuning, seed);
        log::info!(
            "Resuming level {} ({} kills, {} enemies)",
            world.current_level,
            world.level_kill_count,
            world.enemies.len()
        );
        self.begin(world);
    }

    /// Resume the configured user's save, or start fresh if there is none
    /// or it cannot be read. Returns true if a save was resumed.
    pub fn continue_or_new(&mut self) -> bool {
        let loaded = match &self.save_store {
            Some((store, user)) => store.load(user),
            None => Ok(None),
        };
        match loaded {
            Ok(Some(snapshot)) => {
                self.resume(&snapshot);
                true
            }
            Ok(None) => {
                self.start_new_game();
                false
            }
            Err(e) => {
                log::warn!("Failed to load save, starting fresh: {}", e);
                self.start_new_game();
                false
            }
        }
    }

    fn begin(&mut self, mut world: World) {
        self.cancel_all();
        self.generation += 1;
        world.status = GameStatus::Playing;
        world.is_paused = false;
        world.in_store = false;
        self.world = world;
        self.input.clear();
        self.score_submitted = false;
        self.sync_schedules();
    }

    /// Leave the run for the menu. The final score is submitted once.
    pub fn quit_to_menu(&mut self) {
        match self.world.status {
            GameStatus::Menu => return,
            GameStatus::Playing => {
                self.autosave();
                self.submit_score();
            }
            GameStatus::GameOver | GameStatus::Victory => self.submit_score(),
        }
        log::info!("Quit to menu");
        self.world.status = GameStatus::Menu;
        self.world.is_paused = false;
        self.world.in_store = false;
        self.world.player.charge.cancel();
        self.generation += 1;
        self.sync_schedules();
    }

    pub fn set_paused(&mut self, paused: bool) {
        if self.world.status != GameStatus::Playing || self.world.is_paused == paused {
            return;
        }
        self.world.is_paused = paused;
        if paused {
            self.world.player.charge.cancel();
        }
        log::info!("{}", if paused { "Paused" } else { "Resumed" });
        self.sync_schedules();
    }

    pub fn toggle_pause(&mut self) {
        self.set_paused(!self.world.is_paused);
    }

    pub fn set_in_store(&mut self, in_store: bool) {
        if self.world.status != GameStatus::Playing || self.world.in_store == in_store {
            return;
        }
        self.world.in_store = in_store;
        if in_store {
            self.world.player.charge.cancel();
        }
        self.sync_schedules();
    }

    pub fn toggle_store(&mut self) {
        self.set_in_store(!self.world.in_store);
    }

    /// Replace the host preferences and persist them
    pub fn set_settings(&mut self, settings: Settings) {
        self.settings = settings;
        self.settings.save();
    }

    pub fn toggle_fps(&mut self) {
        let mut settings = self.settings.clone();
        settings.show_fps = !settings.show_fps;
        self.set_settings(settings);
    }

    // === Input ===

    fn accepts_gameplay_input(&self) -> bool {
        self.world.is_running() && !self.world.is_level_transitioning
    }

    /// DOM `keydown`. Returns true if the key is bound.
    pub fn key_down(&mut self, key: &str) -> bool {
        match key {
            "p" | "P" => self.toggle_store(),
            "Escape" => self.toggle_pause(),
            "q" | "Q" => {
                self.activate_power_up(PowerUpKind::DoubleScore);
            }
            "e" | "E" => {
                self.activate_power_up(PowerUpKind::Nuke);
            }
            "f" | "F" => self.toggle_fps(),
            _ => match Key::from_dom_key(key) {
                Some(k) => self.input.set(k, true),
                None => return false,
            },
        }
        true
    }

    /// DOM `keyup`
    pub fn key_up(&mut self, key: &str) {
        if let Some(k) = Key::from_dom_key(key) {
            self.input.set(k, false);
        }
    }

    /// Window lost focus: held keys are gone and a charge is abandoned
    pub fn on_blur(&mut self) {
        self.input.clear();
        self.world.player.charge.cancel();
        if self.settings.pause_on_blur {
            self.set_paused(true);
        }
    }

    /// Primary starts a charge, secondary dashes
    pub fn mouse_down(&mut self, button: i16) {
        if !self.accepts_gameplay_input() {
            return;
        }
        let now = self.scheduler.now();
        match button {
            PRIMARY_BUTTON => self.world.player.charge.start(now),
            SECONDARY_BUTTON => {
                let player = self.tuning.player;
                if self
                    .world
                    .player
                    .dash
                    .trigger(now, player.dash_duration_ms, player.dash_cooldown_ms)
                {
                    log::debug!("Dash");
                }
            }
            _ => {}
        }
        self.sync_schedules();
    }

    /// Primary release fires toward the cursor. Returns whether the shot
    /// was charged, or `None` if nothing was fired.
    pub fn mouse_up(&mut self, button: i16, screen: Vec2) -> Option<bool> {
        if button != PRIMARY_BUTTON {
            return None;
        }
        if !self.accepts_gameplay_input() {
            self.world.player.charge.cancel();
            return None;
        }
        let now = self.scheduler.now();
        let target = self.world.camera.screen_to_world(screen, self.board_origin);
        release_charge(&mut self.world, &self.tuning, now, target)
    }

    pub fn activate_power_up(&mut self, kind: PowerUpKind) -> Activation {
        let now = self.scheduler.now();
        let result = activate(&mut self.world, &self.tuning, kind, now);
        self.sync_schedules();
        result
    }

    // === Store ===

    pub fn buy_gun(&mut self, gun: GunId) -> Result<(), ShopError> {
        shop::buy_gun(&mut self.world, &self.tuning, gun)
    }

    pub fn equip_gun(&mut self, gun: GunId) -> Result<(), ShopError> {
        shop::equip_gun(&mut self.world, gun)
    }

    pub fn upgrade_stat(&mut self, stat: StatKind) -> Result<u8, ShopError> {
        shop::upgrade_stat(&mut self.world, stat)
    }

    pub fn buy_power_up(&mut self, kind: PowerUpKind) -> Result<u32, ShopError> {
        shop::buy_power_up(&mut self.world, kind)
    }

    // === Persistence ===

    /// Save the current run. On failure the in-memory world is unchanged.
    pub fn save_game(&mut self) -> Result<(), PersistenceError> {
        let (store, user) = self
            .save_store
            .as_mut()
            .ok_or_else(|| PersistenceError::Unavailable("no save store configured".into()))?;
        let snapshot = SaveSnapshot::capture(&self.world);
        store.save(user, &snapshot)?;
        log::info!("Saved level {} for {}", snapshot.current_level, user);
        Ok(())
    }

    fn autosave(&mut self) {
        if self.save_store.is_none() {
            return;
        }
        if let Err(e) = self.save_game() {
            log::warn!("Autosave failed: {}", e);
        }
    }

    fn submit_score(&mut self) {
        if self.score_submitted {
            return;
        }
        self.score_submitted = true;
        let (score, level) = (self.world.score, self.world.current_level);
        if let Some(sink) = self.score_sink.as_mut() {
            if let Err(e) = sink.submit_score(score, level) {
                log::warn!("Score submission failed: {}", e);
            }
        }
    }

    // === Host callbacks ===

    fn slot(&mut self, task: Task) -> &mut Option<Pending> {
        match task {
            Task::Frame => &mut self.frame,
            Task::Spawn => &mut self.spawn,
            Task::Abilities => &mut self.abilities,
            Task::LevelTransition => &mut self.transition,
        }
    }

    /// A scheduled request fired. `timestamp` is the frame time for frames
    /// and ignored otherwise.
    pub fn on_wakeup(&mut self, wakeup: Wakeup, timestamp: f64) {
        if wakeup.generation != self.generation {
            log::debug!(
                "Dropping stale {:?} from generation {} (now {})",
                wakeup.task,
                wakeup.generation,
                self.generation
            );
            return;
        }
        let pending = *self.slot(wakeup.task);
        if pending.is_none_or(|p| p.ticket != wakeup.ticket) {
            log::debug!("Dropping superseded {:?} wakeup", wakeup.task);
            return;
        }
        if wakeup.task != Task::Spawn {
            *self.slot(wakeup.task) = None;
        }

        match wakeup.task {
            Task::Frame => self.run_frame(timestamp),
            Task::Spawn => {
                spawn_tick(&mut self.world, &self.tuning);
            }
            Task::Abilities => {
                let now = self.scheduler.now();
                self.world.refresh_timers(now);
            }
            Task::LevelTransition => self.finish_level_transition(),
        }
        self.sync_schedules();
    }

    fn run_frame(&mut self, timestamp: f64) {
        let delta_ms = match self.last_frame_at {
            Some(prev) => self.settings.clamp_frame_delta(timestamp - prev),
            None => 0.0,
        };
        self.last_frame_at = Some(timestamp);

        let now = self.scheduler.now();
        let report = tick(&mut self.world, &self.input, &self.tuning, now, delta_ms);
        if report.collisions.game_over {
            self.submit_score();
        }
    }

    fn finish_level_transition(&mut self) {
        match complete_transition(&mut self.world, &self.tuning) {
            Some(LevelOutcome::Advanced(_)) => {
                if self.settings.autosave_on_level_start {
                    self.autosave();
                }
            }
            Some(LevelOutcome::Victory) => self.submit_score(),
            None => {}
        }
    }

    // === Scheduling ===

    fn schedule(&mut self, task: Task, request: Request, at: f64) -> Pending {
        let ticket = self.next_ticket;
        self.next_ticket += 1;
        let wakeup = Wakeup {
            task,
            generation: self.generation,
            ticket,
        };
        let id = match request {
            Request::Frame => self.scheduler.request_frame(wakeup),
            Request::Timeout { delay_ms } => self.scheduler.set_timeout(delay_ms, wakeup),
            Request::Interval { period_ms } => self.scheduler.set_interval(period_ms, wakeup),
        };
        Pending { id, ticket, at }
    }

    fn cancel(&mut self, task: Task) {
        if let Some(pending) = self.slot(task).take() {
            self.scheduler.cancel(pending.id);
        }
    }

    fn cancel_all(&mut self) {
        for task in [Task::Frame, Task::Spawn, Task::Abilities, Task::LevelTransition] {
            self.cancel(task);
        }
        self.last_frame_at = None;
    }

    /// Bring pending host requests in line with the current state.
    /// Idempotent.
    pub fn sync_schedules(&mut self) {
        let now = self.scheduler.now();
        self.world.refresh_timers(now);
        let playing = self.world.status == GameStatus::Playing;

        // Frame chain
        if self.world.is_running() {
            if self.frame.is_none() {
                self.frame = Some(self.schedule(Task::Frame, Request::Frame, 0.0));
            }
        } else {
            self.cancel(Task::Frame);
            self.last_frame_at = None;
        }

        // Spawn interval, restarted when the level's cadence changes
        let period = spawning_allowed(&self.world, &self.tuning)
            .then(|| current_config(&self.world, &self.tuning).spawn_interval_ms as f64);
        if self.spawn.map(|p| p.at) != period {
            self.cancel(Task::Spawn);
            if let Some(period_ms) = period {
                self.spawn = Some(self.schedule(Task::Spawn, Request::Interval { period_ms }, period_ms));
            }
        }

        // Earliest ability deadline
        let deadline = if playing { self.world.next_timer_deadline() } else { None };
        if self.abilities.map(|p| p.at) != deadline {
            self.cancel(Task::Abilities);
            if let Some(at) = deadline {
                let delay_ms = (at - now).max(0.0);
                self.abilities = Some(self.schedule(Task::Abilities, Request::Timeout { delay_ms }, at));
            }
        }

        // Level transition, unaffected by pause or the store
        if playing && self.world.is_level_transitioning {
            if self.transition.is_none() {
                let delay_ms = self.tuning.level_transition_ms;
                self.transition = Some(self.schedule(Task::LevelTransition, Request::Timeout { delay_ms }, now + delay_ms));
            }
        } else {
            self.cancel(Task::LevelTransition);
        }
    }
}

impl Session<ManualScheduler> {
    /// Run the virtual clock forward `ms`, firing everything that comes due
    pub fn advance(&mut self, ms: f64) {
        let until = self.scheduler.now() + ms.max(0.0);
        while let Some((at, wakeup)) = self.scheduler.pop_due(until) {
            self.on_wakeup(wakeup, at);
        }
        self.scheduler.set_now(until);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::REFERENCE_FRAME_MS;

    fn session() -> Session<ManualScheduler> {
        Session::new(
            ManualScheduler::new(REFERENCE_FRAME_MS as f64),
            Tuning::default(),
            Settings::default(),
            1234,
        )
    }

    fn counts(s: &Session<ManualScheduler>) -> [usize; 4] {
        let host = s.scheduler();
        [
            host.pending_count(Task::Frame),
            host.pending_count(Task::Spawn),
            host.pending_count(Task::Abilities),
            host.pending_count(Task::LevelTransition),
        ]
    }

    #[test]
    fn test_menu_schedules_nothing() {
        let s = session();
        assert_eq!(s.world().status, GameStatus::Menu);
        assert!(s.scheduler().is_idle());
    }

    #[test]
    fn test_start_creates_one_chain_each() {
        let mut s = session();
        s.start_new_game();
        assert_eq!(counts(&s), [1, 1, 0, 0]);

        s.sync_schedules();
        s.sync_schedules();
        assert_eq!(counts(&s), [1, 1, 0, 0]);

        s.advance(500.0);
        assert_eq!(counts(&s), [1, 1, 0, 0]);
    }

    #[test]
    fn test_pause_cancels_and_resume_restarts() {
        let mut s = session();
        s.start_new_game();
        s.toggle_pause();
        assert_eq!(counts(&s), [0, 0, 0, 0]);

        s.toggle_pause();
        s.toggle_pause();
        s.toggle_pause();
        assert_eq!(counts(&s), [1, 1, 0, 0]);
    }

    #[test]
    fn test_store_halts_like_pause() {
        let mut s = session();
        s.start_new_game();
        assert!(s.key_down("p"));
        assert!(s.world().in_store);
        assert_eq!(counts(&s), [0, 0, 0, 0]);
        s.key_down("P");
        assert_eq!(counts(&s), [1, 1, 0, 0]);
    }

    #[test]
    fn test_input_outside_play_is_ignored() {
        let mut s = session();
        s.mouse_down(PRIMARY_BUTTON);
        s.mouse_down(SECONDARY_BUTTON);
        assert_eq!(s.mouse_up(PRIMARY_BUTTON, Vec2::new(10.0, 10.0)), None);
        s.key_down("Escape");
        s.key_down("p");
        assert_eq!(s.world().status, GameStatus::Menu);
        assert!(s.world().projectiles.is_empty());
        assert!(s.scheduler().is_idle());
    }

    #[test]
    fn test_dash_schedules_deadline() {
        let mut s = session();
        s.start_new_game();
        s.mouse_down(SECONDARY_BUTTON);
        assert!(s.world().player.is_dashing());
        assert_eq!(counts(&s)[2], 1);

        s.advance(150.0);
        assert!(!s.world().player.is_dashing());
        assert!(!s.world().player.can_dash());

        s.advance(450.0);
        assert!(s.world().player.can_dash());
        assert_eq!(counts(&s)[2], 0);
    }

    #[test]
    fn test_dash_expires_while_paused() {
        let mut s = session();
        s.start_new_game();
        s.mouse_down(SECONDARY_BUTTON);
        s.toggle_pause();
        s.advance(1000.0);
        assert!(!s.world().player.is_dashing());
        assert!(s.world().player.can_dash());
    }

    #[test]
    fn test_stale_wakeup_after_reset_is_ignored() {
        let mut s = session();
        s.start_new_game();
        let old = Wakeup {
            task: Task::Spawn,
            generation: s.generation(),
            ticket: s.spawn.map(|p| p.ticket).unwrap_or_default(),
        };

        s.start_new_game();
        s.on_wakeup(old, 0.0);
        assert!(s.world().enemies.is_empty());
        assert_eq!(counts(&s), [1, 1, 0, 0]);
    }

    #[test]
    fn test_first_frame_has_zero_delta() {
        let mut s = session();
        s.start_new_game();
        s.key_down("d");
        s.advance(REFERENCE_FRAME_MS as f64);
        assert_eq!(s.world().player.pos.x, 600.0);
        s.advance(REFERENCE_FRAME_MS as f64);
        assert!((s.world().player.pos.x - 608.0).abs() < 1e-3);
    }

    #[test]
    fn test_fps_toggle_works_from_menu() {
        let mut s = session();
        assert!(s.key_down("f"));
        assert!(s.settings().show_fps);
        s.key_down("F");
        assert!(!s.settings().show_fps);
    }

    #[test]
    fn test_blur_pauses_and_releases_keys() {
        let mut s = session();
        s.start_new_game();
        s.key_down("ArrowUp");
        s.mouse_down(PRIMARY_BUTTON);
        s.on_blur();
        assert!(s.world().is_paused);
        assert_eq!(*s.input(), InputState::default());
        assert!(!s.world().player.is_charging());
    }
}
