//! Debug Defender entry point
//!
//! On the web this wires DOM events into a [`Session`] driven by the
//! browser scheduler and draws the board on a 2D canvas. Natively it runs
//! a headless autopilot game on a virtual clock and logs the result.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::{Cell, RefCell};
    use std::rc::{Rc, Weak};

    use glam::Vec2;
    use wasm_bindgen::prelude::*;
    use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, KeyboardEvent, MouseEvent};

    use debug_defender::consts::*;
    use debug_defender::persistence::LocalStorageStore;
    use debug_defender::platform::web::WebScheduler;
    use debug_defender::platform::{Scheduler, Task, Wakeup};
    use debug_defender::sim::camera::LINE_HEIGHT;
    use debug_defender::sim::projectile::required_charge_ms;
    use debug_defender::sim::{GameStatus, World};
    use debug_defender::{EnemyKind, HighScores, Session, Settings, Tuning};

    type Shared = Rc<RefCell<Session<WebScheduler>>>;

    const USER_ID: &str = "local";

    struct Board {
        canvas: HtmlCanvasElement,
        ctx: CanvasRenderingContext2d,
        last_frame: Cell<Option<f64>>,
        /// Smoothed frames per second
        fps: Cell<f64>,
    }

    impl Board {
        fn note_frame(&self, timestamp: f64) {
            if let Some(prev) = self.last_frame.replace(Some(timestamp)) {
                let dt = timestamp - prev;
                if dt > 0.0 {
                    self.fps.set(self.fps.get() * 0.9 + (1000.0 / dt) * 0.1);
                }
            }
        }

        fn sync_origin(&self, session: &mut Session<WebScheduler>) {
            let rect = self.canvas.get_bounding_client_rect();
            session.set_board_origin(Vec2::new(rect.left() as f32, rect.top() as f32));
        }

        fn render(&self, world: &World, settings: &Settings, now: f64) {
            let ctx = &self.ctx;
            ctx.set_fill_style_str("#1e1e1e");
            ctx.fill_rect(0.0, 0.0, VIEWPORT_WIDTH as f64, VIEWPORT_HEIGHT as f64);

            // Editor line numbers in the left gutter
            ctx.set_fill_style_str("#858585");
            ctx.set_font("10px monospace");
            let (first, last) = world.camera.visible_lines();
            for line in first..=last {
                let y = (line as f32 * LINE_HEIGHT - world.camera.origin.y) as f64;
                let _ = ctx.fill_text(&line.to_string(), 4.0, y);
            }

            ctx.save();
            let offset = world.camera.transform();
            let _ = ctx.translate(offset.x as f64, offset.y as f64);

            for e in &world.enemies {
                ctx.set_fill_style_str(match e.kind {
                    EnemyKind::Basic => "#f14c4c",
                    EnemyKind::Fast => "#cca700",
                    EnemyKind::Tank => "#c586c0",
                });
                let half = ENEMY_HITBOX as f64 / 2.0;
                ctx.fill_rect(e.pos.x as f64 - half, e.pos.y as f64 - half, half * 2.0, half * 2.0);
            }

            for p in &world.projectiles {
                ctx.set_fill_style_str(if p.is_charged { "#4ec9b0" } else { "#9cdcfe" });
                let half = p.size as f64 / 2.0;
                ctx.fill_rect(p.pos.x as f64 - half, p.pos.y as f64 - half, half * 2.0, half * 2.0);
            }

            let player = &world.player;
            let blink = player.is_invulnerable() && (now / 100.0) as i64 % 2 == 0;
            if !blink {
                ctx.set_fill_style_str(if player.is_dashing() { "#ffffff" } else { "#569cd6" });
                let half = PLAYER_SIZE as f64 / 2.0;
                ctx.fill_rect(player.pos.x as f64 - half, player.pos.y as f64 - half, half * 2.0, half * 2.0);
            }
            ctx.restore();

            self.render_hud(world, settings);
        }

        /// Charge meter under the HUD line, `progress` in 0..=1
        fn render_charge(&self, progress: f32) {
            if progress <= 0.0 {
                return;
            }
            let ctx = &self.ctx;
            ctx.set_fill_style_str(if progress >= 1.0 { "#4ec9b0" } else { "#9cdcfe" });
            ctx.fill_rect(60.0, 32.0, 200.0 * progress as f64, 6.0);
        }

        fn render_hud(&self, world: &World, settings: &Settings) {
            let ctx = &self.ctx;
            ctx.set_fill_style_str("#d4d4d4");
            ctx.set_font("16px monospace");
            let hud = format!(
                "Level {}  Kills {}  Score {}  Health {}/{}  $ {}",
                world.current_level,
                world.level_kill_count,
                world.score,
                world.player.health,
                world.max_health(),
                world.mathbucks
            );
            let _ = ctx.fill_text(&hud, 60.0, 24.0);
            if settings.show_fps {
                let _ = ctx.fill_text(&format!("{:.0} fps", self.fps.get()), 1080.0, 24.0);
            }

            let banner = match world.status {
                GameStatus::Menu => Some("Press Enter to play"),
                GameStatus::GameOver => Some("Stack overflow! Press Enter to retry"),
                GameStatus::Victory => Some("All bugs fixed! Press Enter to play again"),
                GameStatus::Playing if world.is_level_transitioning => Some("Level complete"),
                GameStatus::Playing if world.in_store => Some("Store (P to close)"),
                GameStatus::Playing if world.is_paused => Some("Paused (Esc to resume)"),
                GameStatus::Playing => None,
            };
            if let Some(text) = banner {
                ctx.set_font("32px monospace");
                let _ = ctx.fill_text(text, 360.0, VIEWPORT_HEIGHT as f64 / 2.0);
            }
        }
    }

    fn render(session: &Session<WebScheduler>, board: &Board) {
        let world = session.world();
        let now = session.scheduler().now();
        board.render(world, session.settings(), now);
        let charge = required_charge_ms(world, session.tuning())
            .map(|ms| world.player.charge.progress(now, ms))
            .unwrap_or(0.0);
        board.render_charge(charge);
    }

    pub fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        let _ = console_log::init_with_level(log::Level::Info);

        log::info!("Debug Defender starting...");

        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("game-board")
            .ok_or("no #game-board canvas")?
            .dyn_into()?;
        canvas.set_width(VIEWPORT_WIDTH as u32);
        canvas.set_height(VIEWPORT_HEIGHT as u32);
        let ctx: CanvasRenderingContext2d = canvas
            .get_context("2d")?
            .ok_or("no 2d context")?
            .dyn_into()?;
        let board = Rc::new(Board {
            canvas,
            ctx,
            last_frame: Cell::new(None),
            fps: Cell::new(60.0),
        });

        let seed = js_sys::Date::now() as u64;
        let session = Session::new(WebScheduler::new(window.clone()), Tuning::default(), Settings::load(), seed)
            .with_score_sink(HighScores::load())
            .with_save_store(LocalStorageStore, USER_ID);
        let session: Shared = Rc::new(RefCell::new(session));
        log::info!("Session created with seed: {}", seed);

        // Wakeups re-enter the session; the weak handle avoids an Rc cycle
        {
            let weak: Weak<RefCell<Session<WebScheduler>>> = Rc::downgrade(&session);
            let board = board.clone();
            let dispatch = Rc::new(move |wakeup: Wakeup, timestamp: f64| {
                let Some(session) = weak.upgrade() else {
                    return;
                };
                let mut s = session.borrow_mut();
                s.on_wakeup(wakeup, timestamp);
                if wakeup.task == Task::Frame {
                    board.note_frame(timestamp);
                    render(&s, &board);
                    for event in s.drain_events() {
                        log::trace!("{:?}", event);
                    }
                }
            });
            session.borrow_mut().scheduler_mut().set_dispatch(dispatch);
        }

        setup_keyboard(&window, session.clone(), board.clone());
        setup_mouse(&board, session.clone());
        setup_auto_pause(&window, &document, session.clone(), board.clone());

        render(&session.borrow(), &board);
        log::info!("Debug Defender running!");
        Ok(())
    }

    fn setup_keyboard(window: &web_sys::Window, session: Shared, board: Rc<Board>) {
        {
            let session = session.clone();
            let board = board.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let key = event.key();
                let mut s = session.borrow_mut();
                if event.repeat() && matches!(key.as_str(), "p" | "P" | "Escape" | "q" | "Q" | "e" | "E") {
                    return;
                }
                if key == "Enter" && s.world().status != GameStatus::Playing {
                    if s.world().status == GameStatus::Menu {
                        s.continue_or_new();
                    } else {
                        s.start_new_game();
                    }
                    render(&s, &board);
                    return;
                }
                if s.key_down(&key) {
                    event.prevent_default();
                    render(&s, &board);
                }
            });
            let _ = window.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                session.borrow_mut().key_up(&event.key());
            });
            let _ = window.add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_mouse(board: &Rc<Board>, session: Shared) {
        let canvas = &board.canvas;

        {
            let session = session.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                session.borrow_mut().mouse_down(event.button());
            });
            let _ = canvas.add_event_listener_with_callback("mousedown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        {
            let board_cb = board.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                let mut s = session.borrow_mut();
                board_cb.sync_origin(&mut s);
                let screen = Vec2::new(event.client_x() as f32, event.client_y() as f32);
                s.mouse_up(event.button(), screen);
            });
            let _ = canvas.add_event_listener_with_callback("mouseup", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Right click is the dash, not a menu
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                event.prevent_default();
            });
            let _ = canvas.add_event_listener_with_callback("contextmenu", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_auto_pause(window: &web_sys::Window, document: &web_sys::Document, session: Shared, board: Rc<Board>) {
        // Visibility change (tab switch, minimize)
        {
            let session = session.clone();
            let board = board.clone();
            let document_clone = document.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                if document_clone.visibility_state() == web_sys::VisibilityState::Hidden {
                    let mut s = session.borrow_mut();
                    s.on_blur();
                    render(&s, &board);
                    log::info!("Auto-paused (tab hidden)");
                }
            });
            let _ = document.add_event_listener_with_callback("visibilitychange", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Window blur (click outside)
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                let mut s = session.borrow_mut();
                s.on_blur();
                render(&s, &board);
                log::info!("Auto-paused (window blur)");
            });
            let _ = window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() -> Result<(), JsValue> {
    wasm_game::run()
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Debug Defender (native) starting...");
    log::info!("Native mode runs a headless autopilot game; use the wasm build to play");

    let mut args = std::env::args().skip(1);
    let seed = args.next().and_then(|s| s.parse().ok()).unwrap_or(42);
    let tuning = match args.next() {
        Some(path) => match std::fs::read_to_string(&path) {
            Ok(json) => debug_defender::Tuning::from_json_or_default(&json),
            Err(e) => {
                log::warn!("Could not read tuning file {}: {}", path, e);
                debug_defender::Tuning::default()
            }
        },
        None => debug_defender::Tuning::default(),
    };

    autopilot::run(seed, tuning);
}

/// Headless demo player: strafes, keeps away from the closest enemy and
/// fires charged shots at it
#[cfg(not(target_arch = "wasm32"))]
mod autopilot {
    use glam::Vec2;

    use debug_defender::consts::REFERENCE_FRAME_MS;
    use debug_defender::persistence::MemoryStore;
    use debug_defender::platform::ManualScheduler;
    use debug_defender::session::PRIMARY_BUTTON;
    use debug_defender::sim::{GameEvent, GameStatus};
    use debug_defender::{HighScores, Session, Settings, Tuning};

    /// Virtual time per decision
    const STEP_MS: f64 = 100.0;
    /// Stop after ten minutes of game time
    const MAX_GAME_MS: f64 = 600_000.0;
    const KEEP_AWAY: f32 = 150.0;

    pub fn run(seed: u64, tuning: Tuning) {
        let mut session = Session::new(
            ManualScheduler::new(REFERENCE_FRAME_MS as f64),
            tuning,
            Settings::default(),
            seed,
        )
        .with_score_sink(HighScores::new())
        .with_save_store(MemoryStore::new(), "autopilot");

        session.start_new_game();
        let mut elapsed = 0.0;
        let mut charging = false;

        while session.world().status == GameStatus::Playing && elapsed < MAX_GAME_MS {
            steer(&mut session);

            let target = session
                .world()
                .enemies
                .iter()
                .min_by(|a, b| {
                    let p = session.world().player.pos;
                    a.pos.distance_squared(p).total_cmp(&b.pos.distance_squared(p))
                })
                .map(|e| e.pos);

            match (target, charging) {
                (Some(enemy), true) => {
                    let screen = session.world().camera.world_to_screen(enemy, Vec2::ZERO);
                    session.mouse_up(PRIMARY_BUTTON, screen);
                    charging = false;
                }
                (Some(_), false) => {
                    session.mouse_down(PRIMARY_BUTTON);
                    charging = true;
                }
                (None, _) => {}
            }

            session.advance(STEP_MS);
            elapsed += STEP_MS;

            for event in session.drain_events() {
                match event {
                    GameEvent::LevelComplete { level } => log::info!("Level {} complete", level),
                    GameEvent::LevelStarted { level } => log::info!("Level {} started", level),
                    GameEvent::PlayerHit { damage, health } => log::debug!("Hit for {} ({} left)", damage, health),
                    _ => {}
                }
            }
        }

        let world = session.world();
        log::info!(
            "Autopilot finished: {:?} at level {} with score {} after {:.1}s",
            world.status,
            world.current_level,
            world.score,
            elapsed / 1000.0
        );
        session.quit_to_menu();
    }

    /// Hold movement keys away from the closest enemy
    fn steer(session: &mut Session<ManualScheduler>) {
        let player = session.world().player.pos;
        let threat = session
            .world()
            .enemies
            .iter()
            .map(|e| e.pos - player)
            .filter(|d| d.length() < KEEP_AWAY)
            .min_by(|a, b| a.length().total_cmp(&b.length()));

        for key in ["a", "d", "w", "s"] {
            session.key_up(key);
        }
        if let Some(d) = threat {
            session.key_down(if d.x > 0.0 { "a" } else { "d" });
            session.key_down(if d.y > 0.0 { "w" } else { "s" });
        }
    }
}
