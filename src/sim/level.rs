//! Level/wave progression and enemy spawning
//!
//! `Level(n)` completes when the kill count reaches its quota. Completion
//! only flags the transition; the next level (and its reward) is entered
//! when the session's transition timer calls [`complete_transition`].

use glam::Vec2;
use rand::Rng;

use super::camera::Camera;
use super::state::{Enemy, GameEvent, GameStatus, World};
use crate::consts::*;
use crate::tuning::{EnemyKind, FinalLevel, LevelConfig, LevelId, Tuning};

/// Result of a finished level transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelOutcome {
    /// Entered the given level
    Advanced(u32),
    /// The last authored level was cleared in victory mode
    Victory,
}

pub fn current_config(world: &World, tuning: &Tuning) -> LevelConfig {
    tuning.level(world.current_level)
}

/// Whether the spawn timer should be producing enemies right now
pub fn spawning_allowed(world: &World, tuning: &Tuning) -> bool {
    world.is_running()
        && !world.is_level_transitioning
        && world.level_kill_count < current_config(world, tuning).required_kills
}

/// Spawn point for uniform rolls in `[0, 1)`: anywhere in the current
/// viewport, clamped to the world's vertical bounds
pub fn spawn_position(camera: &Camera, roll_x: f32, roll_y: f32) -> Vec2 {
    let x = camera.origin.x + roll_x.clamp(0.0, 1.0) * VIEWPORT_WIDTH;
    let y = camera.origin.y + roll_y.clamp(0.0, 1.0) * VIEWPORT_HEIGHT;
    Vec2::new(x.clamp(0.0, ARENA_WIDTH), y.clamp(0.0, WORLD_HEIGHT))
}

/// Spawn an enemy of `kind` with its base stats
pub fn spawn_enemy_of(world: &mut World, tuning: &Tuning, kind: EnemyKind, pos: Vec2) -> u32 {
    let stats = tuning.enemy(kind);
    world.spawn_enemy(kind, pos, stats.health, stats.speed, stats.damage)
}

/// One spawn-timer firing: draw a weighted enemy type and place it in view.
/// Returns the new enemy id, or `None` when spawning is gated off.
pub fn spawn_tick(world: &mut World, tuning: &Tuning) -> Option<u32> {
    if !spawning_allowed(world, tuning) {
        return None;
    }
    let config = current_config(world, tuning);
    let kind = config.weights.draw(world.rng.random::<f32>());
    let camera = world.camera;
    let pos = spawn_position(&camera, world.rng.random::<f32>(), world.rng.random::<f32>());
    let id = spawn_enemy_of(world, tuning, kind, pos);
    log::trace!("Spawned {} enemy {} at {:?}", kind.as_str(), id, pos);
    Some(id)
}

/// Bookkeeping for an enemy that was just removed from the world.
///
/// Awards score and bounty, restores a little health, counts the kill and
/// flags the level transition when the quota is met. Returns true if this
/// kill completed the level.
pub fn on_enemy_defeated(world: &mut World, tuning: &Tuning, enemy: &Enemy, now: f64) -> bool {
    let stats = tuning.enemy(enemy.kind);
    let multiplier = if world.double_score_active(now) { 2 } else { 1 };
    let score = stats.score * multiplier;

    world.score = world.score.saturating_add(score);
    world.mathbucks = world.mathbucks.saturating_add(stats.bounty);
    world.level_kill_count = world.level_kill_count.saturating_add(1);
    world.player.health = (world.player.health + HEALTH_RESTORE_ON_KILL).min(world.max_health());
    world.events.push(GameEvent::EnemyKilled {
        id: enemy.id,
        kind: enemy.kind,
        pos: enemy.pos,
        score,
    });

    let required = current_config(world, tuning).required_kills;
    if world.is_level_transitioning || world.level_kill_count < required {
        return false;
    }

    world.is_level_transitioning = true;
    world.events.push(GameEvent::LevelComplete {
        level: world.current_level,
    });
    log::info!(
        "Level {} complete ({} kills, score {})",
        world.current_level,
        world.level_kill_count,
        world.score
    );
    true
}

/// Leave the "level complete" overlay: credit the level reward and enter
/// the next level (or end in victory). A call without a pending transition
/// is ignored, so the reward is credited exactly once per level.
pub fn complete_transition(world: &mut World, tuning: &Tuning) -> Option<LevelOutcome> {
    if !world.is_level_transitioning || world.status != GameStatus::Playing {
        return None;
    }

    let finished = world.current_level;
    let reward = current_config(world, tuning).mathbucks_reward;
    world.mathbucks = world.mathbucks.saturating_add(reward);
    world.is_level_transitioning = false;

    let last_authored = tuning.authored_levels();
    if tuning.final_level == FinalLevel::Victory && finished >= last_authored {
        world.status = GameStatus::Victory;
        world.events.push(GameEvent::Victory { score: world.score });
        log::info!("Victory after level {} with score {}", finished, world.score);
        return Some(LevelOutcome::Victory);
    }

    world.current_level = finished.saturating_add(1).min(MAX_LEVEL);
    world.level_kill_count = 0;
    world.events.push(GameEvent::LevelStarted {
        level: world.current_level,
    });
    if let LevelId::Endless(n) = tuning.level_id(world.current_level) {
        let config = current_config(world, tuning);
        log::info!(
            "Endless level {}: {} kills, spawn every {}ms",
            n,
            config.required_kills,
            config.spawn_interval_ms
        );
    } else {
        log::info!("Starting level {}", world.current_level);
    }
    Some(LevelOutcome::Advanced(world.current_level))
}
