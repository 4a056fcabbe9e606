//! Per-frame simulation tick
//!
//! One tick runs the subsystems in a fixed order:
//! player movement, projectile advance, enemy advance, collisions.
//! Collisions always run last so damage sees this tick's final positions.

use super::collision::{CollisionReport, check_collisions};
use super::movement::{InputState, update_enemies, update_player};
use super::projectile::update_projectiles;
use super::state::World;
use crate::tuning::Tuning;

/// Outcome of one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// False when the tick was gated off (not playing, paused, store, level transition)
    pub advanced: bool,
    pub collisions: CollisionReport,
}

/// Advance the world by `delta_ms` of game time. `now` is the wall clock
/// used for ability deadlines.
pub fn tick(world: &mut World, input: &InputState, tuning: &Tuning, now: f64, delta_ms: f32) -> TickReport {
    world.refresh_timers(now);
    world.trim_events();

    if !world.is_running() || world.is_level_transitioning {
        return TickReport::default();
    }

    let delta_ms = if delta_ms.is_finite() { delta_ms.max(0.0) } else { 0.0 };
    let dash_active = world.player.is_dashing();

    update_player(world, input, dash_active, delta_ms, &tuning.player);
    update_projectiles(world, tuning, delta_ms);
    update_enemies(world, delta_ms);
    let collisions = check_collisions(world, tuning, now);

    TickReport {
        advanced: true,
        collisions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;
    use crate::sim::level::spawn_tick;
    use crate::sim::state::{GameEvent, GameStatus};
    use crate::tuning::EnemyKind;
    use glam::Vec2;

    fn playing_world(seed: u64) -> World {
        let mut world = World::new(seed);
        world.status = GameStatus::Playing;
        world
    }

    #[test]
    fn test_enemy_contact_damages_once() {
        let tuning = Tuning::default();
        let mut world = playing_world(1);
        world.spawn_enemy(EnemyKind::Basic, Vec2::new(600.0, 300.0), 30, 1.0, 5);

        let input = InputState::default();
        let mut now = 0.0;
        for _ in 0..100 {
            now += REFERENCE_FRAME_MS as f64;
            tick(&mut world, &input, &tuning, now, REFERENCE_FRAME_MS);
        }

        let enemy = &world.enemies[0];
        assert!(enemy.pos.distance(world.player.pos) < 19.0);
        assert_eq!(world.player.health, 95);
        let hits = world
            .events
            .iter()
            .filter(|e| matches!(e, GameEvent::PlayerHit { .. }))
            .count();
        assert_eq!(hits, 1);
    }

    #[test]
    fn test_no_tick_outside_play() {
        let tuning = Tuning::default();
        let input = InputState { right: true, ..Default::default() };

        let mut world = World::new(1);
        assert!(!tick(&mut world, &input, &tuning, 16.0, 16.0).advanced);

        let mut world = playing_world(1);
        world.is_level_transitioning = true;
        world.spawn_enemy(EnemyKind::Fast, Vec2::new(100.0, 100.0), 20, 3.0, 5);
        assert!(!tick(&mut world, &input, &tuning, 16.0, 16.0).advanced);
        assert_eq!(world.enemies[0].pos, Vec2::new(100.0, 100.0));
        assert_eq!(world.player.pos, Vec2::new(PLAYER_START_X, PLAYER_START_Y));
    }

    #[test]
    fn test_paused_tick_still_expires_timers() {
        let tuning = Tuning::default();
        let mut world = playing_world(1);
        world.player.dash.trigger(0.0, 150.0, 450.0);
        world.is_paused = true;
        tick(&mut world, &InputState::default(), &tuning, 5000.0, 16.0);
        assert!(!world.player.is_dashing());
        assert!(world.player.can_dash());
    }

    #[test]
    fn test_negative_or_nan_delta_is_ignored() {
        let tuning = Tuning::default();
        let input = InputState { down: true, ..Default::default() };
        let mut world = playing_world(1);
        tick(&mut world, &input, &tuning, 0.0, -50.0);
        tick(&mut world, &input, &tuning, 0.0, f32::NAN);
        assert_eq!(world.player.pos, Vec2::new(PLAYER_START_X, PLAYER_START_Y));
    }

    #[test]
    fn test_determinism() {
        let tuning = Tuning::default();
        let run = || {
            let mut world = playing_world(99999);
            let input = InputState { left: true, up: true, ..Default::default() };
            let mut now = 0.0;
            for frame in 0..600 {
                now += 16.0;
                if frame % 30 == 0 {
                    spawn_tick(&mut world, &tuning);
                }
                tick(&mut world, &input, &tuning, now, 16.0);
            }
            world
        };

        let (a, b) = (run(), run());
        assert_eq!(a.player, b.player);
        assert_eq!(a.enemies, b.enemies);
        assert_eq!(a.score, b.score);
    }
}
