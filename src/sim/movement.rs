//! Player and enemy movement
//!
//! Speeds are in pixels per reference frame (60 Hz) and scaled by
//! `delta_ms / REFERENCE_FRAME_MS`, so displacement over a wall-clock
//! interval does not depend on the frame rate.

use glam::Vec2;

use super::geom::move_toward;
use super::state::{GameStatus, World};
use crate::consts::*;
use crate::frame_scale;
use crate::tuning::PlayerTuning;

/// Movement keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
}

impl Key {
    /// Map a DOM `KeyboardEvent.key` value
    pub fn from_dom_key(key: &str) -> Option<Self> {
        match key {
            "w" | "W" | "ArrowUp" => Some(Key::Up),
            "s" | "S" | "ArrowDown" => Some(Key::Down),
            "a" | "A" | "ArrowLeft" => Some(Key::Left),
            "d" | "D" | "ArrowRight" => Some(Key::Right),
            _ => None,
        }
    }
}

/// Current key-down state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputState {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl InputState {
    pub fn set(&mut self, key: Key, pressed: bool) {
        match key {
            Key::Up => self.up = pressed,
            Key::Down => self.down = pressed,
            Key::Left => self.left = pressed,
            Key::Right => self.right = pressed,
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Raw -1/0/+1 per axis (y grows downward)
    pub fn axis(&self) -> Vec2 {
        let x = (self.right as i8 - self.left as i8) as f32;
        let y = (self.down as i8 - self.up as i8) as f32;
        Vec2::new(x, y)
    }

    /// Axis vector with diagonals scaled to unit length
    pub fn direction(&self) -> Vec2 {
        let axis = self.axis();
        if axis.x != 0.0 && axis.y != 0.0 {
            axis * std::f32::consts::FRAC_1_SQRT_2
        } else {
            axis
        }
    }
}

/// Bounds the player's center is clamped to
pub fn player_bounds() -> (Vec2, Vec2) {
    let min = Vec2::new(ARENA_SIDE_GUTTER + PLAYER_SIZE / 2.0, PLAYER_SIZE / 2.0);
    let max = Vec2::new(
        ARENA_WIDTH - ARENA_SIDE_GUTTER - PLAYER_SIZE * 1.5,
        WORLD_HEIGHT - PLAYER_SIZE / 2.0,
    );
    (min, max)
}

/// Move the player from held keys. No-op outside active play.
pub fn update_player(
    world: &mut World,
    input: &InputState,
    dash_active: bool,
    delta_ms: f32,
    tuning: &PlayerTuning,
) {
    if world.status != GameStatus::Playing || world.is_paused || world.in_store {
        return;
    }

    let direction = input.direction();
    world.player.is_moving = direction != Vec2::ZERO;
    if !world.player.is_moving {
        return;
    }

    let dash = if dash_active { tuning.dash_multiplier } else { 1.0 };
    let speed = tuning.base_speed * world.stats.speed_multiplier() * dash;
    let step = direction * speed * frame_scale(delta_ms.max(0.0));

    let (min, max) = player_bounds();
    world.player.pos = (world.player.pos + step).clamp(min, max);
    world.camera.follow(world.player.pos);
}

/// Home every enemy toward the player
pub fn update_enemies(world: &mut World, delta_ms: f32) {
    let target = world.player.pos;
    let scale = frame_scale(delta_ms.max(0.0));
    for enemy in &mut world.enemies {
        enemy.pos = move_toward(enemy.pos, target, enemy.speed * scale);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuning::EnemyKind;
    use proptest::prelude::*;

    fn playing_world() -> World {
        let mut world = World::new(42);
        world.status = GameStatus::Playing;
        world
    }

    fn held(up: bool, down: bool, left: bool, right: bool) -> InputState {
        InputState { up, down, left, right }
    }

    #[test]
    fn test_dom_key_mapping() {
        assert_eq!(Key::from_dom_key("w"), Some(Key::Up));
        assert_eq!(Key::from_dom_key("ArrowLeft"), Some(Key::Left));
        assert_eq!(Key::from_dom_key("D"), Some(Key::Right));
        assert_eq!(Key::from_dom_key("p"), None);
    }

    #[test]
    fn test_one_reference_frame_moves_base_speed() {
        let mut world = playing_world();
        let start = world.player.pos;
        update_player(&mut world, &held(false, false, false, true), false, REFERENCE_FRAME_MS, &PlayerTuning::default());
        assert!((world.player.pos.x - start.x - 8.0).abs() < 1e-4);
        assert_eq!(world.player.pos.y, start.y);
        assert!(world.player.is_moving);
    }

    #[test]
    fn test_dash_multiplies_speed() {
        let mut world = playing_world();
        let start = world.player.pos;
        update_player(&mut world, &held(true, false, false, false), true, REFERENCE_FRAME_MS, &PlayerTuning::default());
        assert!((start.y - world.player.pos.y - 20.0).abs() < 1e-4);
    }

    #[test]
    fn test_no_movement_outside_play() {
        let input = held(false, false, true, false);
        let tuning = PlayerTuning::default();

        let mut world = World::new(1);
        update_player(&mut world, &input, false, 16.0, &tuning);
        assert_eq!(world.player.pos, Vec2::new(PLAYER_START_X, PLAYER_START_Y));

        let mut world = playing_world();
        world.in_store = true;
        update_player(&mut world, &input, false, 16.0, &tuning);
        assert_eq!(world.player.pos, Vec2::new(PLAYER_START_X, PLAYER_START_Y));

        world.in_store = false;
        world.is_paused = true;
        update_player(&mut world, &input, false, 16.0, &tuning);
        assert_eq!(world.player.pos, Vec2::new(PLAYER_START_X, PLAYER_START_Y));
    }

    #[test]
    fn test_idle_clears_is_moving() {
        let mut world = playing_world();
        world.player.is_moving = true;
        update_player(&mut world, &InputState::default(), false, 16.0, &PlayerTuning::default());
        assert!(!world.player.is_moving);
    }

    #[test]
    fn test_opposite_keys_cancel() {
        let mut world = playing_world();
        let start = world.player.pos;
        update_player(&mut world, &held(true, true, true, true), false, 16.0, &PlayerTuning::default());
        assert_eq!(world.player.pos, start);
        assert!(!world.player.is_moving);
    }

    #[test]
    fn test_enemy_homes_toward_player() {
        let mut world = playing_world();
        world.spawn_enemy(EnemyKind::Basic, Vec2::new(600.0, 300.0), 30, 1.0, 5);
        update_enemies(&mut world, REFERENCE_FRAME_MS);
        let pos = world.enemies[0].pos;
        assert!((pos.y - 301.0).abs() < 1e-4);
        assert_eq!(pos.x, 600.0);
    }

    #[test]
    fn test_enemy_on_player_holds_position() {
        let mut world = playing_world();
        let p = world.player.pos;
        world.spawn_enemy(EnemyKind::Fast, p, 20, 3.0, 5);
        update_enemies(&mut world, REFERENCE_FRAME_MS);
        assert_eq!(world.enemies[0].pos, p);
        assert!(world.enemies[0].pos.is_finite());
    }

    proptest! {
        #[test]
        fn frame_rate_independent(right in any::<bool>(), down in any::<bool>(), dt in 1.0f32..40.0) {
            let input = held(false, down, false, right);
            let tuning = PlayerTuning::default();

            let mut one = playing_world();
            update_player(&mut one, &input, false, dt * 2.0, &tuning);

            let mut two = playing_world();
            update_player(&mut two, &input, false, dt, &tuning);
            update_player(&mut two, &input, false, dt, &tuning);

            prop_assert!(one.player.pos.distance(two.player.pos) < 1e-3);
        }

        #[test]
        fn diagonal_matches_axis_speed(dt in 1.0f32..40.0) {
            let tuning = PlayerTuning::default();
            let start = Vec2::new(PLAYER_START_X, PLAYER_START_Y);

            let mut axis = playing_world();
            update_player(&mut axis, &held(true, false, false, false), false, dt, &tuning);
            let mut diag = playing_world();
            update_player(&mut diag, &held(true, false, false, true), false, dt, &tuning);

            let a = axis.player.pos.distance(start);
            let d = diag.player.pos.distance(start);
            prop_assert!((a - d).abs() < 1e-3);
        }

        #[test]
        fn clamp_is_idempotent(ticks in 1usize..400, left in any::<bool>(), up in any::<bool>(), dt in 1.0f32..100.0) {
            let input = held(up, !up, left, !left);
            let tuning = PlayerTuning::default();
            let (min, max) = player_bounds();
            let mut world = playing_world();
            for _ in 0..ticks {
                update_player(&mut world, &input, true, dt, &tuning);
                let p = world.player.pos;
                prop_assert!(p.x >= min.x && p.x <= max.x);
                prop_assert!(p.y >= min.y && p.y <= max.y);
                prop_assert!(p.x >= 0.0 && p.x <= ARENA_WIDTH);
                prop_assert!(p.y >= 0.0 && p.y <= WORLD_HEIGHT);
            }
        }
    }
}
