//! Camera / viewport transform
//!
//! The arena is one viewport wide and scrolls vertically. The camera is an
//! explicit value passed to whatever needs screen-relative math (aiming,
//! spawn placement), never captured state.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Editor line height used for the line-number gutter
pub const LINE_HEIGHT: f32 = 12.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    /// World-space coordinate of the viewport's top-left corner
    pub origin: Vec2,
}

impl Camera {
    /// Camera centered on `target`, clamped so the viewport stays inside the world
    pub fn following(target: Vec2) -> Self {
        let max_y = (WORLD_HEIGHT - VIEWPORT_HEIGHT).max(0.0);
        let max_x = (ARENA_WIDTH - VIEWPORT_WIDTH).max(0.0);
        Self {
            origin: Vec2::new(
                (target.x - VIEWPORT_WIDTH / 2.0).clamp(0.0, max_x),
                (target.y - VIEWPORT_HEIGHT / 2.0).clamp(0.0, max_y),
            ),
        }
    }

    pub fn follow(&mut self, target: Vec2) {
        *self = Self::following(target);
    }

    /// Translation applied to the world when drawing (negated origin)
    #[inline]
    pub fn transform(&self) -> Vec2 {
        -self.origin
    }

    /// Convert a screen coordinate to world space given the game board's
    /// top-left corner on screen
    pub fn screen_to_world(&self, screen: Vec2, board_origin: Vec2) -> Vec2 {
        screen - board_origin - self.transform()
    }

    pub fn world_to_screen(&self, world: Vec2, board_origin: Vec2) -> Vec2 {
        world + self.transform() + board_origin
    }

    /// Range of editor line numbers currently visible (1-based, inclusive start)
    pub fn visible_lines(&self) -> (u32, u32) {
        let start = (self.origin.y / LINE_HEIGHT).floor() as u32;
        let total = (WORLD_HEIGHT / LINE_HEIGHT) as u32;
        let end = (start + (VIEWPORT_HEIGHT / LINE_HEIGHT).ceil() as u32).min(total);
        (start + 1, end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camera_clamps_to_world() {
        assert_eq!(Camera::following(Vec2::new(600.0, 100.0)).origin, Vec2::ZERO);

        let cam = Camera::following(Vec2::new(600.0, 3000.0));
        assert_eq!(cam.origin, Vec2::new(0.0, 2600.0));

        let cam = Camera::following(Vec2::new(600.0, WORLD_HEIGHT));
        assert_eq!(cam.origin.y, WORLD_HEIGHT - VIEWPORT_HEIGHT);
    }

    #[test]
    fn test_screen_world_round_trip() {
        let cam = Camera::following(Vec2::new(600.0, 3000.0));
        let board = Vec2::new(20.0, 60.0);
        let world = cam.screen_to_world(Vec2::new(120.0, 460.0), board);
        assert_eq!(world, Vec2::new(100.0, 3000.0));
        assert_eq!(cam.world_to_screen(world, board), Vec2::new(120.0, 460.0));
    }

    #[test]
    fn test_visible_lines() {
        let cam = Camera::default();
        assert_eq!(cam.visible_lines(), (1, 67));
    }
}
