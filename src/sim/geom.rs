//! Vector and hitbox helpers
//!
//! Everything here guards against zero-length vectors so NaN never reaches
//! entity positions.

use glam::Vec2;

/// Squared lengths below this are treated as zero
const EPSILON_SQ: f32 = 1e-12;

/// Distance between two points
#[inline]
pub fn distance(a: Vec2, b: Vec2) -> f32 {
    a.distance(b)
}

/// Unit vector from `from` toward `to`, or zero if the points coincide
#[inline]
pub fn direction_to(from: Vec2, to: Vec2) -> Vec2 {
    normalize_or_zero(to - from)
}

/// Normalize, returning zero for zero-length or non-finite input
#[inline]
pub fn normalize_or_zero(v: Vec2) -> Vec2 {
    let len_sq = v.length_squared();
    if len_sq <= EPSILON_SQ || !len_sq.is_finite() {
        Vec2::ZERO
    } else {
        v / len_sq.sqrt()
    }
}

/// Step from `current` toward `target` by at most `max_step`, never overshooting
pub fn move_toward(current: Vec2, target: Vec2, max_step: f32) -> Vec2 {
    let to_target = target - current;
    let dist = to_target.length();
    if dist <= max_step.max(0.0) || !dist.is_finite() {
        return if dist.is_finite() { target } else { current };
    }
    current + to_target / dist * max_step
}

/// Rotate a vector by `radians`
#[inline]
pub fn rotate(v: Vec2, radians: f32) -> Vec2 {
    Vec2::from_angle(radians).rotate(v)
}

/// Axis-aligned box described by its center and full size
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub center: Vec2,
    pub size: Vec2,
}

impl Aabb {
    pub fn new(center: Vec2, size: Vec2) -> Self {
        Self { center, size }
    }

    /// Square box of side `side`
    pub fn square(center: Vec2, side: f32) -> Self {
        Self::new(center, Vec2::splat(side))
    }

    #[inline]
    pub fn min(&self) -> Vec2 {
        self.center - self.size * 0.5
    }

    #[inline]
    pub fn max(&self) -> Vec2 {
        self.center + self.size * 0.5
    }

    /// Overlap test. Touching edges count as overlapping.
    pub fn overlaps(&self, other: &Aabb) -> bool {
        let (a_min, a_max) = (self.min(), self.max());
        let (b_min, b_max) = (other.min(), other.max());
        a_min.x <= b_max.x && a_max.x >= b_min.x && a_min.y <= b_max.y && a_max.y >= b_min.y
    }
}
