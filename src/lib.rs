//! Debug Defender - a scrolling arcade shooter ("Big O Invasion")
//!
//! Core modules:
//! - `sim`: Simulation (movement, projectiles, collisions, levels, ability timers)
//! - `session`: Game loop orchestration and the game/level/pause state machine
//! - `platform`: Clock and scheduling boundary (browser host, headless host)
//! - `persistence`: Save snapshots and save stores
//! - `tuning`: Data-driven game balance
//! - `shop`: Store purchase logic

pub mod error;
pub mod highscores;
pub mod persistence;
pub mod platform;
pub mod session;
pub mod settings;
pub mod shop;
pub mod sim;
pub mod tuning;

pub use error::{PersistenceError, ShopError, TuningError};
pub use highscores::{HighScores, ScoreSink};
pub use session::Session;
pub use settings::Settings;
pub use tuning::{EnemyKind, GunId, Tuning};

/// Game configuration constants
pub mod consts {
    /// Reference frame time (60 Hz). Rates are expressed "per reference frame".
    pub const REFERENCE_FRAME_MS: f32 = 16.667;

    /// Arena dimensions. The arena is one viewport wide and scrolls vertically.
    pub const ARENA_WIDTH: f32 = 1200.0;
    pub const VIEWPORT_WIDTH: f32 = 1200.0;
    pub const VIEWPORT_HEIGHT: f32 = 800.0;
    /// 540 editor lines of 12px each
    pub const WORLD_HEIGHT: f32 = 540.0 * 12.0;

    /// Player sprite size (used for the movement margins, not for collisions)
    pub const PLAYER_SIZE: f32 = 32.0;
    /// Horizontal gutter reserved for the line-number column and scrollbar
    pub const ARENA_SIDE_GUTTER: f32 = 50.0;
    pub const PLAYER_START_X: f32 = 600.0;
    pub const PLAYER_START_Y: f32 = 400.0;
    pub const MAX_HEALTH: i32 = 100;
    /// Highest reachable level; endless quotas still fit in `u32` here
    pub const MAX_LEVEL: u32 = 100_000;

    /// Collision hitboxes (full width/height, centered on the entity position)
    pub const PLAYER_HITBOX: f32 = 8.0;
    pub const ENEMY_HITBOX: f32 = 30.0;
    pub const PROJECTILE_HITBOX: f32 = 30.0;

    /// Invulnerability after taking contact damage
    pub const DAMAGE_COOLDOWN_MS: f64 = 1000.0;
    /// Health restored to the player per defeated enemy
    pub const HEALTH_RESTORE_ON_KILL: i32 = 2;
    /// Duration of a Double Score power-up
    pub const DOUBLE_SCORE_DURATION_MS: f64 = 10_000.0;
}

/// Scale factor converting elapsed milliseconds into reference frames
#[inline]
pub fn frame_scale(delta_ms: f32) -> f32 {
    delta_ms / consts::REFERENCE_FRAME_MS
}
