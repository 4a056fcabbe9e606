//! Simulation module
//!
//! All gameplay logic lives here. Subsystems are plain functions over
//! `&mut World`:
//! - Delta-time scaled movement (frame-rate independent)
//! - Wall-clock ability deadlines, passed in as `now`
//! - Seeded RNG only
//! - No rendering or platform dependencies

pub mod abilities;
pub mod camera;
pub mod collision;
pub mod geom;
pub mod level;
pub mod movement;
pub mod powerups;
pub mod projectile;
pub mod state;
pub mod tick;

pub use abilities::{Charge, Dash, Invulnerability};
pub use camera::Camera;
pub use collision::{CollisionReport, check_collisions};
pub use level::{LevelOutcome, complete_transition, on_enemy_defeated, spawn_position, spawn_tick};
pub use movement::{InputState, Key, update_enemies, update_player};
pub use powerups::{Activation, activate};
pub use projectile::{fire, release_charge, update_projectiles};
pub use state::{
    Enemy, GameEvent, GameStatus, Player, PowerUpKind, PowerUps, Projectile, StatKind, StatLevels,
    World,
};
pub use tick::{TickReport, tick};
