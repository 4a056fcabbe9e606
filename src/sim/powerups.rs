//! Activated power-ups
//!
//! Shields are passive (consumed by collision). Double Score and Nuke are
//! used explicitly and only during active play.

use super::level::on_enemy_defeated;
use super::state::{PowerUpKind, World};
use crate::consts::DOUBLE_SCORE_DURATION_MS;
use crate::tuning::Tuning;

/// What an activation did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// Nothing in stock, not activatable, or not in active play
    Unavailable,
    DoubleScore { until_ms: u64 },
    Nuke { kills: u32, level_completed: bool },
}

pub fn activate(world: &mut World, tuning: &Tuning, kind: PowerUpKind, now: f64) -> Activation {
    if !world.is_running() || world.is_level_transitioning {
        return Activation::Unavailable;
    }
    match kind {
        PowerUpKind::Shield => Activation::Unavailable,
        PowerUpKind::DoubleScore => {
            if !world.power_ups.take(kind) {
                return Activation::Unavailable;
            }
            // Stacks onto a running Double Score
            let start = world.double_score_until.filter(|until| *until > now).unwrap_or(now);
            let until = start + DOUBLE_SCORE_DURATION_MS;
            world.double_score_until = Some(until);
            log::info!("Double score until {:.0}ms", until);
            Activation::DoubleScore { until_ms: until as u64 }
        }
        PowerUpKind::Nuke => {
            if !world.power_ups.take(kind) {
                return Activation::Unavailable;
            }
            let (kills, level_completed) = detonate_nuke(world, tuning, now);
            log::info!("Nuke cleared {} enemies", kills);
            Activation::Nuke { kills, level_completed }
        }
    }
}

/// Defeat every live enemy through the normal defeat hook
fn detonate_nuke(world: &mut World, tuning: &Tuning, now: f64) -> (u32, bool) {
    let enemies = std::mem::take(&mut world.enemies);
    let mut completed = false;
    for enemy in &enemies {
        completed |= on_enemy_defeated(world, tuning, enemy, now);
    }
    (enemies.len() as u32, completed)
}
