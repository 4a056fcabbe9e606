//! Collision detection and combat resolution
//!
//! Hitboxes are centered axis-aligned squares with fixed sizes
//! (`PLAYER_HITBOX`, `ENEMY_HITBOX`, `PROJECTILE_HITBOX`), independent of
//! sprite size. Resolution order within one call:
//!
//! 1. projectile vs enemy overlap tests
//! 2. damage, enemy defeat, non-piercing projectiles marked spent
//! 3. at most one enemy-contact hit on the player (first in list order)
//! 4. game over if the player's health ran out
//! 5. spent projectiles removed

use super::geom::Aabb;
use super::level::on_enemy_defeated;
use super::state::{Enemy, GameEvent, GameStatus, PowerUpKind, World};
use crate::consts::*;
use crate::tuning::Tuning;

/// Summary of one collision pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollisionReport {
    /// Projectile-enemy damage applications
    pub hits: u32,
    pub kills: u32,
    /// A kill this pass met the level quota
    pub level_completed: bool,
    pub player_hit: bool,
    pub shield_used: bool,
    pub game_over: bool,
}

/// Projectile damage after the damage upgrade
fn scaled_damage(base: i32, multiplier: f32) -> i32 {
    (base as f32 * multiplier).round() as i32
}

/// Resolve this tick's overlaps. Run after all movement.
pub fn check_collisions(world: &mut World, tuning: &Tuning, now: f64) -> CollisionReport {
    let mut report = CollisionReport::default();
    let gun = tuning.gun(world.current_gun);
    let multiplier = world.stats.damage_multiplier();

    // Steps 1-2
    let mut spent = vec![false; world.projectiles.len()];
    for (i, projectile) in world.projectiles.iter().enumerate() {
        let hitbox = Aabb::square(projectile.pos, PROJECTILE_HITBOX);
        let damage = scaled_damage(gun.shot(projectile.is_charged).damage, multiplier);
        for enemy in world.enemies.iter_mut() {
            if enemy.health <= 0 || !hitbox.overlaps(&Aabb::square(enemy.pos, ENEMY_HITBOX)) {
                continue;
            }
            enemy.health -= damage;
            report.hits += 1;
            if !projectile.piercing {
                spent[i] = true;
                break;
            }
        }
    }

    let (defeated, alive): (Vec<Enemy>, Vec<Enemy>) =
        std::mem::take(&mut world.enemies).into_iter().partition(|e| e.health <= 0);
    world.enemies = alive;
    for enemy in &defeated {
        report.kills += 1;
        if on_enemy_defeated(world, tuning, enemy, now) {
            report.level_completed = true;
        }
    }

    // Step 3
    if !world.player.is_invulnerable() {
        let player_box = Aabb::square(world.player.pos, PLAYER_HITBOX);
        let contact = world
            .enemies
            .iter()
            .find(|e| player_box.overlaps(&Aabb::square(e.pos, ENEMY_HITBOX)))
            .map(|e| e.damage);

        if let Some(damage) = contact {
            report.player_hit = true;
            if world.power_ups.take(PowerUpKind::Shield) {
                report.shield_used = true;
                world.events.push(GameEvent::ShieldAbsorbed {
                    remaining: world.power_ups.shield,
                });
            } else {
                world.player.health = (world.player.health - damage).max(0);
                world.events.push(GameEvent::PlayerHit {
                    damage,
                    health: world.player.health,
                });
            }
            world.player.invulnerability.grant(now, DAMAGE_COOLDOWN_MS);
        }
    }

    // Step 4
    if world.player.health <= 0 && world.status == GameStatus::Playing {
        world.status = GameStatus::GameOver;
        world.player.charge.cancel();
        world.events.push(GameEvent::GameOver {
            score: world.score,
            level: world.current_level,
        });
        log::info!(
            "Game over on level {} with score {}",
            world.current_level,
            world.score
        );
        report.game_over = true;
    }

    // Step 5
    let mut spent = spent.into_iter();
    world.projectiles.retain(|_| !spent.next().unwrap_or(false));

    report
}
