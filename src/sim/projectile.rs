//! Projectile spawn, advance and culling

use glam::Vec2;

use super::geom::{normalize_or_zero, rotate};
use super::state::{GameEvent, Projectile, World};
use crate::consts::*;
use crate::frame_scale;
use crate::tuning::Tuning;

/// Fire direction used when the aim point coincides with the player
pub const FALLBACK_AIM: Vec2 = Vec2::X;

/// Charge hold time required for a charged shot with the current gun and
/// fire-rate upgrade. `None` if the gun has no charged bracket.
pub fn required_charge_ms(world: &World, tuning: &Tuning) -> Option<f64> {
    tuning
        .gun(world.current_gun)
        .charged
        .as_ref()
        .map(|c| c.charge_time_ms * world.stats.charge_time_multiplier())
}

/// Finish a charge at `now` and fire toward `target` (world space).
///
/// A projectile is always emitted; the hold time only picks the stat bracket.
/// Returns whether the shot was charged, or `None` if no charge was in progress.
pub fn release_charge(world: &mut World, tuning: &Tuning, now: f64, target: Vec2) -> Option<bool> {
    let held = world.player.charge.release(now)?;
    let charged = required_charge_ms(world, tuning).is_some_and(|required| held >= required);
    fire(world, tuning, target, charged);
    Some(charged)
}

/// Spawn the current gun's shot toward `target`. Burst guns fan their
/// pellets symmetrically around the aim line. Returns the number spawned.
pub fn fire(world: &mut World, tuning: &Tuning, target: Vec2, charged: bool) -> u32 {
    let gun = tuning.gun(world.current_gun);
    let charged = charged && gun.charged.is_some();
    let shot = gun.shot(charged);

    let origin = world.player.pos;
    let mut aim = normalize_or_zero(target - origin);
    if aim == Vec2::ZERO {
        aim = FALLBACK_AIM;
    }

    let pellets = shot.pellets.max(1);
    let (piercing, size, spread) = (shot.piercing, shot.size, shot.spread_radians);
    let middle = (pellets - 1) as f32 / 2.0;
    for i in 0..pellets {
        let offset = (i as f32 - middle) * spread;
        let direction = if offset == 0.0 { aim } else { rotate(aim, offset) };
        let id = world.next_entity_id();
        world.projectiles.push(Projectile {
            id,
            pos: origin,
            direction,
            is_charged: charged,
            piercing,
            size,
        });
    }

    world.events.push(GameEvent::ShotFired {
        gun: world.current_gun,
        charged,
        pellets,
    });
    pellets
}

/// Whether a point is inside the arena's logical bounds
#[inline]
pub fn in_bounds(pos: Vec2) -> bool {
    (0.0..=ARENA_WIDTH).contains(&pos.x) && (0.0..=WORLD_HEIGHT).contains(&pos.y)
}

/// Advance every projectile and drop the ones that left the arena.
///
/// Speed comes from the equipped gun's bracket matching each projectile's
/// own charge state.
pub fn update_projectiles(world: &mut World, tuning: &Tuning, delta_ms: f32) {
    let gun = tuning.gun(world.current_gun);
    let scale = frame_scale(delta_ms.max(0.0));
    for p in &mut world.projectiles {
        p.pos += p.direction * gun.shot(p.is_charged).speed * scale;
    }
    world.projectiles.retain(|p| in_bounds(p.pos));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::GameStatus;
    use crate::tuning::GunId;

    fn playing_world() -> World {
        let mut world = World::new(3);
        world.status = GameStatus::Playing;
        world
    }

    #[test]
    fn test_charged_release_fires_piercing_shot() {
        let tuning = Tuning::default();
        let mut world = playing_world();
        world.player.charge.start(0.0);
        let target = world.player.pos + Vec2::new(200.0, 0.0);

        assert_eq!(release_charge(&mut world, &tuning, 1200.0, target), Some(true));
        assert_eq!(world.projectiles.len(), 1);
        let p = &world.projectiles[0];
        assert!(p.is_charged);
        assert!(p.piercing);
        assert!((p.direction - Vec2::X).length() < 1e-6);
    }

    #[test]
    fn test_short_hold_fires_normal_shot() {
        let tuning = Tuning::default();
        let mut world = playing_world();
        world.player.charge.start(500.0);
        let target = world.player.pos + Vec2::new(0.0, -50.0);

        assert_eq!(release_charge(&mut world, &tuning, 510.0, target), Some(false));
        let p = &world.projectiles[0];
        assert!(!p.is_charged);
        assert!(!p.piercing);
        assert!((p.direction - Vec2::NEG_Y).length() < 1e-6);
    }

    #[test]
    fn test_release_without_charge_fires_nothing() {
        let tuning = Tuning::default();
        let mut world = playing_world();
        assert_eq!(release_charge(&mut world, &tuning, 100.0, Vec2::ZERO), None);
        assert!(world.projectiles.is_empty());
    }

    #[test]
    fn test_fire_rate_upgrade_shortens_charge() {
        let tuning = Tuning::default();
        let mut world = playing_world();
        world.stats.fire_rate = 3;
        assert_eq!(required_charge_ms(&world, &tuning), Some(800.0));

        world.player.charge.start(0.0);
        let target = world.player.pos + Vec2::X;
        assert_eq!(release_charge(&mut world, &tuning, 850.0, target), Some(true));
    }

    #[test]
    fn test_aim_on_player_uses_fallback_direction() {
        let tuning = Tuning::default();
        let mut world = playing_world();
        let target = world.player.pos;
        fire(&mut world, &tuning, target, false);
        assert_eq!(world.projectiles[0].direction, FALLBACK_AIM);
        assert!(world.projectiles[0].pos.is_finite());
    }

    #[test]
    fn test_spread_fires_symmetric_fan() {
        let tuning = Tuning::default();
        let mut world = playing_world();
        world.current_gun = GunId::Spread;
        let target = world.player.pos + Vec2::new(100.0, 0.0);

        assert_eq!(fire(&mut world, &tuning, target, false), 3);
        let dirs: Vec<Vec2> = world.projectiles.iter().map(|p| p.direction).collect();
        assert!((dirs[1] - Vec2::X).length() < 1e-6);
        assert!((dirs[0].y + dirs[2].y).abs() < 1e-6);
        for d in &dirs {
            assert!((d.length() - 1.0).abs() < 1e-5);
        }

        world.projectiles.clear();
        assert_eq!(fire(&mut world, &tuning, target, true), 5);
        assert!(world.projectiles.iter().all(|p| p.is_charged && p.piercing));
    }

    #[test]
    fn test_projectile_advances_and_culls() {
        let tuning = Tuning::default();
        let mut world = playing_world();
        world.player.pos = Vec2::new(1190.0, 400.0);
        fire(&mut world, &tuning, Vec2::new(1300.0, 400.0), false);

        update_projectiles(&mut world, &tuning, REFERENCE_FRAME_MS / 2.0);
        assert_eq!(world.projectiles.len(), 1);
        assert!((world.projectiles[0].pos.x - 1196.0).abs() < 1e-3);

        update_projectiles(&mut world, &tuning, REFERENCE_FRAME_MS);
        assert!(world.projectiles.is_empty());
    }

    #[test]
    fn test_speed_follows_equipped_gun_bracket() {
        let tuning = Tuning::default();
        let mut world = playing_world();
        let target = world.player.pos + Vec2::X;
        fire(&mut world, &tuning, target, true);
        world.current_gun = GunId::Sniper;
        let before = world.projectiles[0].pos.x;
        update_projectiles(&mut world, &tuning, REFERENCE_FRAME_MS);
        // Sniper charged speed
        assert!((world.projectiles[0].pos.x - before - 25.0).abs() < 1e-3);
    }
}
