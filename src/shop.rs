//! Store purchase logic
//!
//! Pure functions over the world's wallet and inventory. A rejected purchase
//! returns a [`ShopError`] and leaves the world untouched.

use crate::error::ShopError;
use crate::sim::state::{MAX_STAT_LEVEL, PowerUpKind, StatKind, World};
use crate::tuning::{GunId, Tuning};

/// Stat upgrade price per current level
pub const STAT_UPGRADE_COST_PER_LEVEL: u64 = 250;
/// Max health gained per Health upgrade
pub const HEALTH_PER_UPGRADE: i32 = 20;

pub fn power_up_cost(kind: PowerUpKind) -> u64 {
    match kind {
        PowerUpKind::Shield => 300,
        PowerUpKind::DoubleScore => 500,
        PowerUpKind::Nuke => 750,
    }
}

/// Price of the next upgrade, `None` once maxed
pub fn stat_upgrade_cost(world: &World, stat: StatKind) -> Option<u64> {
    let level = world.stats.get(stat);
    (level < MAX_STAT_LEVEL).then(|| STAT_UPGRADE_COST_PER_LEVEL * level as u64)
}

fn pay(world: &mut World, cost: u64) -> Result<(), ShopError> {
    if world.mathbucks < cost {
        return Err(ShopError::InsufficientFunds {
            cost,
            balance: world.mathbucks,
        });
    }
    world.mathbucks -= cost;
    Ok(())
}

pub fn buy_gun(world: &mut World, tuning: &Tuning, gun: GunId) -> Result<(), ShopError> {
    if world.unlocked_guns.contains(&gun) {
        return Err(ShopError::AlreadyOwned(gun.as_str().into()));
    }
    pay(world, tuning.gun(gun).cost)?;
    world.unlocked_guns.insert(gun);
    log::info!("Unlocked {}", tuning.gun(gun).name);
    Ok(())
}

pub fn equip_gun(world: &mut World, gun: GunId) -> Result<(), ShopError> {
    if !world.unlocked_guns.contains(&gun) {
        return Err(ShopError::Locked(gun.as_str().into()));
    }
    world.current_gun = gun;
    Ok(())
}

/// Raise a stat one level. Returns the new level.
pub fn upgrade_stat(world: &mut World, stat: StatKind) -> Result<u8, ShopError> {
    let cost = stat_upgrade_cost(world, stat).ok_or_else(|| ShopError::Maxed(stat.label().into()))?;
    pay(world, cost)?;

    let level = world.stats.get(stat) + 1;
    world.stats.set(stat, level);
    if stat == StatKind::Health {
        world.player.health = (world.player.health + HEALTH_PER_UPGRADE).min(world.max_health());
    }
    log::info!("{} upgraded to level {}", stat.label(), level);
    Ok(level)
}

/// Buy one power-up. Returns the new stock count.
pub fn buy_power_up(world: &mut World, kind: PowerUpKind) -> Result<u32, ShopError> {
    pay(world, power_up_cost(kind))?;
    let count = world.power_ups.count_mut(kind);
    *count = count.saturating_add(1);
    Ok(*count)
}
