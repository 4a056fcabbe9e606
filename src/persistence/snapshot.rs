//! Save snapshot model
//!
//! Field names follow the external save API (camelCase). Restoring clamps
//! every value into range and drops what it cannot interpret, so a
//! hand-edited or stale save still produces a playable world.

use std::collections::{BTreeMap, BTreeSet};

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::MAX_LEVEL;
use crate::sim::movement::player_bounds;
use crate::sim::state::{PowerUpKind, StatKind, World};
use crate::sim::Camera;
use crate::tuning::{EnemyKind, GunId, Tuning};

/// Plain `{x, y}` point as stored in saves
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl From<Vec2> for Point {
    fn from(v: Vec2) -> Self {
        Self { x: v.x, y: v.y }
    }
}

impl From<Point> for Vec2 {
    fn from(p: Point) -> Self {
        Vec2::new(p.x, p.y)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnemySnapshot {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub position: Point,
    pub health: i32,
    #[serde(default)]
    pub speed: Option<f32>,
    #[serde(default)]
    pub damage: Option<i32>,
}

/// Everything needed to resume a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveSnapshot {
    pub current_level: u32,
    pub level_kill_count: u32,
    pub score: u64,
    pub player_health: i32,
    pub mathbucks: u64,
    pub unlocked_guns: Vec<String>,
    #[serde(default)]
    pub current_gun: Option<String>,
    /// Stat label -> level
    #[serde(default)]
    pub stats: BTreeMap<String, u8>,
    /// Power-up label -> count
    #[serde(default)]
    pub power_ups: BTreeMap<String, u32>,
    pub player_position: Point,
    #[serde(default)]
    pub enemies: Vec<EnemySnapshot>,
}

impl SaveSnapshot {
    pub fn capture(world: &World) -> Self {
        Self {
            current_level: world.current_level,
            level_kill_count: world.level_kill_count,
            score: world.score,
            player_health: world.player.health,
            mathbucks: world.mathbucks,
            unlocked_guns: world.unlocked_guns.iter().map(|g| g.as_str().to_string()).collect(),
            current_gun: Some(world.current_gun.as_str().to_string()),
            stats: StatKind::ALL
                .iter()
                .map(|s| (s.label().to_string(), world.stats.get(*s)))
                .collect(),
            power_ups: PowerUpKind::ALL
                .iter()
                .map(|p| (p.label().to_string(), world.power_ups.count(*p)))
                .collect(),
            player_position: world.player.pos.into(),
            enemies: world
                .enemies
                .iter()
                .map(|e| EnemySnapshot {
                    id: e.id.to_string(),
                    kind: e.kind.as_str().to_string(),
                    position: e.pos.into(),
                    health: e.health,
                    speed: Some(e.speed),
                    damage: Some(e.damage),
                })
                .collect(),
        }
    }

    /// Rebuild a world from this snapshot. The result is in the menu state;
    /// the session flips it to playing. No level-1 setup or spawning runs.
    pub fn restore(&self, tuning: &Tuning, seed: u64) -> World {
        let mut world = World::new(seed);

        world.current_level = self.current_level.clamp(1, MAX_LEVEL);
        world.score = self.score;
        world.mathbucks = self.mathbucks;

        for (label, level) in &self.stats {
            match StatKind::from_label(label) {
                Some(stat) => world.stats.set(stat, *level),
                None => log::warn!("Dropping unknown stat {:?} from save", label),
            }
        }
        for (label, count) in &self.power_ups {
            match PowerUpKind::from_label(label) {
                Some(kind) => *world.power_ups.count_mut(kind) = *count,
                None => log::warn!("Dropping unknown power-up {:?} from save", label),
            }
        }

        let mut guns = BTreeSet::from([GunId::Basic]);
        for name in &self.unlocked_guns {
            match GunId::parse(name) {
                Some(gun) => {
                    guns.insert(gun);
                }
                None => log::warn!("Dropping unknown gun {:?} from save", name),
            }
        }
        world.unlocked_guns = guns;
        world.current_gun = self
            .current_gun
            .as_deref()
            .and_then(GunId::parse)
            .filter(|g| world.unlocked_guns.contains(g))
            .unwrap_or(GunId::Basic);

        world.player.health = self.player_health.clamp(1, world.max_health());
        let pos: Vec2 = self.player_position.into();
        let (min, max) = player_bounds();
        if pos.is_finite() {
            world.player.pos = pos.clamp(min, max);
        }
        world.camera = Camera::following(world.player.pos);

        for e in &self.enemies {
            let pos: Vec2 = e.position.into();
            if !pos.is_finite() {
                continue;
            }
            let kind = EnemyKind::parse_or_default(&e.kind);
            let base = tuning.enemy(kind);
            let speed = e.speed.filter(|s| s.is_finite()).unwrap_or(base.speed);
            let damage = e.damage.unwrap_or(base.damage);
            // Ids are reassigned so they stay unique within this world
            world.spawn_enemy(kind, pos, e.health, speed, damage);
        }

        // A save taken during the "level complete" overlay resumes into it
        let required = tuning.level(world.current_level).required_kills;
        world.level_kill_count = self.level_kill_count.min(required);
        world.is_level_transitioning = world.level_kill_count >= required;

        world
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::GameStatus;

    fn sample_world() -> World {
        let mut world = World::new(4);
        world.status = GameStatus::Playing;
        world.current_level = 3;
        world.level_kill_count = 12;
        world.score = 4200;
        world.mathbucks = 1750;
        world.player.health = 64;
        world.player.pos = Vec2::new(300.0, 2200.0);
        world.unlocked_guns.insert(GunId::Sniper);
        world.current_gun = GunId::Sniper;
        world.stats.damage = 2;
        world.power_ups.nuke = 1;
        world.spawn_enemy(EnemyKind::Tank, Vec2::new(400.0, 2000.0), 70, 0.8, 15);
        world.spawn_enemy(EnemyKind::Fast, Vec2::new(500.0, 2100.0), 20, 3.0, 5);
        world
    }

    #[test]
    fn test_json_uses_api_field_names() {
        let json = serde_json::to_value(SaveSnapshot::capture(&sample_world())).unwrap();
        assert_eq!(json["currentLevel"], 3);
        assert_eq!(json["levelKillCount"], 12);
        assert_eq!(json["playerHealth"], 64);
        assert_eq!(json["playerPosition"]["x"], 300.0);
        assert_eq!(json["unlockedGuns"][1], "sniper");
        assert_eq!(json["stats"]["Damage"], 2);
        assert_eq!(json["powerUps"]["Nuke"], 1);
        assert_eq!(json["enemies"][0]["type"], "tank");
    }

    #[test]
    fn test_restore_resumes_without_level_reset() {
        let tuning = Tuning::default();
        let world = sample_world();
        let restored = SaveSnapshot::capture(&world).restore(&tuning, 9);

        assert_eq!(restored.current_level, 3);
        assert_eq!(restored.level_kill_count, 12);
        assert_eq!(restored.score, 4200);
        assert_eq!(restored.mathbucks, 1750);
        assert_eq!(restored.player.health, 64);
        assert_eq!(restored.player.pos, Vec2::new(300.0, 2200.0));
        assert_eq!(restored.current_gun, GunId::Sniper);
        assert_eq!(restored.stats.damage, 2);
        assert_eq!(restored.power_ups.nuke, 1);
        assert_eq!(restored.enemies.len(), 2);
        assert_eq!(restored.enemies[0].kind, EnemyKind::Tank);
        assert_eq!(restored.enemies[0].health, 70);
        assert!(!restored.is_level_transitioning);
        assert_eq!(restored.camera, Camera::following(restored.player.pos));
    }

    #[test]
    fn test_restore_sanitizes_bad_values() {
        let tuning = Tuning::default();
        let json = r#"{
            "currentLevel": 0,
            "levelKillCount": 99,
            "score": 10,
            "playerHealth": 500,
            "mathbucks": 0,
            "unlockedGuns": ["railgun", "spread"],
            "currentGun": "railgun",
            "stats": {"Luck": 4, "Speed": 12},
            "playerPosition": {"x": -400, "y": 99999},
            "enemies": [{"id": "e-1", "type": "dragon", "position": {"x": 10, "y": 10}, "health": 0}]
        }"#;
        let snapshot: SaveSnapshot = serde_json::from_str(json).unwrap();
        let world = snapshot.restore(&tuning, 1);

        assert_eq!(world.current_level, 1);
        assert_eq!(world.level_kill_count, 15);
        assert!(world.is_level_transitioning);
        assert_eq!(world.player.health, 100);
        assert_eq!(world.current_gun, GunId::Basic);
        assert!(world.unlocked_guns.contains(&GunId::Spread));
        assert_eq!(world.unlocked_guns.len(), 2);
        assert_eq!(world.stats.speed, 5);
        let (min, max) = player_bounds();
        assert_eq!(world.player.pos, Vec2::new(min.x, max.y));
        assert_eq!(world.enemies[0].kind, EnemyKind::Basic);
        assert_eq!(world.enemies[0].health, 1);
    }

    #[test]
    fn test_restore_caps_level() {
        let tuning = Tuning::default();
        let mut snapshot = SaveSnapshot::capture(&World::new(3));
        snapshot.current_level = u32::MAX;
        snapshot.level_kill_count = u32::MAX;

        let mut world = snapshot.restore(&tuning, 1);
        assert_eq!(world.current_level, MAX_LEVEL);
        assert!(world.is_level_transitioning);

        world.status = GameStatus::Playing;
        assert!(crate::sim::complete_transition(&mut world, &tuning).is_some());
        assert_eq!(world.current_level, MAX_LEVEL);
    }
}
