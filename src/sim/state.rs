//! Game state and core simulation types
//!
//! Everything a session mutates lives in [`World`]. Subsystems receive
//! `&mut World` and never reach into ambient state.

use std::collections::BTreeSet;

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::abilities::{Charge, Dash, Invulnerability};
use super::camera::Camera;
use crate::consts::*;
use crate::tuning::{EnemyKind, GunId};

/// Top-level game status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GameStatus {
    #[default]
    Menu,
    Playing,
    GameOver,
    Victory,
}

/// The player character
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub pos: Vec2,
    pub health: i32,
    /// True iff the player moved on the last tick (animation only)
    pub is_moving: bool,
    pub dash: Dash,
    pub charge: Charge,
    pub invulnerability: Invulnerability,
}

impl Default for Player {
    fn default() -> Self {
        Self {
            pos: Vec2::new(PLAYER_START_X, PLAYER_START_Y),
            health: MAX_HEALTH,
            is_moving: false,
            dash: Dash::default(),
            charge: Charge::default(),
            invulnerability: Invulnerability::default(),
        }
    }
}

impl Player {
    #[inline]
    pub fn is_dashing(&self) -> bool {
        self.dash.is_active()
    }

    #[inline]
    pub fn can_dash(&self) -> bool {
        self.dash.can_dash()
    }

    #[inline]
    pub fn is_charging(&self) -> bool {
        self.charge.is_charging()
    }

    #[inline]
    pub fn is_invulnerable(&self) -> bool {
        self.invulnerability.is_active()
    }

    /// Expire any ability whose deadline has passed
    pub fn refresh_timers(&mut self, now: f64) {
        self.dash.refresh(now);
        self.invulnerability.refresh(now);
    }
}

/// A homing enemy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enemy {
    pub id: u32,
    pub kind: EnemyKind,
    pub pos: Vec2,
    pub health: i32,
    /// Pixels per reference frame
    pub speed: f32,
    pub damage: i32,
}

/// A projectile in flight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projectile {
    pub id: u32,
    pub pos: Vec2,
    /// Unit vector, fixed at spawn
    pub direction: Vec2,
    pub is_charged: bool,
    pub piercing: bool,
    /// Visual size
    pub size: f32,
}

/// Upgradeable player stats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StatKind {
    FireRate,
    Damage,
    Speed,
    Health,
}

impl StatKind {
    pub const ALL: [StatKind; 4] = [
        StatKind::FireRate,
        StatKind::Damage,
        StatKind::Speed,
        StatKind::Health,
    ];

    /// Key used in save snapshots
    pub fn label(&self) -> &'static str {
        match self {
            StatKind::FireRate => "Fire Rate",
            StatKind::Damage => "Damage",
            StatKind::Speed => "Speed",
            StatKind::Health => "Health",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.label() == label)
    }
}

pub const MIN_STAT_LEVEL: u8 = 1;
pub const MAX_STAT_LEVEL: u8 = 5;

/// Stat upgrade levels, each in `MIN_STAT_LEVEL..=MAX_STAT_LEVEL`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatLevels {
    pub fire_rate: u8,
    pub damage: u8,
    pub speed: u8,
    pub health: u8,
}

impl Default for StatLevels {
    fn default() -> Self {
        Self {
            fire_rate: MIN_STAT_LEVEL,
            damage: MIN_STAT_LEVEL,
            speed: MIN_STAT_LEVEL,
            health: MIN_STAT_LEVEL,
        }
    }
}

impl StatLevels {
    pub fn get(&self, stat: StatKind) -> u8 {
        match stat {
            StatKind::FireRate => self.fire_rate,
            StatKind::Damage => self.damage,
            StatKind::Speed => self.speed,
            StatKind::Health => self.health,
        }
    }

    /// Set a level, clamped to the valid range
    pub fn set(&mut self, stat: StatKind, level: u8) {
        let level = level.clamp(MIN_STAT_LEVEL, MAX_STAT_LEVEL);
        match stat {
            StatKind::FireRate => self.fire_rate = level,
            StatKind::Damage => self.damage = level,
            StatKind::Speed => self.speed = level,
            StatKind::Health => self.health = level,
        }
    }

    fn above_base(level: u8) -> f32 {
        level.saturating_sub(MIN_STAT_LEVEL) as f32
    }

    pub fn damage_multiplier(&self) -> f32 {
        1.0 + 0.25 * Self::above_base(self.damage)
    }

    pub fn speed_multiplier(&self) -> f32 {
        1.0 + 0.1 * Self::above_base(self.speed)
    }

    /// Applied to a gun's charge time
    pub fn charge_time_multiplier(&self) -> f64 {
        (1.0 - 0.1 * Self::above_base(self.fire_rate) as f64).max(0.1)
    }

    pub fn max_health(&self) -> i32 {
        MAX_HEALTH + 20 * Self::above_base(self.health) as i32
    }
}

/// Purchasable consumables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PowerUpKind {
    Shield,
    DoubleScore,
    Nuke,
}

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 3] = [PowerUpKind::Shield, PowerUpKind::DoubleScore, PowerUpKind::Nuke];

    pub fn label(&self) -> &'static str {
        match self {
            PowerUpKind::Shield => "Shield",
            PowerUpKind::DoubleScore => "Double Score",
            PowerUpKind::Nuke => "Nuke",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.label() == label)
    }
}

/// Power-up stock counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerUps {
    pub shield: u32,
    pub double_score: u32,
    pub nuke: u32,
}

impl PowerUps {
    pub fn count(&self, kind: PowerUpKind) -> u32 {
        match kind {
            PowerUpKind::Shield => self.shield,
            PowerUpKind::DoubleScore => self.double_score,
            PowerUpKind::Nuke => self.nuke,
        }
    }

    pub fn count_mut(&mut self, kind: PowerUpKind) -> &mut u32 {
        match kind {
            PowerUpKind::Shield => &mut self.shield,
            PowerUpKind::DoubleScore => &mut self.double_score,
            PowerUpKind::Nuke => &mut self.nuke,
        }
    }

    /// Consume one from stock. Returns false if none left.
    pub fn take(&mut self, kind: PowerUpKind) -> bool {
        let count = self.count_mut(kind);
        if *count == 0 {
            return false;
        }
        *count -= 1;
        true
    }
}

/// Most events kept when nobody drains them; the oldest are dropped first
pub const MAX_EVENT_BACKLOG: usize = 256;

/// Things that happened during a tick, for rendering/audio consumers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    ShotFired { gun: GunId, charged: bool, pellets: u32 },
    EnemyKilled { id: u32, kind: EnemyKind, pos: Vec2, score: u64 },
    PlayerHit { damage: i32, health: i32 },
    ShieldAbsorbed { remaining: u32 },
    LevelComplete { level: u32 },
    LevelStarted { level: u32 },
    GameOver { score: u64, level: u32 },
    Victory { score: u64 },
}

/// Complete mutable state of one game session
#[derive(Debug, Clone)]
pub struct World {
    /// Run seed for reproducibility
    pub seed: u64,
    pub rng: Pcg32,
    pub player: Player,
    /// Live enemies in spawn order
    pub enemies: Vec<Enemy>,
    pub projectiles: Vec<Projectile>,
    /// 1-based
    pub current_level: u32,
    pub level_kill_count: u32,
    pub current_gun: GunId,
    pub unlocked_guns: BTreeSet<GunId>,
    pub mathbucks: u64,
    pub score: u64,
    pub status: GameStatus,
    pub is_paused: bool,
    pub in_store: bool,
    pub is_level_transitioning: bool,
    pub stats: StatLevels,
    pub power_ups: PowerUps,
    /// Wall-clock deadline of an active Double Score
    pub double_score_until: Option<f64>,
    pub camera: Camera,
    /// Drained by consumers each frame
    pub events: Vec<GameEvent>,
    next_id: u32,
}

impl World {
    /// Fresh level-1 world in the menu
    pub fn new(seed: u64) -> Self {
        let player = Player::default();
        let camera = Camera::following(player.pos);
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            player,
            enemies: Vec::new(),
            projectiles: Vec::new(),
            current_level: 1,
            level_kill_count: 0,
            current_gun: GunId::Basic,
            unlocked_guns: BTreeSet::from([GunId::Basic]),
            mathbucks: 0,
            score: 0,
            status: GameStatus::Menu,
            is_paused: false,
            in_store: false,
            is_level_transitioning: false,
            stats: StatLevels::default(),
            power_ups: PowerUps::default(),
            double_score_until: None,
            camera,
            events: Vec::new(),
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1).max(1);
        id
    }

    pub fn max_health(&self) -> i32 {
        self.stats.max_health()
    }

    /// Whether the frame loop should be running
    pub fn is_running(&self) -> bool {
        self.status == GameStatus::Playing && !self.is_paused && !self.in_store
    }

    pub fn double_score_active(&self, now: f64) -> bool {
        self.double_score_until.is_some_and(|until| now < until)
    }

    /// Expire wall-clock timers whose deadline has passed
    pub fn refresh_timers(&mut self, now: f64) {
        self.player.refresh_timers(now);
        if !self.double_score_active(now) {
            self.double_score_until = None;
        }
    }

    /// Earliest pending wall-clock deadline across all ability timers
    pub fn next_timer_deadline(&self) -> Option<f64> {
        [
            self.player.dash.next_deadline(),
            self.player.invulnerability.next_deadline(),
            self.double_score_until,
        ]
        .into_iter()
        .flatten()
        .reduce(f64::min)
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Drop the oldest undrained events past [`MAX_EVENT_BACKLOG`]
    pub fn trim_events(&mut self) {
        let excess = self.events.len().saturating_sub(MAX_EVENT_BACKLOG);
        if excess > 0 {
            self.events.drain(..excess);
        }
    }

    /// Add an enemy at `pos` with the base stats of `kind`
    pub fn spawn_enemy(&mut self, kind: EnemyKind, pos: Vec2, health: i32, speed: f32, damage: i32) -> u32 {
        let id = self.next_entity_id();
        self.enemies.push(Enemy {
            id,
            kind,
            pos,
            health: health.max(1),
            speed: speed.max(0.0),
            damage: damage.max(0),
        });
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_world() {
        let world = World::new(7);
        assert_eq!(world.status, GameStatus::Menu);
        assert_eq!(world.current_level, 1);
        assert_eq!(world.player.health, MAX_HEALTH);
        assert_eq!(world.player.pos, Vec2::new(600.0, 400.0));
        assert!(world.unlocked_guns.contains(&GunId::Basic));
        assert!(world.player.can_dash());
        assert!(!world.is_running());
    }

    #[test]
    fn test_entity_ids_are_unique() {
        let mut world = World::new(1);
        let a = world.spawn_enemy(EnemyKind::Basic, Vec2::ZERO, 30, 1.0, 5);
        let b = world.spawn_enemy(EnemyKind::Tank, Vec2::ZERO, 90, 1.0, 5);
        assert_ne!(a, b);
        assert_ne!(world.next_entity_id(), b);
    }

    #[test]
    fn test_stat_effects() {
        let mut stats = StatLevels::default();
        assert_eq!(stats.damage_multiplier(), 1.0);
        assert_eq!(stats.max_health(), 100);

        stats.set(StatKind::Damage, 3);
        stats.set(StatKind::Health, 5);
        stats.set(StatKind::FireRate, 9);
        assert_eq!(stats.damage_multiplier(), 1.5);
        assert_eq!(stats.max_health(), 180);
        assert_eq!(stats.fire_rate, MAX_STAT_LEVEL);
        assert!((stats.charge_time_multiplier() - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_labels_round_trip() {
        for stat in StatKind::ALL {
            assert_eq!(StatKind::from_label(stat.label()), Some(stat));
        }
        for kind in PowerUpKind::ALL {
            assert_eq!(PowerUpKind::from_label(kind.label()), Some(kind));
        }
        assert_eq!(StatKind::from_label("Luck"), None);
    }

    #[test]
    fn test_next_timer_deadline() {
        let mut world = World::new(1);
        assert_eq!(world.next_timer_deadline(), None);

        world.player.invulnerability.grant(100.0, 1000.0);
        world.player.dash.trigger(200.0, 150.0, 450.0);
        assert_eq!(world.next_timer_deadline(), Some(350.0));

        world.refresh_timers(1100.0);
        assert_eq!(world.next_timer_deadline(), None);
    }

    #[test]
    fn test_power_up_take() {
        let mut stock = PowerUps { nuke: 1, ..Default::default() };
        assert!(stock.take(PowerUpKind::Nuke));
        assert!(!stock.take(PowerUpKind::Nuke));
        assert!(!stock.take(PowerUpKind::Shield));
    }

    #[test]
    fn test_event_backlog_is_capped() {
        let mut world = World::new(1);
        for level in 0..(MAX_EVENT_BACKLOG as u32 + 40) {
            world.events.push(GameEvent::LevelStarted { level });
        }
        world.trim_events();
        assert_eq!(world.events.len(), MAX_EVENT_BACKLOG);
        assert_eq!(world.events[0], GameEvent::LevelStarted { level: 40 });
    }
}
