//! Data-driven game balance
//!
//! Gun, enemy and level tables. `Tuning::default()` is the authored game;
//! a JSON override can be loaded with [`Tuning::from_json`]. Every lookup
//! resolves to a value: unknown ids and out-of-range levels fall back to a
//! sensible default instead of failing.

use serde::{Deserialize, Serialize};

use crate::error::TuningError;

/// Weapon identifiers
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum GunId {
    #[default]
    Basic,
    Spread,
    Sniper,
}

impl GunId {
    pub const ALL: [GunId; 3] = [GunId::Basic, GunId::Spread, GunId::Sniper];

    pub fn as_str(&self) -> &'static str {
        match self {
            GunId::Basic => "basic",
            GunId::Spread => "spread",
            GunId::Sniper => "sniper",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "basic" => Some(GunId::Basic),
            "spread" => Some(GunId::Spread),
            "sniper" => Some(GunId::Sniper),
            _ => None,
        }
    }

    /// Parse a gun id, falling back to `Basic` for anything unregistered
    pub fn parse_or_default(s: &str) -> Self {
        Self::parse(s).unwrap_or_else(|| {
            log::warn!("Unknown gun id {:?}, using basic", s);
            GunId::Basic
        })
    }
}

/// Enemy archetypes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnemyKind {
    #[default]
    Basic,
    Fast,
    Tank,
}

impl EnemyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnemyKind::Basic => "basic",
            EnemyKind::Fast => "fast",
            EnemyKind::Tank => "tank",
        }
    }

    /// Parse an enemy type, falling back to `Basic`
    pub fn parse_or_default(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "fast" => EnemyKind::Fast,
            "tank" => EnemyKind::Tank,
            "basic" => EnemyKind::Basic,
            _ => {
                log::warn!("Unknown enemy type {:?}, using basic", s);
                EnemyKind::Basic
            }
        }
    }
}

/// Stats for one shot bracket (normal or charged)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShotConfig {
    /// Pixels per reference frame
    pub speed: f32,
    pub damage: i32,
    /// Visual size in pixels
    pub size: f32,
    pub piercing: bool,
    /// Projectiles per shot (burst guns fire a fan)
    #[serde(default = "one")]
    pub pellets: u32,
    /// Angle between neighbouring pellets
    #[serde(default)]
    pub spread_radians: f32,
    pub display_text: String,
}

fn one() -> u32 {
    1
}

/// Charged bracket: shot stats plus how long the trigger must be held
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChargedShot {
    #[serde(flatten)]
    pub shot: ShotConfig,
    pub charge_time_ms: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GunConfig {
    pub name: String,
    pub description: String,
    pub cost: u64,
    pub normal: ShotConfig,
    #[serde(default)]
    pub charged: Option<ChargedShot>,
}

impl GunConfig {
    /// Stats for a projectile fired in the given bracket
    pub fn shot(&self, charged: bool) -> &ShotConfig {
        match (&self.charged, charged) {
            (Some(c), true) => &c.shot,
            _ => &self.normal,
        }
    }

    /// Average damage dealt by one trigger pull of the given bracket
    pub fn damage_per_shot(&self, charged: bool) -> i32 {
        let shot = self.shot(charged);
        shot.damage * shot.pellets.max(1) as i32
    }
}

/// Gun table, one entry per [`GunId`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GunTable {
    pub basic: GunConfig,
    pub spread: GunConfig,
    pub sniper: GunConfig,
}

impl GunTable {
    pub fn get(&self, id: GunId) -> &GunConfig {
        match id {
            GunId::Basic => &self.basic,
            GunId::Spread => &self.spread,
            GunId::Sniper => &self.sniper,
        }
    }
}

impl Default for GunTable {
    fn default() -> Self {
        Self {
            basic: GunConfig {
                name: "Debug Logger".into(),
                description: "Standard console.log() projectiles".into(),
                cost: 0,
                normal: ShotConfig {
                    speed: 12.0,
                    damage: 10,
                    size: 8.0,
                    piercing: false,
                    pellets: 1,
                    spread_radians: 0.0,
                    display_text: "console.log()".into(),
                },
                charged: Some(ChargedShot {
                    shot: ShotConfig {
                        speed: 15.0,
                        damage: 25,
                        size: 50.0,
                        piercing: true,
                        pellets: 1,
                        spread_radians: 0.0,
                        display_text: "console.error()".into(),
                    },
                    charge_time_ms: 1000.0,
                }),
            },
            spread: GunConfig {
                name: "Multi Logger".into(),
                description: "Fires a fan of console.warn() calls".into(),
                cost: 1000,
                normal: ShotConfig {
                    speed: 15.0,
                    damage: 8,
                    size: 6.0,
                    piercing: false,
                    pellets: 3,
                    spread_radians: 0.2,
                    display_text: "console.warn()".into(),
                },
                charged: Some(ChargedShot {
                    shot: ShotConfig {
                        speed: 12.0,
                        damage: 20,
                        size: 40.0,
                        piercing: true,
                        pellets: 5,
                        spread_radians: 0.15,
                        display_text: "WARNNNNNN".into(),
                    },
                    charge_time_ms: 800.0,
                }),
            },
            sniper: GunConfig {
                name: "Stack Trace".into(),
                description: "High-damage, high-speed single projectiles".into(),
                cost: 2000,
                normal: ShotConfig {
                    speed: 20.0,
                    damage: 30,
                    size: 10.0,
                    piercing: false,
                    pellets: 1,
                    spread_radians: 0.0,
                    display_text: "throw new Error()".into(),
                },
                charged: Some(ChargedShot {
                    shot: ShotConfig {
                        speed: 25.0,
                        damage: 120,
                        size: 30.0,
                        piercing: true,
                        pellets: 1,
                        spread_radians: 0.0,
                        display_text: "KBOOOOOOOOOM".into(),
                    },
                    charge_time_ms: 1500.0,
                }),
            },
        }
    }
}

/// Base stats for one enemy archetype
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnemyStats {
    pub health: i32,
    /// Pixels per reference frame
    pub speed: f32,
    /// Contact damage dealt to the player
    pub damage: i32,
    /// Score awarded on defeat
    pub score: u64,
    /// Mathbucks awarded on defeat
    pub bounty: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyTable {
    pub basic: EnemyStats,
    pub fast: EnemyStats,
    pub tank: EnemyStats,
}

impl EnemyTable {
    pub fn get(&self, kind: EnemyKind) -> &EnemyStats {
        match kind {
            EnemyKind::Basic => &self.basic,
            EnemyKind::Fast => &self.fast,
            EnemyKind::Tank => &self.tank,
        }
    }
}

impl Default for EnemyTable {
    fn default() -> Self {
        Self {
            basic: EnemyStats { health: 30, speed: 1.5, damage: 5, score: 100, bounty: 5 },
            fast: EnemyStats { health: 20, speed: 3.0, damage: 5, score: 150, bounty: 8 },
            tank: EnemyStats { health: 90, speed: 0.8, damage: 15, score: 300, bounty: 15 },
        }
    }
}

/// Relative spawn weights. They need not sum to 1; draws normalize by the total.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnWeights {
    pub basic: f32,
    pub fast: f32,
    pub tank: f32,
}

impl SpawnWeights {
    pub fn total(&self) -> f32 {
        self.basic.max(0.0) + self.fast.max(0.0) + self.tank.max(0.0)
    }

    /// Cumulative-weight draw. `roll` is uniform in [0, 1).
    pub fn draw(&self, roll: f32) -> EnemyKind {
        let total = self.total();
        if total <= 0.0 || !total.is_finite() {
            return EnemyKind::Basic;
        }
        let target = roll.clamp(0.0, 1.0) * total;

        let mut cumulative = self.basic.max(0.0);
        if target < cumulative {
            return EnemyKind::Basic;
        }
        cumulative += self.fast.max(0.0);
        if target < cumulative {
            return EnemyKind::Fast;
        }
        EnemyKind::Tank
    }
}

/// Configuration for a single level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelConfig {
    pub required_kills: u32,
    pub spawn_interval_ms: u32,
    pub weights: SpawnWeights,
    pub mathbucks_reward: u64,
}

/// What happens after the last authored level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FinalLevel {
    /// Keep going with procedurally scaled levels
    #[default]
    Endless,
    /// End the run in victory
    Victory,
}

/// Level identity: authored table entry or a generated endless level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelId {
    Authored(u32),
    Endless(u32),
}

/// Growth parameters for endless levels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EndlessTuning {
    /// Scaling added per level past the last authored one
    pub growth_per_level: f32,
    /// Spawn intervals never drop below this
    pub min_spawn_interval_ms: u32,
}

impl Default for EndlessTuning {
    fn default() -> Self {
        Self { growth_per_level: 0.15, min_spawn_interval_ms: 100 }
    }
}

/// Player movement and ability timing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayerTuning {
    /// Pixels per reference frame
    pub base_speed: f32,
    pub dash_multiplier: f32,
    pub dash_duration_ms: f64,
    pub dash_cooldown_ms: f64,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            base_speed: 8.0,
            dash_multiplier: 2.5,
            dash_duration_ms: 150.0,
            dash_cooldown_ms: 450.0,
        }
    }
}

/// Complete balance table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tuning {
    pub player: PlayerTuning,
    pub guns: GunTable,
    pub enemies: EnemyTable,
    /// Authored levels, level 1 first
    pub levels: Vec<LevelConfig>,
    #[serde(default)]
    pub endless: EndlessTuning,
    #[serde(default)]
    pub final_level: FinalLevel,
    /// "Level complete" overlay duration
    pub level_transition_ms: f64,
}

impl Default for Tuning {
    fn default() -> Self {
        let level = |required_kills, spawn_interval_ms, (basic, fast, tank), mathbucks_reward| {
            LevelConfig {
                required_kills,
                spawn_interval_ms,
                weights: SpawnWeights { basic, fast, tank },
                mathbucks_reward,
            }
        };

        Self {
            player: PlayerTuning::default(),
            guns: GunTable::default(),
            enemies: EnemyTable::default(),
            levels: vec![
                level(15, 2000, (1.0, 0.0, 0.0), 500),
                level(25, 1500, (0.7, 0.3, 0.0), 1000),
                level(40, 1000, (0.6, 0.3, 0.1), 1500),
                level(60, 600, (0.5, 0.3, 0.2), 2000),
                level(80, 500, (0.4, 0.4, 0.2), 2500),
                level(100, 400, (0.3, 0.4, 0.3), 3000),
                level(150, 300, (0.2, 0.5, 0.3), 4000),
            ],
            endless: EndlessTuning::default(),
            final_level: FinalLevel::Endless,
            level_transition_ms: 3000.0,
        }
    }
}

impl Tuning {
    /// Parse and validate a tuning table
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Parse a tuning table, falling back to the authored defaults on any error
    pub fn from_json_or_default(json: &str) -> Self {
        match Self::from_json(json) {
            Ok(t) => t,
            Err(e) => {
                log::warn!("Ignoring tuning override: {}", e);
                Self::default()
            }
        }
    }

    pub fn validate(&self) -> Result<(), TuningError> {
        if self.levels.is_empty() {
            return Err(TuningError::Invalid("no authored levels".into()));
        }
        for (i, level) in self.levels.iter().enumerate() {
            if level.required_kills == 0 {
                return Err(TuningError::Invalid(format!("level {} requires no kills", i + 1)));
            }
            if level.spawn_interval_ms == 0 {
                return Err(TuningError::Invalid(format!("level {} has a zero spawn interval", i + 1)));
            }
        }
        for id in GunId::ALL {
            let gun = self.guns.get(id);
            let weaker_charge = gun
                .charged
                .as_ref()
                .is_some_and(|c| c.shot.damage < gun.normal.damage);
            if weaker_charge {
                return Err(TuningError::Invalid(format!(
                    "{} charged damage below normal damage",
                    id.as_str()
                )));
            }
        }
        if self.endless.min_spawn_interval_ms == 0 {
            return Err(TuningError::Invalid("endless spawn floor must be positive".into()));
        }
        Ok(())
    }

    /// Number of authored levels
    pub fn authored_levels(&self) -> u32 {
        self.levels.len() as u32
    }

    pub fn gun(&self, id: GunId) -> &GunConfig {
        self.guns.get(id)
    }

    pub fn enemy(&self, kind: EnemyKind) -> &EnemyStats {
        self.enemies.get(kind)
    }

    /// Classify a level number (numbers below 1 are treated as level 1)
    pub fn level_id(&self, level: u32) -> LevelId {
        let level = level.max(1);
        if level <= self.authored_levels() {
            LevelId::Authored(level)
        } else {
            LevelId::Endless(level)
        }
    }

    /// Configuration for any level number. Past the authored table this is the
    /// endless generator; with `FinalLevel::Victory` it is the last authored level.
    pub fn level(&self, level: u32) -> LevelConfig {
        let last = self.levels.last().cloned().unwrap_or_else(|| LevelConfig {
            required_kills: 15,
            spawn_interval_ms: 2000,
            weights: SpawnWeights { basic: 1.0, fast: 0.0, tank: 0.0 },
            mathbucks_reward: 500,
        });

        match self.level_id(level) {
            LevelId::Authored(n) => self.levels.get(n as usize - 1).cloned().unwrap_or(last),
            LevelId::Endless(n) => match self.final_level {
                FinalLevel::Endless => self.endless_level(&last, n - self.authored_levels()),
                FinalLevel::Victory => last,
            },
        }
    }

    /// Scale the last authored level `levels_past` levels into endless mode
    fn endless_level(&self, last: &LevelConfig, levels_past: u32) -> LevelConfig {
        let scaling = levels_past as f64 * self.endless.growth_per_level as f64;

        let required_kills = (last.required_kills as f64 * (1.0 + scaling)).floor() as u32;
        let spawn_interval_ms = ((last.spawn_interval_ms as f64 * (1.0 - 0.5 * scaling))
            .floor()
            .max(0.0) as u32)
            .max(self.endless.min_spawn_interval_ms);

        // Weight moves away from basic enemies toward fast and tank
        let s = scaling as f32;
        let weights = SpawnWeights {
            basic: last.weights.basic / (1.0 + s),
            fast: last.weights.fast * (1.0 + 0.5 * s),
            tank: last.weights.tank * (1.0 + s),
        };

        let mathbucks_reward = (last.mathbucks_reward as f64 * (1.0 + scaling)).floor() as u64;

        LevelConfig {
            required_kills,
            spawn_interval_ms,
            weights,
            mathbucks_reward,
        }
    }
}
