//! Data-driven enemy and item tables
//!
//! Loaded once from a JSON document:
//!
//! ```json
//! { "enemyTypes": [ ... ], "items": [ ... ], "tuning": { ... } }
//! ```
//!
//! Every table entry is immutable after load and shared by index. Anything
//! missing or malformed degrades to built-in defaults instead of failing the
//! run.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;

/// Errors raised while loading or validating a config document
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("config table '{table}' is empty")]
    Empty { table: &'static str },
    #[error("invalid entry '{id}': {reason}")]
    Invalid { id: String, reason: &'static str },
}

/// Movement pattern of an enemy type, fixed for the enemy's lifetime
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "movementPattern", rename_all = "snake_case")]
pub enum MovementPattern {
    /// Chase the player with a perpendicular oscillation
    SinusoidalChase {
        #[serde(default = "default_amplitude")]
        amplitude: f32,
        #[serde(default = "default_frequency")]
        frequency: f32,
    },
    /// Walk in a random heading, re-rolled on an interval (ms)
    RandomWander {
        #[serde(rename = "directionChangeInterval", default = "default_direction_change")]
        direction_change_interval: f64,
    },
    /// Head straight for the player. Unknown tags land here too.
    #[default]
    #[serde(other)]
    DirectChase,
}

fn default_amplitude() -> f32 {
    50.0
}

fn default_frequency() -> f32 {
    1.0
}

fn default_direction_change() -> f64 {
    2000.0
}

/// What happens when an enemy's HP reaches zero
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecialDeath {
    /// Splits into two half-strength copies
    Split,
    /// Gets back up until its third death
    Resurrect,
}

/// Display color, either `"0xff0000"`-style text or a packed integer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Color {
    Packed(u32),
    Hex(String),
}

/// Static definition of an enemy type
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnemyTypeDef {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub hp: f32,
    pub damage: f32,
    pub base_speed: f32,
    /// Collision radius
    pub size: f32,
    #[serde(default)]
    pub color: Option<Color>,
    #[serde(default = "default_spawn_weight")]
    pub spawn_weight: f32,
    #[serde(default)]
    pub behavior: MovementPattern,
    #[serde(default)]
    pub special_death: Option<SpecialDeath>,
}

fn default_spawn_weight() -> f32 {
    1.0
}

impl EnemyTypeDef {
    /// The enemy used when no usable enemy table is available
    pub fn fallback() -> Self {
        Self {
            id: "basic".to_string(),
            name: "Basic Enemy".to_string(),
            hp: 50.0,
            damage: 10.0,
            base_speed: 50.0,
            size: 16.0,
            color: Some(Color::Packed(0xff0000)),
            spawn_weight: 1.0,
            behavior: MovementPattern::DirectChase,
            special_death: None,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason| ConfigError::Invalid {
            id: self.id.clone(),
            reason,
        };
        if self.hp.is_nan() || self.hp <= 0.0 {
            return Err(invalid("hp must be positive"));
        }
        if self.size.is_nan() || self.size <= 0.0 {
            return Err(invalid("size must be positive"));
        }
        if self.spawn_weight.is_nan() || self.spawn_weight < 0.0 {
            return Err(invalid("spawnWeight must not be negative"));
        }
        Ok(())
    }
}

/// Base projectile stats of an item at level 1
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ItemStats {
    pub damage: f32,
    pub speed: f32,
    pub max_bounces: u32,
    pub size: f32,
    pub knockback: f32,
    /// Minimum time between shots (ms)
    pub fire_rate: f64,
}

impl Default for ItemStats {
    fn default() -> Self {
        Self {
            damage: 10.0,
            speed: 300.0,
            max_bounces: 1,
            size: 8.0,
            knockback: DEFAULT_KNOCKBACK,
            fire_rate: 300.0,
        }
    }
}

/// Linear per-level deltas added on top of [`ItemStats`]
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatBonus {
    pub damage: f32,
    pub speed: f32,
    pub max_bounces: i32,
    pub size: f32,
    pub knockback: f32,
    pub fire_rate: f64,
}

/// How many projectiles a shot emits and how widely they fan out
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ItemBehavior {
    pub projectiles_per_shot: u32,
    /// Total fan width in degrees
    pub spread_angle: f32,
}

impl Default for ItemBehavior {
    fn default() -> Self {
        Self {
            projectiles_per_shot: 1,
            spread_angle: 0.0,
        }
    }
}

/// Partial behavior applied at a specific item level
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BehaviorOverride {
    pub projectiles_per_shot: Option<u32>,
    pub spread_angle: Option<f32>,
}

/// Damage-over-time carried by an item's projectiles
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoisonParams {
    pub damage_per_tick: f32,
    /// ms between ticks
    pub tick_interval: f64,
    /// ms the effect lasts after the latest application
    pub duration: f64,
    pub max_stacks: u32,
}

/// Static definition of a weapon item
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemTypeDef {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_unlock_level")]
    pub unlock_level: u32,
    #[serde(default = "default_max_level")]
    pub max_level: u32,
    #[serde(default)]
    pub is_starting: bool,
    #[serde(default)]
    pub base_stats: ItemStats,
    #[serde(default)]
    pub level_up_bonus: StatBonus,
    #[serde(default)]
    pub behavior: ItemBehavior,
    /// Keyed `"level2"`, `"level3"`, ...
    #[serde(default)]
    pub level_up_behavior: BTreeMap<String, BehaviorOverride>,
    #[serde(default)]
    pub poison: Option<PoisonParams>,
}

fn default_unlock_level() -> u32 {
    1
}

fn default_max_level() -> u32 {
    5
}

impl ItemTypeDef {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_level < 1 {
            return Err(ConfigError::Invalid {
                id: self.id.clone(),
                reason: "maxLevel must be at least 1",
            });
        }
        Ok(())
    }

    /// Items available when no item table is supplied
    pub fn builtin() -> Vec<Self> {
        let mut triple = BTreeMap::new();
        triple.insert(
            "level3".to_string(),
            BehaviorOverride {
                projectiles_per_shot: Some(5),
                spread_angle: Some(45.0),
            },
        );

        vec![
            ItemTypeDef {
                id: "bouncy_ball".to_string(),
                name: "Bouncy Ball".to_string(),
                description: "A ball that bounces between enemies".to_string(),
                unlock_level: 1,
                max_level: 5,
                is_starting: true,
                base_stats: ItemStats {
                    damage: 10.0,
                    speed: 400.0,
                    max_bounces: 3,
                    size: 8.0,
                    knockback: 100.0,
                    fire_rate: 300.0,
                },
                level_up_bonus: StatBonus {
                    damage: 5.0,
                    speed: 20.0,
                    max_bounces: 1,
                    fire_rate: -20.0,
                    ..StatBonus::default()
                },
                behavior: ItemBehavior::default(),
                level_up_behavior: BTreeMap::new(),
                poison: None,
            },
            ItemTypeDef {
                id: "toxic_orb".to_string(),
                name: "Toxic Orb".to_string(),
                description: "Poisons whatever it touches".to_string(),
                unlock_level: 2,
                max_level: 5,
                is_starting: false,
                base_stats: ItemStats {
                    damage: 4.0,
                    speed: 300.0,
                    max_bounces: 2,
                    size: 10.0,
                    knockback: 50.0,
                    fire_rate: 800.0,
                },
                level_up_bonus: StatBonus {
                    damage: 2.0,
                    fire_rate: -50.0,
                    ..StatBonus::default()
                },
                behavior: ItemBehavior::default(),
                level_up_behavior: BTreeMap::new(),
                poison: Some(PoisonParams {
                    damage_per_tick: 3.0,
                    tick_interval: 500.0,
                    duration: 3000.0,
                    max_stacks: 5,
                }),
            },
            ItemTypeDef {
                id: "scatter_shot".to_string(),
                name: "Scatter Shot".to_string(),
                description: "Fires a fan of small balls".to_string(),
                unlock_level: 3,
                max_level: 4,
                is_starting: false,
                base_stats: ItemStats {
                    damage: 6.0,
                    speed: 350.0,
                    max_bounces: 1,
                    size: 6.0,
                    knockback: 60.0,
                    fire_rate: 900.0,
                },
                level_up_bonus: StatBonus {
                    damage: 2.0,
                    ..StatBonus::default()
                },
                behavior: ItemBehavior {
                    projectiles_per_shot: 3,
                    spread_angle: 30.0,
                },
                level_up_behavior: triple,
                poison: None,
            },
        ]
    }
}

/// Tunable simulation numbers (times in ms, distances in world units)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SimTuning {
    pub map_width: f32,
    pub map_height: f32,
    pub player_radius: f32,
    pub player_max_hp: f32,
    pub player_move_speed: f32,
    pub spawn_interval_ms: f64,
    pub min_spawn_interval_ms: f64,
    pub spawn_interval_step_ms: f64,
    /// Unpaused time between difficulty steps
    pub difficulty_interval_ms: f64,
    /// Enemy speed bonus added per difficulty step
    pub speed_step: f32,
    pub spawn_edge_offset: f32,
    pub xp_per_kill: u32,
    pub loot_drop_chance: f32,
    pub chest_bonus_xp: u32,
    pub magnet_range: f32,
    pub pickup_radius: f32,
    /// A projectile can't hit the same enemy again within this window
    pub hit_cooldown_ms: f64,
    /// Cooldown entries older than this are forgotten
    pub cooldown_prune_ms: f64,
    /// Enemies this far outside the map are removed
    pub cleanup_margin: f32,
    /// Projectiles this far outside the map are destroyed
    pub projectile_cleanup_margin: f32,
}

impl Default for SimTuning {
    fn default() -> Self {
        Self {
            map_width: MAP_WIDTH,
            map_height: MAP_HEIGHT,
            player_radius: PLAYER_RADIUS,
            player_max_hp: PLAYER_MAX_HP,
            player_move_speed: PLAYER_MOVE_SPEED,
            spawn_interval_ms: 2000.0,
            min_spawn_interval_ms: 500.0,
            spawn_interval_step_ms: 100.0,
            difficulty_interval_ms: 30_000.0,
            speed_step: 10.0,
            spawn_edge_offset: 20.0,
            xp_per_kill: 20,
            loot_drop_chance: 0.5,
            chest_bonus_xp: 50,
            magnet_range: 100.0,
            pickup_radius: 15.0,
            hit_cooldown_ms: 50.0,
            cooldown_prune_ms: 1000.0,
            cleanup_margin: 100.0,
            projectile_cleanup_margin: 100.0,
        }
    }
}

/// Complete static configuration of a run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameConfig {
    pub enemy_types: Vec<EnemyTypeDef>,
    #[serde(default = "ItemTypeDef::builtin")]
    pub items: Vec<ItemTypeDef>,
    #[serde(default)]
    pub tuning: SimTuning,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            enemy_types: vec![EnemyTypeDef::fallback()],
            items: ItemTypeDef::builtin(),
            tuning: SimTuning::default(),
        }
    }
}

impl GameConfig {
    /// Parse and validate a config document
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a config file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Load a config file, falling back to the built-in tables on any error
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::from_path(path) {
            Ok(config) => {
                log::info!(
                    "Loaded {} enemy types and {} items from {}",
                    config.enemy_types.len(),
                    config.items.len(),
                    path.display()
                );
                config
            }
            Err(e) => {
                log::warn!("{e}; using default enemy and item tables");
                Self::default()
            }
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.enemy_types.is_empty() {
            return Err(ConfigError::Empty {
                table: "enemyTypes",
            });
        }
        if self.items.is_empty() {
            return Err(ConfigError::Empty { table: "items" });
        }
        for enemy in &self.enemy_types {
            enemy.validate()?;
        }
        for item in &self.items {
            item.validate()?;
        }
        Ok(())
    }

    /// Index of the item the player starts with
    pub fn starting_item(&self) -> Option<usize> {
        self.items
            .iter()
            .position(|i| i.is_starting)
            .or_else(|| (!self.items.is_empty()).then_some(0))
    }

    pub fn enemy_index(&self, id: &str) -> Option<usize> {
        self.enemy_types.iter().position(|e| e.id == id)
    }

    pub fn item_index(&self, id: &str) -> Option<usize> {
        self.items.iter().position(|i| i.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"{
        "enemyTypes": [
            { "id": "basic_red", "name": "Red", "hp": 30, "damage": 10, "baseSpeed": 60,
              "size": 16, "color": "0xff0000", "spawnWeight": 5,
              "behavior": { "movementPattern": "direct_chase" } },
            { "id": "dodger_green", "hp": 20, "damage": 5, "baseSpeed": 70, "size": 14,
              "color": 65280, "spawnWeight": 3,
              "behavior": { "movementPattern": "sinusoidal_chase", "amplitude": 80, "frequency": 2 } },
            { "id": "wanderer_blue", "hp": 40, "damage": 8, "baseSpeed": 40, "size": 18,
              "behavior": { "movementPattern": "random_wander", "directionChangeInterval": 1500 } },
            { "id": "slime", "hp": 40, "damage": 5, "baseSpeed": 35, "size": 20,
              "behavior": { "movementPattern": "teleport" }, "specialDeath": "split" }
        ],
        "items": [
            { "id": "ball", "name": "Ball", "isStarting": true,
              "baseStats": { "damage": 10, "speed": 400, "maxBounces": 3, "size": 8, "knockback": 100, "fireRate": 300 },
              "levelUpBonus": { "damage": 5, "fireRate": -20 },
              "levelUpBehavior": { "level3": { "projectilesPerShot": 2 } } }
        ],
        "tuning": { "xpPerKill": 25 }
    }"#;

    #[test]
    fn test_parse_full_document() {
        let config = GameConfig::from_json_str(DOC).unwrap();
        assert_eq!(config.enemy_types.len(), 4);
        assert_eq!(config.tuning.xp_per_kill, 25);
        assert_eq!(config.tuning.hit_cooldown_ms, 50.0);

        assert_eq!(
            config.enemy_types[1].behavior,
            MovementPattern::SinusoidalChase {
                amplitude: 80.0,
                frequency: 2.0
            }
        );
        assert_eq!(
            config.enemy_types[2].behavior,
            MovementPattern::RandomWander {
                direction_change_interval: 1500.0
            }
        );
        assert_eq!(config.enemy_types[2].spawn_weight, 1.0);
        assert_eq!(config.enemy_types[3].special_death, Some(SpecialDeath::Split));

        let item = &config.items[0];
        assert_eq!(item.level_up_bonus.damage, 5.0);
        assert_eq!(item.level_up_bonus.speed, 0.0);
        assert_eq!(item.max_level, 5);
        assert_eq!(item.level_up_behavior["level3"].projectiles_per_shot, Some(2));
    }

    #[test]
    fn test_unknown_pattern_falls_back_to_direct_chase() {
        let config = GameConfig::from_json_str(DOC).unwrap();
        assert_eq!(config.enemy_types[3].behavior, MovementPattern::DirectChase);
    }

    #[test]
    fn test_empty_enemy_table_is_rejected() {
        let err = GameConfig::from_json_str(r#"{ "enemyTypes": [] }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Empty { table: "enemyTypes" }));
    }

    #[test]
    fn test_invalid_entry_is_rejected() {
        let doc = r#"{ "enemyTypes": [ { "id": "ghost", "hp": 0, "damage": 1, "baseSpeed": 1, "size": 4 } ] }"#;
        let err = GameConfig::from_json_str(doc).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn test_malformed_document_falls_back_to_default() {
        let dir = std::env::temp_dir().join("bounce_survivor_bad_config.json");
        std::fs::write(&dir, "{ not json").unwrap();
        let config = GameConfig::load_or_default(&dir);
        assert_eq!(config.enemy_types.len(), 1);
        assert_eq!(config.enemy_types[0].id, "basic");
        assert!(!config.items.is_empty());
        let _ = std::fs::remove_file(&dir);
    }

    #[test]
    fn test_missing_file_falls_back_to_default() {
        let config = GameConfig::load_or_default("/definitely/not/here.json");
        assert_eq!(config.enemy_types[0].hp, 50.0);
        assert_eq!(config.enemy_types[0].damage, 10.0);
    }

    #[test]
    fn test_shipped_config_parses() {
        let config = GameConfig::from_json_str(include_str!("../assets/config.json")).unwrap();
        assert_eq!(config.enemy_types.len(), 5);
        let skeleton = config.enemy_index("skeleton").unwrap();
        assert_eq!(config.enemy_types[skeleton].special_death, Some(SpecialDeath::Resurrect));
        assert!(config.items[config.item_index("toxic_orb").unwrap()].poison.is_some());
    }

    #[test]
    fn test_starting_item() {
        let config = GameConfig::default();
        let start = config.starting_item().unwrap();
        assert!(config.items[start].is_starting);
    }
}
