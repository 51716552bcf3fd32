//! World state and core simulation types
//!
//! The [`World`] exclusively owns every entity in id-sorted arenas. Systems
//! refer to entities by [`EntityId`] only, since any of them may be released
//! mid-tick. Released entities are flagged `alive = false` and swept at the
//! end of the tick.

use std::sync::Arc;

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::collision::HitCooldowns;
use super::death::{Resurrection, ResurrectionPhase};
use super::effects::PoisonState;
use super::items::PlayerItem;
use super::leveling::{Leveling, StatBoost};
use super::loot::Chest;
use super::movement::AiState;
use super::spawner::SpawnerState;
use crate::config::{EnemyTypeDef, GameConfig, PoisonParams};
use crate::consts::*;

/// Stable entity handle
pub type EntityId = u32;

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Active gameplay
    Playing,
    /// A level-up choice is waiting on the UI; enemies and projectiles are frozen
    ChoicePending,
    /// Player died
    GameOver,
}

/// Events emitted to rendering/UI collaborators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum GameEvent {
    #[serde(rename_all = "camelCase")]
    EnemySpawned {
        enemy_id: EntityId,
        enemy_type: String,
        position: Vec2,
    },
    #[serde(rename_all = "camelCase")]
    EnemyDamaged {
        enemy_id: EntityId,
        damage: f32,
        hp: f32,
        poison: bool,
    },
    #[serde(rename_all = "camelCase")]
    EnemyKilled { enemy_type: String, position: Vec2 },
    /// A resurrecting enemy moved to the next step of its get-up sequence
    #[serde(rename_all = "camelCase")]
    EnemyResurrecting {
        enemy_id: EntityId,
        phase: ResurrectionPhase,
        position: Vec2,
    },
    #[serde(rename_all = "camelCase")]
    EnemyRevived {
        enemy_id: EntityId,
        deaths: u32,
        position: Vec2,
    },
    #[serde(rename_all = "camelCase")]
    PlayerDamaged { current_hp: f32, max_hp: f32 },
    PlayerDied,
    #[serde(rename_all = "camelCase")]
    XpGained {
        current_xp: u32,
        required_xp: u32,
        amount: u32,
    },
    #[serde(rename_all = "camelCase")]
    LevelUp { level: u32, xp_to_next_level: u32 },
    LevelUpComplete,
    #[serde(rename_all = "camelCase")]
    ItemsChanged { player_items: Vec<ItemSnapshot> },
    #[serde(rename_all = "camelCase")]
    StatUpgrade { stat: StatBoost, value: f32 },
    #[serde(rename_all = "camelCase")]
    ChestDropped { chest_id: EntityId, position: Vec2 },
    #[serde(rename_all = "camelCase")]
    ChestCollected { bonus_xp: u32 },
}

/// Item id and level, as reported to the UI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSnapshot {
    pub id: String,
    pub level: u32,
}

/// The player
#[derive(Debug, Clone)]
pub struct Player {
    pub id: EntityId,
    pub pos: Vec2,
    pub prev_pos: Vec2,
    pub vel: Vec2,
    /// Contact push, added on top of input velocity and decaying over time
    pub knockback: Vec2,
    pub radius: f32,
    pub hp: f32,
    pub max_hp: f32,
    pub move_speed: f32,
}

impl Player {
    pub fn new(id: EntityId, pos: Vec2, radius: f32, max_hp: f32, move_speed: f32) -> Self {
        Self {
            id,
            pos,
            prev_pos: pos,
            vel: Vec2::ZERO,
            knockback: Vec2::ZERO,
            radius,
            hp: max_hp,
            max_hp,
            move_speed,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0.0
    }

    /// Whether the player travelled a meaningful distance this tick
    pub fn moved(&self) -> bool {
        self.pos.distance(self.prev_pos) > MOVE_EPSILON
    }

    /// Apply damage; returns true if this killed the player
    pub fn take_damage(&mut self, damage: f32) -> bool {
        self.hp -= damage;
        if self.hp <= 0.0 {
            self.hp = 0.0;
            return true;
        }
        false
    }

    pub fn heal(&mut self, amount: f32) {
        self.hp = (self.hp + amount).min(self.max_hp);
    }

    pub fn increase_max_hp(&mut self, amount: f32) {
        self.max_hp += amount;
        self.hp = (self.hp + amount).min(self.max_hp);
    }
}

/// An enemy instance
#[derive(Debug, Clone)]
pub struct Enemy {
    pub id: EntityId,
    /// Index into `GameConfig::enemy_types`
    pub kind: usize,
    pub pos: Vec2,
    pub prev_pos: Vec2,
    pub vel: Vec2,
    pub knockback: Vec2,
    /// Current collision radius; shrinks across splits
    pub radius: f32,
    pub hp: f32,
    /// Current max HP; halves across splits
    pub max_hp: f32,
    pub speed: f32,
    pub damage: f32,
    pub ai: AiState,
    pub poison: PoisonState,
    /// Deaths so far (resurrecting types only)
    pub death_count: u32,
    pub facing_left: bool,
    pub alive: bool,
    pub visible: bool,
    pub collidable: bool,
    pub resurrection: Option<Resurrection>,
}

impl Enemy {
    /// Fresh enemy at full strength of its type
    pub fn new(
        id: EntityId,
        kind: usize,
        def: &EnemyTypeDef,
        pos: Vec2,
        speed_bonus: f32,
        now: f64,
        rng: &mut Pcg32,
    ) -> Self {
        Self {
            id,
            kind,
            pos,
            prev_pos: pos,
            vel: Vec2::ZERO,
            knockback: Vec2::ZERO,
            radius: def.size,
            hp: def.hp,
            max_hp: def.hp,
            speed: def.base_speed + speed_bonus,
            damage: def.damage,
            ai: AiState::for_pattern(&def.behavior, now, rng),
            poison: PoisonState::default(),
            death_count: 0,
            facing_left: false,
            alive: true,
            visible: true,
            collidable: true,
            resurrection: None,
        }
    }

    /// Can be hit, touched, poisoned and steered
    pub fn is_active(&self) -> bool {
        self.alive && self.collidable
    }

    /// HP reached zero and the death handler hasn't dealt with it yet
    pub fn is_dying(&self) -> bool {
        self.alive && self.resurrection.is_none() && self.hp <= 0.0
    }
}

/// A fired ball
#[derive(Debug, Clone)]
pub struct Projectile {
    pub id: EntityId,
    /// Index into `GameConfig::items`
    pub item: usize,
    pub level: u32,
    pub pos: Vec2,
    pub prev_pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub damage: f32,
    pub knockback: f32,
    pub bounces: u32,
    pub max_bounces: u32,
    pub poison: Option<PoisonParams>,
    pub alive: bool,
}

impl Projectile {
    /// Destroy once; returns false if it was already gone
    pub fn destroy(&mut self) -> bool {
        std::mem::replace(&mut self.alive, false)
    }
}

/// Complete simulation world
#[derive(Debug, Clone)]
pub struct World {
    /// Shared immutable tables
    pub config: Arc<GameConfig>,
    /// Run seed for reproducibility
    pub seed: u64,
    pub rng: Pcg32,
    /// Virtual clock (ms); only advances while playing
    pub now: f64,
    pub phase: GamePhase,
    pub player: Player,
    /// Sorted by id
    pub enemies: Vec<Enemy>,
    /// Sorted by id
    pub projectiles: Vec<Projectile>,
    pub chests: Vec<Chest>,
    pub items: Vec<PlayerItem>,
    pub hit_cooldowns: HitCooldowns,
    pub spawner: SpawnerState,
    pub leveling: Leveling,
    /// Events emitted since the last drain
    pub events: Vec<GameEvent>,
    next_id: EntityId,
}

impl World {
    /// Create a new run with the given config and seed
    pub fn new(config: Arc<GameConfig>, seed: u64) -> Self {
        let tuning = &config.tuning;
        let center = Vec2::new(tuning.map_width / 2.0, tuning.map_height / 2.0);
        let player = Player::new(
            1,
            center,
            tuning.player_radius,
            tuning.player_max_hp,
            tuning.player_move_speed,
        );
        let items = PlayerItem::starting(&config);
        let spawner = SpawnerState::new(tuning);

        Self {
            config,
            seed,
            rng: Pcg32::seed_from_u64(seed),
            now: 0.0,
            phase: GamePhase::Playing,
            player,
            enemies: Vec::new(),
            projectiles: Vec::new(),
            chests: Vec::new(),
            items,
            hit_cooldowns: HitCooldowns::default(),
            spawner,
            leveling: Leveling::default(),
            events: Vec::new(),
            next_id: 2,
        }
    }

    /// Full game reset: fresh entities, items, leveling and clock.
    /// The RNG keeps its stream so consecutive runs differ.
    pub fn reset(&mut self) {
        let rng = self.rng.clone();
        *self = Self::new(Arc::clone(&self.config), self.seed);
        self.rng = rng;
        log::info!("World reset");
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Take all events emitted since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn enemy(&self, id: EntityId) -> Option<&Enemy> {
        self.enemies
            .binary_search_by_key(&id, |e| e.id)
            .ok()
            .map(|i| &self.enemies[i])
            .filter(|e| e.alive)
    }

    pub fn enemy_mut(&mut self, id: EntityId) -> Option<&mut Enemy> {
        match self.enemies.binary_search_by_key(&id, |e| e.id) {
            Ok(i) if self.enemies[i].alive => Some(&mut self.enemies[i]),
            _ => None,
        }
    }

    pub fn projectile_mut(&mut self, id: EntityId) -> Option<&mut Projectile> {
        match self.projectiles.binary_search_by_key(&id, |p| p.id) {
            Ok(i) if self.projectiles[i].alive => Some(&mut self.projectiles[i]),
            _ => None,
        }
    }

    /// Add a freshly spawned enemy of type `kind`; returns its id
    pub fn spawn_enemy_at(&mut self, kind: usize, pos: Vec2) -> EntityId {
        let id = self.next_entity_id();
        let config = Arc::clone(&self.config);
        let def = &config.enemy_types[kind];
        let enemy = Enemy::new(id, kind, def, pos, self.spawner.speed_bonus, self.now, &mut self.rng);
        self.enemies.push(enemy);
        self.emit(GameEvent::EnemySpawned {
            enemy_id: id,
            enemy_type: def.id.clone(),
            position: pos,
        });
        id
    }

    /// Living (not necessarily collidable) enemy count
    pub fn enemy_count(&self) -> usize {
        self.enemies.iter().filter(|e| e.alive).count()
    }

    pub fn projectile_count(&self) -> usize {
        self.projectiles.iter().filter(|p| p.alive).count()
    }

    /// Ids of enemies matching `pred`, for iterating while the arena changes
    pub fn enemy_ids_where(&self, pred: impl Fn(&Enemy) -> bool) -> Vec<EntityId> {
        self.enemies.iter().filter(|e| pred(e)).map(|e| e.id).collect()
    }

    /// Drop released entities
    pub fn sweep(&mut self) {
        self.enemies.retain(|e| e.alive);
        self.projectiles.retain(|p| p.alive);
        self.chests.retain(|c| !c.collected);
    }

    /// Ensure arenas are sorted by ID for deterministic iteration and lookup
    pub fn normalize_order(&mut self) {
        self.enemies.sort_by_key(|e| e.id);
        self.projectiles.sort_by_key(|p| p.id);
        self.chests.sort_by_key(|c| c.id);
    }

    /// Snapshot of owned items for `ItemsChanged`
    pub fn item_snapshot(&self) -> Vec<ItemSnapshot> {
        self.items
            .iter()
            .map(|pi| ItemSnapshot {
                id: self.config.items[pi.item].id.clone(),
                level: pi.level,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world() -> World {
        World::new(Arc::new(GameConfig::default()), 7)
    }

    #[test]
    fn test_new_world_layout() {
        let w = world();
        assert_eq!(w.phase, GamePhase::Playing);
        assert_eq!(w.player.pos, Vec2::new(512.0, 512.0));
        assert_eq!(w.player.hp, 100.0);
        assert_eq!(w.items.len(), 1);
        assert_eq!(w.leveling.xp_to_next_level, STARTING_XP_TO_NEXT_LEVEL);
    }

    #[test]
    fn test_ids_are_unique_and_lookup_skips_released() {
        let mut w = world();
        let a = w.spawn_enemy_at(0, Vec2::new(10.0, 10.0));
        let b = w.spawn_enemy_at(0, Vec2::new(20.0, 10.0));
        assert_ne!(a, b);
        assert_ne!(a, w.player.id);
        assert!(w.enemy(a).is_some());

        w.enemy_mut(a).unwrap().alive = false;
        assert!(w.enemy(a).is_none());
        assert!(w.enemy_mut(a).is_none());

        w.sweep();
        assert_eq!(w.enemies.len(), 1);
        assert_eq!(w.enemies[0].id, b);
    }

    #[test]
    fn test_player_damage_and_heal_clamp() {
        let mut p = Player::new(1, Vec2::ZERO, 15.0, 100.0, 200.0);
        assert!(!p.take_damage(30.0));
        p.heal(500.0);
        assert_eq!(p.hp, 100.0);
        p.increase_max_hp(20.0);
        assert_eq!(p.max_hp, 120.0);
        assert_eq!(p.hp, 120.0);
        assert!(p.take_damage(500.0));
        assert_eq!(p.hp, 0.0);
    }

    #[test]
    fn test_projectile_destroyed_once() {
        let mut w = world();
        let id = w.next_entity_id();
        let mut p = Projectile {
            id,
            item: 0,
            level: 1,
            pos: Vec2::ZERO,
            prev_pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            radius: 4.0,
            damage: 1.0,
            knockback: 0.0,
            bounces: 0,
            max_bounces: 1,
            poison: None,
            alive: true,
        };
        assert!(p.destroy());
        assert!(!p.destroy());
    }

    #[test]
    fn test_reset_restores_fresh_run() {
        let mut w = world();
        w.spawn_enemy_at(0, Vec2::ZERO);
        w.now = 5000.0;
        w.player.hp = 3.0;
        w.reset();
        assert_eq!(w.enemy_count(), 0);
        assert_eq!(w.now, 0.0);
        assert_eq!(w.player.hp, 100.0);
        assert_eq!(w.items.len(), 1);
    }

    #[test]
    fn test_events_serialize_with_type_tag() {
        let event = GameEvent::EnemyKilled {
            enemy_type: "slime".to_string(),
            position: Vec2::new(1.0, 2.0),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""type":"enemyKilled""#));
        assert!(json.contains(r#""enemyType":"slime""#));
    }
}
