//! Player items and shooting

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::state::{GameEvent, Projectile, World};
use crate::config::{GameConfig, ItemBehavior, ItemTypeDef};
use crate::consts::*;
use crate::{normalize_angle, polar_to_cartesian};

/// An owned item
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerItem {
    /// Index into `GameConfig::items`
    pub item: usize,
    pub level: u32,
    /// Time of the last shot (ms); never fired yet is negative infinity
    pub last_fire: f64,
}

impl PlayerItem {
    pub fn new(item: usize) -> Self {
        Self {
            item,
            level: 1,
            last_fire: f64::NEG_INFINITY,
        }
    }

    /// The items a fresh run starts with
    pub fn starting(config: &GameConfig) -> Vec<Self> {
        config.starting_item().map(Self::new).into_iter().collect()
    }
}

/// Projectile stats of an item at a given level
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectiveStats {
    pub damage: f32,
    pub speed: f32,
    pub max_bounces: u32,
    pub size: f32,
    pub knockback: f32,
    /// ms between shots
    pub fire_interval: f64,
}

/// Linear per-level stats; size and knockback don't level
pub fn item_stats(def: &ItemTypeDef, level: u32) -> EffectiveStats {
    let steps = level.saturating_sub(1);
    let base = &def.base_stats;
    let bonus = &def.level_up_bonus;
    let bounces = base.max_bounces as i64 + bonus.max_bounces as i64 * steps as i64;

    EffectiveStats {
        damage: base.damage + bonus.damage * steps as f32,
        speed: base.speed + bonus.speed * steps as f32,
        max_bounces: bounces.clamp(0, u32::MAX as i64) as u32,
        size: base.size,
        knockback: base.knockback,
        fire_interval: (base.fire_rate + bonus.fire_rate * steps as f64).max(MIN_FIRE_INTERVAL_MS),
    }
}

/// Base behavior with the `levelN` override for this level applied
pub fn item_behavior(def: &ItemTypeDef, level: u32) -> ItemBehavior {
    let mut behavior = def.behavior;
    if let Some(over) = def.level_up_behavior.get(&format!("level{level}")) {
        if let Some(n) = over.projectiles_per_shot {
            behavior.projectiles_per_shot = n;
        }
        if let Some(spread) = over.spread_angle {
            behavior.spread_angle = spread;
        }
    }
    behavior
}

/// Launch angles (radians) for a shot fanned across `spread_deg` degrees
pub fn spread_angles(aim: f32, count: u32, spread_deg: f32) -> Vec<f32> {
    match count {
        0 => return Vec::new(),
        1 => return vec![aim],
        _ => {}
    }
    let step = spread_deg / (count - 1) as f32;
    (0..count)
        .map(|i| normalize_angle(aim + (i as f32 * step - spread_deg / 2.0).to_radians()))
        .collect()
}

/// Shot request from the host
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShootRequest {
    pub origin: Vec2,
    /// Radians
    pub aim_angle: f32,
    /// World clock time of the request (ms)
    pub time: f64,
}

/// Fire every item whose interval has elapsed. Returns projectiles created.
pub fn handle_shoot(world: &mut World, request: &ShootRequest) -> usize {
    let mut fired = 0;
    for slot in 0..world.items.len() {
        let owned = &world.items[slot];
        let def = &world.config.items[owned.item];
        let stats = item_stats(def, owned.level);
        if request.time - owned.last_fire < stats.fire_interval {
            continue;
        }
        let behavior = item_behavior(def, owned.level);
        let (item, level, poison) = (owned.item, owned.level, def.poison);

        for angle in spread_angles(request.aim_angle, behavior.projectiles_per_shot, behavior.spread_angle) {
            let id = world.next_entity_id();
            world.projectiles.push(Projectile {
                id,
                item,
                level,
                pos: request.origin,
                prev_pos: request.origin,
                vel: polar_to_cartesian(stats.speed, angle),
                radius: stats.size,
                damage: stats.damage,
                knockback: stats.knockback,
                bounces: 0,
                max_bounces: stats.max_bounces,
                poison,
                alive: true,
            });
            fired += 1;
        }
        world.items[slot].last_fire = request.time;
    }
    fired
}

/// Give the player a new item at level 1; owned items are refused
pub fn add_item(world: &mut World, item: usize) -> bool {
    if item >= world.config.items.len() || world.items.iter().any(|i| i.item == item) {
        return false;
    }
    world.items.push(PlayerItem::new(item));
    log::info!("Unlocked item {}", world.config.items[item].id);
    let player_items = world.item_snapshot();
    world.emit(GameEvent::ItemsChanged { player_items });
    true
}

/// Raise an owned item one level, up to its max
pub fn level_up_item(world: &mut World, item: usize) -> bool {
    let max_level = match world.config.items.get(item) {
        Some(def) => def.max_level,
        None => return false,
    };
    let Some(owned) = world.items.iter_mut().find(|i| i.item == item) else {
        return false;
    };
    if owned.level >= max_level {
        return false;
    }
    owned.level += 1;
    let level = owned.level;
    log::info!("Item {} now level {level}", world.config.items[item].id);
    let player_items = world.item_snapshot();
    world.emit(GameEvent::ItemsChanged { player_items });
    true
}
