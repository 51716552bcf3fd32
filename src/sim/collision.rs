//! Collision resolution
//!
//! Projectiles are tested against enemies with a swept circle-circle test so
//! fast balls can't tunnel through small targets. Each projectile resolves at
//! most one impact per tick: the globally earliest one along its path.

use std::collections::HashMap;
use std::sync::Arc;

use glam::Vec2;

use super::death;
use super::effects::apply_poison;
use super::geometry::{circles_overlap, point_at, swept_circle_circle};
use super::state::{EntityId, GameEvent, GamePhase, World};
use crate::consts::*;
use crate::unit_or_none;

/// Last-hit times per (projectile, enemy) pair
#[derive(Debug, Clone, Default)]
pub struct HitCooldowns {
    last_hit: HashMap<(EntityId, EntityId), f64>,
}

impl HitCooldowns {
    pub fn is_cooling(&self, projectile: EntityId, enemy: EntityId, now: f64, window: f64) -> bool {
        self.last_hit
            .get(&(projectile, enemy))
            .is_some_and(|&t| now - t < window)
    }

    pub fn record(&mut self, projectile: EntityId, enemy: EntityId, now: f64) {
        self.last_hit.insert((projectile, enemy), now);
    }

    /// Forget entries older than `max_age`
    pub fn prune(&mut self, now: f64, max_age: f64) {
        self.last_hit.retain(|_, &mut t| now - t <= max_age);
    }

    pub fn forget_projectile(&mut self, projectile: EntityId) {
        self.last_hit.retain(|&(p, _), _| p != projectile);
    }

    pub fn len(&self) -> usize {
        self.last_hit.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_hit.is_empty()
    }
}

/// Earliest enemy hit along projectile `index`'s path this tick
fn earliest_hit(world: &World, index: usize) -> Option<(usize, f32)> {
    let proj = &world.projectiles[index];
    let window = world.config.tuning.hit_cooldown_ms;
    let mut best: Option<(usize, f32)> = None;

    for (i, enemy) in world.enemies.iter().enumerate() {
        if !enemy.is_active() || enemy.hp <= 0.0 {
            continue;
        }
        if world.hit_cooldowns.is_cooling(proj.id, enemy.id, world.now, window) {
            continue;
        }
        let Some(t) = swept_circle_circle(proj.prev_pos, proj.pos, proj.radius, enemy.pos, enemy.radius) else {
            continue;
        };
        if best.is_none_or(|(_, bt)| t < bt) {
            best = Some((i, t));
        }
    }
    best
}

/// Resolve projectile-vs-enemy impacts for every live projectile
pub fn resolve_projectile_hits(world: &mut World) {
    let now = world.now;
    let prune_age = world.config.tuning.cooldown_prune_ms;
    world.hit_cooldowns.prune(now, prune_age);

    for pi in 0..world.projectiles.len() {
        let proj = &world.projectiles[pi];
        if !proj.alive || proj.pos.distance(proj.prev_pos) <= MOVE_EPSILON {
            continue;
        }
        if let Some((ei, t)) = earliest_hit(world, pi) {
            apply_hit(world, pi, ei, t);
        }
    }
}

fn apply_hit(world: &mut World, pi: usize, ei: usize, t: f32) {
    let now = world.now;
    let proj = &mut world.projectiles[pi];
    let enemy = &mut world.enemies[ei];

    let impact = point_at(proj.prev_pos, proj.pos, t);
    proj.pos = impact;

    enemy.hp -= proj.damage;
    let push = unit_or_none(enemy.pos - impact).or_else(|| unit_or_none(proj.vel));
    if let Some(dir) = push {
        enemy.knockback += dir * proj.knockback;
    }
    if let Some(params) = &proj.poison {
        apply_poison(enemy, params, now);
    }

    let event = GameEvent::EnemyDamaged {
        enemy_id: enemy.id,
        damage: proj.damage,
        hp: enemy.hp,
        poison: false,
    };
    let (proj_id, enemy_id) = (proj.id, enemy.id);

    proj.bounces += 1;
    if proj.bounces >= proj.max_bounces {
        proj.destroy();
        world.hit_cooldowns.forget_projectile(proj_id);
    } else {
        let speed = proj.vel.length();
        proj.vel = match unit_or_none(impact - enemy.pos) {
            Some(away) => away * speed,
            None => -proj.vel,
        };
        world.hit_cooldowns.record(proj_id, enemy_id, now);
    }
    world.emit(event);
}

/// Resolve player-vs-enemy contacts
///
/// A touching enemy hurts and shoves the player, then is removed as a normal
/// kill (no split or resurrection).
pub fn resolve_player_contacts(world: &mut World) {
    if world.phase == GamePhase::GameOver {
        return;
    }
    let moved = world.player.moved();
    let touching: Vec<EntityId> = world
        .enemies
        .iter()
        .filter(|e| e.is_active() && e.hp > 0.0)
        .filter(|e| {
            let p = &world.player;
            if moved {
                swept_circle_circle(p.prev_pos, p.pos, p.radius, e.pos, e.radius).is_some()
            } else {
                circles_overlap(p.pos, p.radius, e.pos, e.radius)
            }
        })
        .map(|e| e.id)
        .collect();

    for id in touching {
        let Some(enemy) = world.enemy(id) else {
            continue;
        };
        let (damage, enemy_pos) = (enemy.damage, enemy.pos);

        let player = &mut world.player;
        let died = player.take_damage(damage);
        if let Some(away) = unit_or_none(player.pos - enemy_pos) {
            player.knockback += away * PLAYER_CONTACT_KNOCKBACK;
        }
        let (current_hp, max_hp) = (player.hp, player.max_hp);
        world.emit(GameEvent::PlayerDamaged { current_hp, max_hp });

        if died {
            world.phase = GamePhase::GameOver;
            world.emit(GameEvent::PlayerDied);
            log::info!("Player died at t={:.0}ms, level {}", world.now, world.leveling.level);
            return;
        }
        death::finalize(world, id);
    }
}

/// Remove projectiles and enemies that left the map by more than the cleanup
/// margin. Nothing is awarded for these.
pub fn cull_out_of_bounds(world: &mut World) {
    let tuning = &world.config.tuning;
    let (w, h) = (tuning.map_width, tuning.map_height);
    let outside = |p: Vec2, margin: f32| p.x < -margin || p.x > w + margin || p.y < -margin || p.y > h + margin;
    let (enemy_margin, projectile_margin) = (tuning.cleanup_margin, tuning.projectile_cleanup_margin);

    let mut culled = Vec::new();
    for proj in world.projectiles.iter_mut().filter(|p| p.alive) {
        if outside(proj.pos, projectile_margin) && proj.destroy() {
            culled.push(proj.id);
        }
    }
    for id in culled {
        world.hit_cooldowns.forget_projectile(id);
    }

    // Dying enemies stay for the death pass so their kill still counts
    let config = Arc::clone(&world.config);
    for enemy in world.enemies.iter_mut().filter(|e| e.alive && e.hp > 0.0) {
        if outside(enemy.pos, enemy_margin) {
            log::debug!("Enemy {} ({}) left the map", enemy.id, config.enemy_types[enemy.kind].id);
            enemy.alive = false;
        }
    }
}
