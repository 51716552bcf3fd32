//! Enemy death handling
//!
//! Runs after damage for the tick has been applied. Plain enemies are
//! finalized right away; splitting and resurrecting types branch first.

use std::sync::Arc;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::state::{EntityId, GameEvent, World};
use crate::config::SpecialDeath;
use crate::consts::*;

/// Steps of the get-up sequence, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResurrectionPhase {
    /// Corpse lying on the ground
    Remains,
    /// Remains start to tremble
    Shaking,
    /// Bright flash just before the enemy stands up
    Flash,
}

impl ResurrectionPhase {
    fn duration(self) -> f64 {
        match self {
            Self::Remains => REMAINS_MS,
            Self::Shaking => SHAKE_MS,
            Self::Flash => FLASH_MS,
        }
    }
}

/// In-flight resurrection of a hidden enemy
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resurrection {
    pub phase: ResurrectionPhase,
    /// When the current phase ends (ms)
    pub deadline: f64,
    /// Where the enemy died and will stand up again
    pub position: Vec2,
}

/// Remove an enemy for good, reporting a kill. Returns false if it was
/// already gone.
pub fn finalize(world: &mut World, id: EntityId) -> bool {
    let config = Arc::clone(&world.config);
    let Some(enemy) = world.enemy_mut(id) else {
        return false;
    };
    enemy.poison.clear();
    enemy.alive = false;
    enemy.visible = false;
    enemy.collidable = false;
    enemy.resurrection = None;
    let event = GameEvent::EnemyKilled {
        enemy_type: config.enemy_types[enemy.kind].id.clone(),
        position: enemy.pos,
    };
    world.emit(event);
    true
}

/// Dispatch every enemy whose HP reached zero this tick
pub fn process_deaths(world: &mut World) {
    for id in world.enemy_ids_where(|e| e.is_dying()) {
        handle_death(world, id);
    }
}

/// Apply the death behavior of enemy `id`'s type
pub fn handle_death(world: &mut World, id: EntityId) {
    let Some(enemy) = world.enemy(id) else {
        return;
    };
    let special = world.config.enemy_types[enemy.kind].special_death;
    match special {
        Some(SpecialDeath::Split) => split(world, id),
        Some(SpecialDeath::Resurrect) => resurrect_or_finalize(world, id),
        None => {
            finalize(world, id);
        }
    }
}

/// Replace the enemy with two weaker, smaller copies, unless they would be
/// too weak to matter
fn split(world: &mut World, id: EntityId) {
    let Some(parent) = world.enemy(id) else {
        return;
    };
    let child_hp = (parent.max_hp / 2.0).floor();
    let child_size = (parent.radius / SPLIT_SIZE_DIVISOR).floor().max(1.0);
    let (kind, pos, parent_max) = (parent.kind, parent.pos, parent.max_hp);

    if child_hp >= SPLIT_MIN_HP {
        // Max HP strictly halves each generation, so splitting terminates
        assert!(child_hp < parent_max, "split children must be weaker than the parent");
        for side in [-1.0, 1.0] {
            let child_id = world.spawn_enemy_at(kind, pos + Vec2::new(side * SPLIT_OFFSET, 0.0));
            if let Some(child) = world.enemy_mut(child_id) {
                child.hp = child_hp;
                child.max_hp = child_hp;
                child.radius = child_size;
            }
        }
        log::debug!("Enemy {id} split into two with {child_hp} hp");
    }
    finalize(world, id);
}

/// Hide the enemy and start the get-up sequence, or finalize it on its last
/// allowed death
fn resurrect_or_finalize(world: &mut World, id: EntityId) {
    let now = world.now;
    let Some(enemy) = world.enemy_mut(id) else {
        return;
    };
    enemy.death_count += 1;
    assert!(enemy.death_count <= RESURRECT_MAX_DEATHS, "enemy {id} died past its resurrection limit");
    if enemy.death_count >= RESURRECT_MAX_DEATHS {
        finalize(world, id);
        return;
    }

    enemy.poison.clear();
    enemy.visible = false;
    enemy.collidable = false;
    enemy.vel = Vec2::ZERO;
    enemy.knockback = Vec2::ZERO;
    let position = enemy.pos;
    enemy.resurrection = Some(Resurrection {
        phase: ResurrectionPhase::Remains,
        deadline: now + REMAINS_MS,
        position,
    });
    let deaths = enemy.death_count;
    world.emit(GameEvent::EnemyResurrecting {
        enemy_id: id,
        phase: ResurrectionPhase::Remains,
        position,
    });
    log::debug!("Enemy {id} down ({deaths}/{RESURRECT_MAX_DEATHS}), resurrecting");
}

/// Advance every in-flight resurrection. Released enemies are simply not
/// visited, which cancels their sequence.
pub fn advance_resurrections(world: &mut World) {
    let now = world.now;
    let mut events = Vec::new();

    for enemy in world.enemies.iter_mut().filter(|e| e.alive) {
        while let Some(res) = enemy.resurrection.as_mut() {
            if now < res.deadline {
                break;
            }
            let next = match res.phase {
                ResurrectionPhase::Remains => Some(ResurrectionPhase::Shaking),
                ResurrectionPhase::Shaking => Some(ResurrectionPhase::Flash),
                ResurrectionPhase::Flash => None,
            };
            match next {
                Some(phase) => {
                    res.phase = phase;
                    res.deadline += phase.duration();
                    events.push(GameEvent::EnemyResurrecting {
                        enemy_id: enemy.id,
                        phase,
                        position: res.position,
                    });
                }
                None => {
                    let position = res.position;
                    enemy.resurrection = None;
                    enemy.hp = enemy.max_hp;
                    enemy.pos = position;
                    enemy.prev_pos = position;
                    enemy.visible = true;
                    enemy.collidable = true;
                    events.push(GameEvent::EnemyRevived {
                        enemy_id: enemy.id,
                        deaths: enemy.death_count,
                        position,
                    });
                }
            }
        }
    }
    world.events.extend(events);
}
