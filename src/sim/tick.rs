//! Fixed timestep simulation tick
//!
//! Stage order within a tick is fixed: steering, integration, collision,
//! effects, death, spawning, then XP/loot reactions.

use glam::Vec2;

use super::collision::{cull_out_of_bounds, resolve_player_contacts, resolve_projectile_hits};
use super::death::{advance_resurrections, process_deaths};
use super::effects::tick_effects;
use super::items::{ShootRequest, handle_shoot};
use super::leveling::{gain_xp, select_upgrade};
use super::loot::{try_drop_loot, update_loot};
use super::movement::{steer_enemies, steer_player};
use super::spawner::update_spawner;
use super::state::{GameEvent, GamePhase, World};

/// Host input for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Desired movement direction; zero stands still
    pub move_dir: Vec2,
    /// Fire owned items
    pub shoot: Option<ShootRequest>,
    /// Resolve the pending level-up choice
    pub upgrade_selected: Option<usize>,
}

/// Position integration, supplied by the host's physics
pub trait Integrator {
    /// Record previous positions, then advance bodies by `dt` seconds
    fn integrate(&mut self, world: &mut World, dt: f32);
}

/// Plain `pos += vel * dt`, with the player kept inside the map
#[derive(Debug, Clone, Copy, Default)]
pub struct EulerIntegrator;

impl Integrator for EulerIntegrator {
    fn integrate(&mut self, world: &mut World, dt: f32) {
        let tuning = &world.config.tuning;
        let player = &mut world.player;
        player.prev_pos = player.pos;
        let r = player.radius;
        player.pos = (player.pos + player.vel * dt).clamp(
            Vec2::splat(r),
            Vec2::new(tuning.map_width - r, tuning.map_height - r),
        );

        for enemy in world.enemies.iter_mut().filter(|e| e.alive) {
            enemy.prev_pos = enemy.pos;
            enemy.pos += enemy.vel * dt;
        }
        for proj in world.projectiles.iter_mut().filter(|p| p.alive) {
            proj.prev_pos = proj.pos;
            proj.pos += proj.vel * dt;
        }
        for chest in world.chests.iter_mut().filter(|c| !c.collected) {
            chest.pos += chest.vel * dt;
        }
    }
}

/// Advance the world by one timestep of `dt` seconds
pub fn tick(world: &mut World, input: &TickInput, dt: f32, integrator: &mut impl Integrator) {
    if let Some(index) = input.upgrade_selected {
        select_upgrade(world, index);
    }

    // Enemies and projectiles are frozen while a choice is pending
    match world.phase {
        GamePhase::ChoicePending | GamePhase::GameOver => return,
        GamePhase::Playing => {}
    }

    world.now += dt as f64 * 1000.0;
    let first_event = world.events.len();

    if let Some(request) = &input.shoot {
        handle_shoot(world, request);
    }

    steer_player(world, input.move_dir, dt);
    steer_enemies(world, dt);

    integrator.integrate(world, dt);

    resolve_projectile_hits(world);
    resolve_player_contacts(world);
    cull_out_of_bounds(world);

    tick_effects(world);

    advance_resurrections(world);
    process_deaths(world);

    update_spawner(world);

    react_to_kills(world, first_event);
    update_loot(world);

    world.sweep();
    world.normalize_order();
}

/// Award XP and roll loot for every kill reported this tick
fn react_to_kills(world: &mut World, first_event: usize) {
    let kills: Vec<Vec2> = world.events[first_event..]
        .iter()
        .filter_map(|e| match e {
            GameEvent::EnemyKilled { position, .. } => Some(*position),
            _ => None,
        })
        .collect();

    let xp_per_kill = world.config.tuning.xp_per_kill;
    for position in kills {
        gain_xp(world, xp_per_kill);
        try_drop_loot(world, position);
    }
}
