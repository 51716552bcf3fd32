//! Enemy steering
//!
//! Each enemy's pattern produces a desired velocity toward (or around) the
//! player; the decaying knockback vector is added on top.

use std::f32::consts::TAU;
use std::sync::Arc;

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::state::World;
use crate::config::MovementPattern;
use crate::consts::*;
use crate::{polar_to_cartesian, unit_or_none};

/// Per-enemy runtime movement state
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AiState {
    Chase,
    Sine { phase_offset: f32 },
    Wander { heading: f32, last_change: f64 },
}

impl AiState {
    pub fn for_pattern(pattern: &MovementPattern, now: f64, rng: &mut Pcg32) -> Self {
        match pattern {
            MovementPattern::DirectChase => Self::Chase,
            MovementPattern::SinusoidalChase { .. } => Self::Sine {
                phase_offset: rng.random_range(0.0..TAU),
            },
            MovementPattern::RandomWander { .. } => Self::Wander {
                heading: rng.random_range(0.0..TAU),
                last_change: now,
            },
        }
    }
}

/// Desired velocity for one enemy, or `None` when it sits on the player
pub fn desired_velocity(
    pattern: &MovementPattern,
    ai: &mut AiState,
    pos: Vec2,
    target: Vec2,
    speed: f32,
    now: f64,
    rng: &mut Pcg32,
) -> Option<Vec2> {
    match (pattern, ai) {
        (MovementPattern::RandomWander { direction_change_interval }, AiState::Wander { heading, last_change }) => {
            if now - *last_change >= *direction_change_interval {
                *heading = rng.random_range(0.0..TAU);
                *last_change = now;
            }
            Some(polar_to_cartesian(speed, *heading))
        }
        (MovementPattern::SinusoidalChase { amplitude, frequency }, AiState::Sine { phase_offset }) => {
            let dir = unit_or_none(target - pos)?;
            let perp = Vec2::new(-dir.y, dir.x);
            let phase = (now / 1000.0) as f32 * SINE_TIME_SCALE * *frequency + *phase_offset;
            Some(dir * speed + perp * (phase.sin() * *amplitude))
        }
        _ => unit_or_none(target - pos).map(|dir| dir * speed),
    }
}

/// Steering pass: set velocities, decay knockback, update facing
pub fn steer_enemies(world: &mut World, dt: f32) {
    let config = Arc::clone(&world.config);
    let target = world.player.pos;
    let now = world.now;
    let retained = KNOCKBACK_RETAINED_PER_SEC.powf(dt);

    for enemy in world.enemies.iter_mut().filter(|e| e.is_active()) {
        let pattern = &config.enemy_types[enemy.kind].behavior;
        let desired = desired_velocity(pattern, &mut enemy.ai, enemy.pos, target, enemy.speed, now, &mut world.rng);

        if let Some(desired) = desired {
            enemy.vel = desired + enemy.knockback;
        }
        enemy.knockback *= retained;

        if enemy.vel.x.abs() > FACING_THRESHOLD {
            enemy.facing_left = enemy.vel.x < 0.0;
        }
    }
}

/// Player velocity from a movement direction (need not be normalized)
pub fn steer_player(world: &mut World, move_dir: Vec2, dt: f32) {
    let player = &mut world.player;
    let input = unit_or_none(move_dir).map_or(Vec2::ZERO, |d| d * player.move_speed);
    player.vel = input + player.knockback;
    player.knockback *= KNOCKBACK_RETAINED_PER_SEC.powf(dt);
}
