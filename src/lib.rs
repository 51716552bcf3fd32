//! Bounce Survivor - combat simulation core for a top-down survival shooter
//!
//! Core modules:
//! - `sim`: Deterministic simulation (swept collisions, damage, AI, death, leveling)
//! - `config`: Data-driven enemy and item tables

pub mod config;
pub mod sim;

pub use config::{ConfigError, GameConfig, SimTuning};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;

    /// Map dimensions
    pub const MAP_WIDTH: f32 = 1024.0;
    pub const MAP_HEIGHT: f32 = 1024.0;

    /// Player defaults
    pub const PLAYER_RADIUS: f32 = 15.0;
    pub const PLAYER_MAX_HP: f32 = 100.0;
    pub const PLAYER_MOVE_SPEED: f32 = 200.0;
    /// Impulse applied to the player when an enemy touches them
    pub const PLAYER_CONTACT_KNOCKBACK: f32 = 200.0;

    /// Projectiles that moved less than this in a tick skip the swept test
    pub const MOVE_EPSILON: f32 = 0.01;
    /// Horizontal speed below which facing is left alone (prevents flicker)
    pub const FACING_THRESHOLD: f32 = 1.0;
    /// Knockback left after one second (exponential decay)
    pub const KNOCKBACK_RETAINED_PER_SEC: f32 = 0.02;
    /// Knockback used when an item doesn't specify one
    pub const DEFAULT_KNOCKBACK: f32 = 100.0;

    /// Split deaths: children below this HP are never spawned
    pub const SPLIT_MIN_HP: f32 = 10.0;
    pub const SPLIT_SIZE_DIVISOR: f32 = 1.25;
    /// Children are placed this far either side of the parent
    pub const SPLIT_OFFSET: f32 = 12.0;

    /// Resurrecting enemies die for good on this death
    pub const RESURRECT_MAX_DEATHS: u32 = 3;
    /// Resurrection sequence phase lengths (ms)
    pub const REMAINS_MS: f64 = 1500.0;
    pub const SHAKE_MS: f64 = 800.0;
    pub const FLASH_MS: f64 = 150.0;

    /// Sinusoidal chase: phase advance per second of sim time (0.1 per frame at 60 fps)
    pub const SINE_TIME_SCALE: f32 = 6.0;

    /// Leveling
    pub const STARTING_XP_TO_NEXT_LEVEL: u32 = 100;
    pub const XP_GROWTH: f64 = 1.5;
    pub const UPGRADE_CHOICES: usize = 3;

    /// Minimum fire interval for any item (ms)
    pub const MIN_FIRE_INTERVAL_MS: f64 = 100.0;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}

/// Unit vector of `v`, or `None` when `v` is too short to normalize safely
#[inline]
pub fn unit_or_none(v: Vec2) -> Option<Vec2> {
    let len = v.length();
    if len > 1e-4 && len.is_finite() {
        Some(v / len)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn test_normalize_angle_wraps() {
        assert!((normalize_angle(2.5 * PI) - 0.5 * PI).abs() < 1e-5);
        assert!((normalize_angle(-1.5 * PI) - 0.5 * PI).abs() < 1e-5);
        assert!((normalize_angle(-PI / 2.0) + PI / 2.0).abs() < 1e-5);
        // Near the seam only the direction is stable
        let a = normalize_angle(3.0 * PI);
        assert!((-PI..=PI).contains(&a));
        assert!((a.cos() + 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_unit_or_none_guards_zero() {
        assert!(unit_or_none(Vec2::ZERO).is_none());
        assert!(unit_or_none(Vec2::new(1e-6, 0.0)).is_none());
        let u = unit_or_none(Vec2::new(3.0, 4.0)).unwrap();
        assert!((u.length() - 1.0).abs() < 1e-5);
    }
}
