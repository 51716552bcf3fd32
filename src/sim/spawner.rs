//! Enemy spawning and difficulty ramp

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::state::{EntityId, World};
use crate::config::{EnemyTypeDef, SimTuning};

/// Spawn timer and difficulty progression
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnerState {
    /// Current time between spawns (ms)
    pub interval: f64,
    pub last_spawn: f64,
    /// Added to every new enemy's base speed
    pub speed_bonus: f32,
    pub last_difficulty_step: f64,
    pub difficulty_level: u32,
}

impl SpawnerState {
    pub fn new(tuning: &SimTuning) -> Self {
        Self {
            interval: tuning.spawn_interval_ms,
            last_spawn: 0.0,
            speed_bonus: 0.0,
            last_difficulty_step: 0.0,
            difficulty_level: 0,
        }
    }

    /// Shorter spawn interval (down to the floor) and faster enemies
    pub fn increase_difficulty(&mut self, tuning: &SimTuning) {
        self.interval = (self.interval - tuning.spawn_interval_step_ms).max(tuning.min_spawn_interval_ms);
        self.speed_bonus += tuning.speed_step;
        self.difficulty_level += 1;
    }
}

/// Weighted random pick of an enemy type index.
///
/// Falls back to the first type when the weights are unusable or the walk
/// overshoots through rounding.
pub fn select_enemy_type(types: &[EnemyTypeDef], rng: &mut Pcg32) -> usize {
    let total: f32 = types.iter().map(|t| t.spawn_weight).sum();
    if !(total.is_finite() && total > 0.0) {
        return 0;
    }

    let mut u = rng.random_range(0.0..total);
    for (i, def) in types.iter().enumerate() {
        u -= def.spawn_weight;
        if u <= 0.0 {
            return i;
        }
    }
    0
}

/// Random point just outside one of the four map edges
pub fn edge_position(tuning: &SimTuning, rng: &mut Pcg32) -> Vec2 {
    let (w, h, off) = (tuning.map_width, tuning.map_height, tuning.spawn_edge_offset);
    match rng.random_range(0..4u8) {
        0 => Vec2::new(rng.random_range(0.0..=w), -off),
        1 => Vec2::new(w + off, rng.random_range(0.0..=h)),
        2 => Vec2::new(rng.random_range(0.0..=w), h + off),
        _ => Vec2::new(-off, rng.random_range(0.0..=h)),
    }
}

/// Spawn one enemy of a weighted-random type at a random edge
pub fn spawn_enemy(world: &mut World) -> EntityId {
    let kind = select_enemy_type(&world.config.enemy_types, &mut world.rng);
    let pos = edge_position(&world.config.tuning, &mut world.rng);
    let id = world.spawn_enemy_at(kind, pos);
    log::debug!("Spawned {} #{id} at ({:.0}, {:.0})", world.config.enemy_types[kind].id, pos.x, pos.y);
    id
}

/// Spawn on the interval timer and ramp difficulty
pub fn update_spawner(world: &mut World) {
    let now = world.now;
    let tuning = world.config.tuning.clone();

    if now - world.spawner.last_difficulty_step >= tuning.difficulty_interval_ms {
        world.spawner.last_difficulty_step = now;
        world.spawner.increase_difficulty(&tuning);
        log::info!(
            "Difficulty {}: spawn every {:.0}ms, speed +{}",
            world.spawner.difficulty_level,
            world.spawner.interval,
            world.spawner.speed_bonus
        );
    }

    if now - world.spawner.last_spawn >= world.spawner.interval {
        world.spawner.last_spawn = now;
        spawn_enemy(world);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use rand::SeedableRng;
    use std::sync::Arc;

    fn typed(id: &str, weight: f32) -> EnemyTypeDef {
        EnemyTypeDef {
            id: id.to_string(),
            spawn_weight: weight,
            ..EnemyTypeDef::fallback()
        }
    }

    #[test]
    fn test_weighted_selection_converges() {
        let types = vec![typed("a", 5.0), typed("b", 3.0), typed("c", 2.0)];
        let mut rng = Pcg32::seed_from_u64(1234);
        let mut counts = [0usize; 3];
        let n = 100_000;
        for _ in 0..n {
            counts[select_enemy_type(&types, &mut rng)] += 1;
        }
        for (count, expected) in counts.iter().zip([0.5, 0.3, 0.2]) {
            let ratio = *count as f64 / n as f64;
            assert!((ratio - expected).abs() < 0.01, "ratio {ratio} vs {expected}");
        }
    }

    #[test]
    fn test_zero_weight_never_chosen() {
        let types = vec![typed("a", 0.0), typed("b", 1.0)];
        let mut rng = Pcg32::seed_from_u64(5);
        for _ in 0..1000 {
            assert_eq!(select_enemy_type(&types, &mut rng), 1);
        }
    }

    #[test]
    fn test_unusable_weights_fall_back_to_first() {
        let types = vec![typed("a", 0.0), typed("b", 0.0)];
        let mut rng = Pcg32::seed_from_u64(5);
        assert_eq!(select_enemy_type(&types, &mut rng), 0);
    }

    #[test]
    fn test_edge_positions_sit_outside_map() {
        let tuning = SimTuning::default();
        let mut rng = Pcg32::seed_from_u64(77);
        for _ in 0..500 {
            let p = edge_position(&tuning, &mut rng);
            let outside_x = p.x == -20.0 || p.x == 1044.0;
            let outside_y = p.y == -20.0 || p.y == 1044.0;
            assert!(outside_x ^ outside_y, "{p:?}");
            assert!((-20.0..=1044.0).contains(&p.x));
            assert!((-20.0..=1044.0).contains(&p.y));
        }
    }

    #[test]
    fn test_spawns_on_interval() {
        let mut w = World::new(Arc::new(GameConfig::default()), 3);
        w.now = 1999.0;
        update_spawner(&mut w);
        assert_eq!(w.enemy_count(), 0);
        w.now = 2000.0;
        update_spawner(&mut w);
        assert_eq!(w.enemy_count(), 1);
        w.now = 3000.0;
        update_spawner(&mut w);
        assert_eq!(w.enemy_count(), 1);
    }

    #[test]
    fn test_difficulty_ramp() {
        let tuning = SimTuning::default();
        let mut s = SpawnerState::new(&tuning);
        for _ in 0..100 {
            s.increase_difficulty(&tuning);
        }
        assert_eq!(s.interval, 500.0);
        assert_eq!(s.speed_bonus, 1000.0);

        let mut w = World::new(Arc::new(GameConfig::default()), 3);
        w.now = 30_000.0;
        update_spawner(&mut w);
        assert_eq!(w.spawner.interval, 1900.0);
        let e = &w.enemies[0];
        assert_eq!(e.speed, 60.0);
    }
}
