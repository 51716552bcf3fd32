//! Poison damage-over-time
//!
//! The first stack starts the tick cadence and the expiry clock. Further
//! stacks raise the per-tick damage and push the expiry out without
//! touching the cadence, so ticks stay evenly spaced from the first
//! application.

use super::state::{Enemy, GameEvent, World};
use crate::config::PoisonParams;

/// Per-enemy poison state; zero stacks means not poisoned
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PoisonState {
    pub stacks: u32,
    pub damage_per_tick: f32,
    /// ms between ticks
    pub tick_interval: f64,
    /// Time of the last damage tick (or of the first application)
    pub last_tick: f64,
    /// Time the effect wears off
    pub expiry: f64,
}

impl PoisonState {
    pub fn is_active(&self) -> bool {
        self.stacks > 0
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Add one poison stack to `enemy` at time `now`
pub fn apply_poison(enemy: &mut Enemy, params: &PoisonParams, now: f64) {
    let poison = &mut enemy.poison;
    if !poison.is_active() {
        poison.last_tick = now;
        poison.damage_per_tick = params.damage_per_tick;
        poison.tick_interval = params.tick_interval;
    }
    poison.expiry = now + params.duration;
    poison.stacks = (poison.stacks + 1).min(params.max_stacks);
}

/// Deal any poison damage due at `now` and expire the effect.
/// Returns the damage dealt this call.
pub fn tick_poison(enemy: &mut Enemy, now: f64) -> f32 {
    let poison = &mut enemy.poison;
    if !poison.is_active() {
        return 0.0;
    }

    let mut dealt = 0.0;
    if poison.tick_interval > 0.0 && now - poison.last_tick >= poison.tick_interval {
        let due = ((now - poison.last_tick) / poison.tick_interval).floor();
        dealt = poison.damage_per_tick * poison.stacks as f32 * due as f32;
        poison.last_tick += due * poison.tick_interval;
        enemy.hp -= dealt;
    }

    if now >= enemy.poison.expiry {
        enemy.poison.clear();
    }
    dealt
}

/// Poison pass over all active enemies
pub fn tick_effects(world: &mut World) {
    let now = world.now;
    let mut damaged = Vec::new();
    for enemy in world.enemies.iter_mut().filter(|e| e.is_active() && e.poison.is_active()) {
        let dealt = tick_poison(enemy, now);
        if dealt > 0.0 {
            damaged.push(GameEvent::EnemyDamaged {
                enemy_id: enemy.id,
                damage: dealt,
                hp: enemy.hp,
                poison: true,
            });
        }
    }
    world.events.extend(damaged);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use glam::Vec2;
    use proptest::prelude::*;
    use std::sync::Arc;

    const PARAMS: PoisonParams = PoisonParams {
        damage_per_tick: 2.0,
        tick_interval: 500.0,
        duration: 3000.0,
        max_stacks: 3,
    };

    fn enemy() -> (World, u32) {
        let mut world = World::new(Arc::new(GameConfig::default()), 1);
        let id = world.spawn_enemy_at(0, Vec2::new(100.0, 100.0));
        (world, id)
    }

    #[test]
    fn test_stacks_cap_and_extend_expiry() {
        let (mut world, id) = enemy();
        let e = world.enemy_mut(id).unwrap();
        apply_poison(e, &PARAMS, 0.0);
        apply_poison(e, &PARAMS, 100.0);
        apply_poison(e, &PARAMS, 200.0);
        apply_poison(e, &PARAMS, 300.0);
        assert_eq!(e.poison.stacks, 3);
        assert_eq!(e.poison.expiry, 3300.0);
        // Cadence stays anchored at the first application
        assert_eq!(e.poison.last_tick, 0.0);
    }

    #[test]
    fn test_damage_scales_with_stacks() {
        let (mut world, id) = enemy();
        let e = world.enemy_mut(id).unwrap();
        let hp = e.hp;
        apply_poison(e, &PARAMS, 0.0);
        apply_poison(e, &PARAMS, 10.0);
        assert_eq!(tick_poison(e, 499.0), 0.0);
        assert_eq!(tick_poison(e, 500.0), 4.0);
        assert_eq!(e.hp, hp - 4.0);
        assert_eq!(e.poison.last_tick, 500.0);
    }

    #[test]
    fn test_ticks_stay_evenly_spaced() {
        let (mut world, id) = enemy();
        let e = world.enemy_mut(id).unwrap();
        apply_poison(e, &PARAMS, 0.0);
        // Frame times that don't line up with the interval
        tick_poison(e, 516.0);
        assert_eq!(e.poison.last_tick, 500.0);
        tick_poison(e, 1016.0);
        assert_eq!(e.poison.last_tick, 1000.0);
    }

    #[test]
    fn test_expires_and_clears() {
        let (mut world, id) = enemy();
        let e = world.enemy_mut(id).unwrap();
        apply_poison(e, &PARAMS, 0.0);
        tick_poison(e, 3000.0);
        assert!(!e.poison.is_active());
        assert_eq!(tick_poison(e, 3500.0), 0.0);

        // Fresh application after expiry restarts the cadence
        apply_poison(e, &PARAMS, 4000.0);
        assert_eq!(e.poison.stacks, 1);
        assert_eq!(e.poison.last_tick, 4000.0);
    }

    #[test]
    fn test_tick_effects_emits_damage_event() {
        let (mut world, id) = enemy();
        apply_poison(world.enemy_mut(id).unwrap(), &PARAMS, 0.0);
        world.events.clear();
        world.now = 500.0;
        tick_effects(&mut world);
        assert!(matches!(
            world.events.as_slice(),
            [GameEvent::EnemyDamaged { poison: true, damage, .. }] if *damage == 2.0
        ));
    }

    proptest! {
        #[test]
        fn prop_stacks_never_exceed_cap(
            max_stacks in 1u32..8,
            gaps in prop::collection::vec(0.0f64..400.0, 1..40),
        ) {
            let (mut world, id) = enemy();
            let params = PoisonParams { max_stacks, ..PARAMS };
            let e = world.enemy_mut(id).unwrap();
            let mut now = 0.0;
            for gap in gaps {
                now += gap;
                apply_poison(e, &params, now);
                tick_poison(e, now);
                prop_assert!(e.poison.stacks <= max_stacks);
            }
        }
    }
}
