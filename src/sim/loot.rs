//! Loot chests dropped by killed enemies

use glam::Vec2;
use rand::Rng;

use super::leveling::gain_xp;
use super::state::{EntityId, GameEvent, World};
use crate::unit_or_none;

/// Base pull speed of a magnetized chest
const MAGNET_BASE_SPEED: f32 = 150.0;
/// Extra pull speed per unit of distance inside the magnet range
const MAGNET_SPEED_PER_UNIT: f32 = 2.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Chest {
    pub id: EntityId,
    pub pos: Vec2,
    pub vel: Vec2,
    /// Latched once the player comes within magnet range
    pub being_collected: bool,
    pub collected: bool,
}

/// Roll the drop chance and maybe leave a chest at `position`
pub fn try_drop_loot(world: &mut World, position: Vec2) -> Option<EntityId> {
    let chance = world.config.tuning.loot_drop_chance;
    if world.rng.random::<f32>() >= chance {
        return None;
    }
    let id = world.next_entity_id();
    world.chests.push(Chest {
        id,
        pos: position,
        vel: Vec2::ZERO,
        being_collected: false,
        collected: false,
    });
    world.emit(GameEvent::ChestDropped { chest_id: id, position });
    Some(id)
}

/// Magnet chests toward the player and collect those in reach
pub fn update_loot(world: &mut World) {
    let tuning = &world.config.tuning;
    let (range, pickup, bonus) = (tuning.magnet_range, tuning.pickup_radius, tuning.chest_bonus_xp);
    let player = world.player.pos;

    let mut collected = 0;
    for chest in world.chests.iter_mut().filter(|c| !c.collected) {
        let to_player = player - chest.pos;
        let dist = to_player.length();

        if dist < pickup {
            chest.collected = true;
            chest.vel = Vec2::ZERO;
            collected += 1;
            continue;
        }
        if dist < range {
            chest.being_collected = true;
        }
        chest.vel = match (chest.being_collected, unit_or_none(to_player)) {
            (true, Some(dir)) => {
                let speed = MAGNET_BASE_SPEED + MAGNET_SPEED_PER_UNIT * (range - dist).max(0.0);
                dir * speed
            }
            _ => Vec2::ZERO,
        };
    }

    for _ in 0..collected {
        world.emit(GameEvent::ChestCollected { bonus_xp: bonus });
        gain_xp(world, bonus);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use std::sync::Arc;

    fn world_with_chance(chance: f32) -> World {
        let mut config = GameConfig::default();
        config.tuning.loot_drop_chance = chance;
        World::new(Arc::new(config), 8)
    }

    #[test]
    fn test_drop_chance_extremes() {
        let mut always = world_with_chance(1.0);
        assert!(try_drop_loot(&mut always, Vec2::ZERO).is_some());
        let mut never = world_with_chance(0.0);
        for _ in 0..100 {
            assert!(try_drop_loot(&mut never, Vec2::ZERO).is_none());
        }
    }

    #[test]
    fn test_magnet_latches_and_pulls() {
        let mut w = world_with_chance(1.0);
        let player = w.player.pos;
        try_drop_loot(&mut w, player + Vec2::new(80.0, 0.0));
        update_loot(&mut w);
        let chest = &w.chests[0];
        assert!(chest.being_collected);
        // 150 + 2 * (100 - 80)
        assert!((chest.vel - Vec2::new(-190.0, 0.0)).length() < 1e-3);

        // Stays latched after the player walks away
        w.player.pos += Vec2::new(-500.0, 0.0);
        update_loot(&mut w);
        assert!(w.chests[0].being_collected);
        assert!(w.chests[0].vel.x < -149.0);
    }

    #[test]
    fn test_far_chest_stays_put() {
        let mut w = world_with_chance(1.0);
        let player = w.player.pos;
        try_drop_loot(&mut w, player + Vec2::new(300.0, 0.0));
        update_loot(&mut w);
        assert!(!w.chests[0].being_collected);
        assert_eq!(w.chests[0].vel, Vec2::ZERO);
    }

    #[test]
    fn test_pickup_grants_xp_once() {
        let mut w = world_with_chance(1.0);
        let player = w.player.pos;
        try_drop_loot(&mut w, player + Vec2::new(5.0, 0.0));
        update_loot(&mut w);
        update_loot(&mut w);
        assert_eq!(w.leveling.xp, 50);
        let collected = w
            .events
            .iter()
            .filter(|e| matches!(e, GameEvent::ChestCollected { bonus_xp: 50 }))
            .count();
        assert_eq!(collected, 1);
        w.sweep();
        assert!(w.chests.is_empty());
    }
}
