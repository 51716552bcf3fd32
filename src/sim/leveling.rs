//! XP, levels and upgrade choices
//!
//! Each level gained queues one pending choice. While any choice is pending
//! the world sits in [`GamePhase::ChoicePending`] with up to three options on
//! offer; the host resolves them one at a time with [`select_upgrade`].

use rand::seq::SliceRandom;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::items::{PlayerItem, add_item, level_up_item};
use super::state::{GameEvent, GamePhase, World};
use crate::config::GameConfig;
use crate::consts::*;

const MOVE_SPEED_MULTIPLIER: f32 = 1.2;
const MAX_HP_BONUS: f32 = 20.0;
const HEAL_AMOUNT: f32 = 30.0;

/// Generic stat upgrades always in the pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StatBoost {
    MoveSpeed,
    MaxHp,
    Heal,
}

/// One entry on the level-up menu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum UpgradeOption {
    NewItem { item: usize },
    LevelUpItem { item: usize, next_level: u32 },
    Stat { stat: StatBoost },
}

impl UpgradeOption {
    /// Short label for menus and logs
    pub fn label(&self, config: &GameConfig) -> String {
        match self {
            Self::NewItem { item } => format!("New: {}", config.items[*item].name),
            Self::LevelUpItem { item, next_level } => {
                format!("{} Lv{next_level}", config.items[*item].name)
            }
            Self::Stat { stat: StatBoost::MoveSpeed } => "Move speed +20%".to_string(),
            Self::Stat { stat: StatBoost::MaxHp } => format!("Max HP +{MAX_HP_BONUS}"),
            Self::Stat { stat: StatBoost::Heal } => format!("Heal {HEAL_AMOUNT}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Leveling {
    pub level: u32,
    /// XP carried toward the next level
    pub xp: u32,
    pub xp_to_next_level: u32,
    /// Level-ups not yet resolved
    pub pending_choices: u32,
    /// Options currently on offer
    pub options: Vec<UpgradeOption>,
}

impl Default for Leveling {
    fn default() -> Self {
        Self {
            level: 1,
            xp: 0,
            xp_to_next_level: STARTING_XP_TO_NEXT_LEVEL,
            pending_choices: 0,
            options: Vec::new(),
        }
    }
}

impl Leveling {
    /// Add XP and roll over thresholds. Returns the number of levels gained.
    pub fn add_xp(&mut self, amount: u32) -> u32 {
        self.xp += amount;
        let mut gained = 0;
        while self.xp >= self.xp_to_next_level {
            self.xp -= self.xp_to_next_level;
            self.level += 1;
            self.xp_to_next_level = next_threshold(self.xp_to_next_level);
            gained += 1;
        }
        self.pending_choices += gained;
        gained
    }
}

fn next_threshold(current: u32) -> u32 {
    ((current as f64 * XP_GROWTH).floor() as u32).max(1)
}

/// Flat random pick of up to three options from every eligible upgrade
pub fn generate_upgrade_options(
    config: &GameConfig,
    owned: &[PlayerItem],
    level: u32,
    rng: &mut Pcg32,
) -> Vec<UpgradeOption> {
    let mut pool = Vec::new();
    for (index, def) in config.items.iter().enumerate() {
        match owned.iter().find(|o| o.item == index) {
            None if def.unlock_level <= level => pool.push(UpgradeOption::NewItem { item: index }),
            Some(o) if o.level < def.max_level => pool.push(UpgradeOption::LevelUpItem {
                item: index,
                next_level: o.level + 1,
            }),
            _ => {}
        }
    }
    pool.extend(
        [StatBoost::MoveSpeed, StatBoost::MaxHp, StatBoost::Heal].map(|stat| UpgradeOption::Stat { stat }),
    );

    pool.shuffle(rng);
    pool.truncate(UPGRADE_CHOICES);
    pool
}

fn offer_choices(world: &mut World) {
    world.leveling.options =
        generate_upgrade_options(&world.config, &world.items, world.leveling.level, &mut world.rng);
}

/// Grant XP, emitting level-ups and opening the choice menu if needed
pub fn gain_xp(world: &mut World, amount: u32) {
    let (first_level, mut threshold) = (world.leveling.level + 1, world.leveling.xp_to_next_level);
    let gained = world.leveling.add_xp(amount);
    let l = &world.leveling;
    let (xp, required, level) = (l.xp, l.xp_to_next_level, l.level);
    world.emit(GameEvent::XpGained {
        current_xp: xp,
        required_xp: required,
        amount,
    });
    if gained == 0 {
        return;
    }

    log::info!("Level up! Now level {level} ({gained} gained)");
    for reached in first_level..=level {
        threshold = next_threshold(threshold);
        world.emit(GameEvent::LevelUp {
            level: reached,
            xp_to_next_level: threshold,
        });
    }
    if world.phase == GamePhase::Playing {
        world.phase = GamePhase::ChoicePending;
        offer_choices(world);
    }
}

/// Apply option `index` of the current menu.
///
/// Returns false (and changes nothing) when no choice is pending or the
/// index is out of range.
pub fn select_upgrade(world: &mut World, index: usize) -> bool {
    if world.phase != GamePhase::ChoicePending {
        return false;
    }
    let Some(&option) = world.leveling.options.get(index) else {
        return false;
    };

    match option {
        UpgradeOption::NewItem { item } => {
            add_item(world, item);
        }
        UpgradeOption::LevelUpItem { item, .. } => {
            level_up_item(world, item);
        }
        UpgradeOption::Stat { stat } => apply_stat(world, stat),
    }
    log::info!("Upgrade chosen: {}", option.label(&world.config));

    world.leveling.pending_choices = world.leveling.pending_choices.saturating_sub(1);
    if world.leveling.pending_choices > 0 {
        offer_choices(world);
    } else {
        world.leveling.options.clear();
        world.phase = GamePhase::Playing;
        world.emit(GameEvent::LevelUpComplete);
    }
    true
}

fn apply_stat(world: &mut World, stat: StatBoost) {
    let player = &mut world.player;
    let value = match stat {
        StatBoost::MoveSpeed => {
            player.move_speed *= MOVE_SPEED_MULTIPLIER;
            player.move_speed
        }
        StatBoost::MaxHp => {
            player.increase_max_hp(MAX_HP_BONUS);
            player.max_hp
        }
        StatBoost::Heal => {
            player.heal(HEAL_AMOUNT);
            HEAL_AMOUNT
        }
    };
    world.emit(GameEvent::StatUpgrade { stat, value });
}
