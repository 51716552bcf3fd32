//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Host-supplied timestep, virtual millisecond clock
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies

pub mod collision;
pub mod death;
pub mod effects;
pub mod geometry;
pub mod items;
pub mod leveling;
pub mod loot;
pub mod movement;
pub mod spawner;
pub mod state;
pub mod tick;

pub use collision::HitCooldowns;
pub use death::{Resurrection, ResurrectionPhase};
pub use effects::{PoisonState, apply_poison};
pub use geometry::swept_circle_circle;
pub use items::{PlayerItem, ShootRequest};
pub use leveling::{StatBoost, UpgradeOption, gain_xp, generate_upgrade_options, select_upgrade};
pub use loot::Chest;
pub use movement::AiState;
pub use spawner::{SpawnerState, select_enemy_type};
pub use state::{Enemy, EntityId, GameEvent, GamePhase, ItemSnapshot, Player, Projectile, World};
pub use tick::{EulerIntegrator, Integrator, TickInput, tick};
