//! Deterministic world simulation
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Time comes in through `tick` (synthetic in tests)
//! - Seeded RNG only, owned by the [`World`]
//! - Stable iteration order (entities are kept in spawn order)
//! - No rendering or platform dependencies

pub mod ability;
pub mod clock;
pub mod collision;
pub mod combo;
pub mod difficulty;
pub mod entity;
pub mod lifecycle;
pub mod platform;
pub mod spawn;
pub mod state;
pub mod tick;

pub use ability::{Ability, AbilityTimers};
pub use clock::Clock;
pub use collision::{PlatformContact, WallHit, detect_collision};
pub use combo::{ComboTracker, StreakBonus};
pub use difficulty::{DifficultyController, DifficultyMode, DifficultyState};
pub use entity::{Bullet, Coin, CoinKind, Lane, Obstacle, ObstacleKind, ObstacleType, Particle, Surface};
pub use lifecycle::{Scroll, advance_and_cull};
pub use platform::{BreakState, DebrisFragment, Platform, PlatformKind};
pub use spawn::{SpawnParams, spawn_all};
pub use state::{DeathCause, GameEvent, GamePhase, PlayerState, World};
pub use tick::{LaneShift, StepDir, TickInput, revive, restart, start_run, tick};
