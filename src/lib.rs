//! Flip Runner - A dual-surface lane runner
//!
//! Core modules:
//! - `sim`: Deterministic world simulation (spawning, platforms, abilities, collisions, phases)
//! - `tuning`: Data-driven game balance and theme tables
//! - `highscores`: Finished-run leaderboard
//!
//! Rendering, HUD and input-device binding live outside this crate. A driver
//! feeds one [`sim::TickInput`] per frame into [`sim::tick`] and polls the
//! [`sim::World`] afterwards.

pub mod error;
pub mod highscores;
pub mod sim;
pub mod tuning;

pub use error::{Error, Result};
pub use highscores::HighScores;
pub use tuning::{ThemeDef, ThemeId, Tuning};

/// Game configuration constants
pub mod consts {
    /// Longest frame the simulation will accept (spiral of death guard)
    pub const MAX_DT: f32 = 0.05;

    /// Number of lanes
    pub const LANE_COUNT: usize = 3;
    /// World x-coordinate of each lane, left to right
    pub const LANE_X: [f32; LANE_COUNT] = [-2.5, 0.0, 2.5];

    /// Entities with z beyond this have passed the player
    pub const CULL_Z: f32 = 2.0;
    /// Bullets farther ahead than this are discarded
    pub const BULLET_MAX_RANGE_Z: f32 = -200.0;

    /// Player free movement along z
    pub const PLAYER_Z_MIN: f32 = -1.2;
    pub const PLAYER_Z_MAX: f32 = 1.2;
    pub const PLAYER_Z_STEP: f32 = 0.6;

    /// Height of the floor and ceiling planes
    pub const FLOOR_Y: f32 = -1.0;
    pub const CEILING_Y: f32 = 1.0;

    /// Default obstacle footprint
    pub const OBSTACLE_SIZE: f32 = 1.5;
}

/// World x-coordinate of a lane index (clamped to the outer lanes)
#[inline]
pub fn lane_x(index: usize) -> f32 {
    consts::LANE_X[index.min(consts::LANE_COUNT - 1)]
}
