//! World state and core simulation types
//!
//! All state the simulation mutates lives in [`World`]; nothing is global.

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::ability::{Ability, AbilityTimers};
use super::combo::ComboTracker;
use super::difficulty::{DifficultyController, DifficultyState};
use super::entity::{Bullet, Coin, Lane, Obstacle, Particle, Surface};
use super::platform::Platform;
use crate::consts::*;
use crate::highscores::HighScores;
use crate::tuning::{ThemeId, Tuning};

/// Top-level phase of the game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Title screen
    Welcome,
    /// Picking a theme
    ThemeSelect,
    /// Stepping through the fixed tutorial pages
    Tutorial,
    /// Active run
    Playing,
    /// Run ended (maybe waiting on a revive choice)
    GameOver,
}

/// Why a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeathCause {
    /// Hit an obstacle on the active surface
    Crash { obstacle_id: u32 },
    /// Stood on a platform after it broke
    FellThrough { platform_id: u32 },
}

/// Transient events for the renderer, rebuilt every tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    PhaseChanged(GamePhase),
    SurfaceFlipped(Surface),
    CoinCollected { coin_id: u32 },
    /// Trap coin picked up; the renderer shows the fire effect
    TrapTriggered { coin_id: u32 },
    WallBroken { obstacle_id: u32, x: f32, z: f32 },
    StreakBonus { orbs: u32, score: f64 },
    PlatformCracking { platform_id: u32 },
    PlatformBroke { platform_id: u32 },
    AbilityActivated(Ability),
    AbilityExpired(Ability),
    BulletFired { bullet_id: u32 },
    RunEnded(DeathCause),
    Revived,
}

/// Monotonic id source for entities
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityIds {
    next: u32,
}

impl Default for EntityIds {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl EntityIds {
    pub fn next_id(&mut self) -> u32 {
        let id = self.next;
        self.next += 1;
        id
    }
}

/// The player and everything they own
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerState {
    pub lane: Lane,
    pub surface: Surface,
    /// Free forward/back offset, clamped to [PLAYER_Z_MIN, PLAYER_Z_MAX]
    pub z_offset: f32,
    pub orbs: u32,
    /// Non-decreasing while alive
    pub score: f64,
    /// Best score across runs
    pub high_score: f64,
    pub abilities: AbilityTimers,
    pub combo: ComboTracker,
    pub is_game_over: bool,
    pub revive_available: bool,
    /// Time of the last shot (for the fire cooldown)
    pub last_shot_at: Option<f64>,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self {
            lane: Lane::CENTER,
            surface: Surface::Floor,
            z_offset: 0.0,
            orbs: 0,
            score: 0.0,
            high_score: 0.0,
            abilities: AbilityTimers::default(),
            combo: ComboTracker::default(),
            is_game_over: false,
            revive_available: false,
            last_shot_at: None,
        }
    }
}

impl PlayerState {
    #[inline]
    pub fn x(&self) -> f32 {
        self.lane.x()
    }

    /// Move one lane left (-1) or right (+1), clamped
    pub fn shift_lane(&mut self, delta: i32) {
        self.lane = self.lane.shifted(delta);
    }

    /// Step forward (negative) or back (positive), clamped
    pub fn step_z(&mut self, delta: f32) {
        self.z_offset = (self.z_offset + delta).clamp(PLAYER_Z_MIN, PLAYER_Z_MAX);
    }

    pub fn flip_surface(&mut self) -> Surface {
        self.surface = self.surface.flipped();
        self.surface
    }

    /// Deduct orbs if the balance allows; never goes negative
    pub fn spend_orbs(&mut self, cost: u32) -> bool {
        if self.orbs < cost {
            return false;
        }
        self.orbs -= cost;
        true
    }

    /// Lose orbs, saturating at zero
    pub fn lose_orbs(&mut self, amount: u32) {
        self.orbs = self.orbs.saturating_sub(amount);
    }

    pub fn add_score(&mut self, amount: f64) {
        debug_assert!(amount >= 0.0, "score must not decrease");
        self.score += amount.max(0.0);
    }

    /// Fresh run state; the high score survives
    pub fn reset(&mut self) {
        let high_score = self.high_score;
        *self = Self {
            high_score,
            ..Self::default()
        };
    }
}

/// The whole simulation aggregate
#[derive(Debug, Clone)]
pub struct World {
    /// Run seed for reproducibility
    pub seed: u64,
    /// Injected RNG; every random decision draws from here
    pub rng: Pcg32,
    pub tuning: Tuning,
    pub phase: GamePhase,
    pub tutorial_step: u8,
    pub theme: ThemeId,
    pub player: PlayerState,
    pub difficulty: DifficultyState,
    pub obstacles: Vec<Obstacle>,
    pub platforms: Vec<Platform>,
    pub coins: Vec<Coin>,
    pub bullets: Vec<Bullet>,
    /// Wall debris (cosmetic)
    pub debris: Vec<Particle>,
    /// Events produced by the last tick
    pub events: Vec<GameEvent>,
    pub high_scores: HighScores,
    /// Timestamp passed to the last tick
    pub now: f64,
    pub ids: EntityIds,
}

impl World {
    /// Create a world on the welcome screen with default tuning
    pub fn new(seed: u64) -> Self {
        Self::with_tuning(seed, Tuning::default())
    }

    /// Create a world with custom balance. The tuning must pass
    /// [`Tuning::validate`]; files loaded through [`Tuning::load`] always do.
    pub fn with_tuning(seed: u64, tuning: Tuning) -> Self {
        debug_assert!(
            tuning.validate().is_ok(),
            "invalid tuning: {:?}",
            tuning.validate().err()
        );
        let difficulty = DifficultyController::new(tuning.base_forward_speed).initial();
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            tuning,
            phase: GamePhase::Welcome,
            tutorial_step: 0,
            theme: ThemeId::Classic,
            player: PlayerState::default(),
            difficulty,
            obstacles: Vec::new(),
            platforms: Vec::new(),
            coins: Vec::new(),
            bullets: Vec::new(),
            debris: Vec::new(),
            events: Vec::new(),
            high_scores: HighScores::new(),
            now: 0.0,
            ids: EntityIds::default(),
        }
    }

    pub fn difficulty_controller(&self) -> DifficultyController {
        DifficultyController::new(self.tuning.base_forward_speed)
    }

    pub(crate) fn set_phase(&mut self, phase: GamePhase) {
        if self.phase != phase {
            log::info!("Phase {:?} -> {:?}", self.phase, phase);
            self.phase = phase;
            self.events.push(GameEvent::PhaseChanged(phase));
        }
    }

    /// Clear every entity and reset player, abilities and difficulty.
    ///
    /// Theme, tuning, high score and the RNG stream are kept.
    pub fn reset_run(&mut self) {
        self.obstacles.clear();
        self.platforms.clear();
        self.coins.clear();
        self.bullets.clear();
        self.debris.clear();
        self.player.reset();
        self.difficulty = self.difficulty_controller().initial();
        self.tutorial_step = 0;
    }

    /// Obstacles on the player's surface (the only ones that can hit)
    pub fn active_obstacles(&self) -> impl Iterator<Item = &Obstacle> {
        let surface = self.player.surface;
        self.obstacles.iter().filter(move |o| o.surface == surface)
    }

    /// Platforms on the player's surface
    pub fn active_platforms(&self) -> impl Iterator<Item = &Platform> {
        let surface = self.player.surface;
        self.platforms.iter().filter(move |p| p.surface == surface)
    }

    /// Coins on the player's surface that can still be picked up
    pub fn active_coins(&self) -> impl Iterator<Item = &Coin> {
        let surface = self.player.surface;
        self.coins
            .iter()
            .filter(move |c| c.surface == surface && c.is_available())
    }

    /// Take the events produced since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}
