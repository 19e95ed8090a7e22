//! Difficulty curve
//!
//! A pure function of score: a continuous factor in [1, 6] plus a discrete
//! mode that sets the spawn cap and speed multiplier.

use serde::{Deserialize, Serialize};

/// Score thresholds for MEDIUM and HARD
pub const MEDIUM_SCORE: f64 = 200.0;
pub const HARD_SCORE: f64 = 400.0;
/// Score per +1.0 of difficulty factor
pub const SCORE_PER_FACTOR: f64 = 250.0;
pub const MAX_FACTOR: f32 = 6.0;
/// Ceiling on the combined speed multiplier
pub const MAX_SPEED_MULTIPLIER: f32 = 3.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum DifficultyMode {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl DifficultyMode {
    pub fn for_score(score: f64) -> Self {
        if score >= HARD_SCORE {
            DifficultyMode::Hard
        } else if score >= MEDIUM_SCORE {
            DifficultyMode::Medium
        } else {
            DifficultyMode::Easy
        }
    }

    /// Obstacles the spawner may add per tick
    pub fn spawn_cap(self) -> u32 {
        match self {
            DifficultyMode::Easy => 1,
            DifficultyMode::Medium => 3,
            DifficultyMode::Hard => 5,
        }
    }

    pub fn speed_scale(self) -> f32 {
        match self {
            DifficultyMode::Easy => 1.00,
            DifficultyMode::Medium => 1.35,
            DifficultyMode::Hard => 1.80,
        }
    }

    /// Extra squeeze applied to spawn gaps
    pub fn gap_scale(self) -> f32 {
        match self {
            DifficultyMode::Easy => 1.0,
            DifficultyMode::Medium => 0.85,
            DifficultyMode::Hard => 0.70,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DifficultyMode::Easy => "EASY",
            DifficultyMode::Medium => "MEDIUM",
            DifficultyMode::Hard => "HARD",
        }
    }
}

/// Derived difficulty for the current tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifficultyState {
    pub difficulty_factor: f32,
    pub mode: DifficultyMode,
    pub forward_speed: f32,
    pub spawn_cap_per_frame: u32,
}

/// Maps score to difficulty. Holds only the base speed.
#[derive(Debug, Clone, Copy)]
pub struct DifficultyController {
    pub base_speed: f32,
}

impl DifficultyController {
    pub fn new(base_speed: f32) -> Self {
        Self { base_speed }
    }

    pub fn update(&self, score: f64) -> DifficultyState {
        let mode = DifficultyMode::for_score(score);
        let difficulty_factor = ((1.0 + score / SCORE_PER_FACTOR) as f32).clamp(1.0, MAX_FACTOR);
        let multiplier =
            ((1.0 + 0.18 * (difficulty_factor - 1.0)) * mode.speed_scale()).min(MAX_SPEED_MULTIPLIER);
        DifficultyState {
            difficulty_factor,
            mode,
            forward_speed: self.base_speed * multiplier,
            spawn_cap_per_frame: mode.spawn_cap(),
        }
    }

    /// State at score 0
    pub fn initial(&self) -> DifficultyState {
        self.update(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_modes_by_score() {
        let ctl = DifficultyController::new(12.0);
        let s = ctl.update(150.0);
        assert_eq!((s.mode, s.spawn_cap_per_frame), (DifficultyMode::Easy, 1));
        let s = ctl.update(250.0);
        assert_eq!((s.mode, s.spawn_cap_per_frame), (DifficultyMode::Medium, 3));
        let s = ctl.update(450.0);
        assert_eq!((s.mode, s.spawn_cap_per_frame), (DifficultyMode::Hard, 5));
    }

    #[test]
    fn test_thresholds_are_exact() {
        assert_eq!(DifficultyMode::for_score(199.999), DifficultyMode::Easy);
        assert_eq!(DifficultyMode::for_score(200.0), DifficultyMode::Medium);
        assert_eq!(DifficultyMode::for_score(399.999), DifficultyMode::Medium);
        assert_eq!(DifficultyMode::for_score(400.0), DifficultyMode::Hard);
    }

    #[test]
    fn test_initial_speed_is_base() {
        let s = DifficultyController::new(12.0).initial();
        assert_eq!(s.difficulty_factor, 1.0);
        assert!((s.forward_speed - 12.0).abs() < 1e-6);
    }

    #[test]
    fn test_speed_is_capped() {
        let s = DifficultyController::new(10.0).update(1.0e9);
        assert_eq!(s.difficulty_factor, MAX_FACTOR);
        assert!((s.forward_speed - 32.0).abs() < 1e-4);
    }

    proptest! {
        #[test]
        fn factor_is_bounded_and_monotonic(a in 0.0f64..5000.0, b in 0.0f64..5000.0) {
            let ctl = DifficultyController::new(12.0);
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let s_lo = ctl.update(lo);
            let s_hi = ctl.update(hi);
            prop_assert!(s_lo.difficulty_factor >= 1.0 && s_lo.difficulty_factor <= MAX_FACTOR);
            prop_assert!(s_hi.difficulty_factor >= s_lo.difficulty_factor);
            prop_assert!(s_hi.mode >= s_lo.mode);
            prop_assert!(s_hi.forward_speed >= s_lo.forward_speed);
        }
    }
}
