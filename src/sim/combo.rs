//! Wall-break streak tracking
//!
//! Breaking walls in quick succession builds a streak; reaching the
//! threshold pays a bonus and starts over. The streak decays if no wall
//! breaks for `STREAK_WINDOW` seconds.

use serde::{Deserialize, Serialize};

pub const STREAK_THRESHOLD: u32 = 5;
pub const STREAK_WINDOW: f64 = 3.0;
pub const STREAK_BONUS_ORBS: u32 = 10;
pub const STREAK_BONUS_SCORE: f64 = 50.0;
/// How long the renderer shows the combo banner
pub const COMBO_DISPLAY_SECS: f32 = 2.0;

/// Bonus paid out when a streak completes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StreakBonus {
    pub orbs: u32,
    pub score: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComboTracker {
    pub streak: u32,
    pub last_break_time: f64,
    /// Counts down to 0; purely a UI hint
    pub combo_display_time: f32,
}

impl ComboTracker {
    /// Count one wall break at `now`. Returns the bonus if the streak completed.
    pub fn award_wall_break(&mut self, now: f64) -> Option<StreakBonus> {
        self.streak += 1;
        self.last_break_time = now;
        if self.streak < STREAK_THRESHOLD {
            return None;
        }
        self.streak = 0;
        self.combo_display_time = COMBO_DISPLAY_SECS;
        log::info!("Wall streak complete: +{STREAK_BONUS_ORBS} orbs, +{STREAK_BONUS_SCORE} score");
        Some(StreakBonus {
            orbs: STREAK_BONUS_ORBS,
            score: STREAK_BONUS_SCORE,
        })
    }

    /// Decay the streak on inactivity and tick the banner timer
    pub fn update(&mut self, dt: f32, now: f64) {
        if now - self.last_break_time > STREAK_WINDOW {
            self.streak = 0;
        }
        if self.combo_display_time > 0.0 {
            self.combo_display_time = (self.combo_display_time - dt).max(0.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifth_break_pays_bonus() {
        let mut combo = ComboTracker::default();
        for i in 0..4 {
            assert_eq!(combo.award_wall_break(10.0 + i as f64), None);
            combo.update(0.016, 10.0 + i as f64 + 0.5);
        }
        assert_eq!(combo.streak, 4);
        let bonus = combo.award_wall_break(14.0).unwrap();
        assert_eq!(bonus.orbs, 10);
        assert_eq!(bonus.score, 50.0);
        assert_eq!(combo.streak, 0);
        assert_eq!(combo.combo_display_time, COMBO_DISPLAY_SECS);
    }

    #[test]
    fn test_streak_decays_after_window() {
        let mut combo = ComboTracker::default();
        combo.award_wall_break(1.0);
        combo.award_wall_break(2.0);
        combo.update(0.016, 4.9);
        assert_eq!(combo.streak, 2);
        combo.update(0.016, 5.1);
        assert_eq!(combo.streak, 0);
    }

    #[test]
    fn test_display_timer_counts_down() {
        let mut combo = ComboTracker {
            combo_display_time: 0.1,
            ..Default::default()
        };
        combo.update(0.05, 0.0);
        combo.update(0.05, 0.0);
        combo.update(0.05, 0.0);
        assert_eq!(combo.combo_display_time, 0.0);
    }
}
