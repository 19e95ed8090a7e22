//! Frame clock
//!
//! Turns wall-clock samples into a clamped per-tick delta so that one slow
//! frame cannot push the world arbitrarily far.

use crate::consts::MAX_DT;

#[derive(Debug, Clone)]
pub struct Clock {
    last_now: Option<f64>,
    max_dt: f32,
}

impl Default for Clock {
    fn default() -> Self {
        Self::new(MAX_DT)
    }
}

impl Clock {
    pub fn new(max_dt: f32) -> Self {
        Self {
            last_now: None,
            max_dt,
        }
    }

    /// Sample the time source. The first call yields 0.
    pub fn tick(&mut self, now: f64) -> f32 {
        let dt = match self.last_now {
            None => 0.0,
            // A clock that steps backwards counts as no time passing
            Some(last) => ((now - last).max(0.0) as f32).min(self.max_dt),
        };
        self.last_now = Some(now);
        dt
    }

    /// Forget the last sample (next tick returns 0 again)
    pub fn reset(&mut self) {
        self.last_now = None;
    }

    pub fn last_now(&self) -> Option<f64> {
        self.last_now
    }
}
