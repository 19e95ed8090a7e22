//! Orb-funded timed abilities
//!
//! Each ability has a fixed orb cost and duration. Activation is refused
//! (no mutation) when the player cannot pay or the ability is already
//! running; an ability is charged at most once per activation window.

use serde::{Deserialize, Serialize};

/// Seconds between forced flips while RandomFlip is active
pub const RANDOM_FLIP_INTERVAL: f32 = 2.0;
/// Forward window scanned by AutoFlipSafety (z in [-DANGER, 0])
pub const AUTO_FLIP_DANGER_Z: f32 = 3.0;
/// Lateral tolerance for AutoFlipSafety
pub const AUTO_FLIP_LANE_TOLERANCE: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Ability {
    /// Obstacles pass through the player
    Invisibility,
    /// Blocks obstacle hits
    Shield,
    /// Flips surface when an obstacle is about to hit
    AutoFlipSafety,
    /// Swaps left/right lane input (a power-down)
    InvertedControls,
    /// Forces a surface flip every two seconds (a power-down)
    RandomFlip,
    /// Stops new obstacles from spawning
    EasyPath,
    /// Full invulnerability
    CheatMode,
}

impl Ability {
    pub const ALL: [Ability; 7] = [
        Ability::Invisibility,
        Ability::Shield,
        Ability::AutoFlipSafety,
        Ability::InvertedControls,
        Ability::RandomFlip,
        Ability::EasyPath,
        Ability::CheatMode,
    ];

    pub fn cost(self) -> u32 {
        match self {
            Ability::Invisibility => 5,
            Ability::Shield => 10,
            Ability::AutoFlipSafety => 8,
            Ability::InvertedControls => 3,
            Ability::RandomFlip => 4,
            Ability::EasyPath => 20,
            Ability::CheatMode => 10,
        }
    }

    /// Seconds the ability stays active
    pub fn duration(self) -> f64 {
        match self {
            Ability::Invisibility => 3.0,
            Ability::Shield => 4.0,
            Ability::AutoFlipSafety => 5.0,
            Ability::InvertedControls => 8.0,
            Ability::RandomFlip => 6.0,
            Ability::EasyPath => 3.0,
            Ability::CheatMode => 3.0,
        }
    }

    /// Whether the ability makes obstacle hits harmless
    pub fn grants_immunity(self) -> bool {
        matches!(self, Ability::Invisibility | Ability::Shield | Ability::CheatMode)
    }

    #[inline]
    fn slot(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AbilitySlot {
    pub active: bool,
    pub expires_at: f64,
}

/// Activation flags and timers for every ability
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AbilityTimers {
    slots: [AbilitySlot; 7],
    /// Time since the last forced flip
    random_flip_timer: f32,
}

impl AbilityTimers {
    #[inline]
    pub fn is_active(&self, ability: Ability) -> bool {
        self.slots[ability.slot()].active
    }

    pub fn slot(&self, ability: Ability) -> AbilitySlot {
        self.slots[ability.slot()]
    }

    /// Seconds left, or 0 when inactive
    pub fn remaining(&self, ability: Ability, now: f64) -> f64 {
        let slot = self.slots[ability.slot()];
        if slot.active {
            (slot.expires_at - now).max(0.0)
        } else {
            0.0
        }
    }

    /// Any of Cheat, Invisibility or Shield is running
    pub fn is_invulnerable(&self) -> bool {
        Ability::ALL
            .iter()
            .any(|a| a.grants_immunity() && self.is_active(*a))
    }

    /// Pay for and start an ability.
    ///
    /// Returns false (and changes nothing) if already active or `orbs` is short.
    pub fn activate(&mut self, ability: Ability, orbs: &mut u32, now: f64) -> bool {
        let cost = ability.cost();
        if self.is_active(ability) || *orbs < cost {
            return false;
        }
        *orbs -= cost;
        self.start(ability, now + ability.duration());
        log::debug!("{ability:?} active until {:.2}", now + ability.duration());
        true
    }

    /// Grant an ability for free, extending (never shortening) an active window
    pub fn grant(&mut self, ability: Ability, until: f64) {
        let slot = &mut self.slots[ability.slot()];
        if slot.active {
            slot.expires_at = slot.expires_at.max(until);
        } else {
            self.start(ability, until);
        }
    }

    fn start(&mut self, ability: Ability, until: f64) {
        if ability == Ability::RandomFlip {
            self.random_flip_timer = 0.0;
        }
        self.slots[ability.slot()] = AbilitySlot {
            active: true,
            expires_at: until,
        };
    }

    /// Deactivate every ability whose window has closed; returns them
    pub fn expire(&mut self, now: f64) -> Vec<Ability> {
        let mut expired = Vec::new();
        for ability in Ability::ALL {
            let slot = &mut self.slots[ability.slot()];
            if slot.active && now >= slot.expires_at {
                slot.active = false;
                expired.push(ability);
            }
        }
        expired
    }

    /// Advance the RandomFlip timer; true when a flip is due this tick
    pub fn random_flip_due(&mut self, dt: f32) -> bool {
        if !self.is_active(Ability::RandomFlip) {
            return false;
        }
        self.random_flip_timer += dt;
        if self.random_flip_timer >= RANDOM_FLIP_INTERVAL {
            self.random_flip_timer = 0.0;
            true
        } else {
            false
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activation_refused_when_short() {
        let mut timers = AbilityTimers::default();
        let mut orbs = 4;
        assert!(!timers.activate(Ability::Invisibility, &mut orbs, 0.0));
        assert_eq!(orbs, 4);
        assert!(!timers.is_active(Ability::Invisibility));
    }

    #[test]
    fn test_activation_charges_once() {
        let mut timers = AbilityTimers::default();
        let mut orbs = 25;
        assert!(timers.activate(Ability::Shield, &mut orbs, 1.0));
        assert_eq!(orbs, 15);
        assert!(!timers.activate(Ability::Shield, &mut orbs, 1.5));
        assert_eq!(orbs, 15);
        assert!(timers.is_invulnerable());
        assert_eq!(timers.slot(Ability::Shield).expires_at, 5.0);
    }

    #[test]
    fn test_expiry() {
        let mut timers = AbilityTimers::default();
        let mut orbs = 100;
        timers.activate(Ability::Invisibility, &mut orbs, 0.0);
        timers.activate(Ability::RandomFlip, &mut orbs, 0.0);
        assert!(timers.expire(2.9).is_empty());
        assert_eq!(timers.expire(3.0), vec![Ability::Invisibility]);
        assert!(!timers.is_invulnerable());
        assert!(timers.is_active(Ability::RandomFlip));
        assert_eq!(timers.expire(6.0), vec![Ability::RandomFlip]);
    }

    #[test]
    fn test_reactivate_after_expiry() {
        let mut timers = AbilityTimers::default();
        let mut orbs = 10;
        assert!(timers.activate(Ability::InvertedControls, &mut orbs, 0.0));
        timers.expire(8.0);
        assert!(timers.activate(Ability::InvertedControls, &mut orbs, 8.0));
        assert_eq!(orbs, 4);
    }

    #[test]
    fn test_grant_extends_but_never_shortens() {
        let mut timers = AbilityTimers::default();
        timers.grant(Ability::CheatMode, 5.0);
        timers.grant(Ability::CheatMode, 3.0);
        assert_eq!(timers.remaining(Ability::CheatMode, 0.0), 5.0);
        timers.grant(Ability::CheatMode, 7.0);
        assert_eq!(timers.remaining(Ability::CheatMode, 0.0), 7.0);
    }

    #[test]
    fn test_random_flip_every_two_seconds() {
        let mut timers = AbilityTimers::default();
        assert!(!timers.random_flip_due(5.0));
        let mut orbs = 4;
        timers.activate(Ability::RandomFlip, &mut orbs, 0.0);
        let flips = (0..24).filter(|_| timers.random_flip_due(0.25)).count();
        // 6 seconds of ticks -> 3 flips
        assert_eq!(flips, 3);
    }

    #[test]
    fn test_immunity_set() {
        let immune: Vec<_> = Ability::ALL.into_iter().filter(|a| a.grants_immunity()).collect();
        assert_eq!(
            immune,
            vec![Ability::Invisibility, Ability::Shield, Ability::CheatMode]
        );
    }
}
