//! Platforms and the breakable-platform state machine
//!
//! Breakables go Intact -> Cracking -> Broken and never back. Once broken
//! the collider is off and a batch of fragments falls away from the surface.

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::entity::{Lane, Surface};
use crate::consts::CULL_Z;

/// Fragments emitted when a platform breaks
pub const FRAGMENT_COUNT: usize = 8;
/// Fragment gravity magnitude (units/s²)
pub const FRAGMENT_GRAVITY: f32 = 6.0;
/// Seconds a fragment lives before it is dropped
pub const FRAGMENT_LIFE: f32 = 1.5;

/// Break progress of a breakable platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BreakState {
    Intact,
    Cracking,
    Broken,
}

/// Falling piece of a broken platform
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebrisFragment {
    pub pos: Vec3,
    pub vel: Vec3,
    pub size: f32,
    /// Seconds remaining
    pub life: f32,
}

/// Break bookkeeping carried by breakable platforms
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Breakable {
    pub state: BreakState,
    pub time_since_step: f32,
    pub break_delay: f32,
    pub fragments: Vec<DebrisFragment>,
}

impl Breakable {
    pub fn new(break_delay: f32) -> Self {
        Self {
            state: BreakState::Intact,
            time_since_step: 0.0,
            break_delay,
            fragments: Vec::new(),
        }
    }

    /// 0 when the crack starts, 1 at the moment of breaking (renderer tint)
    pub fn crack_progress(&self) -> f32 {
        match self.state {
            BreakState::Intact => 0.0,
            BreakState::Cracking => (self.time_since_step / self.break_delay.max(0.0001)).min(1.0),
            BreakState::Broken => 1.0,
        }
    }
}

/// Static or breakable
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PlatformKind {
    Static,
    Breakable(Breakable),
}

/// A slab lying on one lane of the floor or ceiling
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Platform {
    pub id: u32,
    pub lane: Lane,
    pub surface: Surface,
    /// Centre z
    pub z: f32,
    pub length: f32,
    pub width: f32,
    pub thickness: f32,
    pub collider_enabled: bool,
    pub kind: PlatformKind,
}

/// Axis-aligned footprint in the x/z plane
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Footprint {
    pub x0: f32,
    pub x1: f32,
    pub z0: f32,
    pub z1: f32,
}

impl Platform {
    pub fn new_static(id: u32, lane: Lane, surface: Surface, z: f32) -> Self {
        Self {
            id,
            lane,
            surface,
            z,
            length: 3.0,
            width: 2.4,
            thickness: 0.2,
            collider_enabled: true,
            kind: PlatformKind::Static,
        }
    }

    pub fn new_breakable(id: u32, lane: Lane, surface: Surface, z: f32, break_delay: f32) -> Self {
        Self {
            id,
            lane,
            surface,
            z,
            length: 3.2,
            width: 2.5,
            thickness: 0.22,
            collider_enabled: true,
            kind: PlatformKind::Breakable(Breakable::new(break_delay)),
        }
    }

    pub fn footprint(&self) -> Footprint {
        let half_w = self.width * 0.5;
        let half_l = self.length * 0.5;
        let x = self.lane.x();
        Footprint {
            x0: x - half_w,
            x1: x + half_w,
            z0: self.z - half_l,
            z1: self.z + half_l,
        }
    }

    /// Break state, or None for static platforms
    pub fn break_state(&self) -> Option<BreakState> {
        match &self.kind {
            PlatformKind::Static => None,
            PlatformKind::Breakable(b) => Some(b.state),
        }
    }

    pub fn fragments(&self) -> &[DebrisFragment] {
        match &self.kind {
            PlatformKind::Static => &[],
            PlatformKind::Breakable(b) => &b.fragments,
        }
    }

    #[inline]
    pub fn is_past_player(&self) -> bool {
        self.z > CULL_Z
    }

    /// Player landed on the platform. Starts the crack; no-op unless Intact.
    ///
    /// Returns true if this call started cracking.
    pub fn on_player_step(&mut self) -> bool {
        match &mut self.kind {
            PlatformKind::Breakable(b) if b.state == BreakState::Intact => {
                b.state = BreakState::Cracking;
                b.time_since_step = 0.0;
                true
            }
            _ => false,
        }
    }

    /// Advance the break state machine and falling fragments.
    ///
    /// Returns true on the tick the platform breaks.
    pub fn update<R: Rng + ?Sized>(&mut self, dt: f32, rng: &mut R) -> bool {
        let x = self.lane.x();
        let (width, length, thickness, z, surface) =
            (self.width, self.length, self.thickness, self.z, self.surface);

        let PlatformKind::Breakable(b) = &mut self.kind else {
            return false;
        };

        match b.state {
            BreakState::Intact => false,
            BreakState::Cracking => {
                b.time_since_step += dt;
                if b.time_since_step < b.break_delay {
                    return false;
                }
                b.state = BreakState::Broken;
                self.collider_enabled = false;

                let y = surface.plane_y() - surface.gravity_sign() * thickness;
                let fall = surface.gravity_sign();
                b.fragments.extend((0..FRAGMENT_COUNT).map(|_| DebrisFragment {
                    pos: Vec3::new(
                        x + rng.random_range(-width * 0.35..=width * 0.35),
                        y,
                        z + rng.random_range(-length * 0.35..=length * 0.35),
                    ),
                    vel: Vec3::new(
                        rng.random_range(-0.6..=0.6),
                        rng.random_range(1.2..=2.0) * fall,
                        rng.random_range(-0.3..=0.3),
                    ),
                    size: rng.random_range(0.12..=0.22),
                    life: FRAGMENT_LIFE,
                }));
                true
            }
            BreakState::Broken => {
                let gravity = FRAGMENT_GRAVITY * surface.gravity_sign();
                for f in b.fragments.iter_mut() {
                    f.vel.y += gravity * dt;
                    f.pos += f.vel * dt;
                    f.life -= dt;
                }
                b.fragments.retain(|f| f.life > 0.0);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn breakable() -> Platform {
        Platform::new_breakable(1, Lane::CENTER, Surface::Floor, -5.0, 0.1)
    }

    #[test]
    fn test_step_then_break() {
        let mut rng = Pcg32::seed_from_u64(42);
        let mut p = breakable();
        assert!(p.on_player_step());
        assert_eq!(p.break_state(), Some(BreakState::Cracking));

        let mut broke = false;
        for _ in 0..10 {
            broke |= p.update(0.02, &mut rng);
            if p.break_state() == Some(BreakState::Broken) {
                break;
            }
        }
        assert!(broke);
        assert_eq!(p.break_state(), Some(BreakState::Broken));
        assert!(!p.collider_enabled);
        assert_eq!(p.fragments().len(), FRAGMENT_COUNT);
    }

    #[test]
    fn test_step_is_idempotent_once_cracking() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut p = breakable();
        assert!(p.on_player_step());
        p.update(0.05, &mut rng);
        assert!(!p.on_player_step());
        // The second step must not reset the crack timer
        p.update(0.06, &mut rng);
        assert_eq!(p.break_state(), Some(BreakState::Broken));
        assert!(!p.on_player_step());
        assert_eq!(p.break_state(), Some(BreakState::Broken));
    }

    #[test]
    fn test_intact_platform_does_not_progress() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut p = breakable();
        for _ in 0..100 {
            p.update(0.05, &mut rng);
        }
        assert_eq!(p.break_state(), Some(BreakState::Intact));
        assert!(p.collider_enabled);
    }

    #[test]
    fn test_static_platform_ignores_steps() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut p = Platform::new_static(2, Lane::LEFT, Surface::Ceiling, -3.0);
        assert!(!p.on_player_step());
        assert!(!p.update(1.0, &mut rng));
        assert!(p.break_state().is_none());
        assert!(p.collider_enabled);
    }

    #[test]
    fn test_fragments_fall_away_from_surface() {
        let mut rng = Pcg32::seed_from_u64(9);
        for surface in [Surface::Floor, Surface::Ceiling] {
            let mut p = Platform::new_breakable(1, Lane::RIGHT, surface, -4.0, 0.0);
            p.on_player_step();
            p.update(0.0, &mut rng);
            let start: Vec<f32> = p.fragments().iter().map(|f| f.pos.y).collect();
            p.update(0.1, &mut rng);
            for (f, y0) in p.fragments().iter().zip(start) {
                assert!((f.pos.y - y0) * surface.gravity_sign() > 0.0);
            }
        }
    }

    #[test]
    fn test_fragments_expire() {
        let mut rng = Pcg32::seed_from_u64(3);
        let mut p = breakable();
        p.on_player_step();
        p.update(0.2, &mut rng);
        assert_eq!(p.fragments().len(), FRAGMENT_COUNT);
        for _ in 0..40 {
            p.update(0.05, &mut rng);
        }
        assert!(p.fragments().is_empty());
        assert_eq!(p.break_state(), Some(BreakState::Broken));
    }

    #[test]
    fn test_fragments_within_footprint() {
        let mut rng = Pcg32::seed_from_u64(8);
        let mut p = breakable();
        p.on_player_step();
        p.update(1.0, &mut rng);
        let fp = p.footprint();
        for f in p.fragments() {
            assert!(f.pos.x >= fp.x0 && f.pos.x <= fp.x1);
            assert!(f.pos.z >= fp.z0 && f.pos.z <= fp.z1);
        }
    }
}
