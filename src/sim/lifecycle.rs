//! Forward scrolling and culling shared by every world entity
//!
//! The world moves toward the player: each tick every entity's z grows by
//! `forward_speed * dt`. Once an entity has passed the player (z > `CULL_Z`)
//! it is dropped, unless it still owns cosmetic particles that must finish.

use super::entity::{Coin, Obstacle};
use super::platform::{Platform, PlatformKind};
use crate::consts::CULL_Z;

/// Something carried toward the player by the world scroll
pub trait Scroll {
    /// Current depth (more negative = farther ahead)
    fn depth(&self) -> f32;

    /// Move toward the player by `dz`
    fn scroll(&mut self, dz: f32);

    /// Whether the entity can be freed at time `now`
    fn is_expired(&self, now: f64) -> bool {
        let _ = now;
        self.depth() > CULL_Z
    }
}

impl Scroll for Obstacle {
    fn depth(&self) -> f32 {
        self.z
    }

    fn scroll(&mut self, dz: f32) {
        self.z += dz;
    }
}

impl Scroll for Platform {
    fn depth(&self) -> f32 {
        self.z
    }

    fn scroll(&mut self, dz: f32) {
        self.z += dz;
        if let PlatformKind::Breakable(b) = &mut self.kind {
            for f in b.fragments.iter_mut() {
                f.pos.z += dz;
            }
        }
    }

    /// Broken platforms stay until their fragments have finished falling
    fn is_expired(&self, _now: f64) -> bool {
        self.is_past_player() && self.fragments().is_empty()
    }
}

impl Scroll for Coin {
    fn depth(&self) -> f32 {
        self.z
    }

    fn scroll(&mut self, dz: f32) {
        self.z += dz;
        for p in self.explosion.iter_mut() {
            p.pos.z += dz;
        }
    }

    fn is_expired(&self, now: f64) -> bool {
        if !self.explosion.is_empty() {
            return false;
        }
        match self.collected_at {
            None if !self.alive => true,
            Some(at) if now - at > super::entity::COIN_FADE_SECS => true,
            _ => self.z > CULL_Z,
        }
    }
}

/// Scroll every entity by `dz`, then drop the expired ones.
///
/// Returns the number of entities removed.
pub fn advance_and_cull<T: Scroll>(entities: &mut Vec<T>, dz: f32, now: f64) -> usize {
    for e in entities.iter_mut() {
        e.scroll(dz);
    }
    let before = entities.len();
    entities.retain(|e| !e.is_expired(now));
    before - entities.len()
}
