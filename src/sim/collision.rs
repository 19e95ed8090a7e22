//! Collision detection between the player and world entities
//!
//! Only entities on the player's current surface take part. An obstacle on
//! the other side of the tunnel never collides, however close it is.

use rand::Rng;

use super::entity::{Bullet, Coin, CoinKind, Obstacle, Particle, Surface, wall_debris};
use super::platform::{Footprint, Platform};
use super::state::PlayerState;

/// Longitudinal slack when deciding the player stands on a platform
pub const STEP_TOLERANCE: f32 = 0.3;
/// Slack used for the fall-through test over a broken platform
pub const FALL_TOLERANCE: f32 = 0.1;
/// Pick-up distance for coins, on both axes
pub const COIN_PICKUP_RANGE: f32 = 0.6;
/// Depth window in which a bullet meets an obstacle
pub const BULLET_HIT_RANGE: f32 = 0.6;

/// First obstacle on the player's surface overlapping the player.
///
/// Pure geometry: invulnerability is not considered here.
pub fn obstacle_hit<'a>(player: &PlayerState, obstacles: &'a [Obstacle]) -> Option<&'a Obstacle> {
    let px = player.x();
    let pz = player.z_offset;
    obstacles
        .iter()
        .filter(|o| o.surface == player.surface)
        .find(|o| {
            let r = o.kind.collision_radius();
            (o.x - px).abs() < r && (o.z - pz).abs() < r
        })
}

/// Whether the player crashes into an obstacle this tick.
///
/// Always false while Cheat, Invisibility or Shield is active.
pub fn detect_collision(player: &PlayerState, obstacles: &[Obstacle]) -> bool {
    !player.abilities.is_invulnerable() && obstacle_hit(player, obstacles).is_some()
}

fn stands_on(fp: &Footprint, px: f32, pz: f32) -> bool {
    fp.x0 <= px
        && px <= fp.x1
        && ((fp.z0 <= pz && pz <= fp.z1)
            || (pz - fp.z0).abs() <= STEP_TOLERANCE
            || (pz - fp.z1).abs() <= STEP_TOLERANCE)
}

fn over_hole(fp: &Footprint, px: f32, pz: f32) -> bool {
    fp.x0 <= px && px <= fp.x1 && fp.z0 <= pz + FALL_TOLERANCE && fp.z1 >= pz - FALL_TOLERANCE
}

/// What the player's feet touched this tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlatformContact {
    /// Breakables that started cracking under the player
    pub cracked: Vec<u32>,
    /// Broken platform the player is standing over, if any
    pub fell_through: Option<u32>,
}

/// Trigger steps on solid platforms and detect falls through broken ones
pub fn resolve_platforms(player: &PlayerState, platforms: &mut [Platform]) -> PlatformContact {
    let px = player.x();
    let pz = player.z_offset;
    let mut contact = PlatformContact::default();

    for p in platforms
        .iter_mut()
        .filter(|p| p.surface == player.surface && p.collider_enabled)
    {
        if stands_on(&p.footprint(), px, pz) && p.on_player_step() {
            contact.cracked.push(p.id);
        }
    }

    contact.fell_through = platforms
        .iter()
        .filter(|p| p.surface == player.surface && !p.collider_enabled && p.break_state().is_some())
        .find(|p| over_hole(&p.footprint(), px, pz))
        .map(|p| p.id);
    contact
}

/// Pick up every available coin on the player's surface within reach.
///
/// Returns `(coin id, kind)` for each collected coin.
pub fn collect_coins<R: Rng + ?Sized>(
    player: &mut PlayerState,
    coins: &mut [Coin],
    now: f64,
    rng: &mut R,
) -> Vec<(u32, CoinKind)> {
    let px = player.x();
    let pz = player.z_offset;
    let mut collected = Vec::new();
    for coin in coins.iter_mut() {
        if !coin.is_available() || coin.surface != player.surface {
            continue;
        }
        if (coin.lane.x() - px).abs() > COIN_PICKUP_RANGE || (coin.z - pz).abs() > COIN_PICKUP_RANGE {
            continue;
        }
        coin.collect(now, rng);
        match coin.kind {
            CoinKind::Normal => {
                player.orbs += 1;
                player.add_score(10.0);
            }
            CoinKind::Trap => player.lose_orbs(1),
        }
        collected.push((coin.id, coin.kind));
    }
    collected
}

/// A wall destroyed by a bullet
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WallHit {
    pub obstacle_id: u32,
    pub x: f32,
    pub z: f32,
}

/// Match bullets against obstacles on the active surface.
///
/// `closing` is how far each bullet and the obstacles approached each other
/// this tick (bullet travel plus scroll). The test is swept over that span,
/// so a long frame cannot carry a bullet through a wall.
///
/// Any obstacle absorbs a bullet in its lane within range; only walls and
/// electric walls are destroyed, throwing debris into `debris`.
pub fn resolve_bullets<R: Rng + ?Sized>(
    active_surface: Surface,
    closing: f32,
    bullets: &mut Vec<Bullet>,
    obstacles: &mut Vec<Obstacle>,
    debris: &mut Vec<Particle>,
    rng: &mut R,
) -> Vec<WallHit> {
    let mut hits = Vec::new();
    if bullets.is_empty() {
        return hits;
    }

    obstacles.retain(|obs| {
        if obs.surface != active_surface {
            return true;
        }
        let Some(bullet) = bullets.iter_mut().find(|b| {
            // Gap now and at the start of the tick
            let gap = b.z - obs.z;
            b.alive
                && b.surface == obs.surface
                && b.lane == obs.lane
                && gap <= BULLET_HIT_RANGE
                && gap + closing >= -BULLET_HIT_RANGE
        }) else {
            return true;
        };
        bullet.alive = false;
        if !obs.kind.is_destructible() {
            return true;
        }
        debris.extend(wall_debris(obs.x, obs.z, obs.surface, rng));
        hits.push(WallHit {
            obstacle_id: obs.id,
            x: obs.x,
            z: obs.z,
        });
        false
    });
    bullets.retain(|b| b.alive);
    hits
}
