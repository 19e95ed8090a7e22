//! World entity types
//!
//! Every forward-scrolling thing in the world: obstacles, coins, bullets and
//! loose particles. Platforms live in `platform.rs` because of their break
//! state machine.

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::lane_x;

/// Side of the tunnel an entity (or the player) is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Surface {
    #[default]
    Floor,
    Ceiling,
}

impl Surface {
    pub fn flipped(self) -> Self {
        match self {
            Surface::Floor => Surface::Ceiling,
            Surface::Ceiling => Surface::Floor,
        }
    }

    /// Sign of "down" for things falling off this surface (+1 on the ceiling)
    #[inline]
    pub fn gravity_sign(self) -> f32 {
        match self {
            Surface::Floor => -1.0,
            Surface::Ceiling => 1.0,
        }
    }

    /// World y of the surface plane
    #[inline]
    pub fn plane_y(self) -> f32 {
        match self {
            Surface::Floor => FLOOR_Y,
            Surface::Ceiling => CEILING_Y,
        }
    }

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        if rng.random_bool(0.5) {
            Surface::Floor
        } else {
            Surface::Ceiling
        }
    }
}

/// One of the three lanes, always in range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Lane(u8);

impl Lane {
    pub const LEFT: Lane = Lane(0);
    pub const CENTER: Lane = Lane(1);
    pub const RIGHT: Lane = Lane(2);
    pub const ALL: [Lane; LANE_COUNT] = [Lane::LEFT, Lane::CENTER, Lane::RIGHT];

    /// Build a lane, clamping out-of-range indices to the outer lanes
    pub fn new(index: usize) -> Self {
        Lane(index.min(LANE_COUNT - 1) as u8)
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub fn x(self) -> f32 {
        lane_x(self.index())
    }

    /// Neighbouring lane, saturating at the edges
    pub fn shifted(self, delta: i32) -> Self {
        let idx = (self.0 as i32 + delta).clamp(0, LANE_COUNT as i32 - 1);
        Lane(idx as u8)
    }

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Lane(rng.random_range(0..LANE_COUNT as u8))
    }
}

impl Default for Lane {
    fn default() -> Self {
        Lane::CENTER
    }
}

/// Obstacle discriminator, as used in theme weight tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObstacleType {
    Cube,
    Car,
    Barrier,
    Cone,
    Bus,
    Stone,
    Pillar,
    Log,
    Trap,
    Drone,
    Ring,
    Gate,
    Ball,
    Wall,
    MovingSpike,
    RotatingBlade,
    ElectricWall,
}

impl ObstacleType {
    /// Kinds with a time-varying pose, only substituted in HARD mode
    pub const DYNAMIC: [ObstacleType; 3] = [
        ObstacleType::MovingSpike,
        ObstacleType::RotatingBlade,
        ObstacleType::ElectricWall,
    ];

    pub fn is_dynamic(self) -> bool {
        Self::DYNAMIC.contains(&self)
    }
}

/// Obstacle kind with exactly the parameters that kind needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ObstacleKind {
    Cube,
    Car,
    Barrier,
    Bus,
    Stone,
    Gate,
    Ball { radius: f32 },
    Drone { radius: f32 },
    Cone { radius: f32, height: f32 },
    Pillar { radius: f32, height: f32 },
    Log { radius: f32, length: f32 },
    Ring { inner: f32, outer: f32 },
    Trap { length: f32 },
    Wall { width: f32, height: f32, thickness: f32 },
    MovingSpike {
        base_x: f32,
        move_range: f32,
        move_speed: f32,
        move_phase: f32,
        spike_count: u8,
    },
    RotatingBlade {
        /// Degrees, wrapped to [0, 360)
        rotation: f32,
        /// Degrees per second
        rotate_speed: f32,
        blade_radius: f32,
        blade_count: u8,
    },
    ElectricWall {
        pulse_phase: f32,
        /// 0..1, drives the renderer's glow
        energy: f32,
        width: f32,
        height: f32,
        thickness: f32,
    },
}

impl ObstacleKind {
    /// Roll the parameters for a freshly spawned obstacle of type `ty` in `lane`
    pub fn roll<R: Rng + ?Sized>(ty: ObstacleType, lane: Lane, rng: &mut R) -> Self {
        match ty {
            ObstacleType::Cube => ObstacleKind::Cube,
            ObstacleType::Car => ObstacleKind::Car,
            ObstacleType::Barrier => ObstacleKind::Barrier,
            ObstacleType::Bus => ObstacleKind::Bus,
            ObstacleType::Stone => ObstacleKind::Stone,
            ObstacleType::Gate => ObstacleKind::Gate,
            ObstacleType::Ball => ObstacleKind::Ball {
                radius: rng.random_range(0.6..=1.1),
            },
            ObstacleType::Drone => ObstacleKind::Drone {
                radius: rng.random_range(0.6..=0.9),
            },
            ObstacleType::Cone => ObstacleKind::Cone {
                radius: rng.random_range(0.28..=0.38),
                height: rng.random_range(0.8..=1.1),
            },
            ObstacleType::Pillar => ObstacleKind::Pillar {
                radius: rng.random_range(0.26..=0.36),
                height: rng.random_range(1.2..=1.8),
            },
            ObstacleType::Log => ObstacleKind::Log {
                radius: rng.random_range(0.20..=0.30),
                length: rng.random_range(1.4..=2.2),
            },
            ObstacleType::Ring => ObstacleKind::Ring {
                inner: rng.random_range(0.10..=0.16),
                outer: rng.random_range(0.8..=1.2),
            },
            ObstacleType::Trap => ObstacleKind::Trap {
                length: rng.random_range(1.4..=2.2),
            },
            ObstacleType::Wall => ObstacleKind::Wall {
                width: rng.random_range(1.6..=2.0),
                height: rng.random_range(0.8..=1.2),
                thickness: rng.random_range(0.18..=0.28),
            },
            ObstacleType::MovingSpike => ObstacleKind::MovingSpike {
                base_x: lane.x(),
                move_range: rng.random_range(0.8..=1.5),
                move_speed: rng.random_range(1.5..=3.0),
                move_phase: rng.random_range(0.0..=std::f32::consts::TAU),
                spike_count: rng.random_range(3..=6),
            },
            ObstacleType::RotatingBlade => ObstacleKind::RotatingBlade {
                rotation: rng.random_range(0.0..360.0),
                rotate_speed: rng.random_range(120.0..=300.0),
                blade_radius: rng.random_range(0.8..=1.2),
                blade_count: rng.random_range(3..=5),
            },
            ObstacleType::ElectricWall => ObstacleKind::ElectricWall {
                pulse_phase: rng.random_range(0.0..=std::f32::consts::TAU),
                energy: 1.0,
                width: rng.random_range(1.6..=2.0),
                height: rng.random_range(1.0..=1.4),
                thickness: 0.1,
            },
        }
    }

    pub fn obstacle_type(&self) -> ObstacleType {
        match self {
            ObstacleKind::Cube => ObstacleType::Cube,
            ObstacleKind::Car => ObstacleType::Car,
            ObstacleKind::Barrier => ObstacleType::Barrier,
            ObstacleKind::Bus => ObstacleType::Bus,
            ObstacleKind::Stone => ObstacleType::Stone,
            ObstacleKind::Gate => ObstacleType::Gate,
            ObstacleKind::Ball { .. } => ObstacleType::Ball,
            ObstacleKind::Drone { .. } => ObstacleType::Drone,
            ObstacleKind::Cone { .. } => ObstacleType::Cone,
            ObstacleKind::Pillar { .. } => ObstacleType::Pillar,
            ObstacleKind::Log { .. } => ObstacleType::Log,
            ObstacleKind::Ring { .. } => ObstacleType::Ring,
            ObstacleKind::Trap { .. } => ObstacleType::Trap,
            ObstacleKind::Wall { .. } => ObstacleType::Wall,
            ObstacleKind::MovingSpike { .. } => ObstacleType::MovingSpike,
            ObstacleKind::RotatingBlade { .. } => ObstacleType::RotatingBlade,
            ObstacleKind::ElectricWall { .. } => ObstacleType::ElectricWall,
        }
    }

    /// Half-extent used for the player hit test
    pub fn collision_radius(&self) -> f32 {
        match self {
            ObstacleKind::MovingSpike { .. } | ObstacleKind::RotatingBlade { .. } => 1.0,
            ObstacleKind::ElectricWall { .. } => 0.9,
            _ => 0.8,
        }
    }

    /// Only walls can be shot down
    pub fn is_destructible(&self) -> bool {
        matches!(self, ObstacleKind::Wall { .. } | ObstacleKind::ElectricWall { .. })
    }
}

/// A hazard the player must avoid
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: u32,
    /// Lane the obstacle was spawned in (moving spikes drift off its x)
    pub lane: Lane,
    pub x: f32,
    pub z: f32,
    pub size: f32,
    pub surface: Surface,
    pub kind: ObstacleKind,
}

impl Obstacle {
    pub fn new(id: u32, lane: Lane, z: f32, surface: Surface, kind: ObstacleKind) -> Self {
        Self {
            id,
            lane,
            x: lane.x(),
            z,
            size: OBSTACLE_SIZE,
            surface,
            kind,
        }
    }

    /// Advance the animated pose of dynamic kinds
    pub fn animate(&mut self, dt: f32) {
        match &mut self.kind {
            ObstacleKind::MovingSpike {
                base_x,
                move_range,
                move_speed,
                move_phase,
                ..
            } => {
                *move_phase += dt * *move_speed;
                self.x = *base_x + *move_range * move_phase.sin();
            }
            ObstacleKind::RotatingBlade {
                rotation,
                rotate_speed,
                ..
            } => {
                *rotation = (*rotation + dt * *rotate_speed).rem_euclid(360.0);
            }
            ObstacleKind::ElectricWall {
                pulse_phase,
                energy,
                ..
            } => {
                *pulse_phase += dt * 3.0;
                *energy = 0.5 + 0.5 * pulse_phase.sin();
            }
            _ => {}
        }
    }
}

/// Coin flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoinKind {
    /// +1 orb, +10 score
    Normal,
    /// -1 orb and an explosion
    Trap,
}

/// How long a collected trap coin stays visible (seconds)
pub const COIN_FADE_SECS: f64 = 0.25;
/// Explosion burst size and lifetime for trap coins
pub const EXPLOSION_PARTICLES: usize = 18;
pub const EXPLOSION_LIFE: f32 = 0.6;
/// Gravity applied to loose particles (units/s²)
pub const PARTICLE_GRAVITY: f32 = 7.0;

/// A collectible orb hovering above a surface
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Coin {
    pub id: u32,
    pub lane: Lane,
    pub surface: Surface,
    pub z: f32,
    pub radius: f32,
    pub kind: CoinKind,
    pub alive: bool,
    /// Set for trap coins so the renderer can fade them out
    pub collected_at: Option<f64>,
    /// Spin for rendering (degrees)
    pub rot_deg: f32,
    /// Explosion burst owned by a collected trap coin
    pub explosion: Vec<Particle>,
}

impl Coin {
    pub fn new(id: u32, lane: Lane, surface: Surface, z: f32, kind: CoinKind) -> Self {
        Self {
            id,
            lane,
            surface,
            z,
            radius: 0.22,
            kind,
            alive: true,
            collected_at: None,
            rot_deg: 0.0,
            explosion: Vec::new(),
        }
    }

    /// Alive and not yet picked up
    #[inline]
    pub fn is_available(&self) -> bool {
        self.alive && self.collected_at.is_none()
    }

    /// Height the coin floats at
    pub fn y(&self) -> f32 {
        match self.surface {
            Surface::Floor => -0.6,
            Surface::Ceiling => 0.6,
        }
    }

    /// Mark the coin collected; trap coins burst into particles
    pub fn collect<R: Rng + ?Sized>(&mut self, now: f64, rng: &mut R) {
        self.alive = false;
        match self.kind {
            CoinKind::Normal => self.collected_at = None,
            CoinKind::Trap => {
                self.collected_at = Some(now);
                self.spawn_explosion(rng);
            }
        }
    }

    fn spawn_explosion<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let origin = Vec3::new(self.lane.x(), self.y(), self.z);
        let sign = self.surface.gravity_sign();
        for _ in 0..EXPLOSION_PARTICLES {
            let angle = rng.random_range(0.0..std::f32::consts::TAU);
            let speed = rng.random_range(1.5..=3.0);
            let vel = Vec3::new(
                speed * angle.cos(),
                rng.random_range(1.0..=2.2) * sign,
                speed * angle.sin(),
            );
            self.explosion.push(Particle {
                pos: origin,
                vel,
                life: EXPLOSION_LIFE,
                size: rng.random_range(0.06..=0.12),
            });
        }
    }

    /// Spin and advance the explosion burst
    pub fn update(&mut self, dt: f32) {
        self.rot_deg = (self.rot_deg + 120.0 * dt).rem_euclid(360.0);
        if !self.explosion.is_empty() {
            let gravity = PARTICLE_GRAVITY * self.surface.gravity_sign();
            update_particles(&mut self.explosion, gravity, dt);
        }
    }
}

/// A player projectile flying away from the player
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bullet {
    pub id: u32,
    pub lane: Lane,
    pub surface: Surface,
    pub z: f32,
    pub alive: bool,
}

impl Bullet {
    pub fn fly(&mut self, speed: f32, dt: f32) {
        self.z -= speed * dt;
        if self.z < BULLET_MAX_RANGE_Z {
            self.alive = false;
        }
    }
}

/// Short-lived debris/explosion particle (cosmetic)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec3,
    pub vel: Vec3,
    /// Seconds remaining
    pub life: f32,
    pub size: f32,
}

/// Wall debris burst size and lifetime
pub const WALL_DEBRIS_PARTICLES: usize = 14;
pub const WALL_DEBRIS_LIFE: f32 = 0.8;

/// Debris thrown off a wall destroyed by a bullet
pub fn wall_debris<R: Rng + ?Sized>(x: f32, z: f32, surface: Surface, rng: &mut R) -> Vec<Particle> {
    let y = match surface {
        Surface::Floor => -0.25 + 0.2,
        Surface::Ceiling => 0.25 - 0.2,
    };
    let down = surface.gravity_sign();
    (0..WALL_DEBRIS_PARTICLES)
        .map(|_| Particle {
            pos: Vec3::new(
                x + rng.random_range(-0.3..=0.3),
                y,
                z + rng.random_range(-0.2..=0.2),
            ),
            vel: Vec3::new(
                rng.random_range(-1.2..=1.2),
                rng.random_range(1.2..=2.4) * down,
                rng.random_range(-0.8..=0.8),
            ),
            life: WALL_DEBRIS_LIFE,
            size: rng.random_range(0.08..=0.16),
        })
        .collect()
}

/// Integrate particles under `gravity` (signed, along y) and drop dead ones
pub fn update_particles(particles: &mut Vec<Particle>, gravity: f32, dt: f32) {
    for p in particles.iter_mut() {
        p.vel.y += gravity * dt;
        p.pos += p.vel * dt;
        p.life -= dt;
    }
    particles.retain(|p| p.life > 0.0);
}
