//! Per-frame simulation tick
//!
//! Drives the phase machine and, while playing, advances every subsystem in
//! a fixed order: abilities, combo, difficulty, scroll/cull/spawn, bullets,
//! platform contact, coins and finally the obstacle hit test.

use super::ability::{AUTO_FLIP_DANGER_Z, AUTO_FLIP_LANE_TOLERANCE, Ability};
use super::collision::{collect_coins, detect_collision, obstacle_hit, resolve_bullets, resolve_platforms};
use super::entity::{Bullet, CoinKind, PARTICLE_GRAVITY, Surface, update_particles};
use super::lifecycle::advance_and_cull;
use super::spawn::{spawn_all, spawn_coins, spawn_obstacles, spawn_platforms};
use super::state::{DeathCause, GameEvent, GamePhase, World};
use crate::consts::*;
use crate::tuning::ThemeId;

/// Lateral input as the player sees it on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaneShift {
    Left,
    Right,
}

/// Free forward/back movement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepDir {
    Forward,
    Back,
}

/// Input commands for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Change lane (mirrored on the ceiling)
    pub lane: Option<LaneShift>,
    /// Toggle floor/ceiling
    pub flip: bool,
    pub step: Option<StepDir>,
    /// Fire a bullet (subject to cooldown)
    pub fire: bool,
    /// Buy and start an ability
    pub ability: Option<Ability>,
    /// Welcome: continue; Tutorial: next page
    pub confirm: bool,
    /// Tutorial: previous page; ThemeSelect: back to Welcome
    pub back: bool,
    /// ThemeSelect: pick a theme
    pub theme: Option<ThemeId>,
    /// GameOver: accept (true) or decline (false) the revive offer
    pub revive: Option<bool>,
    /// Abandon everything and return to Welcome
    pub restart: bool,
}

/// Advance the world by `dt` seconds, with `now` the driver's clock.
pub fn tick(world: &mut World, input: &TickInput, dt: f32, now: f64) {
    world.events.clear();
    world.now = now;

    if input.restart {
        restart(world);
        return;
    }

    match world.phase {
        GamePhase::Welcome => {
            if input.confirm {
                world.set_phase(GamePhase::ThemeSelect);
            }
        }
        GamePhase::ThemeSelect => {
            if let Some(theme) = input.theme {
                log::info!("Theme selected: {}", theme.as_str());
                world.theme = theme;
                world.tutorial_step = 0;
                world.set_phase(GamePhase::Tutorial);
            } else if input.back {
                world.set_phase(GamePhase::Welcome);
            }
        }
        GamePhase::Tutorial => {
            if input.confirm {
                if world.tutorial_step + 1 >= world.tuning.tutorial_steps {
                    start_run(world);
                } else {
                    world.tutorial_step += 1;
                }
            } else if input.back {
                world.tutorial_step = world.tutorial_step.saturating_sub(1);
            }
        }
        GamePhase::Playing => {
            apply_input(world, input, now);
            step_playing(world, dt, now);
        }
        GamePhase::GameOver => {
            if world.player.revive_available {
                match input.revive {
                    Some(true) => {
                        revive(world, now);
                    }
                    Some(false) => decline_revive(world, now),
                    None => {}
                }
            }
        }
    }

    debug_assert!(
        world.obstacles.iter().all(|o| o.z <= CULL_Z),
        "obstacle left the simulation window"
    );
}

/// Clear the world and enter Playing with freshly seeded entities
pub fn start_run(world: &mut World) {
    world.reset_run();
    world.set_phase(GamePhase::Playing);
    spawn_all(world);
    log::info!(
        "Run started (seed {}, theme {})",
        world.seed,
        world.theme.as_str()
    );
}

/// Full reset back to the welcome screen; the high score survives.
///
/// A run still waiting on its revive choice is recorded first.
pub fn restart(world: &mut World) {
    if world.phase == GamePhase::GameOver && world.player.revive_available {
        let now = world.now;
        finish_run(world, now);
    }
    world.reset_run();
    world.set_phase(GamePhase::Welcome);
}

/// Lane change as seen on screen: mirrored on the ceiling, swapped again
/// under InvertedControls
fn lane_delta(world: &World, shift: LaneShift) -> i32 {
    let mut delta = match shift {
        LaneShift::Left => -1,
        LaneShift::Right => 1,
    };
    if world.player.surface == Surface::Ceiling {
        delta = -delta;
    }
    if world.player.abilities.is_active(Ability::InvertedControls) {
        delta = -delta;
    }
    delta
}

fn apply_input(world: &mut World, input: &TickInput, now: f64) {
    if let Some(shift) = input.lane {
        let delta = lane_delta(world, shift);
        world.player.shift_lane(delta);
    }

    if input.flip {
        flip_surface(world);
        // A player-initiated flip buys a short grace window
        let until = now + world.tuning.flip_grace;
        world.player.abilities.grant(Ability::CheatMode, until);
    }

    match input.step {
        Some(StepDir::Forward) => world.player.step_z(-PLAYER_Z_STEP),
        Some(StepDir::Back) => world.player.step_z(PLAYER_Z_STEP),
        None => {}
    }

    if input.fire {
        fire_bullet(world, now);
    }

    if let Some(ability) = input.ability {
        let player = &mut world.player;
        if player.abilities.activate(ability, &mut player.orbs, now) {
            log::info!("{ability:?} activated ({} orbs left)", player.orbs);
            world.events.push(GameEvent::AbilityActivated(ability));
        } else {
            log::debug!("{ability:?} refused ({} orbs)", player.orbs);
        }
    }
}

fn flip_surface(world: &mut World) {
    let surface = world.player.flip_surface();
    world.events.push(GameEvent::SurfaceFlipped(surface));
}

/// Spawn a bullet unless the cooldown is still running
fn fire_bullet(world: &mut World, now: f64) -> bool {
    let player = &mut world.player;
    let cooldown = world.tuning.bullet_cooldown;
    if player.last_shot_at.is_some_and(|last| now - last < cooldown) {
        return false;
    }
    player.last_shot_at = Some(now);
    let bullet = Bullet {
        id: world.ids.next_id(),
        lane: player.lane,
        surface: player.surface,
        z: player.z_offset - 0.2,
        alive: true,
    };
    world.events.push(GameEvent::BulletFired {
        bullet_id: bullet.id,
    });
    world.bullets.push(bullet);
    true
}

/// Obstacle on the player's surface about to reach them in their lane
fn danger_ahead(world: &World) -> bool {
    let px = world.player.x();
    world.active_obstacles().any(|o| {
        (o.x - px).abs() < AUTO_FLIP_LANE_TOLERANCE && (-AUTO_FLIP_DANGER_Z..=0.0).contains(&o.z)
    })
}

fn step_playing(world: &mut World, dt: f32, now: f64) {
    // Abilities
    for ability in world.player.abilities.expire(now) {
        log::debug!("{ability:?} expired");
        world.events.push(GameEvent::AbilityExpired(ability));
    }
    if world.player.abilities.random_flip_due(dt) {
        flip_surface(world);
    }
    if world.player.abilities.is_active(Ability::AutoFlipSafety) && danger_ahead(world) {
        flip_surface(world);
    }
    world.player.combo.update(dt, now);

    // Difficulty is a pure function of score
    world.difficulty = world.difficulty_controller().update(world.player.score);
    let dz = world.difficulty.forward_speed * dt;

    // Obstacles
    for obs in world.obstacles.iter_mut() {
        obs.animate(dt);
    }
    advance_and_cull(&mut world.obstacles, dz, now);
    spawn_obstacles(world);

    // Platforms
    for p in world.platforms.iter_mut() {
        if p.update(dt, &mut world.rng) {
            world.events.push(GameEvent::PlatformBroke { platform_id: p.id });
        }
    }
    advance_and_cull(&mut world.platforms, dz, now);
    spawn_platforms(world);

    // Coins
    for c in world.coins.iter_mut() {
        c.update(dt);
    }
    advance_and_cull(&mut world.coins, dz, now);
    spawn_coins(world);

    // Bullets and walls
    let bullet_speed = world.tuning.bullet_speed;
    for b in world.bullets.iter_mut() {
        b.fly(bullet_speed, dt);
    }
    world.bullets.retain(|b| b.alive);
    let hits = resolve_bullets(
        world.player.surface,
        bullet_speed * dt + dz,
        &mut world.bullets,
        &mut world.obstacles,
        &mut world.debris,
        &mut world.rng,
    );
    for hit in hits {
        world.events.push(GameEvent::WallBroken {
            obstacle_id: hit.obstacle_id,
            x: hit.x,
            z: hit.z,
        });
        if let Some(bonus) = world.player.combo.award_wall_break(now) {
            world.player.orbs += bonus.orbs;
            world.player.add_score(bonus.score);
            world.events.push(GameEvent::StreakBonus {
                orbs: bonus.orbs,
                score: bonus.score,
            });
        }
    }
    let gravity = PARTICLE_GRAVITY * world.player.surface.gravity_sign();
    update_particles(&mut world.debris, gravity, dt);

    // Platform contact
    let contact = resolve_platforms(&world.player, &mut world.platforms);
    for platform_id in contact.cracked {
        world.events.push(GameEvent::PlatformCracking { platform_id });
    }
    if let Some(platform_id) = contact.fell_through {
        end_run(world, DeathCause::FellThrough { platform_id }, now);
        return;
    }

    // Coins
    let collected = collect_coins(&mut world.player, &mut world.coins, now, &mut world.rng);
    for (coin_id, kind) in collected {
        world.events.push(match kind {
            CoinKind::Normal => GameEvent::CoinCollected { coin_id },
            CoinKind::Trap => GameEvent::TrapTriggered { coin_id },
        });
    }

    // Obstacles
    if detect_collision(&world.player, &world.obstacles) {
        let obstacle_id = obstacle_hit(&world.player, &world.obstacles).map_or(0, |o| o.id);
        end_run(world, DeathCause::Crash { obstacle_id }, now);
        return;
    }

    let distance = f64::from(world.difficulty.forward_speed * dt);
    world.player.add_score(distance);
}

fn end_run(world: &mut World, cause: DeathCause, now: f64) {
    let player = &mut world.player;
    player.is_game_over = true;
    player.high_score = player.high_score.max(player.score);
    player.revive_available = player.orbs >= world.tuning.revive_cost;
    log::info!(
        "Run ended: {cause:?}, score {:.0}, orbs {}, revive {}",
        player.score,
        player.orbs,
        if player.revive_available { "offered" } else { "unavailable" }
    );
    let revive_available = player.revive_available;
    if revive_available {
        let score = player.score.max(0.0) as u64;
        if let Some(rank) = world.high_scores.potential_rank(score) {
            log::info!("Declining the revive would place #{rank}");
        }
    }
    world.events.push(GameEvent::RunEnded(cause));
    world.set_phase(GamePhase::GameOver);
    if !revive_available {
        finish_run(world, now);
    }
}

/// Record the final score of a run that will not continue
fn finish_run(world: &mut World, now: f64) {
    let player = &world.player;
    let score = player.score.max(0.0) as u64;
    if let Some(rank) = world.high_scores.add_score(score, world.theme, player.orbs, now) {
        log::info!("New high score #{rank}: {score}");
    }
}

/// Spend orbs to continue after death.
///
/// Clears nearby obstacles, re-enables platform colliders on the active
/// surface and grants a short invulnerability. Returns false if not possible.
pub fn revive(world: &mut World, now: f64) -> bool {
    if world.phase != GamePhase::GameOver || !world.player.revive_available {
        return false;
    }
    if !world.player.spend_orbs(world.tuning.revive_cost) {
        return false;
    }
    let player = &mut world.player;
    player.is_game_over = false;
    player.revive_available = false;

    let (pz, radius) = (player.z_offset, world.tuning.revive_clear_radius);
    world.obstacles.retain(|o| (o.z - pz).abs() > radius);
    let surface = player.surface;
    for p in world.platforms.iter_mut().filter(|p| p.surface == surface) {
        p.collider_enabled = true;
    }
    let until = now + world.tuning.revive_grace;
    world.player.abilities.grant(Ability::CheatMode, until);

    log::info!("Revived ({} orbs left)", world.player.orbs);
    world.events.push(GameEvent::Revived);
    world.set_phase(GamePhase::Playing);
    true
}

fn decline_revive(world: &mut World, now: f64) {
    world.player.revive_available = false;
    log::info!("Revive declined");
    finish_run(world, now);
}
