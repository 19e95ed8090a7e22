//! Flip Runner headless driver
//!
//! Plays one run with a simple autopilot at 60 Hz synthetic time and prints
//! a JSON summary. Useful for balancing tuning files and for replaying a
//! seed deterministically.

use std::path::PathBuf;

use clap::Parser;
use serde::Serialize;

use flip_runner::consts::CULL_Z;
use flip_runner::sim::{
    Ability, BreakState, Clock, DeathCause, GameEvent, GamePhase, Lane, LaneShift, Surface, TickInput,
    World, tick,
};
use flip_runner::{HighScores, ThemeId, Tuning};

/// Synthetic frame rate of the driver
const FRAME_HZ: f64 = 60.0;
/// Seconds of travel the autopilot looks ahead
const LOOKAHEAD_SECS: f32 = 0.35;
/// Walls closer than this are worth shooting
const FIRE_RANGE: f32 = 25.0;

#[derive(Parser, Debug)]
#[command(name = "flip-runner", about = "Headless Flip Runner simulation", version)]
struct Args {
    /// RNG seed for the run
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Simulated seconds before the driver stops
    #[arg(long, default_value_t = 120.0)]
    seconds: f64,

    /// Theme: classic, city, jungle or space
    #[arg(long, default_value = "classic", value_parser = parse_theme)]
    theme: ThemeId,

    /// JSON tuning file overriding the built-in balance
    #[arg(long)]
    tuning: Option<PathBuf>,

    /// JSON high score file to load and update
    #[arg(long)]
    scores: Option<PathBuf>,
}

fn parse_theme(s: &str) -> Result<ThemeId, String> {
    ThemeId::from_str(s).ok_or_else(|| format!("unknown theme '{s}'"))
}

/// JSON summary printed at the end of the run
#[derive(Debug, Serialize)]
struct RunSummary {
    seed: u64,
    theme: ThemeId,
    phase: GamePhase,
    simulated_seconds: f64,
    score: f64,
    high_score: f64,
    orbs: u32,
    difficulty: &'static str,
    forward_speed: f32,
    walls_broken: u32,
    coins_collected: u32,
    traps_triggered: u32,
    revives: u32,
    deaths: Vec<DeathCause>,
    leaderboard_top: Option<u64>,
}

/// Whether standing in `lane` on `surface` is safe for the next moment
fn lane_is_safe(world: &World, lane: Lane, surface: Surface) -> bool {
    let x = lane.x();
    let pz = world.player.z_offset;
    let reach = world.difficulty.forward_speed * LOOKAHEAD_SECS;

    let obstacle_clear = !world.obstacles.iter().any(|o| {
        let r = o.kind.collision_radius() + 0.3;
        o.surface == surface && (o.x - x).abs() < r && o.z >= pz - reach - r && o.z <= pz + r
    });
    let floor_clear = !world.platforms.iter().any(|p| {
        if p.surface != surface || p.lane != lane {
            return false;
        }
        // A broken slab whose collider came back after a revive is solid again
        let hazard = match p.break_state() {
            None => false,
            Some(BreakState::Broken) => !p.collider_enabled,
            Some(_) => true,
        };
        let fp = p.footprint();
        hazard && fp.z0 <= pz + 0.4 && fp.z1 >= pz - reach
    });
    obstacle_clear && floor_clear
}

/// Screen-space shift that moves the player by `delta` lanes
fn screen_shift(world: &World, delta: i32) -> LaneShift {
    let mut sign = delta;
    if world.player.surface == Surface::Ceiling {
        sign = -sign;
    }
    if world.player.abilities.is_active(Ability::InvertedControls) {
        sign = -sign;
    }
    if sign < 0 { LaneShift::Left } else { LaneShift::Right }
}

/// Pick this frame's input: dodge, shoot walls, revive when offered
fn autopilot(world: &World, theme: ThemeId) -> TickInput {
    let mut input = TickInput::default();
    match world.phase {
        GamePhase::Welcome | GamePhase::Tutorial => input.confirm = true,
        GamePhase::ThemeSelect => input.theme = Some(theme),
        GamePhase::GameOver => input.revive = Some(world.player.revive_available),
        GamePhase::Playing => {
            let player = &world.player;
            let pz = player.z_offset;

            input.fire = world.obstacles.iter().any(|o| {
                o.surface == player.surface
                    && o.lane == player.lane
                    && o.kind.is_destructible()
                    && o.z < pz
                    && o.z > pz - FIRE_RANGE
            });

            if lane_is_safe(world, player.lane, player.surface) {
                return input;
            }
            for delta in [-1, 1] {
                let lane = player.lane.shifted(delta);
                if lane != player.lane && lane_is_safe(world, lane, player.surface) {
                    input.lane = Some(screen_shift(world, delta));
                    return input;
                }
            }
            let other = player.surface.flipped();
            if lane_is_safe(world, player.lane, other) {
                input.flip = true;
            } else if !player.abilities.is_invulnerable() && player.orbs >= Ability::Shield.cost() {
                input.ability = Some(Ability::Shield);
            }
        }
    }
    input
}

fn main() -> flip_runner::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let tuning = match &args.tuning {
        Some(path) => Tuning::load(path)?,
        None => Tuning::default(),
    };
    let mut world = World::with_tuning(args.seed, tuning);
    if let Some(path) = &args.scores {
        world.high_scores = HighScores::load(path)?;
        world.player.high_score = world.high_scores.top_score().unwrap_or(0) as f64;
    }

    log::info!(
        "Starting headless run (seed={}, theme={}, seconds={})",
        args.seed,
        args.theme.as_str(),
        args.seconds
    );

    let mut clock = Clock::default();
    let frames = (args.seconds * FRAME_HZ).max(0.0) as u64;
    let mut summary = RunSummary {
        seed: args.seed,
        theme: args.theme,
        phase: world.phase,
        simulated_seconds: 0.0,
        score: 0.0,
        high_score: 0.0,
        orbs: 0,
        difficulty: "",
        forward_speed: 0.0,
        walls_broken: 0,
        coins_collected: 0,
        traps_triggered: 0,
        revives: 0,
        deaths: Vec::new(),
        leaderboard_top: None,
    };

    let mut now = 0.0;
    for frame in 0..frames {
        now = frame as f64 / FRAME_HZ;
        let dt = clock.tick(now);
        let input = autopilot(&world, args.theme);
        tick(&mut world, &input, dt, now);

        for event in &world.events {
            match event {
                GameEvent::WallBroken { .. } => summary.walls_broken += 1,
                GameEvent::CoinCollected { .. } => summary.coins_collected += 1,
                GameEvent::TrapTriggered { .. } => summary.traps_triggered += 1,
                GameEvent::Revived => summary.revives += 1,
                GameEvent::RunEnded(cause) => summary.deaths.push(*cause),
                GameEvent::StreakBonus { orbs, .. } => log::info!("Streak bonus: +{orbs} orbs"),
                _ => {}
            }
        }

        if world.phase == GamePhase::GameOver && !world.player.revive_available {
            break;
        }
    }

    debug_assert!(world.obstacles.iter().all(|o| o.z <= CULL_Z));
    log::info!(
        "Run finished in {:?} after {:.1}s: score {:.0}, {} deaths",
        world.phase,
        now,
        world.player.score,
        summary.deaths.len()
    );

    if let Some(path) = &args.scores {
        world.high_scores.save(path)?;
    }

    summary.phase = world.phase;
    summary.simulated_seconds = now;
    summary.score = world.player.score;
    summary.high_score = world.player.high_score.max(world.player.score);
    summary.orbs = world.player.orbs;
    summary.difficulty = world.difficulty.mode.as_str();
    summary.forward_speed = world.difficulty.forward_speed;
    summary.leaderboard_top = world.high_scores.top_score();

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
