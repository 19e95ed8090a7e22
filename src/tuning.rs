//! Data-driven game balance
//!
//! Every spawn distance, chance and cost the simulation reads lives in
//! [`Tuning`]. Defaults reproduce the shipped balance; a JSON file can
//! override any subset of fields.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::sim::ObstacleType;

/// Visual/obstacle theme picked on the theme screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ThemeId {
    /// No theme picked; obstacle mix follows the difficulty mode
    #[default]
    Classic,
    City,
    Jungle,
    Space,
}

impl ThemeId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThemeId::Classic => "classic",
            ThemeId::City => "city",
            ThemeId::Jungle => "jungle",
            ThemeId::Space => "space",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "classic" | "none" => Some(ThemeId::Classic),
            "city" | "1" => Some(ThemeId::City),
            "jungle" | "2" => Some(ThemeId::Jungle),
            "space" | "3" => Some(ThemeId::Space),
            _ => None,
        }
    }
}

/// Per-theme parameters consumed by the spawner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThemeDef {
    pub id: ThemeId,
    /// Passed through to the renderer
    pub ground_color: [f32; 3],
    /// Passed through to the renderer
    pub lane_color: [f32; 3],
    /// Weighted obstacle mix; empty means progressive selection by difficulty
    pub obstacle_weights: Vec<(ObstacleType, f32)>,
}

impl ThemeDef {
    pub fn classic() -> Self {
        Self {
            id: ThemeId::Classic,
            ground_color: [0.1, 0.12, 0.16],
            lane_color: [0.8, 0.8, 0.2],
            obstacle_weights: Vec::new(),
        }
    }

    pub fn city() -> Self {
        use ObstacleType::*;
        Self {
            id: ThemeId::City,
            ground_color: [0.12, 0.12, 0.12],
            lane_color: [0.9, 0.9, 0.3],
            obstacle_weights: vec![
                (Car, 0.30),
                (Barrier, 0.20),
                (Cone, 0.20),
                (Bus, 0.15),
                (Cube, 0.15),
            ],
        }
    }

    pub fn jungle() -> Self {
        use ObstacleType::*;
        Self {
            id: ThemeId::Jungle,
            ground_color: [0.09, 0.12, 0.09],
            lane_color: [0.6, 0.8, 0.3],
            obstacle_weights: vec![
                (Stone, 0.35),
                (Pillar, 0.25),
                (Log, 0.20),
                (Trap, 0.15),
                (Cube, 0.05),
            ],
        }
    }

    pub fn space() -> Self {
        use ObstacleType::*;
        Self {
            id: ThemeId::Space,
            ground_color: [0.08, 0.09, 0.12],
            lane_color: [0.5, 0.8, 1.0],
            obstacle_weights: vec![
                (Drone, 0.30),
                (Ring, 0.25),
                (Gate, 0.25),
                (Ball, 0.10),
                (Cube, 0.10),
            ],
        }
    }
}

/// Game balance parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Speed ===
    /// Forward speed at difficulty factor 1.0 (units/s)
    pub base_forward_speed: f32,

    // === Obstacles ===
    pub spawn_distance_min: f32,
    pub spawn_distance_max: f32,
    /// Minimum z gap between obstacles sharing a lane
    pub min_gap_z: f32,
    pub min_obstacles_on_screen: usize,
    /// Bound on the safety top-up loop
    pub obstacle_fill_attempts: u32,
    /// Obstacles placed when the field is empty
    pub initial_obstacles: u32,
    /// Chance (HARD only) to substitute a dynamic obstacle
    pub hard_dynamic_chance: f64,
    /// Chance to substitute a breakable wall
    pub wall_chance: f64,

    // === Platforms ===
    pub platform_spawn_min: f32,
    pub platform_spawn_max: f32,
    pub platform_min_gap_z: f32,
    pub initial_platforms: u32,
    pub breakable_chance: f64,
    pub initial_breakable_chance: f64,
    /// Seconds between the player stepping on a breakable and it breaking
    pub break_delay: f32,

    // === Coins ===
    pub orb_spawn_min_gap: f32,
    pub orb_spawn_max_gap: f32,
    pub trap_coin_chance: f64,
    pub lane_trap_coin_chance: f64,

    // === Bullets ===
    pub bullet_speed: f32,
    pub bullet_cooldown: f64,

    // === Run flow ===
    pub revive_cost: u32,
    /// Obstacles within this z distance of the player are cleared on revive
    pub revive_clear_radius: f32,
    /// Invulnerability granted by a revive (seconds)
    pub revive_grace: f64,
    /// Free invulnerability granted by a surface toggle (seconds)
    pub flip_grace: f64,
    pub tutorial_steps: u8,

    // === Themes ===
    pub themes: Vec<ThemeDef>,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            base_forward_speed: 12.0,

            spawn_distance_min: 20.0,
            spawn_distance_max: 40.0,
            min_gap_z: 4.0,
            min_obstacles_on_screen: 6,
            obstacle_fill_attempts: 24,
            initial_obstacles: 14,
            hard_dynamic_chance: 0.30,
            wall_chance: 0.40,

            platform_spawn_min: 16.0,
            platform_spawn_max: 30.0,
            platform_min_gap_z: 6.0,
            initial_platforms: 10,
            breakable_chance: 0.55,
            initial_breakable_chance: 0.60,
            break_delay: 0.1,

            orb_spawn_min_gap: 10.0,
            orb_spawn_max_gap: 24.0,
            trap_coin_chance: 0.15,
            lane_trap_coin_chance: 0.12,

            bullet_speed: 28.0,
            bullet_cooldown: 0.20,

            revive_cost: 15,
            revive_clear_radius: 4.0,
            revive_grace: 3.0,
            flip_grace: 1.0,
            tutorial_steps: 6,

            themes: vec![
                ThemeDef::classic(),
                ThemeDef::city(),
                ThemeDef::jungle(),
                ThemeDef::space(),
            ],
        }
    }
}

impl Tuning {
    /// Look up a theme; unknown ids fall back to the first entry (or Classic)
    pub fn theme(&self, id: ThemeId) -> ThemeDef {
        self.themes
            .iter()
            .find(|t| t.id == id)
            .or_else(|| self.themes.first())
            .cloned()
            .unwrap_or_else(ThemeDef::classic)
    }

    /// Check that every range and chance is usable by the spawner
    pub fn validate(&self) -> Result<()> {
        fn range(name: &str, lo: f32, hi: f32) -> Result<()> {
            if lo.is_finite() && hi.is_finite() && lo >= 0.0 && lo <= hi {
                Ok(())
            } else {
                Err(Error::InvalidTuning(format!(
                    "{name}: expected 0 <= min <= max, got {lo}..{hi}"
                )))
            }
        }
        fn chance(name: &str, p: f64) -> Result<()> {
            if (0.0..=1.0).contains(&p) {
                Ok(())
            } else {
                Err(Error::InvalidTuning(format!("{name}: {p} is not a probability")))
            }
        }

        if !(self.base_forward_speed > 0.0) {
            return Err(Error::InvalidTuning(format!(
                "base_forward_speed must be positive, got {}",
                self.base_forward_speed
            )));
        }
        range("spawn_distance", self.spawn_distance_min, self.spawn_distance_max)?;
        range("platform_spawn", self.platform_spawn_min, self.platform_spawn_max)?;
        range("orb_spawn_gap", self.orb_spawn_min_gap, self.orb_spawn_max_gap)?;
        range("min_gap_z", 0.0, self.min_gap_z)?;
        range("platform_min_gap_z", 0.0, self.platform_min_gap_z)?;
        chance("hard_dynamic_chance", self.hard_dynamic_chance)?;
        chance("wall_chance", self.wall_chance)?;
        chance("breakable_chance", self.breakable_chance)?;
        chance("initial_breakable_chance", self.initial_breakable_chance)?;
        chance("trap_coin_chance", self.trap_coin_chance)?;
        chance("lane_trap_coin_chance", self.lane_trap_coin_chance)?;
        if self.tutorial_steps == 0 {
            return Err(Error::InvalidTuning("tutorial_steps must be at least 1".into()));
        }

        for theme in &self.themes {
            if let Some((kind, w)) = theme
                .obstacle_weights
                .iter()
                .find(|(_, w)| !(w.is_finite() && *w > 0.0))
            {
                return Err(Error::InvalidTuning(format!(
                    "theme {}: weight {w} for {kind:?} must be positive",
                    theme.id.as_str()
                )));
            }
        }
        Ok(())
    }

    /// Parse and validate a JSON tuning document
    pub fn from_json(json: &str) -> Result<Self> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Load tuning from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let tuning = Self::from_json(&json)?;
        log::info!("Loaded tuning from {}", path.display());
        Ok(tuning)
    }

    /// Save tuning as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        log::info!("Tuning saved to {}", path.as_ref().display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tuning_is_valid() {
        assert!(Tuning::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let tuning = Tuning::from_json(r#"{ "revive_cost": 20 }"#).unwrap();
        assert_eq!(tuning.revive_cost, 20);
        assert_eq!(tuning.min_obstacles_on_screen, 6);
        assert_eq!(tuning.themes.len(), 4);
    }

    #[test]
    fn test_rejects_inverted_range() {
        let err = Tuning::from_json(r#"{ "spawn_distance_min": 50.0, "spawn_distance_max": 10.0 }"#)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidTuning(_)));
    }

    #[test]
    fn test_rejects_non_positive_weight() {
        let mut tuning = Tuning::default();
        tuning.themes[1].obstacle_weights.push((ObstacleType::Cube, 0.0));
        assert!(matches!(tuning.validate(), Err(Error::InvalidTuning(_))));
    }

    #[test]
    fn test_rejects_garbage_json() {
        assert!(matches!(Tuning::from_json("{ nope"), Err(Error::Json(_))));
    }

    #[test]
    fn test_theme_lookup() {
        let tuning = Tuning::default();
        assert_eq!(tuning.theme(ThemeId::Jungle).id, ThemeId::Jungle);
        assert!(tuning.theme(ThemeId::Classic).obstacle_weights.is_empty());

        let empty = Tuning {
            themes: Vec::new(),
            ..Tuning::default()
        };
        assert_eq!(empty.theme(ThemeId::Space).id, ThemeId::Classic);
    }

    #[test]
    fn test_theme_id_parsing() {
        assert_eq!(ThemeId::from_str("CITY"), Some(ThemeId::City));
        assert_eq!(ThemeId::from_str("3"), Some(ThemeId::Space));
        assert_eq!(ThemeId::from_str("desert"), None);
    }

    #[test]
    fn test_save_and_load_file() {
        let path = std::env::temp_dir().join(format!("flip_runner_tuning_{}.json", std::process::id()));
        let mut tuning = Tuning::default();
        tuning.wall_chance = 0.25;
        tuning.save(&path).unwrap();
        let loaded = Tuning::load(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert!((loaded.wall_chance - 0.25).abs() < 1e-9);
    }
}
