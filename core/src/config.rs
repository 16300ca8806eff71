//! Stage configuration and up-front validation.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Maximum deviation from 1.0 tolerated when summing coin strategy weights.
pub const WEIGHT_TOLERANCE: f64 = 0.001;

/// Parameters for grid seeding and the cellular automaton.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CaveConfig {
    /// Number of columns in the generated grid.
    pub width: u32,
    /// Number of rows in the generated grid.
    pub height: u32,
    /// Probability that a seeded interior cell starts as a wall.
    pub initial_wall_ratio: f64,
    /// Number of automaton iterations.
    pub simulation_steps: u32,
    /// A floor cell with at least this many wall neighbours becomes a wall.
    pub birth_threshold: u8,
    /// A wall cell with at least this many wall neighbours stays a wall.
    pub survival_threshold: u8,
    /// Number of micro-smoothing passes applied after the automaton.
    #[serde(default = "default_smoothing_passes")]
    pub smoothing_passes: u32,
    /// Forces the outermost ring of cells to wall while seeding.
    #[serde(default = "default_solid_border")]
    pub solid_border: bool,
    /// Floor regions smaller than this are filled in before carving corridors.
    #[serde(default = "default_min_region_size")]
    pub min_region_size: usize,
}

impl Default for CaveConfig {
    fn default() -> Self {
        Self {
            width: 100,
            height: 40,
            initial_wall_ratio: 0.45,
            simulation_steps: 5,
            birth_threshold: 5,
            survival_threshold: 4,
            smoothing_passes: default_smoothing_passes(),
            solid_border: default_solid_border(),
            min_region_size: default_min_region_size(),
        }
    }
}

impl CaveConfig {
    /// Rejects dimensions, ratios and thresholds outside their accepted ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width < 3 || self.height < 3 {
            return Err(ConfigError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        check_unit("initial_wall_ratio", self.initial_wall_ratio)?;
        check_threshold("birth_threshold", self.birth_threshold)?;
        check_threshold("survival_threshold", self.survival_threshold)?;
        Ok(())
    }
}

fn default_smoothing_passes() -> u32 {
    2
}

fn default_solid_border() -> bool {
    true
}

fn default_min_region_size() -> usize {
    30
}

/// Movement constants used to derive the jump envelope.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Downward acceleration in pixels per second squared.
    pub gravity: f64,
    /// Initial upward velocity of a jump in pixels per second.
    pub jump_velocity: f64,
    /// Horizontal run speed in pixels per second.
    pub move_speed: f64,
    /// Edge length of a tile in pixels.
    pub tile_size: f64,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: 980.0,
            jump_velocity: 450.0,
            move_speed: 200.0,
            tile_size: 32.0,
        }
    }
}

impl PhysicsConfig {
    /// Requires every constant to be finite and strictly positive.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_positive("gravity", self.gravity)?;
        check_positive("jump_velocity", self.jump_velocity)?;
        check_positive("move_speed", self.move_speed)?;
        check_positive("tile_size", self.tile_size)?;
        Ok(())
    }
}

/// Player spawn placement parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnConfig {
    /// Number of candidates sampled before giving up.
    pub max_attempts: u32,
    /// Fraction of the map width, measured from the left edge, the spawn must lie within.
    pub left_side_boundary: f64,
    /// Requires the spawn tile to stand on solid ground.
    pub require_ground: bool,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            max_attempts: 200,
            left_side_boundary: 0.25,
            require_ground: true,
        }
    }
}

impl SpawnConfig {
    /// Rejects a zero attempt budget or a boundary outside `(0, 1]`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_attempts("spawn.max_attempts", self.max_attempts)?;
        if !(self.left_side_boundary > 0.0 && self.left_side_boundary <= 1.0) {
            return Err(out_of_range(
                "spawn.left_side_boundary",
                self.left_side_boundary,
                "0 < value <= 1",
            ));
        }
        Ok(())
    }
}

/// Goal placement parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GoalConfig {
    /// Number of candidates sampled; the farthest valid one wins.
    pub max_attempts: u32,
    /// Fraction of the map width left of which the goal may not be placed.
    pub right_side_boundary: f64,
    /// Minimum straight-line distance from the spawn in tiles.
    pub min_distance: f64,
    /// Requires the goal to be unreachable before platforms are added.
    pub require_unreachable: bool,
    /// Requires the goal tile to stand on solid ground.
    pub require_ground: bool,
}

impl Default for GoalConfig {
    fn default() -> Self {
        Self {
            max_attempts: 200,
            right_side_boundary: 0.75,
            min_distance: 20.0,
            require_unreachable: true,
            require_ground: true,
        }
    }
}

impl GoalConfig {
    /// Rejects a zero attempt budget, a boundary outside `[0, 1)` or a negative distance.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_attempts("goal.max_attempts", self.max_attempts)?;
        if !(self.right_side_boundary >= 0.0 && self.right_side_boundary < 1.0) {
            return Err(out_of_range(
                "goal.right_side_boundary",
                self.right_side_boundary,
                "0 <= value < 1",
            ));
        }
        check_non_negative("goal.min_distance", self.min_distance)?;
        Ok(())
    }
}

/// Coin distribution parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoinConfig {
    /// Number of coins requested.
    pub coin_count: u32,
    /// Share of coins drawn from dead-end tiles.
    pub dead_end_weight: f64,
    /// Share of coins drawn from tiles far from the map centre.
    pub exploration_weight: f64,
    /// Share of coins drawn from hard-to-reach tiles.
    pub unreachable_weight: f64,
    /// Minimum straight-line spacing between any two coins.
    pub min_distance: f64,
    /// Score value written into each coin.
    pub coin_value: u32,
}

impl Default for CoinConfig {
    fn default() -> Self {
        Self {
            coin_count: 20,
            dead_end_weight: 0.4,
            exploration_weight: 0.35,
            unreachable_weight: 0.25,
            min_distance: 3.0,
            coin_value: 1,
        }
    }
}

impl CoinConfig {
    /// Checked constructor; fails when the weights do not sum to 1.0.
    pub fn new(
        coin_count: u32,
        dead_end_weight: f64,
        exploration_weight: f64,
        unreachable_weight: f64,
        min_distance: f64,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            coin_count,
            dead_end_weight,
            exploration_weight,
            unreachable_weight,
            min_distance,
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Rejects weights outside `[0, 1]`, weights not summing to one and negative spacing.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_unit("coins.dead_end_weight", self.dead_end_weight)?;
        check_unit("coins.exploration_weight", self.exploration_weight)?;
        check_unit("coins.unreachable_weight", self.unreachable_weight)?;
        let total = self.dead_end_weight + self.exploration_weight + self.unreachable_weight;
        if (total - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(ConfigError::WeightsDoNotSumToOne { total });
        }
        check_non_negative("coins.min_distance", self.min_distance)?;
        Ok(())
    }
}

/// Floating platform placement parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    /// Unreachable pockets closer than this are bridged as one group.
    pub grouping_distance: f64,
    /// Width of every placed platform in tiles.
    pub platform_width: u32,
    /// Upper bound on platforms placed per level.
    pub max_platforms: u32,
    /// Candidate footprints evaluated per placement step.
    pub max_candidates: u32,
    /// Share of pocket groups that must be reachable after placement.
    pub min_accessibility_ratio: f64,
    /// Rows below a standing tile scanned for candidate footprints. Falls
    /// are unbounded, so this only limits the candidate search.
    pub drop_search_rows: u32,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            grouping_distance: 3.0,
            platform_width: 3,
            max_platforms: 8,
            max_candidates: 24,
            min_accessibility_ratio: 0.0,
            drop_search_rows: 6,
        }
    }
}

impl PlatformConfig {
    /// Rejects zero-sized platforms and ratios outside `[0, 1]`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_non_negative("platforms.grouping_distance", self.grouping_distance)?;
        if self.platform_width == 0 {
            return Err(out_of_range("platforms.platform_width", 0, ">= 1"));
        }
        check_unit(
            "platforms.min_accessibility_ratio",
            self.min_accessibility_ratio,
        )?;
        Ok(())
    }
}

/// Search algorithms available to the solvability tester.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathfindingMethod {
    /// Heuristic best-first search with a Manhattan heuristic.
    #[serde(rename = "astar")]
    AStar,
    /// Breadth-first search.
    #[serde(rename = "bfs")]
    BreadthFirst,
    /// Depth-first search.
    #[serde(rename = "dfs")]
    DepthFirst,
    /// Dijkstra-style uniform-cost search.
    UniformCost,
}

impl fmt::Display for PathfindingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::AStar => "astar",
            Self::BreadthFirst => "bfs",
            Self::DepthFirst => "dfs",
            Self::UniformCost => "uniform_cost",
        };
        f.write_str(label)
    }
}

/// Solvability tester parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolvabilityConfig {
    /// Method attempted first.
    pub primary_method: PathfindingMethod,
    /// Methods attempted in order once the primary fails.
    pub fallback_methods: Vec<PathfindingMethod>,
    /// Maximum number of methods, primary included, attempted per validation.
    pub max_pathfinding_attempts: u32,
    /// Node expansions allowed per individual search.
    pub max_expansions: u32,
    /// Wall-clock budget in milliseconds above which an advisory warning is issued.
    pub performance_threshold_ms: u64,
}

impl Default for SolvabilityConfig {
    fn default() -> Self {
        Self {
            primary_method: PathfindingMethod::AStar,
            fallback_methods: vec![
                PathfindingMethod::BreadthFirst,
                PathfindingMethod::DepthFirst,
                PathfindingMethod::UniformCost,
            ],
            max_pathfinding_attempts: 4,
            max_expansions: 250_000,
            performance_threshold_ms: 100,
        }
    }
}

impl SolvabilityConfig {
    /// Rejects zero attempt or expansion budgets.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_attempts(
            "solvability.max_pathfinding_attempts",
            self.max_pathfinding_attempts,
        )?;
        check_attempts("solvability.max_expansions", self.max_expansions)?;
        Ok(())
    }

    /// Primary method followed by fallbacks, truncated to the attempt budget.
    #[must_use]
    pub fn method_chain(&self) -> Vec<PathfindingMethod> {
        std::iter::once(self.primary_method)
            .chain(self.fallback_methods.iter().copied())
            .take(self.max_pathfinding_attempts as usize)
            .collect()
    }
}

/// Complete configuration for one pipeline run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Seed string every random draw derives from.
    pub seed: String,
    /// Terrain parameters.
    #[serde(default)]
    pub cave: CaveConfig,
    /// Movement constants.
    #[serde(default)]
    pub physics: PhysicsConfig,
    /// Spawn placement parameters.
    #[serde(default)]
    pub spawn: SpawnConfig,
    /// Goal placement parameters.
    #[serde(default)]
    pub goal: GoalConfig,
    /// Coin distribution parameters.
    #[serde(default)]
    pub coins: CoinConfig,
    /// Platform placement parameters.
    #[serde(default)]
    pub platforms: PlatformConfig,
    /// Solvability tester parameters.
    #[serde(default)]
    pub solvability: SolvabilityConfig,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self::with_seed("cave-forge")
    }
}

impl GenerationConfig {
    /// Default configuration using the provided seed.
    #[must_use]
    pub fn with_seed(seed: impl Into<String>) -> Self {
        Self {
            seed: seed.into(),
            cave: CaveConfig::default(),
            physics: PhysicsConfig::default(),
            spawn: SpawnConfig::default(),
            goal: GoalConfig::default(),
            coins: CoinConfig::default(),
            platforms: PlatformConfig::default(),
            solvability: SolvabilityConfig::default(),
        }
    }

    /// Parses a TOML document and validates every section.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(contents).map_err(|error| ConfigError::Parse(error.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates every stage configuration before any stage runs.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.seed.trim().is_empty() {
            return Err(ConfigError::MissingParameter("seed"));
        }
        self.cave.validate()?;
        self.physics.validate()?;
        self.spawn.validate()?;
        self.goal.validate()?;
        self.coins.validate()?;
        self.platforms.validate()?;
        self.solvability.validate()?;
        Ok(())
    }
}

fn out_of_range(
    parameter: &'static str,
    value: impl fmt::Display,
    expected: &'static str,
) -> ConfigError {
    ConfigError::OutOfRange {
        parameter,
        value: value.to_string(),
        expected,
    }
}

fn check_unit(parameter: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(out_of_range(parameter, value, "0 <= value <= 1"))
    }
}

fn check_threshold(parameter: &'static str, value: u8) -> Result<(), ConfigError> {
    if value <= 8 {
        Ok(())
    } else {
        Err(out_of_range(parameter, value, "0 <= value <= 8"))
    }
}

fn check_positive(parameter: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(out_of_range(parameter, value, "finite value > 0"))
    }
}

fn check_non_negative(parameter: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(out_of_range(parameter, value, "finite value >= 0"))
    }
}

fn check_attempts(parameter: &'static str, value: u32) -> Result<(), ConfigError> {
    if value > 0 {
        Ok(())
    } else {
        Err(out_of_range(parameter, value, ">= 1"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert_eq!(GenerationConfig::default().validate(), Ok(()));
    }

    #[test]
    fn coin_weights_must_sum_to_one() {
        assert!(CoinConfig::new(10, 0.4, 0.35, 0.25, 2.0).is_ok());
        assert!(CoinConfig::new(10, 0.4, 0.35, 0.2505, 2.0).is_ok());
        assert!(matches!(
            CoinConfig::new(10, 0.5, 0.35, 0.25, 2.0),
            Err(ConfigError::WeightsDoNotSumToOne { .. })
        ));
        assert!(matches!(
            CoinConfig::new(10, 0.3, 0.35, 0.25, 2.0),
            Err(ConfigError::WeightsDoNotSumToOne { .. })
        ));
    }

    #[test]
    fn thresholds_above_eight_are_rejected() {
        let config = CaveConfig {
            birth_threshold: 9,
            ..CaveConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OutOfRange {
                parameter: "birth_threshold",
                ..
            })
        ));
    }

    #[test]
    fn empty_seed_is_missing() {
        let config = GenerationConfig::with_seed("   ");
        assert_eq!(
            config.validate(),
            Err(ConfigError::MissingParameter("seed"))
        );
    }

    #[test]
    fn method_chain_respects_attempt_budget() {
        let config = SolvabilityConfig {
            max_pathfinding_attempts: 2,
            ..SolvabilityConfig::default()
        };
        assert_eq!(
            config.method_chain(),
            vec![PathfindingMethod::AStar, PathfindingMethod::BreadthFirst]
        );
    }

    #[test]
    fn toml_sections_fall_back_to_defaults() {
        let config = GenerationConfig::from_toml_str(
            r#"
            seed = "toml-seed"

            [cave]
            width = 60
            height = 30
            initial_wall_ratio = 0.45
            simulation_steps = 4
            birth_threshold = 5
            survival_threshold = 4

            [solvability]
            primary_method = "bfs"
            fallback_methods = ["dfs", "uniform_cost"]
            "#,
        )
        .expect("valid toml");

        assert_eq!(config.seed, "toml-seed");
        assert_eq!(config.cave.width, 60);
        assert_eq!(config.cave.smoothing_passes, 2);
        assert!(config.cave.solid_border);
        assert_eq!(
            config.solvability.primary_method,
            PathfindingMethod::BreadthFirst
        );
        assert_eq!(config.coins, CoinConfig::default());
    }

    #[test]
    fn toml_missing_threshold_is_rejected() {
        let result = GenerationConfig::from_toml_str(
            r#"
            seed = "toml-seed"

            [cave]
            width = 60
            height = 30
            initial_wall_ratio = 0.45
            simulation_steps = 4
            survival_threshold = 4
            "#,
        );
        assert!(matches!(result, Err(ConfigError::Parse(message)) if message.contains("birth_threshold")));
    }

    #[test]
    fn toml_negative_steps_are_rejected() {
        let result = GenerationConfig::from_toml_str(
            r#"
            seed = "toml-seed"

            [cave]
            width = 60
            height = 30
            initial_wall_ratio = 0.45
            simulation_steps = -1
            birth_threshold = 5
            survival_threshold = 4
            "#,
        );
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }
}
