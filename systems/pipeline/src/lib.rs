#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! End-to-end level generation from a single seed.
//!
//! [`LevelPipeline`] validates every stage configuration up front, then runs
//! terrain, connectivity, placement and solvability in order while threading
//! one [`LevelRng`] through all of them. The same configuration always yields
//! the same level.

use cave_forge_core::{
    ConfigError, GenerationConfig, GenerationError, GenerationFailure, Grid, LevelRng,
    PlatformSpec, Position, Stage,
};
use cave_forge_system_connectivity::CorridorCarver;
use cave_forge_system_placement::{
    Coin, CoinDistributor, FloatingPlatformPlacer, GoalPlacer, SpawnPlacer,
};
use cave_forge_system_reachability::{JumpEnvelope, ReachabilityAnalyzer};
use cave_forge_system_solvability::{SolvabilityReport, SolvabilityTester};
use cave_forge_terrain::{cull_small_regions, generate_terrain};

/// Counters gathered while a level was generated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LevelStats {
    /// Floor cells filled because their region was too small.
    pub culled_cells: usize,
    /// Regions present before corridors were carved.
    pub initial_regions: usize,
    /// Corridors carved to join regions.
    pub corridors: usize,
    /// Wall cells turned into floor by corridors.
    pub cells_carved: usize,
    /// Unreachable pocket groups considered for platforms.
    pub platform_groups: usize,
    /// Pocket groups made reachable by the placed platforms.
    pub resolved_groups: usize,
}

/// A complete, solvable level.
#[derive(Clone, Debug)]
pub struct GeneratedLevel {
    seed: String,
    config: GenerationConfig,
    grid: Grid,
    spawn: Position,
    goal: Position,
    platforms: Vec<PlatformSpec>,
    coins: Vec<Coin>,
    report: SolvabilityReport,
    stats: LevelStats,
}

impl GeneratedLevel {
    /// Seed the level was generated from.
    #[must_use]
    pub fn seed(&self) -> &str {
        &self.seed
    }

    /// Configuration the level was generated with.
    #[must_use]
    pub const fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// Final tile grid.
    #[must_use]
    pub const fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Player spawn tile.
    #[must_use]
    pub const fn spawn(&self) -> Position {
        self.spawn
    }

    /// Goal tile.
    #[must_use]
    pub const fn goal(&self) -> Position {
        self.goal
    }

    /// Floating platforms placed over the grid.
    #[must_use]
    pub fn platforms(&self) -> &[PlatformSpec] {
        &self.platforms
    }

    /// Coins in placement order.
    #[must_use]
    pub fn coins(&self) -> &[Coin] {
        &self.coins
    }

    /// Spawn-to-goal solvability report.
    #[must_use]
    pub const fn report(&self) -> &SolvabilityReport {
        &self.report
    }

    /// Stage counters.
    #[must_use]
    pub const fn stats(&self) -> &LevelStats {
        &self.stats
    }
}

/// Stage runners built from a validated [`GenerationConfig`].
pub struct LevelPipeline {
    config: GenerationConfig,
    envelope: JumpEnvelope,
    spawn: SpawnPlacer,
    goal: GoalPlacer,
    platforms: FloatingPlatformPlacer,
    coins: CoinDistributor,
    tester: SolvabilityTester,
}

impl LevelPipeline {
    /// Validates every stage configuration and prepares the stage runners.
    pub fn new(config: GenerationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let envelope = JumpEnvelope::from_physics(&config.physics);
        Ok(Self {
            envelope,
            spawn: SpawnPlacer::new(config.spawn.clone())?,
            goal: GoalPlacer::new(config.goal.clone())?,
            platforms: FloatingPlatformPlacer::new(config.platforms.clone(), envelope)?,
            coins: CoinDistributor::new(config.coins.clone())?,
            tester: SolvabilityTester::new(config.solvability.clone())?,
            config,
        })
    }

    /// Jump envelope derived from the physics constants.
    #[must_use]
    pub const fn envelope(&self) -> JumpEnvelope {
        self.envelope
    }

    /// Runs every stage and returns the finished level.
    pub fn generate(&self) -> Result<GeneratedLevel, GenerationError> {
        let seed = self.config.seed.as_str();
        let mut rng = LevelRng::from_seed_str(seed);
        let mut stats = LevelStats::default();

        let mut grid = generate_terrain(&self.config.cave, &mut rng)?;
        if grid.floor_count() == 0 {
            return Err(GenerationFailure::new(Stage::Terrain, "cave has no floor")
                .with_diagnostic("seed", seed)
                .with_diagnostic("initial_wall_ratio", self.config.cave.initial_wall_ratio)
                .into());
        }
        stats.culled_cells = cull_small_regions(&mut grid, self.config.cave.min_region_size);

        let carve = CorridorCarver::new().carve(&mut grid, &mut rng)?;
        stats.initial_regions = carve.initial_regions();
        stats.corridors = carve.corridors().len();
        stats.cells_carved = carve.cells_carved();
        tracing::debug!(
            floor = grid.floor_count(),
            culled = stats.culled_cells,
            regions = stats.initial_regions,
            corridors = stats.corridors,
            "terrain connected"
        );

        let spawn = self.spawn.place(&grid, &mut rng)?;
        let base = ReachabilityAnalyzer::new(&grid, self.envelope).analyze(spawn)?;
        let goal = self.goal.place_goal(&grid, spawn, &base, &mut rng)?;

        let plan = self.platforms.place_platforms(&grid, spawn, goal)?;
        stats.platform_groups = plan.groups();
        stats.resolved_groups = plan.resolved_groups();
        let platforms = plan.platforms().to_vec();

        let accessible = ReachabilityAnalyzer::new(&grid, self.envelope)
            .with_platforms(&platforms)
            .analyze(spawn)?;
        let coins = self
            .coins
            .distribute_coins(&grid, spawn, goal, Some(&accessible), &mut rng);

        let report = self.tester.validate_solvability(&grid, spawn, goal);
        if !report.is_valid() {
            let methods: Vec<String> = report
                .methods_tried()
                .iter()
                .map(ToString::to_string)
                .collect();
            tracing::warn!(seed, issues = report.issues().len(), "level is not solvable");
            return Err(GenerationFailure::new(
                Stage::Solvability,
                "no valid path between spawn and goal",
            )
            .with_diagnostic("methods", methods.join(","))
            .with_diagnostic("issues", report.issues().join("; "))
            .into());
        }

        tracing::info!(
            seed,
            width = grid.width(),
            height = grid.height(),
            platforms = platforms.len(),
            coins = coins.len(),
            path = report.path().map_or(0, |path| path.len()),
            "level generated"
        );

        Ok(GeneratedLevel {
            seed: seed.to_owned(),
            config: self.config.clone(),
            grid,
            spawn,
            goal,
            platforms,
            coins,
            report,
            stats,
        })
    }
}

/// Generates a level, retrying with derived seeds while failures are recoverable.
///
/// The first attempt uses `config.seed`; attempt `n` uses `"{seed}#{n}"`.
/// Configuration errors are returned immediately. When every seed fails the
/// last failure is returned with the number of seeds tried attached.
pub fn generate_until_success(
    config: &GenerationConfig,
    max_seeds: u32,
) -> Result<GeneratedLevel, GenerationError> {
    if max_seeds == 0 {
        return Err(ConfigError::OutOfRange {
            parameter: "max_seeds",
            value: max_seeds.to_string(),
            expected: "at least 1",
        }
        .into());
    }

    let mut last = None;
    for attempt in 0..max_seeds {
        let mut derived = config.clone();
        if attempt > 0 {
            derived.seed = format!("{}#{attempt}", config.seed);
        }
        match LevelPipeline::new(derived)?.generate() {
            Ok(level) => return Ok(level),
            Err(GenerationError::Failure(failure)) => {
                tracing::warn!(
                    attempt,
                    stage = %failure.stage(),
                    reason = failure.reason(),
                    "seed rejected, retrying"
                );
                last = Some(failure);
            }
            Err(error) => return Err(error),
        }
    }

    let failure = last.map_or_else(
        || GenerationFailure::new(Stage::Terrain, "no seed attempted"),
        |failure| failure.with_diagnostic("seeds_tried", max_seeds),
    );
    Err(failure.into())
}
