#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Terrain generation for Cave Forge levels.
//!
//! The crate turns a seed into cave-shaped terrain in three steps: the seeder
//! scatters walls with a configurable density, the cellular automaton grows
//! that noise into organic caverns, and the region detector labels the
//! resulting floor components so later stages can join them.

mod automata;
mod regions;
mod seeder;

use cave_forge_core::{CaveConfig, ConfigError, Grid, LevelRng};

pub use automata::CellularAutomaton;
pub use regions::{cull_small_regions, detect_regions, RegionInfo, RegionMap};
pub use seeder::seed_grid;

/// Seeds a grid and evolves it through the automaton and smoothing passes.
pub fn generate_terrain(config: &CaveConfig, rng: &mut LevelRng) -> Result<Grid, ConfigError> {
    let automaton = CellularAutomaton::new(config)?;
    let mut grid = seed_grid(config, rng)?;
    let seeded_floor = grid.floor_count();
    automaton.evolve(&mut grid);

    tracing::debug!(
        width = grid.width(),
        height = grid.height(),
        seeded_floor,
        floor = grid.floor_count(),
        steps = config.simulation_steps,
        smoothing_passes = config.smoothing_passes,
        "terrain generated"
    );

    Ok(grid)
}
