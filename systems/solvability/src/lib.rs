#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Spawn-to-goal solvability testing.
//!
//! A [`SolvabilityTester`] runs a primary [`PathFinder`] and, when it fails,
//! an ordered chain of fallbacks. Every path is re-validated step by step
//! before it is accepted, and every attempt is timed and recorded in a
//! [`SolvabilityReport`]. Search errors never escape the tester; they are
//! folded into the report as issues.

mod report;
mod search;
mod tester;

use cave_forge_core::{Grid, Path, PathfindingMethod, Position};
use thiserror::Error;

pub use report::{
    validate_path, AttemptOutcome, MethodAttempt, PathDefect, PathMetrics, SolvabilityReport,
};
pub use search::{finder_for, AStar, BreadthFirst, DepthFirst, UniformCost};
pub use tester::SolvabilityTester;

/// Failure raised by a search implementation.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SearchError {
    /// The start or goal tile is outside the grid or not floor.
    #[error("endpoint ({x}, {y}) is not an in-bounds floor tile")]
    InvalidEndpoint {
        /// Column of the rejected endpoint.
        x: u32,
        /// Row of the rejected endpoint.
        y: u32,
    },
    /// The search expanded more nodes than allowed.
    #[error("search gave up after {expansions} expansions")]
    BudgetExhausted {
        /// Nodes expanded before giving up.
        expansions: u32,
    },
    /// Implementation-specific failure.
    #[error("search failed: {0}")]
    Internal(String),
}

/// Grid search algorithm over 4-connected floor tiles.
pub trait PathFinder {
    /// Method identifier recorded in reports.
    fn method(&self) -> PathfindingMethod;

    /// Searches for a path from `start` to `goal`, both inclusive.
    ///
    /// `Ok(None)` means the search completed without finding a path.
    fn find_path(
        &self,
        grid: &Grid,
        start: Position,
        goal: Position,
    ) -> Result<Option<Path>, SearchError>;
}
