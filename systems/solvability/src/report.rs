//! Path validation, quality metrics and the solvability report.

use std::time::Duration;

use cave_forge_core::{Grid, Path, PathfindingMethod, Position};
use thiserror::Error;

use crate::SearchError;

/// Reason a path was refused by [`validate_path`].
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum PathDefect {
    /// The path holds no tiles.
    #[error("path is empty")]
    Empty,
    /// The first tile is not the requested start.
    #[error("path starts at ({x}, {y}) instead of the start tile")]
    WrongStart {
        /// Column of the first tile.
        x: u32,
        /// Row of the first tile.
        y: u32,
    },
    /// The last tile is not the requested goal.
    #[error("path ends at ({x}, {y}) instead of the goal tile")]
    WrongEnd {
        /// Column of the last tile.
        x: u32,
        /// Row of the last tile.
        y: u32,
    },
    /// A tile on the path is a wall or lies outside the grid.
    #[error("path crosses non-floor tile ({x}, {y})")]
    NotFloor {
        /// Column of the offending tile.
        x: u32,
        /// Row of the offending tile.
        y: u32,
    },
    /// Two consecutive tiles do not share an edge.
    #[error("path jumps from ({from_x}, {from_y}) to ({to_x}, {to_y})")]
    NotAdjacent {
        /// Column of the tile before the jump.
        from_x: u32,
        /// Row of the tile before the jump.
        from_y: u32,
        /// Column of the tile after the jump.
        to_x: u32,
        /// Row of the tile after the jump.
        to_y: u32,
    },
}

/// Checks that `path` runs from `start` to `goal` over adjacent floor tiles.
pub fn validate_path(
    grid: &Grid,
    path: &Path,
    start: Position,
    goal: Position,
) -> Result<(), PathDefect> {
    let (Some(first), Some(last)) = (path.start(), path.end()) else {
        return Err(PathDefect::Empty);
    };
    if first != start {
        return Err(PathDefect::WrongStart {
            x: first.x(),
            y: first.y(),
        });
    }
    if last != goal {
        return Err(PathDefect::WrongEnd {
            x: last.x(),
            y: last.y(),
        });
    }
    if let Some(tile) = path.positions().iter().find(|tile| !grid.is_floor(**tile)) {
        return Err(PathDefect::NotFloor {
            x: tile.x(),
            y: tile.y(),
        });
    }
    if let Some((from, to)) = path.steps().find(|(from, to)| !from.is_adjacent(*to)) {
        return Err(PathDefect::NotAdjacent {
            from_x: from.x(),
            from_y: from.y(),
            to_x: to.x(),
            to_y: to.y(),
        });
    }
    Ok(())
}

/// Quality measurements of an accepted path.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PathMetrics {
    length: usize,
    manhattan_distance: u32,
    direction_changes: usize,
    efficiency: f64,
}

impl PathMetrics {
    /// Measures `path`.
    ///
    /// Efficiency is the Manhattan distance between the endpoints divided by
    /// the number of steps, so a straight path scores `1.0`.
    #[must_use]
    pub fn measure(path: &Path) -> Self {
        let manhattan_distance = match (path.start(), path.end()) {
            (Some(first), Some(last)) => first.manhattan_distance(last),
            _ => 0,
        };
        let steps = path.len().saturating_sub(1);

        let mut direction_changes = 0;
        let mut previous: Option<(i64, i64)> = None;
        for (from, to) in path.steps() {
            let direction = (
                i64::from(to.x()) - i64::from(from.x()),
                i64::from(to.y()) - i64::from(from.y()),
            );
            if previous.is_some_and(|last| last != direction) {
                direction_changes += 1;
            }
            previous = Some(direction);
        }

        let efficiency = if steps == 0 {
            1.0
        } else {
            f64::from(manhattan_distance) / steps as f64
        };

        Self {
            length: path.len(),
            manhattan_distance,
            direction_changes,
            efficiency,
        }
    }

    /// Tiles on the path, both endpoints included.
    #[must_use]
    pub const fn length(&self) -> usize {
        self.length
    }

    /// Manhattan distance between the endpoints.
    #[must_use]
    pub const fn manhattan_distance(&self) -> u32 {
        self.manhattan_distance
    }

    /// Number of turns along the path.
    #[must_use]
    pub const fn direction_changes(&self) -> usize {
        self.direction_changes
    }

    /// Ratio of endpoint distance to steps taken, in `(0, 1]`.
    #[must_use]
    pub const fn efficiency(&self) -> f64 {
        self.efficiency
    }
}

/// Outcome of a single method attempt.
#[derive(Clone, Debug, PartialEq)]
pub enum AttemptOutcome {
    /// The method produced a path that passed validation.
    Found {
        /// Tiles on the accepted path.
        length: usize,
    },
    /// The method completed without finding a path.
    NoPath,
    /// The method produced a path that failed validation.
    Rejected(PathDefect),
    /// The method raised an error.
    Failed(SearchError),
}

/// One entry of the fallback chain as executed.
#[derive(Clone, Debug, PartialEq)]
pub struct MethodAttempt {
    pub(crate) method: PathfindingMethod,
    pub(crate) outcome: AttemptOutcome,
    pub(crate) elapsed: Duration,
}

impl MethodAttempt {
    /// Method that ran.
    #[must_use]
    pub const fn method(&self) -> PathfindingMethod {
        self.method
    }

    /// What the method produced.
    #[must_use]
    pub const fn outcome(&self) -> &AttemptOutcome {
        &self.outcome
    }

    /// Wall-clock time spent in the method.
    #[must_use]
    pub const fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

/// Immutable summary of one solvability validation.
#[derive(Clone, Debug, PartialEq)]
pub struct SolvabilityReport {
    pub(crate) valid: bool,
    pub(crate) path: Option<Path>,
    pub(crate) method: Option<PathfindingMethod>,
    pub(crate) attempts: Vec<MethodAttempt>,
    pub(crate) metrics: Option<PathMetrics>,
    pub(crate) total_time: Duration,
    pub(crate) issues: Vec<String>,
    pub(crate) recommendations: Vec<String>,
    pub(crate) performance_warning: Option<String>,
}

impl SolvabilityReport {
    /// Whether any method produced a valid path.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.valid
    }

    /// Accepted path, if any.
    #[must_use]
    pub const fn path(&self) -> Option<&Path> {
        self.path.as_ref()
    }

    /// Method that produced the accepted path.
    #[must_use]
    pub const fn successful_method(&self) -> Option<PathfindingMethod> {
        self.method
    }

    /// Every method attempted, in order.
    #[must_use]
    pub fn attempts(&self) -> &[MethodAttempt] {
        &self.attempts
    }

    /// Methods attempted, in order.
    #[must_use]
    pub fn methods_tried(&self) -> Vec<PathfindingMethod> {
        self.attempts.iter().map(MethodAttempt::method).collect()
    }

    /// Number of fallback methods that ran after the primary.
    #[must_use]
    pub fn fallbacks_used(&self) -> usize {
        self.attempts.len().saturating_sub(1)
    }

    /// Whether the accepted path came from a fallback.
    #[must_use]
    pub fn used_fallback(&self) -> bool {
        self.valid && self.fallbacks_used() > 0
    }

    /// Quality metrics of the accepted path.
    #[must_use]
    pub const fn metrics(&self) -> Option<&PathMetrics> {
        self.metrics.as_ref()
    }

    /// Wall-clock time of the whole validation.
    #[must_use]
    pub const fn total_time(&self) -> Duration {
        self.total_time
    }

    /// Problems encountered, including folded search errors.
    #[must_use]
    pub fn issues(&self) -> &[String] {
        &self.issues
    }

    /// Suggested follow-ups for level designers.
    #[must_use]
    pub fn recommendations(&self) -> &[String] {
        &self.recommendations
    }

    /// Advisory warning when validation exceeded the time threshold.
    #[must_use]
    pub fn performance_warning(&self) -> Option<&str> {
        self.performance_warning.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corridor() -> Grid {
        Grid::from_ascii(&["#####", "#...#", "#.###", "#####"]).expect("grid")
    }

    #[test]
    fn accepts_well_formed_path() {
        let path = Path::new(vec![
            Position::new(1, 2),
            Position::new(1, 1),
            Position::new(2, 1),
            Position::new(3, 1),
        ]);
        assert_eq!(
            validate_path(&corridor(), &path, Position::new(1, 2), Position::new(3, 1)),
            Ok(())
        );
    }

    #[test]
    fn rejects_each_defect() {
        let grid = corridor();
        let start = Position::new(1, 1);
        let goal = Position::new(3, 1);

        assert_eq!(
            validate_path(&grid, &Path::empty(), start, goal),
            Err(PathDefect::Empty)
        );
        assert_eq!(
            validate_path(&grid, &Path::new(vec![goal]), start, goal),
            Err(PathDefect::WrongStart { x: 3, y: 1 })
        );
        assert_eq!(
            validate_path(&grid, &Path::new(vec![start]), start, goal),
            Err(PathDefect::WrongEnd { x: 1, y: 1 })
        );
        assert_eq!(
            validate_path(
                &grid,
                &Path::new(vec![start, Position::new(2, 2), goal]),
                start,
                goal
            ),
            Err(PathDefect::NotFloor { x: 2, y: 2 })
        );
        assert_eq!(
            validate_path(&grid, &Path::new(vec![start, goal]), start, goal),
            Err(PathDefect::NotAdjacent {
                from_x: 1,
                from_y: 1,
                to_x: 3,
                to_y: 1
            })
        );
    }

    #[test]
    fn metrics_count_turns() {
        let path = Path::new(vec![
            Position::new(1, 2),
            Position::new(1, 1),
            Position::new(2, 1),
            Position::new(3, 1),
        ]);
        let metrics = PathMetrics::measure(&path);
        assert_eq!(metrics.length(), 4);
        assert_eq!(metrics.manhattan_distance(), 3);
        assert_eq!(metrics.direction_changes(), 1);
        assert!((metrics.efficiency() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn detours_lower_efficiency() {
        let path = Path::new(vec![
            Position::new(0, 0),
            Position::new(0, 1),
            Position::new(1, 1),
            Position::new(1, 0),
        ]);
        let metrics = PathMetrics::measure(&path);
        assert_eq!(metrics.direction_changes(), 2);
        assert!((metrics.efficiency() - 1.0 / 3.0).abs() < 1e-9);
    }
}
