use std::time::{Duration, Instant};

use cave_forge_core::{ConfigError, Grid, Position, SolvabilityConfig};

use crate::{
    finder_for, validate_path, AttemptOutcome, MethodAttempt, PathFinder, PathMetrics,
    SolvabilityReport,
};

const WINDING_EFFICIENCY: f64 = 0.5;

/// Runs the primary finder and its fallbacks until one yields a valid path.
pub struct SolvabilityTester {
    performance_threshold: Duration,
    finders: Vec<Box<dyn PathFinder>>,
}

impl SolvabilityTester {
    /// Builds the finder chain described by `config`.
    pub fn new(config: SolvabilityConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let finders = config
            .method_chain()
            .into_iter()
            .map(|method| finder_for(method, config.max_expansions))
            .collect();
        Self::with_finders(config, finders)
    }

    /// Uses caller-supplied finders in order, truncated to the attempt budget.
    pub fn with_finders(
        config: SolvabilityConfig,
        mut finders: Vec<Box<dyn PathFinder>>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        if finders.is_empty() {
            return Err(ConfigError::EmptyMethodList);
        }
        finders.truncate(config.max_pathfinding_attempts as usize);
        Ok(Self {
            performance_threshold: Duration::from_millis(config.performance_threshold_ms),
            finders,
        })
    }

    /// Verifies that a path of adjacent floor tiles joins `start` and `goal`.
    ///
    /// Each finder runs only after the previous one produced no valid path.
    pub fn validate_solvability(
        &self,
        grid: &Grid,
        start: Position,
        goal: Position,
    ) -> SolvabilityReport {
        let started = Instant::now();
        let mut attempts = Vec::with_capacity(self.finders.len());
        let mut issues = Vec::new();
        let mut accepted = None;

        for finder in &self.finders {
            let method = finder.method();
            let attempt_started = Instant::now();
            let result = finder.find_path(grid, start, goal);
            let elapsed = attempt_started.elapsed();

            let outcome = match result {
                Ok(Some(path)) => match validate_path(grid, &path, start, goal) {
                    Ok(()) => {
                        let length = path.len();
                        accepted = Some((method, path));
                        AttemptOutcome::Found { length }
                    }
                    Err(defect) => {
                        issues.push(format!("{method} returned an invalid path: {defect}"));
                        AttemptOutcome::Rejected(defect)
                    }
                },
                Ok(None) => {
                    issues.push(format!("{method} found no path"));
                    AttemptOutcome::NoPath
                }
                Err(error) => {
                    issues.push(format!("{method} failed: {error}"));
                    AttemptOutcome::Failed(error)
                }
            };
            tracing::debug!(%method, ?outcome, ?elapsed, "solvability attempt");
            attempts.push(MethodAttempt {
                method,
                outcome,
                elapsed,
            });
            if accepted.is_some() {
                break;
            }
        }

        let total_time = started.elapsed();
        let performance_warning = (total_time > self.performance_threshold).then(|| {
            format!(
                "validation took {} ms, above the {} ms threshold",
                total_time.as_millis(),
                self.performance_threshold.as_millis()
            )
        });
        if let Some(warning) = &performance_warning {
            tracing::warn!("{warning}");
        }

        let (method, path) = match accepted {
            Some((method, path)) => (Some(method), Some(path)),
            None => (None, None),
        };
        let metrics = path.as_ref().map(PathMetrics::measure);

        let mut report = SolvabilityReport {
            valid: path.is_some(),
            path,
            method,
            attempts,
            metrics,
            total_time,
            issues,
            recommendations: Vec::new(),
            performance_warning,
        };
        report.recommendations = recommend(&report);
        report
    }
}

fn recommend(report: &SolvabilityReport) -> Vec<String> {
    let mut recommendations = Vec::new();
    if !report.is_valid() {
        recommendations.push("regenerate the level with a different seed".to_owned());
        recommendations
            .push("carve a corridor or add platforms between spawn and goal".to_owned());
        return recommendations;
    }
    if let (true, Some(method)) = (report.used_fallback(), report.successful_method()) {
        recommendations.push(format!(
            "primary method failed; the path was found by fallback {method}"
        ));
    }
    if let Some(metrics) = report.metrics() {
        if metrics.efficiency() < WINDING_EFFICIENCY {
            recommendations.push(format!(
                "path efficiency is {:.2}; consider opening a more direct route",
                metrics.efficiency()
            ));
        }
    }
    if report.performance_warning().is_some() {
        recommendations
            .push("reduce the grid size or max_expansions to speed up validation".to_owned());
    }
    recommendations
}

#[cfg(test)]
mod tests {
    use cave_forge_core::{Cell, Path, PathfindingMethod};

    use super::*;
    use crate::{PathDefect, SearchError};

    struct Broken(PathfindingMethod);

    impl PathFinder for Broken {
        fn method(&self) -> PathfindingMethod {
            self.0
        }

        fn find_path(
            &self,
            _grid: &Grid,
            _start: Position,
            _goal: Position,
        ) -> Result<Option<Path>, SearchError> {
            Err(SearchError::Internal("boom".to_owned()))
        }
    }

    struct Teleport;

    impl PathFinder for Teleport {
        fn method(&self) -> PathfindingMethod {
            PathfindingMethod::DepthFirst
        }

        fn find_path(
            &self,
            _grid: &Grid,
            start: Position,
            goal: Position,
        ) -> Result<Option<Path>, SearchError> {
            Ok(Some(Path::new(vec![start, goal])))
        }
    }

    fn corridor() -> Grid {
        let mut grid = Grid::filled(10, 10, Cell::Wall).expect("grid");
        for x in 0..10 {
            grid.set(Position::new(x, 5), Cell::Floor);
        }
        grid
    }

    #[test]
    fn straight_corridor_is_solved_by_the_primary() {
        let tester = SolvabilityTester::new(SolvabilityConfig::default()).expect("tester");
        let report = tester.validate_solvability(&corridor(), Position::new(0, 5), Position::new(9, 5));

        assert!(report.is_valid());
        assert_eq!(report.path().map(Path::len), Some(10));
        assert_eq!(report.successful_method(), Some(PathfindingMethod::AStar));
        assert_eq!(report.fallbacks_used(), 0);
        assert!(!report.used_fallback());
        let metrics = report.metrics().expect("metrics");
        assert_eq!(metrics.direction_changes(), 0);
        assert_eq!(metrics.manhattan_distance(), 9);
    }

    #[test]
    fn slow_validation_only_warns() {
        let config = SolvabilityConfig {
            performance_threshold_ms: 0,
            ..SolvabilityConfig::default()
        };
        let tester = SolvabilityTester::new(config).expect("tester");
        let report = tester.validate_solvability(&corridor(), Position::new(0, 5), Position::new(9, 5));

        assert!(report.is_valid());
        assert!(report.performance_warning().is_some());
        assert!(report
            .recommendations()
            .iter()
            .any(|recommendation| recommendation.contains("speed up")));
    }

    #[test]
    fn failing_primary_falls_back() {
        let tester = SolvabilityTester::with_finders(
            SolvabilityConfig::default(),
            vec![
                Box::new(Broken(PathfindingMethod::AStar)),
                finder_for(PathfindingMethod::BreadthFirst, 1_000),
            ],
        )
        .expect("tester");
        let report = tester.validate_solvability(&corridor(), Position::new(0, 5), Position::new(9, 5));

        assert!(report.is_valid());
        assert!(report.used_fallback());
        assert_eq!(
            report.methods_tried(),
            vec![PathfindingMethod::AStar, PathfindingMethod::BreadthFirst]
        );
        assert_eq!(
            report.attempts()[0].outcome(),
            &AttemptOutcome::Failed(SearchError::Internal("boom".to_owned()))
        );
        assert!(report.issues()[0].contains("boom"));
        assert!(report.recommendations()[0].contains("bfs"));
    }

    #[test]
    fn invalid_paths_are_rejected() {
        let tester = SolvabilityTester::with_finders(
            SolvabilityConfig::default(),
            vec![Box::new(Teleport)],
        )
        .expect("tester");
        let report = tester.validate_solvability(&corridor(), Position::new(0, 5), Position::new(9, 5));

        assert!(!report.is_valid());
        assert!(report.path().is_none());
        assert_eq!(
            report.attempts()[0].outcome(),
            &AttemptOutcome::Rejected(PathDefect::NotAdjacent {
                from_x: 0,
                from_y: 5,
                to_x: 9,
                to_y: 5
            })
        );
        assert!(!report.recommendations().is_empty());
    }

    #[test]
    fn wall_endpoints_become_issues() {
        let tester = SolvabilityTester::new(SolvabilityConfig::default()).expect("tester");
        let report = tester.validate_solvability(&corridor(), Position::new(0, 0), Position::new(9, 5));

        assert!(!report.is_valid());
        assert_eq!(report.attempts().len(), 4);
        assert_eq!(report.issues().len(), 4);
    }

    #[test]
    fn attempt_budget_truncates_the_chain() {
        let config = SolvabilityConfig {
            max_pathfinding_attempts: 2,
            ..SolvabilityConfig::default()
        };
        let tester = SolvabilityTester::new(config).expect("tester");
        let mut grid = corridor();
        grid.set(Position::new(4, 5), Cell::Wall);
        let report = tester.validate_solvability(&grid, Position::new(0, 5), Position::new(9, 5));

        assert!(!report.is_valid());
        assert_eq!(
            report.methods_tried(),
            vec![PathfindingMethod::AStar, PathfindingMethod::BreadthFirst]
        );
    }

    #[test]
    fn empty_finder_list_is_rejected() {
        let result = SolvabilityTester::with_finders(SolvabilityConfig::default(), Vec::new());
        assert!(matches!(result, Err(ConfigError::EmptyMethodList)));
    }
}
