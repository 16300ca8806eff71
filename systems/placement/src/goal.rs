use cave_forge_core::{
    ConfigError, GenerationError, GenerationFailure, GoalConfig, Grid, LevelRng, Position, Stage,
};
use cave_forge_system_reachability::ReachabilityMap;

use crate::{boundary_column, has_ground};

/// Places the level goal on the right side of the map, far from the spawn.
#[derive(Clone, Debug)]
pub struct GoalPlacer {
    config: GoalConfig,
}

#[derive(Debug, Default)]
struct Rejections {
    ground: u32,
    distance: u32,
    reachable: u32,
}

impl GoalPlacer {
    /// Validates the configuration and creates the placer.
    pub fn new(config: GoalConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Samples `max_attempts` candidates and keeps the valid one farthest from `spawn`.
    ///
    /// Candidates must lie at or right of the configured boundary column, be
    /// at least `min_distance` tiles from the spawn and, when required, stand
    /// on ground and be unreachable in `reachability`. Ties keep the earliest
    /// sample.
    pub fn place_goal(
        &self,
        grid: &Grid,
        spawn: Position,
        reachability: &ReachabilityMap,
        rng: &mut LevelRng,
    ) -> Result<Position, GenerationError> {
        let first_column = boundary_column(grid.width(), self.config.right_side_boundary);
        let candidates: Vec<Position> = grid
            .floor_positions()
            .filter(|position| position.x() >= first_column && *position != spawn)
            .collect();

        if candidates.is_empty() {
            return Err(GenerationFailure::new(
                Stage::GoalPlacement,
                "no floor tiles right of the goal boundary",
            )
            .with_diagnostic("first_column", first_column)
            .into());
        }

        let mut rejections = Rejections::default();
        let mut best: Option<(Position, f64)> = None;
        for _ in 0..self.config.max_attempts {
            let Some(candidate) = rng.choose(&candidates).copied() else {
                break;
            };
            if self.config.require_ground && !has_ground(grid, candidate) {
                rejections.ground += 1;
                continue;
            }
            let distance = candidate.euclidean_distance(spawn);
            if distance < self.config.min_distance {
                rejections.distance += 1;
                continue;
            }
            if self.config.require_unreachable && reachability.is_reachable(candidate) {
                rejections.reachable += 1;
                continue;
            }
            if best.map_or(true, |(_, current)| distance > current) {
                best = Some((candidate, distance));
            }
        }

        match best {
            Some((goal, distance)) => {
                tracing::debug!(
                    x = goal.x(),
                    y = goal.y(),
                    distance,
                    "goal placed"
                );
                Ok(goal)
            }
            None => {
                tracing::warn!(
                    attempts = self.config.max_attempts,
                    rejected_ground = rejections.ground,
                    rejected_distance = rejections.distance,
                    rejected_reachable = rejections.reachable,
                    "goal placement exhausted its attempts"
                );
                Err(GenerationFailure::new(
                    Stage::GoalPlacement,
                    "no valid goal within attempt budget",
                )
                .with_diagnostic("attempts", self.config.max_attempts)
                .with_diagnostic("candidates", candidates.len())
                .with_diagnostic("rejected_ground", rejections.ground)
                .with_diagnostic("rejected_distance", rejections.distance)
                .with_diagnostic("rejected_reachable", rejections.reachable)
                .into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cave_forge_system_reachability::{JumpEnvelope, ReachabilityAnalyzer};

    fn open_room() -> Grid {
        Grid::from_ascii(&[
            "####################",
            "#..................#",
            "#..................#",
            "#..................#",
            "####################",
        ])
        .expect("grid")
    }

    fn relaxed() -> GoalConfig {
        GoalConfig {
            min_distance: 5.0,
            require_unreachable: false,
            ..GoalConfig::default()
        }
    }

    #[test]
    fn goal_respects_the_right_side_boundary() {
        let grid = open_room();
        let spawn = Position::new(1, 3);
        let map = ReachabilityAnalyzer::new(&grid, JumpEnvelope::new(5, 3))
            .analyze(spawn)
            .expect("map");
        let placer = GoalPlacer::new(relaxed()).expect("placer");

        for seed in 0..32 {
            let goal = placer
                .place_goal(&grid, spawn, &map, &mut LevelRng::from_seed_str(&seed.to_string()))
                .expect("goal");
            assert!(goal.x() >= 15, "goal {goal:?} left of boundary");
            assert_eq!(goal.y(), 3);
        }
    }

    #[test]
    fn goal_maximises_distance() {
        let grid = open_room();
        let spawn = Position::new(1, 3);
        let map = ReachabilityAnalyzer::new(&grid, JumpEnvelope::new(5, 3))
            .analyze(spawn)
            .expect("map");
        let placer = GoalPlacer::new(relaxed()).expect("placer");
        let goal = placer
            .place_goal(&grid, spawn, &map, &mut LevelRng::from_seed_str("far"))
            .expect("goal");
        assert_eq!(goal, Position::new(18, 3));
    }

    #[test]
    fn reachable_goals_are_refused_when_unreachability_is_required() {
        let grid = open_room();
        let spawn = Position::new(1, 3);
        let map = ReachabilityAnalyzer::new(&grid, JumpEnvelope::new(5, 3))
            .analyze(spawn)
            .expect("map");
        let placer = GoalPlacer::new(GoalConfig {
            min_distance: 5.0,
            ..GoalConfig::default()
        })
        .expect("placer");
        let error = placer
            .place_goal(&grid, spawn, &map, &mut LevelRng::from_seed_str("reachable"))
            .expect_err("everything is reachable");
        let failure = error.as_failure().expect("recoverable");
        assert_eq!(failure.stage(), Stage::GoalPlacement);
        assert!(failure.diagnostics().get("rejected_reachable").is_some());
    }
}
