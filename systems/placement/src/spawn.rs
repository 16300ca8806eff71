use cave_forge_core::{
    ConfigError, GenerationError, GenerationFailure, Grid, LevelRng, Position, SpawnConfig, Stage,
};

use crate::{boundary_column, has_ground};

/// Places the player spawn near the left side of the map.
#[derive(Clone, Debug)]
pub struct SpawnPlacer {
    config: SpawnConfig,
}

impl SpawnPlacer {
    /// Validates the configuration and creates the placer.
    pub fn new(config: SpawnConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Samples floor tiles in the left band and returns the first valid one.
    pub fn place(&self, grid: &Grid, rng: &mut LevelRng) -> Result<Position, GenerationError> {
        let limit = boundary_column(grid.width(), self.config.left_side_boundary).max(1);
        let candidates: Vec<Position> = grid
            .floor_positions()
            .filter(|position| position.x() < limit)
            .collect();

        if candidates.is_empty() {
            return Err(GenerationFailure::new(
                Stage::SpawnPlacement,
                "no floor tiles inside the spawn band",
            )
            .with_diagnostic("band_columns", limit)
            .into());
        }

        for attempt in 0..self.config.max_attempts {
            let Some(candidate) = rng.choose(&candidates).copied() else {
                break;
            };
            if self.config.require_ground && !has_ground(grid, candidate) {
                continue;
            }
            tracing::debug!(
                x = candidate.x(),
                y = candidate.y(),
                attempt,
                "spawn placed"
            );
            return Ok(candidate);
        }

        tracing::warn!(
            attempts = self.config.max_attempts,
            candidates = candidates.len(),
            "spawn placement exhausted its attempts"
        );
        Err(
            GenerationFailure::new(Stage::SpawnPlacement, "no valid spawn within attempt budget")
                .with_diagnostic("attempts", self.config.max_attempts)
                .with_diagnostic("candidates", candidates.len())
                .into(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawn_lands_on_grounded_floor_in_the_left_band() {
        let grid = Grid::from_ascii(&[
            "############",
            "#..........#",
            "#..........#",
            "############",
        ])
        .expect("grid");
        let placer = SpawnPlacer::new(SpawnConfig::default()).expect("placer");
        for seed in 0..16 {
            let spawn = placer
                .place(&grid, &mut LevelRng::from_seed_str(&format!("spawn-{seed}")))
                .expect("spawn");
            assert!(spawn.x() < 3);
            assert_eq!(spawn.y(), 2);
        }
    }

    #[test]
    fn solid_band_is_a_recoverable_failure() {
        let grid = Grid::from_ascii(&["#####", "###..", "#####"]).expect("grid");
        let placer = SpawnPlacer::new(SpawnConfig::default()).expect("placer");
        let error = placer
            .place(&grid, &mut LevelRng::from_seed_str("solid"))
            .expect_err("no spawn");
        assert!(error.is_retryable());
    }

    #[test]
    fn invalid_boundary_is_rejected() {
        let config = SpawnConfig {
            left_side_boundary: 1.5,
            ..SpawnConfig::default()
        };
        assert!(SpawnPlacer::new(config).is_err());
    }
}
