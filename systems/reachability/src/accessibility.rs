use cave_forge_core::{ConfigError, Grid, PlatformSpec, Position};

use crate::{JumpEnvelope, ReachabilityAnalyzer};

/// Accessibility of a level once a set of platforms is in place.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AccessibilityReport {
    goal_reachable: bool,
    total_pockets: usize,
    resolved_pockets: usize,
    walkable_before: usize,
    walkable_after: usize,
}

impl AccessibilityReport {
    /// Whether the player can touch the goal from the spawn.
    #[must_use]
    pub const fn goal_reachable(&self) -> bool {
        self.goal_reachable
    }

    /// Unreachable pockets found without platforms.
    #[must_use]
    pub const fn total_pockets(&self) -> usize {
        self.total_pockets
    }

    /// Pockets with at least one tile reachable once platforms are added.
    #[must_use]
    pub const fn resolved_pockets(&self) -> usize {
        self.resolved_pockets
    }

    /// Standable tiles reachable without platforms.
    #[must_use]
    pub const fn walkable_before(&self) -> usize {
        self.walkable_before
    }

    /// Standable tiles reachable with platforms.
    #[must_use]
    pub const fn walkable_after(&self) -> usize {
        self.walkable_after
    }

    /// Share of pockets resolved; `1.0` when there was nothing to resolve.
    #[must_use]
    pub fn ratio(&self) -> f64 {
        if self.total_pockets == 0 {
            return 1.0;
        }
        self.resolved_pockets as f64 / self.total_pockets as f64
    }

    /// Whether the goal is reachable and the resolved share reaches `min_ratio`.
    #[must_use]
    pub fn is_accessible(&self, min_ratio: f64) -> bool {
        self.goal_reachable && self.ratio() >= min_ratio
    }
}

/// Compares reachability from `spawn` with and without `platforms`.
///
/// This check looks at the platform set as a whole. It does not re-check the
/// individual footprints; [`crate::validate_platform_placement`] does that.
pub fn validate_accessibility(
    grid: &Grid,
    envelope: JumpEnvelope,
    spawn: Position,
    goal: Position,
    platforms: &[PlatformSpec],
) -> Result<AccessibilityReport, ConfigError> {
    grid.require_floor(goal)?;

    let before = ReachabilityAnalyzer::new(grid, envelope).analyze(spawn)?;
    let after = ReachabilityAnalyzer::new(grid, envelope)
        .with_platforms(platforms)
        .analyze(spawn)?;

    let pockets = before.pockets();
    let resolved_pockets = pockets
        .iter()
        .filter(|pocket| pocket.iter().any(|tile| after.is_walkable(*tile)))
        .count();

    Ok(AccessibilityReport {
        goal_reachable: after.is_reachable(goal),
        total_pockets: pockets.len(),
        resolved_pockets,
        walkable_before: before.reachable_count(),
        walkable_after: after.reachable_count(),
    })
}
