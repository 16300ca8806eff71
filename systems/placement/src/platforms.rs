//! Floating platforms that bridge pockets the player cannot reach.

use cave_forge_core::{
    ConfigError, GenerationError, GenerationFailure, Grid, PlatformConfig, PlatformSpec, Position,
    Stage,
};
use cave_forge_system_reachability::{
    validate_accessibility, validate_platform_placement, AccessibilityReport, JumpEnvelope,
    ReachabilityAnalyzer, ReachabilityMap,
};

/// Accepted platform set together with its accessibility check.
#[derive(Clone, Debug, PartialEq)]
pub struct PlatformPlan {
    platforms: Vec<PlatformSpec>,
    report: AccessibilityReport,
    groups: usize,
    resolved_groups: usize,
}

impl PlatformPlan {
    /// Platforms in placement order.
    #[must_use]
    pub fn platforms(&self) -> &[PlatformSpec] {
        &self.platforms
    }

    /// Accessibility of the level with every platform in place.
    #[must_use]
    pub const fn report(&self) -> &AccessibilityReport {
        &self.report
    }

    /// Pocket groups that needed bridging.
    #[must_use]
    pub const fn groups(&self) -> usize {
        self.groups
    }

    /// Pocket groups reachable once the platforms are in place.
    #[must_use]
    pub const fn resolved_groups(&self) -> usize {
        self.resolved_groups
    }
}

/// Bridges unreachable pockets with one-way platforms.
///
/// Pockets closer than `grouping_distance` are bridged as one group, the goal
/// group first. Each step evaluates up to `max_candidates` footprints near the
/// reachable tile closest to the group and keeps the first one that makes the
/// group reachable, or else the one that shrinks the remaining gap the most.
#[derive(Clone, Debug)]
pub struct FloatingPlatformPlacer {
    config: PlatformConfig,
    envelope: JumpEnvelope,
}

impl FloatingPlatformPlacer {
    /// Validates the configuration and creates the placer.
    pub fn new(config: PlatformConfig, envelope: JumpEnvelope) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config, envelope })
    }

    /// Places platforms so the goal, and optionally other pockets, become reachable.
    ///
    /// Every accepted platform must pass [`validate_platform_placement`] and
    /// the final set must pass [`validate_accessibility`]; either gate failing
    /// yields a recoverable failure.
    pub fn place_platforms(
        &self,
        grid: &Grid,
        spawn: Position,
        goal: Position,
    ) -> Result<PlatformPlan, GenerationError> {
        grid.require_floor(goal)?;
        let base = ReachabilityAnalyzer::new(grid, self.envelope).analyze(spawn)?;
        let groups = self.ordered_groups(&base, spawn, goal);

        let mut platforms = Vec::new();
        let mut current = base;
        let mut resolved_groups = 0;
        for group in &groups {
            let (map, resolved) = self.bridge(grid, spawn, goal, group, &mut platforms, current)?;
            current = map;
            if resolved {
                resolved_groups += 1;
            }
        }

        for (index, platform) in platforms.iter().enumerate() {
            let others: Vec<PlatformSpec> = platforms
                .iter()
                .enumerate()
                .filter(|(other, _)| *other != index)
                .map(|(_, other)| *other)
                .collect();
            if let Err(rejection) = validate_platform_placement(grid, platform, &others) {
                return Err(GenerationFailure::new(
                    Stage::PlatformPlacement,
                    "platform footprint failed validation",
                )
                .with_diagnostic("platform", index)
                .with_diagnostic("rejection", rejection)
                .into());
            }
        }

        let report = validate_accessibility(grid, self.envelope, spawn, goal, &platforms)?;
        if !report.is_accessible(self.config.min_accessibility_ratio) {
            tracing::warn!(
                goal_reachable = report.goal_reachable(),
                ratio = report.ratio(),
                platforms = platforms.len(),
                "platform set does not restore accessibility"
            );
            return Err(GenerationFailure::new(
                Stage::PlatformPlacement,
                "platforms do not restore accessibility",
            )
            .with_diagnostic("goal_reachable", report.goal_reachable())
            .with_diagnostic("ratio", format!("{:.3}", report.ratio()))
            .with_diagnostic("required_ratio", self.config.min_accessibility_ratio)
            .with_diagnostic("platforms", platforms.len())
            .with_diagnostic("groups", groups.len())
            .with_diagnostic("resolved_groups", resolved_groups)
            .into());
        }

        tracing::debug!(
            platforms = platforms.len(),
            groups = groups.len(),
            resolved_groups,
            ratio = report.ratio(),
            "platforms placed"
        );

        Ok(PlatformPlan {
            platforms,
            report,
            groups: groups.len(),
            resolved_groups,
        })
    }

    /// Groups pockets by proximity, goal group first, then nearest to the spawn.
    fn ordered_groups(
        &self,
        map: &ReachabilityMap,
        spawn: Position,
        goal: Position,
    ) -> Vec<Vec<Position>> {
        let mut groups = group_pockets(map.pockets(), self.config.grouping_distance);
        groups.sort_by(|a, b| {
            let a_goal = a.contains(&goal);
            let b_goal = b.contains(&goal);
            b_goal
                .cmp(&a_goal)
                .then_with(|| nearest(a, spawn).total_cmp(&nearest(b, spawn)))
        });

        let goal_grouped = groups.first().is_some_and(|group| group.contains(&goal));
        if !goal_grouped && !map.is_reachable(goal) {
            groups.insert(0, vec![goal]);
        }
        groups
    }

    /// Adds platforms until `group` is reachable, the budget runs out or no
    /// candidate makes progress.
    fn bridge(
        &self,
        grid: &Grid,
        spawn: Position,
        goal: Position,
        group: &[Position],
        platforms: &mut Vec<PlatformSpec>,
        mut current: ReachabilityMap,
    ) -> Result<(ReachabilityMap, bool), ConfigError> {
        loop {
            if is_resolved(&current, group, goal) {
                return Ok((current, true));
            }
            if platforms.len() >= self.config.max_platforms as usize {
                return Ok((current, false));
            }
            let Some((target, anchor, gap)) = closest_gap(&current, group) else {
                return Ok((current, false));
            };

            let mut best: Option<(PlatformSpec, ReachabilityMap, f64)> = None;
            let mut trial = platforms.clone();
            for candidate in self.candidates(grid, anchor, target, platforms) {
                trial.push(candidate);
                let map = ReachabilityAnalyzer::new(grid, self.envelope)
                    .with_platforms(&trial)
                    .analyze(spawn)?;
                let _ = trial.pop();

                if is_resolved(&map, group, goal) {
                    best = Some((candidate, map, 0.0));
                    break;
                }
                let Some((_, _, remaining)) = closest_gap(&map, group) else {
                    continue;
                };
                let improves = remaining + 0.5 <= gap;
                if improves && best.as_ref().map_or(true, |(_, _, current)| remaining < *current) {
                    best = Some((candidate, map, remaining));
                }
            }

            match best {
                Some((platform, map, _)) => {
                    tracing::trace!(
                        x = platform.origin().x(),
                        y = platform.origin().y(),
                        width = platform.width(),
                        "platform accepted"
                    );
                    platforms.push(platform);
                    current = map;
                }
                None => return Ok((current, false)),
            }
        }
    }

    /// Valid footprints whose standing tile lies within one jump of `anchor`,
    /// closest to `target` first.
    ///
    /// The scan covers `vertical` rows above the anchor, which bounds a jump,
    /// and `drop_search_rows` rows below it.
    fn candidates(
        &self,
        grid: &Grid,
        anchor: Position,
        target: Position,
        existing: &[PlatformSpec],
    ) -> Vec<PlatformSpec> {
        let reach = i64::from(self.envelope.horizontal().max(1));
        let climb = i64::from(self.envelope.vertical());
        let drop = i64::from(self.config.drop_search_rows);
        let mut standing = Vec::new();
        for dy in -climb..=drop {
            for dx in -reach..=reach {
                let Some(tile) = anchor.offset(to_i32(dx), to_i32(dy)) else {
                    continue;
                };
                if !grid.is_floor(tile) || !grid.is_floor(tile.below()) {
                    continue;
                }
                if existing.iter().any(|platform| platform.supports(tile)) {
                    continue;
                }
                standing.push(tile);
            }
        }
        standing.sort_by(|a, b| {
            a.euclidean_distance(target)
                .total_cmp(&b.euclidean_distance(target))
                .then_with(|| (a.y(), a.x()).cmp(&(b.y(), b.x())))
        });

        let mut footprints = Vec::new();
        for tile in standing {
            if footprints.len() >= self.config.max_candidates as usize {
                break;
            }
            if let Some(platform) = self.footprint_under(grid, tile, existing) {
                if !footprints.contains(&platform) {
                    footprints.push(platform);
                }
            }
        }
        footprints
    }

    /// First valid footprint below `tile`: centred, then left- and right-aligned.
    fn footprint_under(
        &self,
        grid: &Grid,
        tile: Position,
        existing: &[PlatformSpec],
    ) -> Option<PlatformSpec> {
        let width = self.config.platform_width;
        let row = tile.y() + 1;
        let max_origin = grid.width().checked_sub(width)?;
        let centred = tile.x().saturating_sub((width - 1) / 2).min(max_origin);
        let right_aligned = tile.x().saturating_sub(width - 1).min(max_origin);
        let left_aligned = tile.x().min(max_origin);

        [centred, left_aligned, right_aligned]
            .into_iter()
            .map(|x| PlatformSpec::new(Position::new(x, row), width))
            .find(|platform| {
                platform.covers(tile.below())
                    && validate_platform_placement(grid, platform, existing).is_ok()
            })
    }
}

fn to_i32(value: i64) -> i32 {
    i32::try_from(value).unwrap_or(if value < 0 { i32::MIN } else { i32::MAX })
}

fn is_resolved(map: &ReachabilityMap, group: &[Position], goal: Position) -> bool {
    group
        .iter()
        .any(|tile| map.is_walkable(*tile) || (*tile == goal && map.is_reachable(goal)))
}

/// Closest `(group tile, walkable tile, distance)` triple.
fn closest_gap(map: &ReachabilityMap, group: &[Position]) -> Option<(Position, Position, f64)> {
    let mut best: Option<(Position, Position, f64)> = None;
    for walkable in map.walkable_positions() {
        for tile in group {
            let distance = walkable.euclidean_distance(*tile);
            if best.map_or(true, |(_, _, current)| distance < current) {
                best = Some((*tile, walkable, distance));
            }
        }
    }
    best
}

fn nearest(group: &[Position], point: Position) -> f64 {
    group
        .iter()
        .map(|tile| tile.euclidean_distance(point))
        .fold(f64::INFINITY, f64::min)
}

/// Single-linkage grouping of pockets whose closest tiles lie within `distance`.
fn group_pockets(pockets: Vec<Vec<Position>>, distance: f64) -> Vec<Vec<Position>> {
    let mut parent: Vec<usize> = (0..pockets.len()).collect();

    fn root(parent: &mut [usize], mut index: usize) -> usize {
        while parent[index] != index {
            parent[index] = parent[parent[index]];
            index = parent[index];
        }
        index
    }

    for first in 0..pockets.len() {
        for second in first + 1..pockets.len() {
            let close = pockets[first].iter().any(|a| {
                pockets[second]
                    .iter()
                    .any(|b| a.euclidean_distance(*b) <= distance)
            });
            if close {
                let a = root(&mut parent, first);
                let b = root(&mut parent, second);
                if a != b {
                    parent[a.max(b)] = a.min(b);
                }
            }
        }
    }

    let mut groups: Vec<(usize, Vec<Position>)> = Vec::new();
    for (index, pocket) in pockets.into_iter().enumerate() {
        let leader = root(&mut parent, index);
        match groups.iter_mut().find(|(id, _)| *id == leader) {
            Some((_, tiles)) => tiles.extend(pocket),
            None => groups.push((leader, pocket)),
        }
    }
    groups.into_iter().map(|(_, tiles)| tiles).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledge() -> Grid {
        Grid::from_ascii(&[
            "##########",
            "#........#",
            "#........#",
            "#.....####",
            "#.....####",
            "#.....####",
            "#.....####",
            "##########",
        ])
        .expect("grid")
    }

    fn placer() -> FloatingPlatformPlacer {
        FloatingPlatformPlacer::new(
            PlatformConfig {
                platform_width: 2,
                ..PlatformConfig::default()
            },
            JumpEnvelope::new(4, 2),
        )
        .expect("placer")
    }

    #[test]
    fn bridges_a_ledge_out_of_jump_range() {
        let grid = ledge();
        let spawn = Position::new(1, 6);
        let goal = Position::new(8, 2);

        let plan = placer().place_platforms(&grid, spawn, goal).expect("plan");

        assert!(!plan.platforms().is_empty());
        assert!(plan.report().goal_reachable());
        assert_eq!(plan.groups(), 1);
        assert_eq!(plan.resolved_groups(), 1);
        for (index, platform) in plan.platforms().iter().enumerate() {
            let others: Vec<_> = plan
                .platforms()
                .iter()
                .enumerate()
                .filter(|(other, _)| *other != index)
                .map(|(_, other)| *other)
                .collect();
            assert_eq!(validate_platform_placement(&grid, platform, &others), Ok(()));
        }
    }

    #[test]
    fn candidate_scan_stops_at_the_drop_depth() {
        let mut rows = vec!["#........#"; 8];
        rows.insert(0, "##########");
        rows.push("##########");
        let grid = Grid::from_ascii(&rows).expect("grid");
        let anchor = Position::new(4, 3);

        for drop_search_rows in [0, 1] {
            let placer = FloatingPlatformPlacer::new(
                PlatformConfig {
                    platform_width: 2,
                    drop_search_rows,
                    ..PlatformConfig::default()
                },
                JumpEnvelope::new(3, 2),
            )
            .expect("placer");
            let footprints = placer.candidates(&grid, anchor, Position::new(4, 1), &[]);

            assert!(!footprints.is_empty());
            assert!(footprints
                .iter()
                .all(|platform| platform.row() <= anchor.y() + drop_search_rows + 1));
        }
    }

    #[test]
    fn flat_room_needs_no_platforms() {
        let grid = Grid::from_ascii(&["#######", "#.....#", "#.....#", "#######"]).expect("grid");
        let plan = placer()
            .place_platforms(&grid, Position::new(1, 2), Position::new(5, 2))
            .expect("plan");
        assert!(plan.platforms().is_empty());
        assert_eq!(plan.groups(), 0);
    }

    #[test]
    fn pockets_away_from_the_goal_are_bridged_too() {
        let grid = ledge();
        let plan = placer()
            .place_platforms(&grid, Position::new(1, 6), Position::new(5, 6))
            .expect("plan");
        assert_eq!(plan.groups(), 1);
        assert_eq!(plan.resolved_groups(), 1);
        assert!((plan.report().ratio() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_budget_is_a_recoverable_failure() {
        let grid = ledge();
        let placer = FloatingPlatformPlacer::new(
            PlatformConfig {
                max_platforms: 0,
                ..PlatformConfig::default()
            },
            JumpEnvelope::new(4, 2),
        )
        .expect("placer");
        let error = placer
            .place_platforms(&grid, Position::new(1, 6), Position::new(8, 2))
            .expect_err("no budget");
        assert!(error.is_retryable());
        assert_eq!(
            error.as_failure().map(GenerationFailure::stage),
            Some(Stage::PlatformPlacement)
        );
    }

    #[test]
    fn nearby_pockets_share_a_group() {
        let pockets = vec![
            vec![Position::new(1, 1)],
            vec![Position::new(9, 9)],
            vec![Position::new(3, 1)],
        ];
        let groups = group_pockets(pockets, 3.0);
        assert_eq!(
            groups,
            vec![
                vec![Position::new(1, 1), Position::new(3, 1)],
                vec![Position::new(9, 9)],
            ]
        );
    }
}
