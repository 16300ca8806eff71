//! Weighted multi-strategy coin distribution.

use cave_forge_core::{CoinConfig, ConfigError, Grid, LevelRng, Position};
use cave_forge_system_reachability::ReachabilityMap;

/// Reason a tile was chosen for a coin, with the data used to score it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CoinStrategy {
    /// Floor tile with exactly one orthogonal floor neighbour.
    DeadEnd {
        /// Straight-line distance from the spawn.
        spawn_distance: f64,
    },
    /// Tile away from the map centre.
    Exploration {
        /// Straight-line distance from the map centre.
        center_distance: f64,
    },
    /// Tile far from the spawn horizontally or separated by a large climb.
    Unreachable {
        /// Column distance from the spawn.
        horizontal: u32,
        /// Row distance from the spawn.
        vertical: u32,
    },
}

impl CoinStrategy {
    /// Ranking score; larger values are placed first.
    #[must_use]
    pub fn score(&self) -> f64 {
        match *self {
            Self::DeadEnd { spawn_distance } => spawn_distance,
            Self::Exploration { center_distance } => center_distance,
            Self::Unreachable {
                horizontal,
                vertical,
            } => f64::from(horizontal) + 2.0 * f64::from(vertical),
        }
    }

    /// Short label used in logs and output.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::DeadEnd { .. } => "dead_end",
            Self::Exploration { .. } => "exploration",
            Self::Unreachable { .. } => "unreachable",
        }
    }
}

/// Tile proposed by one of the candidate pools.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlacementCandidate {
    position: Position,
    strategy: CoinStrategy,
}

impl PlacementCandidate {
    /// Candidate tile.
    #[must_use]
    pub const fn position(&self) -> Position {
        self.position
    }

    /// Strategy that proposed the tile.
    #[must_use]
    pub const fn strategy(&self) -> CoinStrategy {
        self.strategy
    }

    /// Ranking score derived from the strategy.
    #[must_use]
    pub fn score(&self) -> f64 {
        self.strategy.score()
    }
}

/// Placed coin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Coin {
    position: Position,
    strategy: CoinStrategy,
    value: u32,
}

impl Coin {
    /// Tile holding the coin.
    #[must_use]
    pub const fn position(&self) -> Position {
        self.position
    }

    /// Strategy that selected the tile.
    #[must_use]
    pub const fn strategy(&self) -> CoinStrategy {
        self.strategy
    }

    /// Score value of the coin.
    #[must_use]
    pub const fn value(&self) -> u32 {
        self.value
    }
}

/// Reports whether `position` is floor with exactly one orthogonal floor neighbour.
#[must_use]
pub fn is_dead_end(grid: &Grid, position: Position) -> bool {
    grid.is_floor(position) && grid.floor_neighbors4(position).count() == 1
}

/// Distributes coins across dead ends, far-flung areas and hard-to-reach tiles.
#[derive(Clone, Debug)]
pub struct CoinDistributor {
    config: CoinConfig,
}

impl CoinDistributor {
    /// Validates the weights and creates the distributor.
    pub fn new(config: CoinConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Places up to `coin_count` coins.
    ///
    /// Each pool receives `coin_count × weight` coins (largest remainder
    /// rounding). Pools are shuffled and then ranked by score so ties fall in
    /// random order. Coins keep at least `min_distance` between each other,
    /// never occupy the spawn or goal and, when `accessible` is given, only use
    /// tiles the player can reach. Pools that run dry are topped up from the
    /// remaining candidates of every pool.
    pub fn distribute_coins(
        &self,
        grid: &Grid,
        spawn: Position,
        goal: Position,
        accessible: Option<&ReachabilityMap>,
        rng: &mut LevelRng,
    ) -> Vec<Coin> {
        let eligible: Vec<Position> = grid
            .floor_positions()
            .filter(|position| *position != spawn && *position != goal)
            .filter(|position| accessible.map_or(true, |map| map.is_reachable(*position)))
            .collect();

        let target = (self.config.coin_count as usize).min(eligible.len());
        if target == 0 {
            return Vec::new();
        }

        let mut pools = [
            dead_end_pool(grid, spawn, &eligible),
            exploration_pool(grid, &eligible),
            unreachable_pool(grid, spawn, &eligible),
        ];
        for pool in &mut pools {
            rng.shuffle(pool);
            pool.sort_by(|a, b| b.score().total_cmp(&a.score()));
        }

        let quotas = quotas(
            target,
            [
                self.config.dead_end_weight,
                self.config.exploration_weight,
                self.config.unreachable_weight,
            ],
        );

        let mut coins: Vec<Coin> = Vec::with_capacity(target);
        for (pool, quota) in pools.iter().zip(quotas) {
            let mut taken = 0;
            for candidate in pool {
                if taken == quota || coins.len() >= target {
                    break;
                }
                if self.try_place(&mut coins, candidate) {
                    taken += 1;
                }
            }
        }

        for candidate in pools.iter().flatten() {
            if coins.len() >= target {
                break;
            }
            let _ = self.try_place(&mut coins, candidate);
        }

        tracing::debug!(
            requested = self.config.coin_count,
            placed = coins.len(),
            eligible = eligible.len(),
            "coins distributed"
        );

        coins
    }

    fn try_place(&self, coins: &mut Vec<Coin>, candidate: &PlacementCandidate) -> bool {
        let blocked = coins.iter().any(|coin| {
            coin.position == candidate.position
                || coin.position.euclidean_distance(candidate.position) < self.config.min_distance
        });
        if blocked {
            return false;
        }
        coins.push(Coin {
            position: candidate.position,
            strategy: candidate.strategy,
            value: self.config.coin_value,
        });
        true
    }
}

fn dead_end_pool(grid: &Grid, spawn: Position, eligible: &[Position]) -> Vec<PlacementCandidate> {
    eligible
        .iter()
        .filter(|position| is_dead_end(grid, **position))
        .map(|position| PlacementCandidate {
            position: *position,
            strategy: CoinStrategy::DeadEnd {
                spawn_distance: position.euclidean_distance(spawn),
            },
        })
        .collect()
}

fn exploration_pool(grid: &Grid, eligible: &[Position]) -> Vec<PlacementCandidate> {
    let center_x = f64::from(grid.width()) / 2.0;
    let center_y = f64::from(grid.height()) / 2.0;
    eligible
        .iter()
        .map(|position| {
            let dx = f64::from(position.x()) - center_x;
            let dy = f64::from(position.y()) - center_y;
            PlacementCandidate {
                position: *position,
                strategy: CoinStrategy::Exploration {
                    center_distance: (dx * dx + dy * dy).sqrt(),
                },
            }
        })
        .collect()
}

fn unreachable_pool(
    grid: &Grid,
    spawn: Position,
    eligible: &[Position],
) -> Vec<PlacementCandidate> {
    let far_columns = grid.width() / 2;
    let tall_rows = (grid.height() / 4).max(1);
    eligible
        .iter()
        .filter_map(|position| {
            let horizontal = position.x().abs_diff(spawn.x());
            let vertical = position.y().abs_diff(spawn.y());
            (horizontal >= far_columns || vertical >= tall_rows).then_some(PlacementCandidate {
                position: *position,
                strategy: CoinStrategy::Unreachable {
                    horizontal,
                    vertical,
                },
            })
        })
        .collect()
}

/// Splits `total` across weights with largest-remainder rounding.
///
/// Weights may sum to slightly more than one, so the floored shares are
/// trimmed, smallest remainder first, until they add up to `total`.
fn quotas(total: usize, weights: [f64; 3]) -> [usize; 3] {
    let raw = weights.map(|weight| weight * total as f64);
    let mut quotas = raw.map(|share| share.floor() as usize);

    let mut order = [0_usize, 1, 2];
    order.sort_by(|a, b| {
        let left = raw[*a] - raw[*a].floor();
        let right = raw[*b] - raw[*b].floor();
        right.total_cmp(&left)
    });

    let mut assigned: usize = quotas.iter().sum();
    while assigned > total {
        let Some(index) = order.iter().rev().copied().find(|index| quotas[*index] > 0) else {
            break;
        };
        quotas[index] -= 1;
        assigned -= 1;
    }

    let mut remaining = total.saturating_sub(assigned);
    for index in order {
        if remaining == 0 {
            break;
        }
        quotas[index] += 1;
        remaining -= 1;
    }
    quotas
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corridor_with_branch() -> Grid {
        let mut rows = vec!["##########".to_string(); 10];
        rows[5] = "..........".to_string();
        for row in rows.iter_mut().take(9).skip(6) {
            row.replace_range(6..7, ".");
        }
        let rows: Vec<&str> = rows.iter().map(String::as_str).collect();
        Grid::from_ascii(&rows).expect("grid")
    }

    #[test]
    fn dead_ends_are_corridor_endpoints_and_branch_tip() {
        let grid = corridor_with_branch();
        let dead_ends: Vec<Position> = grid
            .floor_positions()
            .filter(|position| is_dead_end(&grid, *position))
            .collect();
        assert_eq!(
            dead_ends,
            vec![Position::new(0, 5), Position::new(9, 5), Position::new(6, 8)]
        );
        assert!(!is_dead_end(&grid, Position::new(0, 0)));
    }

    #[test]
    fn quotas_sum_to_total() {
        assert_eq!(quotas(20, [0.4, 0.35, 0.25]), [8, 7, 5]);
        assert_eq!(quotas(3, [0.4, 0.35, 0.25]), [1, 1, 1]);
        assert_eq!(quotas(1, [0.4, 0.35, 0.25]), [1, 0, 0]);
    }

    #[test]
    fn overweight_quotas_are_trimmed_to_total() {
        let split = quotas(1200, [0.0, 0.5, 0.5009]);
        assert_eq!(split.iter().sum::<usize>(), 1200);
        assert_eq!(split, [0, 599, 601]);
    }

    #[test]
    fn weights_at_the_tolerance_never_overshoot_the_cap() {
        let grid = Grid::filled(100, 40, cave_forge_core::Cell::Floor).expect("grid");
        let distributor = CoinDistributor::new(
            CoinConfig::new(1200, 0.0, 0.5, 0.5009, 0.0).expect("config within tolerance"),
        )
        .expect("distributor");
        let coins = distributor.distribute_coins(
            &grid,
            Position::new(0, 39),
            Position::new(99, 39),
            None,
            &mut LevelRng::from_seed_str("tolerance"),
        );
        assert_eq!(coins.len(), 1200);
    }

    #[test]
    fn coins_respect_cap_and_spacing() {
        let grid = corridor_with_branch();
        let distributor = CoinDistributor::new(CoinConfig {
            coin_count: 50,
            min_distance: 2.0,
            ..CoinConfig::default()
        })
        .expect("distributor");
        let coins = distributor.distribute_coins(
            &grid,
            Position::new(0, 5),
            Position::new(9, 5),
            None,
            &mut LevelRng::from_seed_str("coins"),
        );

        assert!(!coins.is_empty());
        assert!(coins.len() <= grid.floor_count());
        for (index, coin) in coins.iter().enumerate() {
            assert!(grid.is_floor(coin.position()));
            assert_ne!(coin.position(), Position::new(0, 5));
            assert_ne!(coin.position(), Position::new(9, 5));
            for other in &coins[index + 1..] {
                assert!(coin.position().euclidean_distance(other.position()) >= 2.0);
            }
        }
    }

    #[test]
    fn dead_end_pool_is_used_first() {
        let grid = corridor_with_branch();
        let distributor = CoinDistributor::new(
            CoinConfig::new(1, 1.0, 0.0, 0.0, 1.0).expect("config"),
        )
        .expect("distributor");
        let coins = distributor.distribute_coins(
            &grid,
            Position::new(0, 5),
            Position::new(9, 5),
            None,
            &mut LevelRng::from_seed_str("branch"),
        );
        assert_eq!(coins.len(), 1);
        assert_eq!(coins[0].position(), Position::new(6, 8));
        assert_eq!(coins[0].strategy().label(), "dead_end");
    }

    #[test]
    fn zero_coins_requested_places_nothing() {
        let grid = corridor_with_branch();
        let distributor = CoinDistributor::new(CoinConfig {
            coin_count: 0,
            ..CoinConfig::default()
        })
        .expect("distributor");
        assert!(distributor
            .distribute_coins(
                &grid,
                Position::new(0, 5),
                Position::new(9, 5),
                None,
                &mut LevelRng::from_seed_str("none"),
            )
            .is_empty());
    }
}
