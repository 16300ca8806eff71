#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Placement strategies that decorate a connected cave.
//!
//! Spawn and goal placers sample candidate tiles with bounded retry loops and
//! report exhaustion as a recoverable [`GenerationFailure`]. The coin
//! distributor mixes three weighted candidate pools, and the floating
//! platform placer bridges pockets the player cannot reach on foot.
//!
//! [`GenerationFailure`]: cave_forge_core::GenerationFailure

mod coins;
mod goal;
mod platforms;
mod spawn;

use cave_forge_core::{Grid, Position};

pub use coins::{is_dead_end, Coin, CoinDistributor, CoinStrategy, PlacementCandidate};
pub use goal::GoalPlacer;
pub use platforms::{FloatingPlatformPlacer, PlatformPlan};
pub use spawn::SpawnPlacer;

/// Reports whether `position` is floor resting on a wall or the bottom edge.
#[must_use]
pub fn has_ground(grid: &Grid, position: Position) -> bool {
    grid.is_floor(position)
        && (position.y() + 1 >= grid.height() || grid.is_wall(position.below()))
}

/// First column at or beyond `fraction` of the grid width.
pub(crate) fn boundary_column(width: u32, fraction: f64) -> u32 {
    let column = (f64::from(width) * fraction - 1e-9).ceil();
    if column <= 0.0 {
        0
    } else {
        (column as u32).min(width)
    }
}
