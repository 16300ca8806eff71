use cave_forge_core::{Grid, PlatformSpec};
use thiserror::Error;

/// Reason a proposed platform footprint was refused.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum PlatformRejection {
    /// The platform spans no tiles.
    #[error("platform has zero width")]
    ZeroWidth,
    /// Part of the footprint lies outside the grid.
    #[error("platform tile ({x}, {y}) lies outside the grid")]
    OutOfBounds {
        /// Column of the offending tile.
        x: u32,
        /// Row of the offending tile.
        y: u32,
    },
    /// Part of the footprint overlaps wall geometry.
    #[error("platform tile ({x}, {y}) overlaps solid terrain")]
    OverlapsSolid {
        /// Column of the offending tile.
        x: u32,
        /// Row of the offending tile.
        y: u32,
    },
    /// Part of the footprint overlaps an existing platform.
    #[error("platform tile ({x}, {y}) overlaps another platform")]
    OverlapsPlatform {
        /// Column of the offending tile.
        x: u32,
        /// Row of the offending tile.
        y: u32,
    },
    /// No tile directly above the footprint is open, so nothing can stand on it.
    #[error("platform has no open tile above its footprint")]
    NoHeadroom,
}

/// Checks that `platform` fits the grid on its own merits.
///
/// Every footprint tile must be an in-bounds floor tile not already claimed
/// by one of the `existing` platforms, and at least one tile above the
/// footprint must be open so a player can stand on it.
pub fn validate_platform_placement(
    grid: &Grid,
    platform: &PlatformSpec,
    existing: &[PlatformSpec],
) -> Result<(), PlatformRejection> {
    if platform.width() == 0 {
        return Err(PlatformRejection::ZeroWidth);
    }

    let end = u64::from(platform.origin().x()) + u64::from(platform.width());
    if end > u64::from(grid.width()) || platform.row() >= grid.height() {
        let x = u32::try_from(end.saturating_sub(1)).unwrap_or(u32::MAX);
        return Err(PlatformRejection::OutOfBounds {
            x,
            y: platform.row(),
        });
    }

    let mut headroom = false;
    for tile in platform.footprint() {
        if !grid.is_floor(tile) {
            return Err(PlatformRejection::OverlapsSolid {
                x: tile.x(),
                y: tile.y(),
            });
        }
        if existing.iter().any(|other| other.covers(tile)) {
            return Err(PlatformRejection::OverlapsPlatform {
                x: tile.x(),
                y: tile.y(),
            });
        }
        headroom |= tile.above().is_some_and(|above| grid.is_floor(above));
    }

    if headroom {
        Ok(())
    } else {
        Err(PlatformRejection::NoHeadroom)
    }
}
