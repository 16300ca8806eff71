#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Cave Forge level generator.
//!
//! This crate defines the value types that flow between pipeline stages. The
//! terrain crate produces a [`Grid`], systems read it through bounds-checked
//! accessors and answer with [`Position`] placements, [`PlatformSpec`] bridges
//! and [`Path`] proofs. Every stage draws randomness from a single
//! [`LevelRng`] passed by mutable reference so one seed reproduces a level
//! bit for bit.

mod config;
mod error;
mod grid;
mod rng;

use serde::{Deserialize, Serialize};

pub use config::{
    CaveConfig, CoinConfig, GenerationConfig, GoalConfig, PathfindingMethod, PhysicsConfig,
    PlatformConfig, SolvabilityConfig, SpawnConfig, WEIGHT_TOLERANCE,
};
pub use error::{ConfigError, Diagnostics, GenerationError, GenerationFailure, Stage};
pub use grid::Grid;
pub use rng::LevelRng;

/// Contents of a single grid cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Cell {
    /// Open space the player can occupy.
    Floor = 0,
    /// Solid rock.
    Wall = 1,
}

impl Cell {
    /// Numeric encoding used by the level output (`0` floor, `1` wall).
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Decodes a numeric cell value, rejecting anything outside `{0, 1}`.
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Floor),
            1 => Some(Self::Wall),
            _ => None,
        }
    }

    /// Reports whether the cell is open floor.
    #[must_use]
    pub const fn is_floor(self) -> bool {
        matches!(self, Self::Floor)
    }

    /// Reports whether the cell is solid wall.
    #[must_use]
    pub const fn is_wall(self) -> bool {
        matches!(self, Self::Wall)
    }
}

/// Location of a single tile expressed as column and row coordinates.
///
/// Rows grow downward, so `y + 1` is the tile directly below.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    x: u32,
    y: u32,
}

impl Position {
    /// Creates a new tile coordinate.
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Zero-based column index of the tile.
    #[must_use]
    pub const fn x(&self) -> u32 {
        self.x
    }

    /// Zero-based row index of the tile.
    #[must_use]
    pub const fn y(&self) -> u32 {
        self.y
    }

    /// Computes the Manhattan distance between two positions.
    #[must_use]
    pub fn manhattan_distance(self, other: Position) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// Computes the straight-line distance between two positions.
    #[must_use]
    pub fn euclidean_distance(self, other: Position) -> f64 {
        let dx = f64::from(self.x.abs_diff(other.x));
        let dy = f64::from(self.y.abs_diff(other.y));
        (dx * dx + dy * dy).sqrt()
    }

    /// Returns the position shifted by the signed offset, or `None` on underflow.
    #[must_use]
    pub fn offset(self, dx: i32, dy: i32) -> Option<Position> {
        Some(Position::new(
            self.x.checked_add_signed(dx)?,
            self.y.checked_add_signed(dy)?,
        ))
    }

    /// Tile directly above, if any.
    #[must_use]
    pub fn above(self) -> Option<Position> {
        self.offset(0, -1)
    }

    /// Tile directly below. Never fails; callers bound-check against the grid.
    #[must_use]
    pub fn below(self) -> Position {
        Position::new(self.x, self.y.saturating_add(1))
    }

    /// Reports whether the two positions share an edge.
    #[must_use]
    pub fn is_adjacent(self, other: Position) -> bool {
        self.manhattan_distance(other) == 1
    }
}

/// Ordered sequence of positions from a start tile to a goal tile inclusive.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Path {
    positions: Vec<Position>,
}

impl Path {
    /// Wraps the provided positions without validating adjacency.
    #[must_use]
    pub fn new(positions: Vec<Position>) -> Self {
        Self { positions }
    }

    /// Creates a path that contains no positions.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            positions: Vec::new(),
        }
    }

    /// Positions visited by the path in travel order.
    #[must_use]
    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    /// Number of tiles on the path, counting both endpoints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Reports whether the path holds no positions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// First tile of the path.
    #[must_use]
    pub fn start(&self) -> Option<Position> {
        self.positions.first().copied()
    }

    /// Last tile of the path.
    #[must_use]
    pub fn end(&self) -> Option<Position> {
        self.positions.last().copied()
    }

    /// Iterator over consecutive `(from, to)` steps.
    pub fn steps(&self) -> impl Iterator<Item = (Position, Position)> + '_ {
        self.positions
            .windows(2)
            .map(|window| (window[0], window[1]))
    }
}

/// Horizontal floating platform anchored at its leftmost footprint tile.
///
/// Platforms never modify the grid. Their footprint occupies floor tiles and
/// the row directly above the footprint becomes standable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlatformSpec {
    origin: Position,
    width: u32,
}

impl PlatformSpec {
    /// Creates a platform spanning `width` tiles to the right of `origin`.
    #[must_use]
    pub const fn new(origin: Position, width: u32) -> Self {
        Self { origin, width }
    }

    /// Leftmost footprint tile.
    #[must_use]
    pub const fn origin(&self) -> Position {
        self.origin
    }

    /// Number of tiles spanned by the platform.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Row occupied by the platform footprint.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.origin.y()
    }

    /// Tiles covered by the platform.
    pub fn footprint(&self) -> impl Iterator<Item = Position> {
        let origin = self.origin;
        (0..self.width).filter_map(move |dx| {
            origin
                .x()
                .checked_add(dx)
                .map(|x| Position::new(x, origin.y()))
        })
    }

    /// Reports whether `position` lies on the platform footprint.
    #[must_use]
    pub fn covers(&self, position: Position) -> bool {
        position.y() == self.origin.y()
            && position.x() >= self.origin.x()
            && position.x() - self.origin.x() < self.width
    }

    /// Reports whether a player standing on `position` is supported by this platform.
    #[must_use]
    pub fn supports(&self, position: Position) -> bool {
        self.covers(position.below())
    }
}
