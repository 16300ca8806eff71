#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Physics-aware reachability analysis for side-view cave levels.
//!
//! The analyzer flood-fills the tiles a player can stand on, starting from a
//! given tile. Movement between standing tiles follows jump arcs bounded by a
//! [`JumpEnvelope`]: the player rises straight up by at most the envelope's
//! vertical reach, travels horizontally along the apex row and falls until it
//! lands on the first standable tile. Walking is the zero-lift arc to an
//! adjacent column. Floating platforms are one-way supports layered over the
//! grid without modifying it.

mod accessibility;
mod platform;

use std::collections::VecDeque;

use cave_forge_core::{ConfigError, Grid, PhysicsConfig, PlatformSpec, Position};

pub use accessibility::{validate_accessibility, AccessibilityReport};
pub use platform::{validate_platform_placement, PlatformRejection};

/// Maximum jump displacement measured in tiles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct JumpEnvelope {
    horizontal: u32,
    vertical: u32,
}

impl JumpEnvelope {
    /// Creates an envelope from explicit tile reaches.
    #[must_use]
    pub const fn new(horizontal: u32, vertical: u32) -> Self {
        Self {
            horizontal,
            vertical,
        }
    }

    /// Derives the envelope from projectile motion.
    ///
    /// The apex height is `v² / 2g` and the horizontal reach is the run speed
    /// multiplied by the airtime `2v / g`; both are floored to whole tiles.
    #[must_use]
    pub fn from_physics(physics: &PhysicsConfig) -> Self {
        let apex = physics.jump_velocity * physics.jump_velocity / (2.0 * physics.gravity);
        let airtime = 2.0 * physics.jump_velocity / physics.gravity;
        let reach = physics.move_speed * airtime;
        Self {
            horizontal: to_tiles(reach, physics.tile_size),
            vertical: to_tiles(apex, physics.tile_size),
        }
    }

    /// Columns a single jump can cover.
    #[must_use]
    pub const fn horizontal(&self) -> u32 {
        self.horizontal
    }

    /// Rows a single jump can climb.
    #[must_use]
    pub const fn vertical(&self) -> u32 {
        self.vertical
    }
}

fn to_tiles(pixels: f64, tile_size: f64) -> u32 {
    let tiles = (pixels / tile_size).floor();
    if tiles.is_finite() && tiles > 0.0 {
        tiles.min(f64::from(u32::MAX)) as u32
    } else {
        0
    }
}

/// Reachability classification of a single tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TileReach {
    /// Wall tile.
    Solid,
    /// Standable tile the player can rest on.
    Walkable,
    /// Open tile crossed mid-jump or mid-fall.
    Airborne,
    /// Standable tile that cannot be reached without an additional platform.
    RequiresPlatform,
    /// Open tile the player never passes through.
    Unreached,
}

/// Result of a reachability flood fill.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReachabilityMap {
    width: u32,
    height: u32,
    origin: Position,
    states: Vec<TileReach>,
}

impl ReachabilityMap {
    /// Tile the player comes to rest on after falling from the start tile.
    #[must_use]
    pub const fn origin(&self) -> Position {
        self.origin
    }

    /// Classification of `position`, or `None` outside the grid.
    #[must_use]
    pub fn state(&self, position: Position) -> Option<TileReach> {
        self.index(position)
            .and_then(|index| self.states.get(index).copied())
    }

    /// Reports whether the player can occupy `position`, standing or airborne.
    #[must_use]
    pub fn is_reachable(&self, position: Position) -> bool {
        matches!(
            self.state(position),
            Some(TileReach::Walkable | TileReach::Airborne)
        )
    }

    /// Reports whether the player can stand on `position`.
    #[must_use]
    pub fn is_walkable(&self, position: Position) -> bool {
        self.state(position) == Some(TileReach::Walkable)
    }

    /// Number of standable tiles the player can reach.
    #[must_use]
    pub fn reachable_count(&self) -> usize {
        self.states
            .iter()
            .filter(|state| **state == TileReach::Walkable)
            .count()
    }

    /// Reachable standing tiles in row-major order.
    pub fn walkable_positions(&self) -> impl Iterator<Item = Position> + '_ {
        self.positions_with(TileReach::Walkable)
    }

    /// Standable tiles that need a platform, in row-major order.
    #[must_use]
    pub fn unreachable_floor(&self) -> Vec<Position> {
        self.positions_with(TileReach::RequiresPlatform).collect()
    }

    /// Unreachable standable tiles grouped into 4-connected pockets.
    ///
    /// Pockets are discovered in row-major order and each pocket lists its
    /// tiles in breadth-first order from its first tile.
    #[must_use]
    pub fn pockets(&self) -> Vec<Vec<Position>> {
        let mut visited = vec![false; self.states.len()];
        let mut pockets = Vec::new();
        let mut queue = VecDeque::new();

        for seed in self.unreachable_floor() {
            let Some(seed_index) = self.index(seed) else {
                continue;
            };
            if visited[seed_index] {
                continue;
            }
            visited[seed_index] = true;
            queue.push_back(seed);

            let mut pocket = Vec::new();
            while let Some(current) = queue.pop_front() {
                pocket.push(current);
                for neighbor in orthogonal(current) {
                    let Some(index) = self.index(neighbor) else {
                        continue;
                    };
                    if visited[index] || self.states[index] != TileReach::RequiresPlatform {
                        continue;
                    }
                    visited[index] = true;
                    queue.push_back(neighbor);
                }
            }
            pockets.push(pocket);
        }

        pockets
    }

    fn positions_with(&self, wanted: TileReach) -> impl Iterator<Item = Position> + '_ {
        let width = self.width.max(1) as usize;
        self.states
            .iter()
            .enumerate()
            .filter(move |(_, state)| **state == wanted)
            .filter_map(move |(index, _)| {
                let x = u32::try_from(index % width).ok()?;
                let y = u32::try_from(index / width).ok()?;
                Some(Position::new(x, y))
            })
    }

    fn index(&self, position: Position) -> Option<usize> {
        if position.x() >= self.width || position.y() >= self.height {
            return None;
        }
        Some(position.y() as usize * self.width as usize + position.x() as usize)
    }
}

fn orthogonal(position: Position) -> impl Iterator<Item = Position> {
    [(0, -1), (1, 0), (0, 1), (-1, 0)]
        .into_iter()
        .filter_map(move |(dx, dy)| position.offset(dx, dy))
}

/// Flood-fills the standing tiles reachable from a start tile.
#[derive(Clone, Debug)]
pub struct ReachabilityAnalyzer<'a> {
    grid: &'a Grid,
    envelope: JumpEnvelope,
    platforms: Vec<PlatformSpec>,
}

impl<'a> ReachabilityAnalyzer<'a> {
    /// Creates an analyzer over `grid` without any platforms.
    #[must_use]
    pub fn new(grid: &'a Grid, envelope: JumpEnvelope) -> Self {
        Self {
            grid,
            envelope,
            platforms: Vec::new(),
        }
    }

    /// Adds one-way platforms the player can land on.
    #[must_use]
    pub fn with_platforms(mut self, platforms: &[PlatformSpec]) -> Self {
        self.platforms.extend_from_slice(platforms);
        self
    }

    /// Envelope bounding every jump.
    #[must_use]
    pub const fn envelope(&self) -> JumpEnvelope {
        self.envelope
    }

    /// Reports whether a player can rest on `position`.
    ///
    /// The tile must be floor, and the tile below must be wall, the bottom
    /// edge of the grid or the top of a platform.
    #[must_use]
    pub fn is_standable(&self, position: Position) -> bool {
        if !self.grid.is_floor(position) {
            return false;
        }
        position.y() + 1 >= self.grid.height()
            || self.grid.is_wall(position.below())
            || self
                .platforms
                .iter()
                .any(|platform| platform.supports(position))
    }

    /// Computes the reachability map from `start`.
    ///
    /// A start tile in mid-air falls until it lands; the landing tile becomes
    /// the origin of the flood fill.
    pub fn analyze(&self, start: Position) -> Result<ReachabilityMap, ConfigError> {
        self.grid.require_floor(start)?;

        let mut states: Vec<TileReach> = self
            .grid
            .cells()
            .iter()
            .map(|cell| {
                if cell.is_wall() {
                    TileReach::Solid
                } else {
                    TileReach::Unreached
                }
            })
            .collect();

        let origin = self.land(start, &mut states).unwrap_or(start);
        let mut queue = VecDeque::new();
        let mut landings = Vec::new();
        self.mark_walkable(origin, &mut states, &mut queue);

        while let Some(current) = queue.pop_front() {
            landings.clear();
            self.arcs_from(current, &mut states, &mut landings);
            for landing in &landings {
                self.mark_walkable(*landing, &mut states, &mut queue);
            }
        }

        for position in self.grid.floor_positions() {
            let Some(index) = self.grid.index(position) else {
                continue;
            };
            if states[index] != TileReach::Walkable && self.is_standable(position) {
                states[index] = TileReach::RequiresPlatform;
            }
        }

        let map = ReachabilityMap {
            width: self.grid.width(),
            height: self.grid.height(),
            origin,
            states,
        };

        tracing::trace!(
            origin_x = origin.x(),
            origin_y = origin.y(),
            platforms = self.platforms.len(),
            walkable = map.reachable_count(),
            "reachability analyzed"
        );

        Ok(map)
    }

    fn mark_walkable(
        &self,
        position: Position,
        states: &mut [TileReach],
        queue: &mut VecDeque<Position>,
    ) {
        let Some(index) = self.grid.index(position) else {
            return;
        };
        if states[index] == TileReach::Walkable {
            return;
        }
        states[index] = TileReach::Walkable;
        queue.push_back(position);
    }

    fn mark_airborne(&self, position: Position, states: &mut [TileReach]) {
        if let Some(index) = self.grid.index(position) {
            if states[index] == TileReach::Unreached {
                states[index] = TileReach::Airborne;
            }
        }
    }

    /// Collects every landing reachable with one arc from `from`.
    fn arcs_from(&self, from: Position, states: &mut [TileReach], landings: &mut Vec<Position>) {
        let width = i64::from(self.grid.width());
        let reach = i64::from(self.envelope.horizontal.min(self.grid.width()));
        let max_lift = self.envelope.vertical.min(from.y());

        for lift in 0..=max_lift {
            let apex_y = from.y() - lift;
            let apex = Position::new(from.x(), apex_y);
            if !self.grid.is_floor(apex) {
                break;
            }
            self.mark_airborne(apex, states);

            // Without lift the player can only step to an adjacent column.
            let steps = if lift == 0 { 1 } else { reach };
            for direction in [-1_i64, 1] {
                for step in 1..=steps {
                    let x = i64::from(from.x()) + direction * step;
                    if x < 0 || x >= width {
                        break;
                    }
                    let Ok(column) = u32::try_from(x) else {
                        break;
                    };
                    let top = Position::new(column, apex_y);
                    if !self.grid.is_floor(top) {
                        break;
                    }
                    if let Some(landing) = self.land(top, states) {
                        landings.push(landing);
                    }
                }
            }
        }
    }

    /// Falls straight down from `from` and returns the first standable tile.
    fn land(&self, from: Position, states: &mut [TileReach]) -> Option<Position> {
        let mut current = from;
        loop {
            if !self.grid.is_floor(current) {
                return None;
            }
            if self.is_standable(current) {
                return Some(current);
            }
            self.mark_airborne(current, states);
            current = Position::new(current.x(), current.y() + 1);
        }
    }
}
