#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Corridor carving system that merges every floor region into one.

use cave_forge_core::{
    Cell, GenerationError, GenerationFailure, Grid, LevelRng, Position, Stage,
};
use cave_forge_terrain::{detect_regions, RegionInfo, RegionMap};

/// Straight or L-shaped corridor dug between two regions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Corridor {
    from: Position,
    to: Position,
    horizontal_first: bool,
    cells_carved: usize,
}

impl Corridor {
    /// Endpoint inside the first region.
    #[must_use]
    pub const fn from(&self) -> Position {
        self.from
    }

    /// Endpoint inside the second region.
    #[must_use]
    pub const fn to(&self) -> Position {
        self.to
    }

    /// Whether the horizontal leg was dug before the vertical one.
    #[must_use]
    pub const fn horizontal_first(&self) -> bool {
        self.horizontal_first
    }

    /// Number of wall tiles converted to floor by this corridor.
    #[must_use]
    pub const fn cells_carved(&self) -> usize {
        self.cells_carved
    }
}

/// Outcome of a carving run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CarveSummary {
    initial_regions: usize,
    corridors: Vec<Corridor>,
}

impl CarveSummary {
    /// Regions present before carving started.
    #[must_use]
    pub const fn initial_regions(&self) -> usize {
        self.initial_regions
    }

    /// Corridors in the order they were dug.
    #[must_use]
    pub fn corridors(&self) -> &[Corridor] {
        &self.corridors
    }

    /// Total wall tiles converted to floor.
    #[must_use]
    pub fn cells_carved(&self) -> usize {
        self.corridors.iter().map(Corridor::cells_carved).sum()
    }
}

/// Joins disconnected floor regions with minimal corridors.
///
/// Each iteration picks the two regions whose representative tiles are
/// closest, finds a near pair of member tiles between them and digs an
/// L-shaped corridor whose orientation comes from a fair coin flip. Regions
/// are relabelled after every corridor until a single region remains.
#[derive(Clone, Copy, Debug, Default)]
pub struct CorridorCarver;

impl CorridorCarver {
    /// Creates a carver.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Carves corridors in place until the grid holds exactly one floor region.
    pub fn carve(&self, grid: &mut Grid, rng: &mut LevelRng) -> Result<CarveSummary, GenerationError> {
        let mut map = detect_regions(grid);
        let initial_regions = map.region_count();
        if initial_regions == 0 {
            return Err(GenerationFailure::new(Stage::Connectivity, "grid holds no floor tiles")
                .with_diagnostic("width", grid.width())
                .with_diagnostic("height", grid.height())
                .into());
        }

        let mut summary = CarveSummary {
            initial_regions,
            corridors: Vec::new(),
        };

        while !map.is_single_region() {
            if summary.corridors.len() >= initial_regions {
                return Err(GenerationFailure::new(
                    Stage::Connectivity,
                    "corridor carving did not converge",
                )
                .with_diagnostic("initial_regions", initial_regions)
                .with_diagnostic("remaining_regions", map.region_count())
                .into());
            }

            let Some((first, second)) = nearest_pair(&map) else {
                break;
            };
            let from = nearest_member(&map, first.label(), second.representative())
                .unwrap_or(first.representative());
            let to = nearest_member(&map, second.label(), from).unwrap_or(second.representative());
            let horizontal_first = rng.chance(0.5);
            let cells_carved = dig(grid, from, to, horizontal_first);

            tracing::debug!(
                from_region = first.label(),
                to_region = second.label(),
                from_x = from.x(),
                from_y = from.y(),
                to_x = to.x(),
                to_y = to.y(),
                cells_carved,
                "carved corridor"
            );

            summary.corridors.push(Corridor {
                from,
                to,
                horizontal_first,
                cells_carved,
            });
            map = detect_regions(grid);
        }

        tracing::debug!(
            initial_regions,
            corridors = summary.corridors.len(),
            cells_carved = summary.cells_carved(),
            "connectivity restored"
        );

        Ok(summary)
    }
}

fn nearest_pair(map: &RegionMap) -> Option<(RegionInfo, RegionInfo)> {
    let regions = map.regions();
    let mut best: Option<(RegionInfo, RegionInfo, u64)> = None;

    for (index, first) in regions.iter().enumerate() {
        for second in &regions[index + 1..] {
            let distance = squared_distance(first.representative(), second.representative());
            if best.map_or(true, |(_, _, current)| distance < current) {
                best = Some((*first, *second, distance));
            }
        }
    }

    best.map(|(first, second, _)| (first, second))
}

fn nearest_member(map: &RegionMap, label: u32, target: Position) -> Option<Position> {
    map.members(label)
        .fold(None::<(Position, u64)>, |best, candidate| {
            let distance = squared_distance(candidate, target);
            match best {
                Some((_, current)) if current <= distance => best,
                _ => Some((candidate, distance)),
            }
        })
        .map(|(position, _)| position)
}

fn squared_distance(a: Position, b: Position) -> u64 {
    let dx = u64::from(a.x().abs_diff(b.x()));
    let dy = u64::from(a.y().abs_diff(b.y()));
    dx * dx + dy * dy
}

fn dig(grid: &mut Grid, from: Position, to: Position, horizontal_first: bool) -> usize {
    let corner = if horizontal_first {
        Position::new(to.x(), from.y())
    } else {
        Position::new(from.x(), to.y())
    };
    dig_straight(grid, from, corner) + dig_straight(grid, corner, to)
}

fn dig_straight(grid: &mut Grid, a: Position, b: Position) -> usize {
    let mut carved = 0;
    for y in a.y().min(b.y())..=a.y().max(b.y()) {
        for x in a.x().min(b.x())..=a.x().max(b.x()) {
            let position = Position::new(x, y);
            if grid.is_wall(position) {
                grid.set(position, Cell::Floor);
                carved += 1;
            }
        }
    }
    carved
}
