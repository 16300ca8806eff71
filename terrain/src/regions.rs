//! Connected floor component labelling.

use std::collections::VecDeque;

use cave_forge_core::{Cell, Grid, Position};

/// Summary of one connected floor component.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RegionInfo {
    label: u32,
    size: usize,
    min: Position,
    max: Position,
    representative: Position,
}

impl RegionInfo {
    /// Non-zero label stored in the [`RegionMap`].
    #[must_use]
    pub const fn label(&self) -> u32 {
        self.label
    }

    /// Number of floor tiles in the region.
    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Top-left corner of the bounding box.
    #[must_use]
    pub const fn min(&self) -> Position {
        self.min
    }

    /// Bottom-right corner of the bounding box.
    #[must_use]
    pub const fn max(&self) -> Position {
        self.max
    }

    /// Member tile closest to the region centroid.
    #[must_use]
    pub const fn representative(&self) -> Position {
        self.representative
    }
}

/// Label grid parallel to a [`Grid`]: `0` marks walls, positive values name
/// 4-connected floor components in discovery order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegionMap {
    width: u32,
    height: u32,
    labels: Vec<u32>,
    regions: Vec<RegionInfo>,
}

impl RegionMap {
    /// Label stored for `position`; `0` for walls and out-of-bounds tiles.
    #[must_use]
    pub fn label_at(&self, position: Position) -> u32 {
        if position.x() >= self.width || position.y() >= self.height {
            return 0;
        }
        let index = position.y() as usize * self.width as usize + position.x() as usize;
        self.labels.get(index).copied().unwrap_or(0)
    }

    /// Metadata for every region ordered by label.
    #[must_use]
    pub fn regions(&self) -> &[RegionInfo] {
        &self.regions
    }

    /// Metadata for the region carrying `label`.
    #[must_use]
    pub fn region(&self, label: u32) -> Option<&RegionInfo> {
        let index = usize::try_from(label).ok()?.checked_sub(1)?;
        self.regions.get(index)
    }

    /// Number of distinct floor regions.
    #[must_use]
    pub fn region_count(&self) -> usize {
        self.regions.len()
    }

    /// Reports whether every floor tile belongs to one region.
    #[must_use]
    pub fn is_single_region(&self) -> bool {
        self.regions.len() == 1
    }

    /// Largest region, preferring the lowest label on ties.
    #[must_use]
    pub fn largest(&self) -> Option<&RegionInfo> {
        self.regions
            .iter()
            .reduce(|best, region| if region.size > best.size { region } else { best })
    }

    /// Member tiles of `label` in row-major order.
    pub fn members(&self, label: u32) -> impl Iterator<Item = Position> + '_ {
        let width = self.width.max(1) as usize;
        self.labels
            .iter()
            .enumerate()
            .filter(move |(_, stored)| label != 0 && **stored == label)
            .filter_map(move |(index, _)| {
                let x = u32::try_from(index % width).ok()?;
                let y = u32::try_from(index / width).ok()?;
                Some(Position::new(x, y))
            })
    }
}

/// Labels every 4-connected floor component with a breadth-first flood fill.
///
/// Seeds are discovered in row-major order so labels are stable for a given grid.
#[must_use]
pub fn detect_regions(grid: &Grid) -> RegionMap {
    let mut labels = vec![0_u32; grid.cells().len()];
    let mut regions = Vec::new();
    let mut queue = VecDeque::new();
    let mut members = Vec::new();

    for seed in grid.floor_positions() {
        let Some(seed_index) = grid.index(seed) else {
            continue;
        };
        if labels[seed_index] != 0 {
            continue;
        }

        let label = u32::try_from(regions.len() + 1).unwrap_or(u32::MAX);
        labels[seed_index] = label;
        queue.push_back(seed);
        members.clear();

        while let Some(current) = queue.pop_front() {
            members.push(current);
            for neighbor in grid.floor_neighbors4(current) {
                let Some(index) = grid.index(neighbor) else {
                    continue;
                };
                if labels[index] != 0 {
                    continue;
                }
                labels[index] = label;
                queue.push_back(neighbor);
            }
        }

        regions.push(summarize(label, &members));
    }

    RegionMap {
        width: grid.width(),
        height: grid.height(),
        labels,
        regions,
    }
}

/// Fills floor regions smaller than `min_size` with wall and returns the
/// number of tiles filled. When no region reaches `min_size` the largest
/// one is kept so the grid never loses all of its floor.
pub fn cull_small_regions(grid: &mut Grid, min_size: usize) -> usize {
    let map = detect_regions(grid);
    let keep_largest = map.regions().iter().all(|region| region.size < min_size);
    let survivor = if keep_largest {
        map.largest().map(RegionInfo::label)
    } else {
        None
    };

    let mut filled = 0;
    for region in map.regions() {
        if region.size >= min_size || Some(region.label) == survivor {
            continue;
        }
        for position in map.members(region.label) {
            grid.set(position, Cell::Wall);
            filled += 1;
        }
    }

    if filled > 0 {
        tracing::debug!(
            regions = map.region_count(),
            filled,
            min_size,
            "culled small regions"
        );
    }

    filled
}

fn summarize(label: u32, members: &[Position]) -> RegionInfo {
    let first = members.first().copied().unwrap_or(Position::new(0, 0));
    let mut min = first;
    let mut max = first;
    let mut sum_x = 0_u64;
    let mut sum_y = 0_u64;

    for position in members {
        min = Position::new(min.x().min(position.x()), min.y().min(position.y()));
        max = Position::new(max.x().max(position.x()), max.y().max(position.y()));
        sum_x += u64::from(position.x());
        sum_y += u64::from(position.y());
    }

    let count = members.len().max(1) as f64;
    let centroid_x = sum_x as f64 / count;
    let centroid_y = sum_y as f64 / count;

    let mut sorted = members.to_vec();
    sorted.sort_unstable_by_key(|position| (position.y(), position.x()));
    let representative = sorted
        .iter()
        .copied()
        .fold(None::<(Position, f64)>, |best, position| {
            let dx = f64::from(position.x()) - centroid_x;
            let dy = f64::from(position.y()) - centroid_y;
            let distance = dx * dx + dy * dy;
            match best {
                Some((_, best_distance)) if best_distance <= distance => best,
                _ => Some((position, distance)),
            }
        })
        .map_or(first, |(position, _)| position);

    RegionInfo {
        label,
        size: members.len(),
        min,
        max,
        representative,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_components_in_row_major_order() {
        let grid = Grid::from_ascii(&[
            "#######",
            "#..#..#",
            "#..#..#",
            "#######",
            "#.....#",
            "#######",
        ])
        .expect("grid");
        let map = detect_regions(&grid);

        assert_eq!(map.region_count(), 3);
        assert_eq!(map.label_at(Position::new(1, 1)), 1);
        assert_eq!(map.label_at(Position::new(5, 2)), 2);
        assert_eq!(map.label_at(Position::new(3, 4)), 3);
        assert_eq!(map.label_at(Position::new(0, 0)), 0);
        assert_eq!(map.label_at(Position::new(40, 40)), 0);

        let bottom = map.region(3).expect("region");
        assert_eq!(bottom.size(), 5);
        assert_eq!(bottom.min(), Position::new(1, 4));
        assert_eq!(bottom.max(), Position::new(5, 4));
        assert_eq!(bottom.representative(), Position::new(3, 4));
    }

    #[test]
    fn diagonal_contact_does_not_join_regions() {
        let grid = Grid::from_ascii(&[".#", "#."]).expect("grid");
        assert_eq!(detect_regions(&grid).region_count(), 2);
    }

    #[test]
    fn solid_grid_has_no_regions() {
        let grid = Grid::filled(4, 4, Cell::Wall).expect("grid");
        let map = detect_regions(&grid);
        assert_eq!(map.region_count(), 0);
        assert!(!map.is_single_region());
        assert!(map.largest().is_none());
    }

    #[test]
    fn culling_fills_small_regions() {
        let mut grid = Grid::from_ascii(&[
            "########",
            "#.#....#",
            "###....#",
            "########",
        ])
        .expect("grid");
        assert_eq!(cull_small_regions(&mut grid, 3), 1);
        assert!(grid.is_wall(Position::new(1, 1)));
        assert!(detect_regions(&grid).is_single_region());
    }

    #[test]
    fn culling_keeps_largest_when_nothing_qualifies() {
        let mut grid = Grid::from_ascii(&["#####", "#.#..", "#####"]).expect("grid");
        assert_eq!(cull_small_regions(&mut grid, 10), 1);
        assert_eq!(grid.floor_count(), 2);
        assert!(detect_regions(&grid).is_single_region());
    }
}
