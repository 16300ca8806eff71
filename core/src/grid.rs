//! Dense row-major tile grid with bounds-checked accessors.

use serde::{Deserialize, Serialize};

use crate::{Cell, ConfigError, Position};

/// Fixed-size two dimensional grid of [`Cell`] values stored in row-major order.
///
/// The grid is never resized after construction. Reads outside the bounds
/// return `None`, and writes outside the bounds are ignored.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Grid {
    width: u32,
    height: u32,
    cells: Vec<Cell>,
}

impl Grid {
    /// Creates a grid where every cell holds `fill`.
    pub fn filled(width: u32, height: u32, fill: Cell) -> Result<Self, ConfigError> {
        let count = cell_count(width, height)?;
        Ok(Self {
            width,
            height,
            cells: vec![fill; count],
        })
    }

    /// Wraps pre-computed cells laid out in row-major order.
    pub fn from_cells(width: u32, height: u32, cells: Vec<Cell>) -> Result<Self, ConfigError> {
        let expected = cell_count(width, height)?;
        if cells.len() != expected {
            return Err(ConfigError::CellCountMismatch {
                width,
                height,
                expected,
                actual: cells.len(),
            });
        }

        Ok(Self {
            width,
            height,
            cells,
        })
    }

    /// Parses an ASCII fixture where `#` marks a wall and `.` marks floor.
    pub fn from_ascii(rows: &[&str]) -> Result<Self, ConfigError> {
        let height = u32::try_from(rows.len()).map_err(|_| ConfigError::InvalidDimensions {
            width: 0,
            height: u32::MAX,
        })?;
        let width = rows
            .first()
            .map_or(0, |row| u32::try_from(row.chars().count()).unwrap_or(u32::MAX));

        let expected = cell_count(width, height)?;
        if rows.iter().any(|row| row.chars().count() != width as usize) {
            return Err(ConfigError::CellCountMismatch {
                width,
                height,
                expected,
                actual: rows.iter().map(|row| row.chars().count()).sum(),
            });
        }

        let mut cells = Vec::with_capacity(expected);
        for row in rows {
            for symbol in row.chars() {
                let cell = match symbol {
                    '#' => Cell::Wall,
                    '.' => Cell::Floor,
                    other => return Err(ConfigError::InvalidSymbol(other)),
                };
                cells.push(cell);
            }
        }

        Self::from_cells(width, height, cells)
    }

    /// Number of columns.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Dense cell storage in row-major order.
    #[must_use]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Cells encoded as `0`/`1` bytes, row-major.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        self.cells.iter().map(|cell| cell.as_u8()).collect()
    }

    /// Renders the grid back into the ASCII fixture format.
    #[must_use]
    pub fn to_ascii(&self) -> String {
        let mut out = String::with_capacity(self.cells.len() + self.height as usize);
        for (index, cell) in self.cells.iter().enumerate() {
            if index > 0 && index % self.width as usize == 0 {
                out.push('\n');
            }
            out.push(if cell.is_wall() { '#' } else { '.' });
        }
        out
    }

    /// Reports whether the position lies inside the grid.
    #[must_use]
    pub const fn contains(&self, position: Position) -> bool {
        position.x() < self.width && position.y() < self.height
    }

    /// Cell stored at `position`, if it lies inside the grid.
    #[must_use]
    pub fn get(&self, position: Position) -> Option<Cell> {
        self.index(position)
            .and_then(|index| self.cells.get(index).copied())
    }

    /// Reports whether `position` is an in-bounds floor tile.
    #[must_use]
    pub fn is_floor(&self, position: Position) -> bool {
        self.get(position).is_some_and(Cell::is_floor)
    }

    /// Reports whether `position` is an in-bounds wall tile.
    #[must_use]
    pub fn is_wall(&self, position: Position) -> bool {
        self.get(position).is_some_and(Cell::is_wall)
    }

    /// Overwrites the cell at `position`. Out-of-bounds writes are ignored.
    pub fn set(&mut self, position: Position, cell: Cell) {
        if let Some(index) = self.index(position) {
            self.cells[index] = cell;
        }
    }

    /// Row-major index of `position`.
    #[must_use]
    pub fn index(&self, position: Position) -> Option<usize> {
        if !self.contains(position) {
            return None;
        }
        let row = usize::try_from(position.y()).ok()?;
        let column = usize::try_from(position.x()).ok()?;
        let width = usize::try_from(self.width).ok()?;
        row.checked_mul(width)?.checked_add(column)
    }

    /// Position stored at a row-major index.
    #[must_use]
    pub fn position_of(&self, index: usize) -> Option<Position> {
        if index >= self.cells.len() {
            return None;
        }
        let width = self.width as usize;
        let x = u32::try_from(index % width).ok()?;
        let y = u32::try_from(index / width).ok()?;
        Some(Position::new(x, y))
    }

    /// Every position in row-major order.
    pub fn positions(&self) -> impl Iterator<Item = Position> {
        let width = self.width;
        (0..self.height).flat_map(move |y| (0..width).map(move |x| Position::new(x, y)))
    }

    /// Every floor position in row-major order.
    pub fn floor_positions(&self) -> impl Iterator<Item = Position> + '_ {
        self.positions().filter(|position| self.is_floor(*position))
    }

    /// Number of floor tiles.
    #[must_use]
    pub fn floor_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_floor()).count()
    }

    /// Reports whether the position lies on the outermost ring of the grid.
    #[must_use]
    pub const fn is_edge(&self, position: Position) -> bool {
        position.x() == 0
            || position.y() == 0
            || position.x() + 1 == self.width
            || position.y() + 1 == self.height
    }

    /// Counts walls among the eight surrounding tiles. Out-of-bounds
    /// neighbours are skipped rather than counted as walls.
    #[must_use]
    pub fn wall_neighbor_count(&self, position: Position) -> u8 {
        let mut count = 0;
        for dy in -1..=1 {
            for dx in -1..=1 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                if let Some(neighbor) = position.offset(dx, dy) {
                    if self.is_wall(neighbor) {
                        count += 1;
                    }
                }
            }
        }
        count
    }

    /// In-bounds orthogonal neighbours in north, east, south, west order.
    pub fn neighbors4(&self, position: Position) -> impl Iterator<Item = Position> {
        let mut candidates = [None; 4];
        let mut count = 0;

        if let Some(north) = position.offset(0, -1) {
            candidates[count] = Some(north);
            count += 1;
        }

        if position.x() + 1 < self.width {
            candidates[count] = Some(Position::new(position.x() + 1, position.y()));
            count += 1;
        }

        if position.y() + 1 < self.height {
            candidates[count] = Some(Position::new(position.x(), position.y() + 1));
            count += 1;
        }

        if let Some(west) = position.offset(-1, 0) {
            candidates[count] = Some(west);
            count += 1;
        }

        candidates.into_iter().take(count).flatten()
    }

    /// Orthogonal floor neighbours of `position`.
    pub fn floor_neighbors4(&self, position: Position) -> impl Iterator<Item = Position> + '_ {
        self.neighbors4(position)
            .filter(|neighbor| self.is_floor(*neighbor))
    }

    /// Exchanges cell storage with another grid of identical dimensions.
    ///
    /// Used as the buffer swap of double-buffered simulations. Grids with
    /// mismatched dimensions are left untouched and `false` is returned.
    #[must_use]
    pub fn swap_cells(&mut self, other: &mut Grid) -> bool {
        if self.width != other.width || self.height != other.height {
            return false;
        }
        std::mem::swap(&mut self.cells, &mut other.cells);
        true
    }

    /// Returns an error unless `position` is an in-bounds floor tile.
    pub fn require_floor(&self, position: Position) -> Result<(), ConfigError> {
        match self.get(position) {
            None => Err(ConfigError::PositionOutOfBounds {
                x: position.x(),
                y: position.y(),
                width: self.width,
                height: self.height,
            }),
            Some(Cell::Wall) => Err(ConfigError::PositionNotFloor {
                x: position.x(),
                y: position.y(),
            }),
            Some(Cell::Floor) => Ok(()),
        }
    }
}

fn cell_count(width: u32, height: u32) -> Result<usize, ConfigError> {
    if width == 0 || height == 0 {
        return Err(ConfigError::InvalidDimensions { width, height });
    }

    let width_usize = usize::try_from(width).map_err(|_| ConfigError::InvalidDimensions { width, height })?;
    let height_usize =
        usize::try_from(height).map_err(|_| ConfigError::InvalidDimensions { width, height })?;
    width_usize
        .checked_mul(height_usize)
        .ok_or(ConfigError::InvalidDimensions { width, height })
}
