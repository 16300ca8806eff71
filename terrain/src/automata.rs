//! Birth/survival cellular automaton with a double-buffered update.

use cave_forge_core::{CaveConfig, Cell, ConfigError, Grid};

/// Validated automaton rules.
///
/// Every update reads from the current grid and writes into a scratch buffer
/// that is swapped in afterwards, so all cells in one pass observe only the
/// previous generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellularAutomaton {
    birth_threshold: u8,
    survival_threshold: u8,
    simulation_steps: u32,
    smoothing_passes: u32,
}

impl CellularAutomaton {
    /// Validates the thresholds and captures the rule set.
    pub fn new(config: &CaveConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            birth_threshold: config.birth_threshold,
            survival_threshold: config.survival_threshold,
            simulation_steps: config.simulation_steps,
            smoothing_passes: config.smoothing_passes,
        })
    }

    /// Runs the configured number of simulation steps. Zero steps leave the grid untouched.
    pub fn run(&self, grid: &mut Grid) {
        if self.simulation_steps == 0 {
            return;
        }
        let mut buffer = grid.clone();
        for _ in 0..self.simulation_steps {
            self.step_into(grid, &mut buffer);
        }
    }

    /// Applies one simulation step.
    pub fn step(&self, grid: &mut Grid) {
        let mut buffer = grid.clone();
        self.step_into(grid, &mut buffer);
    }

    /// Applies one micro-smoothing pass to interior cells.
    ///
    /// A cell with more than five wall neighbours becomes wall, one with fewer
    /// than three becomes floor, and edge cells are never touched.
    pub fn smooth(&self, grid: &mut Grid) {
        let mut buffer = grid.clone();
        for position in grid.positions() {
            if grid.is_edge(position) {
                continue;
            }
            let walls = grid.wall_neighbor_count(position);
            if walls > 5 {
                buffer.set(position, Cell::Wall);
            } else if walls < 3 {
                buffer.set(position, Cell::Floor);
            }
        }
        swap(grid, &mut buffer);
    }

    /// Runs the simulation followed by every configured smoothing pass.
    pub fn evolve(&self, grid: &mut Grid) {
        self.run(grid);
        for _ in 0..self.smoothing_passes {
            self.smooth(grid);
        }
    }

    fn step_into(&self, grid: &mut Grid, buffer: &mut Grid) {
        for position in grid.positions() {
            let walls = grid.wall_neighbor_count(position);
            let next = match grid.get(position) {
                Some(Cell::Floor) if walls >= self.birth_threshold => Cell::Wall,
                Some(Cell::Floor) => Cell::Floor,
                Some(Cell::Wall) if walls >= self.survival_threshold => Cell::Wall,
                Some(Cell::Wall) => Cell::Floor,
                None => continue,
            };
            buffer.set(position, next);
        }
        swap(grid, buffer);
    }
}

fn swap(grid: &mut Grid, buffer: &mut Grid) {
    let swapped = grid.swap_cells(buffer);
    debug_assert!(swapped, "automaton buffer must mirror the grid dimensions");
}

#[cfg(test)]
mod tests {
    use super::*;
    use cave_forge_core::Position;

    fn automaton(steps: u32, smoothing_passes: u32) -> CellularAutomaton {
        CellularAutomaton::new(&CaveConfig {
            simulation_steps: steps,
            smoothing_passes,
            ..CaveConfig::default()
        })
        .expect("valid rules")
    }

    #[test]
    fn zero_steps_is_identity() {
        let mut grid = Grid::from_ascii(&["#.#.#", "..#..", "#.#.#"]).expect("grid");
        let before = grid.clone();
        automaton(0, 0).run(&mut grid);
        assert_eq!(grid, before);
    }

    #[test]
    fn isolated_floor_cell_is_filled() {
        let mut grid = Grid::from_ascii(&["#####", "#####", "##.##", "#####", "#####"])
            .expect("grid");
        automaton(1, 0).step(&mut grid);
        assert!(grid.is_wall(Position::new(2, 2)));
    }

    #[test]
    fn step_reads_previous_generation_only() {
        // A single wall in open floor dies (0 wall neighbours < 4) and no
        // floor cell sees enough walls to be born, even when scanned after it.
        let mut grid = Grid::from_ascii(&[".....", ".....", "..#..", ".....", "....."])
            .expect("grid");
        automaton(1, 0).step(&mut grid);
        assert_eq!(grid.floor_count(), 25);
    }

    #[test]
    fn wall_block_survives_with_enough_neighbours() {
        let mut grid = Grid::from_ascii(&["###..", "###..", "###..", ".....", "....."])
            .expect("grid");
        automaton(1, 0).step(&mut grid);
        assert!(grid.is_wall(Position::new(1, 1)));
        assert!(grid.is_wall(Position::new(1, 0)));
        // Only three in-bounds walls surround the corner.
        assert!(grid.is_floor(Position::new(0, 0)));
    }

    #[test]
    fn smoothing_leaves_edges_untouched() {
        let mut grid = Grid::from_ascii(&[".....", ".###.", ".#.#.", ".###.", "....."])
            .expect("grid");
        automaton(0, 1).smooth(&mut grid);
        assert!(grid.is_wall(Position::new(2, 2)));
        for position in grid.positions().filter(|p| grid.is_edge(*p)) {
            assert!(grid.is_floor(position));
        }
    }

    #[test]
    fn smoothing_clears_isolated_walls() {
        let mut grid = Grid::from_ascii(&["#####", "#...#", "#.#.#", "#...#", "#####"])
            .expect("grid");
        automaton(0, 1).smooth(&mut grid);
        assert!(grid.is_floor(Position::new(2, 2)));
    }
}
