use cave_forge_core::{CaveConfig, Cell, ConfigError, Grid, LevelRng};

/// Produces the initial noisy grid.
///
/// Cells are visited in row-major order and each interior cell draws once
/// from `rng`, becoming a wall with probability `initial_wall_ratio`. With
/// `solid_border` enabled the outermost ring is forced to wall without
/// consuming a draw.
pub fn seed_grid(config: &CaveConfig, rng: &mut LevelRng) -> Result<Grid, ConfigError> {
    config.validate()?;

    let mut grid = Grid::filled(config.width, config.height, Cell::Floor)?;
    for position in grid.positions() {
        let cell = if config.solid_border && grid.is_edge(position) {
            Cell::Wall
        } else if rng.chance(config.initial_wall_ratio) {
            Cell::Wall
        } else {
            Cell::Floor
        };
        grid.set(position, cell);
    }

    Ok(grid)
}
