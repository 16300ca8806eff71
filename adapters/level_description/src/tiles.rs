use cave_forge_core::{Cell, Grid, Position};
use serde::{Deserialize, Serialize};

/// Decorative tile assigned to one grid cell.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapCell {
    /// Sprite key used to draw the cell.
    pub tile: String,
    /// Collision class, `"solid"` or `"air"`.
    #[serde(rename = "type")]
    pub kind: String,
}

/// Picks a sprite for every cell from its vertical floor exposure.
///
/// Walls open to the air above become `{prefix}_top`, walls open below become
/// `{prefix}_bottom`, buried walls become `{prefix}_fill`.
pub(crate) fn auto_tile(grid: &Grid, prefix: &str) -> Vec<Vec<MapCell>> {
    (0..grid.height())
        .map(|y| {
            (0..grid.width())
                .map(|x| tile_for(grid, Position::new(x, y), prefix))
                .collect()
        })
        .collect()
}

fn tile_for(grid: &Grid, position: Position, prefix: &str) -> MapCell {
    if grid.get(position) != Some(Cell::Wall) {
        return MapCell {
            tile: "empty".to_owned(),
            kind: "air".to_owned(),
        };
    }
    let open_above = position.above().is_some_and(|above| grid.is_floor(above));
    let open_below = grid.is_floor(position.below());
    let suffix = match (open_above, open_below) {
        (true, _) => "top",
        (false, true) => "bottom",
        (false, false) => "fill",
    };
    MapCell {
        tile: format!("{prefix}_{suffix}"),
        kind: "solid".to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walls_are_tiled_by_exposure() {
        let grid = Grid::from_ascii(&["###", "#.#", "###", "###"]).expect("grid");
        let matrix = auto_tile(&grid, "cave");

        assert_eq!(matrix.len(), 4);
        assert_eq!(matrix[0][1].tile, "cave_bottom");
        assert_eq!(matrix[0][0].tile, "cave_fill");
        assert_eq!(matrix[1][1].tile, "empty");
        assert_eq!(matrix[1][1].kind, "air");
        assert_eq!(matrix[2][1].tile, "cave_top");
        assert_eq!(matrix[3][1].tile, "cave_fill");
        assert_eq!(matrix[3][1].kind, "solid");
    }
}
