use cave_forge_core::{Cell, Grid, PathfindingMethod, Position, SolvabilityConfig};
use cave_forge_system_solvability::{finder_for, validate_path, SolvabilityTester};
use proptest::prelude::*;

const WIDTH: u32 = 12;
const HEIGHT: u32 = 9;

fn grid_from(walls: &[bool]) -> Grid {
    let cells = walls
        .iter()
        .map(|wall| if *wall { Cell::Wall } else { Cell::Floor })
        .collect();
    let mut grid = Grid::from_cells(WIDTH, HEIGHT, cells).expect("grid");
    grid.set(Position::new(0, 0), Cell::Floor);
    grid.set(Position::new(WIDTH - 1, HEIGHT - 1), Cell::Floor);
    grid
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn every_method_agrees_on_solvability(
        walls in prop::collection::vec(prop::bool::weighted(0.3), (WIDTH * HEIGHT) as usize),
    ) {
        let grid = grid_from(&walls);
        let start = Position::new(0, 0);
        let goal = Position::new(WIDTH - 1, HEIGHT - 1);

        let results: Vec<_> = [
            PathfindingMethod::AStar,
            PathfindingMethod::BreadthFirst,
            PathfindingMethod::DepthFirst,
            PathfindingMethod::UniformCost,
        ]
        .into_iter()
        .map(|method| finder_for(method, 100_000).find_path(&grid, start, goal).expect("search"))
        .collect();

        let solvable = results[0].is_some();
        for path in &results {
            prop_assert_eq!(path.is_some(), solvable);
            if let Some(path) = path {
                prop_assert_eq!(validate_path(&grid, path, start, goal), Ok(()));
            }
        }
        if solvable {
            let optimal: Vec<usize> = [&results[0], &results[1], &results[3]]
                .into_iter()
                .flatten()
                .map(|path| path.len())
                .collect();
            prop_assert!(optimal.windows(2).all(|pair| pair[0] == pair[1]));
        }

        let report = SolvabilityTester::new(SolvabilityConfig::default())
            .expect("tester")
            .validate_solvability(&grid, start, goal);
        prop_assert_eq!(report.is_valid(), solvable);
    }
}

#[test]
fn unsolvable_grid_exhausts_the_chain() {
    let grid = Grid::from_ascii(&["#######", "#..#..#", "#######"]).expect("grid");
    let report = SolvabilityTester::new(SolvabilityConfig::default())
        .expect("tester")
        .validate_solvability(&grid, Position::new(1, 1), Position::new(5, 1));

    assert!(!report.is_valid());
    assert_eq!(report.fallbacks_used(), 3);
    assert!(report.metrics().is_none());
    assert_eq!(report.issues().len(), 4);
}
