//! Interchangeable grid search algorithms.

use std::{
    cmp::Reverse,
    collections::{BinaryHeap, VecDeque},
};

use cave_forge_core::{Grid, Path, PathfindingMethod, Position};

use crate::{PathFinder, SearchError};

const UNVISITED: usize = usize::MAX;

/// Best-first search ordered by `cost + manhattan distance to goal`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AStar {
    max_expansions: u32,
}

/// Breadth-first search; returns a shortest path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BreadthFirst {
    max_expansions: u32,
}

/// Depth-first search; returns some path, not necessarily a short one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DepthFirst {
    max_expansions: u32,
}

/// Dijkstra-style search ordered by accumulated cost.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UniformCost {
    max_expansions: u32,
}

macro_rules! budgeted {
    ($($finder:ident),*) => {
        $(
            impl $finder {
                /// Creates the finder with a cap on node expansions.
                #[must_use]
                pub const fn new(max_expansions: u32) -> Self {
                    Self { max_expansions }
                }
            }
        )*
    };
}

budgeted!(AStar, BreadthFirst, DepthFirst, UniformCost);

/// Boxed finder implementing `method`.
#[must_use]
pub fn finder_for(method: PathfindingMethod, max_expansions: u32) -> Box<dyn PathFinder> {
    match method {
        PathfindingMethod::AStar => Box::new(AStar::new(max_expansions)),
        PathfindingMethod::BreadthFirst => Box::new(BreadthFirst::new(max_expansions)),
        PathfindingMethod::DepthFirst => Box::new(DepthFirst::new(max_expansions)),
        PathfindingMethod::UniformCost => Box::new(UniformCost::new(max_expansions)),
    }
}

impl PathFinder for AStar {
    fn method(&self) -> PathfindingMethod {
        PathfindingMethod::AStar
    }

    fn find_path(
        &self,
        grid: &Grid,
        start: Position,
        goal: Position,
    ) -> Result<Option<Path>, SearchError> {
        best_first(grid, start, goal, self.max_expansions, |position| {
            position.manhattan_distance(goal)
        })
    }
}

impl PathFinder for UniformCost {
    fn method(&self) -> PathfindingMethod {
        PathfindingMethod::UniformCost
    }

    fn find_path(
        &self,
        grid: &Grid,
        start: Position,
        goal: Position,
    ) -> Result<Option<Path>, SearchError> {
        best_first(grid, start, goal, self.max_expansions, |_| 0)
    }
}

impl PathFinder for BreadthFirst {
    fn method(&self) -> PathfindingMethod {
        PathfindingMethod::BreadthFirst
    }

    fn find_path(
        &self,
        grid: &Grid,
        start: Position,
        goal: Position,
    ) -> Result<Option<Path>, SearchError> {
        let (start_index, goal_index) = endpoints(grid, start, goal)?;
        let mut parents = vec![UNVISITED; grid.cells().len()];
        let mut queue = VecDeque::new();
        parents[start_index] = start_index;
        queue.push_back(start);

        let mut expansions = 0;
        while let Some(current) = queue.pop_front() {
            if current == goal {
                return Ok(Some(reconstruct(grid, &parents, goal_index)));
            }
            expansions = spend(expansions, self.max_expansions)?;
            let Some(current_index) = grid.index(current) else {
                continue;
            };
            for neighbor in grid.floor_neighbors4(current) {
                let Some(index) = grid.index(neighbor) else {
                    continue;
                };
                if parents[index] != UNVISITED {
                    continue;
                }
                parents[index] = current_index;
                queue.push_back(neighbor);
            }
        }

        Ok(None)
    }
}

impl PathFinder for DepthFirst {
    fn method(&self) -> PathfindingMethod {
        PathfindingMethod::DepthFirst
    }

    fn find_path(
        &self,
        grid: &Grid,
        start: Position,
        goal: Position,
    ) -> Result<Option<Path>, SearchError> {
        let (start_index, goal_index) = endpoints(grid, start, goal)?;
        let mut parents = vec![UNVISITED; grid.cells().len()];
        let mut stack = vec![start];
        parents[start_index] = start_index;

        let mut expansions = 0;
        while let Some(current) = stack.pop() {
            if current == goal {
                return Ok(Some(reconstruct(grid, &parents, goal_index)));
            }
            expansions = spend(expansions, self.max_expansions)?;
            let Some(current_index) = grid.index(current) else {
                continue;
            };
            let neighbors: Vec<Position> = grid.floor_neighbors4(current).collect();
            // Reversed so the north neighbour is explored first.
            for neighbor in neighbors.into_iter().rev() {
                let Some(index) = grid.index(neighbor) else {
                    continue;
                };
                if parents[index] != UNVISITED {
                    continue;
                }
                parents[index] = current_index;
                stack.push(neighbor);
            }
        }

        Ok(None)
    }
}

fn best_first<H>(
    grid: &Grid,
    start: Position,
    goal: Position,
    max_expansions: u32,
    heuristic: H,
) -> Result<Option<Path>, SearchError>
where
    H: Fn(Position) -> u32,
{
    let (start_index, goal_index) = endpoints(grid, start, goal)?;
    let cell_count = grid.cells().len();
    let mut parents = vec![UNVISITED; cell_count];
    let mut costs = vec![u32::MAX; cell_count];
    let mut closed = vec![false; cell_count];
    let mut open = BinaryHeap::new();

    parents[start_index] = start_index;
    costs[start_index] = 0;
    open.push(Reverse((heuristic(start), 0_u32, start_index)));

    let mut expansions = 0;
    while let Some(Reverse((_, cost, index))) = open.pop() {
        if closed[index] {
            continue;
        }
        if index == goal_index {
            return Ok(Some(reconstruct(grid, &parents, goal_index)));
        }
        closed[index] = true;
        expansions = spend(expansions, max_expansions)?;

        let Some(current) = grid.position_of(index) else {
            continue;
        };
        let next_cost = cost.saturating_add(1);
        for neighbor in grid.floor_neighbors4(current) {
            let Some(neighbor_index) = grid.index(neighbor) else {
                continue;
            };
            if closed[neighbor_index] || costs[neighbor_index] <= next_cost {
                continue;
            }
            costs[neighbor_index] = next_cost;
            parents[neighbor_index] = index;
            open.push(Reverse((
                next_cost.saturating_add(heuristic(neighbor)),
                next_cost,
                neighbor_index,
            )));
        }
    }

    Ok(None)
}

fn endpoints(grid: &Grid, start: Position, goal: Position) -> Result<(usize, usize), SearchError> {
    let index_of = |position: Position| {
        grid.index(position)
            .filter(|_| grid.is_floor(position))
            .ok_or(SearchError::InvalidEndpoint {
                x: position.x(),
                y: position.y(),
            })
    };
    Ok((index_of(start)?, index_of(goal)?))
}

fn spend(expansions: u32, limit: u32) -> Result<u32, SearchError> {
    if expansions >= limit {
        return Err(SearchError::BudgetExhausted { expansions });
    }
    Ok(expansions + 1)
}

fn reconstruct(grid: &Grid, parents: &[usize], goal_index: usize) -> Path {
    let mut positions = Vec::new();
    let mut index = goal_index;
    loop {
        let Some(position) = grid.position_of(index) else {
            break;
        };
        positions.push(position);
        let parent = parents[index];
        if parent == index || parent == UNVISITED {
            break;
        }
        index = parent;
    }
    positions.reverse();
    Path::new(positions)
}
