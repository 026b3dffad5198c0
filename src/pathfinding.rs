//! Unit-cost shortest paths over the 4-connected floor grid.
//!
//! Uniform-cost search with an early exit the moment the goal leaves the
//! frontier. Equal-distance entries pop in insertion order, which makes the
//! search behave exactly like breadth-first search and keeps the chosen path
//! stable across runs.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use serde::Serialize;

use crate::grid::Grid;
use crate::types::{Cell, Direction};

/// Distance reported when no path exists.
pub const UNREACHABLE: u32 = u32::MAX;

/// Expansion order for neighbours.
const EXPANSION_ORDER: [Direction; 4] = [
    Direction::Up,
    Direction::Right,
    Direction::Down,
    Direction::Left,
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PathStep {
    /// Second cell on the path, or `from` itself when already there or stuck.
    pub next: Cell,
    pub distance: u32,
}

impl PathStep {
    pub fn unreachable(from: Cell) -> Self {
        Self {
            next: from,
            distance: UNREACHABLE,
        }
    }

    pub fn is_reachable(&self) -> bool {
        self.distance != UNREACHABLE
    }
}

struct SearchResult {
    goal: Cell,
    distance: u32,
    arrived_via: Vec<Option<Direction>>,
}

fn search<F>(from: Cell, grid: &Grid, mut is_goal: F) -> Option<SearchResult>
where
    F: FnMut(Cell) -> bool,
{
    let start = grid.index_of(from)?;
    let mut distances = vec![UNREACHABLE; grid.cell_count()];
    let mut arrived_via: Vec<Option<Direction>> = vec![None; grid.cell_count()];
    let mut frontier = BinaryHeap::new();
    let mut sequence = 0u64;

    distances[start] = 0;
    frontier.push(Reverse((0u32, sequence, start)));

    while let Some(Reverse((distance, _, idx))) = frontier.pop() {
        if distance > distances[idx] {
            continue;
        }
        let cell = grid.cell_at(idx);
        if is_goal(cell) {
            return Some(SearchResult {
                goal: cell,
                distance,
                arrived_via,
            });
        }
        for dir in EXPANSION_ORDER {
            let next = cell.step(dir);
            if !grid.passable(next) {
                continue;
            }
            let Some(next_idx) = grid.index_of(next) else {
                continue;
            };
            let next_distance = distance + 1;
            if next_distance < distances[next_idx] {
                distances[next_idx] = next_distance;
                arrived_via[next_idx] = Some(dir);
                sequence += 1;
                frontier.push(Reverse((next_distance, sequence, next_idx)));
            }
        }
    }
    None
}

/// Walks the back-pointers from `goal` and stops one hop short of the source.
fn first_hop(grid: &Grid, goal: Cell, arrived_via: &[Option<Direction>]) -> Cell {
    let via = |cell: Cell| grid.index_of(cell).and_then(|idx| arrived_via[idx]);
    let mut cursor = goal;
    while let Some(dir) = via(cursor) {
        let previous = cursor.step(dir.opposite());
        if via(previous).is_none() {
            break;
        }
        cursor = previous;
    }
    cursor
}

pub fn shortest_next_hop(from: Cell, to: Cell, grid: &Grid) -> PathStep {
    if !grid.in_bounds(to) {
        return PathStep::unreachable(from);
    }
    match search(from, grid, |cell| cell == to) {
        Some(found) => PathStep {
            next: first_hop(grid, found.goal, &found.arrived_via),
            distance: found.distance,
        },
        None => PathStep::unreachable(from),
    }
}

/// Closest cell satisfying `is_target`, together with the first step toward it.
pub fn nearest_where<F>(from: Cell, grid: &Grid, is_target: F) -> Option<(Cell, PathStep)>
where
    F: FnMut(Cell) -> bool,
{
    let found = search(from, grid, is_target)?;
    let step = PathStep {
        next: first_hop(grid, found.goal, &found.arrived_via),
        distance: found.distance,
    };
    Some((found.goal, step))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::Level;

    fn grid_from(text: &str) -> Grid {
        Level::parse(text).expect("test level").grid
    }

    /// Plain BFS used as the reference distance.
    fn bfs_distance(grid: &Grid, from: Cell, to: Cell) -> Option<u32> {
        let mut seen = vec![false; grid.cell_count()];
        let mut queue = std::collections::VecDeque::new();
        seen[grid.index_of(from)?] = true;
        queue.push_back((from, 0u32));
        while let Some((cell, dist)) = queue.pop_front() {
            if cell == to {
                return Some(dist);
            }
            for (_, next) in grid.passable_neighbors(cell) {
                let idx = grid.index_of(next)?;
                if !seen[idx] {
                    seen[idx] = true;
                    queue.push_back((next, dist + 1));
                }
            }
        }
        None
    }

    const CROSS: &str = "\
##.##
##.##
P...M
##.##
##.##";

    #[test]
    fn corridor_distance_matches_hand_count() {
        let grid = grid_from(CROSS);
        let step = shortest_next_hop(Cell::new(2, 4), Cell::new(2, 0), &grid);
        assert_eq!(step.distance, 4);
        assert_eq!(step.next, Cell::new(2, 3));

        let around = shortest_next_hop(Cell::new(0, 2), Cell::new(2, 0), &grid);
        assert_eq!(around.distance, 4);
        assert_eq!(around.next, Cell::new(1, 2));
    }

    #[test]
    fn adjacent_target_is_the_next_hop() {
        let grid = grid_from(CROSS);
        let step = shortest_next_hop(Cell::new(2, 1), Cell::new(2, 0), &grid);
        assert_eq!(step, PathStep { next: Cell::new(2, 0), distance: 1 });
    }

    #[test]
    fn same_cell_is_distance_zero() {
        let grid = grid_from(CROSS);
        let step = shortest_next_hop(Cell::new(2, 2), Cell::new(2, 2), &grid);
        assert_eq!(step, PathStep { next: Cell::new(2, 2), distance: 0 });
    }

    #[test]
    fn walled_off_target_is_unreachable() {
        let grid = grid_from("P.#.M\n###.#");
        let from = Cell::new(0, 4);
        let step = shortest_next_hop(from, Cell::new(0, 0), &grid);
        assert!(!step.is_reachable());
        assert_eq!(step.next, from);
    }

    #[test]
    fn off_grid_endpoints_degrade_to_unreachable() {
        let grid = grid_from(CROSS);
        let from = Cell::new(2, 2);
        assert_eq!(
            shortest_next_hop(from, Cell::new(-1, 2), &grid),
            PathStep::unreachable(from)
        );
        let outside = Cell::new(9, 9);
        assert_eq!(
            shortest_next_hop(outside, Cell::new(2, 2), &grid),
            PathStep::unreachable(outside)
        );
    }

    #[test]
    fn next_hop_lies_on_a_shortest_path_in_open_rooms() {
        let grid = grid_from(
            "\
#########
#P......#
#.##.##.#
#.......#
#.#...#.#
#......M#
#########",
        );
        let cells: Vec<Cell> = grid.passable_cells().collect();
        for &from in &cells {
            for &to in &cells {
                let step = shortest_next_hop(from, to, &grid);
                let expected = bfs_distance(&grid, from, to).expect("connected");
                assert_eq!(step.distance, expected, "{from:?} -> {to:?}");
                if from == to {
                    assert_eq!(step.next, from);
                    continue;
                }
                assert!(from.direction_to(step.next).is_some(), "not adjacent");
                let rest = bfs_distance(&grid, step.next, to).expect("connected");
                assert_eq!(rest + 1, expected, "{from:?} -> {to:?} via {:?}", step.next);
            }
        }
    }

    #[test]
    fn nearest_where_finds_closest_match() {
        let grid = grid_from(CROSS);
        let (target, step) =
            nearest_where(Cell::new(2, 2), &grid, |cell| cell.row == 4).expect("reachable");
        assert_eq!(target, Cell::new(2, 4));
        assert_eq!(step, PathStep { next: Cell::new(2, 3), distance: 2 });
        assert!(nearest_where(Cell::new(2, 2), &grid, |cell| cell.col == 7).is_none());
    }
}
