use crate::grid::Grid;
use crate::types::{Cell, Direction};

/// Open directions out of `cell`, minus the side it was entered from whenever
/// something else is open.
pub(crate) fn viable_directions(
    grid: &Grid,
    cell: Cell,
    arrived_from: Direction,
) -> Vec<Direction> {
    let mut open: Vec<Direction> = grid.passable_neighbors(cell).map(|(dir, _)| dir).collect();
    if open.len() >= 2 {
        open.retain(|dir| *dir != arrived_from);
    }
    open
}

/// Destination of a horizontal step that may wrap through the side tunnel.
pub(super) fn wrapped_step(grid: &Grid, cell: Cell, dir: Direction) -> Cell {
    let dest = cell.step(dir);
    if dir.is_vertical() || grid.in_bounds(dest) {
        return dest;
    }
    let last_row = grid.rows() as i32 - 1;
    if dest.row < 0 {
        Cell::new(dest.col, last_row)
    } else if dest.row > last_row {
        Cell::new(dest.col, 0)
    } else {
        dest
    }
}
