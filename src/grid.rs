use crate::error::LevelError;
use crate::types::{Cell, Direction};

/// Floor/wall occupancy built once at level load. Out-of-bounds cells are walls.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    cols: usize,
    rows: usize,
    passable: Vec<bool>,
}

impl Grid {
    /// `passable` is column-major by line: index `col * rows + row`.
    pub fn new(cols: usize, rows: usize, passable: Vec<bool>) -> Result<Self, LevelError> {
        if cols.checked_mul(rows) != Some(passable.len()) || passable.is_empty() {
            return Err(LevelError::GridShape {
                cols,
                rows,
                cells: passable.len(),
            });
        }
        if !passable.iter().any(|open| *open) {
            return Err(LevelError::NoPassableCells);
        }
        Ok(Self {
            cols,
            rows,
            passable,
        })
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cell_count(&self) -> usize {
        self.passable.len()
    }

    pub fn in_bounds(&self, cell: Cell) -> bool {
        cell.col >= 0
            && cell.row >= 0
            && (cell.col as usize) < self.cols
            && (cell.row as usize) < self.rows
    }

    pub fn index_of(&self, cell: Cell) -> Option<usize> {
        if !self.in_bounds(cell) {
            return None;
        }
        Some(cell.col as usize * self.rows + cell.row as usize)
    }

    pub fn cell_at(&self, index: usize) -> Cell {
        Cell::new((index / self.rows) as i32, (index % self.rows) as i32)
    }

    pub fn passable(&self, cell: Cell) -> bool {
        self.index_of(cell)
            .and_then(|idx| self.passable.get(idx).copied())
            .unwrap_or(false)
    }

    /// Pulls a cell back onto the grid. Callers derive cells from the fixed
    /// transform, so anything off-grid here is a bug.
    pub fn clamp(&self, cell: Cell) -> Cell {
        debug_assert!(self.in_bounds(cell), "cell {cell:?} is off the grid");
        Cell::new(
            cell.col.clamp(0, self.cols as i32 - 1),
            cell.row.clamp(0, self.rows as i32 - 1),
        )
    }

    pub fn passable_neighbors(&self, cell: Cell) -> impl Iterator<Item = (Direction, Cell)> + '_ {
        Direction::CARDINAL
            .into_iter()
            .map(move |dir| (dir, cell.step(dir)))
            .filter(move |(_, next)| self.passable(*next))
    }

    pub fn passable_cells(&self) -> impl Iterator<Item = Cell> + '_ {
        self.passable
            .iter()
            .enumerate()
            .filter(|(_, open)| **open)
            .map(move |(idx, _)| self.cell_at(idx))
    }
}
