use std::path::PathBuf;

use thiserror::Error;

use crate::types::{Cell, Direction};

/// Construction-time failures. Nothing in the per-tick path returns these.
#[derive(Debug, Error)]
pub enum LevelError {
    #[error("level has no rows")]
    Empty,
    #[error("row {line} has {actual} tiles, expected {expected}")]
    RaggedRow {
        line: usize,
        expected: usize,
        actual: usize,
    },
    #[error("unknown tile {tile:?} at line {line}, column {column}")]
    UnknownTile {
        tile: char,
        line: usize,
        column: usize,
    },
    #[error("level has no passable cells")]
    NoPassableCells,
    #[error("level has no player spawn")]
    MissingPlayerSpawn,
    #[error("level has more than one player spawn (second at {0:?})")]
    DuplicatePlayerSpawn(Cell),
    #[error("level has no monster spawns")]
    MissingMonsterSpawn,
    #[error("spawn at {0:?} is not on a passable cell")]
    SpawnOnWall(Cell),
    #[error("level has more than one pen (second at {0:?})")]
    DuplicatePen(Cell),
    #[error("pen at {pen:?} cannot be left {exit:?}")]
    PenExitBlocked { pen: Cell, exit: Direction },
    #[error("grid dimensions {cols}x{rows} do not match {cells} cells")]
    GridShape {
        cols: usize,
        rows: usize,
        cells: usize,
    },
    #[error("{field} must be at least 1, got {value}")]
    InvalidConfig { field: &'static str, value: i32 },
    #[error("config is not valid JSON: {0}")]
    ConfigJson(#[from] serde_json::Error),
    #[error("spatial index needs at least one wall point")]
    NoWallPoints,
    #[error("failed to read level {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
