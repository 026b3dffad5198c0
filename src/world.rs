use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{CELL_SPACING, GRID_OFFSET};
use crate::error::LevelError;
use crate::grid::Grid;
use crate::types::{Cell, Direction, WorldPoint};

pub const CLASSIC_LEVEL: &str = include_str!("../levels/classic.txt");

/// `col = -z / spacing + offset`, `row = x / spacing + offset`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridTransform {
    pub offset: i32,
    pub spacing: i32,
}

impl Default for GridTransform {
    fn default() -> Self {
        Self {
            offset: GRID_OFFSET,
            spacing: CELL_SPACING,
        }
    }
}

impl GridTransform {
    pub fn cell_of(&self, point: WorldPoint) -> Cell {
        Cell::new(
            -point.z / self.spacing + self.offset,
            point.x / self.spacing + self.offset,
        )
    }

    pub fn point_of(&self, cell: Cell) -> WorldPoint {
        WorldPoint {
            x: (cell.row - self.offset) * self.spacing,
            z: (self.offset - cell.col) * self.spacing,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Spawn {
    pub cell: Cell,
    pub facing: Direction,
}

#[derive(Clone, Debug)]
pub struct Level {
    pub grid: Grid,
    pub transform: GridTransform,
    pub wall_points: Vec<WorldPoint>,
    pub player_spawn: Spawn,
    pub monster_spawns: Vec<Spawn>,
    pub collectibles: BTreeSet<Cell>,
    pub pen: Option<Cell>,
}

enum Tile {
    Wall,
    Floor { collectible: bool },
    Player,
    Monster(Direction),
    Pen,
}

fn parse_tile(ch: char) -> Option<Tile> {
    let tile = match ch {
        '#' => Tile::Wall,
        '.' => Tile::Floor { collectible: true },
        '_' | ' ' => Tile::Floor { collectible: false },
        'P' => Tile::Player,
        'M' | '^' => Tile::Monster(Direction::Up),
        'v' => Tile::Monster(Direction::Down),
        '<' => Tile::Monster(Direction::Left),
        '>' => Tile::Monster(Direction::Right),
        'H' => Tile::Pen,
        _ => return None,
    };
    Some(tile)
}

impl Level {
    pub fn classic() -> Result<Self, LevelError> {
        Self::parse(CLASSIC_LEVEL)
    }

    pub fn load(path: &Path) -> Result<Self, LevelError> {
        let text = fs::read_to_string(path).map_err(|source| LevelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self, LevelError> {
        Self::parse_with(text, GridTransform::default())
    }

    pub fn parse_with(text: &str, transform: GridTransform) -> Result<Self, LevelError> {
        let mut lines: Vec<&str> = text
            .lines()
            .map(|line| line.strip_suffix('\r').unwrap_or(line))
            .collect();
        while lines.last().is_some_and(|line| line.trim().is_empty()) {
            lines.pop();
        }
        let Some(first) = lines.first() else {
            return Err(LevelError::Empty);
        };
        let rows = first.chars().count();
        if rows == 0 {
            return Err(LevelError::Empty);
        }
        let cols = lines.len();

        let mut passable = Vec::with_capacity(cols * rows);
        let mut walls = Vec::new();
        let mut player_spawn = None;
        let mut monster_spawns = Vec::new();
        let mut collectibles = BTreeSet::new();
        let mut pen = None;

        for (col, line) in lines.iter().enumerate() {
            let actual = line.chars().count();
            if actual != rows {
                return Err(LevelError::RaggedRow {
                    line: col + 1,
                    expected: rows,
                    actual,
                });
            }
            for (row, ch) in line.chars().enumerate() {
                let cell = Cell::new(col as i32, row as i32);
                let tile = parse_tile(ch).ok_or(LevelError::UnknownTile {
                    tile: ch,
                    line: col + 1,
                    column: row + 1,
                })?;
                match tile {
                    Tile::Wall => {
                        passable.push(false);
                        walls.push(cell);
                        continue;
                    }
                    Tile::Floor { collectible } => {
                        if collectible {
                            collectibles.insert(cell);
                        }
                    }
                    Tile::Player => {
                        if player_spawn.is_some() {
                            return Err(LevelError::DuplicatePlayerSpawn(cell));
                        }
                        player_spawn = Some(Spawn {
                            cell,
                            facing: Direction::Up,
                        });
                    }
                    Tile::Monster(facing) => monster_spawns.push(Spawn { cell, facing }),
                    Tile::Pen => {
                        if pen.is_some() {
                            return Err(LevelError::DuplicatePen(cell));
                        }
                        pen = Some(cell);
                    }
                }
                passable.push(true);
            }
        }

        let grid = Grid::new(cols, rows, passable)?;
        let player_spawn = player_spawn.ok_or(LevelError::MissingPlayerSpawn)?;
        if monster_spawns.is_empty() {
            return Err(LevelError::MissingMonsterSpawn);
        }

        Ok(Self {
            grid,
            transform,
            wall_points: walls.into_iter().map(|cell| transform.point_of(cell)).collect(),
            player_spawn,
            monster_spawns,
            collectibles,
            pen,
        })
    }
}
