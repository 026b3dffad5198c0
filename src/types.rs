use serde::{Deserialize, Serialize};

use crate::error::LevelError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    #[default]
    None,
}

impl Direction {
    pub const CARDINAL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub fn opposite(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
            Self::None => Self::None,
        }
    }

    pub fn is_vertical(self) -> bool {
        matches!(self, Self::Up | Self::Down)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl Difficulty {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "easy" | "1" => Some(Self::Easy),
            "normal" | "2" => Some(Self::Normal),
            "hard" | "3" => Some(Self::Hard),
            _ => None,
        }
    }
}

/// Grid cell. `col` grows toward -z (down the level text), `row` grows toward +x.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub col: i32,
    pub row: i32,
}

impl Cell {
    pub const fn new(col: i32, row: i32) -> Self {
        Self { col, row }
    }

    /// Neighbouring cell one step in `dir`. Up is toward +z, which is a lower `col`.
    pub fn step(self, dir: Direction) -> Self {
        match dir {
            Direction::Up => Self::new(self.col - 1, self.row),
            Direction::Down => Self::new(self.col + 1, self.row),
            Direction::Left => Self::new(self.col, self.row - 1),
            Direction::Right => Self::new(self.col, self.row + 1),
            Direction::None => self,
        }
    }

    pub fn direction_to(self, other: Cell) -> Option<Direction> {
        Direction::CARDINAL
            .into_iter()
            .find(|dir| self.step(*dir) == other)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorldPoint {
    pub x: i32,
    pub z: i32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlConfig {
    #[serde(rename = "stalkerCount")]
    pub stalker_count: usize,
    #[serde(rename = "monsterStepThreshold")]
    pub monster_step_threshold: i32,
    #[serde(rename = "playerStepThreshold")]
    pub player_step_threshold: i32,
}

impl ControlConfig {
    /// Thresholds below one would let an empty accumulator fire.
    pub fn validate(self) -> Result<Self, LevelError> {
        for (field, value) in [
            ("playerStepThreshold", self.player_step_threshold),
            ("monsterStepThreshold", self.monster_step_threshold),
        ] {
            if value < 1 {
                return Err(LevelError::InvalidConfig { field, value });
            }
        }
        Ok(self)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickInput {
    pub direction: Option<Direction>,
    pub difficulty: Option<Difficulty>,
}

impl TickInput {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn steer(direction: Direction) -> Self {
        Self {
            direction: Some(direction),
            difficulty: None,
        }
    }

    pub fn select(difficulty: Difficulty) -> Self {
        Self {
            direction: None,
            difficulty: Some(difficulty),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArbiterState {
    NotStarted,
    Running,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TickOutcome {
    pub captured: bool,
    #[serde(rename = "collectibleCleared")]
    pub collectible_cleared: Option<Cell>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorKind {
    Player,
    Monster,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ActorView {
    pub index: usize,
    pub kind: ActorKind,
    pub cell: Cell,
    pub position: WorldPoint,
    pub facing: Direction,
    #[serde(rename = "arrivedFrom")]
    pub arrived_from: Direction,
    pub decision: Direction,
    pub stalking: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CameraView {
    pub eye: [f32; 3],
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuntimeEvent {
    Started,
    DifficultySelected {
        difficulty: Difficulty,
    },
    CollectibleCleared {
        cell: Cell,
    },
    PlayerCaught {
        #[serde(rename = "monsterIndex")]
        monster_index: usize,
        cell: Cell,
    },
    RoundReset {
        #[serde(rename = "livesRemaining")]
        lives_remaining: u32,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Snapshot {
    pub tick: u64,
    pub state: ArbiterState,
    pub difficulty: Difficulty,
    pub actors: Vec<ActorView>,
    pub camera: CameraView,
    #[serde(rename = "collectiblesRemaining")]
    pub collectibles_remaining: usize,
    pub events: Vec<RuntimeEvent>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GameOverReason {
    RoundCleared,
    OutOfLives,
    TickLimit,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    pub reason: GameOverReason,
    pub ticks: u64,
    pub difficulty: Difficulty,
    #[serde(rename = "livesRemaining")]
    pub lives_remaining: u32,
    pub captures: u32,
    #[serde(rename = "collectiblesCleared")]
    pub collectibles_cleared: usize,
    #[serde(rename = "collectiblesTotal")]
    pub collectibles_total: usize,
}
