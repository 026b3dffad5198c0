use crate::types::{ControlConfig, Difficulty, Direction};

pub const PLAYER_STEP_THRESHOLD: i32 = 5;
pub const EASY_MONSTER_STEP_THRESHOLD: i32 = 30;
pub const NORMAL_MONSTER_STEP_THRESHOLD: i32 = 25;
pub const HARD_MONSTER_STEP_THRESHOLD: i32 = 20;

pub const GRID_OFFSET: i32 = 9;
pub const CELL_SPACING: i32 = 2;

pub const DEFAULT_LIVES: u32 = 3;
pub const DEFAULT_PEN_EXIT: Direction = Direction::Up;

pub const CAMERA_HEIGHT: f32 = 25.0;
pub const CAMERA_TRAIL: f32 = 20.0;
pub const CAMERA_PITCH: f32 = 5.45;
pub const CAMERA_FOV_DEGREES: f32 = 45.0;
pub const CAMERA_ASPECT: f32 = 16.0 / 9.0;
pub const CAMERA_NEAR: f32 = 0.1;
pub const CAMERA_FAR: f32 = 100.0;

/// Fixed frame rate the host gates `tick()` with.
pub const TICK_RATE: u32 = 60;

pub fn get_stalker_count(difficulty: Difficulty) -> usize {
    match difficulty {
        Difficulty::Easy | Difficulty::Normal => 1,
        Difficulty::Hard => 2,
    }
}

pub fn get_monster_step_threshold(difficulty: Difficulty) -> i32 {
    match difficulty {
        Difficulty::Easy => EASY_MONSTER_STEP_THRESHOLD,
        Difficulty::Normal => NORMAL_MONSTER_STEP_THRESHOLD,
        Difficulty::Hard => HARD_MONSTER_STEP_THRESHOLD,
    }
}

pub fn control_config_for(difficulty: Difficulty) -> ControlConfig {
    ControlConfig {
        stalker_count: get_stalker_count(difficulty),
        monster_step_threshold: get_monster_step_threshold(difficulty),
        player_step_threshold: PLAYER_STEP_THRESHOLD,
    }
}
