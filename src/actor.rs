use crate::types::{ActorKind, ActorView, Cell, Direction};
use crate::world::{GridTransform, Spawn};

/// Sub-cell progress toward the next one-cell move.
///
/// Only one axis is ever non-zero: pushing a direction other than the one
/// being accumulated starts over from zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StepAccumulator {
    pub vertical: i32,
    pub horizontal: i32,
}

impl StepAccumulator {
    pub fn heading(&self) -> Direction {
        if self.vertical > 0 {
            Direction::Up
        } else if self.vertical < 0 {
            Direction::Down
        } else if self.horizontal > 0 {
            Direction::Right
        } else if self.horizontal < 0 {
            Direction::Left
        } else {
            Direction::None
        }
    }

    pub fn push(&mut self, dir: Direction) {
        let heading = self.heading();
        if heading != Direction::None && heading != dir {
            self.clear();
        }
        match dir {
            Direction::Up => self.vertical += 1,
            Direction::Down => self.vertical -= 1,
            Direction::Right => self.horizontal += 1,
            Direction::Left => self.horizontal -= 1,
            Direction::None => {}
        }
    }

    /// Direction whose accumulated count reached `threshold`, vertical first.
    pub fn ready(&self, threshold: i32) -> Option<Direction> {
        if self.vertical >= threshold {
            Some(Direction::Up)
        } else if self.vertical <= -threshold {
            Some(Direction::Down)
        } else if self.horizontal >= threshold {
            Some(Direction::Right)
        } else if self.horizontal <= -threshold {
            Some(Direction::Left)
        } else {
            None
        }
    }

    pub fn clear(&mut self) {
        self.vertical = 0;
        self.horizontal = 0;
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Actor {
    pub index: usize,
    pub kind: ActorKind,
    pub spawn: Spawn,
    pub cell: Cell,
    pub facing: Direction,
    /// Side of the cell the actor entered through; wanderers avoid it.
    pub arrived_from: Direction,
    /// Latched wander direction, held until the next successful commit.
    pub decision: Direction,
    pub steps: StepAccumulator,
    pub stalking: bool,
}

impl Actor {
    pub fn new(index: usize, kind: ActorKind, spawn: Spawn) -> Self {
        Self {
            index,
            kind,
            spawn,
            cell: spawn.cell,
            facing: spawn.facing,
            arrived_from: spawn.facing.opposite(),
            decision: Direction::None,
            steps: StepAccumulator::default(),
            stalking: false,
        }
    }

    pub fn is_player(&self) -> bool {
        self.kind == ActorKind::Player
    }

    pub fn reset_to_spawn(&mut self) {
        *self = Self::new(self.index, self.kind, self.spawn);
    }

    /// Finalises a one-cell move into `dest` travelling `dir`.
    pub fn commit_move(&mut self, dest: Cell, dir: Direction) {
        self.cell = dest;
        self.arrived_from = dir.opposite();
        self.decision = Direction::None;
    }

    pub fn view(&self, transform: &GridTransform) -> ActorView {
        ActorView {
            index: self.index,
            kind: self.kind,
            cell: self.cell,
            position: transform.point_of(self.cell),
            facing: self.facing,
            arrived_from: self.arrived_from,
            decision: self.decision,
            stalking: self.stalking,
        }
    }
}
