use super::*;

impl TickArbiter {
    /// Direction a non-stalking monster pushes this tick, latching it so the
    /// monster sticks with one choice until its next commit.
    pub(super) fn wander_direction(&mut self, idx: usize) -> Option<Direction> {
        let actor = &self.actors[idx];
        if actor.decision != Direction::None {
            return Some(actor.decision);
        }

        let choice = if Some(actor.cell) == self.pen {
            Some(self.pen_exit)
        } else {
            let options = viable_directions(&self.grid, actor.cell, actor.arrived_from);
            match options.len() {
                0 => None,
                1 => Some(options[0]),
                _ => self.rng.pick(&options),
            }
        };

        if let Some(dir) = choice {
            self.actors[idx].decision = dir;
        }
        choice
    }
}
