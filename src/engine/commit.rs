use super::*;

impl TickArbiter {
    /// Wall check for a destination: a spatial index hit, or any cell the grid
    /// does not consider floor (which covers off-grid destinations).
    pub(super) fn blocked_by_wall(&self, dest: Cell) -> bool {
        self.walls.query(self.transform.point_of(dest)) || !self.grid.passable(dest)
    }

    /// First monster other than `idx` standing on `dest`. Sees positions
    /// already committed earlier this tick.
    fn occupant_of(&self, idx: usize, dest: Cell) -> Option<usize> {
        self.actors
            .iter()
            .skip(1)
            .find(|other| other.index != idx && other.cell == dest)
            .map(|other| other.index)
    }

    pub(super) fn advance_player(&mut self, direction: Option<Direction>) {
        if let Some(dir) = direction.filter(|dir| *dir != Direction::None) {
            self.actors[0].steps.push(dir);
        }
        let Some(dir) = self.actors[0]
            .steps
            .ready(self.config.player_step_threshold)
        else {
            return;
        };

        let player = &mut self.actors[0];
        player.facing = dir;
        player.steps.clear();
        let from = player.cell;
        let dest = if self.tunnel_wrap {
            wrapped_step(&self.grid, from, dir)
        } else {
            from.step(dir)
        };

        if self.blocked_by_wall(dest) {
            debug!(tick = self.tick_counter, ?from, ?dir, "player blocked by wall");
            return;
        }
        self.actors[0].commit_move(dest, dir);
    }

    /// Clears the collectible under the player, if any.
    pub(super) fn collect(&mut self) -> Option<Cell> {
        let cell = self.actors[0].cell;
        if !self.collectibles.remove(&cell) {
            return None;
        }
        debug!(
            tick = self.tick_counter,
            ?cell,
            remaining = self.collectibles.len(),
            "collectible cleared"
        );
        self.events.push(RuntimeEvent::CollectibleCleared { cell });
        Some(cell)
    }

    /// Commits a monster whose accumulator is full. Returns whether it moved.
    pub(super) fn try_commit_monster(&mut self, idx: usize) -> bool {
        let Some(dir) = self.actors[idx]
            .steps
            .ready(self.config.monster_step_threshold)
        else {
            return false;
        };

        let monster = &mut self.actors[idx];
        monster.facing = dir;
        monster.steps.clear();
        let from = monster.cell;
        let dest = from.step(dir);

        if self.blocked_by_wall(dest) {
            debug!(tick = self.tick_counter, monster = idx, ?from, ?dir, "monster blocked by wall");
            return false;
        }
        if let Some(occupant) = self.occupant_of(idx, dest) {
            let monster = &mut self.actors[idx];
            monster.decision = Direction::None;
            monster.arrived_from = Direction::None;
            debug!(
                tick = self.tick_counter,
                monster = idx,
                occupant,
                ?dest,
                "monster blocked by occupant"
            );
            return false;
        }

        self.actors[idx].commit_move(dest, dir);
        true
    }

    /// Reports the first monster sharing the player's cell.
    pub(super) fn detect_capture(&mut self) -> bool {
        let cell = self.actors[0].cell;
        let Some(monster_index) = self
            .actors
            .iter()
            .skip(1)
            .find(|monster| monster.cell == cell)
            .map(|monster| monster.index)
        else {
            return false;
        };
        debug!(tick = self.tick_counter, monster = monster_index, ?cell, "player caught");
        self.events.push(RuntimeEvent::PlayerCaught {
            monster_index,
            cell,
        });
        true
    }
}
