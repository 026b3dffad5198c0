use super::*;

/// Picks the `count` monsters closest to the player by path length.
///
/// `distances[0]` belongs to the player and is never chosen. Unreachable
/// monsters are skipped; equal distances go to the lower index.
pub(crate) fn select_stalkers(distances: &[u32], count: usize) -> Vec<bool> {
    let mut ranked: Vec<usize> = (1..distances.len())
        .filter(|idx| distances[*idx] != UNREACHABLE)
        .collect();
    ranked.sort_by_key(|idx| (distances[*idx], *idx));

    let mut stalking = vec![false; distances.len()];
    for idx in ranked.into_iter().take(count) {
        stalking[idx] = true;
    }
    stalking
}

impl TickArbiter {
    /// Fresh shortest path from every monster to the player. Index 0 is a
    /// placeholder for the player itself.
    pub(super) fn plan_pursuit(&self) -> Vec<PathStep> {
        let target = self.grid.clamp(self.actors[0].cell);
        self.actors
            .iter()
            .map(|actor| {
                if actor.is_player() {
                    PathStep::unreachable(actor.cell)
                } else {
                    shortest_next_hop(actor.cell, target, &self.grid)
                }
            })
            .collect()
    }

    pub(super) fn assign_stalkers(&mut self, paths: &[PathStep]) {
        let distances: Vec<u32> = paths.iter().map(|step| step.distance).collect();
        let stalking = select_stalkers(&distances, self.config.stalker_count);
        for (actor, stalks) in self.actors.iter_mut().zip(stalking) {
            actor.stalking = stalks;
        }
        let stalkers: Vec<usize> = self
            .actors
            .iter()
            .filter(|actor| actor.stalking)
            .map(|actor| actor.index)
            .collect();
        trace!(tick = self.tick_counter, ?distances, ?stalkers, "pursuit planned");
    }

    pub(super) fn stalk_direction(&self, idx: usize, step: &PathStep) -> Option<Direction> {
        self.actors[idx].cell.direction_to(step.next)
    }
}
