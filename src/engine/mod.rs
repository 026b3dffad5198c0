use std::collections::BTreeSet;

use tracing::{debug, info, trace};

use crate::actor::Actor;
#[cfg(test)]
use crate::actor::StepAccumulator;
use crate::camera::camera_for;
use crate::constants::{control_config_for, DEFAULT_PEN_EXIT};
#[cfg(test)]
use crate::constants::PLAYER_STEP_THRESHOLD;
use crate::error::LevelError;
use crate::grid::Grid;
use crate::pathfinding::{shortest_next_hop, PathStep, UNREACHABLE};
use crate::rng::Rng;
use crate::spatial::SpatialIndex;
use crate::types::{
    ActorKind, ArbiterState, Cell, ControlConfig, Difficulty, Direction, RuntimeEvent, Snapshot,
    TickInput, TickOutcome,
};
use crate::world::{GridTransform, Level};
#[cfg(test)]
use crate::types::WorldPoint;

mod commit;
mod stalk;
mod utils;
mod wander;

use self::utils::{viable_directions, wrapped_step};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArbiterOptions {
    pub seed: u32,
    pub difficulty: Difficulty,
    pub tunnel_wrap: bool,
    pub pen_exit: Direction,
    /// Takes precedence over the difficulty presets, including later selections.
    pub config_override: Option<ControlConfig>,
}

impl Default for ArbiterOptions {
    fn default() -> Self {
        Self {
            seed: 0,
            difficulty: Difficulty::default(),
            tunnel_wrap: true,
            pen_exit: DEFAULT_PEN_EXIT,
            config_override: None,
        }
    }
}

/// Per-tick movement and collision arbitration for the player and monsters.
///
/// Actor 0 is always the player. Everything in a tick runs in actor index
/// order, so the same state, input and seed always produce the same result.
#[derive(Clone, Debug)]
pub struct TickArbiter {
    grid: Grid,
    walls: SpatialIndex,
    transform: GridTransform,
    pen: Option<Cell>,
    pen_exit: Direction,
    tunnel_wrap: bool,
    collectibles: BTreeSet<Cell>,
    collectibles_total: usize,
    actors: Vec<Actor>,
    config: ControlConfig,
    config_override: Option<ControlConfig>,
    difficulty: Difficulty,
    state: ArbiterState,
    rng: Rng,
    events: Vec<RuntimeEvent>,
    tick_counter: u64,
}

impl TickArbiter {
    pub fn new(level: Level, options: ArbiterOptions) -> Result<Self, LevelError> {
        let walls = SpatialIndex::build(level.wall_points.iter().copied())?;

        let spawns =
            std::iter::once(level.player_spawn).chain(level.monster_spawns.iter().copied());
        for spawn in spawns.clone() {
            if !level.grid.passable(spawn.cell) {
                return Err(LevelError::SpawnOnWall(spawn.cell));
            }
        }
        if let Some(pen) = level.pen {
            if !level.grid.passable(pen.step(options.pen_exit)) {
                return Err(LevelError::PenExitBlocked {
                    pen,
                    exit: options.pen_exit,
                });
            }
        }

        let actors: Vec<Actor> = spawns
            .enumerate()
            .map(|(index, spawn)| {
                let kind = if index == 0 {
                    ActorKind::Player
                } else {
                    ActorKind::Monster
                };
                Actor::new(index, kind, spawn)
            })
            .collect();

        let config_override = options
            .config_override
            .map(ControlConfig::validate)
            .transpose()?;
        let config = config_override.unwrap_or_else(|| control_config_for(options.difficulty));

        debug!(
            cols = level.grid.cols(),
            rows = level.grid.rows(),
            walls = walls.len(),
            wall_depth = walls.depth(),
            monsters = actors.len() - 1,
            collectibles = level.collectibles.len(),
            "arbiter ready"
        );

        Ok(Self {
            grid: level.grid,
            walls,
            transform: level.transform,
            pen: level.pen,
            pen_exit: options.pen_exit,
            tunnel_wrap: options.tunnel_wrap,
            collectibles_total: level.collectibles.len(),
            collectibles: level.collectibles,
            actors,
            config,
            config_override,
            difficulty: options.difficulty,
            state: ArbiterState::NotStarted,
            rng: Rng::new(options.seed),
            events: Vec::new(),
            tick_counter: 0,
        })
    }

    pub fn state(&self) -> ArbiterState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == ArbiterState::Running
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn config(&self) -> ControlConfig {
        self.config
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_counter
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn transform(&self) -> GridTransform {
        self.transform
    }

    pub fn actors(&self) -> &[Actor] {
        &self.actors
    }

    pub fn player(&self) -> &Actor {
        &self.actors[0]
    }

    pub fn monsters(&self) -> &[Actor] {
        &self.actors[1..]
    }

    pub fn collectibles(&self) -> &BTreeSet<Cell> {
        &self.collectibles
    }

    pub fn collectibles_remaining(&self) -> usize {
        self.collectibles.len()
    }

    pub fn collectibles_total(&self) -> usize {
        self.collectibles_total
    }

    pub fn tick(&mut self, input: TickInput) -> TickOutcome {
        self.tick_counter += 1;
        match self.state {
            ArbiterState::NotStarted => {
                self.tick_not_started(input);
                TickOutcome::default()
            }
            ArbiterState::Running => self.tick_running(input),
        }
    }

    // A starting input wins; any difficulty riding on it is dropped.
    fn tick_not_started(&mut self, input: TickInput) {
        if input.direction.is_some_and(|dir| dir != Direction::None) {
            self.state = ArbiterState::Running;
            self.events.push(RuntimeEvent::Started);
            info!(
                tick = self.tick_counter,
                difficulty = ?self.difficulty,
                "arbiter started"
            );
            return;
        }
        if let Some(difficulty) = input.difficulty {
            self.select_difficulty(difficulty);
        }
    }

    fn tick_running(&mut self, input: TickInput) -> TickOutcome {
        self.advance_player(input.direction);
        let collectible_cleared = self.collect();

        let paths = self.plan_pursuit();
        self.assign_stalkers(&paths);

        for idx in 1..self.actors.len() {
            let intent = if self.actors[idx].stalking {
                self.stalk_direction(idx, &paths[idx])
            } else {
                self.wander_direction(idx)
            };
            if let Some(dir) = intent {
                self.actors[idx].steps.push(dir);
            }
        }
        for idx in 1..self.actors.len() {
            self.try_commit_monster(idx);
        }

        TickOutcome {
            captured: self.detect_capture(),
            collectible_cleared,
        }
    }

    /// Ignored once the arbiter is running.
    pub fn select_difficulty(&mut self, difficulty: Difficulty) {
        if self.state != ArbiterState::NotStarted {
            return;
        }
        self.difficulty = difficulty;
        self.config = self
            .config_override
            .unwrap_or_else(|| control_config_for(difficulty));
        self.events
            .push(RuntimeEvent::DifficultySelected { difficulty });
        info!(?difficulty, config = ?self.config, "difficulty selected");
    }

    /// Puts every actor back on its spawn after a capture. Collectibles stay
    /// cleared and the arbiter keeps running.
    pub fn reset_round(&mut self, lives_remaining: u32) {
        for actor in &mut self.actors {
            actor.reset_to_spawn();
        }
        self.events
            .push(RuntimeEvent::RoundReset { lives_remaining });
        info!(tick = self.tick_counter, lives_remaining, "round reset");
    }

    pub fn build_snapshot(&mut self, include_events: bool) -> Snapshot {
        let events = if include_events {
            std::mem::take(&mut self.events)
        } else {
            Vec::new()
        };
        Snapshot {
            tick: self.tick_counter,
            state: self.state,
            difficulty: self.difficulty,
            actors: self
                .actors
                .iter()
                .map(|actor| actor.view(&self.transform))
                .collect(),
            camera: camera_for(self.transform.point_of(self.actors[0].cell)),
            collectibles_remaining: self.collectibles.len(),
            events,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CROSS: &str = "\
##.##
##.##
P...M
##.##
##.##";

    fn eager(stalker_count: usize) -> ArbiterOptions {
        ArbiterOptions {
            config_override: Some(ControlConfig {
                stalker_count,
                monster_step_threshold: 1,
                player_step_threshold: 1,
            }),
            ..ArbiterOptions::default()
        }
    }

    fn arbiter(text: &str, options: ArbiterOptions) -> TickArbiter {
        TickArbiter::new(Level::parse(text).expect("test level"), options).expect("arbiter")
    }

    fn classic(options: ArbiterOptions) -> TickArbiter {
        TickArbiter::new(Level::classic().expect("bundled level"), options).expect("arbiter")
    }

    fn started(mut arb: TickArbiter) -> TickArbiter {
        arb.tick(TickInput::steer(Direction::Up));
        assert!(arb.is_running());
        arb
    }

    fn random_input(rng: &mut Rng) -> TickInput {
        match rng.pick_index(6) {
            0 => TickInput::idle(),
            n => TickInput::steer(Direction::CARDINAL[(n - 1) % 4]),
        }
    }

    fn assert_invariants(arb: &TickArbiter, outcome: TickOutcome) {
        for actor in arb.actors() {
            assert!(
                arb.grid().passable(actor.cell),
                "tick {} actor {} inside a wall at {:?}",
                arb.tick_count(),
                actor.index,
                actor.cell
            );
        }
        if outcome.captured {
            return;
        }
        let mut seen = BTreeSet::new();
        for actor in arb.actors() {
            assert!(
                seen.insert(actor.cell),
                "tick {} overlap at {:?}",
                arb.tick_count(),
                actor.cell
            );
        }
    }

    #[test]
    fn nothing_moves_until_the_first_direction() {
        let mut arb = arbiter(CROSS, eager(1));
        let before = arb.build_snapshot(false).actors;
        for _ in 0..10 {
            assert_eq!(arb.tick(TickInput::idle()), TickOutcome::default());
        }
        assert_eq!(arb.state(), ArbiterState::NotStarted);

        arb.tick(TickInput::steer(Direction::Right));
        assert!(arb.is_running());
        assert_eq!(arb.build_snapshot(false).actors, before);

        let snapshot = arb.build_snapshot(true);
        assert_eq!(snapshot.events, vec![RuntimeEvent::Started]);
    }

    #[test]
    fn none_direction_does_not_start() {
        let mut arb = arbiter(CROSS, eager(1));
        arb.tick(TickInput::steer(Direction::None));
        assert_eq!(arb.state(), ArbiterState::NotStarted);
    }

    #[test]
    fn difficulty_only_changes_before_start() {
        let mut arb = arbiter(CROSS, ArbiterOptions::default());
        assert_eq!(arb.config(), control_config_for(Difficulty::Normal));

        arb.tick(TickInput::select(Difficulty::Hard));
        assert_eq!(arb.difficulty(), Difficulty::Hard);
        assert_eq!(arb.config().stalker_count, 2);
        assert_eq!(arb.config().monster_step_threshold, 20);
        assert_eq!(arb.config().player_step_threshold, PLAYER_STEP_THRESHOLD);

        let mut arb = started(arb);
        arb.tick(TickInput::select(Difficulty::Easy));
        assert_eq!(arb.difficulty(), Difficulty::Hard);
        let events = arb.build_snapshot(true).events;
        assert_eq!(
            events,
            vec![
                RuntimeEvent::DifficultySelected {
                    difficulty: Difficulty::Hard
                },
                RuntimeEvent::Started,
            ]
        );
    }

    #[test]
    fn difficulty_on_the_starting_input_is_ignored() {
        let mut arb = arbiter(CROSS, ArbiterOptions::default());
        arb.tick(TickInput {
            direction: Some(Direction::Right),
            difficulty: Some(Difficulty::Hard),
        });
        assert!(arb.is_running());
        assert_eq!(arb.difficulty(), Difficulty::Normal);
        assert_eq!(arb.config(), control_config_for(Difficulty::Normal));
        assert_eq!(arb.build_snapshot(true).events, vec![RuntimeEvent::Started]);
    }

    #[test]
    fn zero_thresholds_are_rejected_at_construction() {
        let zero = ControlConfig {
            stalker_count: 0,
            monster_step_threshold: 0,
            player_step_threshold: 0,
        };
        let result = TickArbiter::new(
            Level::parse(CROSS).expect("level"),
            ArbiterOptions {
                config_override: Some(zero),
                ..ArbiterOptions::default()
            },
        );
        assert!(matches!(result, Err(LevelError::InvalidConfig { value: 0, .. })));
    }

    #[test]
    fn idle_actors_stay_put_at_the_lowest_thresholds() {
        let mut arb = started(arbiter(CROSS, eager(0)));
        let spawn = arb.player().cell;
        for _ in 0..3 {
            arb.tick(TickInput::idle());
            assert_eq!(arb.player().cell, spawn);
            assert_eq!(arb.player().steps, StepAccumulator::default());
        }
    }

    #[test]
    fn config_override_survives_difficulty_selection() {
        let mut arb = arbiter(CROSS, eager(1));
        arb.select_difficulty(Difficulty::Hard);
        assert_eq!(arb.difficulty(), Difficulty::Hard);
        assert_eq!(arb.config().monster_step_threshold, 1);
        assert_eq!(arb.config().stalker_count, 1);
    }

    #[test]
    fn construction_rejects_inconsistent_levels() {
        let mut level = Level::parse(CROSS).expect("level");
        level.player_spawn.cell = Cell::new(0, 0);
        assert!(matches!(
            TickArbiter::new(level, ArbiterOptions::default()),
            Err(LevelError::SpawnOnWall(cell)) if cell == Cell::new(0, 0)
        ));

        let pen_level = Level::parse("#####\n#PMH#\n#####").expect("level");
        assert!(matches!(
            TickArbiter::new(pen_level, ArbiterOptions::default()),
            Err(LevelError::PenExitBlocked { exit: Direction::Up, .. })
        ));

        let open = Level::parse("P_M").expect("level");
        assert!(matches!(
            TickArbiter::new(open, ArbiterOptions::default()),
            Err(LevelError::NoWallPoints)
        ));
    }

    #[test]
    fn stalker_walks_the_corridor_and_catches_the_player() {
        let mut arb = started(arbiter(CROSS, eager(1)));
        let start = arb.player().cell;
        for tick in 1..4 {
            let outcome = arb.tick(TickInput::idle());
            assert!(!outcome.captured, "caught early on tick {tick}");
            assert!(arb.monsters()[0].stalking);
            assert_eq!(arb.monsters()[0].cell, Cell::new(2, 4 - tick));
        }
        let outcome = arb.tick(TickInput::idle());
        assert!(outcome.captured);
        assert_eq!(arb.monsters()[0].cell, start);
        assert!(arb
            .build_snapshot(true)
            .events
            .contains(&RuntimeEvent::PlayerCaught {
                monster_index: 1,
                cell: start
            }));
    }

    #[test]
    fn later_monster_follows_into_a_cell_vacated_this_tick() {
        let mut arb = started(arbiter("#######\n#___<<#\n#######\n#P____#\n#######", eager(0)));
        arb.tick(TickInput::idle());
        assert_eq!(arb.monsters()[0].cell, Cell::new(1, 3));
        assert_eq!(arb.monsters()[1].cell, Cell::new(1, 4));
    }

    #[test]
    fn earlier_monster_is_blocked_by_one_not_yet_moved() {
        let mut arb = started(arbiter("#######\n#>>___#\n#######\n#P____#\n#######", eager(0)));
        arb.tick(TickInput::idle());
        let lead = &arb.monsters()[0];
        assert_eq!(lead.cell, Cell::new(1, 1));
        assert_eq!(lead.facing, Direction::Right);
        assert_eq!(lead.arrived_from, Direction::None);
        assert_eq!(arb.monsters()[1].cell, Cell::new(1, 3));
    }

    #[test]
    fn unreachable_monster_falls_back_to_wandering() {
        let mut arb = started(arbiter("#######\n#P___##\n#######\n#__M__#\n#######", eager(1)));
        for _ in 0..20 {
            arb.tick(TickInput::idle());
            assert!(!arb.monsters()[0].stalking);
        }
    }

    #[test]
    fn same_seed_produces_same_progression() {
        let options = ArbiterOptions {
            seed: 4_242,
            difficulty: Difficulty::Hard,
            ..ArbiterOptions::default()
        };
        let mut a = classic(options);
        let mut b = classic(options);
        let mut inputs = Rng::new(7);
        for _ in 0..2_000 {
            let input = random_input(&mut inputs);
            assert_eq!(a.tick(input), b.tick(input));
        }
        assert_eq!(a.build_snapshot(true), b.build_snapshot(true));
    }

    #[test]
    fn cloned_arbiter_replays_the_same_tick() {
        let mut arb = started(classic(ArbiterOptions {
            seed: 99,
            ..ArbiterOptions::default()
        }));
        let mut inputs = Rng::new(3);
        for _ in 0..500 {
            arb.tick(random_input(&mut inputs));
        }
        let mut replay = arb.clone();
        let input = TickInput::steer(Direction::Left);
        assert_eq!(arb.tick(input), replay.tick(input));
        assert_eq!(arb.build_snapshot(true), replay.build_snapshot(true));
    }

    #[test]
    fn actors_never_overlap_or_enter_walls() {
        for (seed, difficulty) in [
            (1, Difficulty::Easy),
            (2, Difficulty::Normal),
            (3, Difficulty::Hard),
        ] {
            let mut arb = classic(ArbiterOptions {
                seed,
                difficulty,
                ..ArbiterOptions::default()
            });
            let mut inputs = Rng::new(seed * 31);
            for _ in 0..4_000 {
                let outcome = arb.tick(random_input(&mut inputs));
                assert_invariants(&arb, outcome);
            }
        }
    }

    #[test]
    fn reset_round_restores_spawns() {
        let mut arb = started(classic(ArbiterOptions::default()));
        let spawned: Vec<_> = arb.actors().iter().map(|a| (a.cell, a.facing)).collect();
        let mut inputs = Rng::new(11);
        for _ in 0..600 {
            arb.tick(random_input(&mut inputs));
        }
        arb.reset_round(2);
        let reset: Vec<_> = arb.actors().iter().map(|a| (a.cell, a.facing)).collect();
        assert_eq!(reset, spawned);
        assert!(arb.is_running());
        assert!(arb
            .actors()
            .iter()
            .all(|a| a.steps == StepAccumulator::default() && a.decision == Direction::None));
        assert_eq!(
            arb.build_snapshot(true).events.last(),
            Some(&RuntimeEvent::RoundReset { lives_remaining: 2 })
        );
    }

    #[test]
    fn build_snapshot_drains_events_when_requested() {
        let mut arb = started(arbiter(CROSS, eager(1)));
        let kept = arb.build_snapshot(false);
        assert!(kept.events.is_empty());
        let drained = arb.build_snapshot(true);
        assert_eq!(drained.events, vec![RuntimeEvent::Started]);
        assert!(arb.build_snapshot(true).events.is_empty());
    }

    #[test]
    fn snapshot_reports_world_positions() {
        let mut arb = classic(ArbiterOptions::default());
        let snapshot = arb.build_snapshot(false);
        assert_eq!(snapshot.actors.len(), 3);
        assert_eq!(snapshot.actors[0].position, WorldPoint { x: -8, z: 0 });
        assert_eq!(snapshot.camera.eye, [8.0, 25.0, -20.0]);
        assert_eq!(snapshot.collectibles_remaining, arb.collectibles_total());
    }
}
