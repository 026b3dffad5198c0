use chrono::{DateTime, SecondsFormat, Utc};
use clap::Parser;
use pacman3d_control::constants::{DEFAULT_LIVES, TICK_RATE};
use pacman3d_control::engine::{ArbiterOptions, TickArbiter};
use pacman3d_control::error::LevelError;
use pacman3d_control::pathfinding::nearest_where;
use pacman3d_control::rng::Rng;
use pacman3d_control::session::{GameSession, SessionOptions};
use pacman3d_control::types::{
    ControlConfig, Difficulty, Direction, GameOverReason, RuntimeEvent, Snapshot, TickInput,
};
use pacman3d_control::world::Level;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_MINUTES: u64 = 3;
/// Chance per tick that the autopilot jiggles the stick in a random direction.
const AUTOPILOT_NOISE: f32 = 0.08;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// ASCII level file; the bundled classic level when omitted.
    #[arg(long)]
    level: Option<PathBuf>,
    #[arg(long)]
    difficulty: Option<String>,
    #[arg(long)]
    seed: Option<u32>,
    #[arg(long)]
    ticks: Option<u64>,
    #[arg(long)]
    lives: Option<u32>,
    /// JSON `ControlConfig` that overrides the difficulty presets.
    #[arg(long)]
    config: Option<String>,
    #[arg(long)]
    single: bool,
    #[arg(long)]
    match_id: Option<String>,
    #[arg(long)]
    summary_out: Option<PathBuf>,
}

#[derive(Clone, Debug, Serialize)]
struct Scenario {
    name: String,
    difficulty: Difficulty,
    seed: u32,
    ticks: u64,
    lives: u32,
}

#[derive(Clone, Debug, Serialize)]
struct ScenarioResultLine {
    scenario: String,
    seed: u32,
    difficulty: Difficulty,
    reason: GameOverReason,
    ticks: u64,
    captures: u32,
    #[serde(rename = "livesRemaining")]
    lives_remaining: u32,
    #[serde(rename = "collectiblesCleared")]
    collectibles_cleared: usize,
    #[serde(rename = "collectiblesTotal")]
    collectibles_total: usize,
    #[serde(rename = "stalkerTicks")]
    stalker_ticks: usize,
    anomalies: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
struct AnomalyRecord {
    tick: u64,
    message: String,
}

#[derive(Clone, Debug)]
struct ScenarioRunResult {
    result: ScenarioResultLine,
    anomaly_records: Vec<AnomalyRecord>,
}

#[derive(Clone, Debug, Serialize)]
struct RunSummary {
    #[serde(rename = "matchId")]
    match_id: String,
    #[serde(rename = "startedAt")]
    started_at: String,
    #[serde(rename = "finishedAt")]
    finished_at: String,
    #[serde(rename = "scenarioCount")]
    scenario_count: usize,
    #[serde(rename = "anomalyCount")]
    anomaly_count: usize,
    #[serde(rename = "averageTicks")]
    average_ticks: u64,
    #[serde(rename = "reasonCounts")]
    reason_counts: BTreeMap<String, usize>,
    scenarios: Vec<ScenarioResultLine>,
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    let run_started_at = Utc::now();

    let level = match load_level(cli.level.as_deref()) {
        Ok(level) => level,
        Err(error) => {
            error!(path = ?cli.level, %error, "level load failed");
            return ExitCode::from(2);
        }
    };
    let config_override = match cli.config.as_deref().map(parse_config).transpose() {
        Ok(config) => config,
        Err(error) => {
            error!(%error, "invalid --config");
            return ExitCode::from(2);
        }
    };

    let scenarios = resolve_scenarios(&cli);
    let seed_hint = scenarios.first().map(|scenario| scenario.seed).unwrap_or(0);
    let match_id = cli
        .match_id
        .clone()
        .unwrap_or_else(|| default_match_id(seed_hint, run_started_at.timestamp_millis()));

    let mut has_anomaly = false;
    let mut scenario_results = Vec::new();
    let mut reason_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut total_ticks = 0u64;
    let mut total_anomalies = 0usize;

    for scenario in scenarios {
        info!(
            match_id = %match_id,
            scenario = %scenario.name,
            seed = scenario.seed,
            difficulty = ?scenario.difficulty,
            ticks = scenario.ticks,
            lives = scenario.lives,
            "scenario started"
        );
        let scenario_run = match run_scenario(&level, &scenario, config_override) {
            Ok(run) => run,
            Err(error) => {
                error!(
                    match_id = %match_id,
                    scenario = %scenario.name,
                    %error,
                    "scenario setup failed"
                );
                return ExitCode::from(2);
            }
        };

        for anomaly in &scenario_run.anomaly_records {
            warn!(
                match_id = %match_id,
                scenario = %scenario.name,
                seed = scenario.seed,
                tick = anomaly.tick,
                message = %anomaly.message,
                "anomaly detected"
            );
        }

        if !scenario_run.result.anomalies.is_empty() {
            has_anomaly = true;
        }
        total_anomalies += scenario_run.anomaly_records.len();
        total_ticks += scenario_run.result.ticks;
        *reason_counts
            .entry(game_over_reason_key(scenario_run.result.reason))
            .or_insert(0) += 1;

        info!(
            match_id = %match_id,
            scenario = %scenario.name,
            seed = scenario.seed,
            reason = ?scenario_run.result.reason,
            ticks = scenario_run.result.ticks,
            captures = scenario_run.result.captures,
            cleared = scenario_run.result.collectibles_cleared,
            anomalies = scenario_run.anomaly_records.len(),
            "scenario finished"
        );

        match serde_json::to_string(&scenario_run.result) {
            Ok(line) => println!("{line}"),
            Err(error) => error!(%error, "scenario result did not serialize"),
        }
        scenario_results.push(scenario_run.result);
    }

    let summary = build_run_summary(
        match_id.clone(),
        run_started_at,
        Utc::now(),
        scenario_results,
        reason_counts,
        total_anomalies,
        total_ticks,
    );

    if let Some(path) = cli.summary_out.as_ref() {
        if let Err(error) = write_summary(path, &summary) {
            error!(match_id = %match_id, path = %path.display(), %error, "summary write failed");
            return ExitCode::from(2);
        }
    }

    info!(
        match_id = %match_id,
        scenarios = summary.scenario_count,
        anomalies = summary.anomaly_count,
        average_ticks = summary.average_ticks,
        reasons = ?summary.reason_counts,
        summary_out = ?cli.summary_out,
        "run finished"
    );

    if has_anomaly {
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("pacman3d_control=info,simulate=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn load_level(path: Option<&Path>) -> Result<Level, LevelError> {
    match path {
        Some(path) => Level::load(path),
        None => Level::classic(),
    }
}

fn parse_config(text: &str) -> Result<ControlConfig, LevelError> {
    let config: ControlConfig = serde_json::from_str(text)?;
    config.validate()
}

/// Drives the player toward the nearest collectible with occasional noise.
struct Autopilot {
    rng: Rng,
}

impl Autopilot {
    fn new(seed: u32) -> Self {
        Self {
            rng: Rng::new(seed ^ 0x9e37_79b9),
        }
    }

    fn steer(&mut self, arbiter: &TickArbiter) -> TickInput {
        if !arbiter.is_running() {
            return TickInput::steer(Direction::Up);
        }
        if self.rng.next_f32() < AUTOPILOT_NOISE {
            return self
                .rng
                .pick(&Direction::CARDINAL)
                .map(TickInput::steer)
                .unwrap_or_default();
        }
        let from = arbiter.player().cell;
        let collectibles = arbiter.collectibles();
        nearest_where(from, arbiter.grid(), |cell| collectibles.contains(&cell))
            .and_then(|(_, step)| from.direction_to(step.next))
            .map(TickInput::steer)
            .unwrap_or_default()
    }
}

fn run_scenario(
    level: &Level,
    scenario: &Scenario,
    config_override: Option<ControlConfig>,
) -> Result<ScenarioRunResult, LevelError> {
    let mut session = GameSession::new(
        level.clone(),
        SessionOptions {
            lives: scenario.lives,
            arbiter: ArbiterOptions {
                seed: scenario.seed,
                difficulty: scenario.difficulty,
                config_override,
                ..ArbiterOptions::default()
            },
        },
    )?;
    let mut autopilot = Autopilot::new(scenario.seed);

    let mut log = AnomalyLog::default();
    let mut stalker_ticks = 0usize;
    let mut last_remaining = session.arbiter().collectibles_remaining();

    for _ in 0..scenario.ticks {
        if session.is_ended() {
            break;
        }
        let input = autopilot.steer(session.arbiter());
        let outcome = session.step(input);
        let snapshot = session.build_snapshot(true);

        let mut messages =
            collect_snapshot_anomalies(&snapshot, session.arbiter(), outcome.captured);
        if snapshot.collectibles_remaining > last_remaining {
            messages.push(format!(
                "collectibles grew: {last_remaining} -> {}",
                snapshot.collectibles_remaining
            ));
        }
        last_remaining = snapshot.collectibles_remaining;
        for message in messages {
            log.push(snapshot.tick, message);
        }

        stalker_ticks += snapshot.actors.iter().filter(|actor| actor.stalking).count();
        for event in &snapshot.events {
            if let RuntimeEvent::PlayerCaught { monster_index, .. } = event {
                debug!(
                    tick = snapshot.tick,
                    monster_index,
                    lives = session.lives(),
                    "player caught"
                );
            }
        }
    }

    let summary = session.build_summary();
    Ok(ScenarioRunResult {
        result: ScenarioResultLine {
            scenario: scenario.name.clone(),
            seed: scenario.seed,
            difficulty: summary.difficulty,
            reason: summary.reason,
            ticks: summary.ticks,
            captures: summary.captures,
            lives_remaining: summary.lives_remaining,
            collectibles_cleared: summary.collectibles_cleared,
            collectibles_total: summary.collectibles_total,
            stalker_ticks,
            anomalies: log.distinct,
        },
        anomaly_records: log.records,
    })
}

/// Invariant checks on a post-tick snapshot.
fn collect_snapshot_anomalies(
    snapshot: &Snapshot,
    arbiter: &TickArbiter,
    captured: bool,
) -> Vec<String> {
    let grid = arbiter.grid();
    let transform = arbiter.transform();
    let mut anomalies = Vec::new();
    for actor in &snapshot.actors {
        if !grid.passable(actor.cell) {
            anomalies.push(format!(
                "actor {} on impassable cell ({}, {})",
                actor.index, actor.cell.col, actor.cell.row
            ));
        }
        if transform.cell_of(actor.position) != actor.cell {
            anomalies.push(format!(
                "actor {} position ({}, {}) is not cell ({}, {})",
                actor.index, actor.position.x, actor.position.z, actor.cell.col, actor.cell.row
            ));
        }
    }
    if !captured {
        let mut seen = HashSet::new();
        for actor in &snapshot.actors {
            if !seen.insert(actor.cell) {
                anomalies.push(format!(
                    "actors overlap at ({}, {}) without a capture",
                    actor.cell.col, actor.cell.row
                ));
            }
        }
    }
    let stalkers = snapshot.actors.iter().filter(|actor| actor.stalking).count();
    if snapshot.actors.first().is_some_and(|player| player.stalking) {
        anomalies.push("player marked as stalker".to_string());
    }
    if stalkers >= snapshot.actors.len() {
        anomalies.push(format!("{stalkers} stalkers for {} actors", snapshot.actors.len()));
    }
    anomalies
}

fn resolve_scenarios(cli: &Cli) -> Vec<Scenario> {
    let seed = cli.seed.unwrap_or_else(rand::random::<u32>);
    let ticks = cli
        .ticks
        .unwrap_or(DEFAULT_MINUTES * 60 * TICK_RATE as u64)
        .max(1);
    let lives = cli.lives.unwrap_or(DEFAULT_LIVES).clamp(1, 99);
    let difficulty = cli.difficulty.as_deref().and_then(Difficulty::parse);

    if cli.single || difficulty.is_some() {
        let difficulty = difficulty.unwrap_or_default();
        return vec![Scenario {
            name: format!("custom-{}", difficulty_key(difficulty)),
            difficulty,
            seed,
            ticks,
            lives,
        }];
    }

    [Difficulty::Easy, Difficulty::Normal, Difficulty::Hard]
        .into_iter()
        .enumerate()
        .map(|(offset, difficulty)| Scenario {
            name: format!("{}-check", difficulty_key(difficulty)),
            difficulty,
            seed: seed.wrapping_add(offset as u32),
            ticks,
            lives,
        })
        .collect()
}

fn difficulty_key(difficulty: Difficulty) -> &'static str {
    match difficulty {
        Difficulty::Easy => "easy",
        Difficulty::Normal => "normal",
        Difficulty::Hard => "hard",
    }
}

/// Every anomaly with its tick, plus the distinct messages in first-seen order.
#[derive(Debug, Default)]
struct AnomalyLog {
    records: Vec<AnomalyRecord>,
    distinct: Vec<String>,
    seen: HashSet<String>,
}

impl AnomalyLog {
    fn push(&mut self, tick: u64, message: String) {
        if self.seen.insert(message.clone()) {
            self.distinct.push(message.clone());
        }
        self.records.push(AnomalyRecord { tick, message });
    }
}

fn default_match_id(seed: u32, timestamp_ms: i64) -> String {
    format!("sim-{seed}-{timestamp_ms}")
}

fn build_run_summary(
    match_id: String,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
    scenarios: Vec<ScenarioResultLine>,
    reason_counts: BTreeMap<String, usize>,
    anomaly_count: usize,
    total_ticks: u64,
) -> RunSummary {
    let scenario_count = scenarios.len();
    let average_ticks = if scenario_count == 0 {
        0
    } else {
        total_ticks / scenario_count as u64
    };
    RunSummary {
        match_id,
        started_at: started_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        finished_at: finished_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        scenario_count,
        anomaly_count,
        average_ticks,
        reason_counts,
        scenarios,
    }
}

fn game_over_reason_key(reason: GameOverReason) -> String {
    match reason {
        GameOverReason::RoundCleared => "round_cleared",
        GameOverReason::OutOfLives => "out_of_lives",
        GameOverReason::TickLimit => "tick_limit",
    }
    .to_string()
}

fn write_summary(path: &Path, summary: &RunSummary) -> io::Result<()> {
    let summary_text = serde_json::to_string_pretty(summary)?;
    std::fs::write(path, summary_text)
}
