use chrono::{DateTime, SecondsFormat, Utc};
use clap::Parser;
use maze_chase_server::autopilot::choose_direction;
use maze_chase_server::config::SimulationConfig;
use maze_chase_server::engine::{GameEngine, GameEngineOptions};
use maze_chase_server::maps::{builtin_maps, load_maps, MapDefinition};
use maze_chase_server::types::{GameOverReason, RuntimeEvent, Snapshot, Vec2};
use maze_chase_server::world::{Tile, TileMap};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_MAX_TICKS: u64 = 20_000;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[arg(long)]
    seed: Option<u64>,
    /// Rounds per map, each with the next seed.
    #[arg(long, default_value_t = 1)]
    rounds: u32,
    /// Only run the map with this name.
    #[arg(long)]
    map: Option<String>,
    #[arg(long)]
    maps_file: Option<PathBuf>,
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, default_value_t = DEFAULT_MAX_TICKS)]
    max_ticks: u64,
    #[arg(long)]
    match_id: Option<String>,
    #[arg(long)]
    summary_out: Option<PathBuf>,
}

#[derive(Clone, Debug)]
struct Scenario {
    name: String,
    map: MapDefinition,
    seed: u64,
}

#[derive(Clone, Debug, Serialize)]
struct ScenarioResultLine {
    scenario: String,
    map: String,
    seed: u64,
    reason: GameOverReason,
    ticks: u64,
    score: u32,
    #[serde(rename = "livesLeft")]
    lives_left: u32,
    #[serde(rename = "pelletsEaten")]
    pellets_eaten: u32,
    #[serde(rename = "pursuersEaten")]
    pursuers_eaten: u32,
    #[serde(rename = "livesLost")]
    lives_lost: u32,
    #[serde(rename = "frightenedActivations")]
    frightened_activations: u32,
    anomalies: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
struct AnomalyRecord {
    tick: u64,
    message: String,
}

#[derive(Clone, Debug, Serialize)]
struct ScenarioRunResult {
    #[serde(flatten)]
    result: ScenarioResultLine,
    #[serde(rename = "anomalyRecords")]
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

fn main() {
    tracing_subscriber::fmt()
        .json()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    let run_started_at = Utc::now();
    let config = match cli.config.as_deref().map(SimulationConfig::load) {
        None => SimulationConfig::default(),
        Some(Ok(config)) => config,
        Some(Err(err)) => {
            error!(event = "config_load_failed", error = %err);
            std::process::exit(2);
        }
    };
    let maps = match cli.maps_file.as_deref().map(load_maps) {
        None => builtin_maps(),
        Some(Ok(maps)) => maps,
        Some(Err(err)) => {
            error!(event = "maps_load_failed", error = %err);
            std::process::exit(2);
        }
    };

    let scenarios = resolve_scenarios(&cli, &maps);
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
            event = "scenario_started",
            match_id = %match_id,
            scenario = %scenario.name,
            seed = scenario.seed,
            map = %scenario.map.name,
        );
        let scenario_run = match run_scenario(&scenario, &config, cli.max_ticks) {
            Ok(run) => run,
            Err(err) => {
                error!(
                    event = "scenario_failed",
                    match_id = %match_id,
                    scenario = %scenario.name,
                    error = %err,
                );
                has_anomaly = true;
                continue;
            }
        };

        for anomaly in &scenario_run.anomaly_records {
            warn!(
                event = "anomaly_detected",
                match_id = %match_id,
                scenario = %scenario.name,
                seed = scenario.seed,
                tick = anomaly.tick,
                message = %anomaly.message,
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
            event = "scenario_finished",
            match_id = %match_id,
            scenario = %scenario.name,
            seed = scenario.seed,
            tick = scenario_run.result.ticks,
            reason = %game_over_reason_key(scenario_run.result.reason),
            score = scenario_run.result.score,
            anomaly_count = scenario_run.anomaly_records.len(),
        );

        match serde_json::to_string(&scenario_run.result) {
            Ok(line) => println!("{line}"),
            Err(err) => error!(event = "result_encode_failed", error = %err),
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

    let mut summary_out_written: Option<String> = None;
    if let Some(path) = cli.summary_out.as_ref() {
        if let Err(err) = write_summary(path, &summary) {
            error!(
                event = "summary_write_failed",
                match_id = %match_id,
                path = %path.to_string_lossy(),
                error = %err,
            );
            std::process::exit(2);
        }
        summary_out_written = Some(path.to_string_lossy().to_string());
    }

    info!(
        event = "run_finished",
        match_id = %match_id,
        scenario_count = summary.scenario_count,
        anomaly_count = summary.anomaly_count,
        average_ticks = summary.average_ticks,
        summary_out = summary_out_written.as_deref().unwrap_or(""),
    );

    if has_anomaly {
        std::process::exit(1);
    }
}

fn run_scenario(
    scenario: &Scenario,
    config: &SimulationConfig,
    max_ticks: u64,
) -> Result<ScenarioRunResult, maze_chase_server::error::MapError> {
    let map = scenario.map.build()?;
    let mut engine = GameEngine::new(
        map,
        config.clone(),
        scenario.seed,
        GameEngineOptions {
            tick_limit: Some(max_ticks.max(1)),
        },
    );

    let mut lives_lost = 0;
    let mut frightened_activations = 0;
    let mut anomalies = Vec::new();
    let mut anomaly_records = Vec::new();
    let mut anomaly_seen = HashSet::new();
    let mut previous_score = 0;

    while !engine.is_ended() {
        let dir = choose_direction(&engine.map, engine.player().position, engine.pursuers());
        engine.receive_input(dir);
        engine.step();
        let snapshot = engine.build_snapshot(true);
        for message in collect_snapshot_anomalies(&snapshot, &engine.map, &engine.config, previous_score)
        {
            push_anomaly(
                &mut anomalies,
                &mut anomaly_records,
                &mut anomaly_seen,
                snapshot.tick,
                message,
            );
        }
        previous_score = snapshot.player.score;

        for event in &snapshot.events {
            match event {
                RuntimeEvent::PlayerCaught { .. } => lives_lost += 1,
                RuntimeEvent::FrightenedStarted { .. } => frightened_activations += 1,
                _ => {}
            }
        }
    }

    let summary = engine.build_summary();
    Ok(ScenarioRunResult {
        result: ScenarioResultLine {
            scenario: scenario.name.clone(),
            map: scenario.map.name.clone(),
            seed: scenario.seed,
            reason: summary.reason,
            ticks: summary.ticks,
            score: summary.score,
            lives_left: summary.lives_left,
            pellets_eaten: summary.pellets_eaten,
            pursuers_eaten: summary.pursuers_eaten,
            lives_lost,
            frightened_activations,
            anomalies,
        },
        anomaly_records,
    })
}

fn collect_snapshot_anomalies(
    snapshot: &Snapshot,
    map: &TileMap,
    config: &SimulationConfig,
    previous_score: u32,
) -> Vec<String> {
    let mut anomalies = Vec::new();
    if snapshot.player.score < previous_score {
        anomalies.push(format!(
            "score went down: {} -> {}",
            previous_score, snapshot.player.score
        ));
    }
    if snapshot.player.lives > config.starting_lives {
        anomalies.push(format!("lives out of range: {}", snapshot.player.lives));
    }
    if snapshot.frightened_remaining > config.frightened_units {
        anomalies.push(format!(
            "frightened remaining exceeds duration: {}",
            snapshot.frightened_remaining
        ));
    }
    for pursuer in &snapshot.pursuers {
        if map.tile_value(Vec2::new(pursuer.x, pursuer.y)) != Some(Tile::Wall) {
            continue;
        }
        anomalies.push(format!("pursuer on wall: {}", pursuer.id));
    }
    anomalies
}

fn resolve_scenarios(cli: &Cli, maps: &[MapDefinition]) -> Vec<Scenario> {
    let seed = cli
        .seed
        .unwrap_or_else(|| Utc::now().timestamp_millis().unsigned_abs());
    let mut scenarios = Vec::new();
    for definition in maps {
        if cli
            .map
            .as_deref()
            .is_some_and(|name| !name.eq_ignore_ascii_case(&definition.name))
        {
            continue;
        }
        for round in 0..cli.rounds.max(1) {
            let seed = seed.wrapping_add(scenarios.len() as u64);
            scenarios.push(Scenario {
                name: format!("{}-r{}", definition.name, round + 1),
                map: definition.clone(),
                seed,
            });
        }
    }
    scenarios
}

fn push_anomaly(
    anomalies: &mut Vec<String>,
    anomaly_records: &mut Vec<AnomalyRecord>,
    anomaly_seen: &mut HashSet<String>,
    tick: u64,
    message: String,
) {
    anomaly_records.push(AnomalyRecord {
        tick,
        message: message.clone(),
    });
    if anomaly_seen.insert(message.clone()) {
        anomalies.push(message);
    }
}

fn default_match_id(seed: u64, timestamp_ms: i64) -> String {
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
        GameOverReason::Victory => "victory",
        GameOverReason::Caught => "caught",
        GameOverReason::Timeout => "timeout",
    }
    .to_string()
}

fn write_summary(path: &Path, summary: &RunSummary) -> io::Result<()> {
    let summary_text = serde_json::to_string_pretty(summary)?;
    std::fs::write(path, summary_text)
}
