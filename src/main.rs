//! Command-line front end: schedules a JSON dataset and prints a JSON report.
//!
//! ```text
//! u-platform --dataset data/sample_trains.json --mode ilp --override 12951=2
//! ```
//!
//! Logs go to stderr and are filtered with `RUST_LOG` (default `info`).

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use u_platform::conflicts::detect_conflicts;
use u_platform::models::{Conflict, Provenance, Recommendation, ScheduleEntry, UnplacedReason};
use u_platform::recommend::RecommendationEngine;
use u_platform::scheduler::ScheduleKpi;
use u_platform::session::{DispatchSession, OverrideRequest};
use u_platform::{Dataset, ImpactReport, OptimizerMode, PlannerConfig, PlannerError};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    Greedy,
    Ilp,
}

impl From<Mode> for OptimizerMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Greedy => OptimizerMode::Greedy,
            Mode::Ilp => OptimizerMode::Ilp,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "u-platform", version, about = "Assign trains to station platforms")]
struct Cli {
    /// JSON dataset with `stations` and `trains`.
    #[arg(short, long)]
    dataset: PathBuf,

    /// TOML planner configuration.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Scheduler strategy (overrides the configuration file).
    #[arg(short, long, value_enum)]
    mode: Option<Mode>,

    /// Pin a train to a platform at its origin station, as TRAIN=PLATFORM.
    #[arg(long = "override", value_parser = parse_override)]
    overrides: Vec<(String, u32)>,

    /// Number of recommendations to include.
    #[arg(short, long)]
    recommendations: Option<usize>,

    /// Pretty-print the report.
    #[arg(long)]
    pretty: bool,
}

#[derive(Debug, Serialize)]
struct Report<'a> {
    provenance: &'a Provenance,
    schedule: Vec<&'a ScheduleEntry>,
    unplaced: Vec<Unplaced<'a>>,
    conflicts: Vec<Conflict>,
    impact: ImpactReport,
    recommendations: Vec<Recommendation>,
    kpi: ScheduleKpi,
}

#[derive(Debug, Serialize)]
struct Unplaced<'a> {
    train_id: &'a str,
    reason: &'a UnplacedReason,
}

fn parse_override(s: &str) -> Result<(String, u32), String> {
    let (train, platform) = s
        .split_once('=')
        .ok_or_else(|| format!("expected TRAIN=PLATFORM, got `{s}`"))?;
    let platform = platform
        .trim()
        .parse::<u32>()
        .map_err(|e| format!("invalid platform `{platform}`: {e}"))?;
    Ok((train.trim().to_string(), platform))
}

fn run(cli: Cli) -> Result<String, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => PlannerConfig::load(path).map_err(PlannerError::from)?,
        None => PlannerConfig::default(),
    };
    if let Some(mode) = cli.mode {
        config = config.with_mode(mode.into());
    }
    let limit = cli.recommendations.unwrap_or(config.recommendation_limit);

    let dataset = Dataset::load(&cli.dataset).map_err(PlannerError::from)?;
    info!(
        event = "dataset_loaded",
        path = %cli.dataset.display(),
        stations = dataset.stations.len(),
        trains = dataset.trains.len()
    );

    let mut session = DispatchSession::new(dataset.trains, dataset.stations)?.with_config(config);
    for (train_id, platform) in &cli.overrides {
        let origin = session
            .trains()
            .iter()
            .find(|t| &t.id == train_id)
            .map(|t| t.origin.clone())
            .ok_or_else(|| PlannerError::UnknownTrain(train_id.clone()))?;
        session.apply_override(&OverrideRequest::new(train_id.as_str(), origin, *platform))?;
    }

    let schedule = match session.schedule() {
        Some(schedule) => schedule.clone(),
        None => session.optimize().clone(),
    };
    let kpi = ScheduleKpi::calculate(&schedule, session.trains());
    let (conflicts, impact) = detect_conflicts(session.trains(), session.stations(), &schedule);
    let recommendations = RecommendationEngine::new(session.trains(), session.stations()).recommend(
        &schedule,
        Some(conflicts.as_slice()),
        limit,
    );

    let report = Report {
        provenance: &schedule.provenance,
        schedule: schedule.entries().collect(),
        unplaced: schedule
            .unplaced()
            .map(|(train_id, reason)| Unplaced { train_id, reason })
            .collect(),
        conflicts,
        impact,
        recommendations,
        kpi,
    };

    let json = if cli.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    Ok(json)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
