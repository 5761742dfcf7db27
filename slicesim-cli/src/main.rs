//! slicesim: slice admission simulation driver
//!
//! Loads a scenario, runs it for a number of ticks and reports the per-tick
//! metrics.
//!
//! # Usage
//!
//! ```bash
//! slicesim --scenario config/reference-scenario.yaml --ticks 500 --json
//! ```
//!
//! Without `--scenario` the built-in reference scenario is used.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use slicesim_common::{
    init_logging, load_scenario_config, LogLevel, ScenarioConfig, SimulationStepper,
};
use slicesim_engine::{Simulation, StatsSnapshot};

/// slicesim - network slice admission control simulator
#[derive(Parser, Debug)]
#[command(name = "slicesim")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Scenario file (YAML); the reference scenario when omitted
    #[arg(short = 's', long = "scenario", value_name = "FILE")]
    scenario: Option<PathBuf>,

    /// Number of ticks to run
    #[arg(short = 't', long = "ticks", default_value_t = 100)]
    ticks: u64,

    /// Override the scenario seed
    #[arg(long = "seed")]
    seed: Option<u64>,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(short = 'l', long = "log-level", default_value_t = LogLevel::Info)]
    log_level: LogLevel,

    /// Print each tick's snapshot as a JSON line
    #[arg(long = "json")]
    json: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.log_level);

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("slicesim failed: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn load_scenario(args: &Args) -> Result<ScenarioConfig> {
    let mut config = match &args.scenario {
        Some(path) => {
            info!("Loading scenario from: {}", path.display());
            load_scenario_config(path)
                .with_context(|| format!("Failed to load scenario from {}", path.display()))?
        }
        None => {
            info!("Using the reference scenario");
            ScenarioConfig::reference()
        }
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    Ok(config)
}

fn run(args: Args) -> Result<()> {
    let config = load_scenario(&args)?;
    let mut sim = Simulation::from_config(&config).context("Invalid scenario")?;

    for _ in 0..args.ticks {
        sim.step()
            .with_context(|| format!("Simulation aborted at {}", sim.current_tick()))?;
        let snapshot = sim.snapshot_metrics();
        if args.json {
            println!("{}", serde_json::to_string(&snapshot)?);
        } else {
            report(&snapshot);
        }
    }

    let last = sim.snapshot_metrics();
    info!(
        "Finished {} tick(s): connected {:.3}, coverage {:.3}, load {:.3}",
        sim.current_tick().value(),
        last.connected_ratio,
        last.coverage_ratio,
        last.avg_slice_load_ratio
    );
    Ok(())
}

fn report(snapshot: &StatsSnapshot) {
    info!(
        "tick {:>5} | attempts {:>4} | block {:.3} | handover {:.3} | connected {:.3} | load {:.3}",
        snapshot.tick,
        snapshot.connect_attempts,
        snapshot.block_ratio,
        snapshot.handover_ratio,
        snapshot.connected_ratio,
        snapshot.avg_slice_load_ratio
    );
}
