//! `transit`: load a city map and population, run the bus network for a
//! day and write the event log.
//!
//! ```text
//! transit --maps city.json --population people.csv --start 06:00 \
//!         --bus 12=3 --bus P7=1 --municipality centro --output run/
//! ```
//!
//! Files written to the output directory:
//! `events.log`, `events.csv`, `run_summary.json` and, with
//! `log_to_file = true` in the settings, `transit.log`.

mod cli;
mod log;
mod settings;


use std::fs;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;

use ts_core::SimTime;
use ts_graph::AStarPathfinder;
use ts_output::{CsvWriter, EventLogWriter, SimOutputObserver};
use ts_sim::{initialize, Scenario};

use cli::Cli;
use settings::Settings;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load(cli.settings.as_deref())?;

    fs::create_dir_all(&cli.output)
        .with_context(|| format!("creating output directory {}", cli.output.display()))?;
    log::init(
        settings.log_level.as_deref(),
        settings.log_to_file.then_some(cli.output.as_path()),
    )?;

    let mut config = settings.simulation.clone();
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }
    let start = match cli.start.as_deref() {
        Some(s) => SimTime::parse_hhmm(s)?,
        None => config.start(),
    };
    if let Some(until) = cli.until.as_deref() {
        config.horizon_minute = SimTime::parse_hhmm(until)?.minutes();
    }

    let bus_distributions = if cli.bus.is_empty() {
        settings.bus_distributions()
    } else {
        cli.bus.clone()
    };
    if bus_distributions.is_empty() {
        ::log::warn!("no buses configured; passengers will only walk");
    }

    let scenario = Scenario {
        maps_path: cli.maps.clone(),
        population_path: cli.population.clone(),
        population_size: cli.size,
        bus_distributions,
        start,
        municipalities: cli.municipality.clone(),
    };

    let t0 = Instant::now();
    let mut sim = initialize(&scenario, config, AStarPathfinder::new(settings.search.clone()))
        .context("initialising scenario")?;
    ::log::info!(
        "initialised {} agents in {:.2?}; running {} until {}",
        sim.agent_count(),
        t0.elapsed(),
        sim.clock(),
        sim.config().horizon()
    );

    let writers = (EventLogWriter::create(&cli.output)?, CsvWriter::new(&cli.output)?);
    let mut observer = SimOutputObserver::new(writers);

    let t1 = Instant::now();
    let summary = sim.run(&mut observer)?;
    if let Some(e) = observer.take_error() {
        return Err(e).context("writing simulation output");
    }

    ::log::info!(
        "{} events in {:.2?}, final time {}",
        summary.events,
        t1.elapsed(),
        summary.final_time
    );
    ::log::info!(
        "{} boardings, {} plans completed, {} impossible, {} abrupt route endings",
        summary.boardings,
        summary.completed_plans,
        summary.impossible_plans,
        summary.abrupt_endings
    );
    if cli.print_summary {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }
    Ok(())
}
