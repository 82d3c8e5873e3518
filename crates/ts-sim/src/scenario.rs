//! Scenario initialisation: map, population and fleet in, a ready
//! [`Simulation`] out.
//!
//! | Input               | Source                                              |
//! |---------------------|-----------------------------------------------------|
//! | road graph          | JSON map file, simplified with the configured radius |
//! | drivers             | `ROUTE → count`; bus `i` leaves at `start + i × gap` |
//! | passengers          | population CSV, filtered by municipality            |

use std::path::PathBuf;

use ts_agents::PassengerAgent;
use ts_core::{AgentId, BlockId, SimConfig, SimRng, SimTime};
use ts_events::{load_population_csv, PassengerProfile, PlanType};
use ts_graph::{load_map_json, Graph, Pathfinder};

use crate::{SimBuilder, SimResult, Simulation};

/// Everything [`initialize`] needs besides the [`SimConfig`].
#[derive(Clone, Debug)]
pub struct Scenario {
    pub maps_path:         PathBuf,
    pub population_path:   PathBuf,
    /// Read at most this many profiles.
    pub population_size:   Option<usize>,
    /// Route name and number of buses on it.
    pub bus_distributions: Vec<(String, usize)>,
    pub start:             SimTime,
    /// Only passengers living and working here are simulated.  Empty means
    /// everywhere.
    pub municipalities:    Vec<String>,
}

/// How the population file was turned into passengers.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PopulationReport {
    pub registered:  Vec<AgentId>,
    /// Lives or works outside the municipality filter.
    pub filtered:    usize,
    /// No home, goal or valid schedule could be assigned.
    pub unplaced:    usize,
    /// The first trip had no route.
    pub infeasible:  usize,
}

/// Load the map and population, place the fleet and the passengers.
///
/// Searches run through `pathfinder`; pass `ts_graph::AStarPathfinder::default()`
/// for the stock tunables.
pub fn initialize<P: Pathfinder>(
    scenario:   &Scenario,
    mut config: SimConfig,
    pathfinder: P,
) -> SimResult<Simulation<P>> {
    config.start_minute = scenario.start.0;
    let seed = config.seed;

    let full = load_map_json(&scenario.maps_path)?;
    let simplified = full.simplify(config.simplify_radius_km);
    log::info!(
        "map {}: {} blocks, {} stop blocks, {} lines",
        scenario.maps_path.display(),
        full.block_count(),
        simplified.block_count(),
        full.routes().len()
    );

    let mut sim = SimBuilder::new(config, full, simplified).pathfinder(pathfinder).build()?;
    let fleet = add_fleet(&mut sim, &scenario.bus_distributions)?;

    let profiles = load_population_csv(&scenario.population_path, scenario.population_size)?;
    let report = populate(&mut sim, &profiles, &scenario.municipalities, &mut SimRng::new(seed))?;
    log::info!(
        "{} buses, {} passengers ({} outside filter, {} unplaced, {} with no first route)",
        fleet.len(),
        report.registered.len(),
        report.filtered,
        report.unplaced,
        report.infeasible
    );
    Ok(sim)
}

/// Register the buses of every known route.  Unknown route names are
/// skipped with a warning.
pub fn add_fleet<P: Pathfinder>(
    sim:           &mut Simulation<P>,
    distributions: &[(String, usize)],
) -> SimResult<Vec<AgentId>> {
    let start = sim.config().start();
    let gap = sim.config().time_between_departures;
    let mut ids = Vec::new();
    for (name, count) in distributions {
        let Some(route) = sim.full().route_id(name) else {
            log::warn!("unknown route {name:?}; skipping its {count} buses");
            continue;
        };
        for i in 0..*count {
            ids.push(sim.add_driver(route, start + i as f64 * gap)?);
        }
    }
    Ok(ids)
}

/// Turn profiles into passengers with homes, goals and the day's plans.
pub fn populate<P: Pathfinder>(
    sim:            &mut Simulation<P>,
    profiles:       &[PassengerProfile],
    municipalities: &[String],
    rng:            &mut SimRng,
) -> SimResult<PopulationReport> {
    let now = sim.clock().now;
    let mut report = PopulationReport::default();

    for (row, profile) in profiles.iter().enumerate() {
        let outside = |m: &String| !municipalities.is_empty() && !municipalities.contains(m);
        if outside(&profile.municipality) || profile.workplace_location.as_ref().is_some_and(outside) {
            report.filtered += 1;
            continue;
        }
        let Some(home) = rng.choose(sim.simplified().municipality_blocks(&profile.municipality)).copied() else {
            log::debug!("profile {row}: no stop block in {:?}", profile.municipality);
            report.unplaced += 1;
            continue;
        };
        let window = match profile.time_window(now, rng) {
            Ok(w) => w,
            Err(e) => {
                log::warn!("profile {row}: {e}; skipped");
                report.unplaced += 1;
                continue;
            }
        };

        let outbound = profile.employment().outbound_plan();
        let workplace = profile
            .workplace_location
            .as_deref()
            .and_then(|m| rng.choose(sim.simplified().municipality_blocks(m)).copied());
        let goal = match outbound {
            PlanType::GoToWork => workplace.or_else(|| random_block(sim.simplified(), rng)),
            _ => random_block(sim.simplified(), rng),
        };
        let Some(goal) = goal else {
            report.unplaced += 1;
            continue;
        };

        let plans = PassengerAgent::plans_for(outbound, window, home, goal);
        match sim.add_passenger(profile, plans, home, workplace)? {
            Some(id) => report.registered.push(id),
            None => report.infeasible += 1,
        }
    }
    Ok(report)
}

fn random_block(graph: &Graph, rng: &mut SimRng) -> Option<BlockId> {
    let n = graph.block_count();
    if n == 0 {
        return None;
    }
    BlockId::try_from(rng.gen_range(0..n)).ok()
}
