//! Fluent builder for constructing a [`Simulation`].

use ts_core::{BlockId, SimConfig};
use ts_graph::{AStarPathfinder, Graph, Pathfinder};

use crate::{SimError, SimResult, Simulation, StopHandle};

/// Fluent builder for [`Simulation<P>`].
///
/// # Required inputs
///
/// - [`SimConfig`]: start, horizon, seed, fleet and passenger constants
/// - the full road [`Graph`] drivers navigate
/// - its simplified counterpart (from [`Graph::simplify`]) where
///   passengers plan
///
/// # Optional inputs (have defaults)
///
/// | Method              | Default                          |
/// |---------------------|----------------------------------|
/// | `.pathfinder(p)`    | `AStarPathfinder::default()`     |
/// | `.obstacles(v)`     | no blocked blocks                |
/// | `.stop_handle(h)`   | a fresh, unset [`StopHandle`]    |
///
/// # Example
///
/// ```rust,ignore
/// let simplified = full.simplify(config.simplify_radius_km);
/// let mut sim = SimBuilder::new(config, full, simplified)
///     .obstacles(vec![closed_block])
///     .build()?;
/// sim.add_driver(route, SimTime::ZERO)?;
/// sim.run(&mut NoopObserver)?;
/// ```
pub struct SimBuilder<P: Pathfinder = AStarPathfinder> {
    config:     SimConfig,
    full:       Graph,
    simplified: Graph,
    pathfinder: P,
    obstacles:  Vec<BlockId>,
    stop:       Option<StopHandle>,
}

impl SimBuilder<AStarPathfinder> {
    /// Create a builder with all required inputs.
    pub fn new(config: SimConfig, full: Graph, simplified: Graph) -> Self {
        Self {
            config,
            full,
            simplified,
            pathfinder: AStarPathfinder::default(),
            obstacles:  Vec::new(),
            stop:       None,
        }
    }
}

impl<P: Pathfinder> SimBuilder<P> {
    /// Swap the search implementation.
    pub fn pathfinder<Q: Pathfinder>(self, pathfinder: Q) -> SimBuilder<Q> {
        SimBuilder {
            config:     self.config,
            full:       self.full,
            simplified: self.simplified,
            pathfinder,
            obstacles:  self.obstacles,
            stop:       self.stop,
        }
    }

    /// Full-graph blocks drivers must detour around.
    pub fn obstacles(mut self, obstacles: Vec<BlockId>) -> Self {
        self.obstacles = obstacles;
        self
    }

    /// Share an existing halt flag, e.g. one wired to a signal handler.
    pub fn stop_handle(mut self, handle: StopHandle) -> Self {
        self.stop = Some(handle);
        self
    }

    /// Validate inputs and return an empty, ready-to-populate simulation.
    pub fn build(self) -> SimResult<Simulation<P>> {
        self.config.validate()?;
        if !self.simplified.is_simplified() {
            return Err(SimError::Config("passenger graph must be the output of Graph::simplify".into()));
        }
        if self.full.is_simplified() {
            return Err(SimError::Config("driver graph must be the full road graph".into()));
        }
        if let Some(&bad) = self.obstacles.iter().find(|&&b| !self.full.contains(b)) {
            return Err(SimError::Config(format!("obstacle {bad} is not a block of the road graph")));
        }

        log::debug!(
            "simulation built: {} road blocks, {} stop blocks, {} lines, {} obstacles",
            self.full.block_count(),
            self.simplified.block_count(),
            self.full.routes().len(),
            self.obstacles.len()
        );
        Ok(Simulation::new(
            self.config,
            self.full,
            self.simplified,
            self.pathfinder,
            self.obstacles,
            self.stop.unwrap_or_default(),
        ))
    }
}
