//! Borrowed simulation state handed to `take_action`.

use ts_core::{AgentRng, SimConfig};
use ts_graph::{Graph, Pathfinder};

/// Everything an agent may consult while acting.
///
/// `full` is the road graph drivers navigate; `simplified` holds only stop
/// blocks and is where passengers plan.  Both are read-only for the whole
/// run.  `rng` is the acting agent's own stream.
pub struct AgentContext<'a> {
    pub full:       &'a Graph,
    pub simplified: &'a Graph,
    pub pathfinder: &'a dyn Pathfinder,
    pub config:     &'a SimConfig,
    pub rng:        &'a mut AgentRng,
}
