use thiserror::Error;

use ts_agents::AgentError;
use ts_core::{AgentId, CoreError};
use ts_events::EventError;
use ts_graph::GraphError;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("simulation configuration error: {0}")]
    Config(String),

    #[error("agent {0} is not registered")]
    UnknownAgent(AgentId),

    #[error("agent {agent} has no {expected} environment")]
    EnvironmentMismatch {
        agent:    AgentId,
        expected: &'static str,
    },

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("map error: {0}")]
    Graph(#[from] GraphError),

    #[error("population error: {0}")]
    Event(#[from] EventError),

    #[error("agent error: {0}")]
    Agent(#[from] AgentError),
}

pub type SimResult<T> = Result<T, SimError>;
