use thiserror::Error;

use ts_core::{BlockId, RouteId};

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("route {0} is not registered in the graph")]
    UnknownRoute(RouteId),

    #[error("route {0:?} has an empty leg")]
    EmptyRoute(String),

    #[error("block {0} is not in the graph")]
    UnknownBlock(BlockId),
}

pub type AgentResult<T> = Result<T, AgentError>;
