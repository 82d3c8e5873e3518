//! Workspace base error type.
//!
//! Sub-crates define their own error enums and either wrap `CoreError` as one
//! variant or convert into it, whichever keeps call sites clean.

use thiserror::Error;

use crate::{AgentId, BlockKey};

/// The top-level error type for `ts-core` and a common base for sub-crates.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("agent {0} not found")]
    AgentNotFound(AgentId),

    #[error("block {0} not found")]
    BlockNotFound(BlockKey),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shorthand result type for `ts-core`.
pub type CoreResult<T> = Result<T, CoreError>;
