//! Graph-subsystem error types.
//!
//! Construction problems (`GraphError`) are fatal at load time.  Search
//! exhaustion (`SearchError`) is an expected outcome that every caller
//! branches on; it never aborts a run.

use thiserror::Error;

use ts_core::{BlockId, BlockKey};

/// Errors raised while building or loading a graph.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("block {0} already exists")]
    DuplicateBlock(BlockKey),

    #[error("block {0} not found in graph")]
    UnknownBlock(BlockKey),

    #[error("route {route:?} is not completely connected after block {at}")]
    RouteNotConnected { route: String, at: BlockKey },

    #[error("route {0:?} has no blocks")]
    EmptyRoute(String),

    #[error("too many routes: route ids are 16-bit")]
    TooManyRoutes,

    #[error("map file error: {0}")]
    MapFile(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type GraphResult<T> = Result<T, GraphError>;

/// Why a path search produced no path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    #[error("no route from {from} to any goal")]
    NoRoute { from: BlockId },

    #[error("search gave up after {cap} iterations")]
    IterationCapReached { cap: usize },

    #[error("operation requires a simplified graph")]
    NotSimplified,

    #[error("block {0} not in graph")]
    UnknownBlock(BlockId),
}

pub type SearchResult<T> = Result<T, SearchError>;
