//! `ts-graph`: the block graph and everything that searches it.
//!
//! # Crate layout
//!
//! | Module          | Contents                                                  |
//! |-----------------|-----------------------------------------------------------|
//! | [`element`]     | `ElementKind`, `Element` (stops, signals, gazelle markers)|
//! | [`block`]       | `Block`, the graph's node type                            |
//! | [`graph`]       | `Graph`, `Edge`, `TransitRoute`, `Place`, R-tree snapping |
//! | [`simplify`]    | `Graph::simplify`: stop-only coarse graph                 |
//! | [`pathfinder`]  | `Pathfinder` trait, `AStarPathfinder`, `SearchParams`     |
//! | [`discovery`]   | `blocks_in_radius`, `get_routes` (mode-annotated paths)   |
//! | [`route_order`] | `order_route`: stitch way groups into a directed route    |
//! | [`loader`]      | `load_map_json`, `load_map_reader`                        |
//! | [`error`]       | `GraphError`, `SearchError` and their result aliases      |
//!
//! # Two graphs
//!
//! A scenario carries the full-resolution graph (drivers navigate it) and a
//! simplified graph holding only stop-bearing blocks (passengers plan on it).
//! Both share `BlockKey` identity, so a block can be translated between them
//! with [`Graph::id_of`].
//!
//! # Feature flags
//!
//! | Flag       | Effect                                                   |
//! |------------|----------------------------------------------------------|
//! | `parallel` | Runs simplification expansions on Rayon's thread pool.   |

pub mod block;
pub mod discovery;
pub mod element;
pub mod error;
pub mod graph;
pub mod loader;
pub mod pathfinder;
pub mod route_order;
pub mod simplify;

#[cfg(test)]
mod tests;

pub use block::Block;
pub use discovery::{blocks_in_radius, get_routes, Hop, RouteOption};
pub use element::{Element, ElementKind};
pub use error::{GraphError, GraphResult, SearchError, SearchResult};
pub use graph::{Edge, Graph, Place, TransitRoute};
pub use loader::{load_map_json, load_map_reader};
pub use pathfinder::{AStarPathfinder, Path, Pathfinder, SearchParams, SearchQuery};
pub use route_order::{order_route, WayGroup};
