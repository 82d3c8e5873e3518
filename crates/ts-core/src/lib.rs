//! `ts-core`: foundational types for the transit simulation workspace.
//!
//! Every other `ts-*` crate depends on this one.  It has no `ts-*`
//! dependencies and only `rand` and `thiserror` as external ones (plus
//! optional `serde`).
//!
//! # What lives here
//!
//! | Module          | Contents                                              |
//! |-----------------|-------------------------------------------------------|
//! | [`ids`]         | `AgentId`, `BlockId`, `RouteId`, `BlockKey`           |
//! | [`geo`]         | `GeoPoint`, great-circle distance in kilometres       |
//! | [`time`]        | `SimTime` (minutes), `SimClock`, `SimConfig`          |
//! | [`rng`]         | `AgentRng` (per-agent), `SimRng` (global)             |
//! | [`transport`]   | `TransportMode` (walk or a transit line)              |
//! | [`error`]       | `CoreError`, `CoreResult`                             |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |

pub mod error;
pub mod geo;
pub mod ids;
pub mod rng;
pub mod time;
pub mod transport;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{CoreError, CoreResult};
pub use geo::GeoPoint;
pub use ids::{AgentId, BlockId, BlockKey, RouteId};
pub use rng::{AgentRng, SimRng};
pub use time::{SimClock, SimConfig, SimTime};
pub use transport::TransportMode;
