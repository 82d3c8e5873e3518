//! `ts-events`: the event queue, passenger plans and population loading.
//!
//! # Crate layout
//!
//! | Module          | Contents                                                  |
//! |-----------------|-----------------------------------------------------------|
//! | [`event`]       | `EventType` (with its fixed rank), `Event`, `EventQueue`  |
//! | [`plan`]        | `PlanType`, `Plan`, `PlanQueue`                           |
//! | [`population`]  | `PassengerProfile`, `TimeWindow`, `load_population_csv`   |
//! | [`error`]       | `EventError`, `EventResult<T>`                            |
//!
//! # Ordering model (summary)
//!
//! ```text
//! EventQueue pops by   (time ↑, type rank ↑, insertion order ↑)
//! PlanQueue  pops by   (plan type ↓, time ↑, insertion order ↑)
//! ```
//!
//! Both orders are total, so two runs with the same seed pop the same
//! sequence.

pub mod error;
pub mod event;
pub mod plan;
pub mod population;

#[cfg(test)]
mod tests;

pub use error::{EventError, EventResult};
pub use event::{Event, EventQueue, EventType};
pub use plan::{Plan, PlanQueue, PlanType};
pub use population::{load_population_csv, load_population_reader, Employment, PassengerProfile, TimeWindow};
