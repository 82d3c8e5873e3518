//! `ts-agents`: the bus driver and passenger state machines.
//!
//! # Crate layout
//!
//! | Module          | Contents                                                   |
//! |-----------------|------------------------------------------------------------|
//! | [`state`]       | `StateMachine` trait (`think` then `take_action`)          |
//! | [`driver`]      | `DriverAgent`, `DriverStatus`, dwell ranges                |
//! | [`passenger`]   | `PassengerAgent`, `PassengerStatus`, route scoring         |
//! | [`environment`] | `DriverEnvironment`, `PassengerEnvironment`                |
//! | [`bus`]         | `Bus`, `BusModel` (`MAZ-105`, `MAZ-103T`)                  |
//! | [`context`]     | `AgentContext<'a>`: graphs, pathfinder, config, agent RNG  |
//! | [`error`]       | `AgentError`, `AgentResult<T>`                             |
//!
//! # Design notes
//!
//! Agents never touch each other or the queues directly.  Coordination
//! between a driver and its passengers (stop queues, seats, riders) is the
//! orchestrator's job: it writes the relevant facts into each agent's
//! environment before calling `think`, and it reads the events an agent
//! returns from `take_action`.

pub mod bus;
pub mod context;
pub mod driver;
pub mod environment;
pub mod error;
pub mod passenger;
pub mod state;


pub use bus::{Bus, BusModel, MAZ_103T, MAZ_105};
pub use context::AgentContext;
pub use driver::{dwell_range, DriverAgent, DriverStatus, ABILITY_RANGE};
pub use environment::{DriverEnvironment, PassengerEnvironment};
pub use error::{AgentError, AgentResult};
pub use passenger::{
    route_score, transitions, PassengerAgent, PassengerStatus, ALIGHTING_MINUTES, ONBOARDING_MINUTES,
    TRANSITION_PENALTY,
};
pub use state::StateMachine;
