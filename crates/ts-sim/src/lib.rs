//! `ts-sim`: discrete-event orchestrator for the transit simulation.
//!
//! # Event loop
//!
//! ```text
//! while queue not empty and next.time ≤ horizon and not stopped:
//!   ① Pop      the (time, rank, seq)-smallest event; advance the clock.
//!   ② Passive  FUEL_SPENT burns the queued segment; OBEY_SIGNAL is logged.
//!   ③ Stops    a driver's BUS_STOP notifies riders and offers one seat to
//!              the first suitable passenger queued there (FIFO).
//!   ④ Agent    refresh the environment, think, take_action, push results.
//!   ⑤ Ledger   passengers join/leave stop queues, riders are added on
//!              BOARD_VEHICLE and removed on arrival or when the leg ends.
//!   ⑥ Report   the EventRecord goes to the SimObserver.
//! ```
//!
//! Seat reservation happens when the seat is offered, so occupancy never
//! exceeds capacity.  Everything runs on one thread; randomness comes only
//! from per-agent RNGs seeded from `SimConfig::seed`.
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use ts_graph::AStarPathfinder;
//! use ts_sim::{initialize, NoopObserver, Scenario};
//!
//! let mut sim = initialize(&scenario, config, AStarPathfinder::default())?;
//! let summary = sim.run(&mut NoopObserver)?;
//! ```

pub mod agent;
pub mod builder;
pub mod error;
pub mod observer;
pub mod scenario;
pub mod sim;
pub mod stop;


pub use agent::{Agent, Environment};
pub use builder::SimBuilder;
pub use error::{SimError, SimResult};
pub use observer::{EventRecord, NoopObserver, RecordingObserver, RunSummary, SimObserver};
pub use scenario::{add_fleet, initialize, populate, PopulationReport, Scenario};
pub use sim::Simulation;
pub use stop::StopHandle;
