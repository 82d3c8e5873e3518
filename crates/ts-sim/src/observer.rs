//! Simulation observer trait for event streaming and run reporting.

use ts_core::{AgentId, SimTime};
use ts_events::EventType;

/// One processed event, as handed to observers.
///
/// `driver` is the bus a passenger is boarding or riding at the time the
/// event fires; it is `None` for drivers and for passengers on foot.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct EventRecord {
    pub time:   SimTime,
    pub kind:   EventType,
    pub agent:  AgentId,
    pub driver: Option<AgentId>,
}

/// Totals for a finished (or halted) run.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RunSummary {
    pub drivers:          usize,
    pub passengers:       usize,
    pub events:           u64,
    pub final_time:       SimTime,
    pub boardings:        u64,
    pub completed_plans:  u64,
    pub impossible_plans: u64,
    pub abrupt_endings:   u64,
    /// `true` when the run ended through a [`StopHandle`][crate::StopHandle].
    pub stopped:          bool,
}

/// Callbacks invoked by [`Simulation::run`][crate::Simulation::run].
///
/// All methods have default no-op implementations so implementors only need
/// to override what they care about.
///
/// # Example: progress printer
///
/// ```rust,ignore
/// struct Progress;
///
/// impl SimObserver for Progress {
///     fn on_event(&mut self, record: &EventRecord) {
///         if record.kind == EventType::AtGoal {
///             println!("{} reached its goal at {}", record.agent, record.time);
///         }
///     }
/// }
/// ```
pub trait SimObserver {
    /// Called once per processed event, passive ones included.
    fn on_event(&mut self, _record: &EventRecord) {}

    /// Called once after the loop exits.
    fn on_sim_end(&mut self, _summary: &RunSummary) {}
}

/// A [`SimObserver`] that does nothing.
pub struct NoopObserver;

impl SimObserver for NoopObserver {}

/// Keeps every record in memory.  Handy for tests and small runs.
#[derive(Default)]
pub struct RecordingObserver {
    pub records: Vec<EventRecord>,
    pub summary: Option<RunSummary>,
}

impl SimObserver for RecordingObserver {
    fn on_event(&mut self, record: &EventRecord) {
        self.records.push(*record);
    }

    fn on_sim_end(&mut self, summary: &RunSummary) {
        self.summary = Some(summary.clone());
    }
}
