//! Typed events and the global event queue.
//!
//! # Ranks
//!
//! Simultaneous events pop in a fixed type order, lowest rank first:
//!
//! | Rank | Type                   | Emitted by                           |
//! |------|------------------------|--------------------------------------|
//! | 0    | `GetOffVehicle`        | passenger leaving a bus              |
//! | 1    | `BoardVehicle`         | passenger boarding completed         |
//! | 2    | `BusStop`              | driver reaching a stop element       |
//! | 3    | `Departure`            | driver or passenger starting a trip  |
//! | 4    | `Continue`             | driver at the end of a block         |
//! | 5    | `ObeySignal`           | driver at a traffic-control element  |
//! | 6    | `FuelSpent`            | driver at the end of a segment       |
//! | 7    | `AtStop`               | passenger reaching a stop            |
//! | 8    | `WaitExpired`          | passenger patience running out       |
//! | 9    | `AtGoal`               | passenger plan completed             |
//! | 10   | `RouteEnded`           | driver at the end of a leg           |
//! | 11   | `RouteEndedAbruptly`   | stranded driver, or its riders       |
//! | 12   | `ImpossiblePlan`       | passenger plan without a route       |
//!
//! Events with equal `(time, rank)` pop in insertion order.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::fmt;

use ts_core::{AgentId, SimTime};

// ── EventType ─────────────────────────────────────────────────────────────────

#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EventType {
    GetOffVehicle,
    BoardVehicle,
    BusStop,
    Departure,
    Continue,
    ObeySignal,
    FuelSpent,
    AtStop,
    WaitExpired,
    AtGoal,
    RouteEnded,
    RouteEndedAbruptly,
    ImpossiblePlan,
}

impl EventType {
    pub const ALL: [EventType; 13] = [
        EventType::GetOffVehicle,
        EventType::BoardVehicle,
        EventType::BusStop,
        EventType::Departure,
        EventType::Continue,
        EventType::ObeySignal,
        EventType::FuelSpent,
        EventType::AtStop,
        EventType::WaitExpired,
        EventType::AtGoal,
        EventType::RouteEnded,
        EventType::RouteEndedAbruptly,
        EventType::ImpossiblePlan,
    ];

    /// Tie-break rank among simultaneous events; lower pops first.
    #[inline]
    pub const fn rank(self) -> u8 {
        self as u8
    }

    /// Bookkeeping-only events: the orchestrator applies them without
    /// running the agent's state machine.
    #[inline]
    pub fn is_passive(self) -> bool {
        matches!(self, EventType::FuelSpent | EventType::ObeySignal)
    }

    /// Upper snake case name used in the event log.
    pub fn as_str(self) -> &'static str {
        match self {
            EventType::GetOffVehicle      => "GET_OFF_VEHICLE",
            EventType::BoardVehicle       => "BOARD_VEHICLE",
            EventType::BusStop            => "BUS_STOP",
            EventType::Departure          => "DEPARTURE",
            EventType::Continue           => "CONTINUE",
            EventType::ObeySignal         => "OBEY_SIGNAL",
            EventType::FuelSpent          => "FUEL_SPENT",
            EventType::AtStop             => "AT_STOP",
            EventType::WaitExpired        => "WAIT_EXPIRED",
            EventType::AtGoal             => "AT_GOAL",
            EventType::RouteEnded         => "ROUTE_ENDED",
            EventType::RouteEndedAbruptly => "ROUTE_ENDED_ABRUPTLY",
            EventType::ImpossiblePlan     => "IMPOSSIBLE_PLAN",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Event ─────────────────────────────────────────────────────────────────────

/// Something that happens to `agent` at `time`.  Immutable once created.
#[derive(Copy, Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Event {
    pub time:  SimTime,
    pub kind:  EventType,
    pub agent: AgentId,
}

impl Event {
    #[inline]
    pub fn new(time: SimTime, kind: EventType, agent: AgentId) -> Self {
        Self { time, kind, agent }
    }
}

// ── EventQueue ────────────────────────────────────────────────────────────────

struct Entry {
    seq:   u64,
    event: Event,
}

impl Entry {
    #[inline]
    fn key(&self) -> (SimTime, u8, u64) {
        (self.event.time, self.event.kind.rank(), self.seq)
    }
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

/// Global min-priority queue of events.
#[derive(Default)]
pub struct EventQueue {
    heap:     BinaryHeap<Reverse<Entry>>,
    next_seq: u64,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: Event) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Reverse(Entry { seq, event }));
    }

    /// Remove and return the earliest event.
    pub fn pop(&mut self) -> Option<Event> {
        self.heap.pop().map(|Reverse(e)| e.event)
    }

    pub fn peek(&self) -> Option<&Event> {
        self.heap.peek().map(|Reverse(e)| &e.event)
    }

    /// Time of the earliest queued event.
    pub fn next_time(&self) -> Option<SimTime> {
        self.peek().map(|e| e.time)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn clear(&mut self) {
        self.heap.clear();
    }
}

impl Extend<Event> for EventQueue {
    fn extend<I: IntoIterator<Item = Event>>(&mut self, iter: I) {
        for event in iter {
            self.push(event);
        }
    }
}
