//! Passenger travel plans.
//!
//! A passenger holds its pending plans in a [`PlanQueue`].  The queue pops
//! the most urgent plan type first (`GoToWork` > `RandomTravel` >
//! `ReturnHome`), and the earliest plan among equals.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use ts_core::{BlockId, SimTime};

/// Why a passenger travels.  Higher discriminant means more urgent.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum PlanType {
    ReturnHome   = 1,
    RandomTravel = 2,
    GoToWork     = 3,
}

impl PlanType {
    #[inline]
    pub fn priority(self) -> u8 {
        self as u8
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PlanType::ReturnHome   => "RETURN_HOME",
            PlanType::RandomTravel => "RANDOM_TRAVEL",
            PlanType::GoToWork     => "GO_TO_WORK",
        }
    }
}

/// Be at `goal` (a simplified-graph block) around `time`.
#[derive(Copy, Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Plan {
    pub time: SimTime,
    pub goal: BlockId,
    pub kind: PlanType,
}

impl Plan {
    pub fn new(time: SimTime, goal: BlockId, kind: PlanType) -> Self {
        Self { time, goal, kind }
    }
}

// ── PlanQueue ─────────────────────────────────────────────────────────────────

struct Queued {
    seq:  u64,
    plan: Plan,
}

impl Queued {
    /// Max-heap order: higher type, then earlier time, then earlier insert.
    fn rank(&self, other: &Self) -> Ordering {
        self.plan
            .kind
            .cmp(&other.plan.kind)
            .then_with(|| other.plan.time.cmp(&self.plan.time))
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialEq for Queued {
    fn eq(&self, other: &Self) -> bool {
        self.rank(other) == Ordering::Equal
    }
}

impl Eq for Queued {}

impl PartialOrd for Queued {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Queued {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank(other)
    }
}

/// Priority queue of a passenger's pending plans.
#[derive(Default)]
pub struct PlanQueue {
    heap:     BinaryHeap<Queued>,
    next_seq: u64,
}

impl PlanQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, plan: Plan) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Queued { seq, plan });
    }

    /// The plan [`pop`](Self::pop) would return.
    pub fn peek(&self) -> Option<&Plan> {
        self.heap.peek().map(|q| &q.plan)
    }

    pub fn pop(&mut self) -> Option<Plan> {
        self.heap.pop().map(|q| q.plan)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

impl FromIterator<Plan> for PlanQueue {
    fn from_iter<I: IntoIterator<Item = Plan>>(iter: I) -> Self {
        let mut q = PlanQueue::new();
        for p in iter {
            q.push(p);
        }
        q
    }
}
