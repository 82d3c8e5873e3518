//! Plain data rows written by output backends.

use std::fmt;

use ts_core::SimTime;
use ts_sim::EventRecord;

/// One processed event, flattened for writing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventRow {
    pub time:   SimTime,
    pub event:  &'static str,
    pub agent:  u32,
    /// The passenger's current driver, if any.
    pub driver: Option<u32>,
}

impl From<&EventRecord> for EventRow {
    fn from(r: &EventRecord) -> Self {
        Self {
            time:   r.time,
            event:  r.kind.as_str(),
            agent:  r.agent.0,
            driver: r.driver.map(|d| d.0),
        }
    }
}

/// The colon-delimited log line: `time:EVENT_TYPE:agent:driver`, with
/// `undefined` when there is no driver.
impl fmt::Display for EventRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}:", self.time, self.event, self.agent)?;
        match self.driver {
            Some(d) => write!(f, "{d}"),
            None => f.write_str("undefined"),
        }
    }
}
