//! The `OutputWriter` trait implemented by all backend writers.

use ts_sim::RunSummary;

use crate::{EventRow, OutputResult};

/// Trait implemented by the event-log and CSV writers.
///
/// All methods are infallible from the observer's perspective: errors are
/// stored internally and retrieved with
/// [`SimOutputObserver::take_error`][crate::SimOutputObserver::take_error].
pub trait OutputWriter {
    /// Write a batch of event rows, in processing order.
    fn write_events(&mut self, rows: &[EventRow]) -> OutputResult<()>;

    /// Write the end-of-run totals.  The default ignores them.
    fn write_summary(&mut self, _summary: &RunSummary) -> OutputResult<()> {
        Ok(())
    }

    /// Flush and close all underlying file handles.
    ///
    /// Idempotent: safe to call more than once.
    fn finish(&mut self) -> OutputResult<()>;
}

/// Fan out to two writers.  Nest pairs for more.
impl<A: OutputWriter, B: OutputWriter> OutputWriter for (A, B) {
    fn write_events(&mut self, rows: &[EventRow]) -> OutputResult<()> {
        self.0.write_events(rows)?;
        self.1.write_events(rows)
    }

    fn write_summary(&mut self, summary: &RunSummary) -> OutputResult<()> {
        self.0.write_summary(summary)?;
        self.1.write_summary(summary)
    }

    fn finish(&mut self) -> OutputResult<()> {
        self.0.finish()?;
        self.1.finish()
    }
}
