//! `SimOutputObserver<W>`: bridges `SimObserver` to an `OutputWriter`.

use ts_sim::{EventRecord, RunSummary, SimObserver};

use crate::writer::OutputWriter;
use crate::{EventRow, OutputError};

/// Rows buffered before each `write_events` call.
pub const DEFAULT_BATCH: usize = 4096;

/// A [`SimObserver`] that streams event rows to any [`OutputWriter`].
///
/// Rows are buffered and written in batches.  Errors from the writer are
/// stored internally because `SimObserver` methods have no return value;
/// after `sim.run()` returns, check with [`take_error`][Self::take_error].
pub struct SimOutputObserver<W: OutputWriter> {
    writer:     W,
    batch:      Vec<EventRow>,
    batch_size: usize,
    last_error: Option<OutputError>,
}

impl<W: OutputWriter> SimOutputObserver<W> {
    pub fn new(writer: W) -> Self {
        Self::with_batch_size(writer, DEFAULT_BATCH)
    }

    pub fn with_batch_size(writer: W, batch_size: usize) -> Self {
        let batch_size = batch_size.max(1);
        Self {
            writer,
            batch: Vec::with_capacity(batch_size),
            batch_size,
            last_error: None,
        }
    }

    /// Take the stored write error (if any) after `sim.run()` returns.
    ///
    /// Returns `None` if all writes succeeded.
    pub fn take_error(&mut self) -> Option<OutputError> {
        self.last_error.take()
    }

    /// Unwrap the inner writer (e.g. to inspect output after the sim).
    pub fn into_writer(self) -> W {
        self.writer
    }

    fn flush_batch(&mut self) {
        if self.batch.is_empty() {
            return;
        }
        let result = self.writer.write_events(&self.batch);
        self.batch.clear();
        self.store_err(result);
    }

    fn store_err(&mut self, result: crate::OutputResult<()>) {
        if let Err(e) = result {
            // Keep only the first error.
            if self.last_error.is_none() {
                log::error!("output writer failed: {e}");
                self.last_error = Some(e);
            }
        }
    }
}

impl<W: OutputWriter> SimObserver for SimOutputObserver<W> {
    fn on_event(&mut self, record: &EventRecord) {
        self.batch.push(EventRow::from(record));
        if self.batch.len() >= self.batch_size {
            self.flush_batch();
        }
    }

    fn on_sim_end(&mut self, summary: &RunSummary) {
        self.flush_batch();
        let result = self.writer.write_summary(summary);
        self.store_err(result);
        let result = self.writer.finish();
        self.store_err(result);
    }
}
