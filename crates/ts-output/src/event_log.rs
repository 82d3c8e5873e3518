//! Line-oriented event log, one `time:EVENT_TYPE:agent:driver` line per
//! processed event.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::writer::OutputWriter;
use crate::{EventRow, OutputResult};

pub const EVENT_LOG_FILE: &str = "events.log";

/// Writes the event log to any byte sink.
pub struct EventLogWriter<W: Write> {
    out:      W,
    finished: bool,
}

impl EventLogWriter<BufWriter<File>> {
    /// Create (or truncate) `events.log` in `dir`.
    pub fn create(dir: &Path) -> OutputResult<Self> {
        let file = File::create(dir.join(EVENT_LOG_FILE))?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> EventLogWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out, finished: false }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> OutputWriter for EventLogWriter<W> {
    fn write_events(&mut self, rows: &[EventRow]) -> OutputResult<()> {
        for row in rows {
            writeln!(self.out, "{row}")?;
        }
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.out.flush()?;
        Ok(())
    }
}
