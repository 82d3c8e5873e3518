//! CSV output backend.
//!
//! Creates two files in the configured output directory:
//! - `events.csv`
//! - `run_summary.json` (written when the run ends)

use std::fs::File;
use std::path::{Path, PathBuf};

use csv::Writer;

use ts_sim::RunSummary;

use crate::writer::OutputWriter;
use crate::{EventRow, OutputResult};

/// Writes the event table and the run summary.
pub struct CsvWriter {
    events:   Writer<File>,
    summary:  PathBuf,
    finished: bool,
}

impl CsvWriter {
    /// Open (or create) `events.csv` in `dir` and write the header row.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        let mut events = Writer::from_path(dir.join("events.csv"))?;
        events.write_record(["time", "event", "agent", "driver"])?;
        Ok(Self {
            events,
            summary: dir.join("run_summary.json"),
            finished: false,
        })
    }
}

impl OutputWriter for CsvWriter {
    fn write_events(&mut self, rows: &[EventRow]) -> OutputResult<()> {
        for row in rows {
            self.events.write_record(&[
                row.time.to_string(),
                row.event.to_string(),
                row.agent.to_string(),
                row.driver.map(|d| d.to_string()).unwrap_or_default(),
            ])?;
        }
        Ok(())
    }

    fn write_summary(&mut self, summary: &RunSummary) -> OutputResult<()> {
        let file = File::create(&self.summary)?;
        serde_json::to_writer_pretty(file, summary)?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.events.flush()?;
        Ok(())
    }
}
