//! `ts-output`: simulation output writers.
//!
//! | Writer             | Files created                         |
//! |--------------------|---------------------------------------|
//! | [`EventLogWriter`] | `events.log` (`time:EVENT:agent:driver`) |
//! | [`CsvWriter`]      | `events.csv`, `run_summary.json`      |
//!
//! Both implement [`OutputWriter`]; a tuple of writers fans out to each.
//! [`SimOutputObserver`] implements `ts_sim::SimObserver` and drives them.
//!
//! # Usage
//!
//! ```rust,ignore
//! use ts_output::{CsvWriter, EventLogWriter, SimOutputObserver};
//!
//! let writers = (EventLogWriter::create(dir)?, CsvWriter::new(dir)?);
//! let mut obs = SimOutputObserver::new(writers);
//! sim.run(&mut obs)?;
//! obs.take_error().map(|e| eprintln!("output error: {e}"));
//! ```

pub mod csv;
pub mod error;
pub mod event_log;
pub mod observer;
pub mod row;
pub mod writer;


pub use csv::CsvWriter;
pub use error::{OutputError, OutputResult};
pub use event_log::{EventLogWriter, EVENT_LOG_FILE};
pub use observer::SimOutputObserver;
pub use row::EventRow;
pub use writer::OutputWriter;
