//! Population CSV loader.
//!
//! # CSV format
//!
//! One passenger profile per row.  Only `municipality` is mandatory; other
//! columns may be omitted, and the text columns may be left empty.
//!
//! ```csv
//! employment_status,work_schedule,school_schedule,max_waiting_time,walk_speed,municipality,workplace_location,student_type,bachelor_type,money
//! occupied,07:30-16:00,,20,4.5,playa,cerro,,,1500
//! student,,08:00-12:30,15,5,cerro,cerro,bachelor,medicine,300
//! unemployed,,,30,4,playa,,,,0
//! ```
//!
//! | `employment_status` | Schedule used                                  |
//! |---------------------|------------------------------------------------|
//! | `occupied`          | `work_schedule`                                |
//! | `student`           | `school_schedule`                              |
//! | anything else       | a random window drawn by [`TimeWindow::random_after`] |

use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use ts_core::{SimRng, SimTime};

use crate::plan::PlanType;
use crate::{EventError, EventResult};

// ── Employment ────────────────────────────────────────────────────────────────

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Employment {
    Occupied,
    Student,
    Other,
}

impl Employment {
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "occupied" => Employment::Occupied,
            "student" => Employment::Student,
            _ => Employment::Other,
        }
    }

    /// Purpose of the first trip of the day.
    pub fn outbound_plan(self) -> PlanType {
        match self {
            Employment::Occupied | Employment::Student => PlanType::GoToWork,
            Employment::Other => PlanType::RandomTravel,
        }
    }
}

// ── PassengerProfile ──────────────────────────────────────────────────────────

/// One row of the population file.  Opaque to the engine beyond the
/// schedule, patience, walking speed and the two municipalities.
#[derive(Clone, Debug, Deserialize)]
pub struct PassengerProfile {
    #[serde(default)]
    pub employment_status:  String,
    #[serde(default)]
    pub work_schedule:      Option<String>,
    #[serde(default)]
    pub school_schedule:    Option<String>,
    /// Minutes a passenger waits at a stop before looking for alternatives.
    #[serde(default = "default_max_waiting_time")]
    pub max_waiting_time:   f64,
    /// km/h.
    #[serde(default = "default_walk_speed")]
    pub walk_speed:         f64,
    pub municipality:       String,
    #[serde(default)]
    pub workplace_location: Option<String>,
    #[serde(default)]
    pub student_type:       Option<String>,
    #[serde(default)]
    pub bachelor_type:      Option<String>,
    #[serde(default)]
    pub money:              Option<f64>,
}

fn default_max_waiting_time() -> f64 {
    30.0
}

fn default_walk_speed() -> f64 {
    5.0
}

impl PassengerProfile {
    pub fn employment(&self) -> Employment {
        Employment::parse(&self.employment_status)
    }

    /// The day's outbound/return window.
    pub fn time_window(&self, now: SimTime, rng: &mut SimRng) -> EventResult<TimeWindow> {
        let fixed = match self.employment() {
            Employment::Occupied => &self.work_schedule,
            Employment::Student => &self.school_schedule,
            Employment::Other => return Ok(TimeWindow::random_after(now, rng)),
        };
        match fixed.as_deref() {
            Some(s) => TimeWindow::parse(s),
            None => Err(EventError::Schedule(String::new())),
        }
    }
}

// ── TimeWindow ────────────────────────────────────────────────────────────────

/// `start` is the outbound trip, `end` the trip home.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct TimeWindow {
    pub start: SimTime,
    pub end:   SimTime,
}

impl TimeWindow {
    /// Parse `HH:MM-HH:MM`.
    pub fn parse(s: &str) -> EventResult<TimeWindow> {
        let bad = || EventError::Schedule(s.to_string());
        let (a, b) = s.split_once('-').ok_or_else(bad)?;
        let start = SimTime::parse_hhmm(a).map_err(|_| bad())?;
        let end = SimTime::parse_hhmm(b).map_err(|_| bad())?;
        Ok(TimeWindow { start, end })
    }

    /// A random window for passengers without a fixed schedule: start hour
    /// in `[ceil(now / 60), 22]`, end hour in `[start + 1, 23]`, minutes
    /// uniform.
    pub fn random_after(now: SimTime, rng: &mut SimRng) -> TimeWindow {
        let first = ((now.minutes() / 60.0).ceil().max(0.0) as u32).min(22);
        let start_h = rng.gen_range(first..=22);
        let start_m = rng.gen_range(0..=59);
        let end_h = rng.gen_range(start_h + 1..=23);
        let end_m = rng.gen_range(0..=59);
        TimeWindow {
            start: SimTime::from_hm(start_h, start_m),
            end:   SimTime::from_hm(end_h, end_m),
        }
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Load at most `limit` profiles (all when `None`) from a CSV file.
pub fn load_population_csv(path: &Path, limit: Option<usize>) -> EventResult<Vec<PassengerProfile>> {
    let file = std::fs::File::open(path)?;
    load_population_reader(file, limit)
}

/// Like [`load_population_csv`] but accepts any `Read` source.
pub fn load_population_reader<R: Read>(reader: R, limit: Option<usize>) -> EventResult<Vec<PassengerProfile>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut out = Vec::new();

    for (row, result) in csv_reader.deserialize::<PassengerProfile>().enumerate() {
        if limit.is_some_and(|n| out.len() >= n) {
            break;
        }
        let profile = result.map_err(|e| EventError::Parse(format!("row {}: {e}", row + 1)))?;
        out.push(profile);
    }

    log::info!("loaded {} passenger profiles", out.len());
    Ok(out)
}
