//! Simulation time model.
//!
//! # Design
//!
//! Time is a continuous number of minutes since midnight of the simulated
//! day, held in `SimTime(f64)`.  Events fire at arbitrary fractional
//! minutes (dwell times are sampled from continuous ranges), so there is no
//! integer tick.  `SimTime` implements a total order through
//! [`f64::total_cmp`] so it can key a `BinaryHeap`.
//!
//! `SimClock` tracks the time of the most recently processed event and the
//! horizon at which the run stops (1440 minutes = one day by default).

use std::cmp::Ordering;
use std::fmt;

use crate::{CoreError, CoreResult};

/// Minutes in one simulated day.
pub const MINUTES_PER_DAY: f64 = 1440.0;

// ── SimTime ───────────────────────────────────────────────────────────────────

/// An absolute simulated time in minutes since midnight.
#[derive(Copy, Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimTime(pub f64);

impl SimTime {
    pub const ZERO: SimTime = SimTime(0.0);

    /// Build from an hour/minute pair (`from_hm(7, 30)` = 450 minutes).
    #[inline]
    pub fn from_hm(hours: u32, minutes: u32) -> SimTime {
        SimTime(hours as f64 * 60.0 + minutes as f64)
    }

    /// Parse a `HH:MM` wall-clock string.
    pub fn parse_hhmm(s: &str) -> CoreResult<SimTime> {
        let bad = || CoreError::Parse(format!("invalid time {s:?}: expected \"HH:MM\""));
        let (h, m) = s.trim().split_once(':').ok_or_else(bad)?;
        let h: u32 = h.trim().parse().map_err(|_| bad())?;
        let m: u32 = m.trim().parse().map_err(|_| bad())?;
        if h > 23 || m > 59 {
            return Err(bad());
        }
        Ok(SimTime::from_hm(h, m))
    }

    /// Minutes as a raw `f64`.
    #[inline]
    pub fn minutes(self) -> f64 {
        self.0
    }

    /// Minutes elapsed from `earlier` to `self` (may be negative).
    #[inline]
    pub fn since(self, earlier: SimTime) -> f64 {
        self.0 - earlier.0
    }
}

impl PartialEq for SimTime {
    fn eq(&self, other: &Self) -> bool {
        self.0.total_cmp(&other.0) == Ordering::Equal
    }
}

impl Eq for SimTime {}

impl PartialOrd for SimTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SimTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl std::ops::Add<f64> for SimTime {
    type Output = SimTime;
    #[inline]
    fn add(self, rhs: f64) -> SimTime {
        SimTime(self.0 + rhs)
    }
}

impl std::ops::AddAssign<f64> for SimTime {
    #[inline]
    fn add_assign(&mut self, rhs: f64) {
        self.0 += rhs;
    }
}

impl std::ops::Sub<f64> for SimTime {
    type Output = SimTime;
    #[inline]
    fn sub(self, rhs: f64) -> SimTime {
        SimTime(self.0 - rhs)
    }
}

impl std::ops::Sub for SimTime {
    type Output = f64;
    #[inline]
    fn sub(self, rhs: SimTime) -> f64 {
        self.0 - rhs.0
    }
}

impl fmt::Display for SimTime {
    /// Renders the raw minute count with two decimals (`"452.30"`), the form
    /// used in event logs.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

// ── SimClock ──────────────────────────────────────────────────────────────────

/// Current simulated time plus the horizon at which the run stops.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimClock {
    pub now:     SimTime,
    pub horizon: SimTime,
}

impl SimClock {
    pub fn new(start: SimTime, horizon: SimTime) -> Self {
        Self { now: start, horizon }
    }

    /// Move the clock forward to `t`.  Never moves backwards: an event
    /// scheduled in the past executes at the current time.
    #[inline]
    pub fn advance_to(&mut self, t: SimTime) {
        if t > self.now {
            self.now = t;
        }
    }

    /// `true` once `t` lies beyond the horizon.
    #[inline]
    pub fn is_past_horizon(&self, t: SimTime) -> bool {
        t > self.horizon
    }

    /// `(hour, minute)` of the current time, wrapped to one day.
    pub fn hm(&self) -> (u32, u32) {
        let total = self.now.0.max(0.0) as u64 % MINUTES_PER_DAY as u64;
        ((total / 60) as u32, (total % 60) as u32)
    }
}

impl fmt::Display for SimClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (h, m) = self.hm();
        write!(f, "t={} ({:02}:{:02})", self.now, h, m)
    }
}

// ── SimConfig ─────────────────────────────────────────────────────────────────

/// Top-level simulation configuration.
///
/// Typically loaded from a TOML file by the application crate and passed to
/// the simulation builder.  Every field has a default so a settings file may
/// name only what it changes.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SimConfig {
    /// Minute of the day at which the run starts.
    pub start_minute: f64,

    /// The run stops once the next event lies beyond this minute.
    pub horizon_minute: f64,

    /// Master RNG seed.  The same seed always produces identical results.
    pub seed: u64,

    /// Expansion radius (km) used when building the simplified graph.
    pub simplify_radius_km: f64,

    /// How far (km) a passenger is willing to walk to or from a stop.
    pub walk_radius_km: f64,

    /// Minutes between consecutive departures of buses on the same route.
    pub time_between_departures: f64,

    /// Minutes a driver waits at a stop for boarding passengers.
    pub driver_wait_time: f64,

    /// Fuel level at or below which a driver goes refuelling.
    pub min_fuel_level: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            start_minute:            0.0,
            horizon_minute:          MINUTES_PER_DAY,
            seed:                    42,
            simplify_radius_km:      2.0,
            walk_radius_km:          0.5,
            time_between_departures: 30.0,
            driver_wait_time:        5.0,
            min_fuel_level:          20.0,
        }
    }
}

impl SimConfig {
    #[inline]
    pub fn start(&self) -> SimTime {
        SimTime(self.start_minute)
    }

    #[inline]
    pub fn horizon(&self) -> SimTime {
        SimTime(self.horizon_minute)
    }

    /// Construct a `SimClock` pre-configured for this run.
    pub fn make_clock(&self) -> SimClock {
        SimClock::new(self.start(), self.horizon())
    }

    /// Reject configurations the engine cannot run.
    pub fn validate(&self) -> CoreResult<()> {
        if self.horizon_minute < self.start_minute {
            return Err(CoreError::Config(format!(
                "horizon {} precedes start {}",
                self.horizon_minute, self.start_minute
            )));
        }
        if self.walk_radius_km < 0.0 || self.simplify_radius_km < 0.0 {
            return Err(CoreError::Config("radii must be non-negative".into()));
        }
        if self.driver_wait_time < 0.0 || self.time_between_departures < 0.0 {
            return Err(CoreError::Config("durations must be non-negative".into()));
        }
        Ok(())
    }
}
