//! The TOML settings file.
//!
//! ```toml
//! log_level   = "debug"
//! log_to_file = true
//!
//! [simulation]          # ts_core::SimConfig
//! seed           = 7
//! horizon_minute = 1200
//!
//! [search]              # ts_graph::SearchParams
//! corridor_tolerance_km = 5
//!
//! [buses]               # route name = number of buses
//! "12"  = 3
//! "P7"  = 1
//! ```
//!
//! Every field is optional.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use ts_core::SimConfig;
use ts_graph::SearchParams;

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub log_level:   Option<String>,
    /// Also write `transit.log` into the output directory.
    pub log_to_file: bool,
    pub simulation:  SimConfig,
    pub search:      SearchParams,
    pub buses:       BTreeMap<String, usize>,
}

impl Settings {
    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Read `path`, or fall back to defaults when none is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading settings file {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("parsing settings file {}", path.display()))
    }

    /// The `[buses]` table as `(route, count)` pairs, sorted by route.
    pub fn bus_distributions(&self) -> Vec<(String, usize)> {
        self.buses.iter().map(|(k, v)| (k.clone(), *v)).collect()
    }
}
