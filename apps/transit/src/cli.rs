//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "transit", version, about = "Run the city transit simulation")]
pub struct Cli {
    /// JSON map file (blocks, edges, route relations, places).
    #[arg(long)]
    pub maps: PathBuf,

    /// Population CSV, one passenger profile per row.
    #[arg(long)]
    pub population: PathBuf,

    /// Read at most this many profiles.
    #[arg(long)]
    pub size: Option<usize>,

    /// Start of the run as HH:MM.  Defaults to the settings file.
    #[arg(long)]
    pub start: Option<String>,

    /// End of the run as HH:MM.
    #[arg(long)]
    pub until: Option<String>,

    /// Only simulate passengers living here.  Repeatable.
    #[arg(long)]
    pub municipality: Vec<String>,

    /// Buses per route as ROUTE=COUNT.  Repeatable; replaces `[buses]`.
    #[arg(long, value_parser = parse_bus)]
    pub bus: Vec<(String, usize)>,

    #[arg(long)]
    pub seed: Option<u64>,

    /// TOML settings file.
    #[arg(long)]
    pub settings: Option<PathBuf>,

    #[arg(long, default_value = "transit_output")]
    pub output: PathBuf,

    /// Print the run summary as JSON on exit.
    #[arg(long)]
    pub print_summary: bool,
}

/// Parse `ROUTE=COUNT`.
pub fn parse_bus(s: &str) -> Result<(String, usize), String> {
    let (route, count) = s
        .split_once('=')
        .ok_or_else(|| format!("expected ROUTE=COUNT, got {s:?}"))?;
    let route = route.trim();
    if route.is_empty() {
        return Err(format!("empty route name in {s:?}"));
    }
    let count = count
        .trim()
        .parse()
        .map_err(|_| format!("invalid bus count in {s:?}"))?;
    Ok((route.to_string(), count))
}
