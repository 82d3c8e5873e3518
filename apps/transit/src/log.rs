//! Diagnostic logging through a `fern` dispatcher.
//!
//! The level comes from `TRANSIT_LOG_LEVEL`, else the settings file, else
//! `info`.  Warnings and errors go to stderr, everything else to stdout;
//! both are coloured when attached to a terminal.

use std::env;
use std::fmt::{Arguments, Display};
use std::fs::OpenOptions;
use std::io::IsTerminal;
use std::path::Path;
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};
use chrono::Local;
use fern::colors::{Color, ColoredLevelConfig};
use fern::{Dispatch, FormatCallback};
use log::{LevelFilter, Record};

pub const LOG_LEVEL_ENV: &str = "TRANSIT_LOG_LEVEL";
const DEFAULT_LOG_LEVEL: &str = "info";
pub const LOG_FILE_NAME: &str = "transit.log";

/// Resolve the effective level; the environment wins over settings.
pub fn resolve_level(from_env: Option<&str>, from_settings: Option<&str>) -> Result<LevelFilter> {
    let name = from_env.or(from_settings).unwrap_or(DEFAULT_LOG_LEVEL);
    LevelFilter::from_str(name.trim())
        .ok()
        .with_context(|| format!("unknown log level {name:?}"))
}

/// Install the global logger.  With `log_dir`, a plain-text copy of every
/// message at `info` or above is written to `transit.log` there.
pub fn init(level_from_settings: Option<&str>, log_dir: Option<&Path>) -> Result<()> {
    let from_env = env::var(LOG_LEVEL_ENV).ok();
    let level = resolve_level(from_env.as_deref(), level_from_settings)?;

    let colours = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::Green)
        .debug(Color::Blue)
        .trace(Color::Magenta);
    let colour_out = std::io::stdout().is_terminal();
    let colour_err = std::io::stderr().is_terminal();

    let mut dispatch = Dispatch::new()
        .chain(
            Dispatch::new()
                .filter(|meta| meta.level() > LevelFilter::Warn)
                .format(move |out, msg, rec| write_coloured(out, msg, rec, colour_out, &colours))
                .level(level)
                .chain(std::io::stdout()),
        )
        .chain(
            Dispatch::new()
                .format(move |out, msg, rec| write_coloured(out, msg, rec, colour_err, &colours))
                .level(level.min(LevelFilter::Warn))
                .chain(std::io::stderr()),
        );

    if let Some(dir) = log_dir {
        let path = dir.join(LOG_FILE_NAME);
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .with_context(|| format!("opening log file {}", path.display()))?;
        dispatch = dispatch.chain(
            Dispatch::new()
                .format(write_plain)
                .level(level.max(LevelFilter::Info))
                .chain(file),
        );
    }

    dispatch.apply().map_err(|e| anyhow!("installing logger: {e}"))?;
    Ok(())
}

fn write_line<T: Display>(out: FormatCallback, level: T, target: &str, msg: &Arguments) {
    let stamp = Local::now().format("%H:%M:%S");
    out.finish(format_args!("[{stamp} {level} {target}] {msg}"));
}

fn write_plain(out: FormatCallback, msg: &Arguments, rec: &Record) {
    write_line(out, rec.level(), rec.target(), msg);
}

fn write_coloured(
    out:     FormatCallback,
    msg:     &Arguments,
    rec:     &Record,
    colour:  bool,
    colours: &ColoredLevelConfig,
) {
    if colour {
        write_line(out, colours.color(rec.level()), rec.target(), msg);
    } else {
        write_plain(out, msg, rec);
    }
}
