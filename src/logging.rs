// File: ./src/logging.rs
// File logger. The TUI owns the terminal, so nothing goes to stdout.
use crate::context::AppContext;
use anyhow::{Context, Result};
use log::LevelFilter;
use simplelog::{ConfigBuilder, WriteLogger};
use std::fs::OpenOptions;
use std::str::FromStr;

/// Parses a level name ("debug", "WARN", ...). Unknown names fall back to `Info`.
pub fn parse_level(raw: &str) -> LevelFilter {
    LevelFilter::from_str(raw.trim()).unwrap_or(LevelFilter::Info)
}

/// Appends log records to `tablero.log` in the data directory.
pub fn init(ctx: &dyn AppContext, level: &str) -> Result<()> {
    let path = ctx.get_log_file_path()?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open log file {:?}", path))?;

    let config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .add_filter_ignore_str("rustls")
        .add_filter_ignore_str("hyper_util")
        .build();

    WriteLogger::init(parse_level(level), config, file).context("Logger already installed")?;
    log::info!("tablero {} starting", env!("CARGO_PKG_VERSION"));
    Ok(())
}
