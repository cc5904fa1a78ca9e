//! Tracing setup: human-readable stderr output plus an optional dated file
//! that only receives `ERROR` events.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{Local, NaiveDate};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};


/// Stderr filter used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// File name for `date`'s error log, e.g. `19-Oct-2026.log`.
pub fn log_file_name(date: NaiveDate) -> String {
    date.format("%d-%b-%Y.log").to_string()
}

/// Today's error log path under `dir`.
pub fn log_file_path(dir: &Path) -> PathBuf {
    dir.join(log_file_name(Local::now().date_naive()))
}

fn open_log_file(path: &Path) -> io::Result<fs::File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Installs the global subscriber. Returns the error log path, if any.
///
/// Fails if the log file cannot be opened or a subscriber is already set.
pub fn init(log_dir: Option<&Path>) -> io::Result<Option<PathBuf>> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let stderr_layer = fmt::layer()
        .with_writer(io::stderr)
        .with_filter(env_filter);

    let (file_layer, path) = match log_dir {
        Some(dir) => {
            let path = log_file_path(dir);
            let file = open_log_file(&path)?;
            let layer = fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_writer(Mutex::new(file))
                .with_filter(LevelFilter::ERROR);
            (Some(layer), Some(path))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(io::Error::other)?;

    Ok(path)
}
