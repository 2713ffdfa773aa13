//! Tracing subscriber setup.
//!
//! The terminal is in raw mode while the app runs, so records go to a file.
//! `RUST_LOG` refines the filter; without it the level is `info`, or `debug`
//! with `--verbose`.

use std::fs::{self, File, OpenOptions};
use std::path::Path;
use std::sync::Arc;

use tracing::level_filters::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Build a subscriber writing to `log_file`.
pub fn build_subscriber(log_file: File, verbose: bool) -> impl tracing::Subscriber + Send + Sync {
    let default_level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let env_filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();

    let fmt_layer = fmt::layer()
        .with_writer(Arc::new(log_file))
        .with_ansi(false)
        .with_target(false);

    tracing_subscriber::registry().with(fmt_layer).with(env_filter)
}

/// Install the global subscriber, appending to `log_file_path`.
///
/// Returns `false` when the file cannot be opened; the app then runs
/// without logging.
pub fn init(log_file_path: &Path, verbose: bool) -> bool {
    if let Some(parent) = log_file_path.parent() {
        if fs::create_dir_all(parent).is_err() {
            return false;
        }
    }
    let Ok(file) = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file_path)
    else {
        return false;
    };
    build_subscriber(file, verbose).try_init().is_ok()
}
