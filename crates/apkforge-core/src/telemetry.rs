//! Tracing initialisation for the apkforge binary.
//!
//! Call [`init_tracing`] once at program start. Console output goes through
//! an `EnvFilter`; when a run log is supplied, two extra layers write to it:
//! one with every event, one with error-level events only.
//!
//! Safe to call more than once; subsequent calls are silently ignored.

use chrono::Local;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// Timestamp format used in log file names.
pub const LOG_TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// `<log_dir>/app_<timestamp>.log` for the current local time.
pub fn run_log_path(log_dir: &Path) -> PathBuf {
    let timestamp = Local::now().format(LOG_TIMESTAMP_FORMAT);
    log_dir.join(format!("app_{timestamp}.log"))
}

/// Create the log directory if needed and open this run's log in append mode.
pub fn open_run_log(log_dir: &Path) -> std::io::Result<(PathBuf, File)> {
    std::fs::create_dir_all(log_dir)?;
    let path = run_log_path(log_dir);
    let file = OpenOptions::new().create(true).append(true).open(&path)?;
    Ok((path, file))
}

/// Initialise the global tracing subscriber.
///
/// * `json`: emit newline-delimited JSON on the console.
/// * `level`: default verbosity when `RUST_LOG` is not set.
/// * `log_file`: run log receiving all events plus a second, error-only copy.
pub fn init_tracing(json: bool, level: Level, log_file: Option<File>) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    let log_file = log_file.map(Arc::new);
    let file_all = log_file.clone().map(|file| {
        fmt::layer()
            .with_ansi(false)
            .with_target(false)
            .with_writer(file)
    });
    let file_errors = log_file.map(|file| {
        fmt::layer()
            .with_ansi(false)
            .with_target(false)
            .with_writer(file)
            .with_filter(LevelFilter::ERROR)
    });

    let console = if json {
        fmt::layer().with_target(false).json().boxed()
    } else {
        fmt::layer().with_target(false).boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console)
        .with(file_all)
        .with(file_errors)
        .try_init()
        .ok();
}
