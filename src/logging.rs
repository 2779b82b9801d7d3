//! Operational log: appended to a file and echoed to stderr

use crate::structs::Result;
use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// Timestamp layout of log file lines, e.g. `16-10-26 14:03:55`
pub const TIME_FORMAT: &str = "%d-%m-%y %H:%M:%S";

/// Open `path` for appending, creating it if needed
///
/// # Errors
/// Returns error if the file cannot be opened
pub fn open_log(path: &Path) -> Result<File> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    Ok(file)
}

/// Install the global subscriber.
///
/// `RUST_LOG` wins over `debug`. Subsequent calls are no-ops.
///
/// # Errors
/// Returns error if the log file cannot be opened
pub fn init_logging(log_file: &Path, debug: bool) -> Result<()> {
    let file = open_log(log_file)?;

    let level = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_target(true)
        .with_timer(ChronoLocal::new(TIME_FORMAT.to_string()))
        .with_writer(Mutex::new(file));

    let console_layer = fmt::layer()
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .with_filter(LevelFilter::INFO);

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer)
        .try_init();

    Ok(())
}
