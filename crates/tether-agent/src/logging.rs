//! Logging bootstrap.
//!
//! Console output is split by severity (errors to stdout, everything else
//! to stderr) and a JSON copy of every record goes to a rolling file at
//! `<log.dir>/bot.log`. The file rolls daily and keeps the last
//! [`MAX_LOG_FILES`] files.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// Rotated log files retained alongside the active one.
const MAX_LOG_FILES: usize = 5;

/// Initialize the process-wide subscriber. Call once at startup; the
/// returned guard must live as long as the process so the file writer
/// flushes on shutdown.
pub fn init(log_dir: &Path) -> Result<WorkerGuard> {
    let file = tracing_appender::rolling::Builder::new()
        .rotation(tracing_appender::rolling::Rotation::DAILY)
        .filename_prefix("bot.log")
        .max_log_files(MAX_LOG_FILES)
        .build(log_dir)
        .context("failed to create rolling log file")?;
    let (file_writer, guard) = tracing_appender::non_blocking(file);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let stdout_layer = fmt::layer()
        .compact()
        .with_writer(std::io::stdout)
        .with_filter(filter_fn(|meta| *meta.level() == Level::ERROR));
    let stderr_layer = fmt::layer()
        .compact()
        .with_writer(std::io::stderr)
        .with_filter(filter_fn(|meta| *meta.level() != Level::ERROR));
    let file_layer = fmt::layer().json().with_writer(file_writer);

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("logging already initialized")?;

    Ok(guard)
}
