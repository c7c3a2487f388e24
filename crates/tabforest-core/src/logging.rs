//! Logging configuration using tracing

use std::path::{Path, PathBuf};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::error::{Error, Result};

/// Environment variable holding the log filter
pub const LOG_ENV: &str = "TABFOREST_LOG";

const LOG_FILE_PREFIX: &str = "tabforest.log";
const DEFAULT_FILTER: &str = "tabforest=info,warn";

/// Install the global subscriber, logging to the per-user data directory
/// (`~/.local/share/tabforest/logs/` on Linux).
///
/// ```bash
/// TABFOREST_LOG=tabforest_app=trace cargo test
/// ```
pub fn init() -> Result<()> {
    init_in(&log_directory())
}

/// Install the global subscriber, logging to daily files under `log_dir`.
///
/// Fails if a global subscriber is already installed.
pub fn init_in(log_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(log_dir)?;
    let appender = RollingFileAppender::new(Rotation::DAILY, log_dir, LOG_FILE_PREFIX);

    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let layer = fmt::layer()
        .with_writer(appender)
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true)
        .with_timer(fmt::time::ChronoLocal::new("%Y-%m-%d %H:%M:%S%.3f".to_string()));

    tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init()
        .map_err(|e| Error::config(format!("Failed to install log subscriber: {}", e)))?;

    tracing::info!("Logging to {}", log_dir.display());
    Ok(())
}

/// Directory `init` logs into
pub fn log_directory() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tabforest")
        .join("logs")
}
