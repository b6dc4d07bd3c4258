//! Tracing subscriber setup.

use std::path::PathBuf;

use thiserror::Error;
use time::format_description::well_known::Rfc3339;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::LocalTime;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::EngineConfig;

/// File name prefix for rolling log files.
pub const LOG_FILE_PREFIX: &str = "texlayer.log";

/// Errors raised while installing the subscriber.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// The level is not a valid filter directive.
    #[error("invalid log filter '{filter}': {reason}")]
    Filter { filter: String, reason: String },

    /// A global subscriber is already installed.
    #[error("failed to install subscriber: {0}")]
    Install(String),
}

/// Where and how much to log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Level or filter directive, overridden by `RUST_LOG` when set.
    pub level: String,
    /// Directory for daily rolling log files.
    pub directory: Option<PathBuf>,
    /// Colored stderr output.
    pub ansi: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: crate::config::DEFAULT_LOG_LEVEL.to_string(),
            directory: None,
            ansi: true,
        }
    }
}

impl From<&EngineConfig> for LoggingConfig {
    fn from(config: &EngineConfig) -> Self {
        Self {
            level: config.log_level.clone(),
            directory: config.log_directory.clone(),
            ..Self::default()
        }
    }
}

/// Build the filter: `RUST_LOG` wins, then the configured level.
pub fn build_filter(level: &str) -> Result<EnvFilter, LoggingError> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .map_err(|e| LoggingError::Filter {
            filter: level.to_string(),
            reason: e.to_string(),
        })
}

/// Install the global subscriber.
///
/// Logs go to stderr and, when a directory is configured, to a daily
/// rolling file written by a background thread. Keep the returned guard
/// alive for as long as file logging should run; dropping it flushes and
/// stops the writer.
pub fn init_logging(config: LoggingConfig) -> Result<Option<WorkerGuard>, LoggingError> {
    let filter = build_filter(&config.level)?;
    let console = fmt::layer()
        .with_timer(LocalTime::new(Rfc3339))
        .with_ansi(config.ansi)
        .with_writer(std::io::stderr);

    let Some(directory) = config.directory else {
        tracing_subscriber::registry()
            .with(filter)
            .with(console)
            .try_init()
            .map_err(|e| LoggingError::Install(e.to_string()))?;
        return Ok(None);
    };

    let appender = tracing_appender::rolling::daily(&directory, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let file = fmt::layer()
        .with_timer(LocalTime::new(Rfc3339))
        .with_ansi(false)
        .with_writer(writer);

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .try_init()
        .map_err(|e| LoggingError::Install(e.to_string()))?;

    tracing::debug!(directory = %directory.display(), "File logging enabled");
    Ok(Some(guard))
}
