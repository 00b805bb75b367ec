//! Logging system configuration and initialization
//!
//! Console output with env-filter level control, plus optional rolling
//! file output. Non-blocking writer guards are kept alive for the process
//! lifetime in a global registry.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Result;
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when RUST_LOG is unset ("info", "debug", ...).
    pub level: String,
    /// Also write a daily-rolling log file.
    pub file_output: bool,
    /// Log file directory; defaults to `logs/` next to the executable.
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file_output: false,
            directory: None,
        }
    }
}

// Keeps non-blocking log writers alive after init returns.
lazy_static! {
    static ref LOG_GUARDS: Mutex<Vec<tracing_appender::non_blocking::WorkerGuard>> =
        Mutex::new(Vec::new());
}

/// Returns the log directory next to the executable.
pub fn default_log_directory() -> PathBuf {
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_default());

    exe_dir.join("logs")
}

/// Initializes the global tracing subscriber.
///
/// # Errors
/// Fails when a subscriber is already installed or the log directory
/// cannot be created.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer());

    if config.file_output {
        let directory = config
            .directory
            .clone()
            .unwrap_or_else(default_log_directory);
        std::fs::create_dir_all(&directory)?;

        let appender = tracing_appender::rolling::daily(directory, "shopscout.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        if let Ok(mut guards) = LOG_GUARDS.lock() {
            guards.push(guard);
        }

        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(writer),
            )
            .try_init()?;
    } else {
        registry.try_init()?;
    }

    Ok(())
}
