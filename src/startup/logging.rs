//! Logging of the `oli` binary
//!
//! Console output always goes to stderr so it never mixes with `cat`
//! output. Setting `OLI_LOG_DIR` also writes a rolling `oli.log` there.
//! Levels come from `OLI_LOG`, then `RUST_LOG`, then the default `warn`.

use std::path::PathBuf;

use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

const LOG_ENV: &str = "OLI_LOG";
const LOG_FILE_NAME: &str = "oli.log";

/// Log rotation policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogRotation {
    Daily,
    Hourly,
    Never,
}

impl From<LogRotation> for Rotation {
    fn from(rotation: LogRotation) -> Self {
        match rotation {
            LogRotation::Daily => Rotation::DAILY,
            LogRotation::Hourly => Rotation::HOURLY,
            LogRotation::Never => Rotation::NEVER,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// File logging is on when set
    pub log_dir: Option<PathBuf>,
    pub level: Level,
    pub rotation: LogRotation,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_dir: None,
            level: Level::WARN,
            rotation: LogRotation::Daily,
        }
    }
}

impl LoggingConfig {
    pub fn from_env() -> Self {
        let log_dir = std::env::var("OLI_LOG_DIR")
            .ok()
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);

        let level = std::env::var("OLI_LOG_LEVEL")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(Level::WARN);

        let rotation = match std::env::var("OLI_LOG_ROTATION").as_deref() {
            Ok("hourly") => LogRotation::Hourly,
            Ok("never") => LogRotation::Never,
            _ => LogRotation::Daily,
        };

        Self {
            log_dir,
            level,
            rotation,
        }
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_env(LOG_ENV)
            .or_else(|_| EnvFilter::try_from_default_env())
            .unwrap_or_else(|_| EnvFilter::new(self.level.to_string()))
    }
}

/// Keeps the non-blocking file writer alive, dropping it flushes the log.
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
}

pub fn init_logging(
    config: &LoggingConfig,
) -> Result<LoggingGuard, Box<dyn std::error::Error + Send + Sync>> {
    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_filter(config.filter());
    layers.push(Box::new(console_layer));

    let mut file_guard = None;
    if let Some(dir) = &config.log_dir {
        std::fs::create_dir_all(dir)?;

        let appender = RollingFileAppender::new(config.rotation.into(), dir, LOG_FILE_NAME);
        let (nb, guard) = tracing_appender::non_blocking(appender);
        file_guard = Some(guard);

        let file_layer = fmt::layer()
            .with_writer(nb)
            .with_target(true)
            .with_thread_names(true)
            .with_ansi(false)
            .with_filter(config.filter());
        layers.push(Box::new(file_layer));
    }

    Registry::default()
        .with(layers)
        .try_init()
        .map_err(|e| format!("failed to initialize logging: {e}"))?;

    if let Some(dir) = &config.log_dir {
        tracing::debug!(log_dir = %dir.display(), "file logging initialized");
    }

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_config_default() {
        let config = LoggingConfig::default();
        assert!(config.log_dir.is_none());
        assert_eq!(config.level, Level::WARN);
        assert_eq!(config.rotation, LogRotation::Daily);
    }

    #[test]
    fn test_log_rotation_conversion() {
        assert!(matches!(Rotation::from(LogRotation::Daily), Rotation::DAILY));
        assert!(matches!(Rotation::from(LogRotation::Hourly), Rotation::HOURLY));
        assert!(matches!(Rotation::from(LogRotation::Never), Rotation::NEVER));
    }
}
