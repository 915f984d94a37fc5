//! Logging configuration and initialization

use crate::config::LoggingConfig;
use crate::error::{Result, WatermarkError};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Initialize the logging system.
///
/// `RUST_LOG` takes precedence over the configured level. When an output file
/// is configured, the returned guard must be held until shutdown so buffered
/// lines are flushed.
pub fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| WatermarkError::LoggingError {
            message: format!("Invalid log level '{}': {}", config.level, e),
        })?;

    let (file_layer, guard) = match &config.output_path {
        Some(path) => {
            let directory = path.parent().filter(|p| !p.as_os_str().is_empty());
            let file_name = path.file_name().ok_or_else(|| WatermarkError::LoggingError {
                message: format!("Log output path has no file name: {}", path.display()),
            })?;
            let appender = tracing_appender::rolling::never(
                directory.unwrap_or_else(|| std::path::Path::new(".")),
                file_name,
            );
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false).boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    match tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_ansi(config.ansi))
        .with(file_layer)
        .try_init()
    {
        Ok(()) => Ok(guard),
        Err(e) => {
            // A subscriber installed earlier (tests, embedding apps) is fine
            let error_msg = e.to_string();
            if error_msg.contains("a global default trace dispatcher has already been set") {
                Ok(guard)
            } else {
                Err(WatermarkError::LoggingError {
                    message: format!("Failed to initialize logging: {}", e),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_init_is_repeatable() {
        let config = LoggingConfig::default();
        assert!(init_logging(&config).is_ok());
        assert!(init_logging(&config).is_ok());
    }

    #[test]
    fn test_file_output_returns_guard() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config = LoggingConfig {
            output_path: Some(temp_dir.path().join("watermark.log")),
            ..LoggingConfig::default()
        };
        let guard = init_logging(&config).unwrap();
        assert!(guard.is_some());
    }
}
