//! Error types for the watermarking library

use std::path::PathBuf;

/// Main error type for watermark operations
#[derive(Debug, thiserror::Error)]
pub enum WatermarkError {
    #[error("Invalid configuration for `{field}`: {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    #[error("Failed to load image {path}: {cause}")]
    LoadFailure { path: PathBuf, cause: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Logging initialization failed: {message}")]
    LoggingError { message: String },

    #[error("Worker pool error: {message}")]
    ThreadPool { message: String },

    #[error("Background task failed: {message}")]
    TaskJoin { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl WatermarkError {
    /// Build an `InvalidConfig` error for the given field
    pub fn invalid_config(field: &'static str, reason: impl Into<String>) -> Self {
        WatermarkError::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }

    /// Get the error type as a string for categorization
    pub fn error_type(&self) -> &'static str {
        match self {
            WatermarkError::InvalidConfig { .. } => "invalid_config",
            WatermarkError::LoadFailure { .. } => "load_failure",
            WatermarkError::Io(_) => "io_error",
            WatermarkError::ConfigError { .. } => "config_error",
            WatermarkError::LoggingError { .. } => "logging_error",
            WatermarkError::ThreadPool { .. } => "thread_pool_error",
            WatermarkError::TaskJoin { .. } => "task_join_error",
            WatermarkError::Serialization(_) => "serialization_error",
        }
    }

    /// Name of the offending configuration field, if this is a validation failure
    pub fn field(&self) -> Option<&'static str> {
        match self {
            WatermarkError::InvalidConfig { field, .. } => Some(field),
            _ => None,
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, WatermarkError>;
