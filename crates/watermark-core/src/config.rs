//! Configuration management for the watermarking tool

use crate::error::{Result, WatermarkError};
use crate::models::{GeneralConfig, HorizontalAlign, ResampleFilter, VerticalAlign};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable prefix; nested keys are separated by `__`
pub const ENV_PREFIX: &str = "IMAGE_WATERMARK";

/// Main application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub watermark: WatermarkDefaults,
    pub performance: PerformanceConfig,
    pub logging: LoggingConfig,
    pub output: OutputConfig,
}

/// Default watermark appearance used when no explicit value is given
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatermarkDefaults {
    pub opacity: f32,
    pub width_percent: f32,
    pub rotation_degrees: f32,
    pub resample_filter: ResampleFilter,
    pub horizontal_align: HorizontalAlign,
    pub vertical_align: VerticalAlign,
    pub spacing: i32,
    pub grid_spacing_x: i32,
    pub grid_spacing_y: i32,
    pub offset_x: i32,
    pub offset_y: i32,
}

impl Default for WatermarkDefaults {
    fn default() -> Self {
        Self {
            opacity: 0.8,
            width_percent: 20.0,
            rotation_degrees: 0.0,
            resample_filter: ResampleFilter::CatmullRom,
            horizontal_align: HorizontalAlign::Right,
            vertical_align: VerticalAlign::Bottom,
            spacing: 10,
            grid_spacing_x: 50,
            grid_spacing_y: 50,
            offset_x: 0,
            offset_y: 0,
        }
    }
}

/// Performance configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceConfig {
    /// 0 uses one worker per CPU
    pub max_workers: usize,
    /// Fixed seed for random placement, for reproducible output
    pub seed: Option<u64>,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// Also write logs to this file when set
    pub output_path: Option<PathBuf>,
    pub ansi: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            output_path: None,
            ansi: true,
        }
    }
}

/// Output file configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Suffix appended to the file stem of batch outputs
    pub file_suffix: String,
    pub overwrite: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            file_suffix: "_watermarked".to_string(),
            overwrite: false,
        }
    }
}

impl AppConfig {
    /// General watermark settings derived from the defaults and performance sections
    pub fn general(&self) -> GeneralConfig {
        GeneralConfig {
            opacity: self.watermark.opacity,
            watermark_width_percent: self.watermark.width_percent,
            rotation_degrees: self.watermark.rotation_degrees,
            resample_filter: self.watermark.resample_filter,
            max_workers: self.performance.max_workers,
            seed: self.performance.seed,
        }
    }
}

/// Configuration manager
#[derive(Debug)]
pub struct ConfigManager {
    config_path: PathBuf,
    config: AppConfig,
}

impl ConfigManager {
    /// Create a new configuration manager at the default location
    pub fn new() -> Result<Self> {
        let config_path = Self::default_config_path()?;
        Self::with_path(config_path)
    }

    /// Create a configuration manager with a custom path
    pub fn with_path(config_path: PathBuf) -> Result<Self> {
        let config = Self::load_config(&config_path)?;

        Ok(Self {
            config_path,
            config,
        })
    }

    /// Get the current configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Update the configuration
    pub fn update_config(&mut self, config: AppConfig) -> Result<()> {
        self.config = config;
        self.save()
    }

    /// Save the current configuration to disk
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| WatermarkError::ConfigError {
                message: format!("Failed to create config directory: {}", e),
            })?;
        }

        let config_str =
            toml::to_string_pretty(&self.config).map_err(|e| WatermarkError::ConfigError {
                message: format!("Failed to serialize config: {}", e),
            })?;

        std::fs::write(&self.config_path, config_str).map_err(|e| WatermarkError::ConfigError {
            message: format!("Failed to write config file: {}", e),
        })?;

        tracing::info!("Configuration saved to {:?}", self.config_path);
        Ok(())
    }

    /// Get the default configuration file path
    fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| WatermarkError::ConfigError {
                message: "Could not determine config directory".to_string(),
            })?
            .join("image-watermark");

        Ok(config_dir.join("config.toml"))
    }

    /// Layer the optional config file and environment over the defaults
    fn load_config(path: &Path) -> Result<AppConfig> {
        let settings = ::config::Config::builder()
            .add_source(::config::File::from(path).required(false))
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| WatermarkError::ConfigError {
                message: format!("Failed to read config {}: {}", path.display(), e),
            })?;

        let config: AppConfig =
            settings
                .try_deserialize()
                .map_err(|e| WatermarkError::ConfigError {
                    message: format!("Failed to parse config {}: {}", path.display(), e),
                })?;

        if path.exists() {
            tracing::info!("Configuration loaded from {:?}", path);
        } else {
            tracing::info!("Using default configuration");
        }
        Ok(config)
    }
}
