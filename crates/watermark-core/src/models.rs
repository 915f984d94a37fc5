//! Core data models for watermark operations

use crate::error::{Result, WatermarkError};
use image::imageops::FilterType;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A pixel coordinate on the canvas. May lie outside the canvas bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Width and height of an image buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn of(image: &image::RgbaImage) -> Self {
        Self::new(image.width(), image.height())
    }
}

/// Horizontal placement of a single watermark
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum HorizontalAlign {
    Left,
    #[default]
    Middle,
    Right,
    Random,
}

/// Vertical placement of a single watermark
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum VerticalAlign {
    Top,
    #[default]
    Middle,
    Bottom,
    Random,
}

impl HorizontalAlign {
    pub fn as_str(&self) -> &'static str {
        match self {
            HorizontalAlign::Left => "left",
            HorizontalAlign::Middle => "middle",
            HorizontalAlign::Right => "right",
            HorizontalAlign::Random => "random",
        }
    }
}

impl VerticalAlign {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerticalAlign::Top => "top",
            VerticalAlign::Middle => "middle",
            VerticalAlign::Bottom => "bottom",
            VerticalAlign::Random => "random",
        }
    }
}

// Unrecognized alignment names resolve to Middle instead of failing.
impl From<&str> for HorizontalAlign {
    fn from(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "left" => HorizontalAlign::Left,
            "right" => HorizontalAlign::Right,
            "rand" | "random" => HorizontalAlign::Random,
            _ => HorizontalAlign::Middle,
        }
    }
}

impl From<&str> for VerticalAlign {
    fn from(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "top" => VerticalAlign::Top,
            "bottom" => VerticalAlign::Bottom,
            "rand" | "random" => VerticalAlign::Random,
            _ => VerticalAlign::Middle,
        }
    }
}

impl From<String> for HorizontalAlign {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<String> for VerticalAlign {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<HorizontalAlign> for String {
    fn from(value: HorizontalAlign) -> Self {
        value.as_str().to_string()
    }
}

impl From<VerticalAlign> for String {
    fn from(value: VerticalAlign) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for HorizontalAlign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for VerticalAlign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resampling filter used when resizing the watermark
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResampleFilter {
    Nearest,
    Triangle,
    #[default]
    CatmullRom,
    Gaussian,
    Lanczos3,
}

impl ResampleFilter {
    pub fn filter_type(&self) -> FilterType {
        match self {
            ResampleFilter::Nearest => FilterType::Nearest,
            ResampleFilter::Triangle => FilterType::Triangle,
            ResampleFilter::CatmullRom => FilterType::CatmullRom,
            ResampleFilter::Gaussian => FilterType::Gaussian,
            ResampleFilter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

impl FromStr for ResampleFilter {
    type Err = WatermarkError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "nearest" => Ok(ResampleFilter::Nearest),
            "triangle" | "linear" | "bilinear" => Ok(ResampleFilter::Triangle),
            "catmull-rom" | "catmullrom" | "bicubic" => Ok(ResampleFilter::CatmullRom),
            "gaussian" => Ok(ResampleFilter::Gaussian),
            "lanczos" | "lanczos3" => Ok(ResampleFilter::Lanczos3),
            other => Err(WatermarkError::invalid_config(
                "resample_filter",
                format!("unknown resample filter: {}", other),
            )),
        }
    }
}

/// Settings shared by single and grid watermarking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Alpha multiplier applied to the watermark, in (0, 1]
    pub opacity: f32,
    /// Watermark width as a percentage of the base image width, in (0, 100]
    pub watermark_width_percent: f32,
    /// Counter-clockwise rotation in degrees, in [0, 360)
    pub rotation_degrees: f32,
    pub resample_filter: ResampleFilter,
    /// Upper bound on batch workers; 0 selects the number of CPUs
    pub max_workers: usize,
    /// Seed for random placement; `None` draws from entropy
    pub seed: Option<u64>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            opacity: 1.0,
            watermark_width_percent: 20.0,
            rotation_degrees: 0.0,
            resample_filter: ResampleFilter::default(),
            max_workers: 0,
            seed: None,
        }
    }
}

impl GeneralConfig {
    /// Check every field, returning the first violation found
    pub fn validate(&self) -> Result<()> {
        // Written as negated range checks so NaN is rejected too.
        if !(self.opacity > 0.0 && self.opacity <= 1.0) {
            return Err(WatermarkError::invalid_config(
                "opacity",
                format!(
                    "must be greater than 0 and less than or equal to 1: {}",
                    self.opacity
                ),
            ));
        }

        if !(self.watermark_width_percent > 0.0 && self.watermark_width_percent <= 100.0) {
            return Err(WatermarkError::invalid_config(
                "watermark_width_percent",
                format!(
                    "must be greater than 0 and at most 100: {}",
                    self.watermark_width_percent
                ),
            ));
        }

        if !(self.rotation_degrees >= 0.0 && self.rotation_degrees < 360.0) {
            return Err(WatermarkError::invalid_config(
                "rotation_degrees",
                format!(
                    "must be at least 0 and less than 360: {}",
                    self.rotation_degrees
                ),
            ));
        }

        // max_workers is unsigned, so the non-negative bound holds by construction.
        Ok(())
    }

    /// Number of batch workers to run
    pub fn worker_count(&self) -> usize {
        if self.max_workers > 0 {
            self.max_workers
        } else {
            num_cpus::get().max(1)
        }
    }
}

/// Configuration for placing one watermark per image
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SingleConfig {
    #[serde(flatten)]
    pub general: GeneralConfig,
    pub horizontal_align: HorizontalAlign,
    pub vertical_align: VerticalAlign,
    /// Padding in pixels from the aligned edge
    pub spacing: i32,
}

impl SingleConfig {
    pub fn validate(&self) -> Result<()> {
        self.general.validate()?;

        if self.spacing < 0 {
            return Err(WatermarkError::invalid_config(
                "spacing",
                format!("must be a non-negative integer: {}", self.spacing),
            ));
        }

        Ok(())
    }
}

/// Configuration for tiling the watermark across the image.
///
/// Spacing and offsets may be negative: negative spacing packs tiles so they
/// overlap, negative offsets shift the first tile partly off-canvas.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    #[serde(flatten)]
    pub general: GeneralConfig,
    pub grid_spacing_x: i32,
    pub grid_spacing_y: i32,
    pub offset_x: i32,
    pub offset_y: i32,
}

impl GridConfig {
    pub fn validate(&self) -> Result<()> {
        self.general.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn general() -> GeneralConfig {
        GeneralConfig {
            opacity: 0.5,
            watermark_width_percent: 25.0,
            ..GeneralConfig::default()
        }
    }

    #[test]
    fn test_default_general_config_is_valid() {
        assert!(GeneralConfig::default().validate().is_ok());
        assert_eq!(GeneralConfig::default().resample_filter, ResampleFilter::CatmullRom);
    }

    #[test]
    fn test_opacity_bounds() {
        for bad in [0.0, -0.1, 1.01, f32::NAN] {
            let config = GeneralConfig { opacity: bad, ..general() };
            let err = config.validate().unwrap_err();
            assert_eq!(err.field(), Some("opacity"));
        }
        let config = GeneralConfig { opacity: 1.0, ..general() };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_width_percent_bounds() {
        for bad in [0.0, -5.0, 100.5] {
            let config = GeneralConfig { watermark_width_percent: bad, ..general() };
            assert_eq!(
                config.validate().unwrap_err().field(),
                Some("watermark_width_percent")
            );
        }
        let config = GeneralConfig { watermark_width_percent: 100.0, ..general() };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rotation_bounds() {
        for bad in [-1.0, 360.0, 720.0] {
            let config = GeneralConfig { rotation_degrees: bad, ..general() };
            assert_eq!(config.validate().unwrap_err().field(), Some("rotation_degrees"));
        }
        let config = GeneralConfig { rotation_degrees: 359.9, ..general() };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_reports_first_violation() {
        let config = GeneralConfig {
            opacity: 2.0,
            watermark_width_percent: 0.0,
            ..general()
        };
        assert_eq!(config.validate().unwrap_err().field(), Some("opacity"));
    }

    #[test]
    fn test_single_config_delegates_then_checks_spacing() {
        let config = SingleConfig {
            general: GeneralConfig { opacity: 0.0, ..general() },
            spacing: -1,
            ..SingleConfig::default()
        };
        assert_eq!(config.validate().unwrap_err().field(), Some("opacity"));

        let config = SingleConfig {
            general: general(),
            spacing: -1,
            ..SingleConfig::default()
        };
        assert_eq!(config.validate().unwrap_err().field(), Some("spacing"));
    }

    #[test]
    fn test_grid_config_accepts_negative_spacing_and_offsets() {
        let config = GridConfig {
            general: general(),
            grid_spacing_x: -40,
            grid_spacing_y: -10,
            offset_x: -50,
            offset_y: -50,
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_alignment_falls_back_to_middle() {
        assert_eq!(HorizontalAlign::from("diagonal"), HorizontalAlign::Middle);
        assert_eq!(VerticalAlign::from(""), VerticalAlign::Middle);
        assert_eq!(HorizontalAlign::from("RIGHT"), HorizontalAlign::Right);
        assert_eq!(VerticalAlign::from("rand"), VerticalAlign::Random);
    }

    #[test]
    fn test_alignment_deserialize_fallback() {
        let config: SingleConfig = serde_json::from_str(
            r#"{"opacity": 0.8, "horizontal_align": "sideways", "vertical_align": "bottom", "spacing": 4}"#,
        )
        .unwrap();
        assert_eq!(config.horizontal_align, HorizontalAlign::Middle);
        assert_eq!(config.vertical_align, VerticalAlign::Bottom);
        assert_eq!(config.general.opacity, 0.8);
        assert_eq!(config.spacing, 4);
    }

    #[test]
    fn test_resample_filter_parsing() {
        assert_eq!("lanczos".parse::<ResampleFilter>().unwrap(), ResampleFilter::Lanczos3);
        assert_eq!("Catmull-Rom".parse::<ResampleFilter>().unwrap(), ResampleFilter::CatmullRom);
        let err = "sinc".parse::<ResampleFilter>().unwrap_err();
        assert_eq!(err.field(), Some("resample_filter"));
    }

    #[test]
    fn test_worker_count() {
        let config = GeneralConfig { max_workers: 3, ..general() };
        assert_eq!(config.worker_count(), 3);
        let config = GeneralConfig { max_workers: 0, ..general() };
        assert!(config.worker_count() >= 1);
    }
}
