//! # Image Watermark Core
//!
//! Image watermarking library: places a raster watermark on base images either
//! once at an aligned position or tiled in a grid, with resize, rotation and
//! opacity applied to the watermark first. Batches run on a bounded worker pool
//! and return results in input order.

pub mod batch;
pub mod compositor;
pub mod config;
pub mod error;
pub mod layout;
pub mod logging;
pub mod models;
pub mod position;
pub mod source;
pub mod transform;
pub mod watermark_engine;

// Re-export commonly used types
pub use crate::config::*;
pub use error::*;
pub use logging::*;
pub use models::*;
pub use source::{FileImageSource, ImageSource};
pub use transform::{ImageCrateResampler, Resampler};
pub use watermark_engine::WatermarkEngine;

/// Initialize the watermark core library with the given logging settings.
///
/// Returns the file-logging guard, if any; keep it alive for the program's lifetime.
pub async fn init(
    config: &LoggingConfig,
) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let guard = logging::init_logging(config)?;

    tracing::info!("Image Watermark Core initialized successfully");
    Ok(guard)
}

/// Get the version of the watermark core
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
