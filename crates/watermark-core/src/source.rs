//! Image decoding for the watermark engine

use crate::error::{Result, WatermarkError};
use async_trait::async_trait;
use image::RgbaImage;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::{self, JoinSet};
use tracing::debug;

/// Decodes images into RGBA pixel buffers
#[async_trait]
pub trait ImageSource: Send + Sync {
    async fn load(&self, path: &Path) -> Result<RgbaImage>;
}

/// Loads images from the filesystem with the `image` crate
#[derive(Debug, Clone, Copy, Default)]
pub struct FileImageSource;

#[async_trait]
impl ImageSource for FileImageSource {
    async fn load(&self, path: &Path) -> Result<RgbaImage> {
        let path = path.to_path_buf();

        task::spawn_blocking(move || open_image(&path))
            .await
            .map_err(|e| WatermarkError::TaskJoin {
                message: format!("Image load task failed: {}", e),
            })?
    }
}

/// Decode an image file into an RGBA buffer
pub fn open_image(path: &Path) -> Result<RgbaImage> {
    if !path.exists() {
        return Err(WatermarkError::LoadFailure {
            path: path.to_path_buf(),
            cause: "file does not exist".to_string(),
        });
    }

    let image = image::open(path).map_err(|e| WatermarkError::LoadFailure {
        path: path.to_path_buf(),
        cause: e.to_string(),
    })?;

    debug!(
        "Loaded image {}: {}x{}",
        path.display(),
        image.width(),
        image.height()
    );
    Ok(image.to_rgba8())
}

/// Decode an in-memory encoded image
pub fn decode_bytes(bytes: &[u8]) -> Result<RgbaImage> {
    image::load_from_memory(bytes)
        .map(|image| image.to_rgba8())
        .map_err(|e| WatermarkError::LoadFailure {
            path: PathBuf::from("<memory>"),
            cause: e.to_string(),
        })
}

/// Load many images concurrently, at most `limit` at a time.
///
/// Results follow the order of `paths`; the first failure is returned.
pub async fn load_all(
    source: Arc<dyn ImageSource>,
    paths: &[PathBuf],
    limit: usize,
) -> Result<Vec<RgbaImage>> {
    let permits = Arc::new(Semaphore::new(limit.max(1)));
    let mut tasks = JoinSet::new();

    for (index, path) in paths.iter().cloned().enumerate() {
        let source = Arc::clone(&source);
        let permits = Arc::clone(&permits);
        tasks.spawn(async move {
            let _permit = permits
                .acquire_owned()
                .await
                .map_err(|e| WatermarkError::TaskJoin {
                    message: format!("Load semaphore closed: {}", e),
                })?;
            let image = source.load(&path).await?;
            Ok::<_, WatermarkError>((index, image))
        });
    }

    let mut slots: Vec<Option<RgbaImage>> = vec![None; paths.len()];
    while let Some(joined) = tasks.join_next().await {
        let (index, image) = joined.map_err(|e| WatermarkError::TaskJoin {
            message: format!("Image load task failed: {}", e),
        })??;
        slots[index] = Some(image);
    }

    slots
        .into_iter()
        .zip(paths)
        .map(|(slot, path)| {
            slot.ok_or_else(|| WatermarkError::LoadFailure {
                path: path.clone(),
                cause: "image was not loaded".to_string(),
            })
        })
        .collect()
}
