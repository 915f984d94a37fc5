//! Watermark engine: the public entry points for single, grid and batch runs

use crate::batch::BatchProcessor;
use crate::error::Result;
use crate::layout::{task_rng, Layout};
use crate::models::{GridConfig, SingleConfig};
use crate::source::{load_all, FileImageSource, ImageSource};
use crate::transform::{Resampler, WatermarkTransform};
use image::RgbaImage;
use rand::Rng;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument};

/// Watermark processing engine
#[derive(Clone)]
pub struct WatermarkEngine {
    transform: WatermarkTransform,
    batch: BatchProcessor,
    source: Arc<dyn ImageSource>,
}

impl std::fmt::Debug for WatermarkEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatermarkEngine")
            .field("transform", &self.transform)
            .finish_non_exhaustive()
    }
}

impl WatermarkEngine {
    /// Create an engine using the `image` crate for decoding and resizing
    pub fn new() -> Self {
        Self::with_collaborators(
            Arc::new(FileImageSource),
            Arc::new(crate::transform::ImageCrateResampler),
        )
    }

    /// Create an engine with custom decoding and resizing implementations
    pub fn with_collaborators(source: Arc<dyn ImageSource>, resampler: Arc<dyn Resampler>) -> Self {
        let transform = WatermarkTransform::new(resampler);
        Self {
            batch: BatchProcessor::new(transform.clone()),
            transform,
            source,
        }
    }

    /// Place one watermark on `base`
    #[instrument(skip_all, fields(base = ?base.dimensions()))]
    pub fn apply_single(
        &self,
        base: &RgbaImage,
        watermark: &RgbaImage,
        config: &SingleConfig,
    ) -> Result<RgbaImage> {
        let mut rng = task_rng(config.general.seed, 0);
        self.apply_single_with_rng(base, watermark, config, &mut rng)
    }

    /// Place one watermark on `base`, drawing random alignment from `rng`
    pub fn apply_single_with_rng<R: Rng + ?Sized>(
        &self,
        base: &RgbaImage,
        watermark: &RgbaImage,
        config: &SingleConfig,
        rng: &mut R,
    ) -> Result<RgbaImage> {
        self.apply(base, watermark, Layout::Single(config), rng)
    }

    /// Tile the watermark across `base`
    #[instrument(skip_all, fields(base = ?base.dimensions()))]
    pub fn apply_grid(
        &self,
        base: &RgbaImage,
        watermark: &RgbaImage,
        config: &GridConfig,
    ) -> Result<RgbaImage> {
        let mut rng = task_rng(config.general.seed, 0);
        self.apply(base, watermark, Layout::Grid(config), &mut rng)
    }

    /// Place one watermark on each base image, results in input order
    #[instrument(skip_all, fields(images = bases.len()))]
    pub fn apply_batch_single(
        &self,
        bases: &[RgbaImage],
        watermark: &RgbaImage,
        config: &SingleConfig,
    ) -> Result<Vec<RgbaImage>> {
        self.batch.apply(bases, watermark, Layout::Single(config))
    }

    /// Tile the watermark across each base image, results in input order
    #[instrument(skip_all, fields(images = bases.len()))]
    pub fn apply_batch_grid(
        &self,
        bases: &[RgbaImage],
        watermark: &RgbaImage,
        config: &GridConfig,
    ) -> Result<Vec<RgbaImage>> {
        self.batch.apply(bases, watermark, Layout::Grid(config))
    }

    fn apply<R: Rng + ?Sized>(
        &self,
        base: &RgbaImage,
        watermark: &RgbaImage,
        layout: Layout<'_>,
        rng: &mut R,
    ) -> Result<RgbaImage> {
        layout.validate()?;
        let started = Instant::now();

        let prepared = self.transform.prepare(watermark, base.width(), layout.general());
        let result = layout.render(base, &prepared, rng)?;

        info!(
            layout = layout.name(),
            watermark_width = prepared.width(),
            watermark_height = prepared.height(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Applied watermark"
        );
        Ok(result)
    }

    /// Load the base and watermark concurrently, then place one watermark
    pub async fn apply_single_from_paths(
        &self,
        base_path: &Path,
        watermark_path: &Path,
        config: &SingleConfig,
    ) -> Result<RgbaImage> {
        config.validate()?;
        let (base, watermark) = self.load_pair(base_path, watermark_path).await?;
        self.apply_single(&base, &watermark, config)
    }

    /// Load the base and watermark concurrently, then tile the watermark
    pub async fn apply_grid_from_paths(
        &self,
        base_path: &Path,
        watermark_path: &Path,
        config: &GridConfig,
    ) -> Result<RgbaImage> {
        config.validate()?;
        let (base, watermark) = self.load_pair(base_path, watermark_path).await?;
        self.apply_grid(&base, &watermark, config)
    }

    /// Decode many images with at most `limit` loads in flight
    pub async fn load_images(&self, paths: &[PathBuf], limit: usize) -> Result<Vec<RgbaImage>> {
        load_all(Arc::clone(&self.source), paths, limit).await
    }

    /// Decode a single image
    pub async fn load_image(&self, path: &Path) -> Result<RgbaImage> {
        self.source.load(path).await
    }

    async fn load_pair(&self, base_path: &Path, watermark_path: &Path) -> Result<(RgbaImage, RgbaImage)> {
        tokio::try_join!(self.source.load(base_path), self.source.load(watermark_path))
    }
}

impl Default for WatermarkEngine {
    fn default() -> Self {
        Self::new()
    }
}
