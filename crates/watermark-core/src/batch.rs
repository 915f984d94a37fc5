//! Batch watermarking across many base images on a bounded worker pool

use crate::error::{Result, WatermarkError};
use crate::layout::{task_rng, Layout};
use crate::transform::{target_width, WatermarkTransform};
use image::RgbaImage;
use rayon::prelude::*;
use std::collections::{BTreeSet, HashMap};
use std::time::Instant;
use tracing::{debug, info};

/// Applies one watermark configuration to many base images.
///
/// Work runs on a dedicated pool capped at the configured worker count. The
/// watermark is prepared once per distinct target width and shared read-only
/// by every image of that width; each image gets its own canvas.
#[derive(Debug, Clone, Default)]
pub struct BatchProcessor {
    transform: WatermarkTransform,
}

impl BatchProcessor {
    pub fn new(transform: WatermarkTransform) -> Self {
        Self { transform }
    }

    /// Watermark every base image, returning results in input order.
    ///
    /// The configuration is validated before any work starts. The first error
    /// aborts the batch and no partial results are returned.
    pub fn apply(
        &self,
        bases: &[RgbaImage],
        watermark: &RgbaImage,
        layout: Layout<'_>,
    ) -> Result<Vec<RgbaImage>> {
        layout.validate()?;

        let general = layout.general();
        let workers = general.worker_count();
        let started = Instant::now();

        info!(
            images = bases.len(),
            workers,
            layout = layout.name(),
            "Starting batch watermarking"
        );

        if bases.is_empty() {
            return Ok(Vec::new());
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|index| format!("watermark-worker-{}", index))
            .build()
            .map_err(|e| WatermarkError::ThreadPool {
                message: format!("Failed to build worker pool: {}", e),
            })?;

        let widths: Vec<u32> = bases
            .iter()
            .map(|base| target_width(base.width(), general.watermark_width_percent))
            .collect();

        let results = pool.install(|| {
            let distinct: BTreeSet<u32> = widths.iter().copied().collect();
            let prepared: HashMap<u32, RgbaImage> = distinct
                .into_par_iter()
                .map(|width| {
                    (
                        width,
                        self.transform.prepare_for_width(watermark, width, general),
                    )
                })
                .collect();
            debug!(variants = prepared.len(), "Prepared watermark variants");

            bases
                .par_iter()
                .zip(widths.par_iter())
                .enumerate()
                .map(|(index, (base, width))| {
                    let mut rng = task_rng(general.seed, index);
                    let result = layout.render(base, &prepared[width], &mut rng)?;
                    debug!(index, "Watermarked batch image");
                    Ok(result)
                })
                .collect::<Result<Vec<_>>>()
        })?;

        info!(
            images = results.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Batch watermarking complete"
        );
        Ok(results)
    }
}
