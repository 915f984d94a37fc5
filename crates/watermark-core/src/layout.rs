//! Placement strategy selection and the per-image render step

use crate::compositor::composite_onto;
use crate::error::Result;
use crate::models::{Dimensions, GeneralConfig, GridConfig, Point, SingleConfig};
use crate::position::PositionCalculator;
use image::RgbaImage;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// How the prepared watermark is laid out on each base image
#[derive(Debug, Clone, Copy)]
pub enum Layout<'a> {
    Single(&'a SingleConfig),
    Grid(&'a GridConfig),
}

impl<'a> Layout<'a> {
    pub fn general(&self) -> &'a GeneralConfig {
        match self {
            Layout::Single(config) => &config.general,
            Layout::Grid(config) => &config.general,
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Layout::Single(config) => config.validate(),
            Layout::Grid(config) => config.validate(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Layout::Single(_) => "single",
            Layout::Grid(_) => "grid",
        }
    }

    /// Placement points for a watermark of `watermark` size on `base`
    pub fn positions<R: Rng + ?Sized>(
        &self,
        base: Dimensions,
        watermark: Dimensions,
        rng: &mut R,
    ) -> Result<Vec<Point>> {
        match self {
            Layout::Single(config) => Ok(vec![PositionCalculator::single_position(
                base,
                watermark,
                config.horizontal_align,
                config.vertical_align,
                config.spacing,
                rng,
            )]),
            Layout::Grid(config) => PositionCalculator::grid_positions(
                base,
                watermark,
                config.grid_spacing_x,
                config.grid_spacing_y,
                config.offset_x,
                config.offset_y,
            ),
        }
    }

    /// Copy `base` and composite the prepared watermark at every position
    pub fn render<R: Rng + ?Sized>(
        &self,
        base: &RgbaImage,
        prepared: &RgbaImage,
        rng: &mut R,
    ) -> Result<RgbaImage> {
        let points = self.positions(Dimensions::of(base), Dimensions::of(prepared), rng)?;
        let mut canvas = base.clone();
        composite_onto(&mut canvas, prepared, &points);
        Ok(canvas)
    }
}

/// Random source for the image at `index` of a run.
///
/// With a seed every index gets its own reproducible stream; index 0 matches
/// a single-image run with the same seed.
pub fn task_rng(seed: Option<u64>, index: usize) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(index as u64)),
        None => StdRng::from_entropy(),
    }
}
