//! Placement of watermarks on the base canvas.
//!
//! Two layouts are supported:
//!
//! - **Single**: one watermark aligned independently on each axis
//!   (left/middle/right/random, top/middle/bottom/random) with padding.
//! - **Grid**: the watermark repeated row-major from an offset, stepping by
//!   the watermark size plus a signed spacing.
//!
//! Coordinates are signed and are not clamped here; the compositor clips
//! whatever falls outside the canvas.

use crate::error::{Result, WatermarkError};
use crate::models::{Dimensions, HorizontalAlign, Point, VerticalAlign};
use rand::Rng;
use tracing::debug;

/// Alignment along one axis, shared by the horizontal and vertical rules
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AxisAnchor {
    Start,
    Center,
    End,
    Random,
}

impl From<HorizontalAlign> for AxisAnchor {
    fn from(align: HorizontalAlign) -> Self {
        match align {
            HorizontalAlign::Left => AxisAnchor::Start,
            HorizontalAlign::Middle => AxisAnchor::Center,
            HorizontalAlign::Right => AxisAnchor::End,
            HorizontalAlign::Random => AxisAnchor::Random,
        }
    }
}

impl From<VerticalAlign> for AxisAnchor {
    fn from(align: VerticalAlign) -> Self {
        match align {
            VerticalAlign::Top => AxisAnchor::Start,
            VerticalAlign::Middle => AxisAnchor::Center,
            VerticalAlign::Bottom => AxisAnchor::End,
            VerticalAlign::Random => AxisAnchor::Random,
        }
    }
}

/// Position calculator for watermark placement
#[derive(Debug, Clone, Copy, Default)]
pub struct PositionCalculator;

impl PositionCalculator {
    /// Top-left corner for a single watermark.
    ///
    /// Random alignment draws from `rng` within
    /// `[spacing, base - watermark - spacing]`; when that range is empty or
    /// inverted the coordinate falls back to `spacing`.
    pub fn single_position<R: Rng + ?Sized>(
        base: Dimensions,
        watermark: Dimensions,
        horizontal: HorizontalAlign,
        vertical: VerticalAlign,
        spacing: i32,
        rng: &mut R,
    ) -> Point {
        let x = Self::axis_coordinate(
            horizontal.into(),
            base.width as i32,
            watermark.width as i32,
            spacing,
            rng,
        );
        let y = Self::axis_coordinate(
            vertical.into(),
            base.height as i32,
            watermark.height as i32,
            spacing,
            rng,
        );

        debug!(x, y, %horizontal, %vertical, spacing, "Computed single watermark position");
        Point::new(x, y)
    }

    fn axis_coordinate<R: Rng + ?Sized>(
        anchor: AxisAnchor,
        base_size: i32,
        watermark_size: i32,
        spacing: i32,
        rng: &mut R,
    ) -> i32 {
        match anchor {
            AxisAnchor::Start => spacing,
            AxisAnchor::Center => (base_size - watermark_size) / 2,
            AxisAnchor::End => base_size - watermark_size - spacing,
            AxisAnchor::Random => {
                let min = spacing;
                let max = base_size - watermark_size - spacing;
                if max > min {
                    rng.gen_range(min..=max)
                } else {
                    min
                }
            }
        }
    }

    /// Tile positions in row-major order.
    ///
    /// Starts at `(offset_x, offset_y)` and advances by `watermark + spacing`
    /// on each axis until the coordinate reaches the base size. A step of zero
    /// or less could never leave the canvas, so it is rejected.
    ///
    /// Tiles lying wholly left of or above the canvas are skipped, so emission
    /// begins at the first column and row that can touch a pixel.
    pub fn grid_positions(
        base: Dimensions,
        watermark: Dimensions,
        grid_spacing_x: i32,
        grid_spacing_y: i32,
        offset_x: i32,
        offset_y: i32,
    ) -> Result<Vec<Point>> {
        let base_w = i64::from(base.width);
        let base_h = i64::from(base.height);
        let start_x = i64::from(offset_x);
        let start_y = i64::from(offset_y);

        if start_x >= base_w || start_y >= base_h {
            debug!(offset_x, offset_y, "Grid starts off-canvas, no tiles to place");
            return Ok(Vec::new());
        }

        let step_x = i64::from(watermark.width) + i64::from(grid_spacing_x);
        let step_y = i64::from(watermark.height) + i64::from(grid_spacing_y);

        if step_x <= 0 {
            return Err(WatermarkError::invalid_config(
                "grid_spacing_x",
                format!(
                    "watermark width {} plus spacing {} must be positive",
                    watermark.width, grid_spacing_x
                ),
            ));
        }
        if step_y <= 0 {
            return Err(WatermarkError::invalid_config(
                "grid_spacing_y",
                format!(
                    "watermark height {} plus spacing {} must be positive",
                    watermark.height, grid_spacing_y
                ),
            ));
        }

        let start_x = Self::first_visible(start_x, i64::from(watermark.width), step_x);
        let start_y = Self::first_visible(start_y, i64::from(watermark.height), step_y);
        if start_x >= base_w || start_y >= base_h {
            debug!(offset_x, offset_y, "No grid tile reaches the canvas");
            return Ok(Vec::new());
        }

        let columns = (base_w - start_x + step_x - 1) / step_x;
        let rows = (base_h - start_y + step_y - 1) / step_y;
        let capacity = columns
            .checked_mul(rows)
            .and_then(|count| usize::try_from(count).ok())
            .unwrap_or(0);
        let mut positions = Vec::with_capacity(capacity);

        let mut y = start_y;
        while y < base_h {
            let mut x = start_x;
            while x < base_w {
                positions.push(Point::new(x as i32, y as i32));
                x += step_x;
            }
            y += step_y;
        }

        debug!(
            count = positions.len(),
            step_x, step_y, "Generated grid watermark positions"
        );
        Ok(positions)
    }

    /// First tile coordinate at or after `start` whose far edge is past 0
    fn first_visible(start: i64, size: i64, step: i64) -> i64 {
        let lowest = 1 - size;
        if start >= lowest {
            return start;
        }
        let skipped = (lowest - start + step - 1) / step;
        start + skipped * step
    }
}
