//! Watermark preparation: resize to the base width, rotate, then fade.

use crate::models::{GeneralConfig, ResampleFilter};
use image::{imageops, Rgba, RgbaImage};
use std::sync::Arc;
use tracing::{debug, warn};

/// Resizing primitive consumed by the transform pipeline
pub trait Resampler: Send + Sync {
    /// Resize to exactly `width` x `height`
    fn resize(&self, image: &RgbaImage, width: u32, height: u32, filter: ResampleFilter) -> RgbaImage;

    /// Resize to `width`, scaling the height to keep the aspect ratio
    fn resize_to_width(&self, image: &RgbaImage, width: u32, filter: ResampleFilter) -> RgbaImage {
        let height = proportional_height(image.width(), image.height(), width);
        if image.width() == width && image.height() == height {
            return image.clone();
        }
        self.resize(image, width, height, filter)
    }
}

/// Resampler backed by `image::imageops::resize`
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageCrateResampler;

impl Resampler for ImageCrateResampler {
    fn resize(&self, image: &RgbaImage, width: u32, height: u32, filter: ResampleFilter) -> RgbaImage {
        imageops::resize(image, width, height, filter.filter_type())
    }
}

/// Height matching `width` at the source aspect ratio, at least one pixel
pub fn proportional_height(src_width: u32, src_height: u32, width: u32) -> u32 {
    if src_width == 0 {
        return src_height.max(1);
    }
    let height = (f64::from(src_height) * f64::from(width) / f64::from(src_width)).round();
    (height as u32).max(1)
}

/// Watermark width in pixels for a base image: `floor(base * percent / 100)`
pub fn target_width(base_width: u32, width_percent: f32) -> u32 {
    let width = (f64::from(base_width) * f64::from(width_percent) / 100.0).floor() as u32;
    if width == 0 {
        warn!(
            base_width,
            width_percent, "Calculated watermark width would be zero, using 1 pixel"
        );
        return 1;
    }
    width
}

/// Multiply every alpha value by `opacity`, rounding to nearest.
///
/// Colour channels are left as they are: buffers hold straight alpha.
pub fn apply_opacity(image: &RgbaImage, opacity: f32) -> RgbaImage {
    let mut result = image.clone();
    for pixel in result.pixels_mut() {
        pixel[3] = (f32::from(pixel[3]) * opacity).round().clamp(0.0, 255.0) as u8;
    }
    result
}

/// Rotate counter-clockwise about the centre.
///
/// The output grows to hold the whole rotated image and every uncovered pixel
/// is fully transparent. Quarter turns are exact pixel permutations.
pub fn rotate(image: &RgbaImage, degrees: f32) -> RgbaImage {
    let angle = f64::from(degrees).rem_euclid(360.0);

    if angle == 0.0 {
        return image.clone();
    } else if angle == 90.0 {
        return imageops::rotate270(image);
    } else if angle == 180.0 {
        return imageops::rotate180(image);
    } else if angle == 270.0 {
        return imageops::rotate90(image);
    }

    let (src_w, src_h) = image.dimensions();
    let (dst_w, dst_h) = rotated_size(src_w, src_h, angle);
    let mut rotated = RgbaImage::from_pixel(dst_w, dst_h, Rgba([0, 0, 0, 0]));
    if dst_w == 0 || dst_h == 0 {
        return rotated;
    }

    let (sin, cos) = angle.to_radians().sin_cos();
    let src_cx = f64::from(src_w) / 2.0 - 0.5;
    let src_cy = f64::from(src_h) / 2.0 - 0.5;
    let dst_cx = f64::from(dst_w) / 2.0 - 0.5;
    let dst_cy = f64::from(dst_h) / 2.0 - 0.5;

    for (dx, dy, pixel) in rotated.enumerate_pixels_mut() {
        // Map each destination pixel back into the source.
        let rx = f64::from(dx) - dst_cx;
        let ry = f64::from(dy) - dst_cy;
        let sx = rx * cos - ry * sin + src_cx;
        let sy = rx * sin + ry * cos + src_cy;
        *pixel = sample_bilinear(image, sx, sy);
    }

    rotated
}

fn rotate_point(x: f64, y: f64, sin: f64, cos: f64) -> (f64, f64) {
    (x * cos - y * sin, x * sin + y * cos)
}

fn rotated_size(width: u32, height: u32, angle: f64) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (0, 0);
    }

    let (sin, cos) = angle.to_radians().sin_cos();
    let w = f64::from(width - 1);
    let h = f64::from(height - 1);
    let corners = [
        (0.0, 0.0),
        rotate_point(w, 0.0, sin, cos),
        rotate_point(w, h, sin, cos),
        rotate_point(0.0, h, sin, cos),
    ];

    let (min_x, max_x) = corners
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), (x, _)| (lo.min(*x), hi.max(*x)));
    let (min_y, max_y) = corners
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), (_, y)| (lo.min(*y), hi.max(*y)));

    let grow = |extent: f64| {
        let size = extent + 1.0;
        if size - size.floor() > 0.1 {
            size as u32 + 1
        } else {
            size as u32
        }
    };

    (grow(max_x - min_x), grow(max_y - min_y))
}

/// Bilinear sample with transparent surroundings, weighted by alpha so that
/// colour from fully transparent neighbours does not bleed in.
fn sample_bilinear(image: &RgbaImage, sx: f64, sy: f64) -> Rgba<u8> {
    let (width, height) = (i64::from(image.width()), i64::from(image.height()));
    let x0 = sx.floor() as i64;
    let y0 = sy.floor() as i64;

    if x0 < -1 || y0 < -1 || x0 >= width || y0 >= height {
        return Rgba([0, 0, 0, 0]);
    }

    let fx = sx - x0 as f64;
    let fy = sy - y0 as f64;
    let taps = [
        (x0, y0, (1.0 - fx) * (1.0 - fy)),
        (x0 + 1, y0, fx * (1.0 - fy)),
        (x0, y0 + 1, (1.0 - fx) * fy),
        (x0 + 1, y0 + 1, fx * fy),
    ];

    let (mut r, mut g, mut b, mut a) = (0.0, 0.0, 0.0, 0.0);
    for (x, y, weight) in taps {
        if x < 0 || y < 0 || x >= width || y >= height {
            continue;
        }
        let p = image.get_pixel(x as u32, y as u32);
        let wa = f64::from(p[3]) * weight;
        r += f64::from(p[0]) * wa;
        g += f64::from(p[1]) * wa;
        b += f64::from(p[2]) * wa;
        a += wa;
    }

    if a == 0.0 {
        return Rgba([0, 0, 0, 0]);
    }

    let channel = |v: f64| (v / a).round().clamp(0.0, 255.0) as u8;
    Rgba([channel(r), channel(g), channel(b), a.round().clamp(0.0, 255.0) as u8])
}

/// Runs the resize, rotate and opacity steps for one target size
#[derive(Clone)]
pub struct WatermarkTransform {
    resampler: Arc<dyn Resampler>,
}

impl std::fmt::Debug for WatermarkTransform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatermarkTransform").finish_non_exhaustive()
    }
}

impl Default for WatermarkTransform {
    fn default() -> Self {
        Self::new(Arc::new(ImageCrateResampler))
    }
}

impl WatermarkTransform {
    pub fn new(resampler: Arc<dyn Resampler>) -> Self {
        Self { resampler }
    }

    /// Prepare a watermark sized relative to a base image of `base_width`
    pub fn prepare(&self, watermark: &RgbaImage, base_width: u32, config: &GeneralConfig) -> RgbaImage {
        let width = target_width(base_width, config.watermark_width_percent);
        self.prepare_for_width(watermark, width, config)
    }

    /// Prepare a watermark whose pre-rotation width is `width`
    pub fn prepare_for_width(&self, watermark: &RgbaImage, width: u32, config: &GeneralConfig) -> RgbaImage {
        let mut prepared = self
            .resampler
            .resize_to_width(watermark, width, config.resample_filter);
        debug!(
            width = prepared.width(),
            height = prepared.height(),
            filter = ?config.resample_filter,
            "Resized watermark"
        );

        if config.rotation_degrees != 0.0 {
            prepared = rotate(&prepared, config.rotation_degrees);
            debug!(
                degrees = config.rotation_degrees,
                width = prepared.width(),
                height = prepared.height(),
                "Rotated watermark"
            );
        }

        if config.opacity < 1.0 {
            prepared = apply_opacity(&prepared, config.opacity);
            debug!(opacity = config.opacity, "Applied watermark opacity");
        }

        prepared
    }
}
