//! Source-over alpha compositing of a prepared watermark onto a canvas.

use crate::models::Point;
use image::{Rgba, RgbaImage};
use tracing::debug;

/// Blend one straight-alpha pixel over another using Porter-Duff "over".
///
/// `out.a = src.a + dst.a * (1 - src.a)` and each colour channel is
/// `(src.c * src.a + dst.c * dst.a * (1 - src.a)) / out.a`, which reduces to
/// `src.c * src.a + dst.c * (1 - src.a)` over an opaque destination.
pub fn blend_pixels(dst: Rgba<u8>, src: Rgba<u8>) -> Rgba<u8> {
    match src[3] {
        0 => return dst,
        255 => return src,
        _ => {}
    }

    let src_a = f32::from(src[3]) / 255.0;
    let dst_a = f32::from(dst[3]) / 255.0;
    let dst_weight = dst_a * (1.0 - src_a);
    let out_a = src_a + dst_weight;

    let channel = |s: u8, d: u8| -> u8 {
        let value = (f32::from(s) * src_a + f32::from(d) * dst_weight) / out_a;
        value.round().clamp(0.0, 255.0) as u8
    };

    Rgba([
        channel(src[0], dst[0]),
        channel(src[1], dst[1]),
        channel(src[2], dst[2]),
        (out_a * 255.0).round().clamp(0.0, 255.0) as u8,
    ])
}

/// Composite `watermark` with its top-left corner at `origin`.
///
/// Only the part of the watermark that overlaps the canvas is drawn.
pub fn composite_at(canvas: &mut RgbaImage, watermark: &RgbaImage, origin: Point) {
    let canvas_w = i64::from(canvas.width());
    let canvas_h = i64::from(canvas.height());
    let ox = i64::from(origin.x);
    let oy = i64::from(origin.y);

    let x_start = ox.max(0);
    let y_start = oy.max(0);
    let x_end = (ox + i64::from(watermark.width())).min(canvas_w);
    let y_end = (oy + i64::from(watermark.height())).min(canvas_h);

    if x_start >= x_end || y_start >= y_end {
        return;
    }

    for ty in y_start..y_end {
        for tx in x_start..x_end {
            let src = *watermark.get_pixel((tx - ox) as u32, (ty - oy) as u32);
            let dst = canvas.get_pixel_mut(tx as u32, ty as u32);
            *dst = blend_pixels(*dst, src);
        }
    }
}

/// Composite the watermark at every point, in order.
///
/// Later points are drawn over earlier ones where tiles overlap.
pub fn composite_onto(canvas: &mut RgbaImage, watermark: &RgbaImage, points: &[Point]) {
    debug!(
        canvas_width = canvas.width(),
        canvas_height = canvas.height(),
        watermark_width = watermark.width(),
        watermark_height = watermark.height(),
        placements = points.len(),
        "Compositing watermark"
    );

    for point in points {
        composite_at(canvas, watermark, *point);
    }
}
