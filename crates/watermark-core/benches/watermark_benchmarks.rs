//! Benchmarks for watermark operations

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use image::{Rgba, RgbaImage};
use image_watermark_core::transform::rotate;
use image_watermark_core::{GeneralConfig, GridConfig, HorizontalAlign, SingleConfig, VerticalAlign, WatermarkEngine};

fn base_image() -> RgbaImage {
    RgbaImage::from_fn(1280, 720, |x, y| Rgba([(x % 256) as u8, (y % 256) as u8, 128, 255]))
}

fn logo() -> RgbaImage {
    RgbaImage::from_fn(256, 128, |x, _| Rgba([255, 255, 255, (x % 256) as u8]))
}

fn benchmark_single(c: &mut Criterion) {
    let engine = WatermarkEngine::new();
    let base = base_image();
    let watermark = logo();
    let config = SingleConfig {
        general: GeneralConfig {
            opacity: 0.7,
            ..GeneralConfig::default()
        },
        horizontal_align: HorizontalAlign::Right,
        vertical_align: VerticalAlign::Bottom,
        spacing: 20,
    };

    c.bench_function("apply_single_720p", |b| {
        b.iter(|| engine.apply_single(black_box(&base), black_box(&watermark), &config))
    });
}

fn benchmark_grid(c: &mut Criterion) {
    let engine = WatermarkEngine::new();
    let base = base_image();
    let watermark = logo();
    let config = GridConfig {
        general: GeneralConfig {
            watermark_width_percent: 10.0,
            rotation_degrees: 30.0,
            ..GeneralConfig::default()
        },
        ..GridConfig::default()
    };

    c.bench_function("apply_grid_720p", |b| {
        b.iter(|| engine.apply_grid(black_box(&base), black_box(&watermark), &config))
    });
}

fn benchmark_batch(c: &mut Criterion) {
    let engine = WatermarkEngine::new();
    let bases: Vec<RgbaImage> = (0..16).map(|_| base_image()).collect();
    let watermark = logo();
    let mut group = c.benchmark_group("apply_batch_single");

    for workers in [1usize, 4] {
        let config = SingleConfig {
            general: GeneralConfig {
                max_workers: workers,
                ..GeneralConfig::default()
            },
            ..SingleConfig::default()
        };
        group.bench_with_input(BenchmarkId::from_parameter(workers), &config, |b, config| {
            b.iter(|| engine.apply_batch_single(black_box(&bases), &watermark, config))
        });
    }
    group.finish();
}

fn benchmark_rotate(c: &mut Criterion) {
    let watermark = logo();

    c.bench_function("rotate_quarter_turn", |b| {
        b.iter(|| rotate(black_box(&watermark), 90.0))
    });
    c.bench_function("rotate_arbitrary", |b| {
        b.iter(|| rotate(black_box(&watermark), 37.5))
    });
}

criterion_group!(
    benches,
    benchmark_single,
    benchmark_grid,
    benchmark_batch,
    benchmark_rotate
);
criterion_main!(benches);
