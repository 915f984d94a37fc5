//! Integration tests for the watermark core

use image::{Rgba, RgbaImage};
use image_watermark_core::{
    init, version, ConfigManager, GeneralConfig, GridConfig, HorizontalAlign, LoggingConfig,
    SingleConfig, VerticalAlign, WatermarkEngine,
};

fn solid(width: u32, height: u32, color: Rgba<u8>) -> RgbaImage {
    RgbaImage::from_pixel(width, height, color)
}

#[tokio::test]
async fn test_core_initialization() {
    let result = init(&LoggingConfig::default()).await;
    assert!(result.is_ok(), "Core initialization should succeed");
}

#[test]
fn test_version_info() {
    let version_str = version();
    assert!(!version_str.is_empty(), "Version should not be empty");
    assert_eq!(version_str, "0.1.0", "Version should match workspace version");
}

#[test]
fn test_config_manager() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config_path = temp_dir.path().join("test_config.toml");

    let manager = ConfigManager::with_path(config_path);
    assert!(manager.is_ok(), "Config manager should initialize successfully");

    let manager = manager.unwrap();
    let config = manager.config();

    assert_eq!(config.watermark.width_percent, 20.0);
    assert_eq!(config.watermark.vertical_align, VerticalAlign::Bottom);
    assert_eq!(config.performance.max_workers, 0);
    assert!(config.general().validate().is_ok());
}

#[tokio::test]
async fn test_single_watermark_from_files() {
    let temp_dir = tempfile::tempdir().unwrap();
    let base_path = temp_dir.path().join("photo.png");
    let logo_path = temp_dir.path().join("logo.png");
    solid(200, 100, Rgba([10, 20, 30, 255])).save(&base_path).unwrap();
    solid(40, 20, Rgba([250, 250, 250, 255])).save(&logo_path).unwrap();

    let config = SingleConfig {
        general: GeneralConfig {
            watermark_width_percent: 10.0,
            ..GeneralConfig::default()
        },
        horizontal_align: HorizontalAlign::Left,
        vertical_align: VerticalAlign::Top,
        spacing: 0,
    };

    let engine = WatermarkEngine::new();
    let result = engine
        .apply_single_from_paths(&base_path, &logo_path, &config)
        .await
        .unwrap();

    // 10% of 200 is 20 wide, proportional height 10
    assert_eq!(result.dimensions(), (200, 100));
    assert_eq!(*result.get_pixel(0, 0), Rgba([250, 250, 250, 255]));
    assert_eq!(*result.get_pixel(19, 9), Rgba([250, 250, 250, 255]));
    assert_eq!(*result.get_pixel(20, 9), Rgba([10, 20, 30, 255]));
    assert_eq!(*result.get_pixel(19, 10), Rgba([10, 20, 30, 255]));
}

#[tokio::test]
async fn test_missing_base_reports_path() {
    let temp_dir = tempfile::tempdir().unwrap();
    let logo_path = temp_dir.path().join("logo.png");
    solid(4, 4, Rgba([0, 0, 0, 255])).save(&logo_path).unwrap();

    let err = WatermarkEngine::new()
        .apply_grid_from_paths(&temp_dir.path().join("nope.png"), &logo_path, &GridConfig::default())
        .await
        .unwrap_err();
    assert_eq!(err.error_type(), "load_failure");
    assert!(err.to_string().contains("nope.png"));
}

#[test]
fn test_transparent_watermark_leaves_base_unchanged() {
    let base = solid(64, 48, Rgba([90, 60, 30, 255]));
    let watermark = solid(16, 16, Rgba([255, 0, 0, 0]));
    let engine = WatermarkEngine::new();

    let single = engine
        .apply_single(&base, &watermark, &SingleConfig::default())
        .unwrap();
    assert_eq!(single, base);

    let config = GridConfig {
        general: GeneralConfig {
            rotation_degrees: 45.0,
            ..GeneralConfig::default()
        },
        ..GridConfig::default()
    };
    let tiled = engine.apply_grid(&base, &watermark, &config).unwrap();
    assert_eq!(tiled, base);
}

#[test]
fn test_grid_tiles_whole_canvas() {
    let base = solid(100, 100, Rgba([0, 0, 0, 255]));
    let watermark = solid(8, 8, Rgba([255, 255, 255, 255]));
    let config = GridConfig {
        general: GeneralConfig {
            watermark_width_percent: 10.0,
            ..GeneralConfig::default()
        },
        grid_spacing_x: 10,
        grid_spacing_y: 10,
        offset_x: 0,
        offset_y: 0,
    };

    let result = WatermarkEngine::new()
        .apply_grid(&base, &watermark, &config)
        .unwrap();

    // 10x10 tiles every 20 pixels in both directions
    for tile_y in 0..5 {
        for tile_x in 0..5 {
            let x = tile_x * 20;
            let y = tile_y * 20;
            assert_eq!(*result.get_pixel(x + 5, y + 5), Rgba([255, 255, 255, 255]));
            assert_eq!(*result.get_pixel(x + 15, y + 15), Rgba([0, 0, 0, 255]));
        }
    }
}

#[test]
fn test_batch_matches_individual_runs() {
    let bases: Vec<RgbaImage> = vec![
        solid(120, 80, Rgba([200, 10, 10, 255])),
        solid(60, 60, Rgba([10, 200, 10, 255])),
        solid(120, 40, Rgba([10, 10, 200, 255])),
    ];
    let watermark = solid(30, 10, Rgba([255, 255, 0, 200]));
    let config = SingleConfig {
        general: GeneralConfig {
            opacity: 0.6,
            rotation_degrees: 90.0,
            max_workers: 2,
            ..GeneralConfig::default()
        },
        horizontal_align: HorizontalAlign::Right,
        vertical_align: VerticalAlign::Middle,
        spacing: 3,
    };

    let engine = WatermarkEngine::new();
    let batch = engine.apply_batch_single(&bases, &watermark, &config).unwrap();

    assert_eq!(batch.len(), bases.len());
    for (base, result) in bases.iter().zip(&batch) {
        let single = engine.apply_single(base, &watermark, &config).unwrap();
        assert_eq!(result, &single);
    }
}
