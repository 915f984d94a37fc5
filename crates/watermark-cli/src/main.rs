//! Command-line interface for the image watermarking tool

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use image::{DynamicImage, RgbaImage};
use image_watermark_core::{
    init, version, AppConfig, ConfigManager, GeneralConfig, GridConfig, HorizontalAlign,
    ResampleFilter, SingleConfig, VerticalAlign, WatermarkEngine,
};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "gif", "bmp", "tif", "tiff"];

#[derive(Parser)]
#[command(name = "image-watermark")]
#[command(about = "Place image watermarks on photos, singly or tiled in a grid")]
#[command(version = version())]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Replace output files that already exist
    #[arg(long)]
    overwrite: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Place one watermark on an image
    Single {
        /// Input file path
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Watermark file path
        #[arg(short, long)]
        watermark: PathBuf,

        #[command(flatten)]
        general: GeneralArgs,

        #[command(flatten)]
        placement: PlacementArgs,
    },

    /// Tile a watermark across an image
    Grid {
        /// Input file path
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Watermark file path
        #[arg(short, long)]
        watermark: PathBuf,

        #[command(flatten)]
        general: GeneralArgs,

        #[command(flatten)]
        grid: GridArgs,
    },

    /// Watermark every image in a directory
    Batch {
        /// Input directory
        #[arg(short, long)]
        input_dir: PathBuf,

        /// Output directory
        #[arg(short, long)]
        output_dir: PathBuf,

        /// Watermark file path
        #[arg(short, long)]
        watermark: PathBuf,

        /// Tile the watermark instead of placing it once
        #[arg(long)]
        grid: bool,

        #[command(flatten)]
        general: GeneralArgs,

        #[command(flatten)]
        placement: PlacementArgs,

        #[command(flatten)]
        grid_args: GridArgs,
    },

    /// Show system information and capabilities
    Info,
}

/// Watermark appearance shared by every mode
#[derive(Args, Debug, Default)]
struct GeneralArgs {
    /// Watermark opacity (0.0-1.0]
    #[arg(long)]
    opacity: Option<f32>,

    /// Watermark width as a percentage of the base image width
    #[arg(long)]
    width_percent: Option<f32>,

    /// Counter-clockwise rotation in degrees [0-360)
    #[arg(long)]
    rotation: Option<f32>,

    /// Resampling filter (nearest, triangle, catmull-rom, gaussian, lanczos3)
    #[arg(long)]
    filter: Option<ResampleFilter>,

    /// Maximum worker threads, 0 for one per CPU
    #[arg(long)]
    workers: Option<usize>,

    /// Seed for random placement
    #[arg(long)]
    seed: Option<u64>,
}

impl GeneralArgs {
    fn resolve(&self, defaults: GeneralConfig) -> GeneralConfig {
        GeneralConfig {
            opacity: self.opacity.unwrap_or(defaults.opacity),
            watermark_width_percent: self.width_percent.unwrap_or(defaults.watermark_width_percent),
            rotation_degrees: self.rotation.unwrap_or(defaults.rotation_degrees),
            resample_filter: self.filter.unwrap_or(defaults.resample_filter),
            max_workers: self.workers.unwrap_or(defaults.max_workers),
            seed: self.seed.or(defaults.seed),
        }
    }
}

/// Placement of a single watermark
#[derive(Args, Debug, Default)]
struct PlacementArgs {
    /// Horizontal alignment (left, middle, right, random)
    #[arg(long)]
    horizontal: Option<String>,

    /// Vertical alignment (top, middle, bottom, random)
    #[arg(long)]
    vertical: Option<String>,

    /// Distance in pixels from the aligned edges
    #[arg(long, allow_negative_numbers = true)]
    spacing: Option<i32>,
}

impl PlacementArgs {
    fn resolve(&self, general: GeneralConfig, app: &AppConfig) -> SingleConfig {
        SingleConfig {
            general,
            horizontal_align: self
                .horizontal
                .as_deref()
                .map(HorizontalAlign::from)
                .unwrap_or(app.watermark.horizontal_align),
            vertical_align: self
                .vertical
                .as_deref()
                .map(VerticalAlign::from)
                .unwrap_or(app.watermark.vertical_align),
            spacing: self.spacing.unwrap_or(app.watermark.spacing),
        }
    }
}

/// Grid tiling layout
#[derive(Args, Debug, Default)]
struct GridArgs {
    /// Horizontal gap between tiles
    #[arg(long, allow_negative_numbers = true)]
    spacing_x: Option<i32>,

    /// Vertical gap between tiles
    #[arg(long, allow_negative_numbers = true)]
    spacing_y: Option<i32>,

    /// Horizontal position of the first tile
    #[arg(long, allow_negative_numbers = true)]
    offset_x: Option<i32>,

    /// Vertical position of the first tile
    #[arg(long, allow_negative_numbers = true)]
    offset_y: Option<i32>,
}

impl GridArgs {
    fn resolve(&self, general: GeneralConfig, app: &AppConfig) -> GridConfig {
        GridConfig {
            general,
            grid_spacing_x: self.spacing_x.unwrap_or(app.watermark.grid_spacing_x),
            grid_spacing_y: self.spacing_y.unwrap_or(app.watermark.grid_spacing_y),
            offset_x: self.offset_x.unwrap_or(app.watermark.offset_x),
            offset_y: self.offset_y.unwrap_or(app.watermark.offset_y),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut app_config = load_app_config(cli.config.as_deref())?;
    if cli.verbose {
        app_config.logging.level = "debug".to_string();
    }
    let overwrite = cli.overwrite || app_config.output.overwrite;

    // Keep the guard alive so file logs are flushed on exit
    let _log_guard = init(&app_config.logging).await?;

    info!("Image Watermark CLI v{} starting", version());

    let engine = WatermarkEngine::new();

    match cli.command {
        Commands::Single {
            input,
            output,
            watermark,
            general,
            placement,
        } => {
            let config = placement.resolve(general.resolve(app_config.general()), &app_config);
            info!("Adding watermark from {} to {}", watermark.display(), input.display());
            ensure_writable(&output, overwrite)?;

            let result = engine
                .apply_single_from_paths(&input, &watermark, &config)
                .await
                .with_context(|| format!("Failed to watermark {}", input.display()))?;
            save_image(result, &output).await?;
            println!("Saved {}", output.display());
        }

        Commands::Grid {
            input,
            output,
            watermark,
            general,
            grid,
        } => {
            let config = grid.resolve(general.resolve(app_config.general()), &app_config);
            info!("Tiling watermark from {} across {}", watermark.display(), input.display());
            ensure_writable(&output, overwrite)?;

            let result = engine
                .apply_grid_from_paths(&input, &watermark, &config)
                .await
                .with_context(|| format!("Failed to watermark {}", input.display()))?;
            save_image(result, &output).await?;
            println!("Saved {}", output.display());
        }

        Commands::Batch {
            input_dir,
            output_dir,
            watermark,
            grid,
            general,
            placement,
            grid_args,
        } => {
            let general = general.resolve(app_config.general());
            info!("Batch watermarking from {} to {}", input_dir.display(), output_dir.display());

            let inputs = collect_images(&input_dir)?;
            if inputs.is_empty() {
                println!("No images found in {}", input_dir.display());
                return Ok(());
            }
            let outputs: Vec<PathBuf> = inputs
                .iter()
                .map(|input| output_path(input, &output_dir, &app_config.output.file_suffix))
                .collect();
            for output in &outputs {
                ensure_writable(output, overwrite)?;
            }

            let watermark_image = engine
                .load_image(&watermark)
                .await
                .with_context(|| format!("Failed to load watermark {}", watermark.display()))?;
            let bases = engine
                .load_images(&inputs, general.worker_count())
                .await
                .context("Failed to load input images")?;

            let results = if grid {
                let config = grid_args.resolve(general, &app_config);
                engine.apply_batch_grid(&bases, &watermark_image, &config)
            } else {
                let config = placement.resolve(general, &app_config);
                engine.apply_batch_single(&bases, &watermark_image, &config)
            }
            .context("Batch watermarking failed")?;

            tokio::fs::create_dir_all(&output_dir)
                .await
                .with_context(|| format!("Failed to create {}", output_dir.display()))?;
            for (result, output) in results.into_iter().zip(&outputs) {
                save_image(result, output).await?;
            }
            println!("Watermarked {} images into {}", outputs.len(), output_dir.display());
        }

        Commands::Info => {
            println!("Image Watermark v{}", version());
            println!("Raster watermark placement tool");
            println!("\nSystem Information:");
            println!("  CPU cores: {}", num_cpus::get());
            println!("  Platform: {}", std::env::consts::OS);
            println!("  Architecture: {}", std::env::consts::ARCH);
            println!("\nCapabilities:");
            println!("  Modes: single, grid, batch");
            println!("  Filters: nearest, triangle, catmull-rom, gaussian, lanczos3");
            println!("  Formats: {}", IMAGE_EXTENSIONS.join(", "));
        }
    }

    Ok(())
}

/// Load configuration from an explicit path, or the default location.
///
/// A missing file yields the defaults; an unreadable or malformed one is an error.
fn load_app_config(path: Option<&Path>) -> Result<AppConfig> {
    let manager = match path {
        Some(path) => ConfigManager::with_path(path.to_path_buf())
            .with_context(|| format!("Failed to load configuration {}", path.display()))?,
        None => ConfigManager::new().context("Failed to load configuration")?,
    };
    Ok(manager.config().clone())
}

/// Image files directly inside `dir`, sorted by name
fn collect_images(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read input directory {}", dir.display()))?;

    let mut paths = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.is_file() && has_image_extension(&path) {
            paths.push(path);
        }
    }
    paths.sort();
    debug!("Found {} images in {}", paths.len(), dir.display());
    Ok(paths)
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

fn output_path(input: &Path, output_dir: &Path, suffix: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    let file_name = match input.extension() {
        Some(ext) => format!("{}{}.{}", stem, suffix, ext.to_string_lossy()),
        None => format!("{}{}", stem, suffix),
    };
    output_dir.join(file_name)
}

fn ensure_writable(path: &Path, overwrite: bool) -> Result<()> {
    if path.exists() && !overwrite {
        bail!(
            "Output file {} already exists (use --overwrite to replace it)",
            path.display()
        );
    }
    Ok(())
}

/// Encode off the async runtime; formats without alpha get an RGB copy
async fn save_image(image: RgbaImage, path: &Path) -> Result<()> {
    let target = path.to_path_buf();
    tokio::task::spawn_blocking(move || {
        let drops_alpha = target
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| matches!(ext.to_ascii_lowercase().as_str(), "jpg" | "jpeg"))
            .unwrap_or(false);

        if drops_alpha {
            DynamicImage::ImageRgba8(image).to_rgb8().save(&target)
        } else {
            image.save(&target)
        }
    })
    .await
    .context("Image save task failed")?
    .with_context(|| format!("Failed to save {}", path.display()))?;

    info!("Saved {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::try_parse_from(["image-watermark", "info"]);
        assert!(cli.is_ok());
    }

    #[test]
    fn test_negative_grid_values_parse() {
        let cli = Cli::try_parse_from([
            "image-watermark",
            "grid",
            "-i",
            "in.png",
            "-o",
            "out.png",
            "-w",
            "logo.png",
            "--spacing-x",
            "-20",
            "--offset-y",
            "-5",
        ])
        .unwrap();

        match cli.command {
            Commands::Grid { grid, .. } => {
                let config = grid.resolve(GeneralConfig::default(), &AppConfig::default());
                assert_eq!(config.grid_spacing_x, -20);
                assert_eq!(config.offset_y, -5);
                assert_eq!(config.grid_spacing_y, 50);
            }
            _ => panic!("expected grid command"),
        }
    }

    #[test]
    fn test_flags_override_config_defaults() {
        let app = AppConfig::default();
        let general = GeneralArgs {
            opacity: Some(0.5),
            filter: Some(ResampleFilter::Nearest),
            ..GeneralArgs::default()
        }
        .resolve(app.general());
        assert_eq!(general.opacity, 0.5);
        assert_eq!(general.resample_filter, ResampleFilter::Nearest);
        assert_eq!(general.watermark_width_percent, app.watermark.width_percent);

        let placement = PlacementArgs {
            horizontal: Some("left".to_string()),
            vertical: Some("diagonal".to_string()),
            spacing: None,
        }
        .resolve(general, &app);
        assert_eq!(placement.horizontal_align, HorizontalAlign::Left);
        assert_eq!(placement.vertical_align, VerticalAlign::Middle);
        assert_eq!(placement.spacing, app.watermark.spacing);
    }

    #[test]
    fn test_output_path_appends_suffix() {
        let path = output_path(Path::new("/in/photo.JPG"), Path::new("/out"), "_wm");
        assert_eq!(path, PathBuf::from("/out/photo_wm.JPG"));
        assert!(has_image_extension(Path::new("photo.JPG")));
        assert!(!has_image_extension(Path::new("notes.txt")));
    }
}
