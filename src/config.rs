//! Command-line configuration.
//!
//! This module provides the CLI for the `geotiff-builder` binary:
//! - Command-line arguments via clap
//! - Environment variables with the `GEOTIFF_` prefix
//! - Defaults reproducing the 1024x1024 moon raster
//!
//! # Environment Variables
//!
//! - `GEOTIFF_WIDTH` / `GEOTIFF_HEIGHT` - Image size in pixels (default: 1024)
//! - `GEOTIFF_TILE_WIDTH` / `GEOTIFF_TILE_LENGTH` - Tile size (default: 128)
//! - `GEOTIFF_FILL` - Pixel fill: random, zero or gradient (default: random)
//! - `GEOTIFF_SEED` - Seed for the random fill
//! - `GEOTIFF_OUTPUT` - Output file path (default: moon.tif)
//! - `GEOTIFF_S3_BUCKET` / `GEOTIFF_S3_KEY` - Upload target instead of a file
//! - `GEOTIFF_S3_ENDPOINT` - Custom S3 endpoint for S3-compatible services
//! - `GEOTIFF_S3_REGION` - AWS region (default: us-east-1)

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::layout::{
    ImageGeometry, BITS_PER_SAMPLE, DEFAULT_IMAGE_HEIGHT, DEFAULT_IMAGE_WIDTH, DEFAULT_TILE_SIZE,
};
use crate::writer::{ConstantFill, GradientFill, PixelSource, RandomFill};

// =============================================================================
// Default Values
// =============================================================================

/// Default AWS region.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Default output file.
pub const DEFAULT_OUTPUT: &str = "moon.tif";

// =============================================================================
// CLI
// =============================================================================

/// GeoTIFF Builder - writes tiled, georeferenced TIFF files.
#[derive(Parser, Debug, Clone)]
#[command(name = "geotiff-builder")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn into_command(self) -> Command {
        self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Generate a tiled GeoTIFF
    Generate(GenerateConfig),

    /// Parse a TIFF file and validate its structure
    Inspect(InspectConfig),
}

// =============================================================================
// Generate
// =============================================================================

/// How tile pixels are filled.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FillKind {
    /// Uniformly random bytes
    #[default]
    Random,
    /// All zero
    Zero,
    /// Deterministic per-tile ramp
    Gradient,
}

impl FillKind {
    /// Pixel source for this fill.
    pub fn source(self, seed: Option<u64>) -> Box<dyn PixelSource> {
        match self {
            FillKind::Random => Box::new(RandomFill::new(seed)),
            FillKind::Zero => Box::new(ConstantFill(0)),
            FillKind::Gradient => Box::new(GradientFill),
        }
    }
}

/// Where the generated file goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    /// A local file, as directory plus file name
    File { dir: PathBuf, name: String },
    /// An S3 object
    S3 { bucket: String, key: String },
}

#[derive(Args, Debug, Clone)]
pub struct GenerateConfig {
    // =========================================================================
    // Geometry
    // =========================================================================
    /// Image width in pixels.
    #[arg(long, default_value_t = DEFAULT_IMAGE_WIDTH, env = "GEOTIFF_WIDTH")]
    pub width: u32,

    /// Image height in pixels.
    #[arg(long, default_value_t = DEFAULT_IMAGE_HEIGHT, env = "GEOTIFF_HEIGHT")]
    pub height: u32,

    /// Tile width in pixels. The image width must be a multiple of it.
    #[arg(long, default_value_t = DEFAULT_TILE_SIZE, env = "GEOTIFF_TILE_WIDTH")]
    pub tile_width: u32,

    /// Tile length in pixels. The image height must be a multiple of it.
    #[arg(long, default_value_t = DEFAULT_TILE_SIZE, env = "GEOTIFF_TILE_LENGTH")]
    pub tile_length: u32,

    // =========================================================================
    // Pixels
    // =========================================================================
    /// Pixel fill.
    #[arg(long, value_enum, default_value_t = FillKind::Random, env = "GEOTIFF_FILL")]
    pub fill: FillKind,

    /// Seed for the random fill. Without it every run differs.
    #[arg(long, env = "GEOTIFF_SEED")]
    pub seed: Option<u64>,

    // =========================================================================
    // Output
    // =========================================================================
    /// Output file path.
    ///
    /// Defaults to moon.tif when no S3 target is given.
    #[arg(short, long, env = "GEOTIFF_OUTPUT")]
    pub output: Option<PathBuf>,

    /// S3 bucket to upload to instead of writing a file.
    #[arg(long, env = "GEOTIFF_S3_BUCKET")]
    pub s3_bucket: Option<String>,

    /// Object key within the S3 bucket.
    #[arg(long, env = "GEOTIFF_S3_KEY")]
    pub s3_key: Option<String>,

    /// Custom S3 endpoint URL for S3-compatible services (MinIO, etc.).
    #[arg(long, env = "GEOTIFF_S3_ENDPOINT")]
    pub s3_endpoint: Option<String>,

    /// AWS region for S3.
    #[arg(long, default_value = DEFAULT_REGION, env = "GEOTIFF_S3_REGION")]
    pub s3_region: String,

    /// Print the planned layout as JSON before writing.
    #[arg(long, default_value_t = false)]
    pub layout_json: bool,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl GenerateConfig {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        let dims = [
            ("width", self.width),
            ("height", self.height),
            ("tile_width", self.tile_width),
            ("tile_length", self.tile_length),
        ];
        for (name, value) in dims {
            if value == 0 {
                return Err(format!("{} must be greater than 0", name));
            }
        }

        if self.s3_bucket.is_some() && self.output.is_some() {
            return Err("Use either --output or --s3-bucket, not both".to_string());
        }

        if let Some(ref bucket) = self.s3_bucket {
            if bucket.is_empty() {
                return Err("S3 bucket name cannot be empty".to_string());
            }
            match self.s3_key.as_deref() {
                None | Some("") => {
                    return Err(
                        "An S3 key is required with --s3-bucket. Set --s3-key or GEOTIFF_S3_KEY"
                            .to_string(),
                    )
                }
                Some(_) => {}
            }
        } else if self.s3_key.is_some() {
            return Err("--s3-key requires --s3-bucket".to_string());
        }

        if let Some(ref output) = self.output {
            if output.file_name().is_none() {
                return Err(format!("Output path {} has no file name", output.display()));
            }
        }

        Ok(())
    }

    /// Single-band 8-bit geometry described by the flags.
    pub fn geometry(&self) -> ImageGeometry {
        ImageGeometry {
            width: self.width,
            height: self.height,
            tile_width: self.tile_width,
            tile_length: self.tile_length,
            bits_per_sample: BITS_PER_SAMPLE,
            samples_per_pixel: 1,
        }
    }

    /// Resolved output target. Call after [`validate`](Self::validate).
    pub fn target(&self) -> OutputTarget {
        if let (Some(bucket), Some(key)) = (&self.s3_bucket, &self.s3_key) {
            return OutputTarget::S3 {
                bucket: bucket.clone(),
                key: key.clone(),
            };
        }

        let path = self
            .output
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT));
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| DEFAULT_OUTPUT.to_string());
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf();

        OutputTarget::File { dir, name }
    }
}

// =============================================================================
// Inspect
// =============================================================================

#[derive(Args, Debug, Clone)]
pub struct InspectConfig {
    /// TIFF file to inspect.
    pub path: PathBuf,

    /// Print the report as JSON.
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl InspectConfig {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.path.as_os_str().is_empty() {
            return Err("A file path is required".to_string());
        }
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
