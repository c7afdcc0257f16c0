//! Image geometry and the tile grid derived from it.

use serde::Serialize;

use crate::error::{BuildError, ConfigError};

// =============================================================================
// Defaults
// =============================================================================

/// Default image width in pixels.
pub const DEFAULT_IMAGE_WIDTH: u32 = 1024;

/// Default image height in pixels.
pub const DEFAULT_IMAGE_HEIGHT: u32 = 1024;

/// Default tile edge in pixels.
pub const DEFAULT_TILE_SIZE: u32 = 128;

/// The only supported sample depth.
pub const BITS_PER_SAMPLE: u16 = 8;

// =============================================================================
// ImageGeometry
// =============================================================================

/// Raster dimensions and sample layout.
///
/// Plain values; validation happens in [`TileGrid::derive`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImageGeometry {
    /// Image width in pixels
    pub width: u32,

    /// Image height in pixels
    pub height: u32,

    /// Tile width in pixels
    pub tile_width: u32,

    /// Tile height (length) in pixels
    pub tile_length: u32,

    /// Bits per sample
    pub bits_per_sample: u16,

    /// Samples per pixel (must be 1: the raster is single-band grayscale)
    pub samples_per_pixel: u16,
}

impl ImageGeometry {
    /// Grayscale 8-bit geometry with square tiles.
    pub fn grayscale(width: u32, height: u32, tile_size: u32) -> Self {
        Self {
            width,
            height,
            tile_width: tile_size,
            tile_length: tile_size,
            bits_per_sample: BITS_PER_SAMPLE,
            samples_per_pixel: 1,
        }
    }

    /// Bytes per sample (1 for every supported geometry).
    #[inline]
    pub fn bytes_per_sample(&self) -> u32 {
        self.bits_per_sample as u32 / 8
    }
}

impl Default for ImageGeometry {
    fn default() -> Self {
        Self::grayscale(DEFAULT_IMAGE_WIDTH, DEFAULT_IMAGE_HEIGHT, DEFAULT_TILE_SIZE)
    }
}

// =============================================================================
// TileGrid
// =============================================================================

/// Tile counts and sizes for a validated geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TileGrid {
    /// Tiles across
    pub tiles_wide: u32,

    /// Tiles down
    pub tiles_high: u32,

    /// Total tile count
    pub tile_count: u32,

    /// Uncompressed size of every tile in bytes
    pub bytes_per_tile: u32,
}

impl TileGrid {
    /// Derive the tile grid, rejecting geometries that do not tile exactly.
    ///
    /// # Errors
    /// - `ZeroDimension` if any dimension or the sample count is 0
    /// - `NotTileAligned` if the image is not a whole number of tiles
    /// - `UnsupportedBitsPerSample` unless samples are exactly one byte
    /// - `UnsupportedSamplesPerPixel` unless there is exactly one sample
    /// - `EncodingOverflow` if a tile or the whole raster exceeds 4 GiB
    pub fn derive(geometry: &ImageGeometry) -> Result<Self, BuildError> {
        let dims = [
            ("width", geometry.width),
            ("height", geometry.height),
            ("tile_width", geometry.tile_width),
            ("tile_length", geometry.tile_length),
            ("samples_per_pixel", geometry.samples_per_pixel as u32),
        ];
        if let Some(&(name, _)) = dims.iter().find(|(_, value)| *value == 0) {
            return Err(ConfigError::ZeroDimension { name }.into());
        }

        if geometry.bits_per_sample != BITS_PER_SAMPLE {
            return Err(ConfigError::UnsupportedBitsPerSample(geometry.bits_per_sample).into());
        }
        if geometry.samples_per_pixel != 1 {
            return Err(ConfigError::UnsupportedSamplesPerPixel(geometry.samples_per_pixel).into());
        }

        if geometry.width % geometry.tile_width != 0 {
            return Err(ConfigError::NotTileAligned {
                axis: "width",
                image: geometry.width,
                tile: geometry.tile_width,
            }
            .into());
        }
        if geometry.height % geometry.tile_length != 0 {
            return Err(ConfigError::NotTileAligned {
                axis: "height",
                image: geometry.height,
                tile: geometry.tile_length,
            }
            .into());
        }

        let tiles_wide = geometry.width / geometry.tile_width;
        let tiles_high = geometry.height / geometry.tile_length;
        let tile_count = tiles_wide.checked_mul(tiles_high).ok_or_else(|| {
            BuildError::overflow("tile count", tiles_wide as u64 * tiles_high as u64)
        })?;

        let tile_bytes = geometry.tile_width as u64
            * geometry.tile_length as u64
            * geometry.samples_per_pixel as u64
            * geometry.bytes_per_sample() as u64;
        let bytes_per_tile =
            u32::try_from(tile_bytes).map_err(|_| BuildError::overflow("tile size", tile_bytes))?;

        let grid = Self {
            tiles_wide,
            tiles_high,
            tile_count,
            bytes_per_tile,
        };
        grid.pixel_data_len()?;
        Ok(grid)
    }

    /// Total size of all tiles in bytes.
    pub fn pixel_data_len(&self) -> Result<u32, BuildError> {
        let total = self.tile_count as u64 * self.bytes_per_tile as u64;
        u32::try_from(total).map_err(|_| BuildError::overflow("pixel data", total))
    }

    /// Size of one tile index table (TileOffsets or TileByteCounts).
    pub fn index_table_len(&self) -> Result<u32, BuildError> {
        let total = self.tile_count as u64 * 4;
        u32::try_from(total).map_err(|_| BuildError::overflow("tile index table", total))
    }

    /// Row-major index of the tile at `(col, row)`.
    #[inline]
    pub fn tile_index(&self, col: u32, row: u32) -> Option<u32> {
        if col < self.tiles_wide && row < self.tiles_high {
            Some(row * self.tiles_wide + col)
        } else {
            None
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
