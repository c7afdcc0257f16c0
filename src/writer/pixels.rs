//! Pixel sources.
//!
//! The assembler asks a [`PixelSource`] for each tile in tile-index order and
//! copies the returned bytes verbatim into the pixel region. Tiles are
//! uncompressed, so a source must return exactly `bytes_per_tile` bytes.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Supplies the raw bytes of each tile.
pub trait PixelSource {
    /// Produce the `bytes_per_tile` bytes of tile `tile_index` (row-major).
    fn produce_tile_bytes(&mut self, tile_index: u32, bytes_per_tile: usize) -> Vec<u8>;
}

impl<F> PixelSource for F
where
    F: FnMut(u32, usize) -> Vec<u8>,
{
    fn produce_tile_bytes(&mut self, tile_index: u32, bytes_per_tile: usize) -> Vec<u8> {
        self(tile_index, bytes_per_tile)
    }
}

// =============================================================================
// RandomFill
// =============================================================================

/// Uniformly random bytes.
///
/// Seeded sources are reproducible; unseeded ones draw from OS entropy.
pub struct RandomFill {
    rng: StdRng,
}

impl RandomFill {
    /// Reproducible source.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Source seeded from OS entropy.
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn new(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::seeded(seed),
            None => Self::from_entropy(),
        }
    }
}

impl PixelSource for RandomFill {
    fn produce_tile_bytes(&mut self, _tile_index: u32, bytes_per_tile: usize) -> Vec<u8> {
        let mut tile = vec![0u8; bytes_per_tile];
        self.rng.fill(&mut tile[..]);
        tile
    }
}

// =============================================================================
// ConstantFill
// =============================================================================

/// Every sample set to the same value.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConstantFill(pub u8);

impl PixelSource for ConstantFill {
    fn produce_tile_bytes(&mut self, _tile_index: u32, bytes_per_tile: usize) -> Vec<u8> {
        vec![self.0; bytes_per_tile]
    }
}

// =============================================================================
// GradientFill
// =============================================================================

/// Deterministic ramp that differs from tile to tile.
///
/// Byte `i` of tile `t` is `(i + 37 * t) mod 256`, which makes misplaced or
/// reordered tiles easy to spot.
#[derive(Debug, Clone, Copy, Default)]
pub struct GradientFill;

impl GradientFill {
    /// Value of byte `position` in tile `tile_index`.
    #[inline]
    pub fn sample(tile_index: u32, position: usize) -> u8 {
        (position as u64).wrapping_add(37 * tile_index as u64) as u8
    }
}

impl PixelSource for GradientFill {
    fn produce_tile_bytes(&mut self, tile_index: u32, bytes_per_tile: usize) -> Vec<u8> {
        (0..bytes_per_tile)
            .map(|position| Self::sample(tile_index, position))
            .collect()
    }
}
