//! Tile index tables (TileOffsets and TileByteCounts).
//!
//! Tiles are stored uncompressed and contiguously in row-major order, so
//! tile `i` starts at `tile_data_offset + i * bytes_per_tile`.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::BuildError;

use super::grid::TileGrid;

/// Absolute offset of every tile, row-major.
///
/// # Errors
/// `EncodingOverflow` if the last tile would start beyond 4 GiB.
pub fn build_tile_offsets(tile_data_offset: u32, grid: &TileGrid) -> Result<Vec<u32>, BuildError> {
    (0..grid.tile_count)
        .map(|index| {
            index
                .checked_mul(grid.bytes_per_tile)
                .and_then(|relative| relative.checked_add(tile_data_offset))
                .ok_or_else(|| {
                    BuildError::overflow(
                        "tile offset",
                        tile_data_offset as u64 + index as u64 * grid.bytes_per_tile as u64,
                    )
                })
        })
        .collect()
}

/// Byte count of every tile (all tiles are the same size).
pub fn build_tile_byte_counts(grid: &TileGrid) -> Vec<u32> {
    vec![grid.bytes_per_tile; grid.tile_count as usize]
}

/// Encode a table of LONG values, little-endian.
pub fn encode_u32_table(values: &[u32]) -> Bytes {
    let mut buf = BytesMut::with_capacity(values.len() * 4);
    for &value in values {
        buf.put_u32_le(value);
    }
    buf.freeze()
}
