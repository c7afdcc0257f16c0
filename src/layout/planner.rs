//! Single-pass layout planning.
//!
//! The file is a fixed sequence of regions written back to back:
//!
//! ```text
//! ┌────────────┬─────────────┬─────┬─────────────┬────────────────┬───────────┐
//! │ TIFF header│ Ghost header│ IFD │ TileOffsets │ TileByteCounts │ Geo blocks│ → pixels
//! └────────────┴─────────────┴─────┴─────────────┴────────────────┴───────────┘
//! ```
//!
//! Every region length is known before any byte is written, so the offset of
//! each region is the prefix sum of the lengths before it. The planner is a
//! fold over `(RegionKind, length)` pairs; nothing is backpatched and no
//! region depends on a later one.

use serde::Serialize;
use tracing::debug;

use crate::error::BuildError;
use crate::format::ghost::GhostHeader;
use crate::format::geotiff::GeoMetadata;
use crate::format::tiff::{ifd_size, TIFF_HEADER_SIZE};

use super::grid::TileGrid;

// =============================================================================
// RegionKind
// =============================================================================

/// The regions of the file, in emission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RegionKind {
    TiffHeader = 0,
    GhostHeader = 1,
    Ifd = 2,
    TileOffsets = 3,
    TileByteCounts = 4,
    ModelTransform = 5,
    GeoKeyDirectory = 6,
    GeoDoubleParams = 7,
    GeoAsciiParams = 8,
    TilePixelData = 9,
}

impl RegionKind {
    /// All regions in the order they appear in the file.
    pub const ORDER: [RegionKind; 10] = [
        RegionKind::TiffHeader,
        RegionKind::GhostHeader,
        RegionKind::Ifd,
        RegionKind::TileOffsets,
        RegionKind::TileByteCounts,
        RegionKind::ModelTransform,
        RegionKind::GeoKeyDirectory,
        RegionKind::GeoDoubleParams,
        RegionKind::GeoAsciiParams,
        RegionKind::TilePixelData,
    ];

    /// Position of this region in [`RegionKind::ORDER`].
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn name(self) -> &'static str {
        match self {
            RegionKind::TiffHeader => "TIFF header",
            RegionKind::GhostHeader => "ghost header",
            RegionKind::Ifd => "IFD",
            RegionKind::TileOffsets => "tile offsets",
            RegionKind::TileByteCounts => "tile byte counts",
            RegionKind::ModelTransform => "model transform",
            RegionKind::GeoKeyDirectory => "GeoKey directory",
            RegionKind::GeoDoubleParams => "GeoDoubleParams",
            RegionKind::GeoAsciiParams => "GeoAsciiParams",
            RegionKind::TilePixelData => "tile pixel data",
        }
    }
}

// =============================================================================
// BlockLengths
// =============================================================================

/// Byte lengths of the fixed-content blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BlockLengths {
    pub ghost_header: u32,
    pub model_transform: u32,
    pub geo_key_directory: u32,
    pub geo_double_params: u32,
    pub geo_ascii_params: u32,
}

impl BlockLengths {
    /// Measure the blocks that will be written.
    pub fn measure(ghost: &GhostHeader, geo: &GeoMetadata) -> Result<Self, BuildError> {
        Ok(Self {
            ghost_header: to_u32("ghost header", ghost.byte_len())?,
            model_transform: to_u32("model transform", geo.model_transform().byte_len())?,
            geo_key_directory: to_u32("GeoKey directory", geo.key_directory().byte_len())?,
            geo_double_params: to_u32("GeoDoubleParams", geo.double_params().byte_len())?,
            geo_ascii_params: to_u32("GeoAsciiParams", geo.ascii_params().byte_len())?,
        })
    }
}

fn to_u32(what: &'static str, len: usize) -> Result<u32, BuildError> {
    u32::try_from(len).map_err(|_| BuildError::overflow(what, len as u64))
}

// =============================================================================
// OffsetTable
// =============================================================================

/// A placed region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Region {
    pub kind: RegionKind,
    pub offset: u32,
    pub length: u32,
}

impl Region {
    /// First byte after the region.
    #[inline]
    pub fn end(&self) -> u64 {
        self.offset as u64 + self.length as u64
    }
}

/// Absolute offsets of every region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OffsetTable {
    regions: Vec<Region>,
    total_len: u32,
}

impl OffsetTable {
    /// All regions in file order.
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn region(&self, kind: RegionKind) -> Region {
        self.regions[kind.index()]
    }

    pub fn offset(&self, kind: RegionKind) -> u32 {
        self.region(kind).offset
    }

    pub fn length(&self, kind: RegionKind) -> u32 {
        self.region(kind).length
    }

    /// Offset of the IFD (the first-IFD pointer in the header).
    pub fn ifd_offset(&self) -> u32 {
        self.offset(RegionKind::Ifd)
    }

    /// Offset of the first tile.
    pub fn tile_data_offset(&self) -> u32 {
        self.offset(RegionKind::TilePixelData)
    }

    /// Total file length.
    pub fn total_len(&self) -> u32 {
        self.total_len
    }
}

// =============================================================================
// Planning
// =============================================================================

/// Lengths of every region in file order.
///
/// `entry_count` is the number of IFD entries actually built; the IFD size is
/// derived from it rather than assumed.
pub fn region_lengths(
    grid: &TileGrid,
    blocks: &BlockLengths,
    entry_count: usize,
) -> Result<[(RegionKind, u32); 10], BuildError> {
    let index_table = grid.index_table_len()?;

    Ok([
        (RegionKind::TiffHeader, TIFF_HEADER_SIZE as u32),
        (RegionKind::GhostHeader, blocks.ghost_header),
        (RegionKind::Ifd, ifd_size(entry_count)?),
        (RegionKind::TileOffsets, index_table),
        (RegionKind::TileByteCounts, index_table),
        (RegionKind::ModelTransform, blocks.model_transform),
        (RegionKind::GeoKeyDirectory, blocks.geo_key_directory),
        (RegionKind::GeoDoubleParams, blocks.geo_double_params),
        (RegionKind::GeoAsciiParams, blocks.geo_ascii_params),
        (RegionKind::TilePixelData, grid.pixel_data_len()?),
    ])
}

/// Place every region by a prefix sum over the region lengths.
///
/// # Errors
/// `EncodingOverflow` if any offset or the total length leaves the 32-bit
/// classic TIFF address space.
pub fn plan_layout(
    grid: &TileGrid,
    blocks: &BlockLengths,
    entry_count: usize,
) -> Result<OffsetTable, BuildError> {
    let lengths = region_lengths(grid, blocks, entry_count)?;

    let (regions, total_len) = lengths.iter().try_fold(
        (Vec::with_capacity(lengths.len()), 0u32),
        |(mut regions, cursor), &(kind, length)| {
            let next = cursor
                .checked_add(length)
                .ok_or_else(|| BuildError::overflow(kind.name(), cursor as u64 + length as u64))?;
            regions.push(Region {
                kind,
                offset: cursor,
                length,
            });
            Ok::<_, BuildError>((regions, next))
        },
    )?;

    let table = OffsetTable { regions, total_len };

    debug!(
        ifd_offset = table.ifd_offset(),
        tile_data_offset = table.tile_data_offset(),
        total_len = table.total_len(),
        entry_count,
        "Planned TIFF layout"
    );

    Ok(table)
}

// =============================================================================
// Tests
// =============================================================================
