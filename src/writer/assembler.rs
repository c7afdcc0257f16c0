//! Stream assembly.
//!
//! Assembly has two phases. [`GeoTiffBuilder::plan`] validates the
//! configuration, places every region and encodes all metadata; nothing in
//! it depends on pixel values. [`GeoTiffPlan::build`] then pulls the tiles
//! from a [`PixelSource`] and concatenates every region in file order.
//!
//! Any failure surfaces before the final buffer exists: a caller either gets
//! a complete stream or an error.

use bytes::{BufMut, Bytes, BytesMut};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::BuildError;
use crate::format::geotiff::GeoMetadata;
use crate::format::ghost::GhostHeader;
use crate::format::tiff::{serialize_ifd, DirectoryEntry, TIFF_HEADER_SIZE};
use crate::layout::{
    build_tags, build_tile_byte_counts, build_tile_offsets, encode_u32_table, plan_layout,
    tag_schema, BlockLengths, ImageGeometry, OffsetTable, Region, RegionKind, TileGrid,
};

use super::pixels::PixelSource;

// =============================================================================
// TiffHeader
// =============================================================================

/// Little-endian byte order mark ("II").
const LITTLE_ENDIAN_MARK: &[u8; 2] = b"II";

/// Classic TIFF version number.
const TIFF_VERSION: u16 = 42;

/// The 8-byte classic TIFF header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TiffHeader {
    /// Absolute offset of the first (and only) IFD
    pub first_ifd_offset: u32,
}

impl TiffHeader {
    pub const fn new(first_ifd_offset: u32) -> Self {
        Self { first_ifd_offset }
    }

    /// `II`, 42, first-IFD offset.
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(TIFF_HEADER_SIZE);
        buf.put_slice(LITTLE_ENDIAN_MARK);
        buf.put_u16_le(TIFF_VERSION);
        buf.put_u32_le(self.first_ifd_offset);
        buf.freeze()
    }
}

// =============================================================================
// Assembly
// =============================================================================

/// Encoded bytes of every region.
#[derive(Debug, Clone, Default)]
pub struct AssemblyParts {
    pub header: Bytes,
    pub ghost_header: Bytes,
    pub ifd: Bytes,
    pub tile_offsets: Bytes,
    pub tile_byte_counts: Bytes,
    pub model_transform: Bytes,
    pub geo_key_directory: Bytes,
    pub geo_double_params: Bytes,
    pub geo_ascii_params: Bytes,
    pub pixel_data: Bytes,
}

impl AssemblyParts {
    /// Bytes of the given region.
    pub fn part(&self, kind: RegionKind) -> &Bytes {
        match kind {
            RegionKind::TiffHeader => &self.header,
            RegionKind::GhostHeader => &self.ghost_header,
            RegionKind::Ifd => &self.ifd,
            RegionKind::TileOffsets => &self.tile_offsets,
            RegionKind::TileByteCounts => &self.tile_byte_counts,
            RegionKind::ModelTransform => &self.model_transform,
            RegionKind::GeoKeyDirectory => &self.geo_key_directory,
            RegionKind::GeoDoubleParams => &self.geo_double_params,
            RegionKind::GeoAsciiParams => &self.geo_ascii_params,
            RegionKind::TilePixelData => &self.pixel_data,
        }
    }
}

/// Concatenate every region in file order, without padding.
///
/// # Errors
/// `RegionLength` if any part differs from its planned region length. The
/// check covers every part before the buffer is allocated.
pub fn assemble(parts: &AssemblyParts, offsets: &OffsetTable) -> Result<Bytes, BuildError> {
    for region in offsets.regions() {
        let actual = parts.part(region.kind).len();
        if actual != region.length as usize {
            return Err(BuildError::RegionLength {
                region: region.kind.name(),
                expected: region.length,
                actual,
            });
        }
    }

    let mut buf = BytesMut::with_capacity(offsets.total_len() as usize);
    for region in offsets.regions() {
        debug_assert_eq!(
            buf.len(),
            region.offset as usize,
            "{} starts at the wrong offset",
            region.kind.name()
        );
        buf.extend_from_slice(parts.part(region.kind));
    }

    debug_assert_eq!(buf.len(), offsets.total_len() as usize);
    Ok(buf.freeze())
}

// =============================================================================
// GeoTiffBuilder
// =============================================================================

/// Entry point for producing a tiled GeoTIFF.
///
/// # Example
///
/// ```
/// use geotiff_builder::{ConstantFill, GeoTiffBuilder, ImageGeometry};
///
/// let plan = GeoTiffBuilder::new(ImageGeometry::grayscale(256, 256, 128))
///     .plan()
///     .unwrap();
/// let file = plan.build(&mut ConstantFill(0)).unwrap();
/// assert_eq!(&file.bytes()[0..4], b"II*\0");
/// ```
#[derive(Debug, Clone)]
pub struct GeoTiffBuilder {
    geometry: ImageGeometry,
    geo: GeoMetadata,
    ghost: GhostHeader,
}

impl GeoTiffBuilder {
    /// Builder with the Moon 2000 georeferencing and the GDAL ghost header.
    pub fn new(geometry: ImageGeometry) -> Self {
        Self {
            geometry,
            geo: GeoMetadata::default(),
            ghost: GhostHeader::default(),
        }
    }

    pub fn with_geo_metadata(mut self, geo: GeoMetadata) -> Self {
        self.geo = geo;
        self
    }

    pub fn with_ghost_header(mut self, ghost: GhostHeader) -> Self {
        self.ghost = ghost;
        self
    }

    /// Validate, place every region and encode all metadata.
    pub fn plan(self) -> Result<GeoTiffPlan, BuildError> {
        let grid = TileGrid::derive(&self.geometry)?;
        let blocks = BlockLengths::measure(&self.ghost, &self.geo)?;
        let offsets = plan_layout(&grid, &blocks, tag_schema().len())?;
        let entries = build_tags(&self.geometry, &grid, &offsets, &self.geo)?;

        let tile_offsets = build_tile_offsets(offsets.tile_data_offset(), &grid)?;

        let metadata = AssemblyParts {
            header: TiffHeader::new(offsets.ifd_offset()).encode(),
            ghost_header: self.ghost.encode(),
            ifd: serialize_ifd(&entries)?,
            tile_offsets: encode_u32_table(&tile_offsets),
            tile_byte_counts: encode_u32_table(&build_tile_byte_counts(&grid)),
            model_transform: self.geo.model_transform().encode(),
            geo_key_directory: self.geo.key_directory().encode(),
            geo_double_params: self.geo.double_params().encode(),
            geo_ascii_params: self.geo.ascii_params().encode(),
            pixel_data: Bytes::new(),
        };

        debug!(
            tiles_wide = grid.tiles_wide,
            tiles_high = grid.tiles_high,
            bytes_per_tile = grid.bytes_per_tile,
            entries = entries.len(),
            "Planned GeoTIFF {}x{}",
            self.geometry.width,
            self.geometry.height
        );

        Ok(GeoTiffPlan {
            geometry: self.geometry,
            grid,
            offsets,
            entries,
            metadata,
        })
    }
}

// =============================================================================
// GeoTiffPlan
// =============================================================================

/// A fully planned file, waiting only for pixel data.
#[derive(Debug, Clone)]
pub struct GeoTiffPlan {
    geometry: ImageGeometry,
    grid: TileGrid,
    offsets: OffsetTable,
    entries: Vec<DirectoryEntry>,
    metadata: AssemblyParts,
}

impl GeoTiffPlan {
    pub fn geometry(&self) -> &ImageGeometry {
        &self.geometry
    }

    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    pub fn offsets(&self) -> &OffsetTable {
        &self.offsets
    }

    /// Directory entries in the order they are written.
    pub fn entries(&self) -> &[DirectoryEntry] {
        &self.entries
    }

    /// Encoded metadata regions (pixel data empty).
    pub fn metadata(&self) -> &AssemblyParts {
        &self.metadata
    }

    /// Pull every tile from `source` and assemble the file.
    ///
    /// # Errors
    /// `PixelSource` if a tile is not exactly `bytes_per_tile` long.
    /// `RegionLength` if a part disagrees with the plan.
    pub fn build(&self, source: &mut dyn PixelSource) -> Result<GeoTiffFile, BuildError> {
        let pixel_data = self.collect_tiles(source)?;
        let parts = AssemblyParts {
            pixel_data,
            ..self.metadata.clone()
        };
        let bytes = assemble(&parts, &self.offsets)?;

        info!(
            size = bytes.len(),
            tiles = self.grid.tile_count,
            "Assembled GeoTIFF"
        );

        Ok(GeoTiffFile {
            bytes,
            offsets: self.offsets.clone(),
        })
    }

    fn collect_tiles(&self, source: &mut dyn PixelSource) -> Result<Bytes, BuildError> {
        let expected = self.grid.bytes_per_tile as usize;
        let mut buf = BytesMut::with_capacity(self.offsets.length(RegionKind::TilePixelData) as usize);

        for tile_index in 0..self.grid.tile_count {
            let tile = source.produce_tile_bytes(tile_index, expected);
            if tile.len() != expected {
                return Err(BuildError::PixelSource {
                    tile_index,
                    expected,
                    actual: tile.len(),
                });
            }
            buf.extend_from_slice(&tile);
        }

        Ok(buf.freeze())
    }

    /// Serializable description of the layout.
    pub fn report(&self) -> LayoutReport {
        LayoutReport {
            geometry: self.geometry,
            grid: self.grid,
            regions: self.offsets.regions().to_vec(),
            total_len: self.offsets.total_len(),
            entries: self.entries.iter().map(EntryReport::from).collect(),
        }
    }
}

/// Layout summary printed by `generate --layout-json`.
#[derive(Debug, Clone, Serialize)]
pub struct LayoutReport {
    pub geometry: ImageGeometry,
    pub grid: TileGrid,
    pub regions: Vec<Region>,
    pub total_len: u32,
    pub entries: Vec<EntryReport>,
}

/// One directory entry in a [`LayoutReport`].
#[derive(Debug, Clone, Serialize)]
pub struct EntryReport {
    pub tag: u16,
    pub name: &'static str,
    pub field_type: u16,
    pub count: u32,
    pub value_or_offset: u32,
}

impl From<&DirectoryEntry> for EntryReport {
    fn from(entry: &DirectoryEntry) -> Self {
        Self {
            tag: entry.tag.as_u16(),
            name: entry.tag.name(),
            field_type: entry.field_type.as_u16(),
            count: entry.count,
            value_or_offset: entry.value_or_offset,
        }
    }
}

// =============================================================================
// GeoTiffFile
// =============================================================================

/// A complete, assembled file.
#[derive(Debug, Clone)]
pub struct GeoTiffFile {
    bytes: Bytes,
    offsets: OffsetTable,
}

impl GeoTiffFile {
    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn into_bytes(self) -> Bytes {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn offsets(&self) -> &OffsetTable {
        &self.offsets
    }

    /// Bytes of a single region.
    pub fn region_bytes(&self, kind: RegionKind) -> &[u8] {
        let region = self.offsets.region(kind);
        &self.bytes[region.offset as usize..region.end() as usize]
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::pixels::{ConstantFill, GradientFill, RandomFill};

    fn default_plan() -> GeoTiffPlan {
        GeoTiffBuilder::new(ImageGeometry::default()).plan().unwrap()
    }

    #[test]
    fn test_header_encoding() {
        let bytes = TiffHeader::new(191).encode();
        assert_eq!(&bytes[..], &[0x49, 0x49, 0x2A, 0x00, 0xBF, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn test_default_file_size() {
        let plan = default_plan();
        let file = plan.build(&mut ConstantFill(0)).unwrap();

        assert_eq!(file.len(), plan.offsets().total_len() as usize);
        assert_eq!(file.len(), 1351 + 64 * 16384);
        assert_eq!(&file.bytes()[4..8], &191u32.to_le_bytes());
    }

    #[test]
    fn test_regions_hold_their_parts() {
        let plan = default_plan();
        let file = plan.build(&mut GradientFill).unwrap();
        let metadata = plan.metadata();

        for kind in RegionKind::ORDER {
            if kind == RegionKind::TilePixelData {
                continue;
            }
            assert_eq!(file.region_bytes(kind), &metadata.part(kind)[..], "{:?}", kind);
        }

        let ghost = file.region_bytes(RegionKind::GhostHeader);
        assert!(ghost.starts_with(b"GDAL_STRUCTURAL_METADATA_SIZE=000140 bytes\n"));
    }

    #[test]
    fn test_tiles_are_in_index_order() {
        let plan = default_plan();
        let file = plan.build(&mut GradientFill).unwrap();
        let start = plan.offsets().tile_data_offset() as usize;
        let bytes = file.bytes();

        for tile_index in [0u32, 1, 9, 63] {
            let offset = start + tile_index as usize * 16384;
            assert_eq!(bytes[offset], GradientFill::sample(tile_index, 0));
            assert_eq!(bytes[offset + 100], GradientFill::sample(tile_index, 100));
        }
    }

    #[test]
    fn test_metadata_is_deterministic() {
        let a = default_plan().build(&mut RandomFill::seeded(1)).unwrap();
        let b = default_plan().build(&mut RandomFill::seeded(2)).unwrap();
        let data_start = a.offsets().tile_data_offset() as usize;

        assert_eq!(&a.bytes()[..data_start], &b.bytes()[..data_start]);
        assert_ne!(&a.bytes()[data_start..], &b.bytes()[data_start..]);
    }

    #[test]
    fn test_short_tile_is_rejected() {
        let plan = default_plan();
        let mut source = |index: u32, len: usize| {
            if index == 3 {
                vec![0; len - 1]
            } else {
                vec![0; len]
            }
        };

        let result = plan.build(&mut source);
        assert!(matches!(
            result,
            Err(BuildError::PixelSource {
                tile_index: 3,
                expected: 16384,
                actual: 16383
            })
        ));
    }

    #[test]
    fn test_short_part_is_rejected_before_assembly() {
        let plan = default_plan();
        let mut parts = plan.metadata().clone();
        parts.model_transform = parts.model_transform.slice(..120);
        parts.pixel_data = Bytes::from(vec![0u8; 64 * 16384]);

        let result = assemble(&parts, plan.offsets());
        assert!(matches!(
            result,
            Err(BuildError::RegionLength {
                region: "model transform",
                expected: 128,
                actual: 120,
            })
        ));
    }

    #[test]
    fn test_missing_pixel_data_is_rejected() {
        let plan = default_plan();
        let result = assemble(plan.metadata(), plan.offsets());
        assert!(matches!(
            result,
            Err(BuildError::RegionLength {
                region: "tile pixel data",
                actual: 0,
                ..
            })
        ));
    }

    #[test]
    fn test_matching_parts_assemble() {
        let plan = default_plan();
        let mut parts = plan.metadata().clone();
        parts.pixel_data = Bytes::from(vec![0u8; 64 * 16384]);

        let bytes = assemble(&parts, plan.offsets()).unwrap();
        assert_eq!(bytes.len(), plan.offsets().total_len() as usize);
    }

    #[test]
    fn test_invalid_geometry_fails_at_plan() {
        let result = GeoTiffBuilder::new(ImageGeometry::grayscale(1000, 1000, 128)).plan();
        assert!(matches!(result, Err(BuildError::Config(_))));
    }

    #[test]
    fn test_custom_ghost_header_moves_ifd() {
        let ghost = GhostHeader::from_items(&[("LAYOUT".to_string(), "IFDS_BEFORE_DATA".to_string())])
            .unwrap();
        let ghost_len = ghost.byte_len() as u32;
        let plan = GeoTiffBuilder::new(ImageGeometry::default())
            .with_ghost_header(ghost)
            .plan()
            .unwrap();

        assert_eq!(plan.offsets().ifd_offset(), 8 + ghost_len);
    }

    #[test]
    fn test_report_serializes() {
        let report = default_plan().report();
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["total_len"], 1351 + 64 * 16384);
        assert_eq!(json["regions"][2]["kind"], "Ifd");
        assert_eq!(json["regions"][2]["offset"], 191);
        assert_eq!(json["entries"].as_array().unwrap().len(), 14);
        assert_eq!(json["entries"][13]["name"], "GeoAsciiParams");
    }
}
