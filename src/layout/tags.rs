//! The IFD tag table.
//!
//! The table is driven by a static schema listing every tag the file carries,
//! in ascending tag order, and where its value comes from: a scalar taken
//! from the image geometry, or one of the planned regions. The schema is
//! available before any offsets are known so the planner can size the IFD
//! from it.

use bytes::Bytes;

use crate::error::ConfigError;
use crate::format::geotiff::{GeoMetadata, ModelTransform};
use crate::format::tiff::{Compression, DirectoryEntry, Photometric, TiffTag};

use super::grid::{ImageGeometry, TileGrid};
use super::planner::{OffsetTable, RegionKind};

// =============================================================================
// Schema
// =============================================================================

/// Where a tag's value comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagValue {
    /// Single inline value derived from the geometry
    Scalar,
    /// Array stored in the given region
    Region(RegionKind),
}

/// One row of the tag schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagSpec {
    pub tag: TiffTag,
    pub value: TagValue,
}

const fn scalar(tag: TiffTag) -> TagSpec {
    TagSpec {
        tag,
        value: TagValue::Scalar,
    }
}

const fn region(tag: TiffTag, kind: RegionKind) -> TagSpec {
    TagSpec {
        tag,
        value: TagValue::Region(kind),
    }
}

const TAG_SCHEMA: [TagSpec; 14] = [
    scalar(TiffTag::ImageWidth),
    scalar(TiffTag::ImageLength),
    scalar(TiffTag::BitsPerSample),
    scalar(TiffTag::Compression),
    scalar(TiffTag::PhotometricInterpretation),
    scalar(TiffTag::SamplesPerPixel),
    scalar(TiffTag::TileWidth),
    scalar(TiffTag::TileLength),
    region(TiffTag::TileOffsets, RegionKind::TileOffsets),
    region(TiffTag::TileByteCounts, RegionKind::TileByteCounts),
    region(TiffTag::ModelTransformation, RegionKind::ModelTransform),
    region(TiffTag::GeoKeyDirectory, RegionKind::GeoKeyDirectory),
    region(TiffTag::GeoDoubleParams, RegionKind::GeoDoubleParams),
    region(TiffTag::GeoAsciiParams, RegionKind::GeoAsciiParams),
];

/// Every tag written to the IFD, in ascending order.
pub fn tag_schema() -> &'static [TagSpec] {
    &TAG_SCHEMA
}

fn schema_entry(tag: TiffTag) -> Option<&'static TagSpec> {
    TAG_SCHEMA.iter().find(|spec| spec.tag == tag)
}

// =============================================================================
// Building
// =============================================================================

/// Build the directory entries for a planned file.
///
/// Array tags point at their region. An array small enough to fit in the
/// 4-byte value field (a single-tile image, a very short ASCII block) is
/// stored inline instead, as TIFF requires.
pub fn build_tags(
    geometry: &ImageGeometry,
    grid: &TileGrid,
    offsets: &OffsetTable,
    geo: &GeoMetadata,
) -> Result<Vec<DirectoryEntry>, ConfigError> {
    let entries = tag_schema()
        .iter()
        .map(|spec| match spec.value {
            TagValue::Scalar => Ok(DirectoryEntry::inline(
                spec.tag,
                scalar_value(spec.tag, geometry)?,
            )),
            TagValue::Region(kind) => region_entry(spec.tag, kind, grid, offsets, geo),
        })
        .collect::<Result<Vec<_>, _>>()?;

    check_tag_table(&entries, offsets)?;
    Ok(entries)
}

fn scalar_value(tag: TiffTag, geometry: &ImageGeometry) -> Result<u32, ConfigError> {
    let value = match tag {
        TiffTag::ImageWidth => geometry.width,
        TiffTag::ImageLength => geometry.height,
        TiffTag::BitsPerSample => geometry.bits_per_sample as u32,
        TiffTag::Compression => Compression::None as u32,
        TiffTag::PhotometricInterpretation => Photometric::BlackIsZero as u32,
        TiffTag::SamplesPerPixel => geometry.samples_per_pixel as u32,
        TiffTag::TileWidth => geometry.tile_width,
        TiffTag::TileLength => geometry.tile_length,
        _ => {
            return Err(ConfigError::TagMismatch {
                tag: tag.name(),
                message: "no scalar value is defined for this tag".to_string(),
            })
        }
    };
    Ok(value)
}

fn not_a_data_region(tag: TiffTag, kind: RegionKind) -> ConfigError {
    ConfigError::TagMismatch {
        tag: tag.name(),
        message: format!("the {} region holds no tag payload", kind.name()),
    }
}

fn region_entry(
    tag: TiffTag,
    kind: RegionKind,
    grid: &TileGrid,
    offsets: &OffsetTable,
    geo: &GeoMetadata,
) -> Result<DirectoryEntry, ConfigError> {
    let count = match kind {
        RegionKind::TileOffsets | RegionKind::TileByteCounts => grid.tile_count as usize,
        RegionKind::ModelTransform => ModelTransform::ELEMENT_COUNT,
        RegionKind::GeoKeyDirectory => geo.key_directory().element_count(),
        RegionKind::GeoDoubleParams => geo.double_params().len(),
        RegionKind::GeoAsciiParams => geo.ascii_params().byte_len(),
        RegionKind::TiffHeader
        | RegionKind::GhostHeader
        | RegionKind::Ifd
        | RegionKind::TilePixelData => return Err(not_a_data_region(tag, kind)),
    };
    let count = u32::try_from(count).map_err(|_| ConfigError::TagMismatch {
        tag: tag.name(),
        message: format!("count {} does not fit in 32 bits", count),
    })?;

    let field_type = tag.field_type();
    let value_or_offset = if field_type.fits_inline(count) {
        pack_inline(&inline_payload(tag, kind, grid, offsets, geo)?)
    } else {
        offsets.offset(kind)
    };

    Ok(DirectoryEntry {
        tag,
        field_type,
        count,
        value_or_offset,
    })
}

/// Payload of a region-backed tag, used only when it fits inline.
fn inline_payload(
    tag: TiffTag,
    kind: RegionKind,
    grid: &TileGrid,
    offsets: &OffsetTable,
    geo: &GeoMetadata,
) -> Result<Bytes, ConfigError> {
    let payload = match kind {
        RegionKind::TileOffsets => {
            Bytes::copy_from_slice(&offsets.tile_data_offset().to_le_bytes())
        }
        RegionKind::TileByteCounts => Bytes::copy_from_slice(&grid.bytes_per_tile.to_le_bytes()),
        RegionKind::ModelTransform => geo.model_transform().encode(),
        RegionKind::GeoKeyDirectory => geo.key_directory().encode(),
        RegionKind::GeoDoubleParams => geo.double_params().encode(),
        RegionKind::GeoAsciiParams => geo.ascii_params().encode(),
        RegionKind::TiffHeader
        | RegionKind::GhostHeader
        | RegionKind::Ifd
        | RegionKind::TilePixelData => return Err(not_a_data_region(tag, kind)),
    };
    Ok(payload)
}

/// Left-justify up to 4 payload bytes in the value field.
fn pack_inline(payload: &[u8]) -> u32 {
    let mut word = [0u8; 4];
    let len = payload.len().min(word.len());
    word[..len].copy_from_slice(&payload[..len]);
    u32::from_le_bytes(word)
}

// =============================================================================
// Checking
// =============================================================================

/// Check a tag table against the schema and the planned regions.
///
/// Verifies that:
/// - tags are strictly ascending and each schema tag appears once
/// - every entry carries the type code its tag requires
/// - scalar tags are single inline values
/// - every region-backed entry's `count * element size` equals the length of
///   its region, and out-of-line entries point at the region start
pub fn check_tag_table(entries: &[DirectoryEntry], offsets: &OffsetTable) -> Result<(), ConfigError> {
    for pair in entries.windows(2) {
        if pair[0].tag >= pair[1].tag {
            return Err(ConfigError::TagMismatch {
                tag: pair[1].tag.name(),
                message: format!(
                    "tag {} follows {} (tags must be strictly ascending)",
                    pair[1].tag.as_u16(),
                    pair[0].tag.as_u16()
                ),
            });
        }
    }

    if entries.len() != tag_schema().len() {
        return Err(ConfigError::TagMismatch {
            tag: "IFD",
            message: format!(
                "{} entries, expected {}",
                entries.len(),
                tag_schema().len()
            ),
        });
    }

    for entry in entries {
        let tag = entry.tag.name();
        let spec = schema_entry(entry.tag).ok_or_else(|| ConfigError::TagMismatch {
            tag,
            message: "not part of the tag schema".to_string(),
        })?;

        if entry.field_type != entry.tag.field_type() {
            return Err(ConfigError::TagMismatch {
                tag,
                message: format!(
                    "type {} written, {} required",
                    entry.field_type.as_u16(),
                    entry.tag.field_type().as_u16()
                ),
            });
        }

        match spec.value {
            TagValue::Scalar => {
                if entry.count != 1 || !entry.is_inline() {
                    return Err(ConfigError::TagMismatch {
                        tag,
                        message: format!("scalar tag has count {}", entry.count),
                    });
                }
            }
            TagValue::Region(kind) => {
                let region = offsets.region(kind);
                let payload_len = entry.payload_len().unwrap_or(u64::MAX);
                if payload_len != region.length as u64 {
                    return Err(ConfigError::TagMismatch {
                        tag,
                        message: format!(
                            "{} payload bytes but the {} region holds {}",
                            payload_len,
                            kind.name(),
                            region.length
                        ),
                    });
                }
                if !entry.is_inline() && entry.value_or_offset != region.offset {
                    return Err(ConfigError::TagMismatch {
                        tag,
                        message: format!(
                            "points at {} but the {} region starts at {}",
                            entry.value_or_offset,
                            kind.name(),
                            region.offset
                        ),
                    });
                }
            }
        }
    }

    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
