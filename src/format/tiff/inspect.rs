//! Read-back inspection of generated files.
//!
//! [`inspect`] parses the header and the first IFD and resolves every entry's
//! value bytes. [`validate_file`] then checks the result against what a tiled
//! uncompressed GeoTIFF must satisfy:
//!
//! - **Directory**: tags strictly ascending
//! - **Organization**: tiled only (no strips)
//! - **Compression**: none
//! - **Samples**: one BitsPerSample value per sample, and a single-band
//!   photometric interpretation only with one sample per pixel
//! - **Tiles**: one offset and byte count per tile, every tile inside the
//!   file and no two tiles overlapping
//! - **GeoKeys**: directory well formed, references resolvable
//! - **Ghost header**: declared size matches the bytes before the IFD

use bytes::Bytes;
use serde::Serialize;
use thiserror::Error;

use crate::error::TiffError;
use crate::format::geotiff::{GeoAsciiParams, GeoDoubleParams, GeoKeyDirectory};
use crate::format::ghost::GhostHeader;

use super::parser::{ByteOrder, Ifd, IfdEntry, TiffHeader, TIFF_HEADER_SIZE};
use super::tags::{Compression, FieldType, Photometric, TiffTag};

/// Prefix identifying a ghost header between the TIFF header and the IFD.
const GHOST_MARKER: &[u8] = b"GDAL_STRUCTURAL_METADATA_SIZE=";

/// Number of values shown per entry in a summary.
const SUMMARY_VALUES: usize = 6;

// =============================================================================
// Inspection
// =============================================================================

/// A directory entry together with its resolved value bytes.
#[derive(Debug, Clone)]
pub struct InspectedEntry {
    pub entry: IfdEntry,

    /// The `count * element size` value bytes, wherever they are stored
    pub value: Bytes,
}

impl InspectedEntry {
    /// Values of a SHORT or LONG entry, widened to u32.
    pub fn as_u32s(&self, byte_order: ByteOrder) -> Option<Vec<u32>> {
        match self.entry.field_type {
            FieldType::Short => Some(
                self.value
                    .chunks_exact(2)
                    .map(|c| byte_order.read_u16(c) as u32)
                    .collect(),
            ),
            FieldType::Long => Some(
                self.value
                    .chunks_exact(4)
                    .map(|c| byte_order.read_u32(c))
                    .collect(),
            ),
            _ => None,
        }
    }

    /// Values of a SHORT entry.
    pub fn as_u16s(&self, byte_order: ByteOrder) -> Option<Vec<u16>> {
        (self.entry.field_type == FieldType::Short).then(|| {
            self.value
                .chunks_exact(2)
                .map(|c| byte_order.read_u16(c))
                .collect()
        })
    }

    /// Values of a DOUBLE entry.
    pub fn as_f64s(&self, byte_order: ByteOrder) -> Option<Vec<f64>> {
        (self.entry.field_type == FieldType::Double).then(|| {
            self.value
                .chunks_exact(8)
                .map(|c| byte_order.read_f64(c))
                .collect()
        })
    }

    /// Text of an ASCII entry (lossy).
    pub fn as_text(&self) -> Option<String> {
        (self.entry.field_type == FieldType::Ascii)
            .then(|| String::from_utf8_lossy(&self.value).into_owned())
    }

    /// Short human-readable rendering of the value.
    pub fn summary(&self, byte_order: ByteOrder) -> String {
        if let Some(text) = self.as_text() {
            return format!("{:?}", text);
        }

        let rendered: Vec<String> = if let Some(values) = self.as_u32s(byte_order) {
            values.iter().map(u32::to_string).collect()
        } else if let Some(values) = self.as_f64s(byte_order) {
            values.iter().map(f64::to_string).collect()
        } else {
            self.value.iter().map(|b| format!("{:02X}", b)).collect()
        };

        let shown = rendered
            .iter()
            .take(SUMMARY_VALUES)
            .cloned()
            .collect::<Vec<_>>()
            .join(", ");
        if rendered.len() > SUMMARY_VALUES {
            format!("[{}, ... ({} values)]", shown, rendered.len())
        } else if rendered.len() == 1 {
            shown
        } else {
            format!("[{}]", shown)
        }
    }
}

/// A parsed file.
#[derive(Debug, Clone)]
pub struct InspectedFile {
    pub header: TiffHeader,

    /// Directory as read, entries in file order
    pub ifd: Ifd,

    /// Entries with their resolved values, in file order
    pub entries: Vec<InspectedEntry>,

    /// Bytes between the TIFF header and the IFD
    pub pre_ifd: Bytes,

    /// Total file length
    pub file_len: u64,
}

impl InspectedFile {
    #[inline]
    pub fn byte_order(&self) -> ByteOrder {
        self.header.byte_order
    }

    pub fn entry(&self, tag: TiffTag) -> Option<&InspectedEntry> {
        self.entries.iter().find(|e| e.entry.tag_id == tag.as_u16())
    }

    /// Scalar value of an inline SHORT or LONG tag.
    pub fn scalar(&self, tag: TiffTag) -> Option<u32> {
        self.ifd.scalar(tag, self.byte_order())
    }

    pub fn u32s(&self, tag: TiffTag) -> Option<Vec<u32>> {
        self.entry(tag)?.as_u32s(self.byte_order())
    }

    /// The ghost header, if the bytes before the IFD carry one.
    pub fn ghost_header(&self) -> Option<Result<GhostHeader, String>> {
        self.pre_ifd
            .starts_with(GHOST_MARKER)
            .then(|| GhostHeader::parse(&self.pre_ifd).map_err(|e| e.to_string()))
    }
}

/// Parse the header and first IFD of `bytes` and resolve every entry value.
///
/// # Errors
/// Any structural problem that prevents reading the directory: a bad
/// header, a truncated IFD, an unknown field type, or an out-of-line value
/// lying outside the file.
pub fn inspect(bytes: &[u8]) -> Result<InspectedFile, TiffError> {
    let file_len = bytes.len() as u64;
    let header = TiffHeader::parse(bytes, file_len)?;
    let byte_order = header.byte_order;
    let ifd = Ifd::parse(bytes, header.first_ifd_offset, byte_order)?;

    let entries = ifd
        .entries
        .iter()
        .map(|entry| resolve_entry(bytes, entry, byte_order))
        .collect::<Result<Vec<_>, _>>()?;

    let pre_ifd = Bytes::copy_from_slice(&bytes[TIFF_HEADER_SIZE..header.first_ifd_offset as usize]);

    Ok(InspectedFile {
        header,
        ifd,
        entries,
        pre_ifd,
        file_len,
    })
}

fn resolve_entry(
    bytes: &[u8],
    entry: &IfdEntry,
    byte_order: ByteOrder,
) -> Result<InspectedEntry, TiffError> {
    let offset = entry.value_offset(byte_order) as u64;
    let out_of_bounds = || TiffError::ValueOutOfBounds {
        tag: entry.tag_id,
        offset,
        len: entry.payload_len().unwrap_or(u64::MAX),
    };

    let len = entry.payload_len().ok_or_else(out_of_bounds)?;
    let value = if entry.is_inline() {
        Bytes::copy_from_slice(&entry.value_offset_bytes[..len as usize])
    } else {
        let end = offset.checked_add(len).ok_or_else(out_of_bounds)?;
        if end > bytes.len() as u64 {
            return Err(out_of_bounds());
        }
        Bytes::copy_from_slice(&bytes[offset as usize..end as usize])
    };

    Ok(InspectedEntry {
        entry: *entry,
        value,
    })
}

// =============================================================================
// Validation Result
// =============================================================================

/// Result of validating an inspected file.
#[derive(Debug, Clone)]
pub struct ValidationResult {
    /// Whether every check passed
    pub is_valid: bool,

    /// Validation errors (empty if valid)
    pub errors: Vec<ValidationError>,

    /// Non-fatal findings
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn ok() -> Self {
        ValidationResult {
            is_valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.is_valid = false;
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: String) {
        self.warnings.push(warning);
    }
}

/// A specific validation failure.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Tags are not strictly ascending
    #[error("Tag {tag} follows tag {previous}; tags must be strictly ascending")]
    UnorderedTags { previous: u16, tag: u16 },

    /// File uses strips instead of tiles
    #[error("File uses strip organization")]
    StripOrganization,

    /// A required tag is absent
    #[error("Missing required tag: {0}")]
    MissingTag(&'static str),

    /// Tiles are compressed
    #[error("Unsupported compression: {name} ({compression})")]
    UnsupportedCompression { compression: u32, name: String },

    /// Sample layout contradicts itself or the photometric interpretation
    #[error("Inconsistent sample layout: {0}")]
    SampleLayout(String),

    /// Index tables do not hold one value per tile
    #[error("Expected {expected} tiles, found {offsets} offsets and {byte_counts} byte counts")]
    TileCountMismatch {
        expected: u64,
        offsets: usize,
        byte_counts: usize,
    },

    /// A tile extends past the end of the file
    #[error("Tile {tile_index} at offset {offset} ({len} bytes) lies outside the file")]
    TileOutOfBounds {
        tile_index: usize,
        offset: u32,
        len: u32,
    },

    /// Two tiles share bytes
    #[error("Tile {tile_index} overlaps tile {other}")]
    TileOverlap { tile_index: usize, other: usize },

    /// GeoKey directory is malformed or has dangling references
    #[error("Invalid GeoKey directory: {0}")]
    GeoKeys(String),

    /// Ghost header is malformed or its declared size is wrong
    #[error("Invalid ghost header: {0}")]
    GhostHeader(String),
}

// =============================================================================
// Validation
// =============================================================================

/// Run every check on an inspected file.
pub fn validate_file(file: &InspectedFile) -> ValidationResult {
    let mut result = ValidationResult::ok();

    check_tag_order(file, &mut result);
    check_organization(file, &mut result);
    check_samples(file, &mut result);
    check_tiles(file, &mut result);
    check_geo_keys(file, &mut result);
    check_ghost_header(file, &mut result);

    if file.ifd.next_ifd_offset != 0 {
        result.add_warning(format!(
            "Next IFD offset is {}; only the first IFD was inspected",
            file.ifd.next_ifd_offset
        ));
    }
    for inspected in &file.entries {
        if inspected.entry.tag().is_none() {
            result.add_warning(format!("Unrecognised tag {}", inspected.entry.tag_id));
        }
    }

    result
}

fn check_tag_order(file: &InspectedFile, result: &mut ValidationResult) {
    for pair in file.ifd.entries.windows(2) {
        if pair[0].tag_id >= pair[1].tag_id {
            result.add_error(ValidationError::UnorderedTags {
                previous: pair[0].tag_id,
                tag: pair[1].tag_id,
            });
        }
    }
}

fn check_organization(file: &InspectedFile, result: &mut ValidationResult) {
    if file.ifd.is_stripped() && !file.ifd.is_tiled() {
        result.add_error(ValidationError::StripOrganization);
        return;
    }

    for tag in [
        TiffTag::ImageWidth,
        TiffTag::ImageLength,
        TiffTag::TileWidth,
        TiffTag::TileLength,
        TiffTag::TileOffsets,
        TiffTag::TileByteCounts,
    ] {
        if file.entry(tag).is_none() {
            result.add_error(ValidationError::MissingTag(tag.name()));
        }
    }

    // Absent Compression means uncompressed
    if let Some(compression) = file.scalar(TiffTag::Compression) {
        if compression != Compression::None as u32 {
            let name = u16::try_from(compression)
                .ok()
                .and_then(Compression::from_u16)
                .map(|c| c.name().to_string())
                .unwrap_or_else(|| "Unknown".to_string());
            result.add_error(ValidationError::UnsupportedCompression { compression, name });
        }
    }
}

fn check_samples(file: &InspectedFile, result: &mut ValidationResult) {
    // Absent SamplesPerPixel means one sample
    let samples = file.scalar(TiffTag::SamplesPerPixel).unwrap_or(1);

    if let Some(bits) = file.entry(TiffTag::BitsPerSample) {
        if bits.entry.count != samples {
            result.add_error(ValidationError::SampleLayout(format!(
                "BitsPerSample has {} values for {} samples per pixel",
                bits.entry.count, samples
            )));
        }
    }

    let Some(value) = file.scalar(TiffTag::PhotometricInterpretation) else {
        result.add_error(ValidationError::MissingTag(
            TiffTag::PhotometricInterpretation.name(),
        ));
        return;
    };
    match u16::try_from(value).ok().and_then(Photometric::from_u16) {
        Some(photometric) if samples != 1 => {
            result.add_error(ValidationError::SampleLayout(format!(
                "{} describes one sample per pixel, found {}",
                photometric.name(),
                samples
            )));
        }
        Some(_) => {}
        None => result.add_warning(format!(
            "Photometric interpretation {} is not single-band grayscale",
            value
        )),
    }
}

fn check_tiles(file: &InspectedFile, result: &mut ValidationResult) {
    let (Some(offsets), Some(byte_counts)) = (
        file.u32s(TiffTag::TileOffsets),
        file.u32s(TiffTag::TileByteCounts),
    ) else {
        return;
    };

    let dims = (
        file.scalar(TiffTag::ImageWidth),
        file.scalar(TiffTag::ImageLength),
        file.scalar(TiffTag::TileWidth),
        file.scalar(TiffTag::TileLength),
    );
    if let (Some(width), Some(height), Some(tile_width), Some(tile_length)) = dims {
        if tile_width == 0 || tile_length == 0 {
            result.add_error(ValidationError::MissingTag("TileWidth/TileLength"));
            return;
        }
        let expected = (width as u64).div_ceil(tile_width as u64)
            * (height as u64).div_ceil(tile_length as u64);
        if offsets.len() as u64 != expected || byte_counts.len() as u64 != expected {
            result.add_error(ValidationError::TileCountMismatch {
                expected,
                offsets: offsets.len(),
                byte_counts: byte_counts.len(),
            });
            return;
        }
    }

    let mut tiles: Vec<(usize, u64, u64)> = Vec::with_capacity(offsets.len());
    for (tile_index, (&offset, &len)) in offsets.iter().zip(&byte_counts).enumerate() {
        let end = offset as u64 + len as u64;
        if end > file.file_len {
            result.add_error(ValidationError::TileOutOfBounds {
                tile_index,
                offset,
                len,
            });
        }
        tiles.push((tile_index, offset as u64, end));
    }

    tiles.sort_by_key(|&(_, start, _)| start);
    for pair in tiles.windows(2) {
        let (other, _, prev_end) = pair[0];
        let (tile_index, start, _) = pair[1];
        if start < prev_end {
            result.add_error(ValidationError::TileOverlap { tile_index, other });
        }
    }
}

fn check_geo_keys(file: &InspectedFile, result: &mut ValidationResult) {
    let byte_order = file.byte_order();
    let Some(shorts) = file
        .entry(TiffTag::GeoKeyDirectory)
        .and_then(|e| e.as_u16s(byte_order))
    else {
        result.add_warning("No GeoKeyDirectory; file is not georeferenced".to_string());
        return;
    };

    let directory = match GeoKeyDirectory::from_shorts(&shorts) {
        Ok(directory) => directory,
        Err(e) => {
            result.add_error(ValidationError::GeoKeys(e.to_string()));
            return;
        }
    };

    let doubles = file
        .entry(TiffTag::GeoDoubleParams)
        .and_then(|e| e.as_f64s(byte_order))
        .unwrap_or_default();
    let ascii = match file.entry(TiffTag::GeoAsciiParams).and_then(|e| e.as_text()) {
        Some(text) => match GeoAsciiParams::new(text) {
            Ok(ascii) => ascii,
            Err(e) => {
                result.add_error(ValidationError::GeoKeys(e.to_string()));
                return;
            }
        },
        None => GeoAsciiParams::default(),
    };

    if let Err(e) = directory.check_references(&GeoDoubleParams::new(doubles), &ascii) {
        result.add_error(ValidationError::GeoKeys(e.to_string()));
    }
}

fn check_ghost_header(file: &InspectedFile, result: &mut ValidationResult) {
    match file.ghost_header() {
        None => {
            if !file.pre_ifd.is_empty() {
                result.add_warning(format!(
                    "{} unidentified bytes before the IFD",
                    file.pre_ifd.len()
                ));
            }
        }
        Some(Err(message)) => result.add_error(ValidationError::GhostHeader(message)),
        Some(Ok(ghost)) => {
            if ghost.byte_len() != file.pre_ifd.len() {
                result.add_warning(format!(
                    "Ghost header covers {} of the {} bytes before the IFD",
                    ghost.byte_len(),
                    file.pre_ifd.len()
                ));
            }
        }
    }
}

// =============================================================================
// Report
// =============================================================================

/// Serializable inspection summary printed by the `inspect` command.
#[derive(Debug, Clone, Serialize)]
pub struct InspectReport {
    pub byte_order: &'static str,
    pub first_ifd_offset: u32,
    pub file_len: u64,
    pub ghost_header: Option<Vec<(String, String)>>,
    pub entries: Vec<EntrySummary>,
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// One directory entry in an [`InspectReport`].
#[derive(Debug, Clone, Serialize)]
pub struct EntrySummary {
    pub tag: u16,
    pub name: Option<&'static str>,
    pub field_type: &'static str,
    pub count: u32,
    pub inline: bool,
    pub value_or_offset: u32,
    pub value: String,
}

impl InspectReport {
    pub fn new(file: &InspectedFile, validation: &ValidationResult) -> Self {
        let byte_order = file.byte_order();
        let ghost_header = file.ghost_header().and_then(Result::ok).map(|ghost| {
            ghost
                .items()
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect()
        });

        Self {
            byte_order: byte_order.mark(),
            first_ifd_offset: file.header.first_ifd_offset,
            file_len: file.file_len,
            ghost_header,
            entries: file
                .entries
                .iter()
                .map(|inspected| EntrySummary {
                    tag: inspected.entry.tag_id,
                    name: inspected.entry.tag().map(TiffTag::name),
                    field_type: inspected.entry.field_type.name(),
                    count: inspected.entry.count,
                    inline: inspected.entry.is_inline(),
                    value_or_offset: inspected.entry.value_offset(byte_order),
                    value: inspected.summary(byte_order),
                })
                .collect(),
            valid: validation.is_valid,
            errors: validation.errors.iter().map(ToString::to_string).collect(),
            warnings: validation.warnings.clone(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
