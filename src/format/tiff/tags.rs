//! TIFF tag and field type definitions.
//!
//! This module defines the vocabulary shared by the writer and the read-back
//! inspector:
//! - Field types that determine how values are encoded
//! - Tag IDs, including the GeoTIFF private tags, together with the single
//!   field type each tag is written with
//!
//! Only classic TIFF is written, so inline storage is limited to 4 bytes.

// =============================================================================
// TIFF Field Types
// =============================================================================

/// TIFF field types that determine how values are encoded.
///
/// Each field type has a specific size in bytes, which is critical for:
/// - Determining if a value fits inline in an IFD entry
/// - Computing the length of out-of-line payloads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum FieldType {
    /// Unsigned 8-bit integer (1 byte)
    Byte = 1,

    /// 8-bit ASCII character (1 byte)
    Ascii = 2,

    /// Unsigned 16-bit integer (2 bytes)
    Short = 3,

    /// Unsigned 32-bit integer (4 bytes)
    Long = 4,

    /// Undefined byte data (1 byte per element)
    Undefined = 7,

    /// IEEE-754 double precision float (8 bytes)
    Double = 12,
}

impl FieldType {
    /// Maximum bytes that can be stored inline in a classic TIFF IFD entry.
    pub const INLINE_THRESHOLD: usize = 4;

    /// Size of a single value of this type in bytes.
    #[inline]
    pub const fn size_in_bytes(self) -> usize {
        match self {
            FieldType::Byte => 1,
            FieldType::Ascii => 1,
            FieldType::Short => 2,
            FieldType::Long => 4,
            FieldType::Undefined => 1,
            FieldType::Double => 8,
        }
    }

    /// Create a FieldType from its numeric value.
    ///
    /// Returns `None` for unsupported or unknown type values.
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            1 => Some(FieldType::Byte),
            2 => Some(FieldType::Ascii),
            3 => Some(FieldType::Short),
            4 => Some(FieldType::Long),
            7 => Some(FieldType::Undefined),
            12 => Some(FieldType::Double),
            _ => None,
        }
    }

    /// Get the numeric type code written to the directory entry.
    #[inline]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    pub const fn name(self) -> &'static str {
        match self {
            FieldType::Byte => "BYTE",
            FieldType::Ascii => "ASCII",
            FieldType::Short => "SHORT",
            FieldType::Long => "LONG",
            FieldType::Undefined => "UNDEFINED",
            FieldType::Double => "DOUBLE",
        }
    }

    /// Total payload size for `count` values, or `None` on overflow.
    #[inline]
    pub fn payload_len(self, count: u32) -> Option<u64> {
        (self.size_in_bytes() as u64).checked_mul(count as u64)
    }

    /// Check if a value with this type and count fits inline in a classic TIFF entry.
    #[inline]
    pub fn fits_inline(self, count: u32) -> bool {
        match self.payload_len(count) {
            Some(len) => len <= Self::INLINE_THRESHOLD as u64,
            None => false,
        }
    }
}

// =============================================================================
// TIFF Tags
// =============================================================================

/// TIFF tag IDs used by the writer.
///
/// Baseline tags describe the tiled raster; the 34xxx range carries the
/// GeoTIFF georeferencing payloads. Strip tags are listed only so the
/// inspector can recognise strip-organised files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u16)]
pub enum TiffTag {
    // -------------------------------------------------------------------------
    // Basic Image Structure
    // -------------------------------------------------------------------------
    /// Image width in pixels
    ImageWidth = 256,

    /// Image height (length) in pixels
    ImageLength = 257,

    /// Bits per sample
    BitsPerSample = 258,

    /// Compression scheme used
    Compression = 259,

    /// Photometric interpretation
    PhotometricInterpretation = 262,

    /// Byte offsets of strips (indicates strip organization)
    StripOffsets = 273,

    /// Number of components per pixel
    SamplesPerPixel = 277,

    /// Byte counts of strips (indicates strip organization)
    StripByteCounts = 279,

    // -------------------------------------------------------------------------
    // Tile Organization
    // -------------------------------------------------------------------------
    /// Width of each tile in pixels
    TileWidth = 322,

    /// Height (length) of each tile in pixels
    TileLength = 323,

    /// Byte offsets of each tile in the file
    TileOffsets = 324,

    /// Byte counts of each tile
    TileByteCounts = 325,

    // -------------------------------------------------------------------------
    // GeoTIFF
    // -------------------------------------------------------------------------
    /// 4x4 raster-to-model affine transform, row-major
    ModelTransformation = 34264,

    /// GeoKey directory header and key entries
    GeoKeyDirectory = 34735,

    /// Double-valued GeoKey parameters
    GeoDoubleParams = 34736,

    /// ASCII GeoKey parameters, `|`-separated
    GeoAsciiParams = 34737,
}

impl TiffTag {
    /// Create a TiffTag from its numeric value.
    ///
    /// Returns `None` for unrecognized tags. Unknown tags are not an error
    /// when reading; they are reported by number.
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            256 => Some(TiffTag::ImageWidth),
            257 => Some(TiffTag::ImageLength),
            258 => Some(TiffTag::BitsPerSample),
            259 => Some(TiffTag::Compression),
            262 => Some(TiffTag::PhotometricInterpretation),
            273 => Some(TiffTag::StripOffsets),
            277 => Some(TiffTag::SamplesPerPixel),
            279 => Some(TiffTag::StripByteCounts),
            322 => Some(TiffTag::TileWidth),
            323 => Some(TiffTag::TileLength),
            324 => Some(TiffTag::TileOffsets),
            325 => Some(TiffTag::TileByteCounts),
            34264 => Some(TiffTag::ModelTransformation),
            34735 => Some(TiffTag::GeoKeyDirectory),
            34736 => Some(TiffTag::GeoDoubleParams),
            34737 => Some(TiffTag::GeoAsciiParams),
            _ => None,
        }
    }

    /// Get the numeric tag ID.
    #[inline]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    /// The field type this tag is always written with.
    ///
    /// Directory entries take their type from here, so a tag can never be
    /// emitted with a type code that disagrees with its payload.
    pub const fn field_type(self) -> FieldType {
        match self {
            TiffTag::ImageWidth
            | TiffTag::ImageLength
            | TiffTag::BitsPerSample
            | TiffTag::Compression
            | TiffTag::PhotometricInterpretation
            | TiffTag::StripOffsets
            | TiffTag::SamplesPerPixel
            | TiffTag::StripByteCounts
            | TiffTag::TileWidth
            | TiffTag::TileLength
            | TiffTag::TileOffsets
            | TiffTag::TileByteCounts => FieldType::Long,
            TiffTag::ModelTransformation | TiffTag::GeoDoubleParams => FieldType::Double,
            TiffTag::GeoKeyDirectory => FieldType::Short,
            TiffTag::GeoAsciiParams => FieldType::Ascii,
        }
    }

    /// Human-readable tag name.
    pub const fn name(self) -> &'static str {
        match self {
            TiffTag::ImageWidth => "ImageWidth",
            TiffTag::ImageLength => "ImageLength",
            TiffTag::BitsPerSample => "BitsPerSample",
            TiffTag::Compression => "Compression",
            TiffTag::PhotometricInterpretation => "PhotometricInterpretation",
            TiffTag::StripOffsets => "StripOffsets",
            TiffTag::SamplesPerPixel => "SamplesPerPixel",
            TiffTag::StripByteCounts => "StripByteCounts",
            TiffTag::TileWidth => "TileWidth",
            TiffTag::TileLength => "TileLength",
            TiffTag::TileOffsets => "TileOffsets",
            TiffTag::TileByteCounts => "TileByteCounts",
            TiffTag::ModelTransformation => "ModelTransformation",
            TiffTag::GeoKeyDirectory => "GeoKeyDirectory",
            TiffTag::GeoDoubleParams => "GeoDoubleParams",
            TiffTag::GeoAsciiParams => "GeoAsciiParams",
        }
    }
}

// =============================================================================
// Compression Values
// =============================================================================

/// TIFF compression scheme identifiers.
///
/// The writer only emits uncompressed tiles; the other values exist so the
/// inspector can name what it finds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum Compression {
    /// No compression
    None = 1,

    /// LZW compression
    Lzw = 5,

    /// JPEG compression
    Jpeg = 7,

    /// Deflate/zlib compression
    Deflate = 8,
}

impl Compression {
    /// Create a Compression from its numeric value.
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            1 => Some(Compression::None),
            5 => Some(Compression::Lzw),
            7 => Some(Compression::Jpeg),
            8 => Some(Compression::Deflate),
            _ => None,
        }
    }

    /// Get a human-readable name for the compression scheme.
    pub const fn name(self) -> &'static str {
        match self {
            Compression::None => "None",
            Compression::Lzw => "LZW",
            Compression::Jpeg => "JPEG",
            Compression::Deflate => "Deflate",
        }
    }
}

// =============================================================================
// Photometric Interpretation
// =============================================================================

/// Photometric interpretation values.
///
/// The writer emits `BlackIsZero`; the inspector accepts either single-band
/// interpretation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum Photometric {
    /// 0 is white
    WhiteIsZero = 0,

    /// 0 is black (grayscale)
    BlackIsZero = 1,
}

impl Photometric {
    /// Create a Photometric from its numeric value.
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            0 => Some(Photometric::WhiteIsZero),
            1 => Some(Photometric::BlackIsZero),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Photometric::WhiteIsZero => "WhiteIsZero",
            Photometric::BlackIsZero => "BlackIsZero",
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
