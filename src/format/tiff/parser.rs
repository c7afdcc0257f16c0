//! TIFF header and IFD parsing.
//!
//! Used to read generated files back. Only classic TIFF is read; BigTIFF is
//! recognised from its version number and rejected.
//!
//! # TIFF Header Structure
//!
//! ## Classic TIFF (8 bytes)
//! ```text
//! Bytes 0-1: Byte order (0x4949 = little-endian "II", 0x4D4D = big-endian "MM")
//! Bytes 2-3: Version (42 = 0x002A)
//! Bytes 4-7: Offset to first IFD (4 bytes)
//! ```

use crate::error::TiffError;

use super::ifd::{IFD_COUNT_SIZE, IFD_ENTRY_SIZE, IFD_NEXT_OFFSET_SIZE};
use super::tags::{FieldType, TiffTag};

// =============================================================================
// Constants
// =============================================================================

/// Magic bytes indicating little-endian byte order ("II" for Intel)
const BYTE_ORDER_LITTLE_ENDIAN: u16 = 0x4949;

/// Magic bytes indicating big-endian byte order ("MM" for Motorola)
const BYTE_ORDER_BIG_ENDIAN: u16 = 0x4D4D;

/// Version number for classic TIFF
const VERSION_TIFF: u16 = 42;

/// Version number for BigTIFF
const VERSION_BIGTIFF: u16 = 43;

/// Size of classic TIFF header in bytes
pub const TIFF_HEADER_SIZE: usize = 8;

// =============================================================================
// ByteOrder
// =============================================================================

/// Byte order (endianness) of a TIFF file.
///
/// The writer always produces little-endian files; the reader accepts both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    /// Little-endian ("II" = Intel)
    LittleEndian,
    /// Big-endian ("MM" = Motorola)
    BigEndian,
}

impl ByteOrder {
    /// Read a u16 from the first 2 bytes of `bytes`.
    ///
    /// # Panics
    /// Panics if the slice has fewer than 2 bytes.
    #[inline]
    pub fn read_u16(self, bytes: &[u8]) -> u16 {
        let raw = [bytes[0], bytes[1]];
        match self {
            ByteOrder::LittleEndian => u16::from_le_bytes(raw),
            ByteOrder::BigEndian => u16::from_be_bytes(raw),
        }
    }

    /// Read a u32 from the first 4 bytes of `bytes`.
    ///
    /// # Panics
    /// Panics if the slice has fewer than 4 bytes.
    #[inline]
    pub fn read_u32(self, bytes: &[u8]) -> u32 {
        let raw = [bytes[0], bytes[1], bytes[2], bytes[3]];
        match self {
            ByteOrder::LittleEndian => u32::from_le_bytes(raw),
            ByteOrder::BigEndian => u32::from_be_bytes(raw),
        }
    }

    /// Read an f64 from the first 8 bytes of `bytes`.
    ///
    /// # Panics
    /// Panics if the slice has fewer than 8 bytes.
    #[inline]
    pub fn read_f64(self, bytes: &[u8]) -> f64 {
        let raw = [
            bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
        ];
        match self {
            ByteOrder::LittleEndian => f64::from_le_bytes(raw),
            ByteOrder::BigEndian => f64::from_be_bytes(raw),
        }
    }

    /// Two-character mark as written in the header.
    pub const fn mark(self) -> &'static str {
        match self {
            ByteOrder::LittleEndian => "II",
            ByteOrder::BigEndian => "MM",
        }
    }
}

// =============================================================================
// TiffHeader
// =============================================================================

/// Parsed classic TIFF header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TiffHeader {
    /// Byte order for all multi-byte values in the file
    pub byte_order: ByteOrder,

    /// Offset to the first IFD in the file
    pub first_ifd_offset: u32,
}

impl TiffHeader {
    /// Parse a TIFF header from the start of a file.
    ///
    /// # Arguments
    /// * `bytes` - Raw header bytes (at least 8)
    /// * `file_size` - Total file size (used to validate the IFD offset)
    ///
    /// # Errors
    /// - `InvalidMagic` if byte order bytes are not II or MM
    /// - `BigTiffUnsupported` for version 43
    /// - `InvalidVersion` for any other version than 42
    /// - `FileTooSmall` if there aren't enough bytes for the header
    /// - `InvalidIfdOffset` if the first IFD offset is outside the file
    pub fn parse(bytes: &[u8], file_size: u64) -> Result<Self, TiffError> {
        if bytes.len() < TIFF_HEADER_SIZE {
            return Err(TiffError::FileTooSmall {
                required: TIFF_HEADER_SIZE as u64,
                actual: bytes.len() as u64,
            });
        }

        // Both marks are palindromes, so either byte order reads them the same
        let magic = u16::from_le_bytes([bytes[0], bytes[1]]);
        let byte_order = match magic {
            BYTE_ORDER_LITTLE_ENDIAN => ByteOrder::LittleEndian,
            BYTE_ORDER_BIG_ENDIAN => ByteOrder::BigEndian,
            _ => return Err(TiffError::InvalidMagic(magic)),
        };

        match byte_order.read_u16(&bytes[2..4]) {
            VERSION_TIFF => {}
            VERSION_BIGTIFF => return Err(TiffError::BigTiffUnsupported),
            version => return Err(TiffError::InvalidVersion(version)),
        }

        let first_ifd_offset = byte_order.read_u32(&bytes[4..8]);
        if (first_ifd_offset as u64) < TIFF_HEADER_SIZE as u64 || first_ifd_offset as u64 >= file_size
        {
            return Err(TiffError::InvalidIfdOffset(first_ifd_offset as u64));
        }

        Ok(TiffHeader {
            byte_order,
            first_ifd_offset,
        })
    }
}

// =============================================================================
// IfdEntry
// =============================================================================

/// A raw 12-byte directory entry as read from a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IfdEntry {
    /// Numeric tag id
    pub tag_id: u16,

    /// Element type
    pub field_type: FieldType,

    /// Number of elements
    pub count: u32,

    /// The raw value/offset field, in file byte order
    pub value_offset_bytes: [u8; 4],
}

impl IfdEntry {
    /// Known tag, if the id is one this crate writes.
    pub fn tag(&self) -> Option<TiffTag> {
        TiffTag::from_u16(self.tag_id)
    }

    /// Byte length of the value (`count * element size`).
    #[inline]
    pub fn payload_len(&self) -> Option<u64> {
        self.field_type.payload_len(self.count)
    }

    /// Whether the value is stored in the entry itself.
    #[inline]
    pub fn is_inline(&self) -> bool {
        self.field_type.fits_inline(self.count)
    }

    /// The value/offset field read as a u32.
    #[inline]
    pub fn value_offset(&self, byte_order: ByteOrder) -> u32 {
        byte_order.read_u32(&self.value_offset_bytes)
    }

    /// Scalar value of an inline SHORT or LONG entry.
    pub fn inline_scalar(&self, byte_order: ByteOrder) -> Option<u32> {
        if self.count != 1 {
            return None;
        }
        match self.field_type {
            FieldType::Short => Some(byte_order.read_u16(&self.value_offset_bytes) as u32),
            FieldType::Long => Some(byte_order.read_u32(&self.value_offset_bytes)),
            _ => None,
        }
    }
}

// =============================================================================
// Ifd
// =============================================================================

/// A parsed Image File Directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ifd {
    /// Offset of the directory in the file
    pub offset: u32,

    /// Entries in file order
    pub entries: Vec<IfdEntry>,

    /// Offset of the next IFD (0 = none)
    pub next_ifd_offset: u32,
}

impl Ifd {
    /// Parse the IFD at `offset` in `file`.
    ///
    /// # Errors
    /// - `InvalidIfdOffset` if the entry count lies outside the file
    /// - `TruncatedIfd` if the entries or next pointer run past the end
    /// - `UnknownFieldType` if an entry carries an unknown type code
    pub fn parse(file: &[u8], offset: u32, byte_order: ByteOrder) -> Result<Self, TiffError> {
        let start = offset as usize;
        let count_end = start + IFD_COUNT_SIZE as usize;
        if count_end > file.len() {
            return Err(TiffError::InvalidIfdOffset(offset as u64));
        }

        let entry_count = byte_order.read_u16(&file[start..count_end]);
        let required = IFD_COUNT_SIZE as u64
            + entry_count as u64 * IFD_ENTRY_SIZE as u64
            + IFD_NEXT_OFFSET_SIZE as u64;
        if start as u64 + required > file.len() as u64 {
            return Err(TiffError::TruncatedIfd {
                offset: offset as u64,
                entries: entry_count,
                required,
            });
        }

        let entries = file[count_end..]
            .chunks_exact(IFD_ENTRY_SIZE as usize)
            .take(entry_count as usize)
            .map(|raw| {
                let type_code = byte_order.read_u16(&raw[2..4]);
                let field_type =
                    FieldType::from_u16(type_code).ok_or(TiffError::UnknownFieldType(type_code))?;
                Ok(IfdEntry {
                    tag_id: byte_order.read_u16(&raw[0..2]),
                    field_type,
                    count: byte_order.read_u32(&raw[4..8]),
                    value_offset_bytes: [raw[8], raw[9], raw[10], raw[11]],
                })
            })
            .collect::<Result<Vec<_>, TiffError>>()?;

        let next_start = count_end + entry_count as usize * IFD_ENTRY_SIZE as usize;
        let next_ifd_offset = byte_order.read_u32(&file[next_start..]);

        Ok(Ifd {
            offset,
            entries,
            next_ifd_offset,
        })
    }

    /// Total size of the directory in bytes.
    pub fn byte_len(&self) -> u64 {
        IFD_COUNT_SIZE as u64
            + self.entries.len() as u64 * IFD_ENTRY_SIZE as u64
            + IFD_NEXT_OFFSET_SIZE as u64
    }

    /// Find the entry for a numeric tag id.
    pub fn get_entry(&self, tag_id: u16) -> Option<&IfdEntry> {
        self.entries.iter().find(|e| e.tag_id == tag_id)
    }

    /// Find the entry for a known tag.
    pub fn get_entry_by_tag(&self, tag: TiffTag) -> Option<&IfdEntry> {
        self.get_entry(tag.as_u16())
    }

    /// Scalar value of a known tag.
    pub fn scalar(&self, tag: TiffTag, byte_order: ByteOrder) -> Option<u32> {
        self.get_entry_by_tag(tag)?.inline_scalar(byte_order)
    }

    pub fn is_tiled(&self) -> bool {
        self.get_entry_by_tag(TiffTag::TileWidth).is_some()
            && self.get_entry_by_tag(TiffTag::TileOffsets).is_some()
    }

    pub fn is_stripped(&self) -> bool {
        self.get_entry_by_tag(TiffTag::StripOffsets).is_some()
    }
}

// =============================================================================
// Tests
// =============================================================================
