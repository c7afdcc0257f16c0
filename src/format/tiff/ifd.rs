//! Image File Directory encoding.
//!
//! # Classic TIFF IFD Layout
//! ```text
//! Bytes 0-1:         Entry count (u16)
//! Bytes 2..2+12n:    Entries, 12 bytes each:
//!                      tag (u16), type (u16), count (u32), value/offset (u32)
//! Last 4 bytes:      Offset of the next IFD (u32, 0 = none)
//! ```
//!
//! All values are little-endian.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::BuildError;

use super::tags::{FieldType, TiffTag};

// =============================================================================
// Constants
// =============================================================================

/// Size of the entry count field at the start of an IFD.
pub const IFD_COUNT_SIZE: u32 = 2;

/// Size of a single classic TIFF IFD entry.
pub const IFD_ENTRY_SIZE: u32 = 12;

/// Size of the next IFD offset field at the end of an IFD.
pub const IFD_NEXT_OFFSET_SIZE: u32 = 4;

/// Size in bytes of an IFD holding `entry_count` entries.
///
/// This is the only place the directory size is computed; the planner and
/// the serializer both go through it.
pub fn ifd_size(entry_count: usize) -> Result<u32, BuildError> {
    let count = u32::try_from(entry_count)
        .map_err(|_| BuildError::overflow("IFD entry count", entry_count as u64))?;
    count
        .checked_mul(IFD_ENTRY_SIZE)
        .and_then(|entries| entries.checked_add(IFD_COUNT_SIZE + IFD_NEXT_OFFSET_SIZE))
        .ok_or_else(|| BuildError::overflow("IFD size", entry_count as u64))
}

// =============================================================================
// DirectoryEntry
// =============================================================================

/// A single 12-byte IFD entry.
///
/// The field type is not chosen by callers: it comes from
/// [`TiffTag::field_type`], which keeps type codes and payloads in sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectoryEntry {
    /// Tag identifying the field
    pub tag: TiffTag,

    /// Element type of the value
    pub field_type: FieldType,

    /// Number of elements
    pub count: u32,

    /// Inline value, or absolute offset of the out-of-line payload
    pub value_or_offset: u32,
}

impl DirectoryEntry {
    /// Scalar entry with its value stored inline.
    pub fn inline(tag: TiffTag, value: u32) -> Self {
        Self {
            tag,
            field_type: tag.field_type(),
            count: 1,
            value_or_offset: value,
        }
    }

    /// Entry whose `count` elements live at `offset`.
    pub fn out_of_line(tag: TiffTag, count: u32, offset: u32) -> Self {
        Self {
            tag,
            field_type: tag.field_type(),
            count,
            value_or_offset: offset,
        }
    }

    /// Whether the value is stored in the entry itself.
    #[inline]
    pub fn is_inline(&self) -> bool {
        self.field_type.fits_inline(self.count)
    }

    /// Byte length of the value (`count * element size`).
    #[inline]
    pub fn payload_len(&self) -> Option<u64> {
        self.field_type.payload_len(self.count)
    }

    /// Append the 12-byte encoding of this entry.
    pub fn encode_into(&self, buf: &mut BytesMut) {
        buf.put_u16_le(self.tag.as_u16());
        buf.put_u16_le(self.field_type.as_u16());
        buf.put_u32_le(self.count);
        buf.put_u32_le(self.value_or_offset);
    }
}

// =============================================================================
// Serialization
// =============================================================================

/// Serialize a single, final IFD (next-IFD pointer is always 0).
pub fn serialize_ifd(entries: &[DirectoryEntry]) -> Result<Bytes, BuildError> {
    let entry_count = u16::try_from(entries.len())
        .map_err(|_| BuildError::overflow("IFD entry count", entries.len() as u64))?;
    let size = ifd_size(entries.len())?;

    let mut buf = BytesMut::with_capacity(size as usize);
    buf.put_u16_le(entry_count);
    for entry in entries {
        entry.encode_into(&mut buf);
    }
    buf.put_u32_le(0);

    Ok(buf.freeze())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ifd_size_is_derived() {
        assert_eq!(ifd_size(0).unwrap(), 6);
        assert_eq!(ifd_size(1).unwrap(), 18);
        assert_eq!(ifd_size(14).unwrap(), 2 + 14 * 12 + 4);
    }

    #[test]
    fn test_ifd_size_overflow() {
        let result = ifd_size(usize::MAX);
        assert!(matches!(result, Err(BuildError::EncodingOverflow { .. })));
    }

    #[test]
    fn test_inline_entry() {
        let entry = DirectoryEntry::inline(TiffTag::ImageWidth, 1024);
        assert_eq!(entry.field_type, FieldType::Long);
        assert_eq!(entry.count, 1);
        assert!(entry.is_inline());
        assert_eq!(entry.payload_len(), Some(4));
    }

    #[test]
    fn test_out_of_line_entry() {
        let entry = DirectoryEntry::out_of_line(TiffTag::GeoDoubleParams, 6, 900);
        assert_eq!(entry.field_type, FieldType::Double);
        assert!(!entry.is_inline());
        assert_eq!(entry.payload_len(), Some(48));
    }

    #[test]
    fn test_entry_encoding() {
        let mut buf = BytesMut::new();
        DirectoryEntry::out_of_line(TiffTag::GeoKeyDirectory, 76, 0x0102_0304).encode_into(&mut buf);

        assert_eq!(
            &buf[..],
            &[
                0xAF, 0x87, // 34735
                0x03, 0x00, // SHORT
                0x4C, 0x00, 0x00, 0x00, // 76
                0x04, 0x03, 0x02, 0x01, // offset
            ]
        );
    }

    #[test]
    fn test_serialize_ifd() {
        let entries = [
            DirectoryEntry::inline(TiffTag::ImageWidth, 256),
            DirectoryEntry::inline(TiffTag::ImageLength, 512),
        ];

        let bytes = serialize_ifd(&entries).unwrap();
        assert_eq!(bytes.len() as u32, ifd_size(2).unwrap());
        assert_eq!(&bytes[0..2], &[2, 0]);
        // First entry tag
        assert_eq!(&bytes[2..4], &256u16.to_le_bytes());
        // Second entry value
        assert_eq!(&bytes[22..26], &512u32.to_le_bytes());
        // Next IFD pointer
        assert_eq!(&bytes[26..30], &[0, 0, 0, 0]);
    }

    #[test]
    fn test_serialize_empty_ifd() {
        let bytes = serialize_ifd(&[]).unwrap();
        assert_eq!(&bytes[..], &[0, 0, 0, 0, 0, 0]);
    }
}
