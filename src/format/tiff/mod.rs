//! Classic TIFF encoding and read-back.
//!
//! # Key Concepts
//!
//! - **Byte order**: files are written little-endian ("II"). The reader also
//!   accepts big-endian ("MM") files.
//!
//! - **Classic TIFF only**: 32-bit offsets, so a file is limited to 4 GiB.
//!   BigTIFF is recognised on read and rejected.
//!
//! - **IFD (Image File Directory)**: a single directory describes the image.
//!   Each 12-byte entry holds its value inline when it fits in 4 bytes and an
//!   absolute offset to the value otherwise.

mod ifd;
mod inspect;
mod parser;
mod tags;

pub use ifd::{
    ifd_size, serialize_ifd, DirectoryEntry, IFD_COUNT_SIZE, IFD_ENTRY_SIZE, IFD_NEXT_OFFSET_SIZE,
};
pub use inspect::{
    inspect, validate_file, EntrySummary, InspectReport, InspectedEntry, InspectedFile,
    ValidationError, ValidationResult,
};
pub use parser::{ByteOrder, Ifd, IfdEntry, TiffHeader, TIFF_HEADER_SIZE};
pub use tags::{Compression, FieldType, Photometric, TiffTag};
