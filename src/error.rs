use thiserror::Error;

/// I/O errors that can occur when persisting a finished file
#[derive(Debug, Clone, Error)]
pub enum IoError {
    /// Local filesystem error
    #[error("I/O error: {0}")]
    Io(String),

    /// Error from S3 or S3-compatible storage
    #[error("S3 error: {0}")]
    S3(String),

    /// Network or connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Target location does not exist
    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<std::io::Error> for IoError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => IoError::NotFound(err.to_string()),
            _ => IoError::Io(err.to_string()),
        }
    }
}

/// Invalid image geometry or metadata configuration.
///
/// These indicate a defect in the caller's configuration and are never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// An image or tile dimension is zero
    #[error("{name} must be greater than 0")]
    ZeroDimension { name: &'static str },

    /// Image dimension is not an exact multiple of the tile dimension
    #[error("{axis} {image} is not a multiple of tile size {tile}")]
    NotTileAligned {
        axis: &'static str,
        image: u32,
        tile: u32,
    },

    /// Sample depth other than one byte per sample
    #[error("Unsupported bits per sample: {0} (only 8 is supported)")]
    UnsupportedBitsPerSample(u16),

    /// More than one sample per pixel; the raster is single-band grayscale
    #[error("Unsupported samples per pixel: {0} (only 1 is supported)")]
    UnsupportedSamplesPerPixel(u16),

    /// Directory entry type or count does not match its payload
    #[error("Tag mismatch for {tag}: {message}")]
    TagMismatch { tag: &'static str, message: String },

    /// Malformed GeoKey directory
    #[error("Invalid GeoKey directory: {0}")]
    GeoKeys(String),

    /// Non-ASCII data in GeoAsciiParams
    #[error("Invalid GeoAsciiParams: {0}")]
    GeoAscii(String),

    /// Ghost header whose declared size does not match its body
    #[error("Invalid ghost header: {0}")]
    GhostHeader(String),
}

/// Errors that can occur while planning or assembling a TIFF file
#[derive(Debug, Clone, Error)]
pub enum BuildError {
    /// Invalid configuration detected before any bytes were emitted
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A length or offset does not fit the 32-bit classic TIFF offset space
    #[error("Encoding overflow: {what} ({value}) exceeds the classic TIFF 32-bit limit")]
    EncodingOverflow { what: &'static str, value: u128 },

    /// The pixel source produced the wrong number of bytes for a tile
    #[error("Pixel source returned {actual} bytes for tile {tile_index}, expected {expected}")]
    PixelSource {
        tile_index: u32,
        expected: usize,
        actual: usize,
    },

    /// An encoded part does not match the length planned for its region
    #[error("{region} is {actual} bytes, planned {expected}")]
    RegionLength {
        region: &'static str,
        expected: u32,
        actual: usize,
    },
}

impl BuildError {
    /// Shorthand for an overflow of `what`.
    pub fn overflow(what: &'static str, value: impl Into<u128>) -> Self {
        BuildError::EncodingOverflow {
            what,
            value: value.into(),
        }
    }
}

/// Errors that can occur when parsing a TIFF file back
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TiffError {
    /// Invalid TIFF magic bytes (not II or MM)
    #[error("Invalid TIFF magic bytes: expected 0x4949 (II) or 0x4D4D (MM), got 0x{0:04X}")]
    InvalidMagic(u16),

    /// Invalid TIFF version number
    #[error("Invalid TIFF version: expected 42, got {0}")]
    InvalidVersion(u16),

    /// BigTIFF files are recognised but not read
    #[error("BigTIFF (version 43) files are not supported")]
    BigTiffUnsupported,

    /// File is too small to contain a valid TIFF header
    #[error("File too small: need at least {required} bytes, got {actual}")]
    FileTooSmall { required: u64, actual: u64 },

    /// Invalid IFD offset (points outside file or to invalid location)
    #[error("Invalid IFD offset: {0}")]
    InvalidIfdOffset(u64),

    /// IFD runs past the end of the file
    #[error("Truncated IFD at offset {offset}: {entries} entries need {required} bytes")]
    TruncatedIfd {
        offset: u64,
        entries: u16,
        required: u64,
    },

    /// Out-of-line value lies outside the file
    #[error("Value of tag {tag} at offset {offset} ({len} bytes) lies outside the file")]
    ValueOutOfBounds { tag: u16, offset: u64, len: u64 },

    /// Unknown field type in IFD entry
    #[error("Unknown field type: {0}")]
    UnknownFieldType(u16),
}

/// Errors surfaced by the `generate` command
#[derive(Debug, Clone, Error)]
pub enum GenerateError {
    /// Planning or assembly failed
    #[error(transparent)]
    Build(#[from] BuildError),

    /// The sink could not store the file
    #[error("Failed to store file: {0}")]
    Io(#[from] IoError),
}
