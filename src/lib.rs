//! # GeoTIFF Builder
//!
//! Writes tiled, uncompressed, georeferenced classic TIFF files from scratch.
//!
//! The core is a single forward planning pass: every region of the file has
//! a length known up front, so each region's absolute offset is the sum of
//! the lengths before it, and every IFD entry that references external data
//! points exactly at its bytes. Nothing is backpatched.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`layout`] - Tile grid, region placement, tag table and tile indexes
//! - [`mod@format`] - TIFF encoding and read-back, GeoTIFF blocks, ghost header
//! - [`writer`] - Pixel sources and the stream assembler
//! - [`io`] - File, in-memory and S3 sinks for finished files
//! - [`config`] - CLI and configuration types
//!
//! ## Example
//!
//! ```rust
//! use geotiff_builder::{inspect, validate_file, GeoTiffBuilder, ImageGeometry, RandomFill};
//!
//! let plan = GeoTiffBuilder::new(ImageGeometry::default()).plan().unwrap();
//! assert_eq!(plan.offsets().tile_data_offset(), 1351);
//!
//! let file = plan.build(&mut RandomFill::seeded(42)).unwrap();
//! let inspected = inspect(file.bytes()).unwrap();
//! assert!(validate_file(&inspected).is_valid);
//! ```

pub mod config;
pub mod error;
pub mod format;
pub mod io;
pub mod layout;
pub mod writer;

// Re-export commonly used types
pub use config::{Cli, Command, FillKind, GenerateConfig, InspectConfig, OutputTarget};
pub use error::{BuildError, ConfigError, GenerateError, IoError, TiffError};
pub use format::geotiff::{
    GeoAsciiParams, GeoDoubleParams, GeoKeyDirectory, GeoKeyEntry, GeoKeyHeader, GeoMetadata,
    ModelTransform,
};
pub use format::tiff::{
    inspect, validate_file, ByteOrder, DirectoryEntry, FieldType, InspectReport, InspectedFile,
    TiffTag, ValidationError, ValidationResult,
};
pub use format::GhostHeader;
pub use io::{create_s3_client, FileSink, MemorySink, S3Sink, TiffSink};
pub use layout::{
    build_tags, plan_layout, tag_schema, BlockLengths, ImageGeometry, OffsetTable, Region,
    RegionKind, TileGrid,
};
pub use writer::{
    assemble, AssemblyParts, ConstantFill, GeoTiffBuilder, GeoTiffFile, GeoTiffPlan,
    GradientFill, LayoutReport, PixelSource, RandomFill,
};
