//! File production: pixel sources and the stream assembler.

pub mod assembler;
pub mod pixels;

pub use assembler::{
    assemble, AssemblyParts, EntryReport, GeoTiffBuilder, GeoTiffFile, GeoTiffPlan, LayoutReport,
    TiffHeader,
};
pub use pixels::{ConstantFill, GradientFill, PixelSource, RandomFill};
