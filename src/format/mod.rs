//! On-disk formats: classic TIFF, the GeoTIFF blocks and GDAL's ghost header.

pub mod geotiff;
pub mod ghost;
pub mod tiff;

pub use ghost::{GhostHeader, GHOST_SIZE_LINE_LEN};
