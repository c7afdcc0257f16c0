//! GeoTIFF georeferencing blocks.
//!
//! A georeferenced TIFF carries four out-of-line payloads alongside the
//! baseline raster tags:
//!
//! - **ModelTransformation** (34264): 16 DOUBLEs mapping raster to model space
//! - **GeoKeyDirectory** (34735): SHORT array describing the CRS
//! - **GeoDoubleParams** (34736): DOUBLE values referenced by keys
//! - **GeoAsciiParams** (34737): `|`-terminated strings referenced by keys
//!
//! [`GeoMetadata`] bundles the four and guarantees that every key reference
//! resolves inside its parameter block.

mod keys;
mod params;

pub use keys::{
    geo_key_name, GeoKeyDirectory, GeoKeyEntry, GeoKeyHeader, GEOGRAPHIC_TYPE_GEO_KEY,
    GEOG_ANGULAR_UNITS_GEO_KEY, GEOG_CITATION_GEO_KEY, GEOG_ELLIPSOID_GEO_KEY,
    GEOG_GEODETIC_DATUM_GEO_KEY, GEOG_PRIME_MERIDIAN_LONG_GEO_KEY, GEOG_SEMI_MAJOR_AXIS_GEO_KEY,
    GEOG_SEMI_MINOR_AXIS_GEO_KEY, GT_MODEL_TYPE_GEO_KEY, GT_RASTER_TYPE_GEO_KEY,
    PCS_CITATION_GEO_KEY, PROJECTED_CS_TYPE_GEO_KEY, PROJECTION_GEO_KEY,
    PROJ_COORD_TRANS_GEO_KEY, PROJ_FALSE_EASTING_GEO_KEY, PROJ_FALSE_ORIGIN_LONG_GEO_KEY,
    PROJ_LINEAR_UNITS_GEO_KEY, PROJ_STD_PARALLEL1_GEO_KEY, USER_DEFINED,
};
pub use params::{GeoAsciiParams, GeoDoubleParams, ModelTransform};

use crate::error::ConfigError;
use crate::format::tiff::TiffTag;

// =============================================================================
// Moon 2000 Configuration
// =============================================================================

/// Moon mean radius in metres (IAU 2000), used for both ellipsoid axes.
pub const MOON_RADIUS_M: f64 = 1_737_400.0;

/// Ground size of one pixel in metres.
const MOON_PIXEL_SIZE_M: f64 = 118.4505876;

const MOON_ORIGIN_X: f64 = -5_458_203.076608;
const MOON_ORIGIN_Y: f64 = 2_729_101.538304;

const MOON_ASCII: &str = "GCS Name = Moon 2000|Datum = D_Moon_2000|\
Ellipsoid = Moon_2000_IAU_IAG|Primem = Reference_Meridian|\
AUnits = Decimal_Degree|SimpleCylindrical Moon|";

/// Angular unit: degree.
const ANGULAR_DEGREE: u16 = 9102;
/// Linear unit: metre.
const LINEAR_METER: u16 = 9001;
/// Coordinate transformation: equirectangular.
const CT_EQUIRECTANGULAR: u16 = 12;

// =============================================================================
// GeoMetadata
// =============================================================================

/// The four georeferencing blocks of a single image.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoMetadata {
    model_transform: ModelTransform,
    key_directory: GeoKeyDirectory,
    double_params: GeoDoubleParams,
    ascii_params: GeoAsciiParams,
}

impl GeoMetadata {
    /// Bundle the blocks, checking that key references resolve.
    pub fn new(
        model_transform: ModelTransform,
        key_directory: GeoKeyDirectory,
        double_params: GeoDoubleParams,
        ascii_params: GeoAsciiParams,
    ) -> Result<Self, ConfigError> {
        key_directory.check_references(&double_params, &ascii_params)?;
        Ok(Self {
            model_transform,
            key_directory,
            double_params,
            ascii_params,
        })
    }

    /// Simple cylindrical projection of the Moon 2000 geographic CRS.
    ///
    /// 18 keys, 6 double parameters and a 146-byte citation string. The
    /// citation key counts are kept as GDAL wrote them for this dataset.
    pub fn moon_2000() -> Self {
        let keys = vec![
            GeoKeyEntry::short(GT_MODEL_TYPE_GEO_KEY, 1),
            GeoKeyEntry::short(GT_RASTER_TYPE_GEO_KEY, 1),
            GeoKeyEntry::short(GEOGRAPHIC_TYPE_GEO_KEY, USER_DEFINED),
            GeoKeyEntry::referenced(GEOG_CITATION_GEO_KEY, TiffTag::GeoAsciiParams, 117, 0),
            GeoKeyEntry::short(GEOG_GEODETIC_DATUM_GEO_KEY, USER_DEFINED),
            GeoKeyEntry::short(GEOG_ANGULAR_UNITS_GEO_KEY, ANGULAR_DEGREE),
            GeoKeyEntry::short(GEOG_ELLIPSOID_GEO_KEY, USER_DEFINED),
            GeoKeyEntry::referenced(GEOG_SEMI_MAJOR_AXIS_GEO_KEY, TiffTag::GeoDoubleParams, 1, 0),
            GeoKeyEntry::referenced(GEOG_SEMI_MINOR_AXIS_GEO_KEY, TiffTag::GeoDoubleParams, 1, 1),
            GeoKeyEntry::referenced(
                GEOG_PRIME_MERIDIAN_LONG_GEO_KEY,
                TiffTag::GeoDoubleParams,
                1,
                2,
            ),
            GeoKeyEntry::short(PROJECTED_CS_TYPE_GEO_KEY, USER_DEFINED),
            GeoKeyEntry::referenced(PCS_CITATION_GEO_KEY, TiffTag::GeoAsciiParams, 20, 117),
            GeoKeyEntry::short(PROJECTION_GEO_KEY, USER_DEFINED),
            GeoKeyEntry::short(PROJ_COORD_TRANS_GEO_KEY, CT_EQUIRECTANGULAR),
            GeoKeyEntry::short(PROJ_LINEAR_UNITS_GEO_KEY, LINEAR_METER),
            GeoKeyEntry::referenced(PROJ_STD_PARALLEL1_GEO_KEY, TiffTag::GeoDoubleParams, 1, 3),
            GeoKeyEntry::referenced(PROJ_FALSE_EASTING_GEO_KEY, TiffTag::GeoDoubleParams, 1, 4),
            GeoKeyEntry::referenced(
                PROJ_FALSE_ORIGIN_LONG_GEO_KEY,
                TiffTag::GeoDoubleParams,
                1,
                5,
            ),
        ];

        let key_count = keys.len() as u16;
        Self {
            model_transform: ModelTransform::north_up(
                MOON_PIXEL_SIZE_M,
                MOON_PIXEL_SIZE_M,
                MOON_ORIGIN_X,
                MOON_ORIGIN_Y,
            ),
            key_directory: GeoKeyDirectory::new_unchecked(GeoKeyHeader::v1_1(key_count), keys),
            double_params: GeoDoubleParams::new(vec![
                MOON_RADIUS_M,
                MOON_RADIUS_M,
                0.0,
                0.0,
                0.0,
                0.0,
            ]),
            ascii_params: GeoAsciiParams::new_unchecked(MOON_ASCII),
        }
    }

    pub fn model_transform(&self) -> &ModelTransform {
        &self.model_transform
    }

    pub fn key_directory(&self) -> &GeoKeyDirectory {
        &self.key_directory
    }

    pub fn double_params(&self) -> &GeoDoubleParams {
        &self.double_params
    }

    pub fn ascii_params(&self) -> &GeoAsciiParams {
        &self.ascii_params
    }
}

impl Default for GeoMetadata {
    fn default() -> Self {
        Self::moon_2000()
    }
}

// =============================================================================
// Tests
// =============================================================================
