//! GeoKey directory (tag 34735).
//!
//! The directory is an array of SHORTs: a 4-value header followed by one
//! 4-value entry per key.
//!
//! ```text
//! Header: KeyDirectoryVersion, KeyRevision, MinorRevision, NumberOfKeys
//! Entry:  KeyID, TIFFTagLocation, Count, ValueOffset
//! ```
//!
//! A location of 0 means the value is the `ValueOffset` field itself;
//! otherwise the value lives in the array held by the named tag
//! (GeoDoubleParams, GeoAsciiParams, or the directory itself).

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::ConfigError;
use crate::format::tiff::TiffTag;

use super::params::{GeoAsciiParams, GeoDoubleParams};

// =============================================================================
// Key IDs
// =============================================================================

pub const GT_MODEL_TYPE_GEO_KEY: u16 = 1024;
pub const GT_RASTER_TYPE_GEO_KEY: u16 = 1025;
pub const GEOGRAPHIC_TYPE_GEO_KEY: u16 = 2048;
pub const GEOG_CITATION_GEO_KEY: u16 = 2049;
pub const GEOG_GEODETIC_DATUM_GEO_KEY: u16 = 2050;
pub const GEOG_ANGULAR_UNITS_GEO_KEY: u16 = 2054;
pub const GEOG_ELLIPSOID_GEO_KEY: u16 = 2056;
pub const GEOG_SEMI_MAJOR_AXIS_GEO_KEY: u16 = 2057;
pub const GEOG_SEMI_MINOR_AXIS_GEO_KEY: u16 = 2058;
pub const GEOG_PRIME_MERIDIAN_LONG_GEO_KEY: u16 = 2061;
pub const PROJECTED_CS_TYPE_GEO_KEY: u16 = 3072;
pub const PCS_CITATION_GEO_KEY: u16 = 3073;
pub const PROJECTION_GEO_KEY: u16 = 3074;
pub const PROJ_COORD_TRANS_GEO_KEY: u16 = 3075;
pub const PROJ_LINEAR_UNITS_GEO_KEY: u16 = 3076;
pub const PROJ_STD_PARALLEL1_GEO_KEY: u16 = 3078;
pub const PROJ_FALSE_EASTING_GEO_KEY: u16 = 3082;
pub const PROJ_FALSE_ORIGIN_LONG_GEO_KEY: u16 = 3084;

/// GeoKey value meaning "user defined".
pub const USER_DEFINED: u16 = 32767;

/// Human-readable name of a known GeoKey.
pub fn geo_key_name(key_id: u16) -> Option<&'static str> {
    let name = match key_id {
        GT_MODEL_TYPE_GEO_KEY => "GTModelTypeGeoKey",
        GT_RASTER_TYPE_GEO_KEY => "GTRasterTypeGeoKey",
        GEOGRAPHIC_TYPE_GEO_KEY => "GeographicTypeGeoKey",
        GEOG_CITATION_GEO_KEY => "GeogCitationGeoKey",
        GEOG_GEODETIC_DATUM_GEO_KEY => "GeogGeodeticDatumGeoKey",
        GEOG_ANGULAR_UNITS_GEO_KEY => "GeogAngularUnitsGeoKey",
        GEOG_ELLIPSOID_GEO_KEY => "GeogEllipsoidGeoKey",
        GEOG_SEMI_MAJOR_AXIS_GEO_KEY => "GeogSemiMajorAxisGeoKey",
        GEOG_SEMI_MINOR_AXIS_GEO_KEY => "GeogSemiMinorAxisGeoKey",
        GEOG_PRIME_MERIDIAN_LONG_GEO_KEY => "GeogPrimeMeridianLongGeoKey",
        PROJECTED_CS_TYPE_GEO_KEY => "ProjectedCSTypeGeoKey",
        PCS_CITATION_GEO_KEY => "PCSCitationGeoKey",
        PROJECTION_GEO_KEY => "ProjectionGeoKey",
        PROJ_COORD_TRANS_GEO_KEY => "ProjCoordTransGeoKey",
        PROJ_LINEAR_UNITS_GEO_KEY => "ProjLinearUnitsGeoKey",
        PROJ_STD_PARALLEL1_GEO_KEY => "ProjStdParallel1GeoKey",
        PROJ_FALSE_EASTING_GEO_KEY => "ProjFalseEastingGeoKey",
        PROJ_FALSE_ORIGIN_LONG_GEO_KEY => "ProjFalseOriginLongGeoKey",
        _ => return None,
    };
    Some(name)
}

// =============================================================================
// Header and Entries
// =============================================================================

/// The four-SHORT directory header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeoKeyHeader {
    pub version: u16,
    pub revision: u16,
    pub minor_revision: u16,
    pub number_of_keys: u16,
}

impl GeoKeyHeader {
    /// Version 1.1.0 header declaring `number_of_keys` keys.
    pub fn v1_1(number_of_keys: u16) -> Self {
        Self {
            version: 1,
            revision: 1,
            minor_revision: 0,
            number_of_keys,
        }
    }
}

/// A single key entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeoKeyEntry {
    pub key_id: u16,
    pub location: u16,
    pub count: u16,
    pub value_offset: u16,
}

impl GeoKeyEntry {
    /// Key whose SHORT value is stored in the entry.
    pub const fn short(key_id: u16, value: u16) -> Self {
        Self {
            key_id,
            location: 0,
            count: 1,
            value_offset: value,
        }
    }

    /// Key whose value is `count` elements at `index` in the array held by `tag`.
    pub const fn referenced(key_id: u16, tag: TiffTag, count: u16, index: u16) -> Self {
        Self {
            key_id,
            location: tag.as_u16(),
            count,
            value_offset: index,
        }
    }
}

// =============================================================================
// GeoKeyDirectory
// =============================================================================

/// A validated GeoKey directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeoKeyDirectory {
    header: GeoKeyHeader,
    keys: Vec<GeoKeyEntry>,
}

impl GeoKeyDirectory {
    /// Create a directory, checking the declared key count and key ordering.
    pub fn new(header: GeoKeyHeader, keys: Vec<GeoKeyEntry>) -> Result<Self, ConfigError> {
        if header.number_of_keys as usize != keys.len() {
            return Err(ConfigError::GeoKeys(format!(
                "header declares {} keys but {} were given",
                header.number_of_keys,
                keys.len()
            )));
        }

        if let Some(pair) = keys.windows(2).find(|w| w[0].key_id >= w[1].key_id) {
            return Err(ConfigError::GeoKeys(format!(
                "keys must be strictly ascending: {} is followed by {}",
                pair[0].key_id, pair[1].key_id
            )));
        }

        Ok(Self::new_unchecked(header, keys))
    }

    /// Built-in tables are checked by their tests instead.
    pub(crate) fn new_unchecked(header: GeoKeyHeader, keys: Vec<GeoKeyEntry>) -> Self {
        Self { header, keys }
    }

    /// Create a directory from its raw SHORT array.
    pub fn from_shorts(shorts: &[u16]) -> Result<Self, ConfigError> {
        if shorts.len() < 4 {
            return Err(ConfigError::GeoKeys(format!(
                "directory needs at least 4 values, got {}",
                shorts.len()
            )));
        }

        let header = GeoKeyHeader {
            version: shorts[0],
            revision: shorts[1],
            minor_revision: shorts[2],
            number_of_keys: shorts[3],
        };

        let expected = 4 + 4 * header.number_of_keys as usize;
        if shorts.len() != expected {
            return Err(ConfigError::GeoKeys(format!(
                "header declares {} keys, which needs {} values, got {}",
                header.number_of_keys,
                expected,
                shorts.len()
            )));
        }

        let keys = shorts[4..]
            .chunks_exact(4)
            .map(|c| GeoKeyEntry {
                key_id: c[0],
                location: c[1],
                count: c[2],
                value_offset: c[3],
            })
            .collect();

        Self::new(header, keys)
    }

    /// Directory header.
    pub fn header(&self) -> GeoKeyHeader {
        self.header
    }

    /// Key entries in ascending key order.
    pub fn keys(&self) -> &[GeoKeyEntry] {
        &self.keys
    }

    /// Look up a key by ID.
    pub fn get(&self, key_id: u16) -> Option<&GeoKeyEntry> {
        self.keys
            .binary_search_by_key(&key_id, |k| k.key_id)
            .ok()
            .map(|i| &self.keys[i])
    }

    /// Number of SHORT values (the tag count).
    #[inline]
    pub fn element_count(&self) -> usize {
        4 + 4 * self.keys.len()
    }

    /// Encoded length in bytes.
    #[inline]
    pub fn byte_len(&self) -> usize {
        self.element_count() * 2
    }

    /// The directory as a SHORT array.
    pub fn to_shorts(&self) -> Vec<u16> {
        let mut shorts = Vec::with_capacity(self.element_count());
        shorts.extend_from_slice(&[
            self.header.version,
            self.header.revision,
            self.header.minor_revision,
            self.header.number_of_keys,
        ]);
        for key in &self.keys {
            shorts.extend_from_slice(&[key.key_id, key.location, key.count, key.value_offset]);
        }
        shorts
    }

    /// Encode as little-endian SHORTs.
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.byte_len());
        for value in self.to_shorts() {
            buf.put_u16_le(value);
        }
        buf.freeze()
    }

    /// Check that every key referencing a parameter array stays inside it.
    pub fn check_references(
        &self,
        doubles: &GeoDoubleParams,
        ascii: &GeoAsciiParams,
    ) -> Result<(), ConfigError> {
        for key in &self.keys {
            if key.location == 0 {
                if key.count != 1 {
                    return Err(ConfigError::GeoKeys(format!(
                        "key {} is stored inline but has count {}",
                        key.key_id, key.count
                    )));
                }
                continue;
            }

            let available = match TiffTag::from_u16(key.location) {
                Some(TiffTag::GeoDoubleParams) => doubles.len(),
                Some(TiffTag::GeoAsciiParams) => ascii.byte_len(),
                Some(TiffTag::GeoKeyDirectory) => self.element_count(),
                _ => {
                    return Err(ConfigError::GeoKeys(format!(
                        "key {} references unsupported location {}",
                        key.key_id, key.location
                    )));
                }
            };

            let end = key.value_offset as usize + key.count as usize;
            if end > available {
                return Err(ConfigError::GeoKeys(format!(
                    "key {} reads {} values at {} from tag {}, which holds {}",
                    key.key_id, key.count, key.value_offset, key.location, available
                )));
            }
        }
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
