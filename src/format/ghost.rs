//! GDAL structural metadata ("ghost header").
//!
//! GDAL's cloud-optimized GeoTIFF writer places a small human-readable block
//! between the TIFF header and the first IFD:
//!
//! ```text
//! GDAL_STRUCTURAL_METADATA_SIZE=000140 bytes\n
//! LAYOUT=IFDS_BEFORE_DATA\n
//! BLOCK_ORDER=ROW_MAJOR\n
//! BLOCK_LEADER=SIZE_AS_UINT4\n
//! BLOCK_TRAILER=LAST_4_BYTES_REPEATED\n
//! KNOWN_INCOMPATIBLE_EDITION=NO\n
//! <padding>
//! ```
//!
//! The declared size counts the bytes that follow the first line. Readers use
//! it to skip the block, so it must always equal the true body length.

use bytes::Bytes;

use crate::error::ConfigError;

// =============================================================================
// Constants
// =============================================================================

const SIZE_PREFIX: &str = "GDAL_STRUCTURAL_METADATA_SIZE=";
const SIZE_SUFFIX: &str = " bytes\n";
const SIZE_DIGITS: usize = 6;

/// Length of the `GDAL_STRUCTURAL_METADATA_SIZE=NNNNNN bytes\n` line.
pub const GHOST_SIZE_LINE_LEN: usize = SIZE_PREFIX.len() + SIZE_DIGITS + SIZE_SUFFIX.len();

/// Largest body the six-digit size field can declare.
pub const MAX_GHOST_BODY_LEN: usize = 999_999;

/// Structural items written by GDAL for a COG without masks.
const GDAL_COG_ITEMS: [(&str, &str); 5] = [
    ("LAYOUT", "IFDS_BEFORE_DATA"),
    ("BLOCK_ORDER", "ROW_MAJOR"),
    ("BLOCK_LEADER", "SIZE_AS_UINT4"),
    ("BLOCK_TRAILER", "LAST_4_BYTES_REPEATED"),
    ("KNOWN_INCOMPATIBLE_EDITION", "NO"),
];

// =============================================================================
// GhostHeader
// =============================================================================

/// The ghost header block: a size line followed by `KEY=VALUE` lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GhostHeader {
    body: String,
}

impl GhostHeader {
    /// The standard GDAL COG structural metadata (140-byte body).
    pub fn gdal_cog() -> Self {
        let items: Vec<(String, String)> = GDAL_COG_ITEMS
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self::body_from_items(&items)
    }

    /// Build a ghost header from structural `KEY=VALUE` items.
    ///
    /// A single trailing space pads the body, as GDAL does.
    pub fn from_items(items: &[(String, String)]) -> Result<Self, ConfigError> {
        for (key, value) in items {
            if key.is_empty() || key.contains(['=', '\n']) || value.contains('\n') {
                return Err(ConfigError::GhostHeader(format!(
                    "invalid item {:?}={:?}",
                    key, value
                )));
            }
            if !key.is_ascii() || !value.is_ascii() {
                return Err(ConfigError::GhostHeader(format!(
                    "non-ASCII item {:?}={:?}",
                    key, value
                )));
            }
        }

        let header = Self::body_from_items(items);
        if header.body.len() > MAX_GHOST_BODY_LEN {
            return Err(ConfigError::GhostHeader(format!(
                "body of {} bytes does not fit the size field",
                header.body.len()
            )));
        }
        Ok(header)
    }

    fn body_from_items(items: &[(String, String)]) -> Self {
        let mut body = String::new();
        for (key, value) in items {
            body.push_str(key);
            body.push('=');
            body.push_str(value);
            body.push('\n');
        }
        body.push(' ');
        Self { body }
    }

    /// Size declared in the first line (the body length).
    #[inline]
    pub fn declared_size(&self) -> usize {
        self.body.len()
    }

    /// Total length of the encoded block.
    #[inline]
    pub fn byte_len(&self) -> usize {
        GHOST_SIZE_LINE_LEN + self.body.len()
    }

    /// `KEY=VALUE` items in order.
    pub fn items(&self) -> Vec<(&str, &str)> {
        self.body
            .lines()
            .filter_map(|line| line.split_once('='))
            .collect()
    }

    /// Look up a single structural item.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.items()
            .into_iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v)
    }

    /// Encode the block.
    pub fn encode(&self) -> Bytes {
        let mut out = String::with_capacity(self.byte_len());
        out.push_str(SIZE_PREFIX);
        out.push_str(&format!("{:0width$}", self.body.len(), width = SIZE_DIGITS));
        out.push_str(SIZE_SUFFIX);
        out.push_str(&self.body);
        Bytes::from(out)
    }

    /// Parse a ghost header from the bytes that follow a TIFF header.
    ///
    /// Trailing bytes beyond the declared body are ignored.
    pub fn parse(bytes: &[u8]) -> Result<Self, ConfigError> {
        if bytes.len() < GHOST_SIZE_LINE_LEN || !bytes.starts_with(SIZE_PREFIX.as_bytes()) {
            return Err(ConfigError::GhostHeader(
                "missing GDAL_STRUCTURAL_METADATA_SIZE line".to_string(),
            ));
        }

        let digits = &bytes[SIZE_PREFIX.len()..SIZE_PREFIX.len() + SIZE_DIGITS];
        let suffix = &bytes[SIZE_PREFIX.len() + SIZE_DIGITS..GHOST_SIZE_LINE_LEN];
        if suffix != SIZE_SUFFIX.as_bytes() || !digits.iter().all(u8::is_ascii_digit) {
            return Err(ConfigError::GhostHeader("malformed size line".to_string()));
        }

        let declared: usize = digits
            .iter()
            .fold(0, |acc, d| acc * 10 + (d - b'0') as usize);

        let body = bytes
            .get(GHOST_SIZE_LINE_LEN..GHOST_SIZE_LINE_LEN + declared)
            .ok_or_else(|| {
                ConfigError::GhostHeader(format!(
                    "declared size {} exceeds the {} available bytes",
                    declared,
                    bytes.len() - GHOST_SIZE_LINE_LEN
                ))
            })?;

        let body = std::str::from_utf8(body)
            .map_err(|_| ConfigError::GhostHeader("body is not ASCII".to_string()))?;

        Ok(Self {
            body: body.to_string(),
        })
    }
}

impl Default for GhostHeader {
    fn default() -> Self {
        Self::gdal_cog()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gdal_cog_declares_true_size() {
        let ghost = GhostHeader::gdal_cog();
        let encoded = ghost.encode();

        assert_eq!(ghost.declared_size(), 140);
        assert!(encoded.starts_with(b"GDAL_STRUCTURAL_METADATA_SIZE=000140 bytes\n"));
        assert_eq!(encoded.len(), GHOST_SIZE_LINE_LEN + 140);
        assert_eq!(encoded.len(), ghost.byte_len());
    }

    #[test]
    fn test_size_line_length() {
        assert_eq!(GHOST_SIZE_LINE_LEN, 43);
    }

    #[test]
    fn test_items() {
        let ghost = GhostHeader::gdal_cog();
        assert_eq!(ghost.items().len(), 5);
        assert_eq!(ghost.get("LAYOUT"), Some("IFDS_BEFORE_DATA"));
        assert_eq!(ghost.get("KNOWN_INCOMPATIBLE_EDITION"), Some("NO"));
        assert_eq!(ghost.get("MISSING"), None);
    }

    #[test]
    fn test_parse_round_trip_with_trailing_data() {
        let ghost = GhostHeader::gdal_cog();
        let mut bytes = ghost.encode().to_vec();
        bytes.extend_from_slice(&[0x0E, 0x00]);

        let parsed = GhostHeader::parse(&bytes).unwrap();
        assert_eq!(parsed, ghost);
    }

    #[test]
    fn test_parse_rejects_short_body() {
        let mut bytes = GhostHeader::gdal_cog().encode().to_vec();
        bytes.truncate(100);

        let result = GhostHeader::parse(&bytes);
        assert!(matches!(result, Err(ConfigError::GhostHeader(_))));
    }

    #[test]
    fn test_parse_rejects_missing_prefix() {
        let result = GhostHeader::parse(b"LAYOUT=IFDS_BEFORE_DATA\n");
        assert!(result.is_err());

        let result = GhostHeader::parse(b"GDAL_STRUCTURAL_METADATA_SIZE=00x140 bytes\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_from_items() {
        let ghost =
            GhostHeader::from_items(&[("LAYOUT".to_string(), "IFDS_BEFORE_DATA".to_string())])
                .unwrap();
        assert_eq!(ghost.declared_size(), "LAYOUT=IFDS_BEFORE_DATA\n ".len());
        assert!(ghost.encode().starts_with(b"GDAL_STRUCTURAL_METADATA_SIZE=000025 bytes\n"));
    }

    #[test]
    fn test_from_items_rejects_newlines() {
        let result = GhostHeader::from_items(&[("A\nB".to_string(), "C".to_string())]);
        assert!(matches!(result, Err(ConfigError::GhostHeader(_))));

        let result = GhostHeader::from_items(&[("A".to_string(), "B=\nC".to_string())]);
        assert!(result.is_err());
    }
}
