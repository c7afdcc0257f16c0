//! GeoTIFF numeric and ASCII payload blocks.
//!
//! Each block knows its element count (the directory entry count) and its
//! encoded byte length before it is encoded, so the layout can be planned
//! from lengths alone.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::ConfigError;

// =============================================================================
// ModelTransformation (tag 34264)
// =============================================================================

/// Row-major 4x4 affine transform from raster space to model space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelTransform {
    matrix: [f64; 16],
}

impl ModelTransform {
    /// Number of DOUBLE values in the tag.
    pub const ELEMENT_COUNT: usize = 16;

    /// Wrap a full 4x4 matrix.
    pub const fn new(matrix: [f64; 16]) -> Self {
        Self { matrix }
    }

    /// North-up transform with the given pixel size and top-left origin.
    ///
    /// `pixel_height` is the (positive) ground size of a row; the Y scale is
    /// written negated so rows run southwards.
    pub fn north_up(pixel_width: f64, pixel_height: f64, origin_x: f64, origin_y: f64) -> Self {
        Self::new([
            pixel_width, 0.0, 0.0, origin_x, //
            0.0, -pixel_height, 0.0, origin_y, //
            0.0, 0.0, 0.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ])
    }

    /// Matrix values, row-major.
    pub fn matrix(&self) -> &[f64; 16] {
        &self.matrix
    }

    /// Model coordinates of raster position `(col, row)`.
    pub fn apply(&self, col: f64, row: f64) -> (f64, f64) {
        let m = &self.matrix;
        (
            m[0] * col + m[1] * row + m[3],
            m[4] * col + m[5] * row + m[7],
        )
    }

    /// Encoded length in bytes (always 128).
    #[inline]
    pub const fn byte_len(&self) -> usize {
        Self::ELEMENT_COUNT * 8
    }

    /// Encode as little-endian DOUBLEs.
    pub fn encode(&self) -> Bytes {
        encode_doubles(&self.matrix)
    }
}

// =============================================================================
// GeoDoubleParams (tag 34736)
// =============================================================================

/// DOUBLE values referenced by GeoKeys.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GeoDoubleParams {
    values: Vec<f64>,
}

impl GeoDoubleParams {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of values (the tag count).
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[inline]
    pub fn byte_len(&self) -> usize {
        self.values.len() * 8
    }

    pub fn encode(&self) -> Bytes {
        encode_doubles(&self.values)
    }
}

// =============================================================================
// GeoAsciiParams (tag 34737)
// =============================================================================

/// ASCII values referenced by GeoKeys, each terminated by `|`.
///
/// Written without a trailing NUL: the tag count is exactly the text length.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GeoAsciiParams {
    text: String,
}

impl GeoAsciiParams {
    /// Wrap ASCII text, rejecting anything outside 7-bit ASCII or a NUL.
    pub fn new(text: impl Into<String>) -> Result<Self, ConfigError> {
        let text = text.into();
        if let Some(pos) = text.bytes().position(|b| !b.is_ascii() || b == 0) {
            return Err(ConfigError::GeoAscii(format!(
                "byte {} is not printable ASCII",
                pos
            )));
        }
        Ok(Self::new_unchecked(text))
    }

    pub(crate) fn new_unchecked(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Length in bytes (the tag count).
    #[inline]
    pub fn byte_len(&self) -> usize {
        self.text.len()
    }

    /// The `count` characters starting at `offset`, as referenced by a GeoKey.
    pub fn slice(&self, offset: usize, count: usize) -> Option<&str> {
        self.text.get(offset..offset.checked_add(count)?)
    }

    pub fn encode(&self) -> Bytes {
        Bytes::copy_from_slice(self.text.as_bytes())
    }
}

fn encode_doubles(values: &[f64]) -> Bytes {
    let mut buf = BytesMut::with_capacity(values.len() * 8);
    for &value in values {
        buf.put_f64_le(value);
    }
    buf.freeze()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_transform_encoding() {
        let transform = ModelTransform::north_up(2.0, 3.0, 100.0, 200.0);
        let bytes = transform.encode();

        assert_eq!(bytes.len(), 128);
        assert_eq!(transform.byte_len(), 128);
        assert_eq!(&bytes[0..8], &2.0f64.to_le_bytes());
        assert_eq!(&bytes[24..32], &100.0f64.to_le_bytes());
        assert_eq!(&bytes[40..48], &(-3.0f64).to_le_bytes());
        assert_eq!(&bytes[120..128], &1.0f64.to_le_bytes());
    }

    #[test]
    fn test_model_transform_apply() {
        let transform = ModelTransform::north_up(2.0, 3.0, 100.0, 200.0);
        assert_eq!(transform.apply(0.0, 0.0), (100.0, 200.0));
        assert_eq!(transform.apply(10.0, 10.0), (120.0, 170.0));
    }

    #[test]
    fn test_double_params() {
        let params = GeoDoubleParams::new(vec![1.5, -2.0]);
        assert_eq!(params.len(), 2);
        assert_eq!(params.byte_len(), 16);
        assert_eq!(&params.encode()[8..16], &(-2.0f64).to_le_bytes());
        assert!(GeoDoubleParams::default().is_empty());
    }

    #[test]
    fn test_ascii_params_has_no_terminator() {
        let ascii = GeoAsciiParams::new("WGS 84|").unwrap();
        assert_eq!(ascii.byte_len(), 7);
        assert_eq!(&ascii.encode()[..], b"WGS 84|");
    }

    #[test]
    fn test_ascii_params_rejects_non_ascii() {
        assert!(matches!(
            GeoAsciiParams::new("Lune \u{e9}|"),
            Err(ConfigError::GeoAscii(_))
        ));
        assert!(GeoAsciiParams::new("a\0b").is_err());
    }

    #[test]
    fn test_ascii_slice() {
        let ascii = GeoAsciiParams::new("abc|def|").unwrap();
        assert_eq!(ascii.slice(4, 4), Some("def|"));
        assert_eq!(ascii.slice(6, 4), None);
    }
}
