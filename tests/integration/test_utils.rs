//! Test utilities for integration tests.
//!
//! Helpers for building files and reading raw values back, plus sinks that
//! record or reject stores.

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use geotiff_builder::{
    GeoTiffBuilder, GeoTiffFile, GeoTiffPlan, ImageGeometry, IoError, PixelSource, TiffSink,
};

// =============================================================================
// Geometries
// =============================================================================

/// Geometries exercised by the property tests.
pub fn sample_geometries() -> Vec<ImageGeometry> {
    vec![
        ImageGeometry::default(),
        ImageGeometry::grayscale(128, 128, 128),
        ImageGeometry::grayscale(2048, 256, 256),
        ImageGeometry::grayscale(64, 64, 16),
        ImageGeometry {
            width: 512,
            height: 384,
            tile_width: 256,
            tile_length: 128,
            ..ImageGeometry::default()
        },
    ]
}

// =============================================================================
// Building
// =============================================================================

pub fn plan(geometry: ImageGeometry) -> GeoTiffPlan {
    GeoTiffBuilder::new(geometry).plan().unwrap()
}

pub fn build(geometry: ImageGeometry, source: &mut dyn PixelSource) -> GeoTiffFile {
    plan(geometry).build(source).unwrap()
}

/// Pixel source that stamps every byte of tile `i` with `i` and counts calls.
#[derive(Default)]
pub struct IndexStampSource {
    pub calls: Vec<u32>,
}

impl PixelSource for IndexStampSource {
    fn produce_tile_bytes(&mut self, tile_index: u32, bytes_per_tile: usize) -> Vec<u8> {
        self.calls.push(tile_index);
        vec![tile_index as u8; bytes_per_tile]
    }
}

// =============================================================================
// Raw Readers
// =============================================================================

pub fn u16_at(bytes: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

pub fn u32_at(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

/// Raw IFD entries `(tag, type, count, value)` of the file's first IFD.
pub fn raw_entries(bytes: &[u8]) -> Vec<(u16, u16, u32, u32)> {
    let ifd = u32_at(bytes, 4) as usize;
    let count = u16_at(bytes, ifd) as usize;
    (0..count)
        .map(|i| {
            let at = ifd + 2 + i * 12;
            (
                u16_at(bytes, at),
                u16_at(bytes, at + 2),
                u32_at(bytes, at + 4),
                u32_at(bytes, at + 8),
            )
        })
        .collect()
}

// =============================================================================
// Sinks
// =============================================================================

/// Sink that records every store.
#[derive(Clone, Default)]
pub struct RecordingSink {
    store_count: Arc<AtomicUsize>,
    stored: Arc<RwLock<Vec<(String, Bytes)>>>,
}

impl RecordingSink {
    pub fn store_count(&self) -> usize {
        self.store_count.load(Ordering::SeqCst)
    }

    pub async fn stored(&self) -> Vec<(String, Bytes)> {
        self.stored.read().await.clone()
    }
}

#[async_trait]
impl TiffSink for RecordingSink {
    async fn store(&self, name: &str, data: Bytes) -> Result<(), IoError> {
        self.store_count.fetch_add(1, Ordering::SeqCst);
        self.stored.write().await.push((name.to_string(), data));
        Ok(())
    }

    fn identifier(&self) -> &str {
        "recording"
    }
}

/// Sink whose every store fails.
pub struct FailingSink;

#[async_trait]
impl TiffSink for FailingSink {
    async fn store(&self, _name: &str, _data: Bytes) -> Result<(), IoError> {
        Err(IoError::Connection("connection refused".to_string()))
    }

    fn identifier(&self) -> &str {
        "failing"
    }
}

/// Unique scratch directory under the system temp dir.
pub fn scratch_dir(label: &str) -> std::path::PathBuf {
    static COUNTER: AtomicUsize = AtomicUsize::new(0);
    let n = COUNTER.fetch_add(1, Ordering::SeqCst);
    std::env::temp_dir().join(format!(
        "geotiff-builder-{}-{}-{}",
        label,
        std::process::id(),
        n
    ))
}
