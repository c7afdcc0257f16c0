//! Storing generated files through the sinks.

use super::test_utils::{build, scratch_dir, FailingSink, RecordingSink};
use geotiff_builder::{
    inspect, validate_file, FileSink, ImageGeometry, IoError, MemorySink, RandomFill, TiffSink,
};

async fn store_default(sink: &dyn TiffSink, name: &str) -> Result<bytes::Bytes, IoError> {
    let file = build(ImageGeometry::grayscale(256, 256, 128), &mut RandomFill::seeded(11));
    let bytes = file.into_bytes();
    sink.store(name, bytes.clone()).await?;
    Ok(bytes)
}

// =============================================================================
// MemorySink
// =============================================================================

#[tokio::test]
async fn test_memory_sink_holds_valid_file() {
    let sink = MemorySink::new();
    let written = store_default(&sink, "moon.tif").await.unwrap();

    let stored = sink.get("moon.tif").await.unwrap();
    assert_eq!(stored, written);
    assert!(validate_file(&inspect(&stored).unwrap()).is_valid);
    assert_eq!(sink.names().await, vec!["moon.tif".to_string()]);
}

#[tokio::test]
async fn test_memory_sink_clones_share_storage() {
    let sink = MemorySink::new();
    let clone = sink.clone();
    store_default(&clone, "a.tif").await.unwrap();
    assert_eq!(sink.len().await, 1);
}

// =============================================================================
// FileSink
// =============================================================================

#[tokio::test]
async fn test_file_sink_writes_readable_file() {
    let dir = scratch_dir("file-sink");
    let sink = FileSink::new(dir.clone());
    let written = store_default(&sink, "nested/moon.tif").await.unwrap();

    let on_disk = tokio::fs::read(dir.join("nested").join("moon.tif"))
        .await
        .unwrap();
    assert_eq!(on_disk, written.to_vec());
    assert!(validate_file(&inspect(&on_disk).unwrap()).is_valid);

    tokio::fs::remove_dir_all(&dir).await.unwrap();
}

#[tokio::test]
async fn test_file_sink_rejects_escaping_names() {
    let dir = scratch_dir("escape");
    let sink = FileSink::new(dir.clone());
    for name in ["../moon.tif", "/etc/moon.tif", ""] {
        let result = store_default(&sink, name).await;
        assert!(result.is_err(), "{:?} should be rejected", name);
    }
    assert!(!dir.exists());
}

// =============================================================================
// Mock Sinks
// =============================================================================

#[tokio::test]
async fn test_recording_sink_sees_each_store() {
    let sink = RecordingSink::default();
    store_default(&sink, "one.tif").await.unwrap();
    store_default(&sink, "two.tif").await.unwrap();

    assert_eq!(sink.store_count(), 2);
    let stored = sink.stored().await;
    assert_eq!(stored[0].0, "one.tif");
    assert_eq!(stored[0].1, stored[1].1);
}

#[tokio::test]
async fn test_failing_sink_propagates_error() {
    let result = store_default(&FailingSink, "moon.tif").await;
    assert!(matches!(result, Err(IoError::Connection(_))));
}
