use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::IoError;

/// Destination for finished files.
///
/// Sinks receive the complete byte stream once assembly has succeeded, so a
/// failed build never leaves a partial file behind. Implementations must be
/// thread-safe.
#[async_trait]
pub trait TiffSink: Send + Sync {
    /// Store `data` under `name`, replacing any previous content.
    async fn store(&self, name: &str, data: Bytes) -> Result<(), IoError>;

    /// Human-readable location of the sink (for logging).
    ///
    /// For S3, this would typically be `s3://bucket/prefix`.
    fn identifier(&self) -> &str;
}

// =============================================================================
// FileSink
// =============================================================================

/// Writes files below a root directory.
#[derive(Debug, Clone)]
pub struct FileSink {
    root: PathBuf,
    identifier: String,
}

impl FileSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let identifier = root.display().to_string();
        Self { root, identifier }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve `name` below the root, refusing to escape it.
    pub fn path_for(&self, name: &str) -> Result<PathBuf, IoError> {
        let relative = Path::new(name);
        let is_plain = relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)));
        if name.is_empty() || !is_plain {
            return Err(IoError::Io(format!("invalid file name: {:?}", name)));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl TiffSink for FileSink {
    async fn store(&self, name: &str, data: Bytes) -> Result<(), IoError> {
        let path = self.path_for(name)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &data).await?;

        debug!(path = %path.display(), size = data.len(), "Wrote file");
        Ok(())
    }

    fn identifier(&self) -> &str {
        &self.identifier
    }
}

// =============================================================================
// MemorySink
// =============================================================================

/// Keeps stored files in memory. Clones share the same storage.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    files: Arc<RwLock<HashMap<String, Bytes>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Contents stored under `name`, if any.
    pub async fn get(&self, name: &str) -> Option<Bytes> {
        self.files.read().await.get(name).cloned()
    }

    /// Names of all stored files, sorted.
    pub async fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.files.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    pub async fn len(&self) -> usize {
        self.files.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.files.read().await.is_empty()
    }
}

#[async_trait]
impl TiffSink for MemorySink {
    async fn store(&self, name: &str, data: Bytes) -> Result<(), IoError> {
        debug!(name, size = data.len(), "Stored file in memory");
        self.files.write().await.insert(name.to_string(), data);
        Ok(())
    }

    fn identifier(&self) -> &str {
        "memory"
    }
}
