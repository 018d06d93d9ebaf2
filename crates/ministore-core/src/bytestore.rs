//! Opaque byte-store backends for object payloads.
//!
//! The driver never holds payload bytes in its indices; it stores blob
//! identifiers that resolve through a [`ByteStore`]. Two backends are
//! provided:
//!
//! - [`MemoryByteStore`] — payloads kept in a concurrent map, used by the
//!   in-memory driver and throughout the test suite.
//! - [`FsByteStore`] — one file per blob under a data directory, used
//!   when payloads should survive a process restart.
//!
//! Blob identifiers are chosen by the caller *before* any index mutation,
//! so payload writes happen entirely outside the index locks.

use std::path::PathBuf;

use anyhow::Context;
use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use tracing::trace;

use crate::error::{DriverError, DriverResult};

/// Abstract payload storage addressed by caller-chosen blob identifiers.
///
/// Implementations must be safe for concurrent use; the driver issues
/// reads and writes from parallel request handlers without external
/// locking.
#[async_trait]
pub trait ByteStore: Send + Sync + 'static {
    /// Store `data` under `blob_id`, replacing any previous payload.
    async fn put(&self, blob_id: &str, data: Bytes) -> DriverResult<()>;

    /// Fetch the complete payload for `blob_id`.
    ///
    /// Returns `Internal` if the blob is unknown: the driver only asks
    /// for blobs its index references, so a miss is a store invariant
    /// violation rather than a caller error.
    async fn get(&self, blob_id: &str) -> DriverResult<Bytes>;

    /// Fetch `length` bytes starting at `start`.
    ///
    /// The caller validates the range against the object size; an
    /// out-of-bounds request here surfaces as `InvalidRange`.
    async fn get_range(&self, blob_id: &str, start: u64, length: u64) -> DriverResult<Bytes>;

    /// Discard the payload for `blob_id`. Unknown blobs are a no-op.
    async fn remove(&self, blob_id: &str) -> DriverResult<()>;
}

/// Slice a full payload down to a validated range.
fn slice_range(data: &Bytes, start: u64, length: u64) -> DriverResult<Bytes> {
    let start = usize::try_from(start).map_err(|_| DriverError::InvalidRange)?;
    let length = usize::try_from(length).map_err(|_| DriverError::InvalidRange)?;
    let end = start.checked_add(length).ok_or(DriverError::InvalidRange)?;
    if start >= data.len() || end > data.len() || length == 0 {
        return Err(DriverError::InvalidRange);
    }
    Ok(data.slice(start..end))
}

// ---------------------------------------------------------------------------
// MemoryByteStore
// ---------------------------------------------------------------------------

/// Byte store keeping every payload in process memory.
#[derive(Debug, Default)]
pub struct MemoryByteStore {
    blobs: DashMap<String, Bytes>,
}

impl MemoryByteStore {
    /// Create an empty in-memory byte store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ByteStore for MemoryByteStore {
    async fn put(&self, blob_id: &str, data: Bytes) -> DriverResult<()> {
        trace!(blob_id, size = data.len(), "stored blob in memory");
        self.blobs.insert(blob_id.to_owned(), data);
        Ok(())
    }

    async fn get(&self, blob_id: &str) -> DriverResult<Bytes> {
        self.blobs
            .get(blob_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| anyhow::anyhow!("blob missing from memory store: {blob_id}").into())
    }

    async fn get_range(&self, blob_id: &str, start: u64, length: u64) -> DriverResult<Bytes> {
        let data = self.get(blob_id).await?;
        slice_range(&data, start, length)
    }

    async fn remove(&self, blob_id: &str) -> DriverResult<()> {
        if self.blobs.remove(blob_id).is_some() {
            trace!(blob_id, "removed blob from memory");
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FsByteStore
// ---------------------------------------------------------------------------

/// Byte store writing one file per blob under a data directory.
///
/// Blob identifiers are hex strings chosen by the driver, so they map
/// directly to file names without escaping.
#[derive(Debug)]
pub struct FsByteStore {
    root: PathBuf,
}

impl FsByteStore {
    /// Create a byte store rooted at `root`, creating the directory if
    /// needed.
    ///
    /// # Errors
    ///
    /// Returns `Internal` if the directory cannot be created.
    pub fn new(root: impl Into<PathBuf>) -> DriverResult<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)
            .with_context(|| format!("creating byte-store directory {}", root.display()))?;
        Ok(Self { root })
    }

    fn blob_path(&self, blob_id: &str) -> PathBuf {
        self.root.join(blob_id)
    }
}

#[async_trait]
impl ByteStore for FsByteStore {
    async fn put(&self, blob_id: &str, data: Bytes) -> DriverResult<()> {
        let path = self.blob_path(blob_id);
        tokio::fs::write(&path, &data)
            .await
            .with_context(|| format!("writing blob {}", path.display()))?;
        trace!(blob_id, size = data.len(), "stored blob on disk");
        Ok(())
    }

    async fn get(&self, blob_id: &str) -> DriverResult<Bytes> {
        let path = self.blob_path(blob_id);
        let data = tokio::fs::read(&path)
            .await
            .with_context(|| format!("reading blob {}", path.display()))?;
        Ok(Bytes::from(data))
    }

    async fn get_range(&self, blob_id: &str, start: u64, length: u64) -> DriverResult<Bytes> {
        let data = self.get(blob_id).await?;
        slice_range(&data, start, length)
    }

    async fn remove(&self, blob_id: &str) -> DriverResult<()> {
        let path = self.blob_path(blob_id);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                trace!(blob_id, "removed blob from disk");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => {
                Err(anyhow::Error::new(e)
                    .context(format!("removing blob {}", path.display()))
                    .into())
            }
        }
    }
}
