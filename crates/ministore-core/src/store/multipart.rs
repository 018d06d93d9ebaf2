//! Multipart upload table.
//!
//! Tracks in-progress uploads keyed by their server-generated upload
//! identifier. An upload is **Active** while present in the table;
//! completion and abort both remove the entry, so a terminated
//! identifier can never be presented again — any lookup of a removed or
//! unknown identifier fails with `InvalidUploadId`. Identifiers are
//! 64-character random hex strings and are never reused.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use rand::Rng;
use tracing::debug;

use crate::error::{DriverError, DriverResult};
use crate::types::{PartInfo, DEFAULT_MAX_PARTS};

/// Generate a fresh upload identifier: 64 hex characters, opaque to
/// clients.
#[must_use]
pub fn generate_upload_id() -> String {
    let mut rng = rand::rng();
    let mut buf = [0u8; 32];
    rng.fill(&mut buf);
    hex::encode(buf)
}

/// Index entry for one uploaded part.
#[derive(Debug, Clone)]
pub struct StoredPart {
    /// The 1-based part number.
    pub part_number: u32,
    /// Byte-store handle for the part payload.
    pub blob_id: String,
    /// Part size in bytes.
    pub size: u64,
    /// Hex-encoded MD5 of the part payload (unquoted).
    pub etag: String,
    /// When this part was last uploaded.
    pub last_modified: DateTime<Utc>,
}

impl StoredPart {
    /// The boundary-crossing view of this part, without the blob handle.
    #[must_use]
    pub fn info(&self) -> PartInfo {
        PartInfo {
            part_number: self.part_number,
            etag: self.etag.clone(),
            size: self.size,
            last_modified: self.last_modified,
        }
    }
}

/// An in-progress multipart upload.
#[derive(Debug)]
pub struct MultipartUpload {
    /// The server-generated upload identifier.
    pub upload_id: String,
    /// The bucket the final object will land in.
    pub bucket: String,
    /// The key the final object will take.
    pub key: String,
    /// When the upload was initiated.
    pub initiated: DateTime<Utc>,
    /// Parts uploaded so far, keyed by part number.
    parts: BTreeMap<u32, StoredPart>,
}

/// One page of parts from [`UploadTable::list_parts`].
#[derive(Debug)]
pub struct PartPage {
    /// Parts in ascending part-number order.
    pub parts: Vec<StoredPart>,
    /// The highest part number on this page (zero when empty).
    pub next_part_number_marker: u32,
    /// Whether parts remain past this page.
    pub is_truncated: bool,
}

// ---------------------------------------------------------------------------
// UploadTable
// ---------------------------------------------------------------------------

/// Process-wide table of active multipart uploads.
#[derive(Debug, Default)]
pub struct UploadTable {
    uploads: DashMap<String, MultipartUpload>,
}

impl UploadTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new upload targeting `(bucket, key)` and return its
    /// identifier.
    pub fn begin(&self, bucket: &str, key: &str) -> String {
        let upload_id = generate_upload_id();
        let upload = MultipartUpload {
            upload_id: upload_id.clone(),
            bucket: bucket.to_owned(),
            key: key.to_owned(),
            initiated: Utc::now(),
            parts: BTreeMap::new(),
        };
        self.uploads.insert(upload_id.clone(), upload);
        debug!(bucket, key, upload_id = %upload_id, "multipart upload initiated");
        upload_id
    }

    /// Verify that `upload_id` is active and targets `(bucket, key)`.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::InvalidUploadId`] if the identifier is
    /// unknown, already terminated, or bound to a different target.
    pub fn verify(&self, bucket: &str, key: &str, upload_id: &str) -> DriverResult<()> {
        let upload = self
            .uploads
            .get(upload_id)
            .ok_or_else(|| DriverError::invalid_upload_id(upload_id))?;
        if upload.bucket != bucket || upload.key != key {
            return Err(DriverError::invalid_upload_id(upload_id));
        }
        Ok(())
    }

    /// Insert or replace a part, returning the blob handle of any part
    /// it displaced so the caller can discard the stale payload.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::InvalidUploadId`] if the upload is not
    /// active.
    pub fn put_part(&self, upload_id: &str, part: StoredPart) -> DriverResult<Option<String>> {
        let mut upload = self
            .uploads
            .get_mut(upload_id)
            .ok_or_else(|| DriverError::invalid_upload_id(upload_id))?;
        let replaced = upload
            .parts
            .insert(part.part_number, part)
            .map(|prev| prev.blob_id);
        Ok(replaced)
    }

    /// Snapshot all parts of an upload in ascending part-number order.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::InvalidUploadId`] if the upload is not
    /// active.
    pub fn snapshot_parts(&self, upload_id: &str) -> DriverResult<Vec<StoredPart>> {
        let upload = self
            .uploads
            .get(upload_id)
            .ok_or_else(|| DriverError::invalid_upload_id(upload_id))?;
        Ok(upload.parts.values().cloned().collect())
    }

    /// Return one page of parts with numbers strictly greater than
    /// `part_number_marker`, at most `max_parts` of them (values
    /// `<= 0` mean 1000).
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::InvalidUploadId`] if the upload is not
    /// active.
    pub fn list_parts(
        &self,
        upload_id: &str,
        part_number_marker: u32,
        max_parts: i32,
    ) -> DriverResult<PartPage> {
        let upload = self
            .uploads
            .get(upload_id)
            .ok_or_else(|| DriverError::invalid_upload_id(upload_id))?;

        let max_parts = if max_parts <= 0 { DEFAULT_MAX_PARTS } else { max_parts };
        let max_parts = usize::try_from(max_parts).unwrap_or(usize::MAX);

        let mut parts: Vec<StoredPart> = Vec::new();
        let mut is_truncated = false;
        for part in upload.parts.values() {
            if part.part_number <= part_number_marker {
                continue;
            }
            if parts.len() >= max_parts {
                is_truncated = true;
                break;
            }
            parts.push(part.clone());
        }

        let next_part_number_marker = parts.last().map_or(0, |p| p.part_number);
        Ok(PartPage {
            parts,
            next_part_number_marker,
            is_truncated,
        })
    }

    /// Terminate an upload, removing it from the table.
    ///
    /// The identifier becomes permanently invalid. The removed entry is
    /// returned so the caller can release the part payloads.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::InvalidUploadId`] if the upload is not
    /// active.
    pub fn terminate(&self, upload_id: &str) -> DriverResult<MultipartUpload> {
        self.uploads
            .remove(upload_id)
            .map(|(_, upload)| upload)
            .ok_or_else(|| DriverError::invalid_upload_id(upload_id))
    }
}

impl MultipartUpload {
    /// Parts in ascending part-number order.
    #[must_use]
    pub fn parts(&self) -> Vec<StoredPart> {
        self.parts.values().cloned().collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn part(number: u32, etag: &str) -> StoredPart {
        StoredPart {
            part_number: number,
            blob_id: format!("blob-{number}-{etag}"),
            size: 8,
            etag: etag.to_owned(),
            last_modified: Utc::now(),
        }
    }

    #[test]
    fn test_should_generate_distinct_hex_upload_ids() {
        let a = generate_upload_id();
        let b = generate_upload_id();
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_should_verify_active_upload_and_target() {
        let table = UploadTable::new();
        let id = table.begin("bucket", "key");

        assert!(table.verify("bucket", "key", &id).is_ok());
        assert!(matches!(
            table.verify("bucket", "other", &id),
            Err(DriverError::InvalidUploadId { .. })
        ));
        assert!(matches!(
            table.verify("other", "key", &id),
            Err(DriverError::InvalidUploadId { .. })
        ));
        assert!(matches!(
            table.verify("bucket", "key", "unknown"),
            Err(DriverError::InvalidUploadId { .. })
        ));
    }

    #[test]
    fn test_should_overwrite_part_and_return_displaced_blob() {
        let table = UploadTable::new();
        let id = table.begin("b", "k");

        let replaced = table
            .put_part(&id, part(1, "old"))
            .unwrap_or_else(|e| panic!("put_part failed: {e}"));
        assert!(replaced.is_none());

        let replaced = table
            .put_part(&id, part(1, "new"))
            .unwrap_or_else(|e| panic!("second put_part failed: {e}"));
        assert_eq!(replaced.as_deref(), Some("blob-1-old"));

        let parts = table
            .snapshot_parts(&id)
            .unwrap_or_else(|e| panic!("snapshot failed: {e}"));
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].etag, "new");
    }

    #[test]
    fn test_should_list_parts_in_ascending_order() {
        let table = UploadTable::new();
        let id = table.begin("b", "k");
        for number in [3, 1, 2] {
            table
                .put_part(&id, part(number, "e"))
                .unwrap_or_else(|e| panic!("put_part {number} failed: {e}"));
        }

        let page = table
            .list_parts(&id, 0, 0)
            .unwrap_or_else(|e| panic!("list_parts failed: {e}"));
        let numbers: Vec<u32> = page.parts.iter().map(|p| p.part_number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert!(!page.is_truncated);
        assert_eq!(page.next_part_number_marker, 3);
    }

    #[test]
    fn test_should_paginate_parts_with_marker() {
        let table = UploadTable::new();
        let id = table.begin("b", "k");
        for number in 1..=5 {
            table
                .put_part(&id, part(number, "e"))
                .unwrap_or_else(|e| panic!("put_part {number} failed: {e}"));
        }

        let page = table
            .list_parts(&id, 1, 2)
            .unwrap_or_else(|e| panic!("list_parts failed: {e}"));
        let numbers: Vec<u32> = page.parts.iter().map(|p| p.part_number).collect();
        assert_eq!(numbers, vec![2, 3]);
        assert!(page.is_truncated);
        assert_eq!(page.next_part_number_marker, 3);

        let page = table
            .list_parts(&id, 3, 2)
            .unwrap_or_else(|e| panic!("second page failed: {e}"));
        let numbers: Vec<u32> = page.parts.iter().map(|p| p.part_number).collect();
        assert_eq!(numbers, vec![4, 5]);
        assert!(!page.is_truncated);
    }

    #[test]
    fn test_should_invalidate_terminated_upload_id() {
        let table = UploadTable::new();
        let id = table.begin("b", "k");
        table
            .put_part(&id, part(1, "e"))
            .unwrap_or_else(|e| panic!("put_part failed: {e}"));

        let upload = table
            .terminate(&id)
            .unwrap_or_else(|e| panic!("terminate failed: {e}"));
        assert_eq!(upload.parts().len(), 1);

        // Every further use of the identifier fails.
        assert!(matches!(
            table.verify("b", "k", &id),
            Err(DriverError::InvalidUploadId { .. })
        ));
        assert!(matches!(
            table.put_part(&id, part(2, "e")),
            Err(DriverError::InvalidUploadId { .. })
        ));
        assert!(matches!(
            table.terminate(&id),
            Err(DriverError::InvalidUploadId { .. })
        ));
    }
}
