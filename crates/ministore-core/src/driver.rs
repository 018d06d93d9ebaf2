//! The object-storage driver contract and its implementations.
//!
//! [`Driver`] is the uniform capability set the HTTP front-end targets:
//! bucket CRUD, object ingest and retrieval, and the multipart upload
//! protocol. [`ObjectDriver`] implements it over any [`ByteStore`],
//! giving two concrete drivers:
//!
//! - [`MemoryDriver`] — everything in process memory; the default and
//!   the test workhorse.
//! - [`DiskDriver`] — payloads as files under a data directory.
//!
//! # Consistency
//!
//! Payload bytes are hashed and written to the byte store *before* any
//! index lock is taken; the index insert is the linearization point.
//! Once `create_object` or `complete_multipart_upload` returns, every
//! subsequent listing or read on the same driver observes the object.

use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::bytestore::{ByteStore, FsByteStore, MemoryByteStore};
use crate::digest::{md5_hex, multipart_etag, trim_etag};
use crate::error::{DriverError, DriverResult};
use crate::store::{BucketTable, StoredObject, StoredPart, UploadTable};
use crate::types::{
    BucketAcl, BucketInfo, CompletedPart, ObjectInfo, ObjectListing, PartListing, MAX_PART_NUMBER,
};

/// The uniform driver contract exposed to the HTTP layer.
///
/// Implementations must be safe for concurrent use from parallel request
/// handlers. All methods report failures through the closed
/// [`DriverError`] taxonomy.
#[async_trait]
pub trait Driver: Send + Sync + 'static {
    /// Create a bucket with the given canned ACL.
    async fn make_bucket(&self, bucket: &str, acl: BucketAcl) -> DriverResult<()>;

    /// List all buckets, sorted by name. Never fails; an uninitialized
    /// store yields an empty list.
    async fn list_buckets(&self) -> DriverResult<Vec<BucketInfo>>;

    /// Fetch a bucket's metadata map (`name`, `acl`, `created`).
    async fn get_bucket_metadata(&self, bucket: &str) -> DriverResult<BTreeMap<String, String>>;

    /// Update a bucket's metadata. Only the `acl` key is honored; other
    /// keys are ignored.
    async fn set_bucket_metadata(
        &self,
        bucket: &str,
        metadata: BTreeMap<String, String>,
    ) -> DriverResult<()>;

    /// List objects in a bucket with prefix/marker/delimiter semantics.
    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        marker: &str,
        delimiter: &str,
        max_keys: i32,
    ) -> DriverResult<ObjectListing>;

    /// Ingest a complete object, returning the hex MD5 of its payload.
    ///
    /// When `expected_md5` is set, the computed digest must match or the
    /// write is rolled back with `BadDigest`.
    async fn create_object(
        &self,
        bucket: &str,
        key: &str,
        content_type: Option<String>,
        expected_md5: Option<String>,
        data: Bytes,
        user_metadata: BTreeMap<String, String>,
    ) -> DriverResult<String>;

    /// Fetch a complete object payload along with its metadata.
    async fn get_object(&self, bucket: &str, key: &str) -> DriverResult<(Bytes, ObjectInfo)>;

    /// Fetch `length` payload bytes starting at `start`.
    async fn get_partial_object(
        &self,
        bucket: &str,
        key: &str,
        start: u64,
        length: u64,
    ) -> DriverResult<Bytes>;

    /// Fetch object metadata without the payload.
    async fn get_object_metadata(&self, bucket: &str, key: &str) -> DriverResult<ObjectInfo>;

    /// Initiate a multipart upload, returning a fresh upload identifier.
    async fn new_multipart_upload(&self, bucket: &str, key: &str) -> DriverResult<String>;

    /// Upload one part, returning its hex MD5. Re-uploading a part
    /// number replaces the previous payload.
    async fn create_object_part(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        part_number: u32,
        expected_md5: Option<String>,
        data: Bytes,
    ) -> DriverResult<String>;

    /// List uploaded parts with marker pagination.
    async fn list_object_parts(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        part_number_marker: u32,
        max_parts: i32,
    ) -> DriverResult<PartListing>;

    /// Assemble the declared parts into the final object and terminate
    /// the upload. Returns the composite ETag (unquoted).
    async fn complete_multipart_upload(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        parts: Vec<CompletedPart>,
    ) -> DriverResult<String>;

    /// Abandon an upload, discarding all its parts.
    async fn abort_multipart_upload(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
    ) -> DriverResult<()>;
}

// ---------------------------------------------------------------------------
// ObjectDriver
// ---------------------------------------------------------------------------

/// Driver implementation generic over the payload store.
#[derive(Debug)]
pub struct ObjectDriver<S> {
    buckets: BucketTable,
    uploads: UploadTable,
    store: S,
}

/// Fully in-memory driver.
pub type MemoryDriver = ObjectDriver<MemoryByteStore>;

/// Driver persisting payloads as files under a data directory.
pub type DiskDriver = ObjectDriver<FsByteStore>;

impl MemoryDriver {
    /// Create an empty in-memory driver.
    #[must_use]
    pub fn new() -> Self {
        Self::with_store(MemoryByteStore::new())
    }
}

impl Default for MemoryDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl DiskDriver {
    /// Create a driver whose payloads live under `data_dir`.
    ///
    /// # Errors
    ///
    /// Returns `Internal` if the directory cannot be created.
    pub fn open(data_dir: impl AsRef<Path>) -> DriverResult<Self> {
        Ok(Self::with_store(FsByteStore::new(
            data_dir.as_ref().to_path_buf(),
        )?))
    }
}

impl<S: ByteStore> ObjectDriver<S> {
    /// Build a driver over an arbitrary byte store.
    #[must_use]
    pub fn with_store(store: S) -> Self {
        Self {
            buckets: BucketTable::new(),
            uploads: UploadTable::new(),
            store,
        }
    }

    fn fresh_blob_id() -> String {
        Uuid::new_v4().simple().to_string()
    }

    fn validate_names(bucket: &str, key: &str) -> DriverResult<()> {
        if bucket.trim().is_empty() {
            return Err(DriverError::invalid_argument("bucket name is empty"));
        }
        if key.trim().is_empty() {
            return Err(DriverError::ObjectNameInvalid {
                object: key.to_owned(),
            });
        }
        Ok(())
    }

    /// Hash `data`, compare against a declared digest, and persist it
    /// under a fresh blob ID. Nothing is written on a digest mismatch.
    async fn ingest_payload(
        &self,
        expected_md5: Option<&str>,
        data: &Bytes,
    ) -> DriverResult<(String, String)> {
        let computed = md5_hex(data);
        if let Some(expected) = expected_md5 {
            if !expected.is_empty() && expected != computed {
                return Err(DriverError::BadDigest {
                    expected: expected.to_owned(),
                    computed,
                });
            }
        }

        let blob_id = Self::fresh_blob_id();
        self.store.put(&blob_id, data.clone()).await?;
        Ok((blob_id, computed))
    }

    fn object_info(bucket: &str, key: &str, object: &StoredObject) -> ObjectInfo {
        ObjectInfo {
            bucket: bucket.to_owned(),
            key: key.to_owned(),
            size: object.size,
            etag: object.etag.clone(),
            content_type: object.content_type.clone(),
            last_modified: object.last_modified,
            user_metadata: object.user_metadata.clone(),
        }
    }
}

#[async_trait]
impl<S: ByteStore> Driver for ObjectDriver<S> {
    async fn make_bucket(&self, bucket: &str, acl: BucketAcl) -> DriverResult<()> {
        self.buckets.create(bucket, acl)
    }

    async fn list_buckets(&self) -> DriverResult<Vec<BucketInfo>> {
        Ok(self.buckets.list())
    }

    async fn get_bucket_metadata(&self, bucket: &str) -> DriverResult<BTreeMap<String, String>> {
        self.buckets.metadata(bucket)
    }

    async fn set_bucket_metadata(
        &self,
        bucket: &str,
        metadata: BTreeMap<String, String>,
    ) -> DriverResult<()> {
        self.buckets.set_metadata(bucket, &metadata)
    }

    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        marker: &str,
        delimiter: &str,
        max_keys: i32,
    ) -> DriverResult<ObjectListing> {
        let bucket = self.buckets.get(bucket)?;
        Ok(bucket.list_objects(prefix, marker, delimiter, max_keys))
    }

    async fn create_object(
        &self,
        bucket: &str,
        key: &str,
        content_type: Option<String>,
        expected_md5: Option<String>,
        data: Bytes,
        user_metadata: BTreeMap<String, String>,
    ) -> DriverResult<String> {
        Self::validate_names(bucket, key)?;
        let bucket_ref = self.buckets.get(bucket)?;
        if bucket_ref.contains_key(key) {
            return Err(DriverError::ObjectExists {
                bucket: bucket.to_owned(),
                object: key.to_owned(),
            });
        }

        let (blob_id, computed) = self.ingest_payload(expected_md5.as_deref(), &data).await?;

        let object = StoredObject {
            blob_id: blob_id.clone(),
            size: data.len() as u64,
            etag: computed.clone(),
            content_type,
            user_metadata,
            last_modified: chrono::Utc::now(),
        };

        if let Err(e) = bucket_ref.insert_unique(key, object) {
            // A concurrent put won the key; discard our payload.
            self.store.remove(&blob_id).await?;
            return Err(e);
        }

        info!(bucket, key, etag = %computed, size = data.len(), "object created");
        Ok(computed)
    }

    async fn get_object(&self, bucket: &str, key: &str) -> DriverResult<(Bytes, ObjectInfo)> {
        let info = self.get_object_metadata(bucket, key).await?;
        let bucket_ref = self.buckets.get(bucket)?;
        let object = bucket_ref
            .get_object(key)
            .ok_or_else(|| DriverError::object_not_found(bucket, key))?;
        let data = self.store.get(&object.blob_id).await?;
        Ok((data, info))
    }

    async fn get_partial_object(
        &self,
        bucket: &str,
        key: &str,
        start: u64,
        length: u64,
    ) -> DriverResult<Bytes> {
        let bucket_ref = self.buckets.get(bucket)?;
        let object = bucket_ref
            .get_object(key)
            .ok_or_else(|| DriverError::object_not_found(bucket, key))?;
        if length == 0 || start >= object.size || start + length > object.size {
            return Err(DriverError::InvalidRange);
        }
        self.store.get_range(&object.blob_id, start, length).await
    }

    async fn get_object_metadata(&self, bucket: &str, key: &str) -> DriverResult<ObjectInfo> {
        let bucket_ref = self.buckets.get(bucket)?;
        let object = bucket_ref
            .get_object(key)
            .ok_or_else(|| DriverError::object_not_found(bucket, key))?;
        Ok(Self::object_info(bucket, key, &object))
    }

    async fn new_multipart_upload(&self, bucket: &str, key: &str) -> DriverResult<String> {
        Self::validate_names(bucket, key)?;
        let bucket_ref = self.buckets.get(bucket)?;
        if bucket_ref.contains_key(key) {
            return Err(DriverError::ObjectExists {
                bucket: bucket.to_owned(),
                object: key.to_owned(),
            });
        }
        Ok(self.uploads.begin(bucket, key))
    }

    async fn create_object_part(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        part_number: u32,
        expected_md5: Option<String>,
        data: Bytes,
    ) -> DriverResult<String> {
        Self::validate_names(bucket, key)?;
        self.buckets.get(bucket)?;
        self.uploads.verify(bucket, key, upload_id)?;

        if part_number == 0 || part_number > MAX_PART_NUMBER {
            return Err(DriverError::invalid_argument(format!(
                "part number must be between 1 and {MAX_PART_NUMBER}, got {part_number}"
            )));
        }

        let (blob_id, computed) = self.ingest_payload(expected_md5.as_deref(), &data).await?;

        let part = StoredPart {
            part_number,
            blob_id: blob_id.clone(),
            size: data.len() as u64,
            etag: computed.clone(),
            last_modified: chrono::Utc::now(),
        };

        match self.uploads.put_part(upload_id, part) {
            Ok(Some(stale_blob)) => {
                // Last writer wins; the displaced payload is unreferenced.
                self.store.remove(&stale_blob).await?;
            }
            Ok(None) => {}
            Err(e) => {
                // The upload was aborted or completed while we streamed.
                self.store.remove(&blob_id).await?;
                return Err(e);
            }
        }

        debug!(bucket, key, upload_id, part_number, size = data.len(), "part stored");
        Ok(computed)
    }

    async fn list_object_parts(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        part_number_marker: u32,
        max_parts: i32,
    ) -> DriverResult<PartListing> {
        self.buckets.get(bucket)?;
        self.uploads.verify(bucket, key, upload_id)?;
        let page = self
            .uploads
            .list_parts(upload_id, part_number_marker, max_parts)?;
        Ok(PartListing {
            bucket: bucket.to_owned(),
            key: key.to_owned(),
            upload_id: upload_id.to_owned(),
            part_number_marker,
            next_part_number_marker: page.next_part_number_marker,
            max_parts: if max_parts <= 0 {
                crate::types::DEFAULT_MAX_PARTS
            } else {
                max_parts
            },
            is_truncated: page.is_truncated,
            parts: page.parts.iter().map(StoredPart::info).collect(),
        })
    }

    async fn complete_multipart_upload(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        parts: Vec<CompletedPart>,
    ) -> DriverResult<String> {
        Self::validate_names(bucket, key)?;
        let bucket_ref = self.buckets.get(bucket)?;
        self.uploads.verify(bucket, key, upload_id)?;

        if parts.is_empty() {
            return Err(DriverError::invalid_argument("no parts declared"));
        }

        // Check every declared part against what was actually stored.
        let stored: BTreeMap<u32, StoredPart> = self
            .uploads
            .snapshot_parts(upload_id)?
            .into_iter()
            .map(|p| (p.part_number, p))
            .collect();

        let mut selected: Vec<&StoredPart> = Vec::with_capacity(parts.len());
        for declared in &parts {
            let part = stored
                .get(&declared.part_number)
                .ok_or(DriverError::InvalidPart {
                    part_number: declared.part_number,
                })?;
            if trim_etag(&declared.etag) != part.etag {
                return Err(DriverError::InvalidPart {
                    part_number: declared.part_number,
                });
            }
            selected.push(part);
        }

        // Concatenate payloads in part-number order.
        let mut assembled = BytesMut::new();
        let mut part_etags: Vec<String> = Vec::with_capacity(selected.len());
        for part in &selected {
            let data = self.store.get(&part.blob_id).await?;
            assembled.extend_from_slice(&data);
            part_etags.push(part.etag.clone());
        }
        let assembled = assembled.freeze();
        let etag = multipart_etag(&part_etags);

        let blob_id = Self::fresh_blob_id();
        self.store.put(&blob_id, assembled.clone()).await?;

        let object = StoredObject {
            blob_id: blob_id.clone(),
            size: assembled.len() as u64,
            etag: etag.clone(),
            content_type: None,
            user_metadata: BTreeMap::new(),
            last_modified: chrono::Utc::now(),
        };

        if let Err(e) = bucket_ref.insert_unique(key, object) {
            // The key appeared since initiation; the upload stays active.
            self.store.remove(&blob_id).await?;
            return Err(e);
        }

        // The upload is done; its identifier and parts are dead.
        match self.uploads.terminate(upload_id) {
            Ok(upload) => {
                for part in upload.parts() {
                    self.store.remove(&part.blob_id).await?;
                }
            }
            Err(e) => warn!(upload_id, error = %e, "upload vanished during completion"),
        }

        info!(
            bucket,
            key,
            upload_id,
            parts = parts.len(),
            size = assembled.len(),
            etag = %etag,
            "multipart upload completed"
        );
        Ok(etag)
    }

    async fn abort_multipart_upload(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
    ) -> DriverResult<()> {
        self.buckets.get(bucket)?;
        self.uploads.verify(bucket, key, upload_id)?;
        let upload = self.uploads.terminate(upload_id)?;
        for part in upload.parts() {
            self.store.remove(&part.blob_id).await?;
        }
        info!(bucket, key, upload_id, "multipart upload aborted");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::md5_hex;

    fn meta() -> BTreeMap<String, String> {
        BTreeMap::new()
    }

    async fn driver_with_bucket(name: &str) -> MemoryDriver {
        let driver = MemoryDriver::new();
        driver
            .make_bucket(name, BucketAcl::Private)
            .await
            .unwrap_or_else(|e| panic!("make_bucket failed: {e}"));
        driver
    }

    #[tokio::test]
    async fn test_should_make_bucket_and_list_it() {
        let driver = driver_with_bucket("photos").await;
        let buckets = driver
            .list_buckets()
            .await
            .unwrap_or_else(|e| panic!("list_buckets failed: {e}"));
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].name, "photos");
        assert_eq!(buckets[0].acl, BucketAcl::Private);
    }

    #[tokio::test]
    async fn test_should_expose_and_mutate_bucket_metadata() {
        let driver = driver_with_bucket("photos").await;

        let meta = driver
            .get_bucket_metadata("photos")
            .await
            .unwrap_or_else(|e| panic!("get_bucket_metadata failed: {e}"));
        assert_eq!(meta.get("acl").map(String::as_str), Some("private"));

        let mut update = BTreeMap::new();
        update.insert("acl".to_owned(), "public-read".to_owned());
        driver
            .set_bucket_metadata("photos", update)
            .await
            .unwrap_or_else(|e| panic!("set_bucket_metadata failed: {e}"));

        let meta = driver
            .get_bucket_metadata("photos")
            .await
            .unwrap_or_else(|e| panic!("second get failed: {e}"));
        assert_eq!(meta.get("acl").map(String::as_str), Some("public-read"));
    }

    #[tokio::test]
    async fn test_should_observe_put_in_list_and_metadata() {
        let driver = driver_with_bucket("b").await;
        let etag = driver
            .create_object("b", "obj", None, None, Bytes::from("hello"), meta())
            .await
            .unwrap_or_else(|e| panic!("create_object failed: {e}"));
        assert_eq!(etag, md5_hex(b"hello"));

        let listing = driver
            .list_objects("b", "", "", "", 1000)
            .await
            .unwrap_or_else(|e| panic!("list_objects failed: {e}"));
        assert!(listing.keys.contains(&"obj".to_owned()));

        let info = driver
            .get_object_metadata("b", "obj")
            .await
            .unwrap_or_else(|e| panic!("get_object_metadata failed: {e}"));
        assert_eq!(info.etag, etag);
        assert_eq!(info.size, 5);
    }

    #[tokio::test]
    async fn test_should_reject_second_put_on_same_key() {
        let driver = driver_with_bucket("b").await;
        driver
            .create_object("b", "k", None, None, Bytes::from("one"), meta())
            .await
            .unwrap_or_else(|e| panic!("first put failed: {e}"));

        let err = driver
            .create_object("b", "k", None, None, Bytes::from("two"), meta())
            .await
            .expect_err("second put should fail");
        assert!(matches!(err, DriverError::ObjectExists { .. }));

        // The original payload is untouched.
        let (data, _) = driver
            .get_object("b", "k")
            .await
            .unwrap_or_else(|e| panic!("get failed: {e}"));
        assert_eq!(data.as_ref(), b"one");
    }

    #[tokio::test]
    async fn test_should_roll_back_on_digest_mismatch() {
        let driver = driver_with_bucket("b").await;
        let err = driver
            .create_object(
                "b",
                "obj",
                None,
                Some("00000000000000000000000000000000".to_owned()),
                Bytes::from("hello"),
                meta(),
            )
            .await
            .expect_err("mismatched digest should fail");
        assert!(matches!(err, DriverError::BadDigest { .. }));

        let listing = driver
            .list_objects("b", "", "", "", 1000)
            .await
            .unwrap_or_else(|e| panic!("list failed: {e}"));
        assert!(listing.keys.is_empty());
    }

    #[tokio::test]
    async fn test_should_accept_matching_declared_digest() {
        let driver = driver_with_bucket("b").await;
        let declared = md5_hex(b"payload");
        let etag = driver
            .create_object(
                "b",
                "obj",
                None,
                Some(declared.clone()),
                Bytes::from("payload"),
                meta(),
            )
            .await
            .unwrap_or_else(|e| panic!("create failed: {e}"));
        assert_eq!(etag, declared);
    }

    #[tokio::test]
    async fn test_should_fail_on_unknown_bucket() {
        let driver = MemoryDriver::new();
        assert!(matches!(
            driver.list_objects("ghost", "", "", "", 0).await,
            Err(DriverError::BucketNotFound { .. })
        ));
        assert!(matches!(
            driver
                .create_object("ghost", "k", None, None, Bytes::new(), meta())
                .await,
            Err(DriverError::BucketNotFound { .. })
        ));
        assert!(matches!(
            driver.get_object("ghost", "k").await,
            Err(DriverError::BucketNotFound { .. })
        ));
        assert!(matches!(
            driver.new_multipart_upload("ghost", "k").await,
            Err(DriverError::BucketNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_should_read_partial_object() {
        let driver = driver_with_bucket("b").await;
        driver
            .create_object("b", "obj", None, None, Bytes::from("0123456789"), meta())
            .await
            .unwrap_or_else(|e| panic!("create failed: {e}"));

        let slice = driver
            .get_partial_object("b", "obj", 3, 4)
            .await
            .unwrap_or_else(|e| panic!("partial read failed: {e}"));
        assert_eq!(slice.as_ref(), b"3456");

        assert!(matches!(
            driver.get_partial_object("b", "obj", 8, 5).await,
            Err(DriverError::InvalidRange)
        ));
        assert!(matches!(
            driver.get_partial_object("b", "obj", 10, 1).await,
            Err(DriverError::InvalidRange)
        ));
    }

    #[tokio::test]
    async fn test_should_complete_multipart_and_concatenate_parts() {
        let driver = driver_with_bucket("b").await;
        let upload_id = driver
            .new_multipart_upload("b", "big")
            .await
            .unwrap_or_else(|e| panic!("initiate failed: {e}"));

        let etag1 = driver
            .create_object_part("b", "big", &upload_id, 1, None, Bytes::from("hello "))
            .await
            .unwrap_or_else(|e| panic!("part 1 failed: {e}"));
        let etag2 = driver
            .create_object_part("b", "big", &upload_id, 2, None, Bytes::from("world"))
            .await
            .unwrap_or_else(|e| panic!("part 2 failed: {e}"));

        let final_etag = driver
            .complete_multipart_upload(
                "b",
                "big",
                &upload_id,
                vec![
                    CompletedPart {
                        part_number: 1,
                        etag: etag1.clone(),
                    },
                    CompletedPart {
                        part_number: 2,
                        etag: etag2.clone(),
                    },
                ],
            )
            .await
            .unwrap_or_else(|e| panic!("complete failed: {e}"));
        assert!(final_etag.ends_with("-2"));
        assert_eq!(final_etag, multipart_etag(&[etag1, etag2]));

        let (data, info) = driver
            .get_object("b", "big")
            .await
            .unwrap_or_else(|e| panic!("get failed: {e}"));
        assert_eq!(data.as_ref(), b"hello world");
        assert_eq!(info.size, 11);
        assert_eq!(info.etag, final_etag);
    }

    #[tokio::test]
    async fn test_should_reject_completion_with_wrong_etag() {
        let driver = driver_with_bucket("b").await;
        let upload_id = driver
            .new_multipart_upload("b", "obj")
            .await
            .unwrap_or_else(|e| panic!("initiate failed: {e}"));
        driver
            .create_object_part("b", "obj", &upload_id, 1, None, Bytes::from("data"))
            .await
            .unwrap_or_else(|e| panic!("part failed: {e}"));

        let err = driver
            .complete_multipart_upload(
                "b",
                "obj",
                &upload_id,
                vec![CompletedPart {
                    part_number: 1,
                    etag: "ffffffffffffffffffffffffffffffff".to_owned(),
                }],
            )
            .await
            .expect_err("wrong etag should fail");
        assert!(matches!(err, DriverError::InvalidPart { part_number: 1 }));

        // The upload survives a failed completion.
        assert!(driver
            .list_object_parts("b", "obj", &upload_id, 0, 0)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_should_reject_completion_with_missing_part() {
        let driver = driver_with_bucket("b").await;
        let upload_id = driver
            .new_multipart_upload("b", "obj")
            .await
            .unwrap_or_else(|e| panic!("initiate failed: {e}"));
        let etag = driver
            .create_object_part("b", "obj", &upload_id, 1, None, Bytes::from("data"))
            .await
            .unwrap_or_else(|e| panic!("part failed: {e}"));

        let err = driver
            .complete_multipart_upload(
                "b",
                "obj",
                &upload_id,
                vec![
                    CompletedPart {
                        part_number: 1,
                        etag,
                    },
                    CompletedPart {
                        part_number: 2,
                        etag: "deadbeefdeadbeefdeadbeefdeadbeef".to_owned(),
                    },
                ],
            )
            .await
            .expect_err("missing part should fail");
        assert!(matches!(err, DriverError::InvalidPart { part_number: 2 }));
    }

    #[tokio::test]
    async fn test_should_invalidate_upload_after_abort() {
        let driver = driver_with_bucket("b").await;
        let upload_id = driver
            .new_multipart_upload("b", "obj")
            .await
            .unwrap_or_else(|e| panic!("initiate failed: {e}"));
        driver
            .create_object_part("b", "obj", &upload_id, 1, None, Bytes::from("data"))
            .await
            .unwrap_or_else(|e| panic!("part failed: {e}"));

        driver
            .abort_multipart_upload("b", "obj", &upload_id)
            .await
            .unwrap_or_else(|e| panic!("abort failed: {e}"));

        let err = driver
            .create_object_part("b", "obj", &upload_id, 2, None, Bytes::from("late"))
            .await
            .expect_err("upload id must be dead after abort");
        assert!(matches!(err, DriverError::InvalidUploadId { .. }));
    }

    #[tokio::test]
    async fn test_should_invalidate_upload_after_complete() {
        let driver = driver_with_bucket("b").await;
        let upload_id = driver
            .new_multipart_upload("b", "obj")
            .await
            .unwrap_or_else(|e| panic!("initiate failed: {e}"));
        let etag = driver
            .create_object_part("b", "obj", &upload_id, 1, None, Bytes::from("data"))
            .await
            .unwrap_or_else(|e| panic!("part failed: {e}"));
        driver
            .complete_multipart_upload(
                "b",
                "obj",
                &upload_id,
                vec![CompletedPart {
                    part_number: 1,
                    etag,
                }],
            )
            .await
            .unwrap_or_else(|e| panic!("complete failed: {e}"));

        assert!(matches!(
            driver.abort_multipart_upload("b", "obj", &upload_id).await,
            Err(DriverError::InvalidUploadId { .. })
        ));
    }

    #[tokio::test]
    async fn test_should_reject_initiate_on_existing_key() {
        let driver = driver_with_bucket("b").await;
        driver
            .create_object("b", "taken", None, None, Bytes::from("x"), meta())
            .await
            .unwrap_or_else(|e| panic!("create failed: {e}"));

        assert!(matches!(
            driver.new_multipart_upload("b", "taken").await,
            Err(DriverError::ObjectExists { .. })
        ));
    }

    #[tokio::test]
    async fn test_should_overwrite_part_idempotently() {
        let driver = driver_with_bucket("b").await;
        let upload_id = driver
            .new_multipart_upload("b", "obj")
            .await
            .unwrap_or_else(|e| panic!("initiate failed: {e}"));
        driver
            .create_object_part("b", "obj", &upload_id, 1, None, Bytes::from("first"))
            .await
            .unwrap_or_else(|e| panic!("first part failed: {e}"));
        let etag = driver
            .create_object_part("b", "obj", &upload_id, 1, None, Bytes::from("second"))
            .await
            .unwrap_or_else(|e| panic!("overwrite failed: {e}"));

        let listing = driver
            .list_object_parts("b", "obj", &upload_id, 0, 0)
            .await
            .unwrap_or_else(|e| panic!("list_parts failed: {e}"));
        assert_eq!(listing.parts.len(), 1);
        assert_eq!(listing.parts[0].etag, etag);
        assert_eq!(listing.parts[0].size, 6);
    }

    #[tokio::test]
    async fn test_should_reject_out_of_range_part_number() {
        let driver = driver_with_bucket("b").await;
        let upload_id = driver
            .new_multipart_upload("b", "obj")
            .await
            .unwrap_or_else(|e| panic!("initiate failed: {e}"));

        assert!(matches!(
            driver
                .create_object_part("b", "obj", &upload_id, 0, None, Bytes::from("x"))
                .await,
            Err(DriverError::InvalidArgument { .. })
        ));
        assert!(matches!(
            driver
                .create_object_part("b", "obj", &upload_id, MAX_PART_NUMBER + 1, None, Bytes::new())
                .await,
            Err(DriverError::InvalidArgument { .. })
        ));
    }

    #[tokio::test]
    async fn test_should_run_against_disk_driver() {
        let dir = tempfile::tempdir().expect("tempdir");
        let driver = DiskDriver::open(dir.path()).unwrap_or_else(|e| panic!("open failed: {e}"));
        driver
            .make_bucket("b", BucketAcl::Private)
            .await
            .unwrap_or_else(|e| panic!("make_bucket failed: {e}"));
        driver
            .create_object("b", "k", None, None, Bytes::from("on disk"), meta())
            .await
            .unwrap_or_else(|e| panic!("create failed: {e}"));

        let (data, _) = driver
            .get_object("b", "k")
            .await
            .unwrap_or_else(|e| panic!("get failed: {e}"));
        assert_eq!(data.as_ref(), b"on disk");
    }
}
