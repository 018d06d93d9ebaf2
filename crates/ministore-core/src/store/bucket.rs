//! Bucket table and per-bucket object index.
//!
//! A [`Bucket`] owns a sorted key index mapping object keys to their
//! byte-store handles and metadata. The [`BucketTable`] enforces global
//! bucket-name uniqueness and is the single owner of bucket state; the
//! raw index is never exposed outside this module.
//!
//! # Thread Safety
//!
//! The table uses `DashMap` keyed by bucket name; each bucket's object
//! index sits behind a `parking_lot::RwLock`. Listing and lookups take
//! the read lock, inserts take the write lock for the duration of the
//! index flip only.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::{debug, info};

use crate::error::{DriverError, DriverResult};
use crate::keylist;
use crate::types::{BucketAcl, BucketInfo, ObjectListing, DEFAULT_MAX_KEYS};

/// Index entry for one stored object.
///
/// Payload bytes live in the byte store; this entry carries only the
/// blob handle and the object's descriptive metadata.
#[derive(Debug, Clone)]
pub struct StoredObject {
    /// Byte-store handle for the payload.
    pub blob_id: String,
    /// Payload size in bytes.
    pub size: u64,
    /// Hex-encoded MD5 of the payload (unquoted).
    pub etag: String,
    /// Declared content type, if any.
    pub content_type: Option<String>,
    /// Opaque user metadata.
    pub user_metadata: BTreeMap<String, String>,
    /// When the object became visible in the index.
    pub last_modified: DateTime<Utc>,
}

/// A bucket: name, ACL, creation time, and the object key index.
#[derive(Debug)]
pub struct Bucket {
    /// The bucket name.
    pub name: String,
    /// When the bucket was created.
    pub created: DateTime<Utc>,
    /// The bucket's canned ACL; the only mutable bucket attribute.
    acl: RwLock<BucketAcl>,
    /// Sorted object index.
    objects: RwLock<BTreeMap<String, StoredObject>>,
}

impl Bucket {
    fn new(name: String, acl: BucketAcl) -> Self {
        Self {
            name,
            created: Utc::now(),
            acl: RwLock::new(acl),
            objects: RwLock::new(BTreeMap::new()),
        }
    }

    /// The bucket's current ACL.
    #[must_use]
    pub fn acl(&self) -> BucketAcl {
        *self.acl.read()
    }

    /// Replace the bucket's ACL.
    pub fn set_acl(&self, acl: BucketAcl) {
        *self.acl.write() = acl;
    }

    /// Whether `key` is present in the index.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.objects.read().contains_key(key)
    }

    /// Look up one object entry.
    #[must_use]
    pub fn get_object(&self, key: &str) -> Option<StoredObject> {
        self.objects.read().get(key).cloned()
    }

    /// Insert `object` under `key`, failing if the key is already taken.
    ///
    /// This is the linearization point for object creation: the caller
    /// has already persisted the payload, and the insert either makes it
    /// visible atomically or reports the conflict.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::ObjectExists`] if the key is present.
    pub fn insert_unique(&self, key: &str, object: StoredObject) -> DriverResult<()> {
        let mut objects = self.objects.write();
        if objects.contains_key(key) {
            return Err(DriverError::ObjectExists {
                bucket: self.name.clone(),
                object: key.to_owned(),
            });
        }
        objects.insert(key.to_owned(), object);
        Ok(())
    }

    /// List objects per the S3 v1 listing contract.
    ///
    /// The algorithm, in order: restrict to `prefix` and strip it; with a
    /// `delimiter`, keys still containing the delimiter collapse into
    /// common prefixes (up to and including its first occurrence); sort;
    /// drop keys at or before `marker`; cap the key list at `max_keys`
    /// (values `<= 0` mean 1000), marking truncation only when more keys
    /// remained. Common prefixes are not capped. Both result lists come
    /// back sorted with the prefix re-attached.
    #[must_use]
    pub fn list_objects(
        &self,
        prefix: &str,
        marker: &str,
        delimiter: &str,
        max_keys: i32,
    ) -> ObjectListing {
        let mut names: Vec<String> = self.objects.read().keys().cloned().collect();

        let max_keys = if max_keys <= 0 { DEFAULT_MAX_KEYS } else { max_keys };
        let max_keys = usize::try_from(max_keys).unwrap_or(usize::MAX);

        if !prefix.trim().is_empty() {
            names = keylist::filter_prefix(&names, prefix);
            names = keylist::remove_prefix(&names, prefix);
        }

        let mut objects: Vec<String>;
        let mut group_prefixes: Vec<String> = Vec::new();
        if !delimiter.trim().is_empty() {
            objects = keylist::filter_delimited(&names, delimiter);
            let grouped = keylist::filter_not_delimited(&names, delimiter);
            let grouped = keylist::extract_dir(&grouped, delimiter);
            group_prefixes = keylist::unique_list(&grouped);
        } else {
            objects = names;
        }

        objects.sort();
        let after_marker: Vec<String> = if marker.is_empty() {
            objects
        } else {
            objects.into_iter().filter(|o| o.as_str() > marker).collect()
        };

        let mut keys: Vec<String> = Vec::new();
        let mut is_truncated = false;
        for name in &after_marker {
            if keys.len() >= max_keys {
                is_truncated = true;
                break;
            }
            keys = keylist::append_uniq(keys, &format!("{prefix}{name}"));
        }

        let mut common_prefixes: Vec<String> = Vec::new();
        for group in &group_prefixes {
            common_prefixes = keylist::append_uniq(common_prefixes, &format!("{prefix}{group}"));
        }

        keys.sort();
        common_prefixes.sort();

        ObjectListing {
            keys,
            common_prefixes,
            is_truncated,
        }
    }
}

// ---------------------------------------------------------------------------
// BucketTable
// ---------------------------------------------------------------------------

/// Process-wide bucket table enforcing name uniqueness.
#[derive(Debug, Default)]
pub struct BucketTable {
    buckets: DashMap<String, Arc<Bucket>>,
}

impl BucketTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a bucket.
    ///
    /// # Errors
    ///
    /// - [`DriverError::InvalidArgument`] on an empty or whitespace-only
    ///   name.
    /// - [`DriverError::BucketExists`] if the name is taken.
    pub fn create(&self, name: &str, acl: BucketAcl) -> DriverResult<()> {
        if name.trim().is_empty() {
            return Err(DriverError::invalid_argument("bucket name is empty"));
        }

        match self.buckets.entry(name.to_owned()) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(DriverError::BucketExists {
                bucket: name.to_owned(),
            }),
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(Arc::new(Bucket::new(name.to_owned(), acl)));
                info!(bucket = %name, %acl, "bucket created");
                Ok(())
            }
        }
    }

    /// Look up a bucket.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::BucketNotFound`] if absent.
    pub fn get(&self, name: &str) -> DriverResult<Arc<Bucket>> {
        self.buckets
            .get(name)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| DriverError::bucket_not_found(name))
    }

    /// The metadata map for one bucket: `name`, `acl`, and `created`
    /// (RFC 3339).
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::BucketNotFound`] if absent.
    pub fn metadata(&self, name: &str) -> DriverResult<BTreeMap<String, String>> {
        let bucket = self.get(name)?;
        let mut meta = BTreeMap::new();
        meta.insert("name".to_owned(), bucket.name.clone());
        meta.insert("acl".to_owned(), bucket.acl().to_string());
        meta.insert("created".to_owned(), bucket.created.to_rfc3339());
        Ok(meta)
    }

    /// Apply a metadata update to one bucket.
    ///
    /// Only the `acl` key is mutable; every other key in `metadata` is
    /// ignored. An unrecognized ACL value is rejected rather than
    /// silently dropped.
    ///
    /// # Errors
    ///
    /// - [`DriverError::BucketNotFound`] if the bucket is absent.
    /// - [`DriverError::InvalidArgument`] on an unrecognized ACL value.
    pub fn set_metadata(&self, name: &str, metadata: &BTreeMap<String, String>) -> DriverResult<()> {
        let bucket = self.get(name)?;
        if let Some(acl) = metadata.get("acl") {
            let acl: BucketAcl = acl
                .parse()
                .map_err(|_| DriverError::invalid_argument(format!("unrecognized acl: {acl:?}")))?;
            bucket.set_acl(acl);
            debug!(bucket = %name, %acl, "bucket acl updated");
        }
        Ok(())
    }

    /// All buckets, sorted by name. Never fails; an empty table yields
    /// an empty list.
    #[must_use]
    pub fn list(&self) -> Vec<BucketInfo> {
        let mut buckets: Vec<BucketInfo> = self
            .buckets
            .iter()
            .map(|entry| {
                let b = entry.value();
                BucketInfo {
                    name: b.name.clone(),
                    acl: b.acl(),
                    created: b.created,
                }
            })
            .collect();
        buckets.sort_by(|a, b| a.name.cmp(&b.name));
        buckets
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn stored(etag: &str) -> StoredObject {
        StoredObject {
            blob_id: format!("blob-{etag}"),
            size: 4,
            etag: etag.to_owned(),
            content_type: None,
            user_metadata: BTreeMap::new(),
            last_modified: Utc::now(),
        }
    }

    fn bucket_with_keys(keys: &[&str]) -> Bucket {
        let bucket = Bucket::new("x".to_owned(), BucketAcl::Private);
        for key in keys {
            bucket
                .insert_unique(key, stored(key))
                .unwrap_or_else(|e| panic!("insert {key} failed: {e}"));
        }
        bucket
    }

    // ---- BucketTable ----

    #[test]
    fn test_should_create_and_list_buckets_sorted() {
        let table = BucketTable::new();
        for name in ["charlie", "alpha", "bravo"] {
            table
                .create(name, BucketAcl::Private)
                .unwrap_or_else(|e| panic!("create {name} failed: {e}"));
        }

        let names: Vec<String> = table.list().into_iter().map(|b| b.name).collect();
        assert_eq!(names, vec!["alpha", "bravo", "charlie"]);
    }

    #[test]
    fn test_should_reject_duplicate_bucket() {
        let table = BucketTable::new();
        table
            .create("dup", BucketAcl::Private)
            .unwrap_or_else(|e| panic!("create failed: {e}"));
        assert!(matches!(
            table.create("dup", BucketAcl::Private),
            Err(DriverError::BucketExists { .. })
        ));
    }

    #[test]
    fn test_should_reject_whitespace_bucket_name() {
        let table = BucketTable::new();
        assert!(matches!(
            table.create("", BucketAcl::Private),
            Err(DriverError::InvalidArgument { .. })
        ));
        assert!(matches!(
            table.create("   ", BucketAcl::Private),
            Err(DriverError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_should_list_empty_table_without_error() {
        assert!(BucketTable::new().list().is_empty());
    }

    #[test]
    fn test_should_expose_bucket_metadata_map() {
        let table = BucketTable::new();
        table
            .create("photos", BucketAcl::PublicRead)
            .unwrap_or_else(|e| panic!("create failed: {e}"));

        let meta = table
            .metadata("photos")
            .unwrap_or_else(|e| panic!("metadata failed: {e}"));
        assert_eq!(meta.get("name").map(String::as_str), Some("photos"));
        assert_eq!(meta.get("acl").map(String::as_str), Some("public-read"));
        assert!(meta.contains_key("created"));
    }

    #[test]
    fn test_should_mutate_only_acl_via_set_metadata() {
        let table = BucketTable::new();
        table
            .create("photos", BucketAcl::Private)
            .unwrap_or_else(|e| panic!("create failed: {e}"));

        let mut update = BTreeMap::new();
        update.insert("acl".to_owned(), "public-read-write".to_owned());
        update.insert("owner".to_owned(), "someone-else".to_owned());
        table
            .set_metadata("photos", &update)
            .unwrap_or_else(|e| panic!("set_metadata failed: {e}"));

        let meta = table
            .metadata("photos")
            .unwrap_or_else(|e| panic!("metadata failed: {e}"));
        assert_eq!(
            meta.get("acl").map(String::as_str),
            Some("public-read-write"),
        );
        // Foreign keys are ignored, not stored.
        assert!(!meta.contains_key("owner"));
    }

    #[test]
    fn test_should_reject_unknown_acl_in_set_metadata() {
        let table = BucketTable::new();
        table
            .create("photos", BucketAcl::Private)
            .unwrap_or_else(|e| panic!("create failed: {e}"));

        let mut update = BTreeMap::new();
        update.insert("acl".to_owned(), "authenticated-read".to_owned());
        assert!(matches!(
            table.set_metadata("photos", &update),
            Err(DriverError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_should_report_missing_bucket() {
        let table = BucketTable::new();
        assert!(matches!(
            table.get("ghost"),
            Err(DriverError::BucketNotFound { .. })
        ));
        assert!(matches!(
            table.metadata("ghost"),
            Err(DriverError::BucketNotFound { .. })
        ));
    }

    // ---- Object index ----

    #[test]
    fn test_should_reject_duplicate_key() {
        let bucket = bucket_with_keys(&["k"]);
        assert!(matches!(
            bucket.insert_unique("k", stored("other")),
            Err(DriverError::ObjectExists { .. })
        ));
    }

    // ---- Listing ----

    #[test]
    fn test_should_list_empty_bucket() {
        let bucket = bucket_with_keys(&[]);
        let listing = bucket.list_objects("", "", "", 1000);
        assert!(listing.keys.is_empty());
        assert!(listing.common_prefixes.is_empty());
        assert!(!listing.is_truncated);
    }

    #[test]
    fn test_should_group_by_delimiter() {
        let bucket = bucket_with_keys(&["a/1", "a/2", "b", "c/d/e"]);
        let listing = bucket.list_objects("", "", "/", 1000);
        assert_eq!(listing.keys, vec!["b"]);
        assert_eq!(listing.common_prefixes, vec!["a/", "c/"]);
        assert!(!listing.is_truncated);
    }

    #[test]
    fn test_should_filter_and_strip_prefix() {
        let bucket = bucket_with_keys(&["photos/2023/a.jpg", "photos/2024/b.jpg", "docs/r.txt"]);
        let listing = bucket.list_objects("photos/", "", "/", 1000);
        assert!(listing.keys.is_empty());
        assert_eq!(
            listing.common_prefixes,
            vec!["photos/2023/", "photos/2024/"],
        );

        let listing = bucket.list_objects("photos/2023/", "", "/", 1000);
        assert_eq!(listing.keys, vec!["photos/2023/a.jpg"]);
        assert!(listing.common_prefixes.is_empty());
    }

    #[test]
    fn test_should_paginate_with_marker() {
        let bucket = bucket_with_keys(&["k1", "k2", "k3", "k4"]);
        let listing = bucket.list_objects("", "k2", "", 1);
        assert_eq!(listing.keys, vec!["k3"]);
        assert!(listing.is_truncated);
    }

    #[test]
    fn test_should_apply_marker_strictly() {
        let bucket = bucket_with_keys(&["k1", "k2", "k3"]);
        let listing = bucket.list_objects("", "k2", "", 1000);
        assert_eq!(listing.keys, vec!["k3"]);
        assert!(!listing.is_truncated);
    }

    #[test]
    fn test_should_return_empty_for_marker_past_all_keys() {
        let bucket = bucket_with_keys(&["a", "b"]);
        let listing = bucket.list_objects("", "z", "", 1000);
        assert!(listing.keys.is_empty());
        assert!(!listing.is_truncated);
    }

    #[test]
    fn test_should_treat_zero_max_keys_as_default() {
        let bucket = bucket_with_keys(&["a", "b", "c"]);
        let listing = bucket.list_objects("", "", "", 0);
        assert_eq!(listing.keys.len(), 3);
        assert!(!listing.is_truncated);
    }

    #[test]
    fn test_should_not_mark_truncated_at_exact_boundary() {
        let bucket = bucket_with_keys(&["a", "b", "c"]);
        let listing = bucket.list_objects("", "", "", 3);
        assert_eq!(listing.keys.len(), 3);
        assert!(!listing.is_truncated);

        let listing = bucket.list_objects("", "", "", 2);
        assert_eq!(listing.keys.len(), 2);
        assert!(listing.is_truncated);
    }

    #[test]
    fn test_should_keep_keys_and_prefixes_disjoint() {
        let bucket = bucket_with_keys(&["a/1", "a", "b"]);
        let listing = bucket.list_objects("", "", "/", 1000);
        assert_eq!(listing.keys, vec!["a", "b"]);
        assert_eq!(listing.common_prefixes, vec!["a/"]);
        for key in &listing.keys {
            assert!(!listing.common_prefixes.contains(key));
        }
    }
}
