//! Shared driver-layer data types.
//!
//! Plain-data descriptions of buckets, objects, multipart parts, and
//! listing results. These types cross the driver boundary; nothing in
//! here exposes index internals or byte-store handles.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Maximum size accepted for a single object or a single part: 5 GiB.
pub const MAX_OBJECT_SIZE: u64 = 5 * 1024 * 1024 * 1024;

/// Default page size for object listings when the caller passes zero or
/// a negative value.
pub const DEFAULT_MAX_KEYS: i32 = 1000;

/// Default page size for part listings when the caller passes zero.
pub const DEFAULT_MAX_PARTS: i32 = 1000;

/// Highest part number accepted for a multipart upload.
pub const MAX_PART_NUMBER: u32 = 10_000;

// ---------------------------------------------------------------------------
// ACL
// ---------------------------------------------------------------------------

/// Canned bucket access policy.
///
/// Only the three values below are recognized; anything else is rejected
/// at the boundary with `InvalidArgument`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum BucketAcl {
    /// Owner-only access (default).
    #[default]
    Private,
    /// Anonymous reads permitted.
    PublicRead,
    /// Anonymous reads and writes permitted.
    PublicReadWrite,
}

impl BucketAcl {
    /// Canonical wire representation (`private`, `public-read`,
    /// `public-read-write`).
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Private => "private",
            Self::PublicRead => "public-read",
            Self::PublicReadWrite => "public-read-write",
        }
    }
}

impl fmt::Display for BucketAcl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing a [`BucketAcl`] from a string fails.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown canned acl: {0:?}")]
pub struct ParseAclError(String);

impl FromStr for BucketAcl {
    type Err = ParseAclError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "private" => Ok(Self::Private),
            "public-read" => Ok(Self::PublicRead),
            "public-read-write" => Ok(Self::PublicReadWrite),
            _ => Err(ParseAclError(s.to_owned())),
        }
    }
}

// ---------------------------------------------------------------------------
// Buckets and objects
// ---------------------------------------------------------------------------

/// Summary of a bucket as seen through the driver contract.
#[derive(Debug, Clone, Serialize)]
pub struct BucketInfo {
    /// The bucket name.
    pub name: String,
    /// The bucket's canned ACL.
    pub acl: BucketAcl,
    /// When the bucket was created.
    pub created: DateTime<Utc>,
}

/// Metadata describing a stored object.
#[derive(Debug, Clone, Serialize)]
pub struct ObjectInfo {
    /// The bucket holding the object.
    pub bucket: String,
    /// The object key.
    pub key: String,
    /// Object size in bytes.
    pub size: u64,
    /// Hex-encoded MD5 of the full byte sequence (unquoted).
    pub etag: String,
    /// The declared content type, if any.
    pub content_type: Option<String>,
    /// When the object became visible.
    pub last_modified: DateTime<Utc>,
    /// Opaque user-supplied metadata.
    pub user_metadata: BTreeMap<String, String>,
}

/// Result of an object listing.
#[derive(Debug, Clone, Default)]
pub struct ObjectListing {
    /// Matching keys in lexicographic order, at most `max_keys` of them.
    pub keys: Vec<String>,
    /// Delimiter-derived common prefixes, sorted. Not bounded by
    /// `max_keys`.
    pub common_prefixes: Vec<String>,
    /// Whether the key list was cut off at `max_keys`.
    pub is_truncated: bool,
}

// ---------------------------------------------------------------------------
// Multipart uploads
// ---------------------------------------------------------------------------

/// A single uploaded part within a multipart upload.
#[derive(Debug, Clone, Serialize)]
pub struct PartInfo {
    /// The 1-based part number.
    pub part_number: u32,
    /// Hex-encoded MD5 of the part payload (unquoted).
    pub etag: String,
    /// Part size in bytes.
    pub size: u64,
    /// When this part was last uploaded.
    pub last_modified: DateTime<Utc>,
}

/// One `(part number, etag)` pair from a completion request, already
/// sorted ascending by part number when it reaches the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedPart {
    /// The 1-based part number.
    pub part_number: u32,
    /// The ETag the client observed when uploading this part. Quotes are
    /// tolerated and stripped before comparison.
    pub etag: String,
}

/// Result of a part listing for one upload.
#[derive(Debug, Clone)]
pub struct PartListing {
    /// The bucket of the upload.
    pub bucket: String,
    /// The target object key of the upload.
    pub key: String,
    /// The upload identifier.
    pub upload_id: String,
    /// The marker this page started after.
    pub part_number_marker: u32,
    /// Marker to pass for the next page; only meaningful when truncated.
    pub next_part_number_marker: u32,
    /// The page size that was applied.
    pub max_parts: i32,
    /// Whether more parts remain past this page.
    pub is_truncated: bool,
    /// Parts in ascending part-number order.
    pub parts: Vec<PartInfo>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_parse_recognized_acls() {
        assert_eq!("private".parse::<BucketAcl>().ok(), Some(BucketAcl::Private));
        assert_eq!(
            "public-read".parse::<BucketAcl>().ok(),
            Some(BucketAcl::PublicRead),
        );
        assert_eq!(
            "public-read-write".parse::<BucketAcl>().ok(),
            Some(BucketAcl::PublicReadWrite),
        );
    }

    #[test]
    fn test_should_reject_unknown_acl() {
        assert!("authenticated-read".parse::<BucketAcl>().is_err());
        assert!("".parse::<BucketAcl>().is_err());
        assert!("PRIVATE".parse::<BucketAcl>().is_err());
    }

    #[test]
    fn test_should_round_trip_acl_strings() {
        for acl in [
            BucketAcl::Private,
            BucketAcl::PublicRead,
            BucketAcl::PublicReadWrite,
        ] {
            assert_eq!(acl.as_str().parse::<BucketAcl>().ok(), Some(acl));
        }
    }

    #[test]
    fn test_should_default_acl_to_private() {
        assert_eq!(BucketAcl::default(), BucketAcl::Private);
    }

    #[test]
    fn test_should_expose_five_gib_object_limit() {
        assert_eq!(MAX_OBJECT_SIZE, 5_368_709_120);
    }
}
