//! Wire-contract response and request bodies.
//!
//! Field names follow the S3 XML element names exactly; the serde
//! renames keep the JSON rendering aligned with the XML one. Timestamps
//! are carried pre-formatted (ISO 8601 with milliseconds, `Z` suffix)
//! so both encodings emit the identical string.

use serde::Serialize;

/// `ListAllMyBucketsResult` — the response to `GET /`.
#[derive(Debug, Clone, Serialize)]
pub struct ListAllMyBucketsResult {
    /// The owning principal.
    #[serde(rename = "Owner")]
    pub owner: Owner,
    /// All buckets, sorted by name.
    #[serde(rename = "Buckets")]
    pub buckets: Vec<BucketEntry>,
}

/// The bucket-owning principal.
#[derive(Debug, Clone, Serialize)]
pub struct Owner {
    /// Opaque principal identifier.
    #[serde(rename = "ID")]
    pub id: String,
    /// Human-readable principal name.
    #[serde(rename = "DisplayName")]
    pub display_name: String,
}

/// One bucket in a `ListAllMyBucketsResult`.
#[derive(Debug, Clone, Serialize)]
pub struct BucketEntry {
    /// The bucket name.
    #[serde(rename = "Name")]
    pub name: String,
    /// Creation timestamp.
    #[serde(rename = "CreationDate")]
    pub creation_date: String,
}

/// `ListBucketResult` — the response to `GET /{bucket}`.
#[derive(Debug, Clone, Serialize)]
pub struct ListBucketResult {
    /// The bucket that was listed.
    #[serde(rename = "Name")]
    pub name: String,
    /// The prefix the listing was restricted to.
    #[serde(rename = "Prefix")]
    pub prefix: String,
    /// The marker the listing started after.
    #[serde(rename = "Marker")]
    pub marker: String,
    /// The delimiter used for grouping, if any.
    #[serde(rename = "Delimiter")]
    pub delimiter: String,
    /// The applied page size.
    #[serde(rename = "MaxKeys")]
    pub max_keys: i32,
    /// Whether the key list was cut off.
    #[serde(rename = "IsTruncated")]
    pub is_truncated: bool,
    /// Matching objects.
    #[serde(rename = "Contents")]
    pub contents: Vec<ObjectEntry>,
    /// Delimiter-derived groups.
    #[serde(rename = "CommonPrefixes")]
    pub common_prefixes: Vec<CommonPrefix>,
}

/// One object in a `ListBucketResult`.
#[derive(Debug, Clone, Serialize)]
pub struct ObjectEntry {
    /// The object key.
    #[serde(rename = "Key")]
    pub key: String,
    /// Last-modified timestamp.
    #[serde(rename = "LastModified")]
    pub last_modified: String,
    /// Quoted hex MD5 of the payload.
    #[serde(rename = "ETag")]
    pub etag: String,
    /// Payload size in bytes.
    #[serde(rename = "Size")]
    pub size: u64,
    /// Storage class; always `STANDARD`.
    #[serde(rename = "StorageClass")]
    pub storage_class: String,
}

/// One common prefix in a `ListBucketResult`.
#[derive(Debug, Clone, Serialize)]
pub struct CommonPrefix {
    /// The grouped prefix, ending with the delimiter.
    #[serde(rename = "Prefix")]
    pub prefix: String,
}

/// `InitiateMultipartUploadResult` — the response to
/// `POST /{bucket}/{object}?uploads`.
#[derive(Debug, Clone, Serialize)]
pub struct InitiateMultipartUploadResult {
    /// Target bucket.
    #[serde(rename = "Bucket")]
    pub bucket: String,
    /// Target object key.
    #[serde(rename = "Key")]
    pub key: String,
    /// The server-generated upload identifier.
    #[serde(rename = "UploadId")]
    pub upload_id: String,
}

/// `ListPartsResult` — the response to
/// `GET /{bucket}/{object}?uploadId=...`.
#[derive(Debug, Clone, Serialize)]
pub struct ListPartsResult {
    /// Target bucket.
    #[serde(rename = "Bucket")]
    pub bucket: String,
    /// Target object key.
    #[serde(rename = "Key")]
    pub key: String,
    /// The upload identifier.
    #[serde(rename = "UploadId")]
    pub upload_id: String,
    /// The marker this page started after.
    #[serde(rename = "PartNumberMarker")]
    pub part_number_marker: u32,
    /// Marker for the next page.
    #[serde(rename = "NextPartNumberMarker")]
    pub next_part_number_marker: u32,
    /// The applied page size.
    #[serde(rename = "MaxParts")]
    pub max_parts: i32,
    /// Whether more parts remain.
    #[serde(rename = "IsTruncated")]
    pub is_truncated: bool,
    /// Parts in ascending part-number order.
    #[serde(rename = "Part")]
    pub parts: Vec<PartEntry>,
}

/// One part in a `ListPartsResult`.
#[derive(Debug, Clone, Serialize)]
pub struct PartEntry {
    /// The 1-based part number.
    #[serde(rename = "PartNumber")]
    pub part_number: u32,
    /// Quoted hex MD5 of the part payload.
    #[serde(rename = "ETag")]
    pub etag: String,
    /// Part size in bytes.
    #[serde(rename = "Size")]
    pub size: u64,
    /// When the part was uploaded.
    #[serde(rename = "LastModified")]
    pub last_modified: String,
}

/// `CompleteMultipartUploadResult` — the response to
/// `POST /{bucket}/{object}?uploadId=...`.
#[derive(Debug, Clone, Serialize)]
pub struct CompleteMultipartUploadResult {
    /// URL of the created object.
    #[serde(rename = "Location")]
    pub location: String,
    /// The bucket holding the object.
    #[serde(rename = "Bucket")]
    pub bucket: String,
    /// The object key.
    #[serde(rename = "Key")]
    pub key: String,
    /// Quoted composite ETag.
    #[serde(rename = "ETag")]
    pub etag: String,
}

/// One `(part number, etag)` pair decoded from a
/// `CompleteMultipartUpload` request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompleteRequestPart {
    /// The declared part number.
    pub part_number: u32,
    /// The declared ETag, quotes included if the client sent them.
    pub etag: String,
}
