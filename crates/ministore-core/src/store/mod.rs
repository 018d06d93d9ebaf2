//! Driver-owned mutable state: the bucket table and the multipart
//! upload table.
//!
//! Both tables are process-wide and follow a single-writer /
//! multi-reader discipline: lookups run concurrently, while index
//! mutations hold a write lock only for the final insert — payload
//! streaming always happens before the lock is taken.

pub(crate) mod bucket;
pub(crate) mod multipart;

pub use bucket::{BucketTable, StoredObject};
pub use multipart::{StoredPart, UploadTable};
