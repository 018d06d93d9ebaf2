//! Driver-layer error types.
//!
//! Defines [`DriverError`], the closed set of error kinds the driver layer
//! can produce. Each variant carries the structured context captured at the
//! innermost failure site (bucket name, object key, upload ID, digests).
//! Layers above append context rather than translating the kind; the HTTP
//! front-end is the only place where a `DriverError` becomes a wire error
//! code and status.
//!
//! # Usage
//!
//! ```
//! use ministore_core::error::DriverError;
//!
//! let err = DriverError::BucketNotFound {
//!     bucket: "photos".to_owned(),
//! };
//! assert_eq!(err.to_string(), "bucket not found: photos");
//! ```

/// Error type for all driver operations.
///
/// The set of variants is closed: callers dispatch on the kind alone and
/// must be able to match exhaustively. Message text is derived from the
/// structured fields and is never used for identity.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// A caller-supplied argument was empty or otherwise malformed.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Description of the offending argument.
        message: String,
    },

    /// The named bucket does not exist.
    #[error("bucket not found: {bucket}")]
    BucketNotFound {
        /// The bucket name that was not found.
        bucket: String,
    },

    /// A bucket with the same name already exists.
    #[error("bucket already exists: {bucket}")]
    BucketExists {
        /// The bucket name that is already taken.
        bucket: String,
    },

    /// The named object does not exist in the bucket.
    #[error("object not found: {bucket}/{object}")]
    ObjectNotFound {
        /// The bucket that was searched.
        bucket: String,
        /// The object key that was not found.
        object: String,
    },

    /// An object with the same key already exists; objects are immutable.
    #[error("object already exists: {bucket}/{object}")]
    ObjectExists {
        /// The bucket holding the conflicting object.
        bucket: String,
        /// The conflicting object key.
        object: String,
    },

    /// The object key is syntactically invalid (empty or whitespace-only).
    #[error("object name invalid: {object:?}")]
    ObjectNameInvalid {
        /// The rejected object key.
        object: String,
    },

    /// The computed content MD5 differs from the digest the client declared.
    #[error("content digest mismatch: expected {expected}, computed {computed}")]
    BadDigest {
        /// The digest the client declared.
        expected: String,
        /// The digest computed over the received bytes.
        computed: String,
    },

    /// The declared digest is not a syntactically valid MD5.
    #[error("invalid content digest: {digest:?}")]
    InvalidDigest {
        /// The rejected digest string.
        digest: String,
    },

    /// The requested byte range cannot be satisfied against the object size.
    #[error("requested range not satisfiable")]
    InvalidRange,

    /// The payload exceeds the configured maximum object size.
    #[error("entity too large: {size} bytes exceeds maximum of {max}")]
    EntityTooLarge {
        /// The declared or observed payload size.
        size: u64,
        /// The configured maximum.
        max: u64,
    },

    /// A body-bearing request arrived without a Content-Length header.
    #[error("missing content length")]
    MissingContentLength,

    /// A part referenced during completion was never uploaded or its ETag
    /// does not match what was stored.
    #[error("invalid part: {part_number}")]
    InvalidPart {
        /// The offending part number.
        part_number: u32,
    },

    /// The client-supplied part list was not in ascending part-number order.
    #[error("part list not in ascending order")]
    InvalidPartOrder,

    /// The upload ID is unknown, completed, or aborted.
    #[error("invalid upload id: {upload_id}")]
    InvalidUploadId {
        /// The rejected upload identifier.
        upload_id: String,
    },

    /// The operation is recognized but intentionally not provided.
    #[error("operation not implemented")]
    NotImplemented,

    /// An unexpected internal failure (byte-store I/O, index persistence).
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl DriverError {
    /// Shorthand for [`DriverError::InvalidArgument`].
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Shorthand for [`DriverError::BucketNotFound`].
    #[must_use]
    pub fn bucket_not_found(bucket: impl Into<String>) -> Self {
        Self::BucketNotFound {
            bucket: bucket.into(),
        }
    }

    /// Shorthand for [`DriverError::ObjectNotFound`].
    #[must_use]
    pub fn object_not_found(bucket: impl Into<String>, object: impl Into<String>) -> Self {
        Self::ObjectNotFound {
            bucket: bucket.into(),
            object: object.into(),
        }
    }

    /// Shorthand for [`DriverError::InvalidUploadId`].
    #[must_use]
    pub fn invalid_upload_id(upload_id: impl Into<String>) -> Self {
        Self::InvalidUploadId {
            upload_id: upload_id.into(),
        }
    }
}

/// Convenience result type for driver operations.
pub type DriverResult<T> = Result<T, DriverError>;
