//! Wire-level error codes and the driver-to-HTTP error translation.
//!
//! [`ApiErrorCode`] is the closed set of S3 error codes this service
//! emits; each carries a default message and HTTP status. [`ApiError`]
//! pairs a code with an optional resource path for the `<Error>`
//! document. The [`From<DriverError>`] impl is the *only* place a
//! driver error kind becomes an HTTP concern — handlers dispatch on the
//! driver kind alone and never inspect message text.

use std::fmt;

use ministore_core::DriverError;
use tracing::error;

/// Well-known S3 error codes emitted by this service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiErrorCode {
    /// Access denied by the authorizer.
    AccessDenied,
    /// A request argument was malformed.
    InvalidArgument,
    /// The bucket name is already taken.
    BucketAlreadyExists,
    /// The declared Content-MD5 did not match the received bytes.
    BadDigest,
    /// The payload exceeds the maximum object size.
    EntityTooLarge,
    /// Unexpected internal failure.
    InternalError,
    /// The Content-MD5 header is not valid base64 of 16 bytes.
    InvalidDigest,
    /// A completion referenced an unknown or mismatched part.
    InvalidPart,
    /// The completion part list was not in ascending order.
    InvalidPartOrder,
    /// The Range header cannot be satisfied.
    InvalidRange,
    /// The request is syntactically invalid.
    InvalidRequest,
    /// The XML request body was not well-formed.
    MalformedXML,
    /// The HTTP method is not allowed against this resource.
    MethodNotAllowed,
    /// A body-bearing request lacked Content-Length.
    MissingContentLength,
    /// The bucket does not exist.
    NoSuchBucket,
    /// The object does not exist.
    NoSuchKey,
    /// The multipart upload does not exist.
    NoSuchUpload,
    /// The operation is intentionally not provided.
    NotImplemented,
}

impl ApiErrorCode {
    /// The wire representation of this code.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AccessDenied => "AccessDenied",
            Self::InvalidArgument => "InvalidArgument",
            Self::BucketAlreadyExists => "BucketAlreadyExists",
            Self::BadDigest => "BadDigest",
            Self::EntityTooLarge => "EntityTooLarge",
            Self::InternalError => "InternalError",
            Self::InvalidDigest => "InvalidDigest",
            Self::InvalidPart => "InvalidPart",
            Self::InvalidPartOrder => "InvalidPartOrder",
            Self::InvalidRange => "InvalidRange",
            Self::InvalidRequest => "InvalidRequest",
            Self::MalformedXML => "MalformedXML",
            Self::MethodNotAllowed => "MethodNotAllowed",
            Self::MissingContentLength => "MissingContentLength",
            Self::NoSuchBucket => "NoSuchBucket",
            Self::NoSuchKey => "NoSuchKey",
            Self::NoSuchUpload => "NoSuchUpload",
            Self::NotImplemented => "NotImplemented",
        }
    }

    /// The HTTP status this code maps to.
    #[must_use]
    pub fn status_code(&self) -> http::StatusCode {
        match self {
            Self::AccessDenied => http::StatusCode::FORBIDDEN,
            Self::InvalidArgument
            | Self::BadDigest
            | Self::InvalidDigest
            | Self::InvalidPart
            | Self::InvalidPartOrder
            | Self::InvalidRequest
            | Self::MalformedXML => http::StatusCode::BAD_REQUEST,
            Self::BucketAlreadyExists => http::StatusCode::CONFLICT,
            Self::EntityTooLarge => http::StatusCode::PAYLOAD_TOO_LARGE,
            Self::InternalError => http::StatusCode::INTERNAL_SERVER_ERROR,
            Self::InvalidRange => http::StatusCode::RANGE_NOT_SATISFIABLE,
            Self::MethodNotAllowed => http::StatusCode::METHOD_NOT_ALLOWED,
            Self::MissingContentLength => http::StatusCode::LENGTH_REQUIRED,
            Self::NoSuchBucket | Self::NoSuchKey | Self::NoSuchUpload => {
                http::StatusCode::NOT_FOUND
            }
            Self::NotImplemented => http::StatusCode::NOT_IMPLEMENTED,
        }
    }

    /// The default human-readable message for this code.
    #[must_use]
    pub fn default_message(&self) -> &'static str {
        match self {
            Self::AccessDenied => "Access Denied",
            Self::InvalidArgument => "Invalid Argument",
            Self::BucketAlreadyExists => "The requested bucket name is not available",
            Self::BadDigest => "The Content-MD5 you specified did not match what we received",
            Self::EntityTooLarge => "Your proposed upload exceeds the maximum allowed object size",
            Self::InternalError => "We encountered an internal error, please try again",
            Self::InvalidDigest => "The Content-MD5 you specified is not valid",
            Self::InvalidPart => "One or more of the specified parts could not be found",
            Self::InvalidPartOrder => "The list of parts was not in ascending order",
            Self::InvalidRange => "The requested range cannot be satisfied",
            Self::InvalidRequest => "Invalid Request",
            Self::MalformedXML => "The XML you provided was not well-formed",
            Self::MethodNotAllowed => "The specified method is not allowed against this resource",
            Self::MissingContentLength => "You must provide the Content-Length HTTP header",
            Self::NoSuchBucket => "The specified bucket does not exist",
            Self::NoSuchKey => "The specified key does not exist",
            Self::NoSuchUpload => "The specified multipart upload does not exist",
            Self::NotImplemented => "A header you provided implies functionality that is not implemented",
        }
    }
}

impl fmt::Display for ApiErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error ready to be rendered as an S3 `<Error>` response.
#[derive(Debug)]
pub struct ApiError {
    /// The error code.
    pub code: ApiErrorCode,
    /// The message carried in the response body.
    pub message: String,
    /// The resource (request path) that caused the error.
    pub resource: Option<String>,
}

impl ApiError {
    /// Create an error with the code's default message.
    #[must_use]
    pub fn new(code: ApiErrorCode) -> Self {
        Self {
            message: code.default_message().to_owned(),
            code,
            resource: None,
        }
    }

    /// Create an error with a custom message.
    #[must_use]
    pub fn with_message(code: ApiErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            resource: None,
        }
    }

    /// Attach the resource path to this error.
    #[must_use]
    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl From<DriverError> for ApiError {
    fn from(err: DriverError) -> Self {
        let code = match &err {
            DriverError::InvalidArgument { .. } => ApiErrorCode::InvalidArgument,
            DriverError::BucketNotFound { .. } => ApiErrorCode::NoSuchBucket,
            DriverError::BucketExists { .. } => ApiErrorCode::BucketAlreadyExists,
            // An invalid object name is indistinguishable from a missing
            // key on the wire.
            DriverError::ObjectNotFound { .. } | DriverError::ObjectNameInvalid { .. } => {
                ApiErrorCode::NoSuchKey
            }
            // S3 convention: an immutable-key conflict surfaces as 405.
            DriverError::ObjectExists { .. } => ApiErrorCode::MethodNotAllowed,
            DriverError::BadDigest { .. } => ApiErrorCode::BadDigest,
            DriverError::InvalidDigest { .. } => ApiErrorCode::InvalidDigest,
            DriverError::InvalidRange => ApiErrorCode::InvalidRange,
            DriverError::EntityTooLarge { .. } => ApiErrorCode::EntityTooLarge,
            DriverError::MissingContentLength => ApiErrorCode::MissingContentLength,
            DriverError::InvalidPart { .. } => ApiErrorCode::InvalidPart,
            DriverError::InvalidPartOrder => ApiErrorCode::InvalidPartOrder,
            DriverError::InvalidUploadId { .. } => ApiErrorCode::NoSuchUpload,
            DriverError::NotImplemented => ApiErrorCode::NotImplemented,
            DriverError::Internal(cause) => {
                error!(error = %cause, "internal driver failure");
                ApiErrorCode::InternalError
            }
        };
        Self::with_message(code, err.to_string())
    }
}

/// Convenience result type for handler methods.
pub type ApiResult<T> = Result<T, ApiError>;
