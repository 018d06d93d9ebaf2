//! Request routing: path parsing and operation identification.
//!
//! Requests use path-style addressing: `/{bucket}` or
//! `/{bucket}/{object}` where the object key may itself contain `/`.
//! The operation is identified from the HTTP method, the presence of a
//! bucket and key, and the multipart query parameters (`uploads`,
//! `uploadId`, `partNumber`).

use http::Method;
use percent_encoding::percent_decode_str;

use crate::error::{ApiError, ApiErrorCode};

/// The operations this service routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum S3Operation {
    /// `GET /`
    ListBuckets,
    /// `PUT /{bucket}`
    MakeBucket,
    /// `GET /{bucket}`
    ListObjects,
    /// `DELETE /{bucket}` — always answered with `NotImplemented`.
    DeleteBucket,
    /// `GET /{bucket}/{object}`
    GetObject,
    /// `HEAD /{bucket}/{object}`
    HeadObject,
    /// `PUT /{bucket}/{object}`
    PutObject,
    /// `DELETE /{bucket}/{object}` — always answered with
    /// `NotImplemented`.
    DeleteObject,
    /// `POST /{bucket}/{object}?uploads`
    InitiateMultipartUpload,
    /// `PUT /{bucket}/{object}?uploadId=...&partNumber=...`
    UploadPart,
    /// `POST /{bucket}/{object}?uploadId=...`
    CompleteMultipartUpload,
    /// `DELETE /{bucket}/{object}?uploadId=...`
    AbortMultipartUpload,
    /// `GET /{bucket}/{object}?uploadId=...`
    ListParts,
}

impl S3Operation {
    /// A short name for logging.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ListBuckets => "ListBuckets",
            Self::MakeBucket => "MakeBucket",
            Self::ListObjects => "ListObjects",
            Self::DeleteBucket => "DeleteBucket",
            Self::GetObject => "GetObject",
            Self::HeadObject => "HeadObject",
            Self::PutObject => "PutObject",
            Self::DeleteObject => "DeleteObject",
            Self::InitiateMultipartUpload => "InitiateMultipartUpload",
            Self::UploadPart => "UploadPart",
            Self::CompleteMultipartUpload => "CompleteMultipartUpload",
            Self::AbortMultipartUpload => "AbortMultipartUpload",
            Self::ListParts => "ListParts",
        }
    }
}

impl std::fmt::Display for S3Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The result of routing one request.
#[derive(Debug, Clone)]
pub struct RoutingContext {
    /// The resolved bucket name, if any.
    pub bucket: Option<String>,
    /// The resolved object key, if any.
    pub key: Option<String>,
    /// The identified operation.
    pub operation: S3Operation,
    /// Decoded query parameters in request order.
    pub query_params: Vec<(String, String)>,
}

impl RoutingContext {
    /// Whether a query parameter is present (with or without a value).
    #[must_use]
    pub fn has_query(&self, key: &str) -> bool {
        self.query_params.iter().any(|(k, _)| k == key)
    }

    /// The value of a query parameter by name.
    #[must_use]
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query_params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Resolve a request to its operation, bucket, and key.
///
/// # Errors
///
/// Returns `MethodNotAllowed` for unroutable method/path combinations.
pub fn resolve<B>(req: &http::Request<B>) -> Result<RoutingContext, ApiError> {
    let query_params = parse_query_params(req.uri().query().unwrap_or(""));
    let (bucket, key) = parse_path(req.uri().path());
    let operation = identify_operation(req.method(), bucket.is_some(), key.is_some(), &query_params)?;

    Ok(RoutingContext {
        bucket,
        key,
        operation,
        query_params,
    })
}

/// Parse the URI path into an optional bucket and optional key.
///
/// Path format: `/{bucket}` or `/{bucket}/{key...}`.
fn parse_path(path: &str) -> (Option<String>, Option<String>) {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    if trimmed.is_empty() {
        return (None, None);
    }

    match trimmed.find('/') {
        Some(pos) => {
            let bucket = decode_component(&trimmed[..pos]);
            let key_raw = &trimmed[pos + 1..];
            let key = if key_raw.is_empty() {
                None
            } else {
                Some(decode_component(key_raw))
            };
            (Some(bucket), key)
        }
        None => (Some(decode_component(trimmed)), None),
    }
}

/// Decode a percent-encoded URI component.
fn decode_component(s: &str) -> String {
    percent_decode_str(s).decode_utf8_lossy().into_owned()
}

/// Parse a query string into decoded key-value pairs.
fn parse_query_params(query: &str) -> Vec<(String, String)> {
    query
        .split('&')
        .filter(|s| !s.is_empty())
        .map(|pair| match pair.find('=') {
            Some(pos) => (
                decode_component(&pair[..pos]),
                decode_component(&pair[pos + 1..]),
            ),
            None => (decode_component(pair), String::new()),
        })
        .collect()
}

fn has_key(params: &[(String, String)], key: &str) -> bool {
    params.iter().any(|(k, _)| k == key)
}

/// Map method + path shape + query parameters to an operation.
fn identify_operation(
    method: &Method,
    has_bucket: bool,
    has_object: bool,
    params: &[(String, String)],
) -> Result<S3Operation, ApiError> {
    match (method, has_bucket, has_object) {
        (&Method::GET, false, false) => Ok(S3Operation::ListBuckets),

        (&Method::GET, true, false) => Ok(S3Operation::ListObjects),
        (&Method::PUT, true, false) => Ok(S3Operation::MakeBucket),
        (&Method::DELETE, true, false) => Ok(S3Operation::DeleteBucket),

        (&Method::GET, true, true) => {
            if has_key(params, "uploadId") {
                Ok(S3Operation::ListParts)
            } else {
                Ok(S3Operation::GetObject)
            }
        }
        (&Method::HEAD, true, true) => Ok(S3Operation::HeadObject),
        (&Method::PUT, true, true) => {
            if has_key(params, "uploadId") && has_key(params, "partNumber") {
                Ok(S3Operation::UploadPart)
            } else {
                Ok(S3Operation::PutObject)
            }
        }
        (&Method::POST, true, true) => {
            if has_key(params, "uploads") {
                Ok(S3Operation::InitiateMultipartUpload)
            } else if has_key(params, "uploadId") {
                Ok(S3Operation::CompleteMultipartUpload)
            } else {
                Err(ApiError::new(ApiErrorCode::MethodNotAllowed))
            }
        }
        (&Method::DELETE, true, true) => {
            if has_key(params, "uploadId") {
                Ok(S3Operation::AbortMultipartUpload)
            } else {
                Ok(S3Operation::DeleteObject)
            }
        }

        _ => Err(ApiError::new(ApiErrorCode::MethodNotAllowed)),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn request(method: Method, uri: &str) -> http::Request<()> {
        http::Request::builder()
            .method(method)
            .uri(uri)
            .body(())
            .expect("valid request")
    }

    #[test]
    fn test_should_route_list_buckets() {
        let ctx = resolve(&request(Method::GET, "/")).expect("should resolve");
        assert_eq!(ctx.operation, S3Operation::ListBuckets);
        assert!(ctx.bucket.is_none());
    }

    #[test]
    fn test_should_route_make_bucket() {
        let ctx = resolve(&request(Method::PUT, "/photos")).expect("should resolve");
        assert_eq!(ctx.operation, S3Operation::MakeBucket);
        assert_eq!(ctx.bucket.as_deref(), Some("photos"));
    }

    #[test]
    fn test_should_route_list_objects_with_query() {
        let ctx = resolve(&request(
            Method::GET,
            "/photos?prefix=a%2F&delimiter=%2F&max-keys=10&marker=m",
        ))
        .expect("should resolve");
        assert_eq!(ctx.operation, S3Operation::ListObjects);
        assert_eq!(ctx.query_value("prefix"), Some("a/"));
        assert_eq!(ctx.query_value("delimiter"), Some("/"));
        assert_eq!(ctx.query_value("max-keys"), Some("10"));
        assert_eq!(ctx.query_value("marker"), Some("m"));
    }

    #[test]
    fn test_should_route_object_key_with_slashes() {
        let ctx = resolve(&request(Method::GET, "/b/a/deep/key.txt")).expect("should resolve");
        assert_eq!(ctx.operation, S3Operation::GetObject);
        assert_eq!(ctx.bucket.as_deref(), Some("b"));
        assert_eq!(ctx.key.as_deref(), Some("a/deep/key.txt"));
    }

    #[test]
    fn test_should_decode_percent_encoded_key() {
        let ctx = resolve(&request(Method::GET, "/b/my%20file")).expect("should resolve");
        assert_eq!(ctx.key.as_deref(), Some("my file"));
    }

    #[test]
    fn test_should_route_head_object() {
        let ctx = resolve(&request(Method::HEAD, "/b/k")).expect("should resolve");
        assert_eq!(ctx.operation, S3Operation::HeadObject);
    }

    #[test]
    fn test_should_route_put_object() {
        let ctx = resolve(&request(Method::PUT, "/b/k")).expect("should resolve");
        assert_eq!(ctx.operation, S3Operation::PutObject);
    }

    #[test]
    fn test_should_route_upload_part() {
        let ctx = resolve(&request(Method::PUT, "/b/k?partNumber=1&uploadId=u1"))
            .expect("should resolve");
        assert_eq!(ctx.operation, S3Operation::UploadPart);
        assert_eq!(ctx.query_value("uploadId"), Some("u1"));
    }

    #[test]
    fn test_should_route_initiate_multipart() {
        let ctx = resolve(&request(Method::POST, "/b/k?uploads")).expect("should resolve");
        assert_eq!(ctx.operation, S3Operation::InitiateMultipartUpload);
    }

    #[test]
    fn test_should_route_complete_multipart() {
        let ctx = resolve(&request(Method::POST, "/b/k?uploadId=u1")).expect("should resolve");
        assert_eq!(ctx.operation, S3Operation::CompleteMultipartUpload);
    }

    #[test]
    fn test_should_route_abort_multipart() {
        let ctx = resolve(&request(Method::DELETE, "/b/k?uploadId=u1")).expect("should resolve");
        assert_eq!(ctx.operation, S3Operation::AbortMultipartUpload);
    }

    #[test]
    fn test_should_route_list_parts() {
        let ctx = resolve(&request(Method::GET, "/b/k?uploadId=u1")).expect("should resolve");
        assert_eq!(ctx.operation, S3Operation::ListParts);
    }

    #[test]
    fn test_should_route_deletes_for_not_implemented_answers() {
        let ctx = resolve(&request(Method::DELETE, "/b")).expect("should resolve");
        assert_eq!(ctx.operation, S3Operation::DeleteBucket);

        let ctx = resolve(&request(Method::DELETE, "/b/k")).expect("should resolve");
        assert_eq!(ctx.operation, S3Operation::DeleteObject);
    }

    #[test]
    fn test_should_reject_bare_post_on_object() {
        let err = resolve(&request(Method::POST, "/b/k")).expect_err("should not resolve");
        assert_eq!(err.code, ApiErrorCode::MethodNotAllowed);
    }

    #[test]
    fn test_should_reject_unroutable_method() {
        let err = resolve(&request(Method::PATCH, "/b")).expect_err("should not resolve");
        assert_eq!(err.code, ApiErrorCode::MethodNotAllowed);

        let err = resolve(&request(Method::PUT, "/")).expect_err("should not resolve");
        assert_eq!(err.code, ApiErrorCode::MethodNotAllowed);
    }
}
