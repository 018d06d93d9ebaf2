//! Per-operation request handlers.
//!
//! [`ApiHandler`] owns the driver and authorizer and turns routed
//! requests into driver calls and HTTP responses. Every handler follows
//! the same sequence: authorization check, header validation, driver
//! dispatch, error-kind translation.

use std::collections::BTreeMap;
use std::sync::Arc;

use bytes::Bytes;
use ministore_core::digest::{content_md5_to_hex, quote_etag};
use ministore_core::types::MAX_OBJECT_SIZE;
use ministore_core::{BucketAcl, CompletedPart, Driver, ObjectInfo};
use ministore_xml::wire::{
    BucketEntry, CommonPrefix, CompleteMultipartUploadResult, InitiateMultipartUploadResult,
    ListAllMyBucketsResult, ListBucketResult, ListPartsResult, ObjectEntry, Owner, PartEntry,
};
use ministore_xml::{format_timestamp, parse_complete_multipart_upload};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::body::ResponseBody;
use crate::error::{ApiError, ApiErrorCode, ApiResult};
use crate::range::parse_range;
use crate::response::{
    add_common_headers, document_response, empty_response, encode_document, error_to_response,
    http_date, negotiate_encoding,
};
use crate::router::{resolve, RoutingContext, S3Operation};

/// The storage class reported for every object.
const STORAGE_CLASS: &str = "STANDARD";

/// Authorization hook consulted before every operation.
///
/// The service itself performs no signature validation; deployments
/// plug their policy in here.
pub trait Authorizer: Send + Sync + 'static {
    /// Whether the request may proceed.
    fn is_operation_allowed(&self, parts: &http::request::Parts, ctx: &RoutingContext) -> bool;
}

/// Authorizer that admits every request.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl Authorizer for AllowAll {
    fn is_operation_allowed(&self, _parts: &http::request::Parts, _ctx: &RoutingContext) -> bool {
        true
    }
}

/// The request handler: routing context in, HTTP response out.
pub struct ApiHandler {
    driver: Arc<dyn Driver>,
    authorizer: Arc<dyn Authorizer>,
    max_object_size: u64,
}

impl ApiHandler {
    /// Create a handler over a driver with the default authorizer and
    /// object-size limit.
    #[must_use]
    pub fn new(driver: Arc<dyn Driver>) -> Self {
        Self {
            driver,
            authorizer: Arc::new(AllowAll),
            max_object_size: MAX_OBJECT_SIZE,
        }
    }

    /// Replace the authorizer.
    #[must_use]
    pub fn with_authorizer(mut self, authorizer: Arc<dyn Authorizer>) -> Self {
        self.authorizer = authorizer;
        self
    }

    /// Override the maximum accepted object/part size.
    #[must_use]
    pub fn with_max_object_size(mut self, max_object_size: u64) -> Self {
        self.max_object_size = max_object_size;
        self
    }

    /// Process one request end to end.
    ///
    /// The body has already been collected by the service layer; a
    /// client that disconnected mid-upload never reaches this point.
    pub async fn handle(
        &self,
        parts: http::request::Parts,
        body: Bytes,
    ) -> http::Response<ResponseBody> {
        let request_id = Uuid::new_v4().simple().to_string();
        let path = parts.uri.path().to_owned();

        let mut response = match self.dispatch(&parts, body).await {
            Ok(response) => response,
            Err(err) => {
                debug!(%err, path, request_id, "request failed");
                error_to_response(&err.with_resource(path), &request_id)
            }
        };

        add_common_headers(&mut response, &request_id);
        response
    }

    async fn dispatch(
        &self,
        parts: &http::request::Parts,
        body: Bytes,
    ) -> ApiResult<http::Response<ResponseBody>> {
        let req = http::Request::from_parts(parts.clone(), ());
        let ctx = resolve(&req)?;

        if !self.authorizer.is_operation_allowed(parts, &ctx) {
            warn!(operation = %ctx.operation, "request denied by authorizer");
            return Err(ApiError::new(ApiErrorCode::AccessDenied));
        }

        debug!(
            operation = %ctx.operation,
            bucket = ?ctx.bucket,
            key = ?ctx.key,
            "dispatching operation"
        );

        match ctx.operation {
            S3Operation::ListBuckets => self.list_buckets(parts).await,
            S3Operation::MakeBucket => self.make_bucket(parts, &ctx).await,
            S3Operation::ListObjects => self.list_objects(parts, &ctx).await,
            S3Operation::GetObject => self.get_object(parts, &ctx).await,
            S3Operation::HeadObject => self.head_object(&ctx).await,
            S3Operation::PutObject => self.put_object(parts, &ctx, body).await,
            S3Operation::InitiateMultipartUpload => self.initiate_multipart(parts, &ctx).await,
            S3Operation::UploadPart => self.upload_part(parts, &ctx, body).await,
            S3Operation::CompleteMultipartUpload => self.complete_multipart(parts, &ctx, &body).await,
            S3Operation::AbortMultipartUpload => self.abort_multipart(&ctx).await,
            S3Operation::ListParts => self.list_parts(parts, &ctx).await,
            // Deletion is intentionally not provided.
            S3Operation::DeleteBucket | S3Operation::DeleteObject => {
                Err(ApiError::new(ApiErrorCode::NotImplemented))
            }
        }
    }

    // -----------------------------------------------------------------------
    // Bucket operations
    // -----------------------------------------------------------------------

    async fn make_bucket(
        &self,
        parts: &http::request::Parts,
        ctx: &RoutingContext,
    ) -> ApiResult<http::Response<ResponseBody>> {
        let bucket = require_bucket(ctx)?;
        let acl = parse_acl_header(&parts.headers)?;
        self.driver.make_bucket(bucket, acl).await?;
        Ok(empty_response(http::StatusCode::OK))
    }

    async fn list_buckets(
        &self,
        parts: &http::request::Parts,
    ) -> ApiResult<http::Response<ResponseBody>> {
        let buckets = self.driver.list_buckets().await?;
        let result = ListAllMyBucketsResult {
            owner: service_owner(),
            buckets: buckets
                .into_iter()
                .map(|b| BucketEntry {
                    name: b.name,
                    creation_date: format_timestamp(&b.created),
                })
                .collect(),
        };

        let encoding = negotiate_encoding(&parts.headers);
        let document = encode_document(encoding, "ListAllMyBucketsResult", &result)?;
        Ok(document_response(encoding, document))
    }

    async fn list_objects(
        &self,
        parts: &http::request::Parts,
        ctx: &RoutingContext,
    ) -> ApiResult<http::Response<ResponseBody>> {
        let bucket = require_bucket(ctx)?;
        let prefix = ctx.query_value("prefix").unwrap_or("");
        let marker = ctx.query_value("marker").unwrap_or("");
        let delimiter = ctx.query_value("delimiter").unwrap_or("");
        let max_keys = parse_numeric_query::<i32>(ctx, "max-keys")?.unwrap_or(0);

        let listing = self
            .driver
            .list_objects(bucket, prefix, marker, delimiter, max_keys)
            .await?;

        let mut contents = Vec::with_capacity(listing.keys.len());
        for key in &listing.keys {
            let info = self.driver.get_object_metadata(bucket, key).await?;
            contents.push(ObjectEntry {
                key: info.key,
                last_modified: format_timestamp(&info.last_modified),
                etag: quote_etag(&info.etag),
                size: info.size,
                storage_class: STORAGE_CLASS.to_owned(),
            });
        }

        let result = ListBucketResult {
            name: bucket.to_owned(),
            prefix: prefix.to_owned(),
            marker: marker.to_owned(),
            delimiter: delimiter.to_owned(),
            max_keys: if max_keys <= 0 { 1000 } else { max_keys },
            is_truncated: listing.is_truncated,
            contents,
            common_prefixes: listing
                .common_prefixes
                .into_iter()
                .map(|prefix| CommonPrefix { prefix })
                .collect(),
        };

        let encoding = negotiate_encoding(&parts.headers);
        let document = encode_document(encoding, "ListBucketResult", &result)?;
        Ok(document_response(encoding, document))
    }

    // -----------------------------------------------------------------------
    // Object operations
    // -----------------------------------------------------------------------

    async fn get_object(
        &self,
        parts: &http::request::Parts,
        ctx: &RoutingContext,
    ) -> ApiResult<http::Response<ResponseBody>> {
        let bucket = require_bucket(ctx)?;
        let key = require_key(ctx)?;

        let info = self.driver.get_object_metadata(bucket, key).await?;
        let range_header = parts
            .headers
            .get(http::header::RANGE)
            .and_then(|v| v.to_str().ok());
        let range = parse_range(range_header, info.size)?;

        if range.is_whole() {
            let (data, info) = self.driver.get_object(bucket, key).await?;
            let builder = object_header_builder(http::StatusCode::OK, &info)
                .header(http::header::CONTENT_LENGTH, data.len());
            return build(builder, ResponseBody::from_bytes(data));
        }

        let data = self
            .driver
            .get_partial_object(bucket, key, range.start, range.length)
            .await?;
        let content_range = format!("bytes {}-{}/{}", range.start, range.end(), info.size);
        let builder = object_header_builder(http::StatusCode::PARTIAL_CONTENT, &info)
            .header(http::header::CONTENT_RANGE, content_range)
            .header(http::header::CONTENT_LENGTH, data.len());
        build(builder, ResponseBody::from_bytes(data))
    }

    async fn head_object(&self, ctx: &RoutingContext) -> ApiResult<http::Response<ResponseBody>> {
        let bucket = require_bucket(ctx)?;
        let key = require_key(ctx)?;

        let info = self.driver.get_object_metadata(bucket, key).await?;
        let builder = object_header_builder(http::StatusCode::OK, &info)
            .header(http::header::CONTENT_LENGTH, info.size);
        build(builder, ResponseBody::empty())
    }

    async fn put_object(
        &self,
        parts: &http::request::Parts,
        ctx: &RoutingContext,
        body: Bytes,
    ) -> ApiResult<http::Response<ResponseBody>> {
        let bucket = require_bucket(ctx)?;
        let key = require_key(ctx)?;

        let expected_md5 = declared_md5(&parts.headers)?;
        self.validate_content_length(&parts.headers)?;

        let etag = self
            .driver
            .create_object(
                bucket,
                key,
                content_type(&parts.headers),
                expected_md5,
                body,
                user_metadata(&parts.headers),
            )
            .await?;

        let builder = http::Response::builder()
            .status(http::StatusCode::OK)
            .header(http::header::ETAG, quote_etag(&etag))
            .header(http::header::CONTENT_LENGTH, 0);
        build(builder, ResponseBody::empty())
    }

    // -----------------------------------------------------------------------
    // Multipart operations
    // -----------------------------------------------------------------------

    async fn initiate_multipart(
        &self,
        parts: &http::request::Parts,
        ctx: &RoutingContext,
    ) -> ApiResult<http::Response<ResponseBody>> {
        let bucket = require_bucket(ctx)?;
        let key = require_key(ctx)?;

        let upload_id = self.driver.new_multipart_upload(bucket, key).await?;
        let result = InitiateMultipartUploadResult {
            bucket: bucket.to_owned(),
            key: key.to_owned(),
            upload_id,
        };

        let encoding = negotiate_encoding(&parts.headers);
        let document = encode_document(encoding, "InitiateMultipartUploadResult", &result)?;
        Ok(document_response(encoding, document))
    }

    async fn upload_part(
        &self,
        parts: &http::request::Parts,
        ctx: &RoutingContext,
        body: Bytes,
    ) -> ApiResult<http::Response<ResponseBody>> {
        let bucket = require_bucket(ctx)?;
        let key = require_key(ctx)?;
        let upload_id = require_query(ctx, "uploadId")?;

        let expected_md5 = declared_md5(&parts.headers)?;
        self.validate_content_length(&parts.headers)?;

        let part_number: u32 = ctx
            .query_value("partNumber")
            .and_then(|v| v.parse().ok())
            .ok_or_else(|| ApiError::new(ApiErrorCode::InvalidPart))?;

        let etag = self
            .driver
            .create_object_part(bucket, key, upload_id, part_number, expected_md5, body)
            .await?;

        let builder = http::Response::builder()
            .status(http::StatusCode::OK)
            .header(http::header::ETAG, quote_etag(&etag))
            .header(http::header::CONTENT_LENGTH, 0);
        build(builder, ResponseBody::empty())
    }

    async fn complete_multipart(
        &self,
        parts: &http::request::Parts,
        ctx: &RoutingContext,
        body: &Bytes,
    ) -> ApiResult<http::Response<ResponseBody>> {
        let bucket = require_bucket(ctx)?;
        let key = require_key(ctx)?;
        let upload_id = require_query(ctx, "uploadId")?;

        let declared = parse_complete_multipart_upload(body)
            .map_err(|e| ApiError::with_message(ApiErrorCode::MalformedXML, e.to_string()))?;

        // The part list must arrive strictly ascending; a duplicated
        // part number would otherwise be concatenated twice.
        let sorted = declared
            .windows(2)
            .all(|pair| pair[0].part_number < pair[1].part_number);
        if !sorted {
            return Err(ApiError::new(ApiErrorCode::InvalidPartOrder));
        }

        let completed: Vec<CompletedPart> = declared
            .into_iter()
            .map(|p| CompletedPart {
                part_number: p.part_number,
                etag: p.etag,
            })
            .collect();

        let etag = self
            .driver
            .complete_multipart_upload(bucket, key, upload_id, completed)
            .await?;

        let result = CompleteMultipartUploadResult {
            location: format!("/{bucket}/{key}"),
            bucket: bucket.to_owned(),
            key: key.to_owned(),
            etag: quote_etag(&etag),
        };

        let encoding = negotiate_encoding(&parts.headers);
        let document = encode_document(encoding, "CompleteMultipartUploadResult", &result)?;
        Ok(document_response(encoding, document))
    }

    async fn abort_multipart(&self, ctx: &RoutingContext) -> ApiResult<http::Response<ResponseBody>> {
        let bucket = require_bucket(ctx)?;
        let key = require_key(ctx)?;
        let upload_id = require_query(ctx, "uploadId")?;

        self.driver
            .abort_multipart_upload(bucket, key, upload_id)
            .await?;
        Ok(empty_response(http::StatusCode::NO_CONTENT))
    }

    async fn list_parts(
        &self,
        parts: &http::request::Parts,
        ctx: &RoutingContext,
    ) -> ApiResult<http::Response<ResponseBody>> {
        let bucket = require_bucket(ctx)?;
        let key = require_key(ctx)?;
        let upload_id = require_query(ctx, "uploadId")?;

        let marker = parse_numeric_query::<u32>(ctx, "part-number-marker")?.unwrap_or(0);
        let max_parts = parse_numeric_query::<i32>(ctx, "max-parts")?.unwrap_or(0);

        let listing = self
            .driver
            .list_object_parts(bucket, key, upload_id, marker, max_parts)
            .await?;

        let result = ListPartsResult {
            bucket: listing.bucket,
            key: listing.key,
            upload_id: listing.upload_id,
            part_number_marker: listing.part_number_marker,
            next_part_number_marker: listing.next_part_number_marker,
            max_parts: listing.max_parts,
            is_truncated: listing.is_truncated,
            parts: listing
                .parts
                .into_iter()
                .map(|p| PartEntry {
                    part_number: p.part_number,
                    etag: quote_etag(&p.etag),
                    size: p.size,
                    last_modified: format_timestamp(&p.last_modified),
                })
                .collect(),
        };

        let encoding = negotiate_encoding(&parts.headers);
        let document = encode_document(encoding, "ListPartsResult", &result)?;
        Ok(document_response(encoding, document))
    }

    // -----------------------------------------------------------------------
    // Header validation
    // -----------------------------------------------------------------------

    /// Enforce the Content-Length rules for body-bearing requests.
    fn validate_content_length(&self, headers: &http::HeaderMap) -> ApiResult<u64> {
        let value = headers
            .get(http::header::CONTENT_LENGTH)
            .ok_or_else(|| ApiError::new(ApiErrorCode::MissingContentLength))?;
        let size: u64 = value
            .to_str()
            .ok()
            .and_then(|v| v.parse().ok())
            .ok_or_else(|| ApiError::new(ApiErrorCode::InvalidRequest))?;
        if size > self.max_object_size {
            return Err(ApiError::new(ApiErrorCode::EntityTooLarge));
        }
        Ok(size)
    }
}

// ---------------------------------------------------------------------------
// Free helpers
// ---------------------------------------------------------------------------

/// The principal reported as the owner of every bucket.
fn service_owner() -> Owner {
    Owner {
        id: "minio".to_owned(),
        display_name: "minio".to_owned(),
    }
}

fn require_bucket(ctx: &RoutingContext) -> ApiResult<&str> {
    ctx.bucket
        .as_deref()
        .ok_or_else(|| ApiError::new(ApiErrorCode::InvalidRequest))
}

fn require_key(ctx: &RoutingContext) -> ApiResult<&str> {
    ctx.key
        .as_deref()
        .ok_or_else(|| ApiError::new(ApiErrorCode::InvalidRequest))
}

fn require_query<'a>(ctx: &'a RoutingContext, name: &str) -> ApiResult<&'a str> {
    ctx.query_value(name)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| {
            ApiError::with_message(
                ApiErrorCode::InvalidRequest,
                format!("missing query parameter: {name}"),
            )
        })
}

/// Parse an optional numeric query parameter; a present but non-numeric
/// value is `InvalidArgument`.
fn parse_numeric_query<T: std::str::FromStr>(
    ctx: &RoutingContext,
    name: &str,
) -> ApiResult<Option<T>> {
    match ctx.query_value(name) {
        None => Ok(None),
        Some(value) => value.parse::<T>().map(Some).map_err(|_| {
            ApiError::with_message(
                ApiErrorCode::InvalidArgument,
                format!("invalid value for {name}: {value:?}"),
            )
        }),
    }
}

/// Decode and validate a Content-MD5 header, if present.
fn declared_md5(headers: &http::HeaderMap) -> ApiResult<Option<String>> {
    match headers.get("content-md5").and_then(|v| v.to_str().ok()) {
        None => Ok(None),
        Some("") => Ok(None),
        Some(value) => content_md5_to_hex(value)
            .map(Some)
            .ok_or_else(|| ApiError::new(ApiErrorCode::InvalidDigest)),
    }
}

/// Parse the `x-amz-acl` header, defaulting to `private`.
fn parse_acl_header(headers: &http::HeaderMap) -> ApiResult<BucketAcl> {
    match headers.get("x-amz-acl").and_then(|v| v.to_str().ok()) {
        None => Ok(BucketAcl::default()),
        Some(value) => value.parse().map_err(|_| {
            ApiError::with_message(
                ApiErrorCode::InvalidArgument,
                format!("unrecognized acl: {value:?}"),
            )
        }),
    }
}

fn content_type(headers: &http::HeaderMap) -> Option<String> {
    headers
        .get(http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
}

/// Collect `x-amz-meta-*` headers into the user metadata map.
fn user_metadata(headers: &http::HeaderMap) -> BTreeMap<String, String> {
    let mut metadata = BTreeMap::new();
    for (name, value) in headers {
        if let Some(suffix) = name.as_str().strip_prefix("x-amz-meta-") {
            if let Ok(value) = value.to_str() {
                metadata.insert(suffix.to_owned(), value.to_owned());
            }
        }
    }
    metadata
}

/// Start a response builder with the standard object headers.
fn object_header_builder(status: http::StatusCode, info: &ObjectInfo) -> http::response::Builder {
    let mut builder = http::Response::builder()
        .status(status)
        .header(http::header::ETAG, quote_etag(&info.etag))
        .header(
            http::header::CONTENT_TYPE,
            info.content_type
                .as_deref()
                .unwrap_or("application/octet-stream"),
        )
        .header(http::header::LAST_MODIFIED, http_date(&info.last_modified))
        .header(http::header::ACCEPT_RANGES, "bytes");

    for (key, value) in &info.user_metadata {
        if let Ok(hv) = http::HeaderValue::from_str(value) {
            builder = builder.header(format!("x-amz-meta-{key}"), hv);
        }
    }
    builder
}

/// Finish a response, translating builder failures into `InternalError`.
fn build(
    builder: http::response::Builder,
    body: ResponseBody,
) -> ApiResult<http::Response<ResponseBody>> {
    builder.body(body).map_err(|e| {
        ApiError::with_message(
            ApiErrorCode::InternalError,
            format!("failed to build response: {e}"),
        )
    })
}
