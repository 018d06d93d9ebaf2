//! Response construction: content negotiation, common headers, and the
//! error document.
//!
//! List and multipart responses are encoded as XML by default; a client
//! sending `Accept: application/json` gets the same structure as JSON.
//! Every response carries `Server: Minio` and a request identifier.

use bytes::Bytes;
use ministore_xml::{to_xml, S3Serialize};
use serde::Serialize;

use crate::body::ResponseBody;
use crate::error::{ApiError, ApiErrorCode};

/// The response encodings a client can select via `Accept`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseEncoding {
    /// `application/xml` (default).
    Xml,
    /// `application/json`.
    Json,
}

impl ResponseEncoding {
    /// The Content-Type this encoding is served with.
    #[must_use]
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Xml => "application/xml",
            Self::Json => "application/json",
        }
    }
}

/// Select the response encoding from the request's `Accept` header.
#[must_use]
pub fn negotiate_encoding(headers: &http::HeaderMap) -> ResponseEncoding {
    let accepts_json = headers
        .get(http::header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("application/json"));
    if accepts_json {
        ResponseEncoding::Json
    } else {
        ResponseEncoding::Xml
    }
}

/// Encode a response document in the negotiated encoding.
///
/// # Errors
///
/// Returns `InternalError` if encoding fails.
pub fn encode_document<T>(
    encoding: ResponseEncoding,
    root_element: &str,
    value: &T,
) -> Result<Vec<u8>, ApiError>
where
    T: S3Serialize + Serialize,
{
    match encoding {
        ResponseEncoding::Xml => to_xml(root_element, value).map_err(|e| {
            ApiError::with_message(
                ApiErrorCode::InternalError,
                format!("failed to encode response: {e}"),
            )
        }),
        ResponseEncoding::Json => serde_json::to_vec(value).map_err(|e| {
            ApiError::with_message(
                ApiErrorCode::InternalError,
                format!("failed to encode response: {e}"),
            )
        }),
    }
}

/// Build a success response carrying an encoded document.
#[must_use]
pub fn document_response(
    encoding: ResponseEncoding,
    document: Vec<u8>,
) -> http::Response<ResponseBody> {
    let len = document.len();
    http::Response::builder()
        .status(http::StatusCode::OK)
        .header(http::header::CONTENT_TYPE, encoding.content_type())
        .header(http::header::CONTENT_LENGTH, len)
        .body(ResponseBody::from_bytes(document))
        .unwrap_or_else(|_| fallback_response())
}

/// Build an empty success response with the given status.
#[must_use]
pub fn empty_response(status: http::StatusCode) -> http::Response<ResponseBody> {
    http::Response::builder()
        .status(status)
        .header(http::header::CONTENT_LENGTH, 0)
        .body(ResponseBody::empty())
        .unwrap_or_else(|_| fallback_response())
}

/// Render an [`ApiError`] as an S3 `<Error>` response.
#[must_use]
pub fn error_to_response(err: &ApiError, request_id: &str) -> http::Response<ResponseBody> {
    let xml = ministore_xml::error_to_xml(
        err.code.as_str(),
        &err.message,
        err.resource.as_deref(),
        request_id,
    );
    let len = xml.len();

    http::Response::builder()
        .status(err.code.status_code())
        .header(http::header::CONTENT_TYPE, "application/xml")
        .header(http::header::CONTENT_LENGTH, len)
        .body(ResponseBody::from_bytes(Bytes::from(xml)))
        .unwrap_or_else(|_| fallback_response())
}

/// Add the headers every response carries.
pub fn add_common_headers(
    response: &mut http::Response<ResponseBody>,
    request_id: &str,
) {
    let headers = response.headers_mut();
    headers.insert(http::header::SERVER, http::HeaderValue::from_static("Minio"));
    if let Ok(hv) = http::HeaderValue::from_str(request_id) {
        headers.insert("x-amz-request-id", hv);
    }
    let date = chrono::Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string();
    if let Ok(hv) = http::HeaderValue::from_str(&date) {
        headers.insert(http::header::DATE, hv);
    }
}

/// Format a timestamp as an HTTP date for `Last-Modified`.
#[must_use]
pub fn http_date(dt: &chrono::DateTime<chrono::Utc>) -> String {
    dt.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Last-resort response when a builder fails; cannot happen with the
/// static inputs used above.
fn fallback_response() -> http::Response<ResponseBody> {
    let mut response = http::Response::new(ResponseBody::empty());
    *response.status_mut() = http::StatusCode::INTERNAL_SERVER_ERROR;
    response
}
