//! The hyper-facing service.
//!
//! [`S3Service`] implements hyper's `Service` trait: it collects the
//! request body, hands the request to the [`ApiHandler`], and never
//! fails the connection itself — every failure becomes an S3 error
//! response. A client that disconnects mid-upload is logged and
//! dropped; nothing is indexed for an abandoned body.

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper::service::Service;
use tracing::warn;

use crate::body::ResponseBody;
use crate::error::{ApiError, ApiErrorCode};
use crate::handlers::ApiHandler;
use crate::response::error_to_response;

/// Hyper service wrapping an [`ApiHandler`].
pub struct S3Service {
    handler: Arc<ApiHandler>,
}

impl S3Service {
    /// Wrap a handler.
    #[must_use]
    pub fn new(handler: ApiHandler) -> Self {
        Self {
            handler: Arc::new(handler),
        }
    }
}

impl Clone for S3Service {
    fn clone(&self) -> Self {
        Self {
            handler: Arc::clone(&self.handler),
        }
    }
}

impl Service<http::Request<Incoming>> for S3Service {
    type Response = http::Response<ResponseBody>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: http::Request<Incoming>) -> Self::Future {
        let handler = Arc::clone(&self.handler);

        Box::pin(async move {
            let (parts, incoming) = req.into_parts();

            let body = match incoming.collect().await {
                Ok(collected) => collected.to_bytes(),
                Err(e) => {
                    // The client went away mid-body; the partial payload
                    // is discarded without touching any index.
                    warn!(error = %e, uri = %parts.uri, "abandoned request body");
                    let err = ApiError::new(ApiErrorCode::InternalError);
                    return Ok(error_to_response(&err, "aborted"));
                }
            };

            Ok(handler.handle(parts, body).await)
        })
    }
}
