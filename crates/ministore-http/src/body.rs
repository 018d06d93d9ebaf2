//! Response body type supporting buffered and empty modes.

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use http_body_util::Full;

/// Response body for the S3 front-end.
///
/// Implements [`http_body::Body`] so it plugs directly into hyper
/// responses. Payload bodies and XML documents are buffered; HEAD and
/// 204 responses are empty.
#[derive(Debug, Default)]
pub enum ResponseBody {
    /// Buffered body: object payloads, XML and JSON documents.
    Buffered(Full<Bytes>),
    /// Empty body for HEAD responses and 204s.
    #[default]
    Empty,
}

impl ResponseBody {
    /// Create a buffered body from bytes.
    #[must_use]
    pub fn from_bytes(data: impl Into<Bytes>) -> Self {
        Self::Buffered(Full::new(data.into()))
    }

    /// Create an empty body.
    #[must_use]
    pub fn empty() -> Self {
        Self::Empty
    }

    /// The exact body length in bytes.
    #[must_use]
    pub fn len(&self) -> u64 {
        match self {
            Self::Buffered(full) => full.size_hint().exact().unwrap_or(0),
            Self::Empty => 0,
        }
    }

    /// Whether the body carries no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl http_body::Body for ResponseBody {
    type Data = Bytes;
    type Error = std::io::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<http_body::Frame<Self::Data>, Self::Error>>> {
        match self.get_mut() {
            Self::Buffered(full) => Pin::new(full)
                .poll_frame(cx)
                .map_err(|never| match never {}),
            Self::Empty => Poll::Ready(None),
        }
    }

    fn is_end_stream(&self) -> bool {
        match self {
            Self::Buffered(full) => full.is_end_stream(),
            Self::Empty => true,
        }
    }

    fn size_hint(&self) -> http_body::SizeHint {
        match self {
            Self::Buffered(full) => full.size_hint(),
            Self::Empty => http_body::SizeHint::with_exact(0),
        }
    }
}

// Needed by len(): Full's size hint comes from the Body trait.
use http_body::Body as _;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_report_empty_body() {
        let body = ResponseBody::empty();
        assert!(body.is_end_stream());
        assert!(body.is_empty());
        assert_eq!(body.len(), 0);
    }

    #[test]
    fn test_should_report_buffered_length() {
        let body = ResponseBody::from_bytes(Bytes::from("hello"));
        assert!(!body.is_end_stream());
        assert_eq!(body.len(), 5);
    }
}
