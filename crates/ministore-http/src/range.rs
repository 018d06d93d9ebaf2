//! HTTP `Range` header parsing.
//!
//! Only the `bytes=` form is recognized, in three grammars:
//!
//! | Header | Meaning |
//! |--------|---------|
//! | `bytes=S-E` | start `S`, length `E - S + 1` |
//! | `bytes=S-` | start `S`, through the end of the object |
//! | `bytes=-N` | the final `N` bytes |
//!
//! An absent header yields the whole-object sentinel `(0, 0)`. Anything
//! malformed or outside `[0, size)` is `InvalidRange`.

use crate::error::{ApiError, ApiErrorCode};

/// A resolved byte range against a known object size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpRange {
    /// First byte offset.
    pub start: u64,
    /// Number of bytes to read. Zero together with `start == 0` means
    /// the whole object.
    pub length: u64,
}

impl HttpRange {
    /// Whether this is the whole-object sentinel.
    #[must_use]
    pub fn is_whole(&self) -> bool {
        self.start == 0 && self.length == 0
    }

    /// The inclusive last byte offset of this range.
    #[must_use]
    pub fn end(&self) -> u64 {
        self.start + self.length - 1
    }
}

/// Parse an optional `Range` header value against an object of `size`
/// bytes.
///
/// # Errors
///
/// Returns `InvalidRange` when the header is present but malformed or
/// unsatisfiable.
pub fn parse_range(header: Option<&str>, size: u64) -> Result<HttpRange, ApiError> {
    let Some(header) = header else {
        return Ok(HttpRange {
            start: 0,
            length: 0,
        });
    };

    let spec = header
        .strip_prefix("bytes=")
        .ok_or_else(invalid_range)?
        .trim();

    // Reject multi-range requests outright.
    if spec.contains(',') {
        return Err(invalid_range());
    }

    let (start_text, end_text) = spec.split_once('-').ok_or_else(invalid_range)?;

    let range = match (start_text.is_empty(), end_text.is_empty()) {
        // bytes=-N : the final N bytes.
        (true, false) => {
            let n: u64 = parse_number(end_text)?;
            if n == 0 || n > size {
                return Err(invalid_range());
            }
            HttpRange {
                start: size - n,
                length: n,
            }
        }
        // bytes=S- : from S through the end.
        (false, true) => {
            let start: u64 = parse_number(start_text)?;
            if start >= size {
                return Err(invalid_range());
            }
            HttpRange {
                start,
                length: size - start,
            }
        }
        // bytes=S-E : an explicit window.
        (false, false) => {
            let start: u64 = parse_number(start_text)?;
            let end: u64 = parse_number(end_text)?;
            let length = end
                .checked_sub(start)
                .and_then(|d| d.checked_add(1))
                .ok_or_else(invalid_range)?;
            if start >= size || start.checked_add(length).ok_or_else(invalid_range)? > size {
                return Err(invalid_range());
            }
            HttpRange { start, length }
        }
        (true, true) => return Err(invalid_range()),
    };

    Ok(range)
}

fn parse_number(text: &str) -> Result<u64, ApiError> {
    text.parse::<u64>().map_err(|_| invalid_range())
}

fn invalid_range() -> ApiError {
    ApiError::new(ApiErrorCode::InvalidRange)
}
