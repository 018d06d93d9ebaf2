//! Content-hash computation for objects and multipart uploads.
//!
//! Objects are identified on the wire by their ETag: the hex-encoded MD5
//! of the complete byte sequence. Multipart objects use the composite
//! scheme `hex(md5(concat(raw part digests))) + "-" + part_count`.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use digest::Digest;

/// Compute the hex-encoded MD5 digest of `data`.
///
/// # Examples
///
/// ```
/// use ministore_core::digest::md5_hex;
///
/// assert_eq!(md5_hex(b"hello"), "5d41402abc4b2a76b9719d911017c592");
/// ```
#[must_use]
pub fn md5_hex(data: &[u8]) -> String {
    hex::encode(md5::Md5::digest(data))
}

/// Quote a hex digest for use in an `ETag` header or XML element.
#[must_use]
pub fn quote_etag(etag: &str) -> String {
    format!("\"{etag}\"")
}

/// Strip surrounding double quotes from an ETag, if present.
#[must_use]
pub fn trim_etag(etag: &str) -> &str {
    etag.trim_matches('"')
}

/// Compute the composite ETag for a multipart object.
///
/// Each entry of `part_etags` is the unquoted hex MD5 of one part, in
/// part-number order. The result is the hex MD5 of the concatenated raw
/// digest bytes, suffixed with `-<part_count>`.
///
/// # Examples
///
/// ```
/// use ministore_core::digest::{md5_hex, multipart_etag};
///
/// let parts = vec![md5_hex(b"hello "), md5_hex(b"world")];
/// let etag = multipart_etag(&parts);
/// assert!(etag.ends_with("-2"));
/// ```
#[must_use]
pub fn multipart_etag(part_etags: &[String]) -> String {
    let mut concatenated = Vec::with_capacity(part_etags.len() * 16);
    for etag in part_etags {
        // Non-hex input degrades to hashing nothing for that part; the
        // driver only ever feeds digests it computed itself.
        if let Ok(raw) = hex::decode(etag) {
            concatenated.extend_from_slice(&raw);
        }
    }
    format!("{}-{}", md5_hex(&concatenated), part_etags.len())
}

/// Decode a `Content-MD5` header value into an unquoted hex digest.
///
/// The header carries the standard base64 encoding of the 16 raw MD5
/// bytes. Returns `None` when the value is not valid base64 or does not
/// decode to exactly 16 bytes.
#[must_use]
pub fn content_md5_to_hex(header: &str) -> Option<String> {
    let raw = BASE64_STANDARD.decode(header.trim()).ok()?;
    if raw.len() != 16 {
        return None;
    }
    Some(hex::encode(raw))
}
