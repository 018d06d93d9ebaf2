//! S3 wire-format codec.
//!
//! Response documents are written with `quick-xml` through the
//! [`serialize::S3Serialize`] trait; the one XML request body the
//! protocol accepts (`CompleteMultipartUpload`) is parsed in
//! [`deserialize`]. The wire structs in [`wire`] also derive
//! `serde::Serialize`, which is how the JSON response encoding
//! (selected via `Accept: application/json`) falls out for free.

pub mod deserialize;
pub mod error;
pub mod serialize;
pub mod wire;

pub use deserialize::parse_complete_multipart_upload;
pub use error::{error_to_xml, XmlError};
pub use serialize::{format_timestamp, to_xml, S3Serialize};
