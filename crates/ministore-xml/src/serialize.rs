//! XML serialization of the wire response documents.
//!
//! Follows the AWS S3 RestXml conventions: the S3 namespace on the root
//! element, lowercase booleans, ISO 8601 timestamps with milliseconds,
//! and a leading XML declaration.

use std::io::{self, Write};

use quick_xml::events::{BytesText, Event};
use quick_xml::Writer;

use crate::error::XmlError;
use crate::wire::{
    BucketEntry, CommonPrefix, CompleteMultipartUploadResult, InitiateMultipartUploadResult,
    ListAllMyBucketsResult, ListBucketResult, ListPartsResult, ObjectEntry, Owner, PartEntry,
};

/// The S3 XML namespace.
pub const S3_NAMESPACE: &str = "http://s3.amazonaws.com/doc/2006-03-01/";

/// Trait for serializing response types to XML.
///
/// Implementors write their child elements into the current context; the
/// root element and namespace are handled by [`to_xml`].
pub trait S3Serialize {
    /// Serialize this value as XML child elements.
    ///
    /// # Errors
    ///
    /// Returns `io::Error` if writing to the underlying writer fails.
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()>;
}

/// Serialize a value as a complete S3 XML document.
///
/// # Errors
///
/// Returns [`XmlError`] if serialization fails.
pub fn to_xml<T: S3Serialize>(root_element: &str, value: &T) -> Result<Vec<u8>, XmlError> {
    let mut buf = Vec::with_capacity(512);
    let mut writer = Writer::new(&mut buf);

    writer.write_event(Event::Decl(quick_xml::events::BytesDecl::new(
        "1.0",
        Some("UTF-8"),
        None,
    )))?;

    writer
        .create_element(root_element)
        .with_attribute(("xmlns", S3_NAMESPACE))
        .write_inner_content(|w| value.serialize_xml(w))?;

    Ok(buf)
}

/// Format a `DateTime<Utc>` the way S3 does: ISO 8601 with milliseconds
/// and a `Z` suffix.
#[must_use]
pub fn format_timestamp(dt: &chrono::DateTime<chrono::Utc>) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Write a simple `<tag>text</tag>` element.
fn write_text<W: Write>(writer: &mut Writer<W>, tag: &str, text: &str) -> io::Result<()> {
    writer
        .create_element(tag)
        .write_text_content(BytesText::new(text))?;
    Ok(())
}

/// Write `<tag>true|false</tag>`.
fn write_bool<W: Write>(writer: &mut Writer<W>, tag: &str, value: bool) -> io::Result<()> {
    write_text(writer, tag, if value { "true" } else { "false" })
}

// ---------------------------------------------------------------------------
// Implementations
// ---------------------------------------------------------------------------

impl S3Serialize for Owner {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        writer.create_element("Owner").write_inner_content(|w| {
            write_text(w, "ID", &self.id)?;
            write_text(w, "DisplayName", &self.display_name)?;
            Ok(())
        })?;
        Ok(())
    }
}

impl S3Serialize for BucketEntry {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        writer.create_element("Bucket").write_inner_content(|w| {
            write_text(w, "Name", &self.name)?;
            write_text(w, "CreationDate", &self.creation_date)?;
            Ok(())
        })?;
        Ok(())
    }
}

impl S3Serialize for ListAllMyBucketsResult {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        self.owner.serialize_xml(writer)?;
        writer.create_element("Buckets").write_inner_content(|w| {
            for bucket in &self.buckets {
                bucket.serialize_xml(w)?;
            }
            Ok(())
        })?;
        Ok(())
    }
}

impl S3Serialize for ObjectEntry {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        writer.create_element("Contents").write_inner_content(|w| {
            write_text(w, "Key", &self.key)?;
            write_text(w, "LastModified", &self.last_modified)?;
            write_text(w, "ETag", &self.etag)?;
            write_text(w, "Size", &self.size.to_string())?;
            write_text(w, "StorageClass", &self.storage_class)?;
            Ok(())
        })?;
        Ok(())
    }
}

impl S3Serialize for CommonPrefix {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        writer
            .create_element("CommonPrefixes")
            .write_inner_content(|w| write_text(w, "Prefix", &self.prefix))?;
        Ok(())
    }
}

impl S3Serialize for ListBucketResult {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        write_text(writer, "Name", &self.name)?;
        write_text(writer, "Prefix", &self.prefix)?;
        write_text(writer, "Marker", &self.marker)?;
        if !self.delimiter.is_empty() {
            write_text(writer, "Delimiter", &self.delimiter)?;
        }
        write_text(writer, "MaxKeys", &self.max_keys.to_string())?;
        write_bool(writer, "IsTruncated", self.is_truncated)?;
        for entry in &self.contents {
            entry.serialize_xml(writer)?;
        }
        for prefix in &self.common_prefixes {
            prefix.serialize_xml(writer)?;
        }
        Ok(())
    }
}

impl S3Serialize for InitiateMultipartUploadResult {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        write_text(writer, "Bucket", &self.bucket)?;
        write_text(writer, "Key", &self.key)?;
        write_text(writer, "UploadId", &self.upload_id)?;
        Ok(())
    }
}

impl S3Serialize for PartEntry {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        writer.create_element("Part").write_inner_content(|w| {
            write_text(w, "PartNumber", &self.part_number.to_string())?;
            write_text(w, "ETag", &self.etag)?;
            write_text(w, "Size", &self.size.to_string())?;
            write_text(w, "LastModified", &self.last_modified)?;
            Ok(())
        })?;
        Ok(())
    }
}

impl S3Serialize for ListPartsResult {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        write_text(writer, "Bucket", &self.bucket)?;
        write_text(writer, "Key", &self.key)?;
        write_text(writer, "UploadId", &self.upload_id)?;
        write_text(
            writer,
            "PartNumberMarker",
            &self.part_number_marker.to_string(),
        )?;
        write_text(
            writer,
            "NextPartNumberMarker",
            &self.next_part_number_marker.to_string(),
        )?;
        write_text(writer, "MaxParts", &self.max_parts.to_string())?;
        write_bool(writer, "IsTruncated", self.is_truncated)?;
        for part in &self.parts {
            part.serialize_xml(writer)?;
        }
        Ok(())
    }
}

impl S3Serialize for CompleteMultipartUploadResult {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        write_text(writer, "Location", &self.location)?;
        write_text(writer, "Bucket", &self.bucket)?;
        write_text(writer, "Key", &self.key)?;
        write_text(writer, "ETag", &self.etag)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
