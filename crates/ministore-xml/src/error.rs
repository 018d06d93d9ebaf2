//! XML codec errors and the S3 `<Error>` document.

use std::io;

use quick_xml::events::{BytesDecl, BytesText, Event};
use quick_xml::Writer;

/// Errors that can occur while reading or writing S3 XML.
#[derive(Debug, thiserror::Error)]
pub enum XmlError {
    /// An I/O error during XML writing.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// An error from the underlying quick-xml library.
    #[error("XML processing error: {0}")]
    QuickXml(#[from] quick_xml::Error),

    /// A required XML element was missing.
    #[error("missing required XML element: {0}")]
    MissingElement(String),

    /// An error parsing a value from XML text content.
    #[error("failed to parse value: {0}")]
    ParseError(String),
}

/// Format an S3 error response as a flat `<Error>` document.
///
/// # Example output
///
/// ```xml
/// <?xml version="1.0" encoding="UTF-8"?>
/// <Error>
///   <Code>NoSuchBucket</Code>
///   <Message>The specified bucket does not exist</Message>
///   <Resource>/mybucket</Resource>
///   <RequestId>9f2a...</RequestId>
/// </Error>
/// ```
#[must_use]
pub fn error_to_xml(code: &str, message: &str, resource: Option<&str>, request_id: &str) -> Vec<u8> {
    let mut buf = Vec::with_capacity(256);
    if let Err(e) = write_error_xml(&mut buf, code, message, resource, request_id) {
        // Writing into a Vec cannot fail for I/O reasons; treat any
        // failure as a codec bug and fall back to an empty body.
        tracing::error!(error = %e, "failed to serialize error XML");
        buf.clear();
    }
    buf
}

fn write_error_xml(
    buf: &mut Vec<u8>,
    code: &str,
    message: &str,
    resource: Option<&str>,
    request_id: &str,
) -> io::Result<()> {
    let mut writer = Writer::new(buf);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    writer.create_element("Error").write_inner_content(|w| {
        w.create_element("Code")
            .write_text_content(BytesText::new(code))?;
        w.create_element("Message")
            .write_text_content(BytesText::new(message))?;
        if let Some(resource) = resource {
            w.create_element("Resource")
                .write_text_content(BytesText::new(resource))?;
        }
        w.create_element("RequestId")
            .write_text_content(BytesText::new(request_id))?;
        Ok(())
    })?;

    Ok(())
}
