//! Parsing of the `CompleteMultipartUpload` request body.
//!
//! The only XML body the protocol accepts from clients:
//!
//! ```xml
//! <CompleteMultipartUpload>
//!   <Part><PartNumber>1</PartNumber><ETag>"abc"</ETag></Part>
//!   <Part><PartNumber>2</PartNumber><ETag>"def"</ETag></Part>
//! </CompleteMultipartUpload>
//! ```
//!
//! The parts come back in document order; whether that order is
//! ascending is for the caller to judge.

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::XmlError;
use crate::wire::CompleteRequestPart;

/// Parse a `CompleteMultipartUpload` request body.
///
/// # Errors
///
/// Returns [`XmlError`] when the document is not well-formed, a part
/// lacks `PartNumber` or `ETag`, or a part number is not a positive
/// integer.
pub fn parse_complete_multipart_upload(body: &[u8]) -> Result<Vec<CompleteRequestPart>, XmlError> {
    let mut reader = Reader::from_reader(body);
    reader.config_mut().trim_text(true);

    let mut parts = Vec::new();
    let mut found_root = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = element_name(&e)?;
                match name.as_str() {
                    "CompleteMultipartUpload" => found_root = true,
                    "Part" if found_root => parts.push(parse_part(&mut reader)?),
                    _ => skip_element(&mut reader)?,
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !found_root {
        return Err(XmlError::MissingElement(
            "CompleteMultipartUpload".to_owned(),
        ));
    }
    Ok(parts)
}

fn parse_part(reader: &mut Reader<&[u8]>) -> Result<CompleteRequestPart, XmlError> {
    let mut part_number: Option<u32> = None;
    let mut etag: Option<String> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = element_name(&e)?;
                match name.as_str() {
                    "PartNumber" => {
                        let text = read_text(reader)?;
                        let number = text.parse::<u32>().map_err(|e| {
                            XmlError::ParseError(format!("invalid part number {text:?}: {e}"))
                        })?;
                        if number == 0 {
                            return Err(XmlError::ParseError(
                                "part number must be positive".to_owned(),
                            ));
                        }
                        part_number = Some(number);
                    }
                    "ETag" => etag = Some(read_text(reader)?),
                    _ => skip_element(reader)?,
                }
            }
            Event::End(_) => break,
            Event::Eof => {
                return Err(XmlError::ParseError("unexpected EOF in Part".to_owned()));
            }
            _ => {}
        }
    }

    Ok(CompleteRequestPart {
        part_number: part_number.ok_or_else(|| XmlError::MissingElement("PartNumber".to_owned()))?,
        etag: etag.ok_or_else(|| XmlError::MissingElement("ETag".to_owned()))?,
    })
}

/// Decode the local name of an element start tag.
fn element_name(e: &quick_xml::events::BytesStart<'_>) -> Result<String, XmlError> {
    std::str::from_utf8(e.name().as_ref())
        .map(str::to_owned)
        .map_err(|err| XmlError::ParseError(err.to_string()))
}

/// Read the text content of the current element through its end tag.
fn read_text(reader: &mut Reader<&[u8]>) -> Result<String, XmlError> {
    let mut text = String::new();
    loop {
        match reader.read_event()? {
            Event::Text(e) => {
                let unescaped = e
                    .unescape()
                    .map_err(|err| XmlError::ParseError(err.to_string()))?;
                text.push_str(&unescaped);
            }
            Event::End(_) => return Ok(text),
            Event::Eof => {
                return Err(XmlError::ParseError(
                    "unexpected EOF while reading text".to_owned(),
                ));
            }
            _ => {}
        }
    }
}

/// Skip over an element and all its children.
fn skip_element(reader: &mut Reader<&[u8]>) -> Result<(), XmlError> {
    let mut depth: u32 = 1;
    loop {
        match reader.read_event()? {
            Event::Start(_) => depth += 1,
            Event::End(_) => {
                depth -= 1;
                if depth == 0 {
                    return Ok(());
                }
            }
            Event::Eof => {
                return Err(XmlError::ParseError(
                    "unexpected EOF while skipping element".to_owned(),
                ));
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_parse_parts_in_document_order() {
        let body = br#"<?xml version="1.0" encoding="UTF-8"?>
<CompleteMultipartUpload>
  <Part><PartNumber>2</PartNumber><ETag>"bbb"</ETag></Part>
  <Part><PartNumber>1</PartNumber><ETag>"aaa"</ETag></Part>
</CompleteMultipartUpload>"#;

        let parts = parse_complete_multipart_upload(body).expect("parse");
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].part_number, 2);
        assert_eq!(parts[0].etag, "\"bbb\"");
        assert_eq!(parts[1].part_number, 1);
    }

    #[test]
    fn test_should_reject_missing_root() {
        let body = br"<SomethingElse></SomethingElse>";
        assert!(matches!(
            parse_complete_multipart_upload(body),
            Err(XmlError::MissingElement(_))
        ));
    }

    #[test]
    fn test_should_reject_part_without_etag() {
        let body = br"<CompleteMultipartUpload><Part><PartNumber>1</PartNumber></Part></CompleteMultipartUpload>";
        assert!(matches!(
            parse_complete_multipart_upload(body),
            Err(XmlError::MissingElement(_))
        ));
    }

    #[test]
    fn test_should_reject_zero_part_number() {
        let body = br#"<CompleteMultipartUpload><Part><PartNumber>0</PartNumber><ETag>"a"</ETag></Part></CompleteMultipartUpload>"#;
        assert!(matches!(
            parse_complete_multipart_upload(body),
            Err(XmlError::ParseError(_))
        ));
    }

    #[test]
    fn test_should_reject_non_numeric_part_number() {
        let body = br#"<CompleteMultipartUpload><Part><PartNumber>one</PartNumber><ETag>"a"</ETag></Part></CompleteMultipartUpload>"#;
        assert!(matches!(
            parse_complete_multipart_upload(body),
            Err(XmlError::ParseError(_))
        ));
    }

    #[test]
    fn test_should_accept_empty_part_list() {
        let body = br"<CompleteMultipartUpload></CompleteMultipartUpload>";
        let parts = parse_complete_multipart_upload(body).expect("parse");
        assert!(parts.is_empty());
    }

    #[test]
    fn test_should_skip_unknown_elements() {
        let body = br#"<CompleteMultipartUpload>
  <Comment>ignored</Comment>
  <Part><PartNumber>1</PartNumber><ETag>"a"</ETag><Extra>x</Extra></Part>
</CompleteMultipartUpload>"#;
        let parts = parse_complete_multipart_upload(body).expect("parse");
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].part_number, 1);
    }
}
