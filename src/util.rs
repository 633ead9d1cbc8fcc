//! Text helpers shared by the readers and the course model.

use std::borrow::Cow;

use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};
use quick_xml::events::Event;
use tracing::debug;

use crate::error::{Error, Result};
use crate::format::Format;

/// Decode a course file.
///
/// A byte order mark wins, then the declared encoding, which must be known
/// and must decode cleanly. Undeclared text is UTF-8, falling back to
/// Windows-1252 for hand-edited files.
pub fn decode_text<'a>(
    bytes: &'a [u8],
    format: Format,
    declared: Option<&str>,
) -> Result<Cow<'a, str>> {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        return strict(encoding, &bytes[bom_len..], format);
    }

    if let Some(label) = declared {
        let encoding = Encoding::for_label(label.trim().as_bytes()).ok_or_else(|| {
            Error::format(format, format!("unknown encoding `{label}`"))
        })?;
        return strict(encoding, bytes, format);
    }

    match UTF_8.decode_without_bom_handling_and_without_replacement(bytes) {
        Some(text) => Ok(text),
        None => {
            debug!(%format, "input is not UTF-8, reading it as Windows-1252");
            let (text, _) = WINDOWS_1252.decode_without_bom_handling(bytes);
            Ok(text)
        }
    }
}

fn strict<'a>(
    encoding: &'static Encoding,
    bytes: &'a [u8],
    format: Format,
) -> Result<Cow<'a, str>> {
    encoding
        .decode_without_bom_handling_and_without_replacement(bytes)
        .ok_or_else(|| Error::format(format, format!("input is not valid {}", encoding.name())))
}

/// The encoding named by an XML declaration, if the document starts with one.
pub fn xml_declared_encoding(bytes: &[u8]) -> Option<String> {
    let mut reader = quick_xml::Reader::from_reader(bytes);
    match reader.read_event() {
        Ok(Event::Decl(decl)) => {
            let label = decl.encoding()?.ok()?;
            Some(String::from_utf8_lossy(&label).into_owned())
        }
        _ => None,
    }
}

/// Decode an OLX file, honouring its XML declaration.
pub fn decode_xml(bytes: &[u8]) -> Result<Cow<'_, str>> {
    let declared = xml_declared_encoding(bytes);
    decode_text(bytes, Format::Olx, declared.as_deref())
}

/// Generate a slug from text.
///
/// Converts text to lowercase, replaces spaces and separators with hyphens,
/// drops other characters, and removes consecutive/leading/trailing hyphens.
pub fn slugify(text: &str) -> String {
    text.chars()
        .filter_map(|c| {
            if c.is_ascii_alphanumeric() {
                Some(c.to_ascii_lowercase())
            } else if c.is_whitespace() || c == '-' || c == '_' {
                Some('-')
            } else {
                None
            }
        })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_utf8_with_bom() {
        let bytes = b"\xEF\xBB\xBFHello";
        assert_eq!(decode_text(bytes, Format::Markdown, None).unwrap(), "Hello");
    }

    #[test]
    fn test_undeclared_text_falls_back_to_windows_1252() {
        // 0xE9 is 'é' in Windows-1252 and invalid as UTF-8
        let bytes = b"caf\xE9";
        assert_eq!(decode_text(bytes, Format::Markdown, None).unwrap(), "café");
    }

    #[test]
    fn test_declared_encoding_is_honoured() {
        let bytes = b"<?xml version=\"1.0\" encoding=\"ISO-8859-15\"?><a>\xA4</a>";
        assert_eq!(xml_declared_encoding(bytes).as_deref(), Some("ISO-8859-15"));
        assert!(decode_xml(bytes).unwrap().contains('€'));
    }

    #[test]
    fn test_unknown_encoding_is_an_error() {
        let bytes = b"<?xml version=\"1.0\" encoding=\"klingon\"?><course/>";
        let err = decode_xml(bytes).unwrap_err();
        assert!(matches!(
            err,
            Error::Format { format: Format::Olx, ref message } if message.contains("klingon")
        ));
    }

    #[test]
    fn test_declared_utf8_must_be_valid() {
        let bytes = b"<?xml version=\"1.0\" encoding=\"UTF-8\"?><a>caf\xE9</a>";
        assert!(matches!(decode_xml(bytes), Err(Error::Format { .. })));
    }

    #[test]
    fn test_no_declaration() {
        assert_eq!(xml_declared_encoding(b"<course/>"), None);
        assert_eq!(xml_declared_encoding(b"<?xml version=\"1.0\"?><course/>"), None);
    }

    #[test]
    fn test_slugify_simple() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("Unit 1"), "unit-1");
    }

    #[test]
    fn test_slugify_with_punctuation() {
        assert_eq!(slugify("Hello, World!"), "hello-world");
    }

    #[test]
    fn test_slugify_separators() {
        assert_eq!(slugify("  Multiple   Spaces  "), "multiple-spaces");
        assert_eq!(slugify("hello_world"), "hello-world");
        assert_eq!(slugify("-hello--world-"), "hello-world");
    }

    #[test]
    fn test_slugify_empty() {
        assert_eq!(slugify(""), "");
        assert_eq!(slugify("!!!"), "");
        assert_eq!(slugify("Été"), "t");
    }
}
