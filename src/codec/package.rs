//! OLX element attributes.
//!
//! `url_name` carries the identifier and `display_name` the title. Each
//! element kind also has native attributes (`youtube_id_1_0`, `filename`,
//! ...) that its hooks read and write; those never enter the bag.

use super::{collect_pairs, take_last};
use crate::error::{Warning, WarningKind};
use crate::model::{AttributeBag, Unit};

pub const RESERVED: &[&str] = &["url_name", "display_name"];

/// Whether a key can be written as an XML attribute name.
///
/// Namespaced names are excluded.
pub fn is_xml_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
}

#[derive(Debug, Default)]
pub(crate) struct Decoded {
    pub id: Option<String>,
    pub title: Option<String>,
    pub attributes: AttributeBag,
}

/// Decode element attributes, skipping the element's native attributes.
pub(crate) fn decode(
    attrs: &[(String, String)],
    native: &[&str],
    warnings: &mut Vec<Warning>,
) -> Decoded {
    let mut pairs: Vec<_> = attrs
        .iter()
        .filter(|(key, _)| !native.contains(&key.as_str()))
        .cloned()
        .collect();
    let id = take_last(&mut pairs, "url_name", None, warnings);
    let title = take_last(&mut pairs, "display_name", id.as_deref(), warnings);
    let attributes = collect_pairs(pairs, id.as_deref(), warnings);
    Decoded {
        id,
        title,
        attributes,
    }
}

/// Encode a unit's bag as XML attributes.
///
/// Reserved, native and non-XML keys are dropped with a warning.
pub(crate) fn encode(
    unit: &Unit,
    native: &[&str],
    warnings: &mut Vec<Warning>,
) -> Vec<(String, String)> {
    let mut attrs = Vec::with_capacity(unit.attributes().len());
    for (key, value) in unit.attributes().iter() {
        if RESERVED.contains(&key) || native.contains(&key) || !is_xml_name(key) {
            warnings.push(Warning::new(
                WarningKind::UnsupportedAttribute,
                Some(unit.id()),
                format!("attribute `{key}` cannot be written as an OLX attribute"),
            ));
            continue;
        }
        attrs.push((key.to_string(), value.to_text()));
    }
    attrs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xml_names() {
        assert!(is_xml_name("display_name"));
        assert!(is_xml_name("start-time"));
        assert!(is_xml_name("Data"));
        assert!(!is_xml_name("xml:lang"));
        assert!(!is_xml_name("-x"));
        assert!(!is_xml_name(""));
    }

    #[test]
    fn test_decode_skips_native() {
        let attrs: Vec<(String, String)> = [
            ("url_name", "v1"),
            ("display_name", "Intro"),
            ("youtube_id_1_0", "abc"),
            ("download_video", "true"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        let mut warnings = Vec::new();
        let decoded = decode(&attrs, &["youtube_id_1_0"], &mut warnings);
        assert_eq!(decoded.id.as_deref(), Some("v1"));
        assert_eq!(decoded.title.as_deref(), Some("Intro"));
        let keys: Vec<_> = decoded.attributes.keys().collect();
        assert_eq!(keys, vec!["download_video"]);
        assert!(warnings.is_empty());
    }
}
