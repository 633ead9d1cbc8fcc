//! HTML element attributes.
//!
//! `id`, `data-kind` and `title` are reserved. Every other bag key is written
//! as one attribute, provided it is a valid lowercase attribute name.

use std::fmt::Write as _;

use super::{collect_pairs, escape_attr, take_last};
use crate::error::{Warning, WarningKind};
use crate::model::{AttributeBag, Unit};

/// Attribute names with a fixed meaning.
pub const RESERVED: &[&str] = &["id", "data-kind", "title"];

/// Kind marker attribute.
pub const MARKER: &str = "data-kind";

/// Whether a key can be written as an HTML attribute: `[a-z_:][a-z0-9_:.-]*`.
pub fn is_attr_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_lowercase() || c == '_' || c == ':')
        && chars.all(|c| {
            c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '_' | ':' | '.' | '-')
        })
}

/// Attributes of a unit element split into reserved values and the bag.
#[derive(Debug, Default)]
pub(crate) struct Decoded {
    pub id: Option<String>,
    pub marker: Option<String>,
    pub title: Option<String>,
    pub attributes: AttributeBag,
}

/// Decode the attributes of a unit element.
pub(crate) fn decode(attrs: &[(String, String)], warnings: &mut Vec<Warning>) -> Decoded {
    let mut pairs = attrs.to_vec();
    let id = take_last(&mut pairs, "id", None, warnings);
    let unit = id.as_deref();
    let marker = take_last(&mut pairs, MARKER, unit, warnings);
    let title = take_last(&mut pairs, "title", unit, warnings);
    let attributes = collect_pairs(pairs, unit, warnings);
    Decoded {
        id,
        marker,
        title,
        attributes,
    }
}

/// Encode a unit's attribute bag, dropping keys HTML cannot carry.
pub(crate) fn encode(unit: &Unit, warnings: &mut Vec<Warning>) -> Vec<(String, String)> {
    let mut attrs = Vec::with_capacity(unit.attributes().len());
    for (key, value) in unit.attributes().iter() {
        if RESERVED.contains(&key) || !is_attr_name(key) {
            warnings.push(Warning::new(
                WarningKind::UnsupportedAttribute,
                Some(unit.id()),
                format!("attribute `{key}` cannot be written as an HTML attribute"),
            ));
            continue;
        }
        attrs.push((key.to_string(), value.to_text()));
    }
    attrs
}

/// Write ` key="value"` for each attribute.
pub(crate) fn write_attrs(out: &mut String, attrs: &[(String, String)]) {
    for (key, value) in attrs {
        let _ = write!(out, " {key}=\"{}\"", escape_attr(value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AttrValue, Payload, Registry};

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_attr_names() {
        assert!(is_attr_name("data-level"));
        assert!(is_attr_name("xml:lang"));
        assert!(is_attr_name("_x.y"));
        assert!(!is_attr_name("Data"));
        assert!(!is_attr_name("1st"));
        assert!(!is_attr_name("has space"));
        assert!(!is_attr_name(""));
    }

    #[test]
    fn test_decode_splits_reserved() {
        let mut warnings = Vec::new();
        let decoded = decode(
            &pairs(&[
                ("data-kind", "video"),
                ("id", "v1"),
                ("title", "Intro"),
                ("data-level", "1"),
                ("data-level", "2"),
            ]),
            &mut warnings,
        );
        assert_eq!(decoded.id.as_deref(), Some("v1"));
        assert_eq!(decoded.marker.as_deref(), Some("video"));
        assert_eq!(decoded.title.as_deref(), Some("Intro"));
        assert_eq!(decoded.attributes.get_text("data-level").as_deref(), Some("2"));
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].kind, WarningKind::DuplicateAttribute);
        assert_eq!(warnings[0].unit.as_deref(), Some("v1"));
    }

    #[test]
    fn test_encode_drops_unrepresentable() {
        let registry = Registry::standard();
        let attributes = AttributeBag::new()
            .with("class", AttrValue::List(vec!["a".into(), "b".into()]))
            .with("Weird Key", "x")
            .with("id", "clash");
        let unit = Unit::leaf(
            &registry,
            Some("u1".into()),
            "",
            attributes,
            Payload::raw_html("<p>x</p>"),
        )
        .unwrap();
        let mut warnings = Vec::new();
        let attrs = encode(&unit, &mut warnings);
        assert_eq!(attrs, pairs(&[("class", "a b")]));
        assert_eq!(warnings.len(), 2);

        let mut out = String::new();
        write_attrs(&mut out, &pairs(&[("note", "\"quoted\" & <tag>")]));
        assert_eq!(out, r#" note="&quot;quoted&quot; &amp; &lt;tag&gt;""#);
    }
}
