//! Attribute codec.
//!
//! Maps the attribute bag to and from each format's native attribute
//! syntax:
//! - [`span`]: Markdown attribute spans, `{#id .class key="value"}`
//! - [`markup`]: HTML element attributes
//! - [`package`]: OLX element attributes
//!
//! Decoding is shared: raw `(key, value)` pairs are collected with
//! last-write-wins semantics, then coerced to the declared attribute types
//! when the unit is constructed.

pub mod markup;
pub mod package;
pub mod span;

use std::borrow::Cow;

use crate::error::{Error, Result, Warning, WarningKind};
use crate::model::{AttrType, AttrValue, AttributeBag, KindSpec};

/// Coerce a value to a declared type.
///
/// Values declared as `Text` are kept as they are.
pub fn coerce(key: &str, value: AttrValue, expected: AttrType) -> Result<AttrValue> {
    let coerced = match (expected, value) {
        (AttrType::Text, value) => value,
        (AttrType::Integer, AttrValue::Integer(n)) => AttrValue::Integer(n),
        (AttrType::Boolean, AttrValue::Boolean(b)) => AttrValue::Boolean(b),
        (AttrType::List, AttrValue::List(items)) => AttrValue::List(items),
        (AttrType::List, value) => AttrValue::List(
            value
                .to_text()
                .split_whitespace()
                .map(str::to_string)
                .collect(),
        ),
        (AttrType::Integer, value) => {
            let text = value.to_text();
            let n = text.trim().parse::<i64>().map_err(|_| Error::Coercion {
                key: key.to_string(),
                value: text.clone(),
                expected,
            })?;
            AttrValue::Integer(n)
        }
        (AttrType::Boolean, value) => {
            let text = value.to_text();
            let b = match text.trim() {
                t if t.eq_ignore_ascii_case("true") => true,
                t if t.eq_ignore_ascii_case("false") => false,
                _ => {
                    return Err(Error::Coercion {
                        key: key.to_string(),
                        value: text,
                        expected,
                    });
                }
            };
            AttrValue::Boolean(b)
        }
    };
    Ok(coerced)
}

/// Coerce every declared attribute of a bag for one kind.
pub(crate) fn coerce_attributes(spec: &KindSpec, bag: AttributeBag) -> Result<AttributeBag> {
    let mut coerced = AttributeBag::new();
    for (key, value) in bag.iter() {
        let value = coerce(key, value.clone(), spec.attr_type(key))?;
        coerced.insert(key, value);
    }
    Ok(coerced)
}

/// Collect raw attribute pairs into a bag.
///
/// The last value of a repeated key wins; each repetition adds a
/// `DuplicateAttribute` warning.
pub(crate) fn collect_pairs<I>(
    pairs: I,
    unit: Option<&str>,
    warnings: &mut Vec<Warning>,
) -> AttributeBag
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut bag = AttributeBag::new();
    for (key, value) in pairs {
        if let Some(previous) = bag.insert(key.clone(), value) {
            warnings.push(Warning::new(
                WarningKind::DuplicateAttribute,
                unit,
                format!(
                    "attribute `{key}` given more than once, dropped value {:?}",
                    previous.to_text()
                ),
            ));
        }
    }
    bag
}

/// Pick the last value of a key out of raw pairs, warning on repeats.
pub(crate) fn take_last(
    pairs: &mut Vec<(String, String)>,
    key: &str,
    unit: Option<&str>,
    warnings: &mut Vec<Warning>,
) -> Option<String> {
    let mut found: Option<String> = None;
    pairs.retain(|(k, v)| {
        if k != key {
            return true;
        }
        if let Some(previous) = found.replace(v.clone()) {
            warnings.push(Warning::new(
                WarningKind::DuplicateAttribute,
                unit,
                format!("attribute `{key}` given more than once, dropped value {previous:?}"),
            ));
        }
        false
    });
    found
}

/// Resolve a named or numeric character reference (without `&` and `;`).
pub(crate) fn resolve_entity(name: &str) -> Option<Cow<'static, str>> {
    let resolved = match name {
        "amp" => "&",
        "lt" => "<",
        "gt" => ">",
        "quot" => "\"",
        "apos" => "'",
        "nbsp" => "\u{a0}",
        _ => {
            let code = match name.strip_prefix('#')? {
                hex if hex.starts_with(['x', 'X']) => u32::from_str_radix(&hex[1..], 16).ok()?,
                dec => dec.parse::<u32>().ok()?,
            };
            return char::from_u32(code).map(|c| Cow::Owned(c.to_string()));
        }
    };
    Some(Cow::Borrowed(resolved))
}

/// Replace character references in text.
///
/// Unknown or malformed references are kept verbatim.
pub fn unescape_html(text: &str) -> Cow<'_, str> {
    if memchr::memchr(b'&', text.as_bytes()).is_none() {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];
        let resolved = after
            .find(';')
            .filter(|&end| end > 0 && end <= 32)
            .and_then(|end| resolve_entity(&after[..end]).map(|r| (r, end)));
        match resolved {
            Some((value, end)) => {
                out.push_str(&value);
                rest = &after[end + 1..];
            }
            None => {
                out.push('&');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

/// Escape text content for HTML or XML.
pub fn escape_text(text: &str) -> Cow<'_, str> {
    escape(text, false)
}

/// Escape a double-quoted attribute value for HTML or XML.
pub fn escape_attr(value: &str) -> Cow<'_, str> {
    escape(value, true)
}

fn escape(text: &str, quotes: bool) -> Cow<'_, str> {
    let needs = |c: char| matches!(c, '&' | '<' | '>') || (quotes && c == '"');
    if !text.contains(needs) {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if quotes => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coerce_integer() {
        let value = coerce("width", AttrValue::from(" 640 "), AttrType::Integer).unwrap();
        assert_eq!(value, AttrValue::Integer(640));
    }

    #[test]
    fn test_coerce_failure_reports_key() {
        let err = coerce("width", AttrValue::from("wide"), AttrType::Integer).unwrap_err();
        match err {
            Error::Coercion {
                key,
                value,
                expected,
            } => {
                assert_eq!(key, "width");
                assert_eq!(value, "wide");
                assert_eq!(expected, AttrType::Integer);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_coerce_boolean_case_insensitive() {
        assert_eq!(
            coerce("b", AttrValue::from("TRUE"), AttrType::Boolean).unwrap(),
            AttrValue::Boolean(true)
        );
        assert!(coerce("b", AttrValue::from("yes"), AttrType::Boolean).is_err());
    }

    #[test]
    fn test_coerce_list() {
        assert_eq!(
            coerce("class", AttrValue::from("a  b\tc"), AttrType::List).unwrap(),
            AttrValue::List(vec!["a".into(), "b".into(), "c".into()])
        );
    }

    #[test]
    fn test_collect_pairs_last_write_wins() {
        let mut warnings = Vec::new();
        let bag = collect_pairs(
            vec![
                ("a".to_string(), "1".to_string()),
                ("b".to_string(), "2".to_string()),
                ("a".to_string(), "3".to_string()),
            ],
            Some("u1"),
            &mut warnings,
        );
        assert_eq!(bag.get_text("a").as_deref(), Some("3"));
        assert_eq!(bag.len(), 2);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].kind, WarningKind::DuplicateAttribute);
        assert_eq!(warnings[0].unit.as_deref(), Some("u1"));
    }

    #[test]
    fn test_take_last() {
        let mut warnings = Vec::new();
        let mut pairs = vec![
            ("id".to_string(), "x".to_string()),
            ("k".to_string(), "v".to_string()),
            ("id".to_string(), "y".to_string()),
        ];
        assert_eq!(take_last(&mut pairs, "id", None, &mut warnings).as_deref(), Some("y"));
        assert_eq!(pairs, vec![("k".to_string(), "v".to_string())]);
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_unescape_html() {
        assert_eq!(unescape_html("a &amp; b"), "a & b");
        assert_eq!(unescape_html("&lt;p&gt; &quot;x&quot; &apos;"), "<p> \"x\" '");
        assert_eq!(unescape_html("&#233;&#xE9;"), "éé");
        assert_eq!(unescape_html("&unknown; & alone"), "&unknown; & alone");
        assert_eq!(unescape_html("&nbsp;"), "\u{a0}");
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape_text("a < b & c"), "a &lt; b &amp; c");
        assert_eq!(escape_text("say \"hi\""), "say \"hi\"");
        assert_eq!(escape_attr("say \"hi\""), "say &quot;hi&quot;");
        assert!(matches!(escape_attr("plain"), Cow::Borrowed(_)));
    }
}
