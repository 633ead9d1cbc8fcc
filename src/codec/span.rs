//! Markdown attribute spans: `{#id .class key="value"}`.
//!
//! Tokens are separated by whitespace. `#id` sets the identifier, `.name`
//! appends a class, `key=value` or `key="value"` sets an attribute. Quoted
//! values escape `\` and `"` with a backslash and encode newlines as `\n`.

use std::fmt::Write as _;

use crate::error::{Warning, WarningKind};
use crate::model::{AttrValue, AttributeBag};

/// A decoded attribute span.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Span {
    pub id: Option<String>,
    pub classes: Vec<String>,
    /// Key/value pairs in source order, repetitions included.
    pub pairs: Vec<(String, String)>,
}

impl Span {
    pub fn is_empty(&self) -> bool {
        self.id.is_none() && self.classes.is_empty() && self.pairs.is_empty()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    /// Remove a class, returning whether it was present.
    pub fn remove_class(&mut self, class: &str) -> bool {
        let before = self.classes.len();
        self.classes.retain(|c| c != class);
        self.classes.len() != before
    }

    /// Parse a whole span, braces included.
    pub fn parse(text: &str) -> Option<Span> {
        let body = text.strip_prefix('{')?.strip_suffix('}')?;
        let mut span = Span::default();
        let mut chars = body.char_indices().peekable();

        loop {
            while chars.next_if(|(_, c)| c.is_whitespace()).is_some() {}
            let Some(&(start, first)) = chars.peek() else {
                break;
            };
            match first {
                '#' | '.' => {
                    chars.next();
                    let mut end = body.len();
                    while let Some(&(i, c)) = chars.peek() {
                        if c.is_whitespace() {
                            end = i;
                            break;
                        }
                        if matches!(c, '{' | '}' | '"' | '=') {
                            return None;
                        }
                        chars.next();
                    }
                    let name = &body[start + 1..end];
                    if name.is_empty() {
                        return None;
                    }
                    if first == '#' {
                        span.id = Some(name.to_string());
                    } else {
                        span.classes.push(name.to_string());
                    }
                }
                c if is_key_start(c) => {
                    let mut key_end = body.len();
                    while let Some(&(i, c)) = chars.peek() {
                        if !is_key_char(c) {
                            key_end = i;
                            break;
                        }
                        chars.next();
                    }
                    let key = &body[start..key_end];
                    chars.next_if(|&(_, c)| c == '=')?;
                    let value = match chars.peek() {
                        Some((_, '"')) => {
                            chars.next();
                            let mut value = String::new();
                            loop {
                                match chars.next()? {
                                    (_, '"') => break,
                                    (_, '\\') => match chars.next()? {
                                        (_, 'n') => value.push('\n'),
                                        (_, c) => value.push(c),
                                    },
                                    (_, c) => value.push(c),
                                }
                            }
                            value
                        }
                        _ => {
                            let mut value = String::new();
                            while let Some(&(_, c)) = chars.peek() {
                                if c.is_whitespace() {
                                    break;
                                }
                                if matches!(c, '"' | '{' | '}' | '=') {
                                    return None;
                                }
                                value.push(c);
                                chars.next();
                            }
                            value
                        }
                    };
                    if chars.peek().is_some_and(|(_, c)| !c.is_whitespace()) {
                        return None;
                    }
                    span.pairs.push((key.to_string(), value));
                }
                _ => return None,
            }
        }

        Some(span)
    }

    /// Split a trailing span off a line.
    ///
    /// The span must end the line and be preceded by whitespace or start
    /// the line. Returns the content before the span, trimmed at the end.
    pub fn split_trailing(line: &str) -> Option<(&str, Span)> {
        let trimmed = line.trim_end();
        if !trimmed.ends_with('}') {
            return None;
        }
        let bytes = trimmed.as_bytes();
        for pos in memchr::memrchr_iter(b'{', bytes) {
            if pos > 0 && !bytes[pos - 1].is_ascii_whitespace() {
                continue;
            }
            if let Some(span) = Span::parse(&trimmed[pos..]) {
                return Some((trimmed[..pos].trim_end(), span));
            }
        }
        None
    }

    /// Encode the span. Empty spans encode as `{}`.
    pub fn encode(&self) -> String {
        let mut tokens: Vec<String> = Vec::new();
        if let Some(id) = &self.id {
            tokens.push(format!("#{id}"));
        }
        tokens.extend(self.classes.iter().map(|c| format!(".{c}")));
        for (key, value) in &self.pairs {
            let mut token = String::with_capacity(key.len() + value.len() + 3);
            let _ = write!(token, "{key}=\"{}\"", escape_value(value));
            tokens.push(token);
        }
        format!("{{{}}}", tokens.join(" "))
    }

    /// Build a span from a unit's identifier and attribute bag.
    ///
    /// Class tokens that cannot be written as `.name` keep the list in a
    /// `class` key. Keys that are not valid span keys are dropped with a
    /// warning.
    pub(crate) fn from_attributes(
        id: Option<&str>,
        attributes: &AttributeBag,
        reserved: &[&str],
        unit: &str,
        warnings: &mut Vec<Warning>,
    ) -> Span {
        let mut span = Span {
            id: id.filter(|id| is_token(id)).map(str::to_string),
            ..Span::default()
        };
        if let Some(id) = id
            && span.id.is_none()
        {
            warnings.push(Warning::new(
                WarningKind::UnsupportedAttribute,
                Some(unit),
                format!("identifier {id:?} cannot be written in a Markdown span"),
            ));
        }
        for (key, value) in attributes.iter() {
            if key == "class"
                && let AttrValue::List(classes) = value
                && classes.iter().all(|c| is_token(c))
            {
                span.classes.extend(classes.iter().cloned());
                continue;
            }
            if reserved.contains(&key) || !is_valid_key(key) {
                warnings.push(Warning::new(
                    WarningKind::UnsupportedAttribute,
                    Some(unit),
                    format!("attribute `{key}` cannot be written in a Markdown span"),
                ));
                continue;
            }
            span.pairs.push((key.to_string(), value.to_text()));
        }
        span
    }
}

/// Escape a value for use inside double quotes.
pub fn escape_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
    out
}

fn is_key_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_key_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | ':' | '.')
}

/// Whether a string can be written as a span key.
pub fn is_valid_key(key: &str) -> bool {
    let mut chars = key.chars();
    chars.next().is_some_and(is_key_start) && chars.all(is_key_char)
}

/// Whether a string can be written as a bare `#id` or `.class` token.
fn is_token(s: &str) -> bool {
    !s.is_empty()
        && !s
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '{' | '}' | '"' | '='))
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_parse_full_span() {
        let span = Span::parse(r#"{#u1 .question .hard points=3 title="A \"quoted\" title"}"#)
            .unwrap();
        assert_eq!(span.id.as_deref(), Some("u1"));
        assert_eq!(span.classes, vec!["question", "hard"]);
        assert_eq!(
            span.pairs,
            vec![
                ("points".to_string(), "3".to_string()),
                ("title".to_string(), "A \"quoted\" title".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_empty_span() {
        assert_eq!(Span::parse("{}"), Some(Span::default()));
        assert_eq!(Span::parse("{  }"), Some(Span::default()));
    }

    #[test]
    fn test_parse_rejects_non_spans() {
        assert_eq!(Span::parse("{not a span}"), None);
        assert_eq!(Span::parse("{#}"), None);
        assert_eq!(Span::parse(r#"{key="unterminated}"#), None);
        assert_eq!(Span::parse("{a=1b=2}"), None);
        assert_eq!(Span::parse("{x}"), None);
    }

    #[test]
    fn test_split_trailing() {
        let (content, span) = Span::split_trailing("Some text {#u1}").unwrap();
        assert_eq!(content, "Some text");
        assert_eq!(span.id.as_deref(), Some("u1"));

        let (content, span) = Span::split_trailing("{.only}").unwrap();
        assert_eq!(content, "");
        assert_eq!(span.classes, vec!["only"]);

        assert!(Span::split_trailing("function() {return 1}").is_none());
        assert!(Span::split_trailing("glued{#u1}").is_none());
    }

    #[test]
    fn test_split_trailing_with_brace_in_value() {
        let (content, span) = Span::split_trailing(r#"text {#a note="x {y}"}"#).unwrap();
        assert_eq!(content, "text");
        assert_eq!(span.pairs, vec![("note".to_string(), "x {y}".to_string())]);
    }

    #[test]
    fn test_encode_order() {
        let span = Span {
            id: Some("u1".into()),
            classes: vec!["a".into(), "b".into()],
            pairs: vec![("k".into(), "line\nbreak \\ \"q\"".into())],
        };
        assert_eq!(span.encode(), r#"{#u1 .a .b k="line\nbreak \\ \"q\""}"#);
        assert_eq!(Span::default().encode(), "{}");
    }

    #[test]
    fn test_from_attributes_drops_invalid_keys() {
        let bag = AttributeBag::new()
            .with("class", AttrValue::List(vec!["x".into()]))
            .with("data-level", "2")
            .with("bad key", "v")
            .with("title", "t");
        let mut warnings = Vec::new();
        let span = Span::from_attributes(Some("u"), &bag, &["title"], "u", &mut warnings);
        assert_eq!(span.encode(), r#"{#u .x data-level="2"}"#);
        assert_eq!(warnings.len(), 2);
        assert!(warnings.iter().all(|w| w.kind == WarningKind::UnsupportedAttribute));
    }

    proptest! {
        #[test]
        fn prop_quoted_values_survive_escaping(value in "\\PC*", newline in any::<bool>()) {
            let value = if newline { format!("{value}\n{value}") } else { value };
            let span = Span {
                id: None,
                classes: vec![],
                pairs: vec![("key".to_string(), value.clone())],
            };
            let line = format!("content {}", span.encode());
            let (content, decoded) = Span::split_trailing(&line).unwrap();
            prop_assert_eq!(content, "content");
            prop_assert_eq!(decoded.pairs, vec![("key".to_string(), value)]);
        }
    }
}
