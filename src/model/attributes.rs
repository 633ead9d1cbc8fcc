//! The generic attribute bag carried by every unit.

use std::fmt;

/// Declared type of an attribute, used for coercion at format boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttrType {
    Text,
    Integer,
    Boolean,
    /// Whitespace-separated tokens.
    List,
}

impl fmt::Display for AttrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AttrType::Text => "text",
            AttrType::Integer => "integer",
            AttrType::Boolean => "boolean",
            AttrType::List => "list",
        };
        f.write_str(name)
    }
}

/// A single attribute value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AttrValue {
    Text(String),
    Integer(i64),
    Boolean(bool),
    List(Vec<String>),
}

impl AttrValue {
    /// The value as it is written in any textual syntax.
    ///
    /// Lists are joined with single spaces.
    pub fn to_text(&self) -> String {
        match self {
            AttrValue::Text(s) => s.clone(),
            AttrValue::Integer(n) => n.to_string(),
            AttrValue::Boolean(b) => b.to_string(),
            AttrValue::List(items) => items.join(" "),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            AttrValue::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttrValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            AttrValue::List(items) => Some(items),
            _ => None,
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Text(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::Text(value)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        AttrValue::Integer(value)
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Boolean(value)
    }
}

impl From<Vec<String>> for AttrValue {
    fn from(value: Vec<String>) -> Self {
        AttrValue::List(value)
    }
}

/// Ordered mapping from attribute keys to values.
///
/// Keys keep their first insertion position; inserting an existing key
/// replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeBag {
    entries: Vec<(String, AttrValue)>,
}

impl AttributeBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, returning the previous value for this key if any.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<AttrValue>,
    ) -> Option<AttrValue> {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => Some(std::mem::replace(existing, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&AttrValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Get a value rendered as text.
    pub fn get_text(&self, key: &str) -> Option<String> {
        self.get(key).map(AttrValue::to_text)
    }

    pub fn remove(&mut self, key: &str) -> Option<AttrValue> {
        let pos = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(pos).1)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<AttrValue>> FromIterator<(K, V)> for AttributeBag {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut bag = AttributeBag::new();
        for (k, v) in iter {
            bag.insert(k, v);
        }
        bag
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_keeps_first_position() {
        let mut bag = AttributeBag::new();
        bag.insert("a", "1");
        bag.insert("b", "2");
        let previous = bag.insert("a", "3");

        assert_eq!(previous, Some(AttrValue::from("1")));
        let keys: Vec<_> = bag.keys().collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(bag.get_text("a").as_deref(), Some("3"));
    }

    #[test]
    fn test_remove() {
        let mut bag = AttributeBag::new().with("a", 1i64).with("b", true);
        assert_eq!(bag.remove("a"), Some(AttrValue::Integer(1)));
        assert!(!bag.contains_key("a"));
        assert_eq!(bag.len(), 1);
    }

    #[test]
    fn test_to_text() {
        assert_eq!(AttrValue::Integer(42).to_text(), "42");
        assert_eq!(AttrValue::Boolean(false).to_text(), "false");
        assert_eq!(
            AttrValue::List(vec!["a".into(), "b".into()]).to_text(),
            "a b"
        );
    }
}
