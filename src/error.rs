//! Error and warning types for course conversion.
//!
//! Errors abort a conversion before any output is published. Warnings are
//! non-fatal: they are attached to the unit they concern while reading,
//! returned by writers, and logged when created.

use std::fmt;

use thiserror::Error;

use crate::format::Format;
use crate::model::AttrType;

/// Errors that can occur while reading, building or writing a course.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("schema error: {0}")]
    Schema(String),

    #[error("invalid {format} input: {message}")]
    Format { format: Format, message: String },

    #[error("reference cycle: {}", path.join(" -> "))]
    Cycle { path: Vec<String> },

    #[error("cannot coerce attribute `{key}` value {value:?} to {expected}")]
    Coercion {
        key: String,
        value: String,
        expected: AttrType,
    },
}

impl Error {
    pub(crate) fn schema(message: impl Into<String>) -> Self {
        Error::Schema(message.into())
    }

    pub(crate) fn format(format: Format, message: impl Into<String>) -> Self {
        Error::Format {
            format,
            message: message.into(),
        }
    }

    pub(crate) fn xml(format: Format, err: quick_xml::Error) -> Self {
        Error::format(format, format!("XML parsing error: {err}"))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Category of a non-fatal conversion warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WarningKind {
    /// The same attribute key appeared twice; the last value was kept.
    DuplicateAttribute,
    /// The destination format cannot represent an attribute; it was dropped.
    UnsupportedAttribute,
    /// A heading skipped levels; empty collections were synthesized.
    HeadingDepthGap,
    /// The tree is deeper than the destination can nest; it was flattened.
    DepthOverflow,
    /// An element or marker did not name a registered kind.
    UnknownKind,
    /// A course-level attribute required by the destination was defaulted.
    MissingCourseAttribute,
    /// A leaf follows a sibling collection, so the destination nests it
    /// inside that collection when read back.
    Reparented,
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WarningKind::DuplicateAttribute => "duplicate attribute",
            WarningKind::UnsupportedAttribute => "unsupported attribute",
            WarningKind::HeadingDepthGap => "heading depth gap",
            WarningKind::DepthOverflow => "depth overflow",
            WarningKind::UnknownKind => "unknown kind",
            WarningKind::MissingCourseAttribute => "missing course attribute",
            WarningKind::Reparented => "reparented",
        };
        f.write_str(name)
    }
}

/// A non-fatal problem found during a conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub kind: WarningKind,
    /// Identifier of the unit concerned, when known.
    pub unit: Option<String>,
    pub message: String,
}

impl Warning {
    /// Create a warning and log it.
    pub fn new(kind: WarningKind, unit: Option<&str>, message: impl Into<String>) -> Self {
        let message = message.into();
        match unit {
            Some(id) => tracing::warn!(unit = id, "{kind}: {message}"),
            None => tracing::warn!("{kind}: {message}"),
        }
        Self {
            kind,
            unit: unit.map(str::to_string),
            message,
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.unit {
            Some(id) => write!(f, "{} ({id}): {}", self.kind, self.message),
            None => write!(f, "{}: {}", self.kind, self.message),
        }
    }
}
