//! OLX (Open Learning XML) package format.
//!
//! A package is a directory. `course.xml` points at the course file, and
//! units near the top of the tree live in their own `{element}/{id}.xml`
//! files referenced by pointer elements; deeper units are written inline.
//! Raw HTML bodies are kept in `html/{id}.html`.

pub mod kinds;
mod package;
mod reader;
mod writer;

pub use package::{Package, decode_stem, encode_stem};
pub use reader::OlxReader;
pub use writer::OlxWriter;

/// Configuration for OLX output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OlxConfig {
    /// Units down to this depth get their own file; deeper ones are inlined.
    pub reference_depth: usize,
    /// Course `org` attribute used when the course has none.
    pub default_org: String,
    /// Course `course` attribute used when the course has none.
    pub default_course: String,
}

impl Default for OlxConfig {
    fn default() -> Self {
        Self {
            reference_depth: 2,
            default_org: "organization".to_string(),
            default_course: "course".to_string(),
        }
    }
}
