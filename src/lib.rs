//! # mu
//!
//! Convert online courses between Markdown, HTML and OLX.
//!
//! ## Features
//!
//! - Read and write courses as a single Markdown file with attributed headings
//! - Read and write courses as a single HTML document of nested sections
//! - Read and write OLX package directories, resolving cross-file references
//! - Convert between any pair through one canonical [`Course`] tree
//! - Atomic output: a failed conversion never leaves a partial file or package
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::path::Path;
//!
//! use mu::{Format, FormatTable, Registry, WriteOptions, convert};
//!
//! let registry = Registry::standard();
//! let table = FormatTable::standard(WriteOptions::default());
//! let summary = convert(
//!     &table,
//!     &registry,
//!     Format::Markdown,
//!     Path::new("course.md"),
//!     Format::Olx,
//!     Path::new("course-olx"),
//! )
//! .unwrap();
//! println!("{} units, {} warnings", summary.units, summary.warnings.len());
//! ```
//!
//! ## Working with Courses
//!
//! Readers and writers also work in memory:
//!
//! ```
//! use mu::{HtmlWriter, MarkdownReader, Payload, Registry};
//!
//! let registry = Registry::standard();
//! let course = MarkdownReader::new()
//!     .parse_str("# Course\n## Unit 1\nSome text {#u1}\n", &registry)
//!     .unwrap();
//!
//! let unit = course.find("u1").unwrap();
//! assert_eq!(unit.payload(), &Payload::raw_html("Some text"));
//!
//! let html = HtmlWriter::new().render(&course, &registry).unwrap().output;
//! assert!(html.contains("<section data-kind=\"raw-html\" id=\"u1\">"));
//! ```

pub mod codec;
pub mod convert;
pub mod dom;
pub mod error;
pub mod format;
pub mod html;
pub mod markdown;
pub mod model;
pub mod olx;
pub mod output;
pub(crate) mod util;
pub mod video;

pub use convert::{Conversion, convert};
pub use error::{Error, Result, Warning, WarningKind};
pub use format::{
    Format, FormatTable, OverwritePolicy, Reader, Rendered, WriteOptions, Writer,
};
pub use html::{HtmlConfig, HtmlReader, HtmlWriter};
pub use markdown::{MarkdownConfig, MarkdownReader, MarkdownWriter};
pub use model::{
    AttrType, AttrValue, AttributeBag, Choice, Course, Payload, Registry, Selection, Unit,
    UnitKind,
};
pub use olx::{OlxConfig, OlxReader, OlxWriter, Package};
