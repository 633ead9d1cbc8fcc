//! HTML course format.
//!
//! A course is one HTML document. The course is the `<main>` element,
//! collections are nested `<section>` elements titled by their first
//! heading, and leaves are `<section data-kind="...">` elements whose body
//! is written by the kind's template. Anything else inside a container is
//! kept as raw HTML.

pub mod kinds;
mod reader;
mod writer;

pub use reader::HtmlReader;
pub use writer::{HtmlWriter, STYLESHEET};

/// Configuration for HTML output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HtmlConfig {
    /// Embed a small stylesheet in the document head.
    pub styled: bool,
}
