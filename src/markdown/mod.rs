//! Markdown course format.
//!
//! A course is a single Markdown file. The depth 1 heading is the course,
//! deeper headings are nested collections, and every other block is a leaf
//! unit recognized by its fingerprint:
//!
//! - [`block`]: line-based lexer for headings, fenced blocks and paragraphs
//! - [`escape`]: text helpers for the writer
//! - [`kinds`]: per-kind parse and render templates
//!
//! Units carry their identifier and attributes in a trailing span,
//! `{#id .class key="value"}`. Question kinds are fenced blocks marked with
//! a class:
//!
//! ````markdown
//! # Course {#rust101}
//! ## Week 1
//! ```{.question title="Check"}
//! Pick the even number
//! - [ ] 3
//! - [x] 4
//! ```
//! ````

pub mod block;
mod escape;
pub mod kinds;
mod reader;
mod writer;

pub use escape::fence_for;
pub use reader::MarkdownReader;
pub use writer::MarkdownWriter;

/// Configuration for Markdown output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkdownConfig {
    /// Deepest heading level written; deeper collections are flattened.
    pub max_heading_level: u8,
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self {
            max_heading_level: 6,
        }
    }
}
