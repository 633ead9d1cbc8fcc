//! Formats and the reader/writer contract.
//!
//! Every format provides one [`Reader`] and one [`Writer`]. The
//! [`FormatTable`] maps each [`Format`] to boxed reader and writer values so
//! the driver never hard-codes a format pair.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::{Result, Warning};
use crate::html::{HtmlConfig, HtmlReader, HtmlWriter};
use crate::markdown::{MarkdownConfig, MarkdownReader, MarkdownWriter};
use crate::model::{Course, Registry};
use crate::olx::{OlxConfig, OlxReader, OlxWriter};

/// Supported course formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Markdown,
    Html,
    Olx,
}

impl Format {
    pub const ALL: [Format; 3] = [Format::Markdown, Format::Html, Format::Olx];

    /// Detect format from a path.
    ///
    /// Directories are OLX packages; files are recognized by extension.
    pub fn detect(path: &Path) -> Option<Format> {
        if path.is_dir() {
            return Some(Format::Olx);
        }
        let ext = path.extension()?.to_str()?;
        match ext.to_lowercase().as_str() {
            "md" | "markdown" => Some(Format::Markdown),
            "html" | "htm" => Some(Format::Html),
            _ => None,
        }
    }

    /// Whether this format is written as a directory.
    pub fn is_package(self) -> bool {
        self == Format::Olx
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Format::Markdown => "md",
            Format::Html => "html",
            Format::Olx => "olx",
        })
    }
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "md" | "markdown" => Ok(Format::Markdown),
            "html" | "htm" => Ok(Format::Html),
            "olx" => Ok(Format::Olx),
            _ => Err(format!("unknown format `{s}` (expected md, html or olx)")),
        }
    }
}

/// Reads a course from a file or package.
pub trait Reader: Send + Sync {
    /// Read a complete course. Never returns a partial tree.
    fn read(&self, source: &Path, registry: &Registry) -> Result<Course>;
}

/// Writes a course to a file or package.
pub trait Writer: Send + Sync {
    /// Write the course, returning the warnings raised while writing.
    ///
    /// Nothing is published unless the whole course was written.
    fn write(&self, course: &Course, destination: &Path, registry: &Registry)
    -> Result<Vec<Warning>>;
}

/// What to do when the destination already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverwritePolicy {
    /// Only a missing destination, or an empty directory for packages.
    #[default]
    Refuse,
    /// Replace an existing file, or an existing package directory.
    Replace,
}

/// Options shared by every writer of a format table.
#[derive(Debug, Clone, Default)]
pub struct WriteOptions {
    pub overwrite: OverwritePolicy,
    pub markdown: MarkdownConfig,
    pub html: HtmlConfig,
    pub olx: OlxConfig,
}

/// In-memory writer output with the warnings raised while producing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered<T> {
    pub output: T,
    pub warnings: Vec<Warning>,
}

/// Dispatch table from formats to reader and writer values.
pub struct FormatTable {
    entries: Vec<(Format, Box<dyn Reader>, Box<dyn Writer>)>,
}

impl FormatTable {
    /// An empty table.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Table of the built-in formats.
    pub fn standard(options: WriteOptions) -> Self {
        let WriteOptions {
            overwrite,
            markdown,
            html,
            olx,
        } = options;
        let mut table = Self::new();
        table.register(
            Format::Markdown,
            Box::new(MarkdownReader::new()),
            Box::new(MarkdownWriter::with_config(markdown).overwrite(overwrite)),
        );
        table.register(
            Format::Html,
            Box::new(HtmlReader::new()),
            Box::new(HtmlWriter::with_config(html).overwrite(overwrite)),
        );
        table.register(
            Format::Olx,
            Box::new(OlxReader::new()),
            Box::new(OlxWriter::with_config(olx).overwrite(overwrite)),
        );
        table
    }

    /// Add or replace the reader and writer of a format.
    pub fn register(&mut self, format: Format, reader: Box<dyn Reader>, writer: Box<dyn Writer>) {
        self.entries.retain(|(f, _, _)| *f != format);
        self.entries.push((format, reader, writer));
    }

    pub fn reader(&self, format: Format) -> Option<&dyn Reader> {
        self.entries
            .iter()
            .find(|(f, _, _)| *f == format)
            .map(|(_, reader, _)| reader.as_ref())
    }

    pub fn writer(&self, format: Format) -> Option<&dyn Writer> {
        self.entries
            .iter()
            .find(|(f, _, _)| *f == format)
            .map(|(_, _, writer)| writer.as_ref())
    }
}

impl Default for FormatTable {
    fn default() -> Self {
        Self::standard(WriteOptions::default())
    }
}

impl fmt::Debug for FormatTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormatTable")
            .field(
                "formats",
                &self.entries.iter().map(|(f, _, _)| *f).collect::<Vec<_>>(),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_names() {
        assert_eq!("md".parse::<Format>(), Ok(Format::Markdown));
        assert_eq!("Markdown".parse::<Format>(), Ok(Format::Markdown));
        assert_eq!("htm".parse::<Format>(), Ok(Format::Html));
        assert_eq!("olx".parse::<Format>(), Ok(Format::Olx));
        assert!("pdf".parse::<Format>().is_err());
        for format in Format::ALL {
            assert_eq!(format.to_string().parse::<Format>(), Ok(format));
        }
    }

    #[test]
    fn test_detect() {
        assert_eq!(Format::detect(Path::new("course.md")), Some(Format::Markdown));
        assert_eq!(Format::detect(Path::new("course.HTML")), Some(Format::Html));
        assert_eq!(Format::detect(Path::new("course.txt")), None);
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(Format::detect(dir.path()), Some(Format::Olx));
    }

    #[test]
    fn test_standard_table_is_complete() {
        let table = FormatTable::default();
        for format in Format::ALL {
            assert!(table.reader(format).is_some());
            assert!(table.writer(format).is_some());
        }
    }
}
