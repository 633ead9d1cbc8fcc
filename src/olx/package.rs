//! In-memory OLX package: relative paths mapped to file contents.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use tracing::{debug, trace};
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::format::Format;
use crate::util::{decode_text, decode_xml};

/// Characters escaped in file stems.
const STEM: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.');

/// Encode an identifier as a file stem.
pub fn encode_stem(id: &str) -> String {
    utf8_percent_encode(id, STEM).to_string()
}

/// Decode a file stem back to an identifier.
pub fn decode_stem(stem: &str) -> String {
    percent_decode_str(stem).decode_utf8_lossy().into_owned()
}

/// Files of an OLX package, keyed by `/`-separated relative path.
///
/// Paths are kept sorted so packages are written and compared in a stable
/// order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Package {
    files: BTreeMap<String, String>,
}

impl Package {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a file.
    pub fn insert(&mut self, path: impl Into<String>, contents: impl Into<String>) {
        self.files.insert(path.into(), contents.into());
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.files.get(path).map(String::as_str)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Files in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.files.iter().map(|(p, c)| (p.as_str(), c.as_str()))
    }

    /// Write every file below `dir`, creating directories as needed.
    pub fn write_to(&self, dir: &Path) -> Result<()> {
        for (path, contents) in &self.files {
            let target = dir.join(path);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&target, contents)?;
            trace!(path = %path, "wrote package file");
        }
        Ok(())
    }

    /// Load the XML and HTML files of a package directory.
    ///
    /// Other files (static assets, policies in other formats) are skipped.
    pub fn load_dir(dir: &Path) -> Result<Package> {
        let mut package = Package::new();
        for entry in WalkDir::new(dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            let path = entry.path();
            let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
                continue;
            };
            let Ok(relative) = path.strip_prefix(dir) else {
                continue;
            };
            let key = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");

            let bytes = fs::read(path)?;
            let contents = match ext {
                "xml" => decode_xml(&bytes),
                "html" => decode_text(&bytes, Format::Olx, None),
                _ => continue,
            }
            .map_err(|err| match err {
                Error::Format { format, message } => {
                    Error::format(format, format!("{key}: {message}"))
                }
                other => other,
            })?
            .into_owned();
            package.insert(key, contents);
        }
        debug!(path = %dir.display(), files = package.len(), "loaded package");
        Ok(package)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stem_encoding() {
        assert_eq!(encode_stem("week-1_a.b"), "week-1_a.b");
        assert_eq!(encode_stem("a/b c"), "a%2Fb%20c");
        assert_eq!(decode_stem("a%2Fb%20c"), "a/b c");
        assert_eq!(decode_stem(&encode_stem("été")), "été");
    }

    #[test]
    fn test_write_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut package = Package::new();
        package.insert("course.xml", "<course/>\n");
        package.insert("html/intro.html", "<p>Hi</p>\n");
        package.insert("chapter/week.xml", "<chapter/>\n");
        package.write_to(dir.path()).unwrap();
        fs::create_dir(dir.path().join("static")).unwrap();
        fs::write(dir.path().join("static/logo.png"), [0u8, 159, 146]).unwrap();

        let loaded = Package::load_dir(dir.path()).unwrap();
        assert_eq!(loaded, package);
        let paths: Vec<_> = loaded.iter().map(|(p, _)| p).collect();
        assert_eq!(paths, vec!["chapter/week.xml", "course.xml", "html/intro.html"]);
    }

    #[test]
    fn test_load_rejects_unknown_encoding() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("course.xml"), "<course/>").unwrap();
        fs::create_dir(dir.path().join("chapter")).unwrap();
        fs::write(
            dir.path().join("chapter/week.xml"),
            "<?xml version=\"1.0\" encoding=\"x-unknown\"?><chapter/>",
        )
        .unwrap();

        let err = Package::load_dir(dir.path()).unwrap_err();
        assert!(matches!(
            err,
            Error::Format { ref message, .. } if message.starts_with("chapter/week.xml:")
        ));
    }
}
