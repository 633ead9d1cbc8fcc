//! OLX package reader.
//!
//! Reading takes two passes. The first indexes every `{element}/{name}.xml`
//! file by element and identifier; the second walks the tree from
//! `course.xml`, replacing bare pointer elements with the indexed element
//! they name.

use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, trace};

use super::kinds::{CONTAINERS, OlxElement};
use super::package::decode_stem;
use super::Package;
use crate::codec::package;
use crate::dom::{Document, NodeId, inner_html, parse_xml};
use crate::error::{Error, Result, Warning, WarningKind};
use crate::format::{Format, Reader};
use crate::model::{Course, Payload, Registry, Unit};
use crate::output::PACKAGE_MARKER;

/// Reader for OLX package directories.
#[derive(Debug, Clone, Copy, Default)]
pub struct OlxReader;

impl OlxReader {
    pub fn new() -> Self {
        Self
    }

    /// Read a course from an in-memory package.
    pub fn read_package(&self, package: &Package, registry: &Registry) -> Result<Course> {
        let course_xml = package.get(PACKAGE_MARKER).ok_or_else(|| {
            Error::format(Format::Olx, format!("package has no {PACKAGE_MARKER}"))
        })?;
        let doc = parse_file(PACKAGE_MARKER, course_xml)?;
        let root = doc
            .element_children(doc.root())
            .next()
            .filter(|&node| doc.element_name(node) == Some("course"))
            .ok_or_else(|| {
                Error::format(
                    Format::Olx,
                    format!("{PACKAGE_MARKER} has no <course> element"),
                )
            })?;

        let index = Index::build(package)?;
        debug!(files = index.entries.len(), "indexed package");

        let mut resolver = Resolver {
            registry,
            package,
            index: &index,
            path: Vec::new(),
            skipped: Vec::new(),
        };
        let unit = resolver
            .resolve(&doc, root)?
            .ok_or_else(|| Error::format(Format::Olx, "course element is empty"))?;
        Course::new(registry, unit)
    }
}

impl Reader for OlxReader {
    fn read(&self, source: &Path, registry: &Registry) -> Result<Course> {
        debug!(path = %source.display(), "reading OLX package");
        if !source.join(PACKAGE_MARKER).is_file() {
            return Err(Error::format(
                Format::Olx,
                format!("{} has no {PACKAGE_MARKER}", source.display()),
            ));
        }
        let package = Package::load_dir(source)?;
        self.read_package(&package, registry)
    }
}

/// Parse a package file, naming it in errors.
fn parse_file(path: &str, contents: &str) -> Result<Document> {
    parse_xml(contents).map_err(|err| match err {
        Error::Format { format, message } => Error::Format {
            format,
            message: format!("{path}: {message}"),
        },
        other => other,
    })
}

fn in_package(err: Error) -> Error {
    match err {
        Error::Schema(message) => Error::format(Format::Olx, message),
        other => other,
    }
}

/// Pointer attributes override the attributes of the element they name.
fn merge_attrs(base: &[(String, String)], pointer: &[(String, String)]) -> Vec<(String, String)> {
    base.iter()
        .filter(|(key, _)| !pointer.iter().any(|(k, _)| k == key))
        .chain(pointer)
        .cloned()
        .collect()
}

struct Entry {
    doc: Document,
    node: NodeId,
}

/// Package files by `(element, identifier)`.
#[derive(Default)]
struct Index {
    entries: HashMap<(String, String), Entry>,
}

impl Index {
    fn build(package: &Package) -> Result<Index> {
        let mut index = Index::default();
        for (path, contents) in package.iter() {
            let Some((dir, file)) = path.split_once('/') else {
                continue;
            };
            let Some(stem) = file.strip_suffix(".xml").filter(|s| !s.contains('/')) else {
                continue;
            };
            let doc = parse_file(path, contents)?;
            let Some(node) = doc.element_children(doc.root()).next() else {
                continue;
            };
            if doc.element_name(node) != Some(dir) {
                trace!(path, "skipping file whose root does not match its directory");
                continue;
            }
            let id = match doc.get_attr(node, "url_name") {
                Some(id) => id.to_string(),
                None => decode_stem(stem),
            };
            index
                .entries
                .insert((dir.to_string(), id), Entry { doc, node });
        }
        Ok(index)
    }

    fn get(&self, element: &str, id: &str) -> Option<&Entry> {
        self.entries.get(&(element.to_string(), id.to_string()))
    }
}

struct Resolver<'a> {
    registry: &'a Registry,
    package: &'a Package,
    index: &'a Index,
    /// `element/id` of every reference being resolved.
    path: Vec<String>,
    /// Warnings about dropped elements, attached to the enclosing collection.
    skipped: Vec<Warning>,
}

impl Resolver<'_> {
    /// Read an element, following it first if it is a pointer.
    fn resolve(&mut self, doc: &Document, node: NodeId) -> Result<Option<Unit>> {
        let name = doc.element_name(node).unwrap_or_default();
        let attrs = doc.attrs(node);

        let index = self.index;
        if let Some(id) = doc.get_attr(node, "url_name")
            && is_bare(doc, node)
            && let Some(entry) = index.get(name, id)
        {
            let key = format!("{name}/{id}");
            if self.path.contains(&key) {
                let mut path = self.path.clone();
                path.push(key);
                return Err(Error::Cycle { path });
            }
            trace!(reference = %key, "following reference");
            self.path.push(key);
            let merged = merge_attrs(entry.doc.attrs(entry.node), attrs);
            let unit = self.element(&entry.doc, entry.node, &merged);
            self.path.pop();
            return unit;
        }
        self.element(doc, node, attrs)
    }

    fn element(
        &mut self,
        doc: &Document,
        node: NodeId,
        attrs: &[(String, String)],
    ) -> Result<Option<Unit>> {
        let name = doc.element_name(node).unwrap_or_default();
        let mut warnings = Vec::new();

        if CONTAINERS.contains(&name) {
            let decoded = package::decode(attrs, &[], &mut warnings);
            let mut children = Vec::new();
            for child in doc.element_children(node) {
                if let Some(unit) = self.resolve(doc, child)? {
                    children.push(unit);
                }
            }
            let mut unit = Unit::collection(
                self.registry,
                decoded.id,
                decoded.title.unwrap_or_default(),
                decoded.attributes,
                children,
            )
            .map_err(in_package)?;
            unit.extend_warnings(warnings);
            unit.extend_warnings(self.skipped.drain(..));
            return Ok(Some(unit));
        }

        let element = OlxElement {
            doc,
            node,
            attrs,
            package: self.package,
        };
        for spec in self.registry.iter().filter(|spec| !spec.container) {
            let hooks = &spec.olx;
            let Some(parse) = hooks.parse.filter(|_| hooks.elements.contains(&name)) else {
                continue;
            };
            let Some(payload) = parse(&element)? else {
                continue;
            };
            let decoded = package::decode(attrs, hooks.native, &mut warnings);
            debug!(kind = %spec.kind, id = decoded.id.as_deref().unwrap_or(""), "reading element");
            let mut unit = Unit::leaf(
                self.registry,
                decoded.id,
                decoded.title.unwrap_or_default(),
                decoded.attributes,
                payload,
            )
            .map_err(in_package)?;
            unit.extend_warnings(warnings);
            return Ok(Some(unit));
        }

        self.unknown(doc, node, attrs, name)
    }

    /// Keep the content of an unknown element as raw HTML, drop it if empty.
    fn unknown(
        &mut self,
        doc: &Document,
        node: NodeId,
        attrs: &[(String, String)],
        name: &str,
    ) -> Result<Option<Unit>> {
        let contents = inner_html(doc, node);
        let mut warnings = Vec::new();
        let decoded = package::decode(attrs, &[], &mut warnings);
        if contents.trim().is_empty() {
            self.skipped.extend(warnings);
            self.skipped.push(Warning::new(
                WarningKind::UnknownKind,
                decoded.id.as_deref(),
                format!("skipping empty <{name}> element"),
            ));
            return Ok(None);
        }

        warnings.push(Warning::new(
            WarningKind::UnknownKind,
            decoded.id.as_deref(),
            format!("<{name}> element kept as raw HTML"),
        ));
        let mut unit = Unit::leaf(
            self.registry,
            decoded.id,
            decoded.title.unwrap_or_default(),
            decoded.attributes,
            Payload::raw_html(contents),
        )
        .map_err(in_package)?;
        unit.extend_warnings(warnings);
        Ok(Some(unit))
    }
}

/// An element with no content of its own, only attributes.
fn is_bare(doc: &Document, node: NodeId) -> bool {
    doc.children(node).all(|child| doc.is_blank_text(child))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn package(files: &[(&str, &str)]) -> Package {
        let mut package = Package::new();
        for (path, contents) in files {
            package.insert(*path, *contents);
        }
        package
    }

    fn read(files: &[(&str, &str)]) -> Result<Course> {
        OlxReader::new().read_package(&package(files), &Registry::standard())
    }

    #[test]
    fn test_references_resolved() {
        let course = read(&[
            ("course.xml", r#"<course url_name="c101" org="acme" course="c"/>"#),
            ("course/c101.xml", r#"<course display_name="Course"><chapter url_name="w1"/></course>"#),
            (
                "chapter/w1.xml",
                r#"<chapter display_name="Week 1"><sequential url_name="s1" display_name="Lesson"><vertical url_name="v1"><html url_name="h1"><p>x</p></html></vertical></sequential></chapter>"#,
            ),
        ])
        .unwrap();
        assert_eq!(course.id(), "c101");
        assert_eq!(course.title(), "Course");
        assert_eq!(course.attributes().get_text("org").as_deref(), Some("acme"));
        let week = &course.children()[0];
        assert_eq!((week.id(), week.title()), ("w1", "Week 1"));
        let lesson = &week.children()[0];
        assert_eq!(lesson.title(), "Lesson");
        let html = &lesson.children()[0].children()[0];
        assert_eq!(html.payload(), &Payload::raw_html("<p>x</p>"));
    }

    #[test]
    fn test_pointer_attributes_override() {
        let course = read(&[
            ("course.xml", r#"<course url_name="c"/>"#),
            ("course/c.xml", r#"<course><chapter url_name="w" display_name="New"/></course>"#),
            ("chapter/w.xml", r#"<chapter display_name="Old" visible="true"/>"#),
        ])
        .unwrap();
        let week = &course.children()[0];
        assert_eq!(week.title(), "New");
        assert!(week.attributes().contains_key("visible"));
    }

    #[test]
    fn test_file_stem_identifier() {
        let course = read(&[
            ("course.xml", r#"<course url_name="c"><chapter url_name="week one"/></course>"#),
            ("chapter/week%20one.xml", r#"<chapter display_name="W"/>"#),
        ])
        .unwrap();
        assert_eq!(course.children()[0].title(), "W");
    }

    #[test]
    fn test_reference_cycle() {
        let err = read(&[
            ("course.xml", r#"<course url_name="c"><chapter url_name="a"/></course>"#),
            ("chapter/a.xml", r#"<chapter><sequential url_name="b"/></chapter>"#),
            ("sequential/b.xml", r#"<sequential><chapter url_name="a"/></sequential>"#),
        ])
        .unwrap_err();
        match err {
            Error::Cycle { path } => {
                assert_eq!(path, vec!["chapter/a", "sequential/b", "chapter/a"]);
            }
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_elements() {
        let course = read(&[(
            "course.xml",
            r#"<course url_name="c"><chapter url_name="w"><wiki slug="x"/><discussion url_name="d"><p>Talk</p></discussion></chapter></course>"#,
        )])
        .unwrap();
        let week = &course.children()[0];
        assert_eq!(week.children().len(), 1);
        let raw = &week.children()[0];
        assert_eq!(raw.id(), "d");
        assert_eq!(raw.payload(), &Payload::raw_html("<p>Talk</p>"));
        assert_eq!(raw.warnings()[0].kind, WarningKind::UnknownKind);
        assert!(week.warnings().iter().any(|w| w.kind == WarningKind::UnknownKind));
    }

    #[test]
    fn test_missing_course_xml() {
        assert!(matches!(
            read(&[("chapter/a.xml", "<chapter/>")]),
            Err(Error::Format { format: Format::Olx, .. })
        ));
        assert!(matches!(
            read(&[("course.xml", "<chapter/>")]),
            Err(Error::Format { .. })
        ));
    }

    #[test]
    fn test_malformed_file_named() {
        let err = read(&[
            ("course.xml", r#"<course url_name="c"/>"#),
            ("chapter/a.xml", "<chapter><sequential></chapter>"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("chapter/a.xml"));
    }
}
