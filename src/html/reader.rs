//! HTML reader.
//!
//! `<section>` elements marked with a kind become units. Plain HTML without
//! sections is read by heading level: each loose `<h1>`..`<h6>` opens a
//! collection holding the content up to the next heading of the same level
//! or shallower.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::codec::markup;
use crate::dom::{Document, NodeData, NodeId, outer_html, parse_html};
use crate::error::{Error, Result, Warning, WarningKind};
use crate::format::{Format, Reader};
use crate::model::{AttributeBag, Course, Outline, Payload, Registry, Unit, UnitKind};
use crate::util::decode_text;

const HEADINGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6"];

/// Reader for HTML course documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlReader;

impl HtmlReader {
    pub fn new() -> Self {
        Self
    }

    /// Parse an HTML document into a course.
    pub fn parse_str(&self, src: &str, registry: &Registry) -> Result<Course> {
        let doc = parse_html(src)?;
        let root = doc
            .find_by_tag(doc.root(), "main")
            .or_else(|| doc.find_by_tag(doc.root(), "body"))
            .unwrap_or(doc.root());

        let heading = first_heading(&doc, root);
        let title = match heading {
            Some(h) => doc.text(h).trim().to_string(),
            None => doc
                .find_by_tag(doc.root(), "title")
                .map(|t| doc.text(t).trim().to_string())
                .ok_or_else(|| Error::format(Format::Html, "document has no course title"))?,
        };

        let mut warnings = Vec::new();
        let decoded = markup::decode(doc.attrs(root), &mut warnings);
        let reader = SectionReader {
            doc: &doc,
            registry,
        };
        let mut unit = Unit::collection(registry, decoded.id, title, decoded.attributes, Vec::new())
            .map_err(in_section)?;
        unit.extend_warnings(warnings);
        let base = heading.and_then(|h| heading_level(&doc, h)).unwrap_or(1);
        let unit = reader.fill(unit, root, heading, base)?;
        Course::new(registry, unit)
    }
}

impl Reader for HtmlReader {
    fn read(&self, source: &Path, registry: &Registry) -> Result<Course> {
        debug!(path = %source.display(), "reading HTML");
        let bytes = fs::read(source)?;
        self.parse_str(&decode_text(&bytes, Format::Html, None)?, registry)
    }
}

/// The first child heading of a container.
fn first_heading(doc: &Document, node: NodeId) -> Option<NodeId> {
    doc.element_children(node)
        .find(|&child| doc.element_name(child).is_some_and(|name| HEADINGS.contains(&name)))
}

/// Level of a heading element, 1 for `<h1>`.
fn heading_level(doc: &Document, node: NodeId) -> Option<usize> {
    let name = doc.element_name(node)?;
    HEADINGS.iter().position(|h| *h == name).map(|i| i + 1)
}

fn in_section(err: Error) -> Error {
    match err {
        Error::Schema(message) => Error::format(Format::Html, message),
        other => other,
    }
}

/// Loose content waiting to become one raw HTML unit.
#[derive(Default)]
struct Loose {
    parts: Vec<String>,
    warnings: Vec<Warning>,
}

struct SectionReader<'a> {
    doc: &'a Document,
    registry: &'a Registry,
}

impl SectionReader<'_> {
    /// Fill a container with the units inside `container`, skipping its title
    /// heading. `base` is the level the container's own heading sits at.
    fn fill(
        &self,
        unit: Unit,
        container: NodeId,
        heading: Option<NodeId>,
        base: usize,
    ) -> Result<Unit> {
        let doc = self.doc;
        let mut outline = Outline::new(self.registry, unit, base);
        let mut loose = Loose::default();

        for child in doc.children(container) {
            if Some(child) == heading || doc.is_blank_text(child) {
                continue;
            }
            let Some(node) = doc.get(child) else {
                continue;
            };
            match &node.data {
                NodeData::Element { name, attrs } if name == "section" => {
                    let mut warnings = Vec::new();
                    let decoded = markup::decode(attrs, &mut warnings);
                    let spec = match decoded.marker.as_deref() {
                        None => Some(self.registry.spec(UnitKind::Collection)),
                        Some(tag) => self.registry.by_tag(tag),
                    };
                    match spec {
                        Some(spec) if spec.container => {
                            self.flush(&mut loose, &mut outline)?;
                            let unit = self.collection(child, decoded, warnings, outline.depth())?;
                            outline.push(unit)?;
                        }
                        Some(spec) if spec.html.parse.is_some() => {
                            self.flush(&mut loose, &mut outline)?;
                            outline.push(self.leaf(child, spec.kind, decoded, warnings)?)?;
                        }
                        _ => {
                            loose.warnings.extend(warnings);
                            loose.warnings.push(Warning::new(
                                WarningKind::UnknownKind,
                                decoded.id.as_deref(),
                                format!(
                                    "section marked {:?} kept as raw HTML",
                                    decoded.marker.unwrap_or_default()
                                ),
                            ));
                            loose.parts.push(outer_html(doc, child));
                        }
                    }
                }
                NodeData::Element { name, attrs } if HEADINGS.contains(&name.as_str()) => {
                    self.flush(&mut loose, &mut outline)?;
                    let level = heading_level(doc, child).unwrap_or(base + 1);
                    let title = doc.text(child).trim().to_string();
                    let location = format!("<{name}> {title:?}");
                    let mut warnings = Vec::new();
                    let decoded = markup::decode(attrs, &mut warnings);
                    let mut unit = Unit::collection(
                        self.registry,
                        decoded.id,
                        title,
                        decoded.attributes,
                        Vec::new(),
                    )
                    .map_err(in_section)?;
                    unit.extend_warnings(warnings);
                    outline.open(level.max(base + 1), unit, &location)?;
                }
                NodeData::Doctype(_) => {}
                _ => loose.parts.push(outer_html(doc, child)),
            }
        }
        self.flush(&mut loose, &mut outline)?;
        outline.finish()
    }

    fn collection(
        &self,
        node: NodeId,
        decoded: markup::Decoded,
        warnings: Vec<Warning>,
        parent: usize,
    ) -> Result<Unit> {
        let heading = first_heading(self.doc, node);
        let title = heading
            .map(|h| self.doc.text(h).trim().to_string())
            .or(decoded.title)
            .unwrap_or_default();
        let mut unit =
            Unit::collection(self.registry, decoded.id, title, decoded.attributes, Vec::new())
                .map_err(in_section)?;
        unit.extend_warnings(warnings);
        let base = heading
            .and_then(|h| heading_level(self.doc, h))
            .unwrap_or(parent + 1);
        self.fill(unit, node, heading, base)
    }

    fn leaf(
        &self,
        node: NodeId,
        kind: UnitKind,
        decoded: markup::Decoded,
        warnings: Vec<Warning>,
    ) -> Result<Unit> {
        let spec = self.registry.spec(kind);
        let parse = spec
            .html
            .parse
            .ok_or_else(|| Error::format(Format::Html, format!("{kind} sections cannot be read")))?;
        debug!(kind = %kind, id = decoded.id.as_deref().unwrap_or(""), "reading section");
        let payload = parse(self.doc, node)?;
        let mut unit = Unit::leaf(
            self.registry,
            decoded.id,
            decoded.title.unwrap_or_default(),
            decoded.attributes,
            payload,
        )
        .map_err(in_section)?;
        unit.extend_warnings(warnings);
        Ok(unit)
    }

    /// Merge loose content into one raw HTML unit.
    fn flush(&self, loose: &mut Loose, outline: &mut Outline<'_>) -> Result<()> {
        let mut parts = loose.parts.drain(..).filter(|p| !p.trim().is_empty());
        let Some(first) = parts.next() else {
            // Warnings about dropped markers stay with the next raw unit.
            return Ok(());
        };
        let mut unit = Unit::leaf(
            self.registry,
            None,
            "",
            AttributeBag::new(),
            Payload::raw_html(first),
        )?;
        for part in parts {
            unit.concatenate(&part);
        }
        unit.extend_warnings(loose.warnings.drain(..));
        outline.push(unit)
    }
}
