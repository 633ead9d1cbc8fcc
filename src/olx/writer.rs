//! OLX package writer.

use std::path::Path;

use tracing::debug;

use super::kinds::CONTAINERS;
use super::package::encode_stem;
use super::{OlxConfig, Package};
use crate::codec::package;
use crate::dom::{Document, NodeId, to_xml};
use crate::error::{Error, Result, Warning, WarningKind};
use crate::format::{OverwritePolicy, Rendered, Writer};
use crate::model::{Course, Registry, Unit};
use crate::output::{self, PACKAGE_MARKER};

/// Course attributes written to `course.xml` rather than the course file.
const COURSE_KEYS: &[&str] = &["org", "course"];

/// Writer for OLX package directories.
#[derive(Debug, Clone, Default)]
pub struct OlxWriter {
    config: OlxConfig,
    overwrite: OverwritePolicy,
}

impl OlxWriter {
    /// Create a new OlxWriter with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an OlxWriter with the specified configuration.
    pub fn with_config(config: OlxConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Set the policy for existing destinations.
    pub fn overwrite(mut self, policy: OverwritePolicy) -> Self {
        self.overwrite = policy;
        self
    }

    /// Render a course as an in-memory package.
    pub fn render(&self, course: &Course, registry: &Registry) -> Result<Rendered<Package>> {
        let mut builder = PackageBuilder {
            registry,
            config: &self.config,
            package: Package::new(),
            warnings: Vec::new(),
        };
        builder.course(course.root())?;
        debug!(files = builder.package.len(), "rendered package");
        Ok(Rendered {
            output: builder.package,
            warnings: builder.warnings,
        })
    }
}

impl Writer for OlxWriter {
    fn write(
        &self,
        course: &Course,
        destination: &Path,
        registry: &Registry,
    ) -> Result<Vec<Warning>> {
        let rendered = self.render(course, registry)?;
        output::publish_package(destination, &rendered.output, self.overwrite)?;
        Ok(rendered.warnings)
    }
}

/// Element name of a collection at a depth.
fn container_name(depth: usize) -> &'static str {
    CONTAINERS[depth.min(CONTAINERS.len() - 1)]
}

struct PackageBuilder<'a> {
    registry: &'a Registry,
    config: &'a OlxConfig,
    package: Package,
    warnings: Vec<Warning>,
}

impl PackageBuilder<'_> {
    fn element_name(&self, unit: &Unit, depth: usize) -> &'static str {
        match self.registry.spec(unit.kind()).olx.element {
            Some(element) => element(unit),
            None => container_name(depth),
        }
    }

    /// Write `course.xml` and the course file.
    fn course(&mut self, root: &Unit) -> Result<()> {
        let config = self.config;
        let mut attrs = vec![("url_name".to_string(), root.id().to_string())];
        for (key, default) in COURSE_KEYS
            .iter()
            .zip([&config.default_org, &config.default_course])
        {
            let value = match root.attributes().get_text(key) {
                Some(value) if !value.is_empty() => value,
                _ => {
                    self.warnings.push(Warning::new(
                        WarningKind::MissingCourseAttribute,
                        Some(root.id()),
                        format!("course has no `{key}` attribute, using {default:?}"),
                    ));
                    default.clone()
                }
            };
            attrs.push((key.to_string(), value));
        }

        let mut doc = Document::new();
        let top = doc.root();
        doc.append_element(top, "course", attrs);
        self.package.insert(PACKAGE_MARKER, to_xml(&doc, top));
        self.file(root, 0)
    }

    /// Write a unit to its own file.
    fn file(&mut self, unit: &Unit, depth: usize) -> Result<()> {
        let mut doc = Document::new();
        let top = doc.root();
        let name = self.build(&mut doc, top, unit, depth, false)?;
        let path = format!("{name}/{}.xml", encode_stem(unit.id()));
        debug!(path = %path, "writing unit file");
        self.package.insert(path, to_xml(&doc, top));
        Ok(())
    }

    /// Append a unit's element under `parent`, writing referenced children
    /// to their own files.
    fn build(
        &mut self,
        doc: &mut Document,
        parent: NodeId,
        unit: &Unit,
        depth: usize,
        inline: bool,
    ) -> Result<&'static str> {
        let (registry, config) = (self.registry, self.config);
        let spec = registry.spec(unit.kind());
        let name = self.element_name(unit, depth);
        if spec.container && depth >= CONTAINERS.len() {
            self.warnings.push(Warning::new(
                WarningKind::DepthOverflow,
                Some(unit.id()),
                format!(
                    "collection at depth {depth} written as <{name}>; the platform supports {} container levels",
                    CONTAINERS.len()
                ),
            ));
        }

        let mut attrs = Vec::new();
        if inline {
            attrs.push(("url_name".to_string(), unit.id().to_string()));
        }
        if !unit.title().is_empty() {
            attrs.push(("display_name".to_string(), unit.title().to_string()));
        }
        let bag = package::encode(unit, spec.olx.native, &mut self.warnings);
        attrs.extend(
            bag.into_iter()
                .filter(|(key, _)| depth > 0 || !COURSE_KEYS.contains(&key.as_str())),
        );
        let node = doc.append_element(parent, name, attrs);

        if spec.container {
            for child in unit.children() {
                let child_depth = depth + 1;
                if child_depth <= config.reference_depth {
                    let pointer = vec![("url_name".to_string(), child.id().to_string())];
                    doc.append_element(node, self.element_name(child, child_depth), pointer);
                    self.file(child, child_depth)?;
                } else {
                    self.build(doc, node, child, child_depth, true)?;
                }
            }
        } else {
            let render = spec.olx.render.ok_or_else(|| {
                Error::schema(format!("{} units cannot be written as OLX", unit.kind()))
            })?;
            render(unit, doc, node, &mut self.package)?;
        }
        Ok(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AttributeBag, Payload};

    fn leaf(registry: &Registry, id: &str, payload: Payload) -> Unit {
        Unit::leaf(registry, Some(id.into()), "", AttributeBag::new(), payload).unwrap()
    }

    fn collection(registry: &Registry, id: &str, title: &str, children: Vec<Unit>) -> Unit {
        Unit::collection(registry, Some(id.into()), title, AttributeBag::new(), children).unwrap()
    }

    fn sample(registry: &Registry) -> Course {
        let html = leaf(registry, "h1", Payload::raw_html("<p>Hi</p>"));
        let vertical = collection(registry, "v1", "Page", vec![html]);
        let lesson = collection(registry, "s1", "Lesson", vec![vertical]);
        let week = collection(registry, "w1", "Week 1", vec![lesson]);
        let bag = AttributeBag::new().with("org", "acme").with("course", "c101");
        Course::from_parts(registry, Some("run".into()), "Course", bag, vec![week]).unwrap()
    }

    #[test]
    fn test_package_layout() {
        let registry = Registry::standard();
        let rendered = OlxWriter::new().render(&sample(&registry), &registry).unwrap();
        let package = rendered.output;
        assert!(rendered.warnings.is_empty());

        let paths: Vec<_> = package.iter().map(|(p, _)| p).collect();
        assert_eq!(
            paths,
            vec![
                "chapter/w1.xml",
                "course.xml",
                "course/run.xml",
                "html/h1.html",
                "sequential/s1.xml",
            ]
        );
        assert_eq!(
            package.get("course.xml"),
            Some("<course url_name=\"run\" org=\"acme\" course=\"c101\"/>\n")
        );
        assert_eq!(
            package.get("course/run.xml"),
            Some("<course display_name=\"Course\">\n  <chapter url_name=\"w1\"/>\n</course>\n")
        );
        assert_eq!(
            package.get("sequential/s1.xml"),
            Some(concat!(
                "<sequential display_name=\"Lesson\">\n",
                "  <vertical url_name=\"v1\" display_name=\"Page\">\n",
                "    <html url_name=\"h1\" filename=\"h1\"/>\n",
                "  </vertical>\n",
                "</sequential>\n",
            ))
        );
    }

    #[test]
    fn test_reference_depth() {
        let registry = Registry::standard();
        let config = OlxConfig {
            reference_depth: 0,
            ..OlxConfig::default()
        };
        let package = OlxWriter::with_config(config)
            .render(&sample(&registry), &registry)
            .unwrap()
            .output;
        let paths: Vec<_> = package.iter().map(|(p, _)| p).collect();
        assert_eq!(paths, vec!["course.xml", "course/run.xml", "html/h1.html"]);
        assert!(package.get("course/run.xml").unwrap().contains("<chapter url_name=\"w1\""));
    }

    #[test]
    fn test_course_defaults_warn() {
        let registry = Registry::standard();
        let course = Course::from_parts(&registry, None, "Intro", AttributeBag::new(), vec![])
            .unwrap();
        let rendered = OlxWriter::new().render(&course, &registry).unwrap();
        assert_eq!(
            rendered.output.get("course.xml"),
            Some("<course url_name=\"intro\" org=\"organization\" course=\"course\"/>\n")
        );
        let kinds: Vec<_> = rendered.warnings.iter().map(|w| w.kind).collect();
        assert_eq!(
            kinds,
            vec![WarningKind::MissingCourseAttribute, WarningKind::MissingCourseAttribute]
        );
    }

    #[test]
    fn test_deep_collections_warn() {
        let registry = Registry::standard();
        let deep = collection(&registry, "d4", "Deep", vec![]);
        let v = collection(&registry, "d3", "", vec![deep]);
        let s = collection(&registry, "d2", "", vec![v]);
        let w = collection(&registry, "d1", "", vec![s]);
        let bag = AttributeBag::new().with("org", "o").with("course", "c");
        let course = Course::from_parts(&registry, Some("c".into()), "C", bag, vec![w]).unwrap();
        let rendered = OlxWriter::new().render(&course, &registry).unwrap();
        assert_eq!(rendered.warnings.len(), 1);
        assert_eq!(rendered.warnings[0].kind, WarningKind::DepthOverflow);
        assert!(rendered.output.get("sequential/d2.xml").unwrap().contains(
            "<vertical url_name=\"d3\">\n    <vertical url_name=\"d4\" display_name=\"Deep\"/>"
        ));
    }
}
