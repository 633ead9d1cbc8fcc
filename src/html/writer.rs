//! HTML writer.

use std::fmt::Write as _;
use std::path::Path;

use super::HtmlConfig;
use crate::codec::{escape_text, markup};
use crate::error::{Error, Result, Warning};
use crate::format::{Format, OverwritePolicy, Rendered, Writer};
use crate::model::{Course, Registry, Unit};
use crate::output;

/// Stylesheet added by [`HtmlConfig::styled`].
pub const STYLESHEET: &str = "
body {
    max-width: 1024px;
    margin: auto;
    font-family: sans-serif;
}

video {
    width: 800px;
}

iframe {
    width: 800px;
    height: 450px;
}
";

/// Writer for HTML course documents.
#[derive(Debug, Clone, Default)]
pub struct HtmlWriter {
    config: HtmlConfig,
    overwrite: OverwritePolicy,
}

impl HtmlWriter {
    /// Create a new HtmlWriter with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an HtmlWriter with the specified configuration.
    pub fn with_config(config: HtmlConfig) -> Self {
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

    /// Render a course as a complete HTML document.
    pub fn render(&self, course: &Course, registry: &Registry) -> Result<Rendered<String>> {
        let mut out = String::from("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
        let _ = writeln!(out, "<title>{}</title>", escape_text(course.title()));
        if self.config.styled {
            let _ = writeln!(out, "<style>{STYLESHEET}</style>");
        }
        out.push_str("</head>\n<body>\n");

        let mut warnings = Vec::new();
        let root = course.root();
        out.push_str("<main");
        markup::write_attrs(&mut out, &start_attrs(root, "course", false, &mut warnings));
        out.push_str(">\n");
        let _ = writeln!(out, "<h1>{}</h1>", escape_text(root.title()));
        for child in root.children() {
            write_unit(child, 1, registry, &mut out, &mut warnings)?;
        }
        out.push_str("</main>\n</body>\n</html>\n");

        Ok(Rendered {
            output: out,
            warnings,
        })
    }
}

impl Writer for HtmlWriter {
    fn write(
        &self,
        course: &Course,
        destination: &Path,
        registry: &Registry,
    ) -> Result<Vec<Warning>> {
        let rendered = self.render(course, registry)?;
        output::publish_file(
            Format::Html,
            destination,
            rendered.output.as_bytes(),
            self.overwrite,
        )?;
        Ok(rendered.warnings)
    }
}

/// Marker, identifier, title and bag attributes of a unit element.
fn start_attrs(
    unit: &Unit,
    marker: &str,
    with_title: bool,
    warnings: &mut Vec<Warning>,
) -> Vec<(String, String)> {
    let mut attrs = vec![(markup::MARKER.to_string(), marker.to_string())];
    if let Some(id) = unit.explicit_id() {
        attrs.push(("id".to_string(), id.to_string()));
    }
    if with_title && !unit.title().is_empty() {
        attrs.push(("title".to_string(), unit.title().to_string()));
    }
    attrs.extend(markup::encode(unit, warnings));
    attrs
}

fn write_unit(
    unit: &Unit,
    depth: usize,
    registry: &Registry,
    out: &mut String,
    warnings: &mut Vec<Warning>,
) -> Result<()> {
    let spec = registry.spec(unit.kind());
    out.push_str("<section");
    markup::write_attrs(out, &start_attrs(unit, spec.tag, !spec.container, warnings));
    out.push_str(">\n");

    if spec.container {
        let level = (depth + 1).min(6);
        let _ = writeln!(out, "<h{level}>{}</h{level}>", escape_text(unit.title()));
        for child in unit.children() {
            write_unit(child, depth + 1, registry, out, warnings)?;
        }
    } else {
        let render = spec.html.render.ok_or_else(|| {
            Error::schema(format!("{} units cannot be written as HTML", unit.kind()))
        })?;
        render(unit, out);
    }

    out.push_str("</section>\n");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::HtmlReader;
    use crate::model::{AttributeBag, Choice, Payload, Selection};

    fn course_with(registry: &Registry, children: Vec<Unit>) -> Course {
        Course::from_parts(registry, Some("c".into()), "Course", AttributeBag::new(), children)
            .unwrap()
    }

    #[test]
    fn test_document_shape() {
        let registry = Registry::standard();
        let raw = Unit::leaf(
            &registry,
            None,
            "",
            AttributeBag::new(),
            Payload::raw_html("Some text"),
        )
        .unwrap();
        let unit =
            Unit::collection(&registry, Some("u1".into()), "Unit 1", AttributeBag::new(), vec![raw])
                .unwrap();
        let html = HtmlWriter::new()
            .render(&course_with(&registry, vec![unit]), &registry)
            .unwrap()
            .output;
        assert_eq!(
            html,
            concat!(
                "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n",
                "<title>Course</title>\n</head>\n<body>\n",
                "<main data-kind=\"course\" id=\"c\">\n<h1>Course</h1>\n",
                "<section data-kind=\"collection\" id=\"u1\">\n<h2>Unit 1</h2>\n",
                "<section data-kind=\"raw-html\">\nSome text\n</section>\n",
                "</section>\n</main>\n</body>\n</html>\n",
            )
        );
    }

    #[test]
    fn test_multiple_choice_checkboxes() {
        let registry = Registry::standard();
        let question = Unit::leaf(
            &registry,
            Some("q".into()),
            "Quiz",
            AttributeBag::new(),
            Payload::multiple_choice(
                "Which?",
                vec![Choice::new("A", false), Choice::new("B", true)],
            ),
        )
        .unwrap();
        let course = course_with(&registry, vec![question]);
        let html = HtmlWriter::new().render(&course, &registry).unwrap().output;
        assert!(html.contains(concat!(
            "<section data-kind=\"multiple-choice\" id=\"q\" title=\"Quiz\">\n",
            "<p>Which?</p>\n",
            "<label><input type=\"checkbox\"> A</label>\n",
            "<label><input type=\"checkbox\" checked> B</label>\n",
            "</section>\n"
        )));

        let back = HtmlReader::new().parse_str(&html, &registry).unwrap();
        assert_eq!(back.children()[0].payload(), course.children()[0].payload());
        assert!(matches!(
            back.children()[0].payload(),
            Payload::MultipleChoice {
                selection: Selection::Single,
                ..
            }
        ));
    }

    #[test]
    fn test_styled_output() {
        let registry = Registry::standard();
        let course = course_with(&registry, vec![]);
        let styled = HtmlWriter::with_config(HtmlConfig { styled: true })
            .render(&course, &registry)
            .unwrap()
            .output;
        assert!(styled.contains("<style>"));
        assert!(styled.contains("max-width: 1024px;"));
        let plain = HtmlWriter::new().render(&course, &registry).unwrap().output;
        assert!(!plain.contains("<style>"));
    }

    #[test]
    fn test_unsupported_attribute_dropped() {
        let registry = Registry::standard();
        let raw = Unit::leaf(
            &registry,
            None,
            "",
            AttributeBag::new().with("Bad Key", "x").with("data-level", "2"),
            Payload::raw_html("<p>x</p>"),
        )
        .unwrap();
        let rendered = HtmlWriter::new()
            .render(&course_with(&registry, vec![raw]), &registry)
            .unwrap();
        assert!(rendered.output.contains("<section data-kind=\"raw-html\" data-level=\"2\">"));
        assert_eq!(rendered.warnings.len(), 1);
    }
}
