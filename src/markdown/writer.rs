//! Markdown writer.

use std::path::Path;

use tracing::debug;

use super::MarkdownConfig;
use super::block::Block;
use super::escape::{ends_with_span, fence_for};
use super::reader::claim;
use crate::codec::span::Span;
use crate::error::{Error, Result, Warning, WarningKind};
use crate::format::{Format, OverwritePolicy, Rendered, Writer};
use crate::model::{Course, Registry, Unit, UnitKind};
use crate::output;

/// Writer for Markdown course files.
#[derive(Debug, Clone, Default)]
pub struct MarkdownWriter {
    config: MarkdownConfig,
    overwrite: OverwritePolicy,
}

impl MarkdownWriter {
    /// Create a new MarkdownWriter with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a MarkdownWriter with the specified configuration.
    pub fn with_config(config: MarkdownConfig) -> Self {
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

    /// Render a course as Markdown text, without a trailing newline.
    pub fn render(&self, course: &Course, registry: &Registry) -> Result<Rendered<String>> {
        let mut ctx = RenderContext {
            registry,
            max_level: usize::from(self.config.max_heading_level.clamp(1, 6)),
            blocks: Vec::new(),
            warnings: Vec::new(),
        };
        ctx.collection(course.root(), 0)?;

        let mut output = String::new();
        let mut after_heading = false;
        for (i, block) in ctx.blocks.iter().enumerate() {
            if i > 0 {
                output.push_str(if after_heading { "\n" } else { "\n\n" });
            }
            output.push_str(&block.text);
            after_heading = block.heading;
        }

        Ok(Rendered {
            output,
            warnings: ctx.warnings,
        })
    }
}

impl Writer for MarkdownWriter {
    fn write(
        &self,
        course: &Course,
        destination: &Path,
        registry: &Registry,
    ) -> Result<Vec<Warning>> {
        let rendered = self.render(course, registry)?;
        let mut text = rendered.output;
        text.push('\n');
        output::publish_file(Format::Markdown, destination, text.as_bytes(), self.overwrite)?;
        Ok(rendered.warnings)
    }
}

struct OutBlock {
    text: String,
    heading: bool,
}

struct RenderContext<'r> {
    registry: &'r Registry,
    max_level: usize,
    blocks: Vec<OutBlock>,
    warnings: Vec<Warning>,
}

impl RenderContext<'_> {
    fn collection(&mut self, unit: &Unit, depth: usize) -> Result<()> {
        self.heading(unit, depth + 1);
        self.children(unit, depth)
    }

    fn children(&mut self, unit: &Unit, depth: usize) -> Result<()> {
        let children = unit.children();
        let mut last_collection: Option<&Unit> = None;
        for (i, child) in children.iter().enumerate() {
            let prev = i.checked_sub(1).map(|p| &children[p]);
            let next = children.get(i + 1);
            if child.is_collection() {
                let level = depth + 2;
                // The reader synthesizes this collection again from the gap.
                let implied = child.is_synthesized()
                    && level < self.max_level
                    && !prev.is_some_and(Unit::is_collection);
                if implied {
                    debug!(depth = depth + 1, "skipping synthesized collection");
                    self.children(child, depth + 1)?;
                } else {
                    self.collection(child, depth + 1)?;
                }
            } else {
                if let Some(collection) = last_collection {
                    self.warnings.push(Warning::new(
                        WarningKind::Reparented,
                        Some(child.id()),
                        format!(
                            "written after collection {:?}, which it joins when read back",
                            collection.id()
                        ),
                    ));
                }
                self.leaf(child, next)?;
            }
            if child.is_collection() {
                last_collection = Some(child);
            }
        }
        Ok(())
    }

    fn heading(&mut self, unit: &Unit, level: usize) {
        let level = if level > self.max_level {
            self.warnings.push(Warning::new(
                WarningKind::DepthOverflow,
                Some(unit.id()),
                format!(
                    "collection at heading level {level} written at level {}",
                    self.max_level
                ),
            ));
            self.max_level
        } else {
            level
        };

        let span = Span::from_attributes(
            unit.explicit_id(),
            unit.attributes(),
            &[],
            unit.id(),
            &mut self.warnings,
        );
        let mut text = "#".repeat(level);
        if !unit.title().is_empty() {
            text.push(' ');
            text.push_str(unit.title());
        }
        if !span.is_empty() {
            text.push(' ');
            text.push_str(&span.encode());
        } else if Span::split_trailing(unit.title()).is_some() {
            text.push_str(" {}");
        }
        self.blocks.push(OutBlock {
            text,
            heading: true,
        });
    }

    fn leaf(&mut self, unit: &Unit, next: Option<&Unit>) -> Result<()> {
        let spec = self.registry.spec(unit.kind());
        let hooks = spec.markdown;
        let render = hooks.render.ok_or_else(|| {
            Error::schema(format!("{} units cannot be written as Markdown", unit.kind()))
        })?;
        let body = render(unit);

        let mut span = Span::from_attributes(
            unit.explicit_id(),
            unit.attributes(),
            &["title"],
            unit.id(),
            &mut self.warnings,
        );
        if !hooks.title_in_body && !unit.title().is_empty() {
            span.pairs.insert(0, ("title".to_string(), unit.title().to_string()));
        }
        if let Some(class) = hooks.marker_class
            && !reads_back_as(self.registry, &body, unit.kind())
        {
            span.classes.insert(0, class.to_string());
        }

        let text = if let Some(class) = hooks.fence_class {
            span.classes.insert(0, class.to_string());
            let fence = fence_for(&body);
            format!("{fence}{}\n{body}\n{fence}", span.encode())
        } else if unit.kind() == UnitKind::RawHtml {
            raw_block(body, &span, next.is_some_and(|n| n.kind() == UnitKind::RawHtml))
        } else if span.is_empty() {
            body
        } else {
            format!("{body} {}", span.encode())
        };

        self.blocks.push(OutBlock {
            text,
            heading: false,
        });
        Ok(())
    }
}

/// Whether an unmarked block with this body is claimed by `kind`.
fn reads_back_as(registry: &Registry, body: &str, kind: UnitKind) -> bool {
    let block = Block {
        text: body.to_string(),
        fenced: false,
        span: None,
        line: 0,
        source: body.to_string(),
    };
    claim(registry, &block).is_some_and(|(spec, _)| spec.kind == kind)
}

/// Raw text followed by its span.
///
/// An empty `{}` span keeps the text apart from a following raw unit and
/// protects a last line that would read as a span.
fn raw_block(body: String, span: &Span, before_raw: bool) -> String {
    let marker = if !span.is_empty() {
        Some(span.encode())
    } else if body.is_empty() || before_raw || ends_with_span(&body) {
        Some(Span::default().encode())
    } else {
        None
    };
    let Some(marker) = marker else {
        return body;
    };
    let last = body.lines().last().unwrap_or_default().trim_start();
    if body.is_empty() {
        marker
    } else if last.starts_with("```") || last.starts_with("~~~") {
        format!("{body}\n{marker}")
    } else {
        format!("{body} {marker}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::MarkdownReader;
    use crate::model::{AttributeBag, Choice, Payload};

    fn round_trip(src: &str) -> String {
        let registry = Registry::standard();
        let course = MarkdownReader::new().parse_str(src, &registry).unwrap();
        MarkdownWriter::new().render(&course, &registry).unwrap().output
    }

    #[test]
    fn test_byte_exact_round_trip() {
        let src = "# Course\n## Unit 1\nSome text {#u1}";
        assert_eq!(round_trip(src), src);
    }

    #[test]
    fn test_round_trip_every_kind() {
        let src = concat!(
            "# Course {#c101 org=\"acme\"}\n",
            "## Week 1 {.intro}\n",
            "![Welcome](https://www.youtube.com/watch?v=abc \"https://example.com/welcome.vtt\")\n",
            "![](https://cdn.example.com/welcome.mp4) {#welcome}\n\n",
            "<iframe src=\"https://example.com/sim\"></iframe> {width=\"640\"}\n\n",
            "```{#q1 .question title=\"Check\"}\n",
            "Pick the even number\n",
            "- [ ] 3\n",
            "- [x] 4\n",
            "```\n\n",
            "```{.free-text}\n",
            "Capital of France?\n",
            "- Paris\n",
            "```\n\n",
            "```{.survey}\n",
            "? Did you like it?\n",
            "- Yes\n",
            "- No\n",
            "> Thanks\n",
            "```\n\n",
            "<p>one</p> {}\n\n",
            "<p>two</p>",
        );
        assert_eq!(round_trip(src), src);
    }

    #[test]
    fn test_protects_span_like_text() {
        let src = "# C\nfn main() {x=1} {}";
        assert_eq!(round_trip(src), src);
    }

    #[test]
    fn test_span_after_fenced_passthrough() {
        let src = "# C\n```python\nprint(1)\n```\n{#code}";
        assert_eq!(round_trip(src), src);
    }

    #[test]
    fn test_depth_gap_round_trip() {
        let src = "# C\n### Deep\ntext";
        assert_eq!(round_trip(src), src);
    }

    #[test]
    fn test_depth_overflow_flattened() {
        let registry = Registry::standard();
        let mut unit =
            Unit::collection(&registry, None, "L7", AttributeBag::new(), vec![]).unwrap();
        for title in ["L6", "L5", "L4", "L3", "L2"] {
            unit = Unit::collection(&registry, None, title, AttributeBag::new(), vec![unit])
                .unwrap();
        }
        let course =
            Course::from_parts(&registry, None, "C", AttributeBag::new(), vec![unit]).unwrap();
        let rendered = MarkdownWriter::new().render(&course, &registry).unwrap();
        assert!(rendered.output.ends_with("###### L6\n###### L7"));
        assert_eq!(rendered.warnings.len(), 1);
        assert_eq!(rendered.warnings[0].kind, WarningKind::DepthOverflow);
    }

    #[test]
    fn test_heading_level_config() {
        let registry = Registry::standard();
        let inner = Unit::collection(&registry, None, "B", AttributeBag::new(), vec![]).unwrap();
        let outer =
            Unit::collection(&registry, None, "A", AttributeBag::new(), vec![inner]).unwrap();
        let course =
            Course::from_parts(&registry, None, "C", AttributeBag::new(), vec![outer]).unwrap();
        let writer = MarkdownWriter::with_config(MarkdownConfig {
            max_heading_level: 2,
        });
        let rendered = writer.render(&course, &registry).unwrap();
        assert_eq!(rendered.output, "# C\n## A\n## B");
    }

    #[test]
    fn test_derived_ids_omitted() {
        let registry = Registry::standard();
        let question = Unit::leaf(
            &registry,
            None,
            "",
            AttributeBag::new(),
            Payload::multiple_choice("Q?", vec![Choice::new("A", false), Choice::new("B", true)]),
        )
        .unwrap();
        let course =
            Course::from_parts(&registry, None, "C", AttributeBag::new(), vec![question]).unwrap();
        let rendered = MarkdownWriter::new().render(&course, &registry).unwrap();
        assert_eq!(rendered.output, "# C\n```{.question}\nQ?\n- [ ] A\n- [x] B\n```");
        assert!(rendered.warnings.is_empty());
    }

    #[test]
    fn test_unrecognized_video_source_is_marked() {
        let registry = Registry::standard();
        let video = Unit::leaf(
            &registry,
            None,
            "Stream",
            AttributeBag::new(),
            Payload::video(vec!["https://cdn.example.com/stream".into()]),
        )
        .unwrap();
        let course =
            Course::from_parts(&registry, None, "C", AttributeBag::new(), vec![video]).unwrap();
        let rendered = MarkdownWriter::new().render(&course, &registry).unwrap();
        assert_eq!(rendered.output, "# C\n![Stream](https://cdn.example.com/stream) {.video}");

        let back = MarkdownReader::new().parse_str(&rendered.output, &registry).unwrap();
        let unit = &back.children()[0];
        assert_eq!(unit.kind(), UnitKind::Video);
        assert_eq!(unit.title(), "Stream");
        assert!(unit.attributes().get("class").is_none());
    }

    #[test]
    fn test_recognized_video_is_not_marked() {
        let src = "# C\n![](https://cdn.example.com/welcome.mp4)";
        assert_eq!(round_trip(src), src);
    }

    #[test]
    fn test_leaf_after_collection_warns() {
        let registry = Registry::standard();
        let week = Unit::collection(&registry, None, "Week", AttributeBag::new(), vec![]).unwrap();
        let after = Unit::leaf(
            &registry,
            Some("after".into()),
            "",
            AttributeBag::new(),
            Payload::raw_html("<p>after</p>"),
        )
        .unwrap();
        let course =
            Course::from_parts(&registry, None, "C", AttributeBag::new(), vec![week, after])
                .unwrap();
        let rendered = MarkdownWriter::new().render(&course, &registry).unwrap();
        assert_eq!(rendered.warnings.len(), 1);
        assert_eq!(rendered.warnings[0].kind, WarningKind::Reparented);
        assert_eq!(rendered.warnings[0].unit.as_deref(), Some("after"));
    }
}
