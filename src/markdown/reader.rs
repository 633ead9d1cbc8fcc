//! Markdown reader.
//!
//! Headings open collections, other blocks become leaves of the innermost
//! open collection. Blocks no kind claims are raw HTML passthrough;
//! consecutive passthrough blocks without a span form one unit.

use std::fs;
use std::path::Path;

use tracing::debug;

use super::block::{Block, Item, lex};
use super::kinds::Parsed;
use crate::codec::span::Span;
use crate::codec::{collect_pairs, take_last};
use crate::error::{Error, Result};
use crate::format::{Format, Reader};
use crate::model::{Course, KindSpec, Outline, Payload, Registry, Unit};
use crate::util::decode_text;

/// Reader for Markdown course files.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownReader;

impl MarkdownReader {
    pub fn new() -> Self {
        Self
    }

    /// Parse a Markdown document into a course.
    pub fn parse_str(&self, src: &str, registry: &Registry) -> Result<Course> {
        let mut items = lex(src)?.into_iter();

        let root = match items.next() {
            None => return Err(Error::format(Format::Markdown, "empty document")),
            Some(Item::Heading {
                depth: 1,
                title,
                span,
                line,
            }) => collection(registry, title, span, line)?,
            Some(Item::Heading { line, .. }) => {
                return Err(Error::format(
                    Format::Markdown,
                    format!("line {line}: the first heading must have depth 1"),
                ));
            }
            Some(Item::Block(block)) => {
                return Err(Error::format(
                    Format::Markdown,
                    format!("line {}: text before the course heading", block.line),
                ));
            }
        };

        let mut builder = TreeBuilder {
            registry,
            outline: Outline::new(registry, root, 1),
            pending: None,
        };
        for item in items {
            match item {
                Item::Heading {
                    depth,
                    title,
                    span,
                    line,
                } => builder.heading(depth, title, span, line)?,
                Item::Block(block) => builder.block(block)?,
            }
        }
        let root = builder.finish()?;
        Course::new(registry, root)
    }
}

impl Reader for MarkdownReader {
    fn read(&self, source: &Path, registry: &Registry) -> Result<Course> {
        debug!(path = %source.display(), "reading Markdown");
        let bytes = fs::read(source)?;
        self.parse_str(&decode_text(&bytes, Format::Markdown, None)?, registry)
    }
}

/// Passthrough text waiting for its span.
struct Pending {
    text: String,
    line: usize,
}

struct TreeBuilder<'r> {
    registry: &'r Registry,
    outline: Outline<'r>,
    pending: Option<Pending>,
}

impl TreeBuilder<'_> {
    fn heading(
        &mut self,
        depth: usize,
        title: String,
        span: Option<Span>,
        line: usize,
    ) -> Result<()> {
        self.flush(None, line)?;
        if depth == 1 {
            return Err(Error::format(
                Format::Markdown,
                format!("line {line}: a course has a single depth 1 heading"),
            ));
        }

        let unit = collection(self.registry, title, span, line)?;
        self.outline.open(depth, unit, &format!("line {line}"))
    }

    fn block(&mut self, block: Block) -> Result<()> {
        if let Some((spec, parsed)) = claim(self.registry, &block) {
            debug!(line = block.line, kind = %spec.kind, "claimed block");
            self.flush(None, block.line)?;
            let unit = leaf(self.registry, spec, parsed, block.span, block.line)?;
            return self.append(unit);
        }

        // An attributed fence nobody claimed is kept as written.
        let (text, span) = if block.fenced {
            (block.source, None)
        } else {
            (block.text, block.span)
        };
        let pending = self.pending.get_or_insert_with(|| Pending {
            text: String::new(),
            line: block.line,
        });
        if !text.trim().is_empty() {
            if !pending.text.is_empty() {
                pending.text.push_str("\n\n");
            }
            pending.text.push_str(&text);
        }
        if span.is_some() {
            self.flush(span, block.line)?;
        }
        Ok(())
    }

    /// Turn pending passthrough text into a raw HTML unit.
    fn flush(&mut self, span: Option<Span>, line: usize) -> Result<()> {
        let (text, line) = match self.pending.take() {
            Some(pending) => (pending.text, pending.line),
            None if span.is_some() => (String::new(), line),
            None => return Ok(()),
        };
        let parsed = Parsed {
            payload: Payload::raw_html(text),
            title: None,
        };
        let spec = self.registry.spec(parsed.payload.kind());
        let unit = leaf(self.registry, spec, parsed, span, line)?;
        self.append(unit)
    }

    fn append(&mut self, unit: Unit) -> Result<()> {
        self.outline.push(unit)
    }

    fn finish(mut self) -> Result<Unit> {
        self.flush(None, 0)?;
        self.outline.finish()
    }
}

/// Offer a block to each kind's parse hook, in registry order.
pub(super) fn claim<'r>(registry: &'r Registry, block: &Block) -> Option<(&'r KindSpec, Parsed)> {
    registry.iter().find_map(|spec| {
        let parse = spec.markdown.parse?;
        parse(block).map(|parsed| (spec, parsed))
    })
}

/// Split a span into identifier and raw pairs; classes come first as `class`.
fn span_pairs(span: Option<Span>) -> (Option<String>, Vec<(String, String)>) {
    let Some(span) = span else {
        return (None, Vec::new());
    };
    let mut pairs = Vec::with_capacity(span.pairs.len() + 1);
    if !span.classes.is_empty() {
        pairs.push(("class".to_string(), span.classes.join(" ")));
    }
    pairs.extend(span.pairs);
    (span.id, pairs)
}

fn collection(registry: &Registry, title: String, span: Option<Span>, line: usize) -> Result<Unit> {
    let mut warnings = Vec::new();
    let (id, pairs) = span_pairs(span);
    let attributes = collect_pairs(pairs, id.as_deref(), &mut warnings);
    let mut unit = Unit::collection(registry, id, title, attributes, Vec::new())
        .map_err(|err| at_line(err, line))?;
    unit.extend_warnings(warnings);
    Ok(unit)
}

fn leaf(
    registry: &Registry,
    spec: &KindSpec,
    parsed: Parsed,
    span: Option<Span>,
    line: usize,
) -> Result<Unit> {
    let span = span.map(|mut span| {
        let hooks = spec.markdown;
        for class in hooks.fence_class.into_iter().chain(hooks.marker_class) {
            span.remove_class(class);
        }
        span
    });
    let mut warnings = Vec::new();
    let (id, mut pairs) = span_pairs(span);
    let span_title = take_last(&mut pairs, "title", id.as_deref(), &mut warnings);
    let attributes = collect_pairs(pairs, id.as_deref(), &mut warnings);
    let title = parsed
        .title
        .filter(|t| !t.is_empty())
        .or(span_title)
        .unwrap_or_default();
    let mut unit = Unit::leaf(registry, id, title, attributes, parsed.payload)
        .map_err(|err| at_line(err, line))?;
    unit.extend_warnings(warnings);
    Ok(unit)
}

/// Report construction errors as format errors at a line.
fn at_line(err: Error, line: usize) -> Error {
    match err {
        Error::Schema(message) => {
            Error::format(Format::Markdown, format!("line {line}: {message}"))
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WarningKind;
    use crate::model::{Choice, Selection, UnitKind};

    fn parse(src: &str) -> Result<Course> {
        MarkdownReader::new().parse_str(src, &Registry::standard())
    }

    #[test]
    fn test_course_heading() {
        let course = parse("# Intro to Rust {#rust101 org=\"acme\"}").unwrap();
        assert_eq!(course.title(), "Intro to Rust");
        assert_eq!(course.id(), "rust101");
        assert_eq!(course.attributes().get_text("org").as_deref(), Some("acme"));
        assert_eq!(course.unit_count(), 0);
    }

    #[test]
    fn test_document_must_start_with_course_heading() {
        assert!(matches!(parse(""), Err(Error::Format { .. })));
        assert!(matches!(parse("  \n\n"), Err(Error::Format { .. })));
        assert!(matches!(parse("intro\n# Course"), Err(Error::Format { .. })));
        assert!(matches!(parse("## Unit"), Err(Error::Format { .. })));
        assert!(matches!(parse("# A\n# B"), Err(Error::Format { .. })));
    }

    #[test]
    fn test_nested_collections() {
        let course = parse("# C\n## W1\n### L1\ntext\n### L2\n## W2").unwrap();
        let outline: Vec<_> = course
            .walk()
            .map(|(depth, unit)| (depth, unit.title().to_string()))
            .collect();
        assert_eq!(
            outline,
            vec![
                (0, "C".to_string()),
                (1, "W1".to_string()),
                (2, "L1".to_string()),
                (3, String::new()),
                (2, "L2".to_string()),
                (1, "W2".to_string()),
            ]
        );
    }

    #[test]
    fn test_depth_gap_synthesizes_collection() {
        let course = parse("# C\n### Deep\ntext").unwrap();
        let filler = &course.children()[0];
        assert!(filler.is_collection());
        assert_eq!(filler.title(), "");
        assert!(filler.is_synthesized());
        assert_eq!(filler.warnings()[0].kind, WarningKind::HeadingDepthGap);
        assert_eq!(filler.children()[0].title(), "Deep");
    }

    #[test]
    fn test_passthrough_blocks_merge() {
        let course = parse("# C\n<p>one</p>\n\n<p>two</p>\n\n<p>three</p> {#p3}\n\n<p>four</p>").unwrap();
        let texts: Vec<_> = course
            .children()
            .iter()
            .map(|u| match u.payload() {
                Payload::RawHtml { contents } => contents.clone(),
                _ => panic!("expected raw html"),
            })
            .collect();
        assert_eq!(
            texts,
            vec!["<p>one</p>\n\n<p>two</p>\n\n<p>three</p>", "<p>four</p>"]
        );
        assert_eq!(course.children()[0].explicit_id(), Some("p3"));
    }

    #[test]
    fn test_multiple_choice_block() {
        let course = parse(
            "# C\n```{.question #q1 title=\"Check\" points=2}\nPick one\n- [ ] A\n- [x] B\n```",
        )
        .unwrap();
        let q = &course.children()[0];
        assert_eq!(q.kind(), UnitKind::MultipleChoiceQuestion);
        assert_eq!(q.id(), "q1");
        assert_eq!(q.title(), "Check");
        assert!(!q.attributes().contains_key("class"));
        assert!(!q.attributes().contains_key("title"));
        assert_eq!(q.attributes().get_text("points").as_deref(), Some("2"));
        assert_eq!(
            q.payload(),
            &Payload::MultipleChoice {
                question: "Pick one".into(),
                choices: vec![Choice::new("A", false), Choice::new("B", true)],
                selection: Selection::Single,
            }
        );
    }

    #[test]
    fn test_video_block() {
        let course = parse("# C\n![Welcome](https://youtu.be/abc) {#v1 start_time=5}").unwrap();
        let video = &course.children()[0];
        assert_eq!(video.kind(), UnitKind::Video);
        assert_eq!(video.title(), "Welcome");
        assert_eq!(video.attributes().get("start_time").and_then(|v| v.as_integer()), Some(5));
    }

    #[test]
    fn test_unclaimed_fence_is_passthrough() {
        let course = parse("# C\n```{.rust}\nfn main() {}\n```").unwrap();
        let raw = &course.children()[0];
        assert_eq!(
            raw.payload(),
            &Payload::RawHtml {
                contents: "```{.rust}\nfn main() {}\n```".into()
            }
        );
    }

    #[test]
    fn test_empty_question_is_format_error() {
        let err = parse("# C\n\n```{.question}\nNo choices\n```").unwrap_err();
        assert!(matches!(err, Error::Format { ref message, .. } if message.starts_with("line 3")));
    }

    #[test]
    fn test_bad_typed_attribute() {
        let err = parse("# C\n<iframe src=\"https://x.org\"></iframe> {width=wide}").unwrap_err();
        assert!(matches!(err, Error::Coercion { ref key, .. } if key == "width"));
    }

    #[test]
    fn test_duplicate_attribute_warning() {
        let course = parse("# C\ntext {a=1 a=2}").unwrap();
        let unit = &course.children()[0];
        assert_eq!(unit.attributes().get_text("a").as_deref(), Some("2"));
        assert_eq!(unit.warnings()[0].kind, WarningKind::DuplicateAttribute);
    }
}
