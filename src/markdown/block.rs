//! Line-based block lexer.
//!
//! Splits Markdown text into headings, fenced blocks and paragraphs, and
//! strips the attribute span that may end each of them.

use crate::codec::span::Span;
use crate::error::{Error, Result};
use crate::format::Format;

/// A content block offered to the kind hooks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    /// Block text without fence lines or trailing span.
    pub text: String,
    /// Whether the block was fenced with a span as info string.
    pub fenced: bool,
    pub span: Option<Span>,
    /// 1-based line of the block start.
    pub line: usize,
    /// The block as written, fences and span included.
    pub source: String,
}

impl Block {
    /// Whether the block's span carries a class.
    pub fn has_class(&self, class: &str) -> bool {
        self.span.as_ref().is_some_and(|span| span.has_class(class))
    }

    /// Non-blank lines, trimmed.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.lines().map(str::trim).filter(|l| !l.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Item {
    Heading {
        depth: usize,
        title: String,
        span: Option<Span>,
        line: usize,
    },
    Block(Block),
}

/// Split a document into items.
pub(crate) fn lex(src: &str) -> Result<Vec<Item>> {
    let lines: Vec<&str> = src.lines().collect();
    let mut items = Vec::new();
    let mut paragraph: Vec<&str> = Vec::new();
    let mut paragraph_start = 0;
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];
        let line_no = i + 1;

        if line.trim().is_empty() {
            flush_paragraph(&mut paragraph, paragraph_start, &mut items);
            i += 1;
            continue;
        }

        if let Some((depth, rest)) = heading(line) {
            flush_paragraph(&mut paragraph, paragraph_start, &mut items);
            let (title, span) = match Span::split_trailing(rest) {
                Some((title, span)) => (title.to_string(), Some(span)),
                None => (rest.trim().to_string(), None),
            };
            items.push(Item::Heading {
                depth,
                title,
                span,
                line: line_no,
            });
            i += 1;
            continue;
        }

        if let Some((fence_char, fence_len, info)) = fence_open(line) {
            flush_paragraph(&mut paragraph, paragraph_start, &mut items);
            let close = lines[i + 1..]
                .iter()
                .position(|l| is_fence_close(l, fence_char, fence_len))
                .map(|offset| i + 1 + offset)
                .ok_or_else(|| {
                    Error::format(
                        Format::Markdown,
                        format!("line {line_no}: unclosed fenced block"),
                    )
                })?;
            let source = lines[i..=close].join("\n");
            let block = match Span::parse(info) {
                Some(span) => Block {
                    text: lines[i + 1..close].join("\n"),
                    fenced: true,
                    span: Some(span),
                    line: line_no,
                    source,
                },
                // Not an attributed fence: the whole fence is passthrough text.
                None => Block {
                    text: source.clone(),
                    fenced: false,
                    span: None,
                    line: line_no,
                    source,
                },
            };
            items.push(Item::Block(block));
            i = close + 1;
            continue;
        }

        if paragraph.is_empty() {
            paragraph_start = line_no;
        }
        paragraph.push(line);
        i += 1;
    }
    flush_paragraph(&mut paragraph, paragraph_start, &mut items);

    Ok(items)
}

fn flush_paragraph(paragraph: &mut Vec<&str>, start: usize, items: &mut Vec<Item>) {
    if paragraph.is_empty() {
        return;
    }
    let source = paragraph.join("\n");
    let mut span = None;
    if let Some(last) = paragraph.pop() {
        match Span::split_trailing(last) {
            Some((content, parsed)) => {
                span = Some(parsed);
                if !content.is_empty() {
                    paragraph.push(content);
                }
            }
            None => paragraph.push(last),
        }
    }
    items.push(Item::Block(Block {
        text: paragraph.join("\n"),
        fenced: false,
        span,
        line: start,
        source,
    }));
    paragraph.clear();
}

/// Parse an ATX heading: 1-6 `#`, then a space or the end of the line.
fn heading(line: &str) -> Option<(usize, &str)> {
    let depth = line.bytes().take_while(|&b| b == b'#').count();
    if !(1..=6).contains(&depth) {
        return None;
    }
    let rest = &line[depth..];
    if rest.is_empty() {
        return Some((depth, rest));
    }
    rest.strip_prefix([' ', '\t']).map(|rest| (depth, rest))
}

/// Parse a fence opening line: at least three backticks or tildes.
fn fence_open(line: &str) -> Option<(char, usize, &str)> {
    let fence_char = line.chars().next().filter(|c| matches!(c, '`' | '~'))?;
    let len = line.chars().take_while(|&c| c == fence_char).count();
    if len < 3 {
        return None;
    }
    Some((fence_char, len, line[len..].trim()))
}

fn is_fence_close(line: &str, fence_char: char, min_len: usize) -> bool {
    let line = line.trim_end();
    line.chars().count() >= min_len && line.chars().all(|c| c == fence_char)
}
