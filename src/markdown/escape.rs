//! Markdown text helpers for the writer.

use crate::codec::span::Span;

/// Backtick fence for a block body.
///
/// A body line made only of backticks closes any fence no longer than
/// itself, so the fence is one longer than the longest such line.
pub fn fence_for(body: &str) -> String {
    let longest = body
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.is_empty() && line.chars().all(|c| c == '`'))
        .map(str::len)
        .max()
        .unwrap_or(0);
    "`".repeat(longest.max(2) + 1)
}

/// Whether the last line of `text` would be read back as an attribute span.
pub fn ends_with_span(text: &str) -> bool {
    text.lines()
        .last()
        .is_some_and(|line| Span::split_trailing(line).is_some())
}

/// Escape text used as image alt text or a link title.
pub fn escape_inline(text: &str, specials: &[char]) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c == '\\' || specials.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Reverse [`escape_inline`].
pub fn unescape_inline(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == '\\'
            && let Some(next) = chars.next()
        {
            out.push(next);
            continue;
        }
        out.push(c);
    }
    out
}
