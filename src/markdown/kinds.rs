//! Markdown templates for each unit kind.
//!
//! `parse` recognizes a block by its fingerprint; `render` produces the
//! block text without the span. Kinds with a `fence_class` are written as
//! fenced blocks marked with that class.

use std::sync::LazyLock;

use regex::Regex;

use super::block::Block;
use super::escape::{escape_inline, unescape_inline};
use crate::codec::{escape_attr, unescape_html};
use crate::model::{Choice, Payload, Unit, UnitKind};
use crate::video;

/// A recognized leaf block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parsed {
    pub payload: Payload,
    /// Title carried in the block body rather than the span.
    pub title: Option<String>,
}

impl Parsed {
    fn new(payload: Payload) -> Self {
        Self {
            payload,
            title: None,
        }
    }
}

/// Markdown hooks of one kind.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownHooks {
    /// Class marking fenced blocks of this kind.
    pub fence_class: Option<&'static str>,
    /// Class added to blocks whose body alone does not read back as this kind.
    pub marker_class: Option<&'static str>,
    /// Whether the title is written inside the block body.
    pub title_in_body: bool,
    pub parse: Option<fn(&Block) -> Option<Parsed>>,
    pub render: Option<fn(&Unit) -> String>,
}

pub(crate) fn hooks(kind: UnitKind) -> MarkdownHooks {
    match kind {
        UnitKind::Collection => MarkdownHooks::default(),
        UnitKind::Video => MarkdownHooks {
            fence_class: None,
            marker_class: Some(VIDEO_CLASS),
            title_in_body: true,
            parse: Some(parse_video),
            render: Some(render_video),
        },
        UnitKind::FreeTextQuestion => MarkdownHooks {
            fence_class: Some("free-text"),
            marker_class: None,
            title_in_body: false,
            parse: Some(parse_free_text),
            render: Some(render_free_text),
        },
        UnitKind::MultipleChoiceQuestion => MarkdownHooks {
            fence_class: Some("question"),
            marker_class: None,
            title_in_body: false,
            parse: Some(parse_multiple_choice),
            render: Some(render_multiple_choice),
        },
        UnitKind::RawHtml => MarkdownHooks {
            fence_class: None,
            marker_class: None,
            title_in_body: false,
            parse: None,
            render: Some(render_raw_html),
        },
        UnitKind::IFrame => MarkdownHooks {
            fence_class: None,
            marker_class: None,
            title_in_body: false,
            parse: Some(parse_iframe),
            render: Some(render_iframe),
        },
        UnitKind::Survey => MarkdownHooks {
            fence_class: Some("survey"),
            marker_class: None,
            title_in_body: false,
            parse: Some(parse_survey),
            render: Some(render_survey),
        },
    }
}

/// Marks an image line as a video whatever its URL.
const VIDEO_CLASS: &str = "video";

/// `![alt](url)` or `![alt](url "transcript")`.
static IMAGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^!\[(?P<alt>(?:[^\]\\]|\\.)*)\]\((?P<url>[^\s)]+)(?:\s+"(?P<title>(?:[^"\\]|\\.)*)")?\)$"#)
        .unwrap()
});

/// `<iframe src="URL"></iframe>`.
static IFRAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^<iframe\s+src="(?P<src>[^"]*)"\s*>\s*</iframe>$"#).unwrap()
});

fn parse_video(block: &Block) -> Option<Parsed> {
    if block.fenced {
        return None;
    }
    let mut sources = Vec::new();
    let mut title = None;
    let mut transcript = None;
    for line in block.lines() {
        let caps = IMAGE_RE.captures(line)?;
        let url = caps.name("url")?.as_str();
        if sources.is_empty() {
            if !video::is_video_source(url) && !block.has_class(VIDEO_CLASS) {
                return None;
            }
            title = caps.name("alt").map(|alt| unescape_inline(alt.as_str()));
        }
        if transcript.is_none() {
            transcript = caps.name("title").map(|t| unescape_inline(t.as_str()));
        }
        sources.push(url.to_string());
    }
    if sources.is_empty() {
        return None;
    }
    Some(Parsed {
        payload: Payload::Video {
            sources,
            transcript,
        },
        title,
    })
}

fn render_video(unit: &Unit) -> String {
    let Payload::Video {
        sources,
        transcript,
    } = unit.payload()
    else {
        return String::new();
    };
    sources
        .iter()
        .enumerate()
        .map(|(i, url)| {
            let alt = if i == 0 {
                escape_inline(unit.title(), &['[', ']'])
            } else {
                String::new()
            };
            match transcript {
                Some(t) if i == 0 => format!("![{alt}]({url} \"{}\")", escape_inline(t, &['"'])),
                _ => format!("![{alt}]({url})"),
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn parse_iframe(block: &Block) -> Option<Parsed> {
    if block.fenced || block.text.trim().lines().count() != 1 {
        return None;
    }
    let caps = IFRAME_RE.captures(block.text.trim())?;
    let src = unescape_html(caps.name("src")?.as_str()).into_owned();
    let payload = match video::youtube_embed_id(&src) {
        Some(id) => Payload::video(vec![video::watch_url(id)]),
        None => Payload::IFrame { src },
    };
    Some(Parsed::new(payload))
}

fn render_iframe(unit: &Unit) -> String {
    match unit.payload() {
        Payload::IFrame { src } => format!("<iframe src=\"{}\"></iframe>", escape_attr(src)),
        _ => String::new(),
    }
}

fn parse_multiple_choice(block: &Block) -> Option<Parsed> {
    if !block.fenced || !block.has_class("question") {
        return None;
    }
    let mut question = Vec::new();
    let mut choices = Vec::new();
    for line in block.lines() {
        if let Some(text) = line.strip_prefix("- [x] ").or_else(|| line.strip_prefix("- [X] ")) {
            choices.push(Choice::new(text, true));
        } else if let Some(text) = line.strip_prefix("- [ ] ") {
            choices.push(Choice::new(text, false));
        } else {
            question.push(line);
        }
    }
    Some(Parsed::new(Payload::multiple_choice(
        question.join("\n"),
        choices,
    )))
}

fn render_multiple_choice(unit: &Unit) -> String {
    let Payload::MultipleChoice {
        question, choices, ..
    } = unit.payload()
    else {
        return String::new();
    };
    let mut lines: Vec<String> = question_lines(question);
    lines.extend(choices.iter().map(|choice| {
        let mark = if choice.correct { 'x' } else { ' ' };
        format!("- [{mark}] {}", choice.text)
    }));
    lines.join("\n")
}

fn parse_free_text(block: &Block) -> Option<Parsed> {
    if !block.fenced || !block.has_class("free-text") {
        return None;
    }
    let mut question = Vec::new();
    let mut answers = Vec::new();
    for line in block.lines() {
        match line.strip_prefix("- ") {
            Some(answer) => answers.push(answer.trim().to_string()),
            None => question.push(line),
        }
    }
    Some(Parsed::new(Payload::FreeText {
        question: question.join("\n"),
        answers,
    }))
}

fn render_free_text(unit: &Unit) -> String {
    let Payload::FreeText { question, answers } = unit.payload() else {
        return String::new();
    };
    let mut lines = question_lines(question);
    lines.extend(answers.iter().map(|answer| format!("- {answer}")));
    lines.join("\n")
}

fn parse_survey(block: &Block) -> Option<Parsed> {
    if !block.fenced || !block.has_class("survey") {
        return None;
    }
    let mut questions = Vec::new();
    let mut answers = Vec::new();
    let mut feedback = Vec::new();
    for line in block.lines() {
        if let Some(q) = line.strip_prefix('?') {
            questions.push(q.trim().to_string());
        } else if let Some(a) = line.strip_prefix('-') {
            answers.push(a.trim().to_string());
        } else if let Some(f) = line.strip_prefix('>') {
            feedback.push(f.trim());
        }
    }
    Some(Parsed::new(Payload::Survey {
        questions,
        answers,
        feedback: feedback.join("\n"),
    }))
}

fn render_survey(unit: &Unit) -> String {
    let Payload::Survey {
        questions,
        answers,
        feedback,
    } = unit.payload()
    else {
        return String::new();
    };
    let mut lines: Vec<String> = questions.iter().map(|q| format!("? {q}")).collect();
    lines.extend(answers.iter().map(|a| format!("- {a}")));
    lines.extend(
        feedback
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(|l| format!("> {}", l.trim())),
    );
    lines.join("\n")
}

fn render_raw_html(unit: &Unit) -> String {
    match unit.payload() {
        Payload::RawHtml { contents } => contents.clone(),
        _ => String::new(),
    }
}

fn question_lines(question: &str) -> Vec<String> {
    question
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}
