//! HTML templates for each unit kind.
//!
//! `render` writes the body of a leaf `<section>`, one element per line;
//! `parse` reads it back from the parsed section.

use std::fmt::Write as _;

use crate::codec::{escape_attr, escape_text};
use crate::dom::{Document, NodeId, inner_html};
use crate::error::{Error, Result};
use crate::format::Format;
use crate::model::{Choice, Payload, Unit, UnitKind};
use crate::video;

/// HTML hooks of one kind.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlHooks {
    pub parse: Option<fn(&Document, NodeId) -> Result<Payload>>,
    pub render: Option<fn(&Unit, &mut String)>,
}

pub(crate) fn hooks(kind: UnitKind) -> HtmlHooks {
    match kind {
        UnitKind::Collection => HtmlHooks::default(),
        UnitKind::Video => leaf(parse_video, render_video),
        UnitKind::FreeTextQuestion => leaf(parse_free_text, render_free_text),
        UnitKind::MultipleChoiceQuestion => leaf(parse_multiple_choice, render_multiple_choice),
        UnitKind::RawHtml => leaf(parse_raw_html, render_raw_html),
        UnitKind::IFrame => leaf(parse_iframe, render_iframe),
        UnitKind::Survey => leaf(parse_survey, render_survey),
    }
}

fn leaf(
    parse: fn(&Document, NodeId) -> Result<Payload>,
    render: fn(&Unit, &mut String),
) -> HtmlHooks {
    HtmlHooks {
        parse: Some(parse),
        render: Some(render),
    }
}

const CORRECT: char = '✅';
const INCORRECT: char = '❌';

fn missing(section: &str, what: &str) -> Error {
    Error::format(Format::Html, format!("{section} section without {what}"))
}

fn text_of(doc: &Document, node: NodeId) -> String {
    doc.text(node).trim().to_string()
}

/// Trimmed texts of every descendant with a tag.
fn texts(doc: &Document, node: NodeId, tag: &str) -> Vec<String> {
    doc.find_all_by_tag(node, tag)
        .into_iter()
        .map(|n| text_of(doc, n))
        .collect()
}

fn first_text(doc: &Document, node: NodeId, tag: &str) -> Option<String> {
    doc.find_by_tag(node, tag).map(|n| text_of(doc, n))
}

fn write_paragraph(out: &mut String, text: &str) {
    let _ = writeln!(out, "<p>{}</p>", escape_text(text));
}

fn write_list(out: &mut String, items: &[String]) {
    out.push_str("<ul>\n");
    for item in items {
        let _ = writeln!(out, "<li>{}</li>", escape_text(item));
    }
    out.push_str("</ul>\n");
}

fn parse_raw_html(doc: &Document, node: NodeId) -> Result<Payload> {
    Ok(Payload::raw_html(inner_html(doc, node)))
}

fn render_raw_html(unit: &Unit, out: &mut String) {
    if let Payload::RawHtml { contents } = unit.payload()
        && !contents.is_empty()
    {
        out.push_str(contents);
        out.push('\n');
    }
}

fn parse_video(doc: &Document, node: NodeId) -> Result<Payload> {
    let mut sources = Vec::new();
    if let Some(id) = doc
        .find_by_tag(node, "iframe")
        .and_then(|iframe| doc.get_attr(iframe, "src"))
        .and_then(video::youtube_embed_id)
    {
        sources.push(video::watch_url(id));
    }

    let mut transcript = None;
    if let Some(player) = doc.find_by_tag(node, "video") {
        let direct = doc.get_attr(player, "src").into_iter();
        let nested = doc
            .find_all_by_tag(player, "source")
            .into_iter()
            .filter_map(|source| doc.get_attr(source, "src"));
        for src in direct.chain(nested) {
            if !sources.iter().any(|s| s == src) {
                sources.push(src.to_string());
            }
        }
        transcript = doc
            .find_all_by_tag(player, "track")
            .into_iter()
            .find(|&track| doc.get_attr(track, "kind").is_none_or(|k| k == "captions"))
            .and_then(|track| doc.get_attr(track, "src"))
            .map(str::to_string);
    }

    if sources.is_empty() {
        return Err(missing("video", "a YouTube <iframe> or <video> source"));
    }
    Ok(Payload::Video {
        sources,
        transcript,
    })
}

fn render_video(unit: &Unit, out: &mut String) {
    let Payload::Video {
        sources,
        transcript,
    } = unit.payload()
    else {
        return;
    };
    let mut rest = sources.as_slice();
    if let Some((first, tail)) = sources.split_first()
        && let Some(id) = video::youtube_id(first)
    {
        let _ = writeln!(
            out,
            "<iframe src=\"{}\" allowfullscreen></iframe>",
            escape_attr(&video::embed_url(id))
        );
        rest = tail;
    }
    if rest.is_empty() && transcript.is_none() {
        return;
    }
    out.push_str("<video controls>\n");
    for src in rest {
        let _ = writeln!(out, "<source src=\"{}\">", escape_attr(src));
    }
    if let Some(transcript) = transcript {
        let _ = writeln!(
            out,
            "<track kind=\"captions\" src=\"{}\">",
            escape_attr(transcript)
        );
    }
    out.push_str("</video>\n");
}

fn parse_iframe(doc: &Document, node: NodeId) -> Result<Payload> {
    let src = doc
        .find_by_tag(node, "iframe")
        .and_then(|iframe| doc.get_attr(iframe, "src"))
        .ok_or_else(|| missing("iframe", "an <iframe src>"))?;
    Ok(Payload::IFrame {
        src: src.to_string(),
    })
}

fn render_iframe(unit: &Unit, out: &mut String) {
    if let Payload::IFrame { src } = unit.payload() {
        let _ = writeln!(out, "<iframe src=\"{}\"></iframe>", escape_attr(src));
    }
}

fn parse_multiple_choice(doc: &Document, node: NodeId) -> Result<Payload> {
    let question = first_text(doc, node, "p").unwrap_or_default();
    let mut choices: Vec<Choice> = doc
        .find_all_by_tag(node, "label")
        .into_iter()
        .map(|label| {
            let correct = doc
                .find_by_tag(label, "input")
                .is_some_and(|input| doc.get_attr(input, "checked").is_some());
            Choice::new(doc.text(label), correct)
        })
        .collect();

    // Older documents mark list items instead of using checkboxes.
    if choices.is_empty() {
        for item in texts(doc, node, "li") {
            let choice = if let Some(text) = item.strip_prefix(CORRECT) {
                Choice::new(text, true)
            } else if let Some(text) = item.strip_prefix(INCORRECT) {
                Choice::new(text, false)
            } else {
                return Err(Error::format(
                    Format::Html,
                    format!("choice {item:?} is neither a checkbox nor marked {CORRECT} or {INCORRECT}"),
                ));
            };
            choices.push(choice);
        }
    }
    Ok(Payload::multiple_choice(question, choices))
}

fn render_multiple_choice(unit: &Unit, out: &mut String) {
    let Payload::MultipleChoice {
        question, choices, ..
    } = unit.payload()
    else {
        return;
    };
    write_paragraph(out, question);
    for choice in choices {
        let checked = if choice.correct { " checked" } else { "" };
        let _ = writeln!(
            out,
            "<label><input type=\"checkbox\"{checked}> {}</label>",
            escape_text(&choice.text)
        );
    }
}

fn parse_free_text(doc: &Document, node: NodeId) -> Result<Payload> {
    Ok(Payload::FreeText {
        question: first_text(doc, node, "p").unwrap_or_default(),
        answers: texts(doc, node, "li"),
    })
}

fn render_free_text(unit: &Unit, out: &mut String) {
    if let Payload::FreeText { question, answers } = unit.payload() {
        write_paragraph(out, question);
        write_list(out, answers);
    }
}

fn parse_survey(doc: &Document, node: NodeId) -> Result<Payload> {
    let questions = doc
        .find_all_by_tag(node, "p")
        .into_iter()
        .filter(|&p| doc.find_by_tag(p, "code").is_none())
        .map(|p| text_of(doc, p))
        .collect();
    Ok(Payload::Survey {
        questions,
        answers: texts(doc, node, "li"),
        feedback: first_text(doc, node, "code").unwrap_or_default(),
    })
}

fn render_survey(unit: &Unit, out: &mut String) {
    let Payload::Survey {
        questions,
        answers,
        feedback,
    } = unit.payload()
    else {
        return;
    };
    for question in questions {
        write_paragraph(out, question);
    }
    write_list(out, answers);
    if !feedback.is_empty() {
        let _ = writeln!(out, "<code>{}</code>", escape_text(feedback));
    }
}
