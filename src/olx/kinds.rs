//! OLX elements for each unit kind.
//!
//! A kind lists the element names it is read from, the element it is
//! written as, and the native attributes its hooks own. `parse` returns
//! `None` when the element is not this kind's variant (a `<problem>` may be
//! a multiple choice or a free text question), letting the next kind try.

use serde::{Deserialize, Serialize};

use super::Package;
use super::package::{decode_stem, encode_stem};
use crate::dom::{Document, NodeId, inner_html};
use crate::error::{Error, Result};
use crate::format::Format;
use crate::model::{Choice, Payload, Selection, Unit, UnitKind};
use crate::video;

/// An element being read, with its pointer attributes merged in.
pub struct OlxElement<'a> {
    pub doc: &'a Document,
    pub node: NodeId,
    pub attrs: &'a [(String, String)],
    pub package: &'a Package,
}

impl<'a> OlxElement<'a> {
    pub fn name(&self) -> &'a str {
        self.doc.element_name(self.node).unwrap_or_default()
    }

    /// Last value of an attribute.
    pub fn attr(&self, key: &str) -> Option<&'a str> {
        self.attrs
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn text_of(&self, tag: &str) -> Option<String> {
        self.doc
            .find_by_tag(self.node, tag)
            .map(|n| self.doc.text(n).trim().to_string())
    }
}

pub type ParseFn = fn(&OlxElement<'_>) -> Result<Option<Payload>>;
pub type RenderFn = fn(&Unit, &mut Document, NodeId, &mut Package) -> Result<()>;

/// OLX hooks of one kind.
#[derive(Debug, Clone, Copy, Default)]
pub struct OlxHooks {
    /// Elements read as this kind.
    pub elements: &'static [&'static str],
    /// Element a unit is written as. Collections are named by depth instead.
    pub element: Option<fn(&Unit) -> &'static str>,
    /// Attributes owned by the element rather than the attribute bag.
    pub native: &'static [&'static str],
    pub parse: Option<ParseFn>,
    pub render: Option<RenderFn>,
}

/// Container elements from the course down.
pub const CONTAINERS: &[&str] = &["course", "chapter", "sequential", "vertical"];

pub(crate) fn hooks(kind: UnitKind) -> OlxHooks {
    match kind {
        UnitKind::Collection => OlxHooks {
            elements: CONTAINERS,
            ..OlxHooks::default()
        },
        UnitKind::Video => leaf(
            &["video"],
            |_| "video",
            &["youtube_id_1_0", "youtube", "html5_sources"],
            parse_video,
            render_video,
        ),
        UnitKind::FreeTextQuestion => leaf(
            &["problem"],
            |_| "problem",
            &[],
            parse_free_text,
            render_free_text,
        ),
        UnitKind::MultipleChoiceQuestion => leaf(
            &["problem"],
            |_| "problem",
            &[],
            parse_multiple_choice,
            render_multiple_choice,
        ),
        UnitKind::RawHtml => leaf(&["html"], |_| "html", &["filename"], parse_html, render_html),
        UnitKind::IFrame => leaf(&["iframe"], |_| "iframe", &["src"], parse_iframe, render_iframe),
        UnitKind::Survey => leaf(
            &["poll", "survey"],
            survey_element,
            &["question", "questions", "answers", "feedback"],
            parse_survey,
            render_survey,
        ),
    }
}

fn leaf(
    elements: &'static [&'static str],
    element: fn(&Unit) -> &'static str,
    native: &'static [&'static str],
    parse: ParseFn,
    render: RenderFn,
) -> OlxHooks {
    OlxHooks {
        elements,
        element: Some(element),
        native,
        parse: Some(parse),
        render: Some(render),
    }
}

fn invalid(message: impl Into<String>) -> Error {
    Error::format(Format::Olx, message)
}

/// Path of the body file of an `<html filename="...">` element.
pub fn html_path(filename: &str) -> String {
    format!("html/{filename}.html")
}

fn parse_html(el: &OlxElement<'_>) -> Result<Option<Payload>> {
    let contents = match el.attr("filename") {
        Some(filename) => match el.package.get(&html_path(filename)) {
            Some(contents) => contents.to_string(),
            None => {
                return Err(invalid(format!(
                    "<html> body {} is missing (id {})",
                    html_path(filename),
                    decode_stem(filename)
                )));
            }
        },
        None => inner_html(el.doc, el.node),
    };
    Ok(Some(Payload::raw_html(contents)))
}

fn render_html(unit: &Unit, doc: &mut Document, node: NodeId, package: &mut Package) -> Result<()> {
    let Payload::RawHtml { contents } = unit.payload() else {
        return Ok(());
    };
    let filename = encode_stem(unit.id());
    package.insert(html_path(&filename), format!("{contents}\n"));
    doc.set_attr(node, "filename", filename);
    Ok(())
}

fn parse_video(el: &OlxElement<'_>) -> Result<Option<Payload>> {
    let mut sources = Vec::new();
    let youtube = el
        .attr("youtube_id_1_0")
        .filter(|id| !id.is_empty())
        .or_else(|| el.attr("youtube").and_then(video::legacy_youtube_id));
    if let Some(id) = youtube {
        sources.push(video::watch_url(id));
    }

    if let Some(list) = el.attr("html5_sources").filter(|s| !s.trim().is_empty()) {
        let urls: Vec<String> = serde_json::from_str(list)
            .map_err(|e| invalid(format!("video html5_sources is not a JSON list: {e}")))?;
        sources.extend(urls);
    }
    for source in el.doc.find_all_by_tag(el.node, "source") {
        if let Some(src) = el.doc.get_attr(source, "src")
            && !sources.iter().any(|s| s == src)
        {
            sources.push(src.to_string());
        }
    }

    let transcript = el
        .doc
        .find_by_tag(el.node, "transcript")
        .and_then(|t| el.doc.get_attr(t, "src"))
        .map(str::to_string);

    if sources.is_empty() {
        return Err(invalid("video without youtube_id_1_0 or <source src>"));
    }
    Ok(Some(Payload::Video {
        sources,
        transcript,
    }))
}

fn render_video(unit: &Unit, doc: &mut Document, node: NodeId, _: &mut Package) -> Result<()> {
    let Payload::Video {
        sources,
        transcript,
    } = unit.payload()
    else {
        return Ok(());
    };
    let youtube = sources.first().and_then(|s| video::youtube_id(s));
    doc.set_attr(node, "youtube_id_1_0", youtube.unwrap_or_default());
    if let Some(id) = youtube {
        doc.set_attr(node, "youtube", format!("1.00:{id}"));
    }
    for src in sources.iter().skip(usize::from(youtube.is_some())) {
        doc.append_element(node, "source", vec![("src".to_string(), src.clone())]);
    }
    if let Some(transcript) = transcript {
        doc.append_element(node, "transcript", vec![("src".to_string(), transcript.clone())]);
    }
    Ok(())
}

fn parse_multiple_choice(el: &OlxElement<'_>) -> Result<Option<Payload>> {
    let doc = el.doc;
    let (response, selection) =
        if let Some(response) = doc.find_by_tag(el.node, "multiplechoiceresponse") {
            (response, Selection::Single)
        } else if let Some(response) = doc.find_by_tag(el.node, "choiceresponse") {
            (response, Selection::Multiple)
        } else {
            return Ok(None);
        };
    let choices = doc
        .find_all_by_tag(response, "choice")
        .into_iter()
        .map(|choice| {
            let correct = doc
                .get_attr(choice, "correct")
                .is_some_and(|c| c.eq_ignore_ascii_case("true"));
            Choice::new(doc.text(choice), correct)
        })
        .collect();
    Ok(Some(Payload::MultipleChoice {
        question: el.text_of("label").unwrap_or_default(),
        choices,
        selection,
    }))
}

fn render_multiple_choice(
    unit: &Unit,
    doc: &mut Document,
    node: NodeId,
    _: &mut Package,
) -> Result<()> {
    let Payload::MultipleChoice {
        question,
        choices,
        selection,
    } = unit.payload()
    else {
        return Ok(());
    };
    let (response, group, group_type) = match selection {
        Selection::Single => ("multiplechoiceresponse", "choicegroup", Some("MultipleChoice")),
        Selection::Multiple => ("choiceresponse", "checkboxgroup", None),
    };
    let response = doc.append_element(node, response, Vec::new());
    let label = doc.append_element(response, "label", Vec::new());
    doc.append_text(label, question);
    let group_attrs = group_type
        .map(|t| vec![("type".to_string(), t.to_string())])
        .unwrap_or_default();
    let group = doc.append_element(response, group, group_attrs);
    for choice in choices {
        let element = doc.append_element(
            group,
            "choice",
            vec![("correct".to_string(), choice.correct.to_string())],
        );
        doc.append_text(element, &choice.text);
    }
    Ok(())
}

fn parse_free_text(el: &OlxElement<'_>) -> Result<Option<Payload>> {
    let doc = el.doc;
    let Some(response) = doc.find_by_tag(el.node, "stringresponse") else {
        return Ok(None);
    };
    let mut answers: Vec<String> = doc
        .get_attr(response, "answer")
        .map(str::to_string)
        .into_iter()
        .collect();
    for additional in doc.find_all_by_tag(response, "additional_answer") {
        let answer = match doc.get_attr(additional, "answer") {
            Some(answer) => answer.to_string(),
            None => doc.text(additional).trim().to_string(),
        };
        if !answer.is_empty() {
            answers.push(answer);
        }
    }
    Ok(Some(Payload::FreeText {
        question: el.text_of("label").unwrap_or_default(),
        answers,
    }))
}

fn render_free_text(unit: &Unit, doc: &mut Document, node: NodeId, _: &mut Package) -> Result<()> {
    let Payload::FreeText { question, answers } = unit.payload() else {
        return Ok(());
    };
    let (first, rest) = answers.split_first().map_or(("", &[][..]), |(f, r)| (f.as_str(), r));
    let response = doc.append_element(
        node,
        "stringresponse",
        vec![
            ("answer".to_string(), first.to_string()),
            ("type".to_string(), "ci".to_string()),
        ],
    );
    let label = doc.append_element(response, "label", Vec::new());
    doc.append_text(label, question);
    for answer in rest {
        doc.append_element(
            response,
            "additional_answer",
            vec![("answer".to_string(), answer.clone())],
        );
    }
    doc.append_element(response, "textline", vec![("size".to_string(), "20".to_string())]);
    Ok(())
}

fn parse_iframe(el: &OlxElement<'_>) -> Result<Option<Payload>> {
    let src = el
        .attr("src")
        .filter(|s| !s.is_empty())
        .ok_or_else(|| invalid("iframe without src"))?;
    Ok(Some(Payload::IFrame {
        src: src.to_string(),
    }))
}

fn render_iframe(unit: &Unit, doc: &mut Document, node: NodeId, _: &mut Package) -> Result<()> {
    if let Payload::IFrame { src } = unit.payload() {
        doc.set_attr(node, "src", src.as_str());
    }
    Ok(())
}

/// Question or answer label in poll and survey JSON.
#[derive(Debug, Serialize, Deserialize)]
struct Label {
    label: String,
}

/// A survey with a single question is written as a poll.
fn survey_element(unit: &Unit) -> &'static str {
    match unit.payload() {
        Payload::Survey { questions, .. } if questions.len() == 1 => "poll",
        _ => "survey",
    }
}

fn json_attr<T: serde::de::DeserializeOwned>(el: &OlxElement<'_>, key: &str) -> Result<T> {
    let value = el
        .attr(key)
        .ok_or_else(|| invalid(format!("<{}> without `{key}`", el.name())))?;
    serde_json::from_str(value)
        .map_err(|e| invalid(format!("<{}> `{key}` is not valid JSON: {e}", el.name())))
}

fn parse_survey(el: &OlxElement<'_>) -> Result<Option<Payload>> {
    let (questions, answers) = if el.name() == "poll" {
        let question = el.attr("question").unwrap_or_default().trim().to_string();
        let answers: Vec<(String, Label)> = json_attr(el, "answers")?;
        (
            vec![question],
            answers.into_iter().map(|(_, a)| a.label).collect(),
        )
    } else {
        let questions: Vec<(String, Label)> = json_attr(el, "questions")?;
        let answers: Vec<(String, String)> = json_attr(el, "answers")?;
        (
            questions.into_iter().map(|(_, q)| q.label).collect(),
            answers.into_iter().map(|(_, a)| a).collect(),
        )
    };
    Ok(Some(Payload::Survey {
        questions,
        answers,
        feedback: el.attr("feedback").unwrap_or_default().to_string(),
    }))
}

fn keyed<T>(prefix: &str, items: impl IntoIterator<Item = T>) -> Vec<(String, T)> {
    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| (format!("{prefix}-{}", i + 1), item))
        .collect()
}

fn to_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(|e| invalid(format!("cannot encode survey: {e}")))
}

fn render_survey(unit: &Unit, doc: &mut Document, node: NodeId, _: &mut Package) -> Result<()> {
    let Payload::Survey {
        questions,
        answers,
        feedback,
    } = unit.payload()
    else {
        return Ok(());
    };
    if let [question] = questions.as_slice() {
        let answers = keyed("answer", answers.iter().map(|a| Label { label: a.clone() }));
        doc.set_attr(node, "question", question.as_str());
        doc.set_attr(node, "answers", to_json(&answers)?);
    } else {
        let questions = keyed("question", questions.iter().map(|q| Label { label: q.clone() }));
        doc.set_attr(node, "questions", to_json(&questions)?);
        doc.set_attr(node, "answers", to_json(&keyed("answer", answers.iter().cloned()))?);
    }
    if !feedback.is_empty() {
        doc.set_attr(node, "feedback", feedback.as_str());
    }
    Ok(())
}
