//! Kind-specific unit content.

use super::registry::UnitKind;

/// One answer option of a multiple choice question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub text: String,
    pub correct: bool,
}

impl Choice {
    pub fn new(text: impl Into<String>, correct: bool) -> Self {
        Self {
            text: text.into().trim().to_string(),
            correct,
        }
    }
}

/// Whether a multiple choice question expects one or several answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Selection {
    Single,
    #[default]
    Multiple,
}

impl Selection {
    /// Infer the selection mode from the number of correct choices.
    pub fn infer(choices: &[Choice]) -> Self {
        if choices.iter().filter(|c| c.correct).count() == 1 {
            Selection::Single
        } else {
            Selection::Multiple
        }
    }
}

/// Content carried by a unit, one variant per kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Collections carry no content of their own.
    Collection,
    Video {
        /// Arbitrary video URLs: YouTube links, mp4 files, ...
        sources: Vec<String>,
        transcript: Option<String>,
    },
    FreeText {
        question: String,
        /// Every accepted answer.
        answers: Vec<String>,
    },
    MultipleChoice {
        question: String,
        choices: Vec<Choice>,
        selection: Selection,
    },
    RawHtml {
        contents: String,
    },
    IFrame {
        src: String,
    },
    Survey {
        questions: Vec<String>,
        answers: Vec<String>,
        feedback: String,
    },
}

impl Payload {
    /// The kind this payload belongs to.
    pub fn kind(&self) -> UnitKind {
        match self {
            Payload::Collection => UnitKind::Collection,
            Payload::Video { .. } => UnitKind::Video,
            Payload::FreeText { .. } => UnitKind::FreeTextQuestion,
            Payload::MultipleChoice { .. } => UnitKind::MultipleChoiceQuestion,
            Payload::RawHtml { .. } => UnitKind::RawHtml,
            Payload::IFrame { .. } => UnitKind::IFrame,
            Payload::Survey { .. } => UnitKind::Survey,
        }
    }

    pub fn raw_html(contents: impl Into<String>) -> Self {
        Payload::RawHtml {
            contents: contents.into().trim().to_string(),
        }
    }

    pub fn video(sources: Vec<String>) -> Self {
        Payload::Video {
            sources,
            transcript: None,
        }
    }

    /// Multiple choice payload with the selection mode inferred from the choices.
    pub fn multiple_choice(question: impl Into<String>, choices: Vec<Choice>) -> Self {
        let selection = Selection::infer(&choices);
        Payload::MultipleChoice {
            question: question.into(),
            choices,
            selection,
        }
    }

    /// Whether the named field is empty, for the required-field check at
    /// construction. Fields the payload does not have are never empty.
    pub(crate) fn is_field_empty(&self, field: &str) -> bool {
        match (self, field) {
            (Payload::Video { sources, .. }, "sources") => sources.is_empty(),
            (Payload::FreeText { answers, .. }, "answers") => answers.is_empty(),
            (Payload::FreeText { question, .. }, "question") => question.trim().is_empty(),
            (Payload::MultipleChoice { choices, .. }, "choices") => choices.is_empty(),
            (Payload::MultipleChoice { question, .. }, "question") => question.trim().is_empty(),
            (Payload::RawHtml { contents }, "contents") => contents.trim().is_empty(),
            (Payload::IFrame { src }, "src") => src.trim().is_empty(),
            (Payload::Survey { questions, .. }, "questions") => questions.is_empty(),
            (Payload::Survey { answers, .. }, "answers") => answers.is_empty(),
            _ => false,
        }
    }

    /// Append more HTML to a raw payload, separated by a newline.
    pub(crate) fn concatenate(&mut self, more: &str) {
        if let Payload::RawHtml { contents } = self {
            let more = more.trim();
            if contents.is_empty() {
                contents.push_str(more);
            } else if !more.is_empty() {
                contents.push('\n');
                contents.push_str(more);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_html_concatenate() {
        let mut raw = Payload::raw_html("  <p>Hello</p>\n  \n");
        raw.concatenate("<p>World!</p>\n");
        assert_eq!(
            raw,
            Payload::RawHtml {
                contents: "<p>Hello</p>\n<p>World!</p>".to_string()
            }
        );
    }

    #[test]
    fn test_field_emptiness() {
        let video = Payload::video(vec![]);
        assert!(video.is_field_empty("sources"));
        assert!(!video.is_field_empty("transcript"));
        assert!(!video.is_field_empty("choices"));
        assert!(Payload::raw_html("  \n").is_field_empty("contents"));
        assert!(!Payload::raw_html("<p>x</p>").is_field_empty("contents"));
    }

    #[test]
    fn test_selection_inferred() {
        let single = Payload::multiple_choice(
            "Q",
            vec![Choice::new("A", false), Choice::new("B", true)],
        );
        let multiple = Payload::multiple_choice(
            "Q",
            vec![Choice::new("A", true), Choice::new("B", true)],
        );
        assert!(matches!(
            single,
            Payload::MultipleChoice {
                selection: Selection::Single,
                ..
            }
        ));
        assert!(matches!(
            multiple,
            Payload::MultipleChoice {
                selection: Selection::Multiple,
                ..
            }
        ));
    }

    #[test]
    fn test_choice_text_trimmed() {
        assert_eq!(Choice::new("  B \n", true).text, "B");
    }
}
