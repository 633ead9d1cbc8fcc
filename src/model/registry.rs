//! Unit kinds and the registry describing them.
//!
//! The registry is built once with [`Registry::standard`] and passed by
//! reference to every reader and writer. Each entry couples a kind's schema
//! (container flag, required payload fields, typed attributes) with plain
//! function hooks for every format.

use std::fmt;
use std::str::FromStr;

use super::attributes::AttrType;
use crate::html::kinds::HtmlHooks;
use crate::markdown::kinds::MarkdownHooks;
use crate::olx::kinds::OlxHooks;

/// The closed set of unit kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitKind {
    Collection,
    Video,
    FreeTextQuestion,
    MultipleChoiceQuestion,
    RawHtml,
    IFrame,
    Survey,
}

impl UnitKind {
    /// Every kind, in registry order.
    pub const ALL: [UnitKind; 7] = [
        UnitKind::Collection,
        UnitKind::Video,
        UnitKind::FreeTextQuestion,
        UnitKind::MultipleChoiceQuestion,
        UnitKind::RawHtml,
        UnitKind::IFrame,
        UnitKind::Survey,
    ];

    /// The kind tag used in markers and derived identifiers.
    pub fn tag(self) -> &'static str {
        match self {
            UnitKind::Collection => "collection",
            UnitKind::Video => "video",
            UnitKind::FreeTextQuestion => "free-text",
            UnitKind::MultipleChoiceQuestion => "multiple-choice",
            UnitKind::RawHtml => "raw-html",
            UnitKind::IFrame => "iframe",
            UnitKind::Survey => "survey",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for UnitKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UnitKind::ALL
            .into_iter()
            .find(|kind| kind.tag() == s)
            .ok_or_else(|| format!("unknown unit kind: {s}"))
    }
}

/// Schema and format hooks for one kind.
pub struct KindSpec {
    pub kind: UnitKind,
    pub tag: &'static str,
    /// Whether units of this kind may have children.
    pub container: bool,
    /// Payload fields that must not be empty.
    pub required: &'static [&'static str],
    /// Attributes with a declared type, coerced on construction.
    pub typed: &'static [(&'static str, AttrType)],
    pub markdown: MarkdownHooks,
    pub html: HtmlHooks,
    pub olx: OlxHooks,
}

impl KindSpec {
    /// Declared type of an attribute for this kind, `Text` when undeclared.
    pub fn attr_type(&self, key: &str) -> AttrType {
        COMMON_TYPED
            .iter()
            .chain(self.typed)
            .find(|(name, _)| *name == key)
            .map(|(_, ty)| *ty)
            .unwrap_or(AttrType::Text)
    }
}

impl fmt::Debug for KindSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KindSpec")
            .field("kind", &self.kind)
            .field("container", &self.container)
            .field("required", &self.required)
            .field("typed", &self.typed)
            .finish_non_exhaustive()
    }
}

/// Typed attributes shared by every kind.
const COMMON_TYPED: &[(&str, AttrType)] = &[("class", AttrType::List)];

type Schema = (
    bool,
    &'static [&'static str],
    &'static [(&'static str, AttrType)],
);

fn schema(kind: UnitKind) -> Schema {
    match kind {
        UnitKind::Collection => (true, &[], &[]),
        UnitKind::Video => (
            false,
            &["sources"],
            &[
                ("start_time", AttrType::Integer),
                ("end_time", AttrType::Integer),
                ("download_video", AttrType::Boolean),
            ],
        ),
        UnitKind::FreeTextQuestion => (false, &["answers"], &[]),
        UnitKind::MultipleChoiceQuestion => (false, &["choices"], &[]),
        UnitKind::RawHtml => (false, &[], &[]),
        UnitKind::IFrame => (
            false,
            &["src"],
            &[("width", AttrType::Integer), ("height", AttrType::Integer)],
        ),
        UnitKind::Survey => (
            false,
            &["questions", "answers"],
            &[
                ("max_submissions", AttrType::Integer),
                ("private_results", AttrType::Boolean),
            ],
        ),
    }
}

/// Immutable table of every registered kind.
#[derive(Debug)]
pub struct Registry {
    kinds: Vec<KindSpec>,
}

impl Registry {
    /// The registry of built-in kinds.
    pub fn standard() -> Self {
        let kinds = UnitKind::ALL
            .into_iter()
            .map(|kind| {
                let (container, required, typed) = schema(kind);
                KindSpec {
                    kind,
                    tag: kind.tag(),
                    container,
                    required,
                    typed,
                    markdown: crate::markdown::kinds::hooks(kind),
                    html: crate::html::kinds::hooks(kind),
                    olx: crate::olx::kinds::hooks(kind),
                }
            })
            .collect();
        Self { kinds }
    }

    /// The entry for a kind.
    pub fn spec(&self, kind: UnitKind) -> &KindSpec {
        &self.kinds[kind.index()]
    }

    /// Look up an entry by its kind tag.
    pub fn by_tag(&self, tag: &str) -> Option<&KindSpec> {
        self.kinds.iter().find(|spec| spec.tag == tag)
    }

    /// Entries in registry order.
    pub fn iter(&self) -> impl Iterator<Item = &KindSpec> {
        self.kinds.iter()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::standard()
    }
}
