//! The canonical course tree.

use std::collections::HashSet;

use super::attributes::AttributeBag;
use super::payload::Payload;
use super::registry::{Registry, UnitKind};
use crate::codec;
use crate::error::{Error, Result, Warning};
use crate::util::slugify;

/// A unit identifier.
///
/// Explicit identifiers come from the source document. Derived identifiers
/// are assigned when the course is assembled and are omitted by writers of
/// formats where identifiers are optional.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identifier {
    Explicit(String),
    Derived(String),
}

impl Identifier {
    pub fn as_str(&self) -> &str {
        match self {
            Identifier::Explicit(id) | Identifier::Derived(id) => id,
        }
    }

    pub fn is_explicit(&self) -> bool {
        matches!(self, Identifier::Explicit(_))
    }
}

/// A node of the course tree.
///
/// Units own their children. The kind is fixed by the payload at
/// construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Unit {
    id: Identifier,
    title: String,
    attributes: AttributeBag,
    payload: Payload,
    children: Vec<Unit>,
    warnings: Vec<Warning>,
}

impl Unit {
    /// Build a unit, checking it against the registry schema.
    ///
    /// Typed attributes are coerced to their declared type.
    pub fn new(
        registry: &Registry,
        kind: UnitKind,
        id: Option<String>,
        title: impl Into<String>,
        attributes: AttributeBag,
        payload: Payload,
        children: Vec<Unit>,
    ) -> Result<Unit> {
        let spec = registry.spec(kind);
        if payload.kind() != kind {
            return Err(Error::schema(format!(
                "{} payload given to a {kind} unit",
                payload.kind()
            )));
        }
        if let Some(field) = spec.required.iter().find(|f| payload.is_field_empty(f)) {
            return Err(Error::schema(format!(
                "{kind} unit requires a non-empty `{field}`"
            )));
        }
        if !spec.container && !children.is_empty() {
            return Err(Error::schema(format!("{kind} units cannot have children")));
        }
        let attributes = codec::coerce_attributes(spec, attributes)?;
        let id = match id {
            Some(id) if !id.trim().is_empty() => Identifier::Explicit(id.trim().to_string()),
            _ => Identifier::Derived(String::new()),
        };
        Ok(Unit {
            id,
            title: title.into().trim().to_string(),
            attributes,
            payload,
            children,
            warnings: Vec::new(),
        })
    }

    /// Build a collection.
    pub fn collection(
        registry: &Registry,
        id: Option<String>,
        title: impl Into<String>,
        attributes: AttributeBag,
        children: Vec<Unit>,
    ) -> Result<Unit> {
        Unit::new(
            registry,
            UnitKind::Collection,
            id,
            title,
            attributes,
            Payload::Collection,
            children,
        )
    }

    /// Build a leaf unit whose kind is given by its payload.
    pub fn leaf(
        registry: &Registry,
        id: Option<String>,
        title: impl Into<String>,
        attributes: AttributeBag,
        payload: Payload,
    ) -> Result<Unit> {
        let kind = payload.kind();
        Unit::new(registry, kind, id, title, attributes, payload, Vec::new())
    }

    /// Append a child, checking the container constraint.
    pub fn push_child(&mut self, registry: &Registry, child: Unit) -> Result<()> {
        if !registry.spec(self.kind()).container {
            return Err(Error::schema(format!(
                "{} units cannot have children",
                self.kind()
            )));
        }
        self.children.push(child);
        Ok(())
    }

    pub fn kind(&self) -> UnitKind {
        self.payload.kind()
    }

    /// The identifier, explicit or derived.
    pub fn id(&self) -> &str {
        self.id.as_str()
    }

    pub fn identifier(&self) -> &Identifier {
        &self.id
    }

    /// The identifier if it came from the source document.
    pub fn explicit_id(&self) -> Option<&str> {
        match &self.id {
            Identifier::Explicit(id) => Some(id),
            Identifier::Derived(_) => None,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn attributes(&self) -> &AttributeBag {
        &self.attributes
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn children(&self) -> &[Unit] {
        &self.children
    }

    /// Warnings attached while reading this unit.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn is_collection(&self) -> bool {
        self.kind() == UnitKind::Collection
    }

    pub(crate) fn push_warning(&mut self, warning: Warning) {
        self.warnings.push(warning);
    }

    pub(crate) fn extend_warnings(&mut self, warnings: impl IntoIterator<Item = Warning>) {
        self.warnings.extend(warnings);
    }

    /// Append HTML to a raw unit.
    pub(crate) fn concatenate(&mut self, more: &str) {
        self.payload.concatenate(more);
    }

    /// A collection with no content of its own, as produced for a heading
    /// depth gap.
    pub fn is_synthesized(&self) -> bool {
        self.is_collection()
            && self.title.is_empty()
            && !self.id.is_explicit()
            && self.attributes.is_empty()
            && !self.children.is_empty()
            && self.children.iter().all(Unit::is_collection)
    }
}

/// The root of a course tree: a collection without a parent.
#[derive(Debug, Clone, PartialEq)]
pub struct Course {
    root: Unit,
}

impl Course {
    /// Assemble a course, checking identifier uniqueness and assigning
    /// derived identifiers depth-first.
    pub fn new(registry: &Registry, mut root: Unit) -> Result<Course> {
        if !registry.spec(root.kind()).container {
            return Err(Error::schema(format!(
                "course root must be a collection, not {}",
                root.kind()
            )));
        }

        let mut used = HashSet::new();
        collect_explicit_ids(&root, &mut used)?;
        assign_derived_ids(&mut root, &mut used);

        Ok(Course { root })
    }

    /// Assemble a course from its top-level parts.
    pub fn from_parts(
        registry: &Registry,
        id: Option<String>,
        title: impl Into<String>,
        attributes: AttributeBag,
        children: Vec<Unit>,
    ) -> Result<Course> {
        let root = Unit::collection(registry, id, title, attributes, children)?;
        Course::new(registry, root)
    }

    /// The root collection.
    pub fn root(&self) -> &Unit {
        &self.root
    }

    pub fn id(&self) -> &str {
        self.root.id()
    }

    pub fn title(&self) -> &str {
        self.root.title()
    }

    pub fn attributes(&self) -> &AttributeBag {
        self.root.attributes()
    }

    pub fn children(&self) -> &[Unit] {
        self.root.children()
    }

    /// Depth-first traversal yielding `(depth, unit)`, the root at depth 0.
    pub fn walk(&self) -> Walk<'_> {
        Walk {
            stack: vec![(0, &self.root)],
        }
    }

    /// Number of units below the root.
    pub fn unit_count(&self) -> usize {
        self.walk().count() - 1
    }

    /// Find a unit by identifier.
    pub fn find(&self, id: &str) -> Option<&Unit> {
        self.walk().map(|(_, unit)| unit).find(|unit| unit.id() == id)
    }

    /// Every warning of every unit, in document order.
    pub fn warnings(&self) -> Vec<Warning> {
        self.walk()
            .flat_map(|(_, unit)| unit.warnings().iter().cloned())
            .collect()
    }
}

/// Depth-first iterator over a course tree.
pub struct Walk<'a> {
    stack: Vec<(usize, &'a Unit)>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = (usize, &'a Unit);

    fn next(&mut self) -> Option<Self::Item> {
        let (depth, unit) = self.stack.pop()?;
        self.stack
            .extend(unit.children.iter().rev().map(|child| (depth + 1, child)));
        Some((depth, unit))
    }
}

fn collect_explicit_ids(unit: &Unit, used: &mut HashSet<String>) -> Result<()> {
    if let Identifier::Explicit(id) = &unit.id
        && !used.insert(id.clone())
    {
        return Err(Error::schema(format!("duplicate identifier `{id}`")));
    }
    unit.children
        .iter()
        .try_for_each(|child| collect_explicit_ids(child, used))
}

fn assign_derived_ids(unit: &mut Unit, used: &mut HashSet<String>) {
    if let Identifier::Derived(id) = &mut unit.id {
        let base = match slugify(&unit.title) {
            slug if slug.is_empty() => unit.payload.kind().tag().to_string(),
            slug => slug,
        };
        let mut candidate = base.clone();
        let mut n = 2;
        while used.contains(&candidate) {
            candidate = format!("{base}-{n}");
            n += 1;
        }
        used.insert(candidate.clone());
        *id = candidate;
    }
    for child in &mut unit.children {
        assign_derived_ids(child, used);
    }
}
