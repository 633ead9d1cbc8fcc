//! Nesting flat headings into collections.
//!
//! Markdown headings, and the loose `<h1>`..`<h6>` of plain HTML, are
//! siblings of the content they introduce. [`Outline`] keeps the open
//! collections by heading depth and appends content to the innermost one.

use super::attributes::AttributeBag;
use super::course::Unit;
use super::registry::Registry;
use crate::error::{Error, Result, Warning, WarningKind};

/// Open collections by heading depth, innermost last.
///
/// The root stays at the bottom of the stack; headings never close it.
pub(crate) struct Outline<'r> {
    registry: &'r Registry,
    stack: Vec<(usize, Unit)>,
}

impl<'r> Outline<'r> {
    pub fn new(registry: &'r Registry, root: Unit, depth: usize) -> Self {
        Self {
            registry,
            stack: vec![(depth, root)],
        }
    }

    /// Heading depth of the innermost open collection.
    pub fn depth(&self) -> usize {
        self.stack.last().map_or(0, |(depth, _)| *depth)
    }

    /// Open `unit` as the collection of a heading at `depth`.
    ///
    /// Open collections at the same depth or deeper are closed first. Each
    /// skipped depth gets an empty collection carrying a `HeadingDepthGap`
    /// warning that names `location`.
    pub fn open(&mut self, depth: usize, unit: Unit, location: &str) -> Result<()> {
        while self.stack.len() > 1 && self.depth() >= depth {
            self.close()?;
        }
        let top = self.depth();
        for missing in top + 1..depth {
            let mut filler =
                Unit::collection(self.registry, None, "", AttributeBag::new(), Vec::new())?;
            filler.push_warning(Warning::new(
                WarningKind::HeadingDepthGap,
                None,
                format!(
                    "{location}: heading of depth {depth} follows depth {top}, \
                     added an empty depth {missing} collection"
                ),
            ));
            self.stack.push((missing, filler));
        }
        self.stack.push((depth, unit));
        Ok(())
    }

    /// Append a unit to the innermost open collection.
    pub fn push(&mut self, unit: Unit) -> Result<()> {
        match self.stack.last_mut() {
            Some((_, parent)) => parent.push_child(self.registry, unit),
            None => Err(Error::schema("no open collection")),
        }
    }

    fn close(&mut self) -> Result<()> {
        if let Some((_, unit)) = self.stack.pop() {
            self.push(unit)?;
        }
        Ok(())
    }

    /// Close every open collection and return the root.
    pub fn finish(mut self) -> Result<Unit> {
        while self.stack.len() > 1 {
            self.close()?;
        }
        self.stack
            .pop()
            .map(|(_, root)| root)
            .ok_or_else(|| Error::schema("no open collection"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Payload;

    fn collection(registry: &Registry, title: &str) -> Unit {
        Unit::collection(registry, None, title, AttributeBag::new(), vec![]).unwrap()
    }

    fn titles(unit: &Unit) -> Vec<String> {
        unit.children().iter().map(|u| u.title().to_string()).collect()
    }

    #[test]
    fn test_siblings_and_nesting() {
        let registry = Registry::standard();
        let mut outline = Outline::new(&registry, collection(&registry, "Root"), 1);
        outline.open(2, collection(&registry, "A"), "a").unwrap();
        outline.open(3, collection(&registry, "A.1"), "a1").unwrap();
        let raw = Unit::leaf(&registry, None, "", AttributeBag::new(), Payload::raw_html("x"))
            .unwrap();
        outline.push(raw).unwrap();
        outline.open(2, collection(&registry, "B"), "b").unwrap();

        let root = outline.finish().unwrap();
        assert_eq!(titles(&root), vec!["A", "B"]);
        assert_eq!(titles(&root.children()[0]), vec!["A.1"]);
        assert_eq!(root.children()[0].children()[0].children().len(), 1);
    }

    #[test]
    fn test_depth_gap_adds_filler() {
        let registry = Registry::standard();
        let mut outline = Outline::new(&registry, collection(&registry, "Root"), 1);
        outline.open(4, collection(&registry, "Deep"), "line 7").unwrap();

        let root = outline.finish().unwrap();
        let filler = &root.children()[0];
        assert_eq!(filler.title(), "");
        assert_eq!(filler.warnings()[0].kind, WarningKind::HeadingDepthGap);
        assert!(filler.warnings()[0].message.starts_with("line 7:"));
        assert_eq!(filler.children()[0].children()[0].title(), "Deep");
    }
}
