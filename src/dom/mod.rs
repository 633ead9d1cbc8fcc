//! Minimal document tree for the HTML and OLX readers and writers.
//!
//! Documents are parsed from `quick-xml` events into an arena, queried by
//! the readers, built programmatically by the OLX writer, and serialized
//! back to text.

mod arena;
mod builder;
mod serialize;

pub use arena::{ChildrenIter, Document, Node, NodeData, NodeId};
pub use builder::{VOID_ELEMENTS, parse_html, parse_xml};
pub use serialize::{inner_html, outer_html, to_xml};
