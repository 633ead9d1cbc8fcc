//! Canonical course model shared by every format.
//!
//! This module contains:
//! - The course tree ([`Course`], [`Unit`]) and unit identifiers
//! - Heading outlines nesting flat headings into collections
//! - Kind-specific payloads
//! - The typed attribute bag
//! - Unit kinds and the [`Registry`] of their schemas and format hooks

mod attributes;
mod course;
mod outline;
mod payload;
mod registry;

pub use attributes::{AttrType, AttrValue, AttributeBag};
pub use course::{Course, Identifier, Unit, Walk};
pub(crate) use outline::Outline;
pub use payload::{Choice, Payload, Selection};
pub use registry::{KindSpec, Registry, UnitKind};
