//! Markup tree model: an owned [`Node`] form for interchange and an arena [`Document`] for
//! in-place rewriting, plus the structural classification table shared by the cleaning stages.

pub mod debug;
pub mod traverse;

mod document;
mod error;
mod structure;
mod types;

pub use crate::document::{Ancestors, Descendants, Document};
pub use crate::error::TreeError;
pub use crate::structure::{Structure, StructureMap, default_structure};
pub use crate::types::{Node, NodeData, NodeId};

/// Tags that never have content and serialize as a single tag.
pub const EMPTY_TAGS: &[&str] = &[
    "br", "area", "link", "img", "param", "hr", "input", "col", "base", "meta",
];

pub fn is_empty_tag(tag: &str) -> bool {
    EMPTY_TAGS.iter().any(|t| t.eq_ignore_ascii_case(tag))
}
