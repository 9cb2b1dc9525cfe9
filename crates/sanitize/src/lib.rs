//! Rule-based sanitizer.
//!
//! Descendants of the root are visited children-first, with each node's children handled
//! last-to-first, and every node runs through the fixed rule table in [`RULES`]. A rule never
//! mutates the tree itself: it plans an [`Edit`] from a read-only view and the engine applies it.
//! A rule that fails is reported to a [`Diagnostics`] sink and the node is left as it was.

mod diagnostics;
mod edit;
mod engine;
mod error;
mod rules;

pub use crate::diagnostics::{CollectDiagnostics, Diagnostics, LogDiagnostics, RuleFailure};
pub use crate::edit::{AttributeEdit, Edit};
pub use crate::engine::{SanitizeStats, run_rules, sanitize};
pub use crate::error::RuleError;
pub use crate::rules::{RULES, Rule, RuleContext, RuleMatch};
