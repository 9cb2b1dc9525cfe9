//! Block structure enforcement.
//!
//! Rewrites a tree so that paragraphs never hold block content or double line breaks, paragraph
//! containers hold only blocks, inline containers hold no paragraphs and empty blocks hold
//! nothing. Classification comes from a [`dom::StructureMap`].

mod enforce;
mod error;

pub use crate::enforce::{EnforceStats, enforce};
pub use crate::error::StructureError;
