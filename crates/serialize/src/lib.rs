//! Canonical text form of a tree.
//!
//! Output is a pure function of the tree and [`SerializeOptions`]: blocks with block children
//! get their content indented on separate lines, everything else stays on the current line,
//! text whitespace is collapsed outside `pre`, and markup characters are escaped.

mod buffer;
mod entities;
mod error;
mod options;
mod writer;

pub use crate::error::SerializeError;
pub use crate::options::SerializeOptions;
pub use crate::writer::{serialize, serialize_children};
