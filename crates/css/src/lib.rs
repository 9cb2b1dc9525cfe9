//! Inline `style` attribute values: declaration lists only, no selectors or cascade.

pub mod syntax;

pub use syntax::{Declaration, parse_declarations, set_declaration, write_declarations};
