//! The cleaning pipeline: sanitize, then enforce block structure, then optionally serialize.
//!
//! The two tree passes are strictly separate. [`clean`] works on a caller-owned [`Document`];
//! [`clean_node`] is the owned-tree convenience used by the CLI.

mod clean;
mod config;
mod error;
mod limits;

pub use crate::clean::{CleanOptions, CleanReport, Cleaned, clean, clean_node};
pub use crate::config::Config;
pub use crate::error::{CleanError, ConfigError};
pub use crate::limits::Limits;

pub use dom::{Document, Node, NodeId};
pub use policy::{CompiledPolicy, Policy};
pub use sanitize::{CollectDiagnostics, Diagnostics, LogDiagnostics};
pub use serialize::SerializeOptions;
