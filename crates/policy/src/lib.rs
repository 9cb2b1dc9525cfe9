//! Cleaning policy: the user-facing, deserializable [`Policy`] and the [`CompiledPolicy`] the
//! cleaning stages read.

mod compiled;
mod defaults;
mod error;
mod style;

pub use crate::compiled::{CompiledPolicy, StyleMatcher};
pub use crate::defaults::{DEFAULT_ALLOWED_STYLES, DEFAULT_ALLOWED_TAGS, DEFAULT_SELF_NESTING_DISALLOWED};
pub use crate::error::PolicyError;
pub use crate::style::StyleAllowance;

use std::collections::BTreeMap;

use dom::Structure;
use serde::{Deserialize, Serialize};

/// Pseudo-tag that, when allowed, keeps comment nodes.
pub const COMMENT_TAG: &str = "!";

pub const DEFAULT_CONTAINER_ATTRIBUTE: &str = "data-container";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Policy {
    pub allowed_tags: Vec<String>,
    pub allowed_inline_styles: StyleAllowance,
    pub self_nesting_disallowed: Vec<String>,
    pub allow_underline: bool,
    pub disallow_image_dimensions: bool,
    pub block_overrides: BTreeMap<String, Structure>,
    /// Page the content belongs to; base for relative references and the "same domain" test.
    pub page_url: Option<String>,
    /// Attribute marking an element whose unstyled spans must be kept.
    pub container_attribute: String,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            allowed_tags: to_owned(DEFAULT_ALLOWED_TAGS),
            allowed_inline_styles: StyleAllowance::Patterns(to_owned(DEFAULT_ALLOWED_STYLES)),
            self_nesting_disallowed: to_owned(DEFAULT_SELF_NESTING_DISALLOWED),
            allow_underline: false,
            disallow_image_dimensions: false,
            block_overrides: BTreeMap::new(),
            page_url: None,
            container_attribute: DEFAULT_CONTAINER_ATTRIBUTE.to_string(),
        }
    }
}

fn to_owned(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl Policy {
    pub fn compile(&self) -> Result<CompiledPolicy, PolicyError> {
        CompiledPolicy::new(self)
    }
}
