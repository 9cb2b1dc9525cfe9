use std::fs;
use std::path::Path;

use policy::Policy;
use serde::{Deserialize, Serialize};
use serialize::SerializeOptions;

use crate::{CleanOptions, ConfigError, Limits};

/// Everything one invocation needs, as read from a TOML file. Every table is optional.
///
/// ```toml
/// live = false
///
/// [policy]
/// allowed_tags = ["p", "br", "a"]
/// allowed_inline_styles = "text-align"
///
/// [serialize]
/// indent = "  "
///
/// [limits]
/// max_depth = 512
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub policy: Policy,
    pub serialize: SerializeOptions,
    pub limits: Limits,
    /// Content is still being edited; skip the rules meant for finished content.
    pub live: bool,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!(target: "pipeline", "loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn clean_options(&self) -> CleanOptions {
        CleanOptions {
            live: self.live,
            limits: self.limits,
        }
    }
}
