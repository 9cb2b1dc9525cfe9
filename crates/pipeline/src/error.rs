use std::path::PathBuf;

use block::StructureError;
use dom::TreeError;
use policy::PolicyError;
use serialize::SerializeError;

/// Anything that stops a clean. Rule failures are not here: they go to the diagnostics sink.
#[derive(Debug, thiserror::Error)]
pub enum CleanError {
    #[error("invalid policy: {0}")]
    Policy(#[from] PolicyError),
    #[error("block structure: {0}")]
    Structure(#[from] StructureError),
    #[error("serialization: {0}")]
    Serialize(#[from] SerializeError),
    #[error(transparent)]
    Tree(#[from] TreeError),
    #[error("input has {actual} {what}, limit is {limit}")]
    LimitExceeded {
        what: &'static str,
        actual: usize,
        limit: usize,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}
