use dom::TreeError;
use uri::UriError;

/// Failure of one rule on one node. Never escapes the engine.
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    #[error(transparent)]
    Uri(#[from] UriError),
    #[error(transparent)]
    Tree(#[from] TreeError),
    #[error("rule matched but could not plan an edit: {0}")]
    Plan(String),
}
