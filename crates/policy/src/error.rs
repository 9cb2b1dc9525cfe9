#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    #[error("invalid inline style pattern {pattern:?}: {source}")]
    InvalidStylePattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("invalid page url {url:?}: {source}")]
    InvalidPageUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("invalid tag name {0:?} in policy")]
    InvalidTagName(String),
}
