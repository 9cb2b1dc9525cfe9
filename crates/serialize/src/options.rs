use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SerializeOptions {
    /// Close empty elements as `<br />` instead of `<br>`.
    pub xhtml: bool,
    /// Write every non-ASCII character as a character reference.
    pub escape_non_ascii: bool,
    /// One level of indentation.
    pub indent: String,
}

impl Default for SerializeOptions {
    fn default() -> Self {
        Self {
            xhtml: true,
            escape_non_ascii: true,
            indent: "\t".to_string(),
        }
    }
}
