use std::collections::HashMap;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

/// Structural role of an element with respect to paragraphs.
///
/// Every variant except [`Structure::Inline`] is block-level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Structure {
    /// Flows inline with text; carries no block flags.
    Inline,
    /// Plain block (lists, tables, rows).
    Block,
    /// A paragraph; may not contain block children or two consecutive line breaks.
    Paragraph,
    /// All inline content must sit inside paragraphs.
    ParagraphContainer,
    /// Holds a single run of inline content directly, or paragraphs once more than one is needed.
    MultiParagraphContainer,
    /// Holds inline content directly and may not contain paragraphs.
    InlineContainer,
    /// Block that may not have children.
    Empty,
    /// Can appear either as a block or inline inside a paragraph.
    Mixed,
}

impl Structure {
    pub fn is_block(self) -> bool {
        self != Structure::Inline
    }
}

static DEFAULT_TABLE: LazyLock<HashMap<&'static str, Structure>> = LazyLock::new(|| {
    use Structure::*;
    let mut map = HashMap::new();
    map.insert("p", Paragraph);
    for tag in [
        "body",
        "object",
        "blockquote",
        "form",
        "fieldset",
        "button",
        "map",
        "noscript",
        "div",
    ] {
        map.insert(tag, ParagraphContainer);
    }
    for tag in ["h1", "h2", "h3", "h4", "h5", "h6", "address", "pre"] {
        map.insert(tag, InlineContainer);
    }
    for tag in ["th", "td", "li", "dt", "dd"] {
        map.insert(tag, MultiParagraphContainer);
    }
    for tag in [
        "ul", "ol", "dl", "table", "thead", "tbody", "tfoot", "tr", "noframes",
    ] {
        map.insert(tag, Block);
    }
    for tag in ["hr", "iframe"] {
        map.insert(tag, Empty);
    }
    for tag in ["ins", "del"] {
        map.insert(tag, Mixed);
    }
    map
});

/// Classification from the built-in table, ignoring any overrides.
pub fn default_structure(tag: &str) -> Structure {
    if tag.bytes().any(|b| b.is_ascii_uppercase()) {
        let lower = tag.to_ascii_lowercase();
        return DEFAULT_TABLE
            .get(lower.as_str())
            .copied()
            .unwrap_or(Structure::Inline);
    }
    DEFAULT_TABLE
        .get(tag)
        .copied()
        .unwrap_or(Structure::Inline)
}

/// Built-in classification table plus per-invocation overrides, which win.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StructureMap {
    overrides: HashMap<String, Structure>,
}

impl StructureMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_overrides<I, S>(overrides: I) -> Self
    where
        I: IntoIterator<Item = (S, Structure)>,
        S: AsRef<str>,
    {
        Self {
            overrides: overrides
                .into_iter()
                .map(|(tag, structure)| (tag.as_ref().to_ascii_lowercase(), structure))
                .collect(),
        }
    }

    pub fn classify(&self, tag: &str) -> Structure {
        if !self.overrides.is_empty() {
            if let Some(structure) = self.overrides.get(&tag.to_ascii_lowercase()) {
                return *structure;
            }
        }
        default_structure(tag)
    }

    pub fn is_block(&self, tag: &str) -> bool {
        self.classify(tag).is_block()
    }
}
