use serde::{Deserialize, Serialize};

/// Which inline style properties survive.
///
/// Deserializes from `"all"` (also `"any"`, `"*"`), `"none"`, a whitespace separated string of
/// patterns, or a list of patterns.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawStyleAllowance", into = "RawStyleAllowance")]
pub enum StyleAllowance {
    All,
    #[default]
    None,
    /// Regular expressions matched against the start of the lowercased property name.
    Patterns(Vec<String>),
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawStyleAllowance {
    Keyword(String),
    List(Vec<String>),
}

impl From<RawStyleAllowance> for StyleAllowance {
    fn from(raw: RawStyleAllowance) -> Self {
        match raw {
            RawStyleAllowance::Keyword(s) => match s.trim().to_ascii_lowercase().as_str() {
                "all" | "any" | "*" => StyleAllowance::All,
                "none" | "" => StyleAllowance::None,
                _ => StyleAllowance::Patterns(s.split_whitespace().map(str::to_string).collect()),
            },
            RawStyleAllowance::List(list) => StyleAllowance::Patterns(list),
        }
    }
}

impl From<StyleAllowance> for RawStyleAllowance {
    fn from(allowance: StyleAllowance) -> Self {
        match allowance {
            StyleAllowance::All => RawStyleAllowance::Keyword("all".to_string()),
            StyleAllowance::None => RawStyleAllowance::Keyword("none".to_string()),
            StyleAllowance::Patterns(list) => RawStyleAllowance::List(list),
        }
    }
}
