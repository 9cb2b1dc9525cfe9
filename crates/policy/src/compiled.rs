use std::collections::HashSet;

use dom::StructureMap;
use regex::RegexSet;
use url::Url;

use crate::{COMMENT_TAG, Policy, PolicyError, StyleAllowance};

/// Precompiled style property matcher.
#[derive(Clone, Debug)]
pub enum StyleMatcher {
    All,
    None,
    Set(RegexSet),
}

impl StyleMatcher {
    fn compile(allowance: &StyleAllowance) -> Result<Self, PolicyError> {
        let patterns = match allowance {
            StyleAllowance::All => return Ok(StyleMatcher::All),
            StyleAllowance::None => return Ok(StyleMatcher::None),
            StyleAllowance::Patterns(patterns) if patterns.is_empty() => {
                return Ok(StyleMatcher::None);
            }
            StyleAllowance::Patterns(patterns) => patterns,
        };
        let mut anchored = Vec::with_capacity(patterns.len());
        for pattern in patterns {
            // Checked one at a time so the error names the offending pattern.
            let wrapped = format!("^(?:{pattern})");
            regex::Regex::new(&wrapped).map_err(|source| PolicyError::InvalidStylePattern {
                pattern: pattern.clone(),
                source,
            })?;
            anchored.push(wrapped);
        }
        let set = RegexSet::new(&anchored).map_err(|source| PolicyError::InvalidStylePattern {
            pattern: patterns.join(" "),
            source,
        })?;
        Ok(StyleMatcher::Set(set))
    }

    /// `name` must already be lowercase.
    pub fn allows(&self, name: &str) -> bool {
        match self {
            StyleMatcher::All => true,
            StyleMatcher::None => false,
            StyleMatcher::Set(set) => set.is_match(name),
        }
    }
}

#[derive(Clone, Debug)]
struct Page {
    url: Url,
    domain: Option<String>,
}

/// Policy with every derived lookup built once. Read-only for the whole run.
#[derive(Clone, Debug)]
pub struct CompiledPolicy {
    allowed_tags: HashSet<String>,
    allow_comments: bool,
    styles: StyleMatcher,
    self_nesting_disallowed: HashSet<String>,
    allow_underline: bool,
    disallow_image_dimensions: bool,
    structure: StructureMap,
    page: Option<Page>,
    container_attribute: String,
}

fn tag_set(names: &[String]) -> Result<HashSet<String>, PolicyError> {
    names
        .iter()
        .map(|name| {
            let trimmed = name.trim();
            if trimmed.is_empty() || trimmed.chars().any(char::is_whitespace) {
                return Err(PolicyError::InvalidTagName(name.clone()));
            }
            Ok(trimmed.to_ascii_lowercase())
        })
        .collect()
}

impl CompiledPolicy {
    pub fn new(policy: &Policy) -> Result<Self, PolicyError> {
        let mut allowed_tags = tag_set(&policy.allowed_tags)?;
        let allow_comments = allowed_tags.remove(COMMENT_TAG);
        let self_nesting_disallowed = tag_set(&policy.self_nesting_disallowed)?;
        let override_names: Vec<String> = policy.block_overrides.keys().cloned().collect();
        tag_set(&override_names)?;

        let page = match &policy.page_url {
            Some(raw) => {
                let url = Url::parse(raw).map_err(|source| PolicyError::InvalidPageUrl {
                    url: raw.clone(),
                    source,
                })?;
                let domain = url.host_str().map(|h| h.to_ascii_lowercase());
                Some(Page { url, domain })
            }
            None => None,
        };

        Ok(Self {
            allowed_tags,
            allow_comments,
            styles: StyleMatcher::compile(&policy.allowed_inline_styles)?,
            self_nesting_disallowed,
            allow_underline: policy.allow_underline,
            disallow_image_dimensions: policy.disallow_image_dimensions,
            structure: StructureMap::with_overrides(
                policy.block_overrides.iter().map(|(tag, s)| (tag.as_str(), *s)),
            ),
            page,
            container_attribute: policy.container_attribute.trim().to_ascii_lowercase(),
        })
    }

    /// Case-insensitive.
    pub fn allows_tag(&self, tag: &str) -> bool {
        self.allowed_tags.contains(&tag.to_ascii_lowercase())
    }

    pub fn allows_comments(&self) -> bool {
        self.allow_comments
    }

    pub fn allows_style(&self, property: &str) -> bool {
        self.styles.allows(&property.to_ascii_lowercase())
    }

    pub fn style_matcher(&self) -> &StyleMatcher {
        &self.styles
    }

    pub fn forbids_self_nesting(&self, tag: &str) -> bool {
        self.self_nesting_disallowed.contains(&tag.to_ascii_lowercase())
    }

    pub fn allow_underline(&self) -> bool {
        self.allow_underline
    }

    pub fn disallow_image_dimensions(&self) -> bool {
        self.disallow_image_dimensions
    }

    pub fn structure(&self) -> &StructureMap {
        &self.structure
    }

    pub fn page_url(&self) -> Option<&Url> {
        self.page.as_ref().map(|p| &p.url)
    }

    /// Lowercased host of the page URL.
    pub fn page_domain(&self) -> Option<&str> {
        self.page.as_ref().and_then(|p| p.domain.as_deref())
    }

    /// Authority and path of the page, as the syntactic parser sees them.
    pub fn page_parts(&self) -> Option<uri::UriParts> {
        self.page.as_ref().and_then(|p| uri::parse(p.url.as_str()).ok())
    }

    pub fn container_attribute(&self) -> &str {
        &self.container_attribute
    }
}
