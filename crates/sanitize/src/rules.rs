use std::sync::LazyLock;

use dom::traverse::{is_blank, is_relevant, last_relevant_child};
use dom::{Document, NodeData, NodeId};
use policy::{CompiledPolicy, StyleMatcher};
use regex::Regex;
use uri::UriParts;

use crate::{Edit, RuleError};

/// Read-only view handed to rule tests and planners.
pub struct RuleContext<'a> {
    pub doc: &'a Document,
    pub policy: &'a CompiledPolicy,
}

/// What a rule's test found; passed on to its planner.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RuleMatch {
    Node,
    Attributes(Vec<String>),
    Value(String),
}

pub type TestFn = fn(&RuleContext<'_>, NodeId) -> Option<RuleMatch>;
pub type PlanFn = fn(&RuleContext<'_>, NodeId, RuleMatch) -> Result<Edit, RuleError>;

/// A stateless rule descriptor.
#[derive(Clone, Copy)]
pub struct Rule {
    pub name: &'static str,
    /// Live runs (content still being edited) skip rules where this is false.
    pub applies_to_live: bool,
    pub test: TestFn,
    pub plan: PlanFn,
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("applies_to_live", &self.applies_to_live)
            .finish()
    }
}

const fn rule(name: &'static str, test: TestFn, plan: PlanFn) -> Rule {
    Rule {
        name,
        applies_to_live: true,
        test,
        plan,
    }
}

/// Every rule, in the order they run on each node. Later rules rely on the cleanup done by
/// earlier ones.
pub static RULES: [Rule; 18] = [
    rule("strip-comments", is_unwanted_comment, plan_remove),
    rule("remove-style-and-script", is_style_or_script, plan_remove),
    rule("strip-vendor-attributes", has_vendor_attributes, plan_remove_attributes),
    rule("translate-align", has_translatable_align, plan_translate_align),
    rule("filter-inline-styles", has_filtered_style, plan_filter_styles),
    rule("remove-empty-vendor-paragraphs", is_empty_vendor_paragraph, plan_remove),
    rule("strip-vendor-classes", has_vendor_classes, plan_strip_classes),
    rule("unwrap-section-divs", is_section_div, plan_unwrap),
    rule("unwrap-bare-spans", is_bare_span, plan_unwrap),
    rule("enforce-tag-allowlist", is_disallowed_tag, plan_unwrap),
    rule("unwrap-underline", is_disallowed_underline, plan_unwrap),
    rule("unwrap-namespaced-tags", has_namespace_prefix, plan_unwrap),
    rule("strip-table-dimensions", table_dimensions, plan_remove_attributes),
    rule("strip-image-dimensions", image_dimensions, plan_remove_attributes),
    rule("normalize-image-uri", image_source, plan_normalize_uri),
    rule("normalize-link-uri", link_target, plan_normalize_link),
    Rule {
        applies_to_live: false,
        ..rule("remove-trailing-break", is_trailing_break, plan_remove)
    },
    Rule {
        applies_to_live: false,
        ..rule("unwrap-improper-nesting", is_improperly_nested, plan_unwrap)
    },
];

const VENDOR_ATTRIBUTES: &[&str] = &["v:shape"];
const ALIGN_KEEPERS: &[&str] = &["td", "th", "tr", "table", "img"];
const VENDOR_CLASS_PREFIXES: &[&str] = &["Mso", "O"];
const NAMESPACE_PREFIXES: &[&str] = &["o:", "w:", "st1:"];
const DIMENSIONS: &[&str] = &["width", "height"];

static SECTION_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Section\d+$").expect("section pattern is valid"));

fn plan_remove(_: &RuleContext<'_>, _: NodeId, _: RuleMatch) -> Result<Edit, RuleError> {
    Ok(Edit::Remove)
}

fn plan_unwrap(_: &RuleContext<'_>, _: NodeId, _: RuleMatch) -> Result<Edit, RuleError> {
    Ok(Edit::Unwrap)
}

fn plan_remove_attributes(
    _: &RuleContext<'_>,
    id: NodeId,
    found: RuleMatch,
) -> Result<Edit, RuleError> {
    match found {
        RuleMatch::Attributes(names) => Ok(Edit::remove_attributes(names)),
        other => Err(RuleError::Plan(format!("expected attribute names for {id}, got {other:?}"))),
    }
}

fn present_attributes(doc: &Document, id: NodeId, names: &[&str]) -> Option<RuleMatch> {
    let found: Vec<String> = names
        .iter()
        .filter(|name| doc.has_attr(id, name))
        .map(|name| name.to_string())
        .collect();
    (!found.is_empty()).then_some(RuleMatch::Attributes(found))
}

fn class_tokens(doc: &Document, id: NodeId) -> Vec<&str> {
    doc.attr(id, "class")
        .map(|c| c.split_whitespace().collect())
        .unwrap_or_default()
}

fn is_unwanted_comment(cx: &RuleContext<'_>, id: NodeId) -> Option<RuleMatch> {
    let is_comment = matches!(cx.doc.data(id), Some(NodeData::Comment(_)));
    (is_comment && !cx.policy.allows_comments()).then_some(RuleMatch::Node)
}

fn is_style_or_script(cx: &RuleContext<'_>, id: NodeId) -> Option<RuleMatch> {
    matches!(cx.doc.tag(id), Some("style" | "script")).then_some(RuleMatch::Node)
}

fn has_vendor_attributes(cx: &RuleContext<'_>, id: NodeId) -> Option<RuleMatch> {
    present_attributes(cx.doc, id, VENDOR_ATTRIBUTES)
}

fn has_translatable_align(cx: &RuleContext<'_>, id: NodeId) -> Option<RuleMatch> {
    let tag = cx.doc.tag(id)?;
    if ALIGN_KEEPERS.contains(&tag) {
        return None;
    }
    cx.doc
        .attr(id, "align")
        .map(|value| RuleMatch::Value(value.trim().to_ascii_lowercase()))
}

fn plan_translate_align(
    cx: &RuleContext<'_>,
    id: NodeId,
    found: RuleMatch,
) -> Result<Edit, RuleError> {
    let RuleMatch::Value(alignment) = found else {
        return Err(RuleError::Plan(format!("missing alignment for {id}")));
    };
    let mut edits = Vec::new();
    if !alignment.is_empty() {
        let mut declarations = css::parse_declarations(cx.doc.attr(id, "style").unwrap_or(""));
        css::set_declaration(&mut declarations, "text-align", &alignment);
        edits.push(crate::AttributeEdit::Set(
            "style".to_string(),
            css::write_declarations(&declarations),
        ));
    }
    edits.push(crate::AttributeEdit::Remove("align".to_string()));
    Ok(Edit::Attributes(edits))
}

fn has_filtered_style(cx: &RuleContext<'_>, id: NodeId) -> Option<RuleMatch> {
    if matches!(cx.policy.style_matcher(), StyleMatcher::All) {
        return None;
    }
    cx.doc
        .attr(id, "style")
        .map(|style| RuleMatch::Value(style.to_string()))
}

fn plan_filter_styles(
    cx: &RuleContext<'_>,
    id: NodeId,
    found: RuleMatch,
) -> Result<Edit, RuleError> {
    let RuleMatch::Value(style) = found else {
        return Err(RuleError::Plan(format!("missing style for {id}")));
    };
    let kept: Vec<css::Declaration> = css::parse_declarations(&style)
        .into_iter()
        .filter(|d| cx.policy.style_matcher().allows(&d.name))
        .collect();
    if kept.is_empty() {
        return Ok(Edit::remove_attributes(["style"]));
    }
    let written = css::write_declarations(&kept);
    if written == style {
        return Ok(Edit::Keep);
    }
    Ok(Edit::set_attribute("style", &written))
}

fn has_vendor_class(doc: &Document, id: NodeId) -> bool {
    class_tokens(doc, id)
        .iter()
        .any(|token| token.starts_with("Mso"))
}

/// A `p` with a vendor class holding only whitespace, nested the same way at most.
fn is_empty_vendor_paragraph(cx: &RuleContext<'_>, id: NodeId) -> Option<RuleMatch> {
    let doc = cx.doc;
    let mut stack = vec![id];
    while let Some(current) = stack.pop() {
        if !doc.is_tag(current, "p") || !has_vendor_class(doc, current) {
            return None;
        }
        for &child in doc.children(current) {
            match doc.data(child) {
                Some(NodeData::Element { .. }) => stack.push(child),
                Some(NodeData::Text(text)) if !is_blank(text) => return None,
                _ => {}
            }
        }
    }
    Some(RuleMatch::Node)
}

fn has_vendor_classes(cx: &RuleContext<'_>, id: NodeId) -> Option<RuleMatch> {
    let tokens = class_tokens(cx.doc, id);
    let vendor = |t: &&str| VENDOR_CLASS_PREFIXES.iter().any(|p| t.starts_with(p));
    if !tokens.iter().any(vendor) {
        return None;
    }
    let kept: Vec<&str> = tokens.into_iter().filter(|t| !vendor(t)).collect();
    Some(RuleMatch::Value(kept.join(" ")))
}

fn plan_strip_classes(_: &RuleContext<'_>, id: NodeId, found: RuleMatch) -> Result<Edit, RuleError> {
    match found {
        RuleMatch::Value(classes) if classes.is_empty() => Ok(Edit::remove_attributes(["class"])),
        RuleMatch::Value(classes) => Ok(Edit::set_attribute("class", &classes)),
        other => Err(RuleError::Plan(format!("expected class list for {id}, got {other:?}"))),
    }
}

fn is_section_div(cx: &RuleContext<'_>, id: NodeId) -> Option<RuleMatch> {
    if !cx.doc.is_tag(id, "div") {
        return None;
    }
    let tokens = class_tokens(cx.doc, id);
    let all_sections = !tokens.is_empty() && tokens.iter().all(|t| SECTION_CLASS.is_match(t));
    all_sections.then_some(RuleMatch::Node)
}

fn is_bare_span(cx: &RuleContext<'_>, id: NodeId) -> Option<RuleMatch> {
    let doc = cx.doc;
    if !doc.is_tag(id, "span") || doc.has_attr(id, "class") || doc.has_attr(id, "style") {
        return None;
    }
    let container = cx.policy.container_attribute();
    let within_container = doc
        .ancestors(id)
        .chain(std::iter::once(id))
        .any(|n| doc.has_attr(n, container));
    (!within_container).then_some(RuleMatch::Node)
}

fn is_disallowed_tag(cx: &RuleContext<'_>, id: NodeId) -> Option<RuleMatch> {
    let tag = cx.doc.tag(id)?;
    (!cx.policy.allows_tag(tag)).then_some(RuleMatch::Node)
}

fn is_disallowed_underline(cx: &RuleContext<'_>, id: NodeId) -> Option<RuleMatch> {
    (!cx.policy.allow_underline() && cx.doc.is_tag(id, "u")).then_some(RuleMatch::Node)
}

fn has_namespace_prefix(cx: &RuleContext<'_>, id: NodeId) -> Option<RuleMatch> {
    let tag = cx.doc.tag(id)?;
    NAMESPACE_PREFIXES
        .iter()
        .any(|prefix| tag.starts_with(prefix))
        .then_some(RuleMatch::Node)
}

fn table_dimensions(cx: &RuleContext<'_>, id: NodeId) -> Option<RuleMatch> {
    if !cx.doc.is_tag(id, "table") {
        return None;
    }
    present_attributes(cx.doc, id, DIMENSIONS)
}

fn image_dimensions(cx: &RuleContext<'_>, id: NodeId) -> Option<RuleMatch> {
    if !cx.policy.disallow_image_dimensions() || !cx.doc.is_tag(id, "img") {
        return None;
    }
    present_attributes(cx.doc, id, DIMENSIONS)
}

fn reference(cx: &RuleContext<'_>, id: NodeId, tag: &str, attr: &str) -> Option<RuleMatch> {
    if !cx.doc.is_tag(id, tag) {
        return None;
    }
    let value = cx.doc.attr(id, attr)?.trim();
    (!value.is_empty()).then(|| RuleMatch::Value(value.to_string()))
}

fn image_source(cx: &RuleContext<'_>, id: NodeId) -> Option<RuleMatch> {
    reference(cx, id, "img", "src")
}

fn link_target(cx: &RuleContext<'_>, id: NodeId) -> Option<RuleMatch> {
    reference(cx, id, "a", "href")
}

fn plan_normalize_uri(cx: &RuleContext<'_>, id: NodeId, found: RuleMatch) -> Result<Edit, RuleError> {
    normalize_reference(cx, id, found, "src", false)
}

fn plan_normalize_link(
    cx: &RuleContext<'_>,
    id: NodeId,
    found: RuleMatch,
) -> Result<Edit, RuleError> {
    normalize_reference(cx, id, found, "href", true)
}

/// Fragment or query only references, `.`/`./`, or the page's own authority and path.
fn is_on_current_page(cx: &RuleContext<'_>, parts: &UriParts) -> bool {
    let bare_path = parts.path.is_empty() || parts.path == "." || parts.path == "./";
    if parts.is_relative() && bare_path {
        return true;
    }
    cx.policy
        .page_parts()
        .is_some_and(|page| page.authority == parts.authority && page.path == parts.path)
}

fn normalize_reference(
    cx: &RuleContext<'_>,
    id: NodeId,
    found: RuleMatch,
    attr: &str,
    skip_current_page: bool,
) -> Result<Edit, RuleError> {
    let RuleMatch::Value(raw) = found else {
        return Err(RuleError::Plan(format!("missing reference for {id}")));
    };
    let parts = uri::parse(&raw)?;
    if parts.is_urn() || (skip_current_page && is_on_current_page(cx, &parts)) {
        return Ok(Edit::Keep);
    }
    let base = cx.policy.page_url();
    if parts.scheme.is_none() && base.is_none() {
        return Ok(Edit::Keep);
    }
    let mut normalized = uri::normalize(&raw, base)?;
    let same_domain = match (&parts.host, cx.policy.page_domain()) {
        (None, _) => true,
        (Some(host), Some(domain)) => host.eq_ignore_ascii_case(domain),
        (Some(_), None) => false,
    };
    if !same_domain {
        normalized.scheme = parts.scheme;
    }
    let built = uri::build(&normalized);
    // Same-domain web references follow the page's scheme.
    let rebuilt = if same_domain { uri::strip_http_scheme(&built) } else { &built };
    if rebuilt == raw {
        return Ok(Edit::Keep);
    }
    Ok(Edit::set_attribute(attr, rebuilt))
}

fn is_trailing_break(cx: &RuleContext<'_>, id: NodeId) -> Option<RuleMatch> {
    let doc = cx.doc;
    if !doc.is_tag(id, "br") {
        return None;
    }
    let parent = doc.parent(id)?;
    let structure = cx.policy.structure();
    if !doc.tag(parent).is_some_and(|tag| structure.is_block(tag)) {
        return None;
    }
    if last_relevant_child(doc, parent) == Some(id) {
        return Some(RuleMatch::Node);
    }
    // A break right before a block ends up last in the paragraph wrapped around it.
    let position = doc.position(id)?;
    let next = doc.children(parent)[position + 1..]
        .iter()
        .copied()
        .find(|&sibling| is_relevant(doc, sibling))?;
    doc.tag(next)
        .is_some_and(|tag| structure.is_block(tag))
        .then_some(RuleMatch::Node)
}

fn is_improperly_nested(cx: &RuleContext<'_>, id: NodeId) -> Option<RuleMatch> {
    let doc = cx.doc;
    let tag = doc.tag(id)?;
    if !cx.policy.forbids_self_nesting(tag) {
        return None;
    }
    doc.ancestors(id)
        .any(|a| doc.tag(a) == Some(tag))
        .then_some(RuleMatch::Node)
}
