use block::EnforceStats;
use dom::traverse::TreeShape;
use dom::{Document, Node, NodeId};
use policy::CompiledPolicy;
use sanitize::{Diagnostics, LogDiagnostics, SanitizeStats};
use serialize::serialize_children;

use crate::{CleanError, Config, Limits};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CleanOptions {
    /// Skip rules that only apply to finished content, such as trailing break removal.
    pub live: bool,
    pub limits: Limits,
}

/// What one [`clean`] did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CleanReport {
    /// Shape of the input, measured before any rewriting.
    pub input: TreeShape,
    pub sanitize: SanitizeStats,
    pub enforce: EnforceStats,
}

/// Cleans the subtree under `root` in place. `root` itself is kept as the container even if its
/// tag is not allowed, and must be an element.
pub fn clean(
    doc: &mut Document,
    root: NodeId,
    policy: &CompiledPolicy,
    options: &CleanOptions,
    diagnostics: &mut dyn Diagnostics,
) -> Result<CleanReport, CleanError> {
    let input = options.limits.check(doc, root)?;
    let sanitize = sanitize::sanitize(doc, root, policy, options.live, diagnostics)?;
    let enforce = block::enforce(doc, root, policy.structure())?;
    log::debug!(
        target: "pipeline",
        "cleaned {} nodes: {} edits, {} rule failures, {} paragraphs created",
        input.nodes,
        sanitize.edits,
        sanitize.failures,
        enforce.paragraphs_created
    );
    Ok(CleanReport {
        input,
        sanitize,
        enforce,
    })
}

/// Result of [`clean_node`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cleaned {
    pub node: Node,
    /// Canonical text of the root's children.
    pub text: String,
    pub report: CleanReport,
}

/// Compiles the policy in `config`, cleans a copy of `node` and serializes the result. Rule
/// failures are logged.
pub fn clean_node(node: &Node, config: &Config) -> Result<Cleaned, CleanError> {
    let policy = config.policy.compile()?;
    let (mut doc, root) = Document::from_node(node);
    let report = clean(
        &mut doc,
        root,
        &policy,
        &config.clean_options(),
        &mut LogDiagnostics,
    )?;
    let text = serialize_children(&doc, root, &config.serialize)?;
    Ok(Cleaned {
        node: doc.to_node(root)?,
        text,
        report,
    })
}
