use dom::{Document, NodeId, TreeError};
use policy::CompiledPolicy;

use crate::{Diagnostics, RULES, Rule, RuleContext, RuleError};

/// Counters from one sanitizer pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SanitizeStats {
    pub visited: usize,
    pub edits: usize,
    pub failures: usize,
}

/// Runs [`RULES`] over every descendant of `root`. The root itself is never edited.
///
/// With `live` set, rules that only make sense on finished content are skipped.
pub fn sanitize(
    doc: &mut Document,
    root: NodeId,
    policy: &CompiledPolicy,
    live: bool,
    diagnostics: &mut dyn Diagnostics,
) -> Result<SanitizeStats, TreeError> {
    run_rules(doc, root, policy, &RULES, live, diagnostics)
}

/// Same traversal as [`sanitize`] with a caller-supplied rule table.
pub fn run_rules(
    doc: &mut Document,
    root: NodeId,
    policy: &CompiledPolicy,
    rules: &[Rule],
    live: bool,
    diagnostics: &mut dyn Diagnostics,
) -> Result<SanitizeStats, TreeError> {
    if !doc.contains(root) {
        return Err(TreeError::UnknownNode(root));
    }
    let mut stats = SanitizeStats::default();

    // Post-order with siblings last-to-first. Child lists are captured when a node is expanded,
    // so nodes promoted by an unwrap are not visited twice and removed ones are skipped.
    let mut stack: Vec<(NodeId, bool)> = doc.children(root).iter().map(|&c| (c, false)).collect();
    while let Some((id, expanded)) = stack.pop() {
        if !doc.contains(id) {
            continue;
        }
        if !expanded {
            stack.push((id, true));
            stack.extend(doc.children(id).iter().map(|&c| (c, false)));
            continue;
        }
        stats.visited += 1;
        apply_rules(doc, id, policy, rules, live, diagnostics, &mut stats);
    }

    log::debug!(
        target: "sanitize",
        "visited {} nodes, applied {} edits, {} rule failures",
        stats.visited,
        stats.edits,
        stats.failures
    );
    Ok(stats)
}

fn apply_rules(
    doc: &mut Document,
    id: NodeId,
    policy: &CompiledPolicy,
    rules: &[Rule],
    live: bool,
    diagnostics: &mut dyn Diagnostics,
    stats: &mut SanitizeStats,
) {
    for rule in rules {
        if live && !rule.applies_to_live {
            continue;
        }
        let planned = {
            let cx = RuleContext { doc, policy };
            match (rule.test)(&cx, id) {
                Some(found) => (rule.plan)(&cx, id, found),
                None => continue,
            }
        };
        let result = planned.and_then(|edit| {
            edit.apply(doc, id).map_err(RuleError::from)?;
            Ok(edit)
        });
        match result {
            Ok(edit) => {
                if edit != crate::Edit::Keep {
                    stats.edits += 1;
                    log::debug!(target: "sanitize", "{}: {edit:?} on {id}", rule.name);
                }
                if edit.consumes_node() {
                    return;
                }
            }
            Err(err) => {
                stats.failures += 1;
                diagnostics.rule_failed(rule.name, id, &err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RuleMatch;
    use crate::{CollectDiagnostics, Edit};
    use dom::Node;
    use policy::Policy;

    fn el(tag: &str, children: Vec<Node>) -> Node {
        Node::Element {
            tag: tag.to_string(),
            attributes: Vec::new(),
            children,
        }
    }

    fn always(_: &RuleContext<'_>, _: NodeId) -> Option<RuleMatch> {
        Some(RuleMatch::Node)
    }

    fn record_order(cx: &RuleContext<'_>, id: NodeId, _: RuleMatch) -> Result<Edit, RuleError> {
        Err(RuleError::Plan(
            cx.doc.tag(id).or(cx.doc.text(id)).unwrap_or("?").to_string(),
        ))
    }

    fn unwrap_b(cx: &RuleContext<'_>, id: NodeId) -> Option<RuleMatch> {
        cx.doc.is_tag(id, "b").then_some(RuleMatch::Node)
    }

    fn unwrap(_: &RuleContext<'_>, _: NodeId, _: RuleMatch) -> Result<Edit, RuleError> {
        Ok(Edit::Unwrap)
    }

    fn fail(_: &RuleContext<'_>, _: NodeId, _: RuleMatch) -> Result<Edit, RuleError> {
        Err(RuleError::Plan("boom".into()))
    }

    fn mark(_: &RuleContext<'_>, _: NodeId, _: RuleMatch) -> Result<Edit, RuleError> {
        Ok(Edit::set_attribute("data-seen", "1"))
    }

    fn elements_only(cx: &RuleContext<'_>, id: NodeId) -> Option<RuleMatch> {
        cx.doc.is_element(id).then_some(RuleMatch::Node)
    }

    fn visit_order(tree: Node, rules: &[Rule]) -> Vec<String> {
        let (mut doc, root) = Document::from_node(&tree);
        let policy = Policy::default().compile().unwrap();
        let mut diagnostics = CollectDiagnostics::default();
        run_rules(&mut doc, root, &policy, rules, false, &mut diagnostics).unwrap();
        diagnostics.failures.into_iter().map(|f| f.message).collect()
    }

    #[test]
    fn children_first_last_to_first_root_excluded() {
        let tree = el(
            "body",
            vec![
                el("a", vec![Node::text("1"), Node::text("2")]),
                el("b", vec![Node::text("3")]),
            ],
        );
        let order = visit_order(
            tree,
            &[Rule {
                name: "record",
                applies_to_live: true,
                test: always,
                plan: record_order,
            }],
        );
        assert_eq!(
            order,
            [
                "rule matched but could not plan an edit: 3",
                "rule matched but could not plan an edit: b",
                "rule matched but could not plan an edit: 2",
                "rule matched but could not plan an edit: 1",
                "rule matched but could not plan an edit: a",
            ]
        );
    }

    #[test]
    fn unwrapped_children_are_visited_once() {
        let tree = el(
            "div",
            vec![el("b", vec![el("b", vec![Node::text("x")]), el("i", vec![])])],
        );
        let (mut doc, root) = Document::from_node(&tree);
        let policy = Policy::default().compile().unwrap();
        let rules = [
            Rule {
                name: "unwrap-b",
                applies_to_live: true,
                test: unwrap_b,
                plan: unwrap,
            },
            Rule {
                name: "record",
                applies_to_live: true,
                test: always,
                plan: record_order,
            },
        ];
        let mut diagnostics = CollectDiagnostics::default();
        let stats = run_rules(&mut doc, root, &policy, &rules, false, &mut diagnostics).unwrap();
        // x, i, then the inner and outer b are consumed by the unwrap before "record" runs.
        assert_eq!(stats.visited, 4);
        assert_eq!(stats.edits, 2);
        assert_eq!(diagnostics.failures.len(), 2);
        assert_eq!(
            doc.to_node(root).unwrap(),
            el("div", vec![Node::text("x"), el("i", vec![])])
        );
    }

    #[test]
    fn failing_rule_is_reported_and_later_rules_still_run() {
        let tree = el("div", vec![el("p", vec![Node::text("keep me")])]);
        let (mut doc, root) = Document::from_node(&tree);
        let policy = Policy::default().compile().unwrap();
        let rules = [
            Rule {
                name: "explode",
                applies_to_live: true,
                test: elements_only,
                plan: fail,
            },
            Rule {
                name: "mark",
                applies_to_live: true,
                test: elements_only,
                plan: mark,
            },
        ];
        let mut diagnostics = CollectDiagnostics::default();
        let stats = run_rules(&mut doc, root, &policy, &rules, false, &mut diagnostics).unwrap();
        assert_eq!(stats.failures, 1);
        assert_eq!(diagnostics.failures[0].rule, "explode");
        let p = doc.children(root)[0];
        assert_eq!(doc.attr(p, "data-seen"), Some("1"));
        assert_eq!(doc.text(doc.children(p)[0]), Some("keep me"));
    }

    #[test]
    fn live_mode_skips_structural_rules() {
        let tree = el("div", vec![el("p", vec![Node::text("a"), el("br", vec![])])]);
        let policy = Policy::default().compile().unwrap();
        let mut diagnostics = CollectDiagnostics::default();

        let (mut doc, root) = Document::from_node(&tree);
        sanitize(&mut doc, root, &policy, true, &mut diagnostics).unwrap();
        assert_eq!(doc.to_node(root).unwrap(), tree);

        let (mut doc, root) = Document::from_node(&tree);
        sanitize(&mut doc, root, &policy, false, &mut diagnostics).unwrap();
        assert_eq!(
            doc.to_node(root).unwrap(),
            el("div", vec![el("p", vec![Node::text("a")])])
        );
        assert!(diagnostics.failures.is_empty());
    }

    #[test]
    fn unknown_root_is_an_error() {
        let (mut doc, _) = Document::from_node(&el("div", vec![]));
        let policy = Policy::default().compile().unwrap();
        let err = sanitize(&mut doc, NodeId(99), &policy, false, &mut CollectDiagnostics::default());
        assert_eq!(err, Err(TreeError::UnknownNode(NodeId(99))));
    }

    #[test]
    fn deep_nesting_does_not_recurse() {
        let mut doc = Document::new();
        let root = doc.create_element("div");
        let mut parent = root;
        for _ in 0..50_000 {
            let child = doc.create_element("font");
            doc.append_child(parent, child).unwrap();
            parent = child;
        }
        let leaf = doc.create_text("deep");
        doc.append_child(parent, leaf).unwrap();
        let policy = Policy::default().compile().unwrap();
        sanitize(&mut doc, root, &policy, false, &mut CollectDiagnostics::default()).unwrap();
        assert_eq!(doc.children(root), &[leaf]);
    }
}
