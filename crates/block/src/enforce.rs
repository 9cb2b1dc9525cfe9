use dom::traverse::is_relevant;
use dom::{Document, NodeData, NodeId, Structure, StructureMap};

use crate::StructureError;

/// Counters from one enforcement pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EnforceStats {
    pub visited: usize,
    pub paragraphs_created: usize,
    pub hoisted: usize,
    pub breakers_removed: usize,
    pub paragraphs_flattened: usize,
    pub blocks_flattened: usize,
}

/// Enforces paragraph structure on `root` and everything below it.
///
/// Elements are taken from an explicit worklist. Paragraphs and empty blocks are handled in place
/// and not descended into. Everything else, inline elements included, has its element children
/// queued after it is rewritten, so a block nested under an inline element is still enforced.
pub fn enforce(
    doc: &mut Document,
    root: NodeId,
    structure: &StructureMap,
) -> Result<EnforceStats, StructureError> {
    if !doc.is_element(root) {
        return Err(StructureError::RootNotElement(root));
    }
    let mut enforcer = Enforcer {
        doc,
        structure,
        pending: vec![root],
        stats: EnforceStats::default(),
    };
    enforcer.run()?;
    let stats = enforcer.stats;
    log::debug!(
        target: "block",
        "visited {} elements, created {} paragraphs, hoisted {}, removed {} breakers",
        stats.visited,
        stats.paragraphs_created,
        stats.hoisted,
        stats.breakers_removed
    );
    Ok(stats)
}

struct Enforcer<'a> {
    doc: &'a mut Document,
    structure: &'a StructureMap,
    pending: Vec<NodeId>,
    stats: EnforceStats,
}

impl Enforcer<'_> {
    fn run(&mut self) -> Result<(), StructureError> {
        while let Some(node) = self.pending.pop() {
            let Some(tag) = self.doc.tag(node) else {
                continue;
            };
            let descend = match self.structure.classify(tag) {
                Structure::Paragraph => {
                    self.paragraph(node)?;
                    false
                }
                Structure::ParagraphContainer => {
                    self.paragraph_container(node)?;
                    true
                }
                Structure::MultiParagraphContainer => {
                    self.multi_paragraph_container(node)?;
                    true
                }
                Structure::InlineContainer => {
                    self.inline_container(node)?;
                    true
                }
                Structure::Empty => {
                    self.doc.clear_children(node)?;
                    false
                }
                Structure::Inline | Structure::Block | Structure::Mixed => true,
            };
            self.stats.visited += 1;
            if descend {
                let children = self.doc.children(node);
                self.pending
                    .extend(children.iter().rev().copied().filter(|&c| self.doc.is_element(c)));
            }
        }
        Ok(())
    }

    fn belongs_inside_paragraph(&self, id: NodeId) -> bool {
        match self.doc.data(id) {
            Some(NodeData::Element { tag, .. }) => {
                matches!(self.structure.classify(tag), Structure::Inline | Structure::Mixed)
            }
            Some(_) => true,
            None => false,
        }
    }

    fn is_paragraph(&self, id: NodeId) -> bool {
        self.doc
            .tag(id)
            .is_some_and(|tag| self.structure.classify(tag) == Structure::Paragraph)
    }

    /// Two `br`s with nothing relevant between them and something relevant after the second,
    /// starting at child `index` of `parent`.
    fn breaker_at(&self, parent: NodeId, index: usize) -> Option<(NodeId, NodeId)> {
        let siblings = self.doc.children(parent);
        let first = *siblings.get(index)?;
        if !self.doc.is_tag(first, "br") {
            return None;
        }
        let mut second = None;
        for &sibling in &siblings[index + 1..] {
            match second {
                None if self.doc.is_tag(sibling, "br") => second = Some(sibling),
                None if is_relevant(self.doc, sibling) => return None,
                Some(pair_end) if is_relevant(self.doc, sibling) => return Some((first, pair_end)),
                _ => {}
            }
        }
        None
    }

    fn remove_breaker(&mut self, (first, second): (NodeId, NodeId)) -> Result<(), StructureError> {
        self.doc.remove(first)?;
        self.doc.remove(second)?;
        self.stats.breakers_removed += 1;
        Ok(())
    }

    fn create_paragraph(&mut self) -> NodeId {
        self.stats.paragraphs_created += 1;
        self.doc.create_element("p")
    }

    /// Places a new paragraph right after `anchor` holding `content`.
    fn split_off(&mut self, anchor: NodeId, content: Vec<NodeId>) -> Result<NodeId, StructureError> {
        let paragraph = self.create_paragraph();
        self.doc.insert_after(anchor, paragraph)?;
        for child in content {
            self.doc.append_child(paragraph, child)?;
        }
        Ok(paragraph)
    }

    /// Promotes the remaining children of a paragraph that lost all of its relevant content to
    /// hoisting, so no hollow paragraph is left behind.
    fn flatten_if_hollow(&mut self, paragraph: NodeId) -> Result<(), StructureError> {
        let hollow = !self
            .doc
            .children(paragraph)
            .iter()
            .any(|&c| is_relevant(self.doc, c));
        if hollow && self.doc.parent(paragraph).is_some() {
            self.doc.unwrap(paragraph)?;
        }
        Ok(())
    }

    /// Unwraps every element that `misplaced` rejects from the subtrees of the inline and mixed
    /// children of `parent`. The walk only passes through inline and mixed elements.
    fn flatten_under_inline(
        &mut self,
        parent: NodeId,
        misplaced: fn(Structure) -> bool,
    ) -> Result<(), StructureError> {
        let mut stack: Vec<NodeId> = self
            .doc
            .children(parent)
            .iter()
            .copied()
            .filter(|&c| self.passes_through(c))
            .collect();
        while let Some(id) = stack.pop() {
            let mut index = 0;
            while let Some(&child) = self.doc.children(id).get(index) {
                let structure = self.doc.tag(child).map(|tag| self.structure.classify(tag));
                match structure {
                    Some(structure) if misplaced(structure) => {
                        // The promoted children now start at `index`.
                        self.doc.unwrap(child)?;
                        self.stats.blocks_flattened += 1;
                    }
                    Some(Structure::Inline | Structure::Mixed) => {
                        stack.push(child);
                        index += 1;
                    }
                    _ => index += 1,
                }
            }
        }
        Ok(())
    }

    fn passes_through(&self, id: NodeId) -> bool {
        self.doc.tag(id).is_some_and(|tag| {
            matches!(self.structure.classify(tag), Structure::Inline | Structure::Mixed)
        })
    }

    fn paragraph(&mut self, paragraph: NodeId) -> Result<(), StructureError> {
        self.flatten_under_inline(paragraph, |s| s.is_block() && s != Structure::Mixed)?;
        let mut current = paragraph;
        let mut index = 0;
        let mut hoisted_from_current = false;

        while let Some(&child) = self.doc.children(current).get(index) {
            if !self.belongs_inside_paragraph(child) {
                let parent = self
                    .doc
                    .parent(current)
                    .ok_or(StructureError::NoParent(current))?;
                self.stats.hoisted += 1;
                self.pending.push(child);
                if index == 0 {
                    self.doc.insert_before(parent, child, Some(current))?;
                    hoisted_from_current = true;
                    continue;
                }
                self.doc.insert_after(current, child)?;
                let tail = self.doc.split_children(current, index)?;
                self.flatten_if_hollow(current)?;
                if tail.is_empty() {
                    return Ok(());
                }
                current = self.split_off(child, tail)?;
                index = 0;
                hoisted_from_current = false;
                continue;
            }

            if let Some(breaker) = self.breaker_at(current, index) {
                let after = self.doc.position(breaker.1).map_or(usize::MAX, |p| p + 1);
                let tail = self.doc.split_children(current, after)?;
                self.remove_breaker(breaker)?;
                // A breaker always has relevant content after it.
                current = self.split_off(current, tail)?;
                index = 0;
                hoisted_from_current = false;
                continue;
            }

            index += 1;
        }

        if hoisted_from_current {
            self.flatten_if_hollow(current)?;
        }
        Ok(())
    }

    /// Wraps child `index` of `container` into the open paragraph if it belongs in one and
    /// returns the index of the next child to look at.
    fn wrap_child(
        &mut self,
        container: NodeId,
        mut index: usize,
        open: &mut Option<NodeId>,
    ) -> Result<usize, StructureError> {
        let Some(&child) = self.doc.children(container).get(index) else {
            return Ok(index);
        };

        if let Some(breaker) = self.breaker_at(container, index) {
            self.remove_breaker(breaker)?;
            *open = None;
            return Ok(index);
        }

        if !self.belongs_inside_paragraph(child) {
            *open = None;
            return Ok(index + 1);
        }

        let current = *open;
        let target = match current {
            Some(paragraph) => paragraph,
            None if is_relevant(self.doc, child) => {
                let paragraph = self.create_paragraph();
                self.doc.insert_before(container, paragraph, Some(child))?;
                *open = Some(paragraph);
                index += 1;
                paragraph
            }
            None => return Ok(index + 1),
        };
        self.doc.append_child(target, child)?;
        Ok(index)
    }

    fn paragraph_container(&mut self, container: NodeId) -> Result<(), StructureError> {
        let mut open = None;
        let mut index = 0;
        while index < self.doc.children(container).len() {
            index = self.wrap_child(container, index, &mut open)?;
        }
        Ok(())
    }

    /// Moves everything before `stop` into a new paragraph if any of it is relevant.
    fn wrap_up_to(&mut self, container: NodeId, stop: NodeId) -> Result<bool, StructureError> {
        let before: Vec<NodeId> = self
            .doc
            .children(container)
            .iter()
            .copied()
            .take_while(|&c| c != stop)
            .collect();
        if !before.iter().any(|&c| is_relevant(self.doc, c)) {
            return Ok(false);
        }
        let paragraph = self.create_paragraph();
        self.doc.insert_before(container, paragraph, Some(stop))?;
        for child in before {
            self.doc.append_child(paragraph, child)?;
        }
        Ok(true)
    }

    fn multi_paragraph_container(&mut self, container: NodeId) -> Result<(), StructureError> {
        let mut multi = false;
        let mut open = None;
        let mut index = 0;
        while let Some(&child) = self.doc.children(container).get(index) {
            if multi {
                index = self.wrap_child(container, index, &mut open)?;
                continue;
            }
            if !self.belongs_inside_paragraph(child) {
                self.wrap_up_to(container, child)?;
                multi = true;
                index = self.doc.position(child).map_or(index, |p| p + 1);
            } else if let Some(breaker) = self.breaker_at(container, index) {
                multi = self.wrap_up_to(container, breaker.0)?;
                let next = self.doc.next_sibling(breaker.1);
                self.remove_breaker(breaker)?;
                index = match next.and_then(|n| self.doc.position(n)) {
                    Some(position) => position,
                    None => self.doc.children(container).len(),
                };
            } else {
                index += 1;
            }
        }
        Ok(())
    }

    /// Unwraps the paragraphs of an inline container. Two `br`s stand in for a paragraph
    /// boundary, but only once relevant inline content follows content seen earlier.
    fn inline_container(&mut self, container: NodeId) -> Result<(), StructureError> {
        let mut seen_content = false;
        let mut needs_break = false;
        let mut index = 0;
        while let Some(&child) = self.doc.children(container).get(index) {
            if self.is_paragraph(child) {
                needs_break |= seen_content;
                self.doc.unwrap(child)?;
                self.stats.paragraphs_flattened += 1;
                continue;
            }
            if !is_relevant(self.doc, child) {
                index += 1;
                continue;
            }
            let is_block = self.doc.tag(child).is_some_and(|tag| self.structure.is_block(tag));
            if needs_break && !is_block {
                for _ in 0..2 {
                    let br = self.doc.create_element("br");
                    self.doc.insert_before(container, br, Some(child))?;
                }
                index += 2;
            }
            needs_break = false;
            seen_content = true;
            index += 1;
        }
        self.flatten_under_inline(container, |s| s == Structure::Paragraph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dom::Node;
    use dom::debug::snapshot;

    fn el(tag: &str, children: Vec<Node>) -> Node {
        Node::Element {
            tag: tag.to_string(),
            attributes: Vec::new(),
            children,
        }
    }

    fn t(text: &str) -> Node {
        Node::text(text)
    }

    fn br() -> Node {
        el("br", Vec::new())
    }

    fn run(tree: Node) -> Vec<String> {
        let (mut doc, root) = Document::from_node(&tree);
        enforce(&mut doc, root, &StructureMap::new()).unwrap();
        snapshot(&doc, root)
    }

    fn lines(expected: &[&str]) -> Vec<String> {
        expected.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn container_runs_are_wrapped() {
        let out = run(el("div", vec![t("a"), el("h1", vec![t("b")]), t("c")]));
        assert_eq!(
            out,
            lines(&["<div>", "  <p>", "    \"a\"", "  <h1>", "    \"b\"", "  <p>", "    \"c\""])
        );
    }

    #[test]
    fn leading_whitespace_stays_outside_paragraphs() {
        let out = run(el("div", vec![t("\n  "), el("b", vec![t("x")]), t(" ")]));
        assert_eq!(
            out,
            lines(&["<div>", "  \"\\n  \"", "  <p>", "    <b>", "      \"x\"", "    \" \""])
        );
    }

    #[test]
    fn breaker_splits_container_runs() {
        let out = run(el("div", vec![t("a"), br(), t(" "), br(), t("b")]));
        assert_eq!(
            out,
            lines(&["<div>", "  <p>", "    \"a\"", "  \" \"", "  <p>", "    \"b\""])
        );
    }

    #[test]
    fn trailing_double_break_is_not_a_breaker() {
        let out = run(el("p", vec![t("a"), br(), br()]));
        assert_eq!(out, lines(&["<p>", "  \"a\"", "  <br>", "  <br>"]));
    }

    #[test]
    fn paragraph_splits_at_breaker() {
        let out = run(el("div", vec![el("p", vec![t("a"), br(), br(), t("b")])]));
        assert_eq!(
            out,
            lines(&["<div>", "  <p>", "    \"a\"", "  <p>", "    \"b\""])
        );
    }

    #[test]
    fn block_in_paragraph_is_hoisted_between_halves() {
        let out = run(el(
            "div",
            vec![el("p", vec![t("a"), el("ul", vec![el("li", vec![t("i")])]), t("b")])],
        ));
        assert_eq!(
            out,
            lines(&[
                "<div>",
                "  <p>",
                "    \"a\"",
                "  <ul>",
                "    <li>",
                "      \"i\"",
                "  <p>",
                "    \"b\"",
            ])
        );
    }

    #[test]
    fn leading_block_moves_before_paragraph_and_keeps_going() {
        let out = run(el(
            "div",
            vec![el("p", vec![el("h2", vec![t("h")]), el("h3", vec![t("g")]), t("rest")])],
        ));
        assert_eq!(
            out,
            lines(&[
                "<div>",
                "  <h2>",
                "    \"h\"",
                "  <h3>",
                "    \"g\"",
                "  <p>",
                "    \"rest\"",
            ])
        );
    }

    #[test]
    fn paragraph_emptied_by_hoisting_is_dropped() {
        let out = run(el("div", vec![el("p", vec![el("table", vec![])])]));
        assert_eq!(out, lines(&["<div>", "  <table>"]));
    }

    #[test]
    fn hoisted_blocks_are_enforced_too() {
        let out = run(el(
            "div",
            vec![el("p", vec![t("a"), el("blockquote", vec![t("q")])])],
        ));
        assert_eq!(
            out,
            lines(&["<div>", "  <p>", "    \"a\"", "  <blockquote>", "    <p>", "      \"q\""])
        );
    }

    #[test]
    fn inline_container_flattens_paragraphs() {
        let out = run(el(
            "h1",
            vec![el("p", vec![t("a")]), el("p", vec![t("b")])],
        ));
        assert_eq!(
            out,
            lines(&["<h1>", "  \"a\"", "  <br>", "  <br>", "  \"b\""])
        );
    }

    #[test]
    fn empty_blocks_lose_children() {
        let out = run(el("div", vec![el("hr", vec![t("x"), el("b", vec![])])]));
        assert_eq!(out, lines(&["<div>", "  <hr>"]));
    }

    #[test]
    fn multi_container_keeps_single_run_inline() {
        let out = run(el("li", vec![t("one "), el("b", vec![t("two")])]));
        assert_eq!(out, lines(&["<li>", "  \"one \"", "  <b>", "    \"two\""]));
    }

    #[test]
    fn multi_container_promotes_on_block_child() {
        let out = run(el("td", vec![t("a"), el("ul", vec![]), t("b")]));
        assert_eq!(
            out,
            lines(&["<td>", "  <p>", "    \"a\"", "  <ul>", "  <p>", "    \"b\""])
        );
    }

    #[test]
    fn multi_container_promotes_on_breaker() {
        let out = run(el("td", vec![t("a"), br(), br(), t("b"), t(" c")]));
        assert_eq!(
            out,
            lines(&["<td>", "  <p>", "    \"a\"", "  <p>", "    \"b\"", "    \" c\""])
        );
    }

    #[test]
    fn multi_container_leading_breaker_does_not_promote() {
        let out = run(el("td", vec![t(" "), br(), br(), t("b")]));
        assert_eq!(out, lines(&["<td>", "  \" \"", "  \"b\""]));
    }

    #[test]
    fn multi_container_block_first_leaves_no_empty_paragraph() {
        let out = run(el("dd", vec![el("ol", vec![]), t("x")]));
        assert_eq!(out, lines(&["<dd>", "  <ol>", "  <p>", "    \"x\""]));
    }

    #[test]
    fn overrides_change_classification() {
        let tree = el("div", vec![t("a"), el("b", vec![t("b")])]);
        let (mut doc, root) = Document::from_node(&tree);
        let map = StructureMap::with_overrides([("div", Structure::Block)]);
        enforce(&mut doc, root, &map).unwrap();
        assert_eq!(doc.to_node(root).unwrap(), tree);
    }

    #[test]
    fn root_paragraph_cannot_be_split() {
        let (mut doc, root) = Document::from_node(&el("p", vec![t("a"), el("div", vec![])]));
        let err = enforce(&mut doc, root, &StructureMap::new()).unwrap_err();
        assert_eq!(err, StructureError::NoParent(root));
    }

    #[test]
    fn text_root_is_rejected() {
        let (mut doc, root) = Document::from_node(&t("a"));
        assert_eq!(
            enforce(&mut doc, root, &StructureMap::new()),
            Err(StructureError::RootNotElement(root))
        );
    }

    #[test]
    fn blocks_under_inline_root_are_enforced() {
        let tree = el("span", vec![el("div", vec![t("x")])]);
        assert_eq!(run(tree), lines(&["<span>", "  <div>", "    <p>", "      \"x\""]));
    }

    #[test]
    fn paragraph_under_inline_child_is_unwrapped_into_the_new_paragraph() {
        let tree = el("div", vec![el("b", vec![el("p", vec![t("x")])])]);
        assert_eq!(run(tree), lines(&["<div>", "  <p>", "    <b>", "      \"x\""]));
    }

    #[test]
    fn blocks_deep_under_paragraph_inlines_are_unwrapped() {
        let tree = el(
            "p",
            vec![el("i", vec![el("ins", vec![el("div", vec![el("b", vec![t("x")])])])])],
        );
        assert_eq!(
            run(tree),
            lines(&["<p>", "  <i>", "    <ins>", "      <b>", "        \"x\""])
        );
    }

    #[test]
    fn empty_paragraph_after_content_adds_no_breaks() {
        let out = run(el("h1", vec![t("x"), el("p", vec![t(" ")])]));
        assert_eq!(out, lines(&["<h1>", "  \"x\"", "  \" \""]));
    }

    #[test]
    fn breaks_wait_for_content_after_an_empty_paragraph() {
        let out = run(el("h1", vec![t("x"), el("p", Vec::new()), t("y")]));
        assert_eq!(out, lines(&["<h1>", "  \"x\"", "  <br>", "  <br>", "  \"y\""]));
    }

    #[test]
    fn paragraph_under_inline_in_inline_container_is_unwrapped_without_breaks() {
        let out = run(el("h2", vec![t("a"), el("em", vec![el("p", vec![t("b")])])]));
        assert_eq!(out, lines(&["<h2>", "  \"a\"", "  <em>", "    \"b\""]));
    }

    #[test]
    fn block_children_of_inline_containers_are_enforced() {
        let tree = el("div", vec![el("h1", vec![el("div", vec![t("b")])])]);
        assert_eq!(
            run(tree),
            lines(&["<div>", "  <h1>", "    <div>", "      <p>", "        \"b\""])
        );
    }

    #[test]
    fn deep_block_nesting_uses_the_worklist() {
        let mut doc = Document::new();
        let root = doc.create_element("div");
        let mut parent = root;
        for _ in 0..50_000 {
            let child = doc.create_element("blockquote");
            doc.append_child(parent, child).unwrap();
            parent = child;
        }
        let leaf = doc.create_text("deep");
        doc.append_child(parent, leaf).unwrap();
        let stats = enforce(&mut doc, root, &StructureMap::new()).unwrap();
        assert_eq!(stats.paragraphs_created, 1);
        assert!(doc.is_tag(doc.parent(leaf).unwrap(), "p"));
    }
}
