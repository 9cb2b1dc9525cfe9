use crate::error::TreeError;
use crate::types::{Node, NodeData, NodeId};

#[derive(Debug)]
struct Slot {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Arena-backed mutable tree.
///
/// Every live node has at most one parent and appears exactly once in that parent's child list.
/// Moving a node is a single operation (detach + insert) and the arena refuses any move that
/// would place a node under itself, so cycles cannot be constructed. Removed nodes free their
/// slot; stale handles resolve to `None` or [`TreeError::UnknownNode`].
#[derive(Debug, Default)]
pub struct Document {
    slots: Vec<Option<Slot>>,
    live: usize,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a document from an owned tree and returns it with the handle of the root.
    pub fn from_node(node: &Node) -> (Self, NodeId) {
        let mut doc = Document::new();
        let root = doc.load(node);
        (doc, root)
    }

    /// Number of live nodes in the arena, attached or not.
    pub fn node_count(&self) -> usize {
        self.live
    }

    pub fn create(&mut self, data: NodeData) -> NodeId {
        let data = match data {
            NodeData::Element { tag, attributes } => NodeData::Element {
                tag: tag.to_ascii_lowercase(),
                attributes: attributes
                    .into_iter()
                    .map(|(k, v)| (k.to_ascii_lowercase(), v))
                    .collect(),
            },
            other => other,
        };
        let id = NodeId(self.slots.len() as u32);
        self.slots.push(Some(Slot {
            data,
            parent: None,
            children: Vec::new(),
        }));
        self.live += 1;
        id
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.create(NodeData::element(tag))
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.create(NodeData::Text(text.to_string()))
    }

    /// Loads an owned tree into the arena as a detached subtree.
    pub fn load(&mut self, node: &Node) -> NodeId {
        // Explicit stack of (source node, parent handle); children are pushed in reverse so
        // they are appended in document order.
        let root = self.create(owned_data(node));
        let mut stack: Vec<(&Node, NodeId)> = Vec::new();
        for child in node.children().iter().rev() {
            stack.push((child, root));
        }
        while let Some((source, parent)) = stack.pop() {
            let id = self.create(owned_data(source));
            self.link_last(parent, id);
            for child in source.children().iter().rev() {
                stack.push((child, id));
            }
        }
        root
    }

    /// Converts the subtree rooted at `id` back into an owned tree.
    pub fn to_node(&self, id: NodeId) -> Result<Node, TreeError> {
        self.slot(id)?;
        let mut built: Vec<Node> = Vec::new();

        // Iterative post-order: the first visit schedules the node and its children, the second
        // visit finds its children as the last `n` built nodes.
        let mut stack: Vec<(NodeId, bool)> = vec![(id, false)];
        while let Some((current, visited)) = stack.pop() {
            let slot = self.slot(current)?;
            if !visited {
                stack.push((current, true));
                for &child in slot.children.iter().rev() {
                    stack.push((child, false));
                }
                continue;
            }
            let node = match &slot.data {
                NodeData::Element { tag, attributes } => {
                    let start = built.len() - slot.children.len();
                    let children = built.split_off(start);
                    Node::Element {
                        tag: tag.clone(),
                        attributes: attributes.clone(),
                        children,
                    }
                }
                NodeData::Text(text) => Node::Text { text: text.clone() },
                NodeData::Comment(text) => Node::Comment { text: text.clone() },
                NodeData::ProcessingInstruction { target, data } => Node::ProcessingInstruction {
                    target: target.clone(),
                    data: data.clone(),
                },
            };
            built.push(node);
        }
        debug_assert_eq!(built.len(), 1, "to_node builds exactly one root");
        built.pop().ok_or(TreeError::UnknownNode(id))
    }

    fn slot(&self, id: NodeId) -> Result<&Slot, TreeError> {
        self.slots
            .get(id.index())
            .and_then(Option::as_ref)
            .ok_or(TreeError::UnknownNode(id))
    }

    fn slot_mut(&mut self, id: NodeId) -> Result<&mut Slot, TreeError> {
        self.slots
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .ok_or(TreeError::UnknownNode(id))
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.slot(id).is_ok()
    }

    pub fn data(&self, id: NodeId) -> Option<&NodeData> {
        self.slot(id).ok().map(|s| &s.data)
    }

    pub fn data_mut(&mut self, id: NodeId) -> Option<&mut NodeData> {
        self.slot_mut(id).ok().map(|s| &mut s.data)
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.data(id), Some(NodeData::Element { .. }))
    }

    /// Lowercased tag name for element nodes.
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match self.data(id) {
            Some(NodeData::Element { tag, .. }) => Some(tag),
            _ => None,
        }
    }

    pub fn is_tag(&self, id: NodeId, name: &str) -> bool {
        self.tag(id).is_some_and(|t| t.eq_ignore_ascii_case(name))
    }

    /// Content of text nodes.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.data(id) {
            Some(NodeData::Text(text)) => Some(text),
            _ => None,
        }
    }

    pub fn attributes(&self, id: NodeId) -> &[(String, String)] {
        match self.data(id) {
            Some(NodeData::Element { attributes, .. }) => attributes,
            _ => &[],
        }
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.attributes(id)
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn has_attr(&self, id: NodeId, name: &str) -> bool {
        self.attr(id, name).is_some()
    }

    /// Sets an attribute, replacing an existing value in place or appending a new entry.
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) -> Result<(), TreeError> {
        let Some(NodeData::Element { attributes, .. }) = self.data_mut(id) else {
            self.slot(id)?;
            return Err(TreeError::NotAnElement(id));
        };
        match attributes
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
        {
            Some((_, v)) => *v = value.to_string(),
            None => attributes.push((name.to_ascii_lowercase(), value.to_string())),
        }
        Ok(())
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) -> Option<String> {
        let Some(NodeData::Element { attributes, .. }) = self.data_mut(id) else {
            return None;
        };
        let index = attributes
            .iter()
            .position(|(k, _)| k.eq_ignore_ascii_case(name))?;
        Some(attributes.remove(index).1)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.slot(id).ok().and_then(|s| s.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.slot(id).map(|s| s.children.as_slice()).unwrap_or(&[])
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).first().copied()
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).last().copied()
    }

    /// Index of `id` within its parent's child list.
    pub fn position(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&c| c == id)
    }

    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.position(id)?;
        index
            .checked_sub(1)
            .map(|i| self.children(parent)[i])
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.position(id)?;
        self.children(parent).get(index + 1).copied()
    }

    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            doc: self,
            next: self.parent(id),
        }
    }

    /// True if `ancestor` is `node` or one of its ancestors.
    pub fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        node == ancestor || self.ancestors(node).any(|a| a == ancestor)
    }

    /// Pre-order walk of the subtree rooted at `id`, root included.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        let stack = if self.contains(id) { vec![id] } else { Vec::new() };
        Descendants { doc: self, stack }
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        self.insert_before(parent, child, None)
    }

    /// Moves `child` (attached anywhere or detached) into `parent` before `reference`, or at the
    /// end when `reference` is `None`.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<(), TreeError> {
        if !self.is_element(parent) {
            self.slot(parent)?;
            return Err(TreeError::NotAContainer(parent));
        }
        self.slot(child)?;
        // Only a node with children can be a proper ancestor of `parent`.
        let cycle = child == parent
            || (!self.children(child).is_empty() && self.is_inclusive_ancestor(child, parent));
        if cycle {
            return Err(TreeError::Cycle { parent, child });
        }
        if let Some(reference) = reference {
            if self.parent(reference) != Some(parent) {
                return Err(TreeError::NotAChild {
                    parent,
                    child: reference,
                });
            }
            if reference == child {
                return Ok(());
            }
        }

        self.unlink(child);
        let slot = self.slot_mut(parent)?;
        let index = match reference {
            Some(reference) => slot
                .children
                .iter()
                .position(|&c| c == reference)
                .unwrap_or(slot.children.len()),
            None => slot.children.len(),
        };
        slot.children.insert(index, child);
        self.slot_mut(child)?.parent = Some(parent);
        Ok(())
    }

    /// Moves `child` to sit immediately after `sibling` in `sibling`'s parent.
    pub fn insert_after(&mut self, sibling: NodeId, child: NodeId) -> Result<(), TreeError> {
        let parent = self.parent(sibling).ok_or(TreeError::NoParent(sibling))?;
        if child == sibling {
            return Ok(());
        }
        let reference = self.next_sibling(sibling);
        if reference == Some(child) {
            return Ok(());
        }
        self.insert_before(parent, child, reference)
    }

    /// Detaches `id` from its parent, keeping its subtree alive.
    pub fn detach(&mut self, id: NodeId) -> Result<(), TreeError> {
        self.slot(id)?;
        self.unlink(id);
        Ok(())
    }

    /// Detaches `id` and frees it together with its whole subtree.
    pub fn remove(&mut self, id: NodeId) -> Result<(), TreeError> {
        self.slot(id)?;
        log::trace!(target: "dom", "remove {id}");
        self.unlink(id);
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(slot) = self.slots.get_mut(current.index()).and_then(Option::take) {
                self.live -= 1;
                stack.extend(slot.children);
            }
        }
        Ok(())
    }

    /// Removes all children of `id`.
    pub fn clear_children(&mut self, id: NodeId) -> Result<(), TreeError> {
        let children = self.slot(id)?.children.clone();
        for child in children {
            self.remove(child)?;
        }
        Ok(())
    }

    /// Replaces `id` with its children, promoting them into its parent at its position, and frees
    /// `id`. Returns the promoted children in order.
    pub fn unwrap(&mut self, id: NodeId) -> Result<Vec<NodeId>, TreeError> {
        let parent = self.parent(id).ok_or(TreeError::NoParent(id))?;
        let index = self.position(id).ok_or(TreeError::NoParent(id))?;
        let children = std::mem::take(&mut self.slot_mut(id)?.children);
        log::trace!(target: "dom", "unwrap {id}: promoting {} children", children.len());
        for &child in &children {
            self.slot_mut(child)?.parent = Some(parent);
        }
        let siblings = &mut self.slot_mut(parent)?.children;
        siblings.splice(index..=index, children.iter().copied());
        if let Some(slot) = self.slots.get_mut(id.index()) {
            *slot = None;
            self.live -= 1;
        }
        Ok(children)
    }

    /// Detaches every child of `parent` from index `start` on and returns them in order.
    pub fn split_children(&mut self, parent: NodeId, start: usize) -> Result<Vec<NodeId>, TreeError> {
        let slot = self.slot_mut(parent)?;
        let start = start.min(slot.children.len());
        let tail = slot.children.split_off(start);
        for &child in &tail {
            self.slot_mut(child)?.parent = None;
        }
        Ok(tail)
    }

    fn unlink(&mut self, id: NodeId) {
        let Some(parent) = self.parent(id) else {
            return;
        };
        if let Ok(slot) = self.slot_mut(parent) {
            slot.children.retain(|&c| c != id);
        }
        if let Ok(slot) = self.slot_mut(id) {
            slot.parent = None;
        }
    }

    fn link_last(&mut self, parent: NodeId, child: NodeId) {
        if let Ok(slot) = self.slot_mut(parent) {
            slot.children.push(child);
        }
        if let Ok(slot) = self.slot_mut(child) {
            slot.parent = Some(parent);
        }
    }
}

fn owned_data(node: &Node) -> NodeData {
    match node {
        Node::Element {
            tag, attributes, ..
        } => NodeData::Element {
            tag: tag.clone(),
            attributes: attributes.clone(),
        },
        Node::Text { text } => NodeData::Text(text.clone()),
        Node::Comment { text } => NodeData::Comment(text.clone()),
        Node::ProcessingInstruction { target, data } => NodeData::ProcessingInstruction {
            target: target.clone(),
            data: data.clone(),
        },
    }
}

pub struct Ancestors<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.doc.parent(current);
        Some(current)
    }
}

pub struct Descendants<'a> {
    doc: &'a Document,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.stack.pop()?;
        self.stack
            .extend(self.doc.children(current).iter().rev().copied());
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Document, NodeId) {
        Document::from_node(&Node::Element {
            tag: "DIV".to_string(),
            attributes: vec![("Class".to_string(), "x".to_string())],
            children: vec![
                Node::text("a"),
                Node::Element {
                    tag: "b".to_string(),
                    attributes: Vec::new(),
                    children: vec![Node::text("b")],
                },
                Node::text("c"),
            ],
        })
    }

    #[test]
    fn names_are_lowercased_on_load() {
        let (doc, root) = sample();
        assert_eq!(doc.tag(root), Some("div"));
        assert_eq!(doc.attributes(root)[0].0, "class");
        assert_eq!(doc.attr(root, "CLASS"), Some("x"));
    }

    #[test]
    fn round_trips_through_owned_tree() {
        let (doc, root) = sample();
        let node = doc.to_node(root).unwrap();
        assert_eq!(node.children().len(), 3);
        assert_eq!(node.children()[1].tag(), Some("b"));
    }

    #[test]
    fn unwrap_promotes_children_in_place() {
        let (mut doc, root) = sample();
        let b = doc.children(root)[1];
        let inner = doc.children(b)[0];
        let promoted = doc.unwrap(b).unwrap();
        assert_eq!(promoted, vec![inner]);
        assert_eq!(doc.children(root).len(), 3);
        assert_eq!(doc.children(root)[1], inner);
        assert_eq!(doc.parent(inner), Some(root));
        assert!(!doc.contains(b));
    }

    #[test]
    fn unwrap_of_root_is_refused() {
        let (mut doc, root) = sample();
        assert_eq!(doc.unwrap(root), Err(TreeError::NoParent(root)));
        assert_eq!(doc.children(root).len(), 3);
    }

    #[test]
    fn moving_a_node_under_itself_is_a_cycle() {
        let (mut doc, root) = sample();
        let b = doc.children(root)[1];
        assert_eq!(
            doc.append_child(b, root),
            Err(TreeError::Cycle {
                parent: b,
                child: root
            })
        );
        assert_eq!(
            doc.append_child(b, b),
            Err(TreeError::Cycle { parent: b, child: b })
        );
    }

    #[test]
    fn childless_element_is_still_refused_as_its_own_child() {
        let mut doc = Document::new();
        let lone = doc.create_element("span");
        assert_eq!(
            doc.append_child(lone, lone),
            Err(TreeError::Cycle { parent: lone, child: lone })
        );
        let leaf = doc.create_element("b");
        doc.append_child(lone, leaf).unwrap();
        assert_eq!(doc.parent(leaf), Some(lone));
    }

    #[test]
    fn reparenting_removes_from_old_parent() {
        let (mut doc, root) = sample();
        let a = doc.children(root)[0];
        let b = doc.children(root)[1];
        doc.append_child(b, a).unwrap();
        assert_eq!(doc.children(root).len(), 2);
        assert_eq!(doc.parent(a), Some(b));
        assert_eq!(doc.last_child(b), Some(a));
    }

    #[test]
    fn insert_after_places_next_to_sibling() {
        let (mut doc, root) = sample();
        let a = doc.children(root)[0];
        let c = doc.children(root)[2];
        doc.insert_after(a, c).unwrap();
        assert_eq!(doc.children(root)[1], c);
        assert_eq!(doc.next_sibling(a), Some(c));
        assert_eq!(doc.prev_sibling(c), Some(a));
    }

    #[test]
    fn remove_frees_whole_subtree() {
        let (mut doc, root) = sample();
        assert_eq!(doc.node_count(), 5);
        let b = doc.children(root)[1];
        doc.remove(b).unwrap();
        assert_eq!(doc.node_count(), 3);
        assert_eq!(doc.remove(b), Err(TreeError::UnknownNode(b)));
    }

    #[test]
    fn insert_before_rejects_foreign_reference() {
        let (mut doc, root) = sample();
        let b = doc.children(root)[1];
        let inner = doc.children(b)[0];
        let fresh = doc.create_text("x");
        assert!(matches!(
            doc.insert_before(root, fresh, Some(inner)),
            Err(TreeError::NotAChild { .. })
        ));
        assert_eq!(doc.parent(fresh), None);
    }

    #[test]
    fn split_children_detaches_tail() {
        let (mut doc, root) = sample();
        let tail = doc.split_children(root, 1).unwrap();
        assert_eq!(tail.len(), 2);
        assert_eq!(doc.children(root).len(), 1);
        assert!(tail.iter().all(|&t| doc.parent(t).is_none()));
    }

    #[test]
    fn deep_chain_round_trips_without_recursion() {
        let depth: usize = 100_000;
        let mut doc = Document::new();
        let root = doc.create_element("div");
        let mut current = root;
        for _ in 0..depth {
            let next = doc.create_element("span");
            doc.append_child(current, next).unwrap();
            current = next;
        }
        assert_eq!(doc.descendants(root).count(), depth + 1);
        assert_eq!(doc.ancestors(current).count(), depth);
        let (reloaded, _) = Document::from_node(&Node::text("leaf"));
        assert_eq!(reloaded.node_count(), 1);
    }
}
