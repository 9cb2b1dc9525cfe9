use crate::{Document, NodeData, NodeId};

/// True for text made only of whitespace (NBSP included). Empty text counts as whitespace.
pub fn is_blank(text: &str) -> bool {
    text.chars().all(char::is_whitespace)
}

/// A node is relevant if it is an element or text with at least one non-whitespace character.
pub fn is_relevant(doc: &Document, id: NodeId) -> bool {
    match doc.data(id) {
        Some(NodeData::Element { .. }) => true,
        Some(NodeData::Text(text)) => !is_blank(text),
        _ => false,
    }
}

/// Last child of `parent` that is relevant, skipping trailing whitespace and comments.
pub fn last_relevant_child(doc: &Document, parent: NodeId) -> Option<NodeId> {
    doc.children(parent)
        .iter()
        .rev()
        .copied()
        .find(|&c| is_relevant(doc, c))
}

/// True if no relevant node precedes `id` among its siblings.
pub fn is_first_relevant(doc: &Document, id: NodeId) -> bool {
    let Some(parent) = doc.parent(id) else {
        return true;
    };
    doc.children(parent)
        .iter()
        .copied()
        .take_while(|&c| c != id)
        .all(|c| !is_relevant(doc, c))
}

/// Node count and maximum depth (root at depth 0) of the subtree rooted at `root`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TreeShape {
    pub nodes: usize,
    pub depth: usize,
}

pub fn measure(doc: &Document, root: NodeId) -> TreeShape {
    let mut shape = TreeShape::default();
    if !doc.contains(root) {
        return shape;
    }
    let mut stack = vec![(root, 0usize)];
    while let Some((id, depth)) = stack.pop() {
        shape.nodes += 1;
        shape.depth = shape.depth.max(depth);
        for &child in doc.children(id) {
            stack.push((child, depth + 1));
        }
    }
    shape
}
