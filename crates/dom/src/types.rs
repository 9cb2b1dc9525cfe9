use serde::{Deserialize, Serialize};

/// Handle to a node slot inside a [`crate::Document`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Owned markup tree, the interchange form handed to and returned from the pipeline.
///
/// Attribute order is significant and preserved. Tag and attribute names are lowercased when the
/// tree is loaded into a [`crate::Document`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    Element {
        tag: String,
        #[serde(default)]
        attributes: Vec<(String, String)>,
        #[serde(default)]
        children: Vec<Node>,
    },
    Text {
        text: String,
    },
    Comment {
        text: String,
    },
    ProcessingInstruction {
        target: String,
        data: String,
    },
}

impl Node {
    pub fn element(tag: impl Into<String>) -> Self {
        Node::Element {
            tag: tag.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Node::Text { text: text.into() }
    }

    pub fn comment(text: impl Into<String>) -> Self {
        Node::Comment { text: text.into() }
    }

    pub fn tag(&self) -> Option<&str> {
        match self {
            Node::Element { tag, .. } => Some(tag),
            _ => None,
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        match self {
            Node::Element { attributes, .. } => attributes
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.as_str()),
            _ => None,
        }
    }

    pub fn children(&self) -> &[Node] {
        match self {
            Node::Element { children, .. } => children,
            _ => &[],
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            Node::Element { children, .. } => Some(children),
            _ => None,
        }
    }
}

// Deep trees are dropped from an explicit stack instead of one recursive drop per level.
impl Drop for Node {
    fn drop(&mut self) {
        let Some(children) = self.children_mut() else {
            return;
        };
        if children.iter().all(|child| child.children().is_empty()) {
            return;
        }
        let mut stack = std::mem::take(children);
        while let Some(mut node) = stack.pop() {
            if let Some(grandchildren) = node.children_mut() {
                stack.append(grandchildren);
            }
        }
    }
}

/// Payload of an arena slot. Children live in the slot, not here.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeData {
    Element {
        tag: String,
        attributes: Vec<(String, String)>,
    },
    Text(String),
    Comment(String),
    ProcessingInstruction { target: String, data: String },
}

impl NodeData {
    pub fn element(tag: &str) -> Self {
        NodeData::Element {
            tag: tag.to_ascii_lowercase(),
            attributes: Vec::new(),
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            NodeData::Element { .. } => "element",
            NodeData::Text(_) => "text",
            NodeData::Comment(_) => "comment",
            NodeData::ProcessingInstruction { .. } => "processing-instruction",
        }
    }
}
