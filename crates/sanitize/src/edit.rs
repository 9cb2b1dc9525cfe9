use dom::{Document, NodeId, TreeError};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AttributeEdit {
    Set(String, String),
    Remove(String),
}

/// Change a rule wants made to the node it matched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Edit {
    /// Nothing to do after all.
    Keep,
    /// Delete the node and its subtree.
    Remove,
    /// Replace the node with its children.
    Unwrap,
    Attributes(Vec<AttributeEdit>),
}

impl Edit {
    pub fn remove_attributes<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Edit::Attributes(names.into_iter().map(|n| AttributeEdit::Remove(n.into())).collect())
    }

    pub fn set_attribute(name: &str, value: &str) -> Self {
        Edit::Attributes(vec![AttributeEdit::Set(name.to_string(), value.to_string())])
    }

    /// Whether the node is gone from its position once this edit is applied.
    pub fn consumes_node(&self) -> bool {
        matches!(self, Edit::Remove | Edit::Unwrap)
    }

    /// Applies the edit as one operation. Every check happens before the first mutation, so an
    /// error leaves the tree untouched.
    pub(crate) fn apply(&self, doc: &mut Document, id: NodeId) -> Result<(), TreeError> {
        match self {
            Edit::Keep => Ok(()),
            Edit::Remove => doc.remove(id),
            Edit::Unwrap => doc.unwrap(id).map(|_| ()),
            Edit::Attributes(edits) => {
                if !doc.is_element(id) {
                    return Err(match doc.contains(id) {
                        true => TreeError::NotAnElement(id),
                        false => TreeError::UnknownNode(id),
                    });
                }
                for edit in edits {
                    match edit {
                        AttributeEdit::Set(name, value) => doc.set_attr(id, name, value)?,
                        AttributeEdit::Remove(name) => {
                            while doc.remove_attr(id, name).is_some() {}
                        }
                    }
                }
                Ok(())
            }
        }
    }
}
