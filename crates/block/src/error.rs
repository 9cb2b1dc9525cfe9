use dom::{NodeId, TreeError};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StructureError {
    #[error("enforcement root {0} is not an element")]
    RootNotElement(NodeId),
    #[error("paragraph {0} must be split but has no parent")]
    NoParent(NodeId),
    #[error(transparent)]
    Tree(#[from] TreeError),
}
