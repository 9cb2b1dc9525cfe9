use crate::NodeId;

/// A structural edit that the arena refused. Edits validate before mutating, so a returned error
/// means the document is unchanged.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    #[error("node {0} does not exist in this document")]
    UnknownNode(NodeId),
    #[error("node {0} is not an element")]
    NotAnElement(NodeId),
    #[error("node {0} cannot have children")]
    NotAContainer(NodeId),
    #[error("inserting {child} under {parent} would make a node its own descendant")]
    Cycle { parent: NodeId, child: NodeId },
    #[error("node {0} has no parent")]
    NoParent(NodeId),
    #[error("node {child} is not a child of {parent}")]
    NotAChild { parent: NodeId, child: NodeId },
}
