use dom::NodeId;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SerializeError {
    #[error("node {0} does not exist in this document")]
    UnknownNode(NodeId),
}
