use dom::traverse::{TreeShape, measure};
use dom::{Document, NodeId};
use serde::{Deserialize, Serialize};

use crate::CleanError;

/// Input ceilings checked before any rewriting. `None` means unbounded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Limits {
    pub max_nodes: Option<usize>,
    /// Deepest allowed node, counting the root as depth 0.
    pub max_depth: Option<usize>,
}

impl Limits {
    pub fn check(&self, doc: &Document, root: NodeId) -> Result<TreeShape, CleanError> {
        let shape = measure(doc, root);
        if let Some(limit) = self.max_nodes {
            if shape.nodes > limit {
                return Err(CleanError::LimitExceeded {
                    what: "nodes",
                    actual: shape.nodes,
                    limit,
                });
            }
        }
        if let Some(limit) = self.max_depth {
            if shape.depth > limit {
                return Err(CleanError::LimitExceeded {
                    what: "levels of nesting",
                    actual: shape.depth,
                    limit,
                });
            }
        }
        Ok(shape)
    }
}
