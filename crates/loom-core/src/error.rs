use crate::id::{EdgeId, NodeId};
use thiserror::Error;

/// Errors raised by `GraphState` mutations.
///
/// All of them are local and non-fatal: the graph is left exactly as it was
/// before the rejected call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("edge would connect {0} to itself")]
    SelfLoop(NodeId),
    #[error("unknown node {0}")]
    UnknownNode(NodeId),
    #[error("unknown edge {0}")]
    UnknownEdge(EdgeId),
    #[error("node {0} is already registered")]
    DuplicateNode(NodeId),
    #[error("edge {0} is already registered")]
    DuplicateEdge(EdgeId),
    #[error("{0} is not a group")]
    NotAGroup(NodeId),
    #[error("placing {child} inside {group} would create a containment cycle")]
    ContainmentCycle { child: NodeId, group: NodeId },
}
