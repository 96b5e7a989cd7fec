//! Error types for document model operations

use crate::{NodeId, NodeType};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocModelError {
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Node {id} has type {found:?}, expected {expected:?}")]
    UnexpectedNodeType {
        id: NodeId,
        expected: NodeType,
        found: NodeType,
    },

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Tree structure error: {0}")]
    TreeStructureError(String),
}

pub type Result<T> = std::result::Result<T, DocModelError>;
