//! Error types for editing operations

use doc_model::NodeId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EditError {
    #[error("Paragraph not found: {0}")]
    ParagraphNotFound(NodeId),

    #[error("Invalid range {start}..{end} for paragraph text of length {len}")]
    InvalidRange { start: usize, end: usize, len: usize },

    #[error("Document model error: {0}")]
    DocModel(#[from] doc_model::DocModelError),
}

pub type Result<T> = std::result::Result<T, EditError>;
