//! Error types for stamping operations

use thiserror::Error;

/// Errors raised while evaluating one expression.
///
/// These are hook-local: they are routed through the configured exception
/// policy and only abort a stamping pass if the policy escalates them.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvaluationError {
    /// Expression text could not be parsed
    #[error("Parse error at position {position}: {message}")]
    Parse { position: usize, message: String },

    /// No scope of the branch exposes the property
    #[error("Property not found: {0}")]
    PropertyNotFound(String),

    /// No scope of the branch accepts a write to the property
    #[error("Property not writable: {0}")]
    PropertyNotWritable(String),

    /// No directive, interface, function or context object offers the method
    #[error("Method not found: {name} with {arity} argument(s)")]
    MethodNotFound { name: String, arity: usize },

    #[error("Type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    #[error("Index {index} out of bounds for length {len}")]
    IndexOutOfBounds { index: i64, len: usize },

    #[error("Arithmetic error: {0}")]
    Arithmetic(String),

    /// The value evaluated fine but no resolver accepts it
    #[error("No resolver for value of type {0}")]
    NoResolver(String),

    /// A directive rejected its arguments
    #[error("Directive error: {0}")]
    Directive(String),

    /// A registered function or interface method failed
    #[error("Function error: {0}")]
    Function(String),
}

impl EvaluationError {
    pub fn type_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        EvaluationError::TypeMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}

/// Errors from the per-part context tree
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ContextError {
    #[error("Context branch not found: {0}")]
    NotFound(String),
}

/// Errors that abort a stamping pass
#[derive(Debug, Error)]
pub enum StampError {
    /// The template is structurally broken (unpaired comments, missing parents)
    #[error("Malformed document: {0}")]
    MalformedDocument(String),

    #[error("Context error: {0}")]
    Context(#[from] ContextError),

    /// An evaluation failure escalated by the exception policy
    #[error("Unresolved expression '{expression}': {message}")]
    Unresolved { expression: String, message: String },

    #[error("Edit error: {0}")]
    Edit(#[from] edit_engine::EditError),

    #[error("Document model error: {0}")]
    DocModel(#[from] doc_model::DocModelError),

    /// Invalid options or a runaway hook loop
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Result type for stamping operations
pub type Result<T> = std::result::Result<T, StampError>;
