//! Error types for the stack expander.

use thiserror::Error;

/// Top-level error type for an expansion.
#[derive(Debug, Error)]
pub enum StackError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Merge(#[from] MergeError),

    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Errors in the input document.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("Invalid {field} '{value}': {reason}")]
    InvalidName {
        field: String,
        value: String,
        reason: &'static str,
    },

    #[error("Components {first} and {second} share release name {name}")]
    DuplicateRelease {
        first: String,
        second: String,
        name: String,
    },
}

/// Errors while merging value layers.
#[derive(Debug, Error)]
pub enum MergeError {
    #[error("Cannot merge {overlay} into {base} at '{path}'")]
    TypeMismatch {
        path: String,
        base: &'static str,
        overlay: &'static str,
    },
}

/// Errors in the usage graph.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("Circular usage dependency: {}", .cycle.join(" -> "))]
    Cycle { cycle: Vec<String> },

    #[error("Usage edge references unknown resource: {name}")]
    UnknownResource { name: String },
}
