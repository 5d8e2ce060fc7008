//! Error types for the model layer.

use thiserror::Error;

/// Errors produced by model registration, references, and the record
/// lifecycle.
#[derive(Debug, Error)]
pub enum Error {
    /// An error from the query core, passed through unchanged.
    #[error(transparent)]
    Core(#[from] sable_core::Error),

    /// A `"Model.attr"` reference that failed to resolve.
    #[error("unknown model or column in reference: {0}")]
    UnresolvedReference(String),

    /// A column registered without a usable name.
    #[error("column {0:?} has no usable name")]
    InvalidColumn(String),

    /// An attribute not mapped by the model.
    #[error("unknown attribute: {0}")]
    UnknownAttribute(String),

    /// A relationship name not declared on the model.
    #[error("unknown relationship: {0}")]
    UnknownRelation(String),

    /// A write to a relationship that only supports reads.
    #[error("relationship {0} is read-only")]
    ReadOnlyRelationship(String),
}

/// Result type alias for model-layer operations.
pub type Result<T> = std::result::Result<T, Error>;
