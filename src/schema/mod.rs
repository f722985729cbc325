//! Schema representation and structural document validation
//!
//! The schema is the class/slot vocabulary documents are described by.
//! Transformations consume and produce whole `Schema` values; reads go
//! through the [`SchemaCapability`] seam so callers never depend on the
//! concrete representation.

mod def;
mod validate;

pub use def::{ClassDef, Schema, SchemaCapability, SlotDef, SlotRange};
pub use validate::{DocumentValidator, ValidationIssue};

use thiserror::Error;

/// Errors raised by schema construction and validation
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("unknown class '{0}'")]
    UnknownClass(String),

    #[error("class '{class}' has no slot '{slot}'")]
    UnknownSlot { class: String, slot: String },

    #[error("invalid anchor point for class '{class}': {reason}")]
    InvalidAnchor { class: String, reason: String },

    #[error("document does not conform to schema '{schema}': {}", issues.iter().map(|i| i.to_string()).collect::<Vec<_>>().join("; "))]
    Validation {
        schema: String,
        issues: Vec<ValidationIssue>,
    },

    #[error("failed to parse schema: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;
