//! Aggregation engine: subgraph traversal and pluggable aggregation functions
//!
//! Executes declared aggregation operations over instance data, walking slot
//! chains with visit-once semantics for shared references, and derives the
//! minimal output schema implied by the operations used.

mod derive;
mod exec;
mod functions;
mod ops;
mod walk;

pub use derive::derive_output_schema;
pub use exec::execute;
pub use functions::AggregationFunction;
pub use ops::{AggregationOperation, AggregationSpec, SlotPath};
pub use walk::{terminal_nodes, validate_paths};

use crate::model::ModelError;
use crate::schema::SchemaError;
use thiserror::Error;

/// Errors raised by subgraph traversal and aggregation execution
#[derive(Debug, Error)]
pub enum AggregateError {
    #[error("class '{class}' has no slot '{slot}' declared")]
    UnknownSlot { class: String, slot: String },

    #[error("slot '{slot}' of class '{class}' has a primitive range but is not the last path segment")]
    PrimitiveMidPath { class: String, slot: String },

    #[error("multivalued slot '{slot}' of class '{class}' does not hold a list")]
    NotAList { class: String, slot: String },

    #[error("required slot '{slot}' is missing on an instance of '{class}'")]
    RequiredSlotMissing { class: String, slot: String },

    #[error("reference to '{id}' cannot be resolved to an instance of '{class}'")]
    UnresolvedReference { class: String, id: String },

    #[error("aggregation function {function} failed: {reason}")]
    Function { function: String, reason: String },

    #[error("output path '{path}' conflicts with an already written value")]
    OutputPathConflict { path: String },

    #[error("operation writing '{output_path}' failed on instance '{instance}'")]
    Operation {
        output_path: String,
        instance: String,
        #[source]
        source: Box<AggregateError>,
    },

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

impl AggregateError {
    /// Wrap a failure with the operation and instance it occurred on.
    pub(crate) fn in_operation(self, output_path: &str, instance: &str) -> Self {
        AggregateError::Operation {
            output_path: output_path.to_string(),
            instance: instance.to_string(),
            source: Box::new(self),
        }
    }
}

/// Result type for aggregation operations
pub type AggregateResult<T> = Result<T, AggregateError>;
