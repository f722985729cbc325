//! The transformation contract
//!
//! A transformation is configured once (its config is parsed by the registry
//! factory that builds it) and then exposes the four-part contract: an
//! assumption check against the input schema, a pure schema transform, and a
//! data-transformer factory bound to the input/output schema pair.

use crate::aggregate::AggregateError;
use crate::model::ModelError;
use crate::refpath::PathError;
use crate::schema::{Schema, SchemaError};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// A transformation's precondition on its input schema was not met.
///
/// Surfaced to operators with the violating step attached; actionable, not
/// a defect.
#[derive(Debug, Error)]
#[error("{reason}")]
pub struct AssumptionError {
    pub reason: String,
}

impl AssumptionError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Errors raised while transforming schemas or documents
#[derive(Debug, Error)]
pub enum TransformError {
    #[error(transparent)]
    Path(#[from] PathError),

    #[error(transparent)]
    Aggregate(#[from] AggregateError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("{0}")]
    Other(String),
}

/// Transforms documents between a fixed input and output schema.
///
/// May consult both schemas but never mutates them; the annotation is an
/// opaque side channel handed through from the pipeline caller.
pub trait DataTransformer: Send + Sync {
    fn transform(&self, document: &Value, annotation: Option<&Value>)
        -> Result<Value, TransformError>;
}

/// A self-contained transformation: schema transform plus data transform.
pub trait Transformation: Send + Sync {
    /// Registry name of this transformation kind
    fn name(&self) -> &str;

    /// Check that the input schema satisfies this transformation's
    /// preconditions. Runs before anything is transformed.
    fn check_assumptions(&self, schema: &Schema) -> Result<(), AssumptionError>;

    /// Derive the output schema. Pure; no side effects.
    fn transform_schema(&self, schema: &Schema) -> Result<Schema, TransformError>;

    /// Build the data transformer bound to the schema pair.
    fn make_data_transformer(
        &self,
        input_schema: Arc<Schema>,
        output_schema: Arc<Schema>,
    ) -> Result<Box<dyn DataTransformer>, TransformError>;
}
