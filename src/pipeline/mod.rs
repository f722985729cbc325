//! Transformation pipeline: workflow assembly and validated execution
//!
//! Self-contained transformations (a schema transform plus a data transform)
//! are composed into a single-root DAG of named steps. Structural validation
//! runs at every step boundary: an input document that fails validation is a
//! caller/data defect, an output document that fails validation means the
//! step's assumption check was insufficient and is an internal defect.

mod executor;
mod registry;
mod traits;
pub mod transformations;
mod workflow;

pub use executor::{Artifact, PipelineExecutor};
pub use registry::{TransformationRegistry, WorkflowConfig};
pub use traits::{AssumptionError, DataTransformer, TransformError, Transformation};
pub use workflow::{Workflow, WorkflowStep};

use crate::schema::SchemaError;
use thiserror::Error;

/// Errors raised by workflow construction and execution
#[derive(Debug, Error)]
pub enum PipelineError {
    // --- configuration errors: fail fast at construction ---
    #[error("workflow has no root step (exactly one step must have no input)")]
    NoRoot,

    #[error("workflow has multiple root steps: {0:?}")]
    MultipleRoots(Vec<String>),

    #[error("step '{step}' references unknown input step '{input}'")]
    UnknownInput { step: String, input: String },

    #[error("artifact '{artifact}' references unknown step '{step}'")]
    UnknownArtifactStep { artifact: String, step: String },

    #[error("workflow contains a cycle involving steps {0:?}")]
    Cycle(Vec<String>),

    #[error("unknown transformation '{0}'")]
    UnknownTransformation(String),

    #[error("invalid config for transformation '{name}': {reason}")]
    InvalidConfig { name: String, reason: String },

    #[error("failed to parse workflow config: {0}")]
    ConfigParse(#[from] serde_yaml::Error),

    // --- assumption errors: operator-facing, step-attributed ---
    #[error("assumption check failed for step '{step}': {source}")]
    Assumption {
        step: String,
        #[source]
        source: AssumptionError,
    },

    // --- data errors: per-document ---
    #[error("input document for step '{step}' failed validation")]
    PreTransformValidation {
        step: String,
        #[source]
        source: SchemaError,
    },

    #[error("transformation of step '{step}' failed")]
    Transform {
        step: String,
        #[source]
        source: TransformError,
    },

    // --- internal defects: should have been prevented by assumption checks ---
    #[error("step '{step}' produced a document that does not match its transformed schema; this is an internal defect")]
    PostTransformValidation {
        step: String,
        #[source]
        source: SchemaError,
    },

    #[error("schema transformation of step '{step}' failed")]
    SchemaTransform {
        step: String,
        #[source]
        source: TransformError,
    },
}

impl PipelineError {
    /// Whether this error is an internal defect rather than a configuration,
    /// assumption, or data problem.
    pub fn is_internal_defect(&self) -> bool {
        matches!(
            self,
            PipelineError::PostTransformValidation { .. } | PipelineError::SchemaTransform { .. }
        )
    }
}

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;
