//! Metaloom: schema-driven metadata transformation and reconciliation
//!
//! Transforms schema-described metadata documents through declarative
//! workflows of named steps and reconciles the resulting artifacts into a
//! persistent resource store.
//!
//! # Core Concepts
//!
//! - **Schema**: classes, slots, and anchor points describing document shape
//! - **Reference paths**: fixed-depth class-to-class traversals like `Run(sample)>Sample`
//! - **Aggregation**: visit-once subgraph walks feeding declared functions
//! - **Workflows**: DAGs of transformations with pre/post validation
//! - **Reconciliation**: minimal diff of artifact snapshots against the store
//!
//! # Example
//!
//! ```
//! use metaloom::{PipelineExecutor, TransformationRegistry};
//!
//! let registry = TransformationRegistry::with_builtins();
//! let executor = PipelineExecutor::new();
//! // Build a workflow from YAML and run it
//! # let _ = (registry, executor);
//! ```

pub mod aggregate;
pub mod model;
pub mod notify;
pub mod pipeline;
pub mod reconcile;
pub mod refpath;
pub mod schema;
pub mod store;

pub use aggregate::{AggregateError, AggregationFunction, AggregationOperation, AggregationSpec};
pub use model::{
    AnchorPoint, AnchorSet, ArtifactTag, ModelError, ModelResult, Resource, ResourceId,
    ResourceIndex, ResourceTag,
};
pub use notify::{DomainNotifierCapability, LogNotifier, NotifyError, RecordingNotifier};
pub use pipeline::{
    Artifact, PipelineError, PipelineExecutor, PipelineResult, Transformation,
    TransformationRegistry, Workflow, WorkflowConfig,
};
pub use reconcile::{
    ArtifactInstance, ArtifactSnapshot, DatasetOverview, ReconcileConfig, ReconcileError,
    ReconcileResult, Reconciler,
};
pub use refpath::{EmptyMatchPolicy, PathError, PathResult, ReferencePath};
pub use schema::{
    ClassDef, DocumentValidator, Schema, SchemaCapability, SchemaError, SchemaResult, SlotDef,
    SlotRange,
};
pub use store::{
    MemoryResourceStore, ResourceStoreCapability, SqliteResourceStore, StorageError, StorageResult,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
