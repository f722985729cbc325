//! Artifact reconciliation: converging the resource store onto snapshots
//!
//! Each cycle decomposes a snapshot into per-resource desired state, diffs
//! it against what the store holds, and applies the minimal change set with
//! removals strictly before upserts. Unchanged resources produce no writes
//! and no notifications, so repeating a cycle is a no-op.

mod apply;
mod config;
mod diff;
mod overview;
mod stats;

pub use apply::{DiffCounts, ReconcileReport, Reconciler};
pub use config::{ArtifactTypeConfig, OverviewConfig, ReconcileConfig};
pub use diff::{
    decompose_instances, diff_artifacts, diff_resources, ArtifactDiff, ArtifactInstance,
    ArtifactSnapshot, ResourceDiff,
};
pub use overview::{build_overview, file_extension, DatasetFile, DatasetOverview};
pub use stats::{compute_summary, summary_tag};

use crate::model::ModelError;
use crate::notify::NotifyError;
use crate::schema::SchemaError;
use crate::store::StorageError;
use thiserror::Error;

/// Errors that can occur during reconciliation
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("Snapshot contains undeclared artifact type '{name}'")]
    UnknownArtifactType { name: String },

    #[error("Invalid reconciliation config: {reason}")]
    InvalidConfig { reason: String },

    #[error("Failed to parse reconciliation config: {0}")]
    ConfigParse(#[from] serde_yaml::Error),

    #[error(
        "File '{filename}' has an unrecognized suffix after declared format '{format}'"
    )]
    UnrecognizedFileSuffix { filename: String, format: String },

    #[error("Overview file entry at '{path}' is missing string slot '{slot}'")]
    OverviewSlotMissing { path: String, slot: String },

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Notify(#[from] NotifyError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Result type for reconciliation operations
pub type ReconcileResult<T> = Result<T, ReconcileError>;
