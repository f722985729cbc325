//! Store trait definitions

use crate::model::{ArtifactTag, ResourceTag};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashSet;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// The persistence seam the reconciler writes through.
///
/// Decomposed artifacts are stored per resource (keyed by [`ResourceTag`]);
/// artifact types configured to stay whole are stored per artifact instance
/// (keyed by [`ArtifactTag`]). All calls are suspension points; the
/// reconciler issues them sequentially within one request.
#[async_trait]
pub trait ResourceStoreCapability: Send + Sync {
    /// All resource tags currently stored for one artifact type.
    async fn get_all_resource_tags(&self, artifact: &str) -> StorageResult<HashSet<ResourceTag>>;

    /// Stored content of one resource, if present.
    async fn get_resource(&self, tag: &ResourceTag) -> StorageResult<Option<Value>>;

    /// Insert or replace one resource wholesale.
    async fn upsert_resource(&self, tag: &ResourceTag, content: &Value) -> StorageResult<()>;

    async fn delete_resource(&self, tag: &ResourceTag) -> StorageResult<()>;

    /// All whole-artifact tags currently stored for one artifact type.
    async fn get_all_artifact_tags(&self, artifact: &str) -> StorageResult<HashSet<ArtifactTag>>;

    async fn get_artifact(&self, tag: &ArtifactTag) -> StorageResult<Option<Value>>;

    async fn upsert_artifact(&self, tag: &ArtifactTag, content: &Value) -> StorageResult<()>;

    async fn delete_artifact(&self, tag: &ArtifactTag) -> StorageResult<()>;
}
