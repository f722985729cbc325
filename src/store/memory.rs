//! In-memory store for tests and embedded use

use super::traits::{ResourceStoreCapability, StorageResult};
use crate::model::{ArtifactTag, ResourceTag};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

/// HashMap-backed store. Thread-safe via internal mutexes; contents are lost
/// when the store is dropped.
#[derive(Debug, Default)]
pub struct MemoryResourceStore {
    resources: Mutex<HashMap<ResourceTag, Value>>,
    artifacts: Mutex<HashMap<ArtifactTag, Value>>,
}

impl MemoryResourceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ResourceStoreCapability for MemoryResourceStore {
    async fn get_all_resource_tags(&self, artifact: &str) -> StorageResult<HashSet<ResourceTag>> {
        let resources = self.resources.lock().expect("store mutex poisoned");
        Ok(resources
            .keys()
            .filter(|tag| tag.artifact == artifact)
            .cloned()
            .collect())
    }

    async fn get_resource(&self, tag: &ResourceTag) -> StorageResult<Option<Value>> {
        let resources = self.resources.lock().expect("store mutex poisoned");
        Ok(resources.get(tag).cloned())
    }

    async fn upsert_resource(&self, tag: &ResourceTag, content: &Value) -> StorageResult<()> {
        let mut resources = self.resources.lock().expect("store mutex poisoned");
        resources.insert(tag.clone(), content.clone());
        Ok(())
    }

    async fn delete_resource(&self, tag: &ResourceTag) -> StorageResult<()> {
        let mut resources = self.resources.lock().expect("store mutex poisoned");
        resources.remove(tag);
        Ok(())
    }

    async fn get_all_artifact_tags(&self, artifact: &str) -> StorageResult<HashSet<ArtifactTag>> {
        let artifacts = self.artifacts.lock().expect("store mutex poisoned");
        Ok(artifacts
            .keys()
            .filter(|tag| tag.artifact == artifact)
            .cloned()
            .collect())
    }

    async fn get_artifact(&self, tag: &ArtifactTag) -> StorageResult<Option<Value>> {
        let artifacts = self.artifacts.lock().expect("store mutex poisoned");
        Ok(artifacts.get(tag).cloned())
    }

    async fn upsert_artifact(&self, tag: &ArtifactTag, content: &Value) -> StorageResult<()> {
        let mut artifacts = self.artifacts.lock().expect("store mutex poisoned");
        artifacts.insert(tag.clone(), content.clone());
        Ok(())
    }

    async fn delete_artifact(&self, tag: &ArtifactTag) -> StorageResult<()> {
        let mut artifacts = self.artifacts.lock().expect("store mutex poisoned");
        artifacts.remove(tag);
        Ok(())
    }
}
