//! Snapshot decomposition and diff computation
//!
//! A snapshot is the full desired state for one reconciliation cycle; the
//! diff against stored state is minimal and recomputed from ground truth,
//! so re-running it is always safe.

use super::ReconcileResult;
use crate::model::{AnchorSet, ArtifactTag, ResourceTag};
use crate::store::ResourceStoreCapability;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// One artifact document in a snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactInstance {
    pub external_id: String,
    pub content: Value,
}

impl ArtifactInstance {
    pub fn new(external_id: impl Into<String>, content: Value) -> Self {
        Self {
            external_id: external_id.into(),
            content,
        }
    }
}

/// Desired state per artifact type name
pub type ArtifactSnapshot = BTreeMap<String, Vec<ArtifactInstance>>;

/// Minimal change set for one decomposed artifact type
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceDiff {
    pub removed: BTreeSet<ResourceTag>,
    pub created: BTreeMap<ResourceTag, Value>,
    pub changed: BTreeMap<ResourceTag, Value>,
}

impl ResourceDiff {
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.created.is_empty() && self.changed.is_empty()
    }
}

/// Minimal change set for one undecomposed artifact type
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArtifactDiff {
    pub removed: BTreeSet<ArtifactTag>,
    pub created: BTreeMap<ArtifactTag, Value>,
    pub changed: BTreeMap<ArtifactTag, Value>,
}

impl ArtifactDiff {
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.created.is_empty() && self.changed.is_empty()
    }
}

/// Decompose snapshot instances into per-resource desired state.
///
/// Every anchored class contributes its root-slot collection from every
/// instance that carries it; instances without a given root slot simply
/// contribute nothing for that class.
pub fn decompose_instances(
    artifact: &str,
    instances: &[ArtifactInstance],
    anchors: &AnchorSet,
) -> ReconcileResult<BTreeMap<ResourceTag, Value>> {
    let mut desired = BTreeMap::new();
    for instance in instances {
        for anchor in anchors.iter() {
            if instance.content.get(&anchor.root_slot).is_none() {
                continue;
            }
            for resource in anchor.extract_resources(&instance.content)? {
                let tag = ResourceTag::new(artifact, &resource.class_name, resource.id);
                desired.insert(tag, resource.content);
            }
        }
    }
    Ok(desired)
}

/// Classify desired resources against stored state.
///
/// Tags absent from the store are created, tags whose stored content
/// differs (deep equality) are changed, equal ones drop out, and stored
/// tags not in the desired set are removed.
pub async fn diff_resources(
    store: &dyn ResourceStoreCapability,
    artifact: &str,
    desired: &BTreeMap<ResourceTag, Value>,
) -> ReconcileResult<ResourceDiff> {
    let existing = store.get_all_resource_tags(artifact).await?;

    let mut diff = ResourceDiff::default();
    for (tag, content) in desired {
        if !existing.contains(tag) {
            diff.created.insert(tag.clone(), content.clone());
            continue;
        }
        let stored = store.get_resource(tag).await?;
        if stored.as_ref() != Some(content) {
            diff.changed.insert(tag.clone(), content.clone());
        }
    }

    diff.removed = existing
        .into_iter()
        .filter(|tag| !desired.contains_key(tag))
        .collect();

    Ok(diff)
}

/// Whole-document variant of [`diff_resources`] for undecomposed types,
/// keyed by `(artifact type, external id)`.
pub async fn diff_artifacts(
    store: &dyn ResourceStoreCapability,
    artifact: &str,
    instances: &[ArtifactInstance],
) -> ReconcileResult<ArtifactDiff> {
    let mut desired = BTreeMap::new();
    for instance in instances {
        let tag = ArtifactTag::new(artifact, &instance.external_id);
        desired.insert(tag, instance.content.clone());
    }

    let existing = store.get_all_artifact_tags(artifact).await?;

    let mut diff = ArtifactDiff::default();
    for (tag, content) in &desired {
        if !existing.contains(tag) {
            diff.created.insert(tag.clone(), content.clone());
            continue;
        }
        let stored = store.get_artifact(tag).await?;
        if stored.as_ref() != Some(content) {
            diff.changed.insert(tag.clone(), content.clone());
        }
    }

    diff.removed = existing
        .into_iter()
        .filter(|tag| !desired.contains_key(tag))
        .collect();

    Ok(diff)
}
