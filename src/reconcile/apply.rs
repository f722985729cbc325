//! Applying diffs to the store, with domain notifications

use super::config::{ArtifactTypeConfig, ReconcileConfig};
use super::diff::{
    decompose_instances, diff_artifacts, diff_resources, ArtifactInstance, ArtifactSnapshot,
};
use super::overview::build_overview;
use super::stats::{compute_summary, summary_tag};
use super::{ReconcileError, ReconcileResult};
use crate::model::{AnchorSet, ResourceTag};
use crate::notify::DomainNotifierCapability;
use crate::schema::Schema;
use crate::store::ResourceStoreCapability;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

/// Change counts per artifact type, returned from one reconciliation run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiffCounts {
    pub removed: usize,
    pub created: usize,
    pub changed: usize,
}

pub type ReconcileReport = BTreeMap<String, DiffCounts>;

/// Converges the store onto a snapshot: diff, removals, upserts, in that
/// order, with one notification per applied entry.
///
/// Callers must serialize runs per artifact type; the tag scan and the
/// writes are not one atomic transaction, and re-running the diff is the
/// supported recovery path.
pub struct Reconciler {
    config: ReconcileConfig,
    anchors: AnchorSet,
    store: Arc<dyn ResourceStoreCapability>,
    notifier: Arc<dyn DomainNotifierCapability>,
}

impl Reconciler {
    pub fn new(
        schema: &Schema,
        config: ReconcileConfig,
        store: Arc<dyn ResourceStoreCapability>,
        notifier: Arc<dyn DomainNotifierCapability>,
    ) -> ReconcileResult<Self> {
        config.validate()?;
        let anchors = schema.anchor_set()?;
        Ok(Self {
            config,
            anchors,
            store,
            notifier,
        })
    }

    /// Run one reconciliation cycle over the whole snapshot.
    ///
    /// Every artifact type in the snapshot must be declared in the
    /// configuration. Removals for a type are fully applied before its
    /// upserts, so a resource never appears under two stored identities.
    /// The ordering is scoped per artifact type: tags are namespaced by
    /// type, so an earlier type's upserts cannot alias a later type's
    /// pending removals.
    pub async fn reconcile(&self, snapshot: &ArtifactSnapshot) -> ReconcileResult<ReconcileReport> {
        let mut report = ReconcileReport::new();

        for (artifact, instances) in snapshot {
            let type_config = self.config.artifacts.get(artifact).ok_or_else(|| {
                ReconcileError::UnknownArtifactType {
                    name: artifact.clone(),
                }
            })?;

            let counts = if type_config.decompose {
                let desired = decompose_instances(artifact, instances, &self.anchors)?;
                self.apply_resources(artifact, type_config, &desired).await?
            } else {
                self.apply_artifacts(artifact, instances).await?
            };

            info!(
                artifact = %artifact,
                removed = counts.removed,
                created = counts.created,
                changed = counts.changed,
                "artifact type reconciled"
            );
            report.insert(artifact.clone(), counts);
        }

        if self.config.compute_statistics {
            let summary = compute_summary(&self.stored_resources().await?);
            self.store.upsert_resource(&summary_tag(), &summary).await?;
        }

        Ok(report)
    }

    /// Stored resources of every configured decomposed artifact type. The
    /// summary is rebuilt from this, not from the snapshot, so a run covering
    /// a subset of types keeps the other types' statistics intact.
    async fn stored_resources(
        &self,
    ) -> ReconcileResult<BTreeMap<String, BTreeMap<ResourceTag, Value>>> {
        let mut by_artifact = BTreeMap::new();
        for (artifact, type_config) in &self.config.artifacts {
            if !type_config.decompose {
                continue;
            }
            let mut resources = BTreeMap::new();
            for tag in self.store.get_all_resource_tags(artifact).await? {
                if let Some(content) = self.store.get_resource(&tag).await? {
                    resources.insert(tag, content);
                }
            }
            by_artifact.insert(artifact.clone(), resources);
        }
        Ok(by_artifact)
    }

    async fn apply_resources(
        &self,
        artifact: &str,
        type_config: &ArtifactTypeConfig,
        desired: &BTreeMap<ResourceTag, Value>,
    ) -> ReconcileResult<DiffCounts> {
        let diff = diff_resources(self.store.as_ref(), artifact, desired).await?;
        let counts = DiffCounts {
            removed: diff.removed.len(),
            created: diff.created.len(),
            changed: diff.changed.len(),
        };

        for tag in &diff.removed {
            self.store.delete_resource(tag).await?;
            self.notifier.resource_deleted(tag).await?;
            if self.is_primary(type_config, &tag.class_name) {
                self.notifier.dataset_deleted(tag.id.as_str()).await?;
            }
        }

        for (tag, content) in diff.created.iter().chain(diff.changed.iter()) {
            self.store.upsert_resource(tag, content).await?;
            self.notifier.resource_upserted(tag, content).await?;
            if self.is_primary(type_config, &tag.class_name) {
                // validated at construction: primary classes imply overview
                let overview_config = type_config.overview.as_ref().ok_or_else(|| {
                    ReconcileError::InvalidConfig {
                        reason: format!("artifact type '{}' has no overview", artifact),
                    }
                })?;
                let overview = build_overview(
                    tag.id.as_str(),
                    artifact,
                    &tag.class_name,
                    content,
                    overview_config,
                )?;
                self.notifier.dataset_upserted(&overview).await?;
            }
        }

        Ok(counts)
    }

    async fn apply_artifacts(
        &self,
        artifact: &str,
        instances: &[ArtifactInstance],
    ) -> ReconcileResult<DiffCounts> {
        let diff = diff_artifacts(self.store.as_ref(), artifact, instances).await?;
        let counts = DiffCounts {
            removed: diff.removed.len(),
            created: diff.created.len(),
            changed: diff.changed.len(),
        };

        for tag in &diff.removed {
            self.store.delete_artifact(tag).await?;
        }
        for (tag, content) in diff.created.iter().chain(diff.changed.iter()) {
            self.store.upsert_artifact(tag, content).await?;
        }

        Ok(counts)
    }

    fn is_primary(&self, type_config: &ArtifactTypeConfig, class_name: &str) -> bool {
        type_config
            .primary_dataset_classes
            .iter()
            .any(|c| c == class_name)
    }
}
