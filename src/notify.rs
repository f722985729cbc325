//! Domain event notification seam
//!
//! The reconciler reports every store mutation through a
//! [`DomainNotifierCapability`] so downstream consumers (search indexes,
//! event buses) can follow along. Notification failures abort the
//! reconciliation run; re-running the diff is always safe.

use crate::model::ResourceTag;
use crate::reconcile::DatasetOverview;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Mutex;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Notification delivery failed: {0}")]
    Delivery(String),
}

pub type NotifyResult<T> = Result<T, NotifyError>;

/// Receives one event per applied diff entry, in apply order (deletions
/// before upserts).
#[async_trait]
pub trait DomainNotifierCapability: Send + Sync {
    async fn resource_upserted(&self, tag: &ResourceTag, content: &Value) -> NotifyResult<()>;

    async fn resource_deleted(&self, tag: &ResourceTag) -> NotifyResult<()>;

    /// A primary-dataset resource was created or changed; `overview` carries
    /// its flattened file listing.
    async fn dataset_upserted(&self, overview: &DatasetOverview) -> NotifyResult<()>;

    /// A primary-dataset resource was removed.
    async fn dataset_deleted(&self, dataset_id: &str) -> NotifyResult<()>;
}

/// Notifier that emits structured log events and nothing else
#[derive(Debug, Default)]
pub struct LogNotifier;

impl LogNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DomainNotifierCapability for LogNotifier {
    async fn resource_upserted(&self, tag: &ResourceTag, _content: &Value) -> NotifyResult<()> {
        info!(tag = %tag, "resource upserted");
        Ok(())
    }

    async fn resource_deleted(&self, tag: &ResourceTag) -> NotifyResult<()> {
        info!(tag = %tag, "resource deleted");
        Ok(())
    }

    async fn dataset_upserted(&self, overview: &DatasetOverview) -> NotifyResult<()> {
        info!(
            dataset_id = %overview.dataset_id,
            files = overview.files.len(),
            "dataset upserted"
        );
        Ok(())
    }

    async fn dataset_deleted(&self, dataset_id: &str) -> NotifyResult<()> {
        info!(dataset_id = %dataset_id, "dataset deleted");
        Ok(())
    }
}

/// One captured notification, for assertions in tests
#[derive(Debug, Clone, PartialEq)]
pub enum NotifyEvent {
    ResourceUpserted { tag: ResourceTag, content: Value },
    ResourceDeleted { tag: ResourceTag },
    DatasetUpserted { overview: DatasetOverview },
    DatasetDeleted { dataset_id: String },
}

/// Test double that records events in delivery order
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<NotifyEvent>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<NotifyEvent> {
        self.events.lock().expect("notifier mutex poisoned").clone()
    }

    fn record(&self, event: NotifyEvent) {
        self.events.lock().expect("notifier mutex poisoned").push(event);
    }
}

#[async_trait]
impl DomainNotifierCapability for RecordingNotifier {
    async fn resource_upserted(&self, tag: &ResourceTag, content: &Value) -> NotifyResult<()> {
        self.record(NotifyEvent::ResourceUpserted {
            tag: tag.clone(),
            content: content.clone(),
        });
        Ok(())
    }

    async fn resource_deleted(&self, tag: &ResourceTag) -> NotifyResult<()> {
        self.record(NotifyEvent::ResourceDeleted { tag: tag.clone() });
        Ok(())
    }

    async fn dataset_upserted(&self, overview: &DatasetOverview) -> NotifyResult<()> {
        self.record(NotifyEvent::DatasetUpserted {
            overview: overview.clone(),
        });
        Ok(())
    }

    async fn dataset_deleted(&self, dataset_id: &str) -> NotifyResult<()> {
        self.record(NotifyEvent::DatasetDeleted {
            dataset_id: dataset_id.to_string(),
        });
        Ok(())
    }
}
