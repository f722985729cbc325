//! End-to-end: run the workflow, reconcile its artifact into a store,
//! and converge on repeat runs.

mod common;

use common::{run_workflow, submission_document, RECONCILE_YAML};
use metaloom::notify::NotifyEvent;
use metaloom::{
    ArtifactInstance, ArtifactSnapshot, MemoryResourceStore, ReconcileConfig, Reconciler,
    RecordingNotifier, ResourceStoreCapability, ResourceTag, SqliteResourceStore,
};
use serde_json::json;
use std::sync::Arc;

fn snapshot_of(document: serde_json::Value) -> ArtifactSnapshot {
    let mut snapshot = ArtifactSnapshot::new();
    snapshot.insert(
        "public".to_string(),
        vec![ArtifactInstance::new("sub-1", document)],
    );
    snapshot
}

#[test]
fn test_workflow_restricts_and_links() {
    let artifacts = run_workflow(submission_document());
    let public = &artifacts["public"];

    let samples = public.document["samples"].as_array().unwrap();
    assert!(
        samples[0].get("donor_name").is_none(),
        "donor_name must be stripped"
    );
    assert_eq!(samples[0]["sample_runs"], json!(["r1"]));
    assert_eq!(samples[1]["sample_runs"], json!([]));

    // The output schema reflects both transformations
    let sample_class = public.schema.require_class("Sample").unwrap();
    assert!(!sample_class.slots.contains_key("donor_name"));
    assert!(sample_class.slots.contains_key("sample_runs"));
}

#[tokio::test]
async fn test_artifact_reconciles_into_store() {
    let artifacts = run_workflow(submission_document());
    let public = &artifacts["public"];

    let store = Arc::new(MemoryResourceStore::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let reconciler = Reconciler::new(
        &public.schema,
        ReconcileConfig::from_yaml(RECONCILE_YAML).unwrap(),
        store.clone(),
        notifier.clone(),
    )
    .unwrap();

    let report = reconciler
        .reconcile(&snapshot_of(public.document.clone()))
        .await
        .unwrap();

    // Two samples, one experiment, one run
    assert_eq!(report["public"].created, 4);

    let sample = store
        .get_resource(&ResourceTag::new("public", "Sample", "s1"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(sample["sample_runs"], json!(["r1"]));
    assert!(sample.get("donor_name").is_none());

    // The run is a primary dataset: its overview carries the derived extension
    let overview = notifier
        .events()
        .into_iter()
        .find_map(|e| match e {
            NotifyEvent::DatasetUpserted { overview } => Some(overview),
            _ => None,
        })
        .expect("dataset overview emitted");
    assert_eq!(overview.dataset_id, "r1");
    assert_eq!(overview.files[0].name, "reads.fastq.gz");
    assert_eq!(overview.files[0].extension, ".gz");
}

#[tokio::test]
async fn test_repeat_reconciliation_converges() {
    let artifacts = run_workflow(submission_document());
    let public = &artifacts["public"];

    let store = Arc::new(MemoryResourceStore::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let reconciler = Reconciler::new(
        &public.schema,
        ReconcileConfig::from_yaml(RECONCILE_YAML).unwrap(),
        store,
        notifier.clone(),
    )
    .unwrap();

    let snapshot = snapshot_of(public.document.clone());
    reconciler.reconcile(&snapshot).await.unwrap();
    let events_after_first = notifier.events().len();

    let report = reconciler.reconcile(&snapshot).await.unwrap();
    assert_eq!(report["public"].created, 0);
    assert_eq!(report["public"].changed, 0);
    assert_eq!(report["public"].removed, 0);
    assert_eq!(
        notifier.events().len(),
        events_after_first,
        "a converged run must emit nothing"
    );
}

#[tokio::test]
async fn test_dropped_run_is_removed_with_dataset_event() {
    let store = Arc::new(MemoryResourceStore::new());
    let notifier = Arc::new(RecordingNotifier::new());

    let artifacts = run_workflow(submission_document());
    let public = &artifacts["public"];
    let reconciler = Reconciler::new(
        &public.schema,
        ReconcileConfig::from_yaml(RECONCILE_YAML).unwrap(),
        store.clone(),
        notifier.clone(),
    )
    .unwrap();
    reconciler
        .reconcile(&snapshot_of(public.document.clone()))
        .await
        .unwrap();

    // Resubmit without the run (and without its experiment)
    let mut next_submission = submission_document();
    next_submission["runs"] = json!([]);
    next_submission["experiments"] = json!([]);
    let next = run_workflow(next_submission);

    reconciler
        .reconcile(&snapshot_of(next["public"].document.clone()))
        .await
        .unwrap();

    assert!(store
        .get_resource(&ResourceTag::new("public", "SequencingRun", "r1"))
        .await
        .unwrap()
        .is_none());
    assert!(notifier
        .events()
        .iter()
        .any(|e| matches!(e, NotifyEvent::DatasetDeleted { dataset_id } if dataset_id == "r1")));
}

#[tokio::test]
async fn test_sqlite_store_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("archive.db");

    let artifacts = run_workflow(submission_document());
    let public = &artifacts["public"];
    let config = ReconcileConfig::from_yaml(RECONCILE_YAML).unwrap();

    {
        let store = Arc::new(SqliteResourceStore::open(&db_path).unwrap());
        let reconciler = Reconciler::new(
            &public.schema,
            config.clone(),
            store,
            Arc::new(RecordingNotifier::new()),
        )
        .unwrap();
        reconciler
            .reconcile(&snapshot_of(public.document.clone()))
            .await
            .unwrap();
    }

    // Reopen: identical snapshot produces an empty diff against disk state
    let store = Arc::new(SqliteResourceStore::open(&db_path).unwrap());
    let notifier = Arc::new(RecordingNotifier::new());
    let reconciler = Reconciler::new(&public.schema, config, store, notifier.clone()).unwrap();
    let report = reconciler
        .reconcile(&snapshot_of(public.document.clone()))
        .await
        .unwrap();

    assert_eq!(report["public"].created, 0);
    assert_eq!(report["public"].removed, 0);
    assert!(notifier.events().is_empty());
}
