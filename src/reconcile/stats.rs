//! Post-reconciliation statistics summary

use crate::model::ResourceTag;
use chrono::Utc;
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// Reserved tag the summary document is stored under; rewritten wholesale
/// on every statistics pass.
pub fn summary_tag() -> ResourceTag {
    ResourceTag::new("summary", "GlobalSummary", "latest")
}

/// Slot whose value distribution is reported for a class, by naming
/// convention: `*File` classes group by format, `*Protocol` by type,
/// `*Individual` by sex.
fn grouping_slot(class_name: &str) -> Option<&'static str> {
    if class_name.ends_with("File") {
        Some("format")
    } else if class_name.ends_with("Protocol") {
        Some("type")
    } else if class_name.ends_with("Individual") {
        Some("sex")
    } else {
        None
    }
}

/// Build the summary document from the stored resources of every decomposed
/// artifact type: per-class resource counts, plus value frequencies of the
/// convention slot where one applies. Missing or non-string values count
/// under `"unknown"`.
pub fn compute_summary(resources: &BTreeMap<String, BTreeMap<ResourceTag, Value>>) -> Value {
    let mut artifacts = serde_json::Map::new();

    for (artifact, stored) in resources {
        let mut class_counts: BTreeMap<String, u64> = BTreeMap::new();
        let mut grouped: BTreeMap<String, BTreeMap<String, u64>> = BTreeMap::new();

        for (tag, content) in stored {
            *class_counts.entry(tag.class_name.clone()).or_insert(0) += 1;

            if let Some(slot) = grouping_slot(&tag.class_name) {
                let value = content
                    .get(slot)
                    .and_then(Value::as_str)
                    .unwrap_or("unknown")
                    .to_string();
                *grouped
                    .entry(tag.class_name.clone())
                    .or_default()
                    .entry(value)
                    .or_insert(0) += 1;
            }
        }

        let grouped_json: Value = grouped
            .into_iter()
            .map(|(class, counts)| {
                let slot = grouping_slot(&class).unwrap_or_default();
                (class, json!({"slot": slot, "counts": counts}))
            })
            .collect::<serde_json::Map<_, _>>()
            .into();

        artifacts.insert(
            artifact.clone(),
            json!({
                "class_counts": class_counts,
                "grouped": grouped_json,
            }),
        );
    }

    json!({
        "generated_at": Utc::now().to_rfc3339(),
        "artifacts": Value::Object(artifacts),
    })
}
