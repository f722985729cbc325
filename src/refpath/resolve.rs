//! Path resolution against instance data
//!
//! Walks one source resource along a parsed path through the full document
//! graph, returning the resources at the path's target.
//!
//! Cost note: passive elements scan every instance of the element's target
//! class per call. The caller owns the [`ResourceIndex`]; building it once
//! per document and resolving every source against it keeps each class
//! decomposed at most once across the whole batch.

use super::element::{PathElement, PathElementKind};
use super::parse::ReferencePath;
use super::{PathError, PathResult};
use crate::model::{Resource, ResourceIndex};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

/// What to do when a path element matches no instances.
///
/// The two behaviors are part of the public contract; callers must choose
/// one explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyMatchPolicy {
    /// An element with no matches short-circuits to an empty overall result
    #[default]
    ReturnEmpty,
    /// An element with no matches is an error naming the element
    Error,
}

/// Resolve a path from one source resource, returning the target resources.
///
/// The working set starts as the source alone; each element maps it to the
/// union of its targets, deduplicated by id. Ids that cannot be resolved
/// through the target class's anchor index are errors. The index must be
/// built over the document the source was extracted from.
pub fn resolve(
    path: &ReferencePath,
    source: &Resource,
    index: &mut ResourceIndex<'_>,
    policy: EmptyMatchPolicy,
) -> PathResult<Vec<Resource>> {
    let mut current = vec![source.clone()];

    for element in &path.elements {
        let ids = match element.kind {
            PathElementKind::Active => active_target_ids(element, &current)?,
            PathElementKind::Passive => passive_target_ids(element, &current, index)?,
        };

        if ids.is_empty() {
            return match policy {
                EmptyMatchPolicy::ReturnEmpty => Ok(Vec::new()),
                EmptyMatchPolicy::Error => Err(PathError::NoMatches {
                    element: element.to_string(),
                }),
            };
        }

        let mut next = Vec::with_capacity(ids.len());
        for id in ids {
            let resource = index
                .resolve(&element.target, &id)?
                .ok_or_else(|| PathError::Resolution {
                    class: element.target.clone(),
                    id: id.clone(),
                })?;
            next.push(resource.clone());
        }
        current = next;
    }

    Ok(current)
}

/// Read target ids from the element's slot on each current resource.
fn active_target_ids(element: &PathElement, current: &[Resource]) -> PathResult<BTreeSet<String>> {
    let mut ids = BTreeSet::new();
    for resource in current {
        match resource.content.get(&element.slot) {
            Some(Value::String(id)) => {
                ids.insert(id.clone());
            }
            Some(Value::Array(items)) => {
                for item in items {
                    let id = item.as_str().ok_or_else(|| foreign_id_error(
                        element,
                        resource,
                        "list entry is not a string id",
                    ))?;
                    ids.insert(id.to_string());
                }
            }
            Some(_) => {
                return Err(foreign_id_error(
                    element,
                    resource,
                    "slot value is neither an id nor a list of ids",
                ))
            }
            None => {
                return Err(foreign_id_error(element, resource, "slot is missing"));
            }
        }
    }
    Ok(ids)
}

/// Scan the element's target class for instances whose slot names a current
/// resource. The relationship read backwards: the target holds the ids.
fn passive_target_ids(
    element: &PathElement,
    current: &[Resource],
    index: &mut ResourceIndex<'_>,
) -> PathResult<BTreeSet<String>> {
    let source_ids: BTreeSet<&str> = current.iter().map(|r| r.id.as_str()).collect();

    let mut ids = BTreeSet::new();
    for candidate in index.class_index(&element.target)?.values() {
        let refers_back = match candidate.content.get(&element.slot) {
            Some(Value::String(id)) => source_ids.contains(id.as_str()),
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .any(|id| source_ids.contains(id)),
            _ => false,
        };
        if refers_back {
            ids.insert(candidate.id.as_str().to_string());
        }
    }
    Ok(ids)
}

fn foreign_id_error(element: &PathElement, resource: &Resource, reason: &str) -> PathError {
    PathError::ForeignIdLookup {
        class: resource.class_name.clone(),
        slot: element.slot.clone(),
        id: resource.id.as_str().to_string(),
        reason: reason.to_string(),
    }
}
