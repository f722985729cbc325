//! Dataset overviews derived from primary-dataset resources

use super::config::OverviewConfig;
use super::{ReconcileError, ReconcileResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Compression suffixes recognized after the declared format, longest first
/// so that `.tar.gz` wins over `.gz`.
const COMPRESSION_SUFFIXES: &[&str] = &[
    ".tar.bz2", ".tar.zst", ".tar.gz", ".tar.lz", ".tar.xz", ".tbz2", ".tgz", ".tlz", ".txz",
    ".zip", ".gz",
];

/// One file referenced by a dataset, with its derived extension
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetFile {
    pub name: String,
    pub format: String,
    /// The declared format for plain files, or the compression suffix
    /// (leading dot included) for compressed ones
    pub extension: String,
}

/// Flattened summary of one primary-dataset resource, emitted alongside its
/// upsert notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetOverview {
    pub dataset_id: String,
    pub artifact: String,
    pub class_name: String,
    pub files: Vec<DatasetFile>,
}

/// Extension of `filename` given its declared `format`.
///
/// A filename ending in `.{format}` yields the format itself. A filename
/// ending in a recognized compression suffix preceded by `.{format}` yields
/// that suffix. Anything else is an error: a trailing suffix we do not
/// recognize must not pass through silently.
pub fn file_extension(filename: &str, format: &str) -> ReconcileResult<String> {
    let format_suffix = format!(".{}", format);
    if filename.ends_with(&format_suffix) {
        return Ok(format.to_string());
    }

    for suffix in COMPRESSION_SUFFIXES {
        if let Some(stem) = filename.strip_suffix(suffix) {
            if stem.ends_with(&format_suffix) {
                return Ok((*suffix).to_string());
            }
        }
    }

    Err(ReconcileError::UnrecognizedFileSuffix {
        filename: filename.to_string(),
        format: format.to_string(),
    })
}

/// Build the overview for one primary-dataset resource.
///
/// File entries are gathered from each configured file slot (a dot-path into
/// the resource content); missing slots contribute nothing, but an entry
/// without the configured name or format slot is an error.
pub fn build_overview(
    dataset_id: &str,
    artifact: &str,
    class_name: &str,
    content: &Value,
    config: &OverviewConfig,
) -> ReconcileResult<DatasetOverview> {
    let mut files = Vec::new();

    for slot_path in &config.file_slots {
        for entry in entries_at_path(content, slot_path) {
            let name = require_str(entry, &config.name_slot, slot_path)?;
            let format = require_str(entry, &config.format_slot, slot_path)?;
            let extension = file_extension(name, format)?;
            files.push(DatasetFile {
                name: name.to_string(),
                format: format.to_string(),
                extension,
            });
        }
    }

    Ok(DatasetOverview {
        dataset_id: dataset_id.to_string(),
        artifact: artifact.to_string(),
        class_name: class_name.to_string(),
        files,
    })
}

fn require_str<'a>(entry: &'a Value, slot: &str, path: &str) -> ReconcileResult<&'a str> {
    entry
        .get(slot)
        .and_then(Value::as_str)
        .ok_or_else(|| ReconcileError::OverviewSlotMissing {
            path: path.to_string(),
            slot: slot.to_string(),
        })
}

/// All objects reachable by following `path` (dot-separated slot names)
/// from `content`, descending into arrays at every step.
fn entries_at_path<'a>(content: &'a Value, path: &str) -> Vec<&'a Value> {
    let mut current = vec![content];
    for segment in path.split('.') {
        let mut next = Vec::new();
        for value in current {
            match value.get(segment) {
                Some(Value::Array(items)) => next.extend(items.iter()),
                Some(Value::Null) | None => {}
                Some(other) => next.push(other),
            }
        }
        current = next;
    }
    current
}
