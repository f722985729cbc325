//! Aggregation operation and specification types

use super::functions::AggregationFunction;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A chain of slot names walked from an anchor-class instance.
///
/// Configuration form is a dot-separated string, e.g. `"samples.files.format"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct SlotPath(Vec<String>);

impl SlotPath {
    pub fn new(segments: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self(segments.into_iter().map(Into::into).collect())
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// All proper prefixes, shortest first (used for index construction).
    pub fn prefixes(&self) -> impl Iterator<Item = &[String]> {
        (1..=self.0.len()).map(move |end| &self.0[..end])
    }
}

impl From<String> for SlotPath {
    fn from(s: String) -> Self {
        Self(s.split('.').filter(|p| !p.is_empty()).map(String::from).collect())
    }
}

impl From<SlotPath> for String {
    fn from(path: SlotPath) -> Self {
        path.0.join(".")
    }
}

impl fmt::Display for SlotPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

/// One aggregation: values gathered along input paths, reduced by a
/// function, written at a dot-path in the output instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationOperation {
    pub input_paths: Vec<SlotPath>,
    /// Dot-separated location in the output instance
    pub output_path: String,
    pub function: AggregationFunction,
    /// Classes whose instances are visited at most once per traversal
    #[serde(default)]
    pub visit_once_classes: Vec<String>,
}

/// A named set of operations mapping one anchor class onto another
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationSpec {
    pub input_anchor_class: String,
    pub output_anchor_class: String,
    pub operations: Vec<AggregationOperation>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_path_from_string() {
        let path = SlotPath::from("samples.files.format".to_string());
        assert_eq!(path.segments(), ["samples", "files", "format"]);
        assert_eq!(path.to_string(), "samples.files.format");
    }

    #[test]
    fn test_slot_path_prefixes() {
        let path = SlotPath::from("a.b.c".to_string());
        let prefixes: Vec<_> = path.prefixes().collect();
        assert_eq!(prefixes.len(), 3);
        assert_eq!(prefixes[0], ["a"]);
        assert_eq!(prefixes[2], ["a", "b", "c"]);
    }

    #[test]
    fn test_spec_yaml_round_trip() {
        let text = r#"
input_anchor_class: Dataset
output_anchor_class: DatasetStats
operations:
  - input_paths: ["samples"]
    output_path: sample_count
    function: count
  - input_paths: ["samples.files.format"]
    output_path: files.format_counts
    function: string_element_count
    visit_once_classes: [File]
"#;
        let spec: AggregationSpec = serde_yaml::from_str(text).unwrap();
        assert_eq!(spec.operations.len(), 2);
        assert_eq!(spec.operations[1].input_paths[0].len(), 3);
        assert_eq!(spec.operations[1].visit_once_classes, ["File"]);
    }
}
