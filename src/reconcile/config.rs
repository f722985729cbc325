//! Reconciliation configuration

use super::{ReconcileError, ReconcileResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

fn default_true() -> bool {
    true
}

/// How one dataset overview is derived from a primary-dataset resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverviewConfig {
    /// Dot-paths into the resource content leading to file entry objects
    pub file_slots: Vec<String>,
    /// Slot holding the file name inside each entry
    pub name_slot: String,
    /// Slot holding the declared format inside each entry
    pub format_slot: String,
}

/// Per-artifact-type reconciliation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactTypeConfig {
    /// Decomposed types are diffed per resource; undecomposed ones per
    /// whole artifact instance
    #[serde(default = "default_true")]
    pub decompose: bool,
    /// Classes whose resources carry dataset semantics; their diff entries
    /// additionally emit dataset events
    #[serde(default)]
    pub primary_dataset_classes: Vec<String>,
    /// Required when `primary_dataset_classes` is non-empty
    #[serde(default)]
    pub overview: Option<OverviewConfig>,
}

impl Default for ArtifactTypeConfig {
    fn default() -> Self {
        Self {
            decompose: true,
            primary_dataset_classes: Vec::new(),
            overview: None,
        }
    }
}

/// Top-level reconciliation configuration, usually loaded from YAML
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReconcileConfig {
    /// Settings per artifact type name; snapshots may only carry types
    /// declared here
    #[serde(default)]
    pub artifacts: BTreeMap<String, ArtifactTypeConfig>,
    /// Recompute and persist the statistics summary after each run
    #[serde(default)]
    pub compute_statistics: bool,
}

impl ReconcileConfig {
    pub fn from_yaml(yaml: &str) -> ReconcileResult<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Configuration errors are caught here, before any store traffic.
    pub fn validate(&self) -> ReconcileResult<()> {
        for (name, artifact) in &self.artifacts {
            if !artifact.primary_dataset_classes.is_empty() && artifact.overview.is_none() {
                return Err(ReconcileError::InvalidConfig {
                    reason: format!(
                        "artifact type '{}' declares primary dataset classes but no overview",
                        name
                    ),
                });
            }
            if !artifact.decompose && !artifact.primary_dataset_classes.is_empty() {
                return Err(ReconcileError::InvalidConfig {
                    reason: format!(
                        "artifact type '{}' is undecomposed and cannot have primary dataset classes",
                        name
                    ),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_yaml_config() {
        let yaml = r#"
artifacts:
  public:
    primary_dataset_classes: [SequencingRun]
    overview:
      file_slots: [files]
      name_slot: file_name
      format_slot: file_format
  submission:
    decompose: false
compute_statistics: true
"#;
        let config = ReconcileConfig::from_yaml(yaml).unwrap();
        assert!(config.compute_statistics);
        assert!(config.artifacts["public"].decompose);
        assert!(!config.artifacts["submission"].decompose);
        assert_eq!(
            config.artifacts["public"].primary_dataset_classes,
            vec!["SequencingRun"]
        );
    }

    #[test]
    fn test_primary_classes_require_overview() {
        let yaml = r#"
artifacts:
  public:
    primary_dataset_classes: [SequencingRun]
"#;
        let err = ReconcileConfig::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, ReconcileError::InvalidConfig { .. }));
    }

    #[test]
    fn test_undecomposed_rejects_primary_classes() {
        let yaml = r#"
artifacts:
  submission:
    decompose: false
    primary_dataset_classes: [SequencingRun]
    overview:
      file_slots: [files]
      name_slot: file_name
      format_slot: file_format
"#;
        assert!(ReconcileConfig::from_yaml(yaml).is_err());
    }
}
