//! Anchor points: where class instances are rooted and identified

use super::{ModelError, ModelResult, Resource};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Declares that instances of `target_class` live in the document-root
/// collection `root_slot` and are identified within it by `identifier_slot`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorPoint {
    pub target_class: String,
    pub identifier_slot: String,
    pub root_slot: String,
}

impl AnchorPoint {
    pub fn new(
        target_class: impl Into<String>,
        identifier_slot: impl Into<String>,
        root_slot: impl Into<String>,
    ) -> Self {
        Self {
            target_class: target_class.into(),
            identifier_slot: identifier_slot.into(),
            root_slot: root_slot.into(),
        }
    }

    /// Read the identifier of one instance of this anchor's class.
    pub fn identifier_of(&self, instance: &Value) -> ModelResult<String> {
        match instance.get(&self.identifier_slot) {
            Some(Value::String(id)) => Ok(id.clone()),
            Some(_) => Err(ModelError::NonStringIdentifier {
                class: self.target_class.clone(),
                slot: self.identifier_slot.clone(),
            }),
            None => Err(ModelError::MissingIdentifier {
                class: self.target_class.clone(),
                slot: self.identifier_slot.clone(),
            }),
        }
    }

    /// Decompose a document into the resources of this anchor's class.
    pub fn extract_resources(&self, document: &Value) -> ModelResult<Vec<Resource>> {
        let collection = document
            .get(&self.root_slot)
            .ok_or_else(|| ModelError::MissingRootSlot {
                class: self.target_class.clone(),
                slot: self.root_slot.clone(),
            })?;
        let items = collection
            .as_array()
            .ok_or_else(|| ModelError::RootSlotNotList {
                class: self.target_class.clone(),
                slot: self.root_slot.clone(),
            })?;

        let mut resources = Vec::with_capacity(items.len());
        for item in items {
            let id = self.identifier_of(item)?;
            resources.push(Resource::new(id, self.target_class.clone(), item.clone()));
        }
        Ok(resources)
    }
}

/// The complete set of anchor points for one schema, keyed by target class.
///
/// Every externally exposed class has exactly one anchor point; lookups for
/// unanchored classes are configuration errors.
#[derive(Debug, Clone, Default)]
pub struct AnchorSet {
    by_class: HashMap<String, AnchorPoint>,
}

impl AnchorSet {
    pub fn new(anchors: impl IntoIterator<Item = AnchorPoint>) -> Self {
        Self {
            by_class: anchors
                .into_iter()
                .map(|a| (a.target_class.clone(), a))
                .collect(),
        }
    }

    pub fn get(&self, class_name: &str) -> ModelResult<&AnchorPoint> {
        self.by_class
            .get(class_name)
            .ok_or_else(|| ModelError::MissingAnchor(class_name.to_string()))
    }

    pub fn contains(&self, class_name: &str) -> bool {
        self.by_class.contains_key(class_name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AnchorPoint> {
        self.by_class.values()
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.by_class.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_anchor() -> AnchorPoint {
        AnchorPoint::new("Sample", "alias", "samples")
    }

    #[test]
    fn test_extract_resources() {
        let doc = json!({
            "samples": [
                {"alias": "s1", "tissue": "liver"},
                {"alias": "s2", "tissue": "blood"},
            ],
        });
        let resources = sample_anchor().extract_resources(&doc).unwrap();
        assert_eq!(resources.len(), 2);
        assert_eq!(resources[0].id.as_str(), "s1");
        assert_eq!(resources[0].class_name, "Sample");
        assert_eq!(resources[1].content["tissue"], json!("blood"));
    }

    #[test]
    fn test_extract_missing_root_slot() {
        let doc = json!({"other": []});
        let err = sample_anchor().extract_resources(&doc).unwrap_err();
        assert!(matches!(err, ModelError::MissingRootSlot { .. }));
    }

    #[test]
    fn test_extract_missing_identifier() {
        let doc = json!({"samples": [{"tissue": "liver"}]});
        let err = sample_anchor().extract_resources(&doc).unwrap_err();
        assert!(matches!(err, ModelError::MissingIdentifier { .. }));
    }

    #[test]
    fn test_anchor_set_lookup() {
        let set = AnchorSet::new([sample_anchor()]);
        assert!(set.get("Sample").is_ok());
        assert!(matches!(
            set.get("Unknown").unwrap_err(),
            ModelError::MissingAnchor(_)
        ));
    }
}
