//! Lazy per-class resource index over one document

use super::{AnchorSet, ModelResult, Resource};
use serde_json::Value;
use std::collections::HashMap;

/// Index of `class -> {id -> resource}` built lazily from one document.
///
/// Each class is decomposed at most once, on first request. The index is
/// scoped to a single document; a new document needs a new index.
#[derive(Debug)]
pub struct ResourceIndex<'a> {
    document: &'a Value,
    anchors: &'a AnchorSet,
    classes: HashMap<String, HashMap<String, Resource>>,
}

impl<'a> ResourceIndex<'a> {
    pub fn new(document: &'a Value, anchors: &'a AnchorSet) -> Self {
        Self {
            document,
            anchors,
            classes: HashMap::new(),
        }
    }

    /// Get the id-keyed resources of one class, building its index on first use.
    pub fn class_index(&mut self, class_name: &str) -> ModelResult<&HashMap<String, Resource>> {
        if !self.classes.contains_key(class_name) {
            let anchor = self.anchors.get(class_name)?;
            let resources = anchor.extract_resources(self.document)?;
            let indexed = resources
                .into_iter()
                .map(|r| (r.id.as_str().to_string(), r))
                .collect();
            self.classes.insert(class_name.to_string(), indexed);
        }
        // Populated just above
        Ok(&self.classes[class_name])
    }

    /// Resolve one id to a resource of the given class, if present.
    pub fn resolve(&mut self, class_name: &str, id: &str) -> ModelResult<Option<&Resource>> {
        Ok(self.class_index(class_name)?.get(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AnchorPoint;
    use serde_json::json;

    #[test]
    fn test_lazy_class_index() {
        let doc = json!({
            "samples": [{"alias": "s1"}, {"alias": "s2"}],
            "files": [{"name": "f1"}],
        });
        let anchors = AnchorSet::new([
            AnchorPoint::new("Sample", "alias", "samples"),
            AnchorPoint::new("File", "name", "files"),
        ]);
        let mut index = ResourceIndex::new(&doc, &anchors);

        assert_eq!(index.class_index("Sample").unwrap().len(), 2);
        assert!(index.resolve("Sample", "s2").unwrap().is_some());
        assert!(index.resolve("Sample", "missing").unwrap().is_none());
        assert!(index.resolve("File", "f1").unwrap().is_some());
    }

    #[test]
    fn test_unanchored_class_is_an_error() {
        let doc = json!({});
        let anchors = AnchorSet::new([]);
        let mut index = ResourceIndex::new(&doc, &anchors);
        assert!(index.class_index("Sample").is_err());
    }
}
