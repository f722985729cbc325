//! Add reference slots computed by resolving a path per instance

use crate::model::{AnchorSet, ResourceIndex};
use crate::pipeline::traits::{AssumptionError, DataTransformer, TransformError, Transformation};
use crate::refpath::{resolve, EmptyMatchPolicy, ReferencePath};
use crate::schema::{Schema, SlotDef, SlotRange};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

/// One inferred reference: a new multivalued id slot on `class`, filled by
/// resolving `path` from each instance.
#[derive(Debug, Clone, Deserialize)]
pub struct InferredReference {
    pub class: String,
    pub slot: String,
    pub path: ReferencePath,
    #[serde(default)]
    pub empty_match: EmptyMatchPolicy,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InferReferencesConfig {
    pub references: Vec<InferredReference>,
}

/// Adds slots holding the ids of instances reachable along a reference path.
pub struct InferReferences {
    config: InferReferencesConfig,
}

impl InferReferences {
    pub fn new(config: InferReferencesConfig) -> Self {
        Self { config }
    }
}

impl Transformation for InferReferences {
    fn name(&self) -> &str {
        "infer_references"
    }

    fn check_assumptions(&self, schema: &Schema) -> Result<(), AssumptionError> {
        let anchors = schema
            .anchor_set()
            .map_err(|e| AssumptionError::new(e.to_string()))?;
        for reference in &self.config.references {
            if reference.path.source != reference.class {
                return Err(AssumptionError::new(format!(
                    "path '{}' does not start at class '{}'",
                    reference.path, reference.class
                )));
            }
            let class = schema
                .require_class(&reference.class)
                .map_err(|e| AssumptionError::new(e.to_string()))?;
            if class.slots.contains_key(&reference.slot) {
                return Err(AssumptionError::new(format!(
                    "class '{}' already has a slot '{}'",
                    reference.class, reference.slot
                )));
            }
            for anchored in [&reference.class, &reference.path.target] {
                if !anchors.contains(anchored) {
                    return Err(AssumptionError::new(format!(
                        "class '{}' has no anchor point",
                        anchored
                    )));
                }
            }
        }
        Ok(())
    }

    fn transform_schema(&self, schema: &Schema) -> Result<Schema, TransformError> {
        let mut output = schema.clone();
        for reference in &self.config.references {
            let class = output
                .classes
                .get_mut(&reference.class)
                .expect("checked by assumptions");
            class.slots.insert(
                reference.slot.clone(),
                SlotDef::new(SlotRange::Class(reference.path.target.clone())).multivalued(),
            );
        }
        Ok(output)
    }

    fn make_data_transformer(
        &self,
        input_schema: Arc<Schema>,
        _output_schema: Arc<Schema>,
    ) -> Result<Box<dyn DataTransformer>, TransformError> {
        let anchors = input_schema.anchor_set()?;
        Ok(Box::new(InferReferencesTransformer {
            config: self.config.clone(),
            anchors,
        }))
    }
}

struct InferReferencesTransformer {
    config: InferReferencesConfig,
    anchors: AnchorSet,
}

impl DataTransformer for InferReferencesTransformer {
    fn transform(
        &self,
        document: &Value,
        _annotation: Option<&Value>,
    ) -> Result<Value, TransformError> {
        let mut output = document.clone();
        // One index per document; resolving each instance reuses it
        let mut index = ResourceIndex::new(document, &self.anchors);
        for reference in &self.config.references {
            // Resolve against the untouched input; write into the copy
            let anchor = self.anchors.get(&reference.class)?;
            let instances = anchor.extract_resources(document)?;

            let mut inferred = Vec::with_capacity(instances.len());
            for instance in &instances {
                let targets = resolve(
                    &reference.path,
                    instance,
                    &mut index,
                    reference.empty_match,
                )?;
                let ids: Vec<Value> = targets
                    .iter()
                    .map(|r| Value::String(r.id.as_str().to_string()))
                    .collect();
                inferred.push(Value::Array(ids));
            }

            let collection = output
                .get_mut(&anchor.root_slot)
                .and_then(Value::as_array_mut)
                .ok_or_else(|| {
                    TransformError::Other(format!(
                        "root slot '{}' is missing from the document",
                        anchor.root_slot
                    ))
                })?;
            for (item, ids) in collection.iter_mut().zip(inferred) {
                if let Some(obj) = item.as_object_mut() {
                    obj.insert(reference.slot.clone(), ids);
                }
            }
        }
        Ok(output)
    }
}
