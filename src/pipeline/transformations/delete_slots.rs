//! Remove configured slots from named classes, in schema and data

use crate::pipeline::traits::{AssumptionError, DataTransformer, TransformError, Transformation};
use crate::schema::{Schema, SlotRange};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Configuration: class name -> slots to delete on that class
#[derive(Debug, Clone, Deserialize)]
pub struct DeleteSlotsConfig {
    pub slots_by_class: BTreeMap<String, Vec<String>>,
}

/// Deletes slots from classes.
///
/// Used to project restricted views: the slot disappears from the schema and
/// from every instance of the class, wherever it appears in the document.
pub struct DeleteSlots {
    config: DeleteSlotsConfig,
}

impl DeleteSlots {
    pub fn new(config: DeleteSlotsConfig) -> Self {
        Self { config }
    }
}

impl Transformation for DeleteSlots {
    fn name(&self) -> &str {
        "delete_slots"
    }

    fn check_assumptions(&self, schema: &Schema) -> Result<(), AssumptionError> {
        for (class_name, slots) in &self.config.slots_by_class {
            let class = schema
                .require_class(class_name)
                .map_err(|e| AssumptionError::new(e.to_string()))?;
            for slot in slots {
                if !class.slots.contains_key(slot) {
                    return Err(AssumptionError::new(format!(
                        "class '{}' has no slot '{}' to delete",
                        class_name, slot
                    )));
                }
                if class.identifier.as_deref() == Some(slot.as_str()) {
                    return Err(AssumptionError::new(format!(
                        "slot '{}' is the identifier of class '{}' and cannot be deleted",
                        slot, class_name
                    )));
                }
                if schema
                    .anchors
                    .iter()
                    .any(|a| a.target_class == *class_name && a.identifier_slot == *slot)
                {
                    return Err(AssumptionError::new(format!(
                        "slot '{}' anchors class '{}' and cannot be deleted",
                        slot, class_name
                    )));
                }
            }
        }
        Ok(())
    }

    fn transform_schema(&self, schema: &Schema) -> Result<Schema, TransformError> {
        let mut output = schema.clone();
        for (class_name, slots) in &self.config.slots_by_class {
            let class = output
                .classes
                .get_mut(class_name)
                .expect("checked by assumptions");
            for slot in slots {
                class.slots.remove(slot);
            }
        }
        Ok(output)
    }

    fn make_data_transformer(
        &self,
        input_schema: Arc<Schema>,
        _output_schema: Arc<Schema>,
    ) -> Result<Box<dyn DataTransformer>, TransformError> {
        Ok(Box::new(DeleteSlotsTransformer {
            config: self.config.clone(),
            schema: input_schema,
        }))
    }
}

struct DeleteSlotsTransformer {
    config: DeleteSlotsConfig,
    schema: Arc<Schema>,
}

impl DataTransformer for DeleteSlotsTransformer {
    fn transform(
        &self,
        document: &Value,
        _annotation: Option<&Value>,
    ) -> Result<Value, TransformError> {
        let mut output = document.clone();
        self.strip_instance(&self.schema.root_class, &mut output);
        Ok(output)
    }
}

impl DeleteSlotsTransformer {
    /// Remove deleted slots from one instance and recurse into inlined
    /// class-ranged slots. Reference slots hold ids, so nothing below them
    /// needs rewriting.
    fn strip_instance(&self, class_name: &str, value: &mut Value) {
        let Some(class) = self.schema.classes.get(class_name) else {
            return;
        };
        let Some(object) = value.as_object_mut() else {
            return;
        };

        if let Some(deleted) = self.config.slots_by_class.get(class_name) {
            for slot in deleted {
                object.remove(slot);
            }
        }

        for (slot_name, slot) in &class.slots {
            let Some(SlotRange::Class(child_class)) = slot.inlined.then(|| &slot.range) else {
                continue;
            };
            let Some(child) = object.get_mut(slot_name) else {
                continue;
            };
            if slot.multivalued {
                if let Some(items) = child.as_array_mut() {
                    for item in items {
                        self.strip_instance(child_class, item);
                    }
                }
            } else {
                self.strip_instance(child_class, child);
            }
        }
    }
}
