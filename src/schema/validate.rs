//! Structural validation of documents against a schema

use super::{Schema, SchemaError, SchemaResult, SlotDef, SlotRange};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// One structural mismatch between a document and the schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Dot-path location within the document
    pub path: String,
    pub message: String,
}

impl ValidationIssue {
    fn new(path: &str, message: impl Into<String>) -> Self {
        Self {
            path: path.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "at '{}': {}", self.path, self.message)
        }
    }
}

/// Validator for documents of one schema.
///
/// Holds the schema by `Arc` so compiled validators can be cached and shared
/// across pipeline steps (the executor caches them by schema fingerprint).
#[derive(Debug, Clone)]
pub struct DocumentValidator {
    schema: Arc<Schema>,
}

impl DocumentValidator {
    pub fn new(schema: Arc<Schema>) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Validate a whole document against the schema's root class.
    pub fn validate(&self, document: &Value) -> SchemaResult<()> {
        let mut issues = Vec::new();
        self.check_instance(&self.schema.root_class, document, "", &mut issues);
        if issues.is_empty() {
            Ok(())
        } else {
            Err(SchemaError::Validation {
                schema: self.schema.name.clone(),
                issues,
            })
        }
    }

    fn check_instance(&self, class: &str, value: &Value, path: &str, issues: &mut Vec<ValidationIssue>) {
        let Some(class_def) = self.schema.classes.get(class) else {
            issues.push(ValidationIssue::new(
                path,
                format!("range class '{}' is not declared in the schema", class),
            ));
            return;
        };
        let Some(object) = value.as_object() else {
            issues.push(ValidationIssue::new(
                path,
                format!("expected an instance of '{}', found a non-object", class),
            ));
            return;
        };

        for (slot_name, slot_def) in &class_def.slots {
            let slot_path = join_path(path, slot_name);
            match object.get(slot_name) {
                None | Some(Value::Null) => {
                    if slot_def.required {
                        issues.push(ValidationIssue::new(
                            &slot_path,
                            format!("required slot '{}' is missing", slot_name),
                        ));
                    }
                }
                Some(value) => self.check_slot_value(slot_def, value, &slot_path, issues),
            }
        }

        for key in object.keys() {
            if !class_def.slots.contains_key(key) {
                issues.push(ValidationIssue::new(
                    &join_path(path, key),
                    format!("slot '{}' is not declared on class '{}'", key, class),
                ));
            }
        }
    }

    fn check_slot_value(&self, slot: &SlotDef, value: &Value, path: &str, issues: &mut Vec<ValidationIssue>) {
        if slot.multivalued {
            let Some(items) = value.as_array() else {
                issues.push(ValidationIssue::new(path, "expected a list"));
                return;
            };
            for (i, item) in items.iter().enumerate() {
                self.check_single_value(slot, item, &format!("{}.{}", path, i), issues);
            }
        } else {
            self.check_single_value(slot, value, path, issues);
        }
    }

    fn check_single_value(&self, slot: &SlotDef, value: &Value, path: &str, issues: &mut Vec<ValidationIssue>) {
        match &slot.range {
            SlotRange::String => {
                if !value.is_string() {
                    issues.push(ValidationIssue::new(path, "expected a string"));
                }
            }
            SlotRange::Integer => {
                if !value.is_i64() && !value.is_u64() {
                    issues.push(ValidationIssue::new(path, "expected an integer"));
                }
            }
            SlotRange::Float => {
                if !value.is_number() {
                    issues.push(ValidationIssue::new(path, "expected a number"));
                }
            }
            SlotRange::Boolean => {
                if !value.is_boolean() {
                    issues.push(ValidationIssue::new(path, "expected a boolean"));
                }
            }
            SlotRange::Class(class) => {
                if slot.inlined {
                    self.check_instance(class, value, path, issues);
                } else if !value.is_string() {
                    // Reference slots hold identifiers of the target class
                    issues.push(ValidationIssue::new(
                        path,
                        format!("expected an id reference to '{}'", class),
                    ));
                }
            }
        }
    }
}

fn join_path(prefix: &str, segment: &str) -> String {
    if prefix.is_empty() {
        segment.to_string()
    } else {
        format!("{}.{}", prefix, segment)
    }
}
