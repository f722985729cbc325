//! Class, slot, and schema definitions

use super::{SchemaError, SchemaResult};
use crate::model::{AnchorPoint, AnchorSet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The value space of a slot: a primitive type or another schema class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SlotRange {
    String,
    Integer,
    Float,
    Boolean,
    Class(String),
}

impl SlotRange {
    /// The class name if this range refers to a schema class.
    pub fn class_name(&self) -> Option<&str> {
        match self {
            SlotRange::Class(name) => Some(name),
            _ => None,
        }
    }
}

impl From<String> for SlotRange {
    fn from(s: String) -> Self {
        match s.as_str() {
            "string" => SlotRange::String,
            "integer" => SlotRange::Integer,
            "float" => SlotRange::Float,
            "boolean" => SlotRange::Boolean,
            _ => SlotRange::Class(s),
        }
    }
}

impl From<SlotRange> for String {
    fn from(range: SlotRange) -> Self {
        match range {
            SlotRange::String => "string".to_string(),
            SlotRange::Integer => "integer".to_string(),
            SlotRange::Float => "float".to_string(),
            SlotRange::Boolean => "boolean".to_string(),
            SlotRange::Class(name) => name,
        }
    }
}

/// Definition of one slot on a class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotDef {
    pub range: SlotRange,
    /// Values are lists
    #[serde(default)]
    pub multivalued: bool,
    /// Class-ranged values are stored inline rather than as id references
    #[serde(default)]
    pub inlined: bool,
    #[serde(default)]
    pub required: bool,
}

impl SlotDef {
    pub fn new(range: SlotRange) -> Self {
        Self {
            range,
            multivalued: false,
            inlined: false,
            required: false,
        }
    }

    pub fn multivalued(mut self) -> Self {
        self.multivalued = true;
        self
    }

    pub fn inlined(mut self) -> Self {
        self.inlined = true;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// Definition of one schema class
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ClassDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Slot acting as the class identifier, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    #[serde(default)]
    pub slots: BTreeMap<String, SlotDef>,
}

impl ClassDef {
    pub fn with_slot(mut self, name: impl Into<String>, def: SlotDef) -> Self {
        self.slots.insert(name.into(), def);
        self
    }

    pub fn with_identifier(mut self, name: impl Into<String>) -> Self {
        self.identifier = Some(name.into());
        self
    }
}

/// Read access to a schema: the seam consumed by traversal and validation.
pub trait SchemaCapability {
    /// Look up a class definition by name.
    fn class(&self, name: &str) -> Option<&ClassDef>;

    /// All declared anchor points.
    fn anchor_points(&self) -> &[AnchorPoint];

    /// Look up a slot as induced on a class.
    fn induced_slot(&self, class: &str, slot: &str) -> Option<&SlotDef> {
        self.class(class).and_then(|c| c.slots.get(slot))
    }
}

/// A complete schema: named classes plus anchor declarations.
///
/// Uses ordered maps so serialization (and the fingerprint derived from it)
/// is deterministic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    pub name: String,
    /// Class describing the document root (holds the anchor root slots)
    pub root_class: String,
    pub classes: BTreeMap<String, ClassDef>,
    #[serde(default)]
    pub anchors: Vec<AnchorPoint>,
}

impl Schema {
    pub fn new(name: impl Into<String>, root_class: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            root_class: root_class.into(),
            classes: BTreeMap::new(),
            anchors: Vec::new(),
        }
    }

    pub fn with_class(mut self, name: impl Into<String>, def: ClassDef) -> Self {
        self.classes.insert(name.into(), def);
        self
    }

    pub fn with_anchor(mut self, anchor: AnchorPoint) -> Self {
        self.anchors.push(anchor);
        self
    }

    /// Parse a schema from its YAML form.
    pub fn from_yaml(text: &str) -> SchemaResult<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Look up a class, failing with a schema error for unknown names.
    pub fn require_class(&self, name: &str) -> SchemaResult<&ClassDef> {
        self.classes
            .get(name)
            .ok_or_else(|| SchemaError::UnknownClass(name.to_string()))
    }

    /// Look up a slot on a class, failing for unknown class or slot.
    pub fn require_slot(&self, class: &str, slot: &str) -> SchemaResult<&SlotDef> {
        self.require_class(class)?
            .slots
            .get(slot)
            .ok_or_else(|| SchemaError::UnknownSlot {
                class: class.to_string(),
                slot: slot.to_string(),
            })
    }

    /// Validate anchor declarations and return them as a lookup set.
    ///
    /// Each anchor's root slot must exist on the root class, be required,
    /// multivalued, and inlined as a list of the target class; the identifier
    /// slot must exist on the target class.
    pub fn anchor_set(&self) -> SchemaResult<AnchorSet> {
        for anchor in &self.anchors {
            let root_slot = self
                .require_slot(&self.root_class, &anchor.root_slot)
                .map_err(|_| SchemaError::InvalidAnchor {
                    class: anchor.target_class.clone(),
                    reason: format!(
                        "root slot '{}' is not declared on root class '{}'",
                        anchor.root_slot, self.root_class
                    ),
                })?;
            if !(root_slot.required && root_slot.multivalued && root_slot.inlined) {
                return Err(SchemaError::InvalidAnchor {
                    class: anchor.target_class.clone(),
                    reason: format!(
                        "root slot '{}' must be required, multivalued, and inlined",
                        anchor.root_slot
                    ),
                });
            }
            if root_slot.range.class_name() != Some(anchor.target_class.as_str()) {
                return Err(SchemaError::InvalidAnchor {
                    class: anchor.target_class.clone(),
                    reason: format!(
                        "root slot '{}' does not range over '{}'",
                        anchor.root_slot, anchor.target_class
                    ),
                });
            }
            self.require_slot(&anchor.target_class, &anchor.identifier_slot)
                .map_err(|_| SchemaError::InvalidAnchor {
                    class: anchor.target_class.clone(),
                    reason: format!("identifier slot '{}' is not declared", anchor.identifier_slot),
                })?;
        }
        Ok(AnchorSet::new(self.anchors.iter().cloned()))
    }

    /// Stable fingerprint of the schema content.
    ///
    /// Keyed on the serialized form; ordered maps make it deterministic for
    /// equal schemas within one process.
    pub fn fingerprint(&self) -> u64 {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let serialized = serde_json::to_string(self).unwrap_or_default();
        let mut hasher = DefaultHasher::new();
        serialized.hash(&mut hasher);
        hasher.finish()
    }
}

impl SchemaCapability for Schema {
    fn class(&self, name: &str) -> Option<&ClassDef> {
        self.classes.get(name)
    }

    fn anchor_points(&self) -> &[AnchorPoint] {
        &self.anchors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_schema() -> Schema {
        Schema::new("submission", "Submission")
            .with_class(
                "Submission",
                ClassDef::default().with_slot(
                    "samples",
                    SlotDef::new(SlotRange::Class("Sample".into()))
                        .multivalued()
                        .inlined()
                        .required(),
                ),
            )
            .with_class(
                "Sample",
                ClassDef::default()
                    .with_identifier("alias")
                    .with_slot("alias", SlotDef::new(SlotRange::String).required())
                    .with_slot("tissue", SlotDef::new(SlotRange::String)),
            )
            .with_anchor(AnchorPoint::new("Sample", "alias", "samples"))
    }

    #[test]
    fn test_slot_range_round_trip() {
        assert_eq!(SlotRange::from("string".to_string()), SlotRange::String);
        assert_eq!(
            SlotRange::from("Sample".to_string()),
            SlotRange::Class("Sample".into())
        );
        assert_eq!(String::from(SlotRange::Integer), "integer");
    }

    #[test]
    fn test_anchor_set_valid() {
        let schema = sample_schema();
        let anchors = schema.anchor_set().unwrap();
        assert!(anchors.contains("Sample"));
    }

    #[test]
    fn test_anchor_set_rejects_singlevalued_root_slot() {
        let mut schema = sample_schema();
        schema
            .classes
            .get_mut("Submission")
            .unwrap()
            .slots
            .get_mut("samples")
            .unwrap()
            .multivalued = false;
        assert!(matches!(
            schema.anchor_set().unwrap_err(),
            SchemaError::InvalidAnchor { .. }
        ));
    }

    #[test]
    fn test_fingerprint_stable_and_content_sensitive() {
        let a = sample_schema();
        let b = sample_schema();
        assert_eq!(a.fingerprint(), b.fingerprint());

        let mut c = sample_schema();
        c.classes
            .get_mut("Sample")
            .unwrap()
            .slots
            .insert("extra".into(), SlotDef::new(SlotRange::Integer));
        assert_ne!(a.fingerprint(), c.fingerprint());
    }

    #[test]
    fn test_yaml_parse() {
        let text = r#"
name: submission
root_class: Submission
classes:
  Submission:
    slots:
      samples:
        range: Sample
        multivalued: true
        inlined: true
        required: true
  Sample:
    identifier: alias
    slots:
      alias:
        range: string
        required: true
anchors:
  - target_class: Sample
    identifier_slot: alias
    root_slot: samples
"#;
        let schema = Schema::from_yaml(text).unwrap();
        assert_eq!(schema.root_class, "Submission");
        schema.anchor_set().unwrap();
    }
}
