//! Output-schema derivation from the aggregation operations used
//!
//! Operations sharing an output-path prefix are grouped into generated
//! intermediate classes, structurally deduplicated, rooted at the declared
//! output anchor class with the input anchor's identifier slot copied over.

use super::exec::output_root_slot;
use super::functions::FunctionResultShape;
use super::ops::{AggregationOperation, AggregationSpec};
use super::{AggregateError, AggregateResult};
use crate::model::{AnchorPoint, AnchorSet};
use crate::schema::{ClassDef, Schema, SlotDef, SlotRange};
use std::collections::BTreeMap;

/// Prefix tree over output paths
#[derive(Default)]
struct PathNode<'a> {
    children: BTreeMap<String, PathNode<'a>>,
    leaf: Option<&'a AggregationOperation>,
}

/// Derive the minimal schema describing the documents [`execute`] produces.
///
/// [`execute`]: super::execute
pub fn derive_output_schema(
    spec: &AggregationSpec,
    anchors: &AnchorSet,
) -> AggregateResult<Schema> {
    let input_anchor = anchors.get(&spec.input_anchor_class)?;

    let mut root_node = PathNode::default();
    for operation in &spec.operations {
        insert_path(&mut root_node, operation)?;
    }

    let mut generator = ClassGenerator::default();
    let mut output_slots =
        generator.slots_for_children(&root_node, &spec.output_anchor_class)?;
    output_slots.insert(
        input_anchor.identifier_slot.clone(),
        SlotDef::new(SlotRange::String).required(),
    );

    let output_class = ClassDef {
        description: None,
        identifier: Some(input_anchor.identifier_slot.clone()),
        slots: output_slots,
    };

    let root_slot = output_root_slot(&spec.output_anchor_class);
    let root_class_name = format!("{}Root", spec.output_anchor_class);
    let root_class = ClassDef::default().with_slot(
        &root_slot,
        SlotDef::new(SlotRange::Class(spec.output_anchor_class.clone()))
            .multivalued()
            .inlined()
            .required(),
    );

    let mut schema = Schema::new(root_slot.clone(), root_class_name.clone())
        .with_class(root_class_name, root_class)
        .with_class(spec.output_anchor_class.clone(), output_class)
        .with_anchor(AnchorPoint::new(
            spec.output_anchor_class.clone(),
            input_anchor.identifier_slot.clone(),
            root_slot,
        ));
    for (name, def) in generator.classes {
        schema.classes.insert(name, def);
    }
    Ok(schema)
}

fn insert_path<'a>(
    root: &mut PathNode<'a>,
    operation: &'a AggregationOperation,
) -> AggregateResult<()> {
    let mut node = root;
    for segment in operation.output_path.split('.') {
        if node.leaf.is_some() {
            return Err(AggregateError::OutputPathConflict {
                path: operation.output_path.clone(),
            });
        }
        node = node.children.entry(segment.to_string()).or_default();
    }
    if node.leaf.is_some() || !node.children.is_empty() {
        return Err(AggregateError::OutputPathConflict {
            path: operation.output_path.clone(),
        });
    }
    node.leaf = Some(operation);
    Ok(())
}

/// Generates intermediate classes, reusing one class per distinct slot shape.
#[derive(Default)]
struct ClassGenerator {
    classes: BTreeMap<String, ClassDef>,
    /// Structural key -> generated class name
    shapes: BTreeMap<String, String>,
}

impl ClassGenerator {
    /// Build the slot map for one node's children, generating classes for
    /// nested groups bottom-up.
    fn slots_for_children(
        &mut self,
        node: &PathNode<'_>,
        name_prefix: &str,
    ) -> AggregateResult<BTreeMap<String, SlotDef>> {
        let mut slots = BTreeMap::new();
        for (segment, child) in &node.children {
            let slot = match child.leaf {
                Some(operation) => self.leaf_slot(operation),
                None => {
                    let child_name = format!("{}{}", name_prefix, camel_case(segment));
                    let child_slots = self.slots_for_children(child, &child_name)?;
                    let class_name = self.intern_class(child_name, child_slots);
                    SlotDef::new(SlotRange::Class(class_name))
                        .inlined()
                        .required()
                }
            };
            slots.insert(segment.clone(), slot);
        }
        Ok(slots)
    }

    fn leaf_slot(&mut self, operation: &AggregationOperation) -> SlotDef {
        let shape = operation.function.result_shape();
        let multivalued = operation.function.result_multivalued();
        let mut slot = match shape {
            FunctionResultShape::Primitive(range) => SlotDef::new(range),
            FunctionResultShape::ValueCountPairs(value_range) => {
                let class_name = self.value_count_class(value_range);
                SlotDef::new(SlotRange::Class(class_name)).inlined()
            }
        };
        if multivalued {
            slot = slot.multivalued();
        }
        slot.required()
    }

    /// The generated `{value, count}` pair class for one value range.
    fn value_count_class(&mut self, value_range: SlotRange) -> String {
        let name = match value_range {
            SlotRange::Integer => "IntegerValueCount",
            _ => "StringValueCount",
        };
        let slots = BTreeMap::from([
            ("value".to_string(), SlotDef::new(value_range).required()),
            (
                "count".to_string(),
                SlotDef::new(SlotRange::Integer).required(),
            ),
        ]);
        self.intern_class(name.to_string(), slots)
    }

    /// Register a class, returning the name of an existing structurally
    /// identical one if the shape was seen before.
    fn intern_class(&mut self, name: String, slots: BTreeMap<String, SlotDef>) -> String {
        let key = shape_key(&slots);
        if let Some(existing) = self.shapes.get(&key) {
            return existing.clone();
        }
        self.shapes.insert(key, name.clone());
        self.classes.insert(
            name.clone(),
            ClassDef {
                description: None,
                identifier: None,
                slots,
            },
        );
        name
    }
}

fn shape_key(slots: &BTreeMap<String, SlotDef>) -> String {
    serde_json::to_string(slots).unwrap_or_default()
}

fn camel_case(segment: &str) -> String {
    segment
        .split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{AggregationFunction, SlotPath};

    fn operation(output_path: &str, function: AggregationFunction) -> AggregationOperation {
        AggregationOperation {
            input_paths: vec![SlotPath::new(["files"])],
            output_path: output_path.into(),
            function,
            visit_once_classes: vec![],
        }
    }

    fn spec(operations: Vec<AggregationOperation>) -> AggregationSpec {
        AggregationSpec {
            input_anchor_class: "Dataset".into(),
            output_anchor_class: "DatasetStats".into(),
            operations,
        }
    }

    fn anchors() -> AnchorSet {
        AnchorSet::new([AnchorPoint::new("Dataset", "alias", "datasets")])
    }

    #[test]
    fn test_derived_schema_shape() {
        let schema = derive_output_schema(
            &spec(vec![
                operation("stats.file_count", AggregationFunction::Count),
                operation("stats.format_counts", AggregationFunction::StringElementCount),
                operation("title", AggregationFunction::StringCopy),
            ]),
            &anchors(),
        )
        .unwrap();

        // Root class anchors the output class under the derived root slot
        assert_eq!(schema.root_class, "DatasetStatsRoot");
        let root_slot = &schema.classes["DatasetStatsRoot"].slots["dataset_stats"];
        assert!(root_slot.multivalued && root_slot.inlined && root_slot.required);

        // Output class carries the copied identifier and the top-level groups
        let output = &schema.classes["DatasetStats"];
        assert_eq!(output.identifier.as_deref(), Some("alias"));
        assert!(output.slots.contains_key("alias"));
        assert!(output.slots.contains_key("title"));
        let stats_slot = &output.slots["stats"];
        assert_eq!(
            stats_slot.range,
            SlotRange::Class("DatasetStatsStats".into())
        );

        // The generated group holds both leaves with function-derived shapes
        let stats = &schema.classes["DatasetStatsStats"];
        assert_eq!(stats.slots["file_count"].range, SlotRange::Integer);
        assert_eq!(
            stats.slots["format_counts"].range,
            SlotRange::Class("StringValueCount".into())
        );
        assert!(stats.slots["format_counts"].multivalued);
        assert!(schema.classes.contains_key("StringValueCount"));

        // Derived schema validates its own anchor declarations
        schema.anchor_set().unwrap();
    }

    #[test]
    fn test_structural_deduplication() {
        let schema = derive_output_schema(
            &spec(vec![
                operation("liver.count", AggregationFunction::Count),
                operation("blood.count", AggregationFunction::Count),
            ]),
            &anchors(),
        )
        .unwrap();

        // Both groups have the same shape, so one generated class serves both
        let output = &schema.classes["DatasetStats"];
        assert_eq!(output.slots["liver"].range, output.slots["blood"].range);
        let generated: Vec<_> = schema
            .classes
            .keys()
            .filter(|name| name.ends_with("Liver") || name.ends_with("Blood"))
            .collect();
        assert_eq!(generated.len(), 1);
    }

    #[test]
    fn test_nested_path_conflict_rejected() {
        let err = derive_output_schema(
            &spec(vec![
                operation("stats", AggregationFunction::Count),
                operation("stats.count", AggregationFunction::Count),
            ]),
            &anchors(),
        )
        .unwrap_err();
        assert!(matches!(err, AggregateError::OutputPathConflict { .. }));
    }

    #[test]
    fn test_camel_case() {
        assert_eq!(camel_case("format_counts"), "FormatCounts");
        assert_eq!(camel_case("stats"), "Stats");
    }
}
