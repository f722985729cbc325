//! Aggregation execution: operations per instance, assembled output document

use super::ops::{AggregationOperation, AggregationSpec};
use super::walk::terminal_nodes;
use super::{AggregateError, AggregateResult};
use crate::model::{AnchorSet, Resource, ResourceIndex};
use crate::schema::Schema;
use serde_json::{Map, Value};

/// Root slot under which output instances are collected: the snake-cased
/// output anchor class name, pluralized (`DatasetStats` -> `dataset_stats`,
/// `Dataset` -> `datasets`).
pub(crate) fn output_root_slot(output_anchor_class: &str) -> String {
    let mut slot = String::new();
    for (i, c) in output_anchor_class.chars().enumerate() {
        if c.is_ascii_uppercase() {
            if i > 0 {
                slot.push('_');
            }
            slot.push(c.to_ascii_lowercase());
        } else {
            slot.push(c);
        }
    }
    if !slot.ends_with('s') {
        slot.push('s');
    }
    slot
}

/// Execute an aggregation spec over one document, producing the output
/// document: one output instance per input-anchor instance, identifier
/// copied through, each operation's result written at its output path.
pub fn execute(
    spec: &AggregationSpec,
    schema: &Schema,
    document: &Value,
    anchors: &AnchorSet,
) -> AggregateResult<Value> {
    let input_anchor = anchors.get(&spec.input_anchor_class)?;
    let instances = input_anchor.extract_resources(document)?;
    let mut index = ResourceIndex::new(document, anchors);

    let mut outputs = Vec::with_capacity(instances.len());
    for instance in &instances {
        let mut output = Map::new();
        output.insert(
            input_anchor.identifier_slot.clone(),
            Value::String(instance.id.as_str().to_string()),
        );
        for operation in &spec.operations {
            run_operation(spec, schema, &mut index, instance, operation, &mut output)
                .map_err(|e| e.in_operation(&operation.output_path, instance.id.as_str()))?;
        }
        outputs.push(Value::Object(output));
    }

    let mut root = Map::new();
    root.insert(
        output_root_slot(&spec.output_anchor_class),
        Value::Array(outputs),
    );
    Ok(Value::Object(root))
}

fn run_operation(
    spec: &AggregationSpec,
    schema: &Schema,
    index: &mut ResourceIndex<'_>,
    instance: &Resource,
    operation: &AggregationOperation,
    output: &mut Map<String, Value>,
) -> AggregateResult<()> {
    let mut values = Vec::new();
    for path in &operation.input_paths {
        values.extend(terminal_nodes(
            schema,
            index,
            &spec.input_anchor_class,
            &instance.content,
            path.segments(),
            &operation.visit_once_classes,
        )?);
    }
    let result = operation.function.apply(values)?;
    write_at_path(output, &operation.output_path, result)
}

/// Write a value at a dot-path, creating intermediate containers on demand.
/// An intermediate segment landing on a non-object, or a final segment that
/// is already occupied, is a conflict.
fn write_at_path(
    output: &mut Map<String, Value>,
    path: &str,
    value: Value,
) -> AggregateResult<()> {
    let segments: Vec<&str> = path.split('.').collect();
    let mut current = output;
    for segment in &segments[..segments.len() - 1] {
        let entry = current
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        current = entry
            .as_object_mut()
            .ok_or_else(|| AggregateError::OutputPathConflict {
                path: path.to_string(),
            })?;
    }
    let last = segments[segments.len() - 1];
    if current.contains_key(last) {
        return Err(AggregateError::OutputPathConflict {
            path: path.to_string(),
        });
    }
    current.insert(last.to_string(), value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{AggregationFunction, SlotPath};
    use crate::model::AnchorPoint;
    use crate::schema::{ClassDef, SlotDef, SlotRange};
    use serde_json::json;

    fn schema() -> Schema {
        Schema::new("submission", "Submission")
            .with_class(
                "Submission",
                ClassDef::default()
                    .with_slot(
                        "datasets",
                        SlotDef::new(SlotRange::Class("Dataset".into()))
                            .multivalued()
                            .inlined()
                            .required(),
                    )
                    .with_slot(
                        "files",
                        SlotDef::new(SlotRange::Class("File".into()))
                            .multivalued()
                            .inlined()
                            .required(),
                    ),
            )
            .with_class(
                "Dataset",
                ClassDef::default()
                    .with_identifier("alias")
                    .with_slot("alias", SlotDef::new(SlotRange::String).required())
                    .with_slot(
                        "files",
                        SlotDef::new(SlotRange::Class("File".into())).multivalued(),
                    ),
            )
            .with_class(
                "File",
                ClassDef::default()
                    .with_identifier("name")
                    .with_slot("name", SlotDef::new(SlotRange::String).required())
                    .with_slot("format", SlotDef::new(SlotRange::String)),
            )
            .with_anchor(AnchorPoint::new("Dataset", "alias", "datasets"))
            .with_anchor(AnchorPoint::new("File", "name", "files"))
    }

    fn document() -> Value {
        json!({
            "datasets": [
                {"alias": "d1", "files": ["f1", "f2", "f3"]},
                {"alias": "d2", "files": ["f3"]},
            ],
            "files": [
                {"name": "f1", "format": "fastq"},
                {"name": "f2", "format": "fastq"},
                {"name": "f3", "format": "bam"},
            ],
        })
    }

    fn spec() -> AggregationSpec {
        AggregationSpec {
            input_anchor_class: "Dataset".into(),
            output_anchor_class: "DatasetStats".into(),
            operations: vec![
                AggregationOperation {
                    input_paths: vec![SlotPath::new(["files"])],
                    output_path: "stats.file_count".into(),
                    function: AggregationFunction::Count,
                    visit_once_classes: vec!["File".into()],
                },
                AggregationOperation {
                    input_paths: vec![SlotPath::new(["files", "format"])],
                    output_path: "stats.format_counts".into(),
                    function: AggregationFunction::StringElementCount,
                    visit_once_classes: vec!["File".into()],
                },
            ],
        }
    }

    #[test]
    fn test_execute_assembles_output_instances() {
        let schema = schema();
        let anchors = schema.anchor_set().unwrap();
        let output = execute(&spec(), &schema, &document(), &anchors).unwrap();

        let instances = output["dataset_stats"].as_array().unwrap();
        assert_eq!(instances.len(), 2);

        let d1 = &instances[0];
        assert_eq!(d1["alias"], json!("d1"));
        assert_eq!(d1["stats"]["file_count"], json!(3));
        assert_eq!(
            d1["stats"]["format_counts"],
            json!([
                {"value": "bam", "count": 1},
                {"value": "fastq", "count": 2},
            ])
        );

        let d2 = &instances[1];
        assert_eq!(d2["stats"]["file_count"], json!(1));
    }

    #[test]
    fn test_conflicting_output_paths_rejected() {
        let mut conflicting = spec();
        conflicting.operations[1].output_path = "stats".into();
        let schema = schema();
        let anchors = schema.anchor_set().unwrap();
        let err = execute(&conflicting, &schema, &document(), &anchors).unwrap_err();
        match err {
            AggregateError::Operation { source, .. } => {
                assert!(matches!(*source, AggregateError::OutputPathConflict { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_failure_names_operation_and_instance() {
        let mut bad = spec();
        bad.operations[0].input_paths = vec![SlotPath::new(["missing"])];
        let schema = schema();
        let anchors = schema.anchor_set().unwrap();
        let err = execute(&bad, &schema, &document(), &anchors).unwrap_err();
        match err {
            AggregateError::Operation {
                output_path,
                instance,
                ..
            } => {
                assert_eq!(output_path, "stats.file_count");
                assert_eq!(instance, "d1");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
