//! Shared fixtures: a small genomic-archive schema, a two-step workflow,
//! and a submission document exercising references and nested files.

use metaloom::{PipelineExecutor, Schema, TransformationRegistry, WorkflowConfig};
use serde_json::{json, Value};
use std::collections::BTreeMap;

pub const SCHEMA_YAML: &str = r#"
name: archive
root_class: Submission
classes:
  Submission:
    slots:
      samples: {range: Sample, multivalued: true, inlined: true, required: true}
      experiments: {range: Experiment, multivalued: true, inlined: true, required: true}
      runs: {range: SequencingRun, multivalued: true, inlined: true, required: true}
  Sample:
    identifier: alias
    slots:
      alias: {range: string, required: true}
      tissue: {range: string}
      donor_name: {range: string}
  Experiment:
    identifier: alias
    slots:
      alias: {range: string, required: true}
      sample: {range: Sample}
  SequencingRun:
    identifier: alias
    slots:
      alias: {range: string, required: true}
      experiment: {range: Experiment}
      files: {range: RunFile, multivalued: true, inlined: true}
  RunFile:
    identifier: file_name
    slots:
      file_name: {range: string, required: true}
      file_format: {range: string, required: true}
anchors:
  - {target_class: Sample, identifier_slot: alias, root_slot: samples}
  - {target_class: Experiment, identifier_slot: alias, root_slot: experiments}
  - {target_class: SequencingRun, identifier_slot: alias, root_slot: runs}
"#;

/// Strips donor names, then links each sample to the runs derived from it.
pub const WORKFLOW_YAML: &str = r#"
steps:
  restrict:
    transformation:
      name: delete_slots
      config:
        slots_by_class:
          Sample: [donor_name]
  link:
    input: restrict
    transformation:
      name: infer_references
      config:
        references:
          - class: Sample
            slot: sample_runs
            path: "Sample<(sample)Experiment<(experiment)SequencingRun"
artifacts:
  public: link
"#;

pub const RECONCILE_YAML: &str = r#"
artifacts:
  public:
    primary_dataset_classes: [SequencingRun]
    overview:
      file_slots: [files]
      name_slot: file_name
      format_slot: file_format
"#;

pub fn submission_document() -> Value {
    json!({
        "samples": [
            {"alias": "s1", "tissue": "liver", "donor_name": "Doe"},
            {"alias": "s2", "tissue": "blood"}
        ],
        "experiments": [
            {"alias": "e1", "sample": "s1"}
        ],
        "runs": [
            {
                "alias": "r1",
                "experiment": "e1",
                "files": [
                    {"file_name": "reads.fastq.gz", "file_format": "fastq"}
                ]
            }
        ]
    })
}

/// Run the fixture workflow over `document` and return the produced artifacts.
pub fn run_workflow(document: Value) -> BTreeMap<String, metaloom::Artifact> {
    let schema = Schema::from_yaml(SCHEMA_YAML).expect("fixture schema parses");
    let workflow = WorkflowConfig::from_yaml(WORKFLOW_YAML)
        .expect("fixture workflow parses")
        .build(&TransformationRegistry::with_builtins())
        .expect("fixture workflow builds");

    PipelineExecutor::new()
        .run(&workflow, schema, document, None)
        .expect("fixture workflow runs")
}
