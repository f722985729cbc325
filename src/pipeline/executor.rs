//! Workflow execution with validation at every step boundary

use super::traits::Transformation;
use super::workflow::Workflow;
use super::{PipelineError, PipelineResult};
use crate::schema::{DocumentValidator, Schema};
use dashmap::DashMap;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::debug;

/// A named (schema, document) pair produced by one workflow step
#[derive(Debug, Clone)]
pub struct Artifact {
    pub name: String,
    pub schema: Arc<Schema>,
    pub document: Value,
}

/// Runs workflows, caching compiled document validators across steps.
///
/// The validator cache is keyed by schema fingerprint and lives exactly as
/// long as this executor; repeated runs over the same schemas reuse the
/// compiled validators.
#[derive(Default)]
pub struct PipelineExecutor {
    validators: DashMap<u64, Arc<DocumentValidator>>,
}

impl PipelineExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    fn validator_for(&self, schema: &Arc<Schema>) -> Arc<DocumentValidator> {
        self.validators
            .entry(schema.fingerprint())
            .or_insert_with(|| Arc::new(DocumentValidator::new(Arc::clone(schema))))
            .clone()
    }

    #[cfg(test)]
    pub(crate) fn cached_validator_count(&self) -> usize {
        self.validators.len()
    }

    /// Run every step in topological order and map the declared artifacts to
    /// their producing steps' outputs.
    ///
    /// Per step: assumption check, schema transform, input validation
    /// (caller/data defect on failure), data transform, output validation
    /// (internal defect on failure), then the (schema, document) pair is
    /// cached under the step's name for downstream steps.
    pub fn run(
        &self,
        workflow: &Workflow,
        initial_schema: Schema,
        initial_document: Value,
        annotation: Option<&Value>,
    ) -> PipelineResult<BTreeMap<String, Artifact>> {
        let initial = (Arc::new(initial_schema), initial_document);
        let mut outputs: HashMap<String, (Arc<Schema>, Value)> = HashMap::new();

        for step_name in workflow.step_order() {
            let step = workflow.step(step_name).expect("ordered step exists");
            let (input_schema, input_document) = match &step.input {
                None => &initial,
                Some(input) => outputs.get(input).expect("topological order"),
            };
            debug!(step = %step_name, transformation = %step.transformation.name(), "running step");

            let output = self.run_step(
                step_name,
                step.transformation.as_ref(),
                input_schema,
                input_document,
                annotation,
            )?;
            outputs.insert(step_name.clone(), output);
        }

        let mut artifacts = BTreeMap::new();
        for (artifact_name, step_name) in workflow.artifacts() {
            let (schema, document) = outputs.get(step_name).expect("validated artifact step");
            artifacts.insert(
                artifact_name.clone(),
                Artifact {
                    name: artifact_name.clone(),
                    schema: Arc::clone(schema),
                    document: document.clone(),
                },
            );
        }
        Ok(artifacts)
    }

    fn run_step(
        &self,
        step_name: &str,
        transformation: &dyn Transformation,
        input_schema: &Arc<Schema>,
        input_document: &Value,
        annotation: Option<&Value>,
    ) -> PipelineResult<(Arc<Schema>, Value)> {
        transformation
            .check_assumptions(input_schema)
            .map_err(|source| PipelineError::Assumption {
                step: step_name.to_string(),
                source,
            })?;

        let output_schema = Arc::new(transformation.transform_schema(input_schema).map_err(
            |source| PipelineError::SchemaTransform {
                step: step_name.to_string(),
                source,
            },
        )?);

        let transformer = transformation
            .make_data_transformer(Arc::clone(input_schema), Arc::clone(&output_schema))
            .map_err(|source| PipelineError::SchemaTransform {
                step: step_name.to_string(),
                source,
            })?;

        self.validator_for(input_schema)
            .validate(input_document)
            .map_err(|source| PipelineError::PreTransformValidation {
                step: step_name.to_string(),
                source,
            })?;

        let output_document = transformer
            .transform(input_document, annotation)
            .map_err(|source| PipelineError::Transform {
                step: step_name.to_string(),
                source,
            })?;

        // A mismatch here means the assumption check let through a schema the
        // transformation cannot actually handle.
        self.validator_for(&output_schema)
            .validate(&output_document)
            .map_err(|source| PipelineError::PostTransformValidation {
                step: step_name.to_string(),
                source,
            })?;

        Ok((output_schema, output_document))
    }
}
