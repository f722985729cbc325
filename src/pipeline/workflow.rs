//! Workflow assembly and validation
//!
//! A workflow is a DAG of named steps with exactly one root. All structural
//! validation happens here, at construction: a workflow that constructs
//! successfully can be ordered and run without configuration surprises
//! mid-flight.

use super::traits::Transformation;
use super::{PipelineError, PipelineResult};
use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

/// One named step: a transformation fed by another step's output (or the
/// initial input, for the root step).
#[derive(Clone)]
pub struct WorkflowStep {
    pub name: String,
    /// Name of the step whose output feeds this one; `None` marks the root
    pub input: Option<String>,
    pub transformation: Arc<dyn Transformation>,
}

impl WorkflowStep {
    pub fn new(
        name: impl Into<String>,
        input: Option<String>,
        transformation: Arc<dyn Transformation>,
    ) -> Self {
        Self {
            name: name.into(),
            input,
            transformation,
        }
    }
}

impl std::fmt::Debug for WorkflowStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowStep")
            .field("name", &self.name)
            .field("input", &self.input)
            .field("transformation", &self.transformation.name())
            .finish()
    }
}

/// A validated workflow: steps in executable order plus artifact bindings
#[derive(Debug, Clone)]
pub struct Workflow {
    steps: BTreeMap<String, WorkflowStep>,
    /// artifact name -> step name
    artifacts: BTreeMap<String, String>,
    /// Topological execution order
    order: Vec<String>,
}

impl Workflow {
    /// Validate and assemble a workflow.
    ///
    /// Fails if there is not exactly one root, an input references a missing
    /// step, an artifact references a missing step, or the induced graph has
    /// a cycle (checked by Kahn's algorithm, not by convention).
    pub fn new(
        steps: impl IntoIterator<Item = WorkflowStep>,
        artifacts: impl IntoIterator<Item = (String, String)>,
    ) -> PipelineResult<Self> {
        let steps: BTreeMap<String, WorkflowStep> = steps
            .into_iter()
            .map(|step| (step.name.clone(), step))
            .collect();
        let artifacts: BTreeMap<String, String> = artifacts.into_iter().collect();

        let roots: Vec<String> = steps
            .values()
            .filter(|s| s.input.is_none())
            .map(|s| s.name.clone())
            .collect();
        match roots.len() {
            0 => return Err(PipelineError::NoRoot),
            1 => {}
            _ => return Err(PipelineError::MultipleRoots(roots)),
        }

        for step in steps.values() {
            if let Some(input) = &step.input {
                if !steps.contains_key(input) {
                    return Err(PipelineError::UnknownInput {
                        step: step.name.clone(),
                        input: input.clone(),
                    });
                }
            }
        }

        for (artifact, step) in &artifacts {
            if !steps.contains_key(step) {
                return Err(PipelineError::UnknownArtifactStep {
                    artifact: artifact.clone(),
                    step: step.clone(),
                });
            }
        }

        let order = topological_order(&steps)?;
        Ok(Self {
            steps,
            artifacts,
            order,
        })
    }

    pub fn step(&self, name: &str) -> Option<&WorkflowStep> {
        self.steps.get(name)
    }

    /// Step names in execution order.
    pub fn step_order(&self) -> &[String] {
        &self.order
    }

    /// Artifact name -> producing step name.
    pub fn artifacts(&self) -> &BTreeMap<String, String> {
        &self.artifacts
    }
}

/// Kahn's algorithm over the input-dependency graph.
///
/// Ties are broken by step name so the order is deterministic.
fn topological_order(steps: &BTreeMap<String, WorkflowStep>) -> PipelineResult<Vec<String>> {
    let mut in_degree: BTreeMap<&str, usize> = steps.keys().map(|n| (n.as_str(), 0)).collect();
    let mut dependents: BTreeMap<&str, Vec<&str>> = BTreeMap::new();

    for step in steps.values() {
        if let Some(input) = &step.input {
            *in_degree.get_mut(step.name.as_str()).expect("known step") += 1;
            dependents
                .entry(input.as_str())
                .or_default()
                .push(step.name.as_str());
        }
    }

    let mut ready: VecDeque<&str> = in_degree
        .iter()
        .filter(|(_, d)| **d == 0)
        .map(|(n, _)| *n)
        .collect();
    let mut order = Vec::with_capacity(steps.len());

    while let Some(name) = ready.pop_front() {
        order.push(name.to_string());
        for dependent in dependents.get(name).into_iter().flatten() {
            let degree = in_degree.get_mut(dependent).expect("known step");
            *degree -= 1;
            if *degree == 0 {
                ready.push_back(dependent);
            }
        }
    }

    if order.len() < steps.len() {
        let stuck: Vec<String> = in_degree
            .iter()
            .filter(|(_, d)| **d > 0)
            .map(|(n, _)| n.to_string())
            .collect();
        return Err(PipelineError::Cycle(stuck));
    }
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::traits::{AssumptionError, DataTransformer, TransformError};
    use crate::schema::Schema;
    use serde_json::Value;

    struct Identity;

    struct IdentityTransformer;

    impl DataTransformer for IdentityTransformer {
        fn transform(
            &self,
            document: &Value,
            _annotation: Option<&Value>,
        ) -> Result<Value, TransformError> {
            Ok(document.clone())
        }
    }

    impl Transformation for Identity {
        fn name(&self) -> &str {
            "identity"
        }
        fn check_assumptions(&self, _schema: &Schema) -> Result<(), AssumptionError> {
            Ok(())
        }
        fn transform_schema(&self, schema: &Schema) -> Result<Schema, TransformError> {
            Ok(schema.clone())
        }
        fn make_data_transformer(
            &self,
            _input: Arc<Schema>,
            _output: Arc<Schema>,
        ) -> Result<Box<dyn DataTransformer>, TransformError> {
            Ok(Box::new(IdentityTransformer))
        }
    }

    fn step(name: &str, input: Option<&str>) -> WorkflowStep {
        WorkflowStep::new(name, input.map(String::from), Arc::new(Identity))
    }

    #[test]
    fn test_linear_workflow_order() {
        let workflow = Workflow::new(
            [step("a", None), step("b", Some("a"))],
            [("one".to_string(), "a".to_string()), ("two".to_string(), "b".to_string())],
        )
        .unwrap();
        assert_eq!(workflow.step_order(), ["a", "b"]);
    }

    #[test]
    fn test_diamond_dependencies_ordered() {
        let workflow = Workflow::new(
            [
                step("root", None),
                step("left", Some("root")),
                step("right", Some("root")),
                step("join", Some("left")),
            ],
            [],
        )
        .unwrap();
        let order = workflow.step_order();
        assert_eq!(order[0], "root");
        assert!(order.iter().position(|s| s == "join").unwrap()
            > order.iter().position(|s| s == "left").unwrap());
    }

    #[test]
    fn test_no_root_rejected() {
        // a -> b -> a is also rootless
        let err = Workflow::new([step("a", Some("b")), step("b", Some("a"))], []).unwrap_err();
        assert!(matches!(err, PipelineError::NoRoot));
    }

    #[test]
    fn test_two_roots_rejected() {
        let err = Workflow::new([step("a", None), step("b", None)], []).unwrap_err();
        assert!(matches!(err, PipelineError::MultipleRoots(_)));
    }

    #[test]
    fn test_unknown_input_rejected() {
        let err = Workflow::new([step("a", None), step("b", Some("ghost"))], []).unwrap_err();
        assert!(matches!(err, PipelineError::UnknownInput { .. }));
    }

    #[test]
    fn test_cycle_rejected() {
        let err = Workflow::new(
            [
                step("root", None),
                step("a", Some("b")),
                step("b", Some("a")),
            ],
            [],
        )
        .unwrap_err();
        assert!(matches!(err, PipelineError::Cycle(_)));
    }

    #[test]
    fn test_unknown_artifact_step_rejected() {
        let err = Workflow::new(
            [step("a", None)],
            [("art".to_string(), "ghost".to_string())],
        )
        .unwrap_err();
        assert!(matches!(err, PipelineError::UnknownArtifactStep { .. }));
    }
}
