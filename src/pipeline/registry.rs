//! Transformation registry and workflow configuration
//!
//! Transformation kinds are resolved through an explicit, statically
//! constructed map from name to factory. No runtime namespace introspection:
//! everything runnable is registered up front.

use super::transformations::{AggregateTransformation, DeleteSlots, InferReferences};
use super::traits::Transformation;
use super::workflow::{Workflow, WorkflowStep};
use super::{PipelineError, PipelineResult};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Parses a transformation's config value into a ready-to-run transformation.
pub type TransformationFactory =
    Box<dyn Fn(&Value) -> PipelineResult<Arc<dyn Transformation>> + Send + Sync>;

/// Name -> factory map, built once at startup.
pub struct TransformationRegistry {
    factories: BTreeMap<String, TransformationFactory>,
}

impl TransformationRegistry {
    /// An empty registry; use [`TransformationRegistry::with_builtins`] for
    /// the standard set.
    pub fn new() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// Registry preloaded with the built-in transformations.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("delete_slots", |config| {
            let config = parse_config("delete_slots", config)?;
            Ok(Arc::new(DeleteSlots::new(config)) as Arc<dyn Transformation>)
        });
        registry.register("infer_references", |config| {
            let config = parse_config("infer_references", config)?;
            Ok(Arc::new(InferReferences::new(config)) as Arc<dyn Transformation>)
        });
        registry.register("aggregate", |config| {
            let spec = parse_config("aggregate", config)?;
            Ok(Arc::new(AggregateTransformation::new(spec)) as Arc<dyn Transformation>)
        });
        registry
    }

    pub fn register(
        &mut self,
        name: impl Into<String>,
        factory: impl Fn(&Value) -> PipelineResult<Arc<dyn Transformation>> + Send + Sync + 'static,
    ) {
        self.factories.insert(name.into(), Box::new(factory));
    }

    /// Build a configured transformation by registry name.
    pub fn build(&self, name: &str, config: &Value) -> PipelineResult<Arc<dyn Transformation>> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| PipelineError::UnknownTransformation(name.to_string()))?;
        factory(config)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }
}

impl Default for TransformationRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

fn parse_config<T: serde::de::DeserializeOwned>(name: &str, config: &Value) -> PipelineResult<T> {
    // Transformations with all-default configs may omit the config block
    let value = if config.is_null() {
        Value::Object(Default::default())
    } else {
        config.clone()
    };
    serde_json::from_value(value).map_err(|e| PipelineError::InvalidConfig {
        name: name.to_string(),
        reason: e.to_string(),
    })
}

/// Serialized workflow form:
/// `{steps: {name: {input, transformation: {name, config}}}, artifacts: {...}}`
#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowConfig {
    pub steps: BTreeMap<String, StepConfig>,
    #[serde(default)]
    pub artifacts: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StepConfig {
    #[serde(default)]
    pub input: Option<String>,
    pub transformation: TransformationConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransformationConfig {
    pub name: String,
    #[serde(default)]
    pub config: Value,
}

impl WorkflowConfig {
    pub fn from_yaml(text: &str) -> PipelineResult<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Resolve transformation names through the registry and assemble the
    /// validated workflow.
    pub fn build(&self, registry: &TransformationRegistry) -> PipelineResult<Workflow> {
        let mut steps = Vec::with_capacity(self.steps.len());
        for (name, step) in &self.steps {
            let transformation =
                registry.build(&step.transformation.name, &step.transformation.config)?;
            steps.push(WorkflowStep::new(
                name.clone(),
                step.input.clone(),
                transformation,
            ));
        }
        Workflow::new(
            steps,
            self.artifacts
                .iter()
                .map(|(a, s)| (a.clone(), s.clone())),
        )
    }
}
