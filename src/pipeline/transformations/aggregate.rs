//! Aggregation as a pipeline transformation

use crate::aggregate::{derive_output_schema, execute, validate_paths, AggregationSpec};
use crate::model::AnchorSet;
use crate::pipeline::traits::{AssumptionError, DataTransformer, TransformError, Transformation};
use crate::schema::Schema;
use serde_json::Value;
use std::sync::Arc;

/// Replaces the document with aggregation results: one output instance per
/// input-anchor instance, shaped by the schema derived from the operations.
pub struct AggregateTransformation {
    spec: AggregationSpec,
}

impl AggregateTransformation {
    pub fn new(spec: AggregationSpec) -> Self {
        Self { spec }
    }
}

impl Transformation for AggregateTransformation {
    fn name(&self) -> &str {
        "aggregate"
    }

    fn check_assumptions(&self, schema: &Schema) -> Result<(), AssumptionError> {
        let anchors = schema
            .anchor_set()
            .map_err(|e| AssumptionError::new(e.to_string()))?;
        if !anchors.contains(&self.spec.input_anchor_class) {
            return Err(AssumptionError::new(format!(
                "input anchor class '{}' has no anchor point",
                self.spec.input_anchor_class
            )));
        }
        validate_paths(schema, &self.spec).map_err(|e| AssumptionError::new(e.to_string()))
    }

    fn transform_schema(&self, schema: &Schema) -> Result<Schema, TransformError> {
        let anchors = schema.anchor_set()?;
        Ok(derive_output_schema(&self.spec, &anchors)?)
    }

    fn make_data_transformer(
        &self,
        input_schema: Arc<Schema>,
        _output_schema: Arc<Schema>,
    ) -> Result<Box<dyn DataTransformer>, TransformError> {
        let anchors = input_schema.anchor_set()?;
        Ok(Box::new(AggregateTransformer {
            spec: self.spec.clone(),
            schema: input_schema,
            anchors,
        }))
    }
}

struct AggregateTransformer {
    spec: AggregationSpec,
    schema: Arc<Schema>,
    anchors: AnchorSet,
}

impl DataTransformer for AggregateTransformer {
    fn transform(
        &self,
        document: &Value,
        _annotation: Option<&Value>,
    ) -> Result<Value, TransformError> {
        Ok(execute(&self.spec, &self.schema, document, &self.anchors)?)
    }
}
