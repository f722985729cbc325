//! The closed set of aggregation functions
//!
//! Each variant declares the shape of its result (range and multivaluedness)
//! so the output schema can be derived from the operations used, and a
//! `apply` reduction over the leaf values a traversal produced.

use super::{AggregateError, AggregateResult};
use crate::schema::SlotRange;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Shape of a function's result as it appears in the derived output schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FunctionResultShape {
    Primitive(SlotRange),
    /// A generated `{value, count}` pair class with the given value range
    ValueCountPairs(SlotRange),
}

/// Closed set of aggregation functions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationFunction {
    /// Number of leaf values
    Count,
    /// Arithmetic sum of integer leaves
    IntegerSum,
    /// Pass through exactly one string value
    StringCopy,
    /// Pass through exactly one integer value
    IntegerCopy,
    /// Pass through the list of string values unchanged
    StringListCopy,
    /// Frequency count per string value, nulls coerced to "unknown"
    StringElementCount,
    /// Frequency count per integer value, nulls filtered
    IntegerElementCount,
}

impl AggregationFunction {
    /// The range of the result slot in the derived output schema.
    pub fn result_shape(&self) -> FunctionResultShape {
        match self {
            Self::Count | Self::IntegerSum | Self::IntegerCopy => {
                FunctionResultShape::Primitive(SlotRange::Integer)
            }
            Self::StringCopy | Self::StringListCopy => {
                FunctionResultShape::Primitive(SlotRange::String)
            }
            Self::StringElementCount => FunctionResultShape::ValueCountPairs(SlotRange::String),
            Self::IntegerElementCount => FunctionResultShape::ValueCountPairs(SlotRange::Integer),
        }
    }

    /// Whether the result slot is a list.
    pub fn result_multivalued(&self) -> bool {
        matches!(
            self,
            Self::StringListCopy | Self::StringElementCount | Self::IntegerElementCount
        )
    }

    /// Reduce the leaf values of one traversal to the result value.
    pub fn apply(&self, values: Vec<Value>) -> AggregateResult<Value> {
        match self {
            Self::Count => Ok(json!(values.len())),
            Self::IntegerSum => {
                let mut sum: i64 = 0;
                for value in values.iter().filter(|v| !v.is_null()) {
                    let term = value
                        .as_i64()
                        .ok_or_else(|| self.error(format!("non-integer value {}", value)))?;
                    sum = sum
                        .checked_add(term)
                        .ok_or_else(|| self.error("sum overflows a 64-bit integer".to_string()))?;
                }
                Ok(json!(sum))
            }
            Self::StringCopy => {
                let value = self.exactly_one(values)?;
                if !value.is_string() {
                    return Err(self.error(format!("non-string value {}", value)));
                }
                Ok(value)
            }
            Self::IntegerCopy => {
                let value = self.exactly_one(values)?;
                if !value.is_i64() && !value.is_u64() {
                    return Err(self.error(format!("non-integer value {}", value)));
                }
                Ok(value)
            }
            Self::StringListCopy => {
                for value in &values {
                    if !value.is_string() {
                        return Err(self.error(format!("non-string value {}", value)));
                    }
                }
                Ok(Value::Array(values))
            }
            Self::StringElementCount => {
                let mut counts: BTreeMap<String, u64> = BTreeMap::new();
                for value in values {
                    let key = match value {
                        Value::Null => "unknown".to_string(),
                        Value::String(s) => s,
                        other => return Err(self.error(format!("non-string value {}", other))),
                    };
                    *counts.entry(key).or_default() += 1;
                }
                Ok(Value::Array(
                    counts
                        .into_iter()
                        .map(|(value, count)| json!({"value": value, "count": count}))
                        .collect(),
                ))
            }
            Self::IntegerElementCount => {
                let mut counts: BTreeMap<i64, u64> = BTreeMap::new();
                for value in values.into_iter().filter(|v| !v.is_null()) {
                    let key = value
                        .as_i64()
                        .ok_or_else(|| self.error(format!("non-integer value {}", value)))?;
                    *counts.entry(key).or_default() += 1;
                }
                Ok(Value::Array(
                    counts
                        .into_iter()
                        .map(|(value, count)| json!({"value": value, "count": count}))
                        .collect(),
                ))
            }
        }
    }

    fn exactly_one(&self, values: Vec<Value>) -> AggregateResult<Value> {
        let mut iter = values.into_iter();
        let first = iter
            .next()
            .ok_or_else(|| self.error("expected exactly one value, found none".to_string()))?;
        if iter.next().is_some() {
            return Err(self.error("expected exactly one value, found several".to_string()));
        }
        Ok(first)
    }

    fn error(&self, reason: String) -> AggregateError {
        AggregateError::Function {
            function: self.to_string(),
            reason,
        }
    }
}

impl fmt::Display for AggregationFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Count => "count",
            Self::IntegerSum => "integer_sum",
            Self::StringCopy => "string_copy",
            Self::IntegerCopy => "integer_copy",
            Self::StringListCopy => "string_list_copy",
            Self::StringElementCount => "string_element_count",
            Self::IntegerElementCount => "integer_element_count",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count() {
        assert_eq!(AggregationFunction::Count.apply(vec![]).unwrap(), json!(0));
        assert_eq!(
            AggregationFunction::Count
                .apply(vec![json!(1), json!(2), json!(3)])
                .unwrap(),
            json!(3)
        );
    }

    #[test]
    fn test_integer_sum() {
        assert_eq!(
            AggregationFunction::IntegerSum
                .apply(vec![json!(1), json!(2), Value::Null, json!(4)])
                .unwrap(),
            json!(7)
        );
    }

    #[test]
    fn test_integer_sum_overflow_is_an_error() {
        let err = AggregationFunction::IntegerSum
            .apply(vec![json!(i64::MAX), json!(1)])
            .unwrap_err();
        assert!(matches!(err, AggregateError::Function { .. }));
    }

    #[test]
    fn test_string_copy_requires_exactly_one() {
        assert_eq!(
            AggregationFunction::StringCopy.apply(vec![json!("a")]).unwrap(),
            json!("a")
        );
        assert!(AggregationFunction::StringCopy.apply(vec![]).is_err());
        assert!(AggregationFunction::StringCopy
            .apply(vec![json!("a"), json!("b")])
            .is_err());
    }

    #[test]
    fn test_string_list_copy_passes_through() {
        assert_eq!(
            AggregationFunction::StringListCopy
                .apply(vec![json!("a"), json!("b"), json!("a")])
                .unwrap(),
            json!(["a", "b", "a"])
        );
    }

    #[test]
    fn test_string_element_count_sorted_with_unknown() {
        let result = AggregationFunction::StringElementCount
            .apply(vec![json!("x"), json!("x"), json!("y"), Value::Null])
            .unwrap();
        assert_eq!(
            result,
            json!([
                {"value": "unknown", "count": 1},
                {"value": "x", "count": 2},
                {"value": "y", "count": 1},
            ])
        );
    }

    #[test]
    fn test_integer_element_count_filters_nulls() {
        let result = AggregationFunction::IntegerElementCount
            .apply(vec![json!(2), json!(1), Value::Null, json!(2)])
            .unwrap();
        assert_eq!(
            result,
            json!([
                {"value": 1, "count": 1},
                {"value": 2, "count": 2},
            ])
        );
    }

    #[test]
    fn test_result_shapes() {
        assert_eq!(
            AggregationFunction::Count.result_shape(),
            FunctionResultShape::Primitive(SlotRange::Integer)
        );
        assert!(AggregationFunction::StringElementCount.result_multivalued());
        assert!(!AggregationFunction::IntegerCopy.result_multivalued());
    }

    #[test]
    fn test_serde_names() {
        let f: AggregationFunction = serde_yaml::from_str("string_element_count").unwrap();
        assert_eq!(f, AggregationFunction::StringElementCount);
    }
}
