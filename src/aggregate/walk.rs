//! Depth-first subgraph walk over one slot chain
//!
//! Uses an explicit stack plus a `(class, id)` visited set instead of native
//! recursion: instance graphs can share references and contain cycles, and
//! resources are reached by id through a flat index rather than by pointer.

use super::{AggregateError, AggregateResult};
use crate::model::ResourceIndex;
use crate::schema::{Schema, SchemaCapability, SlotRange};
use serde_json::Value;
use std::collections::HashSet;

/// Collect the leaf values reached by walking `path` from one root instance.
///
/// The walk is depth-first over an explicit `(depth, node)` stack. An absent
/// non-required slot skips the branch; a reference slot resolves ids through
/// the resource index. Classes listed in `visit_once` are deduplicated on
/// `(class, id)`, marked before their children are pushed, so an instance
/// shared between branches contributes its leaves exactly once per traversal.
///
/// The returned values are consumed once per operation; the stack and
/// visited set are scoped to this call, so walking a sibling root starts
/// fresh.
pub fn terminal_nodes(
    schema: &Schema,
    index: &mut ResourceIndex<'_>,
    start_class: &str,
    root: &Value,
    path: &[String],
    visit_once: &[String],
) -> AggregateResult<Vec<Value>> {
    let classes = class_chain(schema, start_class, path)?;

    let mut leaves = Vec::new();
    let mut visited: HashSet<(String, String)> = HashSet::new();
    let mut stack: Vec<(usize, Value)> = vec![(0, root.clone())];

    while let Some((depth, node)) = stack.pop() {
        if depth == path.len() {
            leaves.push(node);
            continue;
        }

        let class = &classes[depth];
        let slot_name = &path[depth];
        let slot = schema
            .induced_slot(class, slot_name)
            .ok_or_else(|| AggregateError::UnknownSlot {
                class: class.clone(),
                slot: slot_name.clone(),
            })?;

        let value = match node.get(slot_name) {
            None | Some(Value::Null) => {
                if slot.required {
                    return Err(AggregateError::RequiredSlotMissing {
                        class: class.clone(),
                        slot: slot_name.clone(),
                    });
                }
                continue;
            }
            Some(v) => v,
        };

        let children: Vec<&Value> = if slot.multivalued {
            value
                .as_array()
                .ok_or_else(|| AggregateError::NotAList {
                    class: class.clone(),
                    slot: slot_name.clone(),
                })?
                .iter()
                .collect()
        } else {
            vec![value]
        };

        // Reverse push keeps document order on the pop side
        for child in children.into_iter().rev() {
            let (child_value, child_key) = materialize_child(schema, index, slot, child)?;
            if let Some(key) = child_key {
                if visit_once.iter().any(|c| c == &key.0) {
                    if visited.contains(&key) {
                        continue;
                    }
                    visited.insert(key);
                }
            }
            stack.push((depth + 1, child_value));
        }
    }

    Ok(leaves)
}

/// Turn one raw child value into the node to push, resolving references
/// through the index, and compute its `(class, id)` identity if it has one.
fn materialize_child(
    schema: &Schema,
    index: &mut ResourceIndex<'_>,
    slot: &crate::schema::SlotDef,
    child: &Value,
) -> AggregateResult<(Value, Option<(String, String)>)> {
    let class = match slot.range.class_name() {
        Some(class) => class,
        // Primitive leaf: no identity
        None => return Ok((child.clone(), None)),
    };

    if slot.inlined {
        // Inlined instances are identifiable only if their class declares an
        // identifier slot holding a string; otherwise they are revisited freely.
        let key = schema
            .class(class)
            .and_then(|def| def.identifier.as_deref())
            .and_then(|id_slot| child.get(id_slot))
            .and_then(Value::as_str)
            .map(|id| (class.to_string(), id.to_string()));
        return Ok((child.clone(), key));
    }

    let id = child
        .as_str()
        .ok_or_else(|| AggregateError::UnresolvedReference {
            class: class.to_string(),
            id: child.to_string(),
        })?;
    let resource =
        index
            .resolve(class, id)?
            .ok_or_else(|| AggregateError::UnresolvedReference {
                class: class.to_string(),
                id: id.to_string(),
            })?;
    Ok((
        resource.content.clone(),
        Some((class.to_string(), id.to_string())),
    ))
}

/// Check that every input path of a spec walks declared slots from the input
/// anchor class. Used as a precondition check before any data is touched.
pub fn validate_paths(
    schema: &Schema,
    spec: &super::ops::AggregationSpec,
) -> AggregateResult<()> {
    for operation in &spec.operations {
        for path in &operation.input_paths {
            class_chain(schema, &spec.input_anchor_class, path.segments())?;
        }
    }
    Ok(())
}

/// Class of the node at each depth of the walk.
///
/// `chain[0]` is the start class; every non-final slot must range over a
/// class, the final slot may be primitive.
fn class_chain(schema: &Schema, start_class: &str, path: &[String]) -> AggregateResult<Vec<String>> {
    let mut chain = vec![start_class.to_string()];
    for (i, slot_name) in path.iter().enumerate() {
        let class = &chain[i];
        let slot = schema
            .induced_slot(class, slot_name)
            .ok_or_else(|| AggregateError::UnknownSlot {
                class: class.clone(),
                slot: slot_name.clone(),
            })?;
        match &slot.range {
            SlotRange::Class(next) => chain.push(next.clone()),
            _ if i + 1 == path.len() => {}
            _ => {
                return Err(AggregateError::PrimitiveMidPath {
                    class: class.clone(),
                    slot: slot_name.clone(),
                })
            }
        }
    }
    Ok(chain)
}
