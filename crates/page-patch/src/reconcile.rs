//! Patch reconciliation.
//!
//! Deep-merges a sparse patch onto a keyed working tree. The patch is shaped
//! like the tree: `{ <key>: { props: {..}, component_data: { <key>: .. } } }`.
//! Anything the patch does not mention is left exactly as it was, and nodes are
//! only ever edited in place: reconciliation cannot insert, delete or reorder
//! them.

use indexmap::IndexMap;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::contracts::ContractRegistry;
use crate::normalize::is_keyed;
use crate::node::{is_identity_field, Children, Node, Presentation, CHILDREN_FIELD, PROPS_FIELD};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReconcileError {
    #[error("reconciliation target must be a keyed mapping, not a sequence")]
    SequenceTarget,
    #[error("invalid patch for {field:?} of node {key:?}: {reason}")]
    InvalidField {
        key: String,
        field: String,
        reason: String,
    },
}

/// Apply `patch` to keyed children.
///
/// Patch entries whose key has no matching node are ignored.
///
/// # Errors
///
/// [`ReconcileError::SequenceTarget`] if `target` is still a sequence: only
/// normalized children can be reconciled.
pub fn reconcile(
    target: &mut Children,
    patch: &Value,
    contracts: &ContractRegistry,
) -> Result<(), ReconcileError> {
    match target {
        Children::Keyed(nodes) => reconcile_nodes(nodes, patch.as_object(), contracts),
        Children::Sequence(_) => Err(ReconcileError::SequenceTarget),
    }
}

fn reconcile_nodes(
    nodes: &mut IndexMap<String, Node>,
    patch: Option<&Map<String, Value>>,
    contracts: &ContractRegistry,
) -> Result<(), ReconcileError> {
    let Some(patch) = patch else {
        return Ok(());
    };
    for (key, node) in nodes.iter_mut() {
        let Some(node_patch) = patch.get(key).and_then(Value::as_object) else {
            continue;
        };
        reconcile_node(node, node_patch, contracts)?;
    }
    for key in patch.keys().filter(|key| !nodes.contains_key(key.as_str())) {
        debug!(key = %key, "ignoring patch for unknown node");
    }
    Ok(())
}

fn reconcile_node(
    node: &mut Node,
    patch: &Map<String, Value>,
    contracts: &ContractRegistry,
) -> Result<(), ReconcileError> {
    apply_fields(node, patch, contracts)?;

    if let Some(Children::Keyed(children)) = node.component_data.as_mut() {
        let children_patch = patch.get(CHILDREN_FIELD).and_then(Value::as_object);
        reconcile_nodes(children, children_patch, contracts)?;
    }

    let props_patch = patch.get(PROPS_FIELD).and_then(Value::as_object);
    if let Some(props) = node.props.as_mut() {
        for prop in contracts.structural_props(&node.name) {
            if let Some(Value::Object(entries)) = props.get_mut(prop).filter(|v| is_entries(v)) {
                let entries_patch = props_patch
                    .and_then(|p| p.get(prop))
                    .and_then(Value::as_object);
                reconcile_entries(entries, entries_patch)?;
            }
        }
    }
    Ok(())
}

/// Merge the node-level fields of `patch`. Children and structural props that
/// hold entries are left to the recursive steps so this can never add entries
/// to them.
fn apply_fields(
    node: &mut Node,
    patch: &Map<String, Value>,
    contracts: &ContractRegistry,
) -> Result<(), ReconcileError> {
    let mut presentation_patch = Map::new();

    for (field, value) in patch {
        match field.as_str() {
            "key" | "name" => {
                let current = if field == "key" { &node.key } else { &node.name };
                if matches!(value.as_str(), Some(s) if !s.is_empty() && s != current) {
                    warn!(key = %node.key, field = %field, "ignoring identity overwrite");
                }
            }
            CHILDREN_FIELD => {}
            PROPS_FIELD => {
                let Value::Object(props_patch) = value else {
                    return Err(ReconcileError::InvalidField {
                        key: node.key.clone(),
                        field: field.clone(),
                        reason: "props patch must be an object".into(),
                    });
                };
                let plain: Vec<_> = props_patch
                    .iter()
                    .filter(|(prop, _)| !holds_entries(node, prop, contracts))
                    .collect();
                if plain.is_empty() {
                    continue;
                }
                let props = node.props.get_or_insert_with(Map::new);
                for (prop, prop_value) in plain {
                    merge_field(props, prop, prop_value)?;
                }
            }
            _ => {
                presentation_patch.insert(field.clone(), presentation_value(field, value));
            }
        }
    }

    if !presentation_patch.is_empty() {
        let invalid = |reason: String| ReconcileError::InvalidField {
            key: node.key.clone(),
            field: presentation_patch.keys().cloned().collect::<Vec<_>>().join(","),
            reason,
        };
        let mut attrs = serde_json::to_value(&node.presentation).map_err(|e| invalid(e.to_string()))?;
        merge(&mut attrs, &presentation_patch)?;
        let presentation = serde_json::from_value(attrs).map_err(|e| invalid(e.to_string()))?;
        node.presentation = presentation;
    }
    Ok(())
}

/// Whether `prop` is a structural prop currently holding keyed entries, or not
/// set at all. Such props are only reached through entry reconciliation; a
/// structural prop holding anything else is plain data.
fn holds_entries(node: &Node, prop: &str, contracts: &ContractRegistry) -> bool {
    contracts.is_structural(&node.name, prop) && node.prop(prop).map_or(true, is_entries)
}

fn is_entries(value: &Value) -> bool {
    matches!(value, Value::Object(entries) if is_keyed(entries))
}

fn presentation_value(field: &str, value: &Value) -> Value {
    match value {
        Value::Number(_) | Value::Bool(_) if Presentation::TEXT_FIELDS.contains(&field) => {
            Value::String(value.to_string())
        }
        _ => value.clone(),
    }
}

/// Merge entry patches into a keyed structural prop.
fn reconcile_entries(
    entries: &mut Map<String, Value>,
    patch: Option<&Map<String, Value>>,
) -> Result<(), ReconcileError> {
    let Some(patch) = patch else {
        return Ok(());
    };
    for (key, entry) in entries.iter_mut() {
        let (Some(entry_patch), Value::Object(entry)) =
            (patch.get(key).and_then(Value::as_object), entry)
        else {
            continue;
        };
        for (field, value) in entry_patch {
            if is_identity_field(field) {
                continue;
            }
            merge_field(entry, field, value)?;
        }
    }
    Ok(())
}

/// Deep-merge `patch` into `target`.
///
/// Nested objects are merged key by key, creating the target object when
/// missing or scalar. A patch sequence is laid over an existing sequence
/// position by position: `{}` placeholders (left by sparse form indices) keep
/// the element already there, objects merge into it, anything else replaces
/// it. Positions past the end are appended. Every other patch value replaces
/// the target value.
///
/// # Errors
///
/// [`ReconcileError::SequenceTarget`] if `target`, or a value the merge has to
/// descend into, is a sequence.
pub fn merge(target: &mut Value, patch: &Map<String, Value>) -> Result<(), ReconcileError> {
    match target {
        Value::Array(_) => Err(ReconcileError::SequenceTarget),
        Value::Object(map) => merge_map(map, patch),
        other => {
            let mut map = Map::new();
            merge_map(&mut map, patch)?;
            *other = Value::Object(map);
            Ok(())
        }
    }
}

pub(crate) fn merge_map(
    target: &mut Map<String, Value>,
    patch: &Map<String, Value>,
) -> Result<(), ReconcileError> {
    for (field, value) in patch {
        merge_field(target, field, value)?;
    }
    Ok(())
}

fn merge_field(
    target: &mut Map<String, Value>,
    field: &str,
    value: &Value,
) -> Result<(), ReconcileError> {
    match value {
        Value::Object(nested) => {
            let slot = target.entry(field).or_insert(Value::Null);
            merge(slot, nested)
        }
        Value::Array(items) => {
            if let Some(Value::Array(current)) = target.get_mut(field) {
                return overlay(current, items);
            }
            target.insert(field.to_string(), value.clone());
            Ok(())
        }
        _ => {
            target.insert(field.to_string(), value.clone());
            Ok(())
        }
    }
}

fn overlay(current: &mut Vec<Value>, items: &[Value]) -> Result<(), ReconcileError> {
    for (idx, item) in items.iter().enumerate() {
        match (current.get_mut(idx), item) {
            (Some(_), Value::Object(nested)) if nested.is_empty() => {}
            (Some(slot), Value::Object(nested)) => merge(slot, nested)?,
            (Some(slot), _) => *slot = item.clone(),
            (None, _) => current.push(item.clone()),
        }
    }
    Ok(())
}
