//! Identity normalization.
//!
//! [`normalize`] turns a canonical node (children and structural props held as
//! sequences) into its working shape (the same data keyed by each entry's
//! `key`). [`denormalize`] goes the other way. Both consume their input and
//! return a new tree.
//!
//! Keyed maps keep insertion order, so sibling order survives a
//! normalize → reconcile → denormalize cycle.

use indexmap::IndexMap;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::contracts::ContractRegistry;
use crate::node::{Children, Node};

/// Label used for the top-level sequence in error messages.
pub const ROOT: &str = "<root>";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("duplicate key {key:?} among the children of {parent:?}")]
    DuplicateKey { parent: String, key: String },
    #[error("entry {index} of {parent:?}.props.{prop} has no string `key`")]
    MissingKey {
        parent: String,
        prop: String,
        index: usize,
    },
}

/// Convert a canonical node into its keyed working shape.
///
/// Children are keyed and normalized recursively. Each structural prop (per
/// `contracts`) currently holding a sequence is keyed; its entries are not
/// recursed into. Other props are left untouched.
///
/// # Errors
///
/// Two siblings sharing a key, or a structural entry without a string `key`.
pub fn normalize(mut node: Node, contracts: &ContractRegistry) -> Result<Node, NormalizeError> {
    if let Some(children) = node.component_data.take() {
        node.component_data = Some(normalize_children(children, &node.key, contracts)?);
    }

    if let Some(props) = node.props.as_mut() {
        for prop in contracts.structural_props(&node.name) {
            let entries = match props.get_mut(prop) {
                Some(Value::Array(entries)) => std::mem::take(entries),
                _ => continue,
            };
            let keyed = key_entries(entries, &node.key, prop)?;
            props.insert(prop.clone(), Value::Object(keyed));
        }
    }

    Ok(node)
}

/// Normalize a top-level sequence of nodes into keyed children.
pub fn normalize_all(
    nodes: Vec<Node>,
    contracts: &ContractRegistry,
) -> Result<Children, NormalizeError> {
    normalize_children(Children::Sequence(nodes), ROOT, contracts)
}

fn normalize_children(
    children: Children,
    parent: &str,
    contracts: &ContractRegistry,
) -> Result<Children, NormalizeError> {
    let nodes: Vec<Node> = match children {
        Children::Sequence(nodes) => nodes,
        Children::Keyed(nodes) => nodes.into_values().collect(),
    };

    let mut keyed = IndexMap::with_capacity(nodes.len());
    for node in nodes {
        if keyed.contains_key(&node.key) {
            return Err(NormalizeError::DuplicateKey {
                parent: parent.to_string(),
                key: node.key,
            });
        }
        let node = normalize(node, contracts)?;
        keyed.insert(node.key.clone(), node);
    }
    Ok(Children::Keyed(keyed))
}

fn key_entries(
    entries: Vec<Value>,
    parent: &str,
    prop: &str,
) -> Result<Map<String, Value>, NormalizeError> {
    let mut keyed = Map::new();
    for (index, entry) in entries.into_iter().enumerate() {
        let Some(key) = entry.get("key").and_then(Value::as_str).map(str::to_string) else {
            return Err(NormalizeError::MissingKey {
                parent: parent.to_string(),
                prop: prop.to_string(),
                index,
            });
        };
        if keyed.contains_key(&key) {
            return Err(NormalizeError::DuplicateKey {
                parent: format!("{parent}.props.{prop}"),
                key,
            });
        }
        keyed.insert(key, entry);
    }
    Ok(keyed)
}

/// Convert a working node back into canonical shape.
///
/// Keyed children become a sequence in map order, recursively. A structural
/// prop becomes a sequence again only if it is keyed: an object whose values
/// are all objects carrying their own map key as `key`.
pub fn denormalize(mut node: Node, contracts: &ContractRegistry) -> Node {
    if let Some(children) = node.component_data.take() {
        node.component_data = Some(Children::Sequence(denormalize_all(children, contracts)));
    }

    if let Some(props) = node.props.as_mut() {
        for prop in contracts.structural_props(&node.name) {
            let entries = match props.get_mut(prop) {
                Some(Value::Object(entries)) if is_keyed(entries) => std::mem::take(entries),
                _ => continue,
            };
            let sequence = entries.into_iter().map(|(_, entry)| entry).collect();
            props.insert(prop.clone(), Value::Array(sequence));
        }
    }

    node
}

/// Denormalize children into a canonical sequence.
pub fn denormalize_all(children: Children, contracts: &ContractRegistry) -> Vec<Node> {
    let nodes: Vec<Node> = match children {
        Children::Sequence(nodes) => nodes,
        Children::Keyed(nodes) => nodes.into_values().collect(),
    };
    nodes
        .into_iter()
        .map(|node| denormalize(node, contracts))
        .collect()
}

/// An object whose every value is an object carrying its own map key as `key`.
pub(crate) fn is_keyed(entries: &Map<String, Value>) -> bool {
    entries
        .iter()
        .all(|(key, entry)| entry.get("key").and_then(Value::as_str) == Some(key.as_str()))
}
