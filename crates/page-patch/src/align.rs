//! Patch alignment.
//!
//! The page editor names its inputs by position (`component_data.1.props.
//! navLinks.0.label`) because that is how it walks the canonical tree. The
//! reconciler matches by key. Alignment rewrites the positional parts of a
//! sparse patch into keyed mappings, looking the keys up in the canonical tree
//! the editor was rendered from.

use serde_json::{Map, Value};
use tracing::debug;

use crate::contracts::ContractRegistry;
use crate::node::{Children, Node, CHILDREN_FIELD, PROPS_FIELD};

/// Siblings that can be looked up by position and by key.
trait Siblings {
    fn at(&self, index: usize) -> Option<&Node>;
    fn by_key(&self, key: &str) -> Option<&Node>;
}

impl Siblings for [Node] {
    fn at(&self, index: usize) -> Option<&Node> {
        self.get(index)
    }

    fn by_key(&self, key: &str) -> Option<&Node> {
        self.iter().find(|node| node.key == key)
    }
}

impl Siblings for Children {
    fn at(&self, index: usize) -> Option<&Node> {
        self.get_index(index)
    }

    fn by_key(&self, key: &str) -> Option<&Node> {
        self.get(key)
    }
}

/// Rewrite the `component_data` fragment of `patch` into keyed form against
/// the canonical `tree`.
///
/// Sequence entries past the end of the canonical siblings are dropped, since
/// reconciliation never creates nodes. Fragments that are already keyed pass
/// through, with their nested fragments aligned where the key is known. All
/// other top-level patch fields are kept as they are.
pub fn align_patch(tree: &[Node], patch: &Value, contracts: &ContractRegistry) -> Value {
    let Value::Object(fields) = patch else {
        return patch.clone();
    };
    let mut out = fields.clone();
    if let Some(fragment) = fields.get(CHILDREN_FIELD) {
        out.insert(
            CHILDREN_FIELD.to_string(),
            align_children(tree, fragment, contracts),
        );
    }
    Value::Object(out)
}

fn align_children<S: Siblings + ?Sized>(
    siblings: &S,
    fragment: &Value,
    contracts: &ContractRegistry,
) -> Value {
    let mut keyed = Map::new();
    match fragment {
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                let Some(node) = siblings.at(index) else {
                    debug!(index, "dropping patch for a position past the last node");
                    continue;
                };
                keyed.insert(node.key.clone(), align_node(node, item, contracts));
            }
        }
        Value::Object(items) => {
            for (key, item) in items {
                let aligned = match siblings.by_key(key) {
                    Some(node) => align_node(node, item, contracts),
                    None => item.clone(),
                };
                keyed.insert(key.clone(), aligned);
            }
        }
        _ => {}
    }
    Value::Object(keyed)
}

fn align_node(node: &Node, item: &Value, contracts: &ContractRegistry) -> Value {
    let Value::Object(fields) = item else {
        return item.clone();
    };
    let mut out = fields.clone();

    if let (Some(fragment), Some(children)) = (fields.get(CHILDREN_FIELD), node.children()) {
        out.insert(
            CHILDREN_FIELD.to_string(),
            align_children(children, fragment, contracts),
        );
    }

    if let Some(Value::Object(props)) = out.get_mut(PROPS_FIELD) {
        for prop in contracts.structural_props(&node.name) {
            if let Some(fragment) = props.get(prop).filter(|value| value.is_array()) {
                let aligned = align_entries(node.prop(prop), fragment);
                props.insert(prop.clone(), aligned);
            }
        }
    }

    Value::Object(out)
}

/// Key positional structural entries by the canonical entry at that position.
fn align_entries(canonical: Option<&Value>, fragment: &Value) -> Value {
    let Value::Array(items) = fragment else {
        return fragment.clone();
    };
    let mut keyed = Map::new();
    for (index, item) in items.iter().enumerate() {
        match entry_key(canonical, index) {
            Some(key) => {
                keyed.insert(key.to_string(), item.clone());
            }
            None => debug!(index, "dropping patch for a position past the last entry"),
        }
    }
    Value::Object(keyed)
}

fn entry_key(canonical: Option<&Value>, index: usize) -> Option<&str> {
    match canonical? {
        Value::Array(entries) => entries.get(index)?.get("key")?.as_str(),
        Value::Object(entries) => entries.keys().nth(index).map(String::as_str),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tree() -> Vec<Node> {
        serde_json::from_value(json!([
            {"key": "nav", "name": "navbar", "props": {"navLinks": [
                {"key": "home", "label": "Home"},
                {"key": "about", "label": "About"}
            ]}},
            {"key": "body", "name": "layout", "component_data": [
                {"key": "intro", "name": "typography"},
                {"key": "signup", "name": "form", "props": {"fields": [
                    {"key": "email", "label": "Email"}
                ]}}
            ]}
        ]))
        .unwrap()
    }

    #[test]
    fn test_positions_become_keys() {
        let contracts = ContractRegistry::default();
        let patch = json!({"component_data": [
            {"props": {"navLinks": [{}, {"label": "Team"}]}},
            {"component_data": [{}, {"props": {"fields": [{"label": "E-mail"}]}}]}
        ]});
        assert_eq!(
            align_patch(&tree(), &patch, &contracts),
            json!({"component_data": {
                "nav": {"props": {"navLinks": {"home": {}, "about": {"label": "Team"}}}},
                "body": {"component_data": {
                    "intro": {},
                    "signup": {"props": {"fields": {"email": {"label": "E-mail"}}}}
                }}
            }})
        );
    }

    #[test]
    fn test_out_of_range_positions_dropped() {
        let contracts = ContractRegistry::default();
        let patch = json!({"component_data": [
            {"props": {"navLinks": [{}, {}, {"label": "Ghost"}]}},
            {},
            {"props": {"text": "new node"}}
        ]});
        assert_eq!(
            align_patch(&tree(), &patch, &contracts),
            json!({"component_data": {
                "nav": {"props": {"navLinks": {"home": {}, "about": {}}}},
                "body": {}
            }})
        );
    }

    #[test]
    fn test_keyed_fragment_passes_through() {
        let contracts = ContractRegistry::default();
        let patch = json!({"component_data": {
            "body": {"component_data": [{"props": {"text": "Hello"}}]},
            "ghost": {"variant": "x"}
        }});
        assert_eq!(
            align_patch(&tree(), &patch, &contracts),
            json!({"component_data": {
                "body": {"component_data": {"intro": {"props": {"text": "Hello"}}}},
                "ghost": {"variant": "x"}
            }})
        );
    }

    #[test]
    fn test_other_fields_kept() {
        let contracts = ContractRegistry::default();
        let patch = json!({"seo": {"title": "Home"}});
        assert_eq!(align_patch(&tree(), &patch, &contracts), patch);
    }

    #[test]
    fn test_non_structural_sequences_untouched() {
        let contracts = ContractRegistry::default();
        let patch = json!({"component_data": [{"props": {"tags": ["a", "b"]}}]});
        assert_eq!(
            align_patch(&tree(), &patch, &contracts),
            json!({"component_data": {"nav": {"props": {"tags": ["a", "b"]}}}})
        );
    }
}
