#![allow(dead_code)]

use page_patch::{Children, Node, Page};
use serde_json::Value;

pub const HOME_PAGE: &str = include_str!("../fixtures/home_page.json");

pub fn home_page() -> Page {
    serde_json::from_str(HOME_PAGE).expect("home page fixture")
}

pub fn home_tree() -> Vec<Node> {
    home_page().component_data
}

pub fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> Value {
    serde_json::to_value(value).expect("serializable")
}

/// Find a node anywhere in a canonical tree.
pub fn find<'a>(tree: &'a [Node], key: &str) -> Option<&'a Node> {
    for node in tree {
        if node.key == key {
            return Some(node);
        }
        if let Some(Children::Sequence(children)) = &node.component_data {
            if let Some(found) = find(children, key) {
                return Some(found);
            }
        }
    }
    None
}
