//! Page content tree.
//!
//! A [`Node`] is one block of page content: an identity `key`, a type tag
//! `name`, open-ended `props`, presentation attributes the engine does not
//! interpret, and optional children.
//!
//! Children come in two shapes, see [`Children`]. The canonical (stored)
//! tree holds them as a sequence; the working tree used while patching holds
//! them keyed by identity.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Fields that carry a node's identity and type tag. They survive pruning and
/// are never overwritten by a patch.
pub const IDENTITY_FIELDS: [&str; 2] = ["key", "name"];

/// Field holding a node's children.
pub const CHILDREN_FIELD: &str = "component_data";

/// Field holding a node's configuration data.
pub const PROPS_FIELD: &str = "props";

pub fn is_identity_field(field: &str) -> bool {
    IDENTITY_FIELDS.contains(&field)
}

/// Presentation attributes of a node. Opaque to the patch engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Presentation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Sub-type discriminator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wrapper: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid_span: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_span: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_contained: Option<bool>,
    /// Any other top-level attribute, kept verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Presentation {
    /// Attributes stored as text. Form input coerced to a number or boolean is
    /// turned back into text before it lands in one of these.
    pub const TEXT_FIELDS: [&'static str; 6] =
        ["id", "variant", "layout", "mode", "wrapper", "background"];
}

/// One unit of page content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Identity, unique among siblings and stable across edits.
    pub key: String,
    /// Type tag, immutable after creation.
    pub name: String,
    #[serde(flatten)]
    pub presentation: Presentation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub props: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_data: Option<Children>,
}

/// The children of a node, in canonical or working shape.
///
/// `Sequence` serializes as a JSON array, `Keyed` as a JSON object whose
/// iteration order is the insertion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Children {
    Sequence(Vec<Node>),
    Keyed(IndexMap<String, Node>),
}

impl Node {
    pub fn new(key: impl Into<String>, name: impl Into<String>) -> Self {
        Node {
            key: key.into(),
            name: name.into(),
            presentation: Presentation::default(),
            props: None,
            component_data: None,
        }
    }

    pub fn with_props(mut self, props: Value) -> Self {
        if let Value::Object(map) = props {
            self.props = Some(map);
        }
        self
    }

    pub fn with_variant(mut self, variant: impl Into<String>) -> Self {
        self.presentation.variant = Some(variant.into());
        self
    }

    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.component_data = Some(Children::Sequence(children));
        self
    }

    pub fn variant(&self) -> Option<&str> {
        self.presentation.variant.as_deref()
    }

    pub fn prop(&self, name: &str) -> Option<&Value> {
        self.props.as_ref().and_then(|props| props.get(name))
    }

    pub fn children(&self) -> Option<&Children> {
        self.component_data.as_ref()
    }
}

impl Children {
    pub fn len(&self) -> usize {
        match self {
            Children::Sequence(nodes) => nodes.len(),
            Children::Keyed(nodes) => nodes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_keyed(&self) -> bool {
        matches!(self, Children::Keyed(_))
    }

    /// Child at a position, in sequence or insertion order.
    pub fn get_index(&self, index: usize) -> Option<&Node> {
        match self {
            Children::Sequence(nodes) => nodes.get(index),
            Children::Keyed(nodes) => nodes.get_index(index).map(|(_, node)| node),
        }
    }

    /// Child by identity.
    pub fn get(&self, key: &str) -> Option<&Node> {
        match self {
            Children::Sequence(nodes) => nodes.iter().find(|node| node.key == key),
            Children::Keyed(nodes) => nodes.get(key),
        }
    }

    pub fn iter(&self) -> Box<dyn Iterator<Item = &Node> + '_> {
        match self {
            Children::Sequence(nodes) => Box::new(nodes.iter()),
            Children::Keyed(nodes) => Box::new(nodes.values()),
        }
    }

    /// Keys in order.
    pub fn keys(&self) -> Vec<&str> {
        self.iter().map(|node| node.key.as_str()).collect()
    }
}

/// A stored page document.
///
/// Only `component_data` is interpreted; `_id`, `slug`, `route`, `seo`,
/// `status`, `version` and the timestamps travel untouched in `meta`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub component_data: Vec<Node>,
    #[serde(flatten)]
    pub meta: Map<String, Value>,
}
