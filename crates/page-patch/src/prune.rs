//! Value pruner.
//!
//! Editor widgets always submit something, even when the user never touched
//! them: a `<select>` sends its placeholder option, an empty text input sends
//! `""`. Left alone, such a patch would reset every untouched field. The pruner
//! drops those placeholder leaves so the patch only carries real edits.

use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::node::is_identity_field;

/// Leaf values that mean "not set". `null` is treated the same way.
pub const SENTINELS: [&str; 5] = ["", "none", "normal", "rounded", "center"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pruner {
    sentinels: HashSet<String>,
}

impl Default for Pruner {
    fn default() -> Self {
        Pruner::new(SENTINELS)
    }
}

impl Pruner {
    pub fn new<I, S>(sentinels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Pruner {
            sentinels: sentinels.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_sentinel(&self, value: &Value) -> bool {
        match value {
            Value::Null => true,
            Value::String(s) => self.sentinels.contains(s),
            _ => false,
        }
    }

    /// Return a copy of `input` without sentinel leaves.
    ///
    /// - `key` and `name` entries are kept as they are, whatever their value.
    /// - A mapping left empty after pruning is dropped from its parent.
    /// - Sequences keep their length; only the inside of their elements is
    ///   pruned.
    pub fn prune(&self, input: &Value) -> Value {
        match input {
            Value::Array(items) => Value::Array(items.iter().map(|item| self.prune(item)).collect()),
            Value::Object(map) => Value::Object(self.prune_map(map)),
            scalar => scalar.clone(),
        }
    }

    fn prune_map(&self, map: &Map<String, Value>) -> Map<String, Value> {
        let mut out = Map::new();
        for (key, value) in map {
            if is_identity_field(key) {
                out.insert(key.clone(), value.clone());
                continue;
            }
            if self.is_sentinel(value) {
                continue;
            }
            let cleaned = self.prune(value);
            if matches!(&cleaned, Value::Object(m) if m.is_empty()) {
                continue;
            }
            out.insert(key.clone(), cleaned);
        }
        out
    }
}

/// Prune with the default sentinel set.
pub fn prune(input: &Value) -> Value {
    Pruner::default().prune(input)
}
