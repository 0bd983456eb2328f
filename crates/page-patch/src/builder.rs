//! Sparse patch builder.
//!
//! Turns serialized editor form fields into a sparse nested patch. Only
//! fields named `patch.<address>` take part; everything else in the form (CSRF
//! tokens, page-level inputs) is ignored.
//!
//! ```
//! use page_patch::builder::build_patch;
//! use serde_json::json;
//!
//! let patch = build_patch([
//!     ("patch.component_data.0.props.title", "Hello"),
//!     ("patch.component_data.0.is_contained", "true"),
//!     ("csrf", "abc"),
//! ])
//! .unwrap();
//! assert_eq!(
//!     patch,
//!     json!({"component_data": [{"props": {"title": "Hello"}, "is_contained": true}]})
//! );
//! ```

use page_patch_path::{
    format_path, parse_path, validate_address, validate_path, PathError, Step,
};
use serde_json::{Map, Number, Value};
use thiserror::Error;

/// Namespace prefix of form fields that carry patch data. Shared by
/// [`build_patch`] and [`flatten_patch`].
pub const PATCH_NAMESPACE: &str = "patch.";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("invalid address in field {field:?}: {source}")]
    Path {
        field: String,
        #[source]
        source: PathError,
    },
    #[error("field {field:?} cannot descend through the existing value at {at:?}")]
    PathConflict { field: String, at: String },
}

/// Coerce a raw form value.
///
/// `"true"`/`"false"` become booleans, a non-empty string that parses
/// completely as a finite number becomes a number, anything else stays a
/// string. Whitespace is not trimmed.
///
/// ```
/// use page_patch::builder::coerce;
/// use serde_json::json;
///
/// assert_eq!(coerce("true"), json!(true));
/// assert_eq!(coerce("12"), json!(12));
/// assert_eq!(coerce("1.5"), json!(1.5));
/// assert_eq!(coerce("12px"), json!("12px"));
/// assert_eq!(coerce(""), json!(""));
/// ```
pub fn coerce(raw: &str) -> Value {
    match raw {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => parse_number(raw).unwrap_or_else(|| Value::String(raw.to_string())),
    }
}

fn parse_number(raw: &str) -> Option<Value> {
    if raw.is_empty() {
        return None;
    }
    if let Ok(int) = raw.parse::<i64>() {
        return Some(Value::from(int));
    }
    if let Ok(uint) = raw.parse::<u64>() {
        return Some(Value::from(uint));
    }
    let float: f64 = raw.parse().ok()?;
    // from_f64 rejects NaN and the infinities
    Number::from_f64(float).map(Value::Number)
}

/// Assign `value` at `path` inside `root`, creating missing containers.
///
/// A missing container becomes a sequence when the following step is an
/// index and a mapping otherwise. A sequence is padded with empty mappings up
/// to the index about to be entered. Index steps landing on a mapping use the
/// decimal key.
///
/// On conflict returns the depth of the value that could not be descended
/// through.
pub fn set_deep(root: &mut Value, path: &[Step], value: Value) -> Result<(), usize> {
    let Some((last, init)) = path.split_last() else {
        *root = value;
        return Ok(());
    };

    let mut current = root;
    for (depth, step) in init.iter().enumerate() {
        let next = &path[depth + 1];
        let slot = child_slot(current, step).ok_or(depth)?;
        if slot.is_null() {
            *slot = match next {
                Step::Index(_) => Value::Array(Vec::new()),
                Step::Field(_) => Value::Object(Map::new()),
            };
        }
        if let (Value::Array(items), Step::Index(idx)) = (&mut *slot, next) {
            pad(items, *idx);
        }
        current = slot;
    }

    let slot = child_slot(current, last).ok_or(init.len())?;
    *slot = value;
    Ok(())
}

fn child_slot<'a>(container: &'a mut Value, step: &Step) -> Option<&'a mut Value> {
    match (container, step) {
        (Value::Object(map), step) => Some(map.entry(step.to_key()).or_insert(Value::Null)),
        (Value::Array(items), Step::Index(idx)) => {
            pad(items, *idx);
            items.get_mut(*idx)
        }
        _ => None,
    }
}

fn pad(items: &mut Vec<Value>, idx: usize) {
    while items.len() <= idx {
        items.push(Value::Object(Map::new()));
    }
}

/// Accumulates namespaced form fields into a sparse patch.
#[derive(Debug, Clone)]
pub struct PatchBuilder {
    namespace: String,
    patch: Value,
    accepted: usize,
}

impl Default for PatchBuilder {
    fn default() -> Self {
        PatchBuilder::with_namespace(PATCH_NAMESPACE)
    }
}

impl PatchBuilder {
    pub fn new() -> Self {
        PatchBuilder::default()
    }

    pub fn with_namespace(namespace: impl Into<String>) -> Self {
        PatchBuilder {
            namespace: namespace.into(),
            patch: Value::Object(Map::new()),
            accepted: 0,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Number of fields that passed the namespace filter.
    pub fn accepted(&self) -> usize {
        self.accepted
    }

    /// Add one form field. Returns `false` if the field is outside the
    /// namespace and was ignored.
    pub fn push(&mut self, field: &str, raw: &str) -> Result<bool, BuildError> {
        let Some(address) = field.strip_prefix(self.namespace.as_str()) else {
            return Ok(false);
        };
        let path_error = |source: PathError| BuildError::Path {
            field: field.to_string(),
            source,
        };
        validate_address(address).map_err(|e| path_error(e.into()))?;
        let path = parse_path(address).map_err(path_error)?;
        validate_path(&path).map_err(|e| path_error(e.into()))?;

        set_deep(&mut self.patch, &path, coerce(raw)).map_err(|depth| {
            BuildError::PathConflict {
                field: field.to_string(),
                at: format_path(&path[..depth]),
            }
        })?;
        self.accepted += 1;
        Ok(true)
    }

    pub fn extend<I, K, V>(&mut self, fields: I) -> Result<(), BuildError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (field, raw) in fields {
            self.push(field.as_ref(), raw.as_ref())?;
        }
        Ok(())
    }

    pub fn build(self) -> Value {
        self.patch
    }
}

/// Build a sparse patch from `patch.`-namespaced form fields.
pub fn build_patch<I, K, V>(fields: I) -> Result<Value, BuildError>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut builder = PatchBuilder::new();
    builder.extend(fields)?;
    Ok(builder.build())
}

/// Serialize a patch back into namespaced form fields.
///
/// Inverse of [`build_patch`] for leaves: empty containers and `null` produce
/// no field, and strings that look like numbers or booleans will be coerced
/// again when read back.
pub fn flatten_patch(patch: &Value) -> Vec<(String, String)> {
    flatten_patch_in(PATCH_NAMESPACE, patch)
}

pub fn flatten_patch_in(namespace: &str, patch: &Value) -> Vec<(String, String)> {
    let mut fields = Vec::new();
    let mut path = Vec::new();
    flatten_into(namespace, patch, &mut path, &mut fields);
    fields
}

fn flatten_into(
    namespace: &str,
    value: &Value,
    path: &mut Vec<Step>,
    fields: &mut Vec<(String, String)>,
) {
    let leaf = match value {
        Value::Object(map) => {
            for (key, child) in map {
                path.push(Step::Field(key.clone()));
                flatten_into(namespace, child, path, fields);
                path.pop();
            }
            return;
        }
        Value::Array(items) => {
            for (idx, child) in items.iter().enumerate() {
                path.push(Step::Index(idx));
                flatten_into(namespace, child, path, fields);
                path.pop();
            }
            return;
        }
        Value::Null => return,
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
    };
    if path.is_empty() {
        return;
    }
    fields.push((format!("{namespace}{}", format_path(path)), leaf));
}
