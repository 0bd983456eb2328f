//! Dotted address utilities for serialized form fields.
//!
//! Editor widgets name their inputs after the location of the value they edit,
//! e.g. `component_data.2.props.fields.0.label`. This crate turns such an
//! address into a list of [`Step`]s and back.
//!
//! # Example
//!
//! ```
//! use page_patch_path::{format_path, get, parse_path, Step};
//!
//! let path = parse_path("component_data.0.props.label").unwrap();
//! assert_eq!(path[1], Step::Index(0));
//! assert_eq!(format_path(&path), "component_data.0.props.label");
//!
//! let doc = serde_json::json!({"component_data": [{"props": {"label": "Hi"}}]});
//! assert_eq!(get(&doc, &path), Some(&serde_json::json!("Hi")));
//! ```

use serde_json::Value;
use thiserror::Error;

pub mod types;
pub use types::{Path, Step};

pub mod validate;
pub use validate::{
    validate_address, validate_path, ValidationError, MAX_ADDRESS_LENGTH, MAX_INDEX,
    MAX_PATH_LENGTH,
};

/// Separator between address segments.
pub const SEPARATOR: char = '.';

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("INVALID_INDEX: {0}")]
    InvalidIndex(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Check if a segment consists only of ASCII digits.
///
/// # Example
///
/// ```
/// use page_patch_path::is_index_segment;
///
/// assert!(is_index_segment("0"));
/// assert!(is_index_segment("007"));
/// assert!(!is_index_segment("-1"));
/// assert!(!is_index_segment("1.5"));
/// assert!(!is_index_segment(""));
/// ```
pub fn is_index_segment(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
}

/// Parse a single segment into a [`Step`].
pub fn parse_step(segment: &str) -> Result<Step, PathError> {
    if is_index_segment(segment) {
        let idx = segment
            .parse()
            .map_err(|_| PathError::InvalidIndex(segment.to_string()))?;
        Ok(Step::Index(idx))
    } else {
        Ok(Step::Field(segment.to_string()))
    }
}

/// Parse a dotted address into steps.
///
/// There is no escaping: every `.` separates two segments, and an all-digit
/// segment is always an index.
///
/// # Errors
///
/// Returns [`PathError::InvalidIndex`] when an all-digit segment does not fit
/// in a `usize`.
///
/// # Example
///
/// ```
/// use page_patch_path::{parse_path, Step};
///
/// assert_eq!(
///     parse_path("fields.2.label").unwrap(),
///     vec![Step::Field("fields".into()), Step::Index(2), Step::Field("label".into())]
/// );
/// ```
pub fn parse_path(address: &str) -> Result<Path, PathError> {
    address.split(SEPARATOR).map(parse_step).collect()
}

/// Format steps back into a dotted address.
///
/// # Example
///
/// ```
/// use page_patch_path::{format_path, Step};
///
/// assert_eq!(format_path(&[]), "");
/// assert_eq!(format_path(&[Step::Field("items".into()), Step::Index(1)]), "items.1");
/// ```
pub fn format_path(path: &[Step]) -> String {
    let mut out = String::new();
    for (i, step) in path.iter().enumerate() {
        if i > 0 {
            out.push(SEPARATOR);
        }
        match step {
            Step::Field(name) => out.push_str(name),
            Step::Index(idx) => out.push_str(&idx.to_string()),
        }
    }
    out
}

/// Get a value from a JSON document by path.
///
/// Index steps address arrays by position and objects by their decimal key.
/// Returns `None` if the path doesn't exist.
pub fn get<'a>(val: &'a Value, path: &[Step]) -> Option<&'a Value> {
    let mut current = val;
    for step in path {
        current = match (current, step) {
            (Value::Array(arr), Step::Index(idx)) => arr.get(*idx)?,
            (Value::Object(map), step) => map.get(&step.to_key())?,
            _ => return None,
        };
    }
    Some(current)
}
