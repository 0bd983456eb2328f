//! Logic behind the `page-patch` binary.
//!
//! The binary stays thin: it reads stdin, picks a subcommand and prints what
//! these functions return.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::config::ConfigError;
use crate::contracts::ContractRegistry;
use crate::edit::{EditError, PageEditor};
use crate::node::{Children, Node, Page, CHILDREN_FIELD};
use crate::normalize::{normalize_all, NormalizeError};

#[derive(Debug, Error)]
pub enum CliError {
    #[error("failed to read input: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Edit(#[from] EditError),
    #[error(transparent)]
    Normalize(#[from] NormalizeError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("invalid form fields: {0}")]
    Fields(String),
}

/// Parse submitted form fields.
///
/// Accepts either an object (`{"patch.a": "1"}`) or an array of pairs
/// (`[["patch.a", "1"]]`). Non-string values are passed on as their JSON
/// text, so `3` and `"3"` coerce the same way. `null` is an empty field.
pub fn parse_fields(json: &str) -> Result<Vec<(String, String)>, CliError> {
    match serde_json::from_str::<Value>(json)? {
        Value::Object(map) => Ok(map
            .into_iter()
            .map(|(name, value)| (name, field_text(value)))
            .collect()),
        Value::Array(pairs) => pairs
            .into_iter()
            .enumerate()
            .map(|(idx, pair)| match pair {
                Value::Array(mut pair) if pair.len() == 2 => {
                    let value = pair.pop().map(field_text).unwrap_or_default();
                    match pair.pop() {
                        Some(Value::String(name)) => Ok((name, value)),
                        _ => Err(CliError::Fields(format!("pair {idx} has no string name"))),
                    }
                }
                _ => Err(CliError::Fields(format!("entry {idx} is not a [name, value] pair"))),
            })
            .collect(),
        _ => Err(CliError::Fields(
            "expected an object or an array of pairs".into(),
        )),
    }
}

fn field_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Apply form fields to a document and return the new canonical document.
///
/// `doc_json` is either a page object or a bare array of nodes; the output has
/// the same shape.
pub fn apply_form_fields(
    doc_json: &str,
    fields_json: &str,
    editor: &PageEditor,
) -> Result<String, CliError> {
    let fields = parse_fields(fields_json)?;
    let doc: Value = serde_json::from_str(doc_json)?;
    let out = match doc {
        Value::Array(_) => {
            let tree: Vec<Node> = serde_json::from_value(doc)?;
            serde_json::to_value(editor.apply_form(&tree, fields)?)?
        }
        _ => {
            let page: Page = serde_json::from_value(doc)?;
            serde_json::to_value(editor.apply_to_page(page, fields)?)?
        }
    };
    Ok(serde_json::to_string_pretty(&out)?)
}

/// Print the keyed working form of a document.
pub fn normalize_document(doc_json: &str, contracts: &ContractRegistry) -> Result<String, CliError> {
    let doc: Value = serde_json::from_str(doc_json)?;
    let out = match doc {
        Value::Array(_) => {
            let tree: Vec<Node> = serde_json::from_value(doc)?;
            keyed_value(normalize_all(tree, contracts)?)?
        }
        _ => {
            let page: Page = serde_json::from_value(doc)?;
            let mut meta: Map<String, Value> = page.meta;
            let children = normalize_all(page.component_data, contracts)?;
            meta.insert(CHILDREN_FIELD.to_string(), keyed_value(children)?);
            Value::Object(meta)
        }
    };
    Ok(serde_json::to_string_pretty(&out)?)
}

fn keyed_value(children: Children) -> Result<Value, CliError> {
    Ok(serde_json::to_value(children)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const DOC: &str = r#"{
        "_id": "p1",
        "slug": "home",
        "component_data": [
            {"key": "nav", "name": "navbar", "props": {"navLinks": [
                {"key": "home", "label": "Home"},
                {"key": "about", "label": "About"}
            ]}}
        ]
    }"#;

    #[test]
    fn test_parse_fields_object() {
        let fields = parse_fields(r#"{"patch.a": "x", "patch.b": 3, "patch.c": null}"#).unwrap();
        assert_eq!(
            fields,
            vec![
                ("patch.a".to_string(), "x".to_string()),
                ("patch.b".to_string(), "3".to_string()),
                ("patch.c".to_string(), String::new()),
            ]
        );
    }

    #[test]
    fn test_parse_fields_pairs() {
        let fields = parse_fields(r#"[["patch.a", "1"], ["patch.a", "2"]]"#).unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[1], ("patch.a".to_string(), "2".to_string()));
    }

    #[test]
    fn test_parse_fields_rejects_bad_input() {
        assert!(matches!(parse_fields("[[1, 2]]"), Err(CliError::Fields(_))));
        assert!(matches!(parse_fields("[\"a\"]"), Err(CliError::Fields(_))));
        assert!(matches!(parse_fields("\"a\""), Err(CliError::Fields(_))));
        assert!(matches!(parse_fields("{"), Err(CliError::Json(_))));
    }

    #[test]
    fn test_apply_form_fields_page() {
        let editor = PageEditor::default();
        let out = apply_form_fields(
            DOC,
            r#"{"patch.component_data.0.props.navLinks.1.label": "Team"}"#,
            &editor,
        )
        .unwrap();
        let out: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(out["slug"], json!("home"));
        assert_eq!(
            out["component_data"][0]["props"]["navLinks"],
            json!([{"key": "home", "label": "Home"}, {"key": "about", "label": "Team"}])
        );
    }

    #[test]
    fn test_apply_form_fields_bare_tree() {
        let editor = PageEditor::default();
        let out = apply_form_fields(
            r#"[{"key": "hero", "name": "hero"}]"#,
            r#"{"patch.component_data.0.variant": "split"}"#,
            &editor,
        )
        .unwrap();
        let out: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(out, json!([{"key": "hero", "name": "hero", "variant": "split"}]));
    }

    #[test]
    fn test_normalize_document() {
        let out = normalize_document(DOC, &ContractRegistry::default()).unwrap();
        let out: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(out["_id"], json!("p1"));
        assert_eq!(
            out["component_data"]["nav"]["props"]["navLinks"]["about"],
            json!({"key": "about", "label": "About"})
        );
    }
}
