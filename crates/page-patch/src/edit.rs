//! Save pipeline.
//!
//! Turns a submitted editor form into the next canonical tree:
//!
//! 1. build the sparse patch from `patch.`-namespaced fields,
//! 2. prune placeholder values,
//! 3. align positional fragments to node keys,
//! 4. normalize a private copy of the canonical tree,
//! 5. reconcile,
//! 6. denormalize.
//!
//! Persisting the result is left to the caller.

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use crate::align::align_patch;
use crate::builder::{BuildError, PatchBuilder};
use crate::config::EditorConfig;
use crate::contracts::ContractRegistry;
use crate::node::{Node, Page, CHILDREN_FIELD};
use crate::normalize::{denormalize_all, normalize_all, NormalizeError};
use crate::prune::Pruner;
use crate::reconcile::{merge_map, reconcile, ReconcileError};

/// Page-level fields a patch may never touch.
pub const PROTECTED_PAGE_FIELDS: [&str; 2] = ["_id", "slug"];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EditError {
    #[error(transparent)]
    Build(#[from] BuildError),
    #[error(transparent)]
    Normalize(#[from] NormalizeError),
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
}

#[derive(Debug, Clone)]
pub struct PageEditor {
    namespace: String,
    contracts: ContractRegistry,
    pruner: Pruner,
}

impl Default for PageEditor {
    fn default() -> Self {
        PageEditor::new(&EditorConfig::default())
    }
}

impl PageEditor {
    pub fn new(config: &EditorConfig) -> Self {
        PageEditor {
            namespace: config.namespace.clone(),
            contracts: config.registry(),
            pruner: config.pruner(),
        }
    }

    pub fn contracts(&self) -> &ContractRegistry {
        &self.contracts
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Build the raw sparse patch for a set of form fields.
    pub fn build_patch<I, K, V>(&self, fields: I) -> Result<Value, BuildError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut builder = PatchBuilder::with_namespace(self.namespace.as_str());
        builder.extend(fields)?;
        debug!(fields = builder.accepted(), "built sparse patch");
        Ok(builder.build())
    }

    /// Apply submitted form fields to a canonical tree.
    pub fn apply_form<I, K, V>(&self, tree: &[Node], fields: I) -> Result<Vec<Node>, EditError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let patch = self.build_patch(fields)?;
        self.apply_patch(tree, &patch)
    }

    /// Apply a sparse patch (positional or keyed) to a canonical tree.
    ///
    /// `tree` is not modified; the result is a new canonical tree.
    pub fn apply_patch(&self, tree: &[Node], patch: &Value) -> Result<Vec<Node>, EditError> {
        let pruned = self.pruner.prune(patch);
        let aligned = align_patch(tree, &pruned, &self.contracts);

        let mut working = normalize_all(tree.to_vec(), &self.contracts)?;
        if let Some(fragment) = aligned.get(CHILDREN_FIELD) {
            reconcile(&mut working, fragment, &self.contracts)?;
        }
        Ok(denormalize_all(working, &self.contracts))
    }

    /// Apply submitted form fields to a whole page document.
    ///
    /// Page-level patch fields (`seo`, `route`, ..) are merged into the page
    /// metadata when the page already has them. `_id` and `slug` are never
    /// changed, and a patch cannot add new metadata fields.
    pub fn apply_to_page<I, K, V>(&self, page: Page, fields: I) -> Result<Page, EditError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let patch = self.build_patch(fields)?;
        let component_data = self.apply_patch(&page.component_data, &patch)?;

        let mut meta = page.meta;
        if let Value::Object(mut page_patch) = self.pruner.prune(&patch) {
            page_patch.remove(CHILDREN_FIELD);
            for field in PROTECTED_PAGE_FIELDS {
                if page_patch.remove(field).is_some() {
                    debug!(field, "ignoring patch for protected page field");
                }
            }
            let page_patch: Map<String, Value> = page_patch
                .into_iter()
                .filter(|(field, _)| {
                    let known = meta.contains_key(field);
                    if !known {
                        debug!(field = %field, "ignoring patch for unknown page field");
                    }
                    known
                })
                .collect();
            merge_map(&mut meta, &page_patch)?;
        }

        Ok(Page {
            component_data,
            meta,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tree() -> Vec<Node> {
        serde_json::from_value(json!([
            {"key": "hero", "name": "hero", "variant": "split", "props": {"title": "Welcome"}},
            {"key": "faq", "name": "list", "props": {"items": [
                {"key": "q1", "text": "First"},
                {"key": "q2", "text": "Second"}
            ]}}
        ]))
        .unwrap()
    }

    #[test]
    fn test_apply_form() {
        let editor = PageEditor::default();
        let updated = editor
            .apply_form(
                &tree(),
                [
                    ("patch.component_data.0.props.title", "Hello"),
                    ("patch.component_data.0.variant", "none"),
                    ("patch.component_data.1.props.items.1.text", "Updated"),
                    ("csrf", "token"),
                ],
            )
            .unwrap();
        assert_eq!(
            serde_json::to_value(&updated).unwrap(),
            json!([
                {"key": "hero", "name": "hero", "variant": "split", "props": {"title": "Hello"}},
                {"key": "faq", "name": "list", "props": {"items": [
                    {"key": "q1", "text": "First"},
                    {"key": "q2", "text": "Updated"}
                ]}}
            ])
        );
    }

    #[test]
    fn test_input_tree_untouched() {
        let editor = PageEditor::default();
        let original = tree();
        let before = serde_json::to_string(&original).unwrap();
        editor
            .apply_form(&original, [("patch.component_data.0.props.title", "Changed")])
            .unwrap();
        assert_eq!(serde_json::to_string(&original).unwrap(), before);
    }

    #[test]
    fn test_duplicate_keys_reported() {
        let editor = PageEditor::default();
        let tree = vec![Node::new("a", "hero"), Node::new("a", "hero")];
        let err = editor.apply_form(&tree, [("patch.component_data.0.variant", "x")]).unwrap_err();
        assert!(matches!(err, EditError::Normalize(NormalizeError::DuplicateKey { .. })));
    }

    #[test]
    fn test_build_error_reported() {
        let editor = PageEditor::default();
        let err = editor
            .apply_form(&tree(), [("patch.a", "1"), ("patch.a.b", "2")])
            .unwrap_err();
        assert!(matches!(err, EditError::Build(BuildError::PathConflict { .. })));
    }

    #[test]
    fn test_apply_to_page() {
        let editor = PageEditor::default();
        let page: Page = serde_json::from_value(json!({
            "_id": "abc",
            "slug": "home",
            "seo": {"title": "Old", "description": "Keep"},
            "component_data": tree()
        }))
        .unwrap();
        let page = editor
            .apply_to_page(
                page,
                [
                    ("patch.seo.title", "New"),
                    ("patch.slug", "hijack"),
                    ("patch.component_data.0.props.title", "Hi"),
                ],
            )
            .unwrap();
        assert_eq!(page.meta.get("slug"), Some(&json!("home")));
        assert_eq!(page.meta.get("_id"), Some(&json!("abc")));
        assert_eq!(page.meta.get("seo"), Some(&json!({"title": "New", "description": "Keep"})));
        assert_eq!(page.component_data[0].prop("title"), Some(&json!("Hi")));
    }

    #[test]
    fn test_page_patch_cannot_add_metadata() {
        let editor = PageEditor::default();
        let page: Page = serde_json::from_value(json!({
            "_id": "abc",
            "seo": {"title": "Old"},
            "component_data": tree()
        }))
        .unwrap();
        let meta = page.meta.clone();
        let page = editor
            .apply_to_page(page, [("patch.0.key", ""), ("patch.draft", "yes")])
            .unwrap();
        assert_eq!(page.meta, meta);
    }
}
