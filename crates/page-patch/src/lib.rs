//! page-patch: sparse edits for component trees.
//!
//! A page is an ordered tree of components. Editors submit flat, dotted form
//! fields (`patch.component_data.0.props.title = "Hello"`); this crate turns
//! them into a sparse patch, keys the tree by component identity, merges the
//! patch in place and hands back a canonical tree with everything the patch
//! did not mention left untouched.
//!
//! ```
//! use page_patch::{Node, PageEditor};
//! use serde_json::json;
//!
//! let tree: Vec<Node> = serde_json::from_value(json!([
//!     {"key": "hero", "name": "hero", "props": {"title": "Welcome"}}
//! ]))
//! .unwrap();
//!
//! let editor = PageEditor::default();
//! let updated = editor
//!     .apply_form(&tree, [("patch.component_data.0.props.title", "Hello")])
//!     .unwrap();
//! assert_eq!(updated[0].prop("title"), Some(&json!("Hello")));
//! ```

pub mod align;
pub mod builder;
pub mod cli;
pub mod config;
pub mod contracts;
pub mod edit;
pub mod node;
pub mod normalize;
pub mod prune;
pub mod reconcile;

pub use align::align_patch;
pub use builder::{build_patch, coerce, flatten_patch, BuildError, PatchBuilder, PATCH_NAMESPACE};
pub use config::{ConfigError, EditorConfig};
pub use contracts::{Contract, ContractRegistry};
pub use edit::{EditError, PageEditor};
pub use node::{Children, Node, Page, Presentation};
pub use normalize::{denormalize, denormalize_all, normalize, normalize_all, NormalizeError};
pub use prune::{prune, Pruner, SENTINELS};
pub use reconcile::{merge, reconcile, ReconcileError};
