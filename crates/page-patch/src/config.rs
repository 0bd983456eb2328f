//! Editor configuration.
//!
//! ```toml
//! namespace = "patch."
//! sentinels = ["", "none", "normal", "rounded", "center"]
//! builtin_contracts = true
//!
//! [contracts.gallery]
//! structuralProps = ["images"]
//! ```
//!
//! Every field is optional. Contracts listed here are added on top of the
//! built-in table unless `builtin_contracts = false`.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::builder::PATCH_NAMESPACE;
use crate::contracts::ContractRegistry;
use crate::prune::{Pruner, SENTINELS};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid editor config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Prefix of form fields that carry patch data.
    pub namespace: String,
    /// Leaf values treated as unset.
    pub sentinels: Vec<String>,
    /// Start from the built-in structural contracts.
    pub builtin_contracts: bool,
    pub contracts: ContractRegistry,
}

impl Default for EditorConfig {
    fn default() -> Self {
        EditorConfig {
            namespace: PATCH_NAMESPACE.to_string(),
            sentinels: SENTINELS.iter().map(|s| s.to_string()).collect(),
            builtin_contracts: true,
            contracts: ContractRegistry::empty(),
        }
    }
}

impl EditorConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// The effective contract table.
    pub fn registry(&self) -> ContractRegistry {
        if self.builtin_contracts {
            let mut registry = ContractRegistry::default();
            registry.extend(self.contracts.clone());
            registry
        } else {
            self.contracts.clone()
        }
    }

    pub fn pruner(&self) -> Pruner {
        Pruner::new(self.sentinels.iter().cloned())
    }
}
