//! Structural contracts.
//!
//! A contract lists the props of a node type whose value is an ordered,
//! identity-bearing sequence of entries (a navbar's links, a form's fields)
//! rather than opaque data. Only those props are keyed during normalization
//! and traversed during reconciliation; everything else is leaf data even when
//! it holds arrays or objects.
//!
//! Serialized form:
//!
//! ```json
//! { "navbar": { "structuralProps": ["navLinks"] } }
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contract {
    #[serde(default)]
    pub structural_props: Vec<String>,
}

/// Lookup from node type name to its [`Contract`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContractRegistry {
    contracts: IndexMap<String, Contract>,
}

impl Default for ContractRegistry {
    /// The built-in table.
    fn default() -> Self {
        ContractRegistry::empty()
            .with_contract("navbar", ["navLinks"])
            .with_contract("footer", ["social"])
            .with_contract("list", ["items"])
            .with_contract("form", ["fields"])
    }
}

impl ContractRegistry {
    pub fn empty() -> Self {
        ContractRegistry {
            contracts: IndexMap::new(),
        }
    }

    /// Declare (or replace) the structural props of a node type.
    pub fn with_contract<I, S>(mut self, name: impl Into<String>, props: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.contracts.insert(
            name.into(),
            Contract {
                structural_props: props.into_iter().map(Into::into).collect(),
            },
        );
        self
    }

    /// Add every contract of `other`, replacing entries with the same name.
    pub fn extend(&mut self, other: ContractRegistry) {
        self.contracts.extend(other.contracts);
    }

    pub fn contract(&self, name: &str) -> Option<&Contract> {
        self.contracts.get(name)
    }

    /// Structural props of `name`; empty for unknown node types.
    pub fn structural_props(&self, name: &str) -> &[String] {
        self.contracts
            .get(name)
            .map(|contract| contract.structural_props.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_structural(&self, name: &str, prop: &str) -> bool {
        self.structural_props(name).iter().any(|p| p == prop)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.contracts.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.contracts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contracts.is_empty()
    }
}
