//! Type definitions for dotted addresses.

use std::fmt;

/// A step in a dotted address.
///
/// Either a field name (object key) or an index (array position). A segment
/// made only of ASCII digits is always an index; field names can never be
/// purely numeric.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Step {
    Field(String),
    Index(usize),
}

/// A parsed dotted address.
pub type Path = Vec<Step>;

impl Step {
    pub fn is_index(&self) -> bool {
        matches!(self, Step::Index(_))
    }

    pub fn as_field(&self) -> Option<&str> {
        match self {
            Step::Field(name) => Some(name),
            Step::Index(_) => None,
        }
    }

    pub fn as_index(&self) -> Option<usize> {
        match self {
            Step::Index(idx) => Some(*idx),
            Step::Field(_) => None,
        }
    }

    /// The key this step uses when it lands on an object.
    ///
    /// An index step addressing an object becomes its decimal string, the
    /// same way `patch.0.key` produces `{"0": {"key": ..}}`.
    pub fn to_key(&self) -> String {
        match self {
            Step::Field(name) => name.clone(),
            Step::Index(idx) => idx.to_string(),
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Field(name) => f.write_str(name),
            Step::Index(idx) => write!(f, "{idx}"),
        }
    }
}

impl From<&str> for Step {
    fn from(name: &str) -> Self {
        Step::Field(name.to_string())
    }
}

impl From<String> for Step {
    fn from(name: String) -> Self {
        Step::Field(name)
    }
}

impl From<usize> for Step {
    fn from(idx: usize) -> Self {
        Step::Index(idx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_accessors() {
        let field = Step::from("label");
        assert!(!field.is_index());
        assert_eq!(field.as_field(), Some("label"));
        assert_eq!(field.as_index(), None);

        let index = Step::from(3usize);
        assert!(index.is_index());
        assert_eq!(index.as_index(), Some(3));
        assert_eq!(index.as_field(), None);
    }

    #[test]
    fn test_step_to_key() {
        assert_eq!(Step::Index(0).to_key(), "0");
        assert_eq!(Step::Field("props".into()).to_key(), "props");
    }

    #[test]
    fn test_step_display() {
        assert_eq!(Step::Index(12).to_string(), "12");
        assert_eq!(Step::Field("navLinks".into()).to_string(), "navLinks");
    }
}
