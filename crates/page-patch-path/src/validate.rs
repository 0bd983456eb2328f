//! Validation functions for dotted addresses.

use thiserror::Error;

use crate::types::Step;

/// Maximum allowed address string length.
pub const MAX_ADDRESS_LENGTH: usize = 1024;

/// Maximum allowed path depth.
pub const MAX_PATH_LENGTH: usize = 256;

/// Largest index a step may carry. Deep-set pads sequences up to the index,
/// so this also bounds how many placeholders a single field can create.
pub const MAX_INDEX: usize = 10_000;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("ADDRESS_TOO_LONG")]
    AddressTooLong,
    #[error("Path too long")]
    PathTooLong,
    #[error("Index {0} exceeds the maximum of {MAX_INDEX}")]
    IndexTooLarge(usize),
    #[error("Empty path")]
    EmptyPath,
}

/// Validate a raw dotted address before parsing.
///
/// # Example
///
/// ```
/// use page_patch_path::validate_address;
///
/// validate_address("component_data.0.props.label").unwrap();
/// validate_address(&"a".repeat(2000)).unwrap_err();
/// ```
pub fn validate_address(address: &str) -> Result<(), ValidationError> {
    if address.len() > MAX_ADDRESS_LENGTH {
        return Err(ValidationError::AddressTooLong);
    }
    Ok(())
}

/// Validate a parsed path.
///
/// # Errors
///
/// Returns an error if:
/// - The path is empty (there is nothing to assign to)
/// - The path exceeds the maximum length (256 steps)
/// - An index step is larger than [`MAX_INDEX`]
pub fn validate_path(path: &[Step]) -> Result<(), ValidationError> {
    if path.is_empty() {
        return Err(ValidationError::EmptyPath);
    }
    if path.len() > MAX_PATH_LENGTH {
        return Err(ValidationError::PathTooLong);
    }
    for step in path {
        if let Step::Index(idx) = step {
            if *idx > MAX_INDEX {
                return Err(ValidationError::IndexTooLarge(*idx));
            }
        }
    }
    Ok(())
}
