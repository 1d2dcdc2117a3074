//! Error types for the lookup crate.

use thiserror::Error;

/// Errors that can occur when evaluating lookups.
///
/// Errors are raised lazily: building a predicate never fails (except for the
/// strict constructors), and a bad operand only surfaces when a record is
/// actually evaluated against it.
#[derive(Debug, Error)]
pub enum LookupError {
    /// Operand or field value is incompatible with the operator.
    #[error("type mismatch in '{op}' lookup: expected {expected}, got {actual}")]
    TypeMismatch {
        op: &'static str,
        expected: &'static str,
        actual: &'static str,
    },

    /// Malformed compound key.
    #[error("invalid key path '{key}': {reason}")]
    InvalidPath { key: String, reason: &'static str },

    /// Invalid regular expression pattern.
    #[error("invalid regex pattern: {0}")]
    InvalidRegex(#[from] regex::Error),
}

impl LookupError {
    pub(crate) fn mismatch(op: &'static str, expected: &'static str, actual: &'static str) -> Self {
        LookupError::TypeMismatch {
            op,
            expected,
            actual,
        }
    }

    pub(crate) fn invalid_path(key: impl Into<String>, reason: &'static str) -> Self {
        LookupError::InvalidPath {
            key: key.into(),
            reason,
        }
    }
}

/// Result type for lookup operations.
pub type Result<T> = std::result::Result<T, LookupError>;
