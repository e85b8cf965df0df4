//! Delta error types.

use thiserror::Error;
use uuid::Uuid;

/// Errors raised while addressing or applying deltas.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeltaError {
    /// Path could not be parsed or addressed.
    #[error("Invalid path '{path}': {message}")]
    InvalidPath { path: String, message: String },

    /// Path traverses a multi-valued or non-structured item and cannot be written.
    #[error("Ambiguous path '{path}': {message}")]
    AmbiguousPath { path: String, message: String },

    /// Matching rule name is not registered.
    #[error("Unknown matching rule: {name}")]
    UnknownMatchingRule { name: String },

    /// Delta kind does not fit the operation.
    #[error("Incompatible delta: {message}")]
    IncompatibleDelta { message: String },

    /// ADD delta applied to an object that already exists.
    #[error("Object {oid} already exists")]
    ObjectExists { oid: Uuid },

    /// MODIFY or DELETE delta applied to a missing object.
    #[error("Object {oid} does not exist")]
    ObjectMissing { oid: Uuid },
}

impl DeltaError {
    /// Create an invalid path error.
    pub fn invalid_path(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an ambiguous path error.
    pub fn ambiguous_path(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::AmbiguousPath {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an incompatible delta error.
    pub fn incompatible(message: impl Into<String>) -> Self {
        Self::IncompatibleDelta {
            message: message.into(),
        }
    }
}

/// Result type for delta operations.
pub type Result<T> = std::result::Result<T, DeltaError>;
