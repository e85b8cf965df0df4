//! Expression error types.

use thiserror::Error;
use xavyo_core::{TaskId, XavyoError};
use xavyo_delta::DeltaError;

/// Errors that can occur while compiling or evaluating expressions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpressionError {
    /// Malformed configuration or a value of the wrong type.
    #[error("Schema error: {message}")]
    Schema { message: String },

    /// Unresolved variable, script failure or unexpected result shape.
    #[error("Expression evaluation error: {message}")]
    Evaluation { message: String },

    /// A referenced object (value policy, script backend, ...) does not exist.
    #[error("{kind} not found: {name}")]
    ObjectNotFound { kind: String, name: String },

    /// The task was cancelled or ran past its deadline.
    #[error("Evaluation cancelled for task {task_id}")]
    Cancelled { task_id: TaskId },
}

impl ExpressionError {
    /// Create a schema error.
    pub fn schema(message: impl Into<String>) -> Self {
        Self::Schema {
            message: message.into(),
        }
    }

    /// Create an evaluation error.
    pub fn evaluation(message: impl Into<String>) -> Self {
        Self::Evaluation {
            message: message.into(),
        }
    }

    /// Create an object-not-found error.
    pub fn object_not_found(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self::ObjectNotFound {
            kind: kind.into(),
            name: name.into(),
        }
    }

    #[must_use]
    pub fn is_schema(&self) -> bool {
        matches!(self, ExpressionError::Schema { .. })
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ExpressionError::Cancelled { .. })
    }
}

impl From<DeltaError> for ExpressionError {
    fn from(err: DeltaError) -> Self {
        Self::schema(err.to_string())
    }
}

impl From<XavyoError> for ExpressionError {
    fn from(err: XavyoError) -> Self {
        match err {
            XavyoError::Cancelled { task_id } => Self::Cancelled { task_id },
            XavyoError::NotFound { resource, id } => Self::ObjectNotFound {
                kind: resource,
                name: id.unwrap_or_default(),
            },
            other => Self::evaluation(other.to_string()),
        }
    }
}

/// Result type for expression operations.
pub type Result<T> = std::result::Result<T, ExpressionError>;
