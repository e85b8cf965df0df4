//! Error Types
//!
//! Errors raised by the collaborators the synchronization engine talks to
//! (repository, recomputation, task infrastructure).
//!
//! # Example
//!
//! ```
//! use xavyo_core::{XavyoError, Result};
//!
//! fn find_focus(id: &str) -> Result<String> {
//!     if id.is_empty() {
//!         return Err(XavyoError::not_found("Focus", "<empty>"));
//!     }
//!     Ok(format!("Focus {}", id))
//! }
//!
//! assert!(find_focus("").unwrap_err().is_not_found());
//! ```

use crate::ids::TaskId;
use serde::Serialize;
use thiserror::Error;

/// Standardized collaborator error.
///
/// # Variants
///
/// - `NotFound` - a referenced object does not exist
/// - `Conflict` - a uniqueness constraint rejected the write (retryable)
/// - `Cancelled` - the task was cancelled or ran past its deadline
/// - `ValidationError` - the collaborator rejected the input
/// - `Schema` - a filter or matching rule the collaborator cannot interpret
/// - `Unavailable` - the collaborator could not be reached (retryable)
#[derive(Debug, Clone, Error, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum XavyoError {
    /// Requested object was not found.
    #[error("{resource} not found{}", id.as_ref().map(|i| format!(": {i}")).unwrap_or_default())]
    NotFound {
        /// The kind of object that was not found (e.g., "Focus", "Resource")
        resource: String,
        /// Optional identifier of the object
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<String>,
    },

    /// A concurrent writer won a uniqueness race.
    #[error("Conflict on {resource}: {message}")]
    Conflict {
        /// The kind of object the conflict happened on
        resource: String,
        /// Description of the conflict
        message: String,
    },

    /// The task was cancelled or exceeded its deadline.
    #[error("Task {task_id} cancelled")]
    Cancelled {
        /// The task that was cancelled
        task_id: TaskId,
    },

    /// Input validation failure.
    #[error("Validation error on field '{field}': {message}")]
    ValidationError {
        /// The field that failed validation
        field: String,
        /// Description of the validation failure
        message: String,
    },

    /// Malformed filter, unknown matching rule or incomparable values.
    #[error("Schema error: {message}")]
    Schema {
        /// Description of the schema problem
        message: String,
    },

    /// The collaborator is temporarily unavailable.
    #[error("Service unavailable: {message}")]
    Unavailable {
        /// Description of the outage
        message: String,
    },
}

impl XavyoError {
    /// Create a not-found error.
    pub fn not_found(resource: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: Some(id.into()),
        }
    }

    /// Create a conflict error.
    pub fn conflict(resource: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Conflict {
            resource: resource.into(),
            message: message.into(),
        }
    }

    /// Create a schema error.
    pub fn schema(message: impl Into<String>) -> Self {
        Self::Schema {
            message: message.into(),
        }
    }

    /// Create an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Check if this error is a not-found error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, XavyoError::NotFound { .. })
    }

    /// Check if this error is a uniqueness conflict.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, XavyoError::Conflict { .. })
    }

    /// Check if this error is a schema error.
    #[must_use]
    pub fn is_schema(&self) -> bool {
        matches!(self, XavyoError::Schema { .. })
    }

    /// Check if retrying the same call may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            XavyoError::Conflict { .. } | XavyoError::Unavailable { .. }
        )
    }
}

/// Type alias for Results using `XavyoError`.
pub type Result<T> = std::result::Result<T, XavyoError>;

#[cfg(test)]
mod tests {
    use super::*;

    mod not_found_tests {
        use super::*;

        #[test]
        fn test_display_without_id() {
            let error = XavyoError::NotFound {
                resource: "Focus".to_string(),
                id: None,
            };
            assert_eq!(error.to_string(), "Focus not found");
        }

        #[test]
        fn test_display_with_id() {
            let error = XavyoError::not_found("Resource", "res-123");
            assert_eq!(error.to_string(), "Resource not found: res-123");
            assert!(error.is_not_found());
            assert!(!error.is_retryable());
        }
    }

    mod conflict_tests {
        use super::*;

        #[test]
        fn test_conflict_is_retryable() {
            let error = XavyoError::conflict("Link", "shadow already owned");
            assert!(error.is_conflict());
            assert!(error.is_retryable());
            assert!(error.to_string().contains("shadow already owned"));
        }
    }

    #[test]
    fn test_cancelled_display() {
        let task_id = TaskId::new();
        let error = XavyoError::Cancelled { task_id };
        assert!(error.to_string().contains(&task_id.to_string()));
        assert!(!error.is_retryable());
    }

    #[test]
    fn test_schema_is_not_retryable() {
        let error = XavyoError::schema("Unknown matching rule: digitsOnly");
        assert!(error.is_schema());
        assert!(!error.is_retryable());
        assert_eq!(
            error.to_string(),
            "Schema error: Unknown matching rule: digitsOnly"
        );
    }

    #[test]
    fn test_serialize_tagged() {
        let error = XavyoError::unavailable("repository down");
        let json = serde_json::to_value(&error).unwrap();
        assert_eq!(json["type"], "unavailable");
        assert_eq!(json["message"], "repository down");
    }

    #[test]
    fn test_is_std_error() {
        let error = XavyoError::unavailable("x");
        let _: &dyn std::error::Error = &error;
    }
}
