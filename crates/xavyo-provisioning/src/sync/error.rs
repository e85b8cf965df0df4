//! Sync error types.

use thiserror::Error;
use xavyo_core::{FocusId, ShadowId, TaskId, XavyoError};
use xavyo_delta::DeltaError;
use xavyo_expression::ExpressionError;
use xavyo_query::FilterError;

/// Errors that can occur during synchronization.
///
/// Every error is fatal for the notification it was raised for and never
/// affects other notifications. The engine does not retry;
/// [`SyncError::is_retryable`] is a hint for the scheduler.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Malformed configuration, filter or value type.
    #[error("Schema error: {message}")]
    Schema { message: String },

    /// Expression evaluation failed.
    #[error(transparent)]
    Expression(#[from] ExpressionError),

    /// A referenced object does not exist.
    #[error("{kind} not found: {name}")]
    ObjectNotFound { kind: String, name: String },

    /// Another writer linked the shadow first.
    #[error("Link conflict for shadow {shadow_id} and focus {focus_id}: {message}")]
    LinkConflict {
        shadow_id: ShadowId,
        focus_id: FocusId,
        message: String,
    },

    /// The repository or recomputer failed.
    #[error("Repository error: {0}")]
    Repository(XavyoError),

    /// The task was cancelled or ran past its deadline.
    #[error("Synchronization cancelled for task {task_id}")]
    Cancelled { task_id: TaskId },

    /// Invalid sync configuration.
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl SyncError {
    /// Create a schema error.
    pub fn schema(message: impl Into<String>) -> Self {
        Self::Schema {
            message: message.into(),
        }
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an object-not-found error.
    pub fn not_found(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self::ObjectNotFound {
            kind: kind.into(),
            name: name.into(),
        }
    }

    /// Create a link conflict error.
    pub fn link_conflict(shadow_id: ShadowId, focus_id: FocusId, message: impl Into<String>) -> Self {
        Self::LinkConflict {
            shadow_id,
            focus_id,
            message: message.into(),
        }
    }

    /// Check if this error is retryable.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::LinkConflict { .. } => true,
            SyncError::Repository(e) => e.is_retryable(),
            _ => false,
        }
    }

    /// Check if this error indicates a link conflict.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, SyncError::LinkConflict { .. })
    }

    /// Check if this error is a schema error, including schema errors of
    /// expressions.
    #[must_use]
    pub fn is_schema(&self) -> bool {
        match self {
            SyncError::Schema { .. } => true,
            SyncError::Expression(e) => e.is_schema(),
            _ => false,
        }
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        match self {
            SyncError::Cancelled { .. } => true,
            SyncError::Expression(e) => e.is_cancelled(),
            _ => false,
        }
    }
}

impl From<XavyoError> for SyncError {
    fn from(err: XavyoError) -> Self {
        match err {
            XavyoError::Cancelled { task_id } => Self::Cancelled { task_id },
            XavyoError::NotFound { resource, id } => Self::ObjectNotFound {
                kind: resource,
                name: id.unwrap_or_default(),
            },
            XavyoError::Schema { message } => Self::Schema { message },
            other => Self::Repository(other),
        }
    }
}

impl From<FilterError> for SyncError {
    fn from(err: FilterError) -> Self {
        match err {
            FilterError::Expression(e) => Self::Expression(e),
            FilterError::Schema { message } => Self::Schema { message },
        }
    }
}

impl From<DeltaError> for SyncError {
    fn from(err: DeltaError) -> Self {
        Self::schema(err.to_string())
    }
}

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;
