//! Filter error types.

use thiserror::Error;
use xavyo_delta::DeltaError;
use xavyo_expression::ExpressionError;

/// Errors that can occur while binding or matching filters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    /// Malformed filter, unknown matching rule or incomparable values.
    #[error("Filter schema error: {message}")]
    Schema { message: String },

    /// An embedded expression failed.
    #[error(transparent)]
    Expression(#[from] ExpressionError),
}

impl FilterError {
    /// Create a schema error.
    pub fn schema(message: impl Into<String>) -> Self {
        Self::Schema {
            message: message.into(),
        }
    }

    /// True for schema errors, including schema errors of embedded expressions.
    #[must_use]
    pub fn is_schema(&self) -> bool {
        match self {
            FilterError::Schema { .. } => true,
            FilterError::Expression(e) => e.is_schema(),
        }
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, FilterError::Expression(e) if e.is_cancelled())
    }
}

impl From<DeltaError> for FilterError {
    fn from(err: DeltaError) -> Self {
        Self::schema(err.to_string())
    }
}

/// Result type for filter operations.
pub type Result<T> = std::result::Result<T, FilterError>;
