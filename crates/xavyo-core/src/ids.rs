//! Strongly Typed Identifiers
//!
//! Newtype identifiers for the objects the synchronization engine moves
//! between: focuses, shadows, resources and tasks. Mixing them up is a
//! compile error.
//!
//! # Example
//!
//! ```
//! use xavyo_core::{FocusId, ShadowId};
//!
//! let focus = FocusId::new();
//! let shadow = ShadowId::new();
//!
//! fn requires_shadow(id: ShadowId) -> String {
//!     id.to_string()
//! }
//!
//! let result = requires_shadow(shadow);
//! // requires_shadow(focus); // This would not compile!
//! # let _ = (focus, result);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

/// Error type for ID parsing failures
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    /// The type of ID that failed to parse
    pub id_type: &'static str,
    /// The underlying UUID parse error message
    pub message: String,
}

impl Display for ParseIdError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Failed to parse {}: {}", self.id_type, self.message)
    }
}

impl std::error::Error for ParseIdError {}

/// Macro to define a strongly-typed ID type
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random ID using UUID v4.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates an ID from an existing UUID.
            #[must_use]
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns a reference to the underlying UUID.
            #[must_use]
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                Uuid::parse_str(s)
                    .map(Self)
                    .map_err(|e| ParseIdError {
                        id_type: stringify!($name),
                        message: e.to_string(),
                    })
            }
        }
    };
}

define_id!(
    /// Identifier of a focus object (an internal identity such as a user).
    ///
    /// # Example
    ///
    /// ```
    /// use xavyo_core::FocusId;
    /// use uuid::Uuid;
    ///
    /// let uuid = Uuid::new_v4();
    /// let focus_id = FocusId::from_uuid(uuid);
    /// assert_eq!(focus_id.as_uuid(), &uuid);
    /// ```
    FocusId
);

define_id!(
    /// Identifier of a shadow, the internal mirror of one resource object.
    ShadowId
);

define_id!(
    /// Identifier of an external resource (a directory, database, or SaaS application).
    ResourceId
);

define_id!(
    /// Identifier of the task (live sync, reconciliation, import) a call runs under.
    TaskId
);

#[cfg(test)]
mod tests {
    use super::*;

    mod focus_id_tests {
        use super::*;

        #[test]
        fn test_new_creates_valid_id() {
            let id = FocusId::new();
            let id_str = id.to_string();
            // UUID format: 8-4-4-4-12 hex digits
            assert_eq!(id_str.len(), 36);
            assert!(id_str.contains('-'));
        }

        #[test]
        fn test_from_uuid_preserves_value() {
            let uuid = Uuid::new_v4();
            let id = FocusId::from_uuid(uuid);
            assert_eq!(id.as_uuid(), &uuid);
        }

        #[test]
        fn test_default_creates_new_id() {
            assert_ne!(FocusId::default(), FocusId::default());
        }
    }

    mod serde_tests {
        use super::*;

        #[test]
        fn test_shadow_id_serde_roundtrip() {
            let original = ShadowId::new();
            let json = serde_json::to_string(&original).unwrap();
            let deserialized: ShadowId = serde_json::from_str(&json).unwrap();
            assert_eq!(original, deserialized);
        }

        #[test]
        fn test_serializes_as_plain_string() {
            let uuid = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap();
            let id = ResourceId::from_uuid(uuid);
            let json = serde_json::to_string(&id).unwrap();
            assert_eq!(json, "\"550e8400-e29b-41d4-a716-446655440000\"");
        }
    }

    mod from_str_tests {
        use super::*;

        #[test]
        fn test_parse_valid_uuid() {
            let id: ShadowId = "550e8400-e29b-41d4-a716-446655440000".parse().unwrap();
            assert_eq!(id.to_string(), "550e8400-e29b-41d4-a716-446655440000");
        }

        #[test]
        fn test_parse_invalid_uuid_returns_error() {
            let result: std::result::Result<ResourceId, _> = "not-a-uuid".parse();
            let err = result.unwrap_err();
            assert_eq!(err.id_type, "ResourceId");
            assert!(err.to_string().contains("Failed to parse"));
        }
    }

    #[test]
    fn test_ids_order_by_uuid() {
        let low = TaskId::from_uuid(Uuid::from_u128(1));
        let high = TaskId::from_uuid(Uuid::from_u128(2));
        assert!(low < high);
    }
}
