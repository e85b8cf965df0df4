//! xavyo Core Library
//!
//! Shared types used by every synchronization crate.
//!
//! # Modules
//!
//! - [`ids`] - Strongly typed identifiers (FocusId, ShadowId, ResourceId, TaskId)
//! - [`error`] - Collaborator error type (XavyoError)
//! - [`task`] - Per-call task context carrying cancellation and deadline
//!
//! # Example
//!
//! ```
//! use xavyo_core::{FocusId, ShadowId, TaskContext, XavyoError, Result};
//!
//! let focus_id = FocusId::new();
//! let shadow_id = ShadowId::new();
//! let task = TaskContext::new();
//!
//! fn lookup(id: ShadowId) -> Result<()> {
//!     Err(XavyoError::not_found("Shadow", id.to_string()))
//! }
//!
//! assert!(task.check().is_ok());
//! assert!(lookup(shadow_id).is_err());
//! # let _ = focus_id;
//! ```

pub mod error;
pub mod ids;
pub mod task;

pub use error::{Result, XavyoError};
pub use ids::{FocusId, ParseIdError, ResourceId, ShadowId, TaskId};
pub use task::TaskContext;
