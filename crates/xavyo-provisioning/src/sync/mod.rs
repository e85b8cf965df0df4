//! Synchronization Module
//!
//! Decides what a change on an external resource means for the internal
//! identity that owns (or should own) the changed shadow.
//!
//! ## Key Components
//!
//! - [`SynchronizationEngine`] - Situation state machine for one notification
//! - [`SyncPipeline`] - Runs batches of notifications concurrently
//! - [`ResourceSyncConfig`] - Correlation, protected patterns, reactions and inbound mappings
//! - [`InboundProcessor`] - Turns shadow changes into focus deltas
//! - [`SynchronizationContext`] - Outcome handed to the recomputer
//!
//! ## Synchronization Flow
//!
//! ```text
//! ┌─────────────────┐     ┌─────────────────┐     ┌─────────────────┐
//! │  Notification   │────►│  Sync Engine    │────►│ Situation write │
//! │ (add/mod/del)   │     │                 │     │   (repository)  │
//! └─────────────────┘     └────────┬────────┘     └─────────────────┘
//!                                  │
//!         ┌────────────────────────┼────────────────────────┐
//!         ▼                        ▼                        ▼
//! ┌───────────────┐      ┌─────────────────┐      ┌─────────────────┐
//! │  Correlation  │      │    Inbound      │      │   Recomputer    │
//! │    Engine     │      │    Mappings     │      │  (LINKED only)  │
//! └───────────────┘      └─────────────────┘      └─────────────────┘
//! ```
//!
//! ## Sync Situations
//!
//! - **Linked**: Shadow is owned by a focus
//! - **Unlinked**: Shadow has an owner but the link is not confirmed yet
//! - **Unmatched**: No owner and no correlation candidate
//! - **Disputed**: Several candidates, or link reference and owner disagree
//! - **Deleted**: Shadow was deleted on the resource
//!
//! A protected shadow is never synchronized: no context is produced and no
//! situation is written.
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use xavyo_provisioning::sync::{ResourceSyncConfig, SyncPipeline, SynchronizationEngine};
//!
//! let engine = SynchronizationEngine::builder(repository)
//!     .resource(resource, ResourceSyncConfig::from_json(&json)?)
//!     .build()?;
//!
//! let pipeline = SyncPipeline::new(Arc::new(engine));
//! let summary = pipeline.process_batch(notifications, &task).await;
//! println!("Processed {} changes", summary.processed);
//! ```

pub mod change;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod inbound;
pub mod pipeline;
pub mod reaction;
pub mod types;

// Re-exports for convenience
pub use change::ChangeNotification;
pub use config::ResourceSyncConfig;
pub use context::SynchronizationContext;
pub use engine::{SynchronizationEngine, SynchronizationEngineBuilder};
pub use error::{SyncError, SyncResult};
pub use inbound::InboundProcessor;
pub use pipeline::{BatchSummary, ProcessedChange, SyncPipeline, DEFAULT_CONCURRENCY};
pub use reaction::{SyncAction, SyncReaction, SyncReactionConfig};
pub use types::{ChangeType, ProcessingStatus};

// Re-export SyncSituation from shadow module for convenience
pub use crate::shadow::SyncSituation;
