//! # Provisioning Engine
//!
//! Correlation and synchronization of shadows with focus objects.
//!
//! This crate provides:
//! - Shadow, focus and resource models
//! - The [`Repository`] collaborator and an in-memory implementation
//! - Correlation engine for finding the owner of an unlinked shadow
//! - Synchronization engine deciding the situation of a changed shadow
//! - Batch pipeline with per-notification outcomes
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌──────────────────┐     ┌───────────────┐
//! │  Notification   │────►│  Sync Pipeline   │────►│  Sync Engine  │
//! │                 │     │  (batch, tokio)  │     │               │
//! └─────────────────┘     └──────────────────┘     └───────┬───────┘
//!                                                          │
//!                              ┌───────────────────────────┼──────────────────────┐
//!                              ▼                           ▼                      ▼
//!                         ┌────────────┐           ┌───────────────┐       ┌─────────────┐
//!                         │ Correlation│──────────►│  Repository   │       │ Recomputer  │
//!                         │   Engine   │  search   │               │       │             │
//!                         └────────────┘           └───────────────┘       └─────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use xavyo_core::TaskContext;
//! use xavyo_delta::Value;
//! use xavyo_expression::ExpressionConfig;
//! use xavyo_provisioning::correlation::{ConditionalFilter, CorrelationConfig};
//! use xavyo_provisioning::sync::{ChangeNotification, ResourceSyncConfig, SynchronizationEngine};
//! use xavyo_provisioning::{Focus, InMemoryRepository, Resource, Shadow, SyncSituation};
//! use xavyo_query::FilterTemplate;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let repository = Arc::new(InMemoryRepository::new());
//! let jack = Focus::user().with_attribute("name", vec![Value::from("jack")]);
//! repository.insert_focus(jack.clone()).await;
//!
//! let by_uid = FilterTemplate::equals_expression(
//!     "name".parse().unwrap(),
//!     ExpressionConfig::path("$shadow/uid"),
//! );
//! let config = ResourceSyncConfig::default()
//!     .with_correlation(CorrelationConfig::default().with_rule(ConditionalFilter::new(by_uid)));
//!
//! let resource = Resource::new("ldap");
//! let engine = SynchronizationEngine::builder(repository.clone())
//!     .resource(resource.clone(), config)
//!     .build()
//!     .unwrap();
//!
//! let shadow = Shadow::new(resource.id, "account").with_attribute("uid", vec![Value::from("jack")]);
//! let context = engine
//!     .synchronize(&ChangeNotification::added(shadow), &TaskContext::new())
//!     .await
//!     .unwrap()
//!     .unwrap();
//!
//! assert_eq!(context.resolved, SyncSituation::Linked);
//! assert_eq!(context.focus_id, Some(jack.id));
//! # });
//! ```

pub mod correlation;
pub mod focus;
pub mod recompute;
pub mod repository;
pub mod resource;
pub mod shadow;
pub mod sync;

// Re-exports for convenience
pub use correlation::{ConditionalFilter, CorrelationConfig, CorrelationEngine};
pub use focus::{Focus, USER_TYPE};
pub use recompute::{FocusRecomputer, NoopRecomputer};
pub use repository::{InMemoryRepository, Repository, SearchOptions};
pub use resource::Resource;
pub use shadow::{Shadow, SyncSituation};
pub use sync::{
    BatchSummary, ChangeNotification, ProcessedChange, ResourceSyncConfig, SyncError, SyncPipeline,
    SyncResult, SynchronizationContext, SynchronizationEngine,
};
