//! Sync pipeline for processing batches of change notifications.

use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use std::sync::Arc;

use xavyo_core::{FocusId, ShadowId, TaskContext};

use super::change::ChangeNotification;
use super::context::SynchronizationContext;
use super::engine::SynchronizationEngine;
use super::error::{SyncError, SyncResult};
use super::types::ProcessingStatus;
use crate::shadow::SyncSituation;

/// Notifications synchronized at the same time by default.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Result of processing a single notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedChange {
    pub notification_id: Uuid,
    pub shadow_id: ShadowId,
    /// Processing status.
    pub status: ProcessingStatus,
    /// Situations, absent for bypassed and failed notifications.
    pub detected: Option<SyncSituation>,
    pub resolved: Option<SyncSituation>,
    /// Owner after resolution (if any).
    pub focus_id: Option<FocusId>,
    /// Error message (if failed).
    pub error: Option<String>,
    /// Whether the scheduler may retry the notification.
    pub retryable: bool,
}

impl ProcessedChange {
    /// Create a successful result.
    #[must_use]
    pub fn success(context: &SynchronizationContext) -> Self {
        Self {
            notification_id: context.notification_id,
            shadow_id: context.shadow.id,
            status: ProcessingStatus::Completed,
            detected: Some(context.detected),
            resolved: Some(context.resolved),
            focus_id: context.focus_id,
            error: None,
            retryable: false,
        }
    }

    /// Create a result for a protected shadow.
    #[must_use]
    pub fn bypassed(notification: &ChangeNotification) -> Self {
        Self {
            notification_id: notification.id,
            shadow_id: notification.current.id,
            status: ProcessingStatus::Bypassed,
            detected: None,
            resolved: None,
            focus_id: None,
            error: None,
            retryable: false,
        }
    }

    /// Create a failed result. Link conflicts get their own status.
    #[must_use]
    pub fn failed(notification_id: Uuid, shadow_id: ShadowId, error: &SyncError) -> Self {
        let status = if error.is_conflict() {
            ProcessingStatus::Conflict
        } else {
            ProcessingStatus::Failed
        };
        Self {
            notification_id,
            shadow_id,
            status,
            detected: None,
            resolved: None,
            focus_id: None,
            error: Some(error.to_string()),
            retryable: error.is_retryable(),
        }
    }

    fn aborted(notification_id: Uuid, shadow_id: ShadowId, message: String) -> Self {
        Self {
            notification_id,
            shadow_id,
            status: ProcessingStatus::Failed,
            detected: None,
            resolved: None,
            focus_id: None,
            error: Some(message),
            retryable: false,
        }
    }

    fn from_result(
        notification: &ChangeNotification,
        result: SyncResult<Option<SynchronizationContext>>,
    ) -> Self {
        match result {
            Ok(Some(context)) => Self::success(&context),
            Ok(None) => Self::bypassed(notification),
            Err(e) => {
                warn!(
                    notification_id = %notification.id,
                    shadow_id = %notification.current.id,
                    error = %e,
                    retryable = e.is_retryable(),
                    "Synchronization failed"
                );
                Self::failed(notification.id, notification.current.id, &e)
            }
        }
    }
}

/// Summary of a batch processing run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Number of notifications processed.
    pub processed: usize,
    /// Number of successful notifications.
    pub succeeded: usize,
    /// Number of failed notifications.
    pub failed: usize,
    /// Number of link conflicts.
    pub conflicts: usize,
    /// Number of protected shadows skipped.
    pub bypassed: usize,
    /// Per-notification results, in input order.
    pub results: Vec<ProcessedChange>,
}

impl BatchSummary {
    /// Create a new empty summary.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a processed change to the summary.
    pub fn add(&mut self, result: ProcessedChange) {
        self.processed += 1;
        match result.status {
            ProcessingStatus::Completed => self.succeeded += 1,
            ProcessingStatus::Failed => self.failed += 1,
            ProcessingStatus::Conflict => self.conflicts += 1,
            ProcessingStatus::Bypassed => self.bypassed += 1,
        }
        self.results.push(result);
    }

    /// Notifications the scheduler may retry.
    pub fn retryable(&self) -> impl Iterator<Item = &ProcessedChange> {
        self.results.iter().filter(|r| r.retryable)
    }
}

/// Runs batches of notifications through a [`SynchronizationEngine`].
///
/// Each notification is synchronized independently; a failure is recorded
/// in its [`ProcessedChange`] and never stops the rest of the batch.
#[derive(Clone)]
pub struct SyncPipeline {
    engine: Arc<SynchronizationEngine>,
    concurrency: usize,
}

impl SyncPipeline {
    /// Create a new sync pipeline.
    #[must_use]
    pub fn new(engine: Arc<SynchronizationEngine>) -> Self {
        Self {
            engine,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    /// Number of notifications synchronized at the same time, at least one.
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    #[must_use]
    pub fn engine(&self) -> &Arc<SynchronizationEngine> {
        &self.engine
    }

    /// Process a batch of notifications.
    #[instrument(skip_all, fields(batch_size = notifications.len(), concurrency = self.concurrency))]
    pub async fn process_batch(
        &self,
        notifications: Vec<ChangeNotification>,
        task: &TaskContext,
    ) -> BatchSummary {
        let keys: Vec<(Uuid, ShadowId)> = notifications
            .iter()
            .map(|n| (n.id, n.current.id))
            .collect();
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut workers = JoinSet::new();

        for (index, notification) in notifications.into_iter().enumerate() {
            let engine = self.engine.clone();
            let semaphore = semaphore.clone();
            let task = task.clone();
            workers.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                let result = engine.synchronize(&notification, &task).await;
                (index, ProcessedChange::from_result(&notification, result))
            });
        }

        let mut slots: Vec<Option<ProcessedChange>> = vec![None; keys.len()];
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok((index, processed)) => slots[index] = Some(processed),
                Err(e) => error!(error = %e, "Synchronization worker aborted"),
            }
        }

        let mut summary = BatchSummary::new();
        for (slot, (notification_id, shadow_id)) in slots.into_iter().zip(keys) {
            summary.add(slot.unwrap_or_else(|| {
                ProcessedChange::aborted(
                    notification_id,
                    shadow_id,
                    "synchronization worker aborted".to_string(),
                )
            }));
        }

        info!(
            processed = summary.processed,
            succeeded = summary.succeeded,
            failed = summary.failed,
            conflicts = summary.conflicts,
            bypassed = summary.bypassed,
            "Sync batch processed"
        );
        summary
    }
}
