//! Task Context
//!
//! Every engine call runs on behalf of a task supplied by the external
//! scheduler (live sync, reconciliation, import). The task context is
//! threaded through every blocking collaborator call so a cancelled or
//! overdue task stops at the next checkpoint.

use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use crate::error::{Result, XavyoError};
use crate::ids::TaskId;

/// Cancellation and deadline carried through a single engine invocation.
#[derive(Debug, Clone)]
pub struct TaskContext {
    task_id: TaskId,
    channel: Option<String>,
    cancellation: CancellationToken,
    deadline: Option<Instant>,
}

impl TaskContext {
    /// Create a context for a fresh task with no deadline.
    #[must_use]
    pub fn new() -> Self {
        Self {
            task_id: TaskId::new(),
            channel: None,
            cancellation: CancellationToken::new(),
            deadline: None,
        }
    }

    /// Create a context bound to an existing cancellation token.
    #[must_use]
    pub fn with_token(task_id: TaskId, cancellation: CancellationToken) -> Self {
        Self {
            task_id,
            channel: None,
            cancellation,
            deadline: None,
        }
    }

    /// Set a deadline relative to now.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some(Instant::now() + timeout);
        self
    }

    /// Set the source channel (e.g. "live_sync", "reconciliation").
    #[must_use]
    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = Some(channel.into());
        self
    }

    #[must_use]
    pub fn task_id(&self) -> TaskId {
        self.task_id
    }

    #[must_use]
    pub fn channel(&self) -> Option<&str> {
        self.channel.as_deref()
    }

    /// The token collaborators can select on.
    #[must_use]
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Cancel the task. Clones of this context observe the cancellation.
    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    /// True when cancelled or past the deadline.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled() || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Checkpoint: fail with `XavyoError::Cancelled` if the task must stop.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            return Err(XavyoError::Cancelled {
                task_id: self.task_id,
            });
        }
        Ok(())
    }
}

impl Default for TaskContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_context_is_active() {
        let task = TaskContext::new();
        assert!(!task.is_cancelled());
        assert!(task.check().is_ok());
        assert!(task.channel().is_none());
    }

    #[test]
    fn test_cancel_is_observed_by_clones() {
        let task = TaskContext::new().with_channel("live_sync");
        let clone = task.clone();
        task.cancel();
        assert!(clone.is_cancelled());
        assert!(matches!(
            clone.check(),
            Err(XavyoError::Cancelled { task_id }) if task_id == task.task_id()
        ));
        assert_eq!(clone.channel(), Some("live_sync"));
    }

    #[test]
    fn test_expired_deadline_cancels() {
        let task = TaskContext::new().with_timeout(Duration::ZERO);
        assert!(task.is_cancelled());
    }

    #[tokio::test]
    async fn test_external_token_cancellation() {
        let token = CancellationToken::new();
        let task = TaskContext::with_token(TaskId::new(), token.clone());
        let handle = tokio::spawn(async move {
            token.cancel();
        });
        handle.await.unwrap();
        assert!(task.is_cancelled());
    }
}
