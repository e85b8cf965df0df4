//! Downstream recomputation collaborator.
//!
//! A LINKED resolution hands the synchronization context to a
//! [`FocusRecomputer`], which applies the inbound focus delta and
//! recomputes the identity. Recomputation itself lives outside this crate.

use async_trait::async_trait;
use tracing::debug;
use xavyo_core::{Result, TaskContext};

use crate::sync::context::SynchronizationContext;

/// Receives contexts that resolved to LINKED.
#[async_trait]
pub trait FocusRecomputer: Send + Sync {
    async fn recompute(&self, context: &SynchronizationContext, task: &TaskContext) -> Result<()>;
}

/// Recomputer that only logs the request.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRecomputer;

#[async_trait]
impl FocusRecomputer for NoopRecomputer {
    async fn recompute(&self, context: &SynchronizationContext, _task: &TaskContext) -> Result<()> {
        debug!(
            shadow_id = %context.shadow.id,
            focus_id = ?context.focus_id,
            "Recompute requested, no recomputer configured"
        );
        Ok(())
    }
}
