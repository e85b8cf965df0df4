//! Outcome of synchronizing one change notification.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use xavyo_core::{FocusId, ResourceId};
use xavyo_delta::ObjectDelta;

use super::change::ChangeNotification;
use super::reaction::SyncAction;
use crate::shadow::{Shadow, SyncSituation};

/// Request-scoped result of [`SynchronizationEngine::synchronize`].
///
/// Built once per notification and handed to the recomputer; never shared
/// between notifications.
///
/// [`SynchronizationEngine::synchronize`]: super::engine::SynchronizationEngine::synchronize
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynchronizationContext {
    pub notification_id: Uuid,
    pub shadow: Shadow,
    pub resource_id: ResourceId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,

    /// Situation before the engine acted.
    pub detected: SyncSituation,

    /// Situation after the engine acted.
    pub resolved: SyncSituation,

    /// Confirmed correlation candidates; empty when correlation did not run.
    #[serde(default)]
    pub candidates: Vec<FocusId>,

    /// Owner after resolution. For a deletion, the owner the link was removed from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focus_id: Option<FocusId>,

    /// Focus changes computed by inbound mappings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focus_delta: Option<ObjectDelta>,

    /// Reactions configured for the resolved situation.
    #[serde(default)]
    pub actions: Vec<SyncAction>,
}

impl SynchronizationContext {
    pub(crate) fn new(
        notification: &ChangeNotification,
        detected: SyncSituation,
        resolved: SyncSituation,
    ) -> Self {
        Self {
            notification_id: notification.id,
            shadow: notification.current.clone(),
            resource_id: notification.resource_id,
            channel: notification.channel.clone(),
            detected,
            resolved,
            candidates: Vec::new(),
            focus_id: None,
            focus_delta: None,
            actions: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_linked(&self) -> bool {
        self.resolved == SyncSituation::Linked
    }

    /// Only linked resolutions trigger focus recomputation.
    #[must_use]
    pub fn requires_recompute(&self) -> bool {
        self.is_linked() && self.focus_id.is_some()
    }

    #[must_use]
    pub fn situation_changed(&self) -> bool {
        self.detected != self.resolved
    }
}
