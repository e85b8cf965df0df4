//! Change notifications.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use xavyo_core::ResourceId;

use super::types::ChangeType;
use crate::shadow::Shadow;

/// A change reported for one shadow.
///
/// For deletions `current` is the last known representation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeNotification {
    /// Unique ID for this notification.
    pub id: Uuid,
    pub change_type: ChangeType,
    /// Representation after the change.
    pub current: Shadow,
    /// Representation before the change, when the resource reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prior: Option<Shadow>,
    pub resource_id: ResourceId,
    /// Channel the change arrived through, e.g. `live_sync` or `reconciliation`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    pub detected_at: DateTime<Utc>,
}

impl ChangeNotification {
    pub fn new(change_type: ChangeType, current: Shadow) -> Self {
        Self {
            id: Uuid::new_v4(),
            change_type,
            resource_id: current.resource_id,
            current,
            prior: None,
            channel: None,
            detected_at: Utc::now(),
        }
    }

    /// Account created on the resource.
    pub fn added(shadow: Shadow) -> Self {
        Self::new(ChangeType::Add, shadow)
    }

    /// Account modified on the resource.
    pub fn modified(prior: Shadow, current: Shadow) -> Self {
        Self::new(ChangeType::Modify, current).with_prior(prior)
    }

    /// Account deleted on the resource.
    pub fn deleted(shadow: Shadow) -> Self {
        Self::new(ChangeType::Delete, shadow)
    }

    #[must_use]
    pub fn with_prior(mut self, prior: Shadow) -> Self {
        self.prior = Some(prior);
        self
    }

    #[must_use]
    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = Some(channel.into());
        self
    }

    #[must_use]
    pub fn is_delete(&self) -> bool {
        self.change_type == ChangeType::Delete
    }
}
