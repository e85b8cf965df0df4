//! Common types for synchronization.

use serde::{Deserialize, Serialize};
use std::fmt;

use xavyo_delta::DeltaKind;

/// Type of change reported by a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    /// Account created.
    Add,
    /// Account modified.
    Modify,
    /// Account deleted.
    Delete,
}

impl ChangeType {
    /// Convert to string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeType::Add => "add",
            ChangeType::Modify => "modify",
            ChangeType::Delete => "delete",
        }
    }
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ChangeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "add" => Ok(ChangeType::Add),
            "modify" => Ok(ChangeType::Modify),
            "delete" => Ok(ChangeType::Delete),
            _ => Err(format!("Unknown change type: {s}")),
        }
    }
}

impl From<DeltaKind> for ChangeType {
    fn from(kind: DeltaKind) -> Self {
        match kind {
            DeltaKind::Add => ChangeType::Add,
            DeltaKind::Modify => ChangeType::Modify,
            DeltaKind::Delete => ChangeType::Delete,
        }
    }
}

/// Outcome of processing one notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStatus {
    /// Situation resolved.
    Completed,
    /// Protected shadow, nothing computed.
    Bypassed,
    /// Processing failed.
    Failed,
    /// Lost a link race; may be retried.
    Conflict,
}

impl ProcessingStatus {
    /// Convert to string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingStatus::Completed => "completed",
            ProcessingStatus::Bypassed => "bypassed",
            ProcessingStatus::Failed => "failed",
            ProcessingStatus::Conflict => "conflict",
        }
    }

    /// Check if this status allows retry.
    #[must_use]
    pub fn is_retriable(&self) -> bool {
        matches!(self, ProcessingStatus::Conflict)
    }
}

impl fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
