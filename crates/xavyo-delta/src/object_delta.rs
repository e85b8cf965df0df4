//! Object delta: whole-object add, modify or delete.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::Entity;
use crate::error::{DeltaError, Result};
use crate::item_delta::ItemDelta;
use crate::matching::BuiltinRule;
use crate::path::ItemPath;

/// Kind of an [`ObjectDelta`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeltaKind {
    Add,
    Modify,
    Delete,
}

impl DeltaKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            DeltaKind::Add => "add",
            DeltaKind::Modify => "modify",
            DeltaKind::Delete => "delete",
        }
    }
}

impl fmt::Display for DeltaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Change of a whole object.
///
/// A MODIFY delta holds at most one [`ItemDelta`] per path;
/// [`add_modification`](Self::add_modification) merges deltas for a path
/// already present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "change_type", rename_all = "snake_case")]
pub enum ObjectDelta {
    Add {
        object: Entity,
    },
    Modify {
        oid: Uuid,
        #[serde(default)]
        modifications: Vec<ItemDelta>,
    },
    Delete {
        oid: Uuid,
    },
}

impl ObjectDelta {
    #[must_use]
    pub fn add(object: Entity) -> Self {
        Self::Add { object }
    }

    /// Empty MODIFY delta.
    #[must_use]
    pub fn modify(oid: Uuid) -> Self {
        Self::Modify {
            oid,
            modifications: Vec::new(),
        }
    }

    #[must_use]
    pub fn delete(oid: Uuid) -> Self {
        Self::Delete { oid }
    }

    #[must_use]
    pub fn kind(&self) -> DeltaKind {
        match self {
            ObjectDelta::Add { .. } => DeltaKind::Add,
            ObjectDelta::Modify { .. } => DeltaKind::Modify,
            ObjectDelta::Delete { .. } => DeltaKind::Delete,
        }
    }

    #[must_use]
    pub fn oid(&self) -> Uuid {
        match self {
            ObjectDelta::Add { object } => object.oid,
            ObjectDelta::Modify { oid, .. } | ObjectDelta::Delete { oid } => *oid,
        }
    }

    #[must_use]
    pub fn is_add(&self) -> bool {
        matches!(self, ObjectDelta::Add { .. })
    }

    #[must_use]
    pub fn is_delete(&self) -> bool {
        matches!(self, ObjectDelta::Delete { .. })
    }

    /// Record an item change.
    ///
    /// MODIFY deltas merge it with any delta already present for the path.
    /// ADD deltas apply it to the carried object. DELETE deltas reject it.
    pub fn add_modification(&mut self, delta: ItemDelta) -> Result<()> {
        let rule = BuiltinRule::Default;
        match self {
            ObjectDelta::Modify { modifications, .. } => {
                match modifications.iter_mut().find(|m| m.path == delta.path) {
                    Some(existing) => existing.merge(delta, &rule),
                    None => modifications.push(delta),
                }
                Ok(())
            }
            ObjectDelta::Add { object } => object.apply_item_delta(&delta, &rule),
            ObjectDelta::Delete { oid } => Err(DeltaError::incompatible(format!(
                "cannot modify object {oid} scheduled for deletion"
            ))),
        }
    }

    /// Item delta recorded for `path`, if any.
    #[must_use]
    pub fn find_item_delta(&self, path: &ItemPath) -> Option<&ItemDelta> {
        match self {
            ObjectDelta::Modify { modifications, .. } => {
                modifications.iter().find(|m| &m.path == path)
            }
            _ => None,
        }
    }

    #[must_use]
    pub fn modifications(&self) -> &[ItemDelta] {
        match self {
            ObjectDelta::Modify { modifications, .. } => modifications,
            _ => &[],
        }
    }

    /// True for a MODIFY delta without effective modifications.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            ObjectDelta::Modify { modifications, .. } => modifications.iter().all(ItemDelta::is_empty),
            _ => false,
        }
    }

    /// Apply to the current state of the object (`None` when it does not exist).
    pub fn apply_to(&self, current: Option<Entity>) -> Result<Option<Entity>> {
        match (self, current) {
            (ObjectDelta::Add { object }, None) => Ok(Some(object.clone())),
            (ObjectDelta::Add { object }, Some(_)) => Err(DeltaError::ObjectExists { oid: object.oid }),
            (ObjectDelta::Modify { oid, .. }, None) | (ObjectDelta::Delete { oid }, None) => {
                Err(DeltaError::ObjectMissing { oid: *oid })
            }
            (ObjectDelta::Modify { .. }, Some(mut entity)) => {
                entity.apply_delta(self)?;
                Ok(Some(entity))
            }
            (ObjectDelta::Delete { .. }, Some(_)) => Ok(None),
        }
    }
}
