//! Shadow Objects
//!
//! Shadows are local representations of accounts on external resources.
//! The synchronization engine classifies the relationship between a shadow
//! and its focus as a [`SyncSituation`].

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use xavyo_core::{FocusId, ResourceId, ShadowId};
use xavyo_delta::{Entity, Value};

/// Object type of shadow entities.
pub const SHADOW_TYPE: &str = "shadow";

/// Item holding the object class in the entity view of a shadow.
pub const OBJECT_CLASS_ITEM: &str = "objectClass";

/// Synchronization situation - describes the relationship between
/// a shadow and its focus object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncSituation {
    /// Shadow is linked to its owner.
    Linked,

    /// An owner is known but the link is not yet confirmed.
    Unlinked,

    /// No owner could be found.
    Unmatched,

    /// Several possible owners, or a link that contradicts the repository.
    Disputed,

    /// The account was deleted on the resource.
    Deleted,
}

impl SyncSituation {
    /// Convert to string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncSituation::Linked => "linked",
            SyncSituation::Unlinked => "unlinked",
            SyncSituation::Unmatched => "unmatched",
            SyncSituation::Disputed => "disputed",
            SyncSituation::Deleted => "deleted",
        }
    }
}

impl fmt::Display for SyncSituation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SyncSituation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "linked" => Ok(SyncSituation::Linked),
            "unlinked" => Ok(SyncSituation::Unlinked),
            "unmatched" => Ok(SyncSituation::Unmatched),
            "disputed" => Ok(SyncSituation::Disputed),
            "deleted" => Ok(SyncSituation::Deleted),
            _ => Err(format!("Unknown sync situation: {s}")),
        }
    }
}

/// A shadow object representing an account on an external resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shadow {
    /// Shadow ID.
    pub id: ShadowId,

    /// Resource the account lives on.
    pub resource_id: ResourceId,

    /// Object class on the resource.
    pub object_class: String,

    /// Attribute values as last read from the resource.
    #[serde(default)]
    pub attributes: BTreeMap<String, Vec<Value>>,

    /// Protected accounts are never synchronized.
    #[serde(default)]
    pub protected: bool,

    /// Back-reference to the owning focus.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_ref: Option<FocusId>,

    /// Last situation written by the engine.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub situation: Option<SyncSituation>,

    /// Last synchronization timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_sync_at: Option<DateTime<Utc>>,
}

impl Shadow {
    /// Create an unlinked shadow.
    pub fn new(resource_id: ResourceId, object_class: impl Into<String>) -> Self {
        Self {
            id: ShadowId::new(),
            resource_id,
            object_class: object_class.into(),
            attributes: BTreeMap::new(),
            protected: false,
            link_ref: None,
            situation: None,
            last_sync_at: None,
        }
    }

    /// Set an attribute (builder style). No values removes the attribute.
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, values: Vec<Value>) -> Self {
        let name = name.into();
        if values.is_empty() {
            self.attributes.remove(&name);
        } else {
            self.attributes.insert(name, values);
        }
        self
    }

    #[must_use]
    pub fn with_link(mut self, focus_id: FocusId) -> Self {
        self.link_ref = Some(focus_id);
        self
    }

    #[must_use]
    pub fn protected(mut self) -> Self {
        self.protected = true;
        self
    }

    /// Entity view used for expressions and filters.
    ///
    /// Attributes become top-level items; the object class is exposed as
    /// `objectClass`.
    #[must_use]
    pub fn to_entity(&self) -> Entity {
        let mut entity = Entity::new(*self.id.as_uuid(), SHADOW_TYPE);
        entity.items = self.attributes.clone();
        entity.items.insert(
            OBJECT_CLASS_ITEM.to_string(),
            vec![Value::from(self.object_class.as_str())],
        );
        entity
    }
}
