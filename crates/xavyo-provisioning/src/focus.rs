//! Focus objects: internal identities that own shadows.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use xavyo_core::{FocusId, ShadowId};
use xavyo_delta::{DeltaError, Entity, ObjectDelta, Value};

/// Default focus type.
pub const USER_TYPE: &str = "user";

/// An internal identity record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Focus {
    pub id: FocusId,

    /// Focus type, e.g. `user`.
    pub object_type: String,

    #[serde(default)]
    pub attributes: BTreeMap<String, Vec<Value>>,

    /// Forward references to owned shadows.
    #[serde(default)]
    pub link_refs: Vec<ShadowId>,
}

impl Focus {
    pub fn new(object_type: impl Into<String>) -> Self {
        Self {
            id: FocusId::new(),
            object_type: object_type.into(),
            attributes: BTreeMap::new(),
            link_refs: Vec::new(),
        }
    }

    /// A new `user` focus.
    #[must_use]
    pub fn user() -> Self {
        Self::new(USER_TYPE)
    }

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
    pub fn owns(&self, shadow_id: ShadowId) -> bool {
        self.link_refs.contains(&shadow_id)
    }

    /// Entity view used for expressions and filters.
    #[must_use]
    pub fn to_entity(&self) -> Entity {
        let mut entity = Entity::new(*self.id.as_uuid(), self.object_type.clone());
        entity.items = self.attributes.clone();
        entity
    }

    /// Apply a MODIFY delta to the attributes.
    pub fn apply_delta(&mut self, delta: &ObjectDelta) -> Result<(), DeltaError> {
        let mut entity = self.to_entity();
        entity.apply_delta(delta)?;
        self.attributes = entity.items;
        Ok(())
    }
}
