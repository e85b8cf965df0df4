//! External resources.

use serde::{Deserialize, Serialize};
use xavyo_core::ResourceId;
use xavyo_delta::{Entity, Value};

/// Object type of resource entities.
pub const RESOURCE_TYPE: &str = "resource";

/// An external system holding shadows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub id: ResourceId,
    pub name: String,
}

impl Resource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: ResourceId::new(),
            name: name.into(),
        }
    }

    /// Entity view with a single `name` item.
    #[must_use]
    pub fn to_entity(&self) -> Entity {
        Entity::new(*self.id.as_uuid(), RESOURCE_TYPE)
            .with_item("name", vec![Value::from(self.name.as_str())])
    }
}
