//! Repository collaborator.
//!
//! Storage is external to the engine. The engine reaches it only through
//! [`Repository`]; every call receives the task context so the store can
//! give up once the task is cancelled.

pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use xavyo_core::{FocusId, Result, ShadowId, TaskContext, XavyoError};
use xavyo_delta::{Entity, MatchingRuleRegistry};
use xavyo_query::{FilterError, ObjectFilter};

use crate::focus::Focus;
use crate::shadow::SyncSituation;

pub use memory::InMemoryRepository;

/// Options of a focus search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchOptions {
    /// Upper bound on returned objects.
    pub max_results: Option<usize>,
}

impl SearchOptions {
    #[must_use]
    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = Some(max_results);
        self
    }
}

/// Store of focus objects, links and shadow situations.
///
/// `create_link` must reject a second owner for the same shadow with
/// [`XavyoError::Conflict`]; the engine relies on it instead of locking.
#[async_trait]
pub trait Repository: Send + Sync {
    /// Focus objects of `object_type` matching `filter`.
    ///
    /// Value nodes naming a matching rule resolve it in `matching`, the
    /// registry the engine was built with.
    async fn search_focuses(
        &self,
        object_type: &str,
        filter: &ObjectFilter,
        matching: &MatchingRuleRegistry,
        options: &SearchOptions,
        task: &TaskContext,
    ) -> Result<Vec<Focus>>;

    /// Match an entity against a bound filter without a search.
    fn matches(
        &self,
        entity: &Entity,
        filter: &ObjectFilter,
        matching: &MatchingRuleRegistry,
    ) -> Result<bool> {
        filter.matches(entity, matching).map_err(filter_error)
    }

    /// Load a focus; missing is `NotFound`.
    async fn get_focus(&self, id: FocusId, task: &TaskContext) -> Result<Focus>;

    /// Focus holding a forward reference to the shadow.
    async fn find_owner(&self, shadow_id: ShadowId, task: &TaskContext) -> Result<Option<Focus>>;

    /// Record the situation on the shadow.
    async fn write_situation(
        &self,
        shadow_id: ShadowId,
        situation: SyncSituation,
        task: &TaskContext,
    ) -> Result<()>;

    /// Link a shadow to a focus. Linking to the current owner again is a no-op.
    async fn create_link(
        &self,
        focus_id: FocusId,
        shadow_id: ShadowId,
        task: &TaskContext,
    ) -> Result<()>;

    /// Remove the link of a shadow, if any.
    async fn remove_link(&self, shadow_id: ShadowId, task: &TaskContext) -> Result<()>;
}

/// Collaborator view of a filter failure.
pub fn filter_error(err: FilterError) -> XavyoError {
    if err.is_schema() {
        XavyoError::schema(err.to_string())
    } else {
        XavyoError::ValidationError {
            field: "filter".to_string(),
            message: err.to_string(),
        }
    }
}
