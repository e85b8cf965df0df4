//! In-memory [`Repository`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;
use xavyo_core::{FocusId, Result, ShadowId, TaskContext, XavyoError};
use xavyo_delta::MatchingRuleRegistry;
use xavyo_query::ObjectFilter;

use super::{Repository, SearchOptions};
use crate::focus::Focus;
use crate::shadow::SyncSituation;

#[derive(Debug, Default)]
struct Store {
    focuses: HashMap<FocusId, Focus>,
    owners: HashMap<ShadowId, FocusId>,
    situations: HashMap<ShadowId, SyncSituation>,
}

#[derive(Debug, Default)]
struct CallCounters {
    search: AtomicUsize,
    write_situation: AtomicUsize,
    create_link: AtomicUsize,
    remove_link: AtomicUsize,
}

/// Repository backed by a map behind a [`RwLock`].
///
/// Links are unique per shadow. Call counters let tests verify which
/// collaborator calls the engine made.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    store: RwLock<Store>,
    calls: CallCounters,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a focus, registering its forward links.
    pub async fn insert_focus(&self, focus: Focus) {
        let mut store = self.store.write().await;
        for shadow_id in &focus.link_refs {
            store.owners.insert(*shadow_id, focus.id);
        }
        store.focuses.insert(focus.id, focus);
    }

    pub async fn focus(&self, id: FocusId) -> Option<Focus> {
        self.store.read().await.focuses.get(&id).cloned()
    }

    pub async fn owner_of(&self, shadow_id: ShadowId) -> Option<FocusId> {
        self.store.read().await.owners.get(&shadow_id).copied()
    }

    pub async fn situation(&self, shadow_id: ShadowId) -> Option<SyncSituation> {
        self.store.read().await.situations.get(&shadow_id).copied()
    }

    pub fn search_calls(&self) -> usize {
        self.calls.search.load(Ordering::SeqCst)
    }

    pub fn write_situation_calls(&self) -> usize {
        self.calls.write_situation.load(Ordering::SeqCst)
    }

    pub fn create_link_calls(&self) -> usize {
        self.calls.create_link.load(Ordering::SeqCst)
    }

    pub fn remove_link_calls(&self) -> usize {
        self.calls.remove_link.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn search_focuses(
        &self,
        object_type: &str,
        filter: &ObjectFilter,
        matching: &MatchingRuleRegistry,
        options: &SearchOptions,
        task: &TaskContext,
    ) -> Result<Vec<Focus>> {
        self.calls.search.fetch_add(1, Ordering::SeqCst);
        task.check()?;
        let store = self.store.read().await;
        let mut found = Vec::new();
        for focus in store.focuses.values() {
            if focus.object_type != object_type {
                continue;
            }
            if self.matches(&focus.to_entity(), filter, matching)? {
                found.push(focus.clone());
            }
        }
        found.sort_by_key(|f| f.id);
        if let Some(max) = options.max_results {
            found.truncate(max);
        }
        debug!(object_type, count = found.len(), "In-memory focus search");
        Ok(found)
    }

    async fn get_focus(&self, id: FocusId, task: &TaskContext) -> Result<Focus> {
        task.check()?;
        self.store
            .read()
            .await
            .focuses
            .get(&id)
            .cloned()
            .ok_or_else(|| XavyoError::not_found("Focus", id.to_string()))
    }

    async fn find_owner(&self, shadow_id: ShadowId, task: &TaskContext) -> Result<Option<Focus>> {
        task.check()?;
        let store = self.store.read().await;
        Ok(store
            .owners
            .get(&shadow_id)
            .and_then(|owner| store.focuses.get(owner))
            .cloned())
    }

    async fn write_situation(
        &self,
        shadow_id: ShadowId,
        situation: SyncSituation,
        task: &TaskContext,
    ) -> Result<()> {
        self.calls.write_situation.fetch_add(1, Ordering::SeqCst);
        task.check()?;
        self.store
            .write()
            .await
            .situations
            .insert(shadow_id, situation);
        Ok(())
    }

    async fn create_link(
        &self,
        focus_id: FocusId,
        shadow_id: ShadowId,
        task: &TaskContext,
    ) -> Result<()> {
        self.calls.create_link.fetch_add(1, Ordering::SeqCst);
        task.check()?;
        let mut store = self.store.write().await;
        match store.owners.get(&shadow_id) {
            Some(owner) if *owner == focus_id => return Ok(()),
            Some(owner) => {
                return Err(XavyoError::conflict(
                    "Link",
                    format!("shadow {shadow_id} is already linked to focus {owner}"),
                ))
            }
            None => {}
        }
        let focus = store
            .focuses
            .get_mut(&focus_id)
            .ok_or_else(|| XavyoError::not_found("Focus", focus_id.to_string()))?;
        focus.link_refs.push(shadow_id);
        store.owners.insert(shadow_id, focus_id);
        Ok(())
    }

    async fn remove_link(&self, shadow_id: ShadowId, task: &TaskContext) -> Result<()> {
        self.calls.remove_link.fetch_add(1, Ordering::SeqCst);
        task.check()?;
        let mut store = self.store.write().await;
        if let Some(owner) = store.owners.remove(&shadow_id) {
            if let Some(focus) = store.focuses.get_mut(&owner) {
                focus.link_refs.retain(|id| *id != shadow_id);
            }
        }
        Ok(())
    }
}
