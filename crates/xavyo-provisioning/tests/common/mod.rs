//! Integration test helpers for xavyo-provisioning.
//!
//! Fixtures for resources, shadows and focus objects, plus hand-written
//! collaborators: a recomputer that records what it was asked to do and a
//! repository that loses every link race.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};

use async_trait::async_trait;
use xavyo_core::{FocusId, Result, ShadowId, TaskContext};
use xavyo_delta::{MatchingRuleRegistry, Value};
use xavyo_expression::ExpressionConfig;
use xavyo_provisioning::correlation::{ConditionalFilter, CorrelationConfig};
use xavyo_provisioning::recompute::FocusRecomputer;
use xavyo_provisioning::repository::{InMemoryRepository, Repository, SearchOptions};
use xavyo_provisioning::sync::{ResourceSyncConfig, SynchronizationContext, SynchronizationEngine};
use xavyo_provisioning::{Focus, Resource, Shadow, SyncSituation};
use xavyo_query::{FilterTemplate, ObjectFilter};

static INIT: Once = Once::new();

/// Initialize logging for tests (once).
pub fn init_test_logging() {
    INIT.call_once(|| {
        if std::env::var("RUST_LOG").is_ok() {
            tracing_subscriber::fmt()
                .with_test_writer()
                .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
                .try_init()
                .ok();
        }
    });
}

pub fn ldap() -> Resource {
    Resource::new("ldap")
}

/// Account shadow with a `uid`.
pub fn account(resource: &Resource, uid: &str) -> Shadow {
    Shadow::new(resource.id, "account").with_attribute("uid", vec![Value::from(uid)])
}

/// User focus with a `name`.
pub fn user(name: &str) -> Focus {
    Focus::user().with_attribute("name", vec![Value::from(name)])
}

/// Correlate `shadow.uid` to `user.name`.
pub fn by_uid() -> ConditionalFilter {
    ConditionalFilter::new(FilterTemplate::equals_expression(
        "name".parse().expect("valid path"),
        ExpressionConfig::path("$shadow/uid"),
    ))
    .with_name("uid to name")
}

pub fn correlate_by_uid() -> ResourceSyncConfig {
    ResourceSyncConfig::default().with_correlation(CorrelationConfig::default().with_rule(by_uid()))
}

/// Engine over `repository` with a single resource and a recording recomputer.
pub fn engine(
    repository: Arc<dyn Repository>,
    resource: &Resource,
    config: ResourceSyncConfig,
) -> (SynchronizationEngine, Arc<RecordingRecomputer>) {
    let recomputer = Arc::new(RecordingRecomputer::default());
    let engine = SynchronizationEngine::builder(repository)
        .recomputer(recomputer.clone())
        .resource(resource.clone(), config)
        .build()
        .expect("valid sync configuration");
    (engine, recomputer)
}

/// Recomputer that keeps every context it receives.
#[derive(Debug, Default)]
pub struct RecordingRecomputer {
    contexts: Mutex<Vec<SynchronizationContext>>,
}

impl RecordingRecomputer {
    pub fn calls(&self) -> usize {
        self.contexts.lock().expect("recomputer lock").len()
    }

    pub fn contexts(&self) -> Vec<SynchronizationContext> {
        self.contexts.lock().expect("recomputer lock").clone()
    }
}

#[async_trait]
impl FocusRecomputer for RecordingRecomputer {
    async fn recompute(&self, context: &SynchronizationContext, _task: &TaskContext) -> Result<()> {
        self.contexts
            .lock()
            .expect("recomputer lock")
            .push(context.clone());
        Ok(())
    }
}

/// Repository where a rival focus links every shadow just before the
/// engine does, so the engine's `create_link` always loses.
pub struct RacingRepository {
    pub inner: Arc<InMemoryRepository>,
    pub rival: FocusId,
    races: AtomicUsize,
}

impl RacingRepository {
    pub async fn new(inner: Arc<InMemoryRepository>) -> Self {
        let rival = user("rival");
        let rival_id = rival.id;
        inner.insert_focus(rival).await;
        Self {
            inner,
            rival: rival_id,
            races: AtomicUsize::new(0),
        }
    }

    pub fn races(&self) -> usize {
        self.races.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Repository for RacingRepository {
    async fn search_focuses(
        &self,
        object_type: &str,
        filter: &ObjectFilter,
        matching: &MatchingRuleRegistry,
        options: &SearchOptions,
        task: &TaskContext,
    ) -> Result<Vec<Focus>> {
        self.inner
            .search_focuses(object_type, filter, matching, options, task)
            .await
    }

    async fn get_focus(&self, id: FocusId, task: &TaskContext) -> Result<Focus> {
        self.inner.get_focus(id, task).await
    }

    async fn find_owner(&self, shadow_id: ShadowId, task: &TaskContext) -> Result<Option<Focus>> {
        self.inner.find_owner(shadow_id, task).await
    }

    async fn write_situation(
        &self,
        shadow_id: ShadowId,
        situation: SyncSituation,
        task: &TaskContext,
    ) -> Result<()> {
        self.inner.write_situation(shadow_id, situation, task).await
    }

    async fn create_link(
        &self,
        focus_id: FocusId,
        shadow_id: ShadowId,
        task: &TaskContext,
    ) -> Result<()> {
        self.races.fetch_add(1, Ordering::SeqCst);
        self.inner.create_link(self.rival, shadow_id, task).await?;
        self.inner.create_link(focus_id, shadow_id, task).await
    }

    async fn remove_link(&self, shadow_id: ShadowId, task: &TaskContext) -> Result<()> {
        self.inner.remove_link(shadow_id, task).await
    }
}
