//! Synchronization engine: decides the situation of a changed shadow and
//! acts on it.
//!
//! ```text
//!  protected? ──yes──► bypass (no context, no writes)
//!      │no
//!  delete? ──yes──► DELETED → DELETED, link removed
//!      │no
//!  link ref / owner disagree? ──yes──► UNLINKED → DISPUTED
//!      │no
//!  link ref or owner? ──yes──► UNLINKED → LINKED
//!      │no
//!  correlate + confirm ──► 0: UNMATCHED, 1: LINKED, n: DISPUTED
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};
use xavyo_core::{FocusId, ResourceId, TaskContext};
use xavyo_delta::MatchingRuleRegistry;
use xavyo_expression::ExpressionFactory;
use xavyo_query::FilterTemplate;

use super::change::ChangeNotification;
use super::config::ResourceSyncConfig;
use super::context::SynchronizationContext;
use super::error::{SyncError, SyncResult};
use super::inbound::InboundProcessor;
use super::reaction::SyncReactionConfig;
use crate::correlation::{correlation_variables, CorrelationEngine};
use crate::focus::Focus;
use crate::recompute::{FocusRecomputer, NoopRecomputer};
use crate::repository::Repository;
use crate::resource::Resource;
use crate::shadow::{Shadow, SyncSituation};

/// Compiled configuration of one resource.
#[derive(Debug)]
struct ResourceBinding {
    resource: Resource,
    correlation: CorrelationEngine,
    protected: Vec<FilterTemplate>,
    reactions: SyncReactionConfig,
    inbound: InboundProcessor,
}

/// Link mutation decided by a resolution, applied after inbound processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LinkChange {
    Keep,
    Link(FocusId),
    Unlink,
}

/// Situation decision before reactions and inbound processing.
struct Resolution {
    detected: SyncSituation,
    resolved: SyncSituation,
    focus: Option<Focus>,
    focus_id: Option<FocusId>,
    candidates: Vec<FocusId>,
    link: LinkChange,
}

impl Resolution {
    fn new(detected: SyncSituation, resolved: SyncSituation) -> Self {
        Self {
            detected,
            resolved,
            focus: None,
            focus_id: None,
            candidates: Vec::new(),
            link: LinkChange::Keep,
        }
    }

    fn linked(detected: SyncSituation, focus: Focus) -> Self {
        Self {
            focus_id: Some(focus.id),
            link: LinkChange::Link(focus.id),
            focus: Some(focus),
            ..Self::new(detected, SyncSituation::Linked)
        }
    }
}

/// Processes change notifications for configured resources.
///
/// Holds only compiled configuration and shared collaborators. Independent
/// notifications may be synchronized concurrently; duplicate links are
/// rejected by the repository, not by locking here.
pub struct SynchronizationEngine {
    repository: Arc<dyn Repository>,
    recomputer: Arc<dyn FocusRecomputer>,
    factory: Arc<ExpressionFactory>,
    matching: Arc<MatchingRuleRegistry>,
    resources: HashMap<ResourceId, ResourceBinding>,
}

impl SynchronizationEngine {
    #[must_use]
    pub fn builder(repository: Arc<dyn Repository>) -> SynchronizationEngineBuilder {
        SynchronizationEngineBuilder::new(repository)
    }

    #[must_use]
    pub fn resource(&self, id: ResourceId) -> Option<&Resource> {
        self.resources.get(&id).map(|b| &b.resource)
    }

    /// Correlation engine compiled for a resource.
    #[must_use]
    pub fn correlation(&self, id: ResourceId) -> Option<&CorrelationEngine> {
        self.resources.get(&id).map(|b| &b.correlation)
    }

    #[must_use]
    pub fn repository(&self) -> &Arc<dyn Repository> {
        &self.repository
    }

    /// Synchronize one change notification.
    ///
    /// Returns `Ok(None)` when the shadow is protected; nothing is computed
    /// or written in that case, whatever the resource or task state.
    ///
    /// Repository mutations happen in a fixed order once the situation and
    /// the inbound focus delta are known: the link change, then the
    /// situation write, then recomputation. An error before the link change
    /// leaves the repository untouched. A lost link race fails before the
    /// situation is written. A recomputation error is returned after the
    /// link and the situation have been stored.
    #[instrument(
        skip(self, notification, task),
        fields(
            notification_id = %notification.id,
            shadow_id = %notification.current.id,
            change_type = %notification.change_type,
        )
    )]
    pub async fn synchronize(
        &self,
        notification: &ChangeNotification,
        task: &TaskContext,
    ) -> SyncResult<Option<SynchronizationContext>> {
        let shadow = &notification.current;
        if shadow.protected {
            debug!("Shadow is protected, synchronization bypassed");
            return Ok(None);
        }

        task.check()?;
        let binding = self.binding(notification.resource_id)?;
        if self.matches_protected_pattern(binding, shadow, task)? {
            debug!("Shadow matches a protected pattern, synchronization bypassed");
            return Ok(None);
        }

        let resolution = if notification.is_delete() {
            self.resolve_deleted(shadow, task).await?
        } else {
            self.resolve_existing(binding, shadow, task).await?
        };

        let focus_delta = match (resolution.resolved, &resolution.focus) {
            (SyncSituation::Linked, Some(focus)) => binding.inbound.process(
                notification.prior.as_ref(),
                shadow,
                focus,
                &binding.resource,
                task,
            )?,
            _ => None,
        };

        match resolution.link {
            LinkChange::Keep => {}
            LinkChange::Link(focus_id) => self.link(shadow, focus_id, task).await?,
            LinkChange::Unlink => self.repository.remove_link(shadow.id, task).await?,
        }

        self.repository
            .write_situation(shadow.id, resolution.resolved, task)
            .await?;
        info!(
            detected = %resolution.detected,
            resolved = %resolution.resolved,
            focus_id = ?resolution.focus_id,
            candidates = resolution.candidates.len(),
            "Synchronization situation resolved"
        );

        let mut context =
            SynchronizationContext::new(notification, resolution.detected, resolution.resolved);
        context.focus_id = resolution.focus_id;
        context.candidates = resolution.candidates;
        context.actions = binding.reactions.actions_for(resolution.resolved);
        context.focus_delta = focus_delta;

        if context.requires_recompute() {
            self.recomputer.recompute(&context, task).await?;
        }

        Ok(Some(context))
    }

    fn binding(&self, id: ResourceId) -> SyncResult<&ResourceBinding> {
        self.resources
            .get(&id)
            .ok_or_else(|| SyncError::not_found("Resource", id.to_string()))
    }

    fn matches_protected_pattern(
        &self,
        binding: &ResourceBinding,
        shadow: &Shadow,
        task: &TaskContext,
    ) -> SyncResult<bool> {
        if binding.protected.is_empty() {
            return Ok(false);
        }

        let variables = correlation_variables(shadow, &binding.resource);
        let entity = shadow.to_entity();
        for pattern in &binding.protected {
            let filter = pattern.bind(&self.factory, &variables, task)?;
            if filter.matches(&entity, &self.matching)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn resolve_deleted(&self, shadow: &Shadow, task: &TaskContext) -> SyncResult<Resolution> {
        let owner = match shadow.link_ref {
            Some(focus_id) => Some(focus_id),
            None => self
                .repository
                .find_owner(shadow.id, task)
                .await?
                .map(|focus| focus.id),
        };
        let mut resolution = Resolution::new(SyncSituation::Deleted, SyncSituation::Deleted);
        if owner.is_some() {
            resolution.link = LinkChange::Unlink;
        }
        resolution.focus_id = owner;
        Ok(resolution)
    }

    async fn resolve_existing(
        &self,
        binding: &ResourceBinding,
        shadow: &Shadow,
        task: &TaskContext,
    ) -> SyncResult<Resolution> {
        let owner = self.repository.find_owner(shadow.id, task).await?;

        match (shadow.link_ref, owner) {
            (Some(link_ref), Some(owner)) if owner.id != link_ref => {
                warn!(
                    link_ref = %link_ref,
                    owner = %owner.id,
                    "Shadow link reference disagrees with repository owner"
                );
                let mut resolution =
                    Resolution::new(SyncSituation::Unlinked, SyncSituation::Disputed);
                resolution.candidates = vec![link_ref, owner.id];
                Ok(resolution)
            }
            (_, Some(owner)) => Ok(Resolution::linked(SyncSituation::Unlinked, owner)),
            (Some(link_ref), None) => {
                let focus = self.repository.get_focus(link_ref, task).await?;
                Ok(Resolution::linked(SyncSituation::Unlinked, focus))
            }
            (None, None) => self.resolve_by_correlation(binding, shadow, task).await,
        }
    }

    async fn resolve_by_correlation(
        &self,
        binding: &ResourceBinding,
        shadow: &Shadow,
        task: &TaskContext,
    ) -> SyncResult<Resolution> {
        let candidates = binding
            .correlation
            .correlate(self.repository.as_ref(), shadow, &binding.resource, task)
            .await?;
        let mut confirmed = binding
            .correlation
            .confirm(candidates, shadow, &binding.resource, task)?;
        let candidate_ids: Vec<FocusId> = confirmed.iter().map(|f| f.id).collect();

        let mut resolution = match confirmed.len() {
            0 => Resolution::new(SyncSituation::Unmatched, SyncSituation::Unmatched),
            1 => Resolution::linked(SyncSituation::Unmatched, confirmed.remove(0)),
            _ => Resolution::new(SyncSituation::Unmatched, SyncSituation::Disputed),
        };
        resolution.candidates = candidate_ids;
        Ok(resolution)
    }

    async fn link(&self, shadow: &Shadow, focus_id: FocusId, task: &TaskContext) -> SyncResult<()> {
        match self.repository.create_link(focus_id, shadow.id, task).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_conflict() => {
                warn!(focus_id = %focus_id, error = %e, "Shadow was linked concurrently");
                Err(SyncError::link_conflict(shadow.id, focus_id, e.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Builder for [`SynchronizationEngine`].
pub struct SynchronizationEngineBuilder {
    repository: Arc<dyn Repository>,
    recomputer: Arc<dyn FocusRecomputer>,
    factory: ExpressionFactory,
    matching: MatchingRuleRegistry,
    resources: Vec<(Resource, ResourceSyncConfig)>,
}

impl SynchronizationEngineBuilder {
    #[must_use]
    pub fn new(repository: Arc<dyn Repository>) -> Self {
        Self {
            repository,
            recomputer: Arc::new(NoopRecomputer),
            factory: ExpressionFactory::new(),
            matching: MatchingRuleRegistry::new(),
            resources: Vec::new(),
        }
    }

    #[must_use]
    pub fn recomputer(mut self, recomputer: Arc<dyn FocusRecomputer>) -> Self {
        self.recomputer = recomputer;
        self
    }

    /// Replace the expression factory, e.g. to register custom evaluator kinds.
    #[must_use]
    pub fn expression_factory(mut self, factory: ExpressionFactory) -> Self {
        self.factory = factory;
        self
    }

    #[must_use]
    pub fn matching_rules(mut self, matching: MatchingRuleRegistry) -> Self {
        self.matching = matching;
        self
    }

    /// Configure a resource. A later call for the same resource id wins.
    #[must_use]
    pub fn resource(mut self, resource: Resource, config: ResourceSyncConfig) -> Self {
        self.resources.push((resource, config));
        self
    }

    /// Compile every resource configuration.
    pub fn build(self) -> SyncResult<SynchronizationEngine> {
        let factory = Arc::new(self.factory);
        let matching = Arc::new(self.matching);

        let mut resources = HashMap::with_capacity(self.resources.len());
        for (resource, config) in self.resources {
            let correlation =
                CorrelationEngine::compile(&config.correlation, factory.clone(), matching.clone())?;
            let inbound = InboundProcessor::compile(&config.inbound, &factory, matching.clone())?;
            debug!(
                resource = %resource.name,
                rules = config.correlation.rules.len(),
                protected = config.protected.len(),
                inbound = config.inbound.len(),
                "Compiled resource sync configuration"
            );
            resources.insert(
                resource.id,
                ResourceBinding {
                    resource,
                    correlation,
                    protected: config.protected,
                    reactions: config.reactions,
                    inbound,
                },
            );
        }

        Ok(SynchronizationEngine {
            repository: self.repository,
            recomputer: self.recomputer,
            factory,
            matching,
            resources,
        })
    }
}
