//! Correlation engine.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, instrument};
use xavyo_core::TaskContext;
use xavyo_delta::MatchingRuleRegistry;
use xavyo_expression::{
    ConditionOutcome, EvaluationContext, Expression, ExpressionConfig, ExpressionFactory,
    VariableMap,
};
use xavyo_query::FilterTemplate;

use super::config::{ConditionalFilter, CorrelationConfig};
use crate::focus::Focus;
use crate::repository::{Repository, SearchOptions};
use crate::resource::Resource;
use crate::shadow::Shadow;
use crate::sync::error::SyncResult;

/// Variables visible to correlation filters and guards.
#[must_use]
pub fn correlation_variables(shadow: &Shadow, resource: &Resource) -> VariableMap {
    VariableMap::new()
        .with_entity("shadow", shadow.to_entity())
        .with_entity("resource", resource.to_entity())
}

#[derive(Debug)]
struct CompiledRule {
    label: String,
    guard: Option<Expression>,
    filter: Option<FilterTemplate>,
}

/// Correlation rules of one resource, compiled once.
///
/// Holds no mutable state; one engine serves concurrent notifications.
#[derive(Debug)]
pub struct CorrelationEngine {
    focus_type: String,
    rules: Vec<CompiledRule>,
    confirmation: Option<Expression>,
    search_options: SearchOptions,
    factory: Arc<ExpressionFactory>,
    matching: Arc<MatchingRuleRegistry>,
}

impl CorrelationEngine {
    /// Compile guards and the confirmation expression.
    pub fn compile(
        config: &CorrelationConfig,
        factory: Arc<ExpressionFactory>,
        matching: Arc<MatchingRuleRegistry>,
    ) -> SyncResult<Self> {
        let rules = config
            .rules
            .iter()
            .enumerate()
            .map(|(index, rule)| {
                Ok(CompiledRule {
                    label: rule.label(index),
                    guard: compile_optional(&factory, rule.condition.as_ref())?,
                    filter: rule.filter.clone(),
                })
            })
            .collect::<SyncResult<Vec<_>>>()?;
        let confirmation = compile_optional(&factory, config.confirmation.as_ref())?;
        let search_options = SearchOptions {
            max_results: config.max_candidates,
        };

        Ok(Self {
            focus_type: config.focus_type.clone(),
            rules,
            confirmation,
            search_options,
            factory,
            matching,
        })
    }

    #[must_use]
    pub fn focus_type(&self) -> &str {
        &self.focus_type
    }

    #[must_use]
    pub fn has_confirmation(&self) -> bool {
        self.confirmation.is_some()
    }

    /// Search for owner candidates of `shadow`.
    ///
    /// Rules run in order. A false guard, a missing filter, or a filter that
    /// binds to `None` skips the search. Results are deduplicated by focus id
    /// in first-seen order.
    #[instrument(skip_all, fields(shadow_id = %shadow.id, focus_type = %self.focus_type))]
    pub async fn correlate(
        &self,
        repository: &dyn Repository,
        shadow: &Shadow,
        resource: &Resource,
        task: &TaskContext,
    ) -> SyncResult<Vec<Focus>> {
        let variables = correlation_variables(shadow, resource);
        let mut seen = HashSet::new();
        let mut candidates = Vec::new();

        for rule in &self.rules {
            task.check()?;
            if let Some(guard) = &rule.guard {
                if !guard_passes(guard, &variables, task, &rule.label)? {
                    debug!(rule = %rule.label, "Correlation guard is false, skipping search");
                    continue;
                }
            }
            let Some(template) = &rule.filter else {
                debug!(rule = %rule.label, "Correlation rule has no filter");
                continue;
            };
            let filter = template.bind(&self.factory, &variables, task)?.simplify();
            if filter.is_none() {
                debug!(rule = %rule.label, "Correlation filter binds to none, skipping search");
                continue;
            }

            let found = repository
                .search_focuses(
                    &self.focus_type,
                    &filter,
                    &self.matching,
                    &self.search_options,
                    task,
                )
                .await?;
            debug!(rule = %rule.label, found = found.len(), "Correlation search finished");
            for focus in found {
                if seen.insert(focus.id) {
                    candidates.push(focus);
                }
            }
        }

        Ok(candidates)
    }

    /// Keep the candidates the confirmation expression accepts.
    ///
    /// The expression sees `candidate`, `shadow` and `resource` and must
    /// produce exactly one boolean per candidate. Without a confirmation
    /// expression every candidate is confirmed.
    pub fn confirm(
        &self,
        candidates: Vec<Focus>,
        shadow: &Shadow,
        resource: &Resource,
        task: &TaskContext,
    ) -> SyncResult<Vec<Focus>> {
        let Some(confirmation) = &self.confirmation else {
            return Ok(candidates);
        };

        let base = correlation_variables(shadow, resource);
        let mut confirmed = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            task.check()?;
            let variables = base.clone().with_entity("candidate", candidate.to_entity());
            let description = format!("confirmation of focus {}", candidate.id);
            let ctx = EvaluationContext::new(&variables, &[], task).with_description(&description);
            if confirmation.evaluate_single_bool(&ctx)? {
                confirmed.push(candidate);
            } else {
                debug!(focus_id = %candidate.id, "Correlation candidate not confirmed");
            }
        }
        Ok(confirmed)
    }

    /// Check one rule directly against `focus`, without a search.
    ///
    /// A false guard or a rule without a filter does not match.
    pub fn matches(
        &self,
        focus: &Focus,
        shadow: &Shadow,
        resource: &Resource,
        rule: &ConditionalFilter,
        task: &TaskContext,
    ) -> SyncResult<bool> {
        let variables = correlation_variables(shadow, resource);
        let label = rule.name.clone().unwrap_or_else(|| "correlation rule".to_string());
        if let Some(guard) = compile_optional(&self.factory, rule.condition.as_ref())? {
            if !guard_passes(&guard, &variables, task, &label)? {
                return Ok(false);
            }
        }
        let Some(template) = &rule.filter else {
            return Ok(false);
        };
        let filter = template.bind(&self.factory, &variables, task)?;
        Ok(filter.matches(&focus.to_entity(), &self.matching)?)
    }
}

fn compile_optional(
    factory: &ExpressionFactory,
    config: Option<&ExpressionConfig>,
) -> SyncResult<Option<Expression>> {
    Ok(config.map(|c| factory.compile(c)).transpose()?)
}

/// A guard passes when its value after the change contains `true`.
fn guard_passes(
    guard: &Expression,
    variables: &VariableMap,
    task: &TaskContext,
    label: &str,
) -> SyncResult<bool> {
    let ctx = EvaluationContext::new(variables, &[], task).with_description(label);
    let triple = guard.evaluate_condition(&ctx)?;
    Ok(ConditionOutcome::from_triple(&triple).new)
}

#[cfg(test)]
mod tests {
    use super::*;
    use xavyo_core::ResourceId;
    use xavyo_delta::Value;

    use crate::repository::InMemoryRepository;

    fn engine(config: &CorrelationConfig) -> CorrelationEngine {
        CorrelationEngine::compile(
            config,
            Arc::new(ExpressionFactory::new()),
            Arc::new(MatchingRuleRegistry::new()),
        )
        .unwrap()
    }

    fn by_uid() -> FilterTemplate {
        FilterTemplate::equals_expression("name".parse().unwrap(), ExpressionConfig::path("$shadow/uid"))
    }

    fn fixture() -> (Resource, Shadow) {
        let resource = Resource::new("ldap");
        let shadow = Shadow::new(resource.id, "account").with_attribute("uid", vec![Value::from("jack")]);
        (resource, shadow)
    }

    #[tokio::test]
    async fn test_rule_without_filter_yields_nothing() {
        let (resource, shadow) = fixture();
        let repo = InMemoryRepository::new();
        let engine = engine(&CorrelationConfig::default().with_rule(ConditionalFilter::default()));
        let found = engine
            .correlate(&repo, &shadow, &resource, &TaskContext::new())
            .await
            .unwrap();
        assert!(found.is_empty());
        assert_eq!(repo.search_calls(), 0);
    }

    #[tokio::test]
    async fn test_candidates_are_deduplicated() {
        let (resource, shadow) = fixture();
        let repo = InMemoryRepository::new();
        repo.insert_focus(Focus::user().with_attribute("name", vec![Value::from("jack")]))
            .await;

        let config = CorrelationConfig::default()
            .with_rule(ConditionalFilter::new(by_uid()))
            .with_rule(ConditionalFilter::new(by_uid()));
        let found = engine(&config)
            .correlate(&repo, &shadow, &resource, &TaskContext::new())
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(repo.search_calls(), 2);
    }

    #[tokio::test]
    async fn test_filter_binding_to_none_skips_search() {
        let (resource, _) = fixture();
        let shadow = Shadow::new(resource.id, "account");
        let repo = InMemoryRepository::new();
        let config = CorrelationConfig::default().with_rule(ConditionalFilter::new(
            by_uid().with_no_value(xavyo_query::NoValueInterpretation::None),
        ));
        let found = engine(&config)
            .correlate(&repo, &shadow, &resource, &TaskContext::new())
            .await
            .unwrap();
        assert!(found.is_empty());
        assert_eq!(repo.search_calls(), 0);
    }

    #[test]
    fn test_confirm_requires_single_boolean() {
        let (resource, shadow) = fixture();
        let config = CorrelationConfig::default()
            .with_confirmation(ExpressionConfig::literal(vec![Value::from(true), Value::from(false)]));
        let err = engine(&config)
            .confirm(vec![Focus::user()], &shadow, &resource, &TaskContext::new())
            .unwrap_err();
        assert!(matches!(err, crate::sync::error::SyncError::Expression(_)));
    }

    #[test]
    fn test_confirm_filters_candidates() {
        let (resource, shadow) = fixture();
        let config = CorrelationConfig::default().with_confirmation(ExpressionConfig::script(
            "rhai",
            "candidate.name == shadow.uid",
        ));
        let jack = Focus::user().with_attribute("name", vec![Value::from("jack")]);
        let will = Focus::user().with_attribute("name", vec![Value::from("will")]);
        let confirmed = engine(&config)
            .confirm(vec![jack.clone(), will], &shadow, &resource, &TaskContext::new())
            .unwrap();
        assert_eq!(confirmed, vec![jack]);
    }

    #[test]
    fn test_matches_in_memory() {
        let (resource, shadow) = fixture();
        let engine = engine(&CorrelationConfig::default());
        let jack = Focus::user().with_attribute("name", vec![Value::from("jack")]);
        let task = TaskContext::new();

        let rule = ConditionalFilter::new(by_uid());
        assert!(engine.matches(&jack, &shadow, &resource, &rule, &task).unwrap());

        let guarded = rule.clone().with_condition(ExpressionConfig::constant(false));
        assert!(!engine.matches(&jack, &shadow, &resource, &guarded, &task).unwrap());

        let empty = ConditionalFilter::default();
        assert!(!engine.matches(&jack, &shadow, &resource, &empty, &task).unwrap());

        let other = Shadow::new(ResourceId::new(), "account")
            .with_attribute("uid", vec![Value::from("will")]);
        assert!(!engine.matches(&jack, &other, &resource, &rule, &task).unwrap());
    }
}
