//! Inbound mappings: shadow attribute changes to focus changes.

use std::sync::Arc;

use tracing::{debug, instrument};
use xavyo_core::TaskContext;
use xavyo_delta::{MatchingRuleRegistry, ObjectDelta};
use xavyo_expression::{ExpressionFactory, Mapping, MappingConfig, VariableMap};

use super::error::SyncResult;
use crate::focus::Focus;
use crate::resource::Resource;
use crate::shadow::Shadow;

/// Compiled inbound mappings of one resource.
#[derive(Debug)]
pub struct InboundProcessor {
    mappings: Vec<Mapping>,
    matching: Arc<MatchingRuleRegistry>,
}

impl InboundProcessor {
    pub fn compile(
        configs: &[MappingConfig],
        factory: &ExpressionFactory,
        matching: Arc<MatchingRuleRegistry>,
    ) -> SyncResult<Self> {
        let mappings = configs
            .iter()
            .map(|config| Mapping::compile(config, factory))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { mappings, matching })
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    /// Compute the focus changes implied by the shadow going from `prior` to
    /// `current`.
    ///
    /// Sources read the shadow attributes; `shadow`, `focus` and `resource`
    /// are available as variables. Returns `None` when no mapping changes
    /// the focus.
    #[instrument(skip_all, fields(shadow_id = %current.id, focus_id = %focus.id))]
    pub fn process(
        &self,
        prior: Option<&Shadow>,
        current: &Shadow,
        focus: &Focus,
        resource: &Resource,
        task: &TaskContext,
    ) -> SyncResult<Option<ObjectDelta>> {
        if self.mappings.is_empty() {
            return Ok(None);
        }

        let current_entity = current.to_entity();
        let prior_entity = prior.map(Shadow::to_entity);
        let focus_entity = focus.to_entity();
        let variables = VariableMap::new()
            .with_entity("shadow", current_entity.clone())
            .with_entity("focus", focus_entity.clone())
            .with_entity("resource", resource.to_entity());
        let rule = self.matching.default_rule();

        let mut delta = ObjectDelta::modify(*focus.id.as_uuid());
        for mapping in &self.mappings {
            task.check()?;
            let Some(output) =
                mapping.evaluate_states(&variables, prior_entity.as_ref(), Some(&current_entity), task)?
            else {
                debug!(mapping = %mapping.name(), "Inbound mapping produced no output");
                continue;
            };
            let existing = focus_entity.find(mapping.target());
            if let Some(item_delta) = output.to_item_delta(&existing, rule.as_ref()) {
                delta.add_modification(item_delta)?;
            }
        }

        if delta.is_empty() {
            Ok(None)
        } else {
            debug!(items = delta.modifications().len(), "Inbound mappings changed focus");
            Ok(Some(delta))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xavyo_delta::{ItemPath, Value};
    use xavyo_expression::{ExpressionConfig, MappingStrength};

    fn path(p: &str) -> ItemPath {
        p.parse().unwrap()
    }

    fn processor(configs: &[MappingConfig]) -> InboundProcessor {
        InboundProcessor::compile(
            configs,
            &ExpressionFactory::new(),
            Arc::new(MatchingRuleRegistry::new()),
        )
        .unwrap()
    }

    #[test]
    fn test_changed_attribute_replaces_focus_value() {
        let resource = Resource::new("ldap");
        let prior = Shadow::new(resource.id, "account").with_attribute("cn", vec![Value::from("Jack")]);
        let mut current = prior.clone();
        current
            .attributes
            .insert("cn".to_string(), vec![Value::from("Jack Sparrow")]);
        let focus = Focus::user().with_attribute("fullName", vec![Value::from("Jack")]);

        let processor = processor(&[MappingConfig::as_is(path("cn"), path("fullName"))]);
        let delta = processor
            .process(Some(&prior), &current, &focus, &resource, &TaskContext::new())
            .unwrap()
            .unwrap();

        let mut updated = focus.clone();
        updated.apply_delta(&delta).unwrap();
        assert_eq!(
            updated.attributes.get("fullName"),
            Some(&vec![Value::from("Jack Sparrow")])
        );
    }

    #[test]
    fn test_weak_mapping_keeps_existing_value() {
        let resource = Resource::new("ldap");
        let shadow = Shadow::new(resource.id, "account").with_attribute("mail", vec![Value::from("j@x.org")]);
        let focus = Focus::user().with_attribute("email", vec![Value::from("jack@example.com")]);

        let processor = processor(&[
            MappingConfig::as_is(path("mail"), path("email")).with_strength(MappingStrength::Weak)
        ]);
        let delta = processor
            .process(None, &shadow, &focus, &resource, &TaskContext::new())
            .unwrap();
        assert!(delta.is_none());
    }

    #[test]
    fn test_script_mapping_sees_focus_variable() {
        let resource = Resource::new("ldap");
        let shadow = Shadow::new(resource.id, "account").with_attribute("uid", vec![Value::from("jack")]);
        let focus = Focus::user().with_attribute("name", vec![Value::from("jack")]);

        let mapping = MappingConfig::as_is(path("uid"), path("description")).with_expression(
            ExpressionConfig::script("rhai", r#"focus.name + " on " + resource.name"#),
        )
        .with_strength(MappingStrength::Strong);
        let delta = processor(&[mapping])
            .process(None, &shadow, &focus, &resource, &TaskContext::new())
            .unwrap()
            .unwrap();
        let item = delta.find_item_delta(&path("description")).unwrap();
        assert_eq!(item.values_to_add, vec![Value::from("jack on ldap")]);
    }
}
