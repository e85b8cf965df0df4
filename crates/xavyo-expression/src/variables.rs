//! Variables and sources bound into an expression evaluation.
//!
//! Variables are static roots such as `shadow`, `focus` or `resource`.
//! Sources are the changing inputs of a mapping: a path, its old values and
//! the pending delta.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map as JsonMap};
use xavyo_delta::{DeltaSetTriple, Entity, ItemDelta, ItemPath, MatchingRule, Value};

use crate::context::EvaluationState;

/// Value bound to a variable name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum VariableValue {
    Entity(Entity),
    Values(Vec<Value>),
}

impl VariableValue {
    /// Values at `path` below this variable. The empty path yields the
    /// variable's own values (none for an entity).
    #[must_use]
    pub fn resolve(&self, path: &ItemPath) -> Vec<Value> {
        match self {
            VariableValue::Entity(entity) => entity.find(path),
            VariableValue::Values(values) => xavyo_delta::value::descend(values, path.segments()),
        }
    }

    /// JSON form handed to script backends.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            VariableValue::Entity(entity) => entity_to_json(entity),
            VariableValue::Values(values) => values_to_json(values),
        }
    }
}

/// Named variables of one evaluation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableMap {
    variables: BTreeMap<String, VariableValue>,
}

impl VariableMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: VariableValue) {
        self.variables.insert(name.into(), value);
    }

    pub fn insert_entity(&mut self, name: impl Into<String>, entity: Entity) {
        self.insert(name, VariableValue::Entity(entity));
    }

    pub fn insert_values(&mut self, name: impl Into<String>, values: Vec<Value>) {
        self.insert(name, VariableValue::Values(values));
    }

    #[must_use]
    pub fn with_entity(mut self, name: impl Into<String>, entity: Entity) -> Self {
        self.insert_entity(name, entity);
        self
    }

    #[must_use]
    pub fn with_values(mut self, name: impl Into<String>, values: Vec<Value>) -> Self {
        self.insert_values(name, values);
        self
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&VariableValue> {
        self.variables.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &VariableValue)> {
        self.variables.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.variables.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}

/// A changing input of an expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    /// Name the source is bound to in scripts and `$name` paths.
    pub name: String,
    /// Path the values were read from.
    pub path: ItemPath,
    /// Values before the change.
    pub old_values: Vec<Value>,
    /// Pending change, if any.
    pub delta: Option<ItemDelta>,
}

impl Source {
    /// Source whose values do not change.
    pub fn unchanged(name: impl Into<String>, path: ItemPath, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            path,
            old_values: values,
            delta: None,
        }
    }

    /// Source read from the prior and current state of the same object.
    ///
    /// Without a prior state every current value is treated as added.
    pub fn from_states(
        name: impl Into<String>,
        path: ItemPath,
        prior: Option<&Entity>,
        current: Option<&Entity>,
    ) -> Self {
        let old = prior.map(|e| e.find(&path)).unwrap_or_default();
        let new = current.map(|e| e.find(&path)).unwrap_or_default();
        let triple = DeltaSetTriple::from_old_new(&old, &new, |a, b| a == b);
        let delta = if triple.has_changes() {
            let (_, plus, minus) = triple.into_parts();
            Some(ItemDelta::add(path.clone(), plus).with_delete(minus))
        } else {
            None
        };
        Self {
            name: name.into(),
            path,
            old_values: old,
            delta,
        }
    }

    #[must_use]
    pub fn has_changes(&self) -> bool {
        self.delta.as_ref().is_some_and(|d| !d.is_empty())
    }

    /// Zero/plus/minus view of the source.
    #[must_use]
    pub fn triple(&self, rule: &dyn MatchingRule) -> DeltaSetTriple<Value> {
        match &self.delta {
            Some(delta) => delta.to_triple(&self.old_values, rule),
            None => DeltaSetTriple::zero_only(self.old_values.clone()),
        }
    }

    /// Values visible in the given evaluation state.
    #[must_use]
    pub fn values(&self, state: EvaluationState, rule: &dyn MatchingRule) -> Vec<Value> {
        match (state, &self.delta) {
            (EvaluationState::Old, _) | (_, None) => self.old_values.clone(),
            (EvaluationState::New | EvaluationState::Delta, Some(delta)) => {
                delta.apply_to(&self.old_values, rule)
            }
        }
    }
}

/// JSON view of an entity: `oid`, `object_type` and one key per item.
#[must_use]
pub fn entity_to_json(entity: &Entity) -> serde_json::Value {
    let mut map = JsonMap::new();
    map.insert("oid".to_string(), json!(entity.oid.to_string()));
    map.insert("object_type".to_string(), json!(entity.object_type));
    for (name, values) in &entity.items {
        map.insert(name.clone(), values_to_json(values));
    }
    serde_json::Value::Object(map)
}

/// JSON view of a value collection: no value is `null`, one value is the
/// value itself, several values are an array.
#[must_use]
pub fn values_to_json(values: &[Value]) -> serde_json::Value {
    let mut converted: Vec<serde_json::Value> = values.iter().map(value_to_json).collect();
    match converted.len() {
        0 => serde_json::Value::Null,
        1 => converted.remove(0),
        _ => serde_json::Value::Array(converted),
    }
}

fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Structured(map) => {
            let mut object = JsonMap::new();
            for (name, values) in map {
                object.insert(name.clone(), values_to_json(values));
            }
            serde_json::Value::Object(object)
        }
        Value::PolyString(p) => json!(p.orig),
        other => serde_json::to_value(other).unwrap_or(serde_json::Value::Null),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;
    use xavyo_delta::matching::BuiltinRule;
    use xavyo_delta::PolyString;

    fn path(p: &str) -> ItemPath {
        p.parse().unwrap()
    }

    #[test]
    fn test_source_from_states() {
        let oid = Uuid::new_v4();
        let prior = Entity::new(oid, "shadow").with_item("mail", vec![Value::from("old@x")]);
        let current = Entity::new(oid, "shadow").with_item("mail", vec![Value::from("new@x")]);

        let source = Source::from_states("mail", path("mail"), Some(&prior), Some(&current));
        assert!(source.has_changes());
        let triple = source.triple(&BuiltinRule::Default);
        assert_eq!(triple.plus(), &[Value::from("new@x")]);
        assert_eq!(triple.minus(), &[Value::from("old@x")]);
        assert_eq!(
            source.values(EvaluationState::Old, &BuiltinRule::Default),
            vec![Value::from("old@x")]
        );
        assert_eq!(
            source.values(EvaluationState::New, &BuiltinRule::Default),
            vec![Value::from("new@x")]
        );
    }

    #[test]
    fn test_source_without_prior_is_all_plus() {
        let current = Entity::new(Uuid::new_v4(), "shadow").with_item("cn", vec![Value::from("jack")]);
        let source = Source::from_states("cn", path("cn"), None, Some(&current));
        let triple = source.triple(&BuiltinRule::Default);
        assert!(triple.zero().is_empty());
        assert_eq!(triple.plus(), &[Value::from("jack")]);
    }

    #[test]
    fn test_unchanged_source() {
        let source = Source::unchanged("cn", path("cn"), vec![Value::from("jack")]);
        assert!(!source.has_changes());
        assert_eq!(source.triple(&BuiltinRule::Default).zero(), &[Value::from("jack")]);
    }

    #[test]
    fn test_entity_to_json_shapes() {
        let entity = Entity::new(Uuid::nil(), "shadow")
            .with_item("cn", vec![Value::from(PolyString::new("Jack"))])
            .with_item("group", vec![Value::from("a"), Value::from("b")]);
        let json = entity_to_json(&entity);
        assert_eq!(json["cn"], "Jack");
        assert_eq!(json["group"], json!(["a", "b"]));
        assert_eq!(json["object_type"], "shadow");
    }

    #[test]
    fn test_variable_resolution() {
        let entity = Entity::new(Uuid::nil(), "focus").with_item("name", vec![Value::from("jack")]);
        let vars = VariableMap::new()
            .with_entity("focus", entity)
            .with_values("extra", vec![Value::from(1)]);
        assert_eq!(vars.len(), 2);
        assert_eq!(
            vars.get("focus").unwrap().resolve(&path("name")),
            vec![Value::from("jack")]
        );
        assert_eq!(
            vars.get("extra").unwrap().resolve(&ItemPath::root()),
            vec![Value::from(1)]
        );
    }
}
