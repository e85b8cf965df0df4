//! Generic attribute container for focuses and shadows.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{DeltaError, Result};
use crate::item_delta::ItemDelta;
use crate::matching::{BuiltinRule, MatchingRule};
use crate::object_delta::ObjectDelta;
use crate::path::ItemPath;
use crate::triple::DeltaSetTriple;
use crate::value::{descend, Value};

/// An object as a map of multi-valued items.
///
/// Nested items are reached through [`Value::Structured`] values, e.g.
/// `extension/address/city`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub oid: Uuid,
    pub object_type: String,
    #[serde(default)]
    pub items: BTreeMap<String, Vec<Value>>,
}

impl Entity {
    pub fn new(oid: Uuid, object_type: impl Into<String>) -> Self {
        Self {
            oid,
            object_type: object_type.into(),
            items: BTreeMap::new(),
        }
    }

    /// Builder-style top-level item setter.
    #[must_use]
    pub fn with_item(mut self, name: impl Into<String>, values: Vec<Value>) -> Self {
        let name = name.into();
        if values.is_empty() {
            self.items.remove(&name);
        } else {
            self.items.insert(name, values);
        }
        self
    }

    /// Values at `path`. Missing items and missing intermediates yield an empty list.
    #[must_use]
    pub fn find(&self, path: &ItemPath) -> Vec<Value> {
        let Some((first, rest)) = path.segments().split_first() else {
            return Vec::new();
        };
        match self.items.get(first) {
            Some(values) => descend(values, rest),
            None => Vec::new(),
        }
    }

    /// First value at `path`.
    #[must_use]
    pub fn first(&self, path: &ItemPath) -> Option<Value> {
        self.find(path).into_iter().next()
    }

    /// Replace the values at `path`, creating structured intermediates as needed.
    ///
    /// Fails when an intermediate item holds anything other than a single
    /// structured value.
    pub fn set(&mut self, path: &ItemPath, values: Vec<Value>) -> Result<()> {
        if path.is_empty() {
            return Err(DeltaError::invalid_path("", "cannot set the object itself"));
        }
        set_in(&mut self.items, path.segments(), values, path)
    }

    pub fn apply_item_delta(&mut self, delta: &ItemDelta, rule: &dyn MatchingRule) -> Result<()> {
        let current = self.find(&delta.path);
        let updated = delta.apply_to(&current, rule);
        self.set(&delta.path, updated)
    }

    /// Apply a MODIFY delta addressed to this object.
    pub fn apply_delta(&mut self, delta: &ObjectDelta) -> Result<()> {
        match delta {
            ObjectDelta::Modify { oid, modifications } => {
                if *oid != self.oid {
                    return Err(DeltaError::incompatible(format!(
                        "delta for {oid} applied to {}",
                        self.oid
                    )));
                }
                let rule = BuiltinRule::Default;
                for modification in modifications {
                    self.apply_item_delta(modification, &rule)?;
                }
                Ok(())
            }
            other => Err(DeltaError::incompatible(format!(
                "{} delta cannot be applied in place",
                other.kind()
            ))),
        }
    }

    /// MODIFY delta turning `self` into `other`, one item delta per changed
    /// top-level item.
    #[must_use]
    pub fn diff(&self, other: &Entity) -> ObjectDelta {
        let names: BTreeSet<&String> = self.items.keys().chain(other.items.keys()).collect();
        let mut modifications = Vec::new();
        for name in names {
            let old = self.items.get(name).map(Vec::as_slice).unwrap_or_default();
            let new = other.items.get(name).map(Vec::as_slice).unwrap_or_default();
            let triple = DeltaSetTriple::from_old_new(old, new, |a, b| a == b);
            if !triple.has_changes() {
                continue;
            }
            let (_, plus, minus) = triple.into_parts();
            let path = ItemPath::from_segments([name.as_str()]);
            // Item names containing '/' are not addressable.
            if let Ok(path) = path {
                modifications.push(ItemDelta::add(path, plus).with_delete(minus));
            }
        }
        ObjectDelta::Modify {
            oid: self.oid,
            modifications,
        }
    }
}

fn set_in(
    items: &mut BTreeMap<String, Vec<Value>>,
    segments: &[String],
    values: Vec<Value>,
    full_path: &ItemPath,
) -> Result<()> {
    let Some((first, rest)) = segments.split_first() else {
        return Ok(());
    };
    if rest.is_empty() {
        if values.is_empty() {
            items.remove(first);
        } else {
            items.insert(first.clone(), values);
        }
        return Ok(());
    }
    let slot = items.entry(first.clone()).or_default();
    if slot.is_empty() {
        slot.push(Value::Structured(BTreeMap::new()));
    }
    match slot.as_mut_slice() {
        [Value::Structured(map)] => set_in(map, rest, values, full_path),
        [_] => Err(DeltaError::ambiguous_path(
            full_path.to_string(),
            format!("'{first}' is not a structured item"),
        )),
        _ => Err(DeltaError::ambiguous_path(
            full_path.to_string(),
            format!("'{first}' is multi-valued"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(p: &str) -> ItemPath {
        p.parse().unwrap()
    }

    fn entity() -> Entity {
        Entity::new(Uuid::new_v4(), "focus")
            .with_item("name", vec![Value::from("jack")])
            .with_item("group", vec![Value::from("a"), Value::from("b")])
    }

    #[test]
    fn test_find_top_level_and_missing() {
        let e = entity();
        assert_eq!(e.find(&path("group")).len(), 2);
        assert!(e.find(&path("missing")).is_empty());
        assert!(e.find(&path("missing/deeper")).is_empty());
        assert_eq!(e.first(&path("name")), Some(Value::from("jack")));
    }

    #[test]
    fn test_set_nested_creates_structure() {
        let mut e = entity();
        e.set(&path("address/city"), vec![Value::from("Tortuga")]).unwrap();
        assert_eq!(e.find(&path("address/city")), vec![Value::from("Tortuga")]);
        e.set(&path("address/zip"), vec![Value::from("123")]).unwrap();
        assert_eq!(e.find(&path("address/city")), vec![Value::from("Tortuga")]);
        assert_eq!(e.find(&path("address")).len(), 1);
    }

    #[test]
    fn test_set_through_multi_valued_is_ambiguous() {
        let mut e = entity();
        let err = e.set(&path("group/x"), vec![Value::from("1")]).unwrap_err();
        assert!(matches!(err, DeltaError::AmbiguousPath { .. }));
        let err = e.set(&path("name/x"), vec![Value::from("1")]).unwrap_err();
        assert!(matches!(err, DeltaError::AmbiguousPath { .. }));
    }

    #[test]
    fn test_set_empty_removes_item() {
        let mut e = entity();
        e.set(&path("name"), vec![]).unwrap();
        assert!(!e.items.contains_key("name"));
    }

    #[test]
    fn test_apply_item_delta() {
        let mut e = entity();
        let delta = ItemDelta::add(path("group"), vec![Value::from("C")])
            .with_delete(vec![Value::from("A")]);
        e.apply_item_delta(&delta, &BuiltinRule::StringIgnoreCase).unwrap();
        assert_eq!(e.find(&path("group")), vec![Value::from("b"), Value::from("C")]);
    }

    #[test]
    fn test_diff_then_apply_converges() {
        let old = entity();
        let mut new = old.clone();
        new.items.remove("name");
        new.items
            .insert("group".to_string(), vec![Value::from("b"), Value::from("c")]);
        new.items.insert("mail".to_string(), vec![Value::from("j@x")]);

        let delta = old.diff(&new);
        assert_eq!(delta.modifications().len(), 3);
        let group = delta.find_item_delta(&path("group")).unwrap();
        assert_eq!(group.values_to_add, vec![Value::from("c")]);
        assert_eq!(group.values_to_delete, vec![Value::from("a")]);

        let mut patched = old.clone();
        patched.apply_delta(&delta).unwrap();
        assert_eq!(patched, new);
    }

    #[test]
    fn test_apply_delta_rejects_foreign_oid() {
        let mut e = entity();
        let delta = ObjectDelta::modify(Uuid::new_v4());
        assert!(matches!(
            e.apply_delta(&delta),
            Err(DeltaError::IncompatibleDelta { .. })
        ));
    }
}
