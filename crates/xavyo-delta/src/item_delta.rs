//! Item delta: add/delete/replace operations on a single path.

use serde::{Deserialize, Serialize};

use crate::matching::{contains_value, MatchingRule};
use crate::path::ItemPath;
use crate::triple::DeltaSetTriple;
use crate::value::Value;

/// Change of one multi-valued item.
///
/// When `values_to_replace` is set the item is replaced entirely and the
/// add/delete sets are ignored on application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDelta {
    pub path: ItemPath,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values_to_add: Vec<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values_to_delete: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values_to_replace: Option<Vec<Value>>,
}

impl ItemDelta {
    /// Empty delta for a path.
    #[must_use]
    pub fn new(path: ItemPath) -> Self {
        Self {
            path,
            values_to_add: Vec::new(),
            values_to_delete: Vec::new(),
            values_to_replace: None,
        }
    }

    #[must_use]
    pub fn add(path: ItemPath, values: Vec<Value>) -> Self {
        Self::new(path).with_add(values)
    }

    #[must_use]
    pub fn delete(path: ItemPath, values: Vec<Value>) -> Self {
        Self::new(path).with_delete(values)
    }

    #[must_use]
    pub fn replace(path: ItemPath, values: Vec<Value>) -> Self {
        Self {
            values_to_replace: Some(values),
            ..Self::new(path)
        }
    }

    #[must_use]
    pub fn with_add(mut self, values: Vec<Value>) -> Self {
        self.values_to_add.extend(values);
        self
    }

    #[must_use]
    pub fn with_delete(mut self, values: Vec<Value>) -> Self {
        self.values_to_delete.extend(values);
        self
    }

    #[must_use]
    pub fn is_replace(&self) -> bool {
        self.values_to_replace.is_some()
    }

    /// True when applying the delta can never change anything.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values_to_replace.is_none()
            && self.values_to_add.is_empty()
            && self.values_to_delete.is_empty()
    }

    /// Apply to a value collection.
    ///
    /// Deletes first, then adds values not already present; a replace set wins
    /// over both.
    #[must_use]
    pub fn apply_to(&self, values: &[Value], rule: &dyn MatchingRule) -> Vec<Value> {
        if let Some(replacement) = &self.values_to_replace {
            return dedup(replacement, rule);
        }
        let mut result: Vec<Value> = values
            .iter()
            .filter(|v| !contains_value(&self.values_to_delete, v, rule))
            .cloned()
            .collect();
        for value in &self.values_to_add {
            if !contains_value(&result, value, rule) {
                result.push(value.clone());
            }
        }
        result
    }

    /// Describe the effect on `old` as a triple:
    /// `minus = delete ∩ old`, `zero = old − minus`, `plus = add − zero`.
    ///
    /// Adding a value that is already present and not deleted leaves it in
    /// `zero`, so the buckets stay disjoint.
    ///
    /// A replace delta is converted with `from_old_new(old, replacement)`.
    #[must_use]
    pub fn to_triple(&self, old: &[Value], rule: &dyn MatchingRule) -> DeltaSetTriple<Value> {
        let eq = |a: &Value, b: &Value| rule.matches(a, b);
        if let Some(replacement) = &self.values_to_replace {
            return DeltaSetTriple::from_old_new(old, replacement, eq);
        }
        let minus: Vec<Value> = dedup(
            &old.iter()
                .filter(|v| contains_value(&self.values_to_delete, v, rule))
                .cloned()
                .collect::<Vec<_>>(),
            rule,
        );
        let zero: Vec<Value> = dedup(
            &old.iter()
                .filter(|v| !contains_value(&minus, v, rule))
                .cloned()
                .collect::<Vec<_>>(),
            rule,
        );
        let plus: Vec<Value> = dedup(&self.values_to_add, rule)
            .into_iter()
            .filter(|v| !contains_value(&zero, v, rule))
            .collect();
        DeltaSetTriple::new(zero, plus, minus)
    }

    /// Fold `other` (same path) into this delta.
    ///
    /// A later replace discards earlier add/delete sets; add/delete after a
    /// replace edits the replacement set.
    pub fn merge(&mut self, other: ItemDelta, rule: &dyn MatchingRule) {
        if let Some(replacement) = other.values_to_replace {
            self.values_to_replace = Some(replacement);
            self.values_to_add.clear();
            self.values_to_delete.clear();
            return;
        }
        if let Some(replacement) = &mut self.values_to_replace {
            replacement.retain(|v| !contains_value(&other.values_to_delete, v, rule));
            for value in other.values_to_add {
                if !contains_value(replacement, &value, rule) {
                    replacement.push(value);
                }
            }
            return;
        }
        for value in other.values_to_delete {
            self.values_to_add.retain(|v| !rule.matches(v, &value));
            if !contains_value(&self.values_to_delete, &value, rule) {
                self.values_to_delete.push(value);
            }
        }
        for value in other.values_to_add {
            self.values_to_delete.retain(|v| !rule.matches(v, &value));
            if !contains_value(&self.values_to_add, &value, rule) {
                self.values_to_add.push(value);
            }
        }
    }
}

impl DeltaSetTriple<Value> {
    /// Triple describing `delta` applied to `old`.
    #[must_use]
    pub fn from_item_delta(old: &[Value], delta: &ItemDelta, rule: &dyn MatchingRule) -> Self {
        delta.to_triple(old, rule)
    }
}

fn dedup(values: &[Value], rule: &dyn MatchingRule) -> Vec<Value> {
    let mut result: Vec<Value> = Vec::with_capacity(values.len());
    for value in values {
        if !contains_value(&result, value, rule) {
            result.push(value.clone());
        }
    }
    result
}
