//! Bound, evaluation-ready filters.
//!
//! An [`ObjectFilter`] holds only literal values. It is produced by
//! [`FilterTemplate::bind`](crate::FilterTemplate::bind) and can either be
//! matched in memory or handed to a repository search.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use xavyo_delta::{Entity, ItemPath, MatchingRule, MatchingRuleRegistry, Value};

use crate::error::{FilterError, Result};

/// Predicate tree over entity items.
///
/// Value nodes may name a matching rule; the default rule applies otherwise.
/// An `Equals` node without values matches entities that have no value at
/// the path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ObjectFilter {
    /// Matches everything.
    All,

    /// Matches nothing.
    None,

    /// All children match (empty: matches everything).
    And { filters: Vec<ObjectFilter> },

    /// Any child matches (empty: matches nothing).
    Or { filters: Vec<ObjectFilter> },

    Not { filter: Box<ObjectFilter> },

    /// Some item value equals some filter value.
    Equals {
        path: ItemPath,
        values: Vec<Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        matching: Option<String>,
    },

    /// Some item value is less than some filter value.
    Less {
        path: ItemPath,
        values: Vec<Value>,
        #[serde(default)]
        or_equal: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        matching: Option<String>,
    },

    /// Some item value is greater than some filter value.
    Greater {
        path: ItemPath,
        values: Vec<Value>,
        #[serde(default)]
        or_equal: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        matching: Option<String>,
    },

    /// Some textual item value contains some filter value.
    Substring {
        path: ItemPath,
        values: Vec<Value>,
        #[serde(default)]
        anchor_start: bool,
        #[serde(default)]
        anchor_end: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        matching: Option<String>,
    },
}

impl ObjectFilter {
    pub fn equals(path: ItemPath, values: Vec<Value>) -> Self {
        ObjectFilter::Equals {
            path,
            values,
            matching: None,
        }
    }

    pub fn less(path: ItemPath, value: Value, or_equal: bool) -> Self {
        ObjectFilter::Less {
            path,
            values: vec![value],
            or_equal,
            matching: None,
        }
    }

    pub fn greater(path: ItemPath, value: Value, or_equal: bool) -> Self {
        ObjectFilter::Greater {
            path,
            values: vec![value],
            or_equal,
            matching: None,
        }
    }

    pub fn and(filters: Vec<ObjectFilter>) -> Self {
        ObjectFilter::And { filters }
    }

    pub fn or(filters: Vec<ObjectFilter>) -> Self {
        ObjectFilter::Or { filters }
    }

    pub fn negate(filter: ObjectFilter) -> Self {
        ObjectFilter::Not {
            filter: Box::new(filter),
        }
    }

    #[must_use]
    pub fn is_all(&self) -> bool {
        matches!(self, ObjectFilter::All)
    }

    #[must_use]
    pub fn is_none(&self) -> bool {
        matches!(self, ObjectFilter::None)
    }

    /// Match `entity` in memory.
    ///
    /// `And` and `Or` short-circuit left to right, so an error in a later
    /// child is only raised when that child is reached.
    pub fn matches(&self, entity: &Entity, rules: &MatchingRuleRegistry) -> Result<bool> {
        match self {
            ObjectFilter::All => Ok(true),
            ObjectFilter::None => Ok(false),
            ObjectFilter::And { filters } => {
                for filter in filters {
                    if !filter.matches(entity, rules)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            ObjectFilter::Or { filters } => {
                for filter in filters {
                    if filter.matches(entity, rules)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            ObjectFilter::Not { filter } => Ok(!filter.matches(entity, rules)?),
            ObjectFilter::Equals {
                path,
                values,
                matching,
            } => {
                let rule = rules.resolve(matching.as_deref())?;
                let actual = entity.find(path);
                if values.is_empty() {
                    return Ok(actual.is_empty());
                }
                Ok(actual
                    .iter()
                    .any(|a| values.iter().any(|v| rule.matches(a, v))))
            }
            ObjectFilter::Less {
                path,
                values,
                or_equal,
                matching,
            } => {
                let rule = rules.resolve(matching.as_deref())?;
                any_ordering(rule.as_ref(), &entity.find(path), values, |ord| {
                    ord == Ordering::Less || (*or_equal && ord == Ordering::Equal)
                })
            }
            ObjectFilter::Greater {
                path,
                values,
                or_equal,
                matching,
            } => {
                let rule = rules.resolve(matching.as_deref())?;
                any_ordering(rule.as_ref(), &entity.find(path), values, |ord| {
                    ord == Ordering::Greater || (*or_equal && ord == Ordering::Equal)
                })
            }
            ObjectFilter::Substring {
                path,
                values,
                anchor_start,
                anchor_end,
                matching,
            } => {
                let rule = rules.resolve(matching.as_deref())?;
                for actual in entity.find(path) {
                    for expected in values {
                        if substring_matches(
                            rule.as_ref(),
                            &actual,
                            expected,
                            *anchor_start,
                            *anchor_end,
                        )? {
                            return Ok(true);
                        }
                    }
                }
                Ok(false)
            }
        }
    }

    /// Fold constant sub-trees.
    ///
    /// `None` inside `And` makes it `None`, `All` inside `Or` makes it `All`,
    /// constant children are dropped otherwise, single-child junctions
    /// collapse and double negation unwraps. Matching results are unchanged.
    #[must_use]
    pub fn simplify(self) -> ObjectFilter {
        match self {
            ObjectFilter::And { filters } => {
                let mut kept = Vec::with_capacity(filters.len());
                for filter in filters {
                    match filter.simplify() {
                        ObjectFilter::All => {}
                        ObjectFilter::None => return ObjectFilter::None,
                        other => kept.push(other),
                    }
                }
                collapse(kept, ObjectFilter::All, |filters| ObjectFilter::And { filters })
            }
            ObjectFilter::Or { filters } => {
                let mut kept = Vec::with_capacity(filters.len());
                for filter in filters {
                    match filter.simplify() {
                        ObjectFilter::None => {}
                        ObjectFilter::All => return ObjectFilter::All,
                        other => kept.push(other),
                    }
                }
                collapse(kept, ObjectFilter::None, |filters| ObjectFilter::Or { filters })
            }
            ObjectFilter::Not { filter } => match filter.simplify() {
                ObjectFilter::All => ObjectFilter::None,
                ObjectFilter::None => ObjectFilter::All,
                ObjectFilter::Not { filter: inner } => *inner,
                other => ObjectFilter::negate(other),
            },
            leaf => leaf,
        }
    }
}

fn collapse(
    mut kept: Vec<ObjectFilter>,
    empty: ObjectFilter,
    junction: impl FnOnce(Vec<ObjectFilter>) -> ObjectFilter,
) -> ObjectFilter {
    match kept.len() {
        0 => empty,
        1 => kept.pop().unwrap_or(empty),
        _ => junction(kept),
    }
}

fn any_ordering(
    rule: &dyn MatchingRule,
    actual: &[Value],
    expected: &[Value],
    accept: impl Fn(Ordering) -> bool,
) -> Result<bool> {
    for a in actual {
        for e in expected {
            let ordering = rule.compare(a, e).ok_or_else(|| {
                FilterError::schema(format!(
                    "cannot order {} value '{a}' against {} value '{e}'",
                    a.kind(),
                    e.kind()
                ))
            })?;
            if accept(ordering) {
                return Ok(true);
            }
        }
    }
    Ok(false)
}

fn substring_matches(
    rule: &dyn MatchingRule,
    actual: &Value,
    expected: &Value,
    anchor_start: bool,
    anchor_end: bool,
) -> Result<bool> {
    let actual = rule.normalize(actual);
    let expected = rule.normalize(expected);
    let (Some(haystack), Some(needle)) = (actual.as_str(), expected.as_str()) else {
        return Err(FilterError::schema(format!(
            "substring filter needs textual values, got {} and {}",
            actual.kind(),
            expected.kind()
        )));
    };
    Ok(match (anchor_start, anchor_end) {
        (true, true) => haystack == needle,
        (true, false) => haystack.starts_with(needle),
        (false, true) => haystack.ends_with(needle),
        (false, false) => haystack.contains(needle),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;
    use xavyo_delta::PolyString;

    fn path(p: &str) -> ItemPath {
        p.parse().unwrap()
    }

    fn user() -> Entity {
        Entity::new(Uuid::new_v4(), "user")
            .with_item("name", vec![Value::from("Jack")])
            .with_item("level", vec![Value::from(5)])
            .with_item("fullName", vec![Value::from(PolyString::new("Jack  Sparrow"))])
    }

    #[test]
    fn test_equals_with_matching_rule() {
        let rules = MatchingRuleRegistry::new();
        let exact = ObjectFilter::equals(path("name"), vec![Value::from("jack")]);
        assert!(!exact.matches(&user(), &rules).unwrap());

        let ignore_case = ObjectFilter::Equals {
            path: path("name"),
            values: vec![Value::from("jack")],
            matching: Some("stringIgnoreCase".to_string()),
        };
        assert!(ignore_case.matches(&user(), &rules).unwrap());
    }

    #[test]
    fn test_equals_without_values_matches_missing_item() {
        let rules = MatchingRuleRegistry::new();
        assert!(ObjectFilter::equals(path("mail"), vec![])
            .matches(&user(), &rules)
            .unwrap());
        assert!(!ObjectFilter::equals(path("name"), vec![])
            .matches(&user(), &rules)
            .unwrap());
    }

    #[test]
    fn test_ordering() {
        let rules = MatchingRuleRegistry::new();
        let user = user();
        assert!(ObjectFilter::less(path("level"), Value::from(6), false)
            .matches(&user, &rules)
            .unwrap());
        assert!(!ObjectFilter::less(path("level"), Value::from(5), false)
            .matches(&user, &rules)
            .unwrap());
        assert!(ObjectFilter::less(path("level"), Value::from(5), true)
            .matches(&user, &rules)
            .unwrap());
        assert!(ObjectFilter::greater(path("level"), Value::from(4), false)
            .matches(&user, &rules)
            .unwrap());
    }

    #[test]
    fn test_cross_kind_ordering_is_schema_error() {
        let rules = MatchingRuleRegistry::new();
        let err = ObjectFilter::less(path("level"), Value::from("five"), false)
            .matches(&user(), &rules)
            .unwrap_err();
        assert!(err.is_schema());
    }

    #[test]
    fn test_substring_anchors() {
        let rules = MatchingRuleRegistry::new();
        let substring = |value: &str, anchor_start, anchor_end| ObjectFilter::Substring {
            path: path("fullName"),
            values: vec![Value::from(value)],
            anchor_start,
            anchor_end,
            matching: Some("polyStringNorm".to_string()),
        };
        let user = user();
        assert!(substring("sparrow", false, false).matches(&user, &rules).unwrap());
        assert!(substring("jack", true, false).matches(&user, &rules).unwrap());
        assert!(!substring("jack", false, true).matches(&user, &rules).unwrap());
        assert!(substring("jack sparrow", true, true).matches(&user, &rules).unwrap());
    }

    #[test]
    fn test_unknown_matching_rule() {
        let rules = MatchingRuleRegistry::new();
        let filter = ObjectFilter::Equals {
            path: path("name"),
            values: vec![Value::from("Jack")],
            matching: Some("fuzzy".to_string()),
        };
        assert!(filter.matches(&user(), &rules).unwrap_err().is_schema());
    }

    #[test]
    fn test_short_circuit_skips_failing_child() {
        let rules = MatchingRuleRegistry::new();
        let failing = ObjectFilter::less(path("level"), Value::from("x"), false);
        let and = ObjectFilter::and(vec![ObjectFilter::None, failing.clone()]);
        assert!(!and.matches(&user(), &rules).unwrap());
        let or = ObjectFilter::or(vec![ObjectFilter::All, failing]);
        assert!(or.matches(&user(), &rules).unwrap());
    }

    #[test]
    fn test_simplify() {
        let leaf = ObjectFilter::equals(path("name"), vec![Value::from("Jack")]);

        let and = ObjectFilter::and(vec![ObjectFilter::All, leaf.clone()]);
        assert_eq!(and.simplify(), leaf);

        let and = ObjectFilter::and(vec![leaf.clone(), ObjectFilter::None]);
        assert_eq!(and.simplify(), ObjectFilter::None);

        let or = ObjectFilter::or(vec![ObjectFilter::None, ObjectFilter::All]);
        assert_eq!(or.simplify(), ObjectFilter::All);

        let or = ObjectFilter::or(vec![ObjectFilter::None]);
        assert_eq!(or.simplify(), ObjectFilter::None);

        let not = ObjectFilter::negate(ObjectFilter::negate(leaf.clone()));
        assert_eq!(not.simplify(), leaf);

        assert_eq!(ObjectFilter::and(vec![]).simplify(), ObjectFilter::All);
    }

    #[test]
    fn test_serde_shape() {
        let filter = ObjectFilter::and(vec![ObjectFilter::equals(
            path("name"),
            vec![Value::from("Jack")],
        )]);
        let json = serde_json::to_value(&filter).unwrap();
        assert_eq!(json["type"], "and");
        assert_eq!(json["filters"][0]["type"], "equals");
        assert_eq!(json["filters"][0]["path"], "name");
        let back: ObjectFilter = serde_json::from_value(json).unwrap();
        assert_eq!(back, filter);
    }
}
