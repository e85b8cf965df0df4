//! Matching rules.
//!
//! A matching rule decides when two values are "the same" value of an item.
//! Triple construction, delta application and filter evaluation all take a
//! rule so that e.g. `CN=Jack` and `cn=jack` collapse into one value.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

use crate::error::{DeltaError, Result};
use crate::value::{normalize_text, Value};

/// Name of the rule used when none is configured.
pub const DEFAULT_MATCHING_RULE: &str = "default";

/// Pluggable value equality.
pub trait MatchingRule: Send + Sync + Debug {
    /// Registry key.
    fn name(&self) -> &str;

    /// Canonical form used for comparison.
    fn normalize(&self, value: &Value) -> Value;

    /// Equality under this rule.
    fn matches(&self, a: &Value, b: &Value) -> bool {
        self.normalize(a) == self.normalize(b)
    }

    /// Ordering under this rule; `None` when the values are not comparable.
    fn compare(&self, a: &Value, b: &Value) -> Option<Ordering> {
        self.normalize(a).compare(&self.normalize(b))
    }
}

/// Built-in matching rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinRule {
    /// Exact equality.
    Default,
    /// Case-insensitive comparison of string-like values.
    StringIgnoreCase,
    /// Polystrings compared by their original form.
    PolyStringOrig,
    /// Polystrings (and plain strings) compared by their normalized form.
    PolyStringNorm,
    /// LDAP distinguished names: case-insensitive, whitespace around `,` and `=` ignored.
    DistinguishedName,
}

impl BuiltinRule {
    pub const ALL: [BuiltinRule; 5] = [
        BuiltinRule::Default,
        BuiltinRule::StringIgnoreCase,
        BuiltinRule::PolyStringOrig,
        BuiltinRule::PolyStringNorm,
        BuiltinRule::DistinguishedName,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            BuiltinRule::Default => DEFAULT_MATCHING_RULE,
            BuiltinRule::StringIgnoreCase => "stringIgnoreCase",
            BuiltinRule::PolyStringOrig => "polyStringOrig",
            BuiltinRule::PolyStringNorm => "polyStringNorm",
            BuiltinRule::DistinguishedName => "distinguishedName",
        }
    }
}

fn normalize_dn(dn: &str) -> String {
    dn.split(',')
        .map(|rdn| {
            rdn.split('=')
                .map(|part| part.trim().to_lowercase())
                .collect::<Vec<_>>()
                .join("=")
        })
        .collect::<Vec<_>>()
        .join(",")
}

impl MatchingRule for BuiltinRule {
    fn name(&self) -> &str {
        self.as_str()
    }

    fn normalize(&self, value: &Value) -> Value {
        match (self, value) {
            (BuiltinRule::Default, v) => v.clone(),
            (BuiltinRule::StringIgnoreCase, v) => match v.as_str() {
                Some(s) => Value::String(s.to_lowercase()),
                None => v.clone(),
            },
            (BuiltinRule::PolyStringOrig, Value::PolyString(p)) => Value::String(p.orig.clone()),
            (BuiltinRule::PolyStringOrig, v) => v.clone(),
            (BuiltinRule::PolyStringNorm, Value::PolyString(p)) => Value::String(p.norm.clone()),
            (BuiltinRule::PolyStringNorm, Value::String(s)) => Value::String(normalize_text(s)),
            (BuiltinRule::PolyStringNorm, v) => v.clone(),
            (BuiltinRule::DistinguishedName, v) => match v.as_str() {
                Some(s) => Value::String(normalize_dn(s)),
                None => v.clone(),
            },
        }
    }
}

/// Matching rules keyed by name.
///
/// Populated with the built-ins on construction; deployments may register
/// additional rules at startup.
#[derive(Debug, Clone)]
pub struct MatchingRuleRegistry {
    rules: HashMap<String, Arc<dyn MatchingRule>>,
}

impl MatchingRuleRegistry {
    /// Registry with all built-in rules.
    #[must_use]
    pub fn new() -> Self {
        let mut rules: HashMap<String, Arc<dyn MatchingRule>> = HashMap::new();
        for rule in BuiltinRule::ALL {
            rules.insert(rule.as_str().to_string(), Arc::new(rule));
        }
        Self { rules }
    }

    /// Register (or replace) a rule under its own name.
    pub fn register(&mut self, rule: Arc<dyn MatchingRule>) {
        self.rules.insert(rule.name().to_string(), rule);
    }

    /// Look up a rule by name.
    pub fn get(&self, name: &str) -> Result<Arc<dyn MatchingRule>> {
        self.rules
            .get(name)
            .cloned()
            .ok_or_else(|| DeltaError::UnknownMatchingRule {
                name: name.to_string(),
            })
    }

    /// Look up an optional rule name, falling back to the default rule.
    pub fn resolve(&self, name: Option<&str>) -> Result<Arc<dyn MatchingRule>> {
        self.get(name.unwrap_or(DEFAULT_MATCHING_RULE))
    }

    #[must_use]
    pub fn default_rule(&self) -> Arc<dyn MatchingRule> {
        self.rules
            .get(DEFAULT_MATCHING_RULE)
            .cloned()
            .unwrap_or_else(|| Arc::new(BuiltinRule::Default))
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.rules.contains_key(name)
    }
}

impl Default for MatchingRuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// True when `values` contains a value equal to `value` under `rule`.
#[must_use]
pub fn contains_value(values: &[Value], value: &Value, rule: &dyn MatchingRule) -> bool {
    values.iter().any(|v| rule.matches(v, value))
}
