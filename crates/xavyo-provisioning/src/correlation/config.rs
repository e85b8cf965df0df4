//! Correlation configuration.

use serde::{Deserialize, Serialize};
use xavyo_expression::ExpressionConfig;
use xavyo_query::FilterTemplate;

use crate::focus::USER_TYPE;

/// Guarded correlation filter.
///
/// A rule without a filter is valid and yields no candidates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConditionalFilter {
    /// Name used in logs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Boolean guard; absent means always applicable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<ExpressionConfig>,

    /// Focus filter, bound against `shadow` and `resource`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<FilterTemplate>,
}

impl ConditionalFilter {
    #[must_use]
    pub fn new(filter: FilterTemplate) -> Self {
        Self {
            name: None,
            condition: None,
            filter: Some(filter),
        }
    }

    #[must_use]
    pub fn with_condition(mut self, condition: ExpressionConfig) -> Self {
        self.condition = Some(condition);
        self
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Name for logs: the configured name or the rule position.
    #[must_use]
    pub fn label(&self, index: usize) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("correlation rule #{index}"))
    }
}

/// Correlation settings of a resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrelationConfig {
    /// Focus type searched for candidates.
    pub focus_type: String,

    /// Rules, evaluated in order.
    pub rules: Vec<ConditionalFilter>,

    /// Boolean expression over `candidate`, `shadow` and `resource`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmation: Option<ExpressionConfig>,

    /// Upper bound on candidates returned by one search.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_candidates: Option<usize>,
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self {
            focus_type: USER_TYPE.to_string(),
            rules: Vec::new(),
            confirmation: None,
            max_candidates: None,
        }
    }
}

impl CorrelationConfig {
    #[must_use]
    pub fn with_rule(mut self, rule: ConditionalFilter) -> Self {
        self.rules.push(rule);
        self
    }

    #[must_use]
    pub fn with_confirmation(mut self, confirmation: ExpressionConfig) -> Self {
        self.confirmation = Some(confirmation);
        self
    }
}
