//! Persisted filter templates.
//!
//! A template is the filter as stored in resource configuration. Value nodes
//! may carry an expression instead of literal values; [`FilterTemplate::bind`]
//! evaluates those expressions and produces an [`ObjectFilter`].
//!
//! ```json
//! {
//!   "type": "equals",
//!   "path": "name",
//!   "value": { "expression": { "kind": "path", "path": "$shadow/uid" } },
//!   "matching": "stringIgnoreCase"
//! }
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;
use xavyo_core::TaskContext;
use xavyo_delta::{ItemPath, Value};
use xavyo_expression::{
    EvaluationContext, ExpressionConfig, ExpressionFactory, OutputType, VariableMap,
};

use crate::error::{FilterError, Result};
use crate::filter::ObjectFilter;

/// How a value node behaves when its expression produces no value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoValueInterpretation {
    /// Bind to no values: `equals` then matches a missing item.
    #[default]
    EqualNull,
    /// The node becomes `None`.
    None,
    /// The node becomes `All`.
    All,
    /// Binding fails.
    Error,
}

/// Right-hand side of a value node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterOperand {
    /// Literal values.
    Values(Vec<Value>),

    /// Values computed at bind time.
    Expression {
        expression: ExpressionConfig,
        #[serde(default)]
        no_value: NoValueInterpretation,
    },
}

impl FilterOperand {
    #[must_use]
    pub fn is_expression(&self) -> bool {
        matches!(self, FilterOperand::Expression { .. })
    }
}

/// Filter tree as persisted, possibly with unbound expressions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FilterTemplate {
    All,
    None,
    And {
        filters: Vec<FilterTemplate>,
    },
    Or {
        filters: Vec<FilterTemplate>,
    },
    Not {
        filter: Box<FilterTemplate>,
    },
    Equals {
        path: ItemPath,
        value: FilterOperand,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        matching: Option<String>,
    },
    Less {
        path: ItemPath,
        value: FilterOperand,
        #[serde(default)]
        or_equal: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        matching: Option<String>,
    },
    Greater {
        path: ItemPath,
        value: FilterOperand,
        #[serde(default)]
        or_equal: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        matching: Option<String>,
    },
    Substring {
        path: ItemPath,
        value: FilterOperand,
        #[serde(default)]
        anchor_start: bool,
        #[serde(default)]
        anchor_end: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        matching: Option<String>,
    },
}

/// Operand after binding: values, or a constant node from the no-value rule.
enum BoundOperand {
    Values(Vec<Value>),
    Constant(ObjectFilter),
}

impl FilterTemplate {
    pub fn equals(path: ItemPath, values: Vec<Value>) -> Self {
        FilterTemplate::Equals {
            path,
            value: FilterOperand::Values(values),
            matching: None,
        }
    }

    /// `equals` against the values of an expression.
    pub fn equals_expression(path: ItemPath, expression: ExpressionConfig) -> Self {
        FilterTemplate::Equals {
            path,
            value: FilterOperand::Expression {
                expression,
                no_value: NoValueInterpretation::default(),
            },
            matching: None,
        }
    }

    pub fn and(filters: Vec<FilterTemplate>) -> Self {
        FilterTemplate::And { filters }
    }

    pub fn or(filters: Vec<FilterTemplate>) -> Self {
        FilterTemplate::Or { filters }
    }

    pub fn negate(filter: FilterTemplate) -> Self {
        FilterTemplate::Not {
            filter: Box::new(filter),
        }
    }

    /// Set the matching rule of a value node. Other nodes are returned as is.
    #[must_use]
    pub fn with_matching(mut self, rule: impl Into<String>) -> Self {
        match &mut self {
            FilterTemplate::Equals { matching, .. }
            | FilterTemplate::Less { matching, .. }
            | FilterTemplate::Greater { matching, .. }
            | FilterTemplate::Substring { matching, .. } => *matching = Some(rule.into()),
            _ => {}
        }
        self
    }

    /// Set the no-value interpretation of an expression operand.
    #[must_use]
    pub fn with_no_value(mut self, interpretation: NoValueInterpretation) -> Self {
        match &mut self {
            FilterTemplate::Equals { value, .. }
            | FilterTemplate::Less { value, .. }
            | FilterTemplate::Greater { value, .. }
            | FilterTemplate::Substring { value, .. } => {
                if let FilterOperand::Expression { no_value, .. } = value {
                    *no_value = interpretation;
                }
            }
            _ => {}
        }
        self
    }

    /// True when some node still carries an expression.
    #[must_use]
    pub fn has_expressions(&self) -> bool {
        match self {
            FilterTemplate::All | FilterTemplate::None => false,
            FilterTemplate::And { filters } | FilterTemplate::Or { filters } => {
                filters.iter().any(FilterTemplate::has_expressions)
            }
            FilterTemplate::Not { filter } => filter.has_expressions(),
            FilterTemplate::Equals { value, .. }
            | FilterTemplate::Less { value, .. }
            | FilterTemplate::Greater { value, .. }
            | FilterTemplate::Substring { value, .. } => value.is_expression(),
        }
    }

    /// Evaluate embedded expressions against `variables` and produce the
    /// equivalent literal filter.
    ///
    /// Expressions see no sources; every variable is visible to them. The
    /// template itself is left untouched, so it can be bound again for the
    /// next notification.
    pub fn bind(
        &self,
        factory: &ExpressionFactory,
        variables: &VariableMap,
        task: &TaskContext,
    ) -> Result<ObjectFilter> {
        Ok(match self {
            FilterTemplate::All => ObjectFilter::All,
            FilterTemplate::None => ObjectFilter::None,
            FilterTemplate::And { filters } => ObjectFilter::And {
                filters: bind_all(filters, factory, variables, task)?,
            },
            FilterTemplate::Or { filters } => ObjectFilter::Or {
                filters: bind_all(filters, factory, variables, task)?,
            },
            FilterTemplate::Not { filter } => {
                ObjectFilter::negate(filter.bind(factory, variables, task)?)
            }
            FilterTemplate::Equals {
                path,
                value,
                matching,
            } => match bind_operand(path, value, factory, variables, task)? {
                BoundOperand::Constant(constant) => constant,
                BoundOperand::Values(values) => ObjectFilter::Equals {
                    path: path.clone(),
                    values,
                    matching: matching.clone(),
                },
            },
            FilterTemplate::Less {
                path,
                value,
                or_equal,
                matching,
            } => match bind_operand(path, value, factory, variables, task)? {
                BoundOperand::Constant(constant) => constant,
                BoundOperand::Values(values) => ObjectFilter::Less {
                    path: path.clone(),
                    values,
                    or_equal: *or_equal,
                    matching: matching.clone(),
                },
            },
            FilterTemplate::Greater {
                path,
                value,
                or_equal,
                matching,
            } => match bind_operand(path, value, factory, variables, task)? {
                BoundOperand::Constant(constant) => constant,
                BoundOperand::Values(values) => ObjectFilter::Greater {
                    path: path.clone(),
                    values,
                    or_equal: *or_equal,
                    matching: matching.clone(),
                },
            },
            FilterTemplate::Substring {
                path,
                value,
                anchor_start,
                anchor_end,
                matching,
            } => match bind_operand(path, value, factory, variables, task)? {
                BoundOperand::Constant(constant) => constant,
                BoundOperand::Values(values) => ObjectFilter::Substring {
                    path: path.clone(),
                    values,
                    anchor_start: *anchor_start,
                    anchor_end: *anchor_end,
                    matching: matching.clone(),
                },
            },
        })
    }
}

fn bind_all(
    filters: &[FilterTemplate],
    factory: &ExpressionFactory,
    variables: &VariableMap,
    task: &TaskContext,
) -> Result<Vec<ObjectFilter>> {
    filters
        .iter()
        .map(|filter| filter.bind(factory, variables, task))
        .collect()
}

fn bind_operand(
    path: &ItemPath,
    operand: &FilterOperand,
    factory: &ExpressionFactory,
    variables: &VariableMap,
    task: &TaskContext,
) -> Result<BoundOperand> {
    let (expression, no_value) = match operand {
        FilterOperand::Values(values) => return Ok(BoundOperand::Values(values.clone())),
        FilterOperand::Expression {
            expression,
            no_value,
        } => (expression, *no_value),
    };

    let compiled = factory.compile(expression)?;
    let description = format!("filter value of '{path}'");
    let ctx = EvaluationContext::new(variables, &[], task).with_description(&description);
    let values = compiled
        .evaluate(&ctx, &OutputType::any())?
        .map(|triple| triple.non_negative_values())
        .unwrap_or_default();

    if !values.is_empty() {
        return Ok(BoundOperand::Values(values));
    }
    debug!(path = %path, ?no_value, "Filter expression produced no value");
    match no_value {
        NoValueInterpretation::EqualNull => Ok(BoundOperand::Values(Vec::new())),
        NoValueInterpretation::None => Ok(BoundOperand::Constant(ObjectFilter::None)),
        NoValueInterpretation::All => Ok(BoundOperand::Constant(ObjectFilter::All)),
        NoValueInterpretation::Error => Err(FilterError::schema(format!(
            "expression for '{path}' produced no value"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;
    use xavyo_delta::Entity;

    fn path(p: &str) -> ItemPath {
        p.parse().unwrap()
    }

    fn shadow_vars(uid: Option<&str>) -> VariableMap {
        let mut shadow = Entity::new(Uuid::new_v4(), "shadow");
        if let Some(uid) = uid {
            shadow = shadow.with_item("uid", vec![Value::from(uid)]);
        }
        VariableMap::new().with_entity("shadow", shadow)
    }

    fn by_uid() -> FilterTemplate {
        FilterTemplate::equals_expression(path("name"), ExpressionConfig::path("$shadow/uid"))
    }

    #[test]
    fn test_bind_resolves_expression() {
        let factory = ExpressionFactory::new();
        let task = TaskContext::new();
        let bound = by_uid()
            .bind(&factory, &shadow_vars(Some("jack")), &task)
            .unwrap();
        assert_eq!(
            bound,
            ObjectFilter::equals(path("name"), vec![Value::from("jack")])
        );
    }

    #[test]
    fn test_no_value_interpretations() {
        let factory = ExpressionFactory::new();
        let task = TaskContext::new();
        let vars = shadow_vars(None);

        let bound = by_uid().bind(&factory, &vars, &task).unwrap();
        assert_eq!(bound, ObjectFilter::equals(path("name"), vec![]));

        let bound = by_uid()
            .with_no_value(NoValueInterpretation::None)
            .bind(&factory, &vars, &task)
            .unwrap();
        assert_eq!(bound, ObjectFilter::None);

        let bound = by_uid()
            .with_no_value(NoValueInterpretation::All)
            .bind(&factory, &vars, &task)
            .unwrap();
        assert_eq!(bound, ObjectFilter::All);

        let err = by_uid()
            .with_no_value(NoValueInterpretation::Error)
            .bind(&factory, &vars, &task)
            .unwrap_err();
        assert!(err.is_schema());
    }

    #[test]
    fn test_unresolved_variable_fails_binding() {
        let factory = ExpressionFactory::new();
        let task = TaskContext::new();
        let err = by_uid()
            .bind(&factory, &VariableMap::new(), &task)
            .unwrap_err();
        assert!(matches!(err, FilterError::Expression(_)));
    }

    #[test]
    fn test_has_expressions() {
        let literal = FilterTemplate::equals(path("name"), vec![Value::from("jack")]);
        assert!(!literal.has_expressions());
        assert!(FilterTemplate::and(vec![literal, FilterTemplate::negate(by_uid())]).has_expressions());
    }

    #[test]
    fn test_parse_from_json() {
        let json = serde_json::json!({
            "type": "or",
            "filters": [
                {
                    "type": "equals",
                    "path": "name",
                    "value": { "expression": { "kind": "path", "path": "$shadow/uid" } },
                    "matching": "stringIgnoreCase"
                },
                { "type": "greater", "path": "level", "value": [3], "or_equal": true }
            ]
        });
        let template: FilterTemplate = serde_json::from_value(json).unwrap();
        assert!(template.has_expressions());

        let factory = ExpressionFactory::new();
        let task = TaskContext::new();
        let bound = template
            .bind(&factory, &shadow_vars(Some("JACK")), &task)
            .unwrap();
        assert_eq!(
            bound,
            ObjectFilter::or(vec![
                ObjectFilter::Equals {
                    path: path("name"),
                    values: vec![Value::from("JACK")],
                    matching: Some("stringIgnoreCase".to_string()),
                },
                ObjectFilter::greater(path("level"), Value::from(3), true),
            ])
        );
    }
}
