//! Mappings: an expression bound to a target item.
//!
//! A mapping reads its sources, evaluates its expression (or forwards the
//! single source as-is), gates the result with its condition and produces a
//! [`MappingOutput`] that can be turned into an [`ItemDelta`] on the target.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use xavyo_core::TaskContext;
use xavyo_delta::matching::contains_value;
use xavyo_delta::{DeltaSetTriple, Entity, ItemDelta, ItemPath, MatchingRule, Value};

use crate::config::{kinds, ExpressionConfig};
use crate::context::EvaluationContext;
use crate::error::{ExpressionError, Result};
use crate::expression::{evaluate_gated, Expression};
use crate::output::OutputType;
use crate::registry::ExpressionFactory;
use crate::variables::{Source, VariableMap};

/// How forcefully a mapping output is applied to its target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MappingStrength {
    /// Only fills an empty target.
    Weak,
    /// Applies changes (plus and minus).
    #[default]
    Normal,
    /// Applies changes and also enforces unchanged values.
    Strong,
}

/// One input of a mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingSourceConfig {
    pub path: ItemPath,
    /// Binding name; defaults to the last path segment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl MappingSourceConfig {
    #[must_use]
    pub fn new(path: ItemPath) -> Self {
        Self { path, name: None }
    }

    #[must_use]
    pub fn binding_name(&self) -> String {
        self.name
            .clone()
            .or_else(|| self.path.last().map(str::to_string))
            .unwrap_or_else(|| "input".to_string())
    }
}

/// Persisted mapping configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub strength: MappingStrength,
    #[serde(default)]
    pub sources: Vec<MappingSourceConfig>,
    /// Expression producing the target values; absent means as-is.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<ExpressionConfig>,
    pub target: ItemPath,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<ExpressionConfig>,
    #[serde(default)]
    pub output: OutputType,
}

impl MappingConfig {
    /// As-is mapping from one source path to a target path.
    #[must_use]
    pub fn as_is(source: ItemPath, target: ItemPath) -> Self {
        Self {
            name: None,
            strength: MappingStrength::Normal,
            sources: vec![MappingSourceConfig::new(source)],
            expression: None,
            target,
            condition: None,
            output: OutputType::any(),
        }
    }

    #[must_use]
    pub fn with_expression(mut self, expression: ExpressionConfig) -> Self {
        self.expression = Some(expression);
        self
    }

    #[must_use]
    pub fn with_condition(mut self, condition: ExpressionConfig) -> Self {
        self.condition = Some(condition);
        self
    }

    #[must_use]
    pub fn with_strength(mut self, strength: MappingStrength) -> Self {
        self.strength = strength;
        self
    }

    #[must_use]
    pub fn with_output(mut self, output: OutputType) -> Self {
        self.output = output;
        self
    }
}

/// Result of a mapping evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingOutput {
    pub name: String,
    pub target: ItemPath,
    pub strength: MappingStrength,
    pub triple: DeltaSetTriple<Value>,
}

impl MappingOutput {
    /// Change to apply to a target that currently holds `current`.
    ///
    /// Returns `None` when nothing would change.
    #[must_use]
    pub fn to_item_delta(&self, current: &[Value], rule: &dyn MatchingRule) -> Option<ItemDelta> {
        let (to_add, to_delete): (Vec<Value>, Vec<Value>) = match self.strength {
            MappingStrength::Weak => {
                if current.is_empty() {
                    (self.triple.non_negative_values(), Vec::new())
                } else {
                    (Vec::new(), Vec::new())
                }
            }
            MappingStrength::Normal => (self.triple.plus().to_vec(), self.triple.minus().to_vec()),
            MappingStrength::Strong => (
                self.triple.non_negative_values(),
                self.triple.minus().to_vec(),
            ),
        };

        let mut add = Vec::new();
        for value in to_add {
            if !contains_value(current, &value, rule) && !contains_value(&add, &value, rule) {
                add.push(value);
            }
        }
        let delete: Vec<Value> = to_delete
            .into_iter()
            .filter(|v| contains_value(current, v, rule) && !contains_value(&add, v, rule))
            .filter(|v| !contains_value(&self.triple.non_negative_values(), v, rule))
            .collect();

        let delta = ItemDelta::add(self.target.clone(), add).with_delete(delete);
        (!delta.is_empty()).then_some(delta)
    }
}

/// Compiled mapping.
#[derive(Debug)]
pub struct Mapping {
    name: String,
    strength: MappingStrength,
    sources: Vec<MappingSourceConfig>,
    expression: Expression,
    condition: Option<Expression>,
    target: ItemPath,
    output: OutputType,
}

impl Mapping {
    pub fn compile(config: &MappingConfig, factory: &ExpressionFactory) -> Result<Self> {
        let expression_config = config
            .expression
            .clone()
            .unwrap_or_else(ExpressionConfig::as_is);
        if expression_config.kind == kinds::AS_IS && config.sources.len() > 1 {
            return Err(ExpressionError::schema(format!(
                "as-is mapping to '{}' has {} sources",
                config.target,
                config.sources.len()
            )));
        }
        let expression = factory.compile(&expression_config)?;
        let condition = config
            .condition
            .as_ref()
            .map(|c| factory.compile(c))
            .transpose()?;
        let name = config
            .name
            .clone()
            .unwrap_or_else(|| format!("mapping to {}", config.target));
        Ok(Self {
            name,
            strength: config.strength,
            sources: config.sources.clone(),
            expression,
            condition,
            target: config.target.clone(),
            output: config.output,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn target(&self) -> &ItemPath {
        &self.target
    }

    #[must_use]
    pub fn strength(&self) -> MappingStrength {
        self.strength
    }

    #[must_use]
    pub fn source_configs(&self) -> &[MappingSourceConfig] {
        &self.sources
    }

    /// Build the mapping's sources from the prior and current state of the
    /// source object.
    #[must_use]
    pub fn sources_from_states(&self, prior: Option<&Entity>, current: Option<&Entity>) -> Vec<Source> {
        self.sources
            .iter()
            .map(|s| Source::from_states(s.binding_name(), s.path.clone(), prior, current))
            .collect()
    }

    /// Evaluate with explicit sources.
    #[instrument(skip_all, fields(mapping = %self.name, target_path = %self.target))]
    pub fn evaluate(
        &self,
        variables: &VariableMap,
        sources: &[Source],
        task: &TaskContext,
    ) -> Result<Option<MappingOutput>> {
        let ctx = EvaluationContext::new(variables, sources, task).with_description(&self.name);
        let gated = evaluate_gated(self.condition.as_ref(), &ctx, |ctx| {
            Ok(self
                .expression
                .evaluate(ctx, &self.output)?
                .unwrap_or_default())
        })?;
        let Some(triple) = gated else {
            return Ok(None);
        };
        self.output.check_cardinality(&triple)?;
        debug!(
            zero = triple.zero().len(),
            plus = triple.plus().len(),
            minus = triple.minus().len(),
            "Mapping evaluated"
        );
        Ok(Some(MappingOutput {
            name: self.name.clone(),
            target: self.target.clone(),
            strength: self.strength,
            triple,
        }))
    }

    /// Evaluate with sources read from the prior and current source object.
    pub fn evaluate_states(
        &self,
        variables: &VariableMap,
        prior: Option<&Entity>,
        current: Option<&Entity>,
        task: &TaskContext,
    ) -> Result<Option<MappingOutput>> {
        let sources = self.sources_from_states(prior, current);
        self.evaluate(variables, &sources, task)
    }
}
