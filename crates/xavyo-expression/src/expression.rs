//! Compiled expression with condition gating.
//!
//! The condition is evaluated as a boolean triple. Its old state is true when
//! `zero ∪ minus` contains `true`, its new state when `zero ∪ plus` does:
//!
//! | old   | new   | result                                        |
//! |-------|-------|-----------------------------------------------|
//! | false | false | none                                          |
//! | false | true  | body against the new state, all in `plus`     |
//! | true  | false | body against the old state, all in `minus`    |
//! | true  | true  | body as evaluated                             |

use tracing::{debug, instrument};
use xavyo_delta::{DeltaSetTriple, Value};

use crate::context::{EvaluationContext, EvaluationState};
use crate::error::{ExpressionError, Result};
use crate::evaluator::Evaluator;
use crate::output::OutputType;

/// Old and new truth values of a condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConditionOutcome {
    pub old: bool,
    pub new: bool,
}

impl ConditionOutcome {
    /// Truth values of a boolean triple.
    #[must_use]
    pub fn from_triple(triple: &DeltaSetTriple<bool>) -> Self {
        Self {
            old: triple.old_values().contains(&true),
            new: triple.non_negative_values().contains(&true),
        }
    }
}

/// A compiled expression: evaluator plus optional condition.
#[derive(Debug)]
pub struct Expression {
    name: String,
    evaluator: Evaluator,
    condition: Option<Box<Expression>>,
}

impl Expression {
    pub fn new(name: impl Into<String>, evaluator: Evaluator, condition: Option<Expression>) -> Self {
        Self {
            name: name.into(),
            evaluator,
            condition: condition.map(Box::new),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn kind(&self) -> &str {
        self.evaluator.kind()
    }

    #[must_use]
    pub fn condition(&self) -> Option<&Expression> {
        self.condition.as_deref()
    }

    /// Evaluate, gated by the condition. `None` means the expression is off
    /// in both states and contributes nothing.
    #[instrument(skip(self, ctx, output), fields(expression = %self.name, kind = %self.kind()))]
    pub fn evaluate(
        &self,
        ctx: &EvaluationContext<'_>,
        output: &OutputType,
    ) -> Result<Option<DeltaSetTriple<Value>>> {
        ctx.task.check()?;
        let gated = evaluate_gated(self.condition(), ctx, |ctx| self.evaluator.evaluate(ctx))?;
        match gated {
            Some(triple) => output.coerce_triple(triple).map(Some),
            None => Ok(None),
        }
    }

    /// Evaluate as a boolean triple.
    pub fn evaluate_condition(&self, ctx: &EvaluationContext<'_>) -> Result<DeltaSetTriple<bool>> {
        let triple = self
            .evaluate(ctx, &OutputType::multi(crate::output::OutputKind::Bool))?
            .unwrap_or_default();
        triple.try_map(|value| {
            value.as_bool().ok_or_else(|| {
                ExpressionError::schema(format!("condition '{}' produced {value}", self.name))
            })
        })
    }

    /// Evaluate and require exactly one boolean value after the change.
    ///
    /// Used for confirmation and guard expressions. No value or several
    /// values is an evaluation error.
    pub fn evaluate_single_bool(&self, ctx: &EvaluationContext<'_>) -> Result<bool> {
        let values = self
            .evaluate(ctx, &OutputType::any())?
            .map(|t| t.non_negative_values())
            .unwrap_or_default();
        match values.as_slice() {
            [Value::Bool(b)] => Ok(*b),
            [other] => Err(ExpressionError::evaluation(format!(
                "expression '{}' must produce a boolean, got {} value '{other}'",
                self.name,
                other.kind()
            ))),
            _ => Err(ExpressionError::evaluation(format!(
                "expression '{}' must produce exactly one boolean, got {} values",
                self.name,
                values.len()
            ))),
        }
    }
}

/// Apply the condition truth table around `body`.
///
/// Without a condition the body's triple is returned as is. With one, the
/// body runs pinned to a single state and its values land in one bucket:
/// `zero` when the condition holds in both states, `plus` when it turns on,
/// `minus` (old state) when it turns off.
pub fn evaluate_gated<F>(
    condition: Option<&Expression>,
    ctx: &EvaluationContext<'_>,
    body: F,
) -> Result<Option<DeltaSetTriple<Value>>>
where
    F: Fn(&EvaluationContext<'_>) -> Result<DeltaSetTriple<Value>>,
{
    let Some(condition) = condition else {
        return body(ctx).map(Some);
    };
    let outcome = ConditionOutcome::from_triple(&condition.evaluate_condition(ctx)?);
    match (outcome.old, outcome.new) {
        (false, false) => {
            debug!(expression = %ctx.description, "Condition false in both states, skipping");
            Ok(None)
        }
        (false, true) => {
            let triple = body(&ctx.with_state(EvaluationState::New))?;
            Ok(Some(triple.into_plus()))
        }
        (true, false) => {
            let triple = body(&ctx.with_state(EvaluationState::Old))?;
            Ok(Some(triple.into_minus()))
        }
        (true, true) => {
            let triple = body(&ctx.with_state(EvaluationState::New))?;
            Ok(Some(triple.into_zero()))
        }
    }
}
