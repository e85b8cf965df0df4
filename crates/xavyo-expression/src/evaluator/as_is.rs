use xavyo_delta::{DeltaSetTriple, Value};

use crate::context::EvaluationContext;
use crate::error::{ExpressionError, Result};

/// Forwards the single source's triple unchanged.
///
/// Type conversion (e.g. plain text to polystring) is applied afterwards by the
/// output type of the enclosing expression.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AsIsEvaluator;

impl AsIsEvaluator {
    pub fn evaluate(&self, ctx: &EvaluationContext<'_>) -> Result<DeltaSetTriple<Value>> {
        match ctx.sources {
            [] => Ok(DeltaSetTriple::empty()),
            [source] => Ok(ctx.source_triple(source)),
            sources => Err(ExpressionError::evaluation(format!(
                "asIs expression in {} needs exactly one source, got {}",
                ctx.description,
                sources.len()
            ))),
        }
    }
}
