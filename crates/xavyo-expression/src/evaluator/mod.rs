//! Expression evaluators.
//!
//! Built-in evaluator kinds form a closed enum with one dispatch function.
//! Deployments plug in further kinds through [`ExpressionEvaluator`] and the
//! registry's `Custom` variant.

mod as_is;
mod generate;
mod literal;
mod path;
mod script;

use std::fmt::Debug;
use std::sync::Arc;

use xavyo_delta::{DeltaSetTriple, Value};

use crate::context::EvaluationContext;
use crate::error::Result;

pub use as_is::AsIsEvaluator;
pub use generate::{GenerateEvaluator, RandomAlphanumericPolicy, ValuePolicy, ValuePolicyRegistry};
pub use literal::LiteralEvaluator;
pub use path::PathEvaluator;
pub use script::{
    json_to_values, ScriptBackend, ScriptBackendRegistry, ScriptBindings, ScriptEvaluator,
};

/// A pluggable evaluator kind.
///
/// Implementations return raw values; coercion to the expected output type
/// and condition gating happen in [`Expression`](crate::Expression).
pub trait ExpressionEvaluator: Send + Sync + Debug {
    /// Kind tag the evaluator was registered under.
    fn kind(&self) -> &str;

    /// Evaluate against the context.
    fn evaluate(&self, ctx: &EvaluationContext<'_>) -> Result<DeltaSetTriple<Value>>;
}

/// Compiled evaluator.
#[derive(Debug)]
pub enum Evaluator {
    Literal(LiteralEvaluator),
    AsIs(AsIsEvaluator),
    Path(PathEvaluator),
    Generate(GenerateEvaluator),
    Script(ScriptEvaluator),
    Custom(Arc<dyn ExpressionEvaluator>),
}

impl Evaluator {
    #[must_use]
    pub fn kind(&self) -> &str {
        match self {
            Evaluator::Literal(_) => crate::config::kinds::LITERAL,
            Evaluator::AsIs(_) => crate::config::kinds::AS_IS,
            Evaluator::Path(_) => crate::config::kinds::PATH,
            Evaluator::Generate(_) => crate::config::kinds::GENERATE,
            Evaluator::Script(_) => crate::config::kinds::SCRIPT,
            Evaluator::Custom(custom) => custom.kind(),
        }
    }

    pub fn evaluate(&self, ctx: &EvaluationContext<'_>) -> Result<DeltaSetTriple<Value>> {
        match self {
            Evaluator::Literal(e) => Ok(e.evaluate()),
            Evaluator::AsIs(e) => e.evaluate(ctx),
            Evaluator::Path(e) => e.evaluate(ctx),
            Evaluator::Generate(e) => e.evaluate(ctx),
            Evaluator::Script(e) => e.evaluate(ctx),
            Evaluator::Custom(e) => e.evaluate(ctx),
        }
    }
}
