use serde::Deserialize;
use xavyo_delta::{DeltaSetTriple, Value};

use crate::config::ExpressionConfig;
use crate::error::Result;

#[derive(Debug, Deserialize)]
struct LiteralBody {
    #[serde(default)]
    values: Vec<Value>,
}

/// Constant values, parsed once at compile time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiteralEvaluator {
    values: Vec<Value>,
}

impl LiteralEvaluator {
    #[must_use]
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    pub fn compile(config: &ExpressionConfig) -> Result<Self> {
        let body: LiteralBody = config.parse_body()?;
        Ok(Self::new(body.values))
    }

    #[must_use]
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Literal values never change, so they always land in `zero`.
    #[must_use]
    pub fn evaluate(&self) -> DeltaSetTriple<Value> {
        DeltaSetTriple::zero_only(self.values.clone())
    }
}
