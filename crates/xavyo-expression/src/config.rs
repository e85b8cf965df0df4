//! Persisted expression configuration.
//!
//! ```json
//! {
//!   "kind": "script",
//!   "language": "rhai",
//!   "code": "given_name + \" \" + family_name",
//!   "condition": { "kind": "path", "path": "$shadow/enabled" }
//! }
//! ```
//!
//! `kind` selects the evaluator through the
//! [`EvaluatorRegistry`](crate::EvaluatorRegistry); all keys other than
//! `kind`, `name` and `condition` form the evaluator-specific body.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map as JsonMap};
use xavyo_delta::Value;

use crate::error::{ExpressionError, Result};

/// Built-in evaluator kind tags.
pub mod kinds {
    pub const LITERAL: &str = "literal";
    pub const AS_IS: &str = "asIs";
    pub const PATH: &str = "path";
    pub const GENERATE: &str = "generate";
    pub const SCRIPT: &str = "script";
}

/// Unparsed expression as stored in resource configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpressionConfig {
    /// Evaluator kind tag.
    pub kind: String,

    /// Optional name used in logs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Boolean condition gating the expression.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Box<ExpressionConfig>>,

    /// Evaluator-specific settings.
    #[serde(flatten)]
    pub body: JsonMap<String, serde_json::Value>,
}

impl ExpressionConfig {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: None,
            condition: None,
            body: JsonMap::new(),
        }
    }

    /// Literal values.
    #[must_use]
    pub fn literal(values: Vec<Value>) -> Self {
        Self::new(kinds::LITERAL).with_body("values", json!(values))
    }

    /// Literal boolean, the usual shape of a constant condition.
    #[must_use]
    pub fn constant(value: bool) -> Self {
        Self::literal(vec![Value::Bool(value)])
    }

    #[must_use]
    pub fn as_is() -> Self {
        Self::new(kinds::AS_IS)
    }

    pub fn path(path: impl Into<String>) -> Self {
        Self::new(kinds::PATH).with_body("path", json!(path.into()))
    }

    pub fn script(language: impl Into<String>, code: impl Into<String>) -> Self {
        Self::new(kinds::SCRIPT)
            .with_body("language", json!(language.into()))
            .with_body("code", json!(code.into()))
    }

    pub fn generate(policy: impl Into<String>) -> Self {
        Self::new(kinds::GENERATE).with_body("policy", json!(policy.into()))
    }

    #[must_use]
    pub fn with_body(mut self, key: &str, value: serde_json::Value) -> Self {
        self.body.insert(key.to_string(), value);
        self
    }

    #[must_use]
    pub fn with_condition(mut self, condition: ExpressionConfig) -> Self {
        self.condition = Some(Box::new(condition));
        self
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Label used in logs: the name, or the kind when unnamed.
    #[must_use]
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.kind)
    }

    /// Deserialize the body into an evaluator-specific settings struct.
    pub fn parse_body<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(serde_json::Value::Object(self.body.clone())).map_err(|e| {
            ExpressionError::schema(format!("invalid '{}' expression: {e}", self.kind))
        })
    }
}
