//! Output type descriptors and value coercion.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use xavyo_delta::{DeltaSetTriple, PolyString, Value};

use crate::error::{ExpressionError, Result};

/// Expected type of an expression's values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputKind {
    /// No coercion.
    #[default]
    Any,
    String,
    PolyString,
    Int,
    Bool,
    Timestamp,
    Reference,
}

/// Output kind plus cardinality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputType {
    #[serde(default)]
    pub kind: OutputKind,
    #[serde(default = "default_multi_valued")]
    pub multi_valued: bool,
}

fn default_multi_valued() -> bool {
    true
}

impl Default for OutputType {
    fn default() -> Self {
        Self::any()
    }
}

impl OutputType {
    /// Multi-valued, uncoerced output.
    #[must_use]
    pub fn any() -> Self {
        Self {
            kind: OutputKind::Any,
            multi_valued: true,
        }
    }

    #[must_use]
    pub fn single(kind: OutputKind) -> Self {
        Self {
            kind,
            multi_valued: false,
        }
    }

    #[must_use]
    pub fn multi(kind: OutputKind) -> Self {
        Self {
            kind,
            multi_valued: true,
        }
    }

    /// Single-valued boolean, used for conditions.
    #[must_use]
    pub fn boolean() -> Self {
        Self::single(OutputKind::Bool)
    }

    /// Convert one value to this output kind.
    pub fn coerce(&self, value: Value) -> Result<Value> {
        let mismatch = |value: &Value| {
            ExpressionError::schema(format!(
                "cannot convert {} value '{value}' to {:?}",
                value.kind(),
                self.kind
            ))
        };
        match (self.kind, value) {
            (OutputKind::Any, v) => Ok(v),

            (OutputKind::String, Value::String(s)) => Ok(Value::String(s)),
            (OutputKind::String, Value::PolyString(p)) => Ok(Value::String(p.orig)),
            (OutputKind::String, Value::Int(i)) => Ok(Value::String(i.to_string())),
            (OutputKind::String, Value::Bool(b)) => Ok(Value::String(b.to_string())),

            (OutputKind::PolyString, Value::PolyString(p)) => Ok(Value::PolyString(p)),
            (OutputKind::PolyString, Value::String(s)) => Ok(Value::PolyString(PolyString::new(s))),

            (OutputKind::Int, Value::Int(i)) => Ok(Value::Int(i)),
            (OutputKind::Int, Value::String(s)) => s
                .trim()
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| mismatch(&Value::String(s))),

            (OutputKind::Bool, Value::Bool(b)) => Ok(Value::Bool(b)),
            (OutputKind::Bool, Value::String(s)) => {
                let normalized = s.trim().to_ascii_lowercase();
                match normalized.as_str() {
                    "true" => Ok(Value::Bool(true)),
                    "false" => Ok(Value::Bool(false)),
                    _ => Err(mismatch(&Value::String(s))),
                }
            }

            (OutputKind::Timestamp, Value::Timestamp(t)) => Ok(Value::Timestamp(t)),
            (OutputKind::Timestamp, Value::String(s)) => DateTime::parse_from_rfc3339(s.trim())
                .map(|t| Value::Timestamp(t.with_timezone(&Utc)))
                .map_err(|_| mismatch(&Value::String(s))),

            (OutputKind::Reference, Value::Reference(r)) => Ok(Value::Reference(r)),

            (_, other) => Err(mismatch(&other)),
        }
    }

    /// Coerce every bucket of a triple and check cardinality.
    pub fn coerce_triple(&self, triple: DeltaSetTriple<Value>) -> Result<DeltaSetTriple<Value>> {
        let coerced = triple.try_map(|v| self.coerce(v))?;
        self.check_cardinality(&coerced)?;
        Ok(coerced)
    }

    /// A single-valued output must not end with more than one value.
    pub fn check_cardinality(&self, triple: &DeltaSetTriple<Value>) -> Result<()> {
        if !self.multi_valued {
            let after = triple.non_negative_values();
            if after.len() > 1 {
                return Err(ExpressionError::schema(format!(
                    "single-valued output produced {} values",
                    after.len()
                )));
            }
        }
        Ok(())
    }
}
