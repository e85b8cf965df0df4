//! Rhai script backend.
//!
//! Runs expression scripts in a fresh, sandboxed Rhai engine per evaluation:
//! - No shared state between evaluations
//! - Resource limits (operations, call depth, string/array/map sizes)
//! - Aborted at the next operation once the task is cancelled or overdue

use rhai::{Dynamic, Engine, EvalAltResult, Scope};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use xavyo_core::TaskContext;
use xavyo_delta::value::normalize_text;

use crate::error::{ExpressionError, Result};
use crate::evaluator::{ScriptBackend, ScriptBindings};

/// Language tag of this backend.
pub const RHAI_LANGUAGE: &str = "rhai";

const DEFAULT_MAX_OPERATIONS: u64 = 100_000;
const DEFAULT_MAX_CALL_LEVELS: usize = 64;
const DEFAULT_MAX_STRING_SIZE: usize = 65536;
const DEFAULT_MAX_ARRAY_SIZE: usize = 10_000;
const DEFAULT_MAX_MAP_SIZE: usize = 10_000;

/// Sandbox limits of the Rhai backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RhaiBackendConfig {
    /// Maximum number of operations before the script is terminated.
    pub max_operations: u64,
    /// Maximum function call depth.
    pub max_call_levels: usize,
    /// Maximum string size in bytes.
    pub max_string_size: usize,
    pub max_array_size: usize,
    pub max_map_size: usize,
}

impl Default for RhaiBackendConfig {
    fn default() -> Self {
        Self {
            max_operations: DEFAULT_MAX_OPERATIONS,
            max_call_levels: DEFAULT_MAX_CALL_LEVELS,
            max_string_size: DEFAULT_MAX_STRING_SIZE,
            max_array_size: DEFAULT_MAX_ARRAY_SIZE,
            max_map_size: DEFAULT_MAX_MAP_SIZE,
        }
    }
}

/// [`ScriptBackend`] for the `rhai` language.
///
/// Bindings are exposed as constants named after the variable or source.
/// Scripts may call `log_info`, `log_warn`, `log_debug` and `norm` (polystring
/// normalization).
#[derive(Debug, Clone, Default)]
pub struct RhaiScriptBackend {
    config: RhaiBackendConfig,
}

impl RhaiScriptBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_config(config: RhaiBackendConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &RhaiBackendConfig {
        &self.config
    }

    fn create_engine(&self, strict: bool) -> Engine {
        let mut engine = Engine::new();

        engine.set_max_operations(self.config.max_operations);
        engine.set_max_call_levels(self.config.max_call_levels);
        engine.set_max_string_size(self.config.max_string_size);
        engine.set_max_array_size(self.config.max_array_size);
        engine.set_max_map_size(self.config.max_map_size);

        // Loops are bounded by max_operations.
        engine.set_allow_looping(true);
        engine.set_strict_variables(strict);

        engine.register_fn("log_info", |msg: &str| {
            info!(script_log = %msg, "Rhai expression log");
        });
        engine.register_fn("log_warn", |msg: &str| {
            warn!(script_log = %msg, "Rhai expression warning");
        });
        engine.register_fn("log_debug", |msg: &str| {
            debug!(script_log = %msg, "Rhai expression debug");
        });
        engine.register_fn("norm", |s: &str| normalize_text(s));

        engine
    }

    fn build_scope(bindings: &ScriptBindings) -> Result<Scope<'static>> {
        let mut scope = Scope::new();
        for (name, value) in bindings {
            let dynamic = rhai::serde::to_dynamic(value).map_err(|e| {
                ExpressionError::evaluation(format!("cannot bind '{name}' to script: {e}"))
            })?;
            scope.push_constant_dynamic(name.clone(), dynamic);
        }
        Ok(scope)
    }

    fn map_runtime_error(err: &EvalAltResult, task: &TaskContext) -> ExpressionError {
        match err {
            EvalAltResult::ErrorTerminated(..) => ExpressionError::Cancelled {
                task_id: task.task_id(),
            },
            EvalAltResult::ErrorTooManyOperations(..) => ExpressionError::evaluation(format!(
                "script exceeded the operation limit: {err}"
            )),
            other => ExpressionError::evaluation(format!("script failed: {other}")),
        }
    }
}

impl ScriptBackend for RhaiScriptBackend {
    fn language(&self) -> &str {
        RHAI_LANGUAGE
    }

    fn validate(&self, code: &str) -> Result<()> {
        // Bindings are unknown at compile time, so only syntax is checked.
        self.create_engine(false)
            .compile(code)
            .map(|_| ())
            .map_err(|e| ExpressionError::schema(format!("Compilation error: {e}")))
    }

    fn evaluate(
        &self,
        code: &str,
        bindings: &ScriptBindings,
        task: &TaskContext,
    ) -> Result<serde_json::Value> {
        let mut engine = self.create_engine(true);
        let watched = task.clone();
        engine.on_progress(move |_| {
            if watched.is_cancelled() {
                Some(Dynamic::UNIT)
            } else {
                None
            }
        });

        let mut scope = Self::build_scope(bindings)?;
        let ast = engine
            .compile_with_scope(&scope, code)
            .map_err(|e| ExpressionError::evaluation(format!("Compilation error: {e}")))?;

        let result = engine
            .eval_ast_with_scope::<Dynamic>(&mut scope, &ast)
            .map_err(|e| Self::map_runtime_error(&e, task))?;

        if result.is_unit() {
            return Ok(serde_json::Value::Null);
        }
        rhai::serde::from_dynamic::<serde_json::Value>(&result).map_err(|e| {
            ExpressionError::evaluation(format!("unsupported script result: {e}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bindings(pairs: &[(&str, serde_json::Value)]) -> ScriptBindings {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_evaluates_with_bindings() {
        let backend = RhaiScriptBackend::new();
        let result = backend
            .evaluate(
                r#"given + " " + family"#,
                &bindings(&[("given", json!("Jack")), ("family", json!("Sparrow"))]),
                &TaskContext::new(),
            )
            .unwrap();
        assert_eq!(result, json!("Jack Sparrow"));
    }

    #[test]
    fn test_entity_binding_fields() {
        let backend = RhaiScriptBackend::new();
        let result = backend
            .evaluate(
                "shadow.mail",
                &bindings(&[("shadow", json!({"mail": "jack@example.com"}))]),
                &TaskContext::new(),
            )
            .unwrap();
        assert_eq!(result, json!("jack@example.com"));
    }

    #[test]
    fn test_array_and_unit_results() {
        let backend = RhaiScriptBackend::new();
        let task = TaskContext::new();
        let empty = ScriptBindings::new();
        assert_eq!(backend.evaluate("[1, 2]", &empty, &task).unwrap(), json!([1, 2]));
        assert_eq!(backend.evaluate("let x = 1;", &empty, &task).unwrap(), json!(null));
    }

    #[test]
    fn test_unknown_variable_is_evaluation_error() {
        let backend = RhaiScriptBackend::new();
        let err = backend
            .evaluate("missing + 1", &ScriptBindings::new(), &TaskContext::new())
            .unwrap_err();
        assert!(matches!(err, ExpressionError::Evaluation { .. }));
    }

    #[test]
    fn test_validate_syntax() {
        let backend = RhaiScriptBackend::new();
        assert!(backend.validate("a + b").is_ok());
        assert!(backend.validate("let = ;").unwrap_err().is_schema());
    }

    #[test]
    fn test_operation_limit() {
        let backend = RhaiScriptBackend::with_config(RhaiBackendConfig {
            max_operations: 1_000,
            ..RhaiBackendConfig::default()
        });
        let err = backend
            .evaluate("let x = 0; loop { x += 1; }", &ScriptBindings::new(), &TaskContext::new())
            .unwrap_err();
        assert!(matches!(err, ExpressionError::Evaluation { .. }));
    }

    #[test]
    fn test_cancelled_task_terminates_script() {
        let backend = RhaiScriptBackend::new();
        let task = TaskContext::new();
        task.cancel();
        let err = backend
            .evaluate("let x = 0; while x < 10 { x += 1; } x", &ScriptBindings::new(), &task)
            .unwrap_err();
        assert!(err.is_cancelled());
    }

    #[test]
    fn test_norm_function() {
        let backend = RhaiScriptBackend::new();
        let result = backend
            .evaluate(r#"norm("  Jack  SPARROW ")"#, &ScriptBindings::new(), &TaskContext::new())
            .unwrap();
        assert_eq!(result, json!("jack sparrow"));
    }

    #[test]
    fn test_config_defaults_from_json() {
        let config: RhaiBackendConfig = serde_json::from_str(r#"{"max_operations": 500}"#).unwrap();
        assert_eq!(config.max_operations, 500);
        assert_eq!(config.max_call_levels, DEFAULT_MAX_CALL_LEVELS);
    }
}
