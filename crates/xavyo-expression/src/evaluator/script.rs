use std::collections::{BTreeMap, HashMap};
use std::fmt::Debug;
use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;
use xavyo_core::TaskContext;
use xavyo_delta::{DeltaSetTriple, Value};

use crate::config::ExpressionConfig;
use crate::context::{EvaluationContext, EvaluationState};
use crate::error::{ExpressionError, Result};
use crate::variables::values_to_json;

/// Language used when a script expression names none.
pub const DEFAULT_SCRIPT_LANGUAGE: &str = "rhai";

/// Named inputs handed to a script, in JSON form.
pub type ScriptBindings = BTreeMap<String, serde_json::Value>;

/// A scripting language implementation.
///
/// Backends are synchronous and must stop promptly once the task is
/// cancelled.
pub trait ScriptBackend: Send + Sync + Debug {
    /// Language tag, matched against the `language` field of a script expression.
    fn language(&self) -> &str;

    /// Syntax check at compile time.
    fn validate(&self, code: &str) -> Result<()>;

    /// Run the script and return its result as JSON.
    fn evaluate(
        &self,
        code: &str,
        bindings: &ScriptBindings,
        task: &TaskContext,
    ) -> Result<serde_json::Value>;
}

/// Script backends keyed by language.
#[derive(Debug, Clone, Default)]
pub struct ScriptBackendRegistry {
    backends: HashMap<String, Arc<dyn ScriptBackend>>,
}

impl ScriptBackendRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, backend: Arc<dyn ScriptBackend>) {
        self.backends.insert(backend.language().to_string(), backend);
    }

    pub fn get(&self, language: &str) -> Result<Arc<dyn ScriptBackend>> {
        self.backends
            .get(language)
            .cloned()
            .ok_or_else(|| ExpressionError::object_not_found("ScriptBackend", language))
    }
}

/// Convert a script result to values.
///
/// `null` is no value, an array is one value per element, anything else is a
/// single value.
pub fn json_to_values(result: serde_json::Value) -> Result<Vec<Value>> {
    let elements = match result {
        serde_json::Value::Null => return Ok(Vec::new()),
        serde_json::Value::Array(items) => items,
        other => vec![other],
    };
    elements
        .into_iter()
        .filter(|item| !item.is_null())
        .map(|item| {
            serde_json::from_value::<Value>(item.clone()).map_err(|_| {
                ExpressionError::evaluation(format!("unsupported script result value {item}"))
            })
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct ScriptBody {
    #[serde(default)]
    language: Option<String>,
    code: String,
}

/// Runs a script through a backend.
///
/// With changing sources the script runs once against the old and once
/// against the new source state; the two results are diffed into a triple.
#[derive(Debug)]
pub struct ScriptEvaluator {
    code: String,
    backend: Arc<dyn ScriptBackend>,
}

impl ScriptEvaluator {
    pub fn new(code: impl Into<String>, backend: Arc<dyn ScriptBackend>) -> Self {
        Self {
            code: code.into(),
            backend,
        }
    }

    pub fn compile(config: &ExpressionConfig, backends: &ScriptBackendRegistry) -> Result<Self> {
        let body: ScriptBody = config.parse_body()?;
        let language = body.language.as_deref().unwrap_or(DEFAULT_SCRIPT_LANGUAGE);
        let backend = backends.get(language)?;
        backend.validate(&body.code)?;
        Ok(Self::new(body.code, backend))
    }

    pub fn evaluate(&self, ctx: &EvaluationContext<'_>) -> Result<DeltaSetTriple<Value>> {
        if ctx.has_changing_sources() {
            let old = self.run(ctx, EvaluationState::Old)?;
            let new = self.run(ctx, EvaluationState::New)?;
            return Ok(DeltaSetTriple::from_old_new(&old, &new, |a, b| {
                ctx.rule().matches(a, b)
            }));
        }
        let state = match ctx.state {
            EvaluationState::Delta => EvaluationState::New,
            pinned => pinned,
        };
        Ok(DeltaSetTriple::zero_only(self.run(ctx, state)?))
    }

    fn run(&self, ctx: &EvaluationContext<'_>, state: EvaluationState) -> Result<Vec<Value>> {
        ctx.task.check()?;
        let bindings = bindings(ctx, state);
        debug!(
            language = %self.backend.language(),
            expression = %ctx.description,
            ?state,
            bindings = bindings.len(),
            "Evaluating script"
        );
        let result = self.backend.evaluate(&self.code, &bindings, ctx.task)?;
        json_to_values(result)
    }
}

fn bindings(ctx: &EvaluationContext<'_>, state: EvaluationState) -> ScriptBindings {
    let mut bindings: ScriptBindings = ctx
        .variables
        .iter()
        .map(|(name, value)| (name.clone(), value.to_json()))
        .collect();
    for source in ctx.sources {
        bindings.insert(
            source.name.clone(),
            values_to_json(&source.values(state, ctx.rule())),
        );
    }
    bindings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variables::{Source, VariableMap};
    use serde_json::json;
    use std::sync::Mutex;
    use xavyo_delta::{ItemDelta, ItemPath};

    /// Echoes the binding named by the script code.
    #[derive(Debug, Default)]
    struct EchoBackend {
        seen: Mutex<Vec<serde_json::Value>>,
    }

    impl ScriptBackend for EchoBackend {
        fn language(&self) -> &str {
            "echo"
        }

        fn validate(&self, code: &str) -> Result<()> {
            if code.is_empty() {
                return Err(ExpressionError::schema("empty script"));
            }
            Ok(())
        }

        fn evaluate(
            &self,
            code: &str,
            bindings: &ScriptBindings,
            _task: &TaskContext,
        ) -> Result<serde_json::Value> {
            let value = bindings.get(code).cloned().unwrap_or(serde_json::Value::Null);
            self.seen.lock().unwrap().push(value.clone());
            Ok(value)
        }
    }

    fn registry(backend: Arc<EchoBackend>) -> ScriptBackendRegistry {
        let mut registry = ScriptBackendRegistry::new();
        registry.register(backend);
        registry
    }

    #[test]
    fn test_changing_source_runs_old_and_new() {
        let backend = Arc::new(EchoBackend::default());
        let evaluator = ScriptEvaluator::compile(
            &ExpressionConfig::script("echo", "cn"),
            &registry(backend.clone()),
        )
        .unwrap();

        let path: ItemPath = "cn".parse().unwrap();
        let sources = vec![Source {
            name: "cn".to_string(),
            path: path.clone(),
            old_values: vec![Value::from("old")],
            delta: Some(ItemDelta::replace(path, vec![Value::from("new")])),
        }];
        let vars = VariableMap::new();
        let task = TaskContext::new();
        let ctx = EvaluationContext::new(&vars, &sources, &task);

        let triple = evaluator.evaluate(&ctx).unwrap();
        assert_eq!(triple.plus(), &[Value::from("new")]);
        assert_eq!(triple.minus(), &[Value::from("old")]);
        assert_eq!(*backend.seen.lock().unwrap(), vec![json!("old"), json!("new")]);
    }

    #[test]
    fn test_static_inputs_run_once() {
        let backend = Arc::new(EchoBackend::default());
        let evaluator = ScriptEvaluator::compile(
            &ExpressionConfig::script("echo", "extra"),
            &registry(backend.clone()),
        )
        .unwrap();
        let vars = VariableMap::new().with_values("extra", vec![Value::from(1), Value::from(2)]);
        let task = TaskContext::new();
        let ctx = EvaluationContext::new(&vars, &[], &task);

        let triple = evaluator.evaluate(&ctx).unwrap();
        assert_eq!(triple.zero(), &[Value::from(1), Value::from(2)]);
        assert_eq!(backend.seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_unknown_language() {
        let err = ScriptEvaluator::compile(
            &ExpressionConfig::script("groovy", "1"),
            &ScriptBackendRegistry::new(),
        )
        .unwrap_err();
        assert!(matches!(err, ExpressionError::ObjectNotFound { .. }));
    }

    #[test]
    fn test_validation_failure_is_reported() {
        let backend = Arc::new(EchoBackend::default());
        let err = ScriptEvaluator::compile(&ExpressionConfig::script("echo", ""), &registry(backend))
            .unwrap_err();
        assert!(err.is_schema());
    }

    #[test]
    fn test_json_to_values() {
        assert!(json_to_values(json!(null)).unwrap().is_empty());
        assert_eq!(
            json_to_values(json!(["a", null, 2])).unwrap(),
            vec![Value::from("a"), Value::from(2)]
        );
        assert_eq!(json_to_values(json!(true)).unwrap(), vec![Value::from(true)]);
        assert!(json_to_values(json!(1.5)).is_err());
    }
}
