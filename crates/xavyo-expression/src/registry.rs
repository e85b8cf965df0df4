//! Evaluator registry and expression factory.
//!
//! The registry maps a kind tag from configuration to a constructor. It is
//! populated with the built-in kinds at startup; deployments register further
//! kinds without touching the engine.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::config::{kinds, ExpressionConfig};
use crate::error::{ExpressionError, Result};
use crate::evaluator::{
    AsIsEvaluator, Evaluator, GenerateEvaluator, LiteralEvaluator, PathEvaluator, ScriptBackend,
    ScriptBackendRegistry, ScriptEvaluator, ValuePolicy, ValuePolicyRegistry,
};
use crate::expression::Expression;
use crate::rhai_backend::RhaiScriptBackend;

/// Constructor for one evaluator kind.
pub trait EvaluatorFactory: Send + Sync {
    fn create(&self, config: &ExpressionConfig, factory: &ExpressionFactory) -> Result<Evaluator>;
}

impl<F> EvaluatorFactory for F
where
    F: Fn(&ExpressionConfig, &ExpressionFactory) -> Result<Evaluator> + Send + Sync,
{
    fn create(&self, config: &ExpressionConfig, factory: &ExpressionFactory) -> Result<Evaluator> {
        self(config, factory)
    }
}

/// Evaluator constructors keyed by kind tag.
#[derive(Clone)]
pub struct EvaluatorRegistry {
    constructors: HashMap<String, Arc<dyn EvaluatorFactory>>,
}

impl EvaluatorRegistry {
    /// Registry with the built-in kinds.
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register(kinds::LITERAL, |config: &ExpressionConfig, _: &ExpressionFactory| {
            LiteralEvaluator::compile(config).map(Evaluator::Literal)
        });
        registry.register(kinds::AS_IS, |_: &ExpressionConfig, _: &ExpressionFactory| {
            Ok(Evaluator::AsIs(AsIsEvaluator))
        });
        registry.register(kinds::PATH, |config: &ExpressionConfig, _: &ExpressionFactory| {
            PathEvaluator::compile(config).map(Evaluator::Path)
        });
        registry.register(
            kinds::GENERATE,
            |config: &ExpressionConfig, factory: &ExpressionFactory| {
                GenerateEvaluator::compile(config, factory.value_policies()).map(Evaluator::Generate)
            },
        );
        registry.register(
            kinds::SCRIPT,
            |config: &ExpressionConfig, factory: &ExpressionFactory| {
                ScriptEvaluator::compile(config, factory.script_backends()).map(Evaluator::Script)
            },
        );
        registry
    }

    /// Registry without any kinds.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            constructors: HashMap::new(),
        }
    }

    /// Register (or replace) the constructor for a kind.
    pub fn register(&mut self, kind: impl Into<String>, factory: impl EvaluatorFactory + 'static) {
        self.constructors.insert(kind.into(), Arc::new(factory));
    }

    #[must_use]
    pub fn contains(&self, kind: &str) -> bool {
        self.constructors.contains_key(kind)
    }

    fn get(&self, kind: &str) -> Result<Arc<dyn EvaluatorFactory>> {
        self.constructors
            .get(kind)
            .cloned()
            .ok_or_else(|| ExpressionError::schema(format!("unknown expression kind '{kind}'")))
    }
}

impl Default for EvaluatorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EvaluatorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<&String> = self.constructors.keys().collect();
        kinds.sort();
        f.debug_struct("EvaluatorRegistry").field("kinds", &kinds).finish()
    }
}

/// Compiles expression configurations.
///
/// Holds the evaluator registry together with the collaborators built-in
/// kinds need (value policies, script backends). Built once at startup and
/// shared read-only.
#[derive(Debug, Clone)]
pub struct ExpressionFactory {
    evaluators: EvaluatorRegistry,
    value_policies: ValuePolicyRegistry,
    script_backends: ScriptBackendRegistry,
}

impl ExpressionFactory {
    /// Factory with the built-in kinds, the default value policy and the
    /// Rhai script backend.
    #[must_use]
    pub fn new() -> Self {
        let mut script_backends = ScriptBackendRegistry::new();
        script_backends.register(Arc::new(RhaiScriptBackend::new()));
        Self {
            evaluators: EvaluatorRegistry::new(),
            value_policies: ValuePolicyRegistry::new(),
            script_backends,
        }
    }

    #[must_use]
    pub fn with_evaluator(
        mut self,
        kind: impl Into<String>,
        factory: impl EvaluatorFactory + 'static,
    ) -> Self {
        self.evaluators.register(kind, factory);
        self
    }

    #[must_use]
    pub fn with_value_policy(mut self, policy: Arc<dyn ValuePolicy>) -> Self {
        self.value_policies.register(policy);
        self
    }

    #[must_use]
    pub fn with_script_backend(mut self, backend: Arc<dyn ScriptBackend>) -> Self {
        self.script_backends.register(backend);
        self
    }

    #[must_use]
    pub fn evaluators(&self) -> &EvaluatorRegistry {
        &self.evaluators
    }

    #[must_use]
    pub fn value_policies(&self) -> &ValuePolicyRegistry {
        &self.value_policies
    }

    #[must_use]
    pub fn script_backends(&self) -> &ScriptBackendRegistry {
        &self.script_backends
    }

    /// Compile a configuration, including its condition, into an expression.
    pub fn compile(&self, config: &ExpressionConfig) -> Result<Expression> {
        debug!(kind = %config.kind, name = %config.label(), "Compiling expression");
        let evaluator = self.evaluators.get(&config.kind)?.create(config, self)?;
        let condition = match &config.condition {
            Some(condition) => Some(self.compile(condition)?),
            None => None,
        };
        Ok(Expression::new(config.label(), evaluator, condition))
    }
}

impl Default for ExpressionFactory {
    fn default() -> Self {
        Self::new()
    }
}
