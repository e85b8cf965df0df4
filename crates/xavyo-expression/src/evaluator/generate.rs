use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::{Arc, Mutex};

use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::Deserialize;
use tracing::debug;
use xavyo_delta::{DeltaSetTriple, Value};

use crate::config::ExpressionConfig;
use crate::context::EvaluationContext;
use crate::error::{ExpressionError, Result};

/// Name of the policy used when a `generate` expression names none.
pub const DEFAULT_VALUE_POLICY: &str = "default";

const DEFAULT_GENERATED_LENGTH: usize = 16;

/// Produces fresh values (passwords, unique identifiers, ...).
///
/// Every call is expected to return a different value.
pub trait ValuePolicy: Send + Sync + Debug {
    fn name(&self) -> &str;

    fn generate(&self) -> Result<Value>;
}

/// Random alphanumeric string of fixed length.
#[derive(Debug, Clone)]
pub struct RandomAlphanumericPolicy {
    name: String,
    length: usize,
}

impl RandomAlphanumericPolicy {
    pub fn new(name: impl Into<String>, length: usize) -> Self {
        Self {
            name: name.into(),
            length,
        }
    }
}

impl Default for RandomAlphanumericPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_VALUE_POLICY, DEFAULT_GENERATED_LENGTH)
    }
}

impl ValuePolicy for RandomAlphanumericPolicy {
    fn name(&self) -> &str {
        &self.name
    }

    fn generate(&self) -> Result<Value> {
        if self.length == 0 {
            return Err(ExpressionError::schema(format!(
                "value policy '{}' has zero length",
                self.name
            )));
        }
        let generated: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(self.length)
            .map(char::from)
            .collect();
        Ok(Value::String(generated))
    }
}

/// Value policies keyed by name.
#[derive(Debug, Clone)]
pub struct ValuePolicyRegistry {
    policies: HashMap<String, Arc<dyn ValuePolicy>>,
}

impl ValuePolicyRegistry {
    /// Registry with the default random policy.
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Self {
            policies: HashMap::new(),
        };
        registry.register(Arc::new(RandomAlphanumericPolicy::default()));
        registry
    }

    pub fn register(&mut self, policy: Arc<dyn ValuePolicy>) {
        self.policies.insert(policy.name().to_string(), policy);
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn ValuePolicy>> {
        self.policies
            .get(name)
            .cloned()
            .ok_or_else(|| ExpressionError::object_not_found("ValuePolicy", name))
    }
}

impl Default for ValuePolicyRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct GenerateBody {
    #[serde(default)]
    policy: Option<String>,
}

/// Generates a value through a named policy.
///
/// Never cached: each evaluation calls the policy again. Calls on one
/// instance are serialized.
#[derive(Debug)]
pub struct GenerateEvaluator {
    policy: Arc<dyn ValuePolicy>,
    guard: Mutex<()>,
}

impl GenerateEvaluator {
    #[must_use]
    pub fn new(policy: Arc<dyn ValuePolicy>) -> Self {
        Self {
            policy,
            guard: Mutex::new(()),
        }
    }

    pub fn compile(config: &ExpressionConfig, policies: &ValuePolicyRegistry) -> Result<Self> {
        let body: GenerateBody = config.parse_body()?;
        let name = body.policy.as_deref().unwrap_or(DEFAULT_VALUE_POLICY);
        Ok(Self::new(policies.get(name)?))
    }

    pub fn evaluate(&self, ctx: &EvaluationContext<'_>) -> Result<DeltaSetTriple<Value>> {
        let _serialized = self
            .guard
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        ctx.task.check()?;
        debug!(policy = %self.policy.name(), expression = %ctx.description, "Generating value");
        let value = self.policy.generate()?;
        Ok(DeltaSetTriple::zero_only(vec![value]))
    }
}
