//! # Expressions and Mappings
//!
//! Evaluates configured expressions against variables and changing sources,
//! producing [`DeltaSetTriple`](xavyo_delta::DeltaSetTriple)s of values.
//!
//! - [`ExpressionConfig`] - persisted expression, selected by a kind tag
//! - [`ExpressionFactory`] / [`EvaluatorRegistry`] - kind tag to constructor
//! - [`Expression`] - compiled expression with condition gating
//! - [`Mapping`] - expression bound to a target item, with strength
//! - [`RhaiScriptBackend`] - sandboxed scripting for `script` expressions
//!
//! ## Example
//!
//! ```
//! use xavyo_core::TaskContext;
//! use xavyo_delta::{Entity, Value};
//! use xavyo_expression::{
//!     EvaluationContext, ExpressionConfig, ExpressionFactory, OutputType, VariableMap,
//! };
//!
//! let factory = ExpressionFactory::new();
//! let expression = factory
//!     .compile(&ExpressionConfig::script("rhai", r#"shadow.uid + "@example.com""#))
//!     .unwrap();
//!
//! let shadow = Entity::new(uuid::Uuid::new_v4(), "shadow").with_item("uid", vec![Value::from("jack")]);
//! let variables = VariableMap::new().with_entity("shadow", shadow);
//! let task = TaskContext::new();
//! let ctx = EvaluationContext::new(&variables, &[], &task);
//!
//! let triple = expression.evaluate(&ctx, &OutputType::any()).unwrap().unwrap();
//! assert_eq!(triple.zero(), &[Value::from("jack@example.com")]);
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod evaluator;
pub mod expression;
pub mod mapping;
pub mod output;
pub mod registry;
pub mod rhai_backend;
pub mod variables;

pub use config::ExpressionConfig;
pub use context::{EvaluationContext, EvaluationState};
pub use error::{ExpressionError, Result};
pub use evaluator::{
    Evaluator, ExpressionEvaluator, ScriptBackend, ScriptBindings, ValuePolicy, ValuePolicyRegistry,
};
pub use expression::{ConditionOutcome, Expression};
pub use mapping::{Mapping, MappingConfig, MappingOutput, MappingSourceConfig, MappingStrength};
pub use output::{OutputKind, OutputType};
pub use registry::{EvaluatorFactory, EvaluatorRegistry, ExpressionFactory};
pub use rhai_backend::{RhaiBackendConfig, RhaiScriptBackend};
pub use variables::{Source, VariableMap, VariableValue};
