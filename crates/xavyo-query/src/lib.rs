//! # Filters
//!
//! Predicate trees used for correlation searches and protected-object
//! patterns.
//!
//! - [`FilterTemplate`] - persisted form, value nodes may embed expressions
//! - [`ObjectFilter`] - bound form, literal values only
//!
//! Binding and matching are separate passes: templates are bound once per
//! notification, then the bound filter is either matched in memory or handed
//! to a repository search.
//!
//! ## Example
//!
//! ```
//! use xavyo_core::TaskContext;
//! use xavyo_delta::{Entity, MatchingRuleRegistry, Value};
//! use xavyo_expression::{ExpressionConfig, ExpressionFactory, VariableMap};
//! use xavyo_query::FilterTemplate;
//!
//! let template = FilterTemplate::equals_expression(
//!     "name".parse().unwrap(),
//!     ExpressionConfig::path("$shadow/uid"),
//! );
//!
//! let shadow = Entity::new(uuid::Uuid::new_v4(), "shadow").with_item("uid", vec![Value::from("jack")]);
//! let variables = VariableMap::new().with_entity("shadow", shadow);
//! let filter = template
//!     .bind(&ExpressionFactory::new(), &variables, &TaskContext::new())
//!     .unwrap();
//!
//! let user = Entity::new(uuid::Uuid::new_v4(), "user").with_item("name", vec![Value::from("jack")]);
//! assert!(filter.matches(&user, &MatchingRuleRegistry::new()).unwrap());
//! ```

pub mod error;
pub mod filter;
pub mod template;

pub use error::{FilterError, Result};
pub use filter::ObjectFilter;
pub use template::{FilterOperand, FilterTemplate, NoValueInterpretation};
