//! # Delta Algebra
//!
//! Value model and change representation shared by expressions, filters and
//! the synchronization engine.
//!
//! - [`Value`] - typed scalar, reference, or structured value
//! - [`ItemPath`] - slash-separated path into an [`Entity`]
//! - [`DeltaSetTriple`] - zero/plus/minus partition of a value transition
//! - [`ItemDelta`] / [`ObjectDelta`] - path-addressed and whole-object changes
//! - [`MatchingRuleRegistry`] - pluggable value equality (case-insensitive, DN, ...)
//!
//! ## Example
//!
//! ```
//! use xavyo_delta::{DeltaSetTriple, ItemDelta, ItemPath, MatchingRuleRegistry, Value};
//!
//! let registry = MatchingRuleRegistry::new();
//! let rule = registry.default_rule();
//!
//! let old = vec![Value::from("a"), Value::from("b")];
//! let delta = ItemDelta::add("attributes/group".parse().unwrap(), vec![Value::from("c")])
//!     .with_delete(vec![Value::from("a")]);
//!
//! let triple = delta.to_triple(&old, rule.as_ref());
//! assert_eq!(triple.zero(), &[Value::from("b")]);
//! assert_eq!(triple.plus(), &[Value::from("c")]);
//! assert_eq!(triple.minus(), &[Value::from("a")]);
//! # let _: ItemPath = "x".parse().unwrap();
//! # let _ = DeltaSetTriple::<Value>::empty();
//! ```

pub mod entity;
pub mod error;
pub mod item_delta;
pub mod matching;
pub mod object_delta;
pub mod path;
pub mod triple;
pub mod value;

pub use entity::Entity;
pub use error::{DeltaError, Result};
pub use item_delta::ItemDelta;
pub use matching::{MatchingRule, MatchingRuleRegistry, DEFAULT_MATCHING_RULE};
pub use object_delta::{DeltaKind, ObjectDelta};
pub use path::ItemPath;
pub use triple::DeltaSetTriple;
pub use value::{ObjectRef, PolyString, Value, ValueKind};
