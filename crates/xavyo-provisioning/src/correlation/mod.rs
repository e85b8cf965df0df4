//! Correlation: finding the owner of an unlinked shadow.
//!
//! Each [`ConditionalFilter`] is a guard expression plus a filter template.
//! A rule whose guard is false performs no search. Candidates found by all
//! rules are deduplicated and then narrowed by the confirmation expression.

pub mod config;
pub mod engine;

pub use config::{ConditionalFilter, CorrelationConfig};
pub use engine::{correlation_variables, CorrelationEngine};
