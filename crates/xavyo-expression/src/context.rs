//! Evaluation context.
//!
//! An immutable, request-scoped view of everything one evaluation may read.

use serde::{Deserialize, Serialize};
use xavyo_core::TaskContext;
use xavyo_delta::matching::BuiltinRule;
use xavyo_delta::{DeltaSetTriple, MatchingRule, Value};

use crate::variables::{Source, VariableMap};

/// Which state of the sources an evaluator sees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationState {
    /// Sources carry their pending deltas.
    #[default]
    Delta,
    /// Sources pinned to their values before the change.
    Old,
    /// Sources pinned to their values after the change.
    New,
}

static DEFAULT_RULE: BuiltinRule = BuiltinRule::Default;

/// Inputs of a single evaluation.
#[derive(Debug, Clone, Copy)]
pub struct EvaluationContext<'a> {
    pub variables: &'a VariableMap,
    pub sources: &'a [Source],
    pub task: &'a TaskContext,
    pub state: EvaluationState,
    /// Short description used in log fields and error messages.
    pub description: &'a str,
}

impl<'a> EvaluationContext<'a> {
    pub fn new(variables: &'a VariableMap, sources: &'a [Source], task: &'a TaskContext) -> Self {
        Self {
            variables,
            sources,
            task,
            state: EvaluationState::Delta,
            description: "expression",
        }
    }

    #[must_use]
    pub fn with_state(self, state: EvaluationState) -> Self {
        Self { state, ..self }
    }

    #[must_use]
    pub fn with_description(self, description: &'a str) -> Self {
        Self {
            description,
            ..self
        }
    }

    /// Rule used to compare source values.
    #[must_use]
    pub fn rule(&self) -> &'static dyn MatchingRule {
        &DEFAULT_RULE
    }

    #[must_use]
    pub fn source(&self, name: &str) -> Option<&'a Source> {
        self.sources.iter().find(|s| s.name == name)
    }

    /// True when at least one source changes and the state is not pinned.
    #[must_use]
    pub fn has_changing_sources(&self) -> bool {
        self.state == EvaluationState::Delta && self.sources.iter().any(Source::has_changes)
    }

    /// Triple of a source as seen in the current state.
    #[must_use]
    pub fn source_triple(&self, source: &Source) -> DeltaSetTriple<Value> {
        match self.state {
            EvaluationState::Delta => source.triple(self.rule()),
            state => DeltaSetTriple::zero_only(source.values(state, self.rule())),
        }
    }
}
