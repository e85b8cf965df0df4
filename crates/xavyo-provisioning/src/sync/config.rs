//! Per-resource sync configuration.

use serde::{Deserialize, Serialize};
use xavyo_expression::MappingConfig;
use xavyo_query::FilterTemplate;

use super::error::{SyncError, SyncResult};
use super::reaction::SyncReactionConfig;
use crate::correlation::CorrelationConfig;

/// Everything the engine needs to know about one resource.
///
/// Parsed from JSON at startup and compiled once by the engine builder.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceSyncConfig {
    /// Correlation rules and confirmation.
    pub correlation: CorrelationConfig,

    /// Shadows matching any of these patterns are left alone.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub protected: Vec<FilterTemplate>,

    /// Actions per resolved situation.
    pub reactions: SyncReactionConfig,

    /// Shadow to focus mappings, applied on a linked resolution.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub inbound: Vec<MappingConfig>,
}

impl ResourceSyncConfig {
    /// Parse a configuration document.
    pub fn from_json(json: &str) -> SyncResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| SyncError::configuration(format!("invalid resource sync config: {e}")))
    }

    #[must_use]
    pub fn with_correlation(mut self, correlation: CorrelationConfig) -> Self {
        self.correlation = correlation;
        self
    }

    #[must_use]
    pub fn with_protected(mut self, pattern: FilterTemplate) -> Self {
        self.protected.push(pattern);
        self
    }

    #[must_use]
    pub fn with_reactions(mut self, reactions: SyncReactionConfig) -> Self {
        self.reactions = reactions;
        self
    }

    #[must_use]
    pub fn with_inbound(mut self, mapping: MappingConfig) -> Self {
        self.inbound.push(mapping);
        self
    }
}
