//! Reactions to resolved situations.
//!
//! The engine does not run reactions itself. It looks up the actions for the
//! resolved situation and carries them in the context for the downstream
//! collaborator.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::shadow::SyncSituation;

/// Action requested for a situation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncAction {
    /// Create a focus from the shadow.
    AddFocus,
    /// Link the shadow to its owner.
    Link,
    /// Remove the link.
    Unlink,
    /// Push inbound values to the focus.
    Synchronize,
    DeleteFocus,
    InactivateFocus,
    /// Do nothing.
    None,
}

impl SyncAction {
    /// Convert to string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncAction::AddFocus => "add_focus",
            SyncAction::Link => "link",
            SyncAction::Unlink => "unlink",
            SyncAction::Synchronize => "synchronize",
            SyncAction::DeleteFocus => "delete_focus",
            SyncAction::InactivateFocus => "inactivate_focus",
            SyncAction::None => "none",
        }
    }

    /// Whether the action changes the focus object.
    #[must_use]
    pub fn modifies_focus(&self) -> bool {
        matches!(
            self,
            SyncAction::AddFocus
                | SyncAction::Synchronize
                | SyncAction::DeleteFocus
                | SyncAction::InactivateFocus
        )
    }
}

impl fmt::Display for SyncAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Actions for one situation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReaction {
    pub situation: SyncSituation,
    #[serde(default)]
    pub actions: Vec<SyncAction>,
}

/// Reaction table of a resource.
///
/// Defaults:
///
/// | situation | actions        |
/// |-----------|----------------|
/// | linked    | synchronize    |
/// | unlinked  | link           |
/// | unmatched | add_focus      |
/// | disputed  | none           |
/// | deleted   | unlink         |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReactionConfig {
    pub reactions: Vec<SyncReaction>,
}

impl Default for SyncReactionConfig {
    fn default() -> Self {
        let reaction = |situation, actions: &[SyncAction]| SyncReaction {
            situation,
            actions: actions.to_vec(),
        };
        Self {
            reactions: vec![
                reaction(SyncSituation::Linked, &[SyncAction::Synchronize]),
                reaction(SyncSituation::Unlinked, &[SyncAction::Link]),
                reaction(SyncSituation::Unmatched, &[SyncAction::AddFocus]),
                reaction(SyncSituation::Disputed, &[SyncAction::None]),
                reaction(SyncSituation::Deleted, &[SyncAction::Unlink]),
            ],
        }
    }
}

impl SyncReactionConfig {
    /// Table without any reaction.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            reactions: Vec::new(),
        }
    }

    /// Replace the actions of a situation.
    #[must_use]
    pub fn with_reaction(mut self, situation: SyncSituation, actions: Vec<SyncAction>) -> Self {
        self.reactions.retain(|r| r.situation != situation);
        self.reactions.push(SyncReaction { situation, actions });
        self
    }

    /// Actions configured for `situation`, empty when none are.
    #[must_use]
    pub fn actions_for(&self, situation: SyncSituation) -> Vec<SyncAction> {
        self.reactions
            .iter()
            .find(|r| r.situation == situation)
            .map(|r| r.actions.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table() {
        let config = SyncReactionConfig::default();
        assert_eq!(
            config.actions_for(SyncSituation::Linked),
            vec![SyncAction::Synchronize]
        );
        assert_eq!(
            config.actions_for(SyncSituation::Unmatched),
            vec![SyncAction::AddFocus]
        );
        assert!(SyncReactionConfig::empty()
            .actions_for(SyncSituation::Linked)
            .is_empty());
    }

    #[test]
    fn test_override() {
        let config = SyncReactionConfig::default().with_reaction(
            SyncSituation::Deleted,
            vec![SyncAction::Unlink, SyncAction::InactivateFocus],
        );
        assert_eq!(
            config.actions_for(SyncSituation::Deleted),
            vec![SyncAction::Unlink, SyncAction::InactivateFocus]
        );
        assert_eq!(config.reactions.len(), 5);
    }

    #[test]
    fn test_modifies_focus() {
        assert!(SyncAction::AddFocus.modifies_focus());
        assert!(!SyncAction::Link.modifies_focus());
        assert!(!SyncAction::None.modifies_focus());
    }
}
