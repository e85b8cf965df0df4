//! Item paths.
//!
//! A path is a sequence of item names separated by `/`, e.g.
//! `attributes/mail` or `extension/address/city`. Paths are resolved through
//! structured values.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DeltaError;

/// Slash-separated path into an [`Entity`](crate::Entity).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ItemPath(Vec<String>);

impl ItemPath {
    /// The empty path, addressing the entity itself.
    #[must_use]
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Build a path from already-validated segments.
    pub fn from_segments<I, S>(segments: I) -> Result<Self, DeltaError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if let Some(bad) = segments.iter().find(|s| s.is_empty() || s.contains('/')) {
            return Err(DeltaError::invalid_path(
                segments.join("/"),
                format!("invalid segment '{bad}'"),
            ));
        }
        Ok(Self(segments))
    }

    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    #[must_use]
    pub fn first(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    #[must_use]
    pub fn last(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    /// Path without its first segment.
    #[must_use]
    pub fn rest(&self) -> ItemPath {
        Self(self.0.iter().skip(1).cloned().collect())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Append one segment.
    #[must_use]
    pub fn child(&self, name: impl Into<String>) -> ItemPath {
        let mut segments = self.0.clone();
        segments.push(name.into());
        Self(segments)
    }

    /// True when `self` is `other` or one of its ancestors.
    #[must_use]
    pub fn is_prefix_of(&self, other: &ItemPath) -> bool {
        other.0.len() >= self.0.len() && other.0[..self.0.len()] == self.0[..]
    }
}

impl fmt::Display for ItemPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("/"))
    }
}

impl FromStr for ItemPath {
    type Err = DeltaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_start_matches('/');
        if trimmed.is_empty() {
            return Ok(Self::root());
        }
        let segments: Vec<String> = trimmed.split('/').map(|seg| seg.trim().to_string()).collect();
        if segments.iter().any(String::is_empty) {
            return Err(DeltaError::invalid_path(s, "empty segment"));
        }
        Ok(Self(segments))
    }
}

impl TryFrom<String> for ItemPath {
    type Error = DeltaError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ItemPath> for String {
    fn from(path: ItemPath) -> Self {
        path.to_string()
    }
}
