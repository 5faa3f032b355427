//! Dotted path keys.
//!
//! A path like `local.user.profile` addresses a node in the state tree.
//! The empty string addresses the root.

use std::fmt;
use std::str::FromStr;

use crate::error::StoreError;

/// A parsed dotted path, stored as its segments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct PathKey {
    segments: Vec<String>,
}

impl PathKey {
    /// The root path (whole tree).
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a dotted string. `""` is the root; empty segments are rejected.
    pub fn parse(input: &str) -> Result<Self, StoreError> {
        if input.is_empty() {
            return Ok(Self::root());
        }

        let mut segments = Vec::new();
        for part in input.split('.') {
            if part.is_empty() {
                return Err(StoreError::InvalidPath {
                    path: input.to_string(),
                    reason: "empty segment".to_string(),
                });
            }
            segments.push(part.to_string());
        }

        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Split into (parent segments, last segment). `None` for the root.
    pub fn split_last(&self) -> Option<(&[String], &str)> {
        self.segments
            .split_last()
            .map(|(last, parents)| (parents, last.as_str()))
    }

    /// The path made of the first `len` segments.
    pub fn prefix(&self, len: usize) -> PathKey {
        PathKey {
            segments: self.segments[..len.min(self.segments.len())].to_vec(),
        }
    }

    /// True if `self` is `other` or one of its ancestors.
    ///
    /// Compares whole segments: `a.b` is an ancestor of `a.b.c` but not of
    /// `a.bc`. The root is an ancestor of everything.
    pub fn is_ancestor_or_equal(&self, other: &PathKey) -> bool {
        self.segments.len() <= other.segments.len()
            && self
                .segments
                .iter()
                .zip(&other.segments)
                .all(|(a, b)| a == b)
    }

    /// Format back to a dotted string.
    pub fn to_dotted(&self) -> String {
        self.segments.join(".")
    }
}

impl fmt::Display for PathKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_dotted())
    }
}

impl FromStr for PathKey {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
