// crates/brewlog-core/src/core/path.rs
// ============================================================================
// Module: Tree Paths
// Description: Slash-separated addresses into the hierarchical store.
// Purpose: Keep path construction and segment validation in one place.
// Dependencies: crate::core::identifiers
// ============================================================================

//! ## Overview
//! A [`TreePath`] is an ordered list of validated key segments. The root path
//! has no segments. Paths render as `a/b/c` and are the only way record stores
//! address the driver.

use std::fmt;

use crate::core::identifiers::IdentifierError;
use crate::core::identifiers::RecordId;
use crate::core::identifiers::validate_segment;

/// Address of a node in the hierarchical store.
///
/// # Invariants
/// - Every segment passes [`validate_segment`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct TreePath {
    /// Validated path segments, outermost first.
    segments: Vec<String>,
}

impl TreePath {
    /// Returns the root path.
    #[must_use]
    pub const fn root() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    /// Parses a slash-separated path. Leading and trailing slashes are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`IdentifierError`] when any segment is invalid, including empty
    /// segments produced by `//`.
    pub fn parse(path: &str) -> Result<Self, IdentifierError> {
        let trimmed = path.trim_matches('/');
        if trimmed.is_empty() {
            return Ok(Self::root());
        }
        let mut segments = Vec::new();
        for segment in trimmed.split('/') {
            validate_segment("path segment", segment)?;
            segments.push(segment.to_string());
        }
        Ok(Self {
            segments,
        })
    }

    /// Returns a child path with one more segment.
    ///
    /// # Errors
    ///
    /// Returns [`IdentifierError`] when `segment` is invalid.
    pub fn child(&self, segment: &str) -> Result<Self, IdentifierError> {
        validate_segment("path segment", segment)?;
        let mut segments = self.segments.clone();
        segments.push(segment.to_string());
        Ok(Self {
            segments,
        })
    }

    /// Returns the path of a record within this collection path.
    #[must_use]
    pub fn record(&self, id: &RecordId) -> Self {
        let mut segments = self.segments.clone();
        segments.push(id.as_str().to_string());
        Self {
            segments,
        }
    }

    /// Returns the parent path, or `None` at the root.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        let (_, rest) = self.segments.split_last()?;
        Some(Self {
            segments: rest.to_vec(),
        })
    }

    /// Returns the final segment, or `None` at the root.
    #[must_use]
    pub fn last(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Returns the path segments.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Returns true for the root path.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns true when `self` is a strict ancestor of `other`.
    #[must_use]
    pub fn is_ancestor_of(&self, other: &Self) -> bool {
        self.segments.len() < other.segments.len() && other.segments.starts_with(&self.segments)
    }

    /// Returns every non-root prefix of this path, shortest first, including
    /// the path itself.
    #[must_use]
    pub fn prefixes(&self) -> Vec<Self> {
        (1 ..= self.segments.len())
            .map(|len| Self {
                segments: self.segments[.. len].to_vec(),
            })
            .collect()
    }
}

impl fmt::Display for TreePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}
