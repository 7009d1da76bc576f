// crates/brewlog-core/src/core/identifiers.rs
// ============================================================================
// Module: Brewlog Identifiers
// Description: Opaque identifiers for record owners and stored records.
// Purpose: Provide strongly typed, serializable IDs with validated string forms.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! Owner identifiers are opaque tokens supplied by the authentication
//! collaborator; the store never interprets them beyond equality. Record
//! identifiers double as tree path segments and therefore follow the
//! hierarchical store's key rules.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum length of a single key segment in bytes.
pub const MAX_SEGMENT_BYTES: usize = 768;
/// Characters the hierarchical store rejects inside a key segment.
const FORBIDDEN_SEGMENT_CHARS: [char; 6] = ['/', '.', '#', '$', '[', ']'];

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Identifier validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    /// Identifier was empty.
    #[error("{kind} must not be empty")]
    Empty {
        /// Identifier kind label.
        kind: &'static str,
    },
    /// Identifier exceeded the segment length limit.
    #[error("{kind} exceeds the segment length limit")]
    TooLong {
        /// Identifier kind label.
        kind: &'static str,
    },
    /// Identifier contained a character the store rejects.
    #[error("{kind} contains forbidden character '{found}'")]
    ForbiddenChar {
        /// Identifier kind label.
        kind: &'static str,
        /// Offending character.
        found: char,
    },
}

/// Validates a single key segment against the store's key rules.
///
/// # Errors
///
/// Returns [`IdentifierError`] when the segment is empty, too long, or holds a
/// forbidden or control character.
pub fn validate_segment(kind: &'static str, value: &str) -> Result<(), IdentifierError> {
    if value.is_empty() {
        return Err(IdentifierError::Empty {
            kind,
        });
    }
    if value.len() > MAX_SEGMENT_BYTES {
        return Err(IdentifierError::TooLong {
            kind,
        });
    }
    if let Some(found) =
        value.chars().find(|ch| FORBIDDEN_SEGMENT_CHARS.contains(ch) || ch.is_control())
    {
        return Err(IdentifierError::ForbiddenChar {
            kind,
            found,
        });
    }
    Ok(())
}

// ============================================================================
// SECTION: Identifier Types
// ============================================================================

/// Identity of the caller that created (and therefore owns) a record.
///
/// # Invariants
/// - Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OwnerId(String);

impl OwnerId {
    /// Creates a new owner identifier.
    ///
    /// # Errors
    ///
    /// Returns [`IdentifierError::Empty`] when `id` is empty.
    pub fn new(id: impl Into<String>) -> Result<Self, IdentifierError> {
        let id = id.into();
        if id.is_empty() {
            return Err(IdentifierError::Empty {
                kind: "owner id",
            });
        }
        Ok(Self(id))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl TryFrom<String> for OwnerId {
    type Error = IdentifierError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for OwnerId {
    type Error = IdentifierError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<OwnerId> for String {
    fn from(value: OwnerId) -> Self {
        value.0
    }
}

/// Identifier of a record within its collection.
///
/// # Invariants
/// - Always a valid tree path segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RecordId(String);

impl RecordId {
    /// Creates a new record identifier.
    ///
    /// # Errors
    ///
    /// Returns [`IdentifierError`] when `id` is not a valid key segment.
    pub fn new(id: impl Into<String>) -> Result<Self, IdentifierError> {
        let id = id.into();
        validate_segment("record id", &id)?;
        Ok(Self(id))
    }

    /// Wraps an id built only from characters known to be segment-safe.
    pub(crate) const fn from_generated(id: String) -> Self {
        Self(id)
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl TryFrom<String> for RecordId {
    type Error = IdentifierError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for RecordId {
    type Error = IdentifierError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RecordId> for String {
    fn from(value: RecordId) -> Self {
        value.0
    }
}

impl From<RecordId> for OwnerId {
    /// Records keyed by owner (such as user profiles) map their id to the owner.
    fn from(value: RecordId) -> Self {
        Self(value.0)
    }
}
