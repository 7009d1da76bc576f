// crates/brewlog-core/src/runtime/caller.rs
// ============================================================================
// Module: Caller Identity
// Description: Identity and access level of the party issuing a request.
// Purpose: Gate record visibility by ownership.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! A [`Caller`] pairs the authenticated owner identity with an [`Access`]
//! level. Owner-scoped callers see only records they created; privileged
//! callers see every valid record but still stamp their own identity on the
//! records they create. The store performs no authentication itself.

use serde::Deserialize;
use serde::Serialize;

use crate::core::OwnerId;
use crate::core::Record;
use crate::core::RecordShape;

/// Access level granted to a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Access {
    /// Reads, updates and deletes are limited to owned records.
    Owner,
    /// Ownership filters are bypassed for reads, updates, deletes and lists.
    Privileged,
}

/// Party issuing a record store request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Caller {
    /// Authenticated owner identity.
    id: OwnerId,
    /// Granted access level.
    access: Access,
}

impl Caller {
    /// Creates a caller with an explicit access level.
    #[must_use]
    pub const fn new(id: OwnerId, access: Access) -> Self {
        Self {
            id,
            access,
        }
    }

    /// Creates an owner-scoped caller.
    #[must_use]
    pub const fn owner(id: OwnerId) -> Self {
        Self::new(id, Access::Owner)
    }

    /// Creates a privileged caller.
    #[must_use]
    pub const fn privileged(id: OwnerId) -> Self {
        Self::new(id, Access::Privileged)
    }

    /// Returns the caller identity.
    #[must_use]
    pub const fn id(&self) -> &OwnerId {
        &self.id
    }

    /// Returns the caller access level.
    #[must_use]
    pub const fn access(&self) -> Access {
        self.access
    }

    /// Returns true for privileged callers.
    #[must_use]
    pub const fn is_privileged(&self) -> bool {
        matches!(self.access, Access::Privileged)
    }

    /// Returns true when the caller may see `record` stored in `shape`.
    #[must_use]
    pub fn can_access(&self, shape: RecordShape, record: &Record) -> bool {
        self.is_privileged() || shape.is_owned_by(record, &self.id)
    }
}
