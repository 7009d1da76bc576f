// crates/brewlog-core/src/core/shape.rs
// ============================================================================
// Module: Record Shapes
// Description: Location of audit fields within a stored record.
// Purpose: Stamp and read owner and timestamps for flat and nested records.
// Dependencies: serde, serde_json, crate::core::{identifiers, schema, time}
// ============================================================================

//! ## Overview
//! Every collection declares its [`RecordShape`] once, when its descriptor is
//! built. Flat records keep `createdBy`, `createdAt` and `updatedAt` at the top
//! level; nested records keep them inside a `metadata` object next to the
//! collection's own metadata fields.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use crate::core::Record;
use crate::core::identifiers::OwnerId;
use crate::core::schema::ValidationIssue;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Field Names
// ============================================================================

/// Field holding the record's own identifier.
pub const ID_FIELD: &str = "id";
/// Field holding the nested audit object.
pub const METADATA_FIELD: &str = "metadata";
/// Audit field naming the record owner.
pub const CREATED_BY_FIELD: &str = "createdBy";
/// Audit field holding the creation time.
pub const CREATED_AT_FIELD: &str = "createdAt";
/// Audit field holding the last update time.
pub const UPDATED_AT_FIELD: &str = "updatedAt";
/// All audit field names.
pub const AUDIT_FIELDS: [&str; 3] = [CREATED_BY_FIELD, CREATED_AT_FIELD, UPDATED_AT_FIELD];

// ============================================================================
// SECTION: Shapes
// ============================================================================

/// Where a collection keeps its audit fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordShape {
    /// Audit fields live at the top level of the record.
    Flat,
    /// Audit fields live inside the record's `metadata` object.
    NestedMetadata,
}

impl RecordShape {
    /// Returns the audit object of `record`, if present.
    #[must_use]
    pub fn audit<'a>(self, record: &'a Record) -> Option<&'a Record> {
        match self {
            Self::Flat => Some(record),
            Self::NestedMetadata => record.get(METADATA_FIELD).and_then(Value::as_object),
        }
    }

    /// Returns the owner stamped on `record`.
    #[must_use]
    pub fn owner(self, record: &Record) -> Option<&str> {
        self.audit(record)?.get(CREATED_BY_FIELD).and_then(Value::as_str)
    }

    /// Returns true when `record` is owned by `owner`.
    #[must_use]
    pub fn is_owned_by(self, record: &Record, owner: &OwnerId) -> bool {
        self.owner(record) == Some(owner.as_str())
    }

    /// Returns the creation time stamped on `record`.
    #[must_use]
    pub fn created_at(self, record: &Record) -> Option<Timestamp> {
        self.audit(record)?
            .get(CREATED_AT_FIELD)
            .and_then(Value::as_i64)
            .map(Timestamp::from_unix_millis)
    }

    /// Returns the last update time stamped on `record`.
    #[must_use]
    pub fn updated_at(self, record: &Record) -> Option<Timestamp> {
        self.audit(record)?
            .get(UPDATED_AT_FIELD)
            .and_then(Value::as_i64)
            .map(Timestamp::from_unix_millis)
    }

    /// Returns a mutable audit object, creating `metadata` for nested records.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationIssue`] when a nested record's `metadata` holds a
    /// non-object value.
    pub fn audit_mut(self, record: &mut Record) -> Result<&mut Record, ValidationIssue> {
        match self {
            Self::Flat => Ok(record),
            Self::NestedMetadata => {
                let slot =
                    record.entry(METADATA_FIELD).or_insert_with(|| Value::Object(Map::new()));
                if slot.is_null() {
                    *slot = Value::Object(Map::new());
                }
                slot.as_object_mut().ok_or_else(metadata_not_object)
            }
        }
    }

    /// Stamps creation audit fields onto a new record.
    ///
    /// Nested records drop any top-level audit fields so a collection never
    /// mixes shapes.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationIssue`] when a nested record's `metadata` holds a
    /// non-object value.
    pub fn stamp_create(
        self,
        record: &mut Record,
        owner: &OwnerId,
        now: Timestamp,
    ) -> Result<(), ValidationIssue> {
        if self == Self::NestedMetadata {
            for field in AUDIT_FIELDS {
                record.remove(field);
            }
        }
        let audit = self.audit_mut(record)?;
        audit.insert(CREATED_BY_FIELD.to_string(), Value::String(owner.as_str().to_string()));
        audit.insert(CREATED_AT_FIELD.to_string(), Value::from(now.as_unix_millis()));
        audit.insert(UPDATED_AT_FIELD.to_string(), Value::from(now.as_unix_millis()));
        Ok(())
    }
}

/// Issue reported when nested metadata is not an object.
pub(crate) fn metadata_not_object() -> ValidationIssue {
    ValidationIssue {
        path: format!("/{METADATA_FIELD}"),
        message: "metadata must be an object".to_string(),
    }
}
