// crates/brewlog-records/src/audit.rs
// ============================================================================
// Module: Audit Events
// Description: Append-only trail of user and record activity.
// Purpose: Answer who changed what, and when, per user and per entity.
// Dependencies: brewlog-core, serde, serde_json
// ============================================================================

//! ## Overview
//! Events live at `audit/{id}` in the flat shape. Each event is owned by the
//! caller that caused it, so non-privileged callers only ever see their own
//! trail while privileged callers see everyone's.

use brewlog_core::Caller;
use brewlog_core::CollectionDescriptor;
use brewlog_core::OwnerId;
use brewlog_core::RecordId;
use brewlog_core::RecordShape;
use brewlog_core::StoreContext;
use brewlog_core::Timestamp;
use brewlog_core::TypedCollection;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use serde_json::json;

use crate::error::RecordsError;
use crate::schema;

/// Audit collection path.
pub const AUDIT_PATH: &str = "audit";

// ============================================================================
// SECTION: Types
// ============================================================================

/// Kind of audited activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditEventType {
    /// User signed in.
    UserLogin,
    /// User signed out.
    UserLogout,
    /// User role changed.
    UserRoleChange,
    /// Batch created.
    BatchCreate,
    /// Batch updated.
    BatchUpdate,
    /// Batch deleted.
    BatchDelete,
    /// Equipment status changed.
    EquipmentStatusChange,
    /// Container status changed.
    ContainerStatusChange,
    /// Quality check recorded.
    QualityCheckAdded,
    /// Quality check recorded with a failing status.
    QualityCheckFailed,
}

impl AuditEventType {
    /// Every event type.
    pub const ALL: [Self; 10] = [
        Self::UserLogin,
        Self::UserLogout,
        Self::UserRoleChange,
        Self::BatchCreate,
        Self::BatchUpdate,
        Self::BatchDelete,
        Self::EquipmentStatusChange,
        Self::ContainerStatusChange,
        Self::QualityCheckAdded,
        Self::QualityCheckFailed,
    ];

    /// Returns the stored label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UserLogin => "USER_LOGIN",
            Self::UserLogout => "USER_LOGOUT",
            Self::UserRoleChange => "USER_ROLE_CHANGE",
            Self::BatchCreate => "BATCH_CREATE",
            Self::BatchUpdate => "BATCH_UPDATE",
            Self::BatchDelete => "BATCH_DELETE",
            Self::EquipmentStatusChange => "EQUIPMENT_STATUS_CHANGE",
            Self::ContainerStatusChange => "CONTAINER_STATUS_CHANGE",
            Self::QualityCheckAdded => "QUALITY_CHECK_ADDED",
            Self::QualityCheckFailed => "QUALITY_CHECK_FAILED",
        }
    }
}

/// Stored audit event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEvent {
    /// Event id.
    pub id: RecordId,
    /// User that caused the event.
    pub user_id: String,
    /// Event type.
    pub event_type: AuditEventType,
    /// When the event happened.
    pub timestamp: Timestamp,
    /// Affected entity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    /// Kind of the affected entity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,
    /// Changed fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changes: Option<Map<String, Value>>,
    /// Free-form notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Writer.
    pub created_by: OwnerId,
    /// Creation time.
    pub created_at: Timestamp,
    /// Last update time.
    pub updated_at: Timestamp,
}

/// Optional context attached to an event.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditDetails {
    /// Affected entity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    /// Kind of the affected entity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,
    /// Changed fields.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changes: Option<Map<String, Value>>,
    /// Free-form notes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl AuditDetails {
    /// Details naming the affected entity.
    #[must_use]
    pub fn entity(entity_type: &str, entity_id: impl Into<String>) -> Self {
        Self {
            entity_id: Some(entity_id.into()),
            entity_type: Some(entity_type.to_string()),
            ..Self::default()
        }
    }

    /// Attaches changed fields.
    #[must_use]
    pub fn with_changes(mut self, changes: Option<Map<String, Value>>) -> Self {
        self.changes = changes;
        self
    }

    /// Attaches notes.
    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Stored form of a new event.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NewEvent<'a> {
    /// User that caused the event.
    user_id: &'a str,
    /// Event type.
    event_type: AuditEventType,
    /// When the event happened.
    timestamp: Timestamp,
    /// Optional context.
    #[serde(flatten)]
    details: &'a AuditDetails,
}

/// Serializes a patch into the `changes` map of an event.
///
/// Returns `None` when the patch does not serialize to a non-empty object.
pub(crate) fn changes_of<P: Serialize>(patch: &P) -> Option<Map<String, Value>> {
    match serde_json::to_value(patch) {
        Ok(Value::Object(map)) if !map.is_empty() => Some(map),
        _ => None,
    }
}

// ============================================================================
// SECTION: Schema
// ============================================================================

/// Returns the audit collection descriptor.
///
/// # Errors
///
/// Returns [`RecordsError::Schema`] when the pinned schema fails to compile.
pub fn audit_descriptor() -> Result<CollectionDescriptor, RecordsError> {
    let mut properties = schema::properties([
        ("userId", schema::uid()),
        ("eventType", schema::one_of(&AuditEventType::ALL.map(AuditEventType::as_str))),
        ("timestamp", schema::timestamp()),
        ("entityId", schema::nullable(schema::text())),
        ("entityType", schema::nullable(schema::text())),
        ("changes", schema::nullable(json!({"type": "object"}))),
        ("notes", schema::nullable(schema::text())),
    ]);
    schema::with_flat_audit(&mut properties);
    let mut required = vec!["userId", "eventType", "timestamp"];
    required.extend(schema::FLAT_AUDIT_REQUIRED);
    schema::descriptor(AUDIT_PATH, schema::object(&required, properties), RecordShape::Flat)
}

// ============================================================================
// SECTION: Repository
// ============================================================================

/// Audit trail.
#[derive(Debug, Clone)]
pub struct AuditRepository {
    /// Context supplying the clock.
    context: StoreContext,
    /// Event collection.
    events: TypedCollection<AuditEvent>,
}

impl AuditRepository {
    /// Builds the repository on `context`.
    ///
    /// # Errors
    ///
    /// Returns [`RecordsError::Schema`] when the pinned schema fails to compile.
    pub fn new(context: &StoreContext) -> Result<Self, RecordsError> {
        Ok(Self {
            context: context.clone(),
            events: context.collection(audit_descriptor()?),
        })
    }

    /// Returns the typed event collection.
    #[must_use]
    pub const fn collection(&self) -> &TypedCollection<AuditEvent> {
        &self.events
    }

    /// Records an event caused by `caller` at the current time.
    ///
    /// # Errors
    ///
    /// Returns [`RecordsError`] when validation or the write fails.
    pub async fn log_event(
        &self,
        event_type: AuditEventType,
        details: &AuditDetails,
        caller: &Caller,
    ) -> Result<AuditEvent, RecordsError> {
        let event = NewEvent {
            user_id: caller.id().as_str(),
            event_type,
            timestamp: self.context.clock().now(),
            details,
        };
        Ok(self.events.create(&event, caller).await?)
    }

    /// Returns the visible events caused by `user_id`.
    ///
    /// # Errors
    ///
    /// Returns [`RecordsError`] when the read fails.
    pub async fn user_activity(
        &self,
        user_id: &str,
        caller: &Caller,
    ) -> Result<Vec<AuditEvent>, RecordsError> {
        Ok(self.events.find(caller, |event| event.user_id == user_id).await?)
    }

    /// Returns the visible events about one entity.
    ///
    /// # Errors
    ///
    /// Returns [`RecordsError`] when the read fails.
    pub async fn entity_history(
        &self,
        entity_type: &str,
        entity_id: &str,
        caller: &Caller,
    ) -> Result<Vec<AuditEvent>, RecordsError> {
        Ok(self
            .events
            .find(caller, |event| {
                event.entity_type.as_deref() == Some(entity_type)
                    && event.entity_id.as_deref() == Some(entity_id)
            })
            .await?)
    }

    /// Returns the visible failed quality check events.
    ///
    /// # Errors
    ///
    /// Returns [`RecordsError`] when the read fails.
    pub async fn failed_quality_checks(
        &self,
        caller: &Caller,
    ) -> Result<Vec<AuditEvent>, RecordsError> {
        Ok(self
            .events
            .find(caller, |event| event.event_type == AuditEventType::QualityCheckFailed)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[derive(Serialize)]
    struct Patch {
        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<&'static str>,
    }

    #[test]
    fn changes_skip_empty_patches() {
        assert_eq!(changes_of(&Patch { name: None }), None);
        let changes = changes_of(&Patch { name: Some("Ginger") });
        assert_eq!(changes.map(Value::Object), Some(json!({"name": "Ginger"})));
    }
}
