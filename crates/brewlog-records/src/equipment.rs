// crates/brewlog-records/src/equipment.rs
// ============================================================================
// Module: Equipment
// Description: Brewing equipment with status and maintenance history.
// Purpose: Track which kettles, fermenters and kegs are free, busy or dirty.
// Dependencies: brewlog-core, serde
// ============================================================================

//! ## Overview
//! Equipment lives at `equipment/{id}` in the nested shape: descriptive fields
//! and audit fields share the `metadata` object, the current state lives in
//! `status` and is replaced whole on every status change.

use brewlog_core::Caller;
use brewlog_core::CollectionDescriptor;
use brewlog_core::OwnerId;
use brewlog_core::RecordId;
use brewlog_core::RecordShape;
use brewlog_core::RecordStoreError;
use brewlog_core::StoreContext;
use brewlog_core::Timestamp;
use brewlog_core::TypedCollection;
use serde::Deserialize;
use serde::Serialize;

use crate::error::RecordsError;
use crate::schema;

/// Equipment collection path.
pub const EQUIPMENT_PATH: &str = "equipment";

// ============================================================================
// SECTION: Enumerations
// ============================================================================

/// Kind of equipment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EquipmentType {
    /// Brewing kettle.
    Kettle,
    /// Fermentation vessel.
    Fermenter,
    /// Keg.
    Keg,
    /// Bottle rack or bottle set.
    Bottle,
    /// Anything else.
    Other,
}

impl EquipmentType {
    /// Every equipment kind.
    pub const ALL: [Self; 5] =
        [Self::Kettle, Self::Fermenter, Self::Keg, Self::Bottle, Self::Other];

    /// Returns the stored label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Kettle => "KETTLE",
            Self::Fermenter => "FERMENTER",
            Self::Keg => "KEG",
            Self::Bottle => "BOTTLE",
            Self::Other => "OTHER",
        }
    }
}

/// Current equipment state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EquipmentState {
    /// Free to use.
    #[default]
    Available,
    /// Holding a batch.
    InUse,
    /// Out for maintenance.
    Maintenance,
    /// Needs cleaning.
    Dirty,
}

impl EquipmentState {
    /// Every equipment state.
    pub const ALL: [Self; 4] = [Self::Available, Self::InUse, Self::Maintenance, Self::Dirty];

    /// Returns the stored label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Available => "AVAILABLE",
            Self::InUse => "IN_USE",
            Self::Maintenance => "MAINTENANCE",
            Self::Dirty => "DIRTY",
        }
    }
}

// ============================================================================
// SECTION: Records
// ============================================================================

/// Descriptive and audit fields of a piece of equipment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EquipmentMetadata {
    /// Display name.
    pub name: String,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Equipment kind.
    #[serde(rename = "type")]
    pub kind: EquipmentType,
    /// Capacity in liters.
    pub capacity: f64,
    /// Owner.
    pub created_by: OwnerId,
    /// Creation time.
    pub created_at: Timestamp,
    /// Last update time.
    pub updated_at: Timestamp,
}

/// Current equipment status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EquipmentStatus {
    /// Current state.
    pub current: EquipmentState,
    /// When the state last changed.
    pub last_updated: Timestamp,
    /// Batch held by the equipment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_batch_id: Option<String>,
}

/// Maintenance history.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Maintenance {
    /// Last cleaning.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_cleaned: Option<Timestamp>,
    /// Last maintenance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_maintained: Option<Timestamp>,
    /// Next scheduled maintenance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_maintenance: Option<Timestamp>,
    /// Free-form notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Stored piece of equipment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Equipment {
    /// Record id.
    pub id: RecordId,
    /// Descriptive and audit fields.
    pub metadata: EquipmentMetadata,
    /// Current status.
    pub status: EquipmentStatus,
    /// Maintenance history.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maintenance: Option<Maintenance>,
}

/// Data for new equipment.
#[derive(Debug, Clone, PartialEq)]
pub struct EquipmentDraft {
    /// Display name.
    pub name: String,
    /// Description.
    pub description: Option<String>,
    /// Equipment kind.
    pub kind: EquipmentType,
    /// Capacity in liters.
    pub capacity: f64,
    /// Initial state.
    pub state: EquipmentState,
    /// Batch initially held.
    pub current_batch_id: Option<String>,
}

impl EquipmentDraft {
    /// Creates a draft for available, empty equipment.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: EquipmentType, capacity: f64) -> Self {
        Self {
            name: name.into(),
            description: None,
            kind,
            capacity,
            state: EquipmentState::Available,
            current_batch_id: None,
        }
    }
}

/// Partial update of the equipment metadata. `Some(None)` clears a field.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EquipmentMetadataPatch {
    /// New name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    /// New kind.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<EquipmentType>,
    /// New capacity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity: Option<f64>,
}

/// Partial equipment update.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct EquipmentPatch {
    /// Metadata fields to change.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<EquipmentMetadataPatch>,
    /// Replacement maintenance history; `Some(None)` clears it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maintenance: Option<Option<Maintenance>>,
}

/// Maintenance work to record.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MaintenanceWork {
    /// Equipment was cleaned now.
    pub cleaned: bool,
    /// Equipment was serviced now.
    pub maintained: bool,
    /// Next scheduled maintenance.
    pub next_maintenance: Option<Timestamp>,
    /// Notes replacing the stored notes.
    pub notes: Option<String>,
}

/// Stored form of new equipment.
#[derive(Debug, Serialize)]
struct NewEquipment<'a> {
    /// Descriptive fields; audit fields are stamped by the store.
    metadata: NewMetadata<'a>,
    /// Initial status.
    status: EquipmentStatus,
}

/// Descriptive fields of new equipment.
#[derive(Debug, Serialize)]
struct NewMetadata<'a> {
    /// Display name.
    name: &'a str,
    /// Description.
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    /// Equipment kind.
    #[serde(rename = "type")]
    kind: EquipmentType,
    /// Capacity in liters.
    capacity: f64,
}

/// Whole-object replacement of `status`.
#[derive(Debug, Serialize)]
struct StatusChange {
    /// New status.
    status: EquipmentStatus,
}

/// Whole-object replacement of `maintenance`.
#[derive(Debug, Serialize)]
struct MaintenanceChange {
    /// New maintenance history.
    maintenance: Maintenance,
}

// ============================================================================
// SECTION: Schema
// ============================================================================

/// Returns the equipment collection descriptor.
///
/// # Errors
///
/// Returns [`RecordsError::Schema`] when the pinned schema fails to compile.
pub fn equipment_descriptor() -> Result<CollectionDescriptor, RecordsError> {
    let kinds = EquipmentType::ALL.map(EquipmentType::as_str);
    let metadata = schema::base_metadata(schema::one_of(&kinds));
    let status = schema::object(
        &["current", "lastUpdated"],
        schema::properties([
            ("current", schema::one_of(&EquipmentState::ALL.map(EquipmentState::as_str))),
            ("lastUpdated", schema::timestamp()),
            ("currentBatchId", schema::nullable(schema::text())),
        ]),
    );
    let maintenance = schema::object(
        &[],
        schema::properties([
            ("lastCleaned", schema::nullable(schema::timestamp())),
            ("lastMaintained", schema::nullable(schema::timestamp())),
            ("nextMaintenance", schema::nullable(schema::timestamp())),
            ("notes", schema::nullable(schema::text())),
        ]),
    );
    let record = schema::object(
        &["id", "metadata", "status"],
        schema::properties([
            ("id", schema::uid()),
            ("metadata", metadata),
            ("status", status),
            ("maintenance", schema::nullable(maintenance)),
        ]),
    );
    schema::descriptor(EQUIPMENT_PATH, record, RecordShape::NestedMetadata)
}

// ============================================================================
// SECTION: Repository
// ============================================================================

/// Equipment collection.
#[derive(Debug, Clone)]
pub struct EquipmentRepository {
    /// Context supplying the clock.
    context: StoreContext,
    /// Equipment collection.
    equipment: TypedCollection<Equipment>,
}

impl EquipmentRepository {
    /// Builds the repository on `context`.
    ///
    /// # Errors
    ///
    /// Returns [`RecordsError::Schema`] when the pinned schema fails to compile.
    pub fn new(context: &StoreContext) -> Result<Self, RecordsError> {
        Ok(Self {
            context: context.clone(),
            equipment: context.collection(equipment_descriptor()?),
        })
    }

    /// Returns the typed equipment collection.
    #[must_use]
    pub const fn collection(&self) -> &TypedCollection<Equipment> {
        &self.equipment
    }

    /// Creates equipment owned by `caller`.
    ///
    /// # Errors
    ///
    /// Returns [`RecordsError`] when validation or the write fails.
    pub async fn create(
        &self,
        draft: &EquipmentDraft,
        caller: &Caller,
    ) -> Result<Equipment, RecordsError> {
        let record = NewEquipment {
            metadata: NewMetadata {
                name: &draft.name,
                description: draft.description.as_deref(),
                kind: draft.kind,
                capacity: draft.capacity,
            },
            status: EquipmentStatus {
                current: draft.state,
                last_updated: self.context.clock().now(),
                current_batch_id: draft.current_batch_id.clone(),
            },
        };
        Ok(self.equipment.create(&record, caller).await?)
    }

    /// Returns equipment `id` when visible.
    ///
    /// # Errors
    ///
    /// Returns [`RecordsError`] when the read fails.
    pub async fn get(
        &self,
        id: &RecordId,
        caller: &Caller,
    ) -> Result<Option<Equipment>, RecordsError> {
        Ok(self.equipment.get(id, caller).await?)
    }

    /// Returns every visible piece of equipment.
    ///
    /// # Errors
    ///
    /// Returns [`RecordsError`] when the read fails.
    pub async fn list(&self, caller: &Caller) -> Result<Vec<Equipment>, RecordsError> {
        Ok(self.equipment.get_all(caller).await?)
    }

    /// Applies `patch` to equipment `id`.
    ///
    /// # Errors
    ///
    /// Returns [`RecordsError`] when the equipment is missing, the merged
    /// record fails validation, or the write fails.
    pub async fn update(
        &self,
        id: &RecordId,
        patch: &EquipmentPatch,
        caller: &Caller,
    ) -> Result<Equipment, RecordsError> {
        Ok(self.equipment.update(id, patch, caller).await?)
    }

    /// Permanently removes equipment `id`.
    ///
    /// # Errors
    ///
    /// Returns [`RecordsError`] when the equipment is missing or the store
    /// fails.
    pub async fn delete(&self, id: &RecordId, caller: &Caller) -> Result<(), RecordsError> {
        Ok(self.equipment.delete(id, caller).await?)
    }

    /// Replaces the status of equipment `id`, stamping `lastUpdated`.
    ///
    /// # Errors
    ///
    /// Returns [`RecordsError`] as [`EquipmentRepository::update`] does.
    pub async fn update_status(
        &self,
        id: &RecordId,
        state: EquipmentState,
        current_batch_id: Option<String>,
        caller: &Caller,
    ) -> Result<Equipment, RecordsError> {
        let change = StatusChange {
            status: EquipmentStatus {
                current: state,
                last_updated: self.context.clock().now(),
                current_batch_id,
            },
        };
        Ok(self.equipment.update(id, &change, caller).await?)
    }

    /// Records maintenance work on equipment `id`.
    ///
    /// Cleaning and servicing are stamped with the current time; fields the
    /// work does not mention keep their stored values.
    ///
    /// # Errors
    ///
    /// Returns [`RecordsError`] as [`EquipmentRepository::update`] does.
    pub async fn record_maintenance(
        &self,
        id: &RecordId,
        work: MaintenanceWork,
        caller: &Caller,
    ) -> Result<Equipment, RecordsError> {
        let Some(current) = self.equipment.get(id, caller).await? else {
            return Err(RecordStoreError::NotFound {
                path: self.equipment.store().record_path(id).to_string(),
            }
            .into());
        };
        let now = self.context.clock().now();
        let previous = current.maintenance.unwrap_or_default();
        let change = MaintenanceChange {
            maintenance: Maintenance {
                last_cleaned: if work.cleaned { Some(now) } else { previous.last_cleaned },
                last_maintained: if work.maintained { Some(now) } else { previous.last_maintained },
                next_maintenance: work.next_maintenance.or(previous.next_maintenance),
                notes: work.notes.or(previous.notes),
            },
        };
        Ok(self.equipment.update(id, &change, caller).await?)
    }

    /// Returns the visible equipment in `state`.
    ///
    /// # Errors
    ///
    /// Returns [`RecordsError`] when the read fails.
    pub async fn in_state(
        &self,
        state: EquipmentState,
        caller: &Caller,
    ) -> Result<Vec<Equipment>, RecordsError> {
        Ok(self.equipment.find(caller, |item| item.status.current == state).await?)
    }

    /// Returns the visible available equipment.
    ///
    /// # Errors
    ///
    /// Returns [`RecordsError`] when the read fails.
    pub async fn available(&self, caller: &Caller) -> Result<Vec<Equipment>, RecordsError> {
        self.in_state(EquipmentState::Available, caller).await
    }

    /// Returns the visible equipment in use.
    ///
    /// # Errors
    ///
    /// Returns [`RecordsError`] when the read fails.
    pub async fn in_use(&self, caller: &Caller) -> Result<Vec<Equipment>, RecordsError> {
        self.in_state(EquipmentState::InUse, caller).await
    }
}
