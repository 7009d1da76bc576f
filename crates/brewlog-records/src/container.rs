// crates/brewlog-records/src/container.rs
// ============================================================================
// Module: Containers
// Description: Bottles and kegs that hold finished batches.
// Purpose: Track which containers are empty, filled or waiting for cleaning.
// Dependencies: brewlog-core, serde
// ============================================================================

//! ## Overview
//! Containers live at `containers/{id}` in the nested shape. A status change
//! replaces `status` whole: filling stamps `fillDate`, emptying stamps
//! `emptyDate`, and the other date is cleared.

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

use crate::error::RecordsError;
use crate::schema;

/// Container collection path.
pub const CONTAINERS_PATH: &str = "containers";

// ============================================================================
// SECTION: Enumerations
// ============================================================================

/// Kind of container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContainerType {
    /// Bottle.
    Bottle,
    /// Keg.
    Keg,
    /// Anything else.
    Other,
}

impl ContainerType {
    /// Every container kind.
    pub const ALL: [Self; 3] = [Self::Bottle, Self::Keg, Self::Other];

    /// Returns the stored label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bottle => "BOTTLE",
            Self::Keg => "KEG",
            Self::Other => "OTHER",
        }
    }
}

/// Current container state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContainerState {
    /// Clean and empty.
    #[default]
    Empty,
    /// Holding a batch.
    Filled,
    /// Needs cleaning.
    Dirty,
}

impl ContainerState {
    /// Every container state.
    pub const ALL: [Self; 3] = [Self::Empty, Self::Filled, Self::Dirty];

    /// Returns the stored label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Empty => "EMPTY",
            Self::Filled => "FILLED",
            Self::Dirty => "DIRTY",
        }
    }
}

// ============================================================================
// SECTION: Records
// ============================================================================

/// Descriptive and audit fields of a container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerMetadata {
    /// Display name.
    pub name: String,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Container kind.
    #[serde(rename = "type")]
    pub kind: ContainerType,
    /// Capacity in liters.
    pub capacity: f64,
    /// Owner.
    pub created_by: OwnerId,
    /// Creation time.
    pub created_at: Timestamp,
    /// Last update time.
    pub updated_at: Timestamp,
}

/// Current container status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerStatus {
    /// Current state.
    pub current: ContainerState,
    /// When the state last changed.
    pub last_updated: Timestamp,
    /// Batch held by the container.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_batch_id: Option<String>,
    /// When the container was filled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_date: Option<Timestamp>,
    /// When the container was emptied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub empty_date: Option<Timestamp>,
}

impl ContainerStatus {
    /// Builds the status for `state` at `now`.
    #[must_use]
    pub fn at(state: ContainerState, current_batch_id: Option<String>, now: Timestamp) -> Self {
        Self {
            current: state,
            last_updated: now,
            current_batch_id,
            fill_date: (state == ContainerState::Filled).then_some(now),
            empty_date: (state == ContainerState::Empty).then_some(now),
        }
    }
}

/// Stored container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Container {
    /// Record id.
    pub id: RecordId,
    /// Descriptive and audit fields.
    pub metadata: ContainerMetadata,
    /// Current status.
    pub status: ContainerStatus,
}

/// Data for a new container.
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerDraft {
    /// Display name.
    pub name: String,
    /// Description.
    pub description: Option<String>,
    /// Container kind.
    pub kind: ContainerType,
    /// Capacity in liters.
    pub capacity: f64,
}

impl ContainerDraft {
    /// Creates a draft without a description.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: ContainerType, capacity: f64) -> Self {
        Self {
            name: name.into(),
            description: None,
            kind,
            capacity,
        }
    }
}

/// Partial update of the container metadata. `Some(None)` clears a field.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerMetadataPatch {
    /// New name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    /// New kind.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<ContainerType>,
    /// New capacity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity: Option<f64>,
}

/// Partial container update.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ContainerPatch {
    /// Metadata fields to change.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ContainerMetadataPatch>,
}

/// Stored form of a new container.
#[derive(Debug, Serialize)]
struct NewContainer<'a> {
    /// Descriptive fields; audit fields are stamped by the store.
    metadata: NewMetadata<'a>,
    /// Initial status.
    status: ContainerStatus,
}

/// Descriptive fields of a new container.
#[derive(Debug, Serialize)]
struct NewMetadata<'a> {
    /// Display name.
    name: &'a str,
    /// Description.
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    /// Container kind.
    #[serde(rename = "type")]
    kind: ContainerType,
    /// Capacity in liters.
    capacity: f64,
}

/// Whole-object replacement of `status`.
#[derive(Debug, Serialize)]
struct StatusChange {
    /// New status.
    status: ContainerStatus,
}

// ============================================================================
// SECTION: Schema
// ============================================================================

/// Returns the container collection descriptor.
///
/// # Errors
///
/// Returns [`RecordsError::Schema`] when the pinned schema fails to compile.
pub fn container_descriptor() -> Result<CollectionDescriptor, RecordsError> {
    let kinds = ContainerType::ALL.map(ContainerType::as_str);
    let status = schema::object(
        &["current", "lastUpdated"],
        schema::properties([
            ("current", schema::one_of(&ContainerState::ALL.map(ContainerState::as_str))),
            ("lastUpdated", schema::timestamp()),
            ("currentBatchId", schema::nullable(schema::text())),
            ("fillDate", schema::nullable(schema::timestamp())),
            ("emptyDate", schema::nullable(schema::timestamp())),
        ]),
    );
    let record = schema::object(
        &["id", "metadata", "status"],
        schema::properties([
            ("id", schema::uid()),
            ("metadata", schema::base_metadata(schema::one_of(&kinds))),
            ("status", status),
        ]),
    );
    schema::descriptor(CONTAINERS_PATH, record, RecordShape::NestedMetadata)
}

// ============================================================================
// SECTION: Repository
// ============================================================================

/// Container collection.
#[derive(Debug, Clone)]
pub struct ContainerRepository {
    /// Context supplying the clock.
    context: StoreContext,
    /// Container collection.
    containers: TypedCollection<Container>,
}

impl ContainerRepository {
    /// Builds the repository on `context`.
    ///
    /// # Errors
    ///
    /// Returns [`RecordsError::Schema`] when the pinned schema fails to compile.
    pub fn new(context: &StoreContext) -> Result<Self, RecordsError> {
        Ok(Self {
            context: context.clone(),
            containers: context.collection(container_descriptor()?),
        })
    }

    /// Returns the typed container collection.
    #[must_use]
    pub const fn collection(&self) -> &TypedCollection<Container> {
        &self.containers
    }

    /// Creates an empty container owned by `caller`.
    ///
    /// # Errors
    ///
    /// Returns [`RecordsError`] when validation or the write fails.
    pub async fn create(
        &self,
        draft: &ContainerDraft,
        caller: &Caller,
    ) -> Result<Container, RecordsError> {
        let record = NewContainer {
            metadata: NewMetadata {
                name: &draft.name,
                description: draft.description.as_deref(),
                kind: draft.kind,
                capacity: draft.capacity,
            },
            status: ContainerStatus::at(ContainerState::Empty, None, self.context.clock().now()),
        };
        Ok(self.containers.create(&record, caller).await?)
    }

    /// Returns container `id` when visible.
    ///
    /// # Errors
    ///
    /// Returns [`RecordsError`] when the read fails.
    pub async fn get(
        &self,
        id: &RecordId,
        caller: &Caller,
    ) -> Result<Option<Container>, RecordsError> {
        Ok(self.containers.get(id, caller).await?)
    }

    /// Returns every visible container.
    ///
    /// # Errors
    ///
    /// Returns [`RecordsError`] when the read fails.
    pub async fn list(&self, caller: &Caller) -> Result<Vec<Container>, RecordsError> {
        Ok(self.containers.get_all(caller).await?)
    }

    /// Applies `patch` to container `id`.
    ///
    /// # Errors
    ///
    /// Returns [`RecordsError`] when the container is missing, the merged
    /// record fails validation, or the write fails.
    pub async fn update(
        &self,
        id: &RecordId,
        patch: &ContainerPatch,
        caller: &Caller,
    ) -> Result<Container, RecordsError> {
        Ok(self.containers.update(id, patch, caller).await?)
    }

    /// Permanently removes container `id`.
    ///
    /// # Errors
    ///
    /// Returns [`RecordsError`] when the container is missing or the store
    /// fails.
    pub async fn delete(&self, id: &RecordId, caller: &Caller) -> Result<(), RecordsError> {
        Ok(self.containers.delete(id, caller).await?)
    }

    /// Replaces the status of container `id`.
    ///
    /// # Errors
    ///
    /// Returns [`RecordsError`] as [`ContainerRepository::update`] does.
    pub async fn update_status(
        &self,
        id: &RecordId,
        state: ContainerState,
        current_batch_id: Option<String>,
        caller: &Caller,
    ) -> Result<Container, RecordsError> {
        let change = StatusChange {
            status: ContainerStatus::at(state, current_batch_id, self.context.clock().now()),
        };
        Ok(self.containers.update(id, &change, caller).await?)
    }

    /// Returns the visible containers in `state`.
    ///
    /// # Errors
    ///
    /// Returns [`RecordsError`] when the read fails.
    pub async fn in_state(
        &self,
        state: ContainerState,
        caller: &Caller,
    ) -> Result<Vec<Container>, RecordsError> {
        Ok(self.containers.find(caller, |item| item.status.current == state).await?)
    }

    /// Returns the visible empty containers.
    ///
    /// # Errors
    ///
    /// Returns [`RecordsError`] when the read fails.
    pub async fn empty(&self, caller: &Caller) -> Result<Vec<Container>, RecordsError> {
        self.in_state(ContainerState::Empty, caller).await
    }

    /// Returns the visible filled containers.
    ///
    /// # Errors
    ///
    /// Returns [`RecordsError`] when the read fails.
    pub async fn filled(&self, caller: &Caller) -> Result<Vec<Container>, RecordsError> {
        self.in_state(ContainerState::Filled, caller).await
    }

    /// Returns the visible containers holding batch `batch_id`.
    ///
    /// # Errors
    ///
    /// Returns [`RecordsError`] when the read fails.
    pub async fn by_batch(
        &self,
        batch_id: &str,
        caller: &Caller,
    ) -> Result<Vec<Container>, RecordsError> {
        Ok(self
            .containers
            .find(caller, |item| item.status.current_batch_id.as_deref() == Some(batch_id))
            .await?)
    }
}
