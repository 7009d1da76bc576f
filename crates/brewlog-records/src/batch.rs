// crates/brewlog-records/src/batch.rs
// ============================================================================
// Module: Batches
// Description: Batch records plus their stage and measurement logs.
// Purpose: Track a brew from first fermentation to completion.
// Dependencies: brewlog-core, serde, serde_json
// ============================================================================

//! ## Overview
//! Batches live at `batches/{id}` in the flat shape. Stage transitions and
//! readings are appended to `stages/{batchId}/{id}` and
//! `measurements/{batchId}/{id}`; those logs are reachable only by callers
//! that can see the batch.

// ============================================================================
// SECTION: Imports
// ============================================================================

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
use crate::log::LogCollection;
use crate::schema;

// ============================================================================
// SECTION: Paths
// ============================================================================

/// Batch collection path.
pub const BATCHES_PATH: &str = "batches";
/// Stage log base path.
pub const STAGES_PATH: &str = "stages";
/// Measurement log base path.
pub const MEASUREMENTS_PATH: &str = "measurements";

// ============================================================================
// SECTION: Enumerations
// ============================================================================

/// Fermentation stage of a batch.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub enum BatchStage {
    /// First fermentation.
    #[default]
    #[serde(rename = "1F")]
    Primary,
    /// Second fermentation.
    #[serde(rename = "2F")]
    Secondary,
    /// Transferred to kegs.
    #[serde(rename = "KEGGED")]
    Kegged,
    /// Transferred to bottles.
    #[serde(rename = "BOTTLED")]
    Bottled,
    /// Finished.
    #[serde(rename = "COMPLETED")]
    Completed,
}

impl BatchStage {
    /// Every stage in lifecycle order.
    pub const ALL: [Self; 5] =
        [Self::Primary, Self::Secondary, Self::Kegged, Self::Bottled, Self::Completed];

    /// Returns the stored label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Primary => "1F",
            Self::Secondary => "2F",
            Self::Kegged => "KEGGED",
            Self::Bottled => "BOTTLED",
            Self::Completed => "COMPLETED",
        }
    }
}

/// Kind of batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BatchType {
    /// First-fermentation batch.
    #[serde(rename = "1F")]
    Primary,
    /// Second-fermentation batch.
    #[serde(rename = "2F")]
    Secondary,
    /// Keg batch.
    #[serde(rename = "KEG")]
    Keg,
    /// Bottle batch.
    #[serde(rename = "BOTTLE")]
    Bottle,
}

impl BatchType {
    /// Every batch type.
    pub const ALL: [Self; 4] = [Self::Primary, Self::Secondary, Self::Keg, Self::Bottle];

    /// Returns the stored label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Primary => "1F",
            Self::Secondary => "2F",
            Self::Keg => "KEG",
            Self::Bottle => "BOTTLE",
        }
    }
}

/// Kind of measurement reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasurementKind {
    /// Acidity.
    Ph,
    /// Temperature.
    Temperature,
}

impl MeasurementKind {
    /// Every reading kind.
    pub const ALL: [Self; 2] = [Self::Ph, Self::Temperature];

    /// Returns the stored label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ph => "ph",
            Self::Temperature => "temperature",
        }
    }
}

// ============================================================================
// SECTION: Records
// ============================================================================

/// Batch code with lineage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchCode {
    /// Code of this batch.
    pub code: String,
    /// Code of the parent batch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_code: Option<String>,
    /// Codes of batches split from this one.
    #[serde(default)]
    pub child_codes: Vec<String>,
    /// Ancestor codes, oldest first.
    #[serde(default)]
    pub lineage: Vec<String>,
}

/// Flavoring added during second fermentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flavoring {
    /// Ingredient names.
    pub ingredients: Vec<String>,
    /// When the flavoring was added.
    pub added_at: Timestamp,
    /// Free-form notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Checklist task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Task id, unique within its checklist.
    pub id: String,
    /// Task title.
    pub title: String,
    /// Whether the task is done.
    pub completed: bool,
    /// When the task was completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<Timestamp>,
    /// Free-form notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Task {
    /// Creates an open task.
    #[must_use]
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            completed: false,
            completed_at: None,
            notes: None,
        }
    }
}

/// Named list of tasks attached to a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checklist {
    /// Checklist id, unique within its batch.
    pub id: String,
    /// Checklist title.
    pub title: String,
    /// Tasks in display order.
    #[serde(default)]
    pub tasks: Vec<Task>,
    /// True once every task is done.
    pub completed: bool,
}

impl Checklist {
    /// Creates an open checklist holding `tasks`.
    #[must_use]
    pub fn new(id: impl Into<String>, title: impl Into<String>, tasks: Vec<Task>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            tasks,
            completed: false,
        }
    }
}

/// Partial task update. `Some(None)` clears the notes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TaskPatch {
    /// New title.
    pub title: Option<String>,
    /// New completion flag.
    pub completed: Option<bool>,
    /// New notes.
    pub notes: Option<Option<String>>,
}

/// Stored batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Batch {
    /// Record id.
    pub id: RecordId,
    /// Display name.
    pub name: String,
    /// Current stage.
    pub stage: BatchStage,
    /// Volume in liters.
    pub volume: f64,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Batch type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_type: Option<BatchType>,
    /// Batch code and lineage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_code: Option<BatchCode>,
    /// Sequence number of the batch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_number: Option<u32>,
    /// Brew date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_date: Option<Timestamp>,
    /// Tea used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tea_type: Option<String>,
    /// Sugar amount.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sugar_amount: Option<f64>,
    /// Starter liquid amount.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starter_amount: Option<f64>,
    /// Equipment currently holding the batch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_equipment_id: Option<String>,
    /// Batch this one was split from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_batch_id: Option<String>,
    /// Batches split from this one.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub child_batch_ids: Vec<String>,
    /// Flavoring details.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flavoring: Option<Flavoring>,
    /// Checklists worked through during the brew.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub checklists: Vec<Checklist>,
    /// Free-form notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Owner.
    pub created_by: OwnerId,
    /// Creation time.
    pub created_at: Timestamp,
    /// Last update time.
    pub updated_at: Timestamp,
}

impl Batch {
    /// Returns the brew start: `batchDate` when set, otherwise `createdAt`.
    #[must_use]
    pub fn started_at(&self) -> Timestamp {
        self.batch_date.unwrap_or(self.created_at)
    }
}

/// Data for a new batch.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchDraft {
    /// Display name.
    pub name: String,
    /// Initial stage.
    pub stage: BatchStage,
    /// Volume in liters.
    pub volume: f64,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Batch type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_type: Option<BatchType>,
    /// Batch code and lineage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_code: Option<BatchCode>,
    /// Sequence number of the batch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_number: Option<u32>,
    /// Brew date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_date: Option<Timestamp>,
    /// Tea used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tea_type: Option<String>,
    /// Sugar amount.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sugar_amount: Option<f64>,
    /// Starter liquid amount.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starter_amount: Option<f64>,
    /// Equipment currently holding the batch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_equipment_id: Option<String>,
    /// Batch this one was split from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_batch_id: Option<String>,
    /// Flavoring details.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flavoring: Option<Flavoring>,
    /// Checklists worked through during the brew.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub checklists: Vec<Checklist>,
    /// Free-form notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl BatchDraft {
    /// Creates a draft with the required fields.
    #[must_use]
    pub fn new(name: impl Into<String>, stage: BatchStage, volume: f64) -> Self {
        Self {
            name: name.into(),
            stage,
            volume,
            ..Self::default()
        }
    }
}

/// Partial batch update. `Some(None)` clears an optional field.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchPatch {
    /// New name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New stage.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<BatchStage>,
    /// New volume.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
    /// New description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    /// New batch type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_type: Option<Option<BatchType>>,
    /// New batch code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_code: Option<Option<BatchCode>>,
    /// New brew date.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_date: Option<Option<Timestamp>>,
    /// New tea.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tea_type: Option<Option<String>>,
    /// New equipment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_equipment_id: Option<Option<String>>,
    /// New child batch list.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub child_batch_ids: Option<Vec<String>>,
    /// New flavoring.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flavoring: Option<Option<Flavoring>>,
    /// New checklists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checklists: Option<Vec<Checklist>>,
    /// New notes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<Option<String>>,
}

/// Stage log entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageEntry {
    /// Entry id.
    pub id: RecordId,
    /// Stage entered.
    pub stage: BatchStage,
    /// Stage start.
    pub start_time: Timestamp,
    /// Stage end.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<Timestamp>,
    /// Equipment used for the stage.
    pub equipment_id: String,
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

/// Data for a new stage entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageDraft {
    /// Stage entered.
    pub stage: BatchStage,
    /// Stage start.
    pub start_time: Timestamp,
    /// Stage end.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<Timestamp>,
    /// Equipment used for the stage.
    pub equipment_id: String,
    /// Free-form notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Partial stage update. `Some(None)` clears an optional field.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StagePatch {
    /// New stage start.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<Timestamp>,
    /// New stage end.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<Option<Timestamp>>,
    /// New equipment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub equipment_id: Option<String>,
    /// New notes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<Option<String>>,
}

/// Measurement log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Measurement {
    /// Entry id.
    pub id: RecordId,
    /// Reading kind.
    #[serde(rename = "type")]
    pub kind: MeasurementKind,
    /// Reading value.
    pub value: f64,
    /// Reading time.
    pub timestamp: Timestamp,
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

/// Stored form of a new measurement.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MeasurementDraft {
    /// Reading kind.
    #[serde(rename = "type")]
    kind: MeasurementKind,
    /// Reading value.
    value: f64,
    /// Reading time.
    timestamp: Timestamp,
    /// Free-form notes.
    #[serde(skip_serializing_if = "Option::is_none")]
    notes: Option<String>,
}

// ============================================================================
// SECTION: Schemas
// ============================================================================

/// Returns the batch collection descriptor.
///
/// # Errors
///
/// Returns [`RecordsError::Schema`] when the pinned schema fails to compile.
pub fn batch_descriptor() -> Result<CollectionDescriptor, RecordsError> {
    let batch_code = schema::object(
        &["code", "childCodes", "lineage"],
        schema::properties([
            ("code", schema::name()),
            ("parentCode", schema::nullable(schema::text())),
            ("childCodes", schema::strings()),
            ("lineage", schema::strings()),
        ]),
    );
    let flavoring = schema::object(
        &["ingredients", "addedAt"],
        schema::properties([
            ("ingredients", schema::strings()),
            ("addedAt", schema::timestamp()),
            ("notes", schema::nullable(schema::text())),
        ]),
    );
    let task = schema::object(
        &["id", "title", "completed"],
        schema::properties([
            ("id", schema::name()),
            ("title", schema::name()),
            ("completed", serde_json::json!({"type": "boolean"})),
            ("completedAt", schema::nullable(schema::timestamp())),
            ("notes", schema::nullable(schema::text())),
        ]),
    );
    let checklist = schema::object(
        &["id", "title", "completed"],
        schema::properties([
            ("id", schema::name()),
            ("title", schema::name()),
            ("tasks", serde_json::json!({"type": "array", "items": task})),
            ("completed", serde_json::json!({"type": "boolean"})),
        ]),
    );
    let mut properties = schema::properties([
        ("name", schema::name()),
        ("stage", schema::one_of(&BatchStage::ALL.map(BatchStage::as_str))),
        ("volume", schema::number()),
        ("description", schema::nullable(schema::text())),
        ("batchType", schema::nullable(schema::one_of(&BatchType::ALL.map(BatchType::as_str)))),
        ("batchCode", schema::nullable(batch_code)),
        ("batchNumber", schema::nullable(serde_json::json!({"type": "integer", "minimum": 0}))),
        ("batchDate", schema::nullable(schema::timestamp())),
        ("teaType", schema::nullable(schema::text())),
        ("sugarAmount", schema::nullable(schema::number())),
        ("starterAmount", schema::nullable(schema::number())),
        ("currentEquipmentId", schema::nullable(schema::text())),
        ("parentBatchId", schema::nullable(schema::text())),
        ("childBatchIds", schema::nullable(schema::strings())),
        ("flavoring", schema::nullable(flavoring)),
        ("checklists", schema::nullable(serde_json::json!({"type": "array", "items": checklist}))),
        ("notes", schema::nullable(schema::text())),
    ]);
    schema::with_flat_audit(&mut properties);
    let mut required = vec!["name", "stage", "volume"];
    required.extend(schema::FLAT_AUDIT_REQUIRED);
    schema::descriptor(BATCHES_PATH, schema::object(&required, properties), RecordShape::Flat)
}

/// Returns the stage log descriptor.
///
/// # Errors
///
/// Returns [`RecordsError::Schema`] when the pinned schema fails to compile.
pub fn stage_descriptor() -> Result<CollectionDescriptor, RecordsError> {
    let mut properties = schema::properties([
        ("stage", schema::one_of(&BatchStage::ALL.map(BatchStage::as_str))),
        ("startTime", schema::timestamp()),
        ("endTime", schema::nullable(schema::timestamp())),
        ("equipmentId", schema::text()),
        ("notes", schema::nullable(schema::text())),
    ]);
    schema::with_flat_audit(&mut properties);
    let mut required = vec!["stage", "startTime", "equipmentId"];
    required.extend(schema::FLAT_AUDIT_REQUIRED);
    schema::descriptor(STAGES_PATH, schema::object(&required, properties), RecordShape::Flat)
}

/// Returns the measurement log descriptor.
///
/// # Errors
///
/// Returns [`RecordsError::Schema`] when the pinned schema fails to compile.
pub fn measurement_descriptor() -> Result<CollectionDescriptor, RecordsError> {
    let mut properties = schema::properties([
        ("type", schema::one_of(&MeasurementKind::ALL.map(MeasurementKind::as_str))),
        ("value", schema::number()),
        ("timestamp", schema::timestamp()),
        ("notes", schema::nullable(schema::text())),
    ]);
    schema::with_flat_audit(&mut properties);
    let mut required = vec!["type", "value", "timestamp"];
    required.extend(schema::FLAT_AUDIT_REQUIRED);
    schema::descriptor(MEASUREMENTS_PATH, schema::object(&required, properties), RecordShape::Flat)
}

// ============================================================================
// SECTION: Repository
// ============================================================================

/// Batches plus their stage and measurement logs.
#[derive(Debug, Clone)]
pub struct BatchRepository {
    /// Context supplying the clock.
    context: StoreContext,
    /// Batch collection.
    batches: TypedCollection<Batch>,
    /// Stage log.
    stages: LogCollection<StageEntry>,
    /// Measurement log.
    measurements: LogCollection<Measurement>,
}

impl BatchRepository {
    /// Builds the repository on `context`.
    ///
    /// # Errors
    ///
    /// Returns [`RecordsError::Schema`] when a pinned schema fails to compile.
    pub fn new(context: &StoreContext) -> Result<Self, RecordsError> {
        let batches = context.collection::<Batch>(batch_descriptor()?);
        let stages = LogCollection::new(
            batches.store().clone(),
            context.collection(stage_descriptor()?),
        );
        let measurements = LogCollection::new(
            batches.store().clone(),
            context.collection(measurement_descriptor()?),
        );
        Ok(Self {
            context: context.clone(),
            batches,
            stages,
            measurements,
        })
    }

    /// Returns the typed batch collection.
    #[must_use]
    pub const fn collection(&self) -> &TypedCollection<Batch> {
        &self.batches
    }

    /// Creates a batch owned by `caller`.
    ///
    /// # Errors
    ///
    /// Returns [`RecordsError`] when validation or the write fails.
    pub async fn create(&self, draft: &BatchDraft, caller: &Caller) -> Result<Batch, RecordsError> {
        Ok(self.batches.create(draft, caller).await?)
    }

    /// Returns batch `id` when visible.
    ///
    /// # Errors
    ///
    /// Returns [`RecordsError`] when the read fails.
    pub async fn get(&self, id: &RecordId, caller: &Caller) -> Result<Option<Batch>, RecordsError> {
        Ok(self.batches.get(id, caller).await?)
    }

    /// Returns every visible batch.
    ///
    /// # Errors
    ///
    /// Returns [`RecordsError`] when the read fails.
    pub async fn list(&self, caller: &Caller) -> Result<Vec<Batch>, RecordsError> {
        Ok(self.batches.get_all(caller).await?)
    }

    /// Returns the visible batches currently in `stage`.
    ///
    /// # Errors
    ///
    /// Returns [`RecordsError`] when the read fails.
    pub async fn by_stage(
        &self,
        stage: BatchStage,
        caller: &Caller,
    ) -> Result<Vec<Batch>, RecordsError> {
        Ok(self.batches.find(caller, |batch| batch.stage == stage).await?)
    }

    /// Applies `patch` to batch `id`.
    ///
    /// # Errors
    ///
    /// Returns [`RecordsError`] when the batch is missing, the merged batch
    /// fails validation, or the write fails.
    pub async fn update(
        &self,
        id: &RecordId,
        patch: &BatchPatch,
        caller: &Caller,
    ) -> Result<Batch, RecordsError> {
        Ok(self.batches.update(id, patch, caller).await?)
    }

    /// Moves batch `id` to `stage`.
    ///
    /// # Errors
    ///
    /// Returns [`RecordsError`] as [`BatchRepository::update`] does.
    pub async fn set_stage(
        &self,
        id: &RecordId,
        stage: BatchStage,
        caller: &Caller,
    ) -> Result<Batch, RecordsError> {
        let patch = BatchPatch {
            stage: Some(stage),
            ..BatchPatch::default()
        };
        self.update(id, &patch, caller).await
    }

    /// Records `child` as split from batch `parent`.
    ///
    /// The child id joins `childBatchIds`; when both batches carry codes the
    /// child code also joins the parent's `childCodes`.
    ///
    /// # Errors
    ///
    /// Returns [`RecordsError`] when the parent is missing or the write fails.
    pub async fn link_child(
        &self,
        parent: &RecordId,
        child: &Batch,
        caller: &Caller,
    ) -> Result<Batch, RecordsError> {
        let Some(current) = self.batches.get(parent, caller).await? else {
            return Err(RecordStoreError::NotFound {
                path: self.batches.store().record_path(parent).to_string(),
            }
            .into());
        };
        let mut child_ids = current.child_batch_ids.clone();
        if !child_ids.iter().any(|id| id == child.id.as_str()) {
            child_ids.push(child.id.as_str().to_string());
        }
        let mut patch = BatchPatch {
            child_batch_ids: Some(child_ids),
            ..BatchPatch::default()
        };
        if let (Some(mut code), Some(child_code)) = (current.batch_code, &child.batch_code)
            && !code.child_codes.contains(&child_code.code)
        {
            code.child_codes.push(child_code.code.clone());
            patch.batch_code = Some(Some(code));
        }
        self.update(parent, &patch, caller).await
    }

    /// Applies `patch` to task `task` of checklist `checklist` on batch `id`.
    ///
    /// Completing a task stamps `completedAt` with the current time; reopening
    /// it clears the stamp. The checklist is complete once it has tasks and
    /// all of them are done. Only `checklists` and the audit fields are
    /// written.
    ///
    /// # Errors
    ///
    /// Returns [`RecordStoreError::NotFound`] (wrapped) when the batch, the
    /// checklist or the task is missing, and [`RecordsError`] when the write
    /// fails.
    pub async fn update_task(
        &self,
        id: &RecordId,
        checklist: &str,
        task: &str,
        patch: &TaskPatch,
        caller: &Caller,
    ) -> Result<Batch, RecordsError> {
        let batch_path = self.batches.store().record_path(id);
        let Some(current) = self.batches.get(id, caller).await? else {
            return Err(RecordStoreError::NotFound {
                path: batch_path.to_string(),
            }
            .into());
        };
        let missing = || {
            RecordsError::from(RecordStoreError::NotFound {
                path: format!("{batch_path}/checklists/{checklist}/tasks/{task}"),
            })
        };
        let mut checklists = current.checklists;
        let list = checklists.iter_mut().find(|list| list.id == checklist).ok_or_else(missing)?;
        let entry = list.tasks.iter_mut().find(|entry| entry.id == task).ok_or_else(missing)?;
        apply_task_patch(entry, patch, self.context.clock().now());
        list.completed = !list.tasks.is_empty() && list.tasks.iter().all(|entry| entry.completed);
        let patch = BatchPatch {
            checklists: Some(checklists),
            ..BatchPatch::default()
        };
        self.update(id, &patch, caller).await
    }

    /// Permanently removes batch `id`. Its logs are left in place.
    ///
    /// # Errors
    ///
    /// Returns [`RecordsError`] when the batch is missing or the store fails.
    pub async fn delete(&self, id: &RecordId, caller: &Caller) -> Result<(), RecordsError> {
        Ok(self.batches.delete(id, caller).await?)
    }

    /// Appends a stage entry to batch `batch`.
    ///
    /// # Errors
    ///
    /// Returns [`RecordsError`] when the batch is not visible or the entry is
    /// invalid.
    pub async fn add_stage(
        &self,
        batch: &RecordId,
        draft: &StageDraft,
        caller: &Caller,
    ) -> Result<StageEntry, RecordsError> {
        self.stages.append(batch, draft, caller).await
    }

    /// Returns the stage entries of batch `batch`, ordered by start time.
    ///
    /// # Errors
    ///
    /// Returns [`RecordsError`] when the batch is not visible or the read
    /// fails.
    pub async fn stages(
        &self,
        batch: &RecordId,
        caller: &Caller,
    ) -> Result<Vec<StageEntry>, RecordsError> {
        let mut stages = self.stages.list(batch, caller).await?;
        stages.sort_by_key(|stage| stage.start_time);
        Ok(stages)
    }

    /// Applies `patch` to stage entry `stage` of batch `batch`.
    ///
    /// # Errors
    ///
    /// Returns [`RecordsError`] when the batch or entry is missing or the
    /// merged entry is invalid.
    pub async fn update_stage(
        &self,
        batch: &RecordId,
        stage: &RecordId,
        patch: &StagePatch,
        caller: &Caller,
    ) -> Result<StageEntry, RecordsError> {
        self.stages.update(batch, stage, patch, caller).await
    }

    /// Records a reading for batch `batch` at the current time.
    ///
    /// # Errors
    ///
    /// Returns [`RecordsError`] when the batch is not visible or the reading
    /// is invalid.
    pub async fn add_measurement(
        &self,
        batch: &RecordId,
        kind: MeasurementKind,
        value: f64,
        notes: Option<String>,
        caller: &Caller,
    ) -> Result<Measurement, RecordsError> {
        let draft = MeasurementDraft {
            kind,
            value,
            timestamp: self.context.clock().now(),
            notes,
        };
        self.measurements.append(batch, &draft, caller).await
    }

    /// Returns the readings of batch `batch`, ordered by time.
    ///
    /// # Errors
    ///
    /// Returns [`RecordsError`] when the batch is not visible or the read
    /// fails.
    pub async fn measurements(
        &self,
        batch: &RecordId,
        caller: &Caller,
    ) -> Result<Vec<Measurement>, RecordsError> {
        let mut readings = self.measurements.list(batch, caller).await?;
        readings.sort_by_key(|reading| reading.timestamp);
        Ok(readings)
    }
}

/// Applies `patch` to `task`, stamping completion changes at `now`.
fn apply_task_patch(task: &mut Task, patch: &TaskPatch, now: Timestamp) {
    if let Some(title) = &patch.title {
        task.title.clone_from(title);
    }
    if let Some(notes) = &patch.notes {
        task.notes.clone_from(notes);
    }
    match patch.completed {
        Some(true) if !task.completed => {
            task.completed = true;
            task.completed_at = Some(now);
        }
        Some(false) => {
            task.completed = false;
            task.completed_at = None;
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completing_a_task_stamps_it_once() {
        let mut task = Task::new("t1", "Taste");
        let done = TaskPatch {
            completed: Some(true),
            ..TaskPatch::default()
        };
        apply_task_patch(&mut task, &done, Timestamp::from_unix_millis(10));
        apply_task_patch(&mut task, &done, Timestamp::from_unix_millis(20));
        assert!(task.completed);
        assert_eq!(task.completed_at, Some(Timestamp::from_unix_millis(10)));
    }

    #[test]
    fn reopening_a_task_clears_the_stamp() {
        let mut task = Task::new("t1", "Taste");
        task.completed = true;
        task.completed_at = Some(Timestamp::from_unix_millis(10));
        let reopen = TaskPatch {
            completed: Some(false),
            notes: Some(Some("too sweet".to_string())),
            ..TaskPatch::default()
        };
        apply_task_patch(&mut task, &reopen, Timestamp::from_unix_millis(20));
        assert!(!task.completed);
        assert_eq!(task.completed_at, None);
        assert_eq!(task.notes.as_deref(), Some("too sweet"));
    }
}
