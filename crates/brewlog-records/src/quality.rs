// crates/brewlog-records/src/quality.rs
// ============================================================================
// Module: Quality Checks
// Description: Per-batch quality check log.
// Purpose: Record tastings, readings and inspections with a pass/fail status.
// Dependencies: brewlog-core, serde
// ============================================================================

//! ## Overview
//! Checks live at `quality/{batchId}/{id}` and follow the visibility of their
//! batch. Every write stamps `updatedBy` with the writing caller.

use brewlog_core::Caller;
use brewlog_core::CollectionDescriptor;
use brewlog_core::OwnerId;
use brewlog_core::RecordId;
use brewlog_core::RecordShape;
use brewlog_core::RecordStore;
use brewlog_core::StoreContext;
use brewlog_core::Timestamp;
use serde::Deserialize;
use serde::Serialize;

use crate::error::RecordsError;
use crate::log::LogCollection;
use crate::schema;

/// Quality log base path.
pub const QUALITY_PATH: &str = "quality";

// ============================================================================
// SECTION: Types
// ============================================================================

/// Kind of quality check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CheckType {
    /// Acidity reading.
    Ph,
    /// Temperature reading.
    Temperature,
    /// Tasting.
    Taste,
    /// Visual inspection.
    Visual,
    /// Anything else.
    Other,
}

impl CheckType {
    /// Every check kind.
    pub const ALL: [Self; 5] =
        [Self::Ph, Self::Temperature, Self::Taste, Self::Visual, Self::Other];

    /// Returns the stored label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ph => "PH",
            Self::Temperature => "TEMPERATURE",
            Self::Taste => "TASTE",
            Self::Visual => "VISUAL",
            Self::Other => "OTHER",
        }
    }
}

/// Outcome of a quality check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CheckStatus {
    /// Within tolerance.
    Pass,
    /// Out of tolerance.
    Fail,
    /// Borderline.
    Warning,
}

impl CheckStatus {
    /// Every check outcome.
    pub const ALL: [Self; 3] = [Self::Pass, Self::Fail, Self::Warning];

    /// Returns the stored label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Fail => "FAIL",
            Self::Warning => "WARNING",
        }
    }
}

/// Stored quality check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityCheck {
    /// Check id.
    pub id: RecordId,
    /// Checked batch.
    pub batch_id: String,
    /// When the check was made.
    pub timestamp: Timestamp,
    /// Check kind.
    #[serde(rename = "type")]
    pub kind: CheckType,
    /// Measured value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    /// Unit of `value`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    /// Free-form notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Outcome.
    pub status: CheckStatus,
    /// Last writer.
    pub updated_by: OwnerId,
    /// First writer.
    pub created_by: OwnerId,
    /// Creation time.
    pub created_at: Timestamp,
    /// Last update time.
    pub updated_at: Timestamp,
}

/// Data for a new check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityCheckDraft {
    /// Check kind.
    #[serde(rename = "type")]
    pub kind: CheckType,
    /// Measured value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    /// Unit of `value`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    /// Free-form notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Outcome.
    pub status: CheckStatus,
}

impl QualityCheckDraft {
    /// Creates a draft without value, unit or notes.
    #[must_use]
    pub const fn new(kind: CheckType, status: CheckStatus) -> Self {
        Self {
            kind,
            value: None,
            unit: None,
            notes: None,
            status,
        }
    }

    /// Attaches a measured value and its unit.
    #[must_use]
    pub fn with_value(mut self, value: f64, unit: impl Into<String>) -> Self {
        self.value = Some(value);
        self.unit = Some(unit.into());
        self
    }
}

/// Partial check update. `Some(None)` clears an optional field.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityCheckPatch {
    /// New value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Option<f64>>,
    /// New unit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<Option<String>>,
    /// New notes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<Option<String>>,
    /// New outcome.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<CheckStatus>,
}

/// Stored form of a new check.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NewCheck<'a> {
    /// Checked batch.
    batch_id: &'a str,
    /// When the check was made.
    timestamp: Timestamp,
    /// Writer.
    updated_by: &'a OwnerId,
    /// Check data.
    #[serde(flatten)]
    draft: &'a QualityCheckDraft,
}

/// Patch stamped with its writer.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StampedPatch<'a> {
    /// Writer.
    updated_by: &'a OwnerId,
    /// Changed fields.
    #[serde(flatten)]
    patch: &'a QualityCheckPatch,
}

// ============================================================================
// SECTION: Schema
// ============================================================================

/// Returns the quality log descriptor.
///
/// # Errors
///
/// Returns [`RecordsError::Schema`] when the pinned schema fails to compile.
pub fn quality_descriptor() -> Result<CollectionDescriptor, RecordsError> {
    let mut properties = schema::properties([
        ("batchId", schema::uid()),
        ("timestamp", schema::timestamp()),
        ("type", schema::one_of(&CheckType::ALL.map(CheckType::as_str))),
        ("value", schema::nullable(schema::number())),
        ("unit", schema::nullable(schema::text())),
        ("notes", schema::nullable(schema::text())),
        ("status", schema::one_of(&CheckStatus::ALL.map(CheckStatus::as_str))),
        ("updatedBy", schema::uid()),
    ]);
    schema::with_flat_audit(&mut properties);
    let mut required = vec!["batchId", "timestamp", "type", "status", "updatedBy"];
    required.extend(schema::FLAT_AUDIT_REQUIRED);
    schema::descriptor(QUALITY_PATH, schema::object(&required, properties), RecordShape::Flat)
}

// ============================================================================
// SECTION: Repository
// ============================================================================

/// Quality check log keyed by batch.
#[derive(Debug, Clone)]
pub struct QualityRepository {
    /// Context supplying the clock.
    context: StoreContext,
    /// Check log.
    checks: LogCollection<QualityCheck>,
}

impl QualityRepository {
    /// Builds the repository on `context`; `batches` gates access to the log.
    ///
    /// # Errors
    ///
    /// Returns [`RecordsError::Schema`] when the pinned schema fails to compile.
    pub fn new(context: &StoreContext, batches: RecordStore) -> Result<Self, RecordsError> {
        Ok(Self {
            context: context.clone(),
            checks: LogCollection::new(batches, context.collection(quality_descriptor()?)),
        })
    }

    /// Records a check on batch `batch` at the current time.
    ///
    /// # Errors
    ///
    /// Returns [`RecordsError`] when the batch is not visible or the check is
    /// invalid.
    pub async fn add_check(
        &self,
        batch: &RecordId,
        draft: &QualityCheckDraft,
        caller: &Caller,
    ) -> Result<QualityCheck, RecordsError> {
        let record = NewCheck {
            batch_id: batch.as_str(),
            timestamp: self.context.clock().now(),
            updated_by: caller.id(),
            draft,
        };
        self.checks.append(batch, &record, caller).await
    }

    /// Returns the checks of batch `batch`, ordered by time.
    ///
    /// # Errors
    ///
    /// Returns [`RecordsError`] when the batch is not visible or the read
    /// fails.
    pub async fn checks(
        &self,
        batch: &RecordId,
        caller: &Caller,
    ) -> Result<Vec<QualityCheck>, RecordsError> {
        let mut checks = self.checks.list(batch, caller).await?;
        checks.sort_by_key(|check| check.timestamp);
        Ok(checks)
    }

    /// Returns the failed checks of batch `batch`.
    ///
    /// # Errors
    ///
    /// Returns [`RecordsError`] as [`QualityRepository::checks`] does.
    pub async fn failed_checks(
        &self,
        batch: &RecordId,
        caller: &Caller,
    ) -> Result<Vec<QualityCheck>, RecordsError> {
        self.checks.find(batch, caller, |check| check.status == CheckStatus::Fail).await
    }

    /// Returns the checks of batch `batch` of kind `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`RecordsError`] as [`QualityRepository::checks`] does.
    pub async fn checks_by_type(
        &self,
        batch: &RecordId,
        kind: CheckType,
        caller: &Caller,
    ) -> Result<Vec<QualityCheck>, RecordsError> {
        self.checks.find(batch, caller, |check| check.kind == kind).await
    }

    /// Applies `patch` to check `check` of batch `batch`.
    ///
    /// # Errors
    ///
    /// Returns [`RecordsError`] when the batch or check is missing or the
    /// merged check is invalid.
    pub async fn update_check(
        &self,
        batch: &RecordId,
        check: &RecordId,
        patch: &QualityCheckPatch,
        caller: &Caller,
    ) -> Result<QualityCheck, RecordsError> {
        let stamped = StampedPatch {
            updated_by: caller.id(),
            patch,
        };
        self.checks.update(batch, check, &stamped, caller).await
    }
}
