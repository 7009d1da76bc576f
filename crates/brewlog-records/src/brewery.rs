// crates/brewlog-records/src/brewery.rs
// ============================================================================
// Module: Brewery Service
// Description: Repository bundle plus caller-bound sessions with auditing.
// Purpose: Give hosts one object to construct and one session per request.
// Dependencies: brewlog-core, serde_json, tracing
// ============================================================================

//! ## Overview
//! A [`Brewery`] owns the [`StoreContext`] and one repository per collection.
//! [`Brewery::session`] binds a caller identity; the resulting
//! [`BrewSession`] runs the common flows and appends audit events for them.
//!
//! Audit writes are best effort: a failed audit write is logged at `warn` and
//! never fails the flow that triggered it.

use brewlog_core::Caller;
use brewlog_core::OwnerId;
use brewlog_core::RecordId;
use brewlog_core::RecordStoreError;
use brewlog_core::StoreContext;
use brewlog_core::Timestamp;
use serde_json::Map;
use serde_json::Value;
use tracing::info;
use tracing::warn;

use crate::analytics::Analytics;
use crate::audit::AuditDetails;
use crate::audit::AuditEventType;
use crate::audit::AuditRepository;
use crate::audit::changes_of;
use crate::batch::BATCHES_PATH;
use crate::batch::Batch;
use crate::batch::BatchDraft;
use crate::batch::BatchPatch;
use crate::batch::BatchRepository;
use crate::batch::BatchStage;
use crate::batch::BatchType;
use crate::batch::Checklist;
use crate::batch::MeasurementKind;
use crate::batch::StageDraft;
use crate::batch::Task;
use crate::batch::TaskPatch;
use crate::batch_code::BatchCodeKind;
use crate::batch_code::create_batch_code;
use crate::batch_code::date_of;
use crate::batch_code::next_sequence;
use crate::container::CONTAINERS_PATH;
use crate::container::Container;
use crate::container::ContainerDraft;
use crate::container::ContainerRepository;
use crate::container::ContainerState;
use crate::container::ContainerType;
use crate::equipment::EQUIPMENT_PATH;
use crate::equipment::Equipment;
use crate::equipment::EquipmentDraft;
use crate::equipment::EquipmentRepository;
use crate::equipment::EquipmentState;
use crate::equipment::EquipmentType;
use crate::error::RecordsError;
use crate::quality::CheckStatus;
use crate::quality::CheckType;
use crate::quality::QUALITY_PATH;
use crate::quality::QualityCheck;
use crate::quality::QualityCheckDraft;
use crate::quality::QualityRepository;
use crate::user::USERS_PATH;
use crate::user::UserProfile;
use crate::user::UserRepository;
use crate::user::UserRole;

// ============================================================================
// SECTION: Brewery
// ============================================================================

/// Every repository over one store context.
#[derive(Debug, Clone)]
pub struct Brewery {
    /// Shared store context.
    context: StoreContext,
    /// Batches and their stage and measurement logs.
    batches: BatchRepository,
    /// Equipment.
    equipment: EquipmentRepository,
    /// Containers.
    containers: ContainerRepository,
    /// User profiles.
    users: UserRepository,
    /// Audit trail.
    audit: AuditRepository,
    /// Quality checks.
    quality: QualityRepository,
    /// Read-only analytics.
    analytics: Analytics,
}

impl Brewery {
    /// Builds every repository on `context`.
    ///
    /// # Errors
    ///
    /// Returns [`RecordsError::Schema`] when a pinned schema fails to compile.
    pub fn new(context: StoreContext) -> Result<Self, RecordsError> {
        let batches = BatchRepository::new(&context)?;
        let quality = QualityRepository::new(&context, batches.collection().store().clone())?;
        let analytics = Analytics::new(&context, batches.clone(), quality.clone());
        Ok(Self {
            equipment: EquipmentRepository::new(&context)?,
            containers: ContainerRepository::new(&context)?,
            users: UserRepository::new(&context)?,
            audit: AuditRepository::new(&context)?,
            batches,
            quality,
            analytics,
            context,
        })
    }

    /// Builds a brewery over a fresh in-memory store.
    ///
    /// # Errors
    ///
    /// Returns [`RecordsError::Schema`] when a pinned schema fails to compile.
    pub fn in_memory() -> Result<Self, RecordsError> {
        Self::new(StoreContext::in_memory())
    }

    /// Returns the store context.
    #[must_use]
    pub const fn context(&self) -> &StoreContext {
        &self.context
    }

    /// Returns the batch repository.
    #[must_use]
    pub const fn batches(&self) -> &BatchRepository {
        &self.batches
    }

    /// Returns the equipment repository.
    #[must_use]
    pub const fn equipment(&self) -> &EquipmentRepository {
        &self.equipment
    }

    /// Returns the container repository.
    #[must_use]
    pub const fn containers(&self) -> &ContainerRepository {
        &self.containers
    }

    /// Returns the user repository.
    #[must_use]
    pub const fn users(&self) -> &UserRepository {
        &self.users
    }

    /// Returns the audit repository.
    #[must_use]
    pub const fn audit(&self) -> &AuditRepository {
        &self.audit
    }

    /// Returns the quality repository.
    #[must_use]
    pub const fn quality(&self) -> &QualityRepository {
        &self.quality
    }

    /// Returns the analytics service.
    #[must_use]
    pub const fn analytics(&self) -> &Analytics {
        &self.analytics
    }

    /// Binds `caller` to a new session.
    #[must_use]
    pub fn session(&self, caller: Caller) -> BrewSession<'_> {
        BrewSession {
            brewery: self,
            caller,
        }
    }

    /// Binds the registered user `uid` to a new session.
    ///
    /// Active admins get privileged access; everyone else acts as an owner.
    ///
    /// # Errors
    ///
    /// Returns [`RecordsError::Store`] with `NotFound` when no profile exists
    /// and [`RecordsError::Deactivated`] when the user is deactivated.
    pub async fn session_for(&self, uid: &RecordId) -> Result<BrewSession<'_>, RecordsError> {
        let reader = Caller::owner(OwnerId::from(uid.clone()));
        let Some(profile) = self.users.profile(uid, &reader).await? else {
            return Err(RecordStoreError::NotFound {
                path: self.users.collection().store().record_path(uid).to_string(),
            }
            .into());
        };
        if !profile.is_active {
            return Err(RecordsError::Deactivated {
                uid: uid.to_string(),
            });
        }
        Ok(self.session(profile.caller()))
    }
}

// ============================================================================
// SECTION: Sessions
// ============================================================================

/// Outcome of [`BrewSession::clear_owned_data`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClearReport {
    /// Batches deleted.
    pub batches: usize,
    /// Equipment deleted.
    pub equipment: usize,
    /// Containers deleted.
    pub containers: usize,
    /// Deletes that failed and were skipped.
    pub failures: usize,
}

/// Outcome of [`BrewSession::seed_sample_data`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SeedReport {
    /// Result of the sweep run before seeding.
    pub cleared: ClearReport,
    /// Seeded batch ids, parent first.
    pub batches: Vec<RecordId>,
    /// Seeded equipment ids.
    pub equipment: Vec<RecordId>,
    /// Seeded container ids.
    pub containers: Vec<RecordId>,
    /// Seeded quality check ids.
    pub quality_checks: Vec<RecordId>,
}

/// One day in milliseconds.
const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// Caller-bound view of a [`Brewery`].
#[derive(Debug, Clone)]
pub struct BrewSession<'a> {
    /// Repositories.
    brewery: &'a Brewery,
    /// Identity used for every call.
    caller: Caller,
}

impl BrewSession<'_> {
    /// Returns the bound caller.
    #[must_use]
    pub const fn caller(&self) -> &Caller {
        &self.caller
    }

    /// Creates a batch and records `BATCH_CREATE`.
    ///
    /// # Errors
    ///
    /// Returns [`RecordsError`] when validation or the write fails.
    pub async fn create_batch(&self, draft: &BatchDraft) -> Result<Batch, RecordsError> {
        let batch = self.brewery.batches.create(draft, &self.caller).await?;
        let details = AuditDetails::entity(BATCHES_PATH, batch.id.as_str())
            .with_changes(changes_of(draft));
        self.record(AuditEventType::BatchCreate, &details).await;
        Ok(batch)
    }

    /// Creates a batch with a generated batch code and records
    /// `BATCH_CREATE`.
    ///
    /// The code uses the brew date (`batchDate`, or now), the next free daily
    /// sequence among the caller's visible batches, and the draft's batch
    /// type (first fermentation when unset). With a `parent`, the new batch
    /// extends the parent's lineage and is linked as its child.
    ///
    /// # Errors
    ///
    /// Returns [`RecordsError`] when the parent is not visible, the day has no
    /// free sequence, or a write fails.
    pub async fn create_batch_with_code(
        &self,
        draft: &BatchDraft,
        parent: Option<&RecordId>,
    ) -> Result<Batch, RecordsError> {
        let batches = &self.brewery.batches;
        let parent_batch = match parent {
            Some(id) => Some(batches.get(id, &self.caller).await?.ok_or_else(|| {
                RecordsError::from(RecordStoreError::NotFound {
                    path: batches.collection().store().record_path(id).to_string(),
                })
            })?),
            None => None,
        };
        let brewed = draft.batch_date.unwrap_or_else(|| self.brewery.context.clock().now());
        let date = date_of(brewed)?;
        let existing = batches.list(&self.caller).await?;
        let codes = existing.iter().filter_map(|batch| batch.batch_code.as_ref());
        let sequence = next_sequence(codes.map(|code| code.code.as_str()), date)?;
        let kind = draft.batch_type.map_or(BatchCodeKind::Primary, BatchCodeKind::from);
        let parent_code = parent_batch.as_ref().and_then(|batch| batch.batch_code.as_ref());
        let code = create_batch_code(date, sequence, kind, parent_code)?;
        let coded = BatchDraft {
            batch_code: Some(code),
            batch_number: Some(sequence),
            batch_date: Some(brewed),
            parent_batch_id: parent.map(|id| id.as_str().to_string()),
            ..draft.clone()
        };
        let batch = self.create_batch(&coded).await?;
        if let Some(parent) = parent {
            batches.link_child(parent, &batch, &self.caller).await?;
        }
        Ok(batch)
    }

    /// Applies `patch` to batch `id` and records `BATCH_UPDATE`.
    ///
    /// # Errors
    ///
    /// Returns [`RecordsError`] when the batch is missing or the merged batch
    /// is invalid.
    pub async fn update_batch(
        &self,
        id: &RecordId,
        patch: &BatchPatch,
    ) -> Result<Batch, RecordsError> {
        let batch = self.brewery.batches.update(id, patch, &self.caller).await?;
        let details =
            AuditDetails::entity(BATCHES_PATH, id.as_str()).with_changes(changes_of(patch));
        self.record(AuditEventType::BatchUpdate, &details).await;
        Ok(batch)
    }

    /// Moves batch `id` to `stage` and records `BATCH_UPDATE`.
    ///
    /// # Errors
    ///
    /// Returns [`RecordsError`] as [`BrewSession::update_batch`] does.
    pub async fn set_stage(
        &self,
        id: &RecordId,
        stage: BatchStage,
    ) -> Result<Batch, RecordsError> {
        let patch = BatchPatch {
            stage: Some(stage),
            ..BatchPatch::default()
        };
        self.update_batch(id, &patch).await
    }

    /// Applies `patch` to a checklist task of batch `id` and records
    /// `BATCH_UPDATE`.
    ///
    /// # Errors
    ///
    /// Returns [`RecordsError`] when the batch, checklist or task is missing
    /// or the write fails.
    pub async fn update_task(
        &self,
        id: &RecordId,
        checklist: &str,
        task: &str,
        patch: &TaskPatch,
    ) -> Result<Batch, RecordsError> {
        let batch =
            self.brewery.batches.update_task(id, checklist, task, patch, &self.caller).await?;
        let mut changes = Map::new();
        changes.insert("checklistId".to_string(), Value::String(checklist.to_string()));
        changes.insert("taskId".to_string(), Value::String(task.to_string()));
        if let Some(completed) = patch.completed {
            changes.insert("completed".to_string(), Value::Bool(completed));
        }
        let details = AuditDetails::entity(BATCHES_PATH, id.as_str()).with_changes(Some(changes));
        self.record(AuditEventType::BatchUpdate, &details).await;
        Ok(batch)
    }

    /// Deletes batch `id` and records `BATCH_DELETE`.
    ///
    /// # Errors
    ///
    /// Returns [`RecordsError`] when the batch is missing or the store fails.
    pub async fn delete_batch(&self, id: &RecordId) -> Result<(), RecordsError> {
        self.brewery.batches.delete(id, &self.caller).await?;
        let details = AuditDetails::entity(BATCHES_PATH, id.as_str());
        self.record(AuditEventType::BatchDelete, &details).await;
        Ok(())
    }

    /// Replaces the status of equipment `id` and records
    /// `EQUIPMENT_STATUS_CHANGE`.
    ///
    /// # Errors
    ///
    /// Returns [`RecordsError`] when the equipment is missing or the write
    /// fails.
    pub async fn set_equipment_status(
        &self,
        id: &RecordId,
        state: EquipmentState,
        current_batch_id: Option<String>,
    ) -> Result<Equipment, RecordsError> {
        let equipment = self
            .brewery
            .equipment
            .update_status(id, state, current_batch_id, &self.caller)
            .await?;
        let changes = status_change(state.as_str(), equipment.status.current_batch_id.as_ref());
        let details = AuditDetails::entity(EQUIPMENT_PATH, id.as_str()).with_changes(Some(changes));
        self.record(AuditEventType::EquipmentStatusChange, &details).await;
        Ok(equipment)
    }

    /// Replaces the status of container `id` and records
    /// `CONTAINER_STATUS_CHANGE`.
    ///
    /// # Errors
    ///
    /// Returns [`RecordsError`] when the container is missing or the write
    /// fails.
    pub async fn set_container_status(
        &self,
        id: &RecordId,
        state: ContainerState,
        current_batch_id: Option<String>,
    ) -> Result<Container, RecordsError> {
        let container = self
            .brewery
            .containers
            .update_status(id, state, current_batch_id, &self.caller)
            .await?;
        let changes = status_change(state.as_str(), container.status.current_batch_id.as_ref());
        let details =
            AuditDetails::entity(CONTAINERS_PATH, id.as_str()).with_changes(Some(changes));
        self.record(AuditEventType::ContainerStatusChange, &details).await;
        Ok(container)
    }

    /// Records a quality check on batch `batch` and `QUALITY_CHECK_ADDED`,
    /// plus `QUALITY_CHECK_FAILED` when the check failed.
    ///
    /// # Errors
    ///
    /// Returns [`RecordsError`] when the batch is not visible or the check is
    /// invalid.
    pub async fn add_quality_check(
        &self,
        batch: &RecordId,
        draft: &QualityCheckDraft,
    ) -> Result<QualityCheck, RecordsError> {
        let check = self.brewery.quality.add_check(batch, draft, &self.caller).await?;
        let details =
            AuditDetails::entity(QUALITY_PATH, check.id.as_str()).with_changes(changes_of(draft));
        self.record(AuditEventType::QualityCheckAdded, &details).await;
        if check.status == CheckStatus::Fail {
            let failed = details.with_notes(format!(
                "{} check failed on batch {batch}",
                check.kind.as_str()
            ));
            self.record(AuditEventType::QualityCheckFailed, &failed).await;
        }
        Ok(check)
    }

    /// Stamps the caller's last login and records `USER_LOGIN`.
    ///
    /// # Errors
    ///
    /// Returns [`RecordsError`] when the caller has no visible profile.
    pub async fn record_login(&self) -> Result<UserProfile, RecordsError> {
        let uid = RecordId::new(self.caller.id().as_str())?;
        let profile = self.brewery.users.update_last_login(&uid, &self.caller).await?;
        self.record(AuditEventType::UserLogin, &AuditDetails::entity(USERS_PATH, uid.as_str()))
            .await;
        Ok(profile)
    }

    /// Records `USER_LOGOUT`.
    pub async fn record_logout(&self) {
        let details = AuditDetails::entity(USERS_PATH, self.caller.id().as_str());
        self.record(AuditEventType::UserLogout, &details).await;
    }

    /// Changes the role of user `uid` and records `USER_ROLE_CHANGE`.
    ///
    /// # Errors
    ///
    /// Returns [`RecordsError::Forbidden`] for non-privileged callers and
    /// [`RecordsError`] when the profile is missing.
    pub async fn change_role(
        &self,
        uid: &RecordId,
        role: UserRole,
    ) -> Result<UserProfile, RecordsError> {
        let profile = self.brewery.users.update_role(uid, role, &self.caller).await?;
        let mut changes = Map::new();
        changes.insert("role".to_string(), Value::String(role.as_str().to_string()));
        let details = AuditDetails::entity(USERS_PATH, uid.as_str()).with_changes(Some(changes));
        self.record(AuditEventType::UserRoleChange, &details).await;
        Ok(profile)
    }

    /// Deletes every batch, piece of equipment and container the caller owns.
    ///
    /// Records are deleted one at a time; a failed delete is logged, counted
    /// and skipped. The sweep is not atomic.
    ///
    /// # Errors
    ///
    /// Returns [`RecordsError`] only when listing the owned records fails.
    pub async fn clear_owned_data(&self) -> Result<ClearReport, RecordsError> {
        let owner = Caller::owner(self.caller.id().clone());
        let mut report = ClearReport::default();
        for batch in self.brewery.batches.list(&owner).await? {
            match self.brewery.batches.delete(&batch.id, &owner).await {
                Ok(()) => report.batches += 1,
                Err(err) => {
                    warn!(collection = BATCHES_PATH, id = %batch.id, error = %err, "delete failed");
                    report.failures += 1;
                }
            }
        }
        for item in self.brewery.equipment.list(&owner).await? {
            match self.brewery.equipment.delete(&item.id, &owner).await {
                Ok(()) => report.equipment += 1,
                Err(err) => {
                    warn!(
                        collection = EQUIPMENT_PATH,
                        id = %item.id,
                        error = %err,
                        "delete failed"
                    );
                    report.failures += 1;
                }
            }
        }
        for item in self.brewery.containers.list(&owner).await? {
            match self.brewery.containers.delete(&item.id, &owner).await {
                Ok(()) => report.containers += 1,
                Err(err) => {
                    warn!(
                        collection = CONTAINERS_PATH,
                        id = %item.id,
                        error = %err,
                        "delete failed"
                    );
                    report.failures += 1;
                }
            }
        }
        info!(
            owner = %self.caller.id(),
            batches = report.batches,
            equipment = report.equipment,
            containers = report.containers,
            failures = report.failures,
            "cleared owned data"
        );
        Ok(report)
    }

    /// Replaces the caller's owned data with a small linked sample set.
    ///
    /// Runs [`BrewSession::clear_owned_data`] first, then creates a kettle and
    /// two fermenters, a coded first-fermentation batch with a brew-day
    /// checklist and a coded second-fermentation child, stage entries and
    /// readings for both, a bottle set and a keg, and one quality check per
    /// batch. Both fermenters end up `IN_USE` and the bottle set `FILLED`
    /// with the parent batch. Every batch, status and check goes through the
    /// audited session flows.
    ///
    /// # Errors
    ///
    /// Returns [`RecordsError`] at the first failed step; records created
    /// before the failure are kept.
    pub async fn seed_sample_data(&self) -> Result<SeedReport, RecordsError> {
        let cleared = self.clear_owned_data().await?;
        let now = self.brewery.context.clock().now();
        let days_ago = |days: i64| now.plus_millis(-days * DAY_MS);

        let kettle = self.seed_equipment("20 Gallon Kettle", EquipmentType::Kettle, 20.0).await?;
        let fermenter_a =
            self.seed_equipment("5 Gallon Fermenter 1", EquipmentType::Fermenter, 5.0).await?;
        let fermenter_b =
            self.seed_equipment("5 Gallon Fermenter 2", EquipmentType::Fermenter, 5.0).await?;

        let brew_day = Checklist::new(
            "brew-day",
            "Brew day",
            vec![
                Task::new("sanitize", "Sanitize fermenter"),
                Task::new("steep", "Steep tea"),
                Task::new("pitch", "Add starter"),
            ],
        );
        let parent_draft = BatchDraft {
            description: Some("Standard lime batch, primary fermentation ongoing.".to_string()),
            batch_type: Some(BatchType::Primary),
            batch_date: Some(days_ago(5)),
            tea_type: Some("Black".to_string()),
            sugar_amount: Some(18.0),
            starter_amount: Some(2.0),
            current_equipment_id: Some(fermenter_a.as_str().to_string()),
            checklists: vec![brew_day],
            ..BatchDraft::new("LimeAid", BatchStage::Primary, 18.0)
        };
        let parent = self.create_batch_with_code(&parent_draft, None).await?;
        let child_draft = BatchDraft {
            description: Some("POG flavoring, secondary fermentation ongoing.".to_string()),
            batch_type: Some(BatchType::Secondary),
            batch_date: Some(days_ago(2)),
            current_equipment_id: Some(fermenter_b.as_str().to_string()),
            ..BatchDraft::new("POG", BatchStage::Secondary, 4.0)
        };
        let child = self.create_batch_with_code(&child_draft, Some(&parent.id)).await?;
        let done = TaskPatch {
            completed: Some(true),
            ..TaskPatch::default()
        };
        self.update_task(&parent.id, "brew-day", "sanitize", &done).await?;
        self.seed_logs(&parent, &fermenter_a, days_ago(5)).await?;
        self.seed_logs(&child, &fermenter_b, days_ago(2)).await?;

        let bottles =
            self.seed_container("Bottle Set 1 (16oz)", ContainerType::Bottle, 3.0).await?;
        let keg = self.seed_container("Keg 1 (5 Gallon)", ContainerType::Keg, 5.0).await?;

        let ph = QualityCheckDraft::new(CheckType::Ph, CheckStatus::Pass).with_value(4.5, "pH");
        let taste = QualityCheckDraft::new(CheckType::Taste, CheckStatus::Warning);
        let quality_checks = vec![
            self.add_quality_check(&parent.id, &ph).await?.id,
            self.add_quality_check(&child.id, &taste).await?.id,
        ];

        let holding = |batch: &Batch| Some(batch.id.as_str().to_string());
        self.set_equipment_status(&fermenter_a, EquipmentState::InUse, holding(&parent)).await?;
        self.set_equipment_status(&fermenter_b, EquipmentState::InUse, holding(&child)).await?;
        self.set_container_status(&bottles, ContainerState::Filled, holding(&parent)).await?;

        info!(
            owner = %self.caller.id(),
            parent = %parent.id,
            child = %child.id,
            "seeded sample data"
        );
        Ok(SeedReport {
            cleared,
            batches: vec![parent.id, child.id],
            equipment: vec![kettle, fermenter_a, fermenter_b],
            containers: vec![bottles, keg],
            quality_checks,
        })
    }

    /// Creates one piece of available sample equipment.
    async fn seed_equipment(
        &self,
        name: &str,
        kind: EquipmentType,
        capacity: f64,
    ) -> Result<RecordId, RecordsError> {
        let draft = EquipmentDraft::new(name, kind, capacity);
        Ok(self.brewery.equipment.create(&draft, &self.caller).await?.id)
    }

    /// Creates one empty sample container.
    async fn seed_container(
        &self,
        name: &str,
        kind: ContainerType,
        capacity: f64,
    ) -> Result<RecordId, RecordsError> {
        let draft = ContainerDraft::new(name, kind, capacity);
        Ok(self.brewery.containers.create(&draft, &self.caller).await?.id)
    }

    /// Opens the current stage of `batch` on `fermenter` and takes its first
    /// readings.
    async fn seed_logs(
        &self,
        batch: &Batch,
        fermenter: &RecordId,
        started: Timestamp,
    ) -> Result<(), RecordsError> {
        let draft = StageDraft {
            stage: batch.stage,
            start_time: started,
            end_time: None,
            equipment_id: fermenter.as_str().to_string(),
            notes: Some(format!("Started {}", batch.stage.as_str())),
        };
        let batches = &self.brewery.batches;
        batches.add_stage(&batch.id, &draft, &self.caller).await?;
        for (kind, value) in [(MeasurementKind::Ph, 4.5), (MeasurementKind::Temperature, 70.0)] {
            batches.add_measurement(&batch.id, kind, value, None, &self.caller).await?;
        }
        Ok(())
    }

    /// Appends an audit event, logging instead of failing on error.
    async fn record(&self, event_type: AuditEventType, details: &AuditDetails) {
        if let Err(err) = self.brewery.audit.log_event(event_type, details, &self.caller).await {
            warn!(
                event = event_type.as_str(),
                caller = %self.caller.id(),
                error = %err,
                "audit event not recorded"
            );
        }
    }
}

/// Builds the `changes` map of a status event.
fn status_change(state: &str, current_batch_id: Option<&String>) -> Map<String, Value> {
    let mut changes = Map::new();
    changes.insert("status".to_string(), Value::String(state.to_string()));
    if let Some(batch) = current_batch_id {
        changes.insert("currentBatchId".to_string(), Value::String(batch.clone()));
    }
    changes
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test assertions use unwrap for clarity.")]

    use serde_json::json;
    use tracing_test::traced_test;

    use super::*;

    #[test]
    fn status_changes_name_the_batch_when_present() {
        let batch = "b1".to_string();
        let busy = status_change("IN_USE", Some(&batch));
        assert_eq!(Value::Object(busy), json!({"status": "IN_USE", "currentBatchId": "b1"}));
        let idle = status_change("AVAILABLE", None);
        assert_eq!(Value::Object(idle), json!({"status": "AVAILABLE"}));
    }

    #[tokio::test]
    #[traced_test]
    async fn clearing_reports_counts_in_logs() {
        let brewery = Brewery::in_memory().unwrap();
        let session = brewery.session(Caller::owner(OwnerId::new("u1").unwrap()));
        session.create_batch(&BatchDraft::new("One", BatchStage::Primary, 1.0)).await.unwrap();
        let report = session.clear_owned_data().await.unwrap();
        assert_eq!(
            report,
            ClearReport {
                batches: 1,
                ..ClearReport::default()
            }
        );
        assert!(logs_contain("cleared owned data"));
    }
}
