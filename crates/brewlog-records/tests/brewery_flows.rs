// crates/brewlog-records/tests/brewery_flows.rs
// ============================================================================
// Module: Brewery Flow Tests
// Description: End-to-end session flows over the in-memory driver.
// Purpose: Ensure ownership, log gating, auditing, and status rules hold.
// Dependencies: brewlog-records, brewlog-core, serde_json, tokio
// ============================================================================

//! ## Overview
//! Drives [`Brewery`] sessions for several callers and checks what each one
//! can see and change, which audit events are written, and how nested status
//! objects are replaced.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use brewlog_core::Caller;
use brewlog_core::InMemoryTreeStore;
use brewlog_core::ManualClock;
use brewlog_core::OwnerId;
use brewlog_core::PushIdGenerator;
use brewlog_core::RecordId;
use brewlog_core::RecordStoreError;
use brewlog_core::SharedTreeStore;
use brewlog_core::StoreContext;
use brewlog_core::Timestamp;
use brewlog_records::AuditEventType;
use brewlog_records::BatchDraft;
use brewlog_records::BatchStage;
use brewlog_records::BatchType;
use brewlog_records::Brewery;
use brewlog_records::CheckStatus;
use brewlog_records::CheckType;
use brewlog_records::Checklist;
use brewlog_records::ContainerState;
use brewlog_records::ContainerType;
use brewlog_records::EquipmentState;
use brewlog_records::EquipmentType;
use brewlog_records::MeasurementKind;
use brewlog_records::QualityCheckDraft;
use brewlog_records::RecordsError;
use brewlog_records::Task;
use brewlog_records::TaskPatch;
use brewlog_records::UserRole;
use brewlog_records::batch::StageDraft;
use brewlog_records::batch::StagePatch;
use brewlog_records::container::ContainerDraft;
use brewlog_records::equipment::EquipmentDraft;
use brewlog_records::equipment::EquipmentMetadataPatch;
use brewlog_records::equipment::EquipmentPatch;
use brewlog_records::equipment::MaintenanceWork;
use brewlog_records::quality::QualityCheckPatch;
use brewlog_records::user::UserDraft;
use serde_json::json;

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// 2024-06-01T00:00:00Z.
const START: i64 = 1_717_200_000_000;

fn brewery() -> (Brewery, ManualClock) {
    let clock = ManualClock::new(Timestamp::from_unix_millis(START));
    let context = StoreContext::new(
        SharedTreeStore::from_store(InMemoryTreeStore::new()),
        Arc::new(clock.clone()),
        Arc::new(PushIdGenerator::with_seed(7)),
    );
    (Brewery::new(context).unwrap(), clock)
}

fn owner(id: &str) -> Caller {
    Caller::owner(OwnerId::new(id).unwrap())
}

fn admin(id: &str) -> Caller {
    Caller::privileged(OwnerId::new(id).unwrap())
}

fn rid(id: &str) -> RecordId {
    RecordId::new(id).unwrap()
}

fn event_types(events: &[brewlog_records::AuditEvent]) -> Vec<AuditEventType> {
    events.iter().map(|event| event.event_type).collect()
}

// ============================================================================
// SECTION: Batches
// ============================================================================

/// Verifies batch create, update, and delete each leave one audit event.
#[tokio::test]
async fn batch_lifecycle_is_audited() {
    let (brewery, _) = brewery();
    let alice = brewery.session(owner("alice"));
    let draft = BatchDraft::new("Ginger", BatchStage::Primary, 4.0);
    let batch = alice.create_batch(&draft).await.unwrap();
    assert_eq!(batch.created_by.as_str(), "alice");
    assert_eq!(batch.created_at, Timestamp::from_unix_millis(START));

    let moved = alice.set_stage(&batch.id, BatchStage::Secondary).await.unwrap();
    assert_eq!(moved.stage, BatchStage::Secondary);
    assert!(moved.updated_at > batch.updated_at);
    alice.delete_batch(&batch.id).await.unwrap();
    assert!(brewery.batches().get(&batch.id, alice.caller()).await.unwrap().is_none());

    let events = brewery.audit().user_activity("alice", alice.caller()).await.unwrap();
    assert_eq!(
        event_types(&events),
        vec![AuditEventType::BatchCreate, AuditEventType::BatchUpdate, AuditEventType::BatchDelete]
    );
    let update = &events[1];
    assert_eq!(update.entity_type.as_deref(), Some("batches"));
    assert_eq!(update.entity_id.as_deref(), Some(batch.id.as_str()));
    assert_eq!(update.changes.clone().map(serde_json::Value::Object), Some(json!({"stage": "2F"})));
    let history =
        brewery.audit().entity_history("batches", batch.id.as_str(), alice.caller()).await.unwrap();
    assert_eq!(history.len(), 3);
}

/// Verifies other owners see batches as absent while privileged callers see them.
#[tokio::test]
async fn foreign_batches_read_as_missing() {
    let (brewery, _) = brewery();
    let alice = brewery.session(owner("alice"));
    let bob = brewery.session(owner("bob"));
    let root = brewery.session(admin("root"));
    let draft = BatchDraft::new("Hibiscus", BatchStage::Primary, 3.0);
    let batch = alice.create_batch(&draft).await.unwrap();

    assert!(brewery.batches().get(&batch.id, bob.caller()).await.unwrap().is_none());
    assert!(brewery.batches().list(bob.caller()).await.unwrap().is_empty());
    assert!(bob.set_stage(&batch.id, BatchStage::Completed).await.unwrap_err().is_not_found());
    assert!(bob.delete_batch(&batch.id).await.unwrap_err().is_not_found());

    assert_eq!(brewery.batches().list(root.caller()).await.unwrap().len(), 1);
    let renamed = root.set_stage(&batch.id, BatchStage::Kegged).await.unwrap();
    assert_eq!(renamed.created_by.as_str(), "alice");

    assert!(brewery.audit().user_activity("alice", bob.caller()).await.unwrap().is_empty());
    assert_eq!(brewery.audit().user_activity("alice", root.caller()).await.unwrap().len(), 1);
}

/// Verifies stage and measurement logs are gated by the batch and shared
/// among everyone who can see it.
#[tokio::test]
async fn batch_logs_follow_the_batch() {
    let (brewery, clock) = brewery();
    let alice = owner("alice");
    let bob = owner("bob");
    let root = admin("root");
    let batches = brewery.batches();
    let draft = BatchDraft::new("Oolong", BatchStage::Primary, 5.0);
    let batch = batches.create(&draft, &alice).await.unwrap();

    let later = StageDraft {
        stage: BatchStage::Secondary,
        start_time: Timestamp::from_unix_millis(START + 2_000),
        end_time: None,
        equipment_id: "bottles".to_string(),
        notes: None,
    };
    let earlier = StageDraft {
        stage: BatchStage::Primary,
        start_time: Timestamp::from_unix_millis(START),
        end_time: None,
        equipment_id: "crock".to_string(),
        notes: Some("sweet tea".to_string()),
    };
    batches.add_stage(&batch.id, &later, &alice).await.unwrap();
    let first = batches.add_stage(&batch.id, &earlier, &alice).await.unwrap();
    let closed = StagePatch {
        end_time: Some(Some(Timestamp::from_unix_millis(START + 2_000))),
        ..StagePatch::default()
    };
    let first = batches.update_stage(&batch.id, &first.id, &closed, &alice).await.unwrap();
    assert_eq!(first.end_time, Some(Timestamp::from_unix_millis(START + 2_000)));
    assert_eq!(first.notes.as_deref(), Some("sweet tea"));

    let stages = batches.stages(&batch.id, &alice).await.unwrap();
    let order: Vec<_> = stages.iter().map(|stage| stage.stage).collect();
    assert_eq!(order, vec![BatchStage::Primary, BatchStage::Secondary]);

    batches.add_measurement(&batch.id, MeasurementKind::Ph, 3.4, None, &alice).await.unwrap();
    clock.advance(60_000);
    let reading =
        batches.add_measurement(&batch.id, MeasurementKind::Ph, 3.1, None, &root).await.unwrap();
    assert_eq!(reading.created_by.as_str(), "root");
    let readings = batches.measurements(&batch.id, &alice).await.unwrap();
    let values: Vec<f64> = readings.iter().map(|reading| reading.value).collect();
    assert_eq!(values, vec![3.4, 3.1]);

    assert!(matches!(
        batches.stages(&batch.id, &bob).await,
        Err(RecordsError::Store(RecordStoreError::NotFound { .. }))
    ));
    assert!(batches.add_stage(&batch.id, &earlier, &bob).await.unwrap_err().is_not_found());
    assert!(
        batches
            .add_measurement(&batch.id, MeasurementKind::Temperature, 22.0, None, &bob)
            .await
            .unwrap_err()
            .is_not_found()
    );
}

/// Verifies generated batch codes count per day and extend the parent lineage.
#[tokio::test]
async fn coded_batches_extend_lineage() {
    let (brewery, _) = brewery();
    let alice = brewery.session(owner("alice"));
    let parent_draft = BatchDraft {
        batch_type: Some(BatchType::Primary),
        ..BatchDraft::new("Mother", BatchStage::Primary, 10.0)
    };
    let parent = alice.create_batch_with_code(&parent_draft, None).await.unwrap();
    let parent_code = parent.batch_code.clone().unwrap();
    assert_eq!(parent_code.code, "20240601-0001-1F00");
    assert_eq!(parent_code.lineage, vec!["20240601-0001-1F00".to_string()]);
    assert_eq!(parent.batch_number, Some(1));

    let child_draft = BatchDraft {
        batch_type: Some(BatchType::Secondary),
        ..BatchDraft::new("Ginger split", BatchStage::Secondary, 2.0)
    };
    let child = alice.create_batch_with_code(&child_draft, Some(&parent.id)).await.unwrap();
    let child_code = child.batch_code.clone().unwrap();
    assert_eq!(child_code.code, "20240601-0002-2F00");
    assert_eq!(child_code.parent_code.as_deref(), Some("20240601-0001-1F00"));
    assert_eq!(child_code.lineage, vec!["20240601-0001-1F00".to_string()]);
    assert_eq!(child.parent_batch_id.as_deref(), Some(parent.id.as_str()));

    let parent = brewery.batches().get(&parent.id, alice.caller()).await.unwrap().unwrap();
    assert_eq!(parent.child_batch_ids, vec![child.id.as_str().to_string()]);
    assert_eq!(parent.batch_code.unwrap().child_codes, vec!["20240601-0002-2F00".to_string()]);

    let missing = alice.create_batch_with_code(&child_draft, Some(&rid("nope"))).await;
    assert!(missing.unwrap_err().is_not_found());
}

// ============================================================================
// SECTION: Quality
// ============================================================================

/// Verifies failed checks add a second audit event and are queryable.
#[tokio::test]
async fn failed_quality_checks_are_flagged() {
    let (brewery, _) = brewery();
    let alice = brewery.session(owner("alice"));
    let root = brewery.session(admin("root"));
    let draft = BatchDraft::new("Jun", BatchStage::Primary, 2.0);
    let batch = alice.create_batch(&draft).await.unwrap();

    let failed = alice
        .add_quality_check(&batch.id, &QualityCheckDraft::new(CheckType::Taste, CheckStatus::Fail))
        .await
        .unwrap();
    assert_eq!(failed.batch_id, batch.id.as_str());
    assert_eq!(failed.updated_by.as_str(), "alice");
    let reading = QualityCheckDraft::new(CheckType::Ph, CheckStatus::Pass).with_value(3.2, "pH");
    alice.add_quality_check(&batch.id, &reading).await.unwrap();

    let flagged = brewery.audit().failed_quality_checks(alice.caller()).await.unwrap();
    assert_eq!(flagged.len(), 1);
    assert!(flagged[0].notes.as_deref().unwrap().contains("TASTE"));
    let quality = brewery.quality();
    assert_eq!(quality.failed_checks(&batch.id, alice.caller()).await.unwrap().len(), 1);
    let ph = quality.checks_by_type(&batch.id, CheckType::Ph, alice.caller()).await.unwrap();
    assert_eq!(ph.len(), 1);
    assert_eq!(ph[0].unit.as_deref(), Some("pH"));

    let patch = QualityCheckPatch {
        status: Some(CheckStatus::Warning),
        notes: Some(Some("retasted".to_string())),
        ..QualityCheckPatch::default()
    };
    let revised = quality.update_check(&batch.id, &failed.id, &patch, root.caller()).await.unwrap();
    assert_eq!(revised.status, CheckStatus::Warning);
    assert_eq!(revised.updated_by.as_str(), "root");
    assert_eq!(revised.created_by.as_str(), "alice");
}

// ============================================================================
// SECTION: Equipment and Containers
// ============================================================================

/// Verifies equipment status is replaced whole and maintenance merges.
#[tokio::test]
async fn equipment_status_and_maintenance() {
    let (brewery, clock) = brewery();
    let alice = brewery.session(owner("alice"));
    let equipment = brewery.equipment();
    let draft = EquipmentDraft::new("Fermenter A", EquipmentType::Fermenter, 20.0);
    let item = equipment.create(&draft, alice.caller()).await.unwrap();
    assert_eq!(item.metadata.created_by.as_str(), "alice");
    assert_eq!(item.status.current, EquipmentState::Available);

    let busy = alice
        .set_equipment_status(&item.id, EquipmentState::InUse, Some("batch-1".to_string()))
        .await
        .unwrap();
    assert_eq!(busy.status.current_batch_id.as_deref(), Some("batch-1"));
    assert!(equipment.available(alice.caller()).await.unwrap().is_empty());
    assert_eq!(equipment.in_use(alice.caller()).await.unwrap().len(), 1);

    clock.advance(1_000);
    let dirty = alice.set_equipment_status(&item.id, EquipmentState::Dirty, None).await.unwrap();
    assert_eq!(dirty.status.current_batch_id, None);
    assert_eq!(dirty.status.last_updated, Timestamp::from_unix_millis(START + 1_000));

    let cleaned = MaintenanceWork {
        cleaned: true,
        notes: Some("scrubbed".to_string()),
        ..MaintenanceWork::default()
    };
    let item = equipment.record_maintenance(&item.id, cleaned, alice.caller()).await.unwrap();
    let log = item.maintenance.clone().unwrap();
    assert_eq!(log.last_cleaned, Some(Timestamp::from_unix_millis(START + 1_000)));
    assert_eq!(log.last_maintained, None);
    clock.advance(1_000);
    let serviced = MaintenanceWork {
        maintained: true,
        ..MaintenanceWork::default()
    };
    let item = equipment.record_maintenance(&item.id, serviced, alice.caller()).await.unwrap();
    let log = item.maintenance.clone().unwrap();
    assert_eq!(log.last_cleaned, Some(Timestamp::from_unix_millis(START + 1_000)));
    assert_eq!(log.last_maintained, Some(Timestamp::from_unix_millis(START + 2_000)));
    assert_eq!(log.notes.as_deref(), Some("scrubbed"));

    let rename = EquipmentPatch {
        metadata: Some(EquipmentMetadataPatch {
            name: Some("Fermenter B".to_string()),
            ..EquipmentMetadataPatch::default()
        }),
        ..EquipmentPatch::default()
    };
    let renamed = equipment.update(&item.id, &rename, alice.caller()).await.unwrap();
    assert_eq!(renamed.metadata.name, "Fermenter B");
    assert_eq!(renamed.metadata.kind, EquipmentType::Fermenter);
    assert_eq!(renamed.metadata.created_by.as_str(), "alice");
    assert_eq!(renamed.metadata.created_at, Timestamp::from_unix_millis(START));
    assert!(renamed.metadata.updated_at > item.metadata.updated_at);

    let bob = owner("bob");
    assert!(equipment.get(&item.id, &bob).await.unwrap().is_none());
    let changes = brewery
        .audit()
        .entity_history("equipment", item.id.as_str(), alice.caller())
        .await
        .unwrap();
    assert_eq!(changes.len(), 2);
    assert!(changes.iter().all(|event| event.event_type == AuditEventType::EquipmentStatusChange));
}

/// Verifies container status changes stamp fill and empty dates.
#[tokio::test]
async fn container_status_stamps_dates() {
    let (brewery, clock) = brewery();
    let alice = brewery.session(owner("alice"));
    let containers = brewery.containers();
    let keg = containers
        .create(&ContainerDraft::new("Keg 1", ContainerType::Keg, 19.0), alice.caller())
        .await
        .unwrap();
    assert_eq!(keg.status.current, ContainerState::Empty);
    assert_eq!(keg.status.empty_date, Some(Timestamp::from_unix_millis(START)));

    clock.advance(5_000);
    let filled = alice
        .set_container_status(&keg.id, ContainerState::Filled, Some("b1".to_string()))
        .await
        .unwrap();
    assert_eq!(filled.status.fill_date, Some(Timestamp::from_unix_millis(START + 5_000)));
    assert_eq!(filled.status.empty_date, None);
    assert_eq!(containers.filled(alice.caller()).await.unwrap().len(), 1);
    assert_eq!(containers.by_batch("b1", alice.caller()).await.unwrap().len(), 1);
    assert!(containers.empty(alice.caller()).await.unwrap().is_empty());

    clock.advance(5_000);
    let emptied = alice.set_container_status(&keg.id, ContainerState::Empty, None).await.unwrap();
    assert_eq!(emptied.status.empty_date, Some(Timestamp::from_unix_millis(START + 10_000)));
    assert_eq!(emptied.status.fill_date, None);
    assert_eq!(emptied.status.current_batch_id, None);
    assert!(containers.by_batch("b1", alice.caller()).await.unwrap().is_empty());
}

// ============================================================================
// SECTION: Users
// ============================================================================

/// Verifies registration, role changes, and activation rules.
#[tokio::test]
async fn user_roles_need_privilege() {
    let (brewery, _) = brewery();
    let users = brewery.users();
    let alice = owner("alice");
    let draft = |role| UserDraft {
        display_name: "Alice".to_string(),
        email: "alice@example.com".to_string(),
        role,
    };

    assert!(matches!(
        users.register(&draft(UserRole::Admin), &alice).await,
        Err(RecordsError::Forbidden { .. })
    ));
    let profile = users.register(&draft(UserRole::Brewer), &alice).await.unwrap();
    assert_eq!(profile.id.as_str(), "alice");
    assert!(profile.is_active);
    assert!(!profile.caller().is_privileged());
    assert!(matches!(
        users.register(&draft(UserRole::Brewer), &alice).await,
        Err(RecordsError::Store(RecordStoreError::Conflict { .. }))
    ));
    let bad_email = UserDraft {
        email: "not-an-email".to_string(),
        ..draft(UserRole::Viewer)
    };
    assert!(matches!(
        users.register(&bad_email, &owner("carol")).await,
        Err(RecordsError::Store(RecordStoreError::Validation(_)))
    ));

    assert!(matches!(
        users.update_role(&rid("alice"), UserRole::Admin, &alice).await,
        Err(RecordsError::Forbidden { .. })
    ));
    assert!(matches!(
        users.users_by_role(UserRole::Brewer, &alice).await,
        Err(RecordsError::Forbidden { .. })
    ));

    let root = admin("root");
    let root_profile = users
        .register(
            &UserDraft {
                display_name: "Root".to_string(),
                email: "root@example.com".to_string(),
                role: UserRole::Admin,
            },
            &root,
        )
        .await
        .unwrap();
    assert!(root_profile.caller().is_privileged());

    let root_session = brewery.session_for(&rid("root")).await.unwrap();
    assert!(root_session.caller().is_privileged());
    let promoted = root_session.change_role(&rid("alice"), UserRole::Admin).await.unwrap();
    assert_eq!(promoted.role, UserRole::Admin);
    assert!(promoted.caller().is_privileged());
    assert_eq!(users.users_by_role(UserRole::Admin, &root).await.unwrap().len(), 2);

    let deactivated = users.deactivate(&rid("alice"), &root).await.unwrap();
    assert!(!deactivated.is_active);
    assert!(deactivated.deactivated_at.is_some());
    assert!(!deactivated.caller().is_privileged());
    assert!(matches!(
        brewery.session_for(&rid("alice")).await,
        Err(RecordsError::Deactivated { .. })
    ));
    let reactivated = users.reactivate(&rid("alice"), &root).await.unwrap();
    assert!(reactivated.is_active);
    assert_eq!(reactivated.deactivated_at, None);
    assert!(brewery.session_for(&rid("alice")).await.unwrap().caller().is_privileged());
    assert!(brewery.session_for(&rid("nobody")).await.unwrap_err().is_not_found());

    let changes = brewery.audit().user_activity("root", &root).await.unwrap();
    assert_eq!(event_types(&changes), vec![AuditEventType::UserRoleChange]);
}

/// Verifies login stamps the profile and is audited.
#[tokio::test]
async fn logins_are_recorded() {
    let (brewery, clock) = brewery();
    let alice = owner("alice");
    brewery
        .users()
        .register(
            &UserDraft {
                display_name: "Alice".to_string(),
                email: "alice@example.com".to_string(),
                role: UserRole::Viewer,
            },
            &alice,
        )
        .await
        .unwrap();
    clock.advance(30_000);
    let session = brewery.session_for(&rid("alice")).await.unwrap();
    let profile = session.record_login().await.unwrap();
    assert_eq!(profile.last_login, Some(Timestamp::from_unix_millis(START + 30_000)));
    session.record_logout().await;
    let events = brewery.audit().user_activity("alice", &alice).await.unwrap();
    assert_eq!(event_types(&events), vec![AuditEventType::UserLogin, AuditEventType::UserLogout]);
}

// ============================================================================
// SECTION: Bulk Cleanup
// ============================================================================

/// Verifies clearing owned data removes only the caller's records.
#[tokio::test]
async fn clear_owned_data_spares_other_owners() {
    let (brewery, _) = brewery();
    let alice = brewery.session(owner("alice"));
    let bob = brewery.session(owner("bob"));
    let root = brewery.session(admin("root"));
    alice.create_batch(&BatchDraft::new("One", BatchStage::Primary, 1.0)).await.unwrap();
    alice.create_batch(&BatchDraft::new("Two", BatchStage::Primary, 1.0)).await.unwrap();
    bob.create_batch(&BatchDraft::new("Bob's", BatchStage::Primary, 1.0)).await.unwrap();
    brewery
        .equipment()
        .create(&EquipmentDraft::new("Kettle", EquipmentType::Kettle, 8.0), alice.caller())
        .await
        .unwrap();
    brewery
        .containers()
        .create(&ContainerDraft::new("Bottle", ContainerType::Bottle, 0.5), alice.caller())
        .await
        .unwrap();

    let report = root.clear_owned_data().await.unwrap();
    assert_eq!(report.batches + report.equipment + report.containers, 0);

    let report = alice.clear_owned_data().await.unwrap();
    assert_eq!(report.batches, 2);
    assert_eq!(report.equipment, 1);
    assert_eq!(report.containers, 1);
    assert_eq!(report.failures, 0);

    let remaining = brewery.batches().list(root.caller()).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].created_by.as_str(), "bob");
    assert!(brewery.equipment().list(root.caller()).await.unwrap().is_empty());
}

// ============================================================================
// SECTION: Checklists and Sample Data
// ============================================================================

/// Verifies completing tasks stamps them and closes the checklist.
#[tokio::test]
async fn checklist_tasks_complete_with_a_stamp() {
    let (brewery, clock) = brewery();
    let alice = brewery.session(owner("alice"));
    let draft = BatchDraft {
        checklists: vec![Checklist::new(
            "bottling",
            "Bottling",
            vec![Task::new("rinse", "Rinse bottles"), Task::new("fill", "Fill bottles")],
        )],
        ..BatchDraft::new("Hibiscus", BatchStage::Secondary, 4.0)
    };
    let batch = alice.create_batch(&draft).await.unwrap();
    let done = TaskPatch {
        completed: Some(true),
        ..TaskPatch::default()
    };

    let rinsed_at = clock.advance(60_000);
    let updated = alice.update_task(&batch.id, "bottling", "rinse", &done).await.unwrap();
    let list = &updated.checklists[0];
    assert!(list.tasks[0].completed);
    assert_eq!(list.tasks[0].completed_at, Some(rinsed_at));
    assert!(!list.completed);
    assert_eq!(updated.name, "Hibiscus");

    clock.advance(60_000);
    let updated = alice.update_task(&batch.id, "bottling", "fill", &done).await.unwrap();
    assert!(updated.checklists[0].completed);

    let reopen = TaskPatch {
        completed: Some(false),
        notes: Some(Some("one cracked".to_string())),
        ..TaskPatch::default()
    };
    let updated = alice.update_task(&batch.id, "bottling", "rinse", &reopen).await.unwrap();
    let list = &updated.checklists[0];
    assert!(!list.completed);
    assert_eq!(list.tasks[0].completed_at, None);
    assert_eq!(list.tasks[0].notes.as_deref(), Some("one cracked"));

    let stored = brewery.batches().get(&batch.id, alice.caller()).await.unwrap().unwrap();
    assert_eq!(stored.checklists, updated.checklists);
    let events = brewery.audit().user_activity("alice", alice.caller()).await.unwrap();
    let last = events.last().unwrap();
    assert_eq!(last.event_type, AuditEventType::BatchUpdate);
    let changes = serde_json::Value::Object(last.changes.clone().unwrap());
    assert_eq!(changes, json!({"checklistId": "bottling", "taskId": "rinse", "completed": false}));
}

/// Verifies unknown checklists, unknown tasks and foreign batches read as missing.
#[tokio::test]
async fn checklist_tasks_must_exist() {
    let (brewery, _) = brewery();
    let alice = brewery.session(owner("alice"));
    let bob = brewery.session(owner("bob"));
    let draft = BatchDraft {
        checklists: vec![Checklist::new("brew", "Brew", vec![Task::new("steep", "Steep")])],
        ..BatchDraft::new("Oolong", BatchStage::Primary, 2.0)
    };
    let batch = alice.create_batch(&draft).await.unwrap();
    let patch = TaskPatch {
        title: Some("Steep 10 minutes".to_string()),
        ..TaskPatch::default()
    };
    let unknown_list = alice.update_task(&batch.id, "bottling", "steep", &patch).await;
    assert!(unknown_list.unwrap_err().is_not_found());
    let unknown_task = alice.update_task(&batch.id, "brew", "cool", &patch).await;
    assert!(unknown_task.unwrap_err().is_not_found());
    let foreign = bob.update_task(&batch.id, "brew", "steep", &patch).await;
    assert!(foreign.unwrap_err().is_not_found());

    let renamed = alice.update_task(&batch.id, "brew", "steep", &patch).await.unwrap();
    let task = &renamed.checklists[0].tasks[0];
    assert_eq!(task.title, "Steep 10 minutes");
    assert!(!task.completed);
    assert_eq!(task.completed_at, None);
}

/// Verifies seeding replaces the caller's data with a linked sample set that
/// clearing removes again.
#[tokio::test]
async fn sample_data_seeds_and_clears() {
    let (brewery, _) = brewery();
    let alice = brewery.session(owner("alice"));
    let bob = brewery.session(owner("bob"));
    let root = brewery.session(admin("root"));
    alice.create_batch(&BatchDraft::new("Old", BatchStage::Primary, 1.0)).await.unwrap();
    bob.create_batch(&BatchDraft::new("Bob's", BatchStage::Primary, 1.0)).await.unwrap();

    let seeded = alice.seed_sample_data().await.unwrap();
    assert_eq!(seeded.cleared.batches, 1);
    assert_eq!(seeded.batches.len(), 2);
    assert_eq!(seeded.equipment.len(), 3);
    assert_eq!(seeded.containers.len(), 2);
    assert_eq!(seeded.quality_checks.len(), 2);

    let parent = brewery.batches().get(&seeded.batches[0], alice.caller()).await.unwrap().unwrap();
    let child = brewery.batches().get(&seeded.batches[1], alice.caller()).await.unwrap().unwrap();
    let parent_code = parent.batch_code.clone().unwrap();
    let child_code = child.batch_code.clone().unwrap();
    assert_eq!(parent_code.code, "20240527-0001-1F00");
    assert_eq!(child_code.code, "20240530-0001-2F00");
    assert_eq!(child_code.parent_code.as_deref(), Some("20240527-0001-1F00"));
    assert_eq!(parent_code.child_codes, vec![child_code.code.clone()]);
    assert_eq!(child.parent_batch_id.as_deref(), Some(parent.id.as_str()));
    assert_eq!(parent.child_batch_ids, vec![child.id.as_str().to_string()]);
    let sanitize = &parent.checklists[0].tasks[0];
    assert!(sanitize.completed);
    assert_eq!(sanitize.completed_at, Some(Timestamp::from_unix_millis(START)));

    assert_eq!(brewery.batches().stages(&parent.id, alice.caller()).await.unwrap().len(), 1);
    assert_eq!(brewery.batches().measurements(&child.id, alice.caller()).await.unwrap().len(), 2);
    assert_eq!(brewery.quality().checks(&child.id, alice.caller()).await.unwrap().len(), 1);
    let in_use = brewery.equipment().in_use(alice.caller()).await.unwrap();
    let mut held: Vec<_> =
        in_use.iter().filter_map(|item| item.status.current_batch_id.clone()).collect();
    held.sort();
    let mut expected = vec![parent.id.as_str().to_string(), child.id.as_str().to_string()];
    expected.sort();
    assert_eq!(held, expected);
    let filled = brewery.containers().filled(alice.caller()).await.unwrap();
    assert_eq!(filled.len(), 1);
    assert_eq!(filled[0].status.current_batch_id.as_deref(), Some(parent.id.as_str()));
    assert_eq!(filled[0].status.current, ContainerState::Filled);

    let activity = brewery.audit().user_activity("alice", alice.caller()).await.unwrap();
    let events = event_types(&activity);
    let creates = events.iter().filter(|event| **event == AuditEventType::BatchCreate).count();
    assert_eq!(creates, 3);
    assert!(events.contains(&AuditEventType::EquipmentStatusChange));
    assert!(events.contains(&AuditEventType::ContainerStatusChange));

    let reseeded = alice.seed_sample_data().await.unwrap();
    assert_eq!(reseeded.cleared.batches, 2);
    assert_eq!(reseeded.cleared.equipment, 3);
    assert_eq!(reseeded.cleared.containers, 2);

    let report = alice.clear_owned_data().await.unwrap();
    assert_eq!((report.batches, report.equipment, report.containers), (2, 3, 2));
    let remaining = brewery.batches().list(root.caller()).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].created_by.as_str(), "bob");
    assert!(brewery.containers().list(alice.caller()).await.unwrap().is_empty());
}
