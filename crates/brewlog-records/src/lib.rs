// crates/brewlog-records/src/lib.rs
// ============================================================================
// Module: Brewlog Records Library
// Description: Kombucha brewing collections built on the generic record store.
// Purpose: Expose repositories, batch codes, analytics, and the brewery service.
// Dependencies: brewlog-core, serde, serde_json, thiserror, time, tracing
// ============================================================================

//! ## Overview
//! Each collection pins its schema and shape once and wraps a
//! [`brewlog_core::TypedCollection`] in a repository with the domain
//! operations. Per-batch logs (stages, measurements, quality checks) are
//! gated by the visibility of their batch. [`Brewery`] bundles every
//! repository over one store context and hands out caller-bound
//! [`BrewSession`]s that audit the common flows.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod analytics;
pub mod audit;
pub mod batch;
pub mod batch_code;
pub mod brewery;
pub mod container;
pub mod equipment;
pub mod error;
pub mod log;
pub mod quality;
pub mod schema;
pub mod user;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use analytics::Analytics;
pub use analytics::TimeRange;
pub use audit::AuditDetails;
pub use audit::AuditEvent;
pub use audit::AuditEventType;
pub use audit::AuditRepository;
pub use batch::Batch;
pub use batch::BatchCode;
pub use batch::BatchDraft;
pub use batch::BatchPatch;
pub use batch::BatchRepository;
pub use batch::BatchStage;
pub use batch::BatchType;
pub use batch::Checklist;
pub use batch::MeasurementKind;
pub use batch::Task;
pub use batch::TaskPatch;
pub use batch_code::BatchCodeError;
pub use batch_code::BatchCodeKind;
pub use batch_code::create_batch_code;
pub use batch_code::generate_batch_code;
pub use batch_code::is_valid_batch_code;
pub use batch_code::parse_batch_code;
pub use brewery::BrewSession;
pub use brewery::Brewery;
pub use brewery::ClearReport;
pub use brewery::SeedReport;
pub use container::Container;
pub use container::ContainerRepository;
pub use container::ContainerState;
pub use container::ContainerType;
pub use equipment::Equipment;
pub use equipment::EquipmentRepository;
pub use equipment::EquipmentState;
pub use equipment::EquipmentType;
pub use error::RecordsError;
pub use log::LogCollection;
pub use quality::CheckStatus;
pub use quality::CheckType;
pub use quality::QualityCheck;
pub use quality::QualityCheckDraft;
pub use quality::QualityRepository;
pub use user::UserProfile;
pub use user::UserRepository;
pub use user::UserRole;
