// crates/brewlog-core/src/core/mod.rs
// ============================================================================
// Module: Brewlog Core Types
// Description: Identifiers, time, paths, shapes, schemas, and id generation.
// Purpose: Provide the value types shared by drivers and record stores.
// Dependencies: serde, serde_json, jsonschema, rand
// ============================================================================

//! ## Overview
//! Core types are plain data with no I/O. Drivers and record stores share them
//! so that path rules and audit field layout are defined in one place.

pub mod identifiers;
pub mod ids;
pub mod path;
pub mod schema;
pub mod shape;
pub mod time;
pub mod tree;

pub use identifiers::IdentifierError;
pub use identifiers::OwnerId;
pub use identifiers::RecordId;
pub use ids::IdGenerator;
pub use ids::PushIdGenerator;
pub use path::TreePath;
pub use schema::CollectionDescriptor;
pub use schema::RecordSchema;
pub use schema::SchemaError;
pub use schema::ValidationError;
pub use schema::ValidationIssue;
pub use shape::RecordShape;
pub use time::Clock;
pub use time::ManualClock;
pub use time::SystemClock;
pub use time::Timestamp;

/// Persisted record: a JSON object stored at `{collection}/{id}`.
pub type Record = serde_json::Map<String, serde_json::Value>;
