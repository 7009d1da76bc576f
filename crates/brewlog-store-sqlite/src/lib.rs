// crates/brewlog-store-sqlite/src/lib.rs
// ============================================================================
// Module: SQLite Tree Store
// Description: Durable TreeStore backend using SQLite.
// Purpose: Persist the record hierarchy in a local database file.
// Dependencies: brewlog-core, rusqlite, tokio
// ============================================================================

//! ## Overview
//! This crate provides a SQLite-backed [`brewlog_core::TreeStore`]. Values are
//! kept as JSON documents keyed by tree path, with the same pruning rules as
//! the in-memory driver. Storage contents are treated as untrusted: rows that
//! fail to parse surface as corruption errors.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use store::SCHEMA_VERSION;
pub use store::SqliteStoreConfig;
pub use store::SqliteStoreError;
pub use store::SqliteStoreMode;
pub use store::SqliteSyncMode;
pub use store::SqliteTreeStore;
