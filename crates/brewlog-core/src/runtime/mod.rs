// crates/brewlog-core/src/runtime/mod.rs
// ============================================================================
// Module: Brewlog Runtime
// Description: Record stores, caller identity, and the in-memory tree store.
// Purpose: Execute owner-scoped, schema-validated CRUD against a tree store.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! Runtime modules implement the generic record store and the explicit
//! context that binds a driver, a clock and an id generator. Record-specific
//! collections build on [`RecordStore`] or its typed wrapper
//! [`TypedCollection`] rather than talking to drivers directly.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod caller;
pub mod context;
pub mod memory;
pub mod record_store;
pub mod typed;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use caller::Access;
pub use caller::Caller;
pub use context::StoreContext;
pub use memory::InMemoryTreeStore;
pub use record_store::RecordStore;
pub use record_store::RecordStoreError;
pub use typed::TypedCollection;
