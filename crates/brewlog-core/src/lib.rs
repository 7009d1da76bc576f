// crates/brewlog-core/src/lib.rs
// ============================================================================
// Module: Brewlog Core Library
// Description: Public API surface for the Brewlog record store.
// Purpose: Expose core types, driver interfaces, and the generic record store.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Brewlog core provides a schema-validated, owner-scoped record store on top
//! of a hierarchical key-value tree. Drivers for the tree plug in through the
//! [`TreeStore`] interface; record-specific collections are built on
//! [`RecordStore`] and [`TypedCollection`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::*;

pub use interfaces::SharedTreeStore;
pub use interfaces::StoreError;
pub use interfaces::TreeStore;
pub use runtime::Access;
pub use runtime::Caller;
pub use runtime::InMemoryTreeStore;
pub use runtime::RecordStore;
pub use runtime::RecordStoreError;
pub use runtime::StoreContext;
pub use runtime::TypedCollection;
