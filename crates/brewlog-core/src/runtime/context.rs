// crates/brewlog-core/src/runtime/context.rs
// ============================================================================
// Module: Store Context
// Description: Explicit binding of a tree store, clock, and id generator.
// Purpose: Build record stores without process-wide singletons.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! A [`StoreContext`] is created once per application (or per test) and hands
//! out record stores that share its driver, clock and id generator.
//! Independent contexts never share state, so tests can run side by side.

use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::core::Clock;
use crate::core::CollectionDescriptor;
use crate::core::IdGenerator;
use crate::core::PushIdGenerator;
use crate::core::SystemClock;
use crate::interfaces::SharedTreeStore;
use crate::runtime::memory::InMemoryTreeStore;
use crate::runtime::record_store::RecordStore;
use crate::runtime::typed::TypedCollection;

/// Driver, clock and id generator shared by a set of record stores.
#[derive(Clone)]
pub struct StoreContext {
    /// Backing tree store.
    tree: SharedTreeStore,
    /// Audit time source.
    clock: Arc<dyn Clock>,
    /// Id source for new records.
    ids: Arc<dyn IdGenerator>,
}

impl std::fmt::Debug for StoreContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreContext").field("tree", &self.tree).finish_non_exhaustive()
    }
}

impl StoreContext {
    /// Creates a context from explicit parts.
    #[must_use]
    pub fn new(tree: SharedTreeStore, clock: Arc<dyn Clock>, ids: Arc<dyn IdGenerator>) -> Self {
        Self {
            tree,
            clock,
            ids,
        }
    }

    /// Creates a context with the system clock and push ids.
    #[must_use]
    pub fn with_tree(tree: SharedTreeStore) -> Self {
        Self::new(tree, Arc::new(SystemClock), Arc::new(PushIdGenerator::new()))
    }

    /// Creates a context over a fresh in-memory tree store.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::with_tree(SharedTreeStore::from_store(InMemoryTreeStore::new()))
    }

    /// Returns the shared tree store.
    #[must_use]
    pub const fn tree(&self) -> &SharedTreeStore {
        &self.tree
    }

    /// Returns the context clock.
    #[must_use]
    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Builds a record store for `descriptor`.
    #[must_use]
    pub fn record_store(&self, descriptor: CollectionDescriptor) -> RecordStore {
        RecordStore::new(
            descriptor,
            self.tree.clone(),
            Arc::clone(&self.clock),
            Arc::clone(&self.ids),
        )
    }

    /// Builds a typed collection for `descriptor`.
    #[must_use]
    pub fn collection<T: DeserializeOwned>(
        &self,
        descriptor: CollectionDescriptor,
    ) -> TypedCollection<T> {
        TypedCollection::new(self.record_store(descriptor))
    }
}
