// crates/brewlog-core/src/runtime/memory.rs
// ============================================================================
// Module: In-Memory Tree Store
// Description: Tree store holding a single JSON tree behind a mutex.
// Purpose: Provide a deterministic driver for tests and local runs.
// Dependencies: async-trait, serde_json, crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! [`InMemoryTreeStore`] keeps the whole hierarchy as one JSON object. Every
//! operation takes the mutex for its full duration, so each call is atomic
//! with respect to other calls on the same store. Clones share the tree.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use async_trait::async_trait;
use serde_json::Map;
use serde_json::Value;

use crate::core::TreePath;
use crate::core::tree;
use crate::interfaces::StoreError;
use crate::interfaces::TreeStore;
use crate::interfaces::check_patch;
use crate::interfaces::check_write;

// ============================================================================
// SECTION: In-Memory Store
// ============================================================================

/// In-memory hierarchical store for tests and local runs.
#[derive(Debug, Default, Clone)]
pub struct InMemoryTreeStore {
    /// Root object protected by a mutex.
    root: Arc<Mutex<Map<String, Value>>>,
}

impl InMemoryTreeStore {
    /// Creates an empty in-memory tree store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: Arc::new(Mutex::new(Map::new())),
        }
    }

    /// Returns a copy of the whole tree.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Store`] when the mutex is poisoned.
    pub fn snapshot(&self) -> Result<Value, StoreError> {
        Ok(Value::Object(self.lock()?.clone()))
    }

    /// Locks the tree.
    fn lock(&self) -> Result<MutexGuard<'_, Map<String, Value>>, StoreError> {
        self.root.lock().map_err(|_| StoreError::Store("tree store mutex poisoned".to_string()))
    }
}

#[async_trait]
impl TreeStore for InMemoryTreeStore {
    async fn read(&self, path: &TreePath) -> Result<Option<Value>, StoreError> {
        let guard = self.lock()?;
        if path.is_root() {
            return Ok((!guard.is_empty()).then(|| Value::Object(guard.clone())));
        }
        Ok(tree::value_at(&guard, path.segments()).cloned())
    }

    async fn write(&self, path: &TreePath, value: Value) -> Result<(), StoreError> {
        check_write(path, &value)?;
        let mut guard = self.lock()?;
        tree::set_at(&mut guard, path.segments(), tree::normalize(value));
        drop(guard);
        Ok(())
    }

    async fn update(&self, path: &TreePath, patch: Map<String, Value>) -> Result<(), StoreError> {
        check_patch(path, &patch)?;
        let mut guard = self.lock()?;
        tree::patch_at(&mut guard, path.segments(), patch);
        drop(guard);
        Ok(())
    }

    async fn remove(&self, path: &TreePath) -> Result<(), StoreError> {
        check_write(path, &Value::Null)?;
        let mut guard = self.lock()?;
        tree::set_at(&mut guard, path.segments(), None);
        drop(guard);
        Ok(())
    }
}
