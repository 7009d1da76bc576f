// crates/brewlog-core/src/interfaces/mod.rs
// ============================================================================
// Module: Brewlog Interfaces
// Description: Backend-agnostic interface for the hierarchical store.
// Purpose: Define the driver contract used by record stores.
// Dependencies: async-trait, serde_json, thiserror, crate::core
// ============================================================================

//! ## Overview
//! Record stores reach persistence only through [`TreeStore`]: path-addressed
//! read, full write, per-child update, remove and an existence probe.
//! Implementations follow the remote store's rules: nulls and empty objects
//! are never persisted, removing the last child of a node removes the node,
//! and reading a collection yields an object keyed by child id. Failures are
//! reported as [`StoreError`] and are never retried by callers.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Map;
use serde_json::Value;
use thiserror::Error;

use crate::core::TreePath;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Tree store errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Store I/O error.
    #[error("tree store io error: {0}")]
    Io(String),
    /// Store data is corrupted or fails integrity checks.
    #[error("tree store corruption: {0}")]
    Corrupt(String),
    /// Store data version is incompatible.
    #[error("tree store version mismatch: {0}")]
    VersionMismatch(String),
    /// Request or stored data is invalid.
    #[error("tree store invalid data: {0}")]
    Invalid(String),
    /// Store reported an error.
    #[error("tree store error: {0}")]
    Store(String),
}

// ============================================================================
// SECTION: Tree Store
// ============================================================================

/// Path-addressed hierarchical key-value store.
#[async_trait]
pub trait TreeStore: Send + Sync {
    /// Reads the value at `path`, or `None` when nothing is stored.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails.
    async fn read(&self, path: &TreePath) -> Result<Option<Value>, StoreError>;

    /// Replaces the value at `path`. `null` and empty objects remove it.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when `path` is the root, a key is invalid, or
    /// the write fails.
    async fn write(&self, path: &TreePath, value: Value) -> Result<(), StoreError>;

    /// Writes each child of `patch` below `path`; `null` children are removed.
    ///
    /// Children of `path` not named in `patch` are left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when `path` is the root, a key is invalid, or
    /// the write fails.
    async fn update(&self, path: &TreePath, patch: Map<String, Value>) -> Result<(), StoreError>;

    /// Removes the value at `path` and everything below it.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when `path` is the root or the removal fails.
    async fn remove(&self, path: &TreePath) -> Result<(), StoreError>;

    /// Returns true when a value is stored at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the probe fails.
    async fn exists(&self, path: &TreePath) -> Result<bool, StoreError> {
        Ok(self.read(path).await?.is_some())
    }
}

/// Rejects root-level mutations and invalid keys before a driver writes.
///
/// # Errors
///
/// Returns [`StoreError::Invalid`] when `path` is the root or `value` holds a
/// key that is not a valid path segment.
pub fn check_write(path: &TreePath, value: &Value) -> Result<(), StoreError> {
    if path.is_root() {
        return Err(StoreError::Invalid("writes at the tree root are not allowed".to_string()));
    }
    crate::core::tree::validate_keys(value).map_err(|err| StoreError::Invalid(err.to_string()))
}

/// Applies [`check_write`] to a per-child patch.
///
/// # Errors
///
/// Returns [`StoreError::Invalid`] when `path` is the root or the patch holds
/// an invalid key.
pub fn check_patch(path: &TreePath, patch: &Map<String, Value>) -> Result<(), StoreError> {
    check_write(path, &Value::Null)?;
    for (key, value) in patch {
        crate::core::identifiers::validate_segment("patch key", key)
            .map_err(|err| StoreError::Invalid(err.to_string()))?;
        check_write(path, value)?;
    }
    Ok(())
}

// ============================================================================
// SECTION: Shared Store Wrapper
// ============================================================================

/// Shared tree store backed by an `Arc` trait object.
#[derive(Clone)]
pub struct SharedTreeStore {
    /// Inner store implementation.
    inner: Arc<dyn TreeStore>,
}

impl std::fmt::Debug for SharedTreeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedTreeStore").finish_non_exhaustive()
    }
}

impl SharedTreeStore {
    /// Wraps a tree store in a shared, clonable wrapper.
    #[must_use]
    pub fn from_store(store: impl TreeStore + 'static) -> Self {
        Self {
            inner: Arc::new(store),
        }
    }

    /// Wraps an existing shared store.
    #[must_use]
    pub const fn new(store: Arc<dyn TreeStore>) -> Self {
        Self {
            inner: store,
        }
    }
}

#[async_trait]
impl TreeStore for SharedTreeStore {
    async fn read(&self, path: &TreePath) -> Result<Option<Value>, StoreError> {
        self.inner.read(path).await
    }

    async fn write(&self, path: &TreePath, value: Value) -> Result<(), StoreError> {
        self.inner.write(path, value).await
    }

    async fn update(&self, path: &TreePath, patch: Map<String, Value>) -> Result<(), StoreError> {
        self.inner.update(path, patch).await
    }

    async fn remove(&self, path: &TreePath) -> Result<(), StoreError> {
        self.inner.remove(path).await
    }

    async fn exists(&self, path: &TreePath) -> Result<bool, StoreError> {
        self.inner.exists(path).await
    }
}
