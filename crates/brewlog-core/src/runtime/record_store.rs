// crates/brewlog-core/src/runtime/record_store.rs
// ============================================================================
// Module: Generic Record Store
// Description: Schema-validated, owner-scoped CRUD over one collection.
// Purpose: Hide tree path conventions and audit stamping from collections.
// Dependencies: serde_json, thiserror, tracing, crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! A [`RecordStore`] serves one collection described by a
//! [`CollectionDescriptor`]. Records live at `{collection}/{id}` and carry
//! their own `id`. Audit fields are stamped in the collection's declared
//! [`RecordShape`].
//!
//! Ownership is enforced as absence: a record the caller may not see reads as
//! missing and fails updates and deletes with [`RecordStoreError::NotFound`],
//! exactly like a record that does not exist. Corrupt stored records are
//! skipped with a warning instead of failing reads. Updates are
//! read-merge-write without a version check; concurrent updates of the same
//! keys resolve last-write-wins.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::sync::Arc;

use serde_json::Map;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;
use tracing::warn;

use crate::core::Clock;
use crate::core::CollectionDescriptor;
use crate::core::IdGenerator;
use crate::core::Record;
use crate::core::RecordId;
use crate::core::RecordShape;
use crate::core::TreePath;
use crate::core::ValidationError;
use crate::core::ValidationIssue;
use crate::core::shape::AUDIT_FIELDS;
use crate::core::shape::CREATED_AT_FIELD;
use crate::core::shape::CREATED_BY_FIELD;
use crate::core::shape::ID_FIELD;
use crate::core::shape::METADATA_FIELD;
use crate::core::shape::UPDATED_AT_FIELD;
use crate::core::shape::metadata_not_object;
use crate::core::tree::normalize_map;
use crate::interfaces::SharedTreeStore;
use crate::interfaces::StoreError;
use crate::interfaces::TreeStore;
use crate::runtime::caller::Caller;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Record store errors.
///
/// # Invariants
/// - `NotFound` covers both missing records and records hidden by ownership.
#[derive(Debug, Error)]
pub enum RecordStoreError {
    /// Data failed the collection schema; nothing was written.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// No visible record exists at the path.
    #[error("record not found: {path}")]
    NotFound {
        /// Record path.
        path: String,
    },
    /// A record already exists at the path.
    #[error("record already exists: {path}")]
    Conflict {
        /// Record path.
        path: String,
    },
    /// The tree store failed; propagated unchanged.
    #[error(transparent)]
    Transport(#[from] StoreError),
}

// ============================================================================
// SECTION: Record Store
// ============================================================================

/// Schema-validated, owner-scoped store for one collection.
#[derive(Clone)]
pub struct RecordStore {
    /// Collection registration.
    descriptor: CollectionDescriptor,
    /// Backing tree store.
    tree: SharedTreeStore,
    /// Audit time source.
    clock: Arc<dyn Clock>,
    /// Id source for new records.
    ids: Arc<dyn IdGenerator>,
}

impl std::fmt::Debug for RecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordStore")
            .field("collection", &self.descriptor.path())
            .field("shape", &self.descriptor.shape())
            .finish_non_exhaustive()
    }
}

impl RecordStore {
    /// Creates a record store for `descriptor`.
    #[must_use]
    pub fn new(
        descriptor: CollectionDescriptor,
        tree: SharedTreeStore,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        Self {
            descriptor,
            tree,
            clock,
            ids,
        }
    }

    /// Returns the collection descriptor.
    #[must_use]
    pub const fn descriptor(&self) -> &CollectionDescriptor {
        &self.descriptor
    }

    /// Returns a store for the same schema and shape at another path.
    #[must_use]
    pub fn at(&self, path: TreePath) -> Self {
        Self {
            descriptor: self.descriptor.at(path),
            tree: self.tree.clone(),
            clock: Arc::clone(&self.clock),
            ids: Arc::clone(&self.ids),
        }
    }

    /// Returns the path of record `id`.
    #[must_use]
    pub fn record_path(&self, id: &RecordId) -> TreePath {
        self.descriptor.path().record(id)
    }

    /// Creates a record under a freshly generated id.
    ///
    /// # Errors
    ///
    /// Returns [`RecordStoreError::Validation`] when the stamped record fails
    /// the schema and [`RecordStoreError::Transport`] when the write fails.
    pub async fn create(&self, data: Record, caller: &Caller) -> Result<Record, RecordStoreError> {
        let now = self.clock.now();
        let id = self.ids.next_id(now);
        self.insert(&id, data, caller).await
    }

    /// Creates a record under a caller-supplied id.
    ///
    /// # Errors
    ///
    /// Returns [`RecordStoreError::Conflict`] when a record already exists at
    /// `id`, plus the errors of [`RecordStore::create`].
    pub async fn create_with_id(
        &self,
        id: &RecordId,
        data: Record,
        caller: &Caller,
    ) -> Result<Record, RecordStoreError> {
        let path = self.record_path(id);
        if self.tree.exists(&path).await? {
            return Err(RecordStoreError::Conflict {
                path: path.to_string(),
            });
        }
        self.insert(id, data, caller).await
    }

    /// Stamps, validates, strips and writes a new record.
    async fn insert(
        &self,
        id: &RecordId,
        mut data: Record,
        caller: &Caller,
    ) -> Result<Record, RecordStoreError> {
        let now = self.clock.now();
        data.insert(ID_FIELD.to_string(), Value::String(id.as_str().to_string()));
        self.descriptor
            .shape()
            .stamp_create(&mut data, caller.id(), now)
            .map_err(|issue| ValidationError::single(self.descriptor.name(), issue))?;
        let validated = self.descriptor.validate(&Value::Object(data))?;
        let stored = normalize_map(validated);
        self.tree.write(&self.record_path(id), Value::Object(stored.clone())).await?;
        debug!(
            collection = %self.descriptor.path(),
            id = %id,
            owner = %caller.id(),
            "record created"
        );
        Ok(stored)
    }

    /// Returns record `id` when it exists, is valid and is visible to `caller`.
    ///
    /// # Errors
    ///
    /// Returns [`RecordStoreError::Transport`] when the read fails.
    pub async fn get(
        &self,
        id: &RecordId,
        caller: &Caller,
    ) -> Result<Option<Record>, RecordStoreError> {
        let Some(value) = self.tree.read(&self.record_path(id)).await? else {
            return Ok(None);
        };
        let Some(record) = self.accept(id.as_str(), &value) else {
            return Ok(None);
        };
        if !caller.can_access(self.descriptor.shape(), &record) {
            debug!(
                collection = %self.descriptor.path(),
                id = %id,
                caller = %caller.id(),
                "record hidden from non-owner"
            );
            return Ok(None);
        }
        Ok(Some(record))
    }

    /// Returns every valid record visible to `caller`, in store order.
    ///
    /// # Errors
    ///
    /// Returns [`RecordStoreError::Transport`] when the read fails.
    pub async fn get_all(&self, caller: &Caller) -> Result<Vec<Record>, RecordStoreError> {
        let Some(value) = self.tree.read(self.descriptor.path()).await? else {
            return Ok(Vec::new());
        };
        let Value::Object(children) = value else {
            warn!(collection = %self.descriptor.path(), "collection node is not an object");
            return Ok(Vec::new());
        };
        let shape = self.descriptor.shape();
        Ok(children
            .iter()
            .filter_map(|(key, child)| self.accept(key, child))
            .filter(|record| caller.can_access(shape, record))
            .collect())
    }

    /// Returns the visible records matching `predicate`.
    ///
    /// # Errors
    ///
    /// Returns [`RecordStoreError::Transport`] when the read fails.
    pub async fn find<F>(
        &self,
        caller: &Caller,
        predicate: F,
    ) -> Result<Vec<Record>, RecordStoreError>
    where
        F: Fn(&Record) -> bool + Send,
    {
        let mut records = self.get_all(caller).await?;
        records.retain(|record| predicate(record));
        Ok(records)
    }

    /// Merges `partial` into record `id` and persists only the touched keys.
    ///
    /// Keys set to `null` in `partial` (or in `partial.metadata` for nested
    /// collections) are removed; absent keys are untouched. `id` and the owner
    /// are pinned, `updatedAt` strictly increases and `createdAt` changes only
    /// when `partial` supplies a non-null value.
    ///
    /// # Errors
    ///
    /// Returns [`RecordStoreError::NotFound`] when the record is missing or
    /// hidden, [`RecordStoreError::Validation`] when the merged record fails the
    /// schema (nothing is written), and [`RecordStoreError::Transport`] when
    /// the store fails.
    pub async fn update(
        &self,
        id: &RecordId,
        partial: Record,
        caller: &Caller,
    ) -> Result<Record, RecordStoreError> {
        let path = self.record_path(id);
        let Some(current) = self.get(id, caller).await? else {
            return Err(RecordStoreError::NotFound {
                path: path.to_string(),
            });
        };
        let shape = self.descriptor.shape();
        let invalid =
            |issue: ValidationIssue| ValidationError::single(self.descriptor.name(), issue);

        let mut merged = current.clone();
        let mut touched = BTreeSet::new();
        let mut metadata_touched = BTreeSet::new();
        let mut created_at = None;
        for (key, value) in partial {
            if key == ID_FIELD {
                continue;
            }
            match shape {
                RecordShape::NestedMetadata if key == METADATA_FIELD => {
                    let Value::Object(fields) = value else {
                        return Err(invalid(metadata_not_object()).into());
                    };
                    let audit = shape.audit_mut(&mut merged).map_err(invalid)?;
                    for (field, field_value) in fields {
                        if field == CREATED_AT_FIELD && !field_value.is_null() {
                            created_at = Some(field_value.clone());
                        }
                        metadata_touched.insert(field.clone());
                        audit.insert(field, field_value);
                    }
                    continue;
                }
                RecordShape::NestedMetadata if AUDIT_FIELDS.contains(&key.as_str()) => continue,
                RecordShape::Flat if key == CREATED_AT_FIELD => {
                    if !value.is_null() {
                        created_at = Some(value.clone());
                    }
                    merged.insert(key.clone(), value);
                }
                _ => {
                    merged.insert(key.clone(), value);
                }
            }
            touched.insert(key);
        }

        let now = self.clock.now();
        let updated_at = shape
            .updated_at(&current)
            .map_or(now, |previous| now.max(previous.plus_millis(1)));
        let owner = shape.owner(&current).map(ToString::to_string);
        let audit = shape.audit_mut(&mut merged).map_err(invalid)?;
        if let Some(owner) = owner {
            audit.insert(CREATED_BY_FIELD.to_string(), Value::String(owner));
        }
        let created_at = created_at
            .or_else(|| shape.created_at(&current).map(|ts| Value::from(ts.as_unix_millis())));
        match created_at {
            Some(value) => audit.insert(CREATED_AT_FIELD.to_string(), value),
            None => audit.remove(CREATED_AT_FIELD),
        };
        audit.insert(UPDATED_AT_FIELD.to_string(), Value::from(updated_at.as_unix_millis()));

        let validated = self.descriptor.validate(&Value::Object(merged))?;
        let stored = normalize_map(validated);
        let audit_fields = AUDIT_FIELDS.iter().map(ToString::to_string);
        match shape {
            RecordShape::Flat => {
                touched.extend(audit_fields);
                self.tree.update(&path, touched_patch(&stored, touched)).await?;
            }
            RecordShape::NestedMetadata => {
                if !touched.is_empty() {
                    self.tree.update(&path, touched_patch(&stored, touched)).await?;
                }
                metadata_touched.extend(audit_fields);
                let metadata = stored
                    .get(METADATA_FIELD)
                    .and_then(Value::as_object)
                    .cloned()
                    .unwrap_or_default();
                let metadata_path = path
                    .child(METADATA_FIELD)
                    .map_err(|err| StoreError::Invalid(err.to_string()))?;
                self.tree.update(&metadata_path, touched_patch(&metadata, metadata_touched)).await?;
            }
        }
        debug!(
            collection = %self.descriptor.path(),
            id = %id,
            caller = %caller.id(),
            "record updated"
        );
        Ok(stored)
    }

    /// Permanently removes record `id`.
    ///
    /// # Errors
    ///
    /// Returns [`RecordStoreError::NotFound`] when the record is missing or
    /// hidden and [`RecordStoreError::Transport`] when the store fails.
    pub async fn delete(&self, id: &RecordId, caller: &Caller) -> Result<(), RecordStoreError> {
        let path = self.record_path(id);
        if self.get(id, caller).await?.is_none() {
            return Err(RecordStoreError::NotFound {
                path: path.to_string(),
            });
        }
        self.tree.remove(&path).await?;
        debug!(
            collection = %self.descriptor.path(),
            id = %id,
            caller = %caller.id(),
            "record deleted"
        );
        Ok(())
    }

    /// Removes the whole collection without ownership checks.
    ///
    /// # Errors
    ///
    /// Returns [`RecordStoreError::Transport`] when the store fails.
    pub async fn clear_all(&self) -> Result<(), RecordStoreError> {
        warn!(collection = %self.descriptor.path(), "clearing entire collection");
        self.tree.remove(self.descriptor.path()).await?;
        Ok(())
    }

    /// Validates `data` against the collection schema without side effects.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] when `data` is not an object or fails the
    /// schema.
    pub fn validate(&self, data: &Value) -> Result<Record, ValidationError> {
        self.descriptor.validate(data)
    }

    /// Validates a stored value, logging and discarding corrupt records.
    fn accept(&self, key: &str, value: &Value) -> Option<Record> {
        match self.descriptor.validate(value) {
            Ok(record) => Some(record),
            Err(err) => {
                warn!(
                    collection = %self.descriptor.path(),
                    id = key,
                    error = %err,
                    "skipping invalid stored record"
                );
                None
            }
        }
    }
}

/// Builds a patch of `keys` taken from `source`, with `null` for missing keys.
fn touched_patch(source: &Record, keys: BTreeSet<String>) -> Map<String, Value> {
    keys.into_iter()
        .map(|key| {
            let value = source.get(&key).cloned().unwrap_or(Value::Null);
            (key, value)
        })
        .collect()
}
