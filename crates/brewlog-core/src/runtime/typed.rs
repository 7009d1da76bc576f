// crates/brewlog-core/src/runtime/typed.rs
// ============================================================================
// Module: Typed Collections
// Description: Serde conversion layer over the generic record store.
// Purpose: Let record-specific collections work with Rust types.
// Dependencies: serde, serde_json, tracing, crate::{core, runtime}
// ============================================================================

//! ## Overview
//! [`TypedCollection`] converts drafts and patches to JSON objects before they
//! reach the [`RecordStore`] and converts stored records back into `T`. The
//! schema stays authoritative: a stored record that passes the schema but does
//! not deserialize into `T` is treated like any other corrupt record.

use std::marker::PhantomData;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

use crate::core::Record;
use crate::core::RecordId;
use crate::core::TreePath;
use crate::core::ValidationError;
use crate::core::ValidationIssue;
use crate::core::shape::ID_FIELD;
use crate::runtime::caller::Caller;
use crate::runtime::record_store::RecordStore;
use crate::runtime::record_store::RecordStoreError;

/// Record store whose records convert to and from `T`.
pub struct TypedCollection<T> {
    /// Untyped store.
    store: RecordStore,
    /// Record type marker.
    _record: PhantomData<fn() -> T>,
}

impl<T> Clone for TypedCollection<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            _record: PhantomData,
        }
    }
}

impl<T> std::fmt::Debug for TypedCollection<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypedCollection").field("store", &self.store).finish()
    }
}

impl<T> TypedCollection<T>
where
    T: DeserializeOwned,
{
    /// Wraps an untyped record store.
    #[must_use]
    pub const fn new(store: RecordStore) -> Self {
        Self {
            store,
            _record: PhantomData,
        }
    }

    /// Returns the untyped store.
    #[must_use]
    pub const fn store(&self) -> &RecordStore {
        &self.store
    }

    /// Returns a collection of the same type rooted at another path.
    #[must_use]
    pub fn at(&self, path: TreePath) -> Self {
        Self::new(self.store.at(path))
    }

    /// Creates a record from `draft` under a generated id.
    ///
    /// # Errors
    ///
    /// Returns [`RecordStoreError`] as [`RecordStore::create`] does, or a
    /// validation error when `draft` does not serialize to an object.
    pub async fn create<D>(&self, draft: &D, caller: &Caller) -> Result<T, RecordStoreError>
    where
        D: Serialize + Sync,
    {
        let data = self.to_record(draft)?;
        let record = self.store.create(data, caller).await?;
        Ok(self.from_stored(record)?)
    }

    /// Creates a record from `draft` under `id`.
    ///
    /// # Errors
    ///
    /// Returns [`RecordStoreError`] as [`RecordStore::create_with_id`] does.
    pub async fn create_with_id<D>(
        &self,
        id: &RecordId,
        draft: &D,
        caller: &Caller,
    ) -> Result<T, RecordStoreError>
    where
        D: Serialize + Sync,
    {
        let data = self.to_record(draft)?;
        let record = self.store.create_with_id(id, data, caller).await?;
        Ok(self.from_stored(record)?)
    }

    /// Returns record `id` when it is visible and well-formed.
    ///
    /// # Errors
    ///
    /// Returns [`RecordStoreError::Transport`] when the read fails.
    pub async fn get(
        &self,
        id: &RecordId,
        caller: &Caller,
    ) -> Result<Option<T>, RecordStoreError> {
        Ok(self.store.get(id, caller).await?.and_then(|record| self.decode(record)))
    }

    /// Returns every visible, well-formed record.
    ///
    /// # Errors
    ///
    /// Returns [`RecordStoreError::Transport`] when the read fails.
    pub async fn get_all(&self, caller: &Caller) -> Result<Vec<T>, RecordStoreError> {
        let records = self.store.get_all(caller).await?;
        Ok(records.into_iter().filter_map(|record| self.decode(record)).collect())
    }

    /// Returns the visible records matching `predicate`.
    ///
    /// # Errors
    ///
    /// Returns [`RecordStoreError::Transport`] when the read fails.
    pub async fn find<F>(&self, caller: &Caller, predicate: F) -> Result<Vec<T>, RecordStoreError>
    where
        F: Fn(&T) -> bool + Send,
    {
        let mut records = self.get_all(caller).await?;
        records.retain(|record| predicate(record));
        Ok(records)
    }

    /// Applies `patch` to record `id` and returns the stored result.
    ///
    /// Patch fields serialized as `null` clear the stored field.
    ///
    /// # Errors
    ///
    /// Returns [`RecordStoreError`] as [`RecordStore::update`] does.
    pub async fn update<P>(
        &self,
        id: &RecordId,
        patch: &P,
        caller: &Caller,
    ) -> Result<T, RecordStoreError>
    where
        P: Serialize + Sync,
    {
        let partial = self.to_record(patch)?;
        let record = self.store.update(id, partial, caller).await?;
        Ok(self.from_stored(record)?)
    }

    /// Removes record `id`.
    ///
    /// # Errors
    ///
    /// Returns [`RecordStoreError`] as [`RecordStore::delete`] does.
    pub async fn delete(&self, id: &RecordId, caller: &Caller) -> Result<(), RecordStoreError> {
        self.store.delete(id, caller).await
    }

    /// Removes the whole collection.
    ///
    /// # Errors
    ///
    /// Returns [`RecordStoreError::Transport`] when the store fails.
    pub async fn clear_all(&self) -> Result<(), RecordStoreError> {
        self.store.clear_all().await
    }

    /// Validates `data` against the schema and converts it to `T`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] when `data` fails the schema or does not
    /// convert to `T`.
    pub fn validate<D: Serialize>(&self, data: &D) -> Result<T, ValidationError> {
        let value = serde_json::to_value(data).map_err(|err| self.issue(&err.to_string()))?;
        let record = self.store.validate(&value)?;
        self.from_stored(record)
    }

    /// Serializes a draft or patch into a JSON object.
    fn to_record<D: Serialize>(&self, data: &D) -> Result<Record, ValidationError> {
        match serde_json::to_value(data) {
            Ok(Value::Object(record)) => Ok(record),
            Ok(_) => Err(self.issue("record must be a JSON object")),
            Err(err) => Err(self.issue(&err.to_string())),
        }
    }

    /// Converts a just-written record into `T`.
    fn from_stored(&self, record: Record) -> Result<T, ValidationError> {
        serde_json::from_value(Value::Object(record)).map_err(|err| self.issue(&err.to_string()))
    }

    /// Converts a stored record into `T`, logging and discarding mismatches.
    fn decode(&self, record: Record) -> Option<T> {
        let id = record.get(ID_FIELD).and_then(Value::as_str).unwrap_or_default().to_string();
        match serde_json::from_value(Value::Object(record)) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(
                    collection = %self.store.descriptor().path(),
                    id = %id,
                    error = %err,
                    "skipping record that does not match its type"
                );
                None
            }
        }
    }

    /// Builds a root-level validation error for this collection.
    fn issue(&self, message: &str) -> ValidationError {
        ValidationError::single(
            self.store.descriptor().name(),
            ValidationIssue {
                path: String::new(),
                message: message.to_string(),
            },
        )
    }
}
