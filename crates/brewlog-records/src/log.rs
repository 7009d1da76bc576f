// crates/brewlog-records/src/log.rs
// ============================================================================
// Module: Log Collections
// Description: Per-parent, append-mostly entry collections.
// Purpose: Share parent visibility checks across stages, measurements, and
//          quality checks.
// Dependencies: brewlog-core, serde
// ============================================================================

//! ## Overview
//! A [`LogCollection`] stores entries at `{base}/{parentId}/{entryId}`.
//! Access follows the parent record: a caller that cannot see the parent gets
//! [`RecordStoreError::NotFound`] for every log operation, and a caller that
//! can see it reads every entry of that parent, whoever wrote them. Entries
//! are stamped with their writer and validated on write and on read.

use brewlog_core::Caller;
use brewlog_core::RecordId;
use brewlog_core::RecordStore;
use brewlog_core::RecordStoreError;
use brewlog_core::TreePath;
use brewlog_core::TypedCollection;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::RecordsError;

/// Entries grouped under a parent record.
pub struct LogCollection<T> {
    /// Collection holding the parent records.
    parents: RecordStore,
    /// Entry collection rooted at the log base path.
    entries: TypedCollection<T>,
}

impl<T> Clone for LogCollection<T> {
    fn clone(&self) -> Self {
        Self {
            parents: self.parents.clone(),
            entries: self.entries.clone(),
        }
    }
}

impl<T> std::fmt::Debug for LogCollection<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogCollection")
            .field("parents", &self.parents)
            .field("entries", &self.entries)
            .finish()
    }
}

impl<T> LogCollection<T>
where
    T: DeserializeOwned,
{
    /// Creates a log whose entries belong to records of `parents`.
    #[must_use]
    pub const fn new(parents: RecordStore, entries: TypedCollection<T>) -> Self {
        Self {
            parents,
            entries,
        }
    }

    /// Returns the base path of the log.
    #[must_use]
    pub fn base(&self) -> &TreePath {
        self.entries.store().descriptor().path()
    }

    /// Appends an entry under `parent`.
    ///
    /// # Errors
    ///
    /// Returns [`RecordsError`] when the parent is not visible or the entry
    /// fails validation or the write.
    pub async fn append<D>(
        &self,
        parent: &RecordId,
        draft: &D,
        caller: &Caller,
    ) -> Result<T, RecordsError>
    where
        D: Serialize + Sync,
    {
        let (entries, _) = self.scope(parent, caller).await?;
        Ok(entries.create(draft, caller).await?)
    }

    /// Returns every valid entry under `parent`, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`RecordsError`] when the parent is not visible or the read
    /// fails.
    pub async fn list(&self, parent: &RecordId, caller: &Caller) -> Result<Vec<T>, RecordsError> {
        let (entries, reader) = self.scope(parent, caller).await?;
        Ok(entries.get_all(&reader).await?)
    }

    /// Returns the entries under `parent` matching `predicate`.
    ///
    /// # Errors
    ///
    /// Returns [`RecordsError`] as [`LogCollection::list`] does.
    pub async fn find<F>(
        &self,
        parent: &RecordId,
        caller: &Caller,
        predicate: F,
    ) -> Result<Vec<T>, RecordsError>
    where
        F: Fn(&T) -> bool + Send,
    {
        let (entries, reader) = self.scope(parent, caller).await?;
        Ok(entries.find(&reader, predicate).await?)
    }

    /// Applies `patch` to entry `id` under `parent`.
    ///
    /// # Errors
    ///
    /// Returns [`RecordsError`] when the parent or the entry is missing, or
    /// the merged entry fails validation.
    pub async fn update<P>(
        &self,
        parent: &RecordId,
        id: &RecordId,
        patch: &P,
        caller: &Caller,
    ) -> Result<T, RecordsError>
    where
        P: Serialize + Sync,
    {
        let (entries, writer) = self.scope(parent, caller).await?;
        Ok(entries.update(id, patch, &writer).await?)
    }

    /// Resolves the entry collection of `parent` and the caller used on it.
    async fn scope(
        &self,
        parent: &RecordId,
        caller: &Caller,
    ) -> Result<(TypedCollection<T>, Caller), RecordsError> {
        if self.parents.get(parent, caller).await?.is_none() {
            return Err(RecordStoreError::NotFound {
                path: self.parents.record_path(parent).to_string(),
            }
            .into());
        }
        let entries = self.entries.at(self.base().record(parent));
        Ok((entries, Caller::privileged(caller.id().clone())))
    }
}
