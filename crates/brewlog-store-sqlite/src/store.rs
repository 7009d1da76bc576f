// crates/brewlog-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Tree Store
// Description: Durable TreeStore backed by SQLite.
// Purpose: Persist JSON subtrees keyed by tree path.
// Dependencies: brewlog-core, rusqlite, serde, serde_json, thiserror, tokio
// ============================================================================

//! ## Overview
//! [`SqliteTreeStore`] keeps the hierarchy in a single `tree_nodes` table.
//! Each row holds the JSON value of one node, addressed by its slash-joined
//! path. Writes keep rows disjoint: a write below an existing row edits that
//! row's document, and a write above existing rows replaces them. Reads of a
//! node without its own row assemble the value from descendant rows.
//!
//! Every operation runs inside one `SQLite` transaction on the blocking pool,
//! so each call is atomic with respect to other calls on the same store.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use async_trait::async_trait;
use brewlog_core::StoreError;
use brewlog_core::TreePath;
use brewlog_core::TreeStore;
use brewlog_core::interfaces::check_patch;
use brewlog_core::interfaces::check_write;
use brewlog_core::tree;
use rusqlite::Connection;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::params;
use serde::Deserialize;
use serde_json::Map;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;
use tracing::info;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Current `SQLite` schema version.
pub const SCHEMA_VERSION: i64 = 1;
/// Default busy timeout for `SQLite` connections in milliseconds.
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum length of the configured database path.
const MAX_TOTAL_PATH_LENGTH: usize = 4_096;
/// Maximum length of a single database path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` journal mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `journal_mode` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteStoreMode {
    /// WAL journal mode.
    #[default]
    Wal,
    /// Rollback journal deleted after each transaction.
    Delete,
}

impl SqliteStoreMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` sync mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `synchronous` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Sync on every commit.
    #[default]
    Full,
    /// Sync at checkpoints only.
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for the `SQLite` tree store.
///
/// # Invariants
/// - `path` must resolve to a file path (not a directory).
/// - `busy_timeout_ms` is interpreted as milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SqliteStoreConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl SqliteStoreConfig {
    /// Creates a configuration for `path` with default settings.
    #[must_use]
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` store errors.
///
/// # Invariants
/// - Error messages avoid embedding stored record payloads.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SqliteStoreError {
    /// Store I/O error.
    #[error("sqlite store io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite store db error: {0}")]
    Db(String),
    /// Stored row could not be decoded.
    #[error("sqlite store corruption: {0}")]
    Corrupt(String),
    /// Store schema version mismatch.
    #[error("sqlite store version mismatch: {0}")]
    VersionMismatch(String),
    /// Invalid configuration or request.
    #[error("sqlite store invalid data: {0}")]
    Invalid(String),
}

impl From<SqliteStoreError> for StoreError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::Io(message) => Self::Io(message),
            SqliteStoreError::Db(message) => Self::Store(message),
            SqliteStoreError::Corrupt(message) => Self::Corrupt(message),
            SqliteStoreError::VersionMismatch(message) => Self::VersionMismatch(message),
            SqliteStoreError::Invalid(message) => Self::Invalid(message),
        }
    }
}

impl From<rusqlite::Error> for SqliteStoreError {
    fn from(error: rusqlite::Error) -> Self {
        Self::Db(error.to_string())
    }
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// `SQLite`-backed hierarchical store.
///
/// # Invariants
/// - No stored row path is an ancestor of another stored row path.
/// - Stored values are normalized: no nulls and no empty objects.
/// - `SQLite` connection access is serialized through a mutex.
#[derive(Debug, Clone)]
pub struct SqliteTreeStore {
    /// Store configuration.
    config: SqliteStoreConfig,
    /// Shared connection guarded by a mutex.
    connection: Arc<Mutex<Connection>>,
}

impl SqliteTreeStore {
    /// Opens (or creates) an `SQLite`-backed tree store.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the path is unusable, the database
    /// cannot be opened, or its schema version is unknown.
    pub fn open(config: SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        validate_store_path(&config.path)?;
        ensure_parent_dir(&config.path)?;
        let mut connection = open_connection(&config)?;
        initialize_schema(&mut connection)?;
        info!(
            path = %config.path.display(),
            journal_mode = config.journal_mode.pragma_value(),
            sync_mode = config.sync_mode.pragma_value(),
            "opened sqlite tree store"
        );
        Ok(Self {
            config,
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Returns the store configuration.
    #[must_use]
    pub const fn config(&self) -> &SqliteStoreConfig {
        &self.config
    }

    /// Verifies the store can execute a simple SQL statement.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] if the mutex is poisoned or the query fails.
    pub fn readiness(&self) -> Result<(), SqliteStoreError> {
        let guard = self
            .connection
            .lock()
            .map_err(|_| SqliteStoreError::Io("sqlite connection mutex poisoned".to_string()))?;
        guard.query_row("SELECT 1", params![], |_| Ok(()))?;
        Ok(())
    }

    /// Returns the paths of every stored row in ascending order.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] if the mutex is poisoned or the query fails.
    pub fn stored_paths(&self) -> Result<Vec<String>, SqliteStoreError> {
        let guard = self
            .connection
            .lock()
            .map_err(|_| SqliteStoreError::Io("sqlite connection mutex poisoned".to_string()))?;
        let mut statement = guard.prepare("SELECT path FROM tree_nodes ORDER BY path")?;
        let rows = statement.query_map(params![], |row| row.get::<_, String>(0))?;
        let mut paths = Vec::new();
        for row in rows {
            paths.push(row?);
        }
        Ok(paths)
    }

    /// Runs `op` against the connection on the blocking pool.
    async fn run<T, F>(&self, op: F) -> Result<T, SqliteStoreError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T, SqliteStoreError> + Send + 'static,
    {
        let connection = Arc::clone(&self.connection);
        tokio::task::spawn_blocking(move || {
            let mut guard = connection.lock().map_err(|_| {
                SqliteStoreError::Io("sqlite connection mutex poisoned".to_string())
            })?;
            op(&mut guard)
        })
        .await
        .map_err(|err| SqliteStoreError::Io(format!("sqlite task failed: {err}")))?
    }
}

#[async_trait]
impl TreeStore for SqliteTreeStore {
    async fn read(&self, path: &TreePath) -> Result<Option<Value>, StoreError> {
        let segments = path.segments().to_vec();
        Ok(self
            .run(move |connection| {
                let tx = connection.transaction()?;
                let value = read_node(&tx, &segments)?;
                tx.commit()?;
                Ok(value)
            })
            .await?)
    }

    async fn write(&self, path: &TreePath, value: Value) -> Result<(), StoreError> {
        check_write(path, &value)?;
        let segments = path.segments().to_vec();
        let key = path.to_string();
        self.run(move |connection| {
            let tx = connection.transaction()?;
            put_node(&tx, &segments, tree::normalize(value), unix_millis())?;
            tx.commit()?;
            Ok(())
        })
        .await?;
        debug!(path = %key, "sqlite tree store wrote node");
        Ok(())
    }

    async fn update(&self, path: &TreePath, patch: Map<String, Value>) -> Result<(), StoreError> {
        check_patch(path, &patch)?;
        let segments = path.segments().to_vec();
        let key = path.to_string();
        let children = patch.len();
        self.run(move |connection| {
            let tx = connection.transaction()?;
            let now = unix_millis();
            for (child, value) in patch {
                let mut target = segments.clone();
                target.push(child);
                put_node(&tx, &target, tree::normalize(value), now)?;
            }
            tx.commit()?;
            Ok(())
        })
        .await?;
        debug!(path = %key, children, "sqlite tree store patched node");
        Ok(())
    }

    async fn remove(&self, path: &TreePath) -> Result<(), StoreError> {
        check_write(path, &Value::Null)?;
        let segments = path.segments().to_vec();
        self.run(move |connection| {
            let tx = connection.transaction()?;
            put_node(&tx, &segments, None, unix_millis())?;
            tx.commit()?;
            Ok(())
        })
        .await?;
        Ok(())
    }
}

// ============================================================================
// SECTION: Node Operations
// ============================================================================

/// Reads the value at `segments`, assembling it from rows when needed.
fn read_node(
    connection: &Connection,
    segments: &[String],
) -> Result<Option<Value>, SqliteStoreError> {
    if segments.is_empty() {
        let rows = load_rows(connection, None)?;
        return Ok(assemble(&rows, 0)?.map(Value::Object));
    }
    if let Some((depth, stored)) = find_covering_row(connection, segments)? {
        let stored = parse_row(&segments[.. depth], &stored)?;
        if depth == segments.len() {
            return Ok(Some(stored));
        }
        return Ok(match stored {
            Value::Object(map) => tree::value_at(&map, &segments[depth ..]).cloned(),
            _ => None,
        });
    }
    let key = join(segments);
    let rows = load_rows(connection, Some(&key))?;
    Ok(assemble(&rows, segments.len())?.map(Value::Object))
}

/// Stores `value` at `segments`, or removes the node for `None`.
///
/// # Invariants
/// - Keeps stored rows disjoint: no row is left as an ancestor of another.
fn put_node(
    connection: &Connection,
    segments: &[String],
    value: Option<Value>,
    now: i64,
) -> Result<(), SqliteStoreError> {
    if segments.is_empty() {
        return Err(SqliteStoreError::Invalid("cannot write the tree root".to_string()));
    }
    let key = join(segments);
    if let Some((depth, stored)) = find_covering_row(connection, segments)?
        && depth < segments.len()
    {
        let owner = join(&segments[.. depth]);
        let mut map = match parse_row(&segments[.. depth], &stored)? {
            Value::Object(map) => map,
            _ if value.is_none() => return Ok(()),
            _ => Map::new(),
        };
        tree::set_at(&mut map, &segments[depth ..], value);
        if map.is_empty() {
            connection.execute("DELETE FROM tree_nodes WHERE path = ?1", params![owner])?;
        } else {
            let encoded = encode(&Value::Object(map))?;
            connection.execute(
                "UPDATE tree_nodes SET value_json = ?2, written_at = ?3 WHERE path = ?1",
                params![owner, encoded, now],
            )?;
        }
        return Ok(());
    }
    let (lower, upper) = descendant_bounds(&key);
    connection.execute(
        "DELETE FROM tree_nodes WHERE path = ?1 OR (path >= ?2 AND path < ?3)",
        params![key, lower, upper],
    )?;
    if let Some(value) = value {
        let encoded = encode(&value)?;
        connection.execute(
            "INSERT INTO tree_nodes (path, value_json, written_at) VALUES (?1, ?2, ?3)",
            params![key, encoded, now],
        )?;
    }
    Ok(())
}

/// Finds the stored row at `segments` or at one of its ancestors.
///
/// Returns the depth of the row path and its raw JSON.
fn find_covering_row(
    connection: &Connection,
    segments: &[String],
) -> Result<Option<(usize, String)>, SqliteStoreError> {
    for depth in 1 ..= segments.len() {
        let key = join(&segments[.. depth]);
        let stored: Option<String> = connection
            .query_row(
                "SELECT value_json FROM tree_nodes WHERE path = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        if let Some(stored) = stored {
            return Ok(Some((depth, stored)));
        }
    }
    Ok(None)
}

/// Loads every row below `prefix`, or every row for `None`.
fn load_rows(
    connection: &Connection,
    prefix: Option<&str>,
) -> Result<Vec<(String, String)>, SqliteStoreError> {
    let mut rows = Vec::new();
    match prefix {
        None => {
            let mut statement =
                connection.prepare("SELECT path, value_json FROM tree_nodes ORDER BY path")?;
            let mapped = statement.query_map(params![], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?;
            for row in mapped {
                rows.push(row?);
            }
        }
        Some(prefix) => {
            let (lower, upper) = descendant_bounds(prefix);
            let mut statement = connection.prepare(
                "SELECT path, value_json FROM tree_nodes WHERE path >= ?1 AND path < ?2 ORDER BY \
                 path",
            )?;
            let mapped = statement.query_map(params![lower, upper], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?;
            for row in mapped {
                rows.push(row?);
            }
        }
    }
    Ok(rows)
}

/// Builds an object from rows, dropping the first `depth` path segments.
fn assemble(
    rows: &[(String, String)],
    depth: usize,
) -> Result<Option<Map<String, Value>>, SqliteStoreError> {
    let mut root = Map::new();
    for (path, stored) in rows {
        let segments: Vec<String> = path.split('/').map(str::to_string).collect();
        if segments.len() <= depth {
            return Err(SqliteStoreError::Corrupt(format!("row {path} overlaps its parent")));
        }
        let value = parse_row(&segments, stored)?;
        tree::set_at(&mut root, &segments[depth ..], Some(value));
    }
    Ok((!root.is_empty()).then_some(root))
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Joins path segments into a row key.
fn join(segments: &[String]) -> String {
    segments.join("/")
}

/// Returns the key range `[lower, upper)` holding every descendant of `key`.
///
/// `'0'` is the byte after `'/'`, so the range covers exactly the keys that
/// start with `key/` under binary collation.
fn descendant_bounds(key: &str) -> (String, String) {
    (format!("{key}/"), format!("{key}0"))
}

/// Serializes a stored value.
fn encode(value: &Value) -> Result<String, SqliteStoreError> {
    serde_json::to_string(value).map_err(|err| SqliteStoreError::Invalid(err.to_string()))
}

/// Parses a stored row, reporting undecodable rows as corruption.
fn parse_row(segments: &[String], stored: &str) -> Result<Value, SqliteStoreError> {
    serde_json::from_str(stored).map_err(|err| {
        SqliteStoreError::Corrupt(format!("row {} holds invalid json: {err}", join(segments)))
    })
}

/// Ensures the parent directory for the store exists.
fn ensure_parent_dir(path: &Path) -> Result<(), SqliteStoreError> {
    let Some(parent) = path.parent() else {
        return Err(SqliteStoreError::Io("store path missing parent directory".to_string()));
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }
    std::fs::create_dir_all(parent).map_err(|err| SqliteStoreError::Io(err.to_string()))
}

/// Validates store paths for safety limits.
fn validate_store_path(path: &Path) -> Result<(), SqliteStoreError> {
    if path.as_os_str().is_empty() {
        return Err(SqliteStoreError::Invalid("store path must not be empty".to_string()));
    }
    if path.display().to_string().len() > MAX_TOTAL_PATH_LENGTH {
        return Err(SqliteStoreError::Invalid("store path exceeds length limit".to_string()));
    }
    if path
        .components()
        .any(|component| component.as_os_str().len() > MAX_PATH_COMPONENT_LENGTH)
    {
        return Err(SqliteStoreError::Invalid(
            "store path contains an overlong component".to_string(),
        ));
    }
    if path.is_dir() {
        return Err(SqliteStoreError::Invalid(
            "store path must be a file, not a directory".to_string(),
        ));
    }
    Ok(())
}

/// Opens an `SQLite` connection and applies the configured pragmas.
fn open_connection(config: &SqliteStoreConfig) -> Result<Connection, SqliteStoreError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection = Connection::open_with_flags(&config.path, flags)?;
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))?;
    connection.busy_timeout(std::time::Duration::from_millis(config.busy_timeout_ms))?;
    Ok(connection)
}

/// Initializes the `SQLite` schema or validates the existing version.
fn initialize_schema(connection: &mut Connection) -> Result<(), SqliteStoreError> {
    let tx = connection.transaction()?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);")?;
    let version: Option<i64> = tx
        .query_row("SELECT version FROM store_meta LIMIT 1", params![], |row| row.get(0))
        .optional()?;
    match version {
        None => {
            tx.execute("INSERT INTO store_meta (version) VALUES (?1)", params![SCHEMA_VERSION])?;
            tx.execute_batch(
                "CREATE TABLE IF NOT EXISTS tree_nodes (
                    path TEXT PRIMARY KEY NOT NULL,
                    value_json TEXT NOT NULL,
                    written_at INTEGER NOT NULL
                );",
            )?;
        }
        Some(value) if value == SCHEMA_VERSION => {}
        Some(value) => {
            return Err(SqliteStoreError::VersionMismatch(format!(
                "unsupported schema version: {value}"
            )));
        }
    }
    tx.commit()?;
    Ok(())
}

/// Returns the current unix epoch in milliseconds.
fn unix_millis() -> i64 {
    let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
    i64::try_from(now.as_millis()).unwrap_or(i64::MAX)
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descendant_bounds_exclude_sibling_prefixes() {
        let (lower, upper) = descendant_bounds("batches");
        assert!("batches/a".as_bytes() >= lower.as_bytes());
        assert!("batches/a".as_bytes() < upper.as_bytes());
        assert!("batches-old/a".as_bytes() < lower.as_bytes());
        assert!("batches0".as_bytes() >= upper.as_bytes());
        assert!("batchesx/a".as_bytes() >= upper.as_bytes());
    }

    #[test]
    fn pragma_values_match_sqlite_names() {
        assert_eq!(SqliteStoreMode::Delete.pragma_value(), "delete");
        assert_eq!(SqliteSyncMode::Normal.pragma_value(), "normal");
    }
}
