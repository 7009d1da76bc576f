// crates/brewlog-config/src/config.rs
// ============================================================================
// Module: Brewlog Config
// Description: TOML configuration loader and store wiring.
// Purpose: Load, validate, and apply `brewlog.toml`.
// Dependencies: brewlog-core, brewlog-store-sqlite, serde, thiserror, toml
// ============================================================================

//! ## Overview
//! The configuration file is resolved from an explicit path, the
//! `BREWLOG_CONFIG` environment variable, or `brewlog.toml` in the working
//! directory, in that order. Loading is fail-closed: oversized, non UTF-8,
//! unknown keys, and inconsistent backend settings are all rejected.
//!
//! ## Invariants
//! - A validated config with the `sqlite` backend always carries a
//!   `[store.sqlite]` section with a non-empty path.
//! - Path length checks run before any file is read.

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use brewlog_core::InMemoryTreeStore;
use brewlog_core::SharedTreeStore;
use brewlog_store_sqlite::SqliteStoreConfig;
use brewlog_store_sqlite::SqliteTreeStore;
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::logging::LoggingConfig;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Default config filename.
pub const DEFAULT_CONFIG_NAME: &str = "brewlog.toml";
/// Environment variable override for the config path.
pub const CONFIG_ENV_VAR: &str = "BREWLOG_CONFIG";
/// Maximum allowed config file size in bytes.
pub const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum total path length for config-related paths.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;

// ============================================================================
// SECTION: Model
// ============================================================================

/// Top-level configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BrewlogConfig {
    /// Storage configuration.
    #[serde(default)]
    pub store: StoreConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Storage backend selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    /// Process-local tree; contents are lost on exit.
    #[default]
    Memory,
    /// `SQLite` database file.
    Sqlite,
}

/// Storage configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// Backend to open.
    #[serde(default)]
    pub backend: StoreBackend,
    /// `SQLite` settings, required for the `sqlite` backend.
    #[serde(default)]
    pub sqlite: Option<SqliteStoreConfig>,
}

/// Config errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error.
    #[error("config io error: {0}")]
    Io(String),
    /// Parse error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration.
    #[error("config invalid: {0}")]
    Invalid(String),
    /// Storage driver failed to open.
    #[error("config storage error: {0}")]
    Storage(String),
}

// ============================================================================
// SECTION: Loading
// ============================================================================

impl BrewlogConfig {
    /// Loads configuration from `path`, `BREWLOG_CONFIG`, or `brewlog.toml`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read, parsed, or
    /// validated.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved, "config path")?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::parse(content)
    }

    /// Parses and validates configuration text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML or unknown keys and
    /// [`ConfigError::Invalid`] when validation fails.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates cross-field rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when configuration is inconsistent.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.store.validate()?;
        self.logging.validate()
    }
}

impl StoreConfig {
    /// Validates backend settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the `sqlite` backend has no
    /// usable `[store.sqlite]` section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(sqlite) = &self.sqlite {
            if sqlite.path.as_os_str().is_empty() {
                return Err(ConfigError::Invalid("sqlite store path is required".to_string()));
            }
            validate_path(&sqlite.path, "store path")?;
        }
        if self.backend == StoreBackend::Sqlite && self.sqlite.is_none() {
            return Err(ConfigError::Invalid(
                "sqlite backend requires a [store.sqlite] section".to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Store Wiring
// ============================================================================

/// Opens the tree store selected by `config`.
///
/// # Errors
///
/// Returns [`ConfigError::Invalid`] when `config` fails validation and
/// [`ConfigError::Storage`] when the driver cannot be opened.
pub fn open_tree_store(config: &StoreConfig) -> Result<SharedTreeStore, ConfigError> {
    config.validate()?;
    match (config.backend, &config.sqlite) {
        (StoreBackend::Sqlite, Some(sqlite)) => {
            let store = SqliteTreeStore::open(sqlite.clone())
                .map_err(|err| ConfigError::Storage(err.to_string()))?;
            Ok(SharedTreeStore::from_store(store))
        }
        (StoreBackend::Sqlite, None) => Err(ConfigError::Invalid(
            "sqlite backend requires a [store.sqlite] section".to_string(),
        )),
        (StoreBackend::Memory, _) => {
            info!("opened in-memory tree store");
            Ok(SharedTreeStore::from_store(InMemoryTreeStore::new()))
        }
    }
}

// ============================================================================
// SECTION: Paths
// ============================================================================

/// Resolves the config path from explicit input or environment.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates path length and component lengths.
fn validate_path(path: &Path, label: &str) -> Result<(), ConfigError> {
    if path.to_string_lossy().len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{label} exceeds max length")));
    }
    for component in path.components() {
        if component.as_os_str().to_string_lossy().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{label} component too long")));
        }
    }
    Ok(())
}
