// crates/brewlog-config/tests/store_wiring.rs
// ============================================================================
// Module: Store Wiring Tests
// Description: Open configured tree stores and run records through them.
// Purpose: Ensure both backends come up from configuration alone.
// Dependencies: brewlog-config, brewlog-core, tempfile, tokio
// ============================================================================

//! ## Overview
//! Builds stores from parsed configuration and checks they accept writes and
//! that the `SQLite` backend keeps data across a reopen.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use brewlog_config::BrewlogConfig;
use brewlog_config::ConfigError;
use brewlog_config::StoreBackend;
use brewlog_config::StoreConfig;
use brewlog_config::open_tree_store;
use brewlog_core::TreePath;
use brewlog_core::TreeStore;
use tempfile::TempDir;

fn sqlite_config(dir: &TempDir) -> BrewlogConfig {
    let path = dir.path().join("brewlog.sqlite");
    let content = format!("[store]\nbackend = \"sqlite\"\n[store.sqlite]\npath = {path:?}\n");
    BrewlogConfig::parse(&content).unwrap()
}

/// Verifies the default config opens an empty in-memory tree.
#[tokio::test]
async fn memory_backend_opens_empty() {
    let tree = open_tree_store(&StoreConfig::default()).unwrap();
    let path = TreePath::parse("batches/b1/name").unwrap();
    assert_eq!(tree.read(&path).await.unwrap(), None);
    tree.write(&path, "Ginger".into()).await.unwrap();
    assert_eq!(tree.read(&path).await.unwrap(), Some("Ginger".into()));
}

/// Verifies the sqlite backend persists across reopen.
#[tokio::test(flavor = "multi_thread")]
async fn sqlite_backend_persists() {
    let dir = TempDir::new().unwrap();
    let config = sqlite_config(&dir);
    assert_eq!(config.store.backend, StoreBackend::Sqlite);
    let path = TreePath::parse("batches/b1/name").unwrap();
    {
        let tree = open_tree_store(&config.store).unwrap();
        tree.write(&path, "Hibiscus".into()).await.unwrap();
    }
    let tree = open_tree_store(&config.store).unwrap();
    assert_eq!(tree.read(&path).await.unwrap(), Some("Hibiscus".into()));
    assert!(dir.path().join("brewlog.sqlite").exists());
}

/// Verifies an unvalidated sqlite selection without a section is refused.
#[test]
fn sqlite_backend_without_section_is_invalid() {
    let config = StoreConfig {
        backend: StoreBackend::Sqlite,
        sqlite: None,
    };
    assert!(matches!(open_tree_store(&config), Err(ConfigError::Invalid(_))));
}
