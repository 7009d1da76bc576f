// crates/brewlog-store-sqlite/tests/proptest_drivers.rs
// ============================================================================
// Module: Driver Equivalence Property Tests
// Description: Compare the SQLite driver against the in-memory driver.
// Purpose: Check that both drivers expose the same tree after any edit mix.
// Dependencies: brewlog-store-sqlite, brewlog-core, proptest, tempfile
// ============================================================================

//! ## Overview
//! Applies random write/update/remove sequences to both drivers and checks
//! that the resulting trees match and that stored rows stay disjoint.

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

use brewlog_core::InMemoryTreeStore;
use brewlog_core::TreePath;
use brewlog_core::TreeStore;
use brewlog_store_sqlite::SqliteStoreConfig;
use brewlog_store_sqlite::SqliteTreeStore;
use proptest::prelude::*;
use serde_json::Map;
use serde_json::Value;
use serde_json::json;
use tempfile::TempDir;

/// One edit applied to both drivers.
#[derive(Debug, Clone)]
enum Edit {
    /// Full write at a path.
    Write(Vec<String>, Value),
    /// Per-child patch at a path.
    Update(Vec<String>, Map<String, Value>),
    /// Removal at a path.
    Remove(Vec<String>),
}

fn segment() -> impl Strategy<Value = String> {
    prop_oneof![Just("a".to_string()), Just("b".to_string()), Just("c".to_string())]
}

fn node_path() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(segment(), 1 ..= 3)
}

fn leaf() -> impl Strategy<Value = Value> {
    prop_oneof![Just(Value::Null), (0_i64 .. 4).prop_map(Value::from), Just(json!({}))]
}

fn node_value() -> impl Strategy<Value = Value> {
    leaf().prop_recursive(2, 8, 3, |inner| {
        prop::collection::btree_map(segment(), inner, 0 ..= 3)
            .prop_map(|map| Value::Object(map.into_iter().collect()))
    })
}

fn edit() -> impl Strategy<Value = Edit> {
    prop_oneof![
        (node_path(), node_value()).prop_map(|(path, value)| Edit::Write(path, value)),
        (node_path(), prop::collection::btree_map(segment(), node_value(), 0 ..= 3))
            .prop_map(|(path, patch)| Edit::Update(path, patch.into_iter().collect())),
        node_path().prop_map(Edit::Remove),
    ]
}

fn tree_path(segments: &[String]) -> TreePath {
    TreePath::parse(&segments.join("/")).unwrap()
}

async fn apply(store: &dyn TreeStore, edit: &Edit) {
    match edit {
        Edit::Write(path, value) => store.write(&tree_path(path), value.clone()).await.unwrap(),
        Edit::Update(path, patch) => store.update(&tree_path(path), patch.clone()).await.unwrap(),
        Edit::Remove(path) => store.remove(&tree_path(path)).await.unwrap(),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn sqlite_matches_in_memory(edits in prop::collection::vec(edit(), 1 .. 16)) {
        let runtime = tokio::runtime::Builder::new_multi_thread().build().unwrap();
        runtime.block_on(async {
            let dir = TempDir::new().unwrap();
            let sqlite =
                SqliteTreeStore::open(SqliteStoreConfig::at(dir.path().join("tree.sqlite")))
                    .unwrap();
            let memory = InMemoryTreeStore::new();
            for edit in &edits {
                apply(&sqlite, edit).await;
                apply(&memory, edit).await;
            }
            for probe in ["", "a", "a/b", "b/c/a"] {
                let probe = TreePath::parse(probe).unwrap();
                assert_eq!(
                    sqlite.read(&probe).await.unwrap(),
                    memory.read(&probe).await.unwrap()
                );
            }
            let rows = sqlite.stored_paths().unwrap();
            for row in &rows {
                let nested = format!("{row}/");
                assert!(rows.iter().all(|other| !other.starts_with(&nested)));
            }
        });
    }
}
