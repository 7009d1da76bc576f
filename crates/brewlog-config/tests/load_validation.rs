//! Config load validation tests for brewlog-config.
// crates/brewlog-config/tests/load_validation.rs
// =============================================================================
// Module: Config Load Validation Tests
// Description: Validate config loading guards (path, size, encoding, keys).
// Purpose: Ensure config input handling is strict and fail-closed.
// =============================================================================

use std::io::Write;
use std::path::Path;

use brewlog_config::BrewlogConfig;
use brewlog_config::ConfigError;
use brewlog_config::LogFormat;
use brewlog_config::StoreBackend;
use brewlog_store_sqlite::SqliteStoreMode;
use brewlog_store_sqlite::SqliteSyncMode;
use tempfile::NamedTempFile;

/// Test outcome with a readable failure message.
type TestResult = Result<(), String>;

/// Asserts that `result` failed with a message containing `needle`.
fn assert_invalid(result: Result<BrewlogConfig, ConfigError>, needle: &str) -> TestResult {
    match result {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Ok(_) => Err("expected invalid config load".to_string()),
    }
}

/// Writes `content` to a fresh temporary file.
fn config_file(content: &[u8]) -> Result<NamedTempFile, String> {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    file.write_all(content).map_err(|err| err.to_string())?;
    Ok(file)
}

/// Verifies overlong paths are rejected before reading.
#[test]
fn load_rejects_path_too_long() -> TestResult {
    let long_path = "a".repeat(5_000);
    assert_invalid(BrewlogConfig::load(Some(Path::new(&long_path))), "exceeds max length")
}

/// Verifies overlong path components are rejected.
#[test]
fn load_rejects_path_component_too_long() -> TestResult {
    let long_component = "a".repeat(300);
    assert_invalid(BrewlogConfig::load(Some(Path::new(&long_component))), "component too long")
}

/// Verifies a missing file surfaces as an I/O error.
#[test]
fn load_reports_missing_file() -> TestResult {
    let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
    let missing = dir.path().join("absent.toml");
    assert_invalid(BrewlogConfig::load(Some(&missing)), "config io error")
}

/// Verifies files above the size limit are rejected.
#[test]
fn load_rejects_oversized_file() -> TestResult {
    let file = config_file(&vec![b'#'; 1_048_577])?;
    assert_invalid(BrewlogConfig::load(Some(file.path())), "config file exceeds size limit")
}

/// Verifies non UTF-8 files are rejected.
#[test]
fn load_rejects_non_utf8_file() -> TestResult {
    let file = config_file(&[0xFF, 0xFE, 0xFF])?;
    assert_invalid(BrewlogConfig::load(Some(file.path())), "config file must be utf-8")
}

/// Verifies unknown keys fail parsing.
#[test]
fn load_rejects_unknown_keys() -> TestResult {
    let file = config_file(b"[store]\nbackend = \"memory\"\ncache = true\n")?;
    assert_invalid(BrewlogConfig::load(Some(file.path())), "config parse error")
}

/// Verifies the sqlite backend requires its section.
#[test]
fn sqlite_backend_requires_section() -> TestResult {
    assert_invalid(BrewlogConfig::parse("[store]\nbackend = \"sqlite\"\n"), "[store.sqlite]")?;
    assert_invalid(
        BrewlogConfig::parse("[store]\nbackend = \"sqlite\"\n[store.sqlite]\npath = \"\"\n"),
        "sqlite store path is required",
    )
}

/// Verifies bad logging filters are rejected at load time.
#[test]
fn logging_filter_must_parse() -> TestResult {
    assert_invalid(BrewlogConfig::parse("[logging]\nfilter = \"brewlog=loud\"\n"), "logging filter")
}

/// Verifies an empty file yields the in-memory defaults.
#[test]
fn empty_file_uses_defaults() -> TestResult {
    let file = config_file(b"")?;
    let config = BrewlogConfig::load(Some(file.path())).map_err(|err| err.to_string())?;
    if config != BrewlogConfig::default() || config.store.backend != StoreBackend::Memory {
        return Err(format!("unexpected defaults: {config:?}"));
    }
    Ok(())
}

/// Verifies a complete file is parsed field by field.
#[test]
fn full_file_is_parsed() -> TestResult {
    let content = br#"
[store]
backend = "sqlite"

[store.sqlite]
path = "data/brewlog.sqlite"
busy_timeout_ms = 2500
journal_mode = "delete"
sync_mode = "normal"

[logging]
filter = "brewlog_core=debug,info"
format = "pretty"
"#;
    let file = config_file(content)?;
    let config = BrewlogConfig::load(Some(file.path())).map_err(|err| err.to_string())?;
    let sqlite = config.store.sqlite.ok_or("missing sqlite section")?;
    let parsed = config.store.backend == StoreBackend::Sqlite
        && sqlite.path == Path::new("data/brewlog.sqlite")
        && sqlite.busy_timeout_ms == 2_500
        && sqlite.journal_mode == SqliteStoreMode::Delete
        && sqlite.sync_mode == SqliteSyncMode::Normal
        && config.logging.filter == "brewlog_core=debug,info"
        && config.logging.format == LogFormat::Pretty;
    if parsed { Ok(()) } else { Err("fields did not round through parsing".to_string()) }
}
