// crates/brewlog-config/src/lib.rs
// ============================================================================
// Module: Brewlog Config Library
// Description: Configuration model, loader, store wiring, and logging setup.
// Purpose: Turn a `brewlog.toml` file into a ready tree store and subscriber.
// Dependencies: brewlog-core, brewlog-store-sqlite, serde, toml, tracing-subscriber
// ============================================================================

//! ## Overview
//! [`BrewlogConfig::load`] reads and validates the configuration file,
//! [`open_tree_store`] builds the configured storage driver, and
//! [`init_logging`] installs the process-wide `tracing` subscriber.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod logging;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::BrewlogConfig;
pub use config::ConfigError;
pub use config::StoreBackend;
pub use config::StoreConfig;
pub use config::open_tree_store;
pub use logging::LogFormat;
pub use logging::LoggingConfig;
pub use logging::LoggingError;
pub use logging::init_logging;
