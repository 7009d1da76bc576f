// crates/brewlog-config/src/logging.rs
// ============================================================================
// Module: Logging Setup
// Description: Installs the process-wide tracing subscriber.
// Purpose: Apply the `[logging]` section with `RUST_LOG` taking precedence.
// Dependencies: serde, thiserror, tracing-subscriber
// ============================================================================

//! ## Overview
//! Libraries in this workspace only emit `tracing` events. Binaries and
//! harnesses call [`init_logging`] once to route them to stderr.

use serde::Deserialize;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Default filter directive.
pub const DEFAULT_FILTER: &str = "info";

/// Output format of the fmt subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Single-line output with abbreviated fields.
    #[default]
    Compact,
    /// Multi-line, human-oriented output.
    Pretty,
    /// Default single-line output.
    Full,
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// `EnvFilter` directives used when `RUST_LOG` is unset.
    #[serde(default = "default_filter")]
    pub filter: String,
    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
            format: LogFormat::default(),
        }
    }
}

impl LoggingConfig {
    /// Validates the filter directives.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ConfigError::Invalid`] when `filter` does not parse.
    pub fn validate(&self) -> Result<(), crate::ConfigError> {
        EnvFilter::try_new(&self.filter)
            .map(|_| ())
            .map_err(|err| crate::ConfigError::Invalid(format!("logging filter: {err}")))
    }
}

/// Returns the default filter directive.
fn default_filter() -> String {
    DEFAULT_FILTER.to_string()
}

/// Logging setup errors.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// Filter directives failed to parse.
    #[error("invalid logging filter: {0}")]
    Filter(String),
    /// A global subscriber is already installed.
    #[error("logging already initialized: {0}")]
    AlreadyInitialized(String),
}

/// Installs the global fmt subscriber described by `config`.
///
/// A set `RUST_LOG` overrides `config.filter`.
///
/// # Errors
///
/// Returns [`LoggingError::Filter`] for bad directives and
/// [`LoggingError::AlreadyInitialized`] when a subscriber is already set.
pub fn init_logging(config: &LoggingConfig) -> Result<(), LoggingError> {
    let filter = resolve_filter(config)?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr);
    let installed = match config.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Full => builder.try_init(),
    };
    installed.map_err(|err| LoggingError::AlreadyInitialized(err.to_string()))
}

/// Builds the filter from `RUST_LOG` or the configured directives.
fn resolve_filter(config: &LoggingConfig) -> Result<EnvFilter, LoggingError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => {
            EnvFilter::try_new(&config.filter).map_err(|err| LoggingError::Filter(err.to_string()))
        }
    }
}
