// crates/brewlog-records/src/error.rs
// ============================================================================
// Module: Records Errors
// Description: Error type shared by the brewery repositories.
// Purpose: Combine store, schema, identifier, and batch code failures.
// Dependencies: brewlog-core, thiserror
// ============================================================================

//! ## Overview
//! [`RecordsError`] wraps the core errors unchanged so callers can still
//! match on [`RecordStoreError::NotFound`] or a transport failure. The only
//! failures that originate here are [`RecordsError::Forbidden`], raised by
//! operations reserved for privileged callers, and
//! [`RecordsError::Deactivated`], raised when a deactivated user signs in.

use brewlog_core::IdentifierError;
use brewlog_core::RecordStoreError;
use brewlog_core::SchemaError;
use thiserror::Error;

use crate::batch_code::BatchCodeError;

/// Errors raised by brewery repositories and sessions.
#[derive(Debug, Error)]
pub enum RecordsError {
    /// Record store failure, including validation and absence.
    #[error(transparent)]
    Store(#[from] RecordStoreError),
    /// A pinned collection schema failed to compile.
    #[error(transparent)]
    Schema(#[from] SchemaError),
    /// A supplied identifier is not a valid key.
    #[error(transparent)]
    Identifier(#[from] IdentifierError),
    /// Batch code generation or parsing failed.
    #[error(transparent)]
    BatchCode(#[from] BatchCodeError),
    /// The operation requires a privileged caller.
    #[error("{action} requires a privileged caller")]
    Forbidden {
        /// Operation that was refused.
        action: &'static str,
    },
    /// The user account is deactivated.
    #[error("user {uid} is deactivated")]
    Deactivated {
        /// User id.
        uid: String,
    },
}

impl RecordsError {
    /// Returns true when the error reports a missing or hidden record.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Store(RecordStoreError::NotFound { .. }))
    }
}
