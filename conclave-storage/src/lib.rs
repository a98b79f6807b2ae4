//! # conclave-storage
//!
//! SQLite-backed Memory Store. One serialized writer plus a read pool,
//! WAL mode, schema migrations, secondary index tables for tags, structural
//! descriptors and signature bands, and an FTS5 index over payloads.
//! Also persists confidence records.

pub mod engine;
pub mod migrations;
pub mod pool;
pub mod queries;

pub use engine::StorageEngine;

use conclave_core::errors::{ConclaveError, StorageError};
use rusqlite::ErrorCode;

/// Wrap a message as a generic storage error.
pub(crate) fn to_storage_err(msg: impl Into<String>) -> ConclaveError {
    ConclaveError::Storage(StorageError::SqliteError {
        message: msg.into(),
    })
}

/// Classify a SQLite error. Busy, locked and unopenable databases count as
/// an unavailable store; everything else is a plain storage error.
pub(crate) fn sqlite_err(context: &str, e: rusqlite::Error) -> ConclaveError {
    match e.sqlite_error_code() {
        Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked | ErrorCode::CannotOpen) => {
            ConclaveError::Storage(StorageError::Unavailable {
                reason: format!("{context}: {e}"),
            })
        }
        _ => to_storage_err(format!("{context}: {e}")),
    }
}
