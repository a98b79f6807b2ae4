//! Single write connection. All writes are serialized through it.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::Connection;

use conclave_core::config::defaults::DEFAULT_BUSY_TIMEOUT_MS;
use conclave_core::errors::ConclaveResult;

use super::pragmas::apply_pragmas;
use crate::{sqlite_err, to_storage_err};

/// The write connection, guarded by a blocking mutex. Callers on an async
/// runtime go through `spawn_blocking`.
pub struct WriteConnection {
    conn: Mutex<Connection>,
}

impl WriteConnection {
    pub fn open(path: &Path, busy_timeout_ms: u32) -> ConclaveResult<Self> {
        let conn = Connection::open(path).map_err(|e| sqlite_err("open writer", e))?;
        apply_pragmas(&conn, busy_timeout_ms)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> ConclaveResult<Self> {
        let conn = Connection::open_in_memory().map_err(|e| sqlite_err("open writer", e))?;
        apply_pragmas(&conn, DEFAULT_BUSY_TIMEOUT_MS)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Acquire the write lock and execute a closure with the connection.
    pub fn with_conn<F, T>(&self, f: F) -> ConclaveResult<T>
    where
        F: FnOnce(&Connection) -> ConclaveResult<T>,
    {
        let guard = self
            .conn
            .lock()
            .map_err(|e| to_storage_err(format!("writer lock poisoned: {e}")))?;
        f(&guard)
    }
}
