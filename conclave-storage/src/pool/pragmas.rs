//! PRAGMA configuration applied to every SQLite connection.

use rusqlite::Connection;

use conclave_core::errors::ConclaveResult;

use crate::sqlite_err;

/// Apply write-side pragmas: WAL, NORMAL sync, foreign keys, busy timeout.
pub fn apply_pragmas(conn: &Connection, busy_timeout_ms: u32) -> ConclaveResult<()> {
    conn.execute_batch(&format!(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA cache_size = -16000;
        PRAGMA busy_timeout = {busy_timeout_ms};
        PRAGMA foreign_keys = ON;
        PRAGMA temp_store = MEMORY;
        "
    ))
    .map_err(|e| sqlite_err("apply_pragmas", e))?;
    Ok(())
}

/// Apply read-side pragmas.
pub fn apply_read_pragmas(conn: &Connection, busy_timeout_ms: u32) -> ConclaveResult<()> {
    conn.execute_batch(&format!(
        "
        PRAGMA query_only = ON;
        PRAGMA cache_size = -16000;
        PRAGMA busy_timeout = {busy_timeout_ms};
        PRAGMA temp_store = MEMORY;
        "
    ))
    .map_err(|e| sqlite_err("apply_read_pragmas", e))?;
    Ok(())
}

/// Verify that WAL mode is active on a connection.
pub fn verify_wal_mode(conn: &Connection) -> ConclaveResult<bool> {
    let mode: String = conn
        .pragma_query_value(None, "journal_mode", |row| row.get(0))
        .map_err(|e| sqlite_err("journal_mode", e))?;
    Ok(mode.eq_ignore_ascii_case("wal"))
}
