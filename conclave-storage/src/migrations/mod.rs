//! Schema migrations, tracked in `schema_version`.

mod v001_memory_tables;
mod v002_fts5_index;
mod v003_confidence_tables;
mod v004_finding_refs;

use rusqlite::Connection;

use conclave_core::errors::{ConclaveError, ConclaveResult, StorageError};

use crate::sqlite_err;

type Migration = fn(&Connection) -> rusqlite::Result<()>;

const MIGRATIONS: &[(u32, Migration)] = &[
    (1, v001_memory_tables::migrate),
    (2, v002_fts5_index::migrate),
    (3, v003_confidence_tables::migrate),
    (4, v004_finding_refs::migrate),
];

/// Latest schema version.
pub const LATEST_VERSION: u32 = 4;

/// Apply every migration newer than the recorded version, each in its own transaction.
pub fn run_migrations(conn: &Connection) -> ConclaveResult<u32> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version     INTEGER PRIMARY KEY,
            applied_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        );",
    )
    .map_err(|e| sqlite_err("schema_version", e))?;

    let current = current_version(conn)?;
    for (version, migrate) in MIGRATIONS {
        if *version <= current {
            continue;
        }
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| sqlite_err("migration begin", e))?;
        let applied = migrate(&tx).and_then(|_| {
            tx.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])
                .map(|_| ())
        });
        match applied {
            Ok(()) => {
                tx.commit().map_err(|e| sqlite_err("migration commit", e))?;
                tracing::debug!(version, "applied migration");
            }
            Err(e) => {
                let _ = tx.rollback();
                return Err(ConclaveError::Storage(StorageError::MigrationFailed {
                    version: *version,
                    reason: e.to_string(),
                }));
            }
        }
    }
    current_version(conn)
}

/// Highest applied version, 0 for a fresh database.
pub fn current_version(conn: &Connection) -> ConclaveResult<u32> {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )
    .map_err(|e| sqlite_err("schema_version", e))
}
