//! v002: FTS5 index over payloads, kept in sync by triggers.
//!
//! Payloads are immutable after insert, so there is no update trigger.

use rusqlite::Connection;

pub fn migrate(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "
        CREATE VIRTUAL TABLE IF NOT EXISTS memory_fts USING fts5(
            payload,
            content='memory_entries',
            content_rowid='rowid'
        );

        CREATE TRIGGER IF NOT EXISTS memory_fts_insert AFTER INSERT ON memory_entries BEGIN
            INSERT INTO memory_fts(rowid, payload) VALUES (new.rowid, new.payload);
        END;

        CREATE TRIGGER IF NOT EXISTS memory_fts_delete BEFORE DELETE ON memory_entries BEGIN
            INSERT INTO memory_fts(memory_fts, rowid, payload)
            VALUES ('delete', old.rowid, old.payload);
        END;
        ",
    )
}
