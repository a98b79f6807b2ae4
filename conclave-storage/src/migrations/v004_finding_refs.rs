//! v004: per-agent finding reports pointing at shared memory entries.

use rusqlite::Connection;

pub fn migrate(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS finding_refs (
            id          TEXT PRIMARY KEY,
            entry_id    TEXT NOT NULL REFERENCES memory_entries(id) ON DELETE CASCADE,
            agent_name  TEXT NOT NULL,
            category    TEXT NOT NULL,
            session_id  TEXT NOT NULL,
            created_at  TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_finding_refs_entry ON finding_refs(entry_id);
        ",
    )
}
