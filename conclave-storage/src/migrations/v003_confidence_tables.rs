//! v003: per-(agent, category) confidence records.

use rusqlite::Connection;

pub fn migrate(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS confidence_records (
            agent_name         TEXT NOT NULL,
            category           TEXT NOT NULL,
            observation_count  INTEGER NOT NULL DEFAULT 0,
            evidence_weight    REAL NOT NULL DEFAULT 0.0,
            calibrated_score   REAL NOT NULL,
            last_updated       TEXT NOT NULL,
            PRIMARY KEY (agent_name, category)
        );
        ",
    )
}
