//! v001: memory entries plus tag, descriptor and signature-band index tables.

use rusqlite::Connection;

pub fn migrate(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS memory_entries (
            id                 TEXT PRIMARY KEY,
            category           TEXT NOT NULL,
            fingerprint        TEXT NOT NULL,
            signature          INTEGER NOT NULL,
            payload            TEXT NOT NULL,
            tags               TEXT NOT NULL DEFAULT '[]',
            descriptors        TEXT NOT NULL DEFAULT '[]',
            source_session_id  TEXT NOT NULL,
            source_agent       TEXT NOT NULL,
            created_at         TEXT NOT NULL,
            feedback_label     TEXT,
            accuracy_weight    REAL NOT NULL DEFAULT 1.0,
            UNIQUE (category, fingerprint)
        );

        CREATE INDEX IF NOT EXISTS idx_memory_entries_created
            ON memory_entries(created_at);
        CREATE INDEX IF NOT EXISTS idx_memory_entries_category_created
            ON memory_entries(category, created_at);
        CREATE INDEX IF NOT EXISTS idx_memory_entries_agent
            ON memory_entries(source_agent, category);

        CREATE TABLE IF NOT EXISTS memory_tags (
            memory_id  TEXT NOT NULL REFERENCES memory_entries(id) ON DELETE CASCADE,
            tag        TEXT NOT NULL,
            PRIMARY KEY (memory_id, tag)
        );
        CREATE INDEX IF NOT EXISTS idx_memory_tags_tag ON memory_tags(tag);

        CREATE TABLE IF NOT EXISTS memory_descriptors (
            memory_id   TEXT NOT NULL REFERENCES memory_entries(id) ON DELETE CASCADE,
            descriptor  TEXT NOT NULL,
            PRIMARY KEY (memory_id, descriptor)
        );
        CREATE INDEX IF NOT EXISTS idx_memory_descriptors_descriptor
            ON memory_descriptors(descriptor);

        CREATE TABLE IF NOT EXISTS memory_bands (
            memory_id  TEXT NOT NULL REFERENCES memory_entries(id) ON DELETE CASCADE,
            band       INTEGER NOT NULL,
            value      INTEGER NOT NULL,
            PRIMARY KEY (memory_id, band)
        );
        CREATE INDEX IF NOT EXISTS idx_memory_bands_lookup ON memory_bands(band, value);
        ",
    )
}
