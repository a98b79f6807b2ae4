//! Put (with dedup), get, and feedback updates for memory entries.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};

use conclave_core::errors::{ConclaveError, ConclaveResult, StorageError};
use conclave_core::fingerprint;
use conclave_core::models::{FeedbackLabel, MemoryEntry};
use conclave_core::traits::PutOutcome;

use crate::{sqlite_err, to_storage_err};

/// Column list matching [`row_to_entry`], qualified with the `m` alias.
pub(crate) const ENTRY_COLUMNS: &str = "m.id, m.category, m.fingerprint, m.signature, m.payload, \
     m.tags, m.descriptors, m.source_session_id, m.source_agent, m.created_at, \
     m.feedback_label, m.accuracy_weight";

/// Timestamps are stored in a fixed-width UTC form so text order is time order.
pub(crate) fn format_ts(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn conversion_err(idx: usize, e: impl std::error::Error + Send + Sync + 'static) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
}

pub(crate) fn parse_ts(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_err(idx, e))
}

pub(crate) fn row_to_entry(row: &Row<'_>) -> rusqlite::Result<MemoryEntry> {
    let tags: String = row.get(5)?;
    let descriptors: String = row.get(6)?;
    let created_at: String = row.get(9)?;
    let label: Option<String> = row.get(10)?;
    let signature: i64 = row.get(3)?;

    Ok(MemoryEntry {
        id: row.get(0)?,
        category: row.get(1)?,
        fingerprint: row.get(2)?,
        signature: signature as u64,
        payload: row.get(4)?,
        tags: serde_json::from_str(&tags).map_err(|e| conversion_err(5, e))?,
        descriptors: serde_json::from_str(&descriptors).map_err(|e| conversion_err(6, e))?,
        source_session_id: row.get(7)?,
        source_agent: row.get(8)?,
        created_at: parse_ts(9, &created_at)?,
        feedback_label: label.as_deref().and_then(FeedbackLabel::parse),
        accuracy_weight: row.get(11)?,
    })
}

/// Insert an entry, or deduplicate it against the existing (category, fingerprint).
///
/// On a duplicate the stored payload is never touched. If the incoming entry
/// carries a feedback label, the stored feedback fields take its values.
pub fn put_entry(conn: &Connection, entry: &MemoryEntry) -> ConclaveResult<PutOutcome> {
    let tx = conn
        .unchecked_transaction()
        .map_err(|e| sqlite_err("put_entry begin", e))?;

    match put_entry_inner(&tx, entry) {
        Ok(outcome) => {
            tx.commit().map_err(|e| sqlite_err("put_entry commit", e))?;
            Ok(outcome)
        }
        Err(e) => {
            let _ = tx.rollback();
            Err(e)
        }
    }
}

fn put_entry_inner(conn: &Connection, entry: &MemoryEntry) -> ConclaveResult<PutOutcome> {
    let tags_json = serde_json::to_string(&entry.tags)?;
    let descriptors_json = serde_json::to_string(&entry.descriptors)?;

    let inserted = conn
        .execute(
            "INSERT INTO memory_entries (
                id, category, fingerprint, signature, payload, tags, descriptors,
                source_session_id, source_agent, created_at, feedback_label, accuracy_weight
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            ON CONFLICT (category, fingerprint) DO NOTHING",
            params![
                entry.id,
                entry.category,
                entry.fingerprint,
                entry.signature as i64,
                entry.payload,
                tags_json,
                descriptors_json,
                entry.source_session_id,
                entry.source_agent,
                format_ts(&entry.created_at),
                entry.feedback_label.map(|l| l.as_str()),
                entry.accuracy_weight,
            ],
        )
        .map_err(|e| sqlite_err("put_entry insert", e))?;

    if inserted == 1 {
        insert_index_rows(conn, entry)?;
        return Ok(PutOutcome::Inserted {
            id: entry.id.clone(),
        });
    }

    let existing_id: String = conn
        .query_row(
            "SELECT id FROM memory_entries WHERE category = ?1 AND fingerprint = ?2",
            params![entry.category, entry.fingerprint],
            |row| row.get(0),
        )
        .map_err(|e| sqlite_err("put_entry lookup", e))?;

    if let Some(label) = entry.feedback_label {
        set_feedback(conn, &existing_id, label, entry.accuracy_weight)?;
    }

    Ok(PutOutcome::Deduplicated { id: existing_id })
}

fn insert_index_rows(conn: &Connection, entry: &MemoryEntry) -> ConclaveResult<()> {
    for tag in &entry.tags {
        conn.execute(
            "INSERT OR IGNORE INTO memory_tags (memory_id, tag) VALUES (?1, ?2)",
            params![entry.id, tag.to_lowercase()],
        )
        .map_err(|e| sqlite_err("insert tag", e))?;
    }
    for descriptor in &entry.descriptors {
        conn.execute(
            "INSERT OR IGNORE INTO memory_descriptors (memory_id, descriptor) VALUES (?1, ?2)",
            params![entry.id, descriptor.to_lowercase()],
        )
        .map_err(|e| sqlite_err("insert descriptor", e))?;
    }
    for (band, value) in fingerprint::bands(entry.signature).iter().enumerate() {
        conn.execute(
            "INSERT INTO memory_bands (memory_id, band, value) VALUES (?1, ?2, ?3)",
            params![entry.id, band as i64, i64::from(*value)],
        )
        .map_err(|e| sqlite_err("insert band", e))?;
    }
    Ok(())
}

pub fn get_entry(conn: &Connection, id: &str) -> ConclaveResult<Option<MemoryEntry>> {
    conn.query_row(
        &format!("SELECT {ENTRY_COLUMNS} FROM memory_entries m WHERE m.id = ?1"),
        params![id],
        row_to_entry,
    )
    .optional()
    .map_err(|e| sqlite_err("get_entry", e))
}

pub fn get_by_fingerprint(
    conn: &Connection,
    category: &str,
    fingerprint: &str,
) -> ConclaveResult<Option<MemoryEntry>> {
    conn.query_row(
        &format!(
            "SELECT {ENTRY_COLUMNS} FROM memory_entries m
             WHERE m.category = ?1 AND m.fingerprint = ?2"
        ),
        params![category, fingerprint],
        row_to_entry,
    )
    .optional()
    .map_err(|e| sqlite_err("get_by_fingerprint", e))
}

/// Set feedback fields on an existing entry.
pub fn update_feedback(
    conn: &Connection,
    id: &str,
    label: FeedbackLabel,
    weight: f64,
) -> ConclaveResult<()> {
    if !weight.is_finite() || weight < 0.0 {
        return Err(to_storage_err(format!(
            "accuracy weight must be finite and non-negative, got {weight}"
        )));
    }
    set_feedback(conn, id, label, weight)
}

fn set_feedback(conn: &Connection, id: &str, label: FeedbackLabel, weight: f64) -> ConclaveResult<()> {
    let updated = conn
        .execute(
            "UPDATE memory_entries SET feedback_label = ?2, accuracy_weight = ?3 WHERE id = ?1",
            params![id, label.as_str(), weight],
        )
        .map_err(|e| sqlite_err("update_feedback", e))?;
    if updated == 0 {
        return Err(ConclaveError::Storage(StorageError::EntryNotFound {
            id: id.to_string(),
        }));
    }
    Ok(())
}
