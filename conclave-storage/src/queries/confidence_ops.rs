//! Confidence record persistence.

use rusqlite::{params, Connection, OptionalExtension, Row};

use conclave_core::errors::ConclaveResult;
use conclave_core::models::ConfidenceRecord;

use super::memory_crud::{format_ts, parse_ts};
use crate::sqlite_err;

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<ConfidenceRecord> {
    let observation_count: i64 = row.get(2)?;
    let last_updated: String = row.get(5)?;
    Ok(ConfidenceRecord {
        agent_name: row.get(0)?,
        category: row.get(1)?,
        observation_count: observation_count as u64,
        evidence_weight: row.get(3)?,
        calibrated_score: row.get(4)?,
        last_updated: parse_ts(5, &last_updated)?,
    })
}

pub fn load(conn: &Connection, agent_name: &str, category: &str) -> ConclaveResult<Option<ConfidenceRecord>> {
    conn.query_row(
        "SELECT agent_name, category, observation_count, evidence_weight, calibrated_score, last_updated
         FROM confidence_records WHERE agent_name = ?1 AND category = ?2",
        params![agent_name, category],
        row_to_record,
    )
    .optional()
    .map_err(|e| sqlite_err("load_confidence", e))
}

/// Upsert one record. The row is updated in place, never recreated.
pub fn save(conn: &Connection, record: &ConfidenceRecord) -> ConclaveResult<()> {
    conn.execute(
        "INSERT INTO confidence_records
            (agent_name, category, observation_count, evidence_weight, calibrated_score, last_updated)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT (agent_name, category) DO UPDATE SET
            observation_count = excluded.observation_count,
            evidence_weight = excluded.evidence_weight,
            calibrated_score = excluded.calibrated_score,
            last_updated = excluded.last_updated",
        params![
            record.agent_name,
            record.category,
            record.observation_count as i64,
            record.evidence_weight,
            record.calibrated_score,
            format_ts(&record.last_updated),
        ],
    )
    .map_err(|e| sqlite_err("save_confidence", e))?;
    Ok(())
}

pub fn list(conn: &Connection) -> ConclaveResult<Vec<ConfidenceRecord>> {
    let mut stmt = conn
        .prepare(
            "SELECT agent_name, category, observation_count, evidence_weight, calibrated_score, last_updated
             FROM confidence_records ORDER BY agent_name, category",
        )
        .map_err(|e| sqlite_err("list_confidence", e))?;
    let rows = stmt
        .query_map([], row_to_record)
        .map_err(|e| sqlite_err("list_confidence", e))?;
    rows.collect::<Result<Vec<_>, _>>()
        .map_err(|e| sqlite_err("list_confidence", e))
}
