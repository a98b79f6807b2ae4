//! Finding reports: which agent reported which entry.

use rusqlite::{params, Connection, OptionalExtension, Row};

use conclave_core::errors::ConclaveResult;
use conclave_core::models::FindingRef;

use super::memory_crud::{format_ts, parse_ts};
use crate::sqlite_err;

fn row_to_ref(row: &Row<'_>) -> rusqlite::Result<FindingRef> {
    let created_at: String = row.get(5)?;
    Ok(FindingRef {
        id: row.get(0)?,
        entry_id: row.get(1)?,
        agent_name: row.get(2)?,
        category: row.get(3)?,
        session_id: row.get(4)?,
        created_at: parse_ts(5, &created_at)?,
    })
}

/// Insert a report. Re-recording the same id is a no-op.
pub fn record(conn: &Connection, finding: &FindingRef) -> ConclaveResult<()> {
    conn.execute(
        "INSERT OR IGNORE INTO finding_refs
            (id, entry_id, agent_name, category, session_id, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            finding.id,
            finding.entry_id,
            finding.agent_name,
            finding.category,
            finding.session_id,
            format_ts(&finding.created_at),
        ],
    )
    .map_err(|e| sqlite_err("record_finding", e))?;
    Ok(())
}

pub fn get(conn: &Connection, id: &str) -> ConclaveResult<Option<FindingRef>> {
    conn.query_row(
        "SELECT id, entry_id, agent_name, category, session_id, created_at
         FROM finding_refs WHERE id = ?1",
        params![id],
        row_to_ref,
    )
    .optional()
    .map_err(|e| sqlite_err("get_finding", e))
}
