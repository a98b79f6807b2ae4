//! Counts and retention.

use std::collections::BTreeMap;

use chrono::{Duration, Utc};
use rusqlite::{params, Connection};

use conclave_core::errors::ConclaveResult;
use conclave_core::traits::RetentionPolicy;

use super::memory_crud::format_ts;
use crate::sqlite_err;

pub fn count(conn: &Connection) -> ConclaveResult<usize> {
    let n: i64 = conn
        .query_row("SELECT COUNT(*) FROM memory_entries", [], |row| row.get(0))
        .map_err(|e| sqlite_err("count", e))?;
    Ok(n as usize)
}

pub fn count_by_category(conn: &Connection) -> ConclaveResult<BTreeMap<String, usize>> {
    let mut stmt = conn
        .prepare("SELECT category, COUNT(*) FROM memory_entries GROUP BY category")
        .map_err(|e| sqlite_err("count_by_category", e))?;
    let rows = stmt
        .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))
        .map_err(|e| sqlite_err("count_by_category", e))?;
    let mut out = BTreeMap::new();
    for row in rows {
        let (category, n) = row.map_err(|e| sqlite_err("count_by_category", e))?;
        out.insert(category, n as usize);
    }
    Ok(out)
}

/// Delete entries older than the policy's age. Index rows go with them via
/// cascade, FTS rows via trigger.
pub fn apply_retention(conn: &Connection, policy: &RetentionPolicy) -> ConclaveResult<usize> {
    let cutoff = Utc::now() - Duration::days(i64::from(policy.max_age_days));
    let removed = conn
        .execute(
            "DELETE FROM memory_entries
             WHERE created_at < ?1 AND (?2 = 0 OR feedback_label IS NULL)",
            params![format_ts(&cutoff), policy.keep_labeled],
        )
        .map_err(|e| sqlite_err("apply_retention", e))?;
    Ok(removed)
}
