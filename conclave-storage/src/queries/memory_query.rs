//! Index-backed candidate queries used by the retrieval strategies.
//!
//! Every query orders by `created_at DESC, id ASC` so results are stable for
//! an unchanged store.

use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};

use conclave_core::constants::SIGNATURE_BANDS;
use conclave_core::errors::ConclaveResult;
use conclave_core::models::MemoryEntry;

use super::memory_crud::{row_to_entry, ENTRY_COLUMNS};
use crate::sqlite_err;

fn placeholders(start: usize, count: usize) -> String {
    (start..start + count)
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn run(conn: &Connection, sql: &str, args: Vec<Value>, context: &str) -> ConclaveResult<Vec<MemoryEntry>> {
    let mut stmt = conn.prepare(sql).map_err(|e| sqlite_err(context, e))?;
    let rows = stmt
        .query_map(params_from_iter(args), row_to_entry)
        .map_err(|e| sqlite_err(context, e))?;
    rows.collect::<Result<Vec<_>, _>>()
        .map_err(|e| sqlite_err(context, e))
}

/// Append the optional category filter, ordering and limit.
fn finish(
    mut sql: String,
    mut args: Vec<Value>,
    category: Option<&str>,
    limit: usize,
) -> (String, Vec<Value>) {
    if let Some(category) = category {
        args.push(Value::Text(category.to_string()));
        sql.push_str(&format!(" AND m.category = ?{}", args.len()));
    }
    args.push(Value::Integer(limit as i64));
    sql.push_str(&format!(
        " ORDER BY m.created_at DESC, m.id ASC LIMIT ?{}",
        args.len()
    ));
    (sql, args)
}

/// Entries linked to any of `values` through a join table. Matching is case-insensitive.
fn by_join(
    conn: &Connection,
    table: &str,
    column: &str,
    values: &[String],
    category: Option<&str>,
    limit: usize,
) -> ConclaveResult<Vec<MemoryEntry>> {
    if values.is_empty() || limit == 0 {
        return Ok(Vec::new());
    }
    let sql = format!(
        "SELECT {ENTRY_COLUMNS} FROM memory_entries m
         WHERE m.id IN (SELECT j.memory_id FROM {table} j WHERE j.{column} IN ({}))",
        placeholders(1, values.len())
    );
    let args = values.iter().map(|v| Value::Text(v.to_lowercase())).collect();
    let (sql, args) = finish(sql, args, category, limit);
    run(conn, &sql, args, table)
}

pub fn query_by_descriptors(
    conn: &Connection,
    descriptors: &[String],
    category: Option<&str>,
    limit: usize,
) -> ConclaveResult<Vec<MemoryEntry>> {
    by_join(conn, "memory_descriptors", "descriptor", descriptors, category, limit)
}

pub fn query_by_tags(
    conn: &Connection,
    tags: &[String],
    category: Option<&str>,
    limit: usize,
) -> ConclaveResult<Vec<MemoryEntry>> {
    by_join(conn, "memory_tags", "tag", tags, category, limit)
}

/// Entries sharing at least one signature band with `bands`.
pub fn query_by_bands(
    conn: &Connection,
    bands: &[u16; SIGNATURE_BANDS],
    category: Option<&str>,
    limit: usize,
) -> ConclaveResult<Vec<MemoryEntry>> {
    if limit == 0 {
        return Ok(Vec::new());
    }
    let mut args = Vec::with_capacity(SIGNATURE_BANDS * 2);
    let mut clauses = Vec::with_capacity(SIGNATURE_BANDS);
    for (band, value) in bands.iter().enumerate() {
        args.push(Value::Integer(band as i64));
        args.push(Value::Integer(i64::from(*value)));
        clauses.push(format!("(b.band = ?{} AND b.value = ?{})", args.len() - 1, args.len()));
    }
    let sql = format!(
        "SELECT {ENTRY_COLUMNS} FROM memory_entries m
         WHERE m.id IN (SELECT b.memory_id FROM memory_bands b WHERE {})",
        clauses.join(" OR ")
    );
    let (sql, args) = finish(sql, args, category, limit);
    run(conn, &sql, args, "memory_bands")
}

pub fn query_recent(
    conn: &Connection,
    category: Option<&str>,
    limit: usize,
) -> ConclaveResult<Vec<MemoryEntry>> {
    if limit == 0 {
        return Ok(Vec::new());
    }
    let sql = format!("SELECT {ENTRY_COLUMNS} FROM memory_entries m WHERE 1 = 1");
    let (sql, args) = finish(sql, Vec::new(), category, limit);
    run(conn, &sql, args, "query_recent")
}
