//! FTS5 full-text search over payloads.

use rusqlite::{params, Connection};

use conclave_core::errors::ConclaveResult;
use conclave_core::models::MemoryEntry;

use super::memory_crud::{row_to_entry, ENTRY_COLUMNS};
use crate::sqlite_err;

/// Build an FTS5 OR-query from plain terms. Each term is quoted so FTS
/// operators in user text are treated literally.
fn match_expression(terms: &[String]) -> Option<String> {
    let quoted: Vec<String> = terms
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .map(|t| format!("\"{}\"", t.replace('"', "\"\"")))
        .collect();
    if quoted.is_empty() {
        None
    } else {
        Some(quoted.join(" OR "))
    }
}

/// Entries whose payload matches any of `terms`, best FTS rank first.
pub fn search_terms(
    conn: &Connection,
    terms: &[String],
    category: Option<&str>,
    limit: usize,
) -> ConclaveResult<Vec<MemoryEntry>> {
    let Some(expr) = match_expression(terms) else {
        return Ok(Vec::new());
    };
    if limit == 0 {
        return Ok(Vec::new());
    }

    let sql = format!(
        "SELECT {ENTRY_COLUMNS} FROM memory_fts
         JOIN memory_entries m ON m.rowid = memory_fts.rowid
         WHERE memory_fts MATCH ?1 AND (?2 IS NULL OR m.category = ?2)
         ORDER BY rank, m.id
         LIMIT ?3"
    );
    let mut stmt = conn.prepare(&sql).map_err(|e| sqlite_err("search_terms", e))?;
    let rows = stmt
        .query_map(params![expr, category, limit as i64], row_to_entry)
        .map_err(|e| sqlite_err("search_terms", e))?;
    rows.collect::<Result<Vec<_>, _>>()
        .map_err(|e| sqlite_err("search_terms", e))
}

#[cfg(test)]
mod tests {
    use super::match_expression;

    #[test]
    fn quotes_terms_and_skips_blanks() {
        let terms = vec!["sql".to_string(), " ".to_string(), "a\"b".to_string()];
        assert_eq!(
            match_expression(&terms).as_deref(),
            Some("\"sql\" OR \"a\"\"b\"")
        );
        assert!(match_expression(&[]).is_none());
    }
}
