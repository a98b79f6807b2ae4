use std::collections::HashSet;

use conclave_core::fingerprint;
use conclave_core::models::{MemoryEntry, RetrievalContext, RetrievalStrategyKind};
use conclave_core::traits::StrategyParams;

use super::RetrievalStrategy;

/// Upper bound on search terms derived from the context text.
const MAX_TERMS: usize = 32;
/// Shorter tokens are too common to be useful search terms.
const MIN_TERM_LEN: usize = 3;

/// Token overlap between the artifact text and entry payloads.
pub struct ContentStrategy;

fn terms(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    fingerprint::tokenize(text)
        .into_iter()
        .filter(|t| t.len() >= MIN_TERM_LEN && seen.insert(t.clone()))
        .take(MAX_TERMS)
        .collect()
}

impl RetrievalStrategy for ContentStrategy {
    fn kind(&self) -> RetrievalStrategyKind {
        RetrievalStrategyKind::Content
    }

    fn params(&self, context: &RetrievalContext, pool_size: usize) -> Option<StrategyParams> {
        let terms = terms(&context.text);
        if terms.is_empty() {
            return None;
        }
        Some(StrategyParams::Terms {
            terms,
            limit: pool_size,
        })
    }

    /// Share of the payload's tokens that also occur in the context text.
    fn score(&self, context: &RetrievalContext, entry: &MemoryEntry) -> f64 {
        let payload: HashSet<String> = fingerprint::tokenize(&entry.payload).into_iter().collect();
        if payload.is_empty() {
            return 0.0;
        }
        let text: HashSet<String> = fingerprint::tokenize(&context.text).into_iter().collect();
        payload.intersection(&text).count() as f64 / payload.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terms_are_unique_and_skip_short_tokens() {
        assert_eq!(terms("a db query QUERY of users"), vec!["query", "users"]);
    }

    #[test]
    fn payload_fully_contained_scores_one() {
        let ctx = RetrievalContext {
            text: "let q = format!(\"select * from users where id = {}\", id)".into(),
            ..Default::default()
        };
        let entry = MemoryEntry::new("injection", "select from users", "s", "a");
        assert_eq!(ContentStrategy.score(&ctx, &entry), 1.0);
    }
}
