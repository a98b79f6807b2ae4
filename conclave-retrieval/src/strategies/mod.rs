//! The four combinable retrieval strategies.
//!
//! Each strategy turns a [`RetrievalContext`] into an indexed store lookup and
//! scores what comes back. Scores are in `[0, 1]`; zero means "not a match".

mod contextual;
mod content;
mod pattern;
mod similarity;

pub use content::ContentStrategy;
pub use contextual::ContextualStrategy;
pub use pattern::PatternStrategy;
pub use similarity::SimilarityStrategy;

use std::collections::HashMap;

use conclave_core::config::RetrievalConfig;
use conclave_core::errors::ConclaveResult;
use conclave_core::models::{MemoryEntry, RetrievalContext, RetrievalStrategyKind};
use conclave_core::traits::{IMemoryStore, StrategyParams};

/// A single retrieval strategy.
pub trait RetrievalStrategy: Send + Sync {
    fn kind(&self) -> RetrievalStrategyKind;

    /// Store lookup for this context, or `None` when the context carries
    /// nothing this strategy can match on.
    fn params(&self, context: &RetrievalContext, pool_size: usize) -> Option<StrategyParams>;

    /// Score one candidate against the context.
    fn score(&self, context: &RetrievalContext, entry: &MemoryEntry) -> f64;
}

/// Build the strategy implementation for a kind.
pub fn for_kind(kind: RetrievalStrategyKind, config: &RetrievalConfig) -> Box<dyn RetrievalStrategy> {
    match kind {
        RetrievalStrategyKind::Contextual => Box::new(ContextualStrategy),
        RetrievalStrategyKind::Similarity => Box::new(SimilarityStrategy::new(config.similarity_min)),
        RetrievalStrategyKind::Pattern => Box::new(PatternStrategy),
        RetrievalStrategyKind::Content => Box::new(ContentStrategy),
    }
}

/// Scored candidates from one strategy, keyed by entry id.
pub type ScoredCandidates = HashMap<String, (MemoryEntry, f64)>;

/// Run one strategy over every category of interest (or all categories).
///
/// Each category is an indexed lookup; a full scan never happens.
pub fn gather(
    strategy: &dyn RetrievalStrategy,
    store: &dyn IMemoryStore,
    context: &RetrievalContext,
    pool_size: usize,
) -> ConclaveResult<ScoredCandidates> {
    let mut out = ScoredCandidates::new();
    let Some(params) = strategy.params(context, pool_size) else {
        return Ok(out);
    };

    let categories: Vec<Option<&str>> = if context.categories.is_empty() {
        vec![None]
    } else {
        context.categories.iter().map(|c| Some(c.as_str())).collect()
    };

    for category in categories {
        for entry in store.query(category, &params)? {
            let score = strategy.score(context, &entry);
            if score <= 0.0 {
                continue;
            }
            match out.get_mut(&entry.id) {
                Some(existing) if existing.1 >= score => {}
                Some(existing) => existing.1 = score,
                None => {
                    out.insert(entry.id.clone(), (entry, score));
                }
            }
        }
    }
    Ok(out)
}

/// Lowercased, deduplicated list, order preserved.
pub(crate) fn unique_lower(values: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    values
        .iter()
        .map(|v| v.trim().to_lowercase())
        .filter(|v| !v.is_empty() && seen.insert(v.clone()))
        .collect()
}

/// Fraction of `wanted` present in `have`, case-insensitive.
pub(crate) fn coverage(wanted: &[String], have: &[String]) -> f64 {
    if wanted.is_empty() {
        return 0.0;
    }
    let have: std::collections::HashSet<String> = have.iter().map(|h| h.to_lowercase()).collect();
    let hits = wanted.iter().filter(|w| have.contains(w.as_str())).count();
    hits as f64 / wanted.len() as f64
}
