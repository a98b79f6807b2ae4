//! Weighted-sum merge of per-strategy candidate lists.
//!
//! relevance = Σ wᵢ·sᵢ × reliability × accuracy_weight, where the weights are
//! normalized over the strategies requested in the call.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use conclave_core::config::StrategyWeights;
use conclave_core::models::{MemoryEntry, RetrievalStrategyKind, ScoredEntry};

/// An entry found by at least one strategy, with each strategy's raw score.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub entry: MemoryEntry,
    pub scores: BTreeMap<RetrievalStrategyKind, f64>,
}

/// Weights for `kinds` rescaled to sum to 1.
///
/// Negative weights count as zero. If every requested weight is zero the
/// strategies are weighted equally.
pub fn normalized_weights(
    weights: &StrategyWeights,
    kinds: &[RetrievalStrategyKind],
) -> BTreeMap<RetrievalStrategyKind, f64> {
    let raw: BTreeMap<RetrievalStrategyKind, f64> = kinds
        .iter()
        .map(|k| (*k, weights.weight(*k).max(0.0)))
        .collect();
    let total: f64 = raw.values().sum();
    if raw.is_empty() {
        return raw;
    }
    if total <= 0.0 || !total.is_finite() {
        let equal = 1.0 / raw.len() as f64;
        return raw.into_keys().map(|k| (k, equal)).collect();
    }
    raw.into_iter().map(|(k, w)| (k, w / total)).collect()
}

/// Merge candidates into a ranked list of at most `limit` entries.
///
/// Ties on relevance break on entry id so the order is total and repeatable.
pub fn fuse<F>(
    candidates: HashMap<String, Candidate>,
    weights: &BTreeMap<RetrievalStrategyKind, f64>,
    reliability: F,
    min_relevance: f64,
    limit: usize,
) -> Vec<ScoredEntry>
where
    F: Fn(&MemoryEntry) -> f64,
{
    let mut ranked: Vec<ScoredEntry> = candidates
        .into_values()
        .filter_map(|candidate| {
            let combined: f64 = candidate
                .scores
                .iter()
                .map(|(kind, score)| weights.get(kind).copied().unwrap_or(0.0) * score)
                .sum();
            let relevance = combined
                * reliability(&candidate.entry).clamp(0.0, 1.0)
                * candidate.entry.accuracy_weight.max(0.0);
            (relevance > 0.0 && relevance >= min_relevance).then_some(ScoredEntry {
                entry: candidate.entry,
                relevance,
                strategy_scores: candidate.scores,
            })
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.relevance
            .partial_cmp(&a.relevance)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.entry.id.cmp(&b.entry.id))
    });
    ranked.truncate(limit);
    ranked
}
