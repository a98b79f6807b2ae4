use serde::{Deserialize, Serialize};

use super::defaults;
use crate::models::RetrievalStrategyKind;

/// Per-strategy merge weights. Normalized at query time over the
/// strategies actually requested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyWeights {
    pub contextual: f64,
    pub similarity: f64,
    pub pattern: f64,
    pub content: f64,
}

impl StrategyWeights {
    /// Raw (un-normalized) weight for a strategy.
    pub fn weight(&self, kind: RetrievalStrategyKind) -> f64 {
        match kind {
            RetrievalStrategyKind::Contextual => self.contextual,
            RetrievalStrategyKind::Similarity => self.similarity,
            RetrievalStrategyKind::Pattern => self.pattern,
            RetrievalStrategyKind::Content => self.content,
        }
    }
}

impl Default for StrategyWeights {
    fn default() -> Self {
        Self {
            contextual: defaults::DEFAULT_CONTEXTUAL_WEIGHT,
            similarity: defaults::DEFAULT_SIMILARITY_WEIGHT,
            pattern: defaults::DEFAULT_PATTERN_WEIGHT,
            content: defaults::DEFAULT_CONTENT_WEIGHT,
        }
    }
}

/// Retrieval Coordinator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Entries returned per task when the caller does not specify a limit.
    pub default_limit: usize,
    /// Upper bound on candidates a single strategy may pull from the store.
    pub candidate_pool_size: usize,
    /// Merge weights per strategy.
    pub weights: StrategyWeights,
    /// Strategies used for task context when none are specified.
    pub default_strategies: Vec<RetrievalStrategyKind>,
    /// Minimum signature similarity for the similarity strategy.
    pub similarity_min: f64,
    /// How strongly the source agent's calibrated score scales relevance (0 = ignored).
    pub confidence_influence: f64,
    /// Entries below this relevance are dropped.
    pub min_relevance: f64,
    /// Attempts against an unavailable store before degrading to an empty bundle.
    pub store_retry_attempts: u32,
    /// Fixed delay between store attempts.
    pub store_retry_delay_ms: u64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            default_limit: defaults::DEFAULT_RETRIEVAL_LIMIT,
            candidate_pool_size: defaults::DEFAULT_CANDIDATE_POOL_SIZE,
            weights: StrategyWeights::default(),
            default_strategies: RetrievalStrategyKind::ALL.to_vec(),
            similarity_min: defaults::DEFAULT_SIMILARITY_MIN,
            confidence_influence: defaults::DEFAULT_CONFIDENCE_INFLUENCE,
            min_relevance: defaults::DEFAULT_MIN_RELEVANCE,
            store_retry_attempts: defaults::DEFAULT_STORE_RETRY_ATTEMPTS,
            store_retry_delay_ms: defaults::DEFAULT_STORE_RETRY_DELAY_MS,
        }
    }
}
