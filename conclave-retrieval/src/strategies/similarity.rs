use conclave_core::fingerprint;
use conclave_core::models::{MemoryEntry, RetrievalContext, RetrievalStrategyKind};
use conclave_core::traits::StrategyParams;

use super::RetrievalStrategy;

/// Signature nearest neighbours: candidates share at least one LSH band,
/// then are scored by Hamming similarity of the full signature.
pub struct SimilarityStrategy {
    min_similarity: f64,
}

impl SimilarityStrategy {
    pub fn new(min_similarity: f64) -> Self {
        Self { min_similarity }
    }
}

impl RetrievalStrategy for SimilarityStrategy {
    fn kind(&self) -> RetrievalStrategyKind {
        RetrievalStrategyKind::Similarity
    }

    fn params(&self, context: &RetrievalContext, pool_size: usize) -> Option<StrategyParams> {
        let signature = fingerprint::signature(&context.text);
        if signature == 0 {
            return None;
        }
        Some(StrategyParams::SignatureBands {
            bands: fingerprint::bands(signature),
            limit: pool_size,
        })
    }

    fn score(&self, context: &RetrievalContext, entry: &MemoryEntry) -> f64 {
        let similarity =
            fingerprint::hamming_similarity(fingerprint::signature(&context.text), entry.signature);
        if similarity < self.min_similarity {
            0.0
        } else {
            similarity
        }
    }
}
