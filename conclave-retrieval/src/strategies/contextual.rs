use conclave_core::models::{MemoryEntry, RetrievalContext, RetrievalStrategyKind};
use conclave_core::traits::StrategyParams;

use super::{coverage, unique_lower, RetrievalStrategy};

/// Match on structural descriptors of the current artifact
/// (language, framework, module kind and the like).
pub struct ContextualStrategy;

impl RetrievalStrategy for ContextualStrategy {
    fn kind(&self) -> RetrievalStrategyKind {
        RetrievalStrategyKind::Contextual
    }

    fn params(&self, context: &RetrievalContext, pool_size: usize) -> Option<StrategyParams> {
        let values = unique_lower(&context.descriptors);
        if values.is_empty() {
            return None;
        }
        Some(StrategyParams::Descriptors {
            values,
            limit: pool_size,
        })
    }

    fn score(&self, context: &RetrievalContext, entry: &MemoryEntry) -> f64 {
        coverage(&unique_lower(&context.descriptors), &entry.descriptors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scores_fraction_of_context_descriptors() {
        let ctx = RetrievalContext {
            descriptors: vec!["Rust".into(), "axum".into()],
            ..Default::default()
        };
        let entry = MemoryEntry::new("auth", "p", "s", "a").with_descriptors(["rust"]);
        assert!((ContextualStrategy.score(&ctx, &entry) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn no_descriptors_means_no_lookup() {
        assert!(ContextualStrategy.params(&RetrievalContext::default(), 10).is_none());
    }
}
