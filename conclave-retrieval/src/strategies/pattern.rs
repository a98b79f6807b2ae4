use conclave_core::models::{MemoryEntry, RetrievalContext, RetrievalStrategyKind};
use conclave_core::traits::StrategyParams;

use super::{coverage, unique_lower, RetrievalStrategy};

/// Exact category + tag match.
///
/// With tags, an entry scores the fraction of context tags it carries. Without
/// tags, every entry of a requested category is an exact match.
pub struct PatternStrategy;

impl RetrievalStrategy for PatternStrategy {
    fn kind(&self) -> RetrievalStrategyKind {
        RetrievalStrategyKind::Pattern
    }

    fn params(&self, context: &RetrievalContext, pool_size: usize) -> Option<StrategyParams> {
        let values = unique_lower(&context.tags);
        if !values.is_empty() {
            return Some(StrategyParams::Tags {
                values,
                limit: pool_size,
            });
        }
        if context.categories.is_empty() {
            return None;
        }
        Some(StrategyParams::Recent { limit: pool_size })
    }

    fn score(&self, context: &RetrievalContext, entry: &MemoryEntry) -> f64 {
        if !context.categories.is_empty() && !context.categories.contains(&entry.category) {
            return 0.0;
        }
        let tags = unique_lower(&context.tags);
        if tags.is_empty() {
            1.0
        } else {
            coverage(&tags, &entry.tags)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_only_context_matches_whole_category() {
        let ctx = RetrievalContext {
            categories: vec!["injection".into()],
            ..Default::default()
        };
        assert!(matches!(
            PatternStrategy.params(&ctx, 5),
            Some(StrategyParams::Recent { limit: 5 })
        ));
        let hit = MemoryEntry::new("injection", "p", "s", "a");
        let miss = MemoryEntry::new("auth", "p", "s", "a");
        assert_eq!(PatternStrategy.score(&ctx, &hit), 1.0);
        assert_eq!(PatternStrategy.score(&ctx, &miss), 0.0);
    }
}
