use std::sync::Arc;

use conclave_core::config::RetrievalConfig;
use conclave_core::models::{MemoryEntry, RetrievalContext, RetrievalStrategyKind};
use conclave_core::traits::IMemoryStore;
use conclave_retrieval::RetrievalCoordinator;
use conclave_storage::StorageEngine;
use proptest::prelude::*;

const TAGS: [&str; 5] = ["sql", "auth", "xss", "lock", "alloc"];
const CATEGORIES: [&str; 3] = ["injection", "auth", "perf"];

fn entry_strategy() -> impl Strategy<Value = (usize, usize, usize, String)> {
    (0..CATEGORIES.len(), 0..TAGS.len(), 0..TAGS.len(), "[a-z]{3,8}( [a-z]{3,8}){1,5}")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn ranking_is_bounded_sorted_and_repeatable(
        entries in prop::collection::vec(entry_strategy(), 0..40),
        tag in 0..TAGS.len(),
        text in "[a-z]{3,8}( [a-z]{3,8}){0,5}",
        limit in 1usize..15,
    ) {
        let store = Arc::new(StorageEngine::open_in_memory().unwrap());
        for (cat, t1, t2, payload) in &entries {
            let entry = MemoryEntry::new(CATEGORIES[*cat], payload.as_str(), "s", "a")
                .with_tags([TAGS[*t1], TAGS[*t2]]);
            store.put(&entry).unwrap();
        }

        let coordinator = RetrievalCoordinator::new(store, RetrievalConfig::default());
        let ctx = RetrievalContext {
            tags: vec![TAGS[tag].to_string()],
            text,
            ..Default::default()
        };
        let first = coordinator.retrieve(&ctx, &RetrievalStrategyKind::ALL, limit).unwrap();
        let second = coordinator.retrieve(&ctx, &RetrievalStrategyKind::ALL, limit).unwrap();

        prop_assert!(first.len() <= limit);
        prop_assert_eq!(first.ids(), second.ids());
        for pair in first.entries.windows(2) {
            prop_assert!(pair[0].relevance >= pair[1].relevance);
        }
        for scored in &first.entries {
            prop_assert!(scored.relevance > 0.0 && scored.relevance <= 1.0 + 1e-9);
        }
        let mut ids = first.ids();
        ids.sort();
        ids.dedup();
        prop_assert_eq!(ids.len(), first.len());
    }
}
