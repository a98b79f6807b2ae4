use conclave_core::models::{FeedbackLabel, MemoryEntry};
use conclave_core::traits::{IMemoryStore, StrategyParams};
use conclave_storage::StorageEngine;
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn repeated_puts_never_change_payload(
        payload in "[a-z]{3,10}( [a-z]{3,10}){0,6}",
        labels in prop::collection::vec(any::<bool>(), 1..6),
    ) {
        let store = StorageEngine::open_in_memory().unwrap();
        let original = MemoryEntry::new("cat", payload.clone(), "s0", "a0");
        store.put(&original).unwrap();

        for (i, correct) in labels.iter().enumerate() {
            let label = if *correct { FeedbackLabel::Correct } else { FeedbackLabel::Incorrect };
            let dup = MemoryEntry::new("cat", payload.to_uppercase(), format!("s{}", i + 1), "a1")
                .with_feedback(label, i as f64 / 10.0);
            let outcome = store.put(&dup).unwrap();
            prop_assert_eq!(outcome.id(), original.id.as_str());
        }

        let stored = store.get(&original.id).unwrap().unwrap();
        prop_assert_eq!(stored.payload, original.payload);
        prop_assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn recent_query_is_stable(n in 1usize..12, limit in 1usize..8) {
        let store = StorageEngine::open_in_memory().unwrap();
        for i in 0..n {
            store.put(&MemoryEntry::new("cat", format!("payload number {i}"), "s", "a")).unwrap();
        }
        let params = StrategyParams::Recent { limit };
        let first = store.query(Some("cat"), &params).unwrap();
        let second = store.query(Some("cat"), &params).unwrap();
        prop_assert_eq!(first.len(), n.min(limit));
        prop_assert_eq!(
            first.iter().map(|e| e.id.clone()).collect::<Vec<_>>(),
            second.iter().map(|e| e.id.clone()).collect::<Vec<_>>()
        );
    }
}
