//! Retrieval Coordinator against the SQLite memory store and failing doubles.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;

use conclave_core::config::RetrievalConfig;
use conclave_core::errors::ErrorClass;
use conclave_core::models::{FeedbackLabel, MemoryEntry, RetrievalContext, RetrievalStrategyKind};
use conclave_core::traits::{IConfidenceScorer, IMemoryStore};
use conclave_retrieval::RetrievalCoordinator;
use conclave_storage::StorageEngine;
use test_fixtures::UnavailableMemoryStore;

use RetrievalStrategyKind::{Contextual, Content, Pattern, Similarity};

fn store() -> Arc<StorageEngine> {
    Arc::new(StorageEngine::open_in_memory().unwrap())
}

fn tagged(category: &str, payload: &str, agent: &str, tags: &[&str]) -> MemoryEntry {
    MemoryEntry::new(category, payload, "s-prev", agent).with_tags(tags.iter().copied())
}

fn tag_context(category: &str, tags: &[&str]) -> RetrievalContext {
    RetrievalContext {
        categories: vec![category.to_string()],
        tags: tags.iter().map(|t| t.to_string()).collect(),
        ..Default::default()
    }
}

struct FixedScorer(HashMap<String, f64>);

impl IConfidenceScorer for FixedScorer {
    fn score(&self, agent_name: &str, _category: &str) -> f64 {
        self.0.get(agent_name).copied().unwrap_or(0.5)
    }
}

// ── Golden ───────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct GoldenEntry {
    category: String,
    payload: String,
    tags: Vec<String>,
    descriptors: Vec<String>,
}

#[derive(Deserialize)]
struct GoldenCase {
    entries: Vec<GoldenEntry>,
    context: RetrievalContext,
    strategies: Vec<RetrievalStrategyKind>,
    limit: usize,
    expected_order: Vec<String>,
}

#[test]
fn golden_ranking_basic() {
    let case: GoldenCase = test_fixtures::load_fixture("retrieval/ranking_basic.json");
    let store = store();
    for e in &case.entries {
        let entry = MemoryEntry::new(&e.category, &e.payload, "golden", "agent")
            .with_tags(e.tags.clone())
            .with_descriptors(e.descriptors.clone());
        store.put(&entry).unwrap();
    }

    let coordinator = RetrievalCoordinator::new(store, RetrievalConfig::default());
    let result = coordinator
        .retrieve(&case.context, &case.strategies, case.limit)
        .unwrap();
    let payloads: Vec<_> = result.entries.iter().map(|e| e.entry.payload.clone()).collect();
    assert_eq!(payloads, case.expected_order);
    assert!(!result.degraded);
}

// ── Strategies ───────────────────────────────────────────────────────────

#[test]
fn similarity_ranks_near_duplicate_first() {
    let store = store();
    let text = "user input concatenated into sql query string without escaping";
    store.put(&MemoryEntry::new("injection", text, "s", "a")).unwrap();
    store
        .put(&MemoryEntry::new("perf", "cache eviction takes the wrong lock", "s", "a"))
        .unwrap();

    let coordinator = RetrievalCoordinator::new(store, RetrievalConfig::default());
    let ctx = RetrievalContext {
        text: text.to_string(),
        ..Default::default()
    };
    let result = coordinator.retrieve(&ctx, &[Similarity], 5).unwrap();
    assert_eq!(result.entries[0].entry.payload, text);
    assert!((result.entries[0].relevance - 1.0).abs() < 1e-9);
}

#[test]
fn content_ranks_by_token_overlap() {
    let store = store();
    store
        .put(&MemoryEntry::new("injection", "sql query built with string formatting", "s", "a"))
        .unwrap();
    store
        .put(&MemoryEntry::new("injection", "shell command built from user input", "s", "a"))
        .unwrap();

    let coordinator = RetrievalCoordinator::new(store, RetrievalConfig::default());
    let ctx = RetrievalContext {
        text: "format sql query with user input".to_string(),
        ..Default::default()
    };
    let result = coordinator.retrieve(&ctx, &[Content], 5).unwrap();
    let payloads: Vec<_> = result.entries.iter().map(|e| e.entry.payload.as_str()).collect();
    assert_eq!(
        payloads,
        vec!["sql query built with string formatting", "shell command built from user input"]
    );
}

#[test]
fn empty_context_yields_empty_result() {
    let coordinator = RetrievalCoordinator::new(store(), RetrievalConfig::default());
    let result = coordinator
        .retrieve(&RetrievalContext::default(), &RetrievalStrategyKind::ALL, 10)
        .unwrap();
    assert!(result.is_empty());
    assert_eq!(result.strategies.len(), 4);
}

// ── Merge and weighting ──────────────────────────────────────────────────

#[test]
fn duplicate_candidates_across_strategies_merge() {
    let store = store();
    let entry = tagged("injection", "raw sql in handler", "a", &["sql"]).with_descriptors(["rust"]);
    store.put(&entry).unwrap();

    let coordinator = RetrievalCoordinator::new(store, RetrievalConfig::default());
    let ctx = RetrievalContext {
        descriptors: vec!["rust".into()],
        ..tag_context("injection", &["sql"])
    };
    let result = coordinator.retrieve(&ctx, &[Contextual, Pattern, Pattern], 10).unwrap();
    assert_eq!(result.len(), 1);
    assert_eq!(result.strategies, vec![Contextual, Pattern]);
    assert_eq!(result.entries[0].strategy_scores.len(), 2);
    assert!((result.entries[0].relevance - 1.0).abs() < 1e-9);
}

#[test]
fn incorrect_feedback_demotes_entry() {
    let store = store();
    let good = tagged("injection", "first pattern", "a", &["sql"]);
    let bad = tagged("injection", "second pattern", "a", &["sql"]);
    store.put(&good).unwrap();
    store.put(&bad).unwrap();
    store.update_feedback(&bad.id, FeedbackLabel::Incorrect, 0.25).unwrap();

    let coordinator = RetrievalCoordinator::new(store, RetrievalConfig::default());
    let result = coordinator
        .retrieve(&tag_context("injection", &["sql"]), &[Pattern], 10)
        .unwrap();
    assert_eq!(result.ids(), vec![good.id.as_str(), bad.id.as_str()]);
    assert!((result.entries[1].relevance - 0.25).abs() < 1e-9);
}

#[test]
fn source_agent_confidence_scales_relevance() {
    let store = store();
    let noisy = tagged("injection", "from noisy agent", "noisy", &["sql"]);
    let trusted = tagged("injection", "from trusted agent", "trusted", &["sql"]);
    store.put(&noisy).unwrap();
    store.put(&trusted).unwrap();

    let scorer = FixedScorer(HashMap::from([
        ("trusted".to_string(), 0.9),
        ("noisy".to_string(), 0.1),
    ]));
    let coordinator =
        RetrievalCoordinator::new(store, RetrievalConfig::default()).with_scorer(Arc::new(scorer));
    let result = coordinator
        .retrieve(&tag_context("injection", &["sql"]), &[Pattern], 10)
        .unwrap();
    assert_eq!(result.ids(), vec![trusted.id.as_str(), noisy.id.as_str()]);
    assert!((result.entries[0].relevance - 0.95).abs() < 1e-9);
    assert!((result.entries[1].relevance - 0.55).abs() < 1e-9);
}

#[test]
fn min_relevance_filters_weak_matches() {
    let store = store();
    let strong = tagged("injection", "both tags", "a", &["sql", "raw"]);
    let weak = tagged("injection", "one tag", "a", &["sql"]);
    store.put(&strong).unwrap();
    store.put(&weak).unwrap();

    let config = RetrievalConfig {
        min_relevance: 0.75,
        ..Default::default()
    };
    let coordinator = RetrievalCoordinator::new(store, config);
    let result = coordinator
        .retrieve(&tag_context("injection", &["sql", "raw"]), &[Pattern], 10)
        .unwrap();
    assert_eq!(result.ids(), vec![strong.id.as_str()]);
}

#[test]
fn limit_bounds_result_and_repeated_calls_agree() {
    let store = store();
    for i in 0..20 {
        store
            .put(&tagged("injection", &format!("pattern number {i}"), "a", &["sql"]))
            .unwrap();
    }
    let coordinator = RetrievalCoordinator::new(store, RetrievalConfig::default());
    let ctx = tag_context("injection", &["sql"]);
    let first = coordinator.retrieve(&ctx, &RetrievalStrategyKind::ALL, 7).unwrap();
    let second = coordinator.retrieve(&ctx, &RetrievalStrategyKind::ALL, 7).unwrap();
    assert_eq!(first.len(), 7);
    assert_eq!(first.ids(), second.ids());
}

// ── Errors and degradation ───────────────────────────────────────────────

#[test]
fn invalid_arguments_are_rejected() {
    let coordinator = RetrievalCoordinator::new(store(), RetrievalConfig::default());
    let ctx = tag_context("injection", &["sql"]);

    let zero = coordinator.retrieve(&ctx, &[Pattern], 0).unwrap_err();
    assert_eq!(zero.class(), ErrorClass::InvalidInput);
    assert!(coordinator.retrieve(&ctx, &[Pattern], 10_000).is_err());

    let none = coordinator.retrieve(&ctx, &[], 5).unwrap_err();
    assert_eq!(none.class(), ErrorClass::InvalidInput);
}

#[test]
fn unavailable_store_fails_strict_retrieval() {
    let coordinator =
        RetrievalCoordinator::new(Arc::new(UnavailableMemoryStore::new()), RetrievalConfig::default());
    let err = coordinator
        .retrieve(&tag_context("injection", &["sql"]), &[Pattern], 5)
        .unwrap_err();
    assert!(err.is_store_unavailable());
}

#[test]
fn unavailable_store_degrades_after_fixed_retries() {
    let store = Arc::new(UnavailableMemoryStore::new());
    let config = RetrievalConfig {
        store_retry_attempts: 3,
        store_retry_delay_ms: 1,
        ..Default::default()
    };
    let coordinator = RetrievalCoordinator::new(store.clone(), config);
    let result = coordinator
        .retrieve_or_degrade(&tag_context("injection", &["sql"]), &[Pattern], 5)
        .unwrap();
    assert!(result.degraded);
    assert!(result.is_empty());
    assert_eq!(store.calls(), 3);
}

#[test]
fn degrade_still_rejects_bad_arguments() {
    let coordinator =
        RetrievalCoordinator::new(Arc::new(UnavailableMemoryStore::new()), RetrievalConfig::default());
    assert!(coordinator
        .retrieve_or_degrade(&tag_context("x", &["y"]), &[Pattern], 0)
        .is_err());
}
