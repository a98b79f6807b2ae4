use conclave_core::models::SessionStatus;
use conclave_observability::{
    DegradationEvent, DegradationTracker, MetricsSnapshot, OrchestrationMetrics, RecoveryStatus,
};

// ── Metrics ──────────────────────────────────────────────────────────────

#[test]
fn terminal_statuses_are_counted_separately() {
    let metrics = OrchestrationMetrics::new();
    metrics.session_started();
    metrics.session_started();
    metrics.session_finished(SessionStatus::Completed);
    metrics.session_finished(SessionStatus::PartiallyFailed);
    metrics.session_finished(SessionStatus::Running);

    let snap = metrics.snapshot();
    assert_eq!(snap.sessions_started, 2);
    assert_eq!(snap.sessions_completed, 1);
    assert_eq!(snap.sessions_partially_failed, 1);
    assert_eq!(snap.sessions_finished(), 2);
}

#[test]
fn counters_accumulate_across_threads() {
    let metrics = std::sync::Arc::new(OrchestrationMetrics::new());
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let m = metrics.clone();
            std::thread::spawn(move || {
                for _ in 0..250 {
                    m.dispatch();
                }
                m.memory_entries_written(3);
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    let snap = metrics.snapshot();
    assert_eq!(snap.dispatches, 1000);
    assert_eq!(snap.memory_entries_written, 12);
}

#[test]
fn snapshot_serializes_to_json() {
    let metrics = OrchestrationMetrics::new();
    metrics.rate_limit_signal();
    let json = serde_json::to_string(&metrics.snapshot()).unwrap();
    let back: MetricsSnapshot = serde_json::from_str(&json).unwrap();
    assert_eq!(back.rate_limit_signals, 1);
}

// ── Degradation ──────────────────────────────────────────────────────────

#[test]
fn degradation_lifecycle() {
    let mut tracker = DegradationTracker::new();
    tracker.record(DegradationEvent::new("retrieval", "store unavailable", "empty context"));
    tracker.record(DegradationEvent::new("retrieval", "store unavailable", "empty context"));
    tracker.record(DegradationEvent::new("session_store", "write failed", "none"));

    assert!(tracker.is_degraded("retrieval"));
    assert_eq!(tracker.count_recent("retrieval", 60), 2);
    assert!(tracker.degraded_duration("retrieval").is_some());

    assert_eq!(tracker.mark_recovered("retrieval"), 2);
    assert!(!tracker.is_degraded("retrieval"));
    assert_eq!(tracker.active_degradations().len(), 1);
    assert!(tracker.events()[0].recovered_at.is_some());
    assert_eq!(tracker.events()[0].recovery_status, RecoveryStatus::Recovered);
    assert!(tracker.degraded_duration("retrieval").is_none());
}

// ── Tracing ──────────────────────────────────────────────────────────────

#[test]
fn init_is_idempotent_and_spans_build() {
    conclave_observability::init_tracing_with_filter("debug");
    conclave_observability::init_tracing();
    let span = conclave_observability::dispatch_span!("s1", "t1", "security", "anthropic", 2u32);
    let _guard = span.enter();
    tracing::debug!("inside dispatch span");
}
