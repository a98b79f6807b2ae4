//! Lock-free orchestration counters.
//!
//! [`OrchestrationMetrics`] is shared by every task of an orchestrator and
//! read through a serializable [`MetricsSnapshot`].

use std::sync::atomic::{AtomicU64, Ordering};

use conclave_core::models::SessionStatus;
use serde::{Deserialize, Serialize};

#[derive(Debug, Default)]
pub struct OrchestrationMetrics {
    sessions_started: AtomicU64,
    sessions_completed: AtomicU64,
    sessions_partially_failed: AtomicU64,
    sessions_failed: AtomicU64,
    sessions_cancelled: AtomicU64,
    dispatches: AtomicU64,
    dispatch_failures: AtomicU64,
    retries: AtomicU64,
    rate_limit_signals: AtomicU64,
    degraded_retrievals: AtomicU64,
    state_write_retries: AtomicU64,
    memory_entries_written: AtomicU64,
    feedback_received: AtomicU64,
}

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub sessions_started: u64,
    pub sessions_completed: u64,
    pub sessions_partially_failed: u64,
    pub sessions_failed: u64,
    pub sessions_cancelled: u64,
    pub dispatches: u64,
    pub dispatch_failures: u64,
    pub retries: u64,
    pub rate_limit_signals: u64,
    pub degraded_retrievals: u64,
    pub state_write_retries: u64,
    pub memory_entries_written: u64,
    pub feedback_received: u64,
}

impl MetricsSnapshot {
    /// Sessions that reached any terminal status.
    pub fn sessions_finished(&self) -> u64 {
        self.sessions_completed
            + self.sessions_partially_failed
            + self.sessions_failed
            + self.sessions_cancelled
    }
}

fn bump(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

impl OrchestrationMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session_started(&self) {
        bump(&self.sessions_started);
    }

    /// Count a session under its terminal status. Non-terminal statuses are ignored.
    pub fn session_finished(&self, status: SessionStatus) {
        match status {
            SessionStatus::Completed => bump(&self.sessions_completed),
            SessionStatus::PartiallyFailed => bump(&self.sessions_partially_failed),
            SessionStatus::Failed => bump(&self.sessions_failed),
            SessionStatus::Cancelled => bump(&self.sessions_cancelled),
            SessionStatus::Created | SessionStatus::Running => {}
        }
    }

    pub fn dispatch(&self) {
        bump(&self.dispatches);
    }

    pub fn dispatch_failure(&self) {
        bump(&self.dispatch_failures);
    }

    pub fn retry(&self) {
        bump(&self.retries);
    }

    pub fn rate_limit_signal(&self) {
        bump(&self.rate_limit_signals);
    }

    pub fn degraded_retrieval(&self) {
        bump(&self.degraded_retrievals);
    }

    pub fn state_write_retry(&self) {
        bump(&self.state_write_retries);
    }

    pub fn memory_entries_written(&self, count: u64) {
        self.memory_entries_written.fetch_add(count, Ordering::Relaxed);
    }

    pub fn feedback(&self) {
        bump(&self.feedback_received);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        MetricsSnapshot {
            sessions_started: load(&self.sessions_started),
            sessions_completed: load(&self.sessions_completed),
            sessions_partially_failed: load(&self.sessions_partially_failed),
            sessions_failed: load(&self.sessions_failed),
            sessions_cancelled: load(&self.sessions_cancelled),
            dispatches: load(&self.dispatches),
            dispatch_failures: load(&self.dispatch_failures),
            retries: load(&self.retries),
            rate_limit_signals: load(&self.rate_limit_signals),
            degraded_retrievals: load(&self.degraded_retrievals),
            state_write_retries: load(&self.state_write_retries),
            memory_entries_written: load(&self.memory_entries_written),
            feedback_received: load(&self.feedback_received),
        }
    }
}
