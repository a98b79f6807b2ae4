//! Progress summaries computed from a snapshot.

use serde::{Deserialize, Serialize};

use conclave_core::models::{SessionSnapshot, SessionStatus, TaskStatus};

/// Task counts by status and completion fraction for one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressSummary {
    pub session_id: String,
    pub status: SessionStatus,
    pub total: usize,
    pub queued: usize,
    pub in_flight: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    /// Dispatch attempts across all tasks.
    pub attempts: u32,
    /// Terminal tasks over total, 1.0 for a session with no tasks.
    pub completion: f64,
}

impl ProgressSummary {
    pub fn from_snapshot(snapshot: &SessionSnapshot) -> Self {
        let mut summary = Self {
            session_id: snapshot.session.id.clone(),
            status: snapshot.session.status,
            total: snapshot.tasks.len(),
            queued: 0,
            in_flight: 0,
            succeeded: 0,
            failed: 0,
            skipped: 0,
            attempts: 0,
            completion: 1.0,
        };
        for task in &snapshot.tasks {
            summary.attempts += task.attempt_count;
            match task.status {
                TaskStatus::Queued => summary.queued += 1,
                TaskStatus::Dispatched | TaskStatus::Retrying => summary.in_flight += 1,
                TaskStatus::Succeeded => summary.succeeded += 1,
                TaskStatus::Failed => summary.failed += 1,
                TaskStatus::Skipped => summary.skipped += 1,
            }
        }
        if summary.total > 0 {
            let terminal = summary.succeeded + summary.failed + summary.skipped;
            summary.completion = terminal as f64 / summary.total as f64;
        }
        summary
    }
}
