use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{SessionStatus, TaskStatus};

/// The transition a progress event reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "status", rename_all = "snake_case")]
pub enum StatusChange {
    Session(SessionStatus),
    Task(TaskStatus),
}

impl StatusChange {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusChange::Session(s) => s.as_str(),
            StatusChange::Task(s) => s.as_str(),
        }
    }
}

/// A status change published to session observers.
///
/// Delivery is at-least-once; observers dedupe on [`ProgressEvent::dedup_key`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub session_id: String,
    /// `None` for session-level transitions.
    pub task_id: Option<String>,
    pub agent_name: Option<String>,
    pub change: StatusChange,
    /// Task attempt count at the time of the event.
    pub attempt: u32,
    /// Per-session sequence number, strictly increasing across live events.
    pub seq: u64,
    pub timestamp: DateTime<Utc>,
}

impl ProgressEvent {
    /// Identity for idempotent display: (session, task, status).
    pub fn dedup_key(&self) -> (String, Option<String>, &'static str) {
        (
            self.session_id.clone(),
            self.task_id.clone(),
            self.change.as_str(),
        )
    }

    /// Whether this event ends the session's progress stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self.change, StatusChange::Session(s) if s.is_terminal())
    }
}
