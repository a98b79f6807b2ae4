use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{AgentTask, ExecutionStrategy, InputDescriptor};

/// Session lifecycle.
///
/// `created → running → {completed | partially_failed | failed}`, with
/// `cancelled` reachable from `created` or `running`, and `created → failed`
/// for fatal preconditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Created,
    Running,
    PartiallyFailed,
    Completed,
    Failed,
    Cancelled,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Created => "created",
            SessionStatus::Running => "running",
            SessionStatus::PartiallyFailed => "partially_failed",
            SessionStatus::Completed => "completed",
            SessionStatus::Failed => "failed",
            SessionStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionStatus::PartiallyFailed
                | SessionStatus::Completed
                | SessionStatus::Failed
                | SessionStatus::Cancelled
        )
    }

    pub fn can_transition_to(&self, next: SessionStatus) -> bool {
        use SessionStatus::*;
        matches!(
            (self, next),
            (Created, Running)
                | (Created, Failed)
                | (Created, Cancelled)
                | (Running, Completed)
                | (Running, PartiallyFailed)
                | (Running, Failed)
                | (Running, Cancelled)
        )
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One end-to-end analysis request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub input_descriptor: InputDescriptor,
    pub strategy: ExecutionStrategy,
    /// Concurrency fixed at planning time.
    pub concurrency_limit: usize,
    pub status: SessionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Tasks in dispatch order.
    pub task_ids: Vec<String>,
}

impl Session {
    pub fn new(input_descriptor: InputDescriptor, strategy: ExecutionStrategy) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            input_descriptor,
            strategy,
            concurrency_limit: 1,
            status: SessionStatus::Created,
            created_at: now,
            updated_at: now,
            task_ids: Vec::new(),
        }
    }
}

/// Point-in-time view of a session and its tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session: Session,
    /// Tasks in `session.task_ids` order.
    pub tasks: Vec<AgentTask>,
}

impl SessionSnapshot {
    pub fn task(&self, task_id: &str) -> Option<&AgentTask> {
        self.tasks.iter().find(|t| t.id == task_id)
    }

    pub fn task_for_agent(&self, agent_name: &str) -> Option<&AgentTask> {
        self.tasks.iter().find(|t| t.agent_name == agent_name)
    }
}
