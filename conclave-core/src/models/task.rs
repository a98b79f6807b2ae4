use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{InputDescriptor, RetrievalResult};

/// Task lifecycle.
///
/// `queued → dispatched → {succeeded | failed | retrying | skipped}`,
/// `retrying → {dispatched | failed | skipped}`, `queued → skipped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Queued,
    Dispatched,
    Retrying,
    Succeeded,
    Failed,
    Skipped,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Queued => "queued",
            TaskStatus::Dispatched => "dispatched",
            TaskStatus::Retrying => "retrying",
            TaskStatus::Succeeded => "succeeded",
            TaskStatus::Failed => "failed",
            TaskStatus::Skipped => "skipped",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Succeeded | TaskStatus::Failed | TaskStatus::Skipped
        )
    }

    pub fn can_transition_to(&self, next: TaskStatus) -> bool {
        use TaskStatus::*;
        matches!(
            (self, next),
            (Queued, Dispatched)
                | (Queued, Skipped)
                | (Dispatched, Succeeded)
                | (Dispatched, Failed)
                | (Dispatched, Retrying)
                | (Dispatched, Skipped)
                | (Retrying, Dispatched)
                | (Retrying, Failed)
                | (Retrying, Skipped)
        )
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything an agent receives for one task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskInputContext {
    pub session_id: String,
    pub task_id: String,
    pub agent_name: String,
    pub artifact: InputDescriptor,
    pub memory: RetrievalResult,
    /// Calibrated score per category for this agent.
    pub confidence_weights: BTreeMap<String, f64>,
}

/// Pointer to a task's recorded result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultRef {
    /// Finding ids of the reported findings, in agent order.
    pub finding_ids: Vec<String>,
    pub raw_confidence: Option<f64>,
}

/// Non-status task details recorded by the orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskAnnotation {
    InputContext(Box<TaskInputContext>),
    Result(ResultRef),
    Error(String),
}

/// One agent's unit of work inside a session. Only the orchestrator mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentTask {
    pub id: String,
    pub session_id: String,
    pub agent_name: String,
    pub provider: String,
    pub status: TaskStatus,
    /// Incremented on every transition into `dispatched`.
    pub attempt_count: u32,
    pub input_context: Option<TaskInputContext>,
    pub result_ref: Option<ResultRef>,
    pub last_error: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl AgentTask {
    pub fn new(session_id: &str, agent_name: &str, provider: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            session_id: session_id.to_string(),
            agent_name: agent_name.to_string(),
            provider: provider.to_string(),
            status: TaskStatus::Queued,
            attempt_count: 0,
            input_context: None,
            result_ref: None,
            last_error: None,
            updated_at: Utc::now(),
        }
    }
}
