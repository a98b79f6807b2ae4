/// Session-level orchestration errors.
#[derive(Debug, thiserror::Error)]
pub enum OrchestrationError {
    #[error("no resolvable agents for session {session_id}")]
    NoResolvableAgents { session_id: String },

    #[error("session {session_id} is {status}, expected {expected}")]
    UnexpectedSessionState {
        session_id: String,
        status: String,
        expected: String,
    },

    #[error("session state write for {session_id} failed after {attempts} attempts: {reason}")]
    StateWriteFailed {
        session_id: String,
        attempts: u32,
        reason: String,
    },

    #[error("worker for task {task_id} stopped unexpectedly: {reason}")]
    WorkerLost { task_id: String, reason: String },
}
