/// Session State Store errors.
#[derive(Debug, thiserror::Error)]
pub enum SessionStoreError {
    #[error("session not found: {session_id}")]
    SessionNotFound { session_id: String },

    #[error("session already exists: {session_id}")]
    SessionExists { session_id: String },

    #[error("task {task_id} not found in session {session_id}")]
    TaskNotFound { session_id: String, task_id: String },

    #[error("invalid transition for {subject}: {from} -> {to}")]
    InvalidTransition {
        subject: String,
        from: String,
        to: String,
    },

    #[error("session {session_id} is still active and cannot be removed")]
    SessionActive { session_id: String },

    #[error("session store unavailable: {reason}")]
    Unavailable { reason: String },
}
