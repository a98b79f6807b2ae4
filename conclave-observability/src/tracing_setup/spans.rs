//! Span definitions per operation: session, dispatch, retrieval, feedback.

/// Create a session span.
#[macro_export]
macro_rules! session_span {
    ($session_id:expr, $strategy:expr) => {
        tracing::info_span!("conclave.session", session_id = %$session_id, strategy = %$strategy)
    };
}

/// Create a dispatch span for one task attempt.
#[macro_export]
macro_rules! dispatch_span {
    ($session_id:expr, $task_id:expr, $agent:expr, $provider:expr, $attempt:expr) => {
        tracing::info_span!(
            "conclave.dispatch",
            session_id = %$session_id,
            task_id = %$task_id,
            agent = %$agent,
            provider = %$provider,
            attempt = $attempt
        )
    };
}

/// Create a retrieval span.
#[macro_export]
macro_rules! retrieval_span {
    ($session_id:expr, $agent:expr) => {
        tracing::info_span!("conclave.retrieval", session_id = %$session_id, agent = %$agent)
    };
}

/// Create a feedback span.
#[macro_export]
macro_rules! feedback_span {
    ($finding_id:expr, $label:expr) => {
        tracing::info_span!("conclave.feedback", finding_id = %$finding_id, label = %$label)
    };
}

/// Span names as constants for programmatic use.
pub mod names {
    pub const SESSION: &str = "conclave.session";
    pub const DISPATCH: &str = "conclave.dispatch";
    pub const RETRIEVAL: &str = "conclave.retrieval";
    pub const FEEDBACK: &str = "conclave.feedback";
}
