//! Structured log events for key orchestration milestones.

/// Log a session reaching a terminal status.
pub fn session_finished(session_id: &str, status: &str, tasks: usize, findings: usize) {
    tracing::info!(
        event = "session_finished",
        session_id = %session_id,
        status = %status,
        tasks,
        findings,
        "session finished"
    );
}

/// Log a retry being scheduled for a task.
pub fn retry_scheduled(task_id: &str, agent: &str, attempt: u32, delay_ms: u64, error: &str) {
    tracing::info!(
        event = "retry_scheduled",
        task_id = %task_id,
        agent = %agent,
        attempt,
        delay_ms,
        error = %error,
        "task retry scheduled"
    );
}

/// Log a provider signalling a rate limit.
pub fn rate_limited(provider: &str, penalty_level: u32, delay_ms: u64) {
    tracing::warn!(
        event = "rate_limited",
        provider = %provider,
        penalty_level,
        delay_ms,
        "provider rate limit signalled"
    );
}

/// Log a degradation trigger event.
pub fn degradation_triggered(component: &str, failure: &str, fallback: &str) {
    tracing::warn!(
        event = "degradation_triggered",
        component = %component,
        failure = %failure,
        fallback = %fallback,
        "degradation triggered"
    );
}
