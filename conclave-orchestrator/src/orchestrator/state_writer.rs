//! Session state writes with bounded retry.
//!
//! The state store is the source of truth for progress; a write that keeps
//! failing is fatal for the session rather than silently dropped.

use std::time::Duration;

use tracing::warn;

use conclave_core::errors::{ConclaveResult, OrchestrationError};
use conclave_core::models::{ProgressEvent, SessionStatus, TaskAnnotation, TaskStatus};
use conclave_core::traits::ISessionStateStore;

use super::Inner;

impl Inner {
    /// Apply `write`, retrying while the store reports itself unavailable.
    ///
    /// Other errors (invalid transitions, unknown ids) surface immediately.
    pub(crate) async fn write_state<T, F>(&self, session_id: &str, write: F) -> ConclaveResult<T>
    where
        F: Fn(&dyn ISessionStateStore) -> ConclaveResult<T>,
    {
        let attempts = self.config.session.state_write_attempts.max(1);
        let delay = Duration::from_millis(self.config.session.state_write_delay_ms);
        let mut attempt = 1;
        loop {
            match write(self.sessions.as_ref()) {
                Ok(value) => return Ok(value),
                Err(e) if e.is_store_unavailable() && attempt < attempts => {
                    warn!(session_id, attempt, error = %e, "state write failed, retrying");
                    self.metrics.state_write_retry();
                    attempt += 1;
                    tokio::time::sleep(delay).await;
                }
                Err(e) if e.is_store_unavailable() => {
                    return Err(OrchestrationError::StateWriteFailed {
                        session_id: session_id.to_string(),
                        attempts,
                        reason: e.to_string(),
                    }
                    .into());
                }
                Err(e) => return Err(e),
            }
        }
    }

    pub(crate) async fn set_task_status(
        &self,
        session_id: &str,
        task_id: &str,
        status: TaskStatus,
    ) -> ConclaveResult<ProgressEvent> {
        self.write_state(session_id, |store| {
            store.set_status(session_id, task_id, status)
        })
        .await
    }

    pub(crate) async fn set_session_status(
        &self,
        session_id: &str,
        status: SessionStatus,
    ) -> ConclaveResult<ProgressEvent> {
        self.write_state(session_id, |store| {
            store.set_session_status(session_id, status)
        })
        .await
    }

    pub(crate) async fn annotate(
        &self,
        session_id: &str,
        task_id: &str,
        annotation: TaskAnnotation,
    ) -> ConclaveResult<()> {
        self.write_state(session_id, |store| {
            store.annotate_task(session_id, task_id, annotation.clone())
        })
        .await
    }
}
