use std::collections::VecDeque;

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

use crate::errors::ConclaveResult;
use crate::models::{
    AgentTask, ProgressEvent, Session, SessionSnapshot, SessionStatus, TaskAnnotation, TaskStatus,
};

/// Ephemeral store of in-flight session and task state, with per-session broadcast.
///
/// Every write is atomic per transition and visible to the next read in the
/// same process. Sessions are partitioned by id; there is no cross-session locking.
pub trait ISessionStateStore: Send + Sync {
    /// Register a session in `created` with its queued tasks.
    fn create_session(&self, session: Session, tasks: Vec<AgentTask>) -> ConclaveResult<()>;

    /// Transition a task. Rejects transitions the task lifecycle forbids.
    fn set_status(
        &self,
        session_id: &str,
        task_id: &str,
        status: TaskStatus,
    ) -> ConclaveResult<ProgressEvent>;

    /// Transition the session itself.
    fn set_session_status(
        &self,
        session_id: &str,
        status: SessionStatus,
    ) -> ConclaveResult<ProgressEvent>;

    /// Record task details that are not status changes. Publishes nothing.
    fn annotate_task(
        &self,
        session_id: &str,
        task_id: &str,
        annotation: TaskAnnotation,
    ) -> ConclaveResult<()>;

    fn get_snapshot(&self, session_id: &str) -> ConclaveResult<SessionSnapshot>;

    /// Stream of status events for a session, starting with its current state.
    fn subscribe(&self, session_id: &str) -> ConclaveResult<ProgressSubscription>;

    /// Remove a terminal session. Active sessions are refused.
    fn archive(&self, session_id: &str) -> ConclaveResult<()>;

    /// Remove terminal sessions past their TTL. Returns the number removed.
    fn expire_stale(&self) -> ConclaveResult<usize>;
}

/// Observer handle on one session's progress.
///
/// Yields replayed current state first, then live events. Ends after the
/// terminal session event or when the session is dropped from the store.
/// Lagged gaps are skipped; observers recover the full state from a snapshot.
pub struct ProgressSubscription {
    session_id: String,
    replay: VecDeque<ProgressEvent>,
    rx: broadcast::Receiver<ProgressEvent>,
    finished: bool,
}

impl ProgressSubscription {
    pub fn new(
        session_id: impl Into<String>,
        replay: Vec<ProgressEvent>,
        rx: broadcast::Receiver<ProgressEvent>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            replay: replay.into(),
            rx,
            finished: false,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Next event, or `None` once the stream has ended.
    pub async fn next(&mut self) -> Option<ProgressEvent> {
        if self.finished {
            return None;
        }
        if let Some(event) = self.replay.pop_front() {
            self.finished = event.is_terminal();
            return Some(event);
        }
        loop {
            match self.rx.recv().await {
                Ok(event) => {
                    self.finished = event.is_terminal();
                    return Some(event);
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(
                        session_id = %self.session_id,
                        skipped,
                        "progress subscriber lagged"
                    );
                }
                Err(RecvError::Closed) => {
                    self.finished = true;
                    return None;
                }
            }
        }
    }

    /// Drain the stream to its end.
    pub async fn collect(mut self) -> Vec<ProgressEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.next().await {
            events.push(event);
        }
        events
    }
}
