//! Per-session state held by the store.

use chrono::{DateTime, Utc};

use conclave_core::errors::{ConclaveResult, SessionStoreError};
use conclave_core::models::{
    AgentTask, ProgressEvent, Session, SessionSnapshot, SessionStatus, StatusChange,
    TaskAnnotation, TaskStatus,
};

use crate::emitter::ProgressEmitter;

/// A session, its tasks in dispatch order, and its broadcast channel.
pub struct SessionContext {
    pub session: Session,
    pub tasks: Vec<AgentTask>,
    pub emitter: ProgressEmitter,
    next_seq: u64,
}

impl SessionContext {
    pub fn new(mut session: Session, tasks: Vec<AgentTask>, capacity: usize) -> Self {
        session.task_ids = tasks.iter().map(|t| t.id.clone()).collect();
        Self {
            session,
            tasks,
            emitter: ProgressEmitter::with_capacity(capacity),
            next_seq: 1,
        }
    }

    fn task_mut(&mut self, task_id: &str) -> ConclaveResult<&mut AgentTask> {
        let session_id = self.session.id.clone();
        self.tasks
            .iter_mut()
            .find(|t| t.id == task_id)
            .ok_or_else(|| {
                SessionStoreError::TaskNotFound {
                    session_id,
                    task_id: task_id.to_string(),
                }
                .into()
            })
    }

    fn next_event(
        &mut self,
        task: Option<&AgentTask>,
        change: StatusChange,
        now: DateTime<Utc>,
    ) -> ProgressEvent {
        let seq = self.next_seq;
        self.next_seq += 1;
        ProgressEvent {
            session_id: self.session.id.clone(),
            task_id: task.map(|t| t.id.clone()),
            agent_name: task.map(|t| t.agent_name.clone()),
            change,
            attempt: task.map(|t| t.attempt_count).unwrap_or(0),
            seq,
            timestamp: now,
        }
    }

    /// Apply a task transition and publish it.
    pub fn apply_task_status(
        &mut self,
        task_id: &str,
        status: TaskStatus,
    ) -> ConclaveResult<ProgressEvent> {
        let now = Utc::now();
        let task = self.task_mut(task_id)?;
        if !task.status.can_transition_to(status) {
            return Err(SessionStoreError::InvalidTransition {
                subject: format!("task {task_id}"),
                from: task.status.to_string(),
                to: status.to_string(),
            }
            .into());
        }
        task.status = status;
        task.updated_at = now;
        if status == TaskStatus::Dispatched {
            task.attempt_count += 1;
        }
        let task = task.clone();
        self.session.updated_at = now;

        let event = self.next_event(Some(&task), StatusChange::Task(status), now);
        self.emitter.emit(event.clone());
        Ok(event)
    }

    /// Apply a session transition and publish it.
    pub fn apply_session_status(&mut self, status: SessionStatus) -> ConclaveResult<ProgressEvent> {
        if !self.session.status.can_transition_to(status) {
            return Err(SessionStoreError::InvalidTransition {
                subject: format!("session {}", self.session.id),
                from: self.session.status.to_string(),
                to: status.to_string(),
            }
            .into());
        }
        let now = Utc::now();
        self.session.status = status;
        self.session.updated_at = now;

        let event = self.next_event(None, StatusChange::Session(status), now);
        self.emitter.emit(event.clone());
        Ok(event)
    }

    pub fn annotate(&mut self, task_id: &str, annotation: TaskAnnotation) -> ConclaveResult<()> {
        let task = self.task_mut(task_id)?;
        match annotation {
            TaskAnnotation::InputContext(ctx) => task.input_context = Some(*ctx),
            TaskAnnotation::Result(result) => task.result_ref = Some(result),
            TaskAnnotation::Error(reason) => task.last_error = Some(reason),
        }
        task.updated_at = Utc::now();
        Ok(())
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session: self.session.clone(),
            tasks: self.tasks.clone(),
        }
    }

    /// Current state as events: every task, then the session itself, so a
    /// terminal session closes the replay.
    pub fn replay(&self) -> Vec<ProgressEvent> {
        let seq = self.next_seq.saturating_sub(1);
        let mut events: Vec<ProgressEvent> = self
            .tasks
            .iter()
            .map(|t| ProgressEvent {
                session_id: self.session.id.clone(),
                task_id: Some(t.id.clone()),
                agent_name: Some(t.agent_name.clone()),
                change: StatusChange::Task(t.status),
                attempt: t.attempt_count,
                seq,
                timestamp: t.updated_at,
            })
            .collect();
        events.push(ProgressEvent {
            session_id: self.session.id.clone(),
            task_id: None,
            agent_name: None,
            change: StatusChange::Session(self.session.status),
            attempt: 0,
            seq,
            timestamp: self.session.updated_at,
        });
        events
    }

    /// Whether a terminal session has outlived `ttl_secs` at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>, ttl_secs: u64) -> bool {
        if !self.session.status.is_terminal() {
            return false;
        }
        let age = now.signed_duration_since(self.session.updated_at);
        age.num_seconds() >= 0 && age.num_seconds() as u64 >= ttl_secs
    }
}
