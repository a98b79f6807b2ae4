//! InMemorySessionStore: concurrent per-session access via DashMap.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::debug;

use conclave_core::config::SessionConfig;
use conclave_core::errors::{ConclaveResult, SessionStoreError};
use conclave_core::models::{
    AgentTask, ProgressEvent, Session, SessionSnapshot, SessionStatus, TaskAnnotation, TaskStatus,
};
use conclave_core::traits::{ISessionStateStore, ProgressSubscription};

use crate::context::SessionContext;

/// Thread-safe session state store. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct InMemorySessionStore {
    sessions: Arc<DashMap<String, SessionContext>>,
    ttl_secs: u64,
    channel_capacity: usize,
}

impl InMemorySessionStore {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            ttl_secs: config.ttl_secs,
            channel_capacity: config.channel_capacity,
        }
    }

    /// Number of sessions currently held.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn session_ids(&self) -> Vec<String> {
        self.sessions.iter().map(|r| r.key().clone()).collect()
    }

    /// Live subscribers on a session's channel.
    pub fn subscriber_count(&self, session_id: &str) -> usize {
        self.sessions
            .get(session_id)
            .map(|s| s.emitter.subscriber_count())
            .unwrap_or(0)
    }

    /// Remove terminal sessions whose TTL has elapsed at `now`.
    pub fn expire_stale_at(&self, now: DateTime<Utc>) -> usize {
        let before = self.sessions.len();
        let ttl = self.ttl_secs;
        self.sessions.retain(|_, ctx| !ctx.is_expired(now, ttl));
        let removed = before.saturating_sub(self.sessions.len());
        if removed > 0 {
            debug!(removed, "expired stale sessions");
        }
        removed
    }

    fn not_found(session_id: &str) -> SessionStoreError {
        SessionStoreError::SessionNotFound {
            session_id: session_id.to_string(),
        }
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new(&SessionConfig::default())
    }
}

impl ISessionStateStore for InMemorySessionStore {
    fn create_session(&self, session: Session, tasks: Vec<AgentTask>) -> ConclaveResult<()> {
        use dashmap::mapref::entry::Entry;

        match self.sessions.entry(session.id.clone()) {
            Entry::Occupied(_) => Err(SessionStoreError::SessionExists {
                session_id: session.id,
            }
            .into()),
            Entry::Vacant(slot) => {
                debug!(session_id = %session.id, tasks = tasks.len(), "session registered");
                slot.insert(SessionContext::new(session, tasks, self.channel_capacity));
                Ok(())
            }
        }
    }

    fn set_status(
        &self,
        session_id: &str,
        task_id: &str,
        status: TaskStatus,
    ) -> ConclaveResult<ProgressEvent> {
        let mut ctx = self
            .sessions
            .get_mut(session_id)
            .ok_or_else(|| Self::not_found(session_id))?;
        ctx.apply_task_status(task_id, status)
    }

    fn set_session_status(
        &self,
        session_id: &str,
        status: SessionStatus,
    ) -> ConclaveResult<ProgressEvent> {
        let mut ctx = self
            .sessions
            .get_mut(session_id)
            .ok_or_else(|| Self::not_found(session_id))?;
        ctx.apply_session_status(status)
    }

    fn annotate_task(
        &self,
        session_id: &str,
        task_id: &str,
        annotation: TaskAnnotation,
    ) -> ConclaveResult<()> {
        let mut ctx = self
            .sessions
            .get_mut(session_id)
            .ok_or_else(|| Self::not_found(session_id))?;
        ctx.annotate(task_id, annotation)
    }

    fn get_snapshot(&self, session_id: &str) -> ConclaveResult<SessionSnapshot> {
        self.sessions
            .get(session_id)
            .map(|ctx| ctx.snapshot())
            .ok_or_else(|| Self::not_found(session_id).into())
    }

    fn subscribe(&self, session_id: &str) -> ConclaveResult<ProgressSubscription> {
        let ctx = self
            .sessions
            .get(session_id)
            .ok_or_else(|| Self::not_found(session_id))?;
        // Receiver and replay are taken under the same shard lock, so no
        // transition can slip between them.
        let rx = ctx.emitter.subscribe();
        Ok(ProgressSubscription::new(session_id, ctx.replay(), rx))
    }

    fn archive(&self, session_id: &str) -> ConclaveResult<()> {
        let removed = self
            .sessions
            .remove_if(session_id, |_, ctx| ctx.session.status.is_terminal());
        if removed.is_some() {
            debug!(session_id, "session archived");
            return Ok(());
        }
        if self.sessions.contains_key(session_id) {
            Err(SessionStoreError::SessionActive {
                session_id: session_id.to_string(),
            }
            .into())
        } else {
            Err(Self::not_found(session_id).into())
        }
    }

    fn expire_stale(&self) -> ConclaveResult<usize> {
        Ok(self.expire_stale_at(Utc::now()))
    }
}
