//! Store doubles that fail on demand.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use conclave_core::errors::{ConclaveResult, SessionStoreError, StorageError};
use conclave_core::models::{
    AgentTask, FeedbackLabel, FindingRef, MemoryEntry, ProgressEvent, Session, SessionSnapshot,
    SessionStatus, TaskAnnotation, TaskStatus,
};
use conclave_core::traits::{
    IMemoryStore, ISessionStateStore, ProgressSubscription, PutOutcome, RetentionPolicy,
    StrategyParams,
};
use conclave_session::InMemorySessionStore;

/// Memory store whose every operation reports the store as unreachable.
#[derive(Default)]
pub struct UnavailableMemoryStore {
    calls: AtomicUsize,
}

impl UnavailableMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of operations attempted against the store.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn unavailable<T>(&self) -> ConclaveResult<T> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(StorageError::Unavailable {
            reason: "scripted outage".to_string(),
        }
        .into())
    }
}

impl IMemoryStore for UnavailableMemoryStore {
    fn put(&self, _entry: &MemoryEntry) -> ConclaveResult<PutOutcome> {
        self.unavailable()
    }

    fn get(&self, _id: &str) -> ConclaveResult<Option<MemoryEntry>> {
        self.unavailable()
    }

    fn get_by_fingerprint(
        &self,
        _category: &str,
        _fingerprint: &str,
    ) -> ConclaveResult<Option<MemoryEntry>> {
        self.unavailable()
    }

    fn query(
        &self,
        _category: Option<&str>,
        _params: &StrategyParams,
    ) -> ConclaveResult<Vec<MemoryEntry>> {
        self.unavailable()
    }

    fn update_feedback(&self, _id: &str, _label: FeedbackLabel, _weight: f64) -> ConclaveResult<()> {
        self.unavailable()
    }

    fn record_finding(&self, _finding: &FindingRef) -> ConclaveResult<()> {
        self.unavailable()
    }

    fn get_finding(&self, _id: &str) -> ConclaveResult<Option<FindingRef>> {
        self.unavailable()
    }

    fn count(&self) -> ConclaveResult<usize> {
        self.unavailable()
    }

    fn count_by_category(&self) -> ConclaveResult<BTreeMap<String, usize>> {
        self.unavailable()
    }

    fn apply_retention(&self, _policy: &RetentionPolicy) -> ConclaveResult<usize> {
        self.unavailable()
    }
}

/// In-memory session store whose task status writes fail a set number of times.
pub struct FlakySessionStore {
    inner: InMemorySessionStore,
    failing_task_writes: AtomicUsize,
    target: Option<TaskStatus>,
    failures: AtomicUsize,
}

impl FlakySessionStore {
    /// The next `times` task status writes fail.
    pub fn failing_task_writes(times: usize) -> Self {
        Self {
            inner: InMemorySessionStore::default(),
            failing_task_writes: AtomicUsize::new(times),
            target: None,
            failures: AtomicUsize::new(0),
        }
    }

    /// The next `times` writes of `status` fail. Other writes go through.
    pub fn failing_writes_of(status: TaskStatus, times: usize) -> Self {
        Self {
            target: Some(status),
            ..Self::failing_task_writes(times)
        }
    }

    pub fn inner(&self) -> &InMemorySessionStore {
        &self.inner
    }

    /// Writes rejected so far.
    pub fn failures(&self) -> usize {
        self.failures.load(Ordering::SeqCst)
    }

    fn should_fail(&self, status: TaskStatus) -> bool {
        if self.target.is_some_and(|t| t != status) {
            return false;
        }
        self.failing_task_writes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

impl ISessionStateStore for FlakySessionStore {
    fn create_session(&self, session: Session, tasks: Vec<AgentTask>) -> ConclaveResult<()> {
        self.inner.create_session(session, tasks)
    }

    fn set_status(
        &self,
        session_id: &str,
        task_id: &str,
        status: TaskStatus,
    ) -> ConclaveResult<ProgressEvent> {
        if self.should_fail(status) {
            self.failures.fetch_add(1, Ordering::SeqCst);
            return Err(SessionStoreError::Unavailable {
                reason: "scripted write failure".to_string(),
            }
            .into());
        }
        self.inner.set_status(session_id, task_id, status)
    }

    fn set_session_status(
        &self,
        session_id: &str,
        status: SessionStatus,
    ) -> ConclaveResult<ProgressEvent> {
        self.inner.set_session_status(session_id, status)
    }

    fn annotate_task(
        &self,
        session_id: &str,
        task_id: &str,
        annotation: TaskAnnotation,
    ) -> ConclaveResult<()> {
        self.inner.annotate_task(session_id, task_id, annotation)
    }

    fn get_snapshot(&self, session_id: &str) -> ConclaveResult<SessionSnapshot> {
        self.inner.get_snapshot(session_id)
    }

    fn subscribe(&self, session_id: &str) -> ConclaveResult<ProgressSubscription> {
        self.inner.subscribe(session_id)
    }

    fn archive(&self, session_id: &str) -> ConclaveResult<()> {
        self.inner.archive(session_id)
    }

    fn expire_stale(&self) -> ConclaveResult<usize> {
        self.inner.expire_stale()
    }
}
