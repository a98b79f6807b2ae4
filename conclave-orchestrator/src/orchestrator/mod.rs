//! Orchestrator: drives sessions from submission to a terminal status.
//!
//! Session lifecycle: `created → running → {completed | partially_failed | failed}`,
//! with `cancelled` reachable from `created` or `running`. Every transition is
//! written to the session state store, which publishes it to observers.

mod builder;
mod persistence;
mod runner;
mod state_writer;
mod task_runner;

pub use builder::OrchestratorBuilder;

use std::sync::{Arc, Mutex};

use dashmap::DashMap;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use conclave_core::config::ConclaveConfig;
use conclave_core::errors::{ConclaveError, ConclaveResult, OrchestrationError, SessionStoreError};
use conclave_core::models::{
    AgentTask, FeedbackLabel, InputDescriptor, ReportedFinding, Session, SessionOutcome,
    SessionSnapshot, SessionStatus, TaskStatus,
};
use conclave_core::traits::{
    IAgentDispatcher, IMemoryStore, ISessionStateStore, ProgressSubscription,
};
use conclave_learning::{ConfidenceScorer, FeedbackOutcome, FeedbackProcessor};
use conclave_observability::{
    DegradationEvent, DegradationTracker, MetricsSnapshot, OrchestrationMetrics, TrackedDegradation,
};
use conclave_retrieval::RetrievalCoordinator;

use crate::retry::RetryPolicy;
use crate::strategy;
use crate::throttle::{ProviderStats, ProviderThrottle};

/// Shared state behind an [`Orchestrator`]. Every field is owned by this
/// instance; nothing is process-global.
pub(crate) struct Inner {
    pub(crate) config: ConclaveConfig,
    pub(crate) dispatcher: Arc<dyn IAgentDispatcher>,
    pub(crate) memory: Arc<dyn IMemoryStore>,
    pub(crate) sessions: Arc<dyn ISessionStateStore>,
    pub(crate) retrieval: Arc<RetrievalCoordinator>,
    pub(crate) scorer: Arc<ConfidenceScorer>,
    pub(crate) feedback: FeedbackProcessor,
    pub(crate) throttle: ProviderThrottle,
    pub(crate) retry: RetryPolicy,
    pub(crate) metrics: OrchestrationMetrics,
    pub(crate) degradation: Mutex<DegradationTracker>,
    /// Cancellation signal per live session.
    pub(crate) tokens: DashMap<String, CancellationToken>,
}

impl Inner {
    pub(crate) fn record_degradation(&self, component: &str, failure: &str, fallback: &str) {
        if let Ok(mut tracker) = self.degradation.lock() {
            tracker.record(DegradationEvent::new(component, failure, fallback));
        }
    }

    pub(crate) fn mark_recovered(&self, component: &str) {
        if let Ok(mut tracker) = self.degradation.lock() {
            if tracker.is_degraded(component) {
                tracker.mark_recovered(component);
            }
        }
    }

    pub(crate) fn outcome(
        &self,
        snapshot: SessionSnapshot,
        findings: Vec<ReportedFinding>,
    ) -> SessionOutcome {
        SessionOutcome {
            session: snapshot.session,
            tasks: snapshot.tasks,
            findings,
        }
    }

    pub(crate) fn token(&self, session_id: &str) -> CancellationToken {
        self.tokens
            .entry(session_id.to_string())
            .or_default()
            .clone()
    }
}

pub(crate) fn is_invalid_transition(error: &ConclaveError) -> bool {
    matches!(
        error,
        ConclaveError::SessionStore(SessionStoreError::InvalidTransition { .. })
    )
}

/// Coordinates agents over a shared artifact. Cheap to clone.
#[derive(Clone)]
pub struct Orchestrator {
    inner: Arc<Inner>,
}

impl Orchestrator {
    pub fn builder(config: ConclaveConfig) -> OrchestratorBuilder {
        OrchestratorBuilder::new(config)
    }

    pub(crate) fn from_inner(inner: Inner) -> Self {
        Self {
            inner: Arc::new(inner),
        }
    }

    pub fn config(&self) -> &ConclaveConfig {
        &self.inner.config
    }

    /// Create a session and its task plan.
    ///
    /// The session starts in `created`. If the input is malformed or no
    /// enabled agent qualifies, it is created and immediately `failed`.
    #[instrument(skip(self, input), fields(artifact = %input.artifact_id))]
    pub async fn submit(&self, input: InputDescriptor) -> ConclaveResult<Session> {
        let inner = &self.inner;
        let plan = strategy::select(&input, &inner.config);
        let validation = input.validate();

        let mut session = Session::new(input, plan.strategy);
        session.concurrency_limit = plan.concurrency_limit;
        let tasks: Vec<AgentTask> = if validation.is_ok() {
            plan.agents
                .iter()
                .map(|name| {
                    let provider = inner
                        .config
                        .agents
                        .iter()
                        .find(|a| &a.name == name)
                        .map(|a| a.provider.as_str())
                        .unwrap_or(conclave_core::models::agent::DEFAULT_PROVIDER);
                    AgentTask::new(&session.id, name, provider)
                })
                .collect()
        } else {
            Vec::new()
        };
        session.task_ids = tasks.iter().map(|t| t.id.clone()).collect();
        let session_id = session.id.clone();

        inner
            .write_state(&session_id, |store| {
                store.create_session(session.clone(), tasks.clone())
            })
            .await?;
        inner.tokens.insert(session_id.clone(), CancellationToken::new());
        inner.metrics.session_started();

        info!(
            session_id = %session_id,
            strategy = %plan.strategy,
            agents = plan.agents.len(),
            concurrency = plan.concurrency_limit,
            fallback = plan.fallback_reason.as_deref().unwrap_or(""),
            "session submitted"
        );

        let failure = match validation {
            Err(reason) => Some(ConclaveError::InvalidInput(reason)),
            Ok(()) if plan.is_empty() => Some(
                OrchestrationError::NoResolvableAgents {
                    session_id: session_id.clone(),
                }
                .into(),
            ),
            Ok(()) => None,
        };
        if let Some(error) = failure {
            warn!(session_id = %session_id, error = %error, "session cannot run");
            runner::finish(inner, &session_id, SessionStatus::Failed, 0).await?;
        }

        Ok(inner.sessions.get_snapshot(&session_id)?.session)
    }

    /// Drive a submitted session to a terminal status.
    ///
    /// A session that is already terminal (failed at submission, cancelled
    /// before running) is returned as is.
    pub async fn run(&self, session_id: &str) -> ConclaveResult<SessionOutcome> {
        runner::run_session(self.inner.clone(), session_id.to_string()).await
    }

    /// Submit and run in one call.
    pub async fn execute(&self, input: InputDescriptor) -> ConclaveResult<SessionOutcome> {
        let session = self.submit(input).await?;
        self.run(&session.id).await
    }

    /// Cancel a session.
    ///
    /// Tasks not yet dispatched are skipped immediately. Dispatched tasks are
    /// allowed to finish; their findings are recorded for learning but left
    /// out of the session's result. Cancelling a terminal session is a no-op.
    #[instrument(skip(self))]
    pub async fn cancel(&self, session_id: &str) -> ConclaveResult<()> {
        let inner = &self.inner;
        let snapshot = inner.sessions.get_snapshot(session_id)?;
        if snapshot.session.status.is_terminal() {
            return Ok(());
        }
        inner.token(session_id).cancel();
        info!(session_id, status = %snapshot.session.status, "cancellation requested");

        for task in snapshot.tasks.iter().filter(|t| t.status == TaskStatus::Queued) {
            match inner.set_task_status(session_id, &task.id, TaskStatus::Skipped).await {
                Ok(_) => {}
                Err(e) if is_invalid_transition(&e) => {
                    debug!(session_id, task_id = %task.id, "task already moved on")
                }
                Err(e) => return Err(e),
            }
        }
        if snapshot.session.status != SessionStatus::Created {
            // The running session finalizes itself once in-flight tasks finish.
            return Ok(());
        }
        match runner::finish(inner, session_id, SessionStatus::Cancelled, 0).await {
            Ok(()) => Ok(()),
            // A concurrent `run` claimed the session first and finalizes it.
            Err(e) if is_invalid_transition(&e) => Ok(()),
            Err(e) => Err(e),
        }
    }

    pub fn snapshot(&self, session_id: &str) -> ConclaveResult<SessionSnapshot> {
        self.inner.sessions.get_snapshot(session_id)
    }

    /// Progress stream for a session, starting with its current state.
    pub fn subscribe(&self, session_id: &str) -> ConclaveResult<ProgressSubscription> {
        self.inner.sessions.subscribe(session_id)
    }

    /// Remove a terminal session from the state store.
    pub fn archive(&self, session_id: &str) -> ConclaveResult<()> {
        self.inner.sessions.archive(session_id)?;
        self.inner.tokens.remove(session_id);
        Ok(())
    }

    /// Purge terminal sessions past their TTL. Returns the number removed.
    pub fn expire_stale(&self) -> ConclaveResult<usize> {
        let removed = self.inner.sessions.expire_stale()?;
        let sessions = &self.inner.sessions;
        self.inner
            .tokens
            .retain(|id, _| sessions.get_snapshot(id).is_ok());
        Ok(removed)
    }

    /// Run [`expire_stale`](Self::expire_stale) on the configured interval until `cancel` fires.
    pub fn spawn_expiry_sweeper(&self, cancel: CancellationToken) -> JoinHandle<()> {
        conclave_session::spawn_expiry_sweeper(
            self.inner.sessions.clone(),
            std::time::Duration::from_secs(self.inner.config.session.sweep_interval_secs.max(1)),
            cancel,
        )
    }

    /// Label a finding as correct or incorrect.
    pub fn submit_feedback(
        &self,
        finding_id: &str,
        label: FeedbackLabel,
    ) -> ConclaveResult<FeedbackOutcome> {
        self.submit_weighted_feedback(finding_id, label, 1.0)
    }

    /// Label a finding, counting the observation as `weight`.
    pub fn submit_weighted_feedback(
        &self,
        finding_id: &str,
        label: FeedbackLabel,
        weight: f64,
    ) -> ConclaveResult<FeedbackOutcome> {
        let span = conclave_observability::feedback_span!(finding_id, label.as_str());
        let _guard = span.enter();
        let outcome = self
            .inner
            .feedback
            .submit_weighted_feedback(finding_id, label, weight)?;
        self.inner.metrics.feedback();
        Ok(outcome)
    }

    /// Calibrated confidence for (agent, category).
    pub fn confidence(&self, agent_name: &str, category: &str) -> f64 {
        self.inner.scorer.score(agent_name, category)
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.inner.metrics.snapshot()
    }

    pub fn throttle_stats(&self, provider: &str) -> Option<ProviderStats> {
        self.inner.throttle.stats(provider)
    }

    pub fn degradations(&self) -> Vec<TrackedDegradation> {
        self.inner
            .degradation
            .lock()
            .map(|t| t.events().to_vec())
            .unwrap_or_default()
    }
}
