use std::path::Path;
use std::sync::{Arc, Mutex};

use dashmap::DashMap;

use conclave_core::config::ConclaveConfig;
use conclave_core::errors::{ConclaveResult, ConfigError};
use conclave_core::traits::{
    IAgentDispatcher, IConfidenceScorer, IConfidenceStore, IMemoryStore, ISessionStateStore,
};
use conclave_learning::{ConfidenceScorer, FeedbackProcessor};
use conclave_observability::{DegradationTracker, OrchestrationMetrics};
use conclave_retrieval::RetrievalCoordinator;
use conclave_session::InMemorySessionStore;
use conclave_storage::StorageEngine;

use super::{Inner, Orchestrator};
use crate::retry::RetryPolicy;
use crate::throttle::ProviderThrottle;

/// Assembles an [`Orchestrator`] from its collaborators.
///
/// Only the dispatcher is required. Missing stores are opened from the
/// configuration: SQLite at `storage.db_path` for memory and confidence,
/// an in-process store for session state.
pub struct OrchestratorBuilder {
    config: ConclaveConfig,
    dispatcher: Option<Arc<dyn IAgentDispatcher>>,
    memory: Option<Arc<dyn IMemoryStore>>,
    confidence: Option<Arc<dyn IConfidenceStore>>,
    sessions: Option<Arc<dyn ISessionStateStore>>,
}

impl OrchestratorBuilder {
    pub fn new(config: ConclaveConfig) -> Self {
        Self {
            config,
            dispatcher: None,
            memory: None,
            confidence: None,
            sessions: None,
        }
    }

    pub fn dispatcher(mut self, dispatcher: Arc<dyn IAgentDispatcher>) -> Self {
        self.dispatcher = Some(dispatcher);
        self
    }

    /// Use one storage engine for both memory entries and confidence records.
    pub fn storage(mut self, engine: Arc<StorageEngine>) -> Self {
        self.memory = Some(engine.clone() as Arc<dyn IMemoryStore>);
        self.confidence = Some(engine as Arc<dyn IConfidenceStore>);
        self
    }

    pub fn memory_store(mut self, store: Arc<dyn IMemoryStore>) -> Self {
        self.memory = Some(store);
        self
    }

    pub fn confidence_store(mut self, store: Arc<dyn IConfidenceStore>) -> Self {
        self.confidence = Some(store);
        self
    }

    pub fn session_store(mut self, store: Arc<dyn ISessionStateStore>) -> Self {
        self.sessions = Some(store);
        self
    }

    pub fn build(self) -> ConclaveResult<Orchestrator> {
        let config = self.config;
        config.validate()?;

        let dispatcher = self.dispatcher.ok_or_else(|| ConfigError::ValidationFailed {
            field: "dispatcher".to_string(),
            message: "an agent dispatcher is required".to_string(),
        })?;

        let (memory, confidence) = match (self.memory, self.confidence) {
            (Some(memory), Some(confidence)) => (memory, confidence),
            (memory, confidence) => {
                let engine = Arc::new(StorageEngine::open_with_config(
                    Path::new(&config.storage.db_path),
                    &config.storage,
                )?);
                (
                    memory.unwrap_or_else(|| engine.clone() as Arc<dyn IMemoryStore>),
                    confidence.unwrap_or(engine as Arc<dyn IConfidenceStore>),
                )
            }
        };
        let sessions = self
            .sessions
            .unwrap_or_else(|| Arc::new(InMemorySessionStore::new(&config.session)));

        let scorer = Arc::new(ConfidenceScorer::new(confidence, &config.confidence));
        let retrieval = Arc::new(
            RetrievalCoordinator::new(memory.clone(), config.retrieval.clone())
                .with_scorer(scorer.clone() as Arc<dyn IConfidenceScorer>),
        );
        let feedback = FeedbackProcessor::new(memory.clone(), scorer.clone(), &config.confidence);

        Ok(Orchestrator::from_inner(Inner {
            throttle: ProviderThrottle::new(config.rate_limit.clone()),
            retry: RetryPolicy::from_config(&config.dispatch),
            config,
            dispatcher,
            memory,
            sessions,
            retrieval,
            scorer,
            feedback,
            metrics: OrchestrationMetrics::new(),
            degradation: Mutex::new(DegradationTracker::new()),
            tokens: DashMap::new(),
        }))
    }
}
