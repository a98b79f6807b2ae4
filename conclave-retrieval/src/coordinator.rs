//! RetrievalCoordinator: strategy fan-out, merge, and graceful degradation.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, instrument, warn};

use conclave_core::config::RetrievalConfig;
use conclave_core::constants::MAX_RETRIEVAL_LIMIT;
use conclave_core::errors::{ConclaveResult, RetrievalError};
use conclave_core::models::{
    MemoryEntry, RetrievalContext, RetrievalResult, RetrievalStrategyKind,
};
use conclave_core::traits::{IConfidenceScorer, IMemoryStore};

use crate::fusion::{self, Candidate};
use crate::strategies;

pub struct RetrievalCoordinator {
    store: Arc<dyn IMemoryStore>,
    scorer: Option<Arc<dyn IConfidenceScorer>>,
    config: RetrievalConfig,
}

impl RetrievalCoordinator {
    pub fn new(store: Arc<dyn IMemoryStore>, config: RetrievalConfig) -> Self {
        Self {
            store,
            scorer: None,
            config,
        }
    }

    /// Weight entries by the calibrated score of their source agent.
    pub fn with_scorer(mut self, scorer: Arc<dyn IConfidenceScorer>) -> Self {
        self.scorer = Some(scorer);
        self
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Run `strategies` for `context` and return the top `limit` entries.
    ///
    /// Deterministic for an unchanged store: identical arguments yield the
    /// same ranked list.
    #[instrument(skip(self, context), fields(categories = context.categories.len()))]
    pub fn retrieve(
        &self,
        context: &RetrievalContext,
        strategies: &[RetrievalStrategyKind],
        limit: usize,
    ) -> ConclaveResult<RetrievalResult> {
        if limit == 0 || limit > MAX_RETRIEVAL_LIMIT {
            return Err(RetrievalError::InvalidLimit {
                requested: limit,
                max: MAX_RETRIEVAL_LIMIT,
            }
            .into());
        }
        let kinds = dedup_kinds(strategies);
        if kinds.is_empty() {
            return Err(RetrievalError::NoStrategies.into());
        }

        let pool_size = self.config.candidate_pool_size.max(limit);
        let mut candidates: HashMap<String, Candidate> = HashMap::new();
        for kind in &kinds {
            let strategy = strategies::for_kind(*kind, &self.config);
            let scored = strategies::gather(strategy.as_ref(), self.store.as_ref(), context, pool_size)?;
            debug!(strategy = %kind, candidates = scored.len(), "strategy gathered");
            for (id, (entry, score)) in scored {
                candidates
                    .entry(id)
                    .or_insert_with(|| Candidate {
                        entry,
                        scores: Default::default(),
                    })
                    .scores
                    .insert(*kind, score);
            }
        }

        let weights = fusion::normalized_weights(&self.config.weights, &kinds);
        let entries = fusion::fuse(
            candidates,
            &weights,
            |entry| self.reliability(entry),
            self.config.min_relevance,
            limit,
        );
        debug!(returned = entries.len(), "retrieval complete");

        Ok(RetrievalResult {
            entries,
            strategies: kinds,
            degraded: false,
        })
    }

    /// Like [`retrieve`](Self::retrieve), but an unreachable store is retried
    /// a fixed number of times and then yields an empty, degraded bundle.
    ///
    /// Argument errors still surface. Blocks the calling thread between
    /// attempts, so async callers run it on a blocking thread.
    pub fn retrieve_or_degrade(
        &self,
        context: &RetrievalContext,
        strategies: &[RetrievalStrategyKind],
        limit: usize,
    ) -> ConclaveResult<RetrievalResult> {
        let attempts = self.config.store_retry_attempts.max(1);
        let delay = Duration::from_millis(self.config.store_retry_delay_ms);
        let mut attempt = 1;
        loop {
            match self.retrieve(context, strategies, limit) {
                Ok(result) => return Ok(result),
                Err(e) if e.is_store_unavailable() && attempt < attempts => {
                    debug!(attempt, error = %e, "memory store unavailable, retrying");
                    attempt += 1;
                    std::thread::sleep(delay);
                }
                Err(e) if e.is_store_unavailable() => {
                    warn!(attempts, error = %e, "memory store unavailable, using empty context");
                    return Ok(RetrievalResult::degraded(&dedup_kinds(strategies)));
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// (1 - β) + β·score for the entry's source agent and category.
    fn reliability(&self, entry: &MemoryEntry) -> f64 {
        let beta = self.config.confidence_influence;
        match &self.scorer {
            Some(scorer) if beta > 0.0 => {
                (1.0 - beta) + beta * scorer.score(&entry.source_agent, &entry.category)
            }
            _ => 1.0,
        }
    }
}

/// Requested strategies with duplicates removed, first occurrence kept.
fn dedup_kinds(strategies: &[RetrievalStrategyKind]) -> Vec<RetrievalStrategyKind> {
    let mut kinds = Vec::with_capacity(strategies.len());
    for kind in strategies {
        if !kinds.contains(kind) {
            kinds.push(*kind);
        }
    }
    kinds
}
