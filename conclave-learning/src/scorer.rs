//! ConfidenceScorer: cached read path plus serialized per-key updates.

use std::collections::BTreeMap;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, warn};

use conclave_core::config::ConfidenceConfig;
use conclave_core::errors::{ConclaveError, ConclaveResult};
use conclave_core::models::{ConfidenceRecord, FeedbackLabel};
use conclave_core::traits::{IConfidenceScorer, IConfidenceStore};

use crate::calibration::Calibration;

type Key = (String, String);

pub struct ConfidenceScorer {
    store: Arc<dyn IConfidenceStore>,
    calibration: Calibration,
    neutral: f64,
    /// Write-through cache. The entry lock also serializes updates per key.
    cache: DashMap<Key, ConfidenceRecord>,
}

impl ConfidenceScorer {
    pub fn new(store: Arc<dyn IConfidenceStore>, config: &ConfidenceConfig) -> Self {
        Self {
            store,
            calibration: Calibration::from_config(config),
            neutral: config.neutral_default,
            cache: DashMap::new(),
        }
    }

    pub fn neutral_default(&self) -> f64 {
        self.neutral
    }

    fn load_or_neutral(&self, agent_name: &str, category: &str) -> ConclaveResult<ConfidenceRecord> {
        Ok(self
            .store
            .load_confidence(agent_name, category)?
            .unwrap_or_else(|| ConfidenceRecord::neutral(agent_name, category, self.neutral)))
    }

    /// Current record for (agent, category), neutral if never observed.
    pub fn record(&self, agent_name: &str, category: &str) -> ConclaveResult<ConfidenceRecord> {
        let key = (agent_name.to_string(), category.to_string());
        if let Some(cached) = self.cache.get(&key) {
            return Ok(cached.clone());
        }
        let record = self.load_or_neutral(agent_name, category)?;
        self.cache.insert(key, record.clone());
        Ok(record)
    }

    /// Fold one observation into (agent, category) and persist it.
    ///
    /// The cache is only updated once the store has accepted the write.
    pub fn observe(
        &self,
        agent_name: &str,
        category: &str,
        label: FeedbackLabel,
        weight: f64,
    ) -> ConclaveResult<ConfidenceRecord> {
        if !weight.is_finite() || weight <= 0.0 {
            return Err(ConclaveError::InvalidInput(format!(
                "feedback weight must be positive, got {weight}"
            )));
        }

        let key = (agent_name.to_string(), category.to_string());
        let mut slot = self
            .cache
            .entry(key)
            .or_try_insert_with(|| self.load_or_neutral(agent_name, category))?;

        let updated = self.calibration.update(&slot, label, weight);
        self.store.save_confidence(&updated)?;
        *slot = updated.clone();

        debug!(
            agent = agent_name,
            category,
            label = label.as_str(),
            weight,
            score = updated.calibrated_score,
            observations = updated.observation_count,
            "confidence updated"
        );
        Ok(updated)
    }

    /// Calibrated score for (agent, category), neutral if never observed or
    /// if the record cannot be read.
    pub fn score(&self, agent_name: &str, category: &str) -> f64 {
        match self.record(agent_name, category) {
            Ok(record) if record.observation_count > 0 => record.calibrated_score,
            Ok(_) => self.neutral,
            Err(e) => {
                warn!(agent = agent_name, category, error = %e, "confidence lookup failed, using neutral");
                self.neutral
            }
        }
    }

    /// All persisted records.
    pub fn records(&self) -> ConclaveResult<Vec<ConfidenceRecord>> {
        self.store.list_confidence()
    }

    /// Category → score map handed to an agent with its task.
    pub fn weights_for(&self, agent_name: &str, categories: &[String]) -> BTreeMap<String, f64> {
        categories
            .iter()
            .map(|c| (c.clone(), self.score(agent_name, c)))
            .collect()
    }
}

impl IConfidenceScorer for ConfidenceScorer {
    fn score(&self, agent_name: &str, category: &str) -> f64 {
        ConfidenceScorer::score(self, agent_name, category)
    }
}
