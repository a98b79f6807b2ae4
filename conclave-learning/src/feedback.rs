//! Feedback ingestion: label a finding, adjust its entry, update confidence.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use conclave_core::config::ConfidenceConfig;
use conclave_core::errors::{ConclaveError, ConclaveResult};
use conclave_core::models::FeedbackLabel;
use conclave_core::traits::IMemoryStore;

use crate::scorer::ConfidenceScorer;

/// What a feedback submission changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackOutcome {
    pub finding_id: String,
    /// Entry whose feedback fields were updated.
    pub entry_id: String,
    pub agent_name: String,
    pub category: String,
    pub label: FeedbackLabel,
    /// Accuracy weight now stored on the entry.
    pub accuracy_weight: f64,
    pub calibrated_score: f64,
    pub observation_count: u64,
}

pub struct FeedbackProcessor {
    memory: Arc<dyn IMemoryStore>,
    scorer: Arc<ConfidenceScorer>,
    correct_accuracy_weight: f64,
    incorrect_accuracy_weight: f64,
}

impl FeedbackProcessor {
    pub fn new(
        memory: Arc<dyn IMemoryStore>,
        scorer: Arc<ConfidenceScorer>,
        config: &ConfidenceConfig,
    ) -> Self {
        Self {
            memory,
            scorer,
            correct_accuracy_weight: config.correct_accuracy_weight,
            incorrect_accuracy_weight: config.incorrect_accuracy_weight,
        }
    }

    /// Unweighted feedback on a finding.
    pub fn submit_feedback(&self, finding_id: &str, label: FeedbackLabel) -> ConclaveResult<FeedbackOutcome> {
        self.submit_weighted_feedback(finding_id, label, 1.0)
    }

    /// Feedback counted as `weight` observations.
    #[instrument(skip(self), fields(agent = tracing::field::Empty, category = tracing::field::Empty))]
    pub fn submit_weighted_feedback(
        &self,
        finding_id: &str,
        label: FeedbackLabel,
        weight: f64,
    ) -> ConclaveResult<FeedbackOutcome> {
        if !weight.is_finite() || weight <= 0.0 {
            return Err(ConclaveError::InvalidInput(format!(
                "feedback weight must be positive, got {weight}"
            )));
        }

        let (entry_id, agent_name, category) = self.resolve(finding_id)?;

        let span = tracing::Span::current();
        span.record("agent", agent_name.as_str());
        span.record("category", category.as_str());

        let accuracy_weight = match label {
            FeedbackLabel::Correct => self.correct_accuracy_weight,
            FeedbackLabel::Incorrect => self.incorrect_accuracy_weight,
        };

        self.memory.update_feedback(&entry_id, label, accuracy_weight)?;
        let record = self.scorer.observe(&agent_name, &category, label, weight)?;

        info!(
            label = label.as_str(),
            score = record.calibrated_score,
            "feedback applied"
        );

        Ok(FeedbackOutcome {
            finding_id: finding_id.to_string(),
            entry_id,
            agent_name: record.agent_name,
            category: record.category,
            label,
            accuracy_weight,
            calibrated_score: record.calibrated_score,
            observation_count: record.observation_count,
        })
    }

    /// Map a finding id to (entry id, reporting agent, category).
    ///
    /// Session findings carry a report id, which names the agent that made
    /// the report even when the entry was first stored by another agent. A
    /// bare entry id credits the entry's source agent.
    fn resolve(&self, finding_id: &str) -> ConclaveResult<(String, String, String)> {
        if let Some(report) = self.memory.get_finding(finding_id)? {
            return Ok((report.entry_id, report.agent_name, report.category));
        }
        let entry = self
            .memory
            .get(finding_id)?
            .ok_or_else(|| ConclaveError::NotFound(format!("finding {finding_id}")))?;
        Ok((entry.id, entry.source_agent, entry.category))
    }
}
