use crate::errors::ConclaveResult;
use crate::models::ConfidenceRecord;

/// Persistence for confidence records, one row per (agent, category).
pub trait IConfidenceStore: Send + Sync {
    fn load_confidence(
        &self,
        agent_name: &str,
        category: &str,
    ) -> ConclaveResult<Option<ConfidenceRecord>>;

    /// Upsert keyed on (agent, category).
    fn save_confidence(&self, record: &ConfidenceRecord) -> ConclaveResult<()>;

    fn list_confidence(&self) -> ConclaveResult<Vec<ConfidenceRecord>>;
}

/// Read side of the Confidence Scorer, as consumed by retrieval and reporting.
pub trait IConfidenceScorer: Send + Sync {
    /// Calibrated score in `[0, 1]`; the neutral default when never observed.
    fn score(&self, agent_name: &str, category: &str) -> f64;
}
