use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Calibrated reliability of one agent for one pattern category.
///
/// One record per (agent, category). Updated in place from feedback; the
/// score is always a function of the accumulated evidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceRecord {
    pub agent_name: String,
    pub category: String,
    /// Feedback observations folded into the score.
    pub observation_count: u64,
    /// Sum of observation weights. Equals `observation_count` for unweighted feedback.
    pub evidence_weight: f64,
    /// Posterior mean in `[0, 1]`.
    pub calibrated_score: f64,
    pub last_updated: DateTime<Utc>,
}

impl ConfidenceRecord {
    /// A record with no evidence, sitting at the neutral prior.
    pub fn neutral(agent_name: &str, category: &str, neutral_default: f64) -> Self {
        Self {
            agent_name: agent_name.to_string(),
            category: category.to_string(),
            observation_count: 0,
            evidence_weight: 0.0,
            calibrated_score: neutral_default,
            last_updated: Utc::now(),
        }
    }
}
