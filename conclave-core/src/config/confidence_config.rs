use serde::{Deserialize, Serialize};

use super::defaults;

/// Confidence Scorer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceConfig {
    /// Score reported for an (agent, category) pair with no feedback yet.
    pub neutral_default: f64,
    /// Pseudo-observations backing the neutral prior. Larger values converge slower.
    pub prior_strength: f64,
    /// Accuracy weight written to an entry confirmed correct.
    pub correct_accuracy_weight: f64,
    /// Accuracy weight written to an entry marked incorrect.
    pub incorrect_accuracy_weight: f64,
}

impl Default for ConfidenceConfig {
    fn default() -> Self {
        Self {
            neutral_default: defaults::DEFAULT_NEUTRAL_CONFIDENCE,
            prior_strength: defaults::DEFAULT_PRIOR_STRENGTH,
            correct_accuracy_weight: defaults::DEFAULT_CORRECT_ACCURACY_WEIGHT,
            incorrect_accuracy_weight: defaults::DEFAULT_INCORRECT_ACCURACY_WEIGHT,
        }
    }
}
