//! Beta-Bernoulli calibration update.
//!
//! The stored score is the posterior mean of a Beta prior centred on the
//! neutral default with `prior_strength` pseudo-observations. Folding in an
//! observation `y` with weight `w` over accumulated evidence `n`:
//!
//! ```text
//! m' = (m * (n + s) + w * y) / (n + s + w)
//! ```
//!
//! which only needs the stored `(m, n)`.

use chrono::Utc;

use conclave_core::config::ConfidenceConfig;
use conclave_core::constants::CALIBRATION_EPSILON;
use conclave_core::models::{ConfidenceRecord, FeedbackLabel};

/// Prior parameters for the update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration {
    pub neutral: f64,
    pub prior_strength: f64,
}

impl Calibration {
    pub fn from_config(config: &ConfidenceConfig) -> Self {
        Self {
            neutral: config.neutral_default,
            prior_strength: config.prior_strength,
        }
    }

    /// Fold one weighted observation into `record`.
    pub fn update(&self, record: &ConfidenceRecord, label: FeedbackLabel, weight: f64) -> ConfidenceRecord {
        let n = record.evidence_weight.max(0.0);
        let s = self.prior_strength;
        let m = if record.observation_count == 0 {
            self.neutral
        } else {
            record.calibrated_score
        };
        let y = label.outcome();

        let next = (m * (n + s) + weight * y) / (n + s + weight);

        ConfidenceRecord {
            agent_name: record.agent_name.clone(),
            category: record.category.clone(),
            observation_count: record.observation_count + 1,
            evidence_weight: n + weight,
            calibrated_score: next.clamp(CALIBRATION_EPSILON, 1.0 - CALIBRATION_EPSILON),
            last_updated: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calibration() -> Calibration {
        Calibration {
            neutral: 0.5,
            prior_strength: 2.0,
        }
    }

    #[test]
    fn first_correct_observation_moves_toward_one() {
        let record = ConfidenceRecord::neutral("a", "c", 0.5);
        let next = calibration().update(&record, FeedbackLabel::Correct, 1.0);
        assert!((next.calibrated_score - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(next.observation_count, 1);
        assert_eq!(next.evidence_weight, 1.0);
    }

    #[test]
    fn first_incorrect_observation_moves_toward_zero() {
        let record = ConfidenceRecord::neutral("a", "c", 0.5);
        let next = calibration().update(&record, FeedbackLabel::Incorrect, 1.0);
        assert!((next.calibrated_score - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn heavier_weight_moves_further() {
        let record = ConfidenceRecord::neutral("a", "c", 0.5);
        let light = calibration().update(&record, FeedbackLabel::Correct, 0.5);
        let heavy = calibration().update(&record, FeedbackLabel::Correct, 3.0);
        assert!(heavy.calibrated_score > light.calibrated_score);
    }

    #[test]
    fn matches_batch_posterior_mean() {
        // 3 correct + 1 incorrect under Beta(1, 1): (1 + 3) / (2 + 4).
        let mut record = ConfidenceRecord::neutral("a", "c", 0.5);
        for label in [
            FeedbackLabel::Correct,
            FeedbackLabel::Incorrect,
            FeedbackLabel::Correct,
            FeedbackLabel::Correct,
        ] {
            record = calibration().update(&record, label, 1.0);
        }
        assert!((record.calibrated_score - 4.0 / 6.0).abs() < 1e-12);
    }
}
