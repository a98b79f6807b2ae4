use conclave_core::models::{ConfidenceRecord, FeedbackLabel};
use conclave_learning::Calibration;
use proptest::prelude::*;

fn label(correct: bool) -> FeedbackLabel {
    if correct {
        FeedbackLabel::Correct
    } else {
        FeedbackLabel::Incorrect
    }
}

proptest! {
    #[test]
    fn score_stays_inside_open_unit_interval(
        neutral in 0.0f64..=1.0,
        strength in 0.1f64..20.0,
        observations in prop::collection::vec((any::<bool>(), 0.01f64..10.0), 1..60),
    ) {
        let calibration = Calibration { neutral, prior_strength: strength };
        let mut record = ConfidenceRecord::neutral("a", "c", neutral);
        for (correct, weight) in observations {
            record = calibration.update(&record, label(correct), weight);
            prop_assert!(record.calibrated_score > 0.0);
            prop_assert!(record.calibrated_score < 1.0);
        }
    }

    #[test]
    fn identical_positive_feedback_is_monotone(
        neutral in 0.05f64..0.95,
        strength in 0.5f64..10.0,
        steps in 1usize..40,
    ) {
        let calibration = Calibration { neutral, prior_strength: strength };
        let mut record = ConfidenceRecord::neutral("a", "c", neutral);
        let mut previous = neutral;
        for _ in 0..steps {
            record = calibration.update(&record, FeedbackLabel::Correct, 1.0);
            prop_assert!(record.calibrated_score >= previous);
            previous = record.calibrated_score;
        }
        prop_assert!(previous > neutral);
    }

    #[test]
    fn observation_count_tracks_updates(steps in 1usize..30) {
        let calibration = Calibration { neutral: 0.5, prior_strength: 2.0 };
        let mut record = ConfidenceRecord::neutral("a", "c", 0.5);
        for i in 0..steps {
            record = calibration.update(&record, label(i % 2 == 0), 1.0);
        }
        prop_assert_eq!(record.observation_count, steps as u64);
        prop_assert!((record.evidence_weight - steps as f64).abs() < 1e-9);
    }
}
