//! # conclave-learning
//!
//! Confidence Scorer and feedback ingestion. Scores are Beta-posterior means
//! per (agent, category), updated in O(1) from each observation.

pub mod calibration;
pub mod feedback;
pub mod scorer;

pub use calibration::Calibration;
pub use feedback::{FeedbackOutcome, FeedbackProcessor};
pub use scorer::ConfidenceScorer;
