use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::fingerprint;

/// Outcome label attached to an entry by reviewer feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackLabel {
    Correct,
    Incorrect,
}

impl FeedbackLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackLabel::Correct => "correct",
            FeedbackLabel::Incorrect => "incorrect",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "correct" => Some(FeedbackLabel::Correct),
            "incorrect" => Some(FeedbackLabel::Incorrect),
            _ => None,
        }
    }

    /// Bernoulli outcome used by the calibration update.
    pub fn outcome(&self) -> f64 {
        match self {
            FeedbackLabel::Correct => 1.0,
            FeedbackLabel::Incorrect => 0.0,
        }
    }
}

/// A durable record of a past finding, usable as context for later sessions.
///
/// The fingerprint is unique within a category. After insertion only
/// `feedback_label` and `accuracy_weight` ever change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryEntry {
    pub id: String,
    pub category: String,
    pub fingerprint: String,
    /// SimHash of the payload tokens.
    pub signature: u64,
    pub payload: String,
    pub tags: Vec<String>,
    pub descriptors: Vec<String>,
    pub source_session_id: String,
    pub source_agent: String,
    pub created_at: DateTime<Utc>,
    pub feedback_label: Option<FeedbackLabel>,
    /// Retrieval multiplier, lowered when the entry is marked incorrect.
    pub accuracy_weight: f64,
}

impl MemoryEntry {
    /// Build an unlabelled entry, deriving fingerprint and signature from the payload.
    pub fn new(
        category: impl Into<String>,
        payload: impl Into<String>,
        source_session_id: impl Into<String>,
        source_agent: impl Into<String>,
    ) -> Self {
        let payload = payload.into();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            category: category.into(),
            fingerprint: fingerprint::fingerprint(&payload),
            signature: fingerprint::signature(&payload),
            payload,
            tags: Vec::new(),
            descriptors: Vec::new(),
            source_session_id: source_session_id.into(),
            source_agent: source_agent.into(),
            created_at: Utc::now(),
            feedback_label: None,
            accuracy_weight: 1.0,
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_descriptors<I, S>(mut self, descriptors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.descriptors = descriptors.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_feedback(mut self, label: FeedbackLabel, accuracy_weight: f64) -> Self {
        self.feedback_label = Some(label);
        self.accuracy_weight = accuracy_weight;
        self
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}
