use std::collections::BTreeMap;

use crate::constants::SIGNATURE_BANDS;
use crate::errors::ConclaveResult;
use crate::models::{FeedbackLabel, FindingRef, MemoryEntry};

/// Result of a `put`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PutOutcome {
    /// A new entry was written.
    Inserted { id: String },
    /// An entry with the same (category, fingerprint) already existed. Its
    /// payload is untouched; feedback fields were updated only if the
    /// incoming entry carried a label.
    Deduplicated { id: String },
}

impl PutOutcome {
    /// Id of the stored entry, which for a duplicate is the original's id.
    pub fn id(&self) -> &str {
        match self {
            PutOutcome::Inserted { id } | PutOutcome::Deduplicated { id } => id,
        }
    }

    pub fn was_inserted(&self) -> bool {
        matches!(self, PutOutcome::Inserted { .. })
    }
}

/// Per-strategy candidate lookup. Every variant is answered from an index.
#[derive(Debug, Clone, PartialEq)]
pub enum StrategyParams {
    /// Entries sharing any structural descriptor.
    Descriptors { values: Vec<String>, limit: usize },
    /// Entries sharing any signature band.
    SignatureBands {
        bands: [u16; SIGNATURE_BANDS],
        limit: usize,
    },
    /// Entries carrying any of the tags.
    Tags { values: Vec<String>, limit: usize },
    /// Full-text match on any of the terms.
    Terms { terms: Vec<String>, limit: usize },
    /// Most recent entries.
    Recent { limit: usize },
}

impl StrategyParams {
    pub fn limit(&self) -> usize {
        match self {
            StrategyParams::Descriptors { limit, .. }
            | StrategyParams::SignatureBands { limit, .. }
            | StrategyParams::Tags { limit, .. }
            | StrategyParams::Terms { limit, .. }
            | StrategyParams::Recent { limit } => *limit,
        }
    }
}

/// Which entries retention may delete.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetentionPolicy {
    /// Entries older than this are eligible.
    pub max_age_days: u32,
    /// Spare entries that carry a feedback label.
    pub keep_labeled: bool,
}

/// Durable memory of past findings.
///
/// All operations are safe under concurrent callers.
pub trait IMemoryStore: Send + Sync {
    /// Insert, or deduplicate against an existing (category, fingerprint).
    fn put(&self, entry: &MemoryEntry) -> ConclaveResult<PutOutcome>;

    fn get(&self, id: &str) -> ConclaveResult<Option<MemoryEntry>>;

    fn get_by_fingerprint(
        &self,
        category: &str,
        fingerprint: &str,
    ) -> ConclaveResult<Option<MemoryEntry>>;

    /// Candidates for one strategy, optionally restricted to a category.
    /// Order is deterministic for an unchanged store.
    fn query(
        &self,
        category: Option<&str>,
        params: &StrategyParams,
    ) -> ConclaveResult<Vec<MemoryEntry>>;

    /// Set the feedback label and accuracy weight. Never touches the payload.
    fn update_feedback(&self, id: &str, label: FeedbackLabel, weight: f64) -> ConclaveResult<()>;

    /// Record an agent's report of a stored entry. The entry must exist.
    fn record_finding(&self, finding: &FindingRef) -> ConclaveResult<()>;

    fn get_finding(&self, id: &str) -> ConclaveResult<Option<FindingRef>>;

    fn count(&self) -> ConclaveResult<usize>;

    fn count_by_category(&self) -> ConclaveResult<BTreeMap<String, usize>>;

    /// Delete entries the policy marks as expired. Returns the number removed.
    fn apply_retention(&self, policy: &RetentionPolicy) -> ConclaveResult<usize>;
}
