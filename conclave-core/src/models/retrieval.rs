use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{InputDescriptor, MemoryEntry};

/// The combinable retrieval strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalStrategyKind {
    /// Structural descriptor match.
    Contextual,
    /// Signature nearest neighbours.
    Similarity,
    /// Exact category + tag match.
    Pattern,
    /// Token overlap over payload text.
    Content,
}

impl RetrievalStrategyKind {
    pub const ALL: [RetrievalStrategyKind; 4] = [
        RetrievalStrategyKind::Contextual,
        RetrievalStrategyKind::Similarity,
        RetrievalStrategyKind::Pattern,
        RetrievalStrategyKind::Content,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RetrievalStrategyKind::Contextual => "contextual",
            RetrievalStrategyKind::Similarity => "similarity",
            RetrievalStrategyKind::Pattern => "pattern",
            RetrievalStrategyKind::Content => "content",
        }
    }
}

impl fmt::Display for RetrievalStrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RetrievalStrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "contextual" => Ok(RetrievalStrategyKind::Contextual),
            "similarity" => Ok(RetrievalStrategyKind::Similarity),
            "pattern" => Ok(RetrievalStrategyKind::Pattern),
            "content" => Ok(RetrievalStrategyKind::Content),
            other => Err(format!("unknown retrieval strategy: {other}")),
        }
    }
}

/// What retrieval matches against: the current artifact plus the categories of interest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetrievalContext {
    /// Categories of interest. Empty means all categories.
    pub categories: Vec<String>,
    pub descriptors: Vec<String>,
    pub tags: Vec<String>,
    pub text: String,
}

impl RetrievalContext {
    pub fn from_input(input: &InputDescriptor, categories: &[String]) -> Self {
        Self {
            categories: categories.to_vec(),
            descriptors: input.descriptors.clone(),
            tags: input.tags.clone(),
            text: input.content.clone(),
        }
    }
}

/// A memory entry with its merged relevance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredEntry {
    pub entry: MemoryEntry,
    pub relevance: f64,
    /// Raw per-strategy scores before weighting.
    pub strategy_scores: BTreeMap<RetrievalStrategyKind, f64>,
}

/// Ranked, bounded context bundle produced per retrieval call. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub entries: Vec<ScoredEntry>,
    pub strategies: Vec<RetrievalStrategyKind>,
    /// True when the store was unreachable and the bundle was left empty.
    pub degraded: bool,
}

impl RetrievalResult {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Empty bundle standing in for an unreachable store.
    pub fn degraded(strategies: &[RetrievalStrategyKind]) -> Self {
        Self {
            entries: Vec::new(),
            strategies: strategies.to_vec(),
            degraded: true,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry ids in rank order.
    pub fn ids(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.entry.id.as_str()).collect()
    }
}
