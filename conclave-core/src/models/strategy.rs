use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Session-wide execution strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStrategy {
    /// Signal-driven subset and concurrency; falls back to FOCUSED.
    #[default]
    Smart,
    /// Small fixed subset, strictly sequential.
    Focused,
    /// Every enabled agent at the configured maximum concurrency.
    Parallel,
}

impl ExecutionStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionStrategy::Smart => "smart",
            ExecutionStrategy::Focused => "focused",
            ExecutionStrategy::Parallel => "parallel",
        }
    }
}

impl fmt::Display for ExecutionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExecutionStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "smart" => Ok(ExecutionStrategy::Smart),
            "focused" => Ok(ExecutionStrategy::Focused),
            "parallel" => Ok(ExecutionStrategy::Parallel),
            other => Err(format!("unknown execution strategy: {other}")),
        }
    }
}

/// Output of strategy selection: which agents run, in what order, how wide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionPlan {
    /// The strategy actually applied (SMART may resolve to FOCUSED).
    pub strategy: ExecutionStrategy,
    /// Agent names in dispatch order.
    pub agents: Vec<String>,
    pub concurrency_limit: usize,
    /// Set when the requested strategy fell back to another.
    pub fallback_reason: Option<String>,
}

impl ExecutionPlan {
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}
