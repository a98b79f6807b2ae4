use serde::{Deserialize, Serialize};

use super::defaults;
use crate::models::ExecutionStrategy;

/// Strategy Selector configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    /// Strategy requested for new sessions.
    pub mode: ExecutionStrategy,
    /// Concurrency for PARALLEL sessions. Must be greater than 1.
    pub max_concurrency: usize,
    /// Upper bound on concurrency when SMART chooses to run concurrently.
    pub smart_concurrency: usize,
    /// Upper bound on agents SMART selects.
    pub smart_max_agents: usize,
    /// Agents FOCUSED takes from the catalogue when none are flagged `focused`.
    pub focused_fallback_count: usize,
    /// Inputs at or above this size are considered large.
    pub large_input_bytes: u64,
    /// Inputs at or above this line count are considered large.
    pub large_input_lines: u64,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            mode: ExecutionStrategy::Smart,
            max_concurrency: defaults::DEFAULT_MAX_CONCURRENCY,
            smart_concurrency: defaults::DEFAULT_SMART_CONCURRENCY,
            smart_max_agents: defaults::DEFAULT_SMART_MAX_AGENTS,
            focused_fallback_count: defaults::DEFAULT_FOCUSED_FALLBACK_COUNT,
            large_input_bytes: defaults::DEFAULT_LARGE_INPUT_BYTES,
            large_input_lines: defaults::DEFAULT_LARGE_INPUT_LINES,
        }
    }
}
