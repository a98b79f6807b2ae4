use serde::{Deserialize, Serialize};

use super::defaults;

/// Agent dispatch and retry configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Timeout for a single agent invocation.
    pub timeout_ms: u64,
    /// Maximum dispatch attempts per task, including the first.
    pub max_attempts: u32,
    /// Base delay of the per-task exponential backoff.
    pub retry_base_delay_ms: u64,
    /// Cap on the per-task backoff delay.
    pub retry_max_delay_ms: u64,
    /// Jitter factor applied to the backoff (0.0–1.0).
    pub retry_jitter_factor: f64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            timeout_ms: defaults::DEFAULT_DISPATCH_TIMEOUT_MS,
            max_attempts: defaults::DEFAULT_MAX_ATTEMPTS,
            retry_base_delay_ms: defaults::DEFAULT_RETRY_BASE_DELAY_MS,
            retry_max_delay_ms: defaults::DEFAULT_RETRY_MAX_DELAY_MS,
            retry_jitter_factor: defaults::DEFAULT_RETRY_JITTER_FACTOR,
        }
    }
}
