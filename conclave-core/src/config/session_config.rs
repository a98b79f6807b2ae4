use serde::{Deserialize, Serialize};

use super::defaults;

/// Session State Store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Seconds a terminal session stays readable before expiry.
    pub ttl_secs: u64,
    /// Capacity of each session's broadcast channel.
    pub channel_capacity: usize,
    /// Attempts for a state write before the session is failed.
    pub state_write_attempts: u32,
    /// Fixed delay between state write attempts.
    pub state_write_delay_ms: u64,
    /// Interval of the background expiry sweeper.
    pub sweep_interval_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_secs: defaults::DEFAULT_SESSION_TTL_SECS,
            channel_capacity: defaults::DEFAULT_CHANNEL_CAPACITY,
            state_write_attempts: defaults::DEFAULT_STATE_WRITE_ATTEMPTS,
            state_write_delay_ms: defaults::DEFAULT_STATE_WRITE_DELAY_MS,
            sweep_interval_secs: defaults::DEFAULT_SWEEP_INTERVAL_SECS,
        }
    }
}
