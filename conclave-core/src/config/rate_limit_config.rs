use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::defaults;

/// Shared provider throttle configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Delay imposed after the first rate-limit signal from a provider.
    pub base_delay_ms: u64,
    /// Cap on the adaptive delay.
    pub max_delay_ms: u64,
    /// Jitter factor applied to the adaptive delay (0.0–1.0).
    pub jitter_factor: f64,
    /// Steady-state pacing for every provider. `None` disables pacing.
    pub requests_per_second: Option<f64>,
    /// Tokens a provider bucket can accumulate.
    pub burst: u32,
    /// Per-provider pacing overrides.
    pub provider_overrides: HashMap<String, f64>,
}

impl RateLimitConfig {
    /// Pacing rate for a provider, if any.
    pub fn rate_for(&self, provider: &str) -> Option<f64> {
        self.provider_overrides
            .get(provider)
            .copied()
            .or(self.requests_per_second)
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: defaults::DEFAULT_RATE_LIMIT_BASE_DELAY_MS,
            max_delay_ms: defaults::DEFAULT_RATE_LIMIT_MAX_DELAY_MS,
            jitter_factor: defaults::DEFAULT_RATE_LIMIT_JITTER_FACTOR,
            requests_per_second: None,
            burst: defaults::DEFAULT_RATE_LIMIT_BURST,
            provider_overrides: HashMap::new(),
        }
    }
}
