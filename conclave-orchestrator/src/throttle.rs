//! ProviderThrottle: pacing and adaptive backoff shared by every task that
//! targets the same provider.
//!
//! Two mechanisms gate each dispatch:
//! - an adaptive penalty: each rate-limit signal raises the provider's level
//!   and pushes its `next_allowed_at` out by an exponential, jittered delay;
//!   each success lowers the level by one.
//! - an optional token bucket (`requests_per_second`, `burst`).

use std::time::Duration;

use dashmap::DashMap;
use serde::Serialize;
use tokio::time::Instant;

use conclave_core::config::RateLimitConfig;
use conclave_observability::tracing_setup::events;

use crate::retry::backoff_delay;

/// Highest penalty level; the delay is capped well before this anyway.
const MAX_PENALTY_LEVEL: u32 = 16;

/// Per-provider counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProviderStats {
    pub acquired: u64,
    pub rate_limited: u64,
    pub total_wait_ms: u64,
    pub penalty_level: u32,
}

struct ProviderState {
    penalty_level: u32,
    next_allowed_at: Option<Instant>,
    tokens: f64,
    last_refill: Instant,
    stats: ProviderStats,
}

impl ProviderState {
    fn new(burst: f64) -> Self {
        Self {
            penalty_level: 0,
            next_allowed_at: None,
            tokens: burst,
            last_refill: Instant::now(),
            stats: ProviderStats::default(),
        }
    }
}

pub struct ProviderThrottle {
    config: RateLimitConfig,
    providers: DashMap<String, ProviderState>,
}

impl ProviderThrottle {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            providers: DashMap::new(),
        }
    }

    fn burst(&self) -> f64 {
        f64::from(self.config.burst.max(1))
    }

    /// Wait until `provider` may be called, then take a slot.
    /// Returns the total time spent waiting.
    pub async fn acquire(&self, provider: &str) -> Duration {
        let started = Instant::now();
        loop {
            let wait = self.try_take(provider);
            if wait.is_zero() {
                break;
            }
            tokio::time::sleep(wait).await;
        }
        let waited = started.elapsed();
        if let Some(mut state) = self.providers.get_mut(provider) {
            state.stats.total_wait_ms += waited.as_millis() as u64;
        }
        waited
    }

    /// Take a slot now, or report how long to wait before trying again.
    fn try_take(&self, provider: &str) -> Duration {
        let burst = self.burst();
        let rate = self.config.rate_for(provider);
        let now = Instant::now();
        let mut state = self
            .providers
            .entry(provider.to_string())
            .or_insert_with(|| ProviderState::new(burst));

        if let Some(at) = state.next_allowed_at {
            if at > now {
                return at - now;
            }
        }

        if let Some(rate) = rate.filter(|r| *r > 0.0) {
            let elapsed = now.duration_since(state.last_refill).as_secs_f64();
            state.tokens = (state.tokens + elapsed * rate).min(burst);
            state.last_refill = now;
            if state.tokens < 1.0 {
                return Duration::from_secs_f64((1.0 - state.tokens) / rate);
            }
            state.tokens -= 1.0;
        }

        state.stats.acquired += 1;
        Duration::ZERO
    }

    /// Record an explicit rate-limit signal. Raises the provider's penalty and
    /// delays every caller targeting it. Returns the imposed delay.
    pub fn on_rate_limited(&self, provider: &str, retry_after_ms: Option<u64>) -> Duration {
        let burst = self.burst();
        let mut state = self
            .providers
            .entry(provider.to_string())
            .or_insert_with(|| ProviderState::new(burst));

        state.penalty_level = (state.penalty_level + 1).min(MAX_PENALTY_LEVEL);
        state.stats.rate_limited += 1;
        state.stats.penalty_level = state.penalty_level;

        let delay_ms = backoff_delay(
            state.penalty_level - 1,
            self.config.base_delay_ms,
            self.config.max_delay_ms,
            self.config.jitter_factor,
            rand::random::<f64>(),
        )
        .max(retry_after_ms.unwrap_or(0));
        let until = Instant::now() + Duration::from_millis(delay_ms);
        state.next_allowed_at = Some(match state.next_allowed_at {
            Some(existing) if existing > until => existing,
            _ => until,
        });

        events::rate_limited(provider, state.penalty_level, delay_ms);
        Duration::from_millis(delay_ms)
    }

    /// Record a successful call; the penalty decays by one level.
    pub fn on_success(&self, provider: &str) {
        if let Some(mut state) = self.providers.get_mut(provider) {
            state.penalty_level = state.penalty_level.saturating_sub(1);
            state.stats.penalty_level = state.penalty_level;
        }
    }

    /// Remaining adaptive delay for a provider.
    pub fn current_delay(&self, provider: &str) -> Duration {
        let now = Instant::now();
        self.providers
            .get(provider)
            .and_then(|s| s.next_allowed_at)
            .map(|at| at.saturating_duration_since(now))
            .unwrap_or(Duration::ZERO)
    }

    pub fn penalty_level(&self, provider: &str) -> u32 {
        self.providers
            .get(provider)
            .map(|s| s.penalty_level)
            .unwrap_or(0)
    }

    pub fn stats(&self, provider: &str) -> Option<ProviderStats> {
        self.providers.get(provider).map(|s| s.stats.clone())
    }
}
