//! Per-task retry policy: bounded exponential backoff with jitter.

use std::time::Duration;

use conclave_core::config::DispatchConfig;
use conclave_core::errors::ErrorClass;

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Dispatch attempts per task, including the first.
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub jitter_factor: f64,
}

impl RetryPolicy {
    pub fn from_config(config: &DispatchConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay_ms: config.retry_base_delay_ms,
            max_delay_ms: config.retry_max_delay_ms,
            jitter_factor: config.retry_jitter_factor,
        }
    }

    /// Whether a failure of `class` on attempt `attempt` (1-based) is retried.
    ///
    /// Only transient provider errors are retried.
    pub fn should_retry(&self, class: ErrorClass, attempt: u32) -> bool {
        class == ErrorClass::TransientProvider && attempt < self.max_attempts
    }

    /// Delay before the retry that follows attempt `attempt` (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        Duration::from_millis(backoff_delay(
            attempt.saturating_sub(1),
            self.base_delay_ms,
            self.max_delay_ms,
            self.jitter_factor,
            rand::random::<f64>(),
        ))
    }
}

/// `min(max_delay, base_delay * 2^step) * (1 + (2r - 1) * jitter)`.
///
/// `step` is zero-based. `random` is in `[0, 1)`; the jitter is symmetric,
/// so a factor of 0.2 varies the delay by ±20%.
pub fn backoff_delay(
    step: u32,
    base_delay_ms: u64,
    max_delay_ms: u64,
    jitter_factor: f64,
    random: f64,
) -> u64 {
    let exponential = base_delay_ms.saturating_mul(1u64 << step.min(31));
    let capped = exponential.min(max_delay_ms);
    let jitter = 1.0 + (random * 2.0 - 1.0) * jitter_factor.clamp(0.0, 1.0);
    ((capped as f64) * jitter).round().max(0.0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_then_caps() {
        assert_eq!(backoff_delay(0, 100, 1_000, 0.0, 0.5), 100);
        assert_eq!(backoff_delay(1, 100, 1_000, 0.0, 0.5), 200);
        assert_eq!(backoff_delay(3, 100, 1_000, 0.0, 0.5), 800);
        assert_eq!(backoff_delay(4, 100, 1_000, 0.0, 0.5), 1_000);
        assert_eq!(backoff_delay(63, 100, 1_000, 0.0, 0.5), 1_000);
    }

    #[test]
    fn jitter_is_symmetric() {
        assert_eq!(backoff_delay(0, 1_000, 10_000, 0.2, 0.0), 800);
        assert_eq!(backoff_delay(0, 1_000, 10_000, 0.2, 0.5), 1_000);
        assert!(backoff_delay(0, 1_000, 10_000, 0.2, 0.999_999) <= 1_200);
    }

    #[test]
    fn only_transient_errors_retry_within_budget() {
        let policy = RetryPolicy::from_config(&DispatchConfig::default());
        assert!(policy.should_retry(ErrorClass::TransientProvider, 1));
        assert!(policy.should_retry(ErrorClass::TransientProvider, 2));
        assert!(!policy.should_retry(ErrorClass::TransientProvider, 3));
        assert!(!policy.should_retry(ErrorClass::InvalidInput, 1));
        assert!(!policy.should_retry(ErrorClass::Permanent, 1));
    }
}
