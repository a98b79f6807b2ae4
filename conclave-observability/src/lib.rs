//! # conclave-observability
//!
//! Structured tracing with span definitions, lock-free orchestration metrics,
//! and degradation event tracking.

pub mod degradation;
pub mod metrics;
pub mod tracing_setup;

pub use degradation::{DegradationEvent, DegradationTracker, RecoveryStatus, TrackedDegradation};
pub use metrics::{MetricsSnapshot, OrchestrationMetrics};
pub use tracing_setup::{init_tracing, init_tracing_from_config, init_tracing_with_filter};
