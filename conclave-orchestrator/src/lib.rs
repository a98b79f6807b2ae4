//! # conclave-orchestrator
//!
//! The top-level state machine. Selects a strategy per session, fans tasks
//! out over a bounded worker pool, enriches each task with retrieved memory
//! and confidence weights, retries transient failures with backoff, paces
//! providers through a shared throttle, and records findings for learning.

pub mod dispatch;
pub mod orchestrator;
pub mod retry;
pub mod strategy;
pub mod throttle;

pub use orchestrator::{Orchestrator, OrchestratorBuilder};
pub use retry::RetryPolicy;
pub use strategy::select;
pub use throttle::{ProviderStats, ProviderThrottle};
