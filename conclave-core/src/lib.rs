//! # conclave-core
//!
//! Foundation crate for the Conclave orchestration engine.
//! Defines the data model, traits, errors, config, and fingerprinting.
//! Every other crate in the workspace depends on this.

pub mod config;
pub mod constants;
pub mod errors;
pub mod fingerprint;
pub mod models;
pub mod traits;

// Re-export the most commonly used types at the crate root.
pub use config::ConclaveConfig;
pub use errors::{ConclaveError, ConclaveResult, ErrorClass};
pub use models::{
    AgentTask, ConfidenceRecord, ExecutionPlan, ExecutionStrategy, FeedbackLabel,
    InputDescriptor, MemoryEntry, ProgressEvent, RetrievalResult, Session, SessionStatus,
    TaskStatus,
};
