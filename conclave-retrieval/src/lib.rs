//! # conclave-retrieval
//!
//! Retrieval Coordinator: runs the requested strategies against the memory
//! store, merges their scored candidates by normalized weighted sum, and
//! returns a bounded, deterministically ranked context bundle.

pub mod coordinator;
pub mod fusion;
pub mod strategies;

pub use coordinator::RetrievalCoordinator;
pub use fusion::{fuse, normalized_weights, Candidate};
