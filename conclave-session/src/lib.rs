//! # conclave-session
//!
//! In-process Session State Store. Sessions are partitioned by id in a
//! `DashMap`; every transition is applied and published under the session's
//! shard lock, so readers see their own writes and events leave in order.

pub mod context;
pub mod deduplication;
pub mod emitter;
pub mod manager;
pub mod summary;
pub mod sweeper;

pub use deduplication::ProgressDeduplicator;
pub use manager::InMemorySessionStore;
pub use summary::ProgressSummary;
pub use sweeper::spawn_expiry_sweeper;
