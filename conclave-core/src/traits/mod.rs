mod confidence;
mod dispatcher;
mod memory_store;
mod session_store;

pub use confidence::{IConfidenceScorer, IConfidenceStore};
pub use dispatcher::IAgentDispatcher;
pub use memory_store::{IMemoryStore, PutOutcome, RetentionPolicy, StrategyParams};
pub use session_store::{ISessionStateStore, ProgressSubscription};
