pub mod agent;
pub mod confidence_record;
pub mod finding;
pub mod input;
pub mod memory_entry;
pub mod progress;
pub mod retrieval;
pub mod session;
pub mod strategy;
pub mod task;

pub use agent::AgentSpec;
pub use confidence_record::ConfidenceRecord;
pub use finding::{AgentOutput, Finding, FindingRef, ReportedFinding, SessionOutcome, Severity};
pub use input::InputDescriptor;
pub use memory_entry::{FeedbackLabel, MemoryEntry};
pub use progress::{ProgressEvent, StatusChange};
pub use retrieval::{RetrievalContext, RetrievalResult, RetrievalStrategyKind, ScoredEntry};
pub use session::{Session, SessionSnapshot, SessionStatus};
pub use strategy::{ExecutionPlan, ExecutionStrategy};
pub use task::{AgentTask, ResultRef, TaskAnnotation, TaskInputContext, TaskStatus};
