//! Error types for every Conclave subsystem.
//!
//! Subsystem enums fold into [`ConclaveError`] via `#[from]`. Retry and
//! degradation decisions are taken on [`ErrorClass`], never on messages.

mod config_error;
mod dispatch_error;
mod orchestration_error;
mod retrieval_error;
mod session_error;
mod storage_error;

pub use config_error::ConfigError;
pub use dispatch_error::DispatchError;
pub use orchestration_error::OrchestrationError;
pub use retrieval_error::RetrievalError;
pub use session_error::SessionStoreError;
pub use storage_error::StorageError;

/// Result alias used across the workspace.
pub type ConclaveResult<T> = Result<T, ConclaveError>;

/// The closed set of error kinds the orchestrator reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// Rate limit or timeout from a provider. Retried with backoff.
    TransientProvider,
    /// Malformed artifact or context. Never retried.
    InvalidInput,
    /// Memory or session store unreachable. Retried a fixed number of times.
    StoreUnavailable,
    /// No resolvable agents or unusable configuration. Fails the session.
    FatalConfiguration,
    /// Any other terminal failure.
    Permanent,
}

/// Top-level error for the Conclave engine.
#[derive(Debug, thiserror::Error)]
pub enum ConclaveError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error(transparent)]
    SessionStore(#[from] SessionStoreError),

    #[error(transparent)]
    Retrieval(#[from] RetrievalError),

    #[error(transparent)]
    Orchestration(#[from] OrchestrationError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("not found: {0}")]
    NotFound(String),
}

impl ConclaveError {
    /// Classify this error into one of the kinds the orchestrator handles.
    pub fn class(&self) -> ErrorClass {
        match self {
            ConclaveError::Storage(e) if e.is_unavailable() => ErrorClass::StoreUnavailable,
            ConclaveError::SessionStore(SessionStoreError::Unavailable { .. }) => {
                ErrorClass::StoreUnavailable
            }
            ConclaveError::Dispatch(e) => e.class(),
            ConclaveError::Orchestration(OrchestrationError::NoResolvableAgents { .. }) => {
                ErrorClass::FatalConfiguration
            }
            ConclaveError::Config(_) => ErrorClass::FatalConfiguration,
            ConclaveError::InvalidInput(_) => ErrorClass::InvalidInput,
            ConclaveError::Retrieval(
                RetrievalError::InvalidLimit { .. } | RetrievalError::NoStrategies,
            ) => ErrorClass::InvalidInput,
            _ => ErrorClass::Permanent,
        }
    }

    /// Whether the error indicates an unreachable store.
    pub fn is_store_unavailable(&self) -> bool {
        self.class() == ErrorClass::StoreUnavailable
    }
}
