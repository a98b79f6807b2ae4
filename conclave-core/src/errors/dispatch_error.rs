use super::ErrorClass;

/// Typed failures returned by the agent dispatch boundary.
///
/// Adapters never fail silently: every timeout or rate-limit surfaces here.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DispatchError {
    #[error("provider {provider} rate-limited the request")]
    RateLimited {
        provider: String,
        retry_after_ms: Option<u64>,
    },

    #[error("agent {agent} timed out after {timeout_ms}ms")]
    Timeout { agent: String, timeout_ms: u64 },

    #[error("agent {agent} rejected its input: {reason}")]
    InvalidInput { agent: String, reason: String },

    #[error("agent {agent} is not registered with the dispatcher")]
    UnknownAgent { agent: String },

    #[error("agent {agent} failed: {reason}")]
    Provider { agent: String, reason: String },
}

impl DispatchError {
    pub fn class(&self) -> ErrorClass {
        match self {
            DispatchError::RateLimited { .. } | DispatchError::Timeout { .. } => {
                ErrorClass::TransientProvider
            }
            DispatchError::InvalidInput { .. } => ErrorClass::InvalidInput,
            DispatchError::UnknownAgent { .. } => ErrorClass::FatalConfiguration,
            DispatchError::Provider { .. } => ErrorClass::Permanent,
        }
    }

    /// Whether the provider explicitly signalled a rate limit.
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, DispatchError::RateLimited { .. })
    }

    pub fn is_transient(&self) -> bool {
        self.class() == ErrorClass::TransientProvider
    }
}
