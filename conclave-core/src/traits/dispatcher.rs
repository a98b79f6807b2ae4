use async_trait::async_trait;

use crate::errors::DispatchError;
use crate::models::{AgentOutput, TaskInputContext};

/// Uniform invocation boundary to external agents.
///
/// Implementations are stateless and replay-safe: invoking twice with the
/// same input is an allowed recovery action. Timeouts and rate limits come
/// back as typed [`DispatchError`]s.
#[async_trait]
pub trait IAgentDispatcher: Send + Sync {
    async fn invoke(
        &self,
        agent_name: &str,
        input: &TaskInputContext,
    ) -> Result<AgentOutput, DispatchError>;

    /// Whether this dispatcher can reach `agent_name`.
    fn resolves(&self, _agent_name: &str) -> bool {
        true
    }
}
