//! Agent dispatch with a bounded timeout.

use std::time::Duration;

use conclave_core::errors::DispatchError;
use conclave_core::models::{AgentOutput, TaskInputContext};
use conclave_core::traits::IAgentDispatcher;

/// Invoke an agent, turning an elapsed deadline into a typed timeout.
///
/// The dispatcher future is dropped on timeout; adapters are replay-safe so
/// the orchestrator may invoke again.
pub async fn invoke_with_timeout(
    dispatcher: &dyn IAgentDispatcher,
    agent_name: &str,
    input: &TaskInputContext,
    timeout: Duration,
) -> Result<AgentOutput, DispatchError> {
    match tokio::time::timeout(timeout, dispatcher.invoke(agent_name, input)).await {
        Ok(result) => result,
        Err(_) => Err(DispatchError::Timeout {
            agent: agent_name.to_string(),
            timeout_ms: timeout.as_millis() as u64,
        }),
    }
}
