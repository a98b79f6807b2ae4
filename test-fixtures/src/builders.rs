//! Short constructors for test inputs.

use conclave_core::config::ConclaveConfig;
use conclave_core::models::{AgentSpec, ExecutionStrategy, Finding, InputDescriptor, MemoryEntry};

pub fn input(id: &str, content: &str) -> InputDescriptor {
    InputDescriptor::new(id, content)
}

pub fn agent(name: &str, provider: &str, categories: &[&str]) -> AgentSpec {
    AgentSpec::new(name, provider).with_categories(categories.iter().copied())
}

pub fn focused_agent(name: &str, provider: &str, categories: &[&str]) -> AgentSpec {
    agent(name, provider, categories).focused()
}

pub fn finding(category: &str, summary: &str) -> Finding {
    Finding::new(category, summary)
}

pub fn entry(category: &str, payload: &str) -> MemoryEntry {
    MemoryEntry::new(category, payload, "fixture-session", "fixture-agent")
}

/// Config with the given catalogue and strategy, and short retry delays.
pub fn config(strategy: ExecutionStrategy, agents: Vec<AgentSpec>) -> ConclaveConfig {
    let mut config = ConclaveConfig::default();
    config.strategy.mode = strategy;
    config.agents = agents;
    config.dispatch.retry_base_delay_ms = 10;
    config.dispatch.retry_max_delay_ms = 100;
    config.dispatch.retry_jitter_factor = 0.0;
    config.rate_limit.base_delay_ms = 200;
    config.rate_limit.max_delay_ms = 2_000;
    config.rate_limit.jitter_factor = 0.0;
    config.retrieval.store_retry_delay_ms = 1;
    config.session.state_write_delay_ms = 1;
    config
}
