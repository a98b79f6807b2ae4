//! ScriptedDispatcher: each agent replays a queue of scripted steps.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use conclave_core::errors::DispatchError;
use conclave_core::models::{AgentOutput, Finding, TaskInputContext};
use conclave_core::traits::IAgentDispatcher;

/// One scripted response.
#[derive(Debug, Clone)]
pub enum Step {
    Succeed(AgentOutput),
    Fail(DispatchError),
    /// Wait, then respond with the inner step.
    Delay(Duration, Box<Step>),
}

impl Step {
    pub fn ok() -> Self {
        Step::Succeed(AgentOutput::default())
    }

    pub fn findings(findings: Vec<Finding>) -> Self {
        Step::Succeed(AgentOutput {
            findings,
            raw_confidence: None,
        })
    }

    pub fn rate_limited(provider: &str) -> Self {
        Step::Fail(DispatchError::RateLimited {
            provider: provider.to_string(),
            retry_after_ms: None,
        })
    }

    pub fn timeout(agent: &str) -> Self {
        Step::Fail(DispatchError::Timeout {
            agent: agent.to_string(),
            timeout_ms: 1,
        })
    }

    pub fn invalid(agent: &str) -> Self {
        Step::Fail(DispatchError::InvalidInput {
            agent: agent.to_string(),
            reason: "scripted invalid input".to_string(),
        })
    }

    pub fn fail(agent: &str) -> Self {
        Step::Fail(DispatchError::Provider {
            agent: agent.to_string(),
            reason: "scripted failure".to_string(),
        })
    }

    pub fn after(self, millis: u64) -> Self {
        Step::Delay(Duration::from_millis(millis), Box::new(self))
    }
}

/// A recorded call to the dispatcher.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub agent: String,
    pub task_id: String,
    pub session_id: String,
    pub memory_entries: usize,
    pub at: Instant,
}

/// Agent dispatcher for tests. Agents without a script succeed with no findings.
#[derive(Default)]
pub struct ScriptedDispatcher {
    scripts: Mutex<HashMap<String, VecDeque<Step>>>,
    fallback: Mutex<HashMap<String, Step>>,
    unresolvable: HashSet<String>,
    log: Mutex<Vec<Invocation>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ScriptedDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue steps for an agent, consumed one per invocation.
    pub fn script(self, agent: &str, steps: Vec<Step>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .entry(agent.to_string())
            .or_default()
            .extend(steps);
        self
    }

    /// Step used once the agent's script is exhausted.
    pub fn always(self, agent: &str, step: Step) -> Self {
        self.fallback.lock().unwrap().insert(agent.to_string(), step);
        self
    }

    /// Make `resolves` return false for this agent.
    pub fn unresolvable(mut self, agent: &str) -> Self {
        self.unresolvable.insert(agent.to_string());
        self
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.log.lock().unwrap().clone()
    }

    pub fn invocations_for(&self, agent: &str) -> Vec<Invocation> {
        self.invocations()
            .into_iter()
            .filter(|i| i.agent == agent)
            .collect()
    }

    pub fn call_count(&self, agent: &str) -> usize {
        self.log.lock().unwrap().iter().filter(|i| i.agent == agent).count()
    }

    pub fn total_calls(&self) -> usize {
        self.log.lock().unwrap().len()
    }

    /// Highest number of simultaneous invocations observed.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn next_step(&self, agent: &str) -> Step {
        if let Some(step) = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(agent)
            .and_then(VecDeque::pop_front)
        {
            return step;
        }
        self.fallback
            .lock()
            .unwrap()
            .get(agent)
            .cloned()
            .unwrap_or_else(Step::ok)
    }
}

#[async_trait]
impl IAgentDispatcher for ScriptedDispatcher {
    async fn invoke(
        &self,
        agent_name: &str,
        input: &TaskInputContext,
    ) -> Result<AgentOutput, DispatchError> {
        if self.unresolvable.contains(agent_name) {
            return Err(DispatchError::UnknownAgent {
                agent: agent_name.to_string(),
            });
        }
        self.log.lock().unwrap().push(Invocation {
            agent: agent_name.to_string(),
            task_id: input.task_id.clone(),
            session_id: input.session_id.clone(),
            memory_entries: input.memory.len(),
            at: Instant::now(),
        });

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlight(&self.in_flight);

        let mut step = self.next_step(agent_name);
        loop {
            match step {
                Step::Succeed(output) => return Ok(output),
                Step::Fail(error) => return Err(error),
                Step::Delay(duration, inner) => {
                    tokio::time::sleep(duration).await;
                    step = *inner;
                }
            }
        }
    }

    fn resolves(&self, agent_name: &str) -> bool {
        !self.unresolvable.contains(agent_name)
    }
}
