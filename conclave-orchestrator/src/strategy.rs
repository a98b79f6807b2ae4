//! Strategy Selector: a pure, deterministic function from input signals and
//! configuration to an execution plan.

use conclave_core::config::{ConclaveConfig, StrategyConfig};
use conclave_core::models::{AgentSpec, ExecutionPlan, ExecutionStrategy, InputDescriptor};

/// Choose strategy, ordered agent list and concurrency for a session.
///
/// Identical input and configuration always produce the same plan. The
/// plan is empty when no enabled agent qualifies.
pub fn select(input: &InputDescriptor, config: &ConclaveConfig) -> ExecutionPlan {
    let agents: Vec<&AgentSpec> = config.enabled_agents().collect();
    let strategy = &config.strategy;
    match strategy.mode {
        ExecutionStrategy::Parallel => parallel(&agents, strategy),
        ExecutionStrategy::Focused => focused(&agents, strategy, None),
        ExecutionStrategy::Smart => smart(input, &agents, strategy),
    }
}

fn names(agents: &[&AgentSpec]) -> Vec<String> {
    agents.iter().map(|a| a.name.clone()).collect()
}

fn parallel(agents: &[&AgentSpec], config: &StrategyConfig) -> ExecutionPlan {
    ExecutionPlan {
        strategy: ExecutionStrategy::Parallel,
        agents: names(agents),
        concurrency_limit: config.max_concurrency,
        fallback_reason: None,
    }
}

/// Agents flagged `focused`, or the first few of the catalogue when none are.
/// Always strictly sequential.
fn focused(agents: &[&AgentSpec], config: &StrategyConfig, reason: Option<String>) -> ExecutionPlan {
    let flagged: Vec<&AgentSpec> = agents.iter().copied().filter(|a| a.focused).collect();
    let subset = if flagged.is_empty() {
        agents
            .iter()
            .copied()
            .take(config.focused_fallback_count.max(1))
            .collect()
    } else {
        flagged
    };
    ExecutionPlan {
        strategy: ExecutionStrategy::Focused,
        agents: names(&subset),
        concurrency_limit: 1,
        fallback_reason: reason,
    }
}

fn is_large(input: &InputDescriptor, config: &StrategyConfig) -> bool {
    input.size_bytes >= config.large_input_bytes || input.line_count >= config.large_input_lines
}

/// Agents ranked by how many detected risk categories they cover, catalogue
/// order breaking ties. Large inputs run sequentially.
fn smart(input: &InputDescriptor, agents: &[&AgentSpec], config: &StrategyConfig) -> ExecutionPlan {
    if input.risk_categories.is_empty() {
        return focused(agents, config, Some("no risk categories detected".to_string()));
    }

    let mut ranked: Vec<(usize, usize, &AgentSpec)> = agents
        .iter()
        .enumerate()
        .map(|(position, agent)| {
            let coverage = input
                .risk_categories
                .iter()
                .filter(|c| agent.covers(c))
                .count();
            (coverage, position, *agent)
        })
        .filter(|(coverage, _, _)| *coverage > 0)
        .collect();

    if ranked.is_empty() {
        return focused(
            agents,
            config,
            Some("no agent covers the detected risk categories".to_string()),
        );
    }

    ranked.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
    let chosen: Vec<&AgentSpec> = ranked
        .into_iter()
        .take(config.smart_max_agents.max(1))
        .map(|(_, _, agent)| agent)
        .collect();

    let concurrency_limit = if is_large(input, config) {
        1
    } else {
        config
            .smart_concurrency
            .min(config.max_concurrency)
            .min(chosen.len())
            .max(1)
    };

    ExecutionPlan {
        strategy: ExecutionStrategy::Smart,
        agents: names(&chosen),
        concurrency_limit,
        fallback_reason: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(mode: ExecutionStrategy, agents: Vec<AgentSpec>) -> ConclaveConfig {
        let mut config = ConclaveConfig::default();
        config.strategy.mode = mode;
        config.agents = agents;
        config
    }

    #[test]
    fn focused_without_flags_takes_first_agents() {
        let cfg = config(
            ExecutionStrategy::Focused,
            vec![
                AgentSpec::new("a", "p"),
                AgentSpec::new("b", "p"),
                AgentSpec::new("c", "p"),
            ],
        );
        let plan = select(&InputDescriptor::new("x", "code"), &cfg);
        assert_eq!(plan.agents, vec!["a", "b"]);
        assert_eq!(plan.concurrency_limit, 1);
    }

    #[test]
    fn empty_catalogue_gives_empty_plan() {
        let plan = select(
            &InputDescriptor::new("x", "code"),
            &config(ExecutionStrategy::Parallel, vec![]),
        );
        assert!(plan.is_empty());
    }

    #[test]
    fn smart_fallback_records_reason() {
        let cfg = config(ExecutionStrategy::Smart, vec![AgentSpec::new("a", "p")]);
        let plan = select(&InputDescriptor::new("x", "code"), &cfg);
        assert_eq!(plan.strategy, ExecutionStrategy::Focused);
        assert!(plan.fallback_reason.is_some());
    }
}
