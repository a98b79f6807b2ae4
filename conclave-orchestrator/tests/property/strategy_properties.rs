use std::collections::HashSet;

use conclave_core::config::ConclaveConfig;
use conclave_core::models::{AgentSpec, ExecutionStrategy, InputDescriptor};
use conclave_orchestrator::retry::backoff_delay;
use conclave_orchestrator::select;
use proptest::prelude::*;

const CATEGORIES: [&str; 5] = ["injection", "auth", "performance", "style", "crypto"];

fn agent_strategy() -> impl Strategy<Value = (Vec<usize>, bool, bool)> {
    (
        prop::collection::vec(0..CATEGORIES.len(), 0..3),
        any::<bool>(),
        prop::bool::weighted(0.85),
    )
}

fn mode_strategy() -> impl Strategy<Value = ExecutionStrategy> {
    prop_oneof![
        Just(ExecutionStrategy::Smart),
        Just(ExecutionStrategy::Focused),
        Just(ExecutionStrategy::Parallel),
    ]
}

fn build_config(
    mode: ExecutionStrategy,
    agents: &[(Vec<usize>, bool, bool)],
    max_concurrency: usize,
) -> ConclaveConfig {
    let mut config = ConclaveConfig::default();
    config.strategy.mode = mode;
    config.strategy.max_concurrency = max_concurrency;
    config.agents = agents
        .iter()
        .enumerate()
        .map(|(i, (cats, focused, enabled))| {
            let mut spec = AgentSpec::new(format!("agent-{i}"), "p")
                .with_categories(cats.iter().map(|c| CATEGORIES[*c]));
            spec.focused = *focused;
            spec.enabled = *enabled;
            spec
        })
        .collect();
    config
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn selection_is_deterministic_and_bounded(
        mode in mode_strategy(),
        agents in prop::collection::vec(agent_strategy(), 0..8),
        risks in prop::collection::vec(0..CATEGORIES.len(), 0..3),
        size in 0u64..400_000,
        max_concurrency in 2usize..8,
    ) {
        let config = build_config(mode, &agents, max_concurrency);
        let input = {
            let mut input = InputDescriptor::new("artifact", "code")
                .with_risk_categories(risks.iter().map(|r| CATEGORIES[*r]));
            input.size_bytes = size;
            input
        };

        let plan = select(&input, &config);
        prop_assert_eq!(&plan, &select(&input, &config));

        let enabled: HashSet<&str> = config.enabled_agents().map(|a| a.name.as_str()).collect();
        let unique: HashSet<&str> = plan.agents.iter().map(String::as_str).collect();
        prop_assert_eq!(unique.len(), plan.agents.len());
        prop_assert!(unique.is_subset(&enabled));

        if !plan.is_empty() {
            prop_assert!(plan.concurrency_limit >= 1);
            prop_assert!(plan.concurrency_limit <= max_concurrency);
        }
        match plan.strategy {
            ExecutionStrategy::Focused => prop_assert_eq!(plan.concurrency_limit, 1),
            ExecutionStrategy::Parallel => prop_assert_eq!(unique, enabled),
            ExecutionStrategy::Smart => {
                for name in &plan.agents {
                    let spec = config.agents.iter().find(|a| &a.name == name).unwrap();
                    prop_assert!(input.risk_categories.iter().any(|r| spec.covers(r)));
                }
            }
        }
    }

    #[test]
    fn backoff_is_capped_and_monotone_without_jitter(
        base in 1u64..1_000,
        max in 1u64..60_000,
        steps in 1u32..20,
    ) {
        let mut previous = 0;
        for step in 0..steps {
            let delay = backoff_delay(step, base, max, 0.0, 0.5);
            prop_assert!(delay <= max.max(base));
            prop_assert!(delay >= previous);
            previous = delay;
        }
    }

    #[test]
    fn jitter_stays_within_its_band(
        step in 0u32..10,
        jitter in 0.0f64..1.0,
        random in 0.0f64..1.0,
    ) {
        let nominal = backoff_delay(step, 100, 10_000, 0.0, 0.5) as f64;
        let delay = backoff_delay(step, 100, 10_000, jitter, random) as f64;
        prop_assert!(delay >= nominal * (1.0 - jitter) - 1.0);
        prop_assert!(delay <= nominal * (1.0 + jitter) + 1.0);
    }
}
