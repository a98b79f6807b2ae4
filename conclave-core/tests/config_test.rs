use std::collections::HashMap;

use conclave_core::config::*;
use conclave_core::constants::MAX_RETRIEVAL_LIMIT;
use conclave_core::errors::ConfigError;
use conclave_core::models::{ExecutionStrategy, RetrievalStrategyKind};

#[test]
fn config_loads_from_empty_toml_with_all_defaults() {
    let config = ConclaveConfig::from_toml("").unwrap();

    // Storage defaults
    assert_eq!(config.storage.db_path, "conclave.db");
    assert!(config.storage.wal_mode);
    assert_eq!(config.storage.busy_timeout_ms, 5_000);
    assert_eq!(config.storage.read_pool_size, 4);

    // Retrieval defaults
    assert_eq!(config.retrieval.default_limit, 10);
    assert_eq!(config.retrieval.default_strategies, RetrievalStrategyKind::ALL.to_vec());
    assert_eq!(config.retrieval.weights.contextual, 0.30);

    // Confidence defaults
    assert_eq!(config.confidence.neutral_default, 0.5);
    assert_eq!(config.confidence.prior_strength, 2.0);

    // Strategy defaults
    assert_eq!(config.strategy.mode, ExecutionStrategy::Smart);
    assert_eq!(config.strategy.max_concurrency, 4);

    // Dispatch defaults
    assert_eq!(config.dispatch.max_attempts, 3);
    assert_eq!(config.dispatch.timeout_ms, 120_000);

    // Rate limit defaults
    assert!(config.rate_limit.requests_per_second.is_none());
    assert_eq!(config.rate_limit.burst, 1);

    // Session defaults
    assert_eq!(config.session.ttl_secs, 3_600);

    assert_eq!(config.observability.log_level, "info");
    assert!(config.agents.is_empty());
}

#[test]
fn config_loads_partial_toml_with_overrides() {
    let toml = r#"
[strategy]
mode = "parallel"
max_concurrency = 3

[dispatch]
max_attempts = 5

[[agents]]
name = "security"
provider = "anthropic"
categories = ["injection", "auth"]
focused = true

[[agents]]
name = "style"
"#;
    let config = ConclaveConfig::from_toml(toml).unwrap();
    assert_eq!(config.strategy.mode, ExecutionStrategy::Parallel);
    assert_eq!(config.strategy.max_concurrency, 3);
    assert_eq!(config.dispatch.max_attempts, 5);
    // Non-overridden fields keep defaults
    assert_eq!(config.dispatch.retry_base_delay_ms, 500);

    assert_eq!(config.agents.len(), 2);
    assert!(config.agents[0].focused);
    assert!(config.agents[0].covers("auth"));
    assert_eq!(config.agents[1].provider, "default");
    assert!(config.agents[1].enabled);
}

#[test]
fn config_rejects_sequential_parallel_limit() {
    let err = ConclaveConfig::from_toml("[strategy]\nmax_concurrency = 1\n").unwrap_err();
    match err {
        ConfigError::ValidationFailed { field, .. } => assert_eq!(field, "strategy.max_concurrency"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn config_rejects_zero_attempts() {
    assert!(ConclaveConfig::from_toml("[dispatch]\nmax_attempts = 0\n").is_err());
}

#[test]
fn config_rejects_zero_dispatch_timeout() {
    assert!(ConclaveConfig::from_toml("[dispatch]\ntimeout_ms = 0\n").is_err());
}

#[test]
fn config_rejects_unusable_retrieval_defaults() {
    assert!(ConclaveConfig::from_toml("[retrieval]\ndefault_limit = 0\n").is_err());
    let too_many = format!("[retrieval]\ndefault_limit = {}\n", MAX_RETRIEVAL_LIMIT + 1);
    assert!(ConclaveConfig::from_toml(&too_many).is_err());
    let at_max = format!("[retrieval]\ndefault_limit = {MAX_RETRIEVAL_LIMIT}\n");
    assert!(ConclaveConfig::from_toml(&at_max).is_ok());
    assert!(ConclaveConfig::from_toml("[retrieval]\ndefault_strategies = []\n").is_err());
}

#[test]
fn config_rejects_neutral_default_out_of_range() {
    assert!(ConclaveConfig::from_toml("[confidence]\nneutral_default = 1.5\n").is_err());
    assert!(ConclaveConfig::from_toml("[confidence]\nneutral_default = 1.0\n").is_err());
    assert!(ConclaveConfig::from_toml("[confidence]\nneutral_default = 0.0\n").is_err());
    assert!(ConclaveConfig::from_toml("[confidence]\nneutral_default = 0.9\n").is_ok());
    assert!(ConclaveConfig::from_toml("[confidence]\nprior_strength = 0.0\n").is_err());
}

#[test]
fn config_rejects_bad_weights() {
    let negative = "[retrieval.weights]\ncontextual = -0.1\n";
    assert!(ConclaveConfig::from_toml(negative).is_err());

    let all_zero = r#"
[retrieval.weights]
contextual = 0.0
similarity = 0.0
pattern = 0.0
content = 0.0
"#;
    assert!(ConclaveConfig::from_toml(all_zero).is_err());
}

#[test]
fn config_rejects_duplicate_agents() {
    let toml = r#"
[[agents]]
name = "security"

[[agents]]
name = "security"
"#;
    let err = ConclaveConfig::from_toml(toml).unwrap_err();
    assert!(err.to_string().contains("duplicate agent"));
}

#[test]
fn config_reports_parse_errors() {
    let err = ConclaveConfig::from_toml("[strategy\nmode = ").unwrap_err();
    assert!(matches!(err, ConfigError::ParseError { .. }));
}

#[test]
fn env_overrides_apply_and_ignore_garbage() {
    let env: HashMap<&str, &str> = [
        ("CONCLAVE_STRATEGY", "FOCUSED"),
        ("CONCLAVE_MAX_ATTEMPTS", "7"),
        ("CONCLAVE_MAX_CONCURRENCY", "not-a-number"),
    ]
    .into_iter()
    .collect();

    let mut config = ConclaveConfig::default();
    config.apply_env_overrides(|key| env.get(key).map(|v| v.to_string()));

    assert_eq!(config.strategy.mode, ExecutionStrategy::Focused);
    assert_eq!(config.dispatch.max_attempts, 7);
    assert_eq!(config.strategy.max_concurrency, 4);
}

#[test]
fn load_merges_project_file_and_overrides() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join(PROJECT_CONFIG_FILE),
        "[strategy]\nmax_concurrency = 6\n\n[retrieval.weights]\ncontent = 0.5\n",
    )
    .unwrap();

    let overrides = ConfigOverrides {
        max_attempts: Some(2),
        ..Default::default()
    };
    let config = ConclaveConfig::load(dir.path(), Some(&overrides)).unwrap();

    assert_eq!(config.strategy.max_concurrency, 6);
    assert_eq!(config.retrieval.weights.content, 0.5);
    // Sibling keys in a partially overridden table keep defaults.
    assert_eq!(config.retrieval.weights.pattern, 0.25);
    assert_eq!(config.dispatch.max_attempts, 2);
}

#[test]
fn load_without_files_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = ConclaveConfig::load(dir.path(), None).unwrap();
    assert_eq!(config.retrieval.default_limit, 10);
}

#[test]
fn config_round_trips_through_toml() {
    let mut config = ConclaveConfig::default();
    config.strategy.mode = ExecutionStrategy::Focused;
    config.rate_limit.requests_per_second = Some(2.5);
    let text = config.to_toml().unwrap();
    let back = ConclaveConfig::from_toml(&text).unwrap();
    assert_eq!(back.strategy.mode, ExecutionStrategy::Focused);
    assert_eq!(back.rate_limit.requests_per_second, Some(2.5));
}

#[test]
fn rate_for_prefers_provider_override() {
    let mut config = RateLimitConfig {
        requests_per_second: Some(1.0),
        ..Default::default()
    };
    config.provider_overrides.insert("openai".to_string(), 4.0);
    assert_eq!(config.rate_for("openai"), Some(4.0));
    assert_eq!(config.rate_for("anthropic"), Some(1.0));
}
