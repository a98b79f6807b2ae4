//! Configuration for every Conclave subsystem.
//!
//! All sections deserialize with `#[serde(default)]`, so a partial TOML file
//! only overrides the keys it names.

pub mod confidence_config;
pub mod defaults;
pub mod dispatch_config;
pub mod observability_config;
pub mod rate_limit_config;
pub mod retrieval_config;
pub mod session_config;
pub mod storage_config;
pub mod strategy_config;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub use confidence_config::ConfidenceConfig;
pub use dispatch_config::DispatchConfig;
pub use observability_config::ObservabilityConfig;
pub use rate_limit_config::RateLimitConfig;
pub use retrieval_config::{RetrievalConfig, StrategyWeights};
pub use session_config::SessionConfig;
pub use storage_config::StorageConfig;
pub use strategy_config::StrategyConfig;

use crate::constants::MAX_RETRIEVAL_LIMIT;
use crate::errors::ConfigError;
use crate::models::{AgentSpec, ExecutionStrategy};

/// Name of the project-level config file.
pub const PROJECT_CONFIG_FILE: &str = "conclave.toml";

/// Top-level configuration aggregating all sub-configs.
///
/// Passed into each orchestrator at construction; nothing here is global.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConclaveConfig {
    pub storage: StorageConfig,
    pub retrieval: RetrievalConfig,
    pub confidence: ConfidenceConfig,
    pub strategy: StrategyConfig,
    pub agents: Vec<AgentSpec>,
    pub dispatch: DispatchConfig,
    pub rate_limit: RateLimitConfig,
    pub session: SessionConfig,
    pub observability: ObservabilityConfig,
}

/// Explicit overrides applied on top of every other layer.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub db_path: Option<String>,
    pub strategy: Option<ExecutionStrategy>,
    pub max_concurrency: Option<usize>,
    pub max_attempts: Option<u32>,
    pub dispatch_timeout_ms: Option<u64>,
}

impl ConclaveConfig {
    /// Load configuration with layered resolution.
    ///
    /// Resolution order (highest priority first):
    /// 1. Explicit overrides
    /// 2. Environment variables (`CONCLAVE_*`)
    /// 3. Project config (`conclave.toml` in `root`)
    /// 4. User config (`~/.conclave/config.toml`)
    /// 5. Compiled defaults
    pub fn load(root: &Path, overrides: Option<&ConfigOverrides>) -> Result<Self, ConfigError> {
        let mut merged = toml::Table::new();

        if let Some(user_path) = user_config_path() {
            if user_path.exists() {
                merge_tables(&mut merged, read_table(&user_path)?);
            }
        }

        let project_path = root.join(PROJECT_CONFIG_FILE);
        if project_path.exists() {
            merge_tables(&mut merged, read_table(&project_path)?);
        }

        let mut config: ConclaveConfig =
            toml::Value::Table(merged)
                .try_into()
                .map_err(|e: toml::de::Error| ConfigError::ParseError {
                    path: project_path.display().to_string(),
                    message: e.to_string(),
                })?;

        config.apply_env_overrides(|key| std::env::var(key).ok());

        if let Some(overrides) = overrides {
            config.apply_overrides(overrides);
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML string (for testing and embedding).
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: ConclaveConfig = toml::from_str(toml_str).map_err(|e| ConfigError::ParseError {
            path: "<string>".to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize back to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError {
            path: "<serialize>".to_string(),
            message: e.to_string(),
        })
    }

    /// Apply `CONCLAVE_*` variables read through `lookup`.
    ///
    /// Unparseable values are ignored.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("CONCLAVE_DB_PATH") {
            self.storage.db_path = val;
        }
        if let Some(val) = lookup("CONCLAVE_STRATEGY") {
            if let Ok(strategy) = val.parse::<ExecutionStrategy>() {
                self.strategy.mode = strategy;
            }
        }
        if let Some(val) = lookup("CONCLAVE_MAX_CONCURRENCY") {
            if let Ok(v) = val.parse::<usize>() {
                self.strategy.max_concurrency = v;
            }
        }
        if let Some(val) = lookup("CONCLAVE_MAX_ATTEMPTS") {
            if let Ok(v) = val.parse::<u32>() {
                self.dispatch.max_attempts = v;
            }
        }
        if let Some(val) = lookup("CONCLAVE_DISPATCH_TIMEOUT_MS") {
            if let Ok(v) = val.parse::<u64>() {
                self.dispatch.timeout_ms = v;
            }
        }
        if let Some(val) = lookup("CONCLAVE_LOG_LEVEL") {
            self.observability.log_level = val;
        }
    }

    /// Apply explicit overrides.
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(ref path) = overrides.db_path {
            self.storage.db_path = path.clone();
        }
        if let Some(strategy) = overrides.strategy {
            self.strategy.mode = strategy;
        }
        if let Some(v) = overrides.max_concurrency {
            self.strategy.max_concurrency = v;
        }
        if let Some(v) = overrides.max_attempts {
            self.dispatch.max_attempts = v;
        }
        if let Some(v) = overrides.dispatch_timeout_ms {
            self.dispatch.timeout_ms = v;
        }
    }

    /// Validate the configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.strategy.max_concurrency <= 1 {
            return Err(invalid("strategy.max_concurrency", "must be greater than 1"));
        }
        if self.strategy.smart_concurrency == 0 {
            return Err(invalid("strategy.smart_concurrency", "must be at least 1"));
        }
        if self.dispatch.max_attempts == 0 {
            return Err(invalid("dispatch.max_attempts", "must be at least 1"));
        }
        if self.dispatch.timeout_ms == 0 {
            return Err(invalid("dispatch.timeout_ms", "must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.dispatch.retry_jitter_factor) {
            return Err(invalid("dispatch.retry_jitter_factor", "must be between 0.0 and 1.0"));
        }
        if !(0.0..=1.0).contains(&self.rate_limit.jitter_factor) {
            return Err(invalid("rate_limit.jitter_factor", "must be between 0.0 and 1.0"));
        }
        if let Some(rps) = self.rate_limit.requests_per_second {
            if rps <= 0.0 {
                return Err(invalid("rate_limit.requests_per_second", "must be positive"));
            }
        }
        if self.rate_limit.provider_overrides.values().any(|rps| *rps <= 0.0) {
            return Err(invalid("rate_limit.provider_overrides", "rates must be positive"));
        }
        let neutral = self.confidence.neutral_default;
        if !(neutral > 0.0 && neutral < 1.0) {
            return Err(invalid(
                "confidence.neutral_default",
                "must be strictly between 0.0 and 1.0",
            ));
        }
        if self.confidence.prior_strength <= 0.0 {
            return Err(invalid("confidence.prior_strength", "must be positive"));
        }
        if !(0.0..=1.0).contains(&self.retrieval.confidence_influence) {
            return Err(invalid("retrieval.confidence_influence", "must be between 0.0 and 1.0"));
        }
        if !(0.0..=1.0).contains(&self.retrieval.similarity_min) {
            return Err(invalid("retrieval.similarity_min", "must be between 0.0 and 1.0"));
        }
        if !(1..=MAX_RETRIEVAL_LIMIT).contains(&self.retrieval.default_limit) {
            return Err(invalid(
                "retrieval.default_limit",
                &format!("must be between 1 and {MAX_RETRIEVAL_LIMIT}"),
            ));
        }
        if self.retrieval.default_strategies.is_empty() {
            return Err(invalid("retrieval.default_strategies", "must name at least one strategy"));
        }
        let w = &self.retrieval.weights;
        let weights = [w.contextual, w.similarity, w.pattern, w.content];
        if weights.iter().any(|v| *v < 0.0 || !v.is_finite()) {
            return Err(invalid("retrieval.weights", "must be finite and non-negative"));
        }
        if weights.iter().all(|v| *v == 0.0) {
            return Err(invalid("retrieval.weights", "at least one weight must be positive"));
        }
        if self.session.channel_capacity == 0 {
            return Err(invalid("session.channel_capacity", "must be at least 1"));
        }
        if self.session.state_write_attempts == 0 {
            return Err(invalid("session.state_write_attempts", "must be at least 1"));
        }

        let mut seen = HashSet::new();
        for agent in &self.agents {
            if agent.name.trim().is_empty() {
                return Err(invalid("agents.name", "must not be empty"));
            }
            if !seen.insert(agent.name.as_str()) {
                return Err(invalid(
                    "agents.name",
                    &format!("duplicate agent '{}'", agent.name),
                ));
            }
        }
        Ok(())
    }

    /// Agents that are enabled, in catalogue order.
    pub fn enabled_agents(&self) -> impl Iterator<Item = &AgentSpec> {
        self.agents.iter().filter(|a| a.enabled)
    }
}

fn invalid(field: &str, message: &str) -> ConfigError {
    ConfigError::ValidationFailed {
        field: field.to_string(),
        message: message.to_string(),
    }
}

fn read_table(path: &Path) -> Result<toml::Table, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.display().to_string(),
    })?;
    content.parse::<toml::Table>().map_err(|e| ConfigError::ParseError {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

/// Deep-merge `overlay` into `base`. Nested tables merge key by key; any
/// other value (including arrays) replaces the base value.
fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(incoming)) => {
                merge_tables(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

/// Returns the user config path: `~/.conclave/config.toml`.
fn user_config_path() -> Option<PathBuf> {
    home_dir().map(|h| h.join(".conclave").join("config.toml"))
}

fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}
