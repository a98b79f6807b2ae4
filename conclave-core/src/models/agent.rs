//! Agent catalogue entries.
//!
//! An agent is an opaque analysis capability reached through the dispatch
//! adapter. The catalogue is plain configuration.
//!
//! # Examples
//!
//! ```
//! use conclave_core::models::AgentSpec;
//!
//! let agent = AgentSpec::new("security", "anthropic").with_categories(["injection"]);
//! assert!(agent.enabled);
//! assert!(agent.covers("injection"));
//! ```

use serde::{Deserialize, Serialize};

/// Provider assumed when an agent does not name one.
pub const DEFAULT_PROVIDER: &str = "default";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentSpec {
    /// Unique agent name, the dispatch key.
    pub name: String,
    /// Downstream provider; agents sharing a provider share its rate limit.
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Pattern categories this agent reports on.
    #[serde(default)]
    pub categories: Vec<String>,
    /// Member of the small FOCUSED subset.
    #[serde(default)]
    pub focused: bool,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_provider() -> String {
    DEFAULT_PROVIDER.to_string()
}

fn default_enabled() -> bool {
    true
}

impl AgentSpec {
    pub fn new(name: impl Into<String>, provider: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            provider: provider.into(),
            categories: Vec::new(),
            focused: false,
            enabled: true,
        }
    }

    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    pub fn focused(mut self) -> Self {
        self.focused = true;
        self
    }

    /// Whether the agent reports on `category`.
    pub fn covers(&self, category: &str) -> bool {
        self.categories.iter().any(|c| c == category)
    }
}
