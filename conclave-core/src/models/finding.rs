use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{AgentTask, Session};

/// Severity reported by an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

/// A single finding returned by an agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub category: String,
    pub summary: String,
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub severity: Severity,
}

impl Finding {
    pub fn new(category: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            summary: summary.into(),
            detail: None,
            location: None,
            severity: Severity::default(),
        }
    }

    pub fn at(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Text stored as the memory payload for this finding.
    pub fn payload(&self) -> String {
        let mut text = self.summary.clone();
        if let Some(ref location) = self.location {
            text.push_str("\n@ ");
            text.push_str(location);
        }
        if let Some(ref detail) = self.detail {
            text.push('\n');
            text.push_str(detail);
        }
        text
    }
}

/// What an agent returns on success.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentOutput {
    pub findings: Vec<Finding>,
    /// The agent's own confidence, if it reports one.
    #[serde(default)]
    pub raw_confidence: Option<f64>,
}

/// Links one agent's report of a finding to the memory entry it was stored
/// as. Several agents can report the same entry; each report keeps its own
/// id so feedback credits the agent that made it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FindingRef {
    pub id: String,
    pub entry_id: String,
    pub agent_name: String,
    pub category: String,
    pub session_id: String,
    pub created_at: DateTime<Utc>,
}

impl FindingRef {
    pub fn new(
        entry_id: impl Into<String>,
        agent_name: impl Into<String>,
        category: impl Into<String>,
        session_id: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            entry_id: entry_id.into(),
            agent_name: agent_name.into(),
            category: category.into(),
            session_id: session_id.into(),
            created_at: Utc::now(),
        }
    }
}

/// A finding as exposed to callers, with its feedback handle and displayed confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportedFinding {
    /// Per-report id; pass this to feedback ingestion.
    pub finding_id: String,
    /// Memory entry the finding was stored as, shared by duplicate reports.
    pub entry_id: String,
    pub agent_name: String,
    pub finding: Finding,
    /// Calibrated score of (agent, category) at report time.
    pub confidence: f64,
}

/// Terminal view of a session handed back by the orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionOutcome {
    pub session: Session,
    pub tasks: Vec<AgentTask>,
    /// Aggregated findings. Empty for cancelled sessions.
    pub findings: Vec<ReportedFinding>,
}
