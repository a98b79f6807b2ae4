use serde::{Deserialize, Serialize};

/// Description of the artifact under analysis.
///
/// Produced by the caller; the engine never fetches sources itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputDescriptor {
    pub artifact_id: String,
    pub language: Option<String>,
    pub size_bytes: u64,
    pub line_count: u64,
    pub file_paths: Vec<String>,
    /// Risk categories detected up front (e.g. by a cheap pre-scan).
    pub risk_categories: Vec<String>,
    /// Structural descriptors of the artifact (`fn:parse`, `import:serde`, ...).
    pub descriptors: Vec<String>,
    pub tags: Vec<String>,
    /// Artifact text, or an excerpt of it.
    pub content: String,
}

impl InputDescriptor {
    pub fn new(artifact_id: impl Into<String>, content: impl Into<String>) -> Self {
        let content = content.into();
        Self {
            artifact_id: artifact_id.into(),
            size_bytes: content.len() as u64,
            line_count: content.lines().count() as u64,
            content,
            ..Default::default()
        }
    }

    pub fn with_risk_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.risk_categories = categories.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_descriptors<I, S>(mut self, descriptors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.descriptors = descriptors.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Reject descriptors the engine cannot work with.
    pub fn validate(&self) -> Result<(), String> {
        if self.artifact_id.trim().is_empty() {
            return Err("artifact_id must not be empty".to_string());
        }
        if self.content.is_empty() && self.file_paths.is_empty() {
            return Err("artifact has neither content nor file paths".to_string());
        }
        Ok(())
    }
}
