//! Recording agent findings as memory entries.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use conclave_core::constants::CANCELLED_SESSION_TAG;
use conclave_core::errors::{ConclaveResult, OrchestrationError};
use conclave_core::models::{Finding, FindingRef, InputDescriptor, MemoryEntry, ReportedFinding};
use conclave_core::traits::{IMemoryStore, PutOutcome};

use super::task_runner::QueuedTask;
use super::Inner;

/// Build the entry a finding is stored as. Entries inherit the artifact's
/// tags and descriptors so later retrieval can match on them.
pub(crate) fn entry_for(
    finding: &Finding,
    session_id: &str,
    agent_name: &str,
    input: &InputDescriptor,
    cancelled: bool,
) -> MemoryEntry {
    let mut tags = input.tags.clone();
    if cancelled {
        tags.push(CANCELLED_SESSION_TAG.to_string());
    }
    MemoryEntry::new(
        finding.category.clone(),
        finding.payload(),
        session_id,
        agent_name,
    )
    .with_tags(tags)
    .with_descriptors(input.descriptors.clone())
}

/// Store the entry, then record this agent's report against whichever
/// entry the store kept.
async fn store_blocking(
    store: Arc<dyn IMemoryStore>,
    entry: MemoryEntry,
    mut report: FindingRef,
    task_id: &str,
) -> ConclaveResult<PutOutcome> {
    tokio::task::spawn_blocking(move || {
        let outcome = store.put(&entry)?;
        report.entry_id = outcome.id().to_string();
        store.record_finding(&report)?;
        Ok(outcome)
    })
    .await
    .map_err(|e| OrchestrationError::WorkerLost {
        task_id: task_id.to_string(),
        reason: format!("memory write panicked: {e}"),
    })?
}

impl Inner {
    /// Persist a task's findings and report them with calibrated confidence.
    ///
    /// Each report gets its own finding id. Duplicates share the original
    /// entry. An unreachable memory store is retried a fixed number of
    /// times; after that the finding is still reported, unsaved, and the
    /// degradation is recorded.
    pub(crate) async fn persist_findings(
        &self,
        session_id: &str,
        task: &QueuedTask,
        input: &InputDescriptor,
        findings: Vec<Finding>,
        cancelled: bool,
    ) -> Vec<ReportedFinding> {
        let attempts = self.config.retrieval.store_retry_attempts.max(1);
        let delay = Duration::from_millis(self.config.retrieval.store_retry_delay_ms);
        let mut reported = Vec::with_capacity(findings.len());
        let mut inserted = 0u64;

        for finding in findings {
            let entry = entry_for(&finding, session_id, &task.agent_name, input, cancelled);
            let report =
                FindingRef::new(&entry.id, &task.agent_name, &finding.category, session_id);
            let mut attempt = 1;
            let entry_id = loop {
                match store_blocking(self.memory.clone(), entry.clone(), report.clone(), &task.id)
                    .await
                {
                    Ok(outcome) => {
                        if outcome.was_inserted() {
                            inserted += 1;
                        } else {
                            debug!(entry_id = outcome.id(), "finding matched an existing entry");
                        }
                        break outcome.id().to_string();
                    }
                    Err(e) if e.is_store_unavailable() && attempt < attempts => {
                        attempt += 1;
                        tokio::time::sleep(delay).await;
                    }
                    Err(e) => {
                        warn!(
                            task_id = %task.id,
                            category = %finding.category,
                            error = %e,
                            "finding not persisted"
                        );
                        self.record_degradation("memory_store", &e.to_string(), "unsaved finding");
                        break entry.id.clone();
                    }
                }
            };
            let confidence = self.scorer.score(&task.agent_name, &finding.category);
            reported.push(ReportedFinding {
                finding_id: report.id,
                entry_id,
                agent_name: task.agent_name.clone(),
                finding,
                confidence,
            });
        }

        if inserted > 0 {
            self.metrics.memory_entries_written(inserted);
        }
        reported
    }
}
