//! Session execution: bounded worker pool over the session's task queue.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn, Instrument};

use conclave_core::errors::{ConclaveError, ConclaveResult, OrchestrationError};
use conclave_core::models::{
    ReportedFinding, SessionOutcome, SessionStatus, TaskAnnotation, TaskStatus,
};
use conclave_observability::tracing_setup::events;

use super::task_runner::{QueuedTask, TaskEnd};
use super::{is_invalid_transition, Inner};

type WorkerResult = (Vec<(usize, TaskEnd)>, Option<ConclaveError>);

/// Write a terminal session status and close out its bookkeeping.
pub(crate) async fn finish(
    inner: &Inner,
    session_id: &str,
    status: SessionStatus,
    findings: usize,
) -> ConclaveResult<()> {
    inner.set_session_status(session_id, status).await?;
    inner.metrics.session_finished(status);
    inner.tokens.remove(session_id);
    let tasks = inner
        .sessions
        .get_snapshot(session_id)
        .map(|s| s.tasks.len())
        .unwrap_or(0);
    events::session_finished(session_id, status.as_str(), tasks, findings);
    Ok(())
}

/// Final status from task outcomes. Skipped tasks count neither way.
pub(crate) fn aggregate_status(
    statuses: impl IntoIterator<Item = TaskStatus>,
    cancelled: bool,
    fatal: bool,
) -> SessionStatus {
    if fatal {
        return SessionStatus::Failed;
    }
    if cancelled {
        return SessionStatus::Cancelled;
    }
    let (mut succeeded, mut failed) = (0usize, 0usize);
    for status in statuses {
        match status {
            TaskStatus::Succeeded => succeeded += 1,
            TaskStatus::Failed => failed += 1,
            _ => {}
        }
    }
    match (succeeded, failed) {
        (0, _) => SessionStatus::Failed,
        (_, 0) => SessionStatus::Completed,
        _ => SessionStatus::PartiallyFailed,
    }
}

pub(crate) async fn run_session(
    inner: Arc<Inner>,
    session_id: String,
) -> ConclaveResult<SessionOutcome> {
    let snapshot = inner.sessions.get_snapshot(&session_id)?;
    let status = snapshot.session.status;
    if status.is_terminal() {
        return Ok(inner.outcome(snapshot, Vec::new()));
    }
    if status != SessionStatus::Created {
        return Err(OrchestrationError::UnexpectedSessionState {
            session_id,
            status: status.to_string(),
            expected: SessionStatus::Created.to_string(),
        }
        .into());
    }

    let span = conclave_observability::session_span!(session_id, snapshot.session.strategy);
    drive(inner, session_id).instrument(span).await
}

async fn drive(inner: Arc<Inner>, session_id: String) -> ConclaveResult<SessionOutcome> {
    let snapshot = inner.sessions.get_snapshot(&session_id)?;
    let token = inner.token(&session_id);

    let mut queue = Vec::with_capacity(snapshot.tasks.len());
    for (index, task) in snapshot.tasks.iter().enumerate() {
        if task.status != TaskStatus::Queued {
            continue;
        }
        if inner.dispatcher.resolves(&task.agent_name) {
            queue.push(QueuedTask {
                id: task.id.clone(),
                agent_name: task.agent_name.clone(),
                provider: task.provider.clone(),
                index,
            });
        } else {
            warn!(task_id = %task.id, agent = %task.agent_name, "agent not resolvable, skipping");
            inner
                .annotate(
                    &session_id,
                    &task.id,
                    TaskAnnotation::Error(format!("agent {} is not resolvable", task.agent_name)),
                )
                .await?;
            inner
                .set_task_status(&session_id, &task.id, TaskStatus::Skipped)
                .await?;
        }
    }

    if queue.is_empty() {
        let error = OrchestrationError::NoResolvableAgents {
            session_id: session_id.clone(),
        };
        warn!(error = %error, "session cannot run");
        return finalize(&inner, &session_id, SessionStatus::Failed, BTreeMap::new()).await;
    }

    match inner
        .set_session_status(&session_id, SessionStatus::Running)
        .await
    {
        Ok(_) => {}
        Err(e) if is_invalid_transition(&e) => {
            // Cancelled between submission and start.
            let current = inner.sessions.get_snapshot(&session_id)?;
            if current.session.status.is_terminal() {
                return Ok(inner.outcome(current, Vec::new()));
            }
            return Err(e);
        }
        Err(e) => return Err(e),
    }

    let workers = snapshot.session.concurrency_limit.max(1).min(queue.len());
    info!(tasks = queue.len(), workers, "session running");

    let (tx, rx) = mpsc::unbounded_channel();
    for task in queue {
        // The receiver is alive until the pool is joined.
        let _ = tx.send(task);
    }
    drop(tx);
    let rx = Arc::new(Mutex::new(rx));
    let input = Arc::new(snapshot.session.input_descriptor.clone());
    let stop = token.child_token();
    let current: Arc<DashMap<usize, String>> = Arc::new(DashMap::new());

    let mut pool: JoinSet<WorkerResult> = JoinSet::new();
    let mut worker_ids = HashMap::new();
    for worker in 0..workers {
        let inner = inner.clone();
        let rx = rx.clone();
        let input = input.clone();
        let token = token.clone();
        let stop = stop.clone();
        let current = current.clone();
        let session_id = session_id.clone();
        let handle = pool.spawn(
            async move {
                let mut ends = Vec::new();
                loop {
                    let next = tokio::select! {
                        biased;
                        () = stop.cancelled() => None,
                        task = async { rx.lock().await.recv().await } => task,
                    };
                    let Some(task) = next else { break };
                    current.insert(worker, task.id.clone());
                    match inner
                        .run_task(&session_id, &input, &task, &token, &stop)
                        .await
                    {
                        Ok(end) => ends.push((task.index, end)),
                        Err(e) => {
                            error!(task_id = %task.id, error = %e, "task state lost, aborting session");
                            stop.cancel();
                            let _ = inner
                                .sessions
                                .set_status(&session_id, &task.id, TaskStatus::Failed);
                            current.remove(&worker);
                            return (ends, Some(e));
                        }
                    }
                    current.remove(&worker);
                }
                (ends, None)
            }
            .in_current_span(),
        );
        worker_ids.insert(handle.id(), worker);
    }

    let mut ends = Vec::new();
    let mut fatal: Option<ConclaveError> = None;
    while let Some(joined) = pool.join_next().await {
        match joined {
            Ok((worker_ends, worker_error)) => {
                ends.extend(worker_ends);
                if let Some(e) = worker_error {
                    fatal.get_or_insert(e);
                }
            }
            Err(join_error) => {
                stop.cancel();
                let task_id = worker_ids
                    .get(&join_error.id())
                    .and_then(|w| current.get(w).map(|t| t.value().clone()))
                    .unwrap_or_default();
                error!(task_id = %task_id, error = %join_error, "worker lost");
                if !task_id.is_empty() {
                    let _ = inner.sessions.set_status(&session_id, &task_id, TaskStatus::Failed);
                }
                fatal.get_or_insert(
                    OrchestrationError::WorkerLost {
                        task_id,
                        reason: join_error.to_string(),
                    }
                    .into(),
                );
            }
        }
    }

    // Anything never picked up was cut off by cancellation or an abort.
    for task in inner.sessions.get_snapshot(&session_id)?.tasks {
        if task.status == TaskStatus::Queued {
            match inner
                .set_task_status(&session_id, &task.id, TaskStatus::Skipped)
                .await
            {
                Ok(_) => {}
                Err(e) if is_invalid_transition(&e) => {}
                Err(e) => {
                    fatal.get_or_insert(e);
                }
            }
        }
    }

    let statuses: Vec<TaskStatus> = inner
        .sessions
        .get_snapshot(&session_id)?
        .tasks
        .iter()
        .map(|t| t.status)
        .collect();
    let status = aggregate_status(statuses, token.is_cancelled(), fatal.is_some());
    if let Some(ref e) = fatal {
        warn!(error = %e, "session aborted");
    }

    let findings: BTreeMap<usize, Vec<ReportedFinding>> = ends
        .into_iter()
        .filter_map(|(index, end)| match end {
            TaskEnd::Succeeded(findings) => Some((index, findings)),
            TaskEnd::Failed | TaskEnd::Skipped => None,
        })
        .collect();
    finalize(&inner, &session_id, status, findings).await
}

/// Write the terminal status and assemble the outcome. Findings are only
/// reported for sessions that produced a result set.
async fn finalize(
    inner: &Arc<Inner>,
    session_id: &str,
    status: SessionStatus,
    findings: BTreeMap<usize, Vec<ReportedFinding>>,
) -> ConclaveResult<SessionOutcome> {
    let findings: Vec<ReportedFinding> = match status {
        SessionStatus::Completed | SessionStatus::PartiallyFailed => {
            findings.into_values().flatten().collect()
        }
        _ => Vec::new(),
    };

    match finish(inner, session_id, status, findings.len()).await {
        Ok(()) => {}
        Err(e) if is_invalid_transition(&e) => {
            // A concurrent cancel already closed the session.
            debug!(session_id, "session finalized elsewhere");
            let snapshot = inner.sessions.get_snapshot(session_id)?;
            return Ok(inner.outcome(snapshot, Vec::new()));
        }
        Err(e) => return Err(e),
    }
    let snapshot = inner.sessions.get_snapshot(session_id)?;
    Ok(inner.outcome(snapshot, findings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use TaskStatus::*;

    #[test]
    fn all_succeeded_completes() {
        assert_eq!(aggregate_status([Succeeded, Succeeded], false, false), SessionStatus::Completed);
    }

    #[test]
    fn mixed_outcomes_partially_fail() {
        assert_eq!(
            aggregate_status([Succeeded, Failed, Skipped], false, false),
            SessionStatus::PartiallyFailed
        );
    }

    #[test]
    fn no_successes_fail() {
        assert_eq!(aggregate_status([Failed, Failed], false, false), SessionStatus::Failed);
        assert_eq!(aggregate_status([Skipped], false, false), SessionStatus::Failed);
    }

    #[test]
    fn skipped_tasks_do_not_block_completion() {
        assert_eq!(aggregate_status([Succeeded, Skipped], false, false), SessionStatus::Completed);
    }

    #[test]
    fn cancellation_and_abort_take_precedence() {
        assert_eq!(aggregate_status([Succeeded], true, false), SessionStatus::Cancelled);
        assert_eq!(aggregate_status([Succeeded], true, true), SessionStatus::Failed);
    }
}
