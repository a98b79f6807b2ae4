//! One task from queue to a terminal status.
//!
//! Per attempt: wait for the provider throttle, dispatch with a timeout,
//! then either record findings or classify the error. Transient errors are
//! retried with backoff; invalid input skips the task; anything else fails it.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn, Instrument};

use conclave_core::errors::{ConclaveResult, DispatchError, ErrorClass, OrchestrationError};
use conclave_core::models::{
    InputDescriptor, ReportedFinding, ResultRef, RetrievalContext, RetrievalResult, TaskAnnotation,
    TaskInputContext, TaskStatus,
};
use conclave_observability::tracing_setup::events;

use super::{is_invalid_transition, Inner};
use crate::dispatch::invoke_with_timeout;

/// A task waiting for a worker.
#[derive(Debug, Clone)]
pub(crate) struct QueuedTask {
    pub(crate) id: String,
    pub(crate) agent_name: String,
    pub(crate) provider: String,
    /// Position in the session's dispatch order.
    pub(crate) index: usize,
}

/// How a task ended.
#[derive(Debug)]
pub(crate) enum TaskEnd {
    /// Findings to report. Empty if the session was cancelled meanwhile.
    Succeeded(Vec<ReportedFinding>),
    Failed,
    Skipped,
}

impl Inner {
    /// Drive `task` to a terminal status.
    ///
    /// `stop` fires on cancellation or when the session aborts; it prevents
    /// new dispatches but never interrupts one in flight. `session_token`
    /// distinguishes a caller cancellation from an abort.
    ///
    /// Errors returned here are state-store failures and are fatal for the
    /// session.
    pub(crate) async fn run_task(
        &self,
        session_id: &str,
        input: &InputDescriptor,
        task: &QueuedTask,
        session_token: &CancellationToken,
        stop: &CancellationToken,
    ) -> ConclaveResult<TaskEnd> {
        if stop.is_cancelled() {
            return self.skip(session_id, &task.id).await;
        }

        let context = self.build_context(session_id, input, task).await?;
        let timeout = Duration::from_millis(self.config.dispatch.timeout_ms);
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            tokio::select! {
                biased;
                () = stop.cancelled() => return self.skip(session_id, &task.id).await,
                _ = self.throttle.acquire(&task.provider) => {}
            }

            match self
                .set_task_status(session_id, &task.id, TaskStatus::Dispatched)
                .await
            {
                Ok(_) => {}
                // Skipped by a concurrent cancel.
                Err(e) if is_invalid_transition(&e) && stop.is_cancelled() => {
                    return Ok(TaskEnd::Skipped)
                }
                Err(e) => return Err(e),
            }
            self.metrics.dispatch();

            let span = conclave_observability::dispatch_span!(
                session_id,
                task.id,
                task.agent_name,
                task.provider,
                attempt
            );
            let result =
                invoke_with_timeout(self.dispatcher.as_ref(), &task.agent_name, &context, timeout)
                    .instrument(span)
                    .await;

            let error = match result {
                Ok(output) => {
                    self.throttle.on_success(&task.provider);
                    let cancelled = session_token.is_cancelled();
                    let reported = self
                        .persist_findings(session_id, task, input, output.findings, cancelled)
                        .await;
                    let result_ref = ResultRef {
                        finding_ids: reported.iter().map(|f| f.finding_id.clone()).collect(),
                        raw_confidence: output.raw_confidence,
                    };
                    self.annotate(session_id, &task.id, TaskAnnotation::Result(result_ref))
                        .await?;
                    self.set_task_status(session_id, &task.id, TaskStatus::Succeeded)
                        .await?;
                    debug!(
                        task_id = %task.id,
                        agent = %task.agent_name,
                        attempt,
                        findings = reported.len(),
                        "task succeeded"
                    );
                    let reported = if cancelled { Vec::new() } else { reported };
                    return Ok(TaskEnd::Succeeded(reported));
                }
                Err(error) => error,
            };

            self.metrics.dispatch_failure();
            self.annotate(session_id, &task.id, TaskAnnotation::Error(error.to_string()))
                .await?;
            if let DispatchError::RateLimited { retry_after_ms, .. } = &error {
                self.metrics.rate_limit_signal();
                self.throttle.on_rate_limited(&task.provider, *retry_after_ms);
            }

            let class = error.class();
            if self.retry.should_retry(class, attempt) && !stop.is_cancelled() {
                self.set_task_status(session_id, &task.id, TaskStatus::Retrying)
                    .await?;
                self.metrics.retry();
                let delay = self.retry.delay_after(attempt);
                events::retry_scheduled(
                    &task.id,
                    &task.agent_name,
                    attempt,
                    delay.as_millis() as u64,
                    &error.to_string(),
                );
                tokio::select! {
                    biased;
                    () = stop.cancelled() => return self.skip(session_id, &task.id).await,
                    () = tokio::time::sleep(delay) => {}
                }
                continue;
            }

            warn!(
                task_id = %task.id,
                agent = %task.agent_name,
                attempt,
                class = ?class,
                error = %error,
                "task gave up"
            );
            return if class == ErrorClass::InvalidInput {
                self.set_task_status(session_id, &task.id, TaskStatus::Skipped)
                    .await?;
                Ok(TaskEnd::Skipped)
            } else {
                self.set_task_status(session_id, &task.id, TaskStatus::Failed)
                    .await?;
                Ok(TaskEnd::Failed)
            };
        }
    }

    /// Retrieve memory and confidence weights for the agent and record them
    /// as the task's input context.
    async fn build_context(
        &self,
        session_id: &str,
        input: &InputDescriptor,
        task: &QueuedTask,
    ) -> ConclaveResult<TaskInputContext> {
        let categories = self
            .config
            .agents
            .iter()
            .find(|a| a.name == task.agent_name)
            .map(|a| a.categories.clone())
            .unwrap_or_default();

        let memory = self
            .retrieve(session_id, input, &task.agent_name, &categories, &task.id)
            .await?;
        let confidence_weights = self.scorer.weights_for(&task.agent_name, &categories);

        let context = TaskInputContext {
            session_id: session_id.to_string(),
            task_id: task.id.clone(),
            agent_name: task.agent_name.clone(),
            artifact: input.clone(),
            memory,
            confidence_weights,
        };
        self.annotate(
            session_id,
            &task.id,
            TaskAnnotation::InputContext(Box::new(context.clone())),
        )
        .await?;
        Ok(context)
    }

    async fn retrieve(
        &self,
        session_id: &str,
        input: &InputDescriptor,
        agent_name: &str,
        categories: &[String],
        task_id: &str,
    ) -> ConclaveResult<RetrievalResult> {
        let retrieval = self.retrieval.clone();
        let context = RetrievalContext::from_input(input, categories);
        let strategies = self.config.retrieval.default_strategies.clone();
        let limit = self.config.retrieval.default_limit;

        let span = conclave_observability::retrieval_span!(session_id, agent_name);
        let outcome = tokio::task::spawn_blocking(move || {
            retrieval.retrieve_or_degrade(&context, &strategies, limit)
        })
        .instrument(span)
        .await
        .map_err(|e| OrchestrationError::WorkerLost {
            task_id: task_id.to_string(),
            reason: format!("retrieval panicked: {e}"),
        })?;

        let result = match outcome {
            Ok(result) => result,
            Err(e) => {
                warn!(task_id, error = %e, "retrieval rejected, dispatching without memory");
                RetrievalResult::empty()
            }
        };
        if result.degraded {
            self.metrics.degraded_retrieval();
            self.record_degradation("retrieval", "memory store unavailable", "empty context bundle");
        } else {
            self.mark_recovered("retrieval");
        }
        Ok(result)
    }

    async fn skip(&self, session_id: &str, task_id: &str) -> ConclaveResult<TaskEnd> {
        match self
            .set_task_status(session_id, task_id, TaskStatus::Skipped)
            .await
        {
            Ok(_) => Ok(TaskEnd::Skipped),
            Err(e) if is_invalid_transition(&e) => {
                debug!(task_id, "task already terminal");
                Ok(TaskEnd::Skipped)
            }
            Err(e) => Err(e),
        }
    }
}
