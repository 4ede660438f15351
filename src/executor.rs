use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::ExecutorConfig;
use crate::error::AgentError;
use crate::plan::{ExecutionPlan, StepStatus};
use crate::planner::Planner;
use crate::task_state::TaskState;
use crate::tools::ToolRegistry;

const READY_POLL_INTERVAL: Duration = Duration::from_millis(100);
const PROGRESS_RESULT_PREVIEW: usize = 120;

/// Outcome of a single worker's attempt to run one step.
struct StepOutcome {
    id: usize,
    result: Option<String>,
    error: Option<String>,
}

/// Worker-pool executor that drains ready steps from an [`ExecutionPlan`],
/// enforces per-tool timeouts, and writes results back under the plan's
/// write lock (§4.E).
pub struct ParallelExecutor {
    config: ExecutorConfig,
}

impl ParallelExecutor {
    pub fn new(config: ExecutorConfig) -> Self {
        Self { config }
    }

    /// Runs `plan` to completion or failure. Returns `Ok(())` once every
    /// step is `Completed`; returns `Err(PlanExecutionFailed)` once no step
    /// is ready, at least one has failed, and downstream steps remain
    /// stranded. A global plan timeout cancels every in-flight worker and
    /// reports `Cancelled`.
    pub async fn run(
        &self,
        plan: Arc<ExecutionPlan>,
        registry: Arc<ToolRegistry>,
        task_state: Arc<TaskState>,
        parent_cancel: CancellationToken,
    ) -> Result<(), AgentError> {
        let plan_cancel = parent_cancel.child_token();

        let outcome = tokio::time::timeout(
            self.config.plan_timeout,
            self.run_inner(&plan, &registry, &task_state, plan_cancel.clone()),
        )
        .await;

        match outcome {
            Ok(result) => result,
            Err(_elapsed) => {
                plan_cancel.cancel();
                warn!(timeout = ?self.config.plan_timeout, "plan execution timed out");
                Err(AgentError::Cancelled)
            }
        }
    }

    async fn run_inner(
        &self,
        plan: &Arc<ExecutionPlan>,
        registry: &Arc<ToolRegistry>,
        task_state: &Arc<TaskState>,
        cancel: CancellationToken,
    ) -> Result<(), AgentError> {
        loop {
            if cancel.is_cancelled() {
                return Err(AgentError::Cancelled);
            }
            if plan.is_completed().await {
                return Ok(());
            }

            let ready = Planner::ready_steps(plan).await;
            if ready.is_empty() {
                if plan.has_failures().await {
                    return Err(AgentError::PlanExecutionFailed(plan.failed_step_ids().await));
                }
                tokio::time::sleep(READY_POLL_INTERVAL).await;
                continue;
            }

            for &id in &ready {
                plan.update_step_status(id, StepStatus::Running).await;
            }

            self.execute_ready_group(ready, plan, registry, task_state, &cancel).await;
        }
    }

    async fn execute_ready_group(
        &self,
        ready: Vec<usize>,
        plan: &Arc<ExecutionPlan>,
        registry: &Arc<ToolRegistry>,
        task_state: &Arc<TaskState>,
        cancel: &CancellationToken,
    ) {
        let worker_count = self.config.max_workers.min(ready.len()).max(1);

        let (job_tx, job_rx) = tokio::sync::mpsc::channel::<usize>(ready.len());
        for id in &ready {
            let _ = job_tx.send(*id).await;
        }
        drop(job_tx);
        let job_rx = Arc::new(Mutex::new(job_rx));

        let (result_tx, mut result_rx) = tokio::sync::mpsc::channel::<StepOutcome>(ready.len());

        let mut workers = Vec::with_capacity(worker_count);
        for _ in 0..worker_count {
            let job_rx = Arc::clone(&job_rx);
            let result_tx = result_tx.clone();
            let plan = Arc::clone(plan);
            let registry = Arc::clone(registry);
            let task_state = Arc::clone(task_state);
            let cancel = cancel.clone();
            let tool_timeouts = self.config.tool_timeouts.clone();
            let default_timeout = self.config.default_tool_timeout;

            workers.push(tokio::spawn(async move {
                loop {
                    let next = { job_rx.lock().await.recv().await };
                    let Some(id) = next else { break };

                    let (tool_name, args) = plan.step_invocation(id).await;
                    let timeout_dur = tool_timeouts.get(&tool_name).copied().unwrap_or(default_timeout);
                    let started = Instant::now();

                    let registry_for_task = Arc::clone(&registry);
                    let task_state_for_task = Arc::clone(&task_state);
                    let name_for_task = tool_name.clone();
                    let args_for_task = args.clone();

                    // The tool runs in its own detached task so a timeout here
                    // does not abort it — it keeps running in the background
                    // and the executor simply stops waiting for it (§4.E).
                    let handle = tokio::spawn(async move {
                        registry_for_task.execute(&name_for_task, &args_for_task, &task_state_for_task).await
                    });
                    tokio::pin!(handle);

                    let outcome = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => {
                            StepOutcome { id, result: None, error: Some("cancelled".to_string()) }
                        }
                        joined = &mut handle => {
                            match joined {
                                Ok(Ok(result)) => StepOutcome { id, result: Some(result), error: None },
                                Ok(Err(e)) => StepOutcome { id, result: None, error: Some(e.to_string()) },
                                Err(join_err) => StepOutcome { id, result: None, error: Some(join_err.to_string()) },
                            }
                        }
                        _ = tokio::time::sleep(timeout_dur) => {
                            StepOutcome {
                                id,
                                result: None,
                                error: Some(
                                    AgentError::ToolTimeout { name: tool_name.clone(), elapsed: started.elapsed() }
                                        .to_string(),
                                ),
                            }
                        }
                    };

                    let _ = result_tx.send(outcome).await;
                }
            }));
        }
        drop(result_tx);

        while let Some(outcome) = result_rx.recv().await {
            if let Some(ref err) = outcome.error {
                warn!(step = outcome.id, error = %err, "step failed");
            } else {
                let preview: String = outcome
                    .result
                    .as_deref()
                    .unwrap_or_default()
                    .chars()
                    .take(PROGRESS_RESULT_PREVIEW)
                    .collect();
                info!(step = outcome.id, result = %preview, "step completed");
            }
            plan.set_step_result(outcome.id, outcome.result, outcome.error).await;
        }

        for worker in workers {
            let _ = worker.await;
        }
    }
}
