use std::sync::Arc;

use tracing::warn;

use crate::error::AgentError;
use crate::llm::ProviderError;
use crate::memory::{LoopMemory, ToolExecutionOutcome};
use crate::states::StateContext;
use crate::types::{LlmReply, StepCategory, ToolInvocation};

pub const FORCE_TOOL_USE_MESSAGE: &str =
    "You must call a tool to make progress. Respond only with a tool call, not plain text.";

/// Rate-limits, snapshots the prompt, and calls the model under the
/// configured timeout (§4.G steps 2-3). Shared by Planning and Decomposing.
pub async fn call_model(memory: &mut LoopMemory, ctx: &StateContext) -> Result<LlmReply, AgentError> {
    if let Some(last) = memory.last_call_at {
        let elapsed = last.elapsed();
        if elapsed < ctx.config.min_inter_call_interval {
            let remaining = ctx.config.min_inter_call_interval - elapsed;
            tokio::select! {
                _ = tokio::time::sleep(remaining) => {}
                _ = ctx.cancel.cancelled() => return Err(AgentError::Cancelled),
            }
        }
    }
    memory.last_call_at = Some(std::time::Instant::now());

    let snapshot = memory.prompt.clone();
    tokio::select! {
        _ = ctx.cancel.cancelled() => Err(AgentError::Cancelled),
        result = tokio::time::timeout(ctx.config.ai_call_timeout, ctx.llm.generate(&snapshot, ctx.cancel.clone())) => {
            match result {
                Ok(Ok(reply)) => Ok(reply),
                Ok(Err(ProviderError::Transport(msg))) => Err(AgentError::ProviderError(msg)),
                Ok(Err(e)) => Err(AgentError::ProviderError(e.to_string())),
                Err(_elapsed) => Err(AgentError::ModelCallTimeout(ctx.config.ai_call_timeout)),
            }
        }
    }
}

/// True if `invocations` contains both an analysis-category and a
/// modification-category call, or has five or more entries — the heuristic
/// that decides whether planning is worth the overhead (§4.G).
pub async fn should_use_planner(ctx: &StateContext, invocations: &[ToolInvocation]) -> bool {
    if invocations.len() >= 5 {
        return true;
    }
    let mut seen_analysis = false;
    let mut seen_modification = false;
    for inv in invocations {
        match ctx.planner.categorize(&ctx.tools, &inv.name) {
            StepCategory::Analysis => seen_analysis = true,
            StepCategory::Modification => seen_modification = true,
            _ => {}
        }
        if seen_analysis && seen_modification {
            return true;
        }
    }
    false
}

/// Runs `invocations` one at a time, appending a tool-response message after
/// each. Stops immediately once the completion tool succeeds (§4.G
/// "Completion detection").
pub async fn run_sequential(
    memory: &mut LoopMemory,
    ctx: &StateContext,
) -> Vec<ToolExecutionOutcome> {
    let invocations = std::mem::take(&mut memory.pending_invocations);
    let mut outcomes = Vec::with_capacity(invocations.len());

    for inv in invocations {
        let outcome = tokio::time::timeout(
            ctx.config.tool_call_timeout,
            ctx.tools.execute(&inv.name, &inv.args, &ctx.task_state),
        )
        .await;

        let (success, text) = match outcome {
            Ok(Ok(result)) => (true, result),
            Ok(Err(e)) => (false, e.to_string()),
            Err(_) => {
                let err = AgentError::ToolTimeout { name: inv.name.clone(), elapsed: ctx.config.tool_call_timeout };
                ctx.task_state.record_error(err.to_string()).await;
                (false, err.to_string())
            }
        };

        memory.prompt.push_tool_result(&inv, &text);
        let is_completion = inv.name == ctx.completion_tool && success;
        outcomes.push(ToolExecutionOutcome { name: inv.name, success });
        if is_completion {
            break;
        }
    }

    outcomes
}

/// Builds a plan from `invocations`, runs it through the executor, and
/// appends one tool-response message per step in plan order. Returns the
/// per-step outcomes used by Observing to detect completion.
pub async fn run_parallel(memory: &mut LoopMemory, ctx: &StateContext) -> Vec<ToolExecutionOutcome> {
    let invocations = std::mem::take(&mut memory.pending_invocations);
    let plan = Arc::new(ctx.planner.build_plan(&ctx.tools, &invocations));

    if let Err(e) = ctx
        .executor
        .run(Arc::clone(&plan), Arc::clone(&ctx.tools), Arc::clone(&ctx.task_state), ctx.cancel.clone())
        .await
    {
        warn!(error = %e, "parallel execution reported a failure");
    }

    let steps = plan.snapshot().await;
    let mut outcomes = Vec::with_capacity(steps.len());
    for step in &steps {
        let inv = ToolInvocation::new(step.id.to_string(), step.tool_name.clone(), step.args.clone());
        let text = step.result.clone().or_else(|| step.error.clone()).unwrap_or_default();
        memory.prompt.push_tool_result(&inv, &text);
        outcomes.push(ToolExecutionOutcome {
            name: step.tool_name.clone(),
            success: step.status == crate::plan::StepStatus::Completed,
        });
    }

    memory.current_plan = Some(plan);
    outcomes
}
