use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, warn};

use crate::decomposer::{TaskDecomposer, DECOMPOSE_TOOL_NAME};
use crate::dispatch::{call_model, should_use_planner, FORCE_TOOL_USE_MESSAGE};
use crate::error::AgentError;
use crate::events::Event;
use crate::memory::LoopMemory;
use crate::states::{AgentState, StateContext};

pub struct PlanningState;

#[async_trait]
impl AgentState for PlanningState {
    fn name(&self) -> &'static str {
        "Planning"
    }

    async fn handle(&self, memory: &mut LoopMemory, ctx: &StateContext) -> Event {
        memory.iteration += 1;
        debug!(iteration = memory.iteration, max = ctx.config.max_iterations, "planning turn");

        if memory.iteration > ctx.config.max_iterations {
            memory.last_error = Some(AgentError::IterationLimitExceeded(memory.iteration));
            return Event::MaxIterationsReached;
        }

        let reply = match call_model(memory, ctx).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "model call failed");
                memory.last_error = Some(e);
                return Event::FatalError;
            }
        };

        if !reply.has_tool_calls() {
            memory.prompt.push_assistant(reply.content, Vec::new());
            memory.no_tool_count += 1;
            if memory.no_tool_count > ctx.config.max_consecutive_no_tool {
                memory.last_error = Some(AgentError::AgentStuck(memory.no_tool_count));
                return Event::AgentStuck;
            }
            memory.prompt.push_user(FORCE_TOOL_USE_MESSAGE);
            return Event::NoToolReply;
        }

        memory.no_tool_count = 0;
        memory.prompt.push_assistant(reply.content, reply.tool_calls.clone());
        memory.pending_invocations = reply.tool_calls;

        if let Some(pos) = memory.pending_invocations.iter().position(|inv| inv.name == DECOMPOSE_TOOL_NAME) {
            let invocation = memory.pending_invocations.remove(pos);
            let task_description =
                invocation.args.get("task").and_then(|v| v.as_str()).map(str::to_string).unwrap_or_else(|| memory.task.clone());

            match TaskDecomposer::decompose(ctx.llm.as_ref(), &task_description, &ctx.tools.definitions(), ctx.cancel.clone()).await {
                Ok(result) => {
                    memory.prompt.push_tool_result(&invocation, format!("decomposed into {} steps", result.steps.len()));
                    memory.pending_decomposition = Some(result);
                    ctx.task_state.set_context("has_decomposed_task", json!(true)).await;
                    return Event::ToolCallsDecomposition;
                }
                Err(e) => {
                    warn!(error = %e, "decomposition failed, falling back to normal dispatch");
                    memory.prompt.push_tool_result(&invocation, format!("decomposition failed: {e}"));
                }
            }
        }

        if ctx.task_state.get_context("has_decomposed_task").await == Some(json!(true)) {
            return Event::ToolCallsDecomposition;
        }

        if should_use_planner(ctx, &memory.pending_invocations).await {
            Event::ToolCallsParallel
        } else {
            Event::ToolCallsSequential
        }
    }
}
