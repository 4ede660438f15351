use async_trait::async_trait;
use serde_json::json;

use crate::dispatch::{call_model, run_parallel, run_sequential, should_use_planner};
use crate::error::AgentError;
use crate::events::Event;
use crate::memory::LoopMemory;
use crate::states::{AgentState, StateContext};

/// Runs a pending decomposition one logical step at a time (§4.G.1).
///
/// The `has_decomposed_task` flag is cleared up front so that a step's own
/// tool calls dispatch through Planning's normal sequential/parallel choice
/// rather than re-entering decomposition.
pub struct DecomposingState;

#[async_trait]
impl AgentState for DecomposingState {
    fn name(&self) -> &'static str {
        "Decomposing"
    }

    async fn handle(&self, memory: &mut LoopMemory, ctx: &StateContext) -> Event {
        ctx.task_state.set_context("has_decomposed_task", json!(false)).await;

        let decomposition = match memory.pending_decomposition.take() {
            Some(d) => d,
            None => {
                memory.last_error =
                    Some(AgentError::AgentFailed("Decomposing state entered with no pending decomposition".to_string()));
                return Event::FatalError;
            }
        };

        for step in &decomposition.steps {
            memory.prompt.push_user(format!("Execute this step: {}", step.description));

            let reply = match call_model(memory, ctx).await {
                Ok(reply) => reply,
                Err(e) => {
                    memory.last_error = Some(e);
                    return Event::FatalError;
                }
            };

            memory.prompt.push_assistant(reply.content, reply.tool_calls.clone());

            if reply.tool_calls.is_empty() {
                continue;
            }

            memory.pending_invocations = reply.tool_calls;
            if should_use_planner(ctx, &memory.pending_invocations).await {
                run_parallel(memory, ctx).await;
            } else {
                run_sequential(memory, ctx).await;
            }
            // A successful completion tool here only finishes this logical
            // step, never the whole task (§4.G.1 rule 4).
        }

        Event::DecompositionDone
    }
}
