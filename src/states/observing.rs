use async_trait::async_trait;

use crate::events::Event;
use crate::memory::LoopMemory;
use crate::reflection::ReflectionEvaluator;
use crate::states::{AgentState, StateContext};

/// Commits the outcome of the last Acting/ParallelActing turn and decides
/// what happens next: done, compact-then-continue, or plain continue.
pub struct ObservingState;

#[async_trait]
impl AgentState for ObservingState {
    fn name(&self) -> &'static str {
        "Observing"
    }

    async fn handle(&self, memory: &mut LoopMemory, ctx: &StateContext) -> Event {
        let completed = memory.last_results.iter().any(|r| r.name == ctx.completion_tool && r.success);
        if completed {
            return Event::Completed;
        }

        if let Some(plan) = memory.current_plan.clone() {
            if plan.has_failures().await {
                let steps = plan.snapshot().await;
                let reflection = ReflectionEvaluator::evaluate(
                    Some(ctx.llm.as_ref()),
                    &steps,
                    &memory.task,
                    &ctx.completion_tool,
                    ctx.cancel.clone(),
                )
                .await;
                memory
                    .prompt
                    .push_user(format!("The previous plan did not fully succeed: {}", reflection.reason));
                memory.reflection = Some(reflection);
            }
        }

        if memory.prompt.message_count() > ctx.config.max_history_size {
            Event::NeedsReflection
        } else {
            Event::Continue
        }
    }
}
