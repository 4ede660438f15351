use async_trait::async_trait;

use crate::dispatch::run_parallel;
use crate::events::Event;
use crate::memory::LoopMemory;
use crate::states::{AgentState, StateContext};

/// Planner + Executor dispatch (§4.D, §4.E).
pub struct ParallelActingState;

#[async_trait]
impl AgentState for ParallelActingState {
    fn name(&self) -> &'static str {
        "ParallelActing"
    }

    async fn handle(&self, memory: &mut LoopMemory, ctx: &StateContext) -> Event {
        let outcomes = run_parallel(memory, ctx).await;
        memory.last_results = outcomes;
        Event::StepsExecuted
    }
}
