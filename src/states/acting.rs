use async_trait::async_trait;

use crate::dispatch::run_sequential;
use crate::events::Event;
use crate::memory::LoopMemory;
use crate::states::{AgentState, StateContext};

/// Sequential tool dispatch (§4.G "run invocations sequentially").
pub struct ActingState;

#[async_trait]
impl AgentState for ActingState {
    fn name(&self) -> &'static str {
        "Acting"
    }

    async fn handle(&self, memory: &mut LoopMemory, ctx: &StateContext) -> Event {
        let outcomes = run_sequential(memory, ctx).await;
        memory.last_results = outcomes;
        Event::StepsExecuted
    }
}
