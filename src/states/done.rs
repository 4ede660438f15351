use async_trait::async_trait;
use tracing::info;

use crate::events::Event;
use crate::memory::LoopMemory;
use crate::states::{AgentState, StateContext};

/// Terminal state. The engine does not look up a transition out of here —
/// `handle` exists only to log and is never consulted for its return value.
pub struct DoneState;

#[async_trait]
impl AgentState for DoneState {
    fn name(&self) -> &'static str {
        "Done"
    }

    async fn handle(&self, memory: &mut LoopMemory, _ctx: &StateContext) -> Event {
        info!(task = %memory.task, iteration = memory.iteration, "task completed");
        Event::Completed
    }
}
