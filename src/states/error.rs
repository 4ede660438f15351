use async_trait::async_trait;
use tracing::error;

use crate::events::Event;
use crate::memory::LoopMemory;
use crate::states::{AgentState, StateContext};

/// Terminal state. `memory.last_error` carries the diagnostic the engine
/// surfaces to its caller.
pub struct ErrorState;

#[async_trait]
impl AgentState for ErrorState {
    fn name(&self) -> &'static str {
        "Error"
    }

    async fn handle(&self, memory: &mut LoopMemory, _ctx: &StateContext) -> Event {
        error!(task = %memory.task, error = ?memory.last_error, "task failed");
        Event::FatalError
    }
}
