use async_trait::async_trait;

use crate::events::Event;
use crate::memory::LoopMemory;
use crate::states::{AgentState, StateContext};

/// History compaction (§4.G.2). Named for the phase of the loop, distinct
/// from the Reflection Evaluator (§4.H) which Observing consults directly.
pub struct ReflectingState;

#[async_trait]
impl AgentState for ReflectingState {
    fn name(&self) -> &'static str {
        "Reflecting"
    }

    async fn handle(&self, memory: &mut LoopMemory, _ctx: &StateContext) -> Event {
        memory.prompt.compact();
        Event::ReflectDone
    }
}
