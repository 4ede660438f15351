use std::collections::HashMap;

use crate::events::Event;
use crate::state::LoopState;

pub type TransitionTable = HashMap<(LoopState, Event), LoopState>;

/// Builds the default transition table wiring the Agent Loop's phases
/// together (§4.G). Any `(LoopState, Event)` pair not present here is
/// illegal and causes [`crate::engine::AgentLoop::process`] to return
/// `AgentError::InvalidTransition` — a defensive check, not an expected
/// runtime path.
pub fn build_transition_table() -> TransitionTable {
    let mut t = HashMap::new();

    t.insert((LoopState::Idle, Event::Start), LoopState::Planning);

    t.insert((LoopState::Planning, Event::ToolCallsSequential), LoopState::Acting);
    t.insert((LoopState::Planning, Event::ToolCallsParallel), LoopState::ParallelActing);
    t.insert((LoopState::Planning, Event::ToolCallsDecomposition), LoopState::Decomposing);
    t.insert((LoopState::Planning, Event::NoToolReply), LoopState::Planning);
    t.insert((LoopState::Planning, Event::AgentStuck), LoopState::Error);
    t.insert((LoopState::Planning, Event::MaxIterationsReached), LoopState::Error);
    t.insert((LoopState::Planning, Event::FatalError), LoopState::Error);

    t.insert((LoopState::Decomposing, Event::DecompositionDone), LoopState::Planning);
    t.insert((LoopState::Decomposing, Event::FatalError), LoopState::Error);

    t.insert((LoopState::Acting, Event::StepsExecuted), LoopState::Observing);
    t.insert((LoopState::Acting, Event::FatalError), LoopState::Error);

    t.insert((LoopState::ParallelActing, Event::StepsExecuted), LoopState::Observing);
    t.insert((LoopState::ParallelActing, Event::FatalError), LoopState::Error);

    t.insert((LoopState::Observing, Event::Completed), LoopState::Done);
    t.insert((LoopState::Observing, Event::NeedsReflection), LoopState::Reflecting);
    t.insert((LoopState::Observing, Event::Continue), LoopState::Planning);

    t.insert((LoopState::Reflecting, Event::ReflectDone), LoopState::Planning);

    // Done and Error are terminal — no outgoing transitions. The engine
    // checks `LoopState::is_terminal()` and exits before a table lookup.

    t
}
