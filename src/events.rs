use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Event {
    /// Emitted by the implicit Idle state — starts the loop.
    Start,

    // ── Planning outcomes ───────────────────────────────
    /// Model returned tool calls; heuristic says run them one at a time.
    ToolCallsSequential,
    /// Model returned tool calls; heuristic says build a plan and parallelize.
    ToolCallsParallel,
    /// Task State carries a pending decomposition; route through it instead.
    ToolCallsDecomposition,
    /// Model returned no tool calls; a forcing message was appended.
    NoToolReply,
    /// Too many consecutive `NoToolReply`s.
    AgentStuck,
    /// Iteration counter exceeded the configured maximum.
    MaxIterationsReached,
    /// Provider error, cancellation, or another unrecoverable condition.
    FatalError,

    // ── Decomposing outcomes ─────────────────────────────
    DecompositionDone,

    // ── Acting / ParallelActing outcomes ─────────────────
    /// One batch of tool invocations finished (success and/or failure).
    StepsExecuted,

    // ── Observing outcomes ───────────────────────────────
    /// The completion tool succeeded — the task is done.
    Completed,
    /// Normal flow: proceed back to Planning.
    Continue,
    /// Message count over budget; compact history first.
    NeedsReflection,

    // ── Reflecting outcomes ──────────────────────────────
    ReflectDone,
}

impl std::fmt::Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}
