use serde::{Deserialize, Serialize};

/// The Agent Loop's own phase, distinct from an [`crate::plan::ExecutionStep`]'s
/// status. A fixed, closed set — unlike the tool-facing state concepts
/// elsewhere in this crate, callers never define custom loop phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoopState {
    Idle,
    Planning,
    Decomposing,
    Acting,
    ParallelActing,
    Observing,
    Reflecting,
    Done,
    Error,
}

impl LoopState {
    pub fn is_terminal(self) -> bool {
        matches!(self, LoopState::Done | LoopState::Error)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LoopState::Idle => "Idle",
            LoopState::Planning => "Planning",
            LoopState::Decomposing => "Decomposing",
            LoopState::Acting => "Acting",
            LoopState::ParallelActing => "ParallelActing",
            LoopState::Observing => "Observing",
            LoopState::Reflecting => "Reflecting",
            LoopState::Done => "Done",
            LoopState::Error => "Error",
        }
    }
}

impl std::fmt::Display for LoopState {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
