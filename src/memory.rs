use std::sync::Arc;
use std::time::Instant;

use crate::decomposer::DecompositionResult;
use crate::error::AgentError;
use crate::plan::ExecutionPlan;
use crate::prompt::PromptData;
use crate::reflection::ReflectionResult;
use crate::types::ToolInvocation;

/// Per-`process()`-call state threaded through every [`crate::states::AgentState`]
/// handler: the conversation itself plus the loop's own bookkeeping. Analogous
/// to the Execution Plan / Task State but private to one Agent Loop instance —
/// never shared outside it.
pub struct LoopMemory {
    pub task: String,
    pub prompt: PromptData,
    pub iteration: usize,
    pub no_tool_count: usize,
    pub last_call_at: Option<Instant>,
    pub pending_invocations: Vec<ToolInvocation>,
    pub last_results: Vec<ToolExecutionOutcome>,
    pub current_plan: Option<Arc<ExecutionPlan>>,
    pub pending_decomposition: Option<DecompositionResult>,
    /// The typed error a terminal `Error` state surfaces to `process`'s
    /// caller, set by whichever handler detected the fatal condition.
    pub last_error: Option<AgentError>,
    pub reflection: Option<ReflectionResult>,
}

#[derive(Debug, Clone)]
pub struct ToolExecutionOutcome {
    pub name: String,
    pub success: bool,
}

impl LoopMemory {
    pub fn new(task: impl Into<String>, prompt: PromptData) -> Self {
        Self {
            task: task.into(),
            prompt,
            iteration: 0,
            no_tool_count: 0,
            last_call_at: None,
            pending_invocations: Vec::new(),
            last_results: Vec::new(),
            current_plan: None,
            pending_decomposition: None,
            last_error: None,
            reflection: None,
        }
    }
}
