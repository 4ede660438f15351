use thiserror::Error;

/// Error taxonomy for the agent core. Kinds track the spec's error
/// taxonomy: transport/provider, tool, timeout, registry, decomposition,
/// plan execution, stuck/cancellation/iteration-limit, and the defensive
/// invalid-transition case.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("provider error: {0}")]
    ProviderError(String),

    #[error("model call timed out after {0:?}")]
    ModelCallTimeout(std::time::Duration),

    #[error("tool '{0}' failed: {1}")]
    ToolError(String, String),

    #[error("tool '{name}' timed out after {elapsed:?}")]
    ToolTimeout { name: String, elapsed: std::time::Duration },

    #[error("tool not found: {0}")]
    ToolNotFound(String),

    #[error("invalid args for tool '{tool}': {reason}")]
    InvalidArgs { tool: String, reason: String },

    #[error("failed to parse decomposition reply: {0}")]
    DecompositionParseError(String),

    #[error("plan execution failed; stranded or failed steps: {0:?}")]
    PlanExecutionFailed(Vec<usize>),

    #[error("agent stuck: {0} consecutive replies without a tool call")]
    AgentStuck(usize),

    #[error("cancelled")]
    Cancelled,

    #[error("iteration limit exceeded after {0} iterations without completion")]
    IterationLimitExceeded(usize),

    #[error("invalid transition: no edge for ({state}, {event})")]
    InvalidTransition { state: String, event: String },

    #[error("no handler registered for state: {0}")]
    NoHandlerForState(String),

    #[error("agent failed: {0}")]
    AgentFailed(String),
}
