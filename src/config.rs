use std::collections::HashMap;
use std::time::Duration;

/// Tunables for the Agent Loop (§4.G). Constructed in-process by the caller;
/// the core never loads these from a file or environment — that belongs to
/// the outer CLI.
#[derive(Debug, Clone)]
pub struct AgentLoopConfig {
    /// Hard cap on main-loop iterations before `IterationLimitExceeded`.
    pub max_iterations: usize,
    /// Prompt Data message count above which history compaction runs.
    pub max_history_size: usize,
    /// Wall-clock budget for a single model call.
    pub ai_call_timeout: Duration,
    /// Wall-clock budget for a single tool call in the sequential dispatch path.
    pub tool_call_timeout: Duration,
    /// Minimum spacing between successive model calls.
    pub min_inter_call_interval: Duration,
    /// Consecutive no-tool replies tolerated before `AgentStuck`.
    pub max_consecutive_no_tool: usize,
    /// Name of the distinguished tool whose success terminates the loop.
    pub completion_tool: String,
}

impl Default for AgentLoopConfig {
    fn default() -> Self {
        Self {
            max_iterations: 50,
            max_history_size: 40,
            ai_call_timeout: Duration::from_secs(60),
            tool_call_timeout: Duration::from_secs(30),
            min_inter_call_interval: Duration::from_millis(200),
            max_consecutive_no_tool: 3,
            completion_tool: "attempt_completion".to_string(),
        }
    }
}

/// Tunables for the Parallel Executor (§4.E).
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    pub max_workers: usize,
    pub plan_timeout: Duration,
    pub default_tool_timeout: Duration,
    pub tool_timeouts: HashMap<String, Duration>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        let mut tool_timeouts = HashMap::new();
        tool_timeouts.insert("run_tests".to_string(), Duration::from_secs(120));
        tool_timeouts.insert("go_test".to_string(), Duration::from_secs(120));
        tool_timeouts.insert("run_shell".to_string(), Duration::from_secs(120));
        tool_timeouts.insert("index_codebase".to_string(), Duration::from_secs(120));

        Self {
            max_workers: 4,
            plan_timeout: Duration::from_secs(300),
            default_tool_timeout: Duration::from_secs(30),
            tool_timeouts,
        }
    }
}

/// Opaque provider identity handed to the (out-of-scope) adapter. The core
/// never parses these fields; they are carried only for logging.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub provider_name: String,
    pub base_url: String,
    pub api_key: String,
    pub model_id: String,
}
