pub mod config;
pub mod decomposer;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod events;
pub mod executor;
pub mod llm;
pub mod memory;
pub mod plan;
pub mod planner;
pub mod prompt;
pub mod reflection;
pub mod state;
pub mod states;
pub mod task_state;
pub mod tools;
pub mod transitions;
pub mod types;

// Convenience re-exports at crate root
pub use config::{AgentLoopConfig, ExecutorConfig, ProviderConfig};
pub use decomposer::{DecompositionResult, DecompositionStep, TaskDecomposer};
pub use engine::AgentLoop;
pub use error::AgentError;
pub use events::Event;
pub use executor::ParallelExecutor;
pub use llm::{LlmProvider, MockLlmProvider, ProviderError};
pub use memory::LoopMemory;
pub use plan::{ExecutionPlan, ExecutionStep, StepStatus};
pub use planner::Planner;
pub use prompt::PromptData;
pub use reflection::{ReflectionEvaluator, ReflectionResult};
pub use state::LoopState;
pub use task_state::TaskState;
pub use tools::{ToolRegistry, ToolRegistryBuilder};
pub use types::{ArgMap, LlmReply, Message, Role, StepCategory, ToolDefinition, ToolInvocation};
