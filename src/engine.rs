use std::collections::HashMap;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::{AgentLoopConfig, ExecutorConfig};
use crate::error::AgentError;
use crate::events::Event;
use crate::executor::ParallelExecutor;
use crate::llm::LlmProvider;
use crate::memory::LoopMemory;
use crate::planner::Planner;
use crate::prompt::PromptData;
use crate::state::LoopState;
use crate::states::{
    AgentState, ActingState, DecomposingState, DoneState, ErrorState, ObservingState,
    ParallelActingState, PlanningState, ReflectingState, StateContext,
};
use crate::task_state::TaskState;
use crate::tools::ToolRegistry;
use crate::transitions::{build_transition_table, TransitionTable};

const DEFAULT_SYSTEM_PROMPT: &str =
    "You are an autonomous coding agent. Use the available tools to accomplish the user's task. \
Call the completion tool once the task is fully done.";

/// Ties the Agent Loop's shared dependencies, state-handler registry, and
/// transition table together into the process-a-task controller (§4.G).
///
/// One `AgentLoop` can drive many independent tasks (each with its own
/// [`LoopMemory`]) since every piece of per-task state lives on `LoopMemory`,
/// not on the loop itself.
pub struct AgentLoop {
    ctx: StateContext,
    handlers: HashMap<LoopState, Box<dyn AgentState>>,
    transitions: TransitionTable,
}

impl AgentLoop {
    pub fn new(
        llm: Arc<dyn LlmProvider>,
        tools: Arc<ToolRegistry>,
        task_state: Arc<TaskState>,
        config: AgentLoopConfig,
        executor_config: ExecutorConfig,
        cancel: CancellationToken,
    ) -> Self {
        let completion_tool = config.completion_tool.clone();
        let planner = Planner::new(completion_tool.clone());
        let executor = ParallelExecutor::new(executor_config);

        let ctx = StateContext { tools, task_state, llm, planner, executor, config, cancel, completion_tool };

        let mut handlers: HashMap<LoopState, Box<dyn AgentState>> = HashMap::new();
        handlers.insert(LoopState::Planning, Box::new(PlanningState));
        handlers.insert(LoopState::Decomposing, Box::new(DecomposingState));
        handlers.insert(LoopState::Acting, Box::new(ActingState));
        handlers.insert(LoopState::ParallelActing, Box::new(ParallelActingState));
        handlers.insert(LoopState::Observing, Box::new(ObservingState));
        handlers.insert(LoopState::Reflecting, Box::new(ReflectingState));
        handlers.insert(LoopState::Done, Box::new(DoneState));
        handlers.insert(LoopState::Error, Box::new(ErrorState));

        Self { ctx, handlers, transitions: build_transition_table() }
    }

    /// `new-task(provider)` from the external-interfaces boundary: builds a
    /// fresh [`LoopMemory`] seeded with the default system prompt and the
    /// registry's current tool catalogue.
    pub fn new_task(&self, task: impl Into<String>) -> LoopMemory {
        let prompt = PromptData::new(DEFAULT_SYSTEM_PROMPT, self.ctx.tools.definitions());
        LoopMemory::new(task, prompt)
    }

    /// `add-user-message(task, string)`.
    pub fn add_user_message(&self, memory: &mut LoopMemory, content: impl Into<String>) {
        memory.prompt.push_user(content);
    }

    /// `process(task) -> error`. Drives `memory` through the state machine
    /// from Idle until a terminal state is reached.
    pub async fn process(&self, memory: &mut LoopMemory) -> Result<(), AgentError> {
        let mut state = LoopState::Idle;

        loop {
            let event = if state == LoopState::Idle {
                Event::Start
            } else {
                let handler = self
                    .handlers
                    .get(&state)
                    .ok_or_else(|| AgentError::NoHandlerForState(state.to_string()))?;
                let event = handler.handle(memory, &self.ctx).await;
                tracing::debug!(%state, %event, "state produced event");
                event
            };

            let next = *self
                .transitions
                .get(&(state, event.clone()))
                .ok_or_else(|| AgentError::InvalidTransition { state: state.to_string(), event: event.to_string() })?;

            tracing::info!(from = %state, %event, to = %next, "transition");
            state = next;

            if state.is_terminal() {
                if let Some(handler) = self.handlers.get(&state) {
                    handler.handle(memory, &self.ctx).await;
                }
                return match state {
                    LoopState::Done => Ok(()),
                    LoopState::Error => Err(memory
                        .last_error
                        .take()
                        .unwrap_or_else(|| AgentError::AgentFailed("unknown error".to_string()))),
                    _ => unreachable!("is_terminal() only returns true for Done and Error"),
                };
            }
        }
    }
}
