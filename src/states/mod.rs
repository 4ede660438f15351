use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::config::AgentLoopConfig;
use crate::events::Event;
use crate::executor::ParallelExecutor;
use crate::llm::LlmProvider;
use crate::memory::LoopMemory;
use crate::planner::Planner;
use crate::task_state::TaskState;
use crate::tools::ToolRegistry;

mod acting;
mod decomposing;
mod done;
mod error;
mod observing;
mod parallel_acting;
mod planning;
mod reflecting;

pub use acting::ActingState;
pub use decomposing::DecomposingState;
pub use done::DoneState;
pub use error::ErrorState;
pub use observing::ObservingState;
pub use parallel_acting::ParallelActingState;
pub use planning::PlanningState;
pub use reflecting::ReflectingState;

/// Shared, read-only dependencies every state handler needs. Bundled so the
/// [`AgentState`] contract stays two parameters regardless of how many
/// collaborators a given phase reaches for.
pub struct StateContext {
    pub tools: Arc<ToolRegistry>,
    pub task_state: Arc<TaskState>,
    pub llm: Arc<dyn LlmProvider>,
    pub planner: Planner,
    pub executor: ParallelExecutor,
    pub config: AgentLoopConfig,
    pub cancel: CancellationToken,
    pub completion_tool: String,
}

/// The contract every Agent Loop phase fulfills.
///
/// `handle()` must never panic and must always return an `Event` — a
/// non-fatal failure (tool error, parse error, plan failure) is recorded as
/// data on `memory` and reported through a regular `Event` variant, not a
/// `Result::Err`. `FatalError` is reserved for conditions the loop truly
/// cannot recover from (provider error, cancellation, an internal
/// invariant violation).
#[async_trait]
pub trait AgentState: Send + Sync {
    fn name(&self) -> &'static str;

    async fn handle(&self, memory: &mut LoopMemory, ctx: &StateContext) -> Event;
}
