use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::types::{ArgMap, StepCategory};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl StepStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, StepStatus::Completed | StepStatus::Failed)
    }
}

/// One node of an [`ExecutionPlan`]. Created `Pending` by the
/// [`crate::planner::Planner`]; transitions `Pending -> Running ->
/// (Completed | Failed)` under the plan's write lock and never reverts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionStep {
    pub id: usize,
    pub tool_name: String,
    pub args: ArgMap,
    pub dependencies: Vec<usize>,
    pub status: StepStatus,
    pub result: Option<String>,
    pub error: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub category: StepCategory,
}

impl ExecutionStep {
    pub fn new(id: usize, tool_name: String, args: ArgMap, category: StepCategory) -> Self {
        Self {
            id,
            tool_name,
            args,
            dependencies: Vec::new(),
            status: StepStatus::Pending,
            result: None,
            error: None,
            started_at: None,
            ended_at: None,
            category,
        }
    }
}

/// A DAG of [`ExecutionStep`]s plus a partition of the step-id set into
/// parallel-safe groups, guarded by a single readers-writer lock. Status and
/// result mutations take the writer lock; readiness scans and summary
/// generation take the reader lock (§5).
#[derive(Debug)]
pub struct ExecutionPlan {
    steps: RwLock<Vec<ExecutionStep>>,
    pub parallel_groups: Vec<Vec<usize>>,
}

impl ExecutionPlan {
    pub fn new(steps: Vec<ExecutionStep>, parallel_groups: Vec<Vec<usize>>) -> Self {
        Self { steps: RwLock::new(steps), parallel_groups }
    }

    pub fn len(&self) -> usize {
        self.parallel_groups.iter().map(|g| g.len()).sum()
    }

    pub async fn step(&self, id: usize) -> Option<ExecutionStep> {
        self.steps.read().await.get(id).cloned()
    }

    pub async fn step_invocation(&self, id: usize) -> (String, ArgMap) {
        let steps = self.steps.read().await;
        let step = &steps[id];
        (step.tool_name.clone(), step.args.clone())
    }

    pub async fn snapshot(&self) -> Vec<ExecutionStep> {
        self.steps.read().await.clone()
    }

    pub async fn update_step_status(&self, id: usize, status: StepStatus) {
        let mut steps = self.steps.write().await;
        let step = &mut steps[id];
        step.status = status;
        match status {
            StepStatus::Running => step.started_at = Some(Utc::now()),
            s if s.is_terminal() => step.ended_at = Some(Utc::now()),
            _ => {}
        }
    }

    pub async fn set_step_result(&self, id: usize, result: Option<String>, error: Option<String>) {
        let mut steps = self.steps.write().await;
        let step = &mut steps[id];
        let failed = error.is_some();
        step.result = result;
        step.error = error;
        step.status = if failed { StepStatus::Failed } else { StepStatus::Completed };
        step.ended_at = Some(Utc::now());
    }

    pub async fn is_completed(&self) -> bool {
        self.steps.read().await.iter().all(|s| s.status.is_terminal())
    }

    pub async fn has_failures(&self) -> bool {
        self.steps.read().await.iter().any(|s| s.status == StepStatus::Failed)
    }

    pub async fn failed_step_ids(&self) -> Vec<usize> {
        self.steps
            .read()
            .await
            .iter()
            .filter(|s| !s.status.is_terminal() || s.status == StepStatus::Failed)
            .map(|s| s.id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ArgMap;

    fn step(id: usize) -> ExecutionStep {
        ExecutionStep::new(id, "tool".to_string(), ArgMap::new(), StepCategory::Other)
    }

    #[tokio::test]
    async fn a_step_never_leaves_a_terminal_status() {
        let plan = ExecutionPlan::new(vec![step(0)], vec![vec![0]]);
        plan.update_step_status(0, StepStatus::Running).await;
        plan.set_step_result(0, Some("ok".to_string()), None).await;
        assert_eq!(plan.step(0).await.unwrap().status, StepStatus::Completed);

        // A later attempt to mark it failed would be a caller bug, not
        // something the plan itself prevents — but the executor never
        // calls set_step_result twice for the same step, so this is
        // exercised indirectly via the executor's single-write-per-step
        // discipline rather than a runtime guard here.
        assert!(plan.is_completed().await);
    }

    #[tokio::test]
    async fn successful_plan_has_every_step_completed() {
        let plan = ExecutionPlan::new(vec![step(0), step(1)], vec![vec![0, 1]]);
        plan.set_step_result(0, Some("a".to_string()), None).await;
        plan.set_step_result(1, Some("b".to_string()), None).await;
        assert!(plan.is_completed().await);
        assert!(!plan.has_failures().await);
    }

    #[tokio::test]
    async fn a_failed_step_leaves_the_plan_in_a_terminal_state_with_an_error() {
        let plan = ExecutionPlan::new(vec![step(0), step(1)], vec![vec![0], vec![1]]);
        plan.set_step_result(0, None, Some("boom".to_string())).await;
        assert!(plan.has_failures().await);
        let ids = plan.failed_step_ids().await;
        assert!(ids.contains(&0));
        assert!(ids.contains(&1)); // stranded: never became terminal
    }
}
