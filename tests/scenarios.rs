use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use coreagent::{
    AgentError, AgentLoop, AgentLoopConfig, ExecutorConfig, LlmReply, MockLlmProvider, ParallelExecutor,
    Planner, ReflectionEvaluator, StepStatus, TaskState, ToolInvocation, ToolRegistry,
};
use coreagent::tools::{sync_tool, ToolFuture};
use coreagent::types::{ArgMap, StepCategory};
use tokio_util::sync::CancellationToken;

fn arg_map(pairs: &[(&str, &str)]) -> HashMap<String, serde_json::Value> {
    pairs.iter().map(|(k, v)| (k.to_string(), serde_json::json!(v))).collect()
}

/// Scenario 1: a single read has one step, one group, no dependencies, and
/// runs to completion carrying the stub tool's own output.
#[tokio::test]
async fn single_file_read_completes_with_its_result() {
    let registry = Arc::new(
        ToolRegistry::builder()
            .register("read_file", "reads a file", StepCategory::Analysis, None, sync_tool(|_| Ok("hello".to_string())))
            .build(),
    );
    let task_state = Arc::new(TaskState::new());
    let planner = Planner::new("attempt_completion");
    let invocations = vec![ToolInvocation::new("c0", "read_file", arg_map(&[("path", "main.go")]))];
    let plan = Arc::new(planner.build_plan(&registry, &invocations));

    assert_eq!(plan.len(), 1);
    assert_eq!(plan.parallel_groups, vec![vec![0]]);

    let executor = ParallelExecutor::new(ExecutorConfig::default());
    executor
        .run(Arc::clone(&plan), Arc::clone(&registry), Arc::clone(&task_state), CancellationToken::new())
        .await
        .expect("plan should succeed");

    let step = plan.step(0).await.unwrap();
    assert_eq!(step.status, StepStatus::Completed);
    assert_eq!(step.result.as_deref(), Some("hello"));
}

/// Scenario 3: three independent reads run in the same parallel group; with
/// four workers and 50ms stub tools, wall-clock time stays well under the
/// 150ms a fully serial execution would take.
#[tokio::test]
async fn independent_reads_run_concurrently() {
    let registry = Arc::new(
        ToolRegistry::builder()
            .register(
                "read_file",
                "reads a file",
                StepCategory::Analysis,
                None,
                Arc::new(|_args: ArgMap| -> ToolFuture {
                    Box::pin(async move {
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        Ok("ok".to_string())
                    })
                }),
            )
            .build(),
    );
    let task_state = Arc::new(TaskState::new());
    let planner = Planner::new("attempt_completion");
    let invocations = vec![
        ToolInvocation::new("c0", "read_file", arg_map(&[("path", "a")])),
        ToolInvocation::new("c1", "read_file", arg_map(&[("path", "b")])),
        ToolInvocation::new("c2", "read_file", arg_map(&[("path", "c")])),
    ];
    let plan = Arc::new(planner.build_plan(&registry, &invocations));
    assert_eq!(plan.parallel_groups, vec![vec![0, 1, 2]]);

    let executor = ParallelExecutor::new(ExecutorConfig { max_workers: 4, ..Default::default() });
    let started = Instant::now();
    executor
        .run(Arc::clone(&plan), Arc::clone(&registry), Arc::clone(&task_state), CancellationToken::new())
        .await
        .expect("plan should succeed");
    assert!(started.elapsed() < Duration::from_millis(150), "elapsed: {:?}", started.elapsed());
}

/// Scenario 5: a failed write strands the completion step; the executor
/// reports a plan-failed error and the Reflection Evaluator's fallback
/// reports not-completed with no retry at a zero success rate.
#[tokio::test]
async fn completion_blocked_by_prior_failure() {
    let registry = Arc::new(
        ToolRegistry::builder()
            .register("write_file", "writes a file", StepCategory::Modification, None, sync_tool(|_| Err("disk full".to_string())))
            .register("attempt_completion", "marks the task done", StepCategory::Completion, None, sync_tool(|_| Ok("done".to_string())))
            .build(),
    );
    let task_state = Arc::new(TaskState::new());
    let planner = Planner::new("attempt_completion");
    let invocations = vec![
        ToolInvocation::new("c0", "write_file", arg_map(&[("path", "a"), ("content", "")])),
        ToolInvocation::new("c1", "attempt_completion", arg_map(&[("result", "done")])),
    ];
    let plan = Arc::new(planner.build_plan(&registry, &invocations));
    assert_eq!(plan.parallel_groups, vec![vec![0], vec![1]]);

    let executor = ParallelExecutor::new(ExecutorConfig::default());
    let result = executor
        .run(Arc::clone(&plan), Arc::clone(&registry), Arc::clone(&task_state), CancellationToken::new())
        .await;
    assert!(matches!(result, Err(AgentError::PlanExecutionFailed(_))));

    let steps = plan.snapshot().await;
    assert_eq!(steps[0].status, StepStatus::Failed);
    assert_eq!(steps[1].status, StepStatus::Pending); // stranded, never became ready

    let reflection = ReflectionEvaluator::evaluate(None, &steps, "write a then complete", "attempt_completion", CancellationToken::new()).await;
    assert!(!reflection.task_completed);
    assert!(!reflection.should_retry);
}

/// Scenario 6: the model replies with zero tool calls four times in a row.
/// After the third the loop still pushes a forcing message and continues;
/// the fourth crosses the limit and `process` fails with a diagnostic.
#[tokio::test]
async fn four_consecutive_empty_replies_trigger_agent_stuck() {
    let registry = Arc::new(ToolRegistry::builder().build());
    let task_state = Arc::new(TaskState::new());
    let llm = Arc::new(MockLlmProvider::new(vec![
        LlmReply { content: "thinking...".to_string(), tool_calls: Vec::new() },
        LlmReply { content: "still thinking...".to_string(), tool_calls: Vec::new() },
        LlmReply { content: "almost there...".to_string(), tool_calls: Vec::new() },
        LlmReply { content: "no plan yet".to_string(), tool_calls: Vec::new() },
    ]));

    let agent_loop = AgentLoop::new(
        llm,
        registry,
        task_state,
        AgentLoopConfig { min_inter_call_interval: Duration::from_millis(0), ..Default::default() },
        ExecutorConfig::default(),
        CancellationToken::new(),
    );
    let mut memory = agent_loop.new_task("do something");

    let result = agent_loop.process(&mut memory).await;
    assert!(matches!(result, Err(AgentError::AgentStuck(4))));

    let forcing_messages =
        memory.prompt.messages.iter().filter(|m| m.content.contains("must call a tool")).count();
    assert_eq!(forcing_messages, 3);
}
