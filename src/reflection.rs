use tokio_util::sync::CancellationToken;

use crate::llm::LlmProvider;
use crate::plan::{ExecutionStep, StepStatus};
use crate::prompt::PromptData;
use crate::types::Message;

#[derive(Debug, Clone, PartialEq)]
pub struct ReflectionResult {
    pub task_completed: bool,
    pub reason: String,
    pub should_retry: bool,
}

const REFLECTION_SYSTEM_PROMPT: &str = r#"You judge whether an agent's execution plan achieved the user's task.

Respond in exactly this text format, one field per line:
COMPLETED: yes|no
REASON: <one sentence>
RETRY: yes|no
"#;

/// Post-execution judgment of whether a completed plan achieved the task
/// (§4.H). Falls back to a deterministic success-rate rule when the model
/// is unreachable.
pub struct ReflectionEvaluator;

impl ReflectionEvaluator {
    pub async fn evaluate(
        llm: Option<&dyn LlmProvider>,
        steps: &[ExecutionStep],
        task: &str,
        completion_tool: &str,
        cancel: CancellationToken,
    ) -> ReflectionResult {
        if let Some(llm) = llm {
            if let Ok(result) = Self::evaluate_with_model(llm, steps, task, cancel).await {
                return result;
            }
        }
        Self::fallback(steps, completion_tool)
    }

    async fn evaluate_with_model(
        llm: &dyn LlmProvider,
        steps: &[ExecutionStep],
        task: &str,
        cancel: CancellationToken,
    ) -> Result<ReflectionResult, String> {
        let outcomes: Vec<String> = steps
            .iter()
            .map(|s| format!("- {} ({}): {:?}", s.tool_name, s.category, s.status))
            .collect();
        let user_prompt = format!("Task: {task}\n\nStep outcomes:\n{}", outcomes.join("\n"));

        let prompt = PromptData::new(REFLECTION_SYSTEM_PROMPT, Vec::new()).with_pushed(Message::user(user_prompt));
        let reply = llm.generate(&prompt, cancel).await.map_err(|e| e.to_string())?;
        parse_reflection_reply(&reply.content).ok_or_else(|| "could not parse reflection reply".to_string())
    }

    /// success rate = completed-steps / total-steps; a successful
    /// completion-tool step always counts as completed regardless of rate.
    fn fallback(steps: &[ExecutionStep], completion_tool: &str) -> ReflectionResult {
        if steps.is_empty() {
            return ReflectionResult {
                task_completed: false,
                reason: "no steps were executed".to_string(),
                should_retry: true,
            };
        }

        let completion_succeeded = steps
            .iter()
            .any(|s| s.tool_name == completion_tool && s.status == StepStatus::Completed);
        if completion_succeeded {
            return ReflectionResult {
                task_completed: true,
                reason: "completion tool succeeded".to_string(),
                should_retry: false,
            };
        }

        let completed = steps.iter().filter(|s| s.status == StepStatus::Completed).count();
        let success_rate = completed as f64 / steps.len() as f64;

        if success_rate >= 0.8 {
            ReflectionResult {
                task_completed: true,
                reason: format!("fallback: success rate {success_rate:.2} >= 0.8"),
                should_retry: false,
            }
        } else if success_rate >= 0.5 {
            ReflectionResult {
                task_completed: false,
                reason: format!("fallback: success rate {success_rate:.2} >= 0.5"),
                should_retry: true,
            }
        } else {
            ReflectionResult {
                task_completed: false,
                reason: format!("fallback: success rate {success_rate:.2} < 0.5"),
                should_retry: false,
            }
        }
    }
}

fn parse_reflection_reply(content: &str) -> Option<ReflectionResult> {
    let mut completed = None;
    let mut reason = String::new();
    let mut should_retry = None;

    for line in content.lines() {
        let lower = line.to_ascii_lowercase();
        if let Some(value) = lower.strip_prefix("completed:") {
            completed = Some(value.trim().starts_with("yes"));
        } else if lower.starts_with("reason:") {
            reason = line[7..].trim().to_string();
        } else if let Some(value) = lower.strip_prefix("retry:") {
            should_retry = Some(value.trim().starts_with("yes"));
        }
    }

    Some(ReflectionResult {
        task_completed: completed?,
        reason,
        should_retry: should_retry.unwrap_or(false),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ArgMap;
    use crate::StepCategory;

    fn step(status: StepStatus, category: StepCategory, tool_name: &str) -> ExecutionStep {
        let mut s = ExecutionStep::new(0, tool_name.to_string(), ArgMap::new(), category);
        s.status = status;
        s
    }

    #[test]
    fn completion_tool_success_always_wins_regardless_of_rate() {
        let steps = vec![
            step(StepStatus::Failed, StepCategory::Modification, "write_file"),
            step(StepStatus::Failed, StepCategory::Modification, "write_file"),
            step(StepStatus::Completed, StepCategory::Completion, "attempt_completion"),
        ];
        let result = ReflectionEvaluator::fallback(&steps, "attempt_completion");
        assert!(result.task_completed);
        assert!(!result.should_retry);
    }

    #[test]
    fn completion_blocked_by_prior_failure_reports_no_retry_at_zero_success_rate() {
        let steps = vec![
            step(StepStatus::Failed, StepCategory::Modification, "write_file"),
            step(StepStatus::Failed, StepCategory::Completion, "attempt_completion"),
        ];
        let result = ReflectionEvaluator::fallback(&steps, "attempt_completion");
        assert!(!result.task_completed);
        assert!(!result.should_retry);
    }

    #[test]
    fn mid_range_success_rate_suggests_retry() {
        let steps = vec![
            step(StepStatus::Completed, StepCategory::Modification, "write_file"),
            step(StepStatus::Failed, StepCategory::Modification, "write_file"),
        ];
        let result = ReflectionEvaluator::fallback(&steps, "attempt_completion");
        assert!(!result.task_completed);
        assert!(result.should_retry);
    }

    #[test]
    fn no_steps_reports_not_completed_with_retry() {
        let result = ReflectionEvaluator::fallback(&[], "attempt_completion");
        assert!(!result.task_completed);
        assert!(result.should_retry);
    }

    #[test]
    fn parses_a_well_formed_reply() {
        let content = "COMPLETED: yes\nREASON: all steps succeeded\nRETRY: no\n";
        let parsed = parse_reflection_reply(content).unwrap();
        assert!(parsed.task_completed);
        assert_eq!(parsed.reason, "all steps succeeded");
        assert!(!parsed.should_retry);
    }

    #[test]
    fn missing_completed_field_fails_to_parse() {
        let content = "REASON: no idea\nRETRY: no\n";
        assert!(parse_reflection_reply(content).is_none());
    }
}
