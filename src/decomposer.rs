use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::error::AgentError;
use crate::llm::LlmProvider;
use crate::types::{Message, ToolDefinition};

pub const DECOMPOSE_TOOL_NAME: &str = "decompose_task";

const DECOMPOSITION_SYSTEM_PROMPT: &str = r#"You are a task decomposition assistant. Break the given task into 3 to 6 logical steps.

Each step describes WHAT to do, not which tool to call — tool selection happens later, per step.

Respond with JSON only, no surrounding prose and no code fences, matching exactly this shape:

{
  "reasoning": "short explanation of the overall approach",
  "steps": [
    {"id": 1, "description": "...", "reason": "...", "dependencies": []}
  ]
}
"#;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecompositionStep {
    pub id: usize,
    pub description: String,
    pub reason: String,
    #[serde(default)]
    pub dependencies: Vec<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecompositionResult {
    pub original_task: String,
    pub steps: Vec<DecompositionStep>,
    pub reasoning: String,
}

#[derive(Debug, Deserialize)]
struct RawDecomposition {
    #[serde(default)]
    reasoning: String,
    steps: Vec<RawStep>,
}

#[derive(Debug, Deserialize)]
struct RawStep {
    id: Option<usize>,
    description: Option<String>,
    #[serde(default)]
    reason: String,
    #[serde(default)]
    dependencies: Vec<usize>,
}

/// Turns a free-form task description into an ordered list of logical steps
/// via a single strict-JSON-only model call (§4.F).
pub struct TaskDecomposer;

impl TaskDecomposer {
    pub async fn decompose(
        llm: &dyn LlmProvider,
        task: &str,
        tool_defs: &[ToolDefinition],
        cancel: CancellationToken,
    ) -> Result<DecompositionResult, AgentError> {
        let catalogue: Vec<String> = tool_defs.iter().map(|t| format!("- {}: {}", t.name, t.description)).collect();
        let user_prompt = format!(
            "Task: {task}\n\nAvailable tools:\n{}",
            if catalogue.is_empty() { "(none)".to_string() } else { catalogue.join("\n") }
        );

        let prompt = crate::prompt::PromptData::new(DECOMPOSITION_SYSTEM_PROMPT, Vec::new())
            .with_pushed(Message::user(user_prompt));

        let reply = llm
            .generate(&prompt, cancel)
            .await
            .map_err(|e| AgentError::ProviderError(e.to_string()))?;

        let cleaned = strip_code_fences(&reply.content);
        let raw: RawDecomposition = serde_json::from_str(&cleaned)
            .map_err(|e| AgentError::DecompositionParseError(format!("invalid JSON: {e}")))?;

        if raw.steps.is_empty() {
            return Err(AgentError::DecompositionParseError("decomposition contained no steps".to_string()));
        }

        let mut steps = Vec::with_capacity(raw.steps.len());
        for (idx, raw_step) in raw.steps.into_iter().enumerate() {
            let description = raw_step
                .description
                .filter(|d| !d.trim().is_empty())
                .ok_or_else(|| AgentError::DecompositionParseError(format!("step {idx} has an empty description")))?;
            steps.push(DecompositionStep {
                id: raw_step.id.unwrap_or(idx + 1),
                description,
                reason: raw_step.reason,
                dependencies: raw_step.dependencies,
            });
        }

        Ok(DecompositionResult { original_task: task.to_string(), steps, reasoning: raw.reasoning })
    }
}

fn strip_code_fences(content: &str) -> String {
    let trimmed = content.trim();
    let without_leading = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    without_leading.strip_suffix("```").unwrap_or(without_leading).trim().to_string()
}
